// Projekt-Konfiguration: Konstanten und Hardware-Zuordnungen
#![allow(dead_code)]

use esp_core::{AppConfig, READ_AHEAD_SIZE};

// ============================================================================
// Pin-Belegung
// ============================================================================

/// GPIO-Pin für den Taster (gegen GND, interner Pull-Up)
pub const BUTTON_GPIO_PIN: u8 = 9;

/// I2S Bit Clock (BCLK) zum DAC
pub const I2S_BCLK_GPIO_PIN: u8 = 4;

/// I2S Word Select (LRCLK) zum DAC
pub const I2S_WS_GPIO_PIN: u8 = 5;

/// I2S Daten (DOUT am ESP32, DIN am DAC)
pub const I2S_DOUT_GPIO_PIN: u8 = 6;

/// UART0 TX der seriellen Konsole
pub const CONSOLE_TX_GPIO_PIN: u8 = 16;

/// UART0 RX der seriellen Konsole
pub const CONSOLE_RX_GPIO_PIN: u8 = 17;

/// Baudrate der seriellen Konsole
pub const CONSOLE_BAUDRATE: u32 = 115_200;

// ============================================================================
// Audio
// ============================================================================

/// Feste Ausgabe-Samplerate des I2S-DAC
/// Streams mit 22050 / 11025 Hz werden durch Wiederholen hochgerechnet
pub const OUTPUT_SAMPLE_RATE: u32 = 44_100;

/// Verstärkung vor der i16-Wandlung (1.0 = unverändert)
pub const OUTPUT_GAIN: f32 = 1.0;

/// DMA-Puffer für I2S (Bytes)
/// Größter Frame: 1152 Samples × 4-fache Wiederholung × 4 Bytes (Stereo i16)
pub const I2S_DMA_BUFFER_SIZE: usize = 18_432;

// ============================================================================
// Netzwerk
// ============================================================================

/// TCP RX Buffer-Größe in Bytes
/// Puffert den MP3-Stream im Netzwerk-Stack
pub const TCP_RX_BUFFER_SIZE: usize = 4096;

/// TCP TX Buffer-Größe in Bytes
/// Nur für den HTTP-Request
pub const TCP_TX_BUFFER_SIZE: usize = 1024;

/// Anzahl gleichzeitiger TCP-Verbindungen
/// Es gibt immer höchstens eine Wiedergabe-Session
pub const TCP_CONNECTIONS: usize = 1;

/// Sockets im embassy-net Stack (TCP + DHCP + DNS)
pub const NET_SOCKETS: usize = 3;

/// DNS Query Timeout in Sekunden
pub const DNS_TIMEOUT_SECS: u64 = 10;

/// Timeout für TCP-Connect und Antwort-Header in Sekunden
pub const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Timeout für einen einzelnen Stream-Read in Sekunden
pub const READ_TIMEOUT_SECS: u64 = 5;

// ============================================================================
// Speicher
// ============================================================================

/// Heap-Größe für WiFi (Bytes)
/// WiFi benötigt dynamischen Speicher für Pakete
pub const WIFI_HEAP_SIZE: usize = 65536; // 64 KB

/// Zusätzliche Heap-Größe (Bytes)
/// Decoder (~7 KB), PCM-Puffer (~9 KB), Read-Ahead (8 KB), Strings
pub const EXTRA_HEAP_SIZE: usize = 73728; // 72 KB

/// Flash-Offset des Einstellungs-Sektors
/// NVS-Partition der Standard-Partitionstabelle (0x9000)
pub const SETTINGS_FLASH_OFFSET: u32 = 0x9000;

/// Größe des Einstellungs-Bereichs (ein Flash-Sektor)
pub const SETTINGS_FLASH_SIZE: usize = 4096;

// ============================================================================
// Player
// ============================================================================

/// Wartezeit nach dem Einschalten (Zeit für den seriellen Monitor)
pub const STARTUP_DELAY_MS: u32 = 1000;

/// Obergrenze für einen WLAN-Verbindungsversuch
pub const CONNECT_TIMEOUT_MS: u32 = 10_000;

/// Abfrage-Intervall des Link-Status beim Verbinden
pub const CONNECT_POLL_MS: u32 = 500;

/// Pause pro Schleifendurchlauf
pub const IDLE_DELAY_MS: u32 = 1;

/// Wartezeit zwischen "Rebooting..." und dem Neustart
pub const REBOOT_DELAY_MS: u32 = 1000;

/// Anzahl Tracks auf dem Server (1.mp3 .. 10.mp3)
pub const TRACK_COUNT: u32 = 10;

/// Parameter der Player-Schleife aus den Konstanten oben
pub fn app_config() -> AppConfig {
    AppConfig {
        startup_delay_ms: STARTUP_DELAY_MS,
        connect_timeout_ms: CONNECT_TIMEOUT_MS,
        connect_poll_ms: CONNECT_POLL_MS,
        idle_delay_ms: IDLE_DELAY_MS,
        reboot_delay_ms: REBOOT_DELAY_MS,
        track_count: TRACK_COUNT,
        read_ahead_bytes: READ_AHEAD_SIZE,
    }
}

// ============================================================================
// Feste Einstellungen (Variante ohne Konsole)
// ============================================================================

/// WiFi SSID (Netzwerk-Name)
/// Wird zur Build-Zeit aus der Environment Variable WIFI_SSID geladen
/// Setze diese in .env file (siehe .env.example)
pub const WIFI_SSID: &str = match option_env!("WIFI_SSID") {
    Some(ssid) => ssid,
    None => "",
};

/// WiFi Passwort
/// Wird zur Build-Zeit aus der Environment Variable WIFI_PASSWORD geladen
pub const WIFI_PASSWORD: &str = match option_env!("WIFI_PASSWORD") {
    Some(password) => password,
    None => "",
};

/// MP3-Server (Host, optional mit Port und Pfad)
/// Wird zur Build-Zeit aus der Environment Variable MP3_SERVER geladen
pub const MP3_SERVER: &str = match option_env!("MP3_SERVER") {
    Some(server) => server,
    None => "",
};

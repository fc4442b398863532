// Keine Standard-Bibliothek verwenden (Embedded System)
#![no_std]
// Kein normaler main() Einstiegspunkt (wird von esp_rtos bereitgestellt)
#![no_main]
// Verbiete mem::forget - gefährlich bei ESP HAL Types mit DMA-Buffern
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those \
    holding buffers for the duration of a data transfer."
)]
// Verbiete große Stack-Frames (Stack ist auf Embedded Systemen begrenzt)
#![deny(clippy::large_stack_frames)]

// Heap Allocator (WiFi, Decoder und Stream-Puffer)
extern crate alloc;

// Embassy Async Runtime
use embassy_executor::Spawner;
use embassy_net::tcp::client::{TcpClient, TcpClientState};
use embassy_net::{Config as NetConfig, Stack, StackResources};
use embassy_time::{Duration, Timer};

// ESP32-C6 HAL
use esp_hal::clock::CpuClock;
use esp_hal::i2s::master::{Channels, Config as I2sConfig, DataFormat, I2s};
use esp_hal::rng::Rng;
use esp_hal::time::Rate;
use esp_hal::timer::timg::TimerGroup;

// Backtrace bei Panic und println!() Support
use {esp_backtrace as _, esp_println as _};

// Projekt-Module und Konfiguration
use esp_core::{BoardParts, RecordStorage};
use esp_mp3_player::config::{
    EXTRA_HEAP_SIZE, I2S_DMA_BUFFER_SIZE, NET_SOCKETS, OUTPUT_GAIN, OUTPUT_SAMPLE_RATE,
    SETTINGS_FLASH_OFFSET, SETTINGS_FLASH_SIZE, TCP_CONNECTIONS, TCP_RX_BUFFER_SIZE,
    TCP_TX_BUFFER_SIZE, WIFI_HEAP_SIZE,
};
use esp_mp3_player::hal::http_source::StreamClient;
use esp_mp3_player::hal::{
    EmbassyDelay, EspBoard, EspSystem, EspWifiLink, GpioButton, HardwareRng, HttpSources,
    I2sOutput, SettingsFlash, UartConsole,
};
use esp_mp3_player::tasks::{boot_settings, link_monitor_task, net_task, player_task};

// ESP-IDF App Descriptor - erforderlich für den Bootloader!
// Ohne diesen schlägt das Flashen mit "ESP-IDF App Descriptor missing" fehl
esp_bootloader_esp_idf::esp_app_desc!();

/// Main Entry Point
///
/// Initialisiert Hardware, WiFi und Netzwerk-Stack, baut daraus das Board
/// und startet die Player-Schleife als Task. Danach schläft main().
#[esp_rtos::main]
async fn main(spawner: Spawner) -> ! {
    // ESP32-C6 Konfiguration: CPU auf maximale Taktfrequenz (160 MHz)
    // Der MP3-Decoder braucht die volle Rechenleistung
    let config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(config);

    // Heap Allocator initialisieren
    // Zwei Bereiche: reclaimed RAM (64 KB) + extra (72 KB)
    esp_alloc::heap_allocator!(
        #[esp_hal::ram(reclaimed)]
        size: WIFI_HEAP_SIZE
    );
    esp_alloc::heap_allocator!(size: EXTRA_HEAP_SIZE);

    // Embassy Runtime initialisieren (Timer + Software Interrupt)
    let timg0 = TimerGroup::new(peripherals.TIMG0);
    let sw_interrupt =
        esp_hal::interrupt::software::SoftwareInterruptControl::new(peripherals.SW_INTERRUPT);
    esp_rtos::start(timg0.timer0, sw_interrupt.software_interrupt0);

    // WiFi Hardware initialisieren
    static RADIO_INIT: static_cell::StaticCell<esp_radio::Controller> =
        static_cell::StaticCell::new();
    let radio_init =
        RADIO_INIT.init(esp_radio::init().expect("Failed to initialize Wi-Fi/BLE controller"));

    let (wifi_controller, wifi_interface) =
        esp_radio::wifi::new(radio_init, peripherals.WIFI, Default::default())
            .expect("Failed to initialize Wi-Fi");

    // Netzwerk-Stack erstellen
    // Random seed für TCP/IP Stack (von Hardware RNG)
    let rng = Rng::new();
    let seed = (rng.random() as u64) << 32 | rng.random() as u64;

    // Static resources für embassy-net: Stream-Verbindung, DHCP, DNS
    static RESOURCES: static_cell::StaticCell<StackResources<NET_SOCKETS>> =
        static_cell::StaticCell::new();
    let resources = RESOURCES.init(StackResources::new());

    // embassy-net erstellt Stack + Runner (nutzt STA interface für Client-Modus)
    let (stack, runner) = embassy_net::new(
        wifi_interface.sta,
        NetConfig::dhcpv4(Default::default()),
        resources,
        seed,
    );

    // Stack muss 'static sein für Tasks
    static STACK: static_cell::StaticCell<Stack<'static>> = static_cell::StaticCell::new();
    let stack = &*STACK.init(stack);

    // TCP-Client für den HTTP-Stream (Pool mit genau einer Verbindung)
    static TCP_STATE: static_cell::StaticCell<
        TcpClientState<TCP_CONNECTIONS, TCP_TX_BUFFER_SIZE, TCP_RX_BUFFER_SIZE>,
    > = static_cell::StaticCell::new();
    let tcp_state = TCP_STATE.init(TcpClientState::new());
    static TCP_CLIENT: static_cell::StaticCell<StreamClient> = static_cell::StaticCell::new();
    let tcp_client = &*TCP_CLIENT.init(TcpClient::new(*stack, tcp_state));

    // I2S Ausgabe: 16 Bit Stereo, feste Samplerate
    // Pins: BCLK GPIO4, WS GPIO5, DOUT GPIO6
    let (_, _, tx_buffer, tx_descriptors) = esp_hal::dma_buffers!(0, I2S_DMA_BUFFER_SIZE);
    let i2s = I2s::new(
        peripherals.I2S0,
        peripherals.DMA_CH0,
        I2sConfig::new_tdm_philips()
            .with_sample_rate(Rate::from_hz(OUTPUT_SAMPLE_RATE))
            .with_data_format(DataFormat::Data16Channel16)
            .with_channels(Channels::STEREO),
    )
    .expect("Failed to initialize I2S")
    .into_async();
    let i2s_tx = i2s
        .i2s_tx
        .with_bclk(peripherals.GPIO4)
        .with_ws(peripherals.GPIO5)
        .with_dout(peripherals.GPIO6)
        .build(tx_descriptors);

    // Serielle Konsole auf UART0 (TX GPIO16, RX GPIO17)
    #[cfg(feature = "console")]
    let console = Some(
        UartConsole::new(
            peripherals.UART0,
            peripherals.GPIO16,
            peripherals.GPIO17,
            esp_mp3_player::config::CONSOLE_BAUDRATE,
        )
        .expect("Failed to initialize console UART"),
    );
    #[cfg(not(feature = "console"))]
    let console: Option<UartConsole> = None;

    // Board zusammenbauen - ab hier gehört alles der Player-Schleife
    let parts = BoardParts::<EspBoard> {
        link: EspWifiLink::new(wifi_controller),
        delay: EmbassyDelay,
        sources: HttpSources::new(*stack, tcp_client),
        output: I2sOutput::new(i2s_tx, tx_buffer, OUTPUT_SAMPLE_RATE, OUTPUT_GAIN),
        storage: RecordStorage::new(SettingsFlash::new(
            peripherals.FLASH,
            SETTINGS_FLASH_OFFSET,
            SETTINGS_FLASH_SIZE,
        )),
        // Taster an GPIO9 (BOOT-Taster auf den meisten DevKits)
        button: GpioButton::new(peripherals.GPIO9),
        console,
        rng: HardwareRng::new(Rng::new()),
        system: EspSystem,
    };

    // Spawn Netzwerk-Tasks
    spawner.spawn(net_task(runner)).unwrap();
    spawner.spawn(link_monitor_task(stack)).unwrap();

    // Spawn Player-Schleife
    spawner.spawn(player_task(parts, boot_settings())).unwrap();

    // Main-Loop: schläft (alle Arbeit läuft in Tasks)
    loop {
        Timer::after(Duration::from_secs(3600)).await;
    }
}

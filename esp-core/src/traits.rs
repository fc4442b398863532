//! Hardware Abstraction Traits
//!
//! Diese Traits definieren Schnittstellen für alles, was der Player nicht
//! selbst implementiert: WLAN, Netzwerk-Stream, MP3-Decoder, I2S-Ausgabe,
//! Flash, GPIO und UART.
//!
//! # Implementierungen
//! - **Production:** `esp-firmware` (`hal`-Modul, ESP32-C6 Peripherals)
//! - **Testing:** Mocks in `esp-tests` (in-memory)

// Alle async Traits werden nur single-threaded genutzt (eine Player-Schleife)
#![allow(async_fn_in_trait)]

use alloc::string::String;
use core::fmt;

use crate::types::FrameInfo;

// ============================================================================
// Fehler-Typen
// ============================================================================

/// Fehler beim Aufbau einer WLAN-Verbindung
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkError {
    /// Treiber hat SSID/Passphrase abgelehnt
    ConfigRejected,
    /// WLAN-Treiber ließ sich nicht starten
    StartFailed,
    /// Verbindungsaufbau konnte nicht angestoßen werden
    ConnectFailed,
}

/// Fehler beim Zugriff auf den nichtflüchtigen Speicher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StorageError {
    ReadFailed,
    WriteFailed,
    /// Inhalt unlesbar (Magic, Checksumme oder Länge falsch)
    Corrupt,
    /// Schreibzugriff in einer ReadOnly-Session
    ReadOnly,
    /// Zugriff ohne geöffnete Session
    NotOpen,
    /// Daten passen nicht in das Format oder den Flash-Bereich
    TooLarge,
}

/// Fehler der Stream-Quelle (HTTP/ICY)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SourceError {
    /// Nur `http://` wird unterstützt (kein TLS)
    UnsupportedScheme,
    InvalidUrl,
    /// Netzwerk-Stack hat (noch) keine IP-Adresse
    NoAddress,
    DnsFailed,
    ConnectFailed,
    RequestFailed,
    MalformedResponse,
    /// Server antwortet mit einem Status ungleich 200
    BadStatus(u16),
    TooManyRedirects,
    ReadFailed,
    Timeout,
}

/// Fehler der Audio-Ausgabe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SinkError {
    WriteFailed,
}

/// Fehler beim Starten der Wiedergabe
///
/// Keiner dieser Fehler ist fatal: der Player bleibt danach im Zustand Idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackError {
    /// Kein WLAN-Link, Start wurde abgelehnt
    NotLinked,
    /// Stream konnte nicht geöffnet werden
    Source(SourceError),
    /// Decoder fand keinen abspielbaren Frame
    DecoderInit,
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkError::ConfigRejected => f.write_str("configuration rejected"),
            LinkError::StartFailed => f.write_str("driver start failed"),
            LinkError::ConnectFailed => f.write_str("connect failed"),
        }
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::ReadFailed => f.write_str("read failed"),
            StorageError::WriteFailed => f.write_str("write failed"),
            StorageError::Corrupt => f.write_str("stored data corrupt"),
            StorageError::ReadOnly => f.write_str("session is read-only"),
            StorageError::NotOpen => f.write_str("no open session"),
            StorageError::TooLarge => f.write_str("data too large"),
        }
    }
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceError::UnsupportedScheme => f.write_str("unsupported URL scheme"),
            SourceError::InvalidUrl => f.write_str("invalid URL"),
            SourceError::NoAddress => f.write_str("no IP address"),
            SourceError::DnsFailed => f.write_str("DNS lookup failed"),
            SourceError::ConnectFailed => f.write_str("TCP connect failed"),
            SourceError::RequestFailed => f.write_str("request failed"),
            SourceError::MalformedResponse => f.write_str("malformed response"),
            SourceError::BadStatus(code) => write!(f, "HTTP status {}", code),
            SourceError::TooManyRedirects => f.write_str("too many redirects"),
            SourceError::ReadFailed => f.write_str("read failed"),
            SourceError::Timeout => f.write_str("timeout"),
        }
    }
}

impl fmt::Display for SinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SinkError::WriteFailed => f.write_str("audio output write failed"),
        }
    }
}

impl fmt::Display for PlaybackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaybackError::NotLinked => f.write_str("Wi-Fi not linked"),
            PlaybackError::Source(e) => write!(f, "stream open failed: {}", e),
            PlaybackError::DecoderInit => f.write_str("decoder start failed"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for PlaybackError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            PlaybackError::NotLinked => defmt::write!(fmt, "not linked"),
            PlaybackError::Source(e) => defmt::write!(fmt, "source: {}", e),
            PlaybackError::DecoderInit => defmt::write!(fmt, "decoder init failed"),
        }
    }
}

// ============================================================================
// WLAN und Zeit
// ============================================================================

/// Trait für den WLAN-Treiber (Station-Modus)
pub trait WifiLink {
    /// Konfiguriert SSID/Passphrase und stößt die Assoziation an.
    ///
    /// Kehrt zurück, sobald der Versuch läuft - nicht erst bei Erfolg.
    async fn begin(&mut self, ssid: &str, passphrase: &str) -> Result<(), LinkError>;

    /// Aktueller Link-Status direkt vom Treiber (nicht gecacht)
    fn is_linked(&mut self) -> bool;

    /// Bricht einen laufenden oder halboffenen Verbindungsversuch ab
    async fn abort(&mut self);
}

/// Kooperatives Warten (gibt die CPU an andere Tasks ab)
pub trait Delay {
    async fn delay_ms(&mut self, ms: u32);
}

// ============================================================================
// Audio-Pipeline: Quelle → Puffer → Decoder → Ausgabe
// ============================================================================

/// Byte-Stream einer geöffneten Audio-Quelle
pub trait StreamSource {
    /// Liest Audio-Bytes (ohne eingebettete Metadaten).
    ///
    /// `Ok(0)` bedeutet Ende des Streams.
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, SourceError>;

    /// Neuer Titel aus den Stream-Metadaten, falls seit dem letzten Aufruf geändert
    fn take_title(&mut self) -> Option<String> {
        None
    }

    /// Gibt Verbindung und Puffer der Quelle frei
    async fn close(&mut self);
}

/// Öffnet Stream-Quellen anhand einer URL
pub trait SourceFactory {
    type Source: StreamSource;

    async fn open(&mut self, url: &str) -> Result<Self::Source, SourceError>;
}

/// MP3-Frame-Decoder
///
/// Vertrag wie bei nanomp3: pro Aufruf höchstens ein Frame.
/// - `(n, Some(info))`: n Bytes verbraucht, Frame in `pcm` (interleaved f32)
/// - `(n, None)` mit n > 0: n Bytes übersprungen (kein gültiger Frame)
/// - `(0, None)`: es werden mehr Daten gebraucht
pub trait FrameDecoder {
    /// Maximale Anzahl f32-Werte, die ein Frame in `pcm` schreibt
    const MAX_SAMPLES_PER_FRAME: usize;

    fn decode(&mut self, input: &[u8], pcm: &mut [f32]) -> (usize, Option<FrameInfo>);
}

/// Audio-Ausgabe (I2S), wird über alle Sessions hinweg geteilt
pub trait AudioSink {
    /// Gibt einen dekodierten Frame aus
    async fn write(&mut self, pcm: &[f32], frame: FrameInfo) -> Result<(), SinkError>;

    /// Beendet die Ausgabe (Stille), die Hardware bleibt initialisiert
    async fn stop(&mut self);
}

// ============================================================================
// Persistenz
// ============================================================================

/// Zugriffsmodus einer Speicher-Session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AccessMode {
    ReadOnly,
    ReadWrite,
}

/// Key-Value-Speicher mit Sessions (open → get/put → close)
///
/// Änderungen einer ReadWrite-Session werden erst bei `close` geschrieben.
pub trait KeyValueStorage {
    fn open(&mut self, namespace: &str, mode: AccessMode) -> Result<(), StorageError>;
    fn get(&mut self, key: &str) -> Result<Option<String>, StorageError>;
    fn put(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
    fn close(&mut self) -> Result<(), StorageError>;
    /// Beendet die Session ohne zu schreiben, offene Änderungen gehen verloren
    fn discard(&mut self);
}

/// Roher, byte-adressierter Flash-Bereich
pub trait FlashRegion {
    /// Größe des Bereichs in Bytes
    fn capacity(&self) -> usize;
    fn read(&mut self, offset: u32, buf: &mut [u8]) -> Result<(), StorageError>;
    fn write(&mut self, offset: u32, data: &[u8]) -> Result<(), StorageError>;
}

// ============================================================================
// Ein-/Ausgabe und System
// ============================================================================

/// Digitaler Eingang (Taster)
pub trait ButtonInput {
    fn is_high(&mut self) -> bool;
}

/// Serielle Konsole
pub trait ConsolePort {
    /// Nächstes empfangenes Byte, `None` wenn gerade nichts anliegt (blockiert nie)
    fn read_byte(&mut self) -> Option<u8>;
    fn write_bytes(&mut self, bytes: &[u8]);
}

/// Zufallszahlen (Hardware-RNG)
pub trait RandomSource {
    fn next_u32(&mut self) -> u32;
}

/// System-Steuerung
pub trait SystemControl {
    /// Startet das Gerät neu (kehrt auf echter Hardware nicht zurück)
    fn restart(&mut self);
}

/// Bündelt alle Hardware-Typen eines Boards
///
/// Die Player-Schleife (`App`) ist damit nur über einen Typ-Parameter generisch.
pub trait Board {
    type Link: WifiLink;
    type Delay: Delay;
    type Sources: SourceFactory;
    type Decoder: FrameDecoder + Default;
    type Output: AudioSink;
    type Storage: KeyValueStorage;
    type Button: ButtonInput;
    type Console: ConsolePort;
    type Rng: RandomSource;
    type System: SystemControl;
}

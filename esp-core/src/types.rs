//! Core Types für den MP3-Player
//!
//! Datenstrukturen ohne Hardware-Dependencies

use alloc::string::String;

use crate::logic::normalize_server;

/// Gespeicherte Geräte-Einstellungen
///
/// `server_host` ist immer normalisiert: kein `http://`/`https://` Präfix,
/// kein abschließender Slash.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    pub ssid: String,
    pub passphrase: String,
    pub server_host: String,
}

impl Settings {
    /// Erstellt Einstellungen, der Server wird dabei normalisiert
    pub fn new(ssid: &str, passphrase: &str, server: &str) -> Self {
        Self {
            ssid: ssid.into(),
            passphrase: passphrase.into(),
            server_host: normalize_server(server).into(),
        }
    }

    /// Setzt den Server (normalisiert)
    pub fn set_server(&mut self, raw: &str) {
        self.server_host = normalize_server(raw).into();
    }

    pub fn has_wifi(&self) -> bool {
        !self.ssid.is_empty()
    }

    pub fn has_server(&self) -> bool {
        !self.server_host.is_empty()
    }
}

/// WLAN-Verbindungszustand
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Ergebnis des Link-Abgleichs pro Schleifendurchlauf
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkChange {
    Unchanged,
    /// Gecacht verbunden, Treiber meldet getrennt
    Lost,
    /// Gecacht getrennt, Treiber meldet verbunden
    Recovered,
}

/// Zustand des Players
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Playing,
}

/// Flanke am Taster-Eingang
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Edge {
    None,
    /// High → Low (Taster gedrückt, Pull-Up)
    FallingEdge,
}

/// Info zu einem dekodierten MP3-Frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FrameInfo {
    /// Samples pro Kanal
    pub samples: usize,
    /// 1 = Mono, 2 = Stereo
    pub channels: u8,
    pub sample_rate: u32,
    pub bitrate_kbps: u32,
}

impl FrameInfo {
    /// Anzahl f32-Werte im PCM-Puffer (alle Kanäle, interleaved)
    pub fn pcm_len(&self) -> usize {
        self.samples * self.channels as usize
    }
}

/// Konsolen-Kommando
///
/// Erkennung über exakte Präfixe, Groß-/Kleinschreibung zählt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `WIFI SSID <value>`
    SetSsid(String),
    /// `WIFI PASS <value>`
    SetPassphrase(String),
    /// `SERVER <value>`
    SetServer(String),
    Save,
    Status,
    Connect,
    Reboot,
}

impl core::convert::TryFrom<&str> for Command {
    type Error = ();

    fn try_from(line: &str) -> Result<Self, Self::Error> {
        // Nur den Zeilenabschluss entfernen, Leerzeichen gehören zum Wert
        let line = line.trim_end_matches(['\r', '\n']);

        if let Some(value) = line.strip_prefix("WIFI SSID ") {
            return Ok(Self::SetSsid(value.into()));
        }
        if let Some(value) = line.strip_prefix("WIFI PASS ") {
            return Ok(Self::SetPassphrase(value.into()));
        }
        if let Some(value) = line.strip_prefix("SERVER ") {
            return Ok(Self::SetServer(value.into()));
        }

        match line {
            "SAVE" => Ok(Self::Save),
            "STATUS" => Ok(Self::Status),
            "CONNECT" => Ok(Self::Connect),
            "REBOOT" => Ok(Self::Reboot),
            _ => Err(()),
        }
    }
}

/// Zeit- und Auswahl-Parameter der Player-Schleife
///
/// Die Firmware füllt das aus `config.rs`, Tests nutzen `Default`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppConfig {
    /// Wartezeit beim Booten vor allem anderen
    pub startup_delay_ms: u32,
    /// Obergrenze für einen Verbindungsversuch
    pub connect_timeout_ms: u32,
    /// Abfrage-Intervall des Link-Status während des Verbindens
    pub connect_poll_ms: u32,
    /// Pause am Ende jedes Schleifendurchlaufs
    pub idle_delay_ms: u32,
    /// Wartezeit zwischen REBOOT-Antwort und Neustart
    pub reboot_delay_ms: u32,
    /// Tracks heißen 1.mp3 .. <track_count>.mp3
    pub track_count: u32,
    /// Größe des Read-Ahead-Puffers pro Session
    pub read_ahead_bytes: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            startup_delay_ms: 1000,
            connect_timeout_ms: 10_000,
            connect_poll_ms: 500,
            idle_delay_ms: 1,
            reboot_delay_ms: 1000,
            track_count: 10,
            read_ahead_bytes: crate::buffer::READ_AHEAD_SIZE,
        }
    }
}

// ============================================================================
// defmt::Format Implementations (optional feature)
// ============================================================================

#[cfg(feature = "defmt")]
impl defmt::Format for PlaybackState {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            PlaybackState::Idle => defmt::write!(fmt, "Idle"),
            PlaybackState::Playing => defmt::write!(fmt, "Playing"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Command {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Command::SetSsid(ssid) => defmt::write!(fmt, "SetSsid {{ {} }}", ssid.as_str()),
            // Passphrase nie ins Log
            Command::SetPassphrase(_) => defmt::write!(fmt, "SetPassphrase"),
            Command::SetServer(host) => defmt::write!(fmt, "SetServer {{ {} }}", host.as_str()),
            Command::Save => defmt::write!(fmt, "Save"),
            Command::Status => defmt::write!(fmt, "Status"),
            Command::Connect => defmt::write!(fmt, "Connect"),
            Command::Reboot => defmt::write!(fmt, "Reboot"),
        }
    }
}

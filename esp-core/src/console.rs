//! Serielle Kommando-Konsole
//!
//! Sammelt Bytes bis zum Zeilenende (LF oder CR) und erkennt pro Aufruf
//! höchstens ein Kommando. Liest nie blockierend.

use core::fmt;

use heapless::Vec;

use crate::traits::ConsolePort;
use crate::types::Command;

/// Maximale Zeilenlänge ohne Zeilenende
pub const MAX_LINE_LEN: usize = 128;

/// Hilfetext für unbekannte Kommandos
pub const USAGE: &[&str] = &[
    "Commands:",
    "  WIFI SSID <ssid>",
    "  WIFI PASS <passphrase>",
    "  SERVER <host>",
    "  SAVE",
    "  STATUS",
    "  CONNECT",
    "  REBOOT",
];

/// Zeile, die kein Kommando ergab
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LineError {
    Unrecognized,
    /// Zeile länger als `MAX_LINE_LEN`, wurde verworfen
    TooLong,
}

pub struct CommandConsole<P: ConsolePort> {
    port: P,
    line: Vec<u8, MAX_LINE_LEN>,
    overflow: bool,
}

impl<P: ConsolePort> CommandConsole<P> {
    pub fn new(port: P) -> Self {
        Self {
            port,
            line: Vec::new(),
            overflow: false,
        }
    }

    pub fn port(&self) -> &P {
        &self.port
    }

    pub fn port_mut(&mut self) -> &mut P {
        &mut self.port
    }

    /// Liest alle anliegenden Bytes bis zur ersten vollständigen Zeile
    ///
    /// `None`: keine vollständige Zeile gepuffert (oder nur Leerzeilen).
    /// Bytes nach dem Zeilenende bleiben im Port für den nächsten Aufruf.
    pub fn poll(&mut self) -> Option<Result<Command, LineError>> {
        while let Some(byte) = self.port.read_byte() {
            match byte {
                b'\r' | b'\n' => {
                    if let Some(result) = self.finish_line() {
                        return Some(result);
                    }
                }
                _ => {
                    if self.line.push(byte).is_err() {
                        self.overflow = true;
                    }
                }
            }
        }
        None
    }

    fn finish_line(&mut self) -> Option<Result<Command, LineError>> {
        if self.overflow {
            self.overflow = false;
            self.line.clear();
            warn!("Console: line too long, discarded");
            return Some(Err(LineError::TooLong));
        }

        if self.line.is_empty() {
            return None;
        }

        let result = match core::str::from_utf8(&self.line) {
            Ok(text) => Command::try_from(text).map_err(|_| LineError::Unrecognized),
            Err(_) => Err(LineError::Unrecognized),
        };
        self.line.clear();
        Some(result)
    }

    /// Schreibt eine Antwortzeile (mit CR/LF)
    pub fn line(&mut self, args: fmt::Arguments<'_>) {
        let _ = fmt::Write::write_fmt(self, args);
        self.port.write_bytes(b"\r\n");
    }

    pub fn print_usage(&mut self) {
        for text in USAGE {
            self.port.write_bytes(text.as_bytes());
            self.port.write_bytes(b"\r\n");
        }
    }
}

impl<P: ConsolePort> fmt::Write for CommandConsole<P> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.port.write_bytes(s.as_bytes());
        Ok(())
    }
}

// Library-Root: Hardware-Anbindung und Tasks des MP3-Players
// Keine Standard-Bibliothek (Embedded System)
#![no_std]

// Heap für Decoder, Puffer und Strings
extern crate alloc;

// Module
pub mod config;
pub mod hal;
pub mod tasks;

// Re-exports von esp-core
pub use esp_core::{App, BoardParts, Settings};

//! ESP Core - Platform-agnostic Player Logic and Traits
//!
//! Diese Crate enthält KEINE Hardware-Dependencies.
//! Sie definiert die Traits für WLAN, Stream, Decoder, I2S, Flash, GPIO
//! und UART sowie die komplette Player-Logik, generisch über diese Traits.
//! Dadurch läuft alles außer den Treibern auch auf dem Host (Tests).

#![no_std]

extern crate alloc;

// Logging-Makros (defmt oder nichts) - muss vor den anderen Modulen stehen
#[macro_use]
mod fmt;

pub mod app;
pub mod buffer;
pub mod connectivity;
pub mod console;
pub mod icy;
pub mod input;
pub mod logic;
pub mod pcm;
pub mod playback;
pub mod record;
pub mod settings;
pub mod traits;
pub mod types;

// Re-exports für einfachen Zugriff
pub use app::{App, BoardParts};
pub use buffer::{READ_AHEAD_SIZE, ReadAheadBuffer};
pub use connectivity::ConnectivityManager;
pub use console::{CommandConsole, LineError};
pub use input::InputPoller;
pub use logic::{build_url, normalize_server, pick_track, track_path};
pub use playback::PlaybackController;
pub use record::{Record, RecordStorage};
pub use settings::SettingsStore;
pub use traits::{
    AccessMode, AudioSink, Board, ButtonInput, ConsolePort, Delay, FlashRegion, FrameDecoder,
    KeyValueStorage, LinkError, PlaybackError, RandomSource, SinkError, SourceError,
    SourceFactory, StorageError, StreamSource, SystemControl, WifiLink,
};
pub use types::{
    AppConfig, Command, ConnectionState, Edge, FrameInfo, LinkChange, PlaybackState, Settings,
};

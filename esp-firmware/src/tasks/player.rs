// Player Task - die kooperative Hauptschleife
//
// Besitzt alle Player-Zustände (Einstellungen, Verbindung, Session).
// Die eigentliche Logik liegt generisch in esp_core::App.

use alloc::boxed::Box;

use defmt::info;
use esp_core::{App, BoardParts, Settings};

use crate::config::app_config;
use crate::hal::EspBoard;

/// Einstellungen beim Booten
///
/// Mit Konsole: `None`, geladen wird aus dem Flash.
/// Ohne Konsole: die zur Build-Zeit eingebackenen Werte.
pub fn boot_settings() -> Option<Settings> {
    #[cfg(feature = "console")]
    {
        None
    }

    #[cfg(not(feature = "console"))]
    {
        use crate::config::{MP3_SERVER, WIFI_PASSWORD, WIFI_SSID};
        Some(Settings::new(WIFI_SSID, WIFI_PASSWORD, MP3_SERVER))
    }
}

#[embassy_executor::task]
pub async fn player_task(parts: BoardParts<EspBoard>, preset: Option<Settings>) -> ! {
    info!("Player: Starting player task");

    // Auf dem Heap, der Task-Future bleibt klein
    let mut app = Box::new(App::new(app_config(), parts));
    app.boot(preset).await;
    app.run().await
}

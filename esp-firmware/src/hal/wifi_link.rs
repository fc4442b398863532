// WLAN Station über esp-radio
//
// Nur der Treiber-Teil: Konfigurieren, Starten, Verbinden anstoßen.
// Timeout und Polling macht der ConnectivityManager in esp-core.

use defmt::{Debug2Format, info, warn};
use esp_core::{LinkError, WifiLink};
use esp_radio::wifi::{ClientConfig, ModeConfig, WifiController};

pub struct EspWifiLink {
    controller: WifiController<'static>,
}

impl EspWifiLink {
    pub fn new(controller: WifiController<'static>) -> Self {
        Self { controller }
    }
}

impl WifiLink for EspWifiLink {
    async fn begin(&mut self, ssid: &str, passphrase: &str) -> Result<(), LinkError> {
        // Bestehende Verbindung (alte Zugangsdaten) zuerst trennen
        if self.is_linked() {
            info!("WiFi: Dropping current association");
            if let Err(e) = self.controller.disconnect_async().await {
                warn!("WiFi: Disconnect failed: {}", Debug2Format(&e));
            }
        }

        let client_config = ModeConfig::Client(
            ClientConfig::default()
                .with_ssid(ssid.into())
                .with_password(passphrase.into()),
        );

        self.controller.set_config(&client_config).map_err(|e| {
            warn!("WiFi: Failed to set configuration: {}", Debug2Format(&e));
            LinkError::ConfigRejected
        })?;

        if !matches!(self.controller.is_started(), Ok(true)) {
            self.controller.start_async().await.map_err(|e| {
                warn!("WiFi: Failed to start: {}", Debug2Format(&e));
                LinkError::StartFailed
            })?;
            info!("WiFi: Started successfully");
        }

        info!("WiFi: Connecting to '{}'...", ssid);
        self.controller.connect().map_err(|e| {
            warn!("WiFi: Connect request failed: {}", Debug2Format(&e));
            LinkError::ConnectFailed
        })
    }

    fn is_linked(&mut self) -> bool {
        matches!(self.controller.is_connected(), Ok(true))
    }

    async fn abort(&mut self) {
        if !matches!(self.controller.is_started(), Ok(true)) {
            return;
        }
        if let Err(e) = self.controller.disconnect_async().await {
            // Meist: es gab gar keine Verbindung
            warn!("WiFi: Abort: {}", Debug2Format(&e));
        }
    }
}

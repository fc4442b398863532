//! Connectivity Manager
//!
//! Verbindet mit dem Access Point (mit Zeitlimit) und gleicht pro
//! Schleifendurchlauf den gecachten Link-Status mit dem Treiber ab.
//! Ein verlorener Link wird NICHT automatisch neu aufgebaut.

use crate::traits::{Delay, WifiLink};
use crate::types::{AppConfig, ConnectionState, LinkChange};

pub struct ConnectivityManager<L: WifiLink> {
    link: L,
    state: ConnectionState,
    timeout_ms: u32,
    poll_ms: u32,
}

impl<L: WifiLink> ConnectivityManager<L> {
    pub fn new(link: L, config: &AppConfig) -> Self {
        Self {
            link,
            state: ConnectionState::Disconnected,
            timeout_ms: config.connect_timeout_ms,
            poll_ms: config.connect_poll_ms.max(1),
        }
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Zuletzt bekannter Status (aus `connect` oder `refresh`)
    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    /// Live-Abfrage beim Treiber, unabhängig vom gecachten Status
    pub fn is_linked(&mut self) -> bool {
        self.link.is_linked()
    }

    /// Verbindet mit dem Access Point
    ///
    /// Leere SSID: sofort `false` ("nicht konfiguriert"), ohne zu warten.
    /// Sonst wird der Link-Status im Abstand `poll_ms` abgefragt, bis
    /// `timeout_ms` abgelaufen ist. Bei Timeout wird der Versuch abgebrochen.
    pub async fn connect<D: Delay>(&mut self, ssid: &str, passphrase: &str, delay: &mut D) -> bool {
        if ssid.is_empty() {
            warn!("WiFi: no SSID configured, not connecting");
            return false;
        }

        info!("WiFi: Connecting to '{}'...", ssid);
        self.state = ConnectionState::Connecting;

        if let Err(e) = self.link.begin(ssid, passphrase).await {
            error!("WiFi: Failed to start connection: {}", e);
            self.link.abort().await;
            self.state = ConnectionState::Disconnected;
            return false;
        }

        let mut waited = 0u32;
        loop {
            if self.link.is_linked() {
                info!("WiFi: Connected after {} ms", waited);
                self.state = ConnectionState::Connected;
                return true;
            }
            if waited >= self.timeout_ms {
                break;
            }
            delay.delay_ms(self.poll_ms).await;
            waited = waited.saturating_add(self.poll_ms);
        }

        warn!("WiFi: Connection timed out after {} ms", self.timeout_ms);
        self.link.abort().await;
        self.state = ConnectionState::Disconnected;
        false
    }

    /// Gleicht den gecachten Status mit dem Treiber ab (einmal pro Durchlauf)
    pub fn refresh(&mut self) -> LinkChange {
        let live = self.link.is_linked();
        match (self.is_connected(), live) {
            (true, false) => {
                warn!("WiFi: Link lost");
                self.state = ConnectionState::Disconnected;
                LinkChange::Lost
            }
            (false, true) => {
                info!("WiFi: Link recovered");
                self.state = ConnectionState::Connected;
                LinkChange::Recovered
            }
            _ => LinkChange::Unchanged,
        }
    }
}

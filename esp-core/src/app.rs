//! Player-Hauptschleife
//!
//! Ein kooperativer Loop, pro Durchlauf in fester Reihenfolge:
//! 1. Konsole (höchstens ein Kommando)
//! 2. Link-Abgleich (Link weg → Wiedergabe stoppen)
//! 3. Taster (fallende Flanke → zufälligen Track starten)
//! 4. Ein Decode-Schritt
//! 5. Kurze Pause
//!
//! Alle Zustände (Einstellungen, Verbindung, Session) gehören dieser Struktur.

use core::fmt;

use crate::connectivity::ConnectivityManager;
use crate::console::{CommandConsole, LineError};
use crate::input::InputPoller;
use crate::logic::{build_url, pick_track, track_path};
use crate::playback::PlaybackController;
use crate::settings::SettingsStore;
use crate::traits::{Board, ConsolePort, Delay, RandomSource, SystemControl};
use crate::types::{AppConfig, Command, ConnectionState, Edge, LinkChange, PlaybackState, Settings};

/// Hardware-Teile, aus denen die App gebaut wird
///
/// `console = None` ergibt die Variante ohne serielle Konsole.
pub struct BoardParts<B: Board> {
    pub link: B::Link,
    pub delay: B::Delay,
    pub sources: B::Sources,
    pub output: B::Output,
    pub storage: B::Storage,
    pub button: B::Button,
    pub console: Option<B::Console>,
    pub rng: B::Rng,
    pub system: B::System,
}

pub struct App<B: Board> {
    config: AppConfig,
    settings: Settings,
    store: SettingsStore<B::Storage>,
    connectivity: ConnectivityManager<B::Link>,
    playback: PlaybackController<B::Sources, B::Decoder, B::Output>,
    input: InputPoller<B::Button>,
    console: Option<CommandConsole<B::Console>>,
    delay: B::Delay,
    rng: B::Rng,
    system: B::System,
}

/// Antwortzeile auf der Konsole (ohne Konsole: nichts)
fn say<P: ConsolePort>(console: &mut Option<CommandConsole<P>>, args: fmt::Arguments<'_>) {
    if let Some(console) = console.as_mut() {
        console.line(args);
    }
}

fn link_label(state: ConnectionState) -> &'static str {
    match state {
        ConnectionState::Disconnected => "disconnected",
        ConnectionState::Connecting => "connecting",
        ConnectionState::Connected => "connected",
    }
}

impl<B: Board> App<B> {
    pub fn new(config: AppConfig, parts: BoardParts<B>) -> Self {
        Self {
            config,
            settings: Settings::default(),
            store: SettingsStore::new(parts.storage),
            connectivity: ConnectivityManager::new(parts.link, &config),
            playback: PlaybackController::new(parts.sources, parts.output, config.read_ahead_bytes),
            input: InputPoller::new(parts.button),
            console: parts.console.map(CommandConsole::new),
            delay: parts.delay,
            rng: parts.rng,
            system: parts.system,
        }
    }

    /// Startsequenz
    ///
    /// `preset = Some(..)`: feste Einstellungen (Variante ohne Konsole),
    /// sonst werden sie aus dem Speicher geladen.
    pub async fn boot(&mut self, preset: Option<Settings>) {
        self.delay.delay_ms(self.config.startup_delay_ms).await;

        info!("Player: MP3 player starting");
        say(&mut self.console, format_args!(""));
        say(&mut self.console, format_args!("ESP32-C6 MP3 player"));

        self.input.resync();

        self.settings = match preset {
            Some(mut preset) => {
                let raw = core::mem::take(&mut preset.server_host);
                preset.set_server(&raw);
                preset
            }
            None => self.store.load(),
        };

        self.connect().await;

        info!("Player: ready");
        say(
            &mut self.console,
            format_args!("Ready. Press the button to play a random track."),
        );
        if let Some(console) = self.console.as_mut() {
            console.print_usage();
        }
    }

    /// Ein Schleifendurchlauf
    pub async fn tick(&mut self) {
        self.poll_console().await;

        if self.connectivity.refresh() == LinkChange::Lost && self.playback.is_playing() {
            warn!("Player: link lost, stopping playback");
            self.playback.stop().await;
        }

        if self.input.poll() == Edge::FallingEdge {
            self.handle_button().await;
        }

        self.playback.tick().await;

        self.delay.delay_ms(self.config.idle_delay_ms).await;
    }

    pub async fn run(&mut self) -> ! {
        loop {
            self.tick().await;
        }
    }

    async fn poll_console(&mut self) {
        let Some(console) = self.console.as_mut() else {
            return;
        };
        match console.poll() {
            None => {}
            Some(Ok(command)) => {
                info!("Console: {}", command);
                self.dispatch(command).await;
            }
            Some(Err(LineError::Unrecognized)) => console.print_usage(),
            Some(Err(LineError::TooLong)) => {
                console.line(format_args!("ERROR: line too long"));
            }
        }
    }

    async fn handle_button(&mut self) {
        info!("Player: button pressed");

        if !self.settings.has_server() {
            warn!("Player: no server configured");
            say(
                &mut self.console,
                format_args!("No server configured (use SERVER <host>)"),
            );
            return;
        }

        let track = pick_track(self.rng.next_u32(), self.config.track_count);
        let url = build_url(&self.settings.server_host, &track_path(track));
        let linked = self.connectivity.is_linked();

        match self.playback.start(&url, linked).await {
            Ok(()) => say(&mut self.console, format_args!("Playing {}", url)),
            Err(e) => {
                warn!("Player: start rejected: {}", e);
                say(&mut self.console, format_args!("Playback failed: {}", e));
            }
        }
    }

    /// Verbindet mit den aktuellen Einstellungen und meldet das Ergebnis
    async fn connect(&mut self) -> bool {
        let connected = self
            .connectivity
            .connect(&self.settings.ssid, &self.settings.passphrase, &mut self.delay)
            .await;

        if connected {
            say(
                &mut self.console,
                format_args!("WiFi connected to '{}'", self.settings.ssid),
            );
        } else if !self.settings.has_wifi() {
            say(
                &mut self.console,
                format_args!("WiFi not configured (use WIFI SSID / WIFI PASS, then CONNECT)"),
            );
        } else {
            say(&mut self.console, format_args!("WiFi connection failed"));
        }
        connected
    }

    /// Führt ein Konsolen-Kommando aus
    pub async fn dispatch(&mut self, command: Command) {
        match command {
            Command::SetSsid(ssid) => {
                self.settings.ssid = ssid;
                say(
                    &mut self.console,
                    format_args!("SSID set to '{}' (SAVE to persist)", self.settings.ssid),
                );
            }
            Command::SetPassphrase(passphrase) => {
                self.settings.passphrase = passphrase;
                say(&mut self.console, format_args!("Passphrase set (SAVE to persist)"));
            }
            Command::SetServer(raw) => {
                self.settings.set_server(&raw);
                say(
                    &mut self.console,
                    format_args!("Server set to '{}' (SAVE to persist)", self.settings.server_host),
                );
            }
            Command::Save => match self.store.save(&self.settings) {
                Ok(()) => say(&mut self.console, format_args!("Settings saved")),
                Err(e) => {
                    error!("Settings: save failed: {}", e);
                    say(&mut self.console, format_args!("ERROR: save failed: {}", e));
                }
            },
            Command::Status => self.print_status(),
            Command::Connect => {
                if self.settings.has_wifi() && self.playback.is_playing() {
                    self.playback.stop().await;
                }
                self.connect().await;
            }
            Command::Reboot => {
                say(&mut self.console, format_args!("Rebooting..."));
                self.playback.stop().await;
                self.delay.delay_ms(self.config.reboot_delay_ms).await;
                info!("Player: restarting");
                self.system.restart();
            }
        }
    }

    fn print_status(&mut self) {
        let Self {
            settings,
            connectivity,
            playback,
            console,
            ..
        } = self;

        let ssid = if settings.has_wifi() {
            settings.ssid.as_str()
        } else {
            "(not set)"
        };
        let pass = if settings.passphrase.is_empty() {
            "(not set)"
        } else {
            "********"
        };
        let server = if settings.has_server() {
            settings.server_host.as_str()
        } else {
            "(not set)"
        };

        say(console, format_args!("SSID:   {}", ssid));
        say(console, format_args!("PASS:   {}", pass));
        say(console, format_args!("SERVER: {}", server));
        say(console, format_args!("WiFi:   {}", link_label(connectivity.state())));
        match playback.state() {
            PlaybackState::Idle => say(console, format_args!("Player: idle")),
            PlaybackState::Playing => {
                say(
                    console,
                    format_args!("Player: playing {}", playback.url().unwrap_or("")),
                );
                if let Some(title) = playback.title() {
                    say(console, format_args!("Title:  {}", title));
                }
            }
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn store(&self) -> &SettingsStore<B::Storage> {
        &self.store
    }

    pub fn connectivity(&self) -> &ConnectivityManager<B::Link> {
        &self.connectivity
    }

    pub fn playback(&self) -> &PlaybackController<B::Sources, B::Decoder, B::Output> {
        &self.playback
    }

    pub fn console(&self) -> Option<&CommandConsole<B::Console>> {
        self.console.as_ref()
    }

    pub fn delay(&self) -> &B::Delay {
        &self.delay
    }

    pub fn system(&self) -> &B::System {
        &self.system
    }
}

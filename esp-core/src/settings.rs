//! Settings Store
//!
//! Lädt und speichert SSID, Passphrase und Server-Host im
//! nichtflüchtigen Key-Value-Speicher.

use crate::logic::normalize_server;
use crate::traits::{AccessMode, KeyValueStorage, StorageError};
use crate::types::Settings;

/// Namespace aller Player-Einstellungen
pub const NAMESPACE: &str = "mp3player";

pub const KEY_SSID: &str = "ssid";
pub const KEY_PASSPHRASE: &str = "pass";
pub const KEY_SERVER: &str = "server";

/// Offene Speicher-Session
///
/// Nur `finish` schreibt. Endet der Scope vorher (Fehler), wird verworfen.
struct Session<'a, S: KeyValueStorage> {
    storage: &'a mut S,
    open: bool,
}

impl<'a, S: KeyValueStorage> Session<'a, S> {
    fn open(storage: &'a mut S, mode: AccessMode) -> Result<Self, StorageError> {
        storage.open(NAMESPACE, mode)?;
        Ok(Self {
            storage,
            open: true,
        })
    }

    fn get(&mut self, key: &str) -> Result<alloc::string::String, StorageError> {
        Ok(self.storage.get(key)?.unwrap_or_default())
    }

    fn put(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.storage.put(key, value)
    }

    /// Schließt die Session und meldet Fehler beim Schließen (z.B. Flash-Write)
    fn finish(mut self) -> Result<(), StorageError> {
        self.open = false;
        self.storage.close()
    }
}

impl<S: KeyValueStorage> Drop for Session<'_, S> {
    fn drop(&mut self) {
        if self.open {
            self.storage.discard();
        }
    }
}

/// Persistente Einstellungen
pub struct SettingsStore<S: KeyValueStorage> {
    storage: S,
}

impl<S: KeyValueStorage> SettingsStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    /// Lädt die Einstellungen
    ///
    /// Fehlende Keys werden zu leeren Strings. Ist der Speicher nicht lesbar,
    /// kommen leere Einstellungen zurück (erster Boot).
    pub fn load(&mut self) -> Settings {
        match self.try_load() {
            Ok(settings) => {
                info!(
                    "Settings: loaded (ssid set: {}, server: '{}')",
                    settings.has_wifi(),
                    settings.server_host.as_str()
                );
                settings
            }
            Err(e) => {
                warn!("Settings: load failed ({}), using empty settings", e);
                Settings::default()
            }
        }
    }

    fn try_load(&mut self) -> Result<Settings, StorageError> {
        let mut session = Session::open(&mut self.storage, AccessMode::ReadOnly)?;
        let settings = Settings {
            ssid: session.get(KEY_SSID)?,
            passphrase: session.get(KEY_PASSPHRASE)?,
            server_host: session.get(KEY_SERVER)?,
        };
        session.finish()?;
        Ok(settings)
    }

    /// Speichert die Einstellungen, der Server wird vorher normalisiert
    pub fn save(&mut self, settings: &Settings) -> Result<(), StorageError> {
        let mut session = Session::open(&mut self.storage, AccessMode::ReadWrite)?;
        session.put(KEY_SSID, &settings.ssid)?;
        session.put(KEY_PASSPHRASE, &settings.passphrase)?;
        session.put(KEY_SERVER, normalize_server(&settings.server_host))?;
        session.finish()?;
        info!("Settings: saved");
        Ok(())
    }
}

// Einstellungs-Sektor im internen Flash
//
// esp-storage liefert byteweisen Zugriff (embedded-storage), das Format
// der Einstellungen (Record mit Magic und Checksumme) kommt aus esp-core.

use defmt::{Debug2Format, warn};
use embedded_storage::{ReadStorage, Storage};
use esp_core::{FlashRegion, RecordStorage, StorageError};
use esp_hal::peripherals::FLASH;
use esp_storage::FlashStorage;

/// Key-Value-Speicher der Einstellungen auf dem Flash-Sektor
pub type FlashSettings = RecordStorage<SettingsFlash>;

/// Fester Ausschnitt des Flash, relativ adressiert ab 0
pub struct SettingsFlash {
    flash: FlashStorage<'static>,
    base: u32,
    size: usize,
}

impl SettingsFlash {
    pub fn new(flash: FLASH<'static>, base: u32, size: usize) -> Self {
        Self {
            flash: FlashStorage::new(flash),
            base,
            size,
        }
    }

    fn check_bounds(&self, offset: u32, len: usize) -> Result<u32, StorageError> {
        if offset as usize + len > self.size {
            return Err(StorageError::TooLarge);
        }
        Ok(self.base + offset)
    }
}

impl FlashRegion for SettingsFlash {
    fn capacity(&self) -> usize {
        self.size
    }

    fn read(&mut self, offset: u32, buf: &mut [u8]) -> Result<(), StorageError> {
        let address = self.check_bounds(offset, buf.len())?;
        ReadStorage::read(&mut self.flash, address, buf).map_err(|e| {
            warn!("Settings: flash read at {=u32:#x} failed: {}", address, Debug2Format(&e));
            StorageError::ReadFailed
        })
    }

    fn write(&mut self, offset: u32, data: &[u8]) -> Result<(), StorageError> {
        let address = self.check_bounds(offset, data.len())?;
        // Storage::write löscht den Sektor selbst (read-modify-write)
        Storage::write(&mut self.flash, address, data).map_err(|e| {
            warn!("Settings: flash write at {=u32:#x} failed: {}", address, Debug2Format(&e));
            StorageError::WriteFailed
        })
    }
}

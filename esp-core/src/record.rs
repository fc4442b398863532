//! Persistentes Key-Value-Format im Flash
//!
//! Ein Namespace wird als ein zusammenhängendes Image gespeichert:
//!
//! ```text
//! Header (8 Bytes)   "MP3S" | Version (1) | reserviert (1) | Body-Länge (u16 LE)
//! Body               postcard(Record)
//! Checksumme (4)     FNV-1a über den Body (u32 LE)
//! ```
//!
//! Gelöschter Flash (0xFF) oder ein kaputtes Image wird als leer gelesen.

use alloc::string::String;
use alloc::vec::Vec;

use serde::{Deserialize, Serialize};

use crate::traits::{AccessMode, FlashRegion, KeyValueStorage, StorageError};

pub const MAGIC: [u8; 4] = *b"MP3S";
pub const VERSION: u8 = 1;
pub const HEADER_LEN: usize = 8;
pub const CHECKSUM_LEN: usize = 4;

/// Maximale Länge von Namespace, Key und Value in Bytes
pub const MAX_FIELD_LEN: usize = u8::MAX as usize;

/// Alle Einträge eines Namespaces
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    namespace: String,
    entries: Vec<(String, String)>,
}

impl Record {
    pub fn new(namespace: &str) -> Self {
        Self {
            namespace: namespace.into(),
            entries: Vec::new(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Setzt oder ersetzt einen Eintrag
    pub fn set(&mut self, key: &str, value: &str) {
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some((_, v)) => *v = value.into(),
            None => self.entries.push((key.into(), value.into())),
        }
    }

    /// Serialisiert den Record zu einem Flash-Image
    pub fn encode(&self) -> Result<Vec<u8>, StorageError> {
        if !self.fits() {
            return Err(StorageError::TooLarge);
        }

        let body = postcard::to_allocvec(self).map_err(|_| StorageError::TooLarge)?;
        let body_len = u16::try_from(body.len()).map_err(|_| StorageError::TooLarge)?;

        let mut image = Vec::with_capacity(HEADER_LEN + body.len() + CHECKSUM_LEN);
        image.extend_from_slice(&MAGIC);
        image.push(VERSION);
        image.push(0);
        image.extend_from_slice(&body_len.to_le_bytes());
        image.extend_from_slice(&body);
        image.extend_from_slice(&fnv1a(&body).to_le_bytes());
        Ok(image)
    }

    /// Liest einen Record aus einem kompletten Flash-Image
    pub fn decode(image: &[u8]) -> Result<Self, StorageError> {
        let body_len = body_len(image).ok_or(StorageError::Corrupt)?;
        let total = HEADER_LEN + body_len + CHECKSUM_LEN;
        if image.len() < total {
            return Err(StorageError::Corrupt);
        }

        let body = &image[HEADER_LEN..HEADER_LEN + body_len];
        let mut checksum = [0u8; CHECKSUM_LEN];
        checksum.copy_from_slice(&image[HEADER_LEN + body_len..total]);
        if u32::from_le_bytes(checksum) != fnv1a(body) {
            return Err(StorageError::Corrupt);
        }

        postcard::from_bytes(body).map_err(|_| StorageError::Corrupt)
    }

    fn fits(&self) -> bool {
        self.namespace.len() <= MAX_FIELD_LEN
            && self
                .entries
                .iter()
                .all(|(k, v)| k.len() <= MAX_FIELD_LEN && v.len() <= MAX_FIELD_LEN)
    }
}

/// Body-Länge aus dem Header, `None` bei falschem Magic oder Version
pub fn body_len(header: &[u8]) -> Option<usize> {
    if header.len() < HEADER_LEN || header[..4] != MAGIC || header[4] != VERSION {
        return None;
    }
    Some(u16::from_le_bytes([header[6], header[7]]) as usize)
}

/// FNV-1a, 32 Bit
fn fnv1a(data: &[u8]) -> u32 {
    data.iter().fold(0x811c_9dc5, |hash, &byte| {
        (hash ^ byte as u32).wrapping_mul(0x0100_0193)
    })
}

// ============================================================================
// KeyValueStorage über einem Flash-Bereich
// ============================================================================

struct OpenSession {
    mode: AccessMode,
    record: Record,
    dirty: bool,
}

/// Key-Value-Speicher auf einem `FlashRegion`
///
/// Der Bereich hält genau einen Namespace. Wird ein anderer Namespace
/// schreibend geöffnet und gespeichert, ersetzt er den alten.
pub struct RecordStorage<F: FlashRegion> {
    region: F,
    session: Option<OpenSession>,
}

impl<F: FlashRegion> RecordStorage<F> {
    pub fn new(region: F) -> Self {
        Self {
            region,
            session: None,
        }
    }

    pub fn region(&self) -> &F {
        &self.region
    }

    pub fn region_mut(&mut self) -> &mut F {
        &mut self.region
    }

    /// Liest den gespeicherten Record, leer bei gelöschtem oder kaputtem Flash
    fn load(&mut self, namespace: &str) -> Result<Record, StorageError> {
        let mut header = [0u8; HEADER_LEN];
        self.region.read(0, &mut header)?;

        let Some(len) = body_len(&header) else {
            debug!("Settings: no record in flash");
            return Ok(Record::new(namespace));
        };

        let total = HEADER_LEN + len + CHECKSUM_LEN;
        if total > self.region.capacity() {
            warn!("Settings: record length {} exceeds region", total);
            return Ok(Record::new(namespace));
        }

        let mut image = alloc::vec![0u8; total];
        self.region.read(0, &mut image)?;

        match Record::decode(&image) {
            Ok(record) if record.namespace() == namespace => Ok(record),
            Ok(_) => Ok(Record::new(namespace)),
            Err(e) => {
                warn!("Settings: stored record unreadable: {}", e);
                Ok(Record::new(namespace))
            }
        }
    }
}

impl<F: FlashRegion> KeyValueStorage for RecordStorage<F> {
    fn open(&mut self, namespace: &str, mode: AccessMode) -> Result<(), StorageError> {
        if namespace.len() > MAX_FIELD_LEN {
            return Err(StorageError::TooLarge);
        }
        let record = self.load(namespace)?;
        self.session = Some(OpenSession {
            mode,
            record,
            dirty: false,
        });
        Ok(())
    }

    fn get(&mut self, key: &str) -> Result<Option<String>, StorageError> {
        let session = self.session.as_ref().ok_or(StorageError::NotOpen)?;
        Ok(session.record.get(key).map(String::from))
    }

    fn put(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let session = self.session.as_mut().ok_or(StorageError::NotOpen)?;
        if session.mode == AccessMode::ReadOnly {
            return Err(StorageError::ReadOnly);
        }
        if key.len() > MAX_FIELD_LEN || value.len() > MAX_FIELD_LEN {
            return Err(StorageError::TooLarge);
        }
        session.record.set(key, value);
        session.dirty = true;
        Ok(())
    }

    fn close(&mut self) -> Result<(), StorageError> {
        let session = self.session.take().ok_or(StorageError::NotOpen)?;
        if session.mode == AccessMode::ReadOnly || !session.dirty {
            return Ok(());
        }

        let image = session.record.encode()?;
        if image.len() > self.region.capacity() {
            return Err(StorageError::TooLarge);
        }
        self.region.write(0, &image)?;
        info!("Settings: wrote {} bytes to flash", image.len());
        Ok(())
    }

    fn discard(&mut self) {
        if let Some(session) = self.session.take()
            && session.dirty
        {
            debug!("Settings: discarding unsaved changes");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    /// Flash-Bereich im RAM, gelöscht = 0xFF
    struct RamRegion {
        data: Vec<u8>,
        writes: usize,
    }

    impl RamRegion {
        fn erased(size: usize) -> Self {
            Self {
                data: vec![0xFF; size],
                writes: 0,
            }
        }
    }

    impl FlashRegion for RamRegion {
        fn capacity(&self) -> usize {
            self.data.len()
        }

        fn read(&mut self, offset: u32, buf: &mut [u8]) -> Result<(), StorageError> {
            let start = offset as usize;
            let src = self
                .data
                .get(start..start + buf.len())
                .ok_or(StorageError::ReadFailed)?;
            buf.copy_from_slice(src);
            Ok(())
        }

        fn write(&mut self, offset: u32, data: &[u8]) -> Result<(), StorageError> {
            let start = offset as usize;
            let dst = self
                .data
                .get_mut(start..start + data.len())
                .ok_or(StorageError::WriteFailed)?;
            dst.copy_from_slice(data);
            self.writes += 1;
            Ok(())
        }
    }

    #[test]
    fn test_record_set_replaces_existing_key() {
        let mut record = Record::new("ns");
        record.set("ssid", "one");
        record.set("ssid", "two");
        assert_eq!(record.len(), 1);
        assert_eq!(record.get("ssid"), Some("two"));
    }

    #[test]
    fn test_record_image_layout() {
        let mut record = Record::new("ns");
        record.set("k", "v");
        let image = record.encode().unwrap();

        assert_eq!(&image[..4], b"MP3S");
        assert_eq!(image[4], VERSION);
        // Längen als Varint: 2 "ns" | 1 | 1 "k" | 1 "v"
        assert_eq!(body_len(&image), Some(8));
        assert_eq!(image.len(), HEADER_LEN + 8 + CHECKSUM_LEN);
        assert_eq!(Record::decode(&image), Ok(record));
    }

    #[test]
    fn test_record_decode_rejects_bad_checksum() {
        let mut record = Record::new("ns");
        record.set("server", "music.local");
        let mut image = record.encode().unwrap();
        image[HEADER_LEN + 3] ^= 0x01;
        assert_eq!(Record::decode(&image), Err(StorageError::Corrupt));
    }

    #[test]
    fn test_record_decode_rejects_truncated_image() {
        let mut record = Record::new("ns");
        record.set("server", "music.local");
        let image = record.encode().unwrap();
        assert_eq!(
            Record::decode(&image[..image.len() - 1]),
            Err(StorageError::Corrupt)
        );
    }

    #[test]
    fn test_record_decode_rejects_erased_flash() {
        assert_eq!(Record::decode(&[0xFF; 64]), Err(StorageError::Corrupt));
    }

    #[test]
    fn test_record_encode_rejects_long_value() {
        let mut record = Record::new("ns");
        let long = "x".repeat(MAX_FIELD_LEN + 1);
        record.set("pass", &long);
        assert_eq!(record.encode(), Err(StorageError::TooLarge));
    }

    #[test]
    fn test_storage_erased_flash_reads_empty() {
        let mut storage = RecordStorage::new(RamRegion::erased(4096));
        storage.open("mp3player", AccessMode::ReadOnly).unwrap();
        assert_eq!(storage.get("ssid"), Ok(None));
        storage.close().unwrap();
    }

    #[test]
    fn test_storage_write_then_read_back() {
        let mut storage = RecordStorage::new(RamRegion::erased(4096));

        storage.open("mp3player", AccessMode::ReadWrite).unwrap();
        storage.put("ssid", "HomeNet").unwrap();
        storage.put("server", "music.local").unwrap();
        storage.close().unwrap();
        assert_eq!(storage.region().writes, 1);

        storage.open("mp3player", AccessMode::ReadOnly).unwrap();
        assert_eq!(storage.get("ssid"), Ok(Some("HomeNet".into())));
        assert_eq!(storage.get("server"), Ok(Some("music.local".into())));
        assert_eq!(storage.get("pass"), Ok(None));
        storage.close().unwrap();
    }

    #[test]
    fn test_storage_put_in_read_only_session_fails() {
        let mut storage = RecordStorage::new(RamRegion::erased(4096));
        storage.open("mp3player", AccessMode::ReadOnly).unwrap();
        assert_eq!(storage.put("ssid", "x"), Err(StorageError::ReadOnly));
        storage.close().unwrap();
        assert_eq!(storage.region().writes, 0);
    }

    #[test]
    fn test_storage_unchanged_session_does_not_write() {
        let mut storage = RecordStorage::new(RamRegion::erased(4096));
        storage.open("mp3player", AccessMode::ReadWrite).unwrap();
        storage.close().unwrap();
        assert_eq!(storage.region().writes, 0);
    }

    #[test]
    fn test_storage_discard_keeps_flash_unchanged() {
        let mut storage = RecordStorage::new(RamRegion::erased(4096));
        storage.open("mp3player", AccessMode::ReadWrite).unwrap();
        storage.put("ssid", "HomeNet").unwrap();
        storage.close().unwrap();

        storage.open("mp3player", AccessMode::ReadWrite).unwrap();
        storage.put("ssid", "OtherNet").unwrap();
        storage.discard();
        assert_eq!(storage.region().writes, 1);
        assert_eq!(storage.close(), Err(StorageError::NotOpen));

        storage.open("mp3player", AccessMode::ReadOnly).unwrap();
        assert_eq!(storage.get("ssid"), Ok(Some("HomeNet".into())));
        storage.close().unwrap();
    }

    #[test]
    fn test_storage_requires_open_session() {
        let mut storage = RecordStorage::new(RamRegion::erased(4096));
        assert_eq!(storage.get("ssid"), Err(StorageError::NotOpen));
        assert_eq!(storage.put("ssid", "x"), Err(StorageError::NotOpen));
        assert_eq!(storage.close(), Err(StorageError::NotOpen));
    }

    #[test]
    fn test_storage_other_namespace_reads_empty() {
        let mut storage = RecordStorage::new(RamRegion::erased(4096));
        storage.open("first", AccessMode::ReadWrite).unwrap();
        storage.put("ssid", "HomeNet").unwrap();
        storage.close().unwrap();

        storage.open("second", AccessMode::ReadOnly).unwrap();
        assert_eq!(storage.get("ssid"), Ok(None));
        storage.close().unwrap();
    }

    #[test]
    fn test_storage_corrupt_flash_reads_empty() {
        let mut storage = RecordStorage::new(RamRegion::erased(4096));
        storage.open("mp3player", AccessMode::ReadWrite).unwrap();
        storage.put("ssid", "HomeNet").unwrap();
        storage.close().unwrap();

        // Ein Bit im Body kippen
        storage.region_mut().data[HEADER_LEN + 2] ^= 0x40;

        storage.open("mp3player", AccessMode::ReadOnly).unwrap();
        assert_eq!(storage.get("ssid"), Ok(None));
        storage.close().unwrap();
    }

    #[test]
    fn test_storage_image_too_large_for_region() {
        let mut storage = RecordStorage::new(RamRegion::erased(16));
        storage.open("mp3player", AccessMode::ReadWrite).unwrap();
        storage.put("server", "music.local").unwrap();
        assert_eq!(storage.close(), Err(StorageError::TooLarge));
    }
}

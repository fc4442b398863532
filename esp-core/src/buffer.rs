//! Read-Ahead-Puffer zwischen Netzwerk-Quelle und Decoder
//!
//! Fester Speicher, wird bei jeder Session einmal angelegt. Gelesene Bytes
//! werden vorne verbraucht, neue Daten hinten angehängt; vor dem Nachladen
//! wird der Rest an den Anfang geschoben.

use alloc::boxed::Box;
use alloc::vec;

use crate::traits::{SourceError, StreamSource};

/// Puffergröße in Bytes
pub const READ_AHEAD_SIZE: usize = 8192;

pub struct ReadAheadBuffer<S: StreamSource> {
    source: S,
    data: Box<[u8]>,
    start: usize,
    end: usize,
    eof: bool,
}

impl<S: StreamSource> ReadAheadBuffer<S> {
    pub fn new(source: S, capacity: usize) -> Self {
        Self {
            source,
            data: vec![0u8; capacity.max(1)].into_boxed_slice(),
            start: 0,
            end: 0,
            eof: false,
        }
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Anzahl gepufferter, noch nicht verbrauchter Bytes
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn is_full(&self) -> bool {
        self.len() == self.capacity()
    }

    /// Quelle hat Ende des Streams gemeldet
    pub fn is_eof(&self) -> bool {
        self.eof
    }

    pub fn available(&self) -> &[u8] {
        &self.data[self.start..self.end]
    }

    /// Markiert `n` Bytes als verbraucht
    pub fn consume(&mut self, n: usize) {
        self.start = (self.start + n).min(self.end);
        if self.start == self.end {
            self.start = 0;
            self.end = 0;
        }
    }

    /// Verwirft alle gepufferten Bytes
    pub fn clear(&mut self) {
        self.start = 0;
        self.end = 0;
    }

    /// Liest einmal von der Quelle nach
    ///
    /// Rückgabe: Anzahl neuer Bytes. `Ok(0)` bei vollem Puffer oder am
    /// Stream-Ende (dann ist `is_eof()` gesetzt).
    pub async fn fill(&mut self) -> Result<usize, SourceError> {
        if self.eof || self.is_full() {
            return Ok(0);
        }

        if self.end == self.capacity() {
            self.data.copy_within(self.start..self.end, 0);
            self.end -= self.start;
            self.start = 0;
        }

        let n = self.source.read(&mut self.data[self.end..]).await?;
        if n == 0 {
            self.eof = true;
        }
        self.end += n;
        Ok(n)
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Gibt den Pufferspeicher frei und liefert die Quelle zurück
    pub fn into_source(self) -> S {
        let Self { source, data, .. } = self;
        drop(data);
        source
    }
}

//! Playback Controller
//!
//! Besitzt höchstens eine Session aus Quelle → Read-Ahead-Puffer → Decoder
//! und die gemeinsame Audio-Ausgabe.
//!
//! Zustände: Idle ↔ Playing
//! - `start`: beendet eine laufende Session, öffnet die neue und startet den
//!   Decoder. Schlägt etwas fehl, wird alles freigegeben (Idle).
//! - `tick`: ein Decode-Schritt pro Schleifendurchlauf. Ende des Streams
//!   und Fehler führen beide zu Idle.
//! - `stop`: gibt Decoder, Puffer und Quelle frei (in dieser Reihenfolge).

use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec;

use crate::buffer::ReadAheadBuffer;
use crate::traits::{
    AudioSink, FrameDecoder, PlaybackError, SinkError, SourceError, SourceFactory, StreamSource,
};
use crate::types::PlaybackState;

/// Maximale Anzahl Bytes ohne gültigen Frame, bevor der Stream als
/// nicht abspielbar gilt
pub const MAX_SYNC_BYTES: usize = 32 * 1024;

/// Ergebnis eines Decode-Schritts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Frame,
    Finished,
}

/// Warum ein Decode-Schritt abgebrochen hat (nur fürs Log)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
enum StepError {
    Source(SourceError),
    Sink(SinkError),
    NoSync,
}

/// Eine laufende Wiedergabe
struct Session<S: StreamSource, D: FrameDecoder> {
    decoder: D,
    buffer: ReadAheadBuffer<S>,
    pcm: Box<[f32]>,
}

impl<S: StreamSource, D: FrameDecoder> Session<S, D> {
    fn new(source: S, decoder: D, read_ahead: usize) -> Self {
        Self {
            decoder,
            buffer: ReadAheadBuffer::new(source, read_ahead),
            pcm: vec![0f32; D::MAX_SAMPLES_PER_FRAME].into_boxed_slice(),
        }
    }

    /// Dekodiert höchstens einen Frame und gibt ihn aus
    async fn step<O: AudioSink>(&mut self, output: &mut O) -> Result<Step, StepError> {
        let refill_below = self.buffer.capacity() / 2;
        let mut skipped = 0usize;

        loop {
            if !self.buffer.is_eof() && self.buffer.len() < refill_below {
                self.buffer.fill().await.map_err(StepError::Source)?;
            }

            if self.buffer.is_empty() && self.buffer.is_eof() {
                return Ok(Step::Finished);
            }

            let (consumed, frame) = self.decoder.decode(self.buffer.available(), &mut self.pcm);
            self.buffer.consume(consumed);

            if let Some(info) = frame {
                let len = info.pcm_len().min(self.pcm.len());
                output
                    .write(&self.pcm[..len], info)
                    .await
                    .map_err(StepError::Sink)?;
                return Ok(Step::Frame);
            }

            if consumed > 0 {
                skipped += consumed;
            } else if self.buffer.is_eof() {
                // Rest reicht für keinen Frame mehr
                return Ok(Step::Finished);
            } else if self.buffer.is_full() {
                // Voller Puffer ohne Frame: Daten verwerfen
                skipped += self.buffer.len();
                self.buffer.clear();
            } else {
                self.buffer.fill().await.map_err(StepError::Source)?;
            }

            if skipped > MAX_SYNC_BYTES {
                return Err(StepError::NoSync);
            }
        }
    }

    /// Gibt Decoder, Puffer und Quelle frei (in dieser Reihenfolge)
    async fn close(self) {
        let Self {
            decoder,
            buffer,
            pcm,
        } = self;
        drop(decoder);
        drop(pcm);
        let mut source = buffer.into_source();
        source.close().await;
    }
}

/// Steuert die Wiedergabe, höchstens eine Session gleichzeitig
pub struct PlaybackController<F: SourceFactory, D: FrameDecoder + Default, O: AudioSink> {
    sources: F,
    output: O,
    session: Option<Session<F::Source, D>>,
    read_ahead: usize,
    url: Option<String>,
    title: Option<String>,
    frames: u32,
}

impl<F, D, O> PlaybackController<F, D, O>
where
    F: SourceFactory,
    D: FrameDecoder + Default,
    O: AudioSink,
{
    pub fn new(sources: F, output: O, read_ahead: usize) -> Self {
        Self {
            sources,
            output,
            session: None,
            read_ahead,
            url: None,
            title: None,
            frames: 0,
        }
    }

    pub fn state(&self) -> PlaybackState {
        if self.session.is_some() {
            PlaybackState::Playing
        } else {
            PlaybackState::Idle
        }
    }

    pub fn is_playing(&self) -> bool {
        self.session.is_some()
    }

    /// URL der laufenden Session
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// Letzter Titel aus den Stream-Metadaten
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Ausgegebene Frames der laufenden Session
    pub fn frames(&self) -> u32 {
        self.frames
    }

    pub fn sources(&self) -> &F {
        &self.sources
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    /// Startet die Wiedergabe einer URL
    ///
    /// Ohne Link wird nichts angelegt und `NotLinked` zurückgegeben.
    /// Sonst wird eine laufende Session zuerst komplett beendet.
    pub async fn start(&mut self, url: &str, linked: bool) -> Result<(), PlaybackError> {
        if !linked {
            return Err(PlaybackError::NotLinked);
        }

        self.stop().await;
        info!("Player: opening {}", url);

        let source = self
            .sources
            .open(url)
            .await
            .map_err(PlaybackError::Source)?;

        let mut session = Session::new(source, D::default(), self.read_ahead);
        match session.step(&mut self.output).await {
            Ok(Step::Frame) => {}
            Ok(Step::Finished) => {
                warn!("Player: stream ended before first frame");
                session.close().await;
                self.output.stop().await;
                return Err(PlaybackError::DecoderInit);
            }
            Err(e) => {
                warn!("Player: decoder start failed: {}", e);
                session.close().await;
                self.output.stop().await;
                return Err(PlaybackError::DecoderInit);
            }
        }

        self.session = Some(session);
        self.url = Some(url.into());
        self.frames = 1;
        self.poll_title();
        info!("Player: playing");
        Ok(())
    }

    /// Ein Decode-Schritt, no-op wenn Idle
    pub async fn tick(&mut self) -> PlaybackState {
        let Some(session) = self.session.as_mut() else {
            return PlaybackState::Idle;
        };

        match session.step(&mut self.output).await {
            Ok(Step::Frame) => {
                self.frames = self.frames.wrapping_add(1);
                self.poll_title();
            }
            Ok(Step::Finished) => {
                info!("Player: stream finished after {} frames", self.frames);
                self.stop().await;
            }
            Err(e) => {
                // Für den Aufrufer wie ein normales Ende
                warn!("Player: stream stopped after {} frames: {}", self.frames, e);
                self.stop().await;
            }
        }

        self.state()
    }

    /// Beendet die Wiedergabe; mehrfacher Aufruf ist unkritisch
    pub async fn stop(&mut self) {
        if let Some(session) = self.session.take() {
            session.close().await;
            self.output.stop().await;
            info!("Player: stopped");
        }
        self.url = None;
        self.title = None;
        self.frames = 0;
    }

    fn poll_title(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if let Some(title) = session.buffer.source_mut().take_title() {
            info!("Player: now playing '{}'", title.as_str());
            self.title = Some(title);
        }
    }
}

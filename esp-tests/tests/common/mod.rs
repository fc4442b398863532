//! Gemeinsame Mocks für die Integration Tests
//!
//! Alle Mocks teilen ihren Zustand über `Rc<RefCell<..>>`, damit ein Test
//! nach der Übergabe an `App` weiter hineinschauen und eingreifen kann.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use esp_core::{
    AccessMode, App, AppConfig, AudioSink, Board, BoardParts, ButtonInput, ConsolePort, Delay,
    FlashRegion, FrameDecoder, FrameInfo, KeyValueStorage, LinkError, RandomSource, SinkError,
    SourceError, SourceFactory, StorageError, StreamSource, SystemControl, WifiLink,
};

// ============================================================================
// Ereignis-Log (Reihenfolge von Freigaben prüfen)
// ============================================================================

thread_local! {
    static EVENTS: RefCell<Vec<&'static str>> = const { RefCell::new(Vec::new()) };
}

pub fn record_event(event: &'static str) {
    EVENTS.with(|events| events.borrow_mut().push(event));
}

/// Alle Ereignisse seit dem letzten Aufruf
pub fn take_events() -> Vec<&'static str> {
    EVENTS.with(|events| std::mem::take(&mut *events.borrow_mut()))
}

// ============================================================================
// Mock WiFi Link
// ============================================================================

#[derive(Default)]
pub struct LinkState {
    /// Live-Status, den der "Treiber" meldet
    pub linked: bool,
    /// Nach so vielen Abfragen gilt ein Versuch als verbunden (None = nie)
    pub link_after_polls: Option<u32>,
    pub fail_begin: bool,
    pub connecting: bool,
    pub polls: u32,
    pub begin_count: usize,
    pub abort_count: usize,
    pub last_ssid: String,
    pub last_passphrase: String,
}

#[derive(Clone, Default)]
pub struct MockLink(pub Rc<RefCell<LinkState>>);

impl MockLink {
    /// Link, der sich beim ersten Abfragen verbindet
    pub fn reachable() -> Self {
        let link = Self::default();
        link.0.borrow_mut().link_after_polls = Some(0);
        link
    }

    pub fn set_linked(&self, linked: bool) {
        self.0.borrow_mut().linked = linked;
    }

    pub fn begin_count(&self) -> usize {
        self.0.borrow().begin_count
    }

    pub fn abort_count(&self) -> usize {
        self.0.borrow().abort_count
    }
}

impl WifiLink for MockLink {
    async fn begin(&mut self, ssid: &str, passphrase: &str) -> Result<(), LinkError> {
        let mut state = self.0.borrow_mut();
        state.begin_count += 1;
        state.last_ssid = ssid.into();
        state.last_passphrase = passphrase.into();
        if state.fail_begin {
            return Err(LinkError::ConnectFailed);
        }
        state.connecting = true;
        state.polls = 0;
        Ok(())
    }

    fn is_linked(&mut self) -> bool {
        let mut state = self.0.borrow_mut();
        if state.connecting && !state.linked {
            if let Some(after) = state.link_after_polls {
                if state.polls >= after {
                    state.linked = true;
                    state.connecting = false;
                } else {
                    state.polls += 1;
                }
            }
        }
        state.linked
    }

    async fn abort(&mut self) {
        let mut state = self.0.borrow_mut();
        state.abort_count += 1;
        state.connecting = false;
        state.linked = false;
    }
}

// ============================================================================
// Mock Delay
// ============================================================================

/// Zeichnet alle Wartezeiten auf, wartet selbst nie
#[derive(Clone, Default)]
pub struct MockDelay(pub Rc<RefCell<Vec<u32>>>);

impl MockDelay {
    pub fn total_ms(&self) -> u64 {
        self.0.borrow().iter().map(|&ms| ms as u64).sum()
    }

    pub fn calls(&self) -> Vec<u32> {
        self.0.borrow().clone()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

impl Delay for MockDelay {
    async fn delay_ms(&mut self, ms: u32) {
        self.0.borrow_mut().push(ms);
    }
}

// ============================================================================
// Mock Stream-Quelle
// ============================================================================

/// Stream-Inhalt, den jede geöffnete Quelle liefert
#[derive(Clone, Default)]
pub struct Script {
    pub chunks: Vec<Vec<u8>>,
    /// Fehler nach dem letzten Chunk statt Stream-Ende
    pub fail_after: Option<SourceError>,
    pub fail_open: Option<SourceError>,
    pub title: Option<String>,
}

#[derive(Default)]
pub struct SourceLog {
    pub urls: Vec<String>,
    pub opened: usize,
    pub closed: usize,
    /// Höchste Anzahl gleichzeitig offener Quellen
    pub max_live: usize,
    pub script: Script,
}

impl SourceLog {
    pub fn live(&self) -> usize {
        self.opened - self.closed
    }
}

#[derive(Clone, Default)]
pub struct MockSourceFactory(pub Rc<RefCell<SourceLog>>);

impl MockSourceFactory {
    pub fn with_script(script: Script) -> Self {
        let factory = Self::default();
        factory.0.borrow_mut().script = script;
        factory
    }

    pub fn opened(&self) -> usize {
        self.0.borrow().opened
    }

    pub fn closed(&self) -> usize {
        self.0.borrow().closed
    }

    pub fn live(&self) -> usize {
        self.0.borrow().live()
    }

    pub fn max_live(&self) -> usize {
        self.0.borrow().max_live
    }

    pub fn urls(&self) -> Vec<String> {
        self.0.borrow().urls.clone()
    }

    pub fn set_script(&self, script: Script) {
        self.0.borrow_mut().script = script;
    }
}

pub struct MockSource {
    log: Rc<RefCell<SourceLog>>,
    chunks: VecDeque<Vec<u8>>,
    fail_after: Option<SourceError>,
    title: Option<String>,
    closed: bool,
}

impl StreamSource for MockSource {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, SourceError> {
        assert!(!self.closed, "read after close");
        let Some(mut chunk) = self.chunks.pop_front() else {
            return match self.fail_after {
                Some(e) => Err(e),
                None => Ok(0),
            };
        };

        let n = chunk.len().min(buf.len());
        buf[..n].copy_from_slice(&chunk[..n]);
        if n < chunk.len() {
            chunk.drain(..n);
            self.chunks.push_front(chunk);
        }
        Ok(n)
    }

    fn take_title(&mut self) -> Option<String> {
        self.title.take()
    }

    async fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.log.borrow_mut().closed += 1;
            record_event("source closed");
        }
    }
}

impl SourceFactory for MockSourceFactory {
    type Source = MockSource;

    async fn open(&mut self, url: &str) -> Result<MockSource, SourceError> {
        let mut log = self.0.borrow_mut();
        log.urls.push(url.into());
        if let Some(e) = log.script.fail_open {
            return Err(e);
        }

        log.opened += 1;
        log.max_live = log.max_live.max(log.live());
        record_event("source opened");

        Ok(MockSource {
            log: self.0.clone(),
            chunks: log.script.chunks.iter().cloned().collect(),
            fail_after: log.script.fail_after,
            title: log.script.title.clone(),
            closed: false,
        })
    }
}

// ============================================================================
// Fake Decoder
// ============================================================================

/// Sync-Wort eines Fake-Frames
pub const FRAME_SYNC: [u8; 2] = [0xFF, 0xFB];
pub const FRAME_LEN: usize = 4;

/// Ein Fake-Frame: Sync-Wort + 2 Bytes "Audio"
pub fn frame(a: u8, b: u8) -> [u8; FRAME_LEN] {
    [FRAME_SYNC[0], FRAME_SYNC[1], a, b]
}

/// `count` Frames hintereinander
pub fn frames(count: usize) -> Vec<u8> {
    (0..count).flat_map(|i| frame(i as u8, 0)).collect()
}

/// Decoder für Fake-Frames (4 Bytes → 2 Stereo-Samples)
///
/// Alles vor einem Sync-Wort wird übersprungen.
#[derive(Default)]
pub struct FakeDecoder;

impl FrameDecoder for FakeDecoder {
    const MAX_SAMPLES_PER_FRAME: usize = 8;

    fn decode(&mut self, input: &[u8], pcm: &mut [f32]) -> (usize, Option<FrameInfo>) {
        let sync = input.windows(2).position(|w| w == FRAME_SYNC);
        match sync {
            Some(0) if input.len() >= FRAME_LEN => {
                let a = input[2] as f32 / 255.0;
                let b = input[3] as f32 / 255.0;
                pcm[..4].copy_from_slice(&[a, a, b, b]);
                let info = FrameInfo {
                    samples: 2,
                    channels: 2,
                    sample_rate: 44_100,
                    bitrate_kbps: 128,
                };
                (FRAME_LEN, Some(info))
            }
            Some(0) => (0, None),
            Some(skip) => (skip, None),
            // Letztes Byte könnte Anfang eines Sync-Worts sein
            None if input.last() == Some(&FRAME_SYNC[0]) => (input.len() - 1, None),
            None => (input.len(), None),
        }
    }
}

impl Drop for FakeDecoder {
    fn drop(&mut self) {
        record_event("decoder dropped");
    }
}

// ============================================================================
// Mock Audio-Ausgabe
// ============================================================================

#[derive(Default)]
pub struct SinkState {
    pub frames: usize,
    pub samples: usize,
    pub stops: usize,
    pub fail_writes: bool,
}

#[derive(Clone, Default)]
pub struct MockSink(pub Rc<RefCell<SinkState>>);

impl MockSink {
    pub fn frames(&self) -> usize {
        self.0.borrow().frames
    }

    pub fn stops(&self) -> usize {
        self.0.borrow().stops
    }
}

impl AudioSink for MockSink {
    async fn write(&mut self, pcm: &[f32], frame: FrameInfo) -> Result<(), SinkError> {
        let mut state = self.0.borrow_mut();
        if state.fail_writes {
            return Err(SinkError::WriteFailed);
        }
        assert_eq!(pcm.len(), frame.pcm_len());
        state.frames += 1;
        state.samples += frame.samples;
        Ok(())
    }

    async fn stop(&mut self) {
        self.0.borrow_mut().stops += 1;
        record_event("sink stopped");
    }
}

// ============================================================================
// Mock Key-Value-Speicher
// ============================================================================

#[derive(Default)]
pub struct StorageState {
    pub values: HashMap<(String, String), String>,
    pub session: Option<(String, AccessMode)>,
    pub opens: Vec<AccessMode>,
    pub closes: usize,
    pub discards: usize,
    pub puts: usize,
    pub fail_open: bool,
    pub fail_put: bool,
}

#[derive(Clone, Default)]
pub struct MockStorage(pub Rc<RefCell<StorageState>>);

impl MockStorage {
    pub fn with_values(namespace: &str, values: &[(&str, &str)]) -> Self {
        let storage = Self::default();
        {
            let mut state = storage.0.borrow_mut();
            for (key, value) in values {
                state
                    .values
                    .insert((namespace.into(), (*key).into()), (*value).into());
            }
        }
        storage
    }

    pub fn value(&self, namespace: &str, key: &str) -> Option<String> {
        self.0
            .borrow()
            .values
            .get(&(namespace.to_string(), key.to_string()))
            .cloned()
    }

    pub fn is_open(&self) -> bool {
        self.0.borrow().session.is_some()
    }

    pub fn opens(&self) -> Vec<AccessMode> {
        self.0.borrow().opens.clone()
    }

    pub fn closes(&self) -> usize {
        self.0.borrow().closes
    }

    pub fn discards(&self) -> usize {
        self.0.borrow().discards
    }

    pub fn puts(&self) -> usize {
        self.0.borrow().puts
    }
}

impl KeyValueStorage for MockStorage {
    fn open(&mut self, namespace: &str, mode: AccessMode) -> Result<(), StorageError> {
        let mut state = self.0.borrow_mut();
        assert!(state.session.is_none(), "session already open");
        if state.fail_open {
            return Err(StorageError::ReadFailed);
        }
        state.opens.push(mode);
        state.session = Some((namespace.into(), mode));
        Ok(())
    }

    fn get(&mut self, key: &str) -> Result<Option<String>, StorageError> {
        let state = self.0.borrow();
        let (namespace, _) = state.session.as_ref().ok_or(StorageError::NotOpen)?;
        Ok(state.values.get(&(namespace.clone(), key.to_string())).cloned())
    }

    fn put(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut state = self.0.borrow_mut();
        let (namespace, mode) = state.session.clone().ok_or(StorageError::NotOpen)?;
        if mode == AccessMode::ReadOnly {
            return Err(StorageError::ReadOnly);
        }
        if state.fail_put {
            return Err(StorageError::WriteFailed);
        }
        state.puts += 1;
        state.values.insert((namespace, key.into()), value.into());
        Ok(())
    }

    fn close(&mut self) -> Result<(), StorageError> {
        let mut state = self.0.borrow_mut();
        state.session.take().ok_or(StorageError::NotOpen)?;
        state.closes += 1;
        Ok(())
    }

    fn discard(&mut self) {
        let mut state = self.0.borrow_mut();
        if state.session.take().is_some() {
            state.discards += 1;
        }
    }
}

// ============================================================================
// Mock Flash (für RecordStorage)
// ============================================================================

/// RAM-Flash, gelöscht = 0xFF
#[derive(Clone)]
pub struct MockFlash(pub Rc<RefCell<Vec<u8>>>);

impl MockFlash {
    pub fn erased(size: usize) -> Self {
        Self(Rc::new(RefCell::new(vec![0xFF; size])))
    }
}

impl FlashRegion for MockFlash {
    fn capacity(&self) -> usize {
        self.0.borrow().len()
    }

    fn read(&mut self, offset: u32, buf: &mut [u8]) -> Result<(), StorageError> {
        let data = self.0.borrow();
        let start = offset as usize;
        let end = start + buf.len();
        if end > data.len() {
            return Err(StorageError::ReadFailed);
        }
        buf.copy_from_slice(&data[start..end]);
        Ok(())
    }

    fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<(), StorageError> {
        let mut data = self.0.borrow_mut();
        let start = offset as usize;
        let end = start + bytes.len();
        if end > data.len() {
            return Err(StorageError::WriteFailed);
        }
        data[start..end].copy_from_slice(bytes);
        Ok(())
    }
}

// ============================================================================
// Mock Taster, Konsole, RNG, System
// ============================================================================

/// Taster mit Pull-Up: ruht High
#[derive(Clone)]
pub struct MockButton(pub Rc<Cell<bool>>);

impl Default for MockButton {
    fn default() -> Self {
        Self(Rc::new(Cell::new(true)))
    }
}

impl MockButton {
    pub fn press(&self) {
        self.0.set(false);
    }

    pub fn release(&self) {
        self.0.set(true);
    }
}

impl ButtonInput for MockButton {
    fn is_high(&mut self) -> bool {
        self.0.get()
    }
}

#[derive(Default)]
pub struct ConsoleState {
    pub input: VecDeque<u8>,
    pub output: Vec<u8>,
}

#[derive(Clone, Default)]
pub struct MockConsole(pub Rc<RefCell<ConsoleState>>);

impl MockConsole {
    /// Schickt eine Zeile (mit CR/LF) an die Konsole
    pub fn send(&self, line: &str) {
        let mut state = self.0.borrow_mut();
        state.input.extend(line.bytes());
        state.input.extend(b"\r\n");
    }

    /// Bisherige Ausgabe als Text, danach geleert
    pub fn take_output(&self) -> String {
        let bytes = std::mem::take(&mut self.0.borrow_mut().output);
        String::from_utf8(bytes).expect("console output is not UTF-8")
    }
}

impl ConsolePort for MockConsole {
    fn read_byte(&mut self) -> Option<u8> {
        self.0.borrow_mut().input.pop_front()
    }

    fn write_bytes(&mut self, bytes: &[u8]) {
        self.0.borrow_mut().output.extend_from_slice(bytes);
    }
}

/// Liefert immer den gesetzten Wert
#[derive(Clone, Default)]
pub struct MockRng(pub Rc<Cell<u32>>);

impl RandomSource for MockRng {
    fn next_u32(&mut self) -> u32 {
        self.0.get()
    }
}

#[derive(Clone, Default)]
pub struct MockSystem(pub Rc<Cell<usize>>);

impl MockSystem {
    pub fn restarts(&self) -> usize {
        self.0.get()
    }
}

impl SystemControl for MockSystem {
    fn restart(&mut self) {
        self.0.set(self.0.get() + 1);
    }
}

// ============================================================================
// Mock Board + Test-Rig
// ============================================================================

pub struct MockBoard;

impl Board for MockBoard {
    type Link = MockLink;
    type Delay = MockDelay;
    type Sources = MockSourceFactory;
    type Decoder = FakeDecoder;
    type Output = MockSink;
    type Storage = MockStorage;
    type Button = MockButton;
    type Console = MockConsole;
    type Rng = MockRng;
    type System = MockSystem;
}

/// Alle Mocks eines Boards, Handles bleiben beim Test
#[derive(Clone, Default)]
pub struct Rig {
    pub link: MockLink,
    pub delay: MockDelay,
    pub sources: MockSourceFactory,
    pub sink: MockSink,
    pub storage: MockStorage,
    pub button: MockButton,
    pub console: MockConsole,
    pub rng: MockRng,
    pub system: MockSystem,
}

impl Rig {
    /// Rig mit erreichbarem Access Point und gespeicherten Einstellungen
    pub fn configured() -> Self {
        let rig = Self {
            link: MockLink::reachable(),
            storage: MockStorage::with_values(
                esp_core::settings::NAMESPACE,
                &[("ssid", "HomeNet"), ("pass", "secret"), ("server", "music.local")],
            ),
            ..Self::default()
        };
        rig.sources.set_script(Script {
            chunks: vec![frames(8)],
            ..Script::default()
        });
        rig
    }

    pub fn parts(&self, with_console: bool) -> BoardParts<MockBoard> {
        BoardParts {
            link: self.link.clone(),
            delay: self.delay.clone(),
            sources: self.sources.clone(),
            output: self.sink.clone(),
            storage: self.storage.clone(),
            button: self.button.clone(),
            console: with_console.then(|| self.console.clone()),
            rng: self.rng.clone(),
            system: self.system.clone(),
        }
    }

    pub fn app(&self) -> App<MockBoard> {
        App::new(AppConfig::default(), self.parts(true))
    }

    /// Gebootete App mit Konsole, Boot-Ausgabe ist bereits verworfen
    pub fn booted(&self) -> App<MockBoard> {
        let mut app = self.app();
        embassy_futures::block_on(app.boot(None));
        self.console.take_output();
        self.delay.clear();
        take_events();
        app
    }
}

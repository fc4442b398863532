// MP3 Decoder (nanomp3)
//
// Der Decoder-Zustand ist einige KB groß und liegt deshalb auf dem Heap.
// Pro Wiedergabe-Session wird ein neuer Decoder angelegt.

use alloc::boxed::Box;

use esp_core::{FrameDecoder, FrameInfo};

pub struct Mp3Decoder {
    inner: Box<nanomp3::Decoder>,
}

impl Default for Mp3Decoder {
    fn default() -> Self {
        Self {
            inner: Box::new(nanomp3::Decoder::new()),
        }
    }
}

impl FrameDecoder for Mp3Decoder {
    const MAX_SAMPLES_PER_FRAME: usize = nanomp3::MAX_SAMPLES_PER_FRAME;

    fn decode(&mut self, input: &[u8], pcm: &mut [f32]) -> (usize, Option<FrameInfo>) {
        let (consumed, info) = self.inner.decode(input, pcm);
        let info = info.map(|info| FrameInfo {
            samples: info.samples_produced as usize,
            channels: info.channels.num() as u8,
            sample_rate: info.sample_rate as u32,
            bitrate_kbps: info.bitrate as u32,
        });
        (consumed, info)
    }
}

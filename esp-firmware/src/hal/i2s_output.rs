// I2S Audio-Ausgabe zum externen DAC
//
// Feste Ausgabe-Rate (16 Bit Stereo, Philips). Jeder dekodierte Frame wird in
// den DMA-Puffer gerendert und als One-Shot-Transfer ausgegeben.

use defmt::{Debug2Format, debug, warn};
use esp_core::pcm::{render_frame, upsample_factor};
use esp_core::{AudioSink, FrameInfo, SinkError};
use esp_hal::Async;
use esp_hal::i2s::master::I2sTx;

pub struct I2sOutput {
    tx: I2sTx<'static, Async>,
    buffer: &'static mut [u8],
    output_rate: u32,
    gain: f32,
    /// Zuletzt gemeldete, nicht umrechenbare Stream-Rate
    warned_rate: Option<u32>,
}

impl I2sOutput {
    pub fn new(
        tx: I2sTx<'static, Async>,
        buffer: &'static mut [u8],
        output_rate: u32,
        gain: f32,
    ) -> Self {
        Self {
            tx,
            buffer,
            output_rate,
            gain,
            warned_rate: None,
        }
    }

    fn repeat_for(&mut self, stream_rate: u32) -> usize {
        if let Some(factor) = upsample_factor(stream_rate, self.output_rate) {
            return factor;
        }
        if self.warned_rate != Some(stream_rate) {
            warn!(
                "I2S: stream rate {} Hz does not divide {} Hz, playing unconverted",
                stream_rate, self.output_rate
            );
            self.warned_rate = Some(stream_rate);
        }
        1
    }
}

impl AudioSink for I2sOutput {
    async fn write(&mut self, pcm: &[f32], frame: FrameInfo) -> Result<(), SinkError> {
        let repeat = self.repeat_for(frame.sample_rate);
        let len = render_frame(pcm, &frame, self.gain, repeat, self.buffer);
        if len == 0 {
            return Ok(());
        }

        self.tx
            .write_dma_async(&mut self.buffer[..len])
            .await
            .map_err(|e| {
                warn!("I2S: DMA write failed: {}", Debug2Format(&e));
                SinkError::WriteFailed
            })
    }

    async fn stop(&mut self) {
        // One-Shot-Transfers: nach dem letzten Frame liefert der DAC Stille
        self.warned_rate = None;
        debug!("I2S: output stopped");
    }
}

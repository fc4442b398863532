//! PCM-Aufbereitung für die I2S-Ausgabe
//!
//! Der Decoder liefert f32-Samples (interleaved, Bereich -1.0..1.0).
//! I2S erwartet 16-Bit Stereo, Little Endian, links zuerst.

use crate::types::FrameInfo;

/// Bytes pro Stereo-Sample-Paar (2 × i16)
pub const BYTES_PER_STEREO_SAMPLE: usize = 4;

/// Wandelt ein f32-Sample mit Verstärkung in i16 (mit Begrenzung)
pub fn sample_to_i16(sample: f32, gain: f32) -> i16 {
    (sample * gain * 32767.0).clamp(-32768.0, 32767.0) as i16
}

/// Ganzzahliger Faktor von Stream-Rate auf Ausgabe-Rate
///
/// `Some(2)` für 22050 → 44100, `None` wenn die Rate nicht glatt aufgeht.
pub fn upsample_factor(stream_rate: u32, output_rate: u32) -> Option<usize> {
    if stream_rate == 0 || stream_rate > output_rate || output_rate % stream_rate != 0 {
        return None;
    }
    Some((output_rate / stream_rate) as usize)
}

/// Benötigte Ausgabe-Bytes für einen Frame
pub fn rendered_len(frame: &FrameInfo, repeat: usize) -> usize {
    frame.samples * repeat.max(1) * BYTES_PER_STEREO_SAMPLE
}

/// Schreibt einen Frame als 16-Bit Stereo in `out`
///
/// Mono wird auf beide Kanäle kopiert, jedes Sample wird `repeat`-mal
/// wiederholt. Passt der Frame nicht komplett in `out`, wird abgeschnitten.
/// Rückgabe: Anzahl geschriebener Bytes.
pub fn render_frame(
    pcm: &[f32],
    frame: &FrameInfo,
    gain: f32,
    repeat: usize,
    out: &mut [u8],
) -> usize {
    let repeat = repeat.max(1);
    let channels = frame.channels.max(1) as usize;
    let mut written = 0;

    for n in 0..frame.samples {
        let base = n * channels;
        let Some(&left) = pcm.get(base) else {
            break;
        };
        let right = if channels > 1 {
            pcm.get(base + 1).copied().unwrap_or(left)
        } else {
            left
        };

        let left = sample_to_i16(left, gain).to_le_bytes();
        let right = sample_to_i16(right, gain).to_le_bytes();

        for _ in 0..repeat {
            let Some(slot) = out.get_mut(written..written + BYTES_PER_STEREO_SAMPLE) else {
                return written;
            };
            slot[..2].copy_from_slice(&left);
            slot[2..].copy_from_slice(&right);
            written += BYTES_PER_STEREO_SAMPLE;
        }
    }

    written
}

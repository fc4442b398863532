// Zeit, Zufall und Neustart

use embassy_time::{Duration, Timer};
use esp_core::{Delay, RandomSource, SystemControl};
use esp_hal::rng::Rng;

/// Kooperatives Warten über den embassy Timer
#[derive(Clone, Copy, Default)]
pub struct EmbassyDelay;

impl Delay for EmbassyDelay {
    async fn delay_ms(&mut self, ms: u32) {
        Timer::after(Duration::from_millis(ms as u64)).await;
    }
}

/// Hardware-RNG (echter Zufall, solange das Radio läuft)
pub struct HardwareRng {
    rng: Rng,
}

impl HardwareRng {
    pub fn new(rng: Rng) -> Self {
        Self { rng }
    }
}

impl RandomSource for HardwareRng {
    fn next_u32(&mut self) -> u32 {
        self.rng.random()
    }
}

#[derive(Default)]
pub struct EspSystem;

impl SystemControl for EspSystem {
    fn restart(&mut self) {
        esp_hal::system::software_reset();
    }
}

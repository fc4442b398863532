// Taster an GPIO mit internem Pull-Up
//
// Ungedrückt High, gedrückt Low. Die Flankenerkennung macht InputPoller.

use esp_core::ButtonInput;
use esp_hal::gpio::{Input, InputConfig, InputPin, Pull};

pub struct GpioButton {
    input: Input<'static>,
}

impl GpioButton {
    pub fn new(pin: impl InputPin + 'static) -> Self {
        let input = Input::new(pin, InputConfig::default().with_pull(Pull::Up));
        Self { input }
    }
}

impl ButtonInput for GpioButton {
    fn is_high(&mut self) -> bool {
        self.input.is_high()
    }
}

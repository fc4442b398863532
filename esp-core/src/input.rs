//! Flankenerkennung am Taster (Pull-Up, aktiv Low)
//!
//! Kein Entprellen: ein prellender Kontakt kann mehrere Flanken liefern.

use crate::traits::ButtonInput;
use crate::types::Edge;

pub struct InputPoller<B: ButtonInput> {
    button: B,
    last_high: bool,
}

impl<B: ButtonInput> InputPoller<B> {
    /// Übernimmt den Eingang und merkt sich den aktuellen Pegel als Startwert
    pub fn new(mut button: B) -> Self {
        let last_high = button.is_high();
        Self { button, last_high }
    }

    /// Liest den Pegel einmal und meldet `FallingEdge` nur bei High → Low
    pub fn poll(&mut self) -> Edge {
        let high = self.button.is_high();
        let edge = if self.last_high && !high {
            Edge::FallingEdge
        } else {
            Edge::None
        };
        self.last_high = high;
        edge
    }

    /// Übernimmt den aktuellen Pegel ohne Flankenmeldung
    pub fn resync(&mut self) {
        self.last_high = self.button.is_high();
    }

    pub fn button_mut(&mut self) -> &mut B {
        &mut self.button
    }
}

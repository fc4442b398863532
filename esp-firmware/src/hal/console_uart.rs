// Serielle Konsole über UART0
//
// Blocking-Treiber, aber gelesen wird nur, was schon im RX-FIFO liegt.
// Damit blockiert die Player-Schleife nie auf Eingaben.

use defmt::{Debug2Format, warn};
use esp_core::ConsolePort;
use esp_hal::Blocking;
use esp_hal::gpio::interconnect::{PeripheralInput, PeripheralOutput};
use esp_hal::peripherals::UART0;
use esp_hal::uart::{Config as UartConfig, ConfigError, Uart};

pub struct UartConsole {
    uart: Uart<'static, Blocking>,
}

impl UartConsole {
    pub fn new(
        uart0: UART0<'static>,
        tx: impl PeripheralOutput<'static>,
        rx: impl PeripheralInput<'static>,
        baudrate: u32,
    ) -> Result<Self, ConfigError> {
        let uart = Uart::new(uart0, UartConfig::default().with_baudrate(baudrate))?
            .with_tx(tx)
            .with_rx(rx);
        Ok(Self { uart })
    }
}

impl ConsolePort for UartConsole {
    fn read_byte(&mut self) -> Option<u8> {
        if !self.uart.read_ready() {
            return None;
        }

        let mut byte = [0u8; 1];
        match self.uart.read(&mut byte) {
            Ok(1) => Some(byte[0]),
            Ok(_) => None,
            Err(e) => {
                warn!("Console: RX error: {}", Debug2Format(&e));
                None
            }
        }
    }

    fn write_bytes(&mut self, bytes: &[u8]) {
        let mut rest = bytes;
        while !rest.is_empty() {
            match self.uart.write(rest) {
                Ok(written) => rest = &rest[written..],
                Err(e) => {
                    warn!("Console: TX error: {}", Debug2Format(&e));
                    return;
                }
            }
        }
    }
}

// Hardware Abstraction Layer (HAL) Module
//
// Implementiert die esp-core Traits auf den ESP32-C6 Peripherals.
// Die Player-Logik selbst steckt komplett in esp-core.

pub mod button;
pub mod console_uart;
pub mod flash_storage;
pub mod http_source;
pub mod i2s_output;
pub mod mp3_decoder;
pub mod system;
pub mod wifi_link;

pub use button::GpioButton;
pub use console_uart::UartConsole;
pub use flash_storage::{FlashSettings, SettingsFlash};
pub use http_source::{HttpSources, HttpStream};
pub use i2s_output::I2sOutput;
pub use mp3_decoder::Mp3Decoder;
pub use system::{EmbassyDelay, EspSystem, HardwareRng};
pub use wifi_link::EspWifiLink;

use esp_core::Board;

/// Das ESP32-C6 Board: ein Typ pro Hardware-Schnittstelle
pub struct EspBoard;

impl Board for EspBoard {
    type Link = EspWifiLink;
    type Delay = EmbassyDelay;
    type Sources = HttpSources;
    type Decoder = Mp3Decoder;
    type Output = I2sOutput;
    type Storage = FlashSettings;
    type Button = GpioButton;
    type Console = UartConsole;
    type Rng = HardwareRng;
    type System = EspSystem;
}

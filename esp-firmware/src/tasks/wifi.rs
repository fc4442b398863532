// WiFi Tasks - Netzwerk-Stack und Link-Überwachung
//
// Das Verbinden selbst macht die Player-Schleife (ConnectivityManager),
// hier laufen nur der embassy-net Runner und das DHCP-Logging.
use defmt::{Debug2Format, info, warn};
use embassy_net::{Runner, Stack};
use esp_radio::wifi::WifiDevice;

/// Network Task
///
/// Überwacht den Netzwerk-Stack:
/// - Prozessiert Netzwerk-Pakete
/// - Managed TCP/IP Stack und DHCP
#[embassy_executor::task]
pub async fn net_task(mut runner: Runner<'static, WifiDevice<'static>>) -> ! {
    runner.run().await
}

/// Link Monitor Task
///
/// Loggt die Netzwerk-Konfiguration jedes Mal, wenn DHCP eine Adresse
/// vergeben hat, und meldet den Verlust der Konfiguration.
#[embassy_executor::task]
pub async fn link_monitor_task(stack: &'static Stack<'static>) {
    loop {
        stack.wait_config_up().await;

        if let Some(config) = stack.config_v4() {
            info!("WiFi: Got IP address!");
            info!("  IP:      {}", Debug2Format(&config.address.address()));
            info!("  Gateway: {}", Debug2Format(&config.gateway));
            info!("  DNS:     {}", Debug2Format(&config.dns_servers));
        }

        stack.wait_config_down().await;
        warn!("WiFi: Network configuration lost");
    }
}

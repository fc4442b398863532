// Task-Modul: Enthält alle Embassy Tasks
//
// Netzwerk-Stack und Link-Monitor laufen nebenher, die Player-Schleife
// ist ein einzelner Task, dem alle Player-Zustände gehören.

pub mod player;
pub mod wifi;

// Re-export Tasks für einfachen Import
pub use player::{boot_settings, player_task};
pub use wifi::{link_monitor_task, net_task};

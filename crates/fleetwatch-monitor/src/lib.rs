pub mod config;
pub mod doctor;
pub mod monitor;

pub use config::*;
pub use doctor::*;
pub use monitor::*;

pub mod config;

pub use config::{ApiConfig, BehaviorConfig, Config, DisplayConfig};

pub mod config;
pub use config::{CaptureConfig, ConfigError};

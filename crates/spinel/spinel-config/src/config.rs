use serde::Deserialize;
use std::path::Path;

#[derive(Deserialize, Debug)]
pub struct CaptureConfig {
    /// Slots in the fan-out ring. Must be a power of two, at least 4.
    #[serde(default = "defaults::ring_capacity")]
    pub ring_capacity: usize,
    /// Sensor output data rate used by the simulated source.
    #[serde(default = "defaults::sample_rate_hz")]
    pub sample_rate_hz: u32,
    /// FIFO watermark: samples accumulated per capture event.
    #[serde(default = "defaults::watermark")]
    pub watermark: usize,
    #[serde(default = "defaults::log_level")]
    pub log_level: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read '{path}'")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config")]
    Parse(#[from] toml::de::Error),
}

mod defaults {
    pub fn ring_capacity() -> usize {
        32
    }

    pub fn sample_rate_hz() -> u32 {
        100
    }

    pub fn watermark() -> usize {
        20
    }

    pub fn log_level() -> String {
        "info".into()
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            ring_capacity: defaults::ring_capacity(),
            sample_rate_hz: defaults::sample_rate_hz(),
            watermark: defaults::watermark(),
            log_level: defaults::log_level(),
        }
    }
}

impl CaptureConfig {
    pub fn load(path: impl AsRef<Path> + ToString) -> Result<Self, ConfigError> {
        let toml_to_str = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;
        let capture_config: CaptureConfig = toml::from_str(&toml_to_str)?;
        Ok(capture_config)
    }
}

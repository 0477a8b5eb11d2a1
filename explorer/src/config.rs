use anyhow::{Context, Result};
use serde::Deserialize;
use std::time::Duration;

use crate::carousel::{AUTOPLAY_PERIOD, SAMPLE_SIZE};

/// Tuning read from `URBANSKY_*` environment variables.
#[derive(Debug, Deserialize, PartialEq)]
pub struct Config {
    /// Thumbnails shown in the homepage grid.
    #[serde(default = "default_sample_size")]
    pub sample_size: usize,
    #[serde(default = "default_autoplay_ms")]
    pub autoplay_ms: u64,
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
}

fn default_sample_size() -> usize {
    SAMPLE_SIZE
}

fn default_autoplay_ms() -> u64 {
    AUTOPLAY_PERIOD.as_millis() as u64
}

fn default_http_timeout_secs() -> u64 {
    30
}

impl Config {
    pub fn from_env() -> Result<Self> {
        envy::prefixed("URBANSKY_")
            .from_env::<Config>()
            .context("Invalid URBANSKY_* configuration")
    }

    pub fn autoplay_period(&self) -> Duration {
        Duration::from_millis(self.autoplay_ms.max(1))
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

//! Link, serial port and sequence configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CatError, Result};

/// Shortest gap the radio needs between the wake-up command and `PS1`
pub const MIN_POWER_ON_GAP_MS: u64 = 1100;

/// Timing of a single transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkConfig {
    /// How long to wait for the first answer byte before treating the
    /// command as unanswered (ms)
    pub settle_ms: u64,
    /// Upper bound for a started answer to reach its terminator (ms)
    pub response_timeout_ms: u64,
    /// Discard stale input before each write
    #[serde(default = "default_true")]
    pub clear_input: bool,
}

fn default_true() -> bool {
    true
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            settle_ms: 100,
            response_timeout_ms: 500,
            clear_input: true,
        }
    }
}

impl LinkConfig {
    /// Settle window as a `Duration`
    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    /// Response timeout as a `Duration`
    pub fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.response_timeout_ms)
    }
}

/// Serial port parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerialConfig {
    /// Serial port path (`/dev/ttyUSB0`, `COM3`)
    pub port: String,
    /// Baud rate; must match the radio's CAT RATE menu setting
    #[serde(default = "default_baud")]
    pub baud_rate: u32,
    /// Driver-level read timeout (ms)
    #[serde(default = "default_read_timeout")]
    pub read_timeout_ms: u64,
}

fn default_baud() -> u32 {
    38400
}

fn default_read_timeout() -> u64 {
    100
}

impl SerialConfig {
    /// Default settings for `port`
    pub fn new(port: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            baud_rate: default_baud(),
            read_timeout_ms: default_read_timeout(),
        }
    }

    /// Per-read timeout as a `Duration`
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self::new("/dev/ttyUSB0")
    }
}

/// Power-on sequence timing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct PowerOnConfig {
    gap_ms: u64,
}

impl PowerOnConfig {
    /// Fails if `gap_ms` is below [`MIN_POWER_ON_GAP_MS`]
    pub fn new(gap_ms: u64) -> Result<Self> {
        if gap_ms < MIN_POWER_ON_GAP_MS {
            return Err(CatError::InvalidParameter(format!(
                "power-on gap must be at least {MIN_POWER_ON_GAP_MS} ms, got {gap_ms} ms"
            )));
        }
        Ok(Self { gap_ms })
    }

    /// Wait between the wake request and `PS1`
    pub fn gap(&self) -> Duration {
        Duration::from_millis(self.gap_ms)
    }
}

impl Default for PowerOnConfig {
    fn default() -> Self {
        Self {
            gap_ms: MIN_POWER_ON_GAP_MS,
        }
    }
}

impl TryFrom<u64> for PowerOnConfig {
    type Error = CatError;

    fn try_from(gap_ms: u64) -> Result<Self> {
        Self::new(gap_ms)
    }
}

impl From<PowerOnConfig> for u64 {
    fn from(config: PowerOnConfig) -> u64 {
        config.gap_ms
    }
}

/// Polling schedule while waiting for an antenna tuning cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TuneWait {
    /// Pause between tuner state reads (ms)
    pub poll_interval_ms: u64,
    /// Give up after this many reads
    pub max_polls: u32,
}

impl Default for TuneWait {
    fn default() -> Self {
        Self {
            poll_interval_ms: 500,
            max_polls: 20,
        }
    }
}

impl TuneWait {
    /// Poll interval as a `Duration`
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

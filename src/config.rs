//! Configuration for the soundrec capture harness.
//!
//! Every section has sensible defaults, so a TOML file only needs to name the
//! values it changes:
//!
//! ```toml
//! [buffer]
//! capacity = 9600
//! overrun_policy = "drop-oldest"
//!
//! [source]
//! kind = "tone"
//! tone_hz = 1000.0
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::audio::diagnostics::DEFAULT_REPORT_INTERVAL;
use crate::error::{CaptureError, Result};

/// What a full ring buffer does with the slot it overwrites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum OverrunPolicy {
    /// Overwrite the slot at the tail (which is the head slot) and leave the
    /// head where it is. The newest sample is the next one removed.
    #[default]
    OverwriteHead,
    /// Overwrite the oldest sample and advance the head past it.
    DropOldest,
    /// Discard the incoming sample and keep the buffer unchanged.
    DropNewest,
}

/// What removing from an empty ring buffer yields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum UnderrunPolicy {
    /// Return whatever is left in the head slot and advance the head.
    #[default]
    Stale,
    /// Return `T::default()` and leave the indices untouched.
    Silence,
}

/// Where the sample stream comes from while a session is running
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKind {
    /// Default input device of the host audio API
    #[default]
    Device,
    /// Synthetic sine tone generated on a background thread
    Tone,
}

/// System-wide harness configuration
///
/// Use `HarnessConfig::default()` for sensible defaults.
///
/// # Example
/// ```
/// use soundrec::config::HarnessConfig;
///
/// let config = HarnessConfig::from_toml_str("[buffer]\ncapacity = 1024\n").unwrap();
/// assert_eq!(config.buffer.capacity, 1024);
/// assert_eq!(config.audio.sample_rate, 48000);
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Audio stream configuration
    pub audio: AudioConfig,
    /// Ring buffer configuration
    pub buffer: BufferConfig,
    /// Level monitor configuration
    pub monitor: MonitorConfig,
    /// Sample source configuration
    pub source: SourceConfig,
}

/// Audio stream configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of interleaved channels
    pub channels: u16,
    /// Frames per callback block
    pub block_size: usize,
}

/// Ring buffer configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BufferConfig {
    /// Capacity in samples (not frames)
    pub capacity: usize,
    /// One diagnostic line is logged per this many overruns or underruns
    pub report_interval: u64,
    /// `drop-newest` together with `silence` selects the lock-free ring;
    /// any other combination shares a locked `CircularBuffer`.
    pub overrun_policy: OverrunPolicy,
    pub underrun_policy: UnderrunPolicy,
}

/// Level monitor configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Interval between level reports in milliseconds
    pub report_interval_ms: u64,
    /// Samples drained per block when emptying the ring
    pub window: usize,
}

/// Sample source configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub kind: SourceKind,
    /// Tone frequency in Hz (tone source only)
    pub tone_hz: f32,
    /// Tone peak amplitude, 0-1 (tone source only)
    pub tone_amplitude: f32,
}

impl HarnessConfig {
    /// Parse a TOML document; missing sections and fields keep their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML configuration file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<()> {
        if self.audio.sample_rate == 0 {
            return Err(CaptureError::Config("sample_rate must be positive".into()));
        }
        if self.audio.channels == 0 {
            return Err(CaptureError::Config("channels must be positive".into()));
        }
        if self.audio.block_size == 0 {
            return Err(CaptureError::Config("block_size must be positive".into()));
        }
        if self.buffer.capacity == 0 {
            return Err(CaptureError::InvalidCapacity);
        }
        if self.buffer.report_interval == 0 {
            return Err(CaptureError::Config(
                "report_interval must be positive".into(),
            ));
        }
        if self.monitor.report_interval_ms == 0 {
            return Err(CaptureError::Config(
                "monitor report_interval_ms must be positive".into(),
            ));
        }
        if self.monitor.window == 0 {
            return Err(CaptureError::Config("monitor window must be positive".into()));
        }
        if self.source.kind == SourceKind::Tone {
            let nyquist = self.audio.sample_rate as f32 / 2.0;
            if self.source.tone_hz <= 0.0 || self.source.tone_hz >= nyquist {
                return Err(CaptureError::Config(format!(
                    "tone frequency {} Hz must be in (0, {}) Hz",
                    self.source.tone_hz, nyquist
                )));
            }
            if !(0.0..=1.0).contains(&self.source.tone_amplitude) {
                return Err(CaptureError::Config(
                    "tone amplitude must be within 0-1".into(),
                ));
            }
        }
        Ok(())
    }
}

impl AudioConfig {
    /// Duration of one callback block
    pub fn block_duration(&self) -> std::time::Duration {
        std::time::Duration::from_secs_f64(self.block_size as f64 / self.sample_rate as f64)
    }

    /// Samples in one interleaved block
    pub fn samples_per_block(&self) -> usize {
        self.block_size * self.channels as usize
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            channels: 1,
            block_size: 512,
        }
    }
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            // One second of mono audio at the default rate
            capacity: 48000,
            report_interval: DEFAULT_REPORT_INTERVAL,
            overrun_policy: OverrunPolicy::default(),
            underrun_policy: UnderrunPolicy::default(),
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            report_interval_ms: 500,
            window: 4800,
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: SourceKind::default(),
            tone_hz: 440.0,
            tone_amplitude: 0.5,
        }
    }
}

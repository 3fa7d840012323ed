#![forbid(unsafe_code)]

//! Frames-per-second reporting.
//!
//! A rolling average over the last N frame intervals. Display-only: nothing
//! in navigation or focus reads it.

use std::collections::VecDeque;
use std::env;
use std::time::Instant;

use navkit_core::config::{ConfigError, ConfigParse, read_usize, validate_positive};

pub const ENV_FPS_SAMPLES: &str = "NAVKIT_FPS_SAMPLES";

/// Frame rate counter configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameRateConfig {
    /// Number of frame intervals averaged.
    pub samples: usize,
}

impl Default for FrameRateConfig {
    fn default() -> Self {
        Self { samples: 30 }
    }
}

impl FrameRateConfig {
    /// Parse config from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_env_with_diagnostics().config
    }

    /// Parse config from environment variables and return diagnostics.
    #[must_use]
    pub fn from_env_with_diagnostics() -> ConfigParse<Self> {
        from_env_with(|key| env::var(key).ok())
    }

    /// Validate config constraints and return all violations.
    pub fn validate(&self) -> Result<(), Vec<ConfigError>> {
        let mut errors = Vec::new();
        validate_positive("samples", self.samples, &mut errors);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    #[must_use]
    pub fn with_samples(mut self, samples: usize) -> Self {
        self.samples = samples;
        self
    }
}

fn from_env_with<F>(mut get: F) -> ConfigParse<FrameRateConfig>
where
    F: FnMut(&str) -> Option<String>,
{
    let mut config = FrameRateConfig::default();
    let mut errors = Vec::new();
    read_usize(&mut get, ENV_FPS_SAMPLES, "samples", &mut config.samples, &mut errors);
    if let Err(invalid) = config.validate() {
        errors.extend(invalid);
        config.samples = FrameRateConfig::default().samples;
    }
    ConfigParse { config, errors }
}

/// Rolling frames-per-second estimate.
#[derive(Debug, Clone)]
pub struct FrameRateCounter {
    frame_times: VecDeque<u64>,
    last_frame: Option<Instant>,
    samples: usize,
    fps: f64,
}

impl FrameRateCounter {
    #[must_use]
    pub fn new(config: FrameRateConfig) -> Self {
        let samples = config.samples.max(1);
        Self {
            frame_times: VecDeque::with_capacity(samples),
            last_frame: None,
            samples,
            fps: 0.0,
        }
    }

    /// Record a frame at `now` and return the updated estimate.
    ///
    /// The first frame only seeds the clock. Zero-length intervals keep the
    /// previous estimate.
    pub fn tick(&mut self, now: Instant) -> f64 {
        if let Some(last) = self.last_frame {
            let elapsed_us = u64::try_from(now.saturating_duration_since(last).as_micros())
                .unwrap_or(u64::MAX);
            self.frame_times.push_back(elapsed_us);
            while self.frame_times.len() > self.samples {
                self.frame_times.pop_front();
            }
            let avg_us = self.frame_times.iter().sum::<u64>() / self.frame_times.len() as u64;
            if avg_us > 0 {
                self.fps = 1_000_000.0 / avg_us as f64;
            }
        }
        self.last_frame = Some(now);
        self.fps
    }

    /// Latest estimate, 0 until two frames were seen.
    #[must_use]
    pub fn fps(&self) -> f64 {
        self.fps
    }

    /// Forget history (after a pause, for example).
    pub fn reset(&mut self) {
        self.frame_times.clear();
        self.last_frame = None;
        self.fps = 0.0;
    }
}

impl Default for FrameRateCounter {
    fn default() -> Self {
        Self::new(FrameRateConfig::default())
    }
}

// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Engine configuration.
//!
//! Track geometry, track-length and tempo limits and the host clock rate.
//! Every field has a default, so an empty file is a valid configuration.
//! Files are read as YAML, or as TOML when the extension is `.toml`.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

/// Root engine configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct EngineConfig {
    /// Track placement and size
    #[serde(default)]
    pub track: TrackConfig,
    /// Track length limits
    #[serde(default)]
    pub length: LengthConfig,
    /// Tempo limits (ticks per step)
    #[serde(default)]
    pub tempo: TempoConfig,
    /// Host clock
    #[serde(default)]
    pub clock: ClockConfig,
}

impl EngineConfig {
    /// Load a configuration, picking the format from the file extension
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::from_toml(&contents),
            _ => Self::from_yaml(&contents),
        }
        .with_context(|| format!("Invalid config file: {:?}", path))
    }

    /// Parse and validate a configuration from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(yaml).context("Failed to parse YAML configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a configuration from a TOML string
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).context("Failed to parse TOML configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to a YAML string
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize configuration to YAML")
    }

    /// Check limits for consistency
    pub fn validate(&self) -> Result<()> {
        if self.track.pitch_width < 2 {
            bail!("pitch_width must be at least 2, got {}", self.track.pitch_width);
        }
        if self.track.layer_capacity == 0 {
            bail!("layer_capacity must be at least 1");
        }
        if self.length.min == 0 || self.length.min > self.length.max {
            bail!(
                "invalid track length limits: min {} max {}",
                self.length.min,
                self.length.max
            );
        }
        if !(self.length.min..=self.length.max).contains(&self.length.default) {
            bail!("default track length {} is outside its limits", self.length.default);
        }
        if self.tempo.min == 0 || self.tempo.min > self.tempo.max {
            bail!(
                "invalid ticks-per-step limits: min {} max {}",
                self.tempo.min,
                self.tempo.max
            );
        }
        if !(self.tempo.min..=self.tempo.max).contains(&self.tempo.default) {
            bail!("default ticks per step {} is outside its limits", self.tempo.default);
        }
        if self.clock.host_ticks_per_second == 0 {
            bail!("host_ticks_per_second must be positive");
        }
        Ok(())
    }
}

/// Track geometry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrackConfig {
    /// World X of time index 0
    #[serde(default)]
    pub origin_x: i32,
    /// World Z of pitch row 0
    #[serde(default)]
    pub origin_z: i32,
    /// World Y of layer 0
    #[serde(default = "default_track_y")]
    pub track_y: i32,
    /// Number of pitch rows
    #[serde(default = "default_pitch_width")]
    pub pitch_width: usize,
    /// Maximum number of layers
    #[serde(default = "default_layer_capacity")]
    pub layer_capacity: usize,
}

fn default_track_y() -> i32 {
    65
}
fn default_pitch_width() -> usize {
    25
}
fn default_layer_capacity() -> usize {
    4
}

impl Default for TrackConfig {
    fn default() -> Self {
        Self {
            origin_x: 0,
            origin_z: 0,
            track_y: default_track_y(),
            pitch_width: default_pitch_width(),
            layer_capacity: default_layer_capacity(),
        }
    }
}

/// Track length limits, in steps
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LengthConfig {
    #[serde(default = "default_min_length")]
    pub min: usize,
    #[serde(default = "default_max_length")]
    pub max: usize,
    #[serde(default = "default_length")]
    pub default: usize,
}

fn default_min_length() -> usize {
    1
}
fn default_max_length() -> usize {
    1000
}
fn default_length() -> usize {
    100
}

impl Default for LengthConfig {
    fn default() -> Self {
        Self {
            min: default_min_length(),
            max: default_max_length(),
            default: default_length(),
        }
    }
}

impl LengthConfig {
    /// Clamp a length into the limits; an inverted pair clamps to `min`
    pub fn clamp(&self, length: i64) -> usize {
        length.min(self.max as i64).max(self.min.max(1) as i64) as usize
    }
}

/// Tempo limits, in host ticks per step
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TempoConfig {
    #[serde(default = "default_min_ticks_per_step")]
    pub min: u32,
    #[serde(default = "default_max_ticks_per_step")]
    pub max: u32,
    #[serde(default = "default_ticks_per_step")]
    pub default: u32,
}

fn default_min_ticks_per_step() -> u32 {
    1
}
fn default_max_ticks_per_step() -> u32 {
    20
}
fn default_ticks_per_step() -> u32 {
    2
}

impl Default for TempoConfig {
    fn default() -> Self {
        Self {
            min: default_min_ticks_per_step(),
            max: default_max_ticks_per_step(),
            default: default_ticks_per_step(),
        }
    }
}

impl TempoConfig {
    /// Clamp a ticks-per-step value into the limits; an inverted pair clamps to `min`
    pub fn clamp(&self, ticks_per_step: i64) -> u32 {
        ticks_per_step.min(self.max as i64).max(self.min.max(1) as i64) as u32
    }
}

/// Host clock settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClockConfig {
    /// Host ticks per second driving the step clock
    #[serde(default = "default_host_ticks_per_second")]
    pub host_ticks_per_second: u32,
}

fn default_host_ticks_per_second() -> u32 {
    20
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            host_ticks_per_second: default_host_ticks_per_second(),
        }
    }
}

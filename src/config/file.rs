//! Configuration file management for wavescope.
//!
//! Settings are read from `~/.config/wavescope/wavescope.toml`. Every key is
//! optional; missing keys and a missing file fall back to defaults.

use crate::scope::AggregationMode;
use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Audio input configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Input device to capture from. Options:
    /// - "default" for system default device
    /// - numeric index (0, 1, 2, etc.) from `wavescope list-devices`
    /// - device name from `wavescope list-devices`
    pub device: String,
    /// Samples per channel in one displayed block
    pub block_size: usize,
    /// Sample rate of the demo tone source in Hz
    pub sample_rate: u32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            device: "default".to_string(),
            block_size: 4096,
            sample_rate: 48000,
        }
    }
}

/// Initial view and redraw settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Amplitude shown at the top edge of the plot
    pub max_amplitude: f32,
    /// First visible sample of each block
    pub min_sample_index: usize,
    /// End of the visible sample range; the whole block when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_sample_index: Option<usize>,
    /// "peak" keeps transients visible, "average" smooths them out
    pub aggregation: AggregationMode,
    /// Minimum distance between grid lines, in braille dots
    pub min_tick_spacing_px: u32,
    /// Upper bound on redraws per second
    pub refresh_rate_hz: u32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            max_amplitude: 1.0,
            min_sample_index: 0,
            max_sample_index: None,
            aggregation: AggregationMode::default(),
            min_tick_spacing_px: 25,
            refresh_rate_hz: 60,
        }
    }
}

/// Complete application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScopeConfig {
    pub audio: AudioConfig,
    pub display: DisplayConfig,
}

impl ScopeConfig {
    /// Loads configuration from the user's config directory.
    ///
    /// A missing file yields the defaults.
    ///
    /// # Errors
    /// - If the config directory cannot be determined
    /// - If the config file cannot be read
    /// - If the TOML is malformed
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&get_config_path()?)
    }

    /// Loads configuration from `path`, falling back to defaults when the
    /// file does not exist.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            tracing::info!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = Self::from_toml_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        tracing::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parses and sanitizes a TOML document.
    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let mut config: ScopeConfig = toml::from_str(content)?;
        config.sanitize();
        Ok(config)
    }

    /// Replaces out-of-range values with usable ones.
    pub fn sanitize(&mut self) {
        let defaults = Self::default();

        if !(self.display.max_amplitude.is_finite() && self.display.max_amplitude > 0.0) {
            tracing::warn!(
                "display.max_amplitude must be positive, got {}; using {}",
                self.display.max_amplitude,
                defaults.display.max_amplitude
            );
            self.display.max_amplitude = defaults.display.max_amplitude;
        }
        if self.audio.block_size == 0 {
            tracing::warn!("audio.block_size must be at least 1; using 1");
            self.audio.block_size = 1;
        }
        if self.audio.sample_rate == 0 {
            tracing::warn!(
                "audio.sample_rate must be positive; using {}",
                defaults.audio.sample_rate
            );
            self.audio.sample_rate = defaults.audio.sample_rate;
        }
        if self.display.min_tick_spacing_px == 0 {
            tracing::warn!("display.min_tick_spacing_px must be at least 1; using 1");
            self.display.min_tick_spacing_px = 1;
        }
        if self.display.refresh_rate_hz == 0 {
            tracing::warn!("display.refresh_rate_hz must be at least 1; using 1");
            self.display.refresh_rate_hz = 1;
        }
        if self.display.max_sample_index == Some(0) {
            tracing::warn!("display.max_sample_index of 0 ignored");
            self.display.max_sample_index = None;
        }
        if let Some(max) = self.display.max_sample_index {
            if self.display.min_sample_index >= max {
                tracing::warn!(
                    "display.min_sample_index {} must be below max_sample_index {}; using {}",
                    self.display.min_sample_index,
                    max,
                    max - 1
                );
                self.display.min_sample_index = max - 1;
            }
        }
        if self.display.min_sample_index >= self.audio.block_size {
            tracing::warn!(
                "display.min_sample_index {} must be below audio.block_size {}; using 0",
                self.display.min_sample_index,
                self.audio.block_size
            );
            self.display.min_sample_index = 0;
        }
    }

    /// Writes the configuration as pretty TOML.
    ///
    /// # Errors
    /// - If the file cannot be written
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write config file {}", path.display()))?;
        tracing::info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// Path of the config file, creating its directory if needed.
///
/// # Errors
/// - If the home directory cannot be determined
/// - If the config directory cannot be created
pub fn get_config_path() -> anyhow::Result<PathBuf> {
    let home_dir = dirs::home_dir().ok_or_else(|| anyhow!("Could not find home directory"))?;
    let config_dir = home_dir.join(".config").join("wavescope");

    fs::create_dir_all(&config_dir)
        .with_context(|| format!("Failed to create config directory {}", config_dir.display()))?;

    Ok(config_dir.join("wavescope.toml"))
}

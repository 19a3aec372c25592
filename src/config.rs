//! Tool configuration module.
//!
//! Handles loading and validating `pixfit.toml`. Configuration is optional:
//! stock defaults cover everything, a config file overrides only the values
//! it names, and CLI flags override the file.
//!
//! ## Config File Location
//!
//! `pixfit.toml` in the working directory is picked up automatically;
//! `--config <path>` points anywhere else.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [limits]
//! max_width = 1600            # Output width bound (pixels)
//! max_height = 1600           # Output height bound (pixels)
//! max_bytes = 512000          # Output byte budget (500 KiB)
//! max_upload_bytes = 20971520 # Acceptance ceiling (20 MiB)
//!
//! [compression]
//! initial_quality = 0.8       # Starting JPEG quality (0-1]
//! flatten_threshold = 307200  # Convert-to-JPEG threshold (300 KiB)
//! max_iterations = 20         # Compressor iteration ceiling
//!
//! [processing]
//! max_processes = 4           # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse — override just the values you want:
//!
//! ```toml
//! # Only tighten the byte budget
//! [limits]
//! max_bytes = 262144
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::pipeline::{Constraints, Quality};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Tool configuration loaded from `pixfit.toml`.
///
/// All fields have sensible defaults. User config files need only specify
/// the values they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolConfig {
    /// Output pixel bounds and byte budgets.
    pub limits: LimitsConfig,
    /// Compressor tuning (quality, conversion threshold, ceiling).
    pub compression: CompressionConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl ToolConfig {
    /// Load and validate a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Resolve the effective config: an explicit `--config` path (must
    /// exist), else `pixfit.toml` in the working directory, else defaults.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::load(path),
            None => {
                let implicit = Path::new("pixfit.toml");
                if implicit.exists() {
                    Self::load(implicit)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.limits.max_width == 0 || self.limits.max_height == 0 {
            return Err(ConfigError::Validation(
                "limits.max_width and limits.max_height must be non-zero".into(),
            ));
        }
        if self.limits.max_bytes == 0 {
            return Err(ConfigError::Validation(
                "limits.max_bytes must be non-zero".into(),
            ));
        }
        if self.limits.max_upload_bytes < self.limits.max_bytes {
            return Err(ConfigError::Validation(
                "limits.max_upload_bytes must not be smaller than limits.max_bytes".into(),
            ));
        }
        let q = self.compression.initial_quality;
        if !(q > 0.0 && q <= 1.0) {
            return Err(ConfigError::Validation(
                "compression.initial_quality must be in (0, 1]".into(),
            ));
        }
        if self.compression.max_iterations == 0 {
            return Err(ConfigError::Validation(
                "compression.max_iterations must be non-zero".into(),
            ));
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Build pipeline constraints from the config values.
    pub fn constraints(&self) -> Constraints {
        Constraints {
            max_width: self.limits.max_width,
            max_height: self.limits.max_height,
            initial_quality: Quality::new(self.compression.initial_quality),
            max_bytes: self.limits.max_bytes,
            flatten_threshold: self.compression.flatten_threshold,
            max_upload_bytes: self.limits.max_upload_bytes,
            max_iterations: self.compression.max_iterations,
        }
    }
}

/// Output pixel bounds and byte budgets.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LimitsConfig {
    /// Maximum output width in pixels.
    pub max_width: u32,
    /// Maximum output height in pixels.
    pub max_height: u32,
    /// Hard output byte budget.
    pub max_bytes: u64,
    /// Inputs larger than this are rejected before processing.
    pub max_upload_bytes: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        let c = Constraints::default();
        Self {
            max_width: c.max_width,
            max_height: c.max_height,
            max_bytes: c.max_bytes,
            max_upload_bytes: c.max_upload_bytes,
        }
    }
}

/// Compressor tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompressionConfig {
    /// Starting JPEG quality, in (0, 1].
    pub initial_quality: f32,
    /// Non-alpha sources above this byte size are converted to JPEG.
    pub flatten_threshold: u64,
    /// Compressor iteration ceiling.
    pub max_iterations: u32,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        let c = Constraints::default();
        Self {
            initial_quality: c.initial_quality.value(),
            flatten_threshold: c.flatten_threshold,
            max_iterations: c.max_iterations,
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel workers.
    /// When absent or null, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

/// The stock `pixfit.toml` with every option documented, as printed by
/// `pixfit gen-config`.
pub fn stock_config_toml() -> String {
    let defaults = ToolConfig::default();
    format!(
        "\
# pixfit configuration
# All options are optional - the values below are the defaults.

[limits]
# Output width/height bounds in pixels. Larger images are scaled down
# proportionally; aspect ratio is always preserved.
max_width = {max_width}
max_height = {max_height}
# Hard output byte budget. The compressor reduces quality and then
# dimensions until the encoded image fits.
max_bytes = {max_bytes}
# Inputs larger than this are rejected outright.
max_upload_bytes = {max_upload_bytes}

[compression]
# Starting JPEG quality in (0, 1]. Reduced in 0.1 steps down to 0.1
# before dimensions start shrinking.
initial_quality = {initial_quality}
# Non-transparent sources above this byte size are converted to JPEG.
# Transparent sources (PNG/GIF/WebP) always keep their container.
flatten_threshold = {flatten_threshold}
# Give up after this many encode attempts.
max_iterations = {max_iterations}

[processing]
# Max parallel workers. Omit for auto (one per CPU core).
# max_processes = 4
",
        max_width = defaults.limits.max_width,
        max_height = defaults.limits.max_height,
        max_bytes = defaults.limits.max_bytes,
        max_upload_bytes = defaults.limits.max_upload_bytes,
        initial_quality = defaults.compression.initial_quality,
        flatten_threshold = defaults.compression.flatten_threshold,
        max_iterations = defaults.compression.max_iterations,
    )
}

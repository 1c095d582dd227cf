//! Export configuration.
//!
//! Handles loading, validating, and merging the `print-exporter.toml` file.
//! The user file is layered over stock defaults, so it only needs the keys it
//! wants to change. Command-line flags override both.
//!
//! ## Configuration Options
//!
//! ```toml
//! # Every key is optional; the values shown are the defaults
//!
//! [export]
//! formats = ["png"]         # "png", "jpeg"
//! dpi = 300                 # Physical resolution stamped into every file
//! jpeg_quality = 92         # 1-100
//!
//! [archive]
//! compression_level = 6     # DEFLATE level 1-9; 0 stores uncompressed
//!
//! [defaults]
//! mode = "crop"             # crop | fit | mat
//! mat_percent = 5           # Mat border, % of the short edge (1-20)
//! background = "#000000"    # Fill for fit and mat
//!
//! [targets.4x5]             # Per-ratio overrides, keyed by ratio id
//! mode = "mat"
//! background = "#ffffff"
//!
//! [processing]
//! max_processes = 2         # Max parallel renders (default 2, capped at CPU cores)
//! ```
//!
//! A misspelled key is an error, not a silently ignored setting.

use crate::presets;
use crate::types::{LayoutMode, MAT_PERCENT_RANGE, OutputFormat, Rgb};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Config file picked up from the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "print-exporter.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config file not found: {0}")]
    NotFound(String),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Export configuration.
///
/// All fields have defaults. User config files need only specify the values
/// they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExportConfig {
    /// Output formats and encoder settings.
    pub export: ExportSection,
    /// ZIP packaging.
    pub archive: ArchiveConfig,
    /// Layout applied to every ratio unless overridden.
    pub defaults: TargetSettings,
    /// Per-ratio layout overrides keyed by ratio id (`"4x5"`, `"ISO_A1"`, ...).
    pub targets: BTreeMap<String, TargetOverride>,
    /// Parallel rendering settings.
    pub processing: ProcessingConfig,
}

impl ExportConfig {
    /// Check ranges the type system cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=100).contains(&self.export.jpeg_quality) {
            return Err(ConfigError::Validation(
                "export.jpeg_quality must be 1-100".into(),
            ));
        }
        if self.export.dpi == 0 {
            return Err(ConfigError::Validation(
                "export.dpi must be non-zero".into(),
            ));
        }
        if self.archive.compression_level > 9 {
            return Err(ConfigError::Validation(
                "archive.compression_level must be 0-9".into(),
            ));
        }
        check_mat_percent("defaults.mat_percent", self.defaults.mat_percent)?;
        for (id, overrides) in &self.targets {
            if presets::find_group(id).is_none() {
                return Err(ConfigError::Validation(format!(
                    "targets.{id}: unknown ratio id"
                )));
            }
            if let Some(p) = overrides.mat_percent {
                check_mat_percent(&format!("targets.{id}.mat_percent"), p)?;
            }
        }
        Ok(())
    }

    /// Layout settings for one ratio group: defaults with that group's
    /// overrides applied.
    pub fn settings_for(&self, group_id: &str) -> TargetSettings {
        let overrides = self
            .targets
            .iter()
            .find(|(id, _)| id.eq_ignore_ascii_case(group_id))
            .map(|(_, o)| o);
        match overrides {
            Some(o) => o.apply(self.defaults),
            None => self.defaults,
        }
    }
}

fn check_mat_percent(key: &str, value: u32) -> Result<(), ConfigError> {
    if MAT_PERCENT_RANGE.contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::Validation(format!(
            "{key} must be {}-{}",
            MAT_PERCENT_RANGE.start(),
            MAT_PERCENT_RANGE.end()
        )))
    }
}

/// Output formats and encoder settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExportSection {
    /// Formats written per ratio. PNG is always written before JPEG.
    pub formats: Vec<OutputFormat>,
    /// Physical resolution stamped into PNG `pHYs` and JPEG JFIF headers.
    pub dpi: u16,
    /// JPEG encoding quality (1 = worst, 100 = best).
    pub jpeg_quality: u32,
}

impl Default for ExportSection {
    fn default() -> Self {
        Self {
            formats: vec![OutputFormat::Png],
            dpi: crate::imaging::dpi::PRINT_DPI,
            jpeg_quality: 92,
        }
    }
}

/// ZIP packaging settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArchiveConfig {
    /// DEFLATE compression level 1-9 (9 = smallest). 0 stores entries
    /// uncompressed.
    pub compression_level: u32,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            compression_level: crate::archive::DEFAULT_COMPRESSION_LEVEL,
        }
    }
}

/// Layout of one poster: mode, mat width and fill color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TargetSettings {
    pub mode: LayoutMode,
    /// Mat border as a percentage of the short edge. Only used by `mat`.
    pub mat_percent: u32,
    /// Canvas fill for `fit` and `mat`.
    pub background: Rgb,
}

impl Default for TargetSettings {
    fn default() -> Self {
        Self {
            mode: LayoutMode::Crop,
            mat_percent: 5,
            background: Rgb::BLACK,
        }
    }
}

/// Sparse per-ratio override. Absent keys fall back to `[defaults]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TargetOverride {
    pub mode: Option<LayoutMode>,
    pub mat_percent: Option<u32>,
    pub background: Option<Rgb>,
}

impl TargetOverride {
    pub fn apply(&self, base: TargetSettings) -> TargetSettings {
        TargetSettings {
            mode: self.mode.unwrap_or(base.mode),
            mat_percent: self.mat_percent.unwrap_or(base.mat_percent),
            background: self.background.unwrap_or(base.background),
        }
    }
}

/// Concurrent renders when `max_processes` is unset.
///
/// A full-size poster render peaks above 1 GB (the canvas plus the resampling
/// buffers), so the default stays small regardless of core count.
pub const DEFAULT_MAX_PROCESSES: usize = 2;

/// Render concurrency.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Upper bound on concurrent renders. Unset means
    /// [`DEFAULT_MAX_PROCESSES`]; values above the core count are capped.
    pub max_processes: Option<usize>,
}

/// Number of rayon workers to start: `max_processes` (or
/// [`DEFAULT_MAX_PROCESSES`]) clamped to `1..=cores`.
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .unwrap_or(DEFAULT_MAX_PROCESSES)
        .clamp(1, cores)
}

// =============================================================================
// Loading and layering
// =============================================================================

/// [`ExportConfig::default`] as a TOML table: the bottom layer every user
/// file is merged onto.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(ExportConfig::default())?)
}

/// Layer `overlay` onto `base`.
///
/// Tables merge per key, recursing into nested tables; any other overlay
/// value (arrays included) replaces the base value outright. Base keys the
/// overlay does not mention survive.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// A missing file is `Ok(None)`; unreadable or malformed TOML is an error.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Apply the user layer (if any), then deserialize and validate the result.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<ExportConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: ExportConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the export config.
///
/// With an explicit path the file must exist. Without one,
/// [`DEFAULT_CONFIG_FILE`] in `dir` is used if present, otherwise the stock
/// defaults.
pub fn load_config(explicit: Option<&Path>, dir: &Path) -> Result<ExportConfig, ConfigError> {
    let overlay = match explicit {
        Some(path) => Some(
            load_raw_config(path)?
                .ok_or_else(|| ConfigError::NotFound(path.display().to_string()))?,
        ),
        None => load_raw_config(&dir.join(DEFAULT_CONFIG_FILE))?,
    };
    resolve_config(stock_defaults_value()?, overlay)
}

/// The documented config printed by `print-exporter gen-config`.
pub fn stock_config_toml() -> &'static str {
    r##"# Print Exporter Configuration
# ============================
# Every key below is optional and set to its default value; delete the
# ones you don't want to change.
#
# Save as print-exporter.toml next to where you run the tool, or pass it
# with --config. Command-line flags override these values.
# Misspelled keys are reported as errors.

# ---------------------------------------------------------------------------
# Output files
# ---------------------------------------------------------------------------
[export]
# Formats to write for every ratio: "png", "jpeg", or both.
formats = ["png"]

# Physical resolution stamped into every file (PNG pHYs, JPEG JFIF).
dpi = 300

# JPEG encoding quality (1 = worst, 100 = best).
jpeg_quality = 92

# ---------------------------------------------------------------------------
# ZIP archive
# ---------------------------------------------------------------------------
[archive]
# DEFLATE compression level, 1 (fastest) to 9 (smallest).
# 0 stores the posters uncompressed.
compression_level = 6

# ---------------------------------------------------------------------------
# Layout defaults
# ---------------------------------------------------------------------------
[defaults]
# crop: fill the poster, trimming the edges of the photo.
# fit:  show the whole photo, padding with the background color.
# mat:  like fit, inside a uniform border.
mode = "crop"

# Mat border as a percentage of the poster's short edge (1-20).
mat_percent = 5

# Background for fit and mat.
background = "#000000"

# ---------------------------------------------------------------------------
# Per-ratio overrides
# ---------------------------------------------------------------------------
# Keyed by ratio id (see `print-exporter ratios`). Any [defaults] key may be
# overridden.
#
# [targets.4x5]
# mode = "mat"
# background = "#ffffff"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum posters rendered at once. Each full-size render can use more
# than 1 GB of memory, so raise this only on machines with RAM to spare.
# Leave unset for 2; values above the CPU core count are capped.
# max_processes = 2
"##
}

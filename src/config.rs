//! Configuration types for format-shifter

use crate::error::{Error, Result};
use crate::task::{MAX_QUALITY, MIN_QUALITY};
use crate::types::ImageFormat;
use serde::{Deserialize, Serialize};
use std::{path::Path, path::PathBuf, time::Duration};

/// Conversion defaults and resource limits
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConversionConfig {
    /// Output format used when the caller does not pick one (default: PNG)
    #[serde(default)]
    pub default_output_format: ImageFormat,

    /// Quality used when the caller does not pick one (default: 90)
    #[serde(default = "default_quality")]
    pub default_quality: u32,

    /// Codec calls allowed in flight at once across all batches (default: 1)
    ///
    /// Tasks of a single batch are always converted one at a time regardless
    /// of this value. Raising it only lets independent batches overlap.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_conversions: usize,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            default_output_format: ImageFormat::default(),
            default_quality: default_quality(),
            max_concurrent_conversions: default_max_concurrent(),
        }
    }
}

/// External tool discovery
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Path to the ImageMagick executable (auto-detected if None)
    #[serde(default)]
    pub magick_path: Option<PathBuf>,

    /// Whether to search PATH for external binaries if explicit paths not set (default: true)
    #[serde(default = "default_true")]
    pub search_path: bool,

    /// Upper bound for a single codec invocation in seconds (None = no limit)
    #[serde(default, with = "optional_duration_serde")]
    pub codec_timeout: Option<Duration>,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            magick_path: None,
            search_path: true,
            codec_timeout: None,
        }
    }
}

/// Where converted files are written
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Base output directory (default: "./converted")
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Application-named subfolder created under `output_dir` (default: "FormatShifter")
    #[serde(default = "default_app_folder")]
    pub app_folder: String,

    /// File collision handling
    #[serde(default)]
    pub file_collision: FileCollisionAction,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            app_folder: default_app_folder(),
            file_collision: FileCollisionAction::default(),
        }
    }
}

impl OutputConfig {
    /// Directory files actually land in
    pub fn target_dir(&self) -> PathBuf {
        self.output_dir.join(&self.app_folder)
    }
}

/// Event channel settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EventConfig {
    /// Broadcast buffer size; slower subscribers lag past this (default: 1000)
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for EventConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
        }
    }
}

/// Main configuration for [`FormatShifter`](crate::FormatShifter)
///
/// Every field has a default, so `{}` is a valid configuration file.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Conversion defaults and limits
    #[serde(default)]
    pub conversion: ConversionConfig,

    /// External tool discovery
    #[serde(default)]
    pub tools: ToolsConfig,

    /// Output location and collision policy
    #[serde(default)]
    pub output: OutputConfig,

    /// Event channel settings
    #[serde(default)]
    pub events: EventConfig,
}

impl Config {
    /// Load and validate a JSON configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read config file '{}': {}", path.display(), e),
            ))
        })?;
        let config: Config = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Check values serde cannot express
    pub fn validate(&self) -> Result<()> {
        let quality = self.conversion.default_quality;
        if !(MIN_QUALITY..=MAX_QUALITY).contains(&quality) {
            return Err(Error::config(
                "conversion.default_quality",
                format!(
                    "default quality {} outside {}..={}",
                    quality, MIN_QUALITY, MAX_QUALITY
                ),
            ));
        }

        if !ImageFormat::output_formats().contains(&self.conversion.default_output_format) {
            return Err(Error::config(
                "conversion.default_output_format",
                format!(
                    "{} cannot be used as an output format",
                    self.conversion.default_output_format
                ),
            ));
        }

        if self.conversion.max_concurrent_conversions == 0 {
            return Err(Error::config(
                "conversion.max_concurrent_conversions",
                "at least one concurrent conversion is required",
            ));
        }

        if self.events.channel_capacity == 0 {
            return Err(Error::config(
                "events.channel_capacity",
                "event channel capacity must be greater than zero",
            ));
        }

        let folder = self.output.app_folder.as_str();
        if folder.is_empty() || folder.contains(['/', '\\']) || folder == "." || folder == ".." {
            return Err(Error::config(
                "output.app_folder",
                format!("app folder {:?} must be a single directory name", folder),
            ));
        }

        Ok(())
    }
}

/// File collision handling strategy
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileCollisionAction {
    /// Append (1), (2), etc. to filename (default)
    #[default]
    Rename,
    /// Overwrite existing file
    Overwrite,
    /// Skip the file, keep existing
    Skip,
}

fn default_quality() -> u32 {
    90
}

fn default_max_concurrent() -> usize {
    1
}

fn default_true() -> bool {
    true
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./converted")
}

fn default_app_folder() -> String {
    "FormatShifter".to_string()
}

fn default_channel_capacity() -> usize {
    1000
}

// Optional Duration serialization helper
mod optional_duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => serializer.serialize_some(&d.as_secs()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = Option::<u64>::deserialize(deserializer)?;
        Ok(secs.map(Duration::from_secs))
    }
}

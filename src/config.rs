use chrono::{DateTime, FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::baseline::BaselineSettings;
use crate::error::{ReadyRsError, Result};
use crate::hrv::{HrvProcessor, DEFAULT_ECTOPIC_THRESHOLD};
use crate::logging::LogConfig;
use crate::strain_guidance::TrainingIntensity;

/// Max heart rate used when neither an override nor an age is configured
pub const DEFAULT_MAX_HEART_RATE: f64 = 190.0;

/// Main engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Configuration metadata
    pub metadata: ConfigMetadata,

    /// Personal profile
    #[serde(default)]
    pub profile: UserProfile,

    /// Baseline calculation settings
    #[serde(default)]
    pub baseline: BaselineSettings,

    /// HRV processing settings
    #[serde(default)]
    pub hrv: HrvSettings,

    /// Logging settings
    #[serde(default)]
    pub logging: LogConfig,
}

/// Configuration metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigMetadata {
    /// Configuration format version
    pub version: String,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

/// Personal settings that shape the scores
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserProfile {
    /// Age in years, used for the max heart rate estimate
    pub age: Option<u32>,

    /// Known max heart rate (bpm), overrides the estimate
    pub max_heart_rate: Option<f64>,

    /// Resting heart rate (bpm) used when none is measured
    pub resting_heart_rate: Option<f64>,

    /// Preferred training intensity for strain targets
    pub training_intensity: TrainingIntensity,

    /// Fixed nightly sleep need, replaces the learned one
    pub sleep_need_override_minutes: Option<f64>,

    /// Local offset from UTC in minutes, for bed and wake times
    pub utc_offset_minutes: i32,
}

impl Default for UserProfile {
    fn default() -> Self {
        UserProfile {
            age: None,
            max_heart_rate: None,
            resting_heart_rate: None,
            training_intensity: TrainingIntensity::Moderate,
            sleep_need_override_minutes: None,
            utc_offset_minutes: 0,
        }
    }
}

impl UserProfile {
    /// Configured max HR, else Tanaka `208 - 0.7 * age`, else 190
    pub fn effective_max_heart_rate(&self) -> f64 {
        match (self.max_heart_rate, self.age) {
            (Some(max_hr), _) if max_hr > 0.0 => max_hr,
            (_, Some(age)) if age > 0 => 208.0 - 0.7 * age as f64,
            _ => DEFAULT_MAX_HEART_RATE,
        }
    }

    /// Local offset, falling back to UTC when out of range
    pub fn utc_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_minutes * 60).unwrap_or_else(|| {
            warn!(
                minutes = self.utc_offset_minutes,
                "UTC offset out of range, using UTC"
            );
            Utc.fix()
        })
    }
}

/// HRV processing settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HrvSettings {
    /// Relative deviation from neighbours that marks an ectopic beat
    pub ectopic_threshold: f64,

    /// Convert SDNN-only samples to an RMSSD estimate
    pub convert_sdnn_to_rmssd: bool,
}

impl Default for HrvSettings {
    fn default() -> Self {
        HrvSettings {
            ectopic_threshold: DEFAULT_ECTOPIC_THRESHOLD,
            convert_sdnn_to_rmssd: false,
        }
    }
}

impl HrvSettings {
    pub fn processor(&self) -> HrvProcessor {
        HrvProcessor::with_settings(self.ectopic_threshold, self.convert_sdnn_to_rmssd)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        let now = Utc::now();

        EngineConfig {
            metadata: ConfigMetadata {
                version: "1.0".to_string(),
                created_at: now,
                updated_at: now,
            },
            profile: UserProfile::default(),
            baseline: BaselineSettings::default(),
            hrv: HrvSettings::default(),
            logging: LogConfig::default(),
        }
    }
}

/// Configuration management implementation
impl EngineConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            ReadyRsError::Configuration(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        let config: EngineConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        self.metadata.updated_at = Utc::now();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                ReadyRsError::Configuration(format!(
                    "Failed to create config directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let toml_content = toml::to_string_pretty(self)?;
        fs::write(path, toml_content).map_err(|e| {
            ReadyRsError::Configuration(format!(
                "Failed to write config file {}: {}",
                path.display(),
                e
            ))
        })?;

        Ok(())
    }

    /// Get default configuration file path
    pub fn default_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".readyrs")
            .join("config.toml")
    }

    /// Load the configuration at `path`, or defaults when no file exists there
    ///
    /// A file that exists but cannot be read or parsed is an error.
    pub fn load_or_default_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            warn!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }
        Self::load_from_file(path)
    }

    /// Load configuration from the default location with fallback to defaults
    pub fn load_or_default() -> Result<Self> {
        Self::load_or_default_from(Self::default_config_path())
    }
}

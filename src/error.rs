//! Unified error hierarchy for ReadyRS
//!
//! The score calculators themselves never fail: partial biometric data yields
//! neutral defaults. Errors only arise at the edges, when records are
//! constructed, configuration is read or written, or input files are parsed.

use thiserror::Error;

/// Top-level error type for all ReadyRS operations
#[derive(Debug, Error)]
pub enum ReadyRsError {
    /// Physiologically invalid input record
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON input/output errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parse errors
    #[error("Config parse error: {0}")]
    TomlDe(#[from] toml::de::Error),

    /// TOML write errors
    #[error("Config write error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    /// Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Input record validation errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// End time is not after start time
    #[error("Invalid time range for {record}: end must be after start")]
    InvalidTimeRange { record: String },

    /// Heart rate outside (0, 300] bpm
    #[error("Invalid heart rate: {bpm} bpm (valid range: 0-300)")]
    InvalidHeartRate { bpm: f64 },

    /// HRV value negative or not finite
    #[error("Invalid HRV value: {value}ms")]
    InvalidHrv { value: f64 },

    /// A sleep stage falls outside its session window
    #[error("Sleep stage outside session window: {stage}")]
    StageOutOfRange { stage: String },
}

/// Result type alias for ReadyRS operations
pub type Result<T> = std::result::Result<T, ReadyRsError>;

impl ReadyRsError {
    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            ReadyRsError::Validation(_) => ErrorSeverity::Warning,
            ReadyRsError::Configuration(_) => ErrorSeverity::Warning,
            ReadyRsError::TomlDe(_) | ReadyRsError::TomlSer(_) => ErrorSeverity::Warning,
            ReadyRsError::Internal(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::Error,
        }
    }

    /// Process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Warning => 2,
            ErrorSeverity::Error | ErrorSeverity::Critical => 1,
        }
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            ReadyRsError::Validation(ValidationError::InvalidHeartRate { bpm }) => {
                format!("Heart rate reading of {} bpm looks like a sensor error", bpm)
            }
            ReadyRsError::Validation(ValidationError::InvalidTimeRange { record }) => {
                format!("The {} has an end time before its start time", record)
            }
            ReadyRsError::TomlDe(_) => {
                "Configuration file could not be parsed. Run `readyrs config --init` to recreate it."
                    .to_string()
            }
            ReadyRsError::Configuration(message) => message.clone(),
            _ => self.to_string(),
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Internal fault, not caused by the input
    Critical,
    /// Operation failed
    Error,
    /// Bad input or configuration the user can correct
    Warning,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_severity() {
        let err = ReadyRsError::Validation(ValidationError::InvalidHeartRate { bpm: 400.0 });
        assert_eq!(err.severity(), ErrorSeverity::Warning);
        assert_eq!(err.exit_code(), 2);

        let err = ReadyRsError::Internal("test".to_string());
        assert_eq!(err.severity(), ErrorSeverity::Critical);
        assert_eq!(err.exit_code(), 1);

        let err = ReadyRsError::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk"));
        assert_eq!(err.severity(), ErrorSeverity::Error);
    }

    #[test]
    fn test_user_messages() {
        let err = ReadyRsError::from(ValidationError::InvalidTimeRange {
            record: "sleep session".to_string(),
        });
        assert!(err.user_message().contains("sleep session"));

        let err = ReadyRsError::from(ValidationError::InvalidHeartRate { bpm: -3.0 });
        assert!(err.user_message().contains("sensor error"));

        let err = ReadyRsError::Configuration("Failed to read config file x.toml".to_string());
        assert_eq!(err.user_message(), "Failed to read config file x.toml");
    }
}

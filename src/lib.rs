// Library interface for ReadyRS modules
// The binary and the integration tests both build on these

pub mod baseline;
pub mod config;
pub mod data_quality;
pub mod engine;
pub mod error;
pub mod history;
pub mod hrv;
pub mod insights;
pub mod logging;
pub mod models;
pub mod recovery;
pub mod sleep;
pub mod sleep_consistency;
pub mod sleep_debt;
pub mod statistics;
pub mod strain;
pub mod strain_guidance;

// Re-export commonly used types for convenience
pub use models::*;
pub use baseline::{AdaptiveBaseline, BaselineCalculator, BaselinePhase, BaselineSettings};
pub use config::{EngineConfig, UserProfile};
pub use engine::{DailyInput, DailyReport, ScoreEngine};
pub use error::{ReadyRsError, Result, ValidationError};
pub use history::{DailyRecord, InMemoryScoreRepository, ScoreHistory, ScoreRepository};
pub use hrv::HrvProcessor;
pub use insights::{DailyInsight, InsightGenerator};
pub use logging::{LogConfig, LogFormat, LogLevel};
pub use recovery::{RecoveryCalculator, RecoveryCategory, RecoveryScore};
pub use sleep::{SleepScore, SleepScoreCalculator};
pub use sleep_consistency::{SleepConsistency, SleepConsistencyCalculator};
pub use sleep_debt::{SleepDebt, SleepDebtTracker};
pub use strain::{StrainCalculator, StrainCategory, StrainScore};
pub use strain_guidance::{StrainGuidance, StrainGuidanceCalculator, TrainingIntensity};

//! Strain targets and weekly load status
//!
//! Today's target strain range follows from recovery, shifted by the
//! athlete's preferred training intensity. Weekly load status compares the
//! last seven days of strain with the daily average that intensity implies.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use crate::recovery::{RecoveryCategory, RecoveryScore};
use crate::statistics;
use crate::strain::{StrainScore, MAX_STRAIN};

/// Strain scores needed before weekly load can be judged
pub const MIN_STRAIN_HISTORY: usize = 3;

/// Days in the weekly load window
pub const LOAD_WINDOW_DAYS: usize = 7;

/// Preferred training intensity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TrainingIntensity {
    Light,
    Moderate,
    Intense,
    VeryIntense,
}

impl Default for TrainingIntensity {
    fn default() -> Self {
        TrainingIntensity::Moderate
    }
}

impl TrainingIntensity {
    /// Shift applied to both ends of the target range
    pub fn target_adjustment(&self) -> f64 {
        match self {
            TrainingIntensity::Light => -2.0,
            TrainingIntensity::Moderate => 0.0,
            TrainingIntensity::Intense => 2.0,
            TrainingIntensity::VeryIntense => 3.0,
        }
    }

    /// Average daily strain expected over a week at this intensity
    pub fn weekly_target_strain(&self) -> f64 {
        match self {
            TrainingIntensity::Light => 8.0,
            TrainingIntensity::Moderate => 11.0,
            TrainingIntensity::Intense => 13.0,
            TrainingIntensity::VeryIntense => 15.0,
        }
    }
}

impl FromStr for TrainingIntensity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace(['-', '_', ' '], "").as_str() {
            "light" => Ok(TrainingIntensity::Light),
            "moderate" => Ok(TrainingIntensity::Moderate),
            "intense" => Ok(TrainingIntensity::Intense),
            "veryintense" => Ok(TrainingIntensity::VeryIntense),
            _ => Err(format!("Invalid training intensity: {}", s)),
        }
    }
}

impl fmt::Display for TrainingIntensity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrainingIntensity::Light => write!(f, "Light"),
            TrainingIntensity::Moderate => write!(f, "Moderate"),
            TrainingIntensity::Intense => write!(f, "Intense"),
            TrainingIntensity::VeryIntense => write!(f, "Very Intense"),
        }
    }
}

/// Weekly training load classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WeeklyLoadStatus {
    Unknown,
    UnderLoaded,
    Optimal,
    Building,
    Peaking,
    OverReaching,
    Deloading,
}

impl WeeklyLoadStatus {
    /// Classify weekly load; rules are checked in priority order
    pub fn classify(load_ratio: f64, trend: f64, recovery_score: f64) -> Self {
        if load_ratio < 0.7 {
            WeeklyLoadStatus::UnderLoaded
        } else if load_ratio > 1.3 && recovery_score < 50.0 {
            WeeklyLoadStatus::OverReaching
        } else if load_ratio > 1.2 {
            WeeklyLoadStatus::Peaking
        } else if trend > 0.5 && load_ratio > 0.9 {
            WeeklyLoadStatus::Building
        } else if trend < -0.5 && load_ratio < 1.0 {
            WeeklyLoadStatus::Deloading
        } else {
            WeeklyLoadStatus::Optimal
        }
    }

    pub fn recommendation(&self) -> &'static str {
        match self {
            WeeklyLoadStatus::Unknown => {
                "Log a few more days of activity to unlock weekly load guidance"
            }
            WeeklyLoadStatus::UnderLoaded => "Your weekly load is low. There is room to push today",
            WeeklyLoadStatus::Optimal => "Weekly load is right on target",
            WeeklyLoadStatus::Building => "Load is building steadily. Keep progression gradual",
            WeeklyLoadStatus::Peaking => "Load is peaking. Hold steady or back off slightly",
            WeeklyLoadStatus::OverReaching => {
                "You're overreaching on low recovery. Take an easy day"
            }
            WeeklyLoadStatus::Deloading => "You're in a deload. Let recovery catch up",
        }
    }
}

impl fmt::Display for WeeklyLoadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeeklyLoadStatus::Unknown => write!(f, "Unknown"),
            WeeklyLoadStatus::UnderLoaded => write!(f, "Under-loaded"),
            WeeklyLoadStatus::Optimal => write!(f, "Optimal"),
            WeeklyLoadStatus::Building => write!(f, "Building"),
            WeeklyLoadStatus::Peaking => write!(f, "Peaking"),
            WeeklyLoadStatus::OverReaching => write!(f, "Overreaching"),
            WeeklyLoadStatus::Deloading => write!(f, "Deloading"),
        }
    }
}

/// Today's strain target and weekly load summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrainGuidance {
    pub date: NaiveDate,
    pub recovery_category: RecoveryCategory,
    pub intensity: TrainingIntensity,
    pub target_strain_min: f64,
    pub target_strain_max: f64,
    pub weekly_load_status: WeeklyLoadStatus,
    pub average_daily_strain: f64,
    pub weekly_target_strain: f64,
    pub load_ratio: f64,
    /// Strain change per day over the window
    pub load_trend: f64,
    pub recommendation: String,
}

pub struct StrainGuidanceCalculator;

impl StrainGuidanceCalculator {
    /// Base target range for a recovery category
    pub fn base_target_range(category: RecoveryCategory) -> (f64, f64) {
        match category {
            RecoveryCategory::Optimal => (14.0, 18.0),
            RecoveryCategory::Moderate => (10.0, 14.0),
            RecoveryCategory::Poor => (4.0, 8.0),
        }
    }

    /// Target range after the intensity adjustment, clamped to [0, 21]
    pub fn target_range(category: RecoveryCategory, intensity: TrainingIntensity) -> (f64, f64) {
        let (min, max) = Self::base_target_range(category);
        let shift = intensity.target_adjustment();
        (
            (min + shift).clamp(0.0, MAX_STRAIN),
            (max + shift).clamp(0.0, MAX_STRAIN),
        )
    }

    /// Build guidance from today's recovery and recent strain history
    pub fn calculate(
        recovery: &RecoveryScore,
        recent_strains: &[StrainScore],
        intensity: TrainingIntensity,
    ) -> StrainGuidance {
        let (target_strain_min, target_strain_max) =
            Self::target_range(recovery.category, intensity);

        let mut sorted: Vec<&StrainScore> = recent_strains.iter().collect();
        sorted.sort_by_key(|s| s.date);
        let window: Vec<f64> = sorted
            .iter()
            .rev()
            .take(LOAD_WINDOW_DAYS)
            .rev()
            .map(|s| s.score)
            .collect();

        let weekly_target_strain = intensity.weekly_target_strain();
        let average_daily_strain = statistics::mean(&window);
        let load_trend = statistics::linear_regression_slope(&window);

        let (weekly_load_status, load_ratio) = if window.len() < MIN_STRAIN_HISTORY {
            (WeeklyLoadStatus::Unknown, 0.0)
        } else {
            let ratio = average_daily_strain / weekly_target_strain;
            (
                WeeklyLoadStatus::classify(ratio, load_trend, recovery.score),
                ratio,
            )
        };

        debug!(
            date = %recovery.date,
            status = %weekly_load_status,
            ratio = load_ratio,
            trend = load_trend,
            "Strain guidance computed"
        );

        StrainGuidance {
            date: recovery.date,
            recovery_category: recovery.category,
            intensity,
            target_strain_min,
            target_strain_max,
            weekly_load_status,
            average_daily_strain,
            weekly_target_strain,
            load_ratio,
            load_trend,
            recommendation: weekly_load_status.recommendation().to_string(),
        }
    }
}

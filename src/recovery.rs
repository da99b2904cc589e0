//! Recovery scoring
//!
//! Recovery expresses how ready the body is to take on strain, on a 0-100
//! scale, by comparing this morning's physiology with the personal baseline.
//!
//! # Sports Science Background
//!
//! - **HRV** above baseline reflects parasympathetic (rest/recovery)
//!   dominance; below baseline points to accumulated stress.
//! - **Resting heart rate** moves the other way: an elevated RHR is an
//!   early sign of fatigue, illness or dehydration.
//! - **Sleep** is the main recovery window, so last night's sleep score
//!   contributes directly.
//!
//! # Algorithm
//!
//! - HRV deviation `(current - baseline) / baseline * 100` maps
//!   [-25%, +25%] onto [0, 100].
//! - RHR deviation maps [-15%, +15%] onto [100, 0] (lower is better).
//! - Score = HRV 50% + RHR 30% + sleep quality 20%, clamped to [0, 100].
//!
//! A non-positive baseline gives a neutral 0% deviation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::models::UserBaseline;

pub const HRV_WEIGHT: f64 = 0.5;
pub const RHR_WEIGHT: f64 = 0.3;
pub const SLEEP_WEIGHT: f64 = 0.2;

/// Scores at or above this are optimal
pub const OPTIMAL_RECOVERY_THRESHOLD: f64 = 67.0;

/// Scores at or above this (and below optimal) are moderate
pub const MODERATE_RECOVERY_THRESHOLD: f64 = 34.0;

/// Sleep quality assumed when no sleep was recorded
pub const DEFAULT_SLEEP_QUALITY: f64 = 50.0;

/// HRV deviation (percent) that maps to 0 or 100
const HRV_DEVIATION_RANGE: f64 = 25.0;

/// RHR deviation (percent) that maps to 100 or 0
const RHR_DEVIATION_RANGE: f64 = 15.0;

/// Recovery category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecoveryCategory {
    /// 0-33: body is under-recovered
    Poor,
    /// 34-66: partially recovered
    Moderate,
    /// 67-100: ready for strain
    Optimal,
}

impl RecoveryCategory {
    /// Category for a 0-100 score (67.0 is optimal, 66.9 moderate)
    pub fn from_score(score: f64) -> Self {
        if score >= OPTIMAL_RECOVERY_THRESHOLD {
            RecoveryCategory::Optimal
        } else if score >= MODERATE_RECOVERY_THRESHOLD {
            RecoveryCategory::Moderate
        } else {
            RecoveryCategory::Poor
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            RecoveryCategory::Poor => "Your body is under-recovered and needs rest",
            RecoveryCategory::Moderate => "Partially recovered, maintain moderate load",
            RecoveryCategory::Optimal => "Well recovered and ready for strain",
        }
    }
}

impl fmt::Display for RecoveryCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecoveryCategory::Poor => write!(f, "Poor"),
            RecoveryCategory::Moderate => write!(f, "Moderate"),
            RecoveryCategory::Optimal => write!(f, "Optimal"),
        }
    }
}

/// Inputs and intermediate values behind a recovery score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecoveryComponents {
    /// HRV deviation from baseline (percent)
    pub hrv_deviation: f64,
    /// RHR deviation from baseline (percent)
    pub rhr_deviation: f64,
    /// Normalised HRV sub-score (0-100)
    pub hrv_score: f64,
    /// Normalised RHR sub-score (0-100)
    pub rhr_score: f64,
    /// Sleep quality used (0-100)
    pub sleep_quality: f64,
    pub hrv_baseline: f64,
    pub rhr_baseline: f64,
    pub current_hrv: f64,
    pub current_rhr: f64,
}

/// Daily recovery score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecoveryScore {
    pub date: NaiveDate,
    /// 0-100
    pub score: f64,
    pub category: RecoveryCategory,
    pub components: RecoveryComponents,
}

/// Recovery score calculator
pub struct RecoveryCalculator;

impl RecoveryCalculator {
    /// Percentage deviation of `current` from `baseline`, 0 when baseline <= 0
    pub fn calculate_deviation(current: f64, baseline: f64) -> f64 {
        if baseline <= 0.0 {
            return 0.0;
        }
        (current - baseline) / baseline * 100.0
    }

    /// Map HRV deviation [-25%, +25%] linearly onto [0, 100]
    pub fn normalize_hrv_deviation(deviation: f64) -> f64 {
        (50.0 + deviation / HRV_DEVIATION_RANGE * 50.0).clamp(0.0, 100.0)
    }

    /// Map RHR deviation [-15%, +15%] linearly onto [100, 0]
    pub fn normalize_rhr_deviation(deviation: f64) -> f64 {
        (50.0 - deviation / RHR_DEVIATION_RANGE * 50.0).clamp(0.0, 100.0)
    }

    /// Weighted 0-100 recovery from the three sub-scores
    pub fn weighted_score(hrv_score: f64, rhr_score: f64, sleep_quality: f64) -> f64 {
        (hrv_score * HRV_WEIGHT + rhr_score * RHR_WEIGHT + sleep_quality * SLEEP_WEIGHT)
            .clamp(0.0, 100.0)
    }

    /// Calculate the recovery score for `date`
    ///
    /// `sleep_quality` is last night's sleep score; `None` uses the neutral 50.
    pub fn calculate(
        date: NaiveDate,
        current_hrv: f64,
        current_rhr: f64,
        sleep_quality: Option<f64>,
        baseline: &UserBaseline,
    ) -> RecoveryScore {
        let hrv_deviation = Self::calculate_deviation(current_hrv, baseline.hrv_baseline_7day);
        let rhr_deviation = Self::calculate_deviation(current_rhr, baseline.rhr_baseline_7day);

        let hrv_score = Self::normalize_hrv_deviation(hrv_deviation);
        let rhr_score = Self::normalize_rhr_deviation(rhr_deviation);
        let sleep_quality = sleep_quality
            .unwrap_or(DEFAULT_SLEEP_QUALITY)
            .clamp(0.0, 100.0);

        let score = Self::weighted_score(hrv_score, rhr_score, sleep_quality);
        let category = RecoveryCategory::from_score(score);

        debug!(%date, score, %category, hrv_deviation, rhr_deviation, "Recovery calculated");

        RecoveryScore {
            date,
            score,
            category,
            components: RecoveryComponents {
                hrv_deviation,
                rhr_deviation,
                hrv_score,
                rhr_score,
                sleep_quality,
                hrv_baseline: baseline.hrv_baseline_7day,
                rhr_baseline: baseline.rhr_baseline_7day,
                current_hrv,
                current_rhr,
            },
        }
    }
}

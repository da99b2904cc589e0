//! Data quality assessment
//!
//! Scores how much the day's numbers can be trusted, from how many of the
//! last seven days carried HRV, resting heart rate and sleep data and how
//! mature the baseline is.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::baseline::{AdaptiveBaseline, BaselinePhase};

/// Days of history the completeness ratios are measured over
pub const QUALITY_WINDOW_DAYS: usize = 7;

const HRV_WEIGHT: f64 = 0.35;
const RHR_WEIGHT: f64 = 0.25;
const SLEEP_WEIGHT: f64 = 0.25;
const BASELINE_WEIGHT: f64 = 0.15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataQualityLevel {
    High,
    Moderate,
    Low,
}

impl DataQualityLevel {
    pub fn from_confidence(confidence: f64) -> Self {
        if confidence >= 0.75 {
            DataQualityLevel::High
        } else if confidence >= 0.5 {
            DataQualityLevel::Moderate
        } else {
            DataQualityLevel::Low
        }
    }
}

impl fmt::Display for DataQualityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataQualityLevel::High => write!(f, "High"),
            DataQualityLevel::Moderate => write!(f, "Moderate"),
            DataQualityLevel::Low => write!(f, "Low"),
        }
    }
}

/// Completeness summary behind the day's scores
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataQuality {
    /// Weighted 0-1 confidence
    pub confidence: f64,
    pub level: DataQualityLevel,
    pub hrv_completeness: f64,
    pub rhr_completeness: f64,
    pub sleep_completeness: f64,
    pub baseline_maturity: f64,
    pub issues: Vec<String>,
}

pub struct DataQualityAssessor;

impl DataQualityAssessor {
    /// Fraction of the window covered, capped at 1
    pub fn completeness(days_with_data: usize) -> f64 {
        (days_with_data as f64 / QUALITY_WINDOW_DAYS as f64).min(1.0)
    }

    /// Assess data quality from per-signal day counts over the last week
    pub fn assess(
        hrv_days: usize,
        rhr_days: usize,
        sleep_nights: usize,
        baseline: Option<&AdaptiveBaseline>,
    ) -> DataQuality {
        let hrv_completeness = Self::completeness(hrv_days);
        let rhr_completeness = Self::completeness(rhr_days);
        let sleep_completeness = Self::completeness(sleep_nights);
        let baseline_maturity = baseline.map(|b| b.confidence.clamp(0.0, 1.0)).unwrap_or(0.0);

        let confidence = (hrv_completeness * HRV_WEIGHT
            + rhr_completeness * RHR_WEIGHT
            + sleep_completeness * SLEEP_WEIGHT
            + baseline_maturity * BASELINE_WEIGHT)
            .clamp(0.0, 1.0);

        let mut issues = Vec::new();
        for (label, days) in [
            ("HRV", hrv_days),
            ("resting heart rate", rhr_days),
            ("sleep", sleep_nights),
        ] {
            if days == 0 {
                issues.push(format!("No {} data in the last week", label));
            } else if days < QUALITY_WINDOW_DAYS {
                issues.push(format!(
                    "Limited {} data ({} of {} days)",
                    label, days, QUALITY_WINDOW_DAYS
                ));
            }
        }
        match baseline {
            None => issues.push("Baseline not yet available".to_string()),
            Some(b) if !b.is_reliable => issues.push(match b.phase {
                BaselinePhase::Initial | BaselinePhase::Calibrating => format!(
                    "Baseline still calibrating ({} days of history)",
                    b.days_available
                ),
                _ => "Baseline not yet reliable (high day-to-day variation)".to_string(),
            }),
            _ => {}
        }

        DataQuality {
            confidence,
            level: DataQualityLevel::from_confidence(confidence),
            hrv_completeness,
            rhr_completeness,
            sleep_completeness,
            baseline_maturity,
            issues,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn baseline(phase: BaselinePhase, days: usize, reliable: bool) -> AdaptiveBaseline {
        AdaptiveBaseline {
            date: NaiveDate::from_ymd_opt(2024, 3, 16).unwrap(),
            phase,
            days_available: days,
            hrv_baseline: 50.0,
            rhr_baseline: 58.0,
            confidence: phase.confidence(days),
            hrv_trend: 0.0,
            rhr_trend: 0.0,
            is_reliable: reliable,
        }
    }

    #[test]
    fn test_complete_data_is_high_quality() {
        let b = baseline(BaselinePhase::Mature, 90, true);
        let quality = DataQualityAssessor::assess(7, 7, 7, Some(&b));
        assert!((quality.confidence - (0.85 + 0.95 * 0.15)).abs() < 1e-9);
        assert_eq!(quality.level, DataQualityLevel::High);
        assert!(quality.issues.is_empty());
    }

    #[test]
    fn test_no_data_is_low_quality() {
        let quality = DataQualityAssessor::assess(0, 0, 0, None);
        assert_eq!(quality.confidence, 0.0);
        assert_eq!(quality.level, DataQualityLevel::Low);
        assert_eq!(quality.issues.len(), 4);
        assert!(quality.issues[0].contains("No HRV"));
    }

    #[test]
    fn test_partial_data() {
        let b = baseline(BaselinePhase::Calibrating, 9, false);
        let quality = DataQualityAssessor::assess(4, 7, 10, Some(&b));
        assert_eq!(quality.sleep_completeness, 1.0);
        assert!(quality.issues.iter().any(|i| i.contains("Limited HRV data (4 of 7 days)")));
        assert!(quality
            .issues
            .contains(&"Baseline still calibrating (9 days of history)".to_string()));
        assert_eq!(quality.level, DataQualityLevel::High);
    }

    #[test]
    fn test_unreliable_established_baseline_issue() {
        for (phase, days) in [
            (BaselinePhase::Established, 20),
            (BaselinePhase::Refined, 40),
            (BaselinePhase::Mature, 90),
        ] {
            let b = baseline(phase, days, false);
            let quality = DataQualityAssessor::assess(7, 7, 7, Some(&b));
            assert_eq!(
                quality.issues,
                vec!["Baseline not yet reliable (high day-to-day variation)".to_string()]
            );
        }
    }

    #[test]
    fn test_level_thresholds() {
        assert_eq!(DataQualityLevel::from_confidence(0.75), DataQualityLevel::High);
        assert_eq!(DataQualityLevel::from_confidence(0.74), DataQualityLevel::Moderate);
        assert_eq!(DataQualityLevel::from_confidence(0.5), DataQualityLevel::Moderate);
        assert_eq!(DataQualityLevel::from_confidence(0.49), DataQualityLevel::Low);
    }
}

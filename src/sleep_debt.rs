//! Sleep debt tracking
//!
//! Debt is the running shortfall against the nightly sleep target. Recent
//! nights count most: each night's deficit is weighted `0.9^age` (age 0 is
//! last night) over a 14-night window. Nights above target pay debt back at
//! half credit, and debt never goes negative.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::statistics;

/// Nights considered for rolling debt and trend
pub const ROLLING_WINDOW_NIGHTS: usize = 14;

/// Nights considered for weekly debt
pub const WEEKLY_WINDOW_NIGHTS: usize = 7;

/// Per-night decay of older deficits
pub const DEBT_DECAY: f64 = 0.9;

/// Fraction of a surplus credited against debt
pub const SURPLUS_CREDIT: f64 = 0.5;

/// Deficit slope (minutes/day) beyond which debt is trending
const TREND_THRESHOLD: f64 = 10.0;

/// One night's sleep total
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NightlySleep {
    pub date: NaiveDate,
    pub duration_minutes: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DebtTrend {
    Increasing,
    Stable,
    Decreasing,
}

impl DebtTrend {
    pub fn from_slope(slope: f64) -> Self {
        if slope > TREND_THRESHOLD {
            DebtTrend::Increasing
        } else if slope < -TREND_THRESHOLD {
            DebtTrend::Decreasing
        } else {
            DebtTrend::Stable
        }
    }
}

impl fmt::Display for DebtTrend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DebtTrend::Increasing => write!(f, "Increasing"),
            DebtTrend::Stable => write!(f, "Stable"),
            DebtTrend::Decreasing => write!(f, "Decreasing"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DebtSeverity {
    None,        // < 1h
    Mild,        // 1-3h
    Moderate,    // 3-6h
    Significant, // 6-10h
    Severe,      // >= 10h
}

impl DebtSeverity {
    pub fn from_hours(hours: f64) -> Self {
        match hours {
            h if h < 1.0 => DebtSeverity::None,
            h if h < 3.0 => DebtSeverity::Mild,
            h if h < 6.0 => DebtSeverity::Moderate,
            h if h < 10.0 => DebtSeverity::Significant,
            _ => DebtSeverity::Severe,
        }
    }
}

impl fmt::Display for DebtSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DebtSeverity::None => write!(f, "None"),
            DebtSeverity::Mild => write!(f, "Mild"),
            DebtSeverity::Moderate => write!(f, "Moderate"),
            DebtSeverity::Significant => write!(f, "Significant"),
            DebtSeverity::Severe => write!(f, "Severe"),
        }
    }
}

/// Sleep debt summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepDebt {
    pub target_minutes: f64,
    /// Sum of shortfalls over the last 7 nights (surplus counts as 0)
    pub weekly_debt_minutes: f64,
    /// Decayed 14-night debt
    pub rolling_debt_minutes: f64,
    pub debt_hours: f64,
    /// Deficit change in minutes per night
    pub trend_slope: f64,
    pub trend: DebtTrend,
    pub severity: DebtSeverity,
    pub recommendation: String,
    pub nights_analyzed: usize,
}

pub struct SleepDebtTracker;

impl SleepDebtTracker {
    /// Shortfall over the trailing 7 nights (records oldest first)
    pub fn weekly_debt(records: &[NightlySleep], target_minutes: f64) -> f64 {
        records
            .iter()
            .rev()
            .take(WEEKLY_WINDOW_NIGHTS)
            .map(|r| (target_minutes - r.duration_minutes).max(0.0))
            .sum()
    }

    /// Decayed rolling debt over the trailing 14 nights (records oldest first)
    pub fn rolling_debt(records: &[NightlySleep], target_minutes: f64) -> f64 {
        let mut debt: f64 = 0.0;

        for (age, record) in records.iter().rev().take(ROLLING_WINDOW_NIGHTS).enumerate() {
            let weight = DEBT_DECAY.powi(age as i32);
            let deficit = target_minutes - record.duration_minutes;
            if deficit > 0.0 {
                debt += deficit * weight;
            } else {
                // deficit is a surplus here, so this pays debt back
                debt = (debt + deficit * weight * SURPLUS_CREDIT).max(0.0);
            }
        }

        debt.max(0.0)
    }

    /// Least-squares slope of nightly deficits over the rolling window
    pub fn deficit_trend(records: &[NightlySleep], target_minutes: f64) -> f64 {
        let start = records.len().saturating_sub(ROLLING_WINDOW_NIGHTS);
        let deficits: Vec<f64> = records[start..]
            .iter()
            .map(|r| target_minutes - r.duration_minutes)
            .collect();
        statistics::linear_regression_slope(&deficits)
    }

    /// Advice for a severity/trend combination
    pub fn recommendation(severity: DebtSeverity, trend: DebtTrend) -> &'static str {
        match (severity, trend) {
            (DebtSeverity::None, _) => "Your sleep is on track",
            (DebtSeverity::Mild, DebtTrend::Increasing) => {
                "Debt is starting to build. Aim for an earlier bedtime tonight"
            }
            (DebtSeverity::Mild, _) => "Add 15-30 minutes of sleep over the next few nights",
            (DebtSeverity::Moderate, DebtTrend::Decreasing) => {
                "You're paying debt back. Keep prioritizing sleep"
            }
            (DebtSeverity::Moderate, _) => {
                "Go to bed 30-45 minutes earlier for the next several nights"
            }
            (DebtSeverity::Significant, DebtTrend::Decreasing) => {
                "Debt is shrinking. Keep the extra sleep going this week"
            }
            (DebtSeverity::Significant, _) => {
                "Prioritize sleep: add an hour per night and avoid late training"
            }
            (DebtSeverity::Severe, _) => {
                "Severe sleep debt. Reduce training load and make sleep your top priority"
            }
        }
    }

    /// Full debt summary; records are sorted by date before use
    pub fn calculate(records: &[NightlySleep], target_minutes: f64) -> SleepDebt {
        let mut sorted = records.to_vec();
        sorted.sort_by_key(|r| r.date);

        let weekly_debt_minutes = Self::weekly_debt(&sorted, target_minutes);
        let rolling_debt_minutes = Self::rolling_debt(&sorted, target_minutes);
        let debt_hours = rolling_debt_minutes / 60.0;
        let trend_slope = Self::deficit_trend(&sorted, target_minutes);
        let trend = DebtTrend::from_slope(trend_slope);
        let severity = DebtSeverity::from_hours(debt_hours);

        SleepDebt {
            target_minutes,
            weekly_debt_minutes,
            rolling_debt_minutes,
            debt_hours,
            trend_slope,
            trend,
            severity,
            recommendation: Self::recommendation(severity, trend).to_string(),
            nights_analyzed: sorted.len().min(ROLLING_WINDOW_NIGHTS),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nights(durations: &[f64]) -> Vec<NightlySleep> {
        let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        durations
            .iter()
            .enumerate()
            .map(|(i, d)| NightlySleep {
                date: start + chrono::Duration::days(i as i64),
                duration_minutes: *d,
            })
            .collect()
    }

    #[test]
    fn test_on_track() {
        let debt = SleepDebtTracker::calculate(&nights(&[450.0; 7]), 450.0);
        assert_eq!(debt.weekly_debt_minutes, 0.0);
        assert_eq!(debt.rolling_debt_minutes, 0.0);
        assert_eq!(debt.severity, DebtSeverity::None);
        assert_eq!(debt.trend, DebtTrend::Stable);
        assert_eq!(debt.recommendation, "Your sleep is on track");
    }

    #[test]
    fn test_weekly_debt_ignores_surplus() {
        let records = nights(&[400.0, 500.0, 420.0, 450.0, 480.0, 390.0, 450.0]);
        // 50 + 0 + 30 + 0 + 0 + 60 + 0
        assert_eq!(SleepDebtTracker::weekly_debt(&records, 450.0), 140.0);
    }

    #[test]
    fn test_weekly_debt_uses_last_seven() {
        let mut durations = vec![0.0; 3];
        durations.extend(vec![450.0; 7]);
        assert_eq!(SleepDebtTracker::weekly_debt(&nights(&durations), 450.0), 0.0);
    }

    #[test]
    fn test_rolling_debt_decay() {
        // Last night short by 60, the night before short by 60
        let records = nights(&[390.0, 390.0]);
        let debt = SleepDebtTracker::rolling_debt(&records, 450.0);
        assert!((debt - (60.0 + 60.0 * 0.9)).abs() < 1e-9);
    }

    #[test]
    fn test_surplus_pays_back_half() {
        // Most recent first: 60 deficit (w=1), then 40 surplus (w=0.9)
        let records = nights(&[490.0, 390.0]);
        let debt = SleepDebtTracker::rolling_debt(&records, 450.0);
        assert!((debt - (60.0 - 40.0 * 0.9 * 0.5)).abs() < 1e-9);
    }

    #[test]
    fn test_rolling_debt_floors_at_zero() {
        let records = nights(&[600.0; 14]);
        assert_eq!(SleepDebtTracker::rolling_debt(&records, 450.0), 0.0);
    }

    #[test]
    fn test_increasing_trend() {
        let records = nights(&[450.0, 430.0, 410.0, 390.0, 370.0, 350.0, 330.0]);
        let debt = SleepDebtTracker::calculate(&records, 450.0);
        assert!((debt.trend_slope - 20.0).abs() < 1e-9);
        assert_eq!(debt.trend, DebtTrend::Increasing);
        assert!(debt.severity >= DebtSeverity::Moderate);
    }

    #[test]
    fn test_severity_tiers() {
        assert_eq!(DebtSeverity::from_hours(0.5), DebtSeverity::None);
        assert_eq!(DebtSeverity::from_hours(1.0), DebtSeverity::Mild);
        assert_eq!(DebtSeverity::from_hours(3.0), DebtSeverity::Moderate);
        assert_eq!(DebtSeverity::from_hours(6.0), DebtSeverity::Significant);
        assert_eq!(DebtSeverity::from_hours(10.0), DebtSeverity::Severe);
    }

    #[test]
    fn test_recommendation_table() {
        assert_eq!(
            SleepDebtTracker::recommendation(DebtSeverity::None, DebtTrend::Increasing),
            "Your sleep is on track"
        );
        assert_ne!(
            SleepDebtTracker::recommendation(DebtSeverity::Moderate, DebtTrend::Decreasing),
            SleepDebtTracker::recommendation(DebtSeverity::Moderate, DebtTrend::Stable)
        );
        assert!(SleepDebtTracker::recommendation(DebtSeverity::Severe, DebtTrend::Stable)
            .starts_with("Severe"));
    }

    #[test]
    fn test_unsorted_and_empty_records() {
        let mut records = nights(&[390.0, 450.0]);
        records.reverse();
        let debt = SleepDebtTracker::calculate(&records, 450.0);
        // Most recent night met target, older night 60 short at weight 0.9
        assert!((debt.rolling_debt_minutes - 54.0).abs() < 1e-9);

        let empty = SleepDebtTracker::calculate(&[], 450.0);
        assert_eq!(empty.rolling_debt_minutes, 0.0);
        assert_eq!(empty.nights_analyzed, 0);
    }

    use proptest::prelude::*;

    proptest! {
        #[test]
        fn test_debt_never_negative(
            durations in proptest::collection::vec(0.0f64..900.0, 0..30),
            target in 300.0f64..600.0,
        ) {
            let debt = SleepDebtTracker::calculate(&nights(&durations), target);
            prop_assert!(debt.rolling_debt_minutes >= 0.0);
            prop_assert!(debt.weekly_debt_minutes >= 0.0);
        }
    }
}

//! Adaptive personal baselines
//!
//! Recovery is scored against the athlete's own HRV and resting heart rate,
//! so the baseline has to exist from day one and sharpen as history grows.
//! The calculator moves through five phases keyed on the number of days of
//! history available:
//!
//! | Phase | Days | Estimate | Confidence |
//! |---|---|---|---|
//! | Initial | 0-6 | plain mean | 0.14 × days |
//! | Calibrating | 7-13 | weighted 7-day | 0.85 |
//! | Established | 14-27 | 0.6 × 7d + 0.4 × 14d | 0.90 |
//! | Refined | 28-59 | 0.55 × 7d + 0.3 × 14d + 0.15 × 28d | 0.93 |
//! | Mature | 60+ | 0.5 × 7d + 0.3 × 14d + 0.2 × 28d | 0.95 |
//!
//! History slices are ordered oldest first. Weighted averages use
//! exponential decay (ratio 0.9) so the most recent day weighs most.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::models::UserBaseline;
use crate::recovery::OPTIMAL_RECOVERY_THRESHOLD;
use crate::statistics;

/// Sleep need used until enough paired history exists
pub const DEFAULT_SLEEP_NEED_MINUTES: f64 = 450.0;
pub const MIN_SLEEP_NEED_MINUTES: f64 = 360.0;
pub const MAX_SLEEP_NEED_MINUTES: f64 = 600.0;

/// Paired sleep/recovery days required before estimating sleep need
pub const MIN_SLEEP_NEED_SAMPLES: usize = 7;

/// Decay ratio between consecutive days in weighted averages
pub const WEIGHT_DECAY: f64 = 0.9;

/// Baseline maturity phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BaselinePhase {
    Initial,
    Calibrating,
    Established,
    Refined,
    Mature,
}

impl BaselinePhase {
    /// Phase for a given amount of history
    pub fn from_days(days: usize) -> Self {
        match days {
            0..=6 => BaselinePhase::Initial,
            7..=13 => BaselinePhase::Calibrating,
            14..=27 => BaselinePhase::Established,
            28..=59 => BaselinePhase::Refined,
            _ => BaselinePhase::Mature,
        }
    }

    /// Confidence in a baseline built from `days` of history (0-1)
    pub fn confidence(&self, days: usize) -> f64 {
        match self {
            BaselinePhase::Initial => (days as f64 * 0.14).min(0.84),
            BaselinePhase::Calibrating => 0.85,
            BaselinePhase::Established => 0.90,
            BaselinePhase::Refined => 0.93,
            BaselinePhase::Mature => 0.95,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            BaselinePhase::Initial => "Learning your baseline",
            BaselinePhase::Calibrating => "Calibrating to your physiology",
            BaselinePhase::Established => "Baseline established",
            BaselinePhase::Refined => "Baseline refined with a month of data",
            BaselinePhase::Mature => "Mature baseline",
        }
    }
}

impl fmt::Display for BaselinePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BaselinePhase::Initial => write!(f, "Initial"),
            BaselinePhase::Calibrating => write!(f, "Calibrating"),
            BaselinePhase::Established => write!(f, "Established"),
            BaselinePhase::Refined => write!(f, "Refined"),
            BaselinePhase::Mature => write!(f, "Mature"),
        }
    }
}

/// Baseline calculation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineSettings {
    /// Minimum samples before a baseline is considered reliable
    pub minimum_days: usize,

    /// Maximum coefficient of variation (percent) for a reliable baseline
    pub max_cv_percent: f64,

    /// Tukey fence multiplier for outlier removal
    pub outlier_threshold: f64,

    /// EMA factor applied against the previous baseline (0 disables smoothing)
    pub smoothing_alpha: f64,
}

impl Default for BaselineSettings {
    fn default() -> Self {
        BaselineSettings {
            minimum_days: 7,
            max_cv_percent: 30.0,
            outlier_threshold: 1.5,
            smoothing_alpha: 0.3,
        }
    }
}

/// Phase-aware HRV/RHR baseline summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdaptiveBaseline {
    pub date: NaiveDate,
    pub phase: BaselinePhase,
    pub days_available: usize,
    pub hrv_baseline: f64,
    pub rhr_baseline: f64,
    /// 0-1
    pub confidence: f64,
    /// HRV change per day (ms/day)
    pub hrv_trend: f64,
    /// RHR change per day (bpm/day)
    pub rhr_trend: f64,
    pub is_reliable: bool,
}

/// Baseline calculation engine
#[derive(Debug, Clone, Default)]
pub struct BaselineCalculator {
    settings: BaselineSettings,
}

impl BaselineCalculator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: BaselineSettings) -> Self {
        BaselineCalculator { settings }
    }

    pub fn settings(&self) -> &BaselineSettings {
        &self.settings
    }

    /// Exponentially weighted mean, most recent (last) value weighted highest
    ///
    /// The value at position `i` of `n` gets weight `0.9^(n-1-i)`.
    pub fn calculate_weighted_average(values: &[f64]) -> f64 {
        if values.is_empty() {
            return 0.0;
        }

        let n = values.len();
        let mut weighted_sum = 0.0;
        let mut total_weight = 0.0;
        for (i, value) in values.iter().enumerate() {
            let weight = WEIGHT_DECAY.powi((n - 1 - i) as i32);
            weighted_sum += value * weight;
            total_weight += weight;
        }

        weighted_sum / total_weight
    }

    /// Keep values inside the Tukey IQR fence; no-op below four values
    pub fn detect_outliers(values: &[f64], threshold: f64) -> Vec<f64> {
        statistics::iqr_filter(values, threshold)
    }

    /// Least-squares slope of the series against day index
    pub fn calculate_trend(values: &[f64]) -> f64 {
        statistics::linear_regression_slope(values)
    }

    /// Estimate nightly sleep need from days that led to optimal recovery
    ///
    /// `durations` and `recovery_scores` are paired by index. With fewer than
    /// seven pairs, or no optimal-recovery day among them, the default of
    /// 450 minutes is returned.
    pub fn calculate_sleep_need(durations: &[f64], recovery_scores: &[f64]) -> f64 {
        let pairs: Vec<(f64, f64)> = durations
            .iter()
            .copied()
            .zip(recovery_scores.iter().copied())
            .collect();

        if pairs.len() < MIN_SLEEP_NEED_SAMPLES {
            return DEFAULT_SLEEP_NEED_MINUTES;
        }

        let restorative: Vec<f64> = pairs
            .iter()
            .filter(|(_, recovery)| *recovery >= OPTIMAL_RECOVERY_THRESHOLD)
            .map(|(duration, _)| *duration)
            .collect();

        if restorative.is_empty() {
            return DEFAULT_SLEEP_NEED_MINUTES;
        }

        statistics::mean(&restorative).clamp(MIN_SLEEP_NEED_MINUTES, MAX_SLEEP_NEED_MINUTES)
    }

    /// Blend previous and freshly computed baselines: `alpha*new + (1-alpha)*old`
    pub fn smooth(previous: f64, current: f64, alpha: f64) -> f64 {
        alpha * current + (1.0 - alpha) * previous
    }

    /// Enough samples with low enough spread to trust the baseline
    pub fn is_baseline_reliable(&self, values: &[f64]) -> bool {
        values.len() >= self.settings.minimum_days
            && statistics::coefficient_of_variation(values) <= self.settings.max_cv_percent
    }

    /// Phase-appropriate baseline estimate for one series (oldest first)
    pub fn phase_baseline(&self, values: &[f64]) -> f64 {
        let phase = BaselinePhase::from_days(values.len());
        if phase == BaselinePhase::Initial {
            return statistics::mean(values);
        }

        let filtered = Self::detect_outliers(values, self.settings.outlier_threshold);
        if filtered.len() < values.len() {
            debug!(
                removed = values.len() - filtered.len(),
                phase = %phase,
                "Removed baseline outliers"
            );
        }

        let w7 = Self::calculate_weighted_average(tail(&filtered, 7));
        let w14 = Self::calculate_weighted_average(tail(&filtered, 14));
        let w28 = Self::calculate_weighted_average(tail(&filtered, 28));

        match phase {
            BaselinePhase::Initial | BaselinePhase::Calibrating => w7,
            BaselinePhase::Established => 0.6 * w7 + 0.4 * w14,
            BaselinePhase::Refined => 0.55 * w7 + 0.3 * w14 + 0.15 * w28,
            BaselinePhase::Mature => 0.5 * w7 + 0.3 * w14 + 0.2 * w28,
        }
    }

    /// Compute the adaptive baseline from HRV and RHR history (oldest first)
    ///
    /// When a previous baseline is supplied and the new one is past the
    /// initial phase, the estimate is EMA-smoothed against it to damp
    /// day-to-day jumps.
    pub fn calculate_adaptive(
        &self,
        date: NaiveDate,
        hrv_history: &[f64],
        rhr_history: &[f64],
        previous: Option<&AdaptiveBaseline>,
    ) -> AdaptiveBaseline {
        let days_available = hrv_history.len();
        let phase = BaselinePhase::from_days(days_available);

        let mut hrv_baseline = self.phase_baseline(hrv_history);
        let mut rhr_baseline = self.phase_baseline(rhr_history);

        let alpha = self.settings.smoothing_alpha;
        if let Some(prev) = previous {
            if phase > BaselinePhase::Initial && alpha > 0.0 && alpha < 1.0 {
                if prev.hrv_baseline > 0.0 && hrv_baseline > 0.0 {
                    hrv_baseline = Self::smooth(prev.hrv_baseline, hrv_baseline, alpha);
                }
                if prev.rhr_baseline > 0.0 && rhr_baseline > 0.0 {
                    rhr_baseline = Self::smooth(prev.rhr_baseline, rhr_baseline, alpha);
                }
            }
        }

        let is_reliable =
            self.is_baseline_reliable(hrv_history) && self.is_baseline_reliable(rhr_history);

        debug!(
            %date,
            phase = %phase,
            days = days_available,
            hrv = hrv_baseline,
            rhr = rhr_baseline,
            reliable = is_reliable,
            "Adaptive baseline computed"
        );

        AdaptiveBaseline {
            date,
            phase,
            days_available,
            hrv_baseline,
            rhr_baseline,
            confidence: phase.confidence(days_available),
            hrv_trend: Self::calculate_trend(tail(hrv_history, 14)),
            rhr_trend: Self::calculate_trend(tail(rhr_history, 14)),
            is_reliable,
        }
    }

    /// Derive the day's `UserBaseline` from an adaptive baseline and sleep history
    ///
    /// The configured maximum heart rate is raised, never lowered, by the
    /// highest heart rate actually observed.
    pub fn calculate_user_baseline(
        &self,
        adaptive: &AdaptiveBaseline,
        sleep_durations: &[f64],
        recovery_scores: &[f64],
        configured_max_hr: f64,
        observed_max_hr: Option<f64>,
    ) -> UserBaseline {
        let max_heart_rate = match observed_max_hr {
            Some(observed) if observed > configured_max_hr => observed,
            _ => configured_max_hr,
        };

        UserBaseline {
            date: adaptive.date,
            hrv_baseline_7day: adaptive.hrv_baseline,
            rhr_baseline_7day: adaptive.rhr_baseline,
            sleep_need_minutes: Self::calculate_sleep_need(sleep_durations, recovery_scores),
            max_heart_rate,
        }
    }
}

fn tail(values: &[f64], n: usize) -> &[f64] {
    &values[values.len().saturating_sub(n)..]
}

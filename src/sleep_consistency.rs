//! Sleep schedule consistency
//!
//! Measures how regular bedtimes, wake times and nightly durations are. Times
//! are read in the user's local offset as minutes from midnight; bedtimes
//! before 06:00 are moved past midnight (see
//! [`statistics::unwrap_time_of_day`]) so that 23:45 and 00:15 sit half an
//! hour apart.

use chrono::{DateTime, FixedOffset, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::models::SleepSession;
use crate::statistics::{self, MINUTES_PER_DAY};

/// Nights required before consistency is rated
pub const MIN_NIGHTS: usize = 3;

pub const TIMING_WEIGHT: f64 = 0.55;
pub const DURATION_WEIGHT: f64 = 0.45;

/// Timing standard deviation scoring full marks
const BEST_TIMING_SD_MINUTES: f64 = 30.0;
/// Timing standard deviation scoring zero
const WORST_TIMING_SD_MINUTES: f64 = 120.0;
const BEST_DURATION_CV: f64 = 5.0;
const WORST_DURATION_CV: f64 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsistencyRating {
    Excellent,
    Good,
    Fair,
    Poor,
    Insufficient,
}

impl ConsistencyRating {
    pub fn from_score(score: f64) -> Self {
        if score >= 80.0 {
            ConsistencyRating::Excellent
        } else if score >= 60.0 {
            ConsistencyRating::Good
        } else if score >= 40.0 {
            ConsistencyRating::Fair
        } else if score >= 20.0 {
            ConsistencyRating::Poor
        } else {
            ConsistencyRating::Insufficient
        }
    }
}

impl fmt::Display for ConsistencyRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsistencyRating::Excellent => write!(f, "Excellent"),
            ConsistencyRating::Good => write!(f, "Good"),
            ConsistencyRating::Fair => write!(f, "Fair"),
            ConsistencyRating::Poor => write!(f, "Poor"),
            ConsistencyRating::Insufficient => write!(f, "Insufficient"),
        }
    }
}

/// Regularity of the recent sleep schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepConsistency {
    pub nights_analyzed: usize,
    /// Minutes from local midnight, 0-1440
    pub average_bedtime_minutes: f64,
    pub average_wake_minutes: f64,
    pub bedtime_std_dev_minutes: f64,
    pub wake_std_dev_minutes: f64,
    pub duration_cv_percent: f64,
    pub timing_score: f64,
    pub duration_score: f64,
    /// 0-100
    pub score: f64,
    pub rating: ConsistencyRating,
}

impl SleepConsistency {
    fn insufficient(nights_analyzed: usize) -> Self {
        SleepConsistency {
            nights_analyzed,
            average_bedtime_minutes: 0.0,
            average_wake_minutes: 0.0,
            bedtime_std_dev_minutes: 0.0,
            wake_std_dev_minutes: 0.0,
            duration_cv_percent: 0.0,
            timing_score: 0.0,
            duration_score: 0.0,
            score: 0.0,
            rating: ConsistencyRating::Insufficient,
        }
    }
}

pub struct SleepConsistencyCalculator;

impl SleepConsistencyCalculator {
    /// Local time of day in minutes from midnight
    pub fn minutes_from_midnight(instant: DateTime<Utc>, offset: &FixedOffset) -> f64 {
        let local = instant.with_timezone(offset);
        local.hour() as f64 * 60.0 + local.minute() as f64 + local.second() as f64 / 60.0
    }

    /// Linear map of timing spread: 30 min SD is 100, 120 min is 0
    pub fn timing_score(std_dev_minutes: f64) -> f64 {
        ((WORST_TIMING_SD_MINUTES - std_dev_minutes)
            / (WORST_TIMING_SD_MINUTES - BEST_TIMING_SD_MINUTES)
            * 100.0)
            .clamp(0.0, 100.0)
    }

    /// Linear map of duration CV: 5% is 100, 30% is 0
    pub fn duration_score(cv_percent: f64) -> f64 {
        ((WORST_DURATION_CV - cv_percent) / (WORST_DURATION_CV - BEST_DURATION_CV) * 100.0)
            .clamp(0.0, 100.0)
    }

    pub fn calculate(sessions: &[SleepSession], offset: &FixedOffset) -> SleepConsistency {
        if sessions.len() < MIN_NIGHTS {
            debug!(nights = sessions.len(), "Too few nights for consistency rating");
            return SleepConsistency::insufficient(sessions.len());
        }

        let bedtimes: Vec<f64> = sessions
            .iter()
            .map(|s| Self::minutes_from_midnight(s.start_date, offset))
            .collect();
        let wake_times: Vec<f64> = sessions
            .iter()
            .map(|s| Self::minutes_from_midnight(s.end_date, offset))
            .collect();
        let durations: Vec<f64> = sessions.iter().map(|s| s.total_duration_minutes()).collect();

        // Wake times sit in the morning, so only bedtimes need unwrapping
        let bedtime_std_dev_minutes = statistics::time_of_day_std_dev(&bedtimes);
        let wake_std_dev_minutes = statistics::std_dev(&wake_times);
        let combined_sd = (bedtime_std_dev_minutes + wake_std_dev_minutes) / 2.0;

        let duration_cv_percent = statistics::coefficient_of_variation(&durations);
        let timing_score = Self::timing_score(combined_sd);
        let duration_score = Self::duration_score(duration_cv_percent);
        let score = (timing_score * TIMING_WEIGHT + duration_score * DURATION_WEIGHT).clamp(0.0, 100.0);

        let unwrapped: Vec<f64> = bedtimes
            .iter()
            .map(|m| statistics::unwrap_time_of_day(*m))
            .collect();
        let average_bedtime_minutes = statistics::mean(&unwrapped) % MINUTES_PER_DAY;

        debug!(
            nights = sessions.len(),
            combined_sd, duration_cv_percent, score, "Sleep consistency computed"
        );

        SleepConsistency {
            nights_analyzed: sessions.len(),
            average_bedtime_minutes,
            average_wake_minutes: statistics::mean(&wake_times),
            bedtime_std_dev_minutes,
            wake_std_dev_minutes,
            duration_cv_percent,
            timing_score,
            duration_score,
            score,
            rating: ConsistencyRating::from_score(score),
        }
    }
}

/// Render minutes from midnight as `HH:MM`
pub fn format_clock(minutes: f64) -> String {
    let total = minutes.rem_euclid(MINUTES_PER_DAY).round() as u32 % 1440;
    format!("{:02}:{:02}", total / 60, total % 60)
}

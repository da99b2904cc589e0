//! Strain calculation module
//!
//! Strain quantifies the day's cardiovascular load on a 0-21 scale.
//!
//! ## Algorithm
//! 1. Sort heart-rate samples by time and attribute each one the gap to the
//!    next sample (capped at 5 minutes to bridge sensor dropouts); the last
//!    sample counts for 1 minute.
//! 2. Bucket the minutes into five zones by percentage of max heart rate:
//!    - Zone 1: 50-60%
//!    - Zone 2: 60-70%
//!    - Zone 3: 70-80%
//!    - Zone 4: 80-90%
//!    - Zone 5: 90%+
//! 3. Raw strain = Σ zone minutes × zone weight, weights 0.5/1/2/4/8.
//! 4. Strain = 21 × (1 − e^(−raw/200)), which saturates toward 21.
//!
//! ## Strain Scale
//! - 0-10: Light
//! - 10-14: Moderate
//! - 14-18: High
//! - 18-21: All out

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

use crate::models::{minutes_between, HeartRateSample, WorkoutSession};

/// Zone lower bounds as a fraction of max heart rate (last entry closes zone 5)
pub const ZONE_THRESHOLDS: [f64; 6] = [0.5, 0.6, 0.7, 0.8, 0.9, 1.0];

/// Exponential weight per zone
pub const ZONE_WEIGHTS: [f64; 5] = [0.5, 1.0, 2.0, 4.0, 8.0];

/// Upper bound of the strain scale
pub const MAX_STRAIN: f64 = 21.0;

/// Raw load at which strain reaches ~63% of the scale
pub const STRAIN_SCALE_FACTOR: f64 = 200.0;

/// Longest gap credited to a single sample
pub const MAX_SAMPLE_GAP_MINUTES: f64 = 5.0;

/// Credit for the final sample, which has no successor
pub const LAST_SAMPLE_MINUTES: f64 = 1.0;

/// Strain level classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StrainCategory {
    Light,    // < 10
    Moderate, // 10-14
    High,     // 14-18
    AllOut,   // >= 18
}

impl StrainCategory {
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s >= 18.0 => StrainCategory::AllOut,
            s if s >= 14.0 => StrainCategory::High,
            s if s >= 10.0 => StrainCategory::Moderate,
            _ => StrainCategory::Light,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            StrainCategory::Light => "Light day, minimal cardiovascular load",
            StrainCategory::Moderate => "Moderate load that maintains fitness",
            StrainCategory::High => "High load that builds fitness",
            StrainCategory::AllOut => "All-out effort, plan for recovery",
        }
    }
}

impl fmt::Display for StrainCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrainCategory::Light => write!(f, "Light"),
            StrainCategory::Moderate => write!(f, "Moderate"),
            StrainCategory::High => write!(f, "High"),
            StrainCategory::AllOut => write!(f, "All Out"),
        }
    }
}

/// Strain attributable to one workout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutContribution {
    pub activity_type: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub duration_minutes: f64,
    pub zone_minutes: [f64; 5],
    pub raw_strain: f64,
    /// 0-21
    pub strain: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrainComponents {
    /// Minutes spent at or above zone 1
    pub activity_minutes: f64,
    pub zone_minutes: [f64; 5],
    pub raw_strain: f64,
    pub workout_contributions: Vec<WorkoutContribution>,
}

/// Daily strain score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrainScore {
    pub date: NaiveDate,
    /// 0-21
    pub score: f64,
    pub category: StrainCategory,
    pub components: StrainComponents,
}

impl StrainScore {
    /// Zero strain for a day that cannot be scored
    pub fn empty(date: NaiveDate) -> Self {
        StrainScore {
            date,
            score: 0.0,
            category: StrainCategory::Light,
            components: StrainComponents {
                activity_minutes: 0.0,
                zone_minutes: [0.0; 5],
                raw_strain: 0.0,
                workout_contributions: Vec::new(),
            },
        }
    }
}

/// Strain calculation engine
pub struct StrainCalculator;

impl StrainCalculator {
    /// Zero-based zone index for a heart rate, `None` below 50% of max
    pub fn zone_for(beats_per_minute: f64, max_heart_rate: f64) -> Option<usize> {
        if max_heart_rate <= 0.0 {
            return None;
        }

        let fraction = beats_per_minute / max_heart_rate;
        if fraction < ZONE_THRESHOLDS[0] {
            return None;
        }

        (0..5)
            .find(|&zone| fraction < ZONE_THRESHOLDS[zone + 1])
            .or(Some(4))
    }

    /// Minutes spent in each zone
    ///
    /// Samples are sorted by timestamp before gap attribution.
    pub fn calculate_zone_minutes(samples: &[HeartRateSample], max_heart_rate: f64) -> [f64; 5] {
        let mut zone_minutes = [0.0; 5];
        if samples.is_empty() || max_heart_rate <= 0.0 {
            return zone_minutes;
        }

        let mut sorted: Vec<&HeartRateSample> = samples.iter().collect();
        sorted.sort_by_key(|s| s.timestamp);

        for (i, sample) in sorted.iter().enumerate() {
            let minutes = match sorted.get(i + 1) {
                Some(next) => minutes_between(sample.timestamp, next.timestamp)
                    .clamp(0.0, MAX_SAMPLE_GAP_MINUTES),
                None => LAST_SAMPLE_MINUTES,
            };

            if let Some(zone) = Self::zone_for(sample.beats_per_minute, max_heart_rate) {
                zone_minutes[zone] += minutes;
            }
        }

        zone_minutes
    }

    /// Weighted sum of zone minutes
    pub fn calculate_raw_strain(zone_minutes: &[f64; 5]) -> f64 {
        zone_minutes
            .iter()
            .zip(ZONE_WEIGHTS.iter())
            .map(|(minutes, weight)| minutes * weight)
            .sum()
    }

    /// Map raw strain onto the saturating 0-21 scale
    pub fn convert_to_strain_scale(raw_strain: f64) -> f64 {
        if raw_strain <= 0.0 {
            return 0.0;
        }
        (MAX_STRAIN * (1.0 - (-raw_strain / STRAIN_SCALE_FACTOR).exp())).clamp(0.0, MAX_STRAIN)
    }

    /// Strain for a single workout's own samples
    pub fn calculate_workout_contribution(
        workout: &WorkoutSession,
        max_heart_rate: f64,
    ) -> WorkoutContribution {
        let zone_minutes = Self::calculate_zone_minutes(&workout.heart_rate_samples, max_heart_rate);
        let raw_strain = Self::calculate_raw_strain(&zone_minutes);

        WorkoutContribution {
            activity_type: workout.activity_type.clone(),
            start_date: workout.start_date,
            end_date: workout.end_date,
            duration_minutes: workout.duration_minutes(),
            zone_minutes,
            raw_strain,
            strain: Self::convert_to_strain_scale(raw_strain),
        }
    }

    /// Daily strain from the day's heart-rate samples
    ///
    /// When the day has no standalone samples, the workouts' own samples are
    /// used instead, so workout-only input still produces a score.
    pub fn calculate(
        date: NaiveDate,
        samples: &[HeartRateSample],
        workouts: &[WorkoutSession],
        max_heart_rate: f64,
    ) -> StrainScore {
        if max_heart_rate <= 0.0 {
            warn!(%date, max_heart_rate, "Cannot compute strain without a max heart rate");
            return StrainScore::empty(date);
        }

        let zone_minutes = if samples.is_empty() {
            let workout_samples: Vec<HeartRateSample> = workouts
                .iter()
                .flat_map(|w| w.heart_rate_samples.iter().cloned())
                .collect();
            Self::calculate_zone_minutes(&workout_samples, max_heart_rate)
        } else {
            Self::calculate_zone_minutes(samples, max_heart_rate)
        };

        let raw_strain = Self::calculate_raw_strain(&zone_minutes);
        let score = Self::convert_to_strain_scale(raw_strain);
        let category = StrainCategory::from_score(score);

        let workout_contributions: Vec<WorkoutContribution> = workouts
            .iter()
            .map(|w| Self::calculate_workout_contribution(w, max_heart_rate))
            .collect();

        debug!(%date, score, raw_strain, %category, workouts = workouts.len(), "Strain calculated");

        StrainScore {
            date,
            score,
            category,
            components: StrainComponents {
                activity_minutes: zone_minutes.iter().sum(),
                zone_minutes,
                raw_strain,
                workout_contributions,
            },
        }
    }
}

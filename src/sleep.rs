//! Sleep scoring
//!
//! # Sleep Science Background
//!
//! A night is judged on three things:
//!
//! - **Duration (40%)** against the personal sleep need. 95-110% of need is
//!   full marks; short nights scale down linearly and long nights lose a
//!   little, never below 70.
//! - **Efficiency (35%)**: the fraction of the session not spent awake.
//!   90% or better is full marks.
//! - **Stage quality (25%)**: deep and REM share of time asleep compared
//!   with ideals of 20% and 25%.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::baseline::DEFAULT_SLEEP_NEED_MINUTES;
use crate::models::SleepSession;

pub const DURATION_WEIGHT: f64 = 0.40;
pub const EFFICIENCY_WEIGHT: f64 = 0.35;
pub const STAGE_WEIGHT: f64 = 0.25;

/// Ideal share of sleep spent in deep sleep
pub const IDEAL_DEEP_FRACTION: f64 = 0.20;

/// Ideal share of sleep spent in REM
pub const IDEAL_REM_FRACTION: f64 = 0.25;

/// Stage score when no time asleep was recorded
pub const DEFAULT_STAGE_SCORE: f64 = 50.0;

const OPTIMAL_DURATION_RATIO_MIN: f64 = 0.95;
const OPTIMAL_DURATION_RATIO_MAX: f64 = 1.10;
const OVERSLEEP_FLOOR: f64 = 70.0;
const OPTIMAL_EFFICIENCY: f64 = 0.9;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepComponents {
    pub duration_score: f64,
    pub efficiency_score: f64,
    pub stage_score: f64,
    pub total_duration_minutes: f64,
    pub sleep_need_minutes: f64,
    /// Fraction 0-1
    pub efficiency: f64,
    pub deep_sleep_minutes: f64,
    pub rem_sleep_minutes: f64,
}

/// Nightly sleep score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepScore {
    pub date: NaiveDate,
    /// 0-100
    pub score: f64,
    pub components: SleepComponents,
}

pub struct SleepScoreCalculator;

impl SleepScoreCalculator {
    /// Score duration against need (ratio = actual / need)
    pub fn duration_score(actual_minutes: f64, need_minutes: f64) -> f64 {
        let need = if need_minutes > 0.0 {
            need_minutes
        } else {
            DEFAULT_SLEEP_NEED_MINUTES
        };
        let ratio = (actual_minutes / need).max(0.0);

        if ratio < OPTIMAL_DURATION_RATIO_MIN {
            ratio / OPTIMAL_DURATION_RATIO_MIN * 100.0
        } else if ratio <= OPTIMAL_DURATION_RATIO_MAX {
            100.0
        } else {
            (100.0 - (ratio - OPTIMAL_DURATION_RATIO_MAX) * 50.0).max(OVERSLEEP_FLOOR)
        }
    }

    /// Full marks at 90% efficiency, linear below
    pub fn efficiency_score(efficiency: f64) -> f64 {
        if efficiency >= OPTIMAL_EFFICIENCY {
            100.0
        } else {
            (efficiency / OPTIMAL_EFFICIENCY * 100.0).max(0.0)
        }
    }

    /// Average closeness of deep and REM shares to their ideals
    pub fn stage_score(deep_minutes: f64, rem_minutes: f64, asleep_minutes: f64) -> f64 {
        if asleep_minutes <= 0.0 {
            return DEFAULT_STAGE_SCORE;
        }

        let deep_fraction = deep_minutes / asleep_minutes;
        let rem_fraction = rem_minutes / asleep_minutes;

        let deep_score = (100.0 - (deep_fraction - IDEAL_DEEP_FRACTION).abs() * 200.0).max(0.0);
        let rem_score = (100.0 - (rem_fraction - IDEAL_REM_FRACTION).abs() * 200.0).max(0.0);

        (deep_score + rem_score) / 2.0
    }

    /// Score one sleep session against the given nightly need
    pub fn calculate(date: NaiveDate, session: &SleepSession, sleep_need_minutes: f64) -> SleepScore {
        let total_duration_minutes = session.total_duration_minutes();
        let efficiency = session.efficiency();
        let deep_sleep_minutes = session.deep_minutes();
        let rem_sleep_minutes = session.rem_minutes();

        let duration_score = Self::duration_score(total_duration_minutes, sleep_need_minutes);
        let efficiency_score = Self::efficiency_score(efficiency);
        let stage_score = Self::stage_score(
            deep_sleep_minutes,
            rem_sleep_minutes,
            session.asleep_minutes(),
        );

        let score = (duration_score * DURATION_WEIGHT
            + efficiency_score * EFFICIENCY_WEIGHT
            + stage_score * STAGE_WEIGHT)
            .clamp(0.0, 100.0);

        debug!(%date, score, duration_score, efficiency_score, stage_score, "Sleep scored");

        SleepScore {
            date,
            score,
            components: SleepComponents {
                duration_score,
                efficiency_score,
                stage_score,
                total_duration_minutes,
                sleep_need_minutes,
                efficiency,
                deep_sleep_minutes,
                rem_sleep_minutes,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SleepStageInterval, SleepStageType};
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 16).unwrap()
    }

    /// Build a session from consecutive (stage, minutes) blocks
    fn session(blocks: &[(SleepStageType, i64)]) -> SleepSession {
        let start: DateTime<Utc> = Utc.with_ymd_and_hms(2024, 3, 15, 23, 0, 0).unwrap();
        let mut cursor = start;
        let mut stages = Vec::new();
        for (stage, minutes) in blocks {
            let end = cursor + Duration::minutes(*minutes);
            stages.push(SleepStageInterval::new(*stage, cursor, end).unwrap());
            cursor = end;
        }
        SleepSession::new(start, cursor, stages).unwrap()
    }

    #[test]
    fn test_duration_score() {
        assert_eq!(SleepScoreCalculator::duration_score(450.0, 450.0), 100.0);
        assert_eq!(SleepScoreCalculator::duration_score(495.0, 450.0), 100.0);
        assert_eq!(SleepScoreCalculator::duration_score(0.0, 450.0), 0.0);

        let short = SleepScoreCalculator::duration_score(225.0, 450.0);
        assert!((short - 0.5 / 0.95 * 100.0).abs() < 1e-9);

        // 1.3 ratio: 100 - 0.2 * 50 = 90
        let long = SleepScoreCalculator::duration_score(585.0, 450.0);
        assert!((long - 90.0).abs() < 1e-9);

        // Heavy oversleep never drops below 70
        assert_eq!(SleepScoreCalculator::duration_score(2000.0, 450.0), 70.0);

        // Unknown need falls back to the default
        assert_eq!(SleepScoreCalculator::duration_score(450.0, 0.0), 100.0);
    }

    #[test]
    fn test_efficiency_score() {
        assert_eq!(SleepScoreCalculator::efficiency_score(0.95), 100.0);
        assert_eq!(SleepScoreCalculator::efficiency_score(0.9), 100.0);
        assert!((SleepScoreCalculator::efficiency_score(0.45) - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_stage_score() {
        // Exactly ideal
        assert!((SleepScoreCalculator::stage_score(80.0, 100.0, 400.0) - 100.0).abs() < 1e-9);
        // Deep 10% (off by 0.1 -> 80), REM 25% (100)
        assert!((SleepScoreCalculator::stage_score(40.0, 100.0, 400.0) - 90.0).abs() < 1e-9);
        // No sleep recorded
        assert_eq!(SleepScoreCalculator::stage_score(0.0, 0.0, 0.0), DEFAULT_STAGE_SCORE);
        // Far off ideal floors at zero per stage
        assert_eq!(SleepScoreCalculator::stage_score(400.0, 0.0, 400.0), 25.0);
    }

    #[test]
    fn test_good_night() {
        // 480 minutes, 96 deep (20%), 120 REM (25%), no awake time
        let night = session(&[
            (SleepStageType::Core, 120),
            (SleepStageType::Deep, 96),
            (SleepStageType::Core, 144),
            (SleepStageType::Rem, 120),
        ]);
        let score = SleepScoreCalculator::calculate(date(), &night, 450.0);

        assert_eq!(score.components.total_duration_minutes, 480.0);
        assert_eq!(score.components.efficiency, 1.0);
        assert!((score.score - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_restless_night() {
        // 60 of 300 minutes awake: efficiency 0.8
        let night = session(&[
            (SleepStageType::Core, 100),
            (SleepStageType::Awake, 60),
            (SleepStageType::Deep, 48),
            (SleepStageType::Rem, 60),
            (SleepStageType::Core, 32),
        ]);
        let score = SleepScoreCalculator::calculate(date(), &night, 450.0);

        assert!((score.components.efficiency - 0.8).abs() < 1e-9);
        // duration 70.2 * 0.4 + efficiency 88.9 * 0.35 + ideal stages 100 * 0.25
        let expected = (300.0 / 450.0) / 0.95 * 100.0 * 0.4 + 0.8 / 0.9 * 100.0 * 0.35 + 25.0;
        assert!((score.score - expected).abs() < 1e-6);
        assert!(score.score < 85.0);
        assert_eq!(score.components.deep_sleep_minutes, 48.0);
        assert_eq!(score.components.rem_sleep_minutes, 60.0);
    }

    #[test]
    fn test_in_bed_only_session() {
        let night = session(&[(SleepStageType::InBed, 420)]);
        let score = SleepScoreCalculator::calculate(date(), &night, 450.0);
        assert_eq!(score.components.stage_score, DEFAULT_STAGE_SCORE);
        assert!(score.score >= 0.0 && score.score <= 100.0);
    }
}

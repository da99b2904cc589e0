use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ValidationError;

/// Highest heart rate accepted from any sensor
pub const MAX_PLAUSIBLE_BPM: f64 = 300.0;

/// Where a heart-rate reading came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeartRateSource {
    Watch,
    Manual,
}

impl Default for HeartRateSource {
    fn default() -> Self {
        HeartRateSource::Watch
    }
}

/// Single heart-rate reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeartRateSample {
    pub timestamp: DateTime<Utc>,

    /// Beats per minute
    pub beats_per_minute: f64,

    #[serde(default)]
    pub source: HeartRateSource,
}

impl HeartRateSample {
    /// Create a heart-rate sample, rejecting readings outside (0, 300] bpm
    pub fn new(
        timestamp: DateTime<Utc>,
        beats_per_minute: f64,
        source: HeartRateSource,
    ) -> Result<Self, ValidationError> {
        if !beats_per_minute.is_finite()
            || beats_per_minute <= 0.0
            || beats_per_minute > MAX_PLAUSIBLE_BPM
        {
            return Err(ValidationError::InvalidHeartRate {
                bpm: beats_per_minute,
            });
        }

        Ok(HeartRateSample {
            timestamp,
            beats_per_minute,
            source,
        })
    }
}

/// HRV reading as reported by the device
///
/// Devices always report SDNN. Beat-to-beat R-R intervals are present only
/// when the sensor exposes them, and enable RMSSD.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HrvSample {
    pub timestamp: DateTime<Utc>,

    /// SDNN in milliseconds
    pub sdnn_ms: f64,

    /// Raw R-R intervals in milliseconds
    #[serde(default)]
    pub rr_intervals_ms: Option<Vec<f64>>,
}

impl HrvSample {
    pub fn new(
        timestamp: DateTime<Utc>,
        sdnn_ms: f64,
        rr_intervals_ms: Option<Vec<f64>>,
    ) -> Result<Self, ValidationError> {
        if !sdnn_ms.is_finite() || sdnn_ms < 0.0 {
            return Err(ValidationError::InvalidHrv { value: sdnn_ms });
        }

        Ok(HrvSample {
            timestamp,
            sdnn_ms,
            rr_intervals_ms,
        })
    }
}

/// Sleep stage classification as recorded by the watch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SleepStageType {
    Awake,
    Rem,
    Core,
    Deep,
    InBed,
    Unspecified,
}

impl SleepStageType {
    /// True for stages that count as time asleep
    pub fn is_asleep(&self) -> bool {
        !matches!(self, SleepStageType::Awake | SleepStageType::InBed)
    }
}

impl fmt::Display for SleepStageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SleepStageType::Awake => write!(f, "Awake"),
            SleepStageType::Rem => write!(f, "REM"),
            SleepStageType::Core => write!(f, "Core"),
            SleepStageType::Deep => write!(f, "Deep"),
            SleepStageType::InBed => write!(f, "In Bed"),
            SleepStageType::Unspecified => write!(f, "Unspecified"),
        }
    }
}

/// One contiguous stage inside a sleep session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepStageInterval {
    pub stage: SleepStageType,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

impl SleepStageInterval {
    pub fn new(
        stage: SleepStageType,
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        if end_date <= start_date {
            return Err(ValidationError::InvalidTimeRange {
                record: format!("{} sleep stage", stage),
            });
        }

        Ok(SleepStageInterval {
            stage,
            start_date,
            end_date,
        })
    }

    pub fn duration_minutes(&self) -> f64 {
        minutes_between(self.start_date, self.end_date)
    }
}

/// A night (or nap) of sleep with its stage timeline
///
/// Stages are expected to be non-overlapping and to lie within
/// `[start_date, end_date]`; the constructor checks containment, the
/// calculators take the timeline as given.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepSession {
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    #[serde(default)]
    pub stages: Vec<SleepStageInterval>,
}

impl SleepSession {
    pub fn new(
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
        stages: Vec<SleepStageInterval>,
    ) -> Result<Self, ValidationError> {
        if end_date <= start_date {
            return Err(ValidationError::InvalidTimeRange {
                record: "sleep session".to_string(),
            });
        }

        if let Some(stage) = stages
            .iter()
            .find(|s| s.start_date < start_date || s.end_date > end_date)
        {
            return Err(ValidationError::StageOutOfRange {
                stage: stage.stage.to_string(),
            });
        }

        Ok(SleepSession {
            start_date,
            end_date,
            stages,
        })
    }

    /// Session length from start to end
    pub fn total_duration_minutes(&self) -> f64 {
        minutes_between(self.start_date, self.end_date)
    }

    /// Sum of all stage durations of the given type
    pub fn stage_minutes(&self, stage: SleepStageType) -> f64 {
        self.stages
            .iter()
            .filter(|s| s.stage == stage)
            .map(SleepStageInterval::duration_minutes)
            .sum()
    }

    pub fn awake_minutes(&self) -> f64 {
        self.stage_minutes(SleepStageType::Awake)
    }

    pub fn deep_minutes(&self) -> f64 {
        self.stage_minutes(SleepStageType::Deep)
    }

    pub fn rem_minutes(&self) -> f64 {
        self.stage_minutes(SleepStageType::Rem)
    }

    pub fn core_minutes(&self) -> f64 {
        self.stage_minutes(SleepStageType::Core)
    }

    /// Time in stages that count as sleep (everything except awake and in-bed)
    pub fn asleep_minutes(&self) -> f64 {
        self.stages
            .iter()
            .filter(|s| s.stage.is_asleep())
            .map(SleepStageInterval::duration_minutes)
            .sum()
    }

    /// Sleep efficiency as a fraction: `1 - awake / total`
    pub fn efficiency(&self) -> f64 {
        let total = self.total_duration_minutes();
        if total <= 0.0 {
            return 0.0;
        }
        (1.0 - self.awake_minutes() / total).clamp(0.0, 1.0)
    }
}

/// Optional motion summary attached to a workout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccelerometerSummary {
    pub step_count: Option<u32>,
    pub average_intensity: Option<f64>,
}

/// A recorded workout with its own heart-rate stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutSession {
    pub activity_type: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    #[serde(default)]
    pub heart_rate_samples: Vec<HeartRateSample>,
    /// Kilocalories
    #[serde(default)]
    pub active_energy_burned: Option<f64>,
    #[serde(default)]
    pub accelerometer_summary: Option<AccelerometerSummary>,
}

impl WorkoutSession {
    pub fn new(
        activity_type: impl Into<String>,
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
        heart_rate_samples: Vec<HeartRateSample>,
    ) -> Result<Self, ValidationError> {
        if end_date <= start_date {
            return Err(ValidationError::InvalidTimeRange {
                record: "workout".to_string(),
            });
        }

        Ok(WorkoutSession {
            activity_type: activity_type.into(),
            start_date,
            end_date,
            heart_rate_samples,
            active_energy_burned: None,
            accelerometer_summary: None,
        })
    }

    pub fn duration_minutes(&self) -> f64 {
        minutes_between(self.start_date, self.end_date)
    }
}

/// Personal reference values for one day
///
/// Recomputed daily from trailing history and superseded, never mutated, by
/// the next day's baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserBaseline {
    pub date: NaiveDate,
    /// Weighted 7-day HRV baseline in milliseconds
    pub hrv_baseline_7day: f64,
    /// Weighted 7-day resting heart rate baseline in bpm
    pub rhr_baseline_7day: f64,
    pub sleep_need_minutes: f64,
    pub max_heart_rate: f64,
}

pub(crate) fn minutes_between(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    (end - start).num_seconds() as f64 / 60.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn night_start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 23, 0, 0).unwrap()
    }

    #[test]
    fn test_heart_rate_validation() {
        let now = night_start();
        assert!(HeartRateSample::new(now, 62.0, HeartRateSource::Watch).is_ok());
        assert!(HeartRateSample::new(now, 0.0, HeartRateSource::Watch).is_err());
        assert!(HeartRateSample::new(now, 301.0, HeartRateSource::Manual).is_err());
        assert!(HeartRateSample::new(now, f64::NAN, HeartRateSource::Watch).is_err());
    }

    #[test]
    fn test_hrv_sample_validation() {
        let now = night_start();
        assert!(HrvSample::new(now, 48.0, None).is_ok());
        assert_eq!(
            HrvSample::new(now, -1.0, None),
            Err(ValidationError::InvalidHrv { value: -1.0 })
        );
    }

    #[test]
    fn test_sleep_session_metrics() {
        let start = night_start();
        let stages = vec![
            SleepStageInterval::new(SleepStageType::Core, start, start + Duration::minutes(120)).unwrap(),
            SleepStageInterval::new(
                SleepStageType::Deep,
                start + Duration::minutes(120),
                start + Duration::minutes(210),
            )
            .unwrap(),
            SleepStageInterval::new(
                SleepStageType::Awake,
                start + Duration::minutes(210),
                start + Duration::minutes(240),
            )
            .unwrap(),
            SleepStageInterval::new(
                SleepStageType::Rem,
                start + Duration::minutes(240),
                start + Duration::minutes(300),
            )
            .unwrap(),
        ];
        let session = SleepSession::new(start, start + Duration::minutes(300), stages).unwrap();

        assert_eq!(session.total_duration_minutes(), 300.0);
        assert_eq!(session.core_minutes(), 120.0);
        assert_eq!(session.deep_minutes(), 90.0);
        assert_eq!(session.rem_minutes(), 60.0);
        assert_eq!(session.awake_minutes(), 30.0);
        assert_eq!(session.asleep_minutes(), 270.0);
        assert!((session.efficiency() - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_sleep_session_rejects_invalid_ranges() {
        let start = night_start();
        assert!(SleepSession::new(start, start, Vec::new()).is_err());

        let stray = SleepStageInterval::new(
            SleepStageType::Deep,
            start - Duration::minutes(30),
            start + Duration::minutes(10),
        )
        .unwrap();
        let result = SleepSession::new(start, start + Duration::hours(8), vec![stray]);
        assert_eq!(
            result,
            Err(ValidationError::StageOutOfRange {
                stage: "Deep".to_string()
            })
        );
    }

    #[test]
    fn test_stage_interval_invalid_time() {
        let start = night_start();
        assert!(SleepStageInterval::new(SleepStageType::Rem, start, start).is_err());
    }

    #[test]
    fn test_sleep_stage_serde_names() {
        let json = serde_json::to_string(&SleepStageType::InBed).unwrap();
        assert_eq!(json, "\"inBed\"");
        let stage: SleepStageType = serde_json::from_str("\"rem\"").unwrap();
        assert_eq!(stage, SleepStageType::Rem);
    }

    #[test]
    fn test_workout_validation() {
        let start = night_start();
        assert!(WorkoutSession::new("running", start, start - Duration::minutes(1), Vec::new()).is_err());
        let workout = WorkoutSession::new("running", start, start + Duration::minutes(45), Vec::new()).unwrap();
        assert_eq!(workout.duration_minutes(), 45.0);
    }
}

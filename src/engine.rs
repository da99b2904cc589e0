//! Daily score orchestration
//!
//! [`ScoreEngine`] turns one day of raw samples plus stored history into a
//! [`DailyReport`]. The steps run in dependency order: HRV and resting heart
//! rate first, then the baseline they are compared against, then sleep
//! (which feeds recovery), strain, and finally the derived guidance, debt,
//! consistency, insight and data quality records.

use chrono::{Duration, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, info_span, warn};

use crate::baseline::{AdaptiveBaseline, BaselineCalculator};
use crate::config::EngineConfig;
use crate::data_quality::{DataQuality, DataQualityAssessor, QUALITY_WINDOW_DAYS};
use crate::error::{Result, ValidationError};
use crate::history::{DailyRecord, ScoreHistory, ScoreRepository};
use crate::hrv::HrvProcessor;
use crate::insights::{DailyInsight, InsightGenerator};
use crate::models::{
    HeartRateSample, HrvSample, SleepSession, UserBaseline, WorkoutSession, MAX_PLAUSIBLE_BPM,
};
use crate::recovery::{RecoveryCalculator, RecoveryScore};
use crate::sleep::{SleepScore, SleepScoreCalculator};
use crate::sleep_consistency::{SleepConsistency, SleepConsistencyCalculator};
use crate::sleep_debt::{NightlySleep, SleepDebt, SleepDebtTracker, ROLLING_WINDOW_NIGHTS};
use crate::strain::{StrainCalculator, StrainScore};
use crate::strain_guidance::{StrainGuidance, StrainGuidanceCalculator, LOAD_WINDOW_DAYS};

/// Samples that must reach a heart rate before it counts as the observed max
pub const MIN_SUSTAINED_SAMPLES: usize = 3;

/// Days of history loaded for each scored day
pub const HISTORY_WINDOW_DAYS: i64 = 90;

/// Share of the lowest in-sleep heart rates averaged for resting HR
pub const RESTING_HR_PERCENTILE: f64 = 0.10;

/// Raw samples for one day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyInput {
    pub date: NaiveDate,
    #[serde(default)]
    pub heart_rate_samples: Vec<HeartRateSample>,
    #[serde(default)]
    pub hrv_samples: Vec<HrvSample>,
    /// Device-reported resting heart rate, if any
    #[serde(default)]
    pub resting_heart_rate: Option<f64>,
    #[serde(default)]
    pub sleep_sessions: Vec<SleepSession>,
    #[serde(default)]
    pub workouts: Vec<WorkoutSession>,
}

impl DailyInput {
    pub fn new(date: NaiveDate) -> Self {
        DailyInput {
            date,
            heart_rate_samples: Vec::new(),
            hrv_samples: Vec::new(),
            resting_heart_rate: None,
            sleep_sessions: Vec::new(),
            workouts: Vec::new(),
        }
    }

    /// Check deserialized records against the same rules as the constructors
    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        let check_bpm = |bpm: f64| {
            if !bpm.is_finite() || bpm <= 0.0 || bpm > MAX_PLAUSIBLE_BPM {
                Err(ValidationError::InvalidHeartRate { bpm })
            } else {
                Ok(())
            }
        };

        for sample in self
            .heart_rate_samples
            .iter()
            .chain(self.workouts.iter().flat_map(|w| w.heart_rate_samples.iter()))
        {
            check_bpm(sample.beats_per_minute)?;
        }
        if let Some(rhr) = self.resting_heart_rate {
            check_bpm(rhr)?;
        }

        for sample in &self.hrv_samples {
            HrvSample::new(
                sample.timestamp,
                sample.sdnn_ms,
                sample.rr_intervals_ms.clone(),
            )?;
        }
        for session in &self.sleep_sessions {
            SleepSession::new(session.start_date, session.end_date, session.stages.clone())?;
        }
        for workout in &self.workouts {
            if workout.end_date <= workout.start_date {
                return Err(ValidationError::InvalidTimeRange {
                    record: format!("workout '{}'", workout.activity_type),
                });
            }
        }
        Ok(())
    }
}

/// Everything computed for one day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyReport {
    pub date: NaiveDate,
    pub hrv: Option<f64>,
    pub resting_heart_rate: Option<f64>,
    pub max_heart_rate_observed: Option<f64>,
    pub main_sleep: Option<SleepSession>,
    pub baseline: AdaptiveBaseline,
    pub user_baseline: UserBaseline,
    pub recovery: Option<RecoveryScore>,
    pub strain: StrainScore,
    pub sleep: Option<SleepScore>,
    pub sleep_debt: SleepDebt,
    pub sleep_consistency: SleepConsistency,
    pub strain_guidance: Option<StrainGuidance>,
    pub insight: DailyInsight,
    pub data_quality: DataQuality,
}

impl DailyReport {
    /// The slice of this report kept in history
    pub fn to_record(&self) -> DailyRecord {
        DailyRecord {
            date: self.date,
            hrv: self.hrv,
            resting_heart_rate: self.resting_heart_rate,
            max_heart_rate_observed: self.max_heart_rate_observed,
            sleep_session: self.main_sleep.clone(),
            baseline: Some(self.baseline.clone()),
            recovery: self.recovery.clone(),
            strain: Some(self.strain.clone()),
            sleep: self.sleep.clone(),
        }
    }
}

/// Longest session ending on `date` in local time
pub fn select_main_sleep<'a>(
    sessions: &'a [SleepSession],
    date: NaiveDate,
    offset: &FixedOffset,
) -> Option<&'a SleepSession> {
    sessions
        .iter()
        .filter(|s| s.end_date.with_timezone(offset).date_naive() == date)
        .max_by(|a, b| {
            a.total_duration_minutes()
                .total_cmp(&b.total_duration_minutes())
        })
}

/// Mean of the lowest 10% (at least one) of heart rates recorded during sleep
pub fn estimate_resting_heart_rate(
    samples: &[HeartRateSample],
    session: &SleepSession,
) -> Option<f64> {
    let mut asleep: Vec<f64> = samples
        .iter()
        .filter(|s| s.timestamp >= session.start_date && s.timestamp <= session.end_date)
        .map(|s| s.beats_per_minute)
        .collect();
    if asleep.is_empty() {
        return None;
    }

    asleep.sort_by(|a, b| a.total_cmp(b));
    let count = ((asleep.len() as f64 * RESTING_HR_PERCENTILE).floor() as usize).max(1);
    let lowest = &asleep[..count];
    Some(lowest.iter().sum::<f64>() / count as f64)
}

/// Highest heart rate reached by at least `MIN_SUSTAINED_SAMPLES` samples
///
/// A single spike is usually optical-sensor noise and would otherwise lower
/// every zone fraction for the whole history window once stored.
fn max_heart_rate(input: &DailyInput) -> Option<f64> {
    let mut samples: Vec<f64> = input
        .heart_rate_samples
        .iter()
        .chain(input.workouts.iter().flat_map(|w| w.heart_rate_samples.iter()))
        .map(|s| s.beats_per_minute)
        .collect();
    if samples.len() < MIN_SUSTAINED_SAMPLES {
        return None;
    }
    samples.sort_by(|a, b| b.total_cmp(a));
    Some(samples[MIN_SUSTAINED_SAMPLES - 1])
}

/// Daily score pipeline
pub struct ScoreEngine {
    config: EngineConfig,
    hrv_processor: HrvProcessor,
    baseline_calculator: BaselineCalculator,
}

impl ScoreEngine {
    pub fn new(config: EngineConfig) -> Self {
        let hrv_processor = config.hrv.processor();
        let baseline_calculator = BaselineCalculator::with_settings(config.baseline.clone());
        ScoreEngine {
            config,
            hrv_processor,
            baseline_calculator,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Load history, score the day and store the result
    pub fn process_day<R: ScoreRepository + ?Sized>(
        &self,
        input: &DailyInput,
        repository: &mut R,
    ) -> Result<DailyReport> {
        let history = ScoreHistory::load(&*repository, input.date, HISTORY_WINDOW_DAYS)?;
        let report = self.score_day(input, &history);
        repository.store(report.to_record())?;
        Ok(report)
    }

    /// Score one day against past records (days before `input.date`)
    pub fn score_day(&self, input: &DailyInput, history: &ScoreHistory) -> DailyReport {
        let span = info_span!("score_day", date = %input.date);
        let _guard = span.enter();

        let date = input.date;
        let profile = &self.config.profile;
        let offset = profile.utc_offset();

        let hrv = self.hrv_processor.daily_hrv(&input.hrv_samples);
        let main_sleep = select_main_sleep(&input.sleep_sessions, date, &offset).cloned();

        let resting_heart_rate = input
            .resting_heart_rate
            .or_else(|| {
                main_sleep
                    .as_ref()
                    .and_then(|s| estimate_resting_heart_rate(&input.heart_rate_samples, s))
            })
            .or(profile.resting_heart_rate);
        if input.resting_heart_rate.is_none() {
            debug!(?resting_heart_rate, "Resting heart rate not reported, estimated");
        }

        // Baseline
        let baseline = self.baseline_calculator.calculate_adaptive(
            date,
            &history.hrv_values(),
            &history.resting_heart_rates(),
            history.latest_baseline(),
        );

        let observed_today = max_heart_rate(input);
        let observed_max = match (observed_today, history.observed_max_heart_rate()) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
        let (durations, recoveries) = history.sleep_recovery_pairs();
        let mut user_baseline = self.baseline_calculator.calculate_user_baseline(
            &baseline,
            &durations,
            &recoveries,
            profile.effective_max_heart_rate(),
            observed_max,
        );
        if let Some(need) = profile.sleep_need_override_minutes.filter(|n| *n > 0.0) {
            user_baseline.sleep_need_minutes = need;
        }

        // Sleep
        let sleep = main_sleep.as_ref().map(|session| {
            SleepScoreCalculator::calculate(date, session, user_baseline.sleep_need_minutes)
        });
        if sleep.is_none() {
            info!("No sleep session ending today");
        }

        // Recovery
        let recovery = match (hrv, resting_heart_rate) {
            (Some(current_hrv), Some(current_rhr))
                if user_baseline.hrv_baseline_7day > 0.0 && user_baseline.rhr_baseline_7day > 0.0 =>
            {
                Some(RecoveryCalculator::calculate(
                    date,
                    current_hrv,
                    current_rhr,
                    sleep.as_ref().map(|s| s.score),
                    &user_baseline,
                ))
            }
            (Some(_), Some(_)) => {
                info!("No baseline yet, recovery not scored");
                None
            }
            _ => {
                warn!(
                    has_hrv = hrv.is_some(),
                    has_rhr = resting_heart_rate.is_some(),
                    "Missing HRV or resting heart rate, recovery not scored"
                );
                None
            }
        };

        // Strain
        let strain = StrainCalculator::calculate(
            date,
            &input.heart_rate_samples,
            &input.workouts,
            user_baseline.max_heart_rate,
        );

        // Sleep debt over history plus tonight
        let mut nights = history.nightly_sleep();
        if let Some(session) = &main_sleep {
            nights.push(NightlySleep {
                date,
                duration_minutes: session.total_duration_minutes(),
            });
        }
        let sleep_debt = SleepDebtTracker::calculate(&nights, user_baseline.sleep_need_minutes);

        let mut sessions = history.sleep_sessions();
        if let Some(session) = &main_sleep {
            sessions.push(session.clone());
        }
        let recent_sessions = &sessions[sessions.len().saturating_sub(ROLLING_WINDOW_NIGHTS)..];
        let sleep_consistency = SleepConsistencyCalculator::calculate(recent_sessions, &offset);

        // Guidance needs today's recovery
        let recent_strains: Vec<StrainScore> = history
            .window_before(date, LOAD_WINDOW_DAYS as i64)
            .filter_map(|r| r.strain.clone())
            .collect();
        let strain_guidance = recovery.as_ref().map(|r| {
            StrainGuidanceCalculator::calculate(r, &recent_strains, profile.training_intensity)
        });

        let previous_strain = history
            .record_for(date - Duration::days(1))
            .and_then(|r| r.strain.as_ref());
        let insight =
            InsightGenerator::generate(date, recovery.as_ref(), sleep.as_ref(), previous_strain);

        // Quality over the last week, today included
        let window: Vec<&DailyRecord> = history
            .window_before(date, QUALITY_WINDOW_DAYS as i64 - 1)
            .collect();
        let hrv_days = window.iter().filter(|r| r.hrv.is_some()).count() + hrv.is_some() as usize;
        let rhr_days = window
            .iter()
            .filter(|r| r.resting_heart_rate.is_some())
            .count()
            + resting_heart_rate.is_some() as usize;
        let sleep_nights = window.iter().filter(|r| r.sleep_session.is_some()).count()
            + main_sleep.is_some() as usize;
        let data_quality =
            DataQualityAssessor::assess(hrv_days, rhr_days, sleep_nights, Some(&baseline));

        info!(
            recovery = ?recovery.as_ref().map(|r| r.score),
            strain = strain.score,
            sleep = ?sleep.as_ref().map(|s| s.score),
            quality = %data_quality.level,
            "Day scored"
        );

        DailyReport {
            date,
            hrv,
            resting_heart_rate,
            max_heart_rate_observed: observed_today,
            main_sleep,
            baseline,
            user_baseline,
            recovery,
            strain,
            sleep,
            sleep_debt,
            sleep_consistency,
            strain_guidance,
            insight,
            data_quality,
        }
    }
}

impl Default for ScoreEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

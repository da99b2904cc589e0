//! Score history storage
//!
//! Each scored day is kept as a [`DailyRecord`]: the day's derived inputs
//! (HRV, resting heart rate, main sleep session, peak heart rate) next to the
//! scores computed from them. A [`ScoreRepository`] stores records and hands
//! back date ranges newest first; [`ScoreHistory`] re-sorts them oldest first
//! and exposes the series the calculators consume.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::baseline::AdaptiveBaseline;
use crate::error::{ReadyRsError, Result};
use crate::models::SleepSession;
use crate::recovery::RecoveryScore;
use crate::sleep::SleepScore;
use crate::sleep_debt::NightlySleep;
use crate::strain::StrainScore;

/// One day of stored inputs and scores
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRecord {
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hrv: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resting_heart_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_heart_rate_observed: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sleep_session: Option<SleepSession>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseline: Option<AdaptiveBaseline>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recovery: Option<RecoveryScore>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strain: Option<StrainScore>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sleep: Option<SleepScore>,
}

impl DailyRecord {
    /// Record carrying only a date
    pub fn new(date: NaiveDate) -> Self {
        DailyRecord {
            date,
            hrv: None,
            resting_heart_rate: None,
            max_heart_rate_observed: None,
            sleep_session: None,
            baseline: None,
            recovery: None,
            strain: None,
            sleep: None,
        }
    }
}

/// Durable store for daily records
pub trait ScoreRepository {
    /// Insert or replace the record for its date
    fn store(&mut self, record: DailyRecord) -> Result<()>;

    /// Records with `from <= date <= to`, newest first
    fn fetch_range(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<DailyRecord>>;
}

/// `BTreeMap`-backed repository, optionally persisted as a JSON array
#[derive(Debug, Default, Clone)]
pub struct InMemoryScoreRepository {
    records: BTreeMap<NaiveDate, DailyRecord>,
}

impl InMemoryScoreRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Load records from a JSON array file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let records: Vec<DailyRecord> = serde_json::from_str(&content)?;
        let mut repository = Self::new();
        for record in records {
            repository.records.insert(record.date, record);
        }
        Ok(repository)
    }

    /// Write all records, oldest first, as a JSON array
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let records: Vec<&DailyRecord> = self.records.values().collect();
        let content = serde_json::to_string_pretty(&records)?;
        fs::write(path.as_ref(), content)?;
        Ok(())
    }
}

impl ScoreRepository for InMemoryScoreRepository {
    fn store(&mut self, record: DailyRecord) -> Result<()> {
        self.records.insert(record.date, record);
        Ok(())
    }

    fn fetch_range(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<DailyRecord>> {
        if from > to {
            return Err(ReadyRsError::Internal(format!(
                "Invalid history range {} to {}",
                from, to
            )));
        }
        Ok(self
            .records
            .range(from..=to)
            .rev()
            .map(|(_, record)| record.clone())
            .collect())
    }
}

/// Past records ordered oldest first
#[derive(Debug, Clone, Default)]
pub struct ScoreHistory {
    records: Vec<DailyRecord>,
}

impl ScoreHistory {
    /// Build from records in any order; sorted ascending, later duplicates win
    pub fn from_records(records: Vec<DailyRecord>) -> Self {
        let by_date: BTreeMap<NaiveDate, DailyRecord> =
            records.into_iter().map(|r| (r.date, r)).collect();
        ScoreHistory {
            records: by_date.into_values().collect(),
        }
    }

    /// Fetch the `days` preceding `date` from a repository
    pub fn load<R: ScoreRepository + ?Sized>(
        repository: &R,
        date: NaiveDate,
        days: i64,
    ) -> Result<Self> {
        let to = date - Duration::days(1);
        let from = date - Duration::days(days.max(1));
        Ok(Self::from_records(repository.fetch_range(from, to)?))
    }

    pub fn records(&self) -> &[DailyRecord] {
        &self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn hrv_values(&self) -> Vec<f64> {
        self.records.iter().filter_map(|r| r.hrv).collect()
    }

    pub fn resting_heart_rates(&self) -> Vec<f64> {
        self.records.iter().filter_map(|r| r.resting_heart_rate).collect()
    }

    pub fn sleep_sessions(&self) -> Vec<SleepSession> {
        self.records
            .iter()
            .filter_map(|r| r.sleep_session.clone())
            .collect()
    }

    pub fn nightly_sleep(&self) -> Vec<NightlySleep> {
        self.records
            .iter()
            .filter_map(|r| {
                r.sleep_session.as_ref().map(|s| NightlySleep {
                    date: r.date,
                    duration_minutes: s.total_duration_minutes(),
                })
            })
            .collect()
    }

    /// Sleep durations paired with the following recovery score
    ///
    /// A night is stored on the date it ends, so the recovery on the same
    /// record is the one that night produced.
    pub fn sleep_recovery_pairs(&self) -> (Vec<f64>, Vec<f64>) {
        self.records
            .iter()
            .filter_map(|r| match (&r.sleep_session, &r.recovery) {
                (Some(s), Some(rec)) => Some((s.total_duration_minutes(), rec.score)),
                _ => None,
            })
            .unzip()
    }

    pub fn latest_baseline(&self) -> Option<&AdaptiveBaseline> {
        self.records.iter().rev().find_map(|r| r.baseline.as_ref())
    }

    pub fn observed_max_heart_rate(&self) -> Option<f64> {
        self.records
            .iter()
            .filter_map(|r| r.max_heart_rate_observed)
            .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |a| a.max(v))))
    }

    pub fn record_for(&self, date: NaiveDate) -> Option<&DailyRecord> {
        self.records
            .binary_search_by_key(&date, |r| r.date)
            .ok()
            .map(|i| &self.records[i])
    }

    /// Records dated within the `days` days before `date`
    pub fn window_before(&self, date: NaiveDate, days: i64) -> impl Iterator<Item = &DailyRecord> {
        let from = date - Duration::days(days);
        self.records
            .iter()
            .filter(move |r| r.date >= from && r.date < date)
    }
}

//! Heart Rate Variability processing
//!
//! Turns raw R-R interval series into time-domain HRV metrics.
//!
//! # Background
//!
//! - **RMSSD**: root mean square of successive R-R differences, the standard
//!   short-term marker of parasympathetic activity.
//! - **SDNN**: standard deviation of the (normal-to-normal) intervals, an
//!   overall variability measure. Watches report SDNN even when no
//!   beat-to-beat data is available.
//! - **pNN50**: percentage of successive differences larger than 50ms.
//!
//! Insufficient data never fails: every metric falls back to 0.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::models::HrvSample;
use crate::statistics;

/// Shortest plausible R-R interval (200 bpm)
pub const MIN_RR_INTERVAL_MS: f64 = 300.0;

/// Longest plausible R-R interval (30 bpm)
pub const MAX_RR_INTERVAL_MS: f64 = 2000.0;

/// Relative deviation from neighbouring beats that marks an ectopic beat
pub const DEFAULT_ECTOPIC_THRESHOLD: f64 = 0.2;

/// Empirical RMSSD/SDNN ratio used when only SDNN is available
pub const SDNN_TO_RMSSD_RATIO: f64 = 0.8;

/// Successive-difference threshold for pNN50
const NN50_THRESHOLD_MS: f64 = 50.0;

/// Time-domain summary of one R-R series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HrvSummary {
    pub rmssd: f64,
    pub sdnn: f64,
    pub pnn50: f64,
    /// Beats remaining after cleaning and ectopic removal
    pub beat_count: usize,
}

/// HRV processor with configurable artefact handling
#[derive(Debug, Clone)]
pub struct HrvProcessor {
    ectopic_threshold: f64,
    convert_sdnn_to_rmssd: bool,
}

impl Default for HrvProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl HrvProcessor {
    pub fn new() -> Self {
        HrvProcessor {
            ectopic_threshold: DEFAULT_ECTOPIC_THRESHOLD,
            convert_sdnn_to_rmssd: false,
        }
    }

    pub fn with_settings(ectopic_threshold: f64, convert_sdnn_to_rmssd: bool) -> Self {
        HrvProcessor {
            ectopic_threshold,
            convert_sdnn_to_rmssd,
        }
    }

    /// Drop physiologically implausible intervals outside [300, 2000] ms
    pub fn clean_rr_intervals(intervals: &[f64]) -> Vec<f64> {
        intervals
            .iter()
            .copied()
            .filter(|rr| (MIN_RR_INTERVAL_MS..=MAX_RR_INTERVAL_MS).contains(rr))
            .collect()
    }

    /// Remove ectopic beats
    ///
    /// The first and last intervals are always kept. An interior interval is
    /// dropped when it deviates from the mean of its two neighbours by at
    /// least `threshold` (relative).
    pub fn remove_ectopic_beats(intervals: &[f64], threshold: f64) -> Vec<f64> {
        if intervals.len() < 3 {
            return intervals.to_vec();
        }

        let last = intervals.len() - 1;
        let mut kept = Vec::with_capacity(intervals.len());
        kept.push(intervals[0]);

        for i in 1..last {
            let neighbour_avg = (intervals[i - 1] + intervals[i + 1]) / 2.0;
            if neighbour_avg <= 0.0 {
                continue;
            }
            let deviation = (intervals[i] - neighbour_avg).abs() / neighbour_avg;
            if deviation < threshold {
                kept.push(intervals[i]);
            }
        }

        kept.push(intervals[last]);
        kept
    }

    /// Root mean square of successive differences, 0 with fewer than 2 intervals
    pub fn calculate_rmssd(rr: &[f64]) -> f64 {
        if rr.len() < 2 {
            return 0.0;
        }

        let squared_diffs: Vec<f64> = rr.windows(2).map(|w| (w[1] - w[0]).powi(2)).collect();
        statistics::mean(&squared_diffs).sqrt()
    }

    /// Population standard deviation of the intervals, 0 when empty
    pub fn calculate_sdnn(rr: &[f64]) -> f64 {
        statistics::std_dev(rr)
    }

    /// Estimate RMSSD from SDNN using a fixed empirical ratio
    pub fn estimate_rmssd_from_sdnn(sdnn: f64) -> f64 {
        sdnn * SDNN_TO_RMSSD_RATIO
    }

    /// Percentage of successive differences exceeding 50ms
    pub fn calculate_pnn50(rr: &[f64]) -> f64 {
        if rr.len() < 2 {
            return 0.0;
        }

        let diffs = rr.len() - 1;
        let nn50 = rr
            .windows(2)
            .filter(|w| (w[1] - w[0]).abs() > NN50_THRESHOLD_MS)
            .count();
        nn50 as f64 / diffs as f64 * 100.0
    }

    /// Clean, filter and summarise an R-R series
    pub fn analyze(&self, rr_intervals: &[f64]) -> HrvSummary {
        let cleaned = Self::clean_rr_intervals(rr_intervals);
        let filtered = Self::remove_ectopic_beats(&cleaned, self.ectopic_threshold);

        HrvSummary {
            rmssd: Self::calculate_rmssd(&filtered),
            sdnn: Self::calculate_sdnn(&filtered),
            pnn50: Self::calculate_pnn50(&filtered),
            beat_count: filtered.len(),
        }
    }

    /// Best HRV value for a single sample
    ///
    /// RMSSD from the R-R intervals when at least two survive filtering,
    /// otherwise the reported SDNN (converted to an RMSSD estimate when the
    /// processor is configured to do so).
    pub fn sample_value(&self, sample: &HrvSample) -> f64 {
        if let Some(rr) = &sample.rr_intervals_ms {
            let summary = self.analyze(rr);
            if summary.beat_count >= 2 {
                trace!(rmssd = summary.rmssd, beats = summary.beat_count, "HRV from R-R intervals");
                return summary.rmssd;
            }
        }

        if self.convert_sdnn_to_rmssd {
            Self::estimate_rmssd_from_sdnn(sample.sdnn_ms)
        } else {
            sample.sdnn_ms
        }
    }

    /// Daily HRV value: mean of the per-sample values, `None` with no samples
    pub fn daily_hrv(&self, samples: &[HrvSample]) -> Option<f64> {
        if samples.is_empty() {
            return None;
        }

        let values: Vec<f64> = samples.iter().map(|s| self.sample_value(s)).collect();
        Some(statistics::mean(&values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_rmssd_example() {
        let rr = [800.0, 810.0, 790.0, 805.0];
        let expected = ((100.0 + 400.0 + 225.0) / 3.0_f64).sqrt();
        let rmssd = HrvProcessor::calculate_rmssd(&rr);
        assert!((rmssd - expected).abs() < 1e-9);
        assert!((rmssd - 15.546).abs() < 0.001);
    }

    #[test]
    fn test_rmssd_insufficient_data() {
        assert_eq!(HrvProcessor::calculate_rmssd(&[]), 0.0);
        assert_eq!(HrvProcessor::calculate_rmssd(&[812.0]), 0.0);
    }

    #[test]
    fn test_clean_rr_intervals() {
        let cleaned = HrvProcessor::clean_rr_intervals(&[250.0, 300.0, 850.0, 2000.0, 2400.0]);
        assert_eq!(cleaned, vec![300.0, 850.0, 2000.0]);
    }

    #[test]
    fn test_remove_ectopic_beats() {
        // 500 deviates ~38% from its neighbours (avg 805). 810 is judged
        // against the unfiltered series, so the ectopic beat drags it out too.
        let rr = [800.0, 500.0, 810.0, 805.0, 1200.0];
        let filtered = HrvProcessor::remove_ectopic_beats(&rr, DEFAULT_ECTOPIC_THRESHOLD);
        // First and last are kept unconditionally
        assert_eq!(filtered, vec![800.0, 805.0, 1200.0]);
    }

    #[test]
    fn test_remove_ectopic_short_series() {
        assert_eq!(HrvProcessor::remove_ectopic_beats(&[800.0, 400.0], 0.2), vec![800.0, 400.0]);
    }

    #[test]
    fn test_sdnn_and_estimate() {
        assert_eq!(HrvProcessor::calculate_sdnn(&[]), 0.0);
        let sdnn = HrvProcessor::calculate_sdnn(&[800.0, 820.0]);
        assert!((sdnn - 10.0).abs() < 1e-9);
        assert!((HrvProcessor::estimate_rmssd_from_sdnn(50.0) - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_pnn50() {
        let rr = [800.0, 860.0, 870.0, 800.0, 810.0];
        // Diffs: 60, 10, 70, 10 -> 2 of 4 exceed 50ms
        assert!((HrvProcessor::calculate_pnn50(&rr) - 50.0).abs() < 1e-9);
        assert_eq!(HrvProcessor::calculate_pnn50(&[800.0]), 0.0);
    }

    #[test]
    fn test_sample_value_prefers_rr_intervals() {
        let processor = HrvProcessor::new();
        let ts = Utc.with_ymd_and_hms(2024, 3, 2, 6, 0, 0).unwrap();

        let with_rr = HrvSample::new(ts, 60.0, Some(vec![800.0, 810.0, 790.0, 805.0])).unwrap();
        assert!((processor.sample_value(&with_rr) - 15.546).abs() < 0.001);

        let sdnn_only = HrvSample::new(ts, 60.0, None).unwrap();
        assert_eq!(processor.sample_value(&sdnn_only), 60.0);

        let converting = HrvProcessor::with_settings(DEFAULT_ECTOPIC_THRESHOLD, true);
        assert!((converting.sample_value(&sdnn_only) - 48.0).abs() < 1e-9);

        // Every interval implausible: falls back to SDNN
        let junk = HrvSample::new(ts, 55.0, Some(vec![100.0, 150.0])).unwrap();
        assert_eq!(processor.sample_value(&junk), 55.0);
    }

    #[test]
    fn test_daily_hrv() {
        let processor = HrvProcessor::new();
        let ts = Utc.with_ymd_and_hms(2024, 3, 2, 6, 0, 0).unwrap();
        assert_eq!(processor.daily_hrv(&[]), None);

        let samples = vec![
            HrvSample::new(ts, 40.0, None).unwrap(),
            HrvSample::new(ts, 60.0, None).unwrap(),
        ];
        assert_eq!(processor.daily_hrv(&samples), Some(50.0));
    }
}

//! Daily insight generation
//!
//! Turns the day's scores into a headline, a recommendation and a list of
//! contributing factors. Every rule is a pure function of the inputs; the
//! same scores always give the same insight.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::recovery::{RecoveryCategory, RecoveryScore};
use crate::sleep::SleepScore;
use crate::strain::StrainScore;

const HRV_POSITIVE_DEVIATION: f64 = 10.0;
const HRV_NEGATIVE_DEVIATION: f64 = -10.0;
const RHR_NEGATIVE_DEVIATION: f64 = 8.0;
const RHR_POSITIVE_DEVIATION: f64 = -5.0;
const GOOD_SLEEP_SCORE: f64 = 80.0;
const POOR_SLEEP_SCORE: f64 = 60.0;
const MODERATE_STRAIN: f64 = 10.0;
const HIGH_STRAIN: f64 = 15.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FactorType {
    Hrv,
    Rhr,
    Sleep,
    Strain,
}

impl fmt::Display for FactorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FactorType::Hrv => write!(f, "HRV"),
            FactorType::Rhr => write!(f, "Resting HR"),
            FactorType::Sleep => write!(f, "Sleep"),
            FactorType::Strain => write!(f, "Strain"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FactorStatus {
    Positive,
    Neutral,
    Negative,
}

impl fmt::Display for FactorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FactorStatus::Positive => write!(f, "+"),
            FactorStatus::Neutral => write!(f, "="),
            FactorStatus::Negative => write!(f, "-"),
        }
    }
}

/// One signal feeding the day's insight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightFactor {
    pub factor_type: FactorType,
    pub status: FactorStatus,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightConfidence {
    High,
    Moderate,
    Low,
}

impl fmt::Display for InsightConfidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InsightConfidence::High => write!(f, "High"),
            InsightConfidence::Moderate => write!(f, "Moderate"),
            InsightConfidence::Low => write!(f, "Low"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyInsight {
    pub date: NaiveDate,
    pub headline: String,
    pub recommendation: String,
    pub confidence: InsightConfidence,
    pub factors: Vec<InsightFactor>,
}

impl DailyInsight {
    pub fn count(&self, status: FactorStatus) -> usize {
        self.factors.iter().filter(|f| f.status == status).count()
    }
}

pub struct InsightGenerator;

impl InsightGenerator {
    pub fn hrv_factor(deviation: f64) -> InsightFactor {
        let (status, description) = if deviation > HRV_POSITIVE_DEVIATION {
            (
                FactorStatus::Positive,
                format!("HRV is {:.0}% above your baseline", deviation),
            )
        } else if deviation < HRV_NEGATIVE_DEVIATION {
            (
                FactorStatus::Negative,
                format!("HRV is {:.0}% below your baseline", deviation.abs()),
            )
        } else {
            (FactorStatus::Neutral, "HRV is close to your baseline".to_string())
        };
        InsightFactor {
            factor_type: FactorType::Hrv,
            status,
            description,
        }
    }

    pub fn rhr_factor(deviation: f64) -> InsightFactor {
        let (status, description) = if deviation > RHR_NEGATIVE_DEVIATION {
            (
                FactorStatus::Negative,
                format!("Resting heart rate is {:.0}% above baseline", deviation),
            )
        } else if deviation < RHR_POSITIVE_DEVIATION {
            (
                FactorStatus::Positive,
                format!("Resting heart rate is {:.0}% below baseline", deviation.abs()),
            )
        } else {
            (
                FactorStatus::Neutral,
                "Resting heart rate is normal".to_string(),
            )
        };
        InsightFactor {
            factor_type: FactorType::Rhr,
            status,
            description,
        }
    }

    pub fn sleep_factor(score: f64) -> InsightFactor {
        let (status, description) = if score >= GOOD_SLEEP_SCORE {
            (FactorStatus::Positive, format!("Solid sleep ({:.0})", score))
        } else if score < POOR_SLEEP_SCORE {
            (FactorStatus::Negative, format!("Poor sleep ({:.0})", score))
        } else {
            (FactorStatus::Neutral, format!("Fair sleep ({:.0})", score))
        };
        InsightFactor {
            factor_type: FactorType::Sleep,
            status,
            description,
        }
    }

    pub fn strain_factor(previous_strain: f64) -> InsightFactor {
        let (status, description) = if previous_strain >= HIGH_STRAIN {
            (
                FactorStatus::Negative,
                format!("High strain yesterday ({:.1})", previous_strain),
            )
        } else if previous_strain >= MODERATE_STRAIN {
            (
                FactorStatus::Neutral,
                format!("Moderate strain yesterday ({:.1})", previous_strain),
            )
        } else {
            (
                FactorStatus::Positive,
                format!("Light strain yesterday ({:.1})", previous_strain),
            )
        };
        InsightFactor {
            factor_type: FactorType::Strain,
            status,
            description,
        }
    }

    pub fn confidence(has_recovery: bool, has_sleep: bool, factor_count: usize) -> InsightConfidence {
        if has_recovery && has_sleep && factor_count >= 3 {
            InsightConfidence::High
        } else if has_recovery || (has_sleep && factor_count >= 2) {
            InsightConfidence::Moderate
        } else {
            InsightConfidence::Low
        }
    }

    /// Headline and recommendation for the day
    fn select_message(
        recovery: Option<&RecoveryScore>,
        sleep_score: Option<f64>,
        previous_strain: Option<f64>,
        positives: usize,
        negatives: usize,
    ) -> (&'static str, &'static str) {
        let poor_sleep = sleep_score.map_or(false, |s| s < POOR_SLEEP_SCORE);
        let heavy_load = previous_strain.map_or(false, |s| s >= HIGH_STRAIN);

        let Some(recovery) = recovery else {
            return if poor_sleep {
                (
                    "Sleep was short last night",
                    "Recovery can't be scored yet. Keep today light and aim for an early night",
                )
            } else {
                (
                    "Not enough data yet",
                    "Wear your watch overnight so recovery can be measured",
                )
            };
        };

        match recovery.category {
            RecoveryCategory::Optimal => {
                if poor_sleep {
                    (
                        "Recovered, but sleep was short",
                        "You can train hard, but prioritise sleep tonight",
                    )
                } else if positives > negatives {
                    (
                        "Primed for performance",
                        "Great day for a hard session or a personal best attempt",
                    )
                } else {
                    (
                        "Well recovered",
                        "Your body is ready for a demanding workout",
                    )
                }
            }
            RecoveryCategory::Moderate => {
                if heavy_load {
                    (
                        "Still absorbing yesterday's load",
                        "Keep today's effort moderate and let yesterday's work sink in",
                    )
                } else if poor_sleep {
                    (
                        "Sleep is holding you back",
                        "Train at moderate intensity and get to bed earlier tonight",
                    )
                } else if negatives > positives {
                    (
                        "Mixed signals",
                        "Start easy and only build intensity if you feel good",
                    )
                } else {
                    (
                        "Moderately recovered",
                        "A steady, moderate session fits today",
                    )
                }
            }
            RecoveryCategory::Poor => {
                if poor_sleep {
                    (
                        "Low recovery after poor sleep",
                        "Rest or keep movement gentle, and make sleep the priority tonight",
                    )
                } else if heavy_load {
                    (
                        "Recovery needed after heavy strain",
                        "Take a rest day or an easy recovery session",
                    )
                } else {
                    (
                        "Low recovery",
                        "Your body is under stress. Favour rest and light activity",
                    )
                }
            }
        }
    }

    pub fn generate(
        date: NaiveDate,
        recovery: Option<&RecoveryScore>,
        sleep: Option<&SleepScore>,
        previous_strain: Option<&StrainScore>,
    ) -> DailyInsight {
        let mut factors = Vec::new();
        if let Some(r) = recovery {
            factors.push(Self::hrv_factor(r.components.hrv_deviation));
            factors.push(Self::rhr_factor(r.components.rhr_deviation));
        }
        if let Some(s) = sleep {
            factors.push(Self::sleep_factor(s.score));
        }
        if let Some(s) = previous_strain {
            factors.push(Self::strain_factor(s.score));
        }

        let positives = factors
            .iter()
            .filter(|f| f.status == FactorStatus::Positive)
            .count();
        let negatives = factors
            .iter()
            .filter(|f| f.status == FactorStatus::Negative)
            .count();

        let (headline, recommendation) = Self::select_message(
            recovery,
            sleep.map(|s| s.score),
            previous_strain.map(|s| s.score),
            positives,
            negatives,
        );
        let confidence = Self::confidence(recovery.is_some(), sleep.is_some(), factors.len());

        debug!(%date, headline, %confidence, positives, negatives, "Insight generated");

        DailyInsight {
            date,
            headline: headline.to_string(),
            recommendation: recommendation.to_string(),
            confidence,
            factors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recovery::RecoveryComponents;
    use crate::sleep::SleepComponents;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 16).unwrap()
    }

    fn recovery(score: f64, hrv_deviation: f64, rhr_deviation: f64) -> RecoveryScore {
        RecoveryScore {
            date: date(),
            score,
            category: RecoveryCategory::from_score(score),
            components: RecoveryComponents {
                hrv_deviation,
                rhr_deviation,
                hrv_score: 50.0,
                rhr_score: 50.0,
                sleep_quality: 50.0,
                hrv_baseline: 50.0,
                rhr_baseline: 58.0,
                current_hrv: 50.0,
                current_rhr: 58.0,
            },
        }
    }

    fn sleep(score: f64) -> SleepScore {
        SleepScore {
            date: date(),
            score,
            components: SleepComponents {
                duration_score: score,
                efficiency_score: score,
                stage_score: score,
                total_duration_minutes: 420.0,
                sleep_need_minutes: 450.0,
                efficiency: 0.9,
                deep_sleep_minutes: 80.0,
                rem_sleep_minutes: 100.0,
            },
        }
    }

    fn strain(score: f64) -> StrainScore {
        let mut s = StrainScore::empty(date().pred_opt().unwrap());
        s.score = score;
        s
    }

    #[test]
    fn test_factor_thresholds() {
        assert_eq!(InsightGenerator::hrv_factor(12.0).status, FactorStatus::Positive);
        assert_eq!(InsightGenerator::hrv_factor(10.0).status, FactorStatus::Neutral);
        assert_eq!(InsightGenerator::hrv_factor(-12.0).status, FactorStatus::Negative);

        assert_eq!(InsightGenerator::rhr_factor(9.0).status, FactorStatus::Negative);
        assert_eq!(InsightGenerator::rhr_factor(-6.0).status, FactorStatus::Positive);
        assert_eq!(InsightGenerator::rhr_factor(-3.0).status, FactorStatus::Neutral);

        assert_eq!(InsightGenerator::sleep_factor(80.0).status, FactorStatus::Positive);
        assert_eq!(InsightGenerator::sleep_factor(59.0).status, FactorStatus::Negative);
        assert_eq!(InsightGenerator::sleep_factor(70.0).status, FactorStatus::Neutral);

        assert_eq!(InsightGenerator::strain_factor(16.0).status, FactorStatus::Negative);
        assert_eq!(InsightGenerator::strain_factor(12.0).status, FactorStatus::Neutral);
        assert_eq!(InsightGenerator::strain_factor(6.0).status, FactorStatus::Positive);
    }

    #[test]
    fn test_primed_for_performance() {
        let r = recovery(85.0, 15.0, -6.0);
        let s = sleep(88.0);
        let insight = InsightGenerator::generate(date(), Some(&r), Some(&s), Some(&strain(8.0)));
        assert_eq!(insight.headline, "Primed for performance");
        assert_eq!(insight.confidence, InsightConfidence::High);
        assert_eq!(insight.factors.len(), 4);
        assert_eq!(insight.count(FactorStatus::Positive), 4);
    }

    #[test]
    fn test_optimal_with_short_sleep() {
        let r = recovery(72.0, 5.0, 0.0);
        let insight = InsightGenerator::generate(date(), Some(&r), Some(&sleep(50.0)), None);
        assert_eq!(insight.headline, "Recovered, but sleep was short");
    }

    #[test]
    fn test_moderate_rules_in_order() {
        let r = recovery(50.0, -12.0, 9.0);
        let heavy = InsightGenerator::generate(date(), Some(&r), Some(&sleep(50.0)), Some(&strain(17.0)));
        assert_eq!(heavy.headline, "Still absorbing yesterday's load");

        let short = InsightGenerator::generate(date(), Some(&r), Some(&sleep(50.0)), Some(&strain(5.0)));
        assert_eq!(short.headline, "Sleep is holding you back");

        let mixed = InsightGenerator::generate(date(), Some(&r), Some(&sleep(70.0)), None);
        assert_eq!(mixed.headline, "Mixed signals");

        let calm = InsightGenerator::generate(date(), Some(&recovery(50.0, 0.0, 0.0)), None, None);
        assert_eq!(calm.headline, "Moderately recovered");
        assert_eq!(calm.confidence, InsightConfidence::Moderate);
    }

    #[test]
    fn test_poor_recovery() {
        let r = recovery(20.0, -20.0, 10.0);
        let insight = InsightGenerator::generate(date(), Some(&r), Some(&sleep(75.0)), Some(&strain(18.0)));
        assert_eq!(insight.headline, "Recovery needed after heavy strain");

        let after_bad_night = InsightGenerator::generate(date(), Some(&r), Some(&sleep(40.0)), Some(&strain(18.0)));
        assert_eq!(after_bad_night.headline, "Low recovery after poor sleep");
    }

    #[test]
    fn test_without_recovery() {
        let empty = InsightGenerator::generate(date(), None, None, None);
        assert_eq!(empty.headline, "Not enough data yet");
        assert_eq!(empty.confidence, InsightConfidence::Low);
        assert!(empty.factors.is_empty());

        let sleep_only = InsightGenerator::generate(date(), None, Some(&sleep(45.0)), Some(&strain(5.0)));
        assert_eq!(sleep_only.headline, "Sleep was short last night");
        assert_eq!(sleep_only.confidence, InsightConfidence::Moderate);
    }

    #[test]
    fn test_confidence_rules() {
        assert_eq!(InsightGenerator::confidence(true, true, 3), InsightConfidence::High);
        assert_eq!(InsightGenerator::confidence(true, false, 3), InsightConfidence::Moderate);
        assert_eq!(InsightGenerator::confidence(false, true, 2), InsightConfidence::Moderate);
        assert_eq!(InsightGenerator::confidence(false, true, 1), InsightConfidence::Low);
    }
}

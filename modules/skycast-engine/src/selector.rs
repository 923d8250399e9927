//! Pair selection: score corpus candidates against the dominant
//! sample and pick a (weather, advice) pair.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use skycast_common::vocab;
use skycast_common::{
    CharOverlap, CommentCandidate, CommentPair, ForecastSample, SelectionCriteria,
    SeverityTier, SimilarityScorer, WeatherCondition, DUPLICATE_THRESHOLD,
};

use crate::corpus::CandidatePool;

/// Weight split across scoring factors: condition identity dominates,
/// temperature and time-of-day refine within it.
pub const CONDITION_WEIGHT: f64 = 0.5;
pub const TEMPERATURE_WEIGHT: f64 = 0.3;
pub const TIME_WEIGHT: f64 = 0.2;

/// Duplicate re-selection attempts before giving up on the pool.
pub const MAX_DUPLICATE_ATTEMPTS: usize = 10;

/// Strong-warning vocabulary near thunder requires at least this much
/// precipitation; below it only mild caution is permitted.
pub const THUNDER_STRONG_WARNING_MIN_MM: f64 = 5.0;

pub struct PairSelector {
    scorer: Arc<dyn SimilarityScorer>,
}

impl Default for PairSelector {
    fn default() -> Self {
        Self {
            scorer: Arc::new(CharOverlap),
        }
    }
}

impl PairSelector {
    pub fn new(scorer: Arc<dyn SimilarityScorer>) -> Self {
        Self { scorer }
    }

    /// Select the best admissible pair, or `None` when the pool is
    /// exhausted. Near-duplicate pairs are added to `excluded` and
    /// re-selection continues, up to `MAX_DUPLICATE_ATTEMPTS`.
    pub fn select(
        &self,
        dominant: &ForecastSample,
        pool: &CandidatePool,
        excluded: &mut HashSet<(String, String)>,
    ) -> Option<CommentPair> {
        let tier = SeverityTier::from_precipitation(dominant.precipitation_mm);

        let weather = rank(&pool.weather, dominant, tier);
        let advice = rank(&pool.advice, dominant, tier);
        if weather.is_empty() || advice.is_empty() {
            debug!(
                weather = weather.len(),
                advice = advice.len(),
                "No admissible candidates after severity filtering"
            );
            return None;
        }

        let mut combos: Vec<(&Ranked, &Ranked)> = weather
            .iter()
            .flat_map(|w| advice.iter().map(move |a| (w, a)))
            .collect();
        combos.sort_by(|(w1, a1), (w2, a2)| {
            let s1 = (w1.score + a1.score) / 2.0;
            let s2 = (w2.score + a2.score) / 2.0;
            s2.total_cmp(&s1)
                .then((w1.temp_delta + a1.temp_delta).total_cmp(&(w2.temp_delta + a2.temp_delta)))
                .then_with(|| {
                    let r1 = w1.candidate.recorded_at.max(a1.candidate.recorded_at);
                    let r2 = w2.candidate.recorded_at.max(a2.candidate.recorded_at);
                    r2.cmp(&r1)
                })
        });

        let mut duplicate_attempts = 0;
        for (w, a) in combos {
            let key = (w.candidate.text.clone(), a.candidate.text.clone());
            if excluded.contains(&key) {
                continue;
            }
            if self.is_duplicate(&w.candidate.text, &a.candidate.text) {
                excluded.insert(key);
                duplicate_attempts += 1;
                if duplicate_attempts >= MAX_DUPLICATE_ATTEMPTS {
                    debug!("Duplicate-avoidance attempts exhausted");
                    return None;
                }
                continue;
            }
            return Some(CommentPair {
                weather: w.candidate.clone(),
                advice: a.candidate.clone(),
                score: (w.score + a.score) / 2.0,
                criteria: SelectionCriteria {
                    condition_score: (w.criteria.condition_score + a.criteria.condition_score) / 2.0,
                    temperature_score: (w.criteria.temperature_score + a.criteria.temperature_score)
                        / 2.0,
                    time_score: (w.criteria.time_score + a.criteria.time_score) / 2.0,
                },
            });
        }
        None
    }

    fn is_duplicate(&self, a: &str, b: &str) -> bool {
        self.scorer.score(a, b) >= DUPLICATE_THRESHOLD
            || vocab::shared_salient_keyword(a, b).is_some()
    }
}

struct Ranked {
    candidate: CommentCandidate,
    score: f64,
    criteria: SelectionCriteria,
    temp_delta: f64,
}

fn rank(candidates: &[CommentCandidate], dominant: &ForecastSample, tier: SeverityTier) -> Vec<Ranked> {
    let mut ranked: Vec<Ranked> = candidates
        .iter()
        .filter(|c| admissible(c, dominant, tier))
        .map(|c| {
            let criteria = score_candidate(c, dominant);
            Ranked {
                candidate: c.clone(),
                score: CONDITION_WEIGHT * criteria.condition_score
                    + TEMPERATURE_WEIGHT * criteria.temperature_score
                    + TIME_WEIGHT * criteria.time_score,
                criteria,
                temp_delta: candidate_temp_delta(c, dominant),
            }
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then(a.temp_delta.total_cmp(&b.temp_delta))
            .then_with(|| b.candidate.recorded_at.cmp(&a.candidate.recorded_at))
    });
    ranked
}

/// Severity-aware exclusion, applied before scoring.
fn admissible(c: &CommentCandidate, dominant: &ForecastSample, tier: SeverityTier) -> bool {
    let strong = vocab::contains_strong_warning(&c.text);
    if strong && tier.forbids_strong_warning() {
        return false;
    }
    // Thunder alone does not justify maximum-severity phrasing; it
    // needs real precipitation behind it.
    if strong
        && dominant.condition == WeatherCondition::Thunder
        && dominant.precipitation_mm < THUNDER_STRONG_WARNING_MIN_MM
    {
        return false;
    }
    c.matches_temperature(dominant.temperature_c)
        && c.matches_precipitation(dominant.precipitation_mm)
}

fn score_candidate(c: &CommentCandidate, dominant: &ForecastSample) -> SelectionCriteria {
    let condition_score = if c.condition == dominant.condition {
        1.0
    } else if c.condition.is_rainy() && dominant.condition.is_rainy() {
        0.5
    } else {
        0.0
    };
    let temperature_score = 1.0 - (candidate_temp_delta(c, dominant) / 10.0).min(1.0);
    let hour_delta = (f64::from(c.local_hour) - f64::from(dominant.local_hour)).abs();
    let time_score = 1.0 - (hour_delta / 12.0).min(1.0);
    SelectionCriteria {
        condition_score,
        temperature_score,
        time_score,
    }
}

/// Distance from the dominant temperature to the candidate's declared
/// range midpoint.
fn candidate_temp_delta(c: &CommentCandidate, dominant: &ForecastSample) -> f64 {
    let mid = (c.temp_min_c + c.temp_max_c) / 2.0;
    (dominant.temperature_c - mid).abs()
}

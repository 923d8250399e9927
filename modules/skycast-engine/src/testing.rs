//! Shared fixtures and mock collaborators for tests.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};

use llm_client::{GenerationConfig, GenerationError, TextGenerator};
use skycast_common::{
    CommentCandidate, CommentCategory, ForecastSample, SkycastError, WeatherCondition,
};

use crate::corpus::{CandidatePool, CorpusProvider};
use crate::forecast::ForecastProvider;

pub fn sample(
    local_hour: u8,
    condition: WeatherCondition,
    temperature_c: f64,
    precipitation_mm: f64,
) -> ForecastSample {
    ForecastSample {
        location_id: "tokyo".to_string(),
        at: Utc.with_ymd_and_hms(2025, 7, 15, u32::from(local_hour), 0, 0).unwrap(),
        local_hour,
        temperature_c,
        precipitation_mm,
        humidity_pct: 60.0,
        wind_speed_ms: 2.0,
        condition,
    }
}

/// Candidate with wide matching ranges so metadata filters stay out
/// of the way unless a test narrows them.
pub fn candidate(
    text: &str,
    category: CommentCategory,
    condition: WeatherCondition,
) -> CommentCandidate {
    CommentCandidate {
        text: text.to_string(),
        category,
        condition,
        temp_min_c: -30.0,
        temp_max_c: 45.0,
        precip_min_mm: 0.0,
        precip_max_mm: 100.0,
        local_hour: 12,
        recorded_at: Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap(),
    }
}

/// Forecast provider returning a fixed sample set, counting fetches.
pub struct StaticForecast {
    samples: Vec<ForecastSample>,
    fetches: AtomicU32,
}

impl StaticForecast {
    pub fn new(samples: Vec<ForecastSample>) -> Self {
        Self {
            samples,
            fetches: AtomicU32::new(0),
        }
    }

    pub fn fetch_count(&self) -> u32 {
        self.fetches.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ForecastProvider for StaticForecast {
    async fn fetch(
        &self,
        location_id: &str,
        _date: NaiveDate,
    ) -> Result<Vec<ForecastSample>, SkycastError> {
        self.fetches.fetch_add(1, Ordering::Relaxed);
        let mut samples = self.samples.clone();
        for s in &mut samples {
            s.location_id = location_id.to_string();
        }
        Ok(samples)
    }
}

/// Forecast provider that fails for the named locations.
pub struct FlakyForecast {
    inner: StaticForecast,
    failing: Vec<String>,
}

impl FlakyForecast {
    pub fn new(samples: Vec<ForecastSample>, failing: Vec<String>) -> Self {
        Self {
            inner: StaticForecast::new(samples),
            failing,
        }
    }
}

#[async_trait]
impl ForecastProvider for FlakyForecast {
    async fn fetch(
        &self,
        location_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<ForecastSample>, SkycastError> {
        if self.failing.iter().any(|l| l == location_id) {
            return Err(SkycastError::UpstreamFetch(format!(
                "forecast service unavailable for {location_id}"
            )));
        }
        self.inner.fetch(location_id, date).await
    }
}

/// Corpus provider returning a fixed candidate list.
pub struct StaticCorpus {
    candidates: Vec<CommentCandidate>,
}

impl StaticCorpus {
    pub fn new(candidates: Vec<CommentCandidate>) -> Self {
        Self { candidates }
    }
}

#[async_trait]
impl CorpusProvider for StaticCorpus {
    async fn retrieve(
        &self,
        _location_id: &str,
        _condition: WeatherCondition,
    ) -> Result<CandidatePool, SkycastError> {
        if self.candidates.is_empty() {
            return Err(SkycastError::UpstreamFetch("corpus unavailable".to_string()));
        }
        Ok(CandidatePool::from_candidates(self.candidates.clone()))
    }
}

/// Generator returning a fixed response, recording prompts.
pub struct FixedGenerator {
    response: String,
    pub prompts: Mutex<Vec<String>>,
}

impl FixedGenerator {
    pub fn new(response: &str) -> Self {
        Self {
            response: response.to_string(),
            prompts: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl TextGenerator for FixedGenerator {
    async fn generate(
        &self,
        prompt: &str,
        _config: &GenerationConfig,
    ) -> Result<String, GenerationError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(self.response.clone())
    }
}

/// Generator that always fails.
pub struct FailingGenerator;

#[async_trait]
impl TextGenerator for FailingGenerator {
    async fn generate(
        &self,
        _prompt: &str,
        _config: &GenerationConfig,
    ) -> Result<String, GenerationError> {
        Err(GenerationError::Timeout)
    }
}

/// A small curated pool that passes every evaluator rule for a rainy
/// summer forecast.
pub fn rain_pool() -> Vec<CommentCandidate> {
    vec![
        candidate("昼から雨が降ります", CommentCategory::Weather, WeatherCondition::Rain),
        candidate("雨がぱらつきます", CommentCategory::Weather, WeatherCondition::Rain),
        candidate("傘をお持ちください", CommentCategory::Advice, WeatherCondition::Rain),
        candidate("雨具があると安心です", CommentCategory::Advice, WeatherCondition::Rain),
    ]
}

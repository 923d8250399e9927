//! End-to-end workflow tests with mock providers.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};

use llm_client::TextGenerator;
use skycast_common::{CommentCategory, RunRecord, RunSettings, RunState, WeatherCondition};
use skycast_engine::testing::{candidate, rain_pool, sample, FlakyForecast, FixedGenerator, StaticCorpus, StaticForecast};
use skycast_engine::{run_batch, EngineDeps, ForecastCache, LocationOutcome, WorkflowEngine};

fn target_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 7, 15, 0, 0, 0).unwrap()
}

fn engine(
    forecast: Arc<dyn skycast_engine::ForecastProvider>,
    corpus: Arc<dyn skycast_engine::CorpusProvider>,
    generator: Arc<dyn TextGenerator>,
) -> WorkflowEngine {
    let mut providers: HashMap<String, Arc<dyn TextGenerator>> = HashMap::new();
    providers.insert("claude".to_string(), generator);
    WorkflowEngine::new(EngineDeps {
        forecast,
        cache: Arc::new(ForecastCache::new(Duration::from_secs(3600))),
        corpus,
        providers,
        secondary_provider: None,
        llm_timeout: Duration::from_secs(5),
    })
}

#[tokio::test]
async fn hot_clear_day_produces_heat_comment() {
    // Clear sky peaking at 36 °C with no rain anywhere in the day.
    let forecast = Arc::new(StaticForecast::new(vec![
        sample(9, WeatherCondition::Clear, 30.0, 0.0),
        sample(12, WeatherCondition::Clear, 36.0, 0.0),
        sample(15, WeatherCondition::Clear, 34.0, 0.0),
        sample(18, WeatherCondition::Clear, 31.0, 0.0),
    ]));
    let corpus = Arc::new(StaticCorpus::new(vec![
        candidate("強い日差しが続きます", CommentCategory::Weather, WeatherCondition::Clear),
        candidate("水分補給を心がけましょう", CommentCategory::Advice, WeatherCondition::Clear),
    ]));
    let generator = Arc::new(FixedGenerator::new("熱中症に注意です"));

    let run = engine(forecast, corpus, generator)
        .run("tokyo", target_time(), "claude", RunSettings::default())
        .await;

    assert_eq!(run.state, RunState::Succeeded);
    assert_eq!(run.retry_count, 0);
    assert_eq!(run.dominant_condition, Some(WeatherCondition::Clear));
    assert_eq!(run.dominant_temperature_c, Some(36.0));
    assert_eq!(run.final_comment.as_deref(), Some("熱中症に注意です"));
    assert_eq!(run.advice_comment.as_deref(), Some("水分補給を心がけましょう"));
    assert!(run.errors.is_empty());
}

#[tokio::test]
async fn light_thunder_keeps_mild_caution_only() {
    // Thunder at 1 mm: strong-warning candidates must never be picked.
    let forecast = Arc::new(StaticForecast::new(vec![
        sample(12, WeatherCondition::Thunder, 24.0, 1.0),
        sample(15, WeatherCondition::Cloudy, 23.0, 0.0),
    ]));
    let corpus = Arc::new(StaticCorpus::new(vec![
        candidate("雷に厳重警戒です", CommentCategory::Weather, WeatherCondition::Thunder),
        candidate("雷に注意しましょう", CommentCategory::Weather, WeatherCondition::Thunder),
        candidate("折りたたみ傘が安心です", CommentCategory::Advice, WeatherCondition::Thunder),
    ]));
    let generator = Arc::new(FixedGenerator::new("ゴロゴロと雷の音がします"));

    let run = engine(forecast, corpus, generator)
        .run("tokyo", target_time(), "claude", RunSettings::default())
        .await;

    assert_eq!(run.state, RunState::Succeeded);
    assert_eq!(run.dominant_condition, Some(WeatherCondition::Thunder));
    let pair = run.selected_pair.as_ref().expect("pair selected");
    assert_eq!(pair.weather.text, "雷に注意しましょう");
    let final_comment = run.final_comment.as_deref().unwrap();
    assert!(!final_comment.contains("警戒"));
    assert!(!final_comment.contains("警報"));
}

#[tokio::test]
async fn rejected_output_falls_back_to_corpus_text() {
    let forecast = Arc::new(StaticForecast::new(vec![sample(
        12,
        WeatherCondition::Clear,
        36.0,
        0.0,
    )]));
    let corpus = Arc::new(StaticCorpus::new(vec![
        candidate("強い日差しが続きます", CommentCategory::Weather, WeatherCondition::Clear),
        candidate("水分補給を心がけましょう", CommentCategory::Advice, WeatherCondition::Clear),
    ]));
    // NG informal term: the generated text must be rejected.
    let generator = Arc::new(FixedGenerator::new("やばい暑さです"));

    let run = engine(forecast, corpus, generator)
        .run("tokyo", target_time(), "claude", RunSettings::default())
        .await;

    assert_eq!(run.state, RunState::Succeeded);
    assert_eq!(run.final_comment.as_deref(), Some("強い日差しが続きます"));
    assert!(run
        .transitions
        .iter()
        .any(|t| t.state == RunState::FallbackText));
}

#[tokio::test]
async fn exhausted_retries_resolve_to_default_comment() {
    let forecast = Arc::new(StaticForecast::new(vec![sample(
        12,
        WeatherCondition::Rain,
        20.0,
        3.0,
    )]));
    // The only weather candidate is too long, so every attempt fails
    // evaluation until the retry budget runs out.
    let corpus = Arc::new(StaticCorpus::new(vec![
        candidate(
            "雨が降ったり止んだりの一日になりそうです",
            CommentCategory::Weather,
            WeatherCondition::Rain,
        ),
        candidate("傘をお持ちください", CommentCategory::Advice, WeatherCondition::Rain),
    ]));
    let generator = Arc::new(FixedGenerator::new("雨がぱらつきそうです"));

    let run = engine(forecast, corpus, generator)
        .run("tokyo", target_time(), "claude", RunSettings::default())
        .await;

    assert_eq!(run.state, RunState::Succeeded);
    assert_eq!(run.retry_count, run.max_retries);
    assert_eq!(run.final_comment.as_deref(), Some("雨なので傘が安心です"));
    assert!(run
        .transitions
        .iter()
        .any(|t| t.state == RunState::FallbackPair));
    assert!(!run.warnings.is_empty());
}

#[tokio::test]
async fn unknown_provider_fails_before_any_fetch() {
    let forecast = Arc::new(StaticForecast::new(vec![sample(
        12,
        WeatherCondition::Rain,
        20.0,
        3.0,
    )]));
    let corpus = Arc::new(StaticCorpus::new(rain_pool()));
    let generator = Arc::new(FixedGenerator::new("雨がぱらつきそうです"));
    let forecast_probe = Arc::clone(&forecast);

    let run = engine(forecast, corpus, generator)
        .run("tokyo", target_time(), "mistral", RunSettings::default())
        .await;

    assert_eq!(run.state, RunState::Failed);
    assert!(run.errors[0].contains("unknown provider"));
    assert_eq!(forecast_probe.fetch_count(), 0);
    assert!(run.final_comment.is_none());
}

#[tokio::test]
async fn batch_tolerates_per_location_failure() {
    let locations: Vec<String> = ["tokyo", "osaka", "nagoya"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let forecast = Arc::new(FlakyForecast::new(
        vec![sample(12, WeatherCondition::Rain, 20.0, 3.0)],
        vec!["osaka".to_string()],
    ));
    let corpus = Arc::new(StaticCorpus::new(rain_pool()));
    let generator = Arc::new(FixedGenerator::new("雨がぱらつきそうです"));
    let engine = engine(forecast, corpus, generator);

    let outcomes = run_batch(
        &engine,
        &locations,
        target_time(),
        "claude",
        &RunSettings::default(),
    )
    .await;

    assert_eq!(outcomes.len(), 3);
    // Input order survives concurrent completion.
    for (outcome, location) in outcomes.iter().zip(&locations) {
        assert_eq!(outcome.location_id(), location);
    }
    assert!(outcomes[0].is_success());
    assert!(outcomes[2].is_success());
    match &outcomes[1] {
        LocationOutcome::Failure { location_id, error } => {
            assert_eq!(location_id, "osaka");
            assert!(error.contains("unavailable"));
        }
        LocationOutcome::Success(_) => panic!("osaka must fail"),
    }
}

#[tokio::test]
async fn run_record_survives_history_serialization() {
    let forecast = Arc::new(StaticForecast::new(vec![sample(
        12,
        WeatherCondition::Rain,
        20.0,
        3.0,
    )]));
    let corpus = Arc::new(StaticCorpus::new(rain_pool()));
    let generator = Arc::new(FixedGenerator::new("雨がぱらつきそうです"));

    let run = engine(forecast, corpus, generator)
        .run("tokyo", target_time(), "claude", RunSettings::default())
        .await;
    let record = run.to_record();

    let json = serde_json::to_string(&record).unwrap();
    let restored: RunRecord = serde_json::from_str(&json).unwrap();
    assert_eq!(record, restored);
    assert_eq!(restored.state, RunState::Succeeded);
    assert!(restored.source_pair.is_some());
}

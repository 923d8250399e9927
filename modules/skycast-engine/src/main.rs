use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{BufReader, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use llm_client::{Claude, OpenAi, Provider, TextGenerator};
use skycast_common::{CommentCandidate, Config, ForecastSample, RunSettings, SkycastError};
use skycast_engine::{run_batch, EngineDeps, ForecastCache, InMemoryCorpus, WorkflowEngine};

/// Forecast snapshot loaded from disk: location id to that day's
/// samples.
#[derive(Debug, Deserialize)]
struct ForecastFile {
    locations: HashMap<String, Vec<ForecastSample>>,
}

struct FileForecast {
    locations: HashMap<String, Vec<ForecastSample>>,
}

impl FileForecast {
    fn load(path: &PathBuf) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("opening forecast file {}", path.display()))?;
        let parsed: ForecastFile =
            serde_json::from_reader(BufReader::new(file)).context("parsing forecast file")?;
        Ok(Self {
            locations: parsed.locations,
        })
    }
}

#[async_trait]
impl skycast_engine::ForecastProvider for FileForecast {
    async fn fetch(
        &self,
        location_id: &str,
        _date: NaiveDate,
    ) -> Result<Vec<ForecastSample>, SkycastError> {
        self.locations
            .get(location_id)
            .cloned()
            .ok_or_else(|| {
                SkycastError::UpstreamFetch(format!("no forecast for location: {location_id}"))
            })
    }
}

fn load_corpus(path: &PathBuf) -> Result<InMemoryCorpus> {
    let file =
        File::open(path).with_context(|| format!("opening corpus file {}", path.display()))?;
    let candidates: Vec<CommentCandidate> =
        serde_json::from_reader(BufReader::new(file)).context("parsing corpus file")?;
    Ok(InMemoryCorpus::new(candidates))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("skycast=info".parse()?))
        .init();

    info!("Skycast engine starting...");

    let config = Config::from_env();
    config.log_redacted();

    let forecast_path = PathBuf::from(
        std::env::var("SKYCAST_FORECAST_FILE").unwrap_or_else(|_| "forecast.json".to_string()),
    );
    let corpus_path = PathBuf::from(
        std::env::var("SKYCAST_CORPUS_FILE").unwrap_or_else(|_| "corpus.json".to_string()),
    );
    let history_path = PathBuf::from(
        std::env::var("SKYCAST_HISTORY_FILE").unwrap_or_else(|_| "history.jsonl".to_string()),
    );

    let forecast = Arc::new(FileForecast::load(&forecast_path)?);
    let corpus = Arc::new(load_corpus(&corpus_path)?);
    info!(
        locations = forecast.locations.len(),
        candidates = corpus.len(),
        "Data loaded"
    );

    let mut providers: HashMap<String, Arc<dyn TextGenerator>> = HashMap::new();
    providers.insert(
        "claude".to_string(),
        Arc::new(Provider::Claude(Claude::new(
            config.anthropic_api_key.clone(),
            config.claude_model.clone(),
        ))),
    );
    let secondary_provider = if config.openai_api_key.is_empty() {
        None
    } else {
        providers.insert(
            "openai".to_string(),
            Arc::new(Provider::OpenAi(OpenAi::new(
                config.openai_api_key.clone(),
                config.openai_model.clone(),
            ))),
        );
        Some("openai".to_string())
    };

    let cache = Arc::new(ForecastCache::new(Duration::from_secs(
        config.forecast_ttl_hours * 3600,
    )));

    let engine = WorkflowEngine::new(EngineDeps {
        forecast,
        cache,
        corpus,
        providers,
        secondary_provider,
        llm_timeout: Duration::from_secs(config.llm_timeout_secs),
    });

    let outcomes = run_batch(
        &engine,
        &config.locations,
        Utc::now(),
        &config.default_provider,
        &RunSettings::default(),
    )
    .await;

    let mut history = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&history_path)
        .with_context(|| format!("opening history file {}", history_path.display()))?;
    for outcome in &outcomes {
        serde_json::to_writer(&mut history, outcome)?;
        history.write_all(b"\n")?;
    }

    let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
    info!(
        total = outcomes.len(),
        succeeded,
        failed = outcomes.len() - succeeded,
        history = %history_path.display(),
        "Skycast engine complete"
    );
    Ok(())
}

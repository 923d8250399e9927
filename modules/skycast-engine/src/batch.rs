//! Concurrent multi-location runs.

use chrono::{DateTime, Utc};
use futures::{stream, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::info;

use skycast_common::{RunRecord, RunSettings, RunState};

use crate::engine::WorkflowEngine;

/// In-flight runs at a time. Keeps upstream providers comfortable
/// while still overlapping LLM latency.
pub const BATCH_CONCURRENCY: usize = 3;

/// Per-location result. A batch never fails as a whole; each location
/// lands here either way.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum LocationOutcome {
    Success(Box<RunRecord>),
    Failure { location_id: String, error: String },
}

impl LocationOutcome {
    pub fn location_id(&self) -> &str {
        match self {
            LocationOutcome::Success(record) => &record.location_id,
            LocationOutcome::Failure { location_id, .. } => location_id,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, LocationOutcome::Success(_))
    }
}

/// Run every location with bounded concurrency. Output order matches
/// input order regardless of completion order.
pub async fn run_batch(
    engine: &WorkflowEngine,
    locations: &[String],
    target_time: DateTime<Utc>,
    provider_id: &str,
    settings: &RunSettings,
) -> Vec<LocationOutcome> {
    let mut outcomes: Vec<(usize, LocationOutcome)> = stream::iter(locations.iter().enumerate())
        .map(|(index, location)| {
            let settings = settings.clone();
            async move {
                let run = engine
                    .run(location, target_time, provider_id, settings)
                    .await;
                let outcome = match run.state {
                    RunState::Failed => LocationOutcome::Failure {
                        location_id: location.clone(),
                        error: run
                            .errors
                            .last()
                            .cloned()
                            .unwrap_or_else(|| "run failed".to_string()),
                    },
                    _ => LocationOutcome::Success(Box::new(run.to_record())),
                };
                (index, outcome)
            }
        })
        .buffer_unordered(BATCH_CONCURRENCY)
        .collect()
        .await;
    outcomes.sort_by_key(|(index, _)| *index);

    let succeeded = outcomes.iter().filter(|(_, o)| o.is_success()).count();
    info!(
        total = locations.len(),
        succeeded,
        failed = locations.len() - succeeded,
        "Batch finished"
    );
    outcomes.into_iter().map(|(_, outcome)| outcome).collect()
}

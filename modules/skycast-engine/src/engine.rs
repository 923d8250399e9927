//! The run-to-completion workflow state machine.
//!
//! The transition function is pure and enumerable; the async driver
//! performs the effect for each state and records a timeline entry on
//! every transition. Errors never escape `run()` — a failed run is a
//! `GenerationRun` in the `Failed` state carrying its errors.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use llm_client::TextGenerator;
use skycast_common::{
    GenerationRun, RunSettings, RunState, Season, SkycastError,
};

use crate::cache::ForecastCache;
use crate::corpus::CorpusProvider;
use crate::defaults;
use crate::evaluator::{EvalContext, Evaluator};
use crate::forecast::{ForecastContext, ForecastProvider};
use crate::generator::Generator;
use crate::selector::PairSelector;

/// Events driving the transition function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunEvent {
    InputAccepted,
    InputRejected,
    ForecastFetched,
    FetchFailed,
    CandidatesRetrieved,
    PairSelected,
    PairAccepted,
    PairRejected { exhausted: bool },
    FallbackResolved,
    TextGenerated,
    OutputAccepted,
    OutputRejected,
}

/// Pure transition function. Unexpected (state, event) combinations
/// fail the run rather than wedging it.
pub fn next_state(state: RunState, event: RunEvent) -> RunState {
    match (state, event) {
        (RunState::Start, RunEvent::InputAccepted) => RunState::FetchForecast,
        (RunState::Start, RunEvent::InputRejected) => RunState::Failed,
        (RunState::FetchForecast, RunEvent::ForecastFetched) => RunState::RetrieveCandidates,
        (RunState::FetchForecast, RunEvent::FetchFailed) => RunState::Failed,
        (RunState::RetrieveCandidates, RunEvent::CandidatesRetrieved) => RunState::SelectPair,
        (RunState::RetrieveCandidates, RunEvent::FetchFailed) => RunState::Failed,
        (RunState::SelectPair, RunEvent::PairSelected) => RunState::Evaluate,
        (RunState::Evaluate, RunEvent::PairAccepted) => RunState::Generate,
        (RunState::Evaluate, RunEvent::PairRejected { exhausted: false }) => RunState::SelectPair,
        (RunState::Evaluate, RunEvent::PairRejected { exhausted: true }) => RunState::FallbackPair,
        (RunState::FallbackPair, RunEvent::FallbackResolved) => RunState::Succeeded,
        (RunState::Generate, RunEvent::TextGenerated) => RunState::ValidateOutput,
        (RunState::ValidateOutput, RunEvent::OutputAccepted) => RunState::Succeeded,
        (RunState::ValidateOutput, RunEvent::OutputRejected) => RunState::FallbackText,
        (RunState::FallbackText, RunEvent::FallbackResolved) => RunState::Succeeded,
        _ => RunState::Failed,
    }
}

/// Explicitly constructed collaborators; no ambient globals.
pub struct EngineDeps {
    pub forecast: Arc<dyn ForecastProvider>,
    pub cache: Arc<ForecastCache>,
    pub corpus: Arc<dyn CorpusProvider>,
    pub providers: HashMap<String, Arc<dyn TextGenerator>>,
    /// Provider id used as the generation fallback, if configured.
    pub secondary_provider: Option<String>,
    pub llm_timeout: Duration,
}

pub struct WorkflowEngine {
    deps: EngineDeps,
    selector: PairSelector,
    evaluator: Evaluator,
    generator: Generator,
}

impl WorkflowEngine {
    pub fn new(deps: EngineDeps) -> Self {
        let generator = Generator::new(deps.llm_timeout);
        Self {
            deps,
            selector: PairSelector::default(),
            evaluator: Evaluator,
            generator,
        }
    }

    pub fn with_selector(mut self, selector: PairSelector) -> Self {
        self.selector = selector;
        self
    }

    /// Execute one generation run to a terminal state.
    pub async fn run(
        &self,
        location_id: &str,
        target_time: DateTime<Utc>,
        provider_id: &str,
        settings: RunSettings,
    ) -> GenerationRun {
        let mut run = GenerationRun::new(location_id, target_time, provider_id, settings);

        // Input validation happens before any state transition.
        if let Err(e) = self.validate_input(location_id, provider_id) {
            run.push_error(e.to_string());
            run.enter(next_state(run.state, RunEvent::InputRejected));
            return run;
        }
        run.enter(next_state(run.state, RunEvent::InputAccepted));

        match self.drive(&mut run).await {
            Ok(()) => {}
            Err(e) => {
                warn!(location = location_id, error = %e, "Run failed");
                run.push_error(e.to_string());
                run.enter(next_state(run.state, RunEvent::FetchFailed));
            }
        }

        debug_assert!(run.state.is_terminal());
        debug_assert!(run.retry_count <= run.max_retries);
        info!(
            location = location_id,
            state = ?run.state,
            retries = run.retry_count,
            duration_ms = run.duration_ms(),
            "Run finished"
        );
        run
    }

    fn validate_input(&self, location_id: &str, provider_id: &str) -> Result<(), SkycastError> {
        if location_id.trim().is_empty() {
            return Err(SkycastError::Input("location id is empty".to_string()));
        }
        if !self.deps.providers.contains_key(provider_id) {
            return Err(SkycastError::Input(format!(
                "unknown provider: {provider_id}"
            )));
        }
        Ok(())
    }

    /// Everything after input validation. Returns `Err` only for
    /// terminal upstream failures.
    async fn drive(&self, run: &mut GenerationRun) -> Result<(), SkycastError> {
        // FETCH_FORECAST
        let samples = self
            .deps
            .cache
            .get_or_fetch(
                self.deps.forecast.as_ref(),
                &run.location_id,
                run.target_time.date_naive(),
            )
            .await?;
        let forecast = ForecastContext::new(samples)?;
        let dominant = forecast.dominant_sample().clone();
        run.samples = forecast.samples().to_vec();
        run.dominant_condition = Some(dominant.condition);
        run.dominant_temperature_c = Some(dominant.temperature_c);
        run.enter(next_state(run.state, RunEvent::ForecastFetched));

        // RETRIEVE_CANDIDATES
        let pool = self
            .deps
            .corpus
            .retrieve(&run.location_id, dominant.condition)
            .await?;
        run.candidate_counts = pool.counts();
        run.enter(next_state(run.state, RunEvent::CandidatesRetrieved));

        let season = Season::from_time(run.target_time);
        let settings = run.settings.clone();
        let location_id = run.location_id.clone();
        let ctx = EvalContext {
            dominant: &dominant,
            season,
            location_id: &location_id,
            settings: &settings,
        };

        // SELECT_PAIR / EVALUATE loop, bounded by max_retries.
        let mut excluded = HashSet::new();
        let accepted = loop {
            let selected = self.selector.select(&dominant, &pool, &mut excluded);
            run.enter(next_state(run.state, RunEvent::PairSelected));

            let rejected_reason = match selected {
                Some(pair) => {
                    let verdict = self.evaluator.evaluate_pair(&pair, &ctx);
                    run.last_verdict = Some(verdict.clone());
                    if verdict.valid {
                        run.selected_pair = Some(pair.clone());
                        run.enter(next_state(run.state, RunEvent::PairAccepted));
                        break Some(pair);
                    }
                    excluded.insert((pair.weather.text.clone(), pair.advice.text.clone()));
                    verdict
                        .headline()
                        .map(|v| v.reason.clone())
                        .unwrap_or_else(|| "rejected".to_string())
                }
                None => "no admissible candidate pair".to_string(),
            };

            run.record_retry();
            let exhausted = run.retries_exhausted();
            run.push_warning(format!(
                "pair rejected (attempt {}): {rejected_reason}",
                run.retry_count
            ));
            run.enter(next_state(run.state, RunEvent::PairRejected { exhausted }));
            if exhausted {
                break None;
            }
        };

        let pair = match accepted {
            Some(pair) => pair,
            None => {
                // FALLBACK_PAIR: pre-approved per-condition default.
                let text = defaults::for_condition(dominant.condition)
                    .unwrap_or(defaults::FINAL_DEFAULT);
                run.push_warning("retries exhausted, using per-condition default".to_string());
                run.final_comment = Some(text.to_string());
                run.enter(next_state(run.state, RunEvent::FallbackResolved));
                return Ok(());
            }
        };

        // GENERATE
        let provider = self
            .deps
            .providers
            .get(&run.provider_id)
            .expect("validated at input")
            .clone();
        let secondary = self
            .deps
            .secondary_provider
            .as_ref()
            .filter(|id| **id != run.provider_id)
            .and_then(|id| self.deps.providers.get(id))
            .cloned();
        let generated = self
            .generator
            .generate(
                &dominant,
                &pair,
                &settings,
                provider.as_ref(),
                secondary.as_deref(),
            )
            .await;
        for w in generated.warnings {
            run.push_warning(w);
        }
        run.enter(next_state(run.state, RunEvent::TextGenerated));

        // VALIDATE_OUTPUT
        let verdict = self.evaluator.evaluate_text(&generated.text, &ctx);
        run.last_verdict = Some(verdict.clone());
        if settings.include_advice {
            run.advice_comment = Some(pair.advice.text.clone());
        }
        if verdict.valid {
            run.final_comment = Some(generated.text);
            run.enter(next_state(run.state, RunEvent::OutputAccepted));
        } else {
            // FALLBACK_TEXT: the corpus pair already passed evaluation.
            run.push_warning(format!(
                "generated text rejected: {}",
                verdict
                    .headline()
                    .map(|v| v.reason.as_str())
                    .unwrap_or("rejected")
            ));
            run.enter(next_state(run.state, RunEvent::OutputRejected));
            run.final_comment = Some(pair.weather.text.clone());
            run.enter(next_state(run.state, RunEvent::FallbackResolved));
        }
        Ok(())
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{
    CandidateCounts, CommentPair, ForecastSample, ValidationVerdict, WeatherCondition,
};

/// Maximum pair-selection retries before the fallback-pair policy.
pub const MAX_RETRIES: u32 = 5;

/// Workflow states. Terminal states are `Succeeded` and `Failed`;
/// everything the run produced lives on the aggregate, not the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Start,
    FetchForecast,
    RetrieveCandidates,
    SelectPair,
    Evaluate,
    Generate,
    ValidateOutput,
    FallbackPair,
    FallbackText,
    Succeeded,
    Failed,
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Succeeded | RunState::Failed)
    }
}

/// Timeline entry appended on every state transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub state: RunState,
    pub entered_at: DateTime<Utc>,
    pub duration_ms: u64,
}

/// Optional per-run generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSettings {
    pub include_advice: bool,
    pub enforce_polite: bool,
    pub allow_expressive_punctuation: bool,
    /// Inclusive output length bounds, counted in characters.
    pub min_length: usize,
    pub max_length: usize,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            include_advice: true,
            enforce_polite: true,
            allow_expressive_punctuation: false,
            min_length: 5,
            max_length: 15,
        }
    }
}

/// Aggregate state for one generation run. Created at run start,
/// mutated exclusively by the workflow engine and the nodes it
/// invokes, exposed as a `RunRecord` at run end.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRun {
    pub id: Uuid,
    pub location_id: String,
    pub target_time: DateTime<Utc>,
    pub provider_id: String,
    pub settings: RunSettings,

    pub samples: Vec<ForecastSample>,
    pub candidate_counts: CandidateCounts,
    pub selected_pair: Option<CommentPair>,

    pub retry_count: u32,
    pub max_retries: u32,
    pub last_verdict: Option<ValidationVerdict>,

    pub final_comment: Option<String>,
    pub advice_comment: Option<String>,
    pub dominant_condition: Option<WeatherCondition>,
    pub dominant_temperature_c: Option<f64>,

    pub state: RunState,
    pub transitions: Vec<Transition>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,

    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    state_entered_at: DateTime<Utc>,
}

impl GenerationRun {
    pub fn new(
        location_id: impl Into<String>,
        target_time: DateTime<Utc>,
        provider_id: impl Into<String>,
        settings: RunSettings,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            location_id: location_id.into(),
            target_time,
            provider_id: provider_id.into(),
            settings,
            samples: Vec::new(),
            candidate_counts: CandidateCounts::default(),
            selected_pair: None,
            retry_count: 0,
            max_retries: MAX_RETRIES,
            last_verdict: None,
            final_comment: None,
            advice_comment: None,
            dominant_condition: None,
            dominant_temperature_c: None,
            state: RunState::Start,
            transitions: Vec::new(),
            errors: Vec::new(),
            warnings: Vec::new(),
            started_at: now,
            finished_at: None,
            state_entered_at: now,
        }
    }

    /// Move to `next`, logging the state being left and its duration.
    pub fn enter(&mut self, next: RunState) {
        let now = Utc::now();
        let duration_ms = (now - self.state_entered_at).num_milliseconds().max(0) as u64;
        self.transitions.push(Transition {
            state: self.state,
            entered_at: self.state_entered_at,
            duration_ms,
        });
        self.state = next;
        self.state_entered_at = now;
        if next.is_terminal() {
            self.finished_at = Some(now);
        }
    }

    /// Bump the retry counter, saturating at `max_retries`.
    pub fn record_retry(&mut self) {
        self.retry_count = (self.retry_count + 1).min(self.max_retries);
    }

    pub fn retries_exhausted(&self) -> bool {
        self.retry_count >= self.max_retries
    }

    pub fn push_error(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
    }

    pub fn push_warning(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }

    pub fn duration_ms(&self) -> u64 {
        let end = self.finished_at.unwrap_or_else(Utc::now);
        (end - self.started_at).num_milliseconds().max(0) as u64
    }

    /// Serializable output view for callers and the history log.
    pub fn to_record(&self) -> RunRecord {
        RunRecord {
            id: self.id,
            location_id: self.location_id.clone(),
            target_time: self.target_time,
            provider_id: self.provider_id.clone(),
            state: self.state,
            final_comment: self.final_comment.clone(),
            advice_comment: self.advice_comment.clone(),
            retry_count: self.retry_count,
            dominant_condition: self.dominant_condition,
            dominant_temperature_c: self.dominant_temperature_c,
            source_pair: self.selected_pair.as_ref().map(|p| SourcePair {
                weather_text: p.weather.text.clone(),
                advice_text: p.advice.text.clone(),
                score: p.score,
            }),
            transitions: self.transitions.clone(),
            errors: self.errors.clone(),
            warnings: self.warnings.clone(),
            started_at: self.started_at,
            finished_at: self.finished_at,
            duration_ms: self.duration_ms(),
        }
    }
}

/// The corpus pair a comment was seeded from, as recorded in output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourcePair {
    pub weather_text: String,
    pub advice_text: String,
    pub score: f64,
}

/// Completed-run record: everything an external history log or API
/// response needs, fully serializable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub id: Uuid,
    pub location_id: String,
    pub target_time: DateTime<Utc>,
    pub provider_id: String,
    pub state: RunState,
    pub final_comment: Option<String>,
    pub advice_comment: Option<String>,
    pub retry_count: u32,
    pub dominant_condition: Option<WeatherCondition>,
    pub dominant_temperature_c: Option<f64>,
    pub source_pair: Option<SourcePair>,
    pub transitions: Vec<Transition>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub duration_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enter_appends_transition_for_left_state() {
        let mut run = GenerationRun::new("tokyo", Utc::now(), "claude", RunSettings::default());
        run.enter(RunState::FetchForecast);
        run.enter(RunState::RetrieveCandidates);

        assert_eq!(run.transitions.len(), 2);
        assert_eq!(run.transitions[0].state, RunState::Start);
        assert_eq!(run.transitions[1].state, RunState::FetchForecast);
        assert_eq!(run.state, RunState::RetrieveCandidates);
        assert!(run.finished_at.is_none());
    }

    #[test]
    fn terminal_state_sets_finished_at() {
        let mut run = GenerationRun::new("tokyo", Utc::now(), "claude", RunSettings::default());
        run.enter(RunState::Failed);
        assert!(run.finished_at.is_some());
    }

    #[test]
    fn retry_counter_saturates_at_max() {
        let mut run = GenerationRun::new("tokyo", Utc::now(), "claude", RunSettings::default());
        for _ in 0..20 {
            run.record_retry();
        }
        assert_eq!(run.retry_count, MAX_RETRIES);
        assert!(run.retries_exhausted());
    }

    #[test]
    fn record_round_trips_through_serde() {
        let mut run = GenerationRun::new("osaka", Utc::now(), "openai", RunSettings::default());
        run.enter(RunState::FetchForecast);
        run.final_comment = Some("晴れて洗濯日和です".to_string());
        run.dominant_condition = Some(WeatherCondition::Clear);
        run.dominant_temperature_c = Some(28.5);
        run.enter(RunState::Succeeded);

        let record = run.to_record();
        let json = serde_json::to_string(&record).unwrap();
        let restored: RunRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(record, restored);
    }
}

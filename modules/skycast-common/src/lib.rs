pub mod config;
pub mod error;
pub mod run;
pub mod similarity;
pub mod types;
pub mod vocab;

pub use config::Config;
pub use error::SkycastError;
pub use run::{GenerationRun, RunRecord, RunSettings, RunState, Transition};
pub use similarity::{CharOverlap, SimilarityScorer, TokenBigramOverlap, DUPLICATE_THRESHOLD};
pub use types::{
    CandidateCounts, CommentCandidate, CommentCategory, CommentPair, ForecastSample, RuleCategory,
    RuleViolation, SelectionCriteria, Season, SeverityTier, ValidationVerdict, WeatherCondition,
};

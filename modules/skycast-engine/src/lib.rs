pub mod batch;
pub mod cache;
pub mod corpus;
pub mod defaults;
pub mod engine;
pub mod evaluator;
pub mod forecast;
pub mod generator;
pub mod selector;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use batch::{run_batch, LocationOutcome};
pub use cache::ForecastCache;
pub use corpus::{CandidatePool, CorpusProvider, InMemoryCorpus};
pub use engine::{EngineDeps, WorkflowEngine};
pub use evaluator::{EvalContext, Evaluator};
pub use forecast::{ForecastContext, ForecastProvider, TARGET_HOURS};
pub use generator::Generator;
pub use selector::PairSelector;

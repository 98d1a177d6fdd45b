pub mod decider;
pub mod replay;

pub use decider::{DecisionEngine, EngineError};
pub use replay::{load_ticks_csv, ReplayConfig, ReplayEngine, ReplaySummary};

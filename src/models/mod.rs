pub mod statistical;
pub mod pattern;
pub mod rules;
pub mod learner;

pub use statistical::StatisticalModel;
pub use pattern::PatternModel;
pub use rules::RuleModel;
pub use learner::AdaptiveLearner;

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use thiserror::Error;

use crate::config::EngineConfig;
use crate::storage::{StateStore, StoreError};
use crate::types::{ModelKind, ModelPrediction, TickBuffer};

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("state store failure: {0}")]
    Store(#[from] StoreError),
    #[error("{0}")]
    Internal(String),
}

/// One predictive model in the ensemble. Implementations are pure functions
/// of the supplied history except for the learner, which reads its value
/// table through the store on every call.
pub trait PredictiveModel: Send {
    fn kind(&self) -> ModelKind;
    fn min_ticks_required(&self) -> usize;
    fn predict(&mut self, history: &TickBuffer) -> Result<ModelPrediction, ModelError>;
}

/// Instantiate the enabled models for one engine.
pub fn build_models(
    config: &EngineConfig,
    store: Arc<dyn StateStore>,
) -> Vec<Box<dyn PredictiveModel>> {
    let mut models: Vec<Box<dyn PredictiveModel>> = Vec::new();

    if config.models.statistical {
        models.push(Box::new(StatisticalModel::new(config.statistical.clone())));
    }
    if config.models.pattern {
        models.push(Box::new(PatternModel::new(config.pattern.clone())));
    }
    if config.models.rule {
        models.push(Box::new(RuleModel::new(config.rules.clone())));
    }
    if config.models.learner {
        let rng = match config.general.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(1)),
            None => StdRng::from_entropy(),
        };
        models.push(Box::new(AdaptiveLearner::new(
            config.learner.clone(),
            store,
            rng,
        )));
    }

    models
}

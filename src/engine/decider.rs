use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::ensemble::{
    apply_gate, compute_weights, fuse_decisions, run_monte_carlo, EnsembleMethod, WeightMethod,
};
use crate::models::{self, learner, ModelError, PredictiveModel};
use crate::storage::{AccuracyMap, StateStore, StoreError};
use crate::types::{Decision, LearnerState, ModelPrediction, Parity, TickBuffer};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("state store failure: {0}")]
    Store(#[from] StoreError),
    #[error("model failure: {0}")]
    Model(#[from] ModelError),
}

/// The prediction ensemble and decision-fusion engine.
///
/// One `decide` pass runs the enabled models over the supplied history,
/// weights their votes, fuses them, and (for the weighted ensemble method)
/// runs the Monte Carlo gate. Single-threaded and synchronous; the only
/// state carried between calls is the RNG stream and whatever the store
/// returns on each read.
pub struct DecisionEngine {
    config: EngineConfig,
    models: Vec<Box<dyn PredictiveModel>>,
    store: Arc<dyn StateStore>,
    weight_method: WeightMethod,
    ensemble_method: EnsembleMethod,
    rng: StdRng,
}

impl DecisionEngine {
    pub fn new(config: EngineConfig, store: Arc<dyn StateStore>) -> Self {
        let models = models::build_models(&config, Arc::clone(&store));
        let weight_method = WeightMethod::parse(&config.ensemble.weight_method);
        let ensemble_method = EnsembleMethod::parse(&config.ensemble.ensemble_method);
        let rng = match config.general.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            config,
            models,
            store,
            weight_method,
            ensemble_method,
            rng,
        }
    }

    /// Run one full decision pass. Model failures are logged and excluded
    /// (fail-open); nothing here returns an error to the caller.
    pub fn decide(&mut self, history: &TickBuffer) -> Decision {
        let mut predictions: Vec<ModelPrediction> = Vec::new();
        for model in &mut self.models {
            match model.predict(history) {
                Ok(prediction) => {
                    debug!(
                        model = %prediction.model,
                        prediction = ?prediction.prediction,
                        confidence = prediction.confidence,
                        "model vote"
                    );
                    predictions.push(prediction);
                }
                Err(e) => {
                    warn!("Model {} failed, excluding from this cycle: {}", model.kind(), e);
                }
            }
        }

        if predictions.is_empty() {
            return Decision::no_trade("no model predictions available", Vec::new());
        }

        let accuracy = self.accuracy_for_weighting();
        let weights = compute_weights(self.weight_method, &predictions, &accuracy);
        let mut decision = fuse_decisions(
            predictions,
            &weights,
            self.config.min_confidence_fraction(),
        );

        if self.ensemble_method == EnsembleMethod::Weighted && decision.should_trade {
            let simulation = run_monte_carlo(
                &decision.model_breakdown,
                self.config.ensemble.monte_carlo_iterations,
                &mut self.rng,
            );
            apply_gate(&mut decision, simulation);
        }

        decision
    }

    /// Feedback entry point, called once per settled wager. Performs the
    /// learner's TD update and persists the value table before returning.
    pub fn apply_outcome(
        &self,
        prior: LearnerState,
        action: Parity,
        reward: f64,
        next: LearnerState,
    ) -> Result<(), EngineError> {
        learner::apply_outcome(
            &self.config.learner,
            self.store.as_ref(),
            prior,
            action,
            reward,
            next,
        )?;
        Ok(())
    }

    /// Stored accuracy is only consulted for performance weighting; a store
    /// failure degrades to default weights rather than killing the cycle.
    fn accuracy_for_weighting(&self) -> AccuracyMap {
        if self.weight_method != WeightMethod::Performance {
            return AccuracyMap::new();
        }
        match self.store.read_model_accuracy() {
            Ok(map) => map,
            Err(e) => {
                warn!("Failed to read model accuracy, using defaults: {}", e);
                AccuracyMap::new()
            }
        }
    }
}

use rand::rngs::StdRng;
use rand::Rng;
use serde_json::json;
use std::sync::Arc;

use super::{ModelError, PredictiveModel};
use crate::config::LearnerParams;
use crate::storage::StateStore;
use crate::types::{LearnerState, ModelKind, ModelPrediction, Parity, TickBuffer};

/// Raw action values are normalized to a confidence by this divisor; crude
/// but preserved as-is, not a calibrated probability.
const VALUE_SCALE: f64 = 10.0;

/// Epsilon-greedy Q-learner over the discretized recent-tick state. The
/// value table lives in the store and is re-read on every call.
pub struct AdaptiveLearner {
    params: LearnerParams,
    store: Arc<dyn StateStore>,
    rng: StdRng,
}

impl AdaptiveLearner {
    pub fn new(params: LearnerParams, store: Arc<dyn StateStore>, rng: StdRng) -> Self {
        Self { params, store, rng }
    }

    /// Temporal-difference update after a settled wager, persisted
    /// immediately. Reward is +1 for a win and -1 for a loss.
    pub fn apply_outcome(
        &self,
        prior: LearnerState,
        action: Parity,
        reward: f64,
        next: LearnerState,
    ) -> Result<(), ModelError> {
        apply_outcome(&self.params, self.store.as_ref(), prior, action, reward, next)
    }
}

/// The TD rule `Q += alpha * (reward + gamma * max(next_row) - Q)`, with
/// both rows lazily created. Rows are never deleted.
pub fn apply_outcome(
    params: &LearnerParams,
    store: &dyn StateStore,
    prior: LearnerState,
    action: Parity,
    reward: f64,
    next: LearnerState,
) -> Result<(), ModelError> {
    let mut table = store.read_value_table()?;
    table.entry(next).or_default();
    let next_max = table[&next].max();

    let row = table.entry(prior).or_default();
    let q = row.get(action);
    let updated = q + params.learning_rate * (reward + params.discount_factor * next_max - q);
    row.set(action, updated);

    store.write_value_table(&table)?;
    Ok(())
}

impl PredictiveModel for AdaptiveLearner {
    fn kind(&self) -> ModelKind {
        ModelKind::Learner
    }

    fn min_ticks_required(&self) -> usize {
        20
    }

    fn predict(&mut self, history: &TickBuffer) -> Result<ModelPrediction, ModelError> {
        if history.len() < self.min_ticks_required() {
            return Ok(ModelPrediction::abstain(self.kind(), "fewer than 20 ticks"));
        }

        let state = LearnerState::from_ticks(&history.ticks)
            .ok_or_else(|| ModelError::Internal("state window shorter than 5 ticks".to_string()))?;

        let mut table = self.store.read_value_table()?;
        let row = *table.entry(state).or_default();

        let explored = self.rng.gen::<f64>() < self.params.exploration_rate;
        let action = if explored {
            if self.rng.gen::<bool>() {
                Parity::Even
            } else {
                Parity::Odd
            }
        } else {
            row.best_action()
        };

        let confidence = (row.max() / VALUE_SCALE).clamp(0.0, 1.0);
        let reason = format!(
            "state {}: Q(even)={:.3}, Q(odd)={:.3}{}",
            state,
            row.even,
            row.odd,
            if explored { " [exploring]" } else { "" }
        );
        Ok(
            ModelPrediction::new(self.kind(), action, confidence, &reason).with_details(json!({
                "state": state.encode(),
                "q_even": row.even,
                "q_odd": row.odd,
                "explored": explored,
            })),
        )
    }
}

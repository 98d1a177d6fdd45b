use rand::rngs::StdRng;
use rand::Rng;
use tracing::debug;

use crate::types::{Decision, ModelPrediction, MonteCarloResult, Parity};

/// A simulated win probability below this vetoes the trade.
const MIN_WIN_PROBABILITY: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnsembleMethod {
    /// Weighted fusion with the Monte Carlo gate.
    Weighted,
    /// Any other configured name: same fusion, no gate.
    Passthrough,
}

impl EnsembleMethod {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "weighted" => EnsembleMethod::Weighted,
            other => {
                debug!("Ensemble method '{}' has no gate, running passthrough", other);
                EnsembleMethod::Passthrough
            }
        }
    }
}

/// Combine weighted model votes into a single call.
///
/// Scores accumulate `confidence * weight` routed by each model's predicted
/// parity; abstentions contribute to neither side. The tie-break is strict
/// `even > odd`, so exact ties (including the all-zero case) resolve to ODD
/// — load-bearing behavior, preserved deliberately.
pub fn fuse_decisions(
    predictions: Vec<ModelPrediction>,
    weights: &[f64],
    min_confidence: f64,
) -> Decision {
    if predictions.is_empty() {
        return Decision::no_trade("no model predictions available", Vec::new());
    }

    let mut even_score = 0.0;
    let mut odd_score = 0.0;
    for (prediction, weight) in predictions.iter().zip(weights.iter()) {
        match prediction.prediction {
            Some(Parity::Even) => even_score += prediction.confidence * weight,
            Some(Parity::Odd) => odd_score += prediction.confidence * weight,
            None => {}
        }
    }

    let final_prediction = if even_score > odd_score {
        Parity::Even
    } else {
        Parity::Odd
    };
    let total = even_score + odd_score;
    let confidence = if total > 0.0 {
        even_score.max(odd_score) / total
    } else {
        0.0
    };
    let should_trade = confidence >= min_confidence;

    let reason = if should_trade {
        format!(
            "{} at {:.1}% fused confidence",
            final_prediction,
            confidence * 100.0
        )
    } else {
        format!(
            "confidence {:.1}% below threshold {:.1}%",
            confidence * 100.0,
            min_confidence * 100.0
        )
    };

    Decision {
        final_prediction: Some(final_prediction),
        confidence,
        should_trade,
        reason,
        model_breakdown: predictions,
        even_score,
        odd_score,
        simulation: None,
    }
}

/// Monte Carlo trade gate. Each iteration draws a model by walking the
/// prediction list accumulating `confidence / n`, then flips a coin at that
/// model's own confidence. The cumulative masses need not sum to 1, so some
/// iterations select no model and record no outcome; those still count in
/// the denominator.
pub fn run_monte_carlo(
    predictions: &[ModelPrediction],
    iterations: usize,
    rng: &mut StdRng,
) -> MonteCarloResult {
    if iterations == 0 || predictions.is_empty() {
        return MonteCarloResult {
            iterations,
            wins: 0,
            resolved: 0,
            win_probability: 0.0,
        };
    }

    let n = predictions.len() as f64;
    let mut wins = 0usize;
    let mut resolved = 0usize;
    for _ in 0..iterations {
        let draw: f64 = rng.gen();
        let mut cumulative = 0.0;
        for prediction in predictions {
            cumulative += prediction.confidence / n;
            if cumulative >= draw {
                resolved += 1;
                if rng.gen::<f64>() < prediction.confidence {
                    wins += 1;
                }
                break;
            }
        }
    }

    MonteCarloResult {
        iterations,
        wins,
        resolved,
        win_probability: wins as f64 / iterations as f64,
    }
}

/// Apply the gate's verdict to an approved decision: the prediction and
/// confidence stand, only the trade flag is overridden.
pub fn apply_gate(decision: &mut Decision, simulation: MonteCarloResult) {
    if simulation.win_probability < MIN_WIN_PROBABILITY {
        decision.should_trade = false;
        decision.reason = format!(
            "monte carlo win probability {:.1}% below 50%",
            simulation.win_probability * 100.0
        );
    }
    decision.simulation = Some(simulation);
}

#![allow(dead_code)]
use serde::{Deserialize, Serialize};
use std::fmt;

use super::Parity;

/// The four predictive models in the ensemble.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelKind {
    Statistical,
    Pattern,
    Rule,
    Learner,
}

impl ModelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::Statistical => "statistical",
            ModelKind::Pattern => "pattern",
            ModelKind::Rule => "rule",
            ModelKind::Learner => "learner",
        }
    }

    pub fn all() -> [ModelKind; 4] {
        [
            ModelKind::Statistical,
            ModelKind::Pattern,
            ModelKind::Rule,
            ModelKind::Learner,
        ]
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "statistical" => Some(ModelKind::Statistical),
            "pattern" => Some(ModelKind::Pattern),
            "rule" => Some(ModelKind::Rule),
            "learner" => Some(ModelKind::Learner),
            _ => None,
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One model's vote for the next tick's parity.
///
/// `prediction == None` means the model abstained this cycle (typically
/// insufficient history); an abstention always carries confidence 0.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelPrediction {
    pub model: ModelKind,
    pub prediction: Option<Parity>,
    pub confidence: f64,
    pub reason: String,
    #[serde(default)]
    pub details: serde_json::Value,
}

impl ModelPrediction {
    pub fn new(model: ModelKind, prediction: Parity, confidence: f64, reason: &str) -> Self {
        Self {
            model,
            prediction: Some(prediction),
            confidence: confidence.clamp(0.0, 1.0),
            reason: reason.to_string(),
            details: serde_json::Value::Null,
        }
    }

    pub fn abstain(model: ModelKind, reason: &str) -> Self {
        Self {
            model,
            prediction: None,
            confidence: 0.0,
            reason: reason.to_string(),
            details: serde_json::Value::Null,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = details;
        self
    }
}

/// Outcome of the Monte Carlo trade gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonteCarloResult {
    pub iterations: usize,
    pub wins: usize,
    /// Iterations where the cumulative model walk actually selected a model.
    pub resolved: usize,
    pub win_probability: f64,
}

/// Final fused decision for one tick cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decision {
    pub final_prediction: Option<Parity>,
    pub confidence: f64,
    pub should_trade: bool,
    pub reason: String,
    pub model_breakdown: Vec<ModelPrediction>,
    pub even_score: f64,
    pub odd_score: f64,
    pub simulation: Option<MonteCarloResult>,
}

impl Decision {
    pub fn no_trade(reason: &str, breakdown: Vec<ModelPrediction>) -> Self {
        Self {
            final_prediction: None,
            confidence: 0.0,
            should_trade: false,
            reason: reason.to_string(),
            model_breakdown: breakdown,
            even_score: 0.0,
            odd_score: 0.0,
            simulation: None,
        }
    }
}

/// Per-model accuracy statistics, maintained by the outer settlement loop
/// and read by performance-based weighting.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ModelAccuracyRecord {
    pub accuracy_pct: f64,
    pub predictions_made: u64,
    pub correct_count: u64,
}

impl ModelAccuracyRecord {
    pub fn record(&mut self, correct: bool) {
        self.predictions_made += 1;
        if correct {
            self.correct_count += 1;
        }
        self.accuracy_pct = self.correct_count as f64 / self.predictions_made as f64 * 100.0;
    }

    pub fn accuracy_fraction(&self) -> f64 {
        self.accuracy_pct / 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abstain_carries_zero_confidence() {
        let p = ModelPrediction::abstain(ModelKind::Pattern, "not enough history");
        assert!(p.prediction.is_none());
        assert_eq!(p.confidence, 0.0);
    }

    #[test]
    fn test_confidence_clamped() {
        let p = ModelPrediction::new(ModelKind::Rule, Parity::Even, 1.4, "x");
        assert_eq!(p.confidence, 1.0);
        let p = ModelPrediction::new(ModelKind::Rule, Parity::Even, -0.2, "x");
        assert_eq!(p.confidence, 0.0);
    }

    #[test]
    fn test_accuracy_record() {
        let mut rec = ModelAccuracyRecord::default();
        rec.record(true);
        rec.record(true);
        rec.record(false);
        assert_eq!(rec.predictions_made, 3);
        assert_eq!(rec.correct_count, 2);
        assert!((rec.accuracy_fraction() - 2.0 / 3.0).abs() < 1e-12);
    }
}

use tracing::warn;

use crate::storage::AccuracyMap;
use crate::types::ModelPrediction;

/// When no accuracy record exists for a model, performance weighting assumes
/// a coin-flip history.
const DEFAULT_ACCURACY: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeightMethod {
    Equal,
    Performance,
    Confidence,
}

impl WeightMethod {
    /// Lenient parse: unknown names fall back to equal weighting.
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "equal" => WeightMethod::Equal,
            "performance" => WeightMethod::Performance,
            "confidence" => WeightMethod::Confidence,
            other => {
                warn!("Unknown weight method '{}', falling back to equal", other);
                WeightMethod::Equal
            }
        }
    }
}

/// One weight per prediction, summing to 1 over any non-empty list.
/// Abstaining models are weighted like any other; they contribute nothing to
/// the fused scores regardless.
pub fn compute_weights(
    method: WeightMethod,
    predictions: &[ModelPrediction],
    accuracy: &AccuracyMap,
) -> Vec<f64> {
    let n = predictions.len();
    if n == 0 {
        return Vec::new();
    }

    let raw: Vec<f64> = match method {
        WeightMethod::Equal => return equal_weights(n),
        WeightMethod::Performance => predictions
            .iter()
            .map(|p| {
                accuracy
                    .get(&p.model)
                    .map(|r| r.accuracy_fraction())
                    .unwrap_or(DEFAULT_ACCURACY)
            })
            .collect(),
        WeightMethod::Confidence => predictions.iter().map(|p| p.confidence).collect(),
    };

    let total: f64 = raw.iter().sum();
    if total <= 0.0 {
        return equal_weights(n);
    }
    raw.into_iter().map(|w| w / total).collect()
}

fn equal_weights(n: usize) -> Vec<f64> {
    vec![1.0 / n as f64; n]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ModelAccuracyRecord, ModelKind, Parity};

    fn prediction(model: ModelKind, confidence: f64) -> ModelPrediction {
        ModelPrediction::new(model, Parity::Even, confidence, "test")
    }

    fn sum(weights: &[f64]) -> f64 {
        weights.iter().sum()
    }

    #[test]
    fn test_equal_weights_identical_and_normalized() {
        let preds = vec![
            prediction(ModelKind::Statistical, 0.9),
            prediction(ModelKind::Pattern, 0.1),
            prediction(ModelKind::Rule, 0.4),
        ];
        let weights = compute_weights(WeightMethod::Equal, &preds, &AccuracyMap::new());
        assert_eq!(weights.len(), 3);
        assert!(weights.iter().all(|&w| (w - weights[0]).abs() < 1e-12));
        assert!((sum(&weights) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_confidence_weights_proportional() {
        let preds = vec![
            prediction(ModelKind::Statistical, 0.6),
            prediction(ModelKind::Rule, 0.2),
        ];
        let weights = compute_weights(WeightMethod::Confidence, &preds, &AccuracyMap::new());
        assert!((weights[0] - 0.75).abs() < 1e-12);
        assert!((weights[1] - 0.25).abs() < 1e-12);
        assert!((sum(&weights) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_confidence_falls_back_to_equal() {
        let preds = vec![
            ModelPrediction::abstain(ModelKind::Statistical, "no data"),
            ModelPrediction::abstain(ModelKind::Rule, "no data"),
        ];
        let weights = compute_weights(WeightMethod::Confidence, &preds, &AccuracyMap::new());
        assert_eq!(weights, vec![0.5, 0.5]);
    }

    #[test]
    fn test_performance_weights_use_records_and_default() {
        let mut accuracy = AccuracyMap::new();
        accuracy.insert(
            ModelKind::Statistical,
            ModelAccuracyRecord {
                accuracy_pct: 75.0,
                predictions_made: 100,
                correct_count: 75,
            },
        );
        let preds = vec![
            prediction(ModelKind::Statistical, 0.9),
            prediction(ModelKind::Rule, 0.9), // no record -> 0.5
        ];
        let weights = compute_weights(WeightMethod::Performance, &preds, &accuracy);
        assert!((weights[0] - 0.6).abs() < 1e-12);
        assert!((weights[1] - 0.4).abs() < 1e-12);
        assert!((sum(&weights) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_method_parses_to_equal() {
        assert_eq!(WeightMethod::parse("quantum"), WeightMethod::Equal);
        assert_eq!(WeightMethod::parse("Performance"), WeightMethod::Performance);
        assert_eq!(WeightMethod::parse("CONFIDENCE"), WeightMethod::Confidence);
    }

    #[test]
    fn test_empty_prediction_list_yields_no_weights() {
        assert!(compute_weights(WeightMethod::Equal, &[], &AccuracyMap::new()).is_empty());
    }
}

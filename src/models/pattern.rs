use serde_json::json;

use super::{ModelError, PredictiveModel};
use crate::config::PatternParams;
use crate::types::{ModelKind, ModelPrediction, Parity, TickBuffer};

/// An anomaly (uniform parity run) damps confidence by this factor.
const ANOMALY_DAMPING: f64 = 0.7;
/// Window inspected by the anomaly detector.
const ANOMALY_WINDOW: usize = 10;

/// Historical analog search: finds past digit windows similar to the most
/// recent one and votes on the parity of whatever followed them.
pub struct PatternModel {
    params: PatternParams,
}

impl PatternModel {
    pub fn new(params: PatternParams) -> Self {
        Self { params }
    }
}

/// Normalized Hamming similarity: fraction of position-wise equal digits.
/// Sequences of different lengths score 0; empty equal-length sequences
/// score 1.
pub fn similarity(a: &[u8], b: &[u8]) -> f64 {
    if a.len() != b.len() {
        return 0.0;
    }
    if a.is_empty() {
        return 1.0;
    }
    let equal = a.iter().zip(b.iter()).filter(|(x, y)| x == y).count();
    equal as f64 / a.len() as f64
}

impl PredictiveModel for PatternModel {
    fn kind(&self) -> ModelKind {
        ModelKind::Pattern
    }

    fn min_ticks_required(&self) -> usize {
        20
    }

    fn predict(&mut self, history: &TickBuffer) -> Result<ModelPrediction, ModelError> {
        if history.len() < self.min_ticks_required() {
            return Ok(ModelPrediction::abstain(self.kind(), "fewer than 20 ticks"));
        }

        let digits = history.digits();
        let recent: Vec<u8> = digits
            .iter()
            .rev()
            .take(self.params.max_pattern_length)
            .rev()
            .copied()
            .collect();
        let query_len = self.params.min_pattern_length.min(recent.len());
        if query_len == 0 || digits.len() < query_len + 2 {
            return Ok(ModelPrediction::abstain(self.kind(), "history too short for query"));
        }
        let query = &recent[recent.len() - query_len..];

        // Scan every same-length window with a known follower, excluding the
        // query window itself and the window immediately before it.
        let mut even_followers = 0usize;
        let mut odd_followers = 0usize;
        let mut matches = 0usize;
        for start in 0..digits.len() - query_len - 1 {
            let window = &digits[start..start + query_len];
            if similarity(window, query) >= self.params.similarity_threshold {
                matches += 1;
                let following = digits[start + query_len];
                if following % 2 == 0 {
                    even_followers += 1;
                } else {
                    odd_followers += 1;
                }
            }
        }

        if matches == 0 {
            return Ok(ModelPrediction::abstain(self.kind(), "no similar historical patterns"));
        }

        let (prediction, majority) = if even_followers > odd_followers {
            (Parity::Even, even_followers)
        } else {
            (Parity::Odd, odd_followers)
        };
        let mut confidence = majority as f64 / matches as f64;

        let anomaly = is_uniform_parity(history);
        if anomaly {
            confidence *= ANOMALY_DAMPING;
        }

        let reason = format!(
            "{} analog(s) found, {}/{} followed by {}{}",
            matches,
            majority,
            matches,
            prediction,
            if anomaly { " (uniform-parity anomaly)" } else { "" }
        );
        Ok(
            ModelPrediction::new(self.kind(), prediction, confidence, &reason).with_details(
                json!({
                    "matches": matches,
                    "even_followers": even_followers,
                    "odd_followers": odd_followers,
                    "query_length": query_len,
                    "anomaly": anomaly,
                }),
            ),
        )
    }
}

/// True when the last `ANOMALY_WINDOW` ticks share a single parity.
fn is_uniform_parity(history: &TickBuffer) -> bool {
    let window = history.last_n(ANOMALY_WINDOW);
    if window.len() < ANOMALY_WINDOW {
        return false;
    }
    window.iter().all(|t| t.is_even) || window.iter().all(|t| !t.is_even)
}

use serde_json::json;

use super::{ModelError, PredictiveModel};
use crate::config::StatisticalParams;
use crate::types::{ModelKind, ModelPrediction, Parity, TickBuffer};

/// Shrinkage weight toward the 0.5 parity prior.
const PRIOR_WEIGHT: f64 = 0.1;
/// The EMA trend looks at most this many recent ticks.
const EMA_WINDOW: usize = 20;

/// Bayesian-shrunk parity frequency blended with an EMA trend over the
/// parity-as-0/1 signal (even = 1).
pub struct StatisticalModel {
    params: StatisticalParams,
}

impl StatisticalModel {
    pub fn new(params: StatisticalParams) -> Self {
        Self { params }
    }
}

impl PredictiveModel for StatisticalModel {
    fn kind(&self) -> ModelKind {
        ModelKind::Statistical
    }

    fn min_ticks_required(&self) -> usize {
        10
    }

    fn predict(&mut self, history: &TickBuffer) -> Result<ModelPrediction, ModelError> {
        if history.len() < self.min_ticks_required() {
            return Ok(ModelPrediction::abstain(self.kind(), "fewer than 10 ticks"));
        }

        let lookback = history.len().min(self.params.lookback_period);
        let window = history.last_n(lookback);
        let even_count = window.iter().filter(|t| t.is_even).count();
        let odd_count = lookback - even_count;

        // Shrink both parities toward the prior independently; after
        // shrinkage they need not sum to 1.
        let mut p_even =
            (even_count as f64 / lookback as f64) * (1.0 - PRIOR_WEIGHT) + 0.5 * PRIOR_WEIGHT;
        let mut p_odd =
            (odd_count as f64 / lookback as f64) * (1.0 - PRIOR_WEIGHT) + 0.5 * PRIOR_WEIGHT;

        let ema = parity_ema(
            history.last_n(EMA_WINDOW.min(lookback)),
            self.params.ema_alpha,
        );
        if let Some(ema) = ema {
            p_even = (p_even + ema) / 2.0;
            p_odd = 1.0 - p_even;
        }

        let (prediction, confidence) = if p_even > p_odd {
            (Parity::Even, p_even)
        } else {
            (Parity::Odd, p_odd)
        };

        let reason = format!(
            "parity frequency over {} ticks: p_even={:.4}, p_odd={:.4}",
            lookback, p_even, p_odd
        );
        Ok(
            ModelPrediction::new(self.kind(), prediction, confidence, &reason).with_details(
                json!({
                    "lookback": lookback,
                    "even_count": even_count,
                    "p_even": p_even,
                    "p_odd": p_odd,
                    "ema": ema,
                }),
            ),
        )
    }
}

/// Seeded-then-recursive EMA over the even-as-1 parity signal, the same
/// smoothing recurrence as a price EMA.
fn parity_ema(window: &[crate::types::Tick], alpha: f64) -> Option<f64> {
    let mut iter = window.iter().map(|t| if t.is_even { 1.0 } else { 0.0 });
    let mut ema = iter.next()?;
    for x in iter {
        ema = alpha * x + (1.0 - alpha) * ema;
    }
    Some(ema)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Tick;
    use rust_decimal_macros::dec;

    fn buffer(digits: &[u8]) -> TickBuffer {
        let mut buf = TickBuffer::new(500);
        for (i, &d) in digits.iter().enumerate() {
            buf.push(Tick::new(d, dec!(1), i as i64));
        }
        buf
    }

    #[test]
    fn test_short_history_abstains() {
        let mut model = StatisticalModel::new(StatisticalParams::default());
        let p = model.predict(&buffer(&[1, 2, 3, 4, 5, 6, 7, 8, 9])).unwrap();
        assert!(p.prediction.is_none());
        assert_eq!(p.confidence, 0.0);
    }

    #[test]
    fn test_all_even_history_predicts_even() {
        let mut model = StatisticalModel::new(StatisticalParams::default());
        let p = model.predict(&buffer(&[2; 15])).unwrap();
        assert_eq!(p.prediction, Some(Parity::Even));
        // frequency 1.0 shrinks to 0.95, EMA is 1.0, blend = 0.975
        assert!((p.confidence - 0.975).abs() < 1e-12);
    }

    #[test]
    fn test_all_odd_history_predicts_odd() {
        let mut model = StatisticalModel::new(StatisticalParams::default());
        let p = model.predict(&buffer(&[3; 15])).unwrap();
        assert_eq!(p.prediction, Some(Parity::Odd));
        assert!((p.confidence - 0.975).abs() < 1e-12);
    }

    #[test]
    fn test_confidence_in_unit_range() {
        let mut model = StatisticalModel::new(StatisticalParams::default());
        let digits: Vec<u8> = (0..60u32).map(|i| ((i * 7) % 10) as u8).collect();
        let p = model.predict(&buffer(&digits)).unwrap();
        assert!((0.0..=1.0).contains(&p.confidence));
    }

    #[test]
    fn test_lookback_caps_window() {
        let params = StatisticalParams {
            lookback_period: 10,
            ema_alpha: 0.3,
        };
        let mut model = StatisticalModel::new(params);
        // 20 odds followed by 10 evens: a lookback of 10 only sees evens.
        let digits: Vec<u8> = std::iter::repeat(3u8)
            .take(20)
            .chain(std::iter::repeat(4u8).take(10))
            .collect();
        let p = model.predict(&buffer(&digits)).unwrap();
        assert_eq!(p.prediction, Some(Parity::Even));
    }
}

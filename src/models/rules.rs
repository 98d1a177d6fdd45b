use serde_json::json;

use super::{ModelError, PredictiveModel};
use crate::config::RuleParams;
use crate::types::{ModelKind, ModelPrediction, Parity, TickBuffer};

/// Digits whose appearance triggers the Fibonacci rule.
const FIBONACCI_DIGITS: [u8; 6] = [0, 1, 2, 3, 5, 8];
/// Streaks are measured within this many recent ticks.
const STREAK_WINDOW: usize = 10;

const CONTINUATION_CONFIDENCE: f64 = 0.6;
const FIBONACCI_CONFIDENCE: f64 = 0.65;
const DEFAULT_CONFIDENCE: f64 = 0.52;

/// Ordered heuristic chain over streaks and digit properties. Later rules
/// may overwrite earlier ones; the fired-rule log records the order.
pub struct RuleModel {
    params: RuleParams,
}

impl RuleModel {
    pub fn new(params: RuleParams) -> Self {
        Self { params }
    }
}

/// Length and parity of the consecutive run ending at the most recent tick.
fn current_streak(history: &TickBuffer) -> (usize, Parity) {
    let window = history.last_n(STREAK_WINDOW);
    let parity = window
        .last()
        .map(|t| t.parity())
        .unwrap_or(Parity::Even);
    let length = window
        .iter()
        .rev()
        .take_while(|t| t.parity() == parity)
        .count();
    (length, parity)
}

impl PredictiveModel for RuleModel {
    fn kind(&self) -> ModelKind {
        ModelKind::Rule
    }

    fn min_ticks_required(&self) -> usize {
        5
    }

    fn predict(&mut self, history: &TickBuffer) -> Result<ModelPrediction, ModelError> {
        if history.len() < self.min_ticks_required() {
            return Ok(ModelPrediction::abstain(self.kind(), "fewer than 5 ticks"));
        }

        let last = history
            .last()
            .ok_or_else(|| ModelError::Internal("empty history past length gate".to_string()))?;
        let last_digit = last.digit;
        let (streak_len, streak_parity) = current_streak(history);

        let mut fired: Vec<&'static str> = Vec::new();
        let mut call: Option<(Parity, f64)> = None;

        // 1. Streak reversal
        if streak_len >= self.params.streak_threshold {
            call = Some((streak_parity.opposite(), self.params.reversal_confidence));
            fired.push("streak_reversal");
        }

        // 2. Short-streak continuation
        if streak_len == 2 {
            call = Some((streak_parity, CONTINUATION_CONFIDENCE));
            fired.push("short_streak_continuation");
        }

        // 3. Fibonacci digit trigger
        if FIBONACCI_DIGITS.contains(&last_digit)
            && call.map_or(true, |(_, conf)| conf < FIBONACCI_CONFIDENCE)
        {
            call = Some((
                Parity::of_digit(last_digit).opposite(),
                FIBONACCI_CONFIDENCE,
            ));
            fired.push("fibonacci_digit");
        }

        // 4. Default alternation
        if call.is_none() {
            call = Some((last.parity().opposite(), DEFAULT_CONFIDENCE));
            fired.push("default_alternation");
        }

        let (prediction, confidence) = call.unwrap_or((Parity::Odd, 0.0));
        let reason = format!(
            "rules fired: {} (streak {} {})",
            fired.join(" -> "),
            streak_len,
            streak_parity
        );
        Ok(
            ModelPrediction::new(self.kind(), prediction, confidence, &reason).with_details(
                json!({
                    "rules_fired": fired,
                    "streak_length": streak_len,
                    "streak_parity": streak_parity,
                    "last_digit": last_digit,
                }),
            ),
        )
    }
}

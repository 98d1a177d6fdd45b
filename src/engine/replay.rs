use anyhow::{anyhow, Context, Result};
use rust_decimal::Decimal;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::database::{Database, WagerRecord};
use crate::storage::StateStore;
use crate::types::{Decision, LearnerState, Tick, TickBuffer};

use super::decider::DecisionEngine;

#[derive(Debug, Clone)]
pub struct ReplayConfig {
    pub stake: Decimal,
    /// Win payout as a fraction of the stake (e.g. 0.95 pays 9.5 on a 10
    /// stake; a loss forfeits the full stake).
    pub payout_ratio: Decimal,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            stake: Decimal::ONE,
            payout_ratio: Decimal::new(95, 2),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReplaySummary {
    pub ticks: usize,
    pub decisions: usize,
    pub trades: usize,
    pub wins: usize,
    pub losses: usize,
    pub pnl: Decimal,
}

impl ReplaySummary {
    pub fn win_rate(&self) -> f64 {
        if self.trades == 0 {
            return 0.0;
        }
        self.wins as f64 / self.trades as f64
    }
}

/// Drives the decision engine over a recorded tick series, settling each
/// approved wager against the very next tick. Settlement feeds the learner
/// (+1 win / -1 loss) and the per-model accuracy records that performance
/// weighting reads.
pub struct ReplayEngine {
    engine: DecisionEngine,
    store: Arc<dyn StateStore>,
    replay: ReplayConfig,
    max_history: usize,
}

impl ReplayEngine {
    pub fn new(config: EngineConfig, store: Arc<dyn StateStore>, replay: ReplayConfig) -> Self {
        let max_history = config.general.max_history;
        let engine = DecisionEngine::new(config, Arc::clone(&store));
        Self {
            engine,
            store,
            replay,
            max_history,
        }
    }

    pub async fn run(&mut self, ticks: &[Tick], db: Option<&Database>) -> Result<ReplaySummary> {
        info!("Replaying {} ticks", ticks.len());
        let mut buffer = TickBuffer::new(self.max_history);
        let mut summary = ReplaySummary {
            ticks: ticks.len(),
            ..Default::default()
        };

        for i in 0..ticks.len() {
            buffer.push(ticks[i].clone());

            // The final tick has nothing to settle against.
            let Some(next) = ticks.get(i + 1) else { break };

            let prior_state = LearnerState::from_ticks(&buffer.ticks);
            let decision = self.engine.decide(&buffer);
            summary.decisions += 1;

            if let Some(db) = db {
                db.insert_decision(ticks[i].timestamp, &decision).await?;
            }

            self.record_accuracy(&decision, next)?;

            let Some(prediction) = decision.final_prediction else { continue };
            if !decision.should_trade {
                continue;
            }

            let won = prediction == next.parity();
            let pnl = if won {
                self.replay.stake * self.replay.payout_ratio
            } else {
                -self.replay.stake
            };
            summary.trades += 1;
            if won {
                summary.wins += 1;
            } else {
                summary.losses += 1;
            }
            summary.pnl += pnl;
            debug!(
                "Wager {} on {} settled by digit {}: {}",
                summary.trades,
                prediction,
                next.digit,
                if won { "win" } else { "loss" }
            );

            if let Some(db) = db {
                db.insert_wager(&WagerRecord {
                    id: Uuid::new_v4().to_string(),
                    timestamp: next.timestamp,
                    prediction,
                    confidence: decision.confidence,
                    stake: self.replay.stake,
                    pnl,
                    settled_digit: next.digit,
                    won,
                })
                .await?;
            }

            // Learner feedback needs both the acting state and the state
            // that includes the settling tick.
            if let Some(prior) = prior_state {
                let mut settled = buffer.clone();
                settled.push(next.clone());
                if let Some(next_state) = LearnerState::from_ticks(&settled.ticks) {
                    let reward = if won { 1.0 } else { -1.0 };
                    self.engine
                        .apply_outcome(prior, prediction, reward, next_state)?;
                }
            }
        }

        info!(
            "Replay complete: {} decisions, {} trades, {} wins ({:.1}% win rate), PnL {}",
            summary.decisions,
            summary.trades,
            summary.wins,
            summary.win_rate() * 100.0,
            summary.pnl
        );
        Ok(summary)
    }

    /// Update every voting model's accuracy record against the settled
    /// parity. A store failure here is worth a warning, not an abort.
    fn record_accuracy(&self, decision: &Decision, next: &Tick) -> Result<()> {
        let voted: Vec<_> = decision
            .model_breakdown
            .iter()
            .filter_map(|p| p.prediction.map(|parity| (p.model, parity)))
            .collect();
        if voted.is_empty() {
            return Ok(());
        }

        let mut accuracy = match self.store.read_model_accuracy() {
            Ok(map) => map,
            Err(e) => {
                warn!("Skipping accuracy update, read failed: {}", e);
                return Ok(());
            }
        };
        for (model, parity) in voted {
            accuracy.entry(model).or_default().record(parity == next.parity());
        }
        self.store
            .write_model_accuracy(&accuracy)
            .map_err(|e| anyhow!("accuracy write failed: {}", e))
    }
}

/// Parse a `timestamp,quote` CSV file into ticks, skipping a header row if
/// one is present.
pub fn load_ticks_csv(path: impl AsRef<Path>, pip_digits: u32) -> Result<Vec<Tick>> {
    let raw = std::fs::read_to_string(path.as_ref())
        .with_context(|| format!("Failed to read tick file {}", path.as_ref().display()))?;

    let mut ticks = Vec::new();
    for (line_no, line) in raw.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let mut fields = line.split(',');
        let (Some(ts_raw), Some(quote_raw)) = (fields.next(), fields.next()) else {
            return Err(anyhow!("line {}: expected timestamp,quote", line_no + 1));
        };
        let ts: i64 = match ts_raw.trim().parse() {
            Ok(ts) => ts,
            // Tolerate a single header row.
            Err(_) if line_no == 0 => continue,
            Err(e) => return Err(anyhow!("line {}: bad timestamp: {}", line_no + 1, e)),
        };
        let quote = Decimal::from_str_exact(quote_raw.trim())
            .map_err(|e| anyhow!("line {}: bad quote: {}", line_no + 1, e))?;
        ticks.push(Tick::from_quote(quote, pip_digits, ts));
    }

    if ticks.is_empty() {
        return Err(anyhow!("no ticks found in {}", path.as_ref().display()));
    }
    Ok(ticks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use crate::types::{ModelKind, Parity};
    use rust_decimal_macros::dec;

    fn test_config() -> EngineConfig {
        let mut config = EngineConfig::default();
        config.general.seed = Some(42);
        config.ensemble.min_confidence = 50.0;
        config
    }

    fn ticks(digits: &[u8]) -> Vec<Tick> {
        digits
            .iter()
            .enumerate()
            .map(|(i, &d)| Tick::new(d, dec!(100) + Decimal::from(d), i as i64))
            .collect()
    }

    #[tokio::test]
    async fn test_replay_settles_and_tracks_accuracy() {
        let store = Arc::new(MemoryStore::new());
        let mut replay = ReplayEngine::new(
            test_config(),
            Arc::clone(&store) as Arc<dyn StateStore>,
            ReplayConfig::default(),
        );

        let digits: Vec<u8> = (0..60).map(|i| ((i * 3) + 1) as u8 % 10).collect();
        let summary = replay.run(&ticks(&digits), None).await.unwrap();

        assert_eq!(summary.ticks, 60);
        assert_eq!(summary.decisions, 59);
        assert_eq!(summary.trades, summary.wins + summary.losses);

        // Every cycle past the warm-up has voting models, so accuracy
        // records must exist.
        let accuracy = store.read_model_accuracy().unwrap();
        assert!(accuracy.contains_key(&ModelKind::Rule));
        assert!(accuracy[&ModelKind::Rule].predictions_made > 0);
    }

    #[tokio::test]
    async fn test_replay_trains_learner_on_trades() {
        let store = Arc::new(MemoryStore::new());
        let mut config = test_config();
        // Force trades: rule model alone always votes once warmed up.
        config.models.statistical = false;
        config.models.pattern = false;
        config.models.learner = false;
        config.ensemble.ensemble_method = "vote".to_string();
        let mut replay = ReplayEngine::new(
            config,
            Arc::clone(&store) as Arc<dyn StateStore>,
            ReplayConfig::default(),
        );

        let digits: Vec<u8> = (0..40).map(|i| (i % 10) as u8).collect();
        let summary = replay.run(&ticks(&digits), None).await.unwrap();
        assert!(summary.trades > 0);

        // Settled wagers fed the learner's table even with the learner's
        // voting disabled; feedback is a separate entry point.
        let table = store.read_value_table().unwrap();
        assert!(!table.is_empty());
    }

    #[tokio::test]
    async fn test_replay_records_history_to_database() {
        let store = Arc::new(MemoryStore::new());
        let mut replay = ReplayEngine::new(
            test_config(),
            Arc::clone(&store) as Arc<dyn StateStore>,
            ReplayConfig::default(),
        );
        let db = Database::new("sqlite::memory:").await.unwrap();

        let digits: Vec<u8> = (0..50).map(|i| ((i * 7) + 2) as u8 % 10).collect();
        let summary = replay.run(&ticks(&digits), Some(&db)).await.unwrap();

        assert_eq!(db.decision_count().await.unwrap(), summary.decisions as u64);
        let (total, wins, _) = db.wager_summary().await.unwrap();
        assert_eq!(total, summary.trades as u64);
        assert_eq!(wins, summary.wins as u64);
    }

    #[tokio::test]
    async fn test_single_tick_makes_no_decision() {
        let store = Arc::new(MemoryStore::new());
        let mut replay = ReplayEngine::new(
            test_config(),
            store as Arc<dyn StateStore>,
            ReplayConfig::default(),
        );
        let summary = replay.run(&ticks(&[4]), None).await.unwrap();
        assert_eq!(summary.decisions, 0);
        assert_eq!(summary.trades, 0);
    }

    #[test]
    fn test_load_ticks_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ticks.csv");
        std::fs::write(&path, "timestamp,quote\n1000,123.45\n1001,123.52\n").unwrap();

        let ticks = load_ticks_csv(&path, 2).unwrap();
        assert_eq!(ticks.len(), 2);
        assert_eq!(ticks[0].digit, 5);
        assert_eq!(ticks[1].digit, 2);
        assert_eq!(ticks[1].timestamp, 1001);
    }

    #[test]
    fn test_load_ticks_csv_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ticks.csv");
        std::fs::write(&path, "1000,123.45\nnot-a-timestamp,9\n").unwrap();
        assert!(load_ticks_csv(&path, 2).is_err());
    }

    #[test]
    fn test_win_rate() {
        let summary = ReplaySummary {
            trades: 4,
            wins: 3,
            ..Default::default()
        };
        assert!((summary.win_rate() - 0.75).abs() < 1e-12);
    }
}

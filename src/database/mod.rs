use anyhow::Result;
use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::str::FromStr;
use tracing::info;

use crate::types::{Decision, Parity};

/// A settled wager, as recorded by the replay loop.
#[derive(Debug, Clone)]
pub struct WagerRecord {
    pub id: String,
    pub timestamp: i64,
    pub prediction: Parity,
    pub confidence: f64,
    pub stake: Decimal,
    pub pnl: Decimal,
    pub settled_digit: u8,
    pub won: bool,
}

/// SQLite history of decisions and settled wagers.
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Initialize database with schema
    pub async fn new(db_path: &str) -> Result<Self> {
        info!("Initializing SQLite database at: {}", db_path);

        let options = SqliteConnectOptions::from_str(db_path)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.create_schema().await?;

        info!("Database initialized successfully");
        Ok(db)
    }

    async fn create_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS decisions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp INTEGER NOT NULL,
                prediction TEXT,
                confidence REAL NOT NULL,
                should_trade INTEGER NOT NULL,
                reason TEXT NOT NULL,
                even_score REAL NOT NULL,
                odd_score REAL NOT NULL,
                breakdown TEXT NOT NULL,
                recorded_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_decisions_timestamp ON decisions(timestamp)
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS wagers (
                id TEXT PRIMARY KEY,
                timestamp INTEGER NOT NULL,
                prediction TEXT NOT NULL,
                confidence REAL NOT NULL,
                stake TEXT NOT NULL,
                pnl TEXT NOT NULL,
                settled_digit INTEGER NOT NULL,
                won INTEGER NOT NULL,
                recorded_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_wagers_timestamp ON wagers(timestamp)
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn insert_decision(&self, timestamp: i64, decision: &Decision) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO decisions
                (timestamp, prediction, confidence, should_trade, reason, even_score, odd_score, breakdown, recorded_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(timestamp)
        .bind(decision.final_prediction.map(|p| p.as_str()))
        .bind(decision.confidence)
        .bind(decision.should_trade as i64)
        .bind(&decision.reason)
        .bind(decision.even_score)
        .bind(decision.odd_score)
        .bind(serde_json::to_string(&decision.model_breakdown)?)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn insert_wager(&self, wager: &WagerRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO wagers
                (id, timestamp, prediction, confidence, stake, pnl, settled_digit, won, recorded_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&wager.id)
        .bind(wager.timestamp)
        .bind(wager.prediction.as_str())
        .bind(wager.confidence)
        .bind(wager.stake.to_string())
        .bind(wager.pnl.to_string())
        .bind(wager.settled_digit as i64)
        .bind(wager.won as i64)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Total wagers, wins, and net PnL over the recorded history.
    pub async fn wager_summary(&self) -> Result<(u64, u64, Decimal)> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS total, COALESCE(SUM(won), 0) AS wins FROM wagers
            "#,
        )
        .fetch_one(&self.pool)
        .await?;
        let total: i64 = row.get("total");
        let wins: i64 = row.get("wins");

        let rows = sqlx::query("SELECT pnl FROM wagers").fetch_all(&self.pool).await?;
        let mut pnl = Decimal::ZERO;
        for row in rows {
            let raw: String = row.get("pnl");
            pnl += Decimal::from_str(&raw)?;
        }

        Ok((total as u64, wins as u64, pnl))
    }

    pub async fn decision_count(&self) -> Result<u64> {
        let row = sqlx::query("SELECT COUNT(*) AS total FROM decisions")
            .fetch_one(&self.pool)
            .await?;
        let total: i64 = row.get("total");
        Ok(total as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    async fn memory_db() -> Database {
        Database::new("sqlite::memory:").await.unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_summarize_wagers() {
        let db = memory_db().await;
        let win = WagerRecord {
            id: Uuid::new_v4().to_string(),
            timestamp: 1,
            prediction: Parity::Even,
            confidence: 0.7,
            stake: dec!(10),
            pnl: dec!(9.5),
            settled_digit: 4,
            won: true,
        };
        let loss = WagerRecord {
            id: Uuid::new_v4().to_string(),
            timestamp: 2,
            prediction: Parity::Odd,
            confidence: 0.6,
            stake: dec!(10),
            pnl: dec!(-10),
            settled_digit: 2,
            won: false,
        };
        db.insert_wager(&win).await.unwrap();
        db.insert_wager(&loss).await.unwrap();

        let (total, wins, pnl) = db.wager_summary().await.unwrap();
        assert_eq!(total, 2);
        assert_eq!(wins, 1);
        assert_eq!(pnl, dec!(-0.5));
    }

    #[tokio::test]
    async fn test_insert_decision() {
        let db = memory_db().await;
        let decision = Decision::no_trade("not enough history", Vec::new());
        db.insert_decision(42, &decision).await.unwrap();
        assert_eq!(db.decision_count().await.unwrap(), 1);
    }
}

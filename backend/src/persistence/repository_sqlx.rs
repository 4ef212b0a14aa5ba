use anyhow::Context;
use async_trait::async_trait;
use sqlx::{AnyPool, Row};

use signal_engine::EngineSnapshot;

use crate::persistence::repository::{SnapshotRepository, WatchlistRepository};

/// SQLx-backed snapshot storage. The snapshot body is opaque JSON.
pub struct SqlxSnapshotRepository {
    pool: AnyPool,
}

impl SqlxSnapshotRepository {
    pub fn new(pool: AnyPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SnapshotRepository for SqlxSnapshotRepository {
    async fn save(&self, snapshot: &EngineSnapshot) -> anyhow::Result<()> {
        let body = snapshot.to_json().context("encode snapshot")?;
        let taken_at = u64_to_i64(snapshot.taken_at)?;

        sqlx::query(
            r#"
INSERT INTO engine_snapshots (id, version, taken_at, body)
VALUES (1, ?, ?, ?)
ON CONFLICT(id) DO UPDATE SET
  version = excluded.version,
  taken_at = excluded.taken_at,
  body = excluded.body;
"#,
        )
        .bind(i64::from(snapshot.version))
        .bind(taken_at)
        .bind(body)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn load_latest(&self) -> anyhow::Result<Option<EngineSnapshot>> {
        let row = sqlx::query(r#"SELECT body FROM engine_snapshots WHERE id = 1;"#)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(r) => {
                let body: String = r.get("body");
                let snapshot = EngineSnapshot::from_json(&body).context("decode snapshot")?;
                Ok(Some(snapshot))
            }
            None => Ok(None),
        }
    }
}

pub struct SqlxWatchlistRepository {
    pool: AnyPool,
}

impl SqlxWatchlistRepository {
    pub fn new(pool: AnyPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WatchlistRepository for SqlxWatchlistRepository {
    async fn load(&self) -> anyhow::Result<Vec<String>> {
        let rows = sqlx::query(r#"SELECT symbol FROM starred_symbols ORDER BY symbol;"#)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(|r| r.get::<String, _>("symbol")).collect())
    }

    async fn star(&self, symbol: &str, now_ms: u64) -> anyhow::Result<()> {
        sqlx::query(
            r#"
INSERT INTO starred_symbols (symbol, starred_at)
VALUES (?, ?)
ON CONFLICT(symbol) DO NOTHING;
"#,
        )
        .bind(symbol.to_string())
        .bind(u64_to_i64(now_ms)?)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn unstar(&self, symbol: &str) -> anyhow::Result<()> {
        sqlx::query(r#"DELETE FROM starred_symbols WHERE symbol = ?;"#)
            .bind(symbol.to_string())
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

fn u64_to_i64(v: u64) -> anyhow::Result<i64> {
    i64::try_from(v).context("timestamp out of range for BIGINT")
}

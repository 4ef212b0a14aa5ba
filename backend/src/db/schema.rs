use sqlx::AnyPool;

pub async fn migrate(pool: &AnyPool) -> anyhow::Result<()> {
    // Single-row table: the latest engine snapshot.
    sqlx::query(
        r#"
CREATE TABLE IF NOT EXISTS engine_snapshots (
  id INTEGER PRIMARY KEY CHECK (id = 1),
  version BIGINT NOT NULL,
  taken_at BIGINT NOT NULL,
  body TEXT NOT NULL
);
"#,
    )
    .execute(pool)
    .await?;

    // Watch list
    sqlx::query(
        r#"
CREATE TABLE IF NOT EXISTS starred_symbols (
  symbol TEXT PRIMARY KEY,
  starred_at BIGINT NOT NULL
);
"#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

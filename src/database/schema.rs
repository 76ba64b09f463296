use crate::database::{DatabaseError, Result};
/// Table definitions for the cache and tracking store
use sqlx::SqlitePool;

pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    // Serialized analysis responses keyed by versioned slug
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS analysis_cache (
            key TEXT PRIMARY KEY,
            payload TEXT NOT NULL,
            stored_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // One row per tracked view, timestamps in epoch milliseconds
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS candidate_hits (
            id INTEGER PRIMARY KEY,
            uf TEXT NOT NULL,
            slug TEXT NOT NULL,
            hit_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Latest known display data per tracked candidate
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS candidate_meta (
            uf TEXT NOT NULL,
            slug TEXT NOT NULL,
            nome TEXT NOT NULL,
            nome_completo TEXT NOT NULL DEFAULT '',
            partido TEXT NOT NULL,
            cargo TEXT NOT NULL,
            ano_eleicao INTEGER NOT NULL,
            situacao TEXT NOT NULL,
            total_votos INTEGER NOT NULL,
            last_access INTEGER NOT NULL,
            PRIMARY KEY (uf, slug)
        )
        "#,
    )
    .execute(pool)
    .await?;

    create_indexes(pool).await?;

    Ok(())
}

async fn create_indexes(pool: &SqlitePool) -> Result<()> {
    let indexes = vec![
        "CREATE INDEX IF NOT EXISTS idx_candidate_hits_candidate ON candidate_hits(uf, slug)",
        "CREATE INDEX IF NOT EXISTS idx_candidate_hits_time ON candidate_hits(uf, hit_at)",
    ];

    for index_sql in indexes {
        sqlx::query(index_sql).execute(pool).await?;
    }

    Ok(())
}

/// Verify every expected table exists
pub async fn verify_schema(pool: &SqlitePool) -> Result<()> {
    let tables: Vec<String> =
        sqlx::query_scalar("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .fetch_all(pool)
            .await?;

    let expected_tables = ["analysis_cache", "candidate_hits", "candidate_meta"];

    for expected in expected_tables {
        if !tables.iter().any(|name| name == expected) {
            return Err(DatabaseError::Integrity(format!(
                "Missing table: {}",
                expected
            )));
        }
    }

    Ok(())
}

/// Per-state view counts behind the trending list
use crate::analysis::AnalysisResponse;
use crate::database::{DatabaseError, Result, ServiceDatabase};
use crate::slug::normalize_uf;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

pub const HIT_RETENTION_DAYS: i64 = 365;
pub const TRENDING_WINDOW_DAYS: i64 = 30;
pub const TRENDING_LIMIT: i64 = 3;

/// Display data stored alongside the hits of a candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedCandidate {
    pub slug: String,
    /// Ballot name.
    pub nome: String,
    /// Registered full name.
    pub nome_completo: String,
    pub partido: String,
    pub cargo: String,
    pub ano_eleicao: i64,
    pub situacao: String,
    pub total_votos: i64,
}

impl TrackedCandidate {
    /// Built from the most recent analyzed contest; `None` when nothing
    /// was analyzable.
    pub fn from_response(slug: &str, response: &AnalysisResponse) -> Option<Self> {
        let latest = response.analyses.first()?;

        Some(Self {
            slug: slug.to_string(),
            nome: latest.candidate.ballot_name.clone(),
            nome_completo: latest.candidate.name.clone(),
            partido: latest.candidate.party.clone(),
            cargo: latest.office.clone(),
            ano_eleicao: latest.year as i64,
            situacao: latest.candidate.status.clone(),
            total_votos: latest.candidate.votes,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TrendingCandidate {
    pub slug: String,
    pub nome: String,
    pub nome_completo: String,
    pub partido: String,
    pub cargo: String,
    pub ano_eleicao: i64,
    pub situacao: String,
    pub total_votos: i64,
    pub acessos: i64,
}

#[derive(Clone)]
pub struct ViewTracker {
    pool: SqlitePool,
}

impl ViewTracker {
    pub fn new(db: &ServiceDatabase) -> Self {
        Self {
            pool: db.pool().clone(),
        }
    }

    /// Record one view and refresh the stored metadata. Returns the number
    /// of retained hits for the candidate.
    pub async fn record(
        &self,
        uf: &str,
        candidate: &TrackedCandidate,
        now: DateTime<Utc>,
    ) -> Result<i64> {
        let uf = normalize_uf(uf).ok_or_else(|| DatabaseError::InvalidUf(uf.to_string()))?;
        let now_ms = now.timestamp_millis();
        let retention_start = (now - Duration::days(HIT_RETENTION_DAYS)).timestamp_millis();

        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM candidate_hits WHERE hit_at <= ?")
            .bind(retention_start)
            .execute(&mut *tx)
            .await?;

        sqlx::query("INSERT INTO candidate_hits (uf, slug, hit_at) VALUES (?, ?, ?)")
            .bind(&uf)
            .bind(&candidate.slug)
            .bind(now_ms)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO candidate_meta
            (uf, slug, nome, nome_completo, partido, cargo, ano_eleicao, situacao,
             total_votos, last_access)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(uf, slug) DO UPDATE SET
                nome = excluded.nome,
                nome_completo = excluded.nome_completo,
                partido = excluded.partido,
                cargo = excluded.cargo,
                ano_eleicao = excluded.ano_eleicao,
                situacao = excluded.situacao,
                total_votos = excluded.total_votos,
                last_access = excluded.last_access
            "#,
        )
        .bind(&uf)
        .bind(&candidate.slug)
        .bind(&candidate.nome)
        .bind(&candidate.nome_completo)
        .bind(&candidate.partido)
        .bind(&candidate.cargo)
        .bind(candidate.ano_eleicao)
        .bind(&candidate.situacao)
        .bind(candidate.total_votos)
        .bind(now_ms)
        .execute(&mut *tx)
        .await?;

        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM candidate_hits WHERE uf = ? AND slug = ?")
                .bind(&uf)
                .bind(&candidate.slug)
                .fetch_one(&mut *tx)
                .await?;

        tx.commit().await?;

        Ok(count)
    }

    /// Most viewed candidates of a state over the trending window.
    /// Candidates with incomplete metadata are left out.
    pub async fn trending(&self, uf: &str, now: DateTime<Utc>) -> Result<Vec<TrendingCandidate>> {
        let uf = normalize_uf(uf).ok_or_else(|| DatabaseError::InvalidUf(uf.to_string()))?;
        let window_start = (now - Duration::days(TRENDING_WINDOW_DAYS)).timestamp_millis();

        let rows = sqlx::query_as::<_, TrendingCandidate>(
            r#"
            SELECT m.slug, m.nome,
                   COALESCE(NULLIF(m.nome_completo, ''), m.nome) AS nome_completo,
                   m.partido, m.cargo, m.ano_eleicao,
                   m.situacao, m.total_votos, COUNT(h.id) AS acessos
            FROM candidate_meta m
            JOIN candidate_hits h ON h.uf = m.uf AND h.slug = m.slug
            WHERE m.uf = ?
              AND h.hit_at > ?
              AND m.cargo <> ''
              AND m.ano_eleicao > 0
              AND m.total_votos <> 0
            GROUP BY m.uf, m.slug
            ORDER BY acessos DESC, m.slug ASC
            LIMIT ?
            "#,
        )
        .bind(&uf)
        .bind(window_start)
        .bind(TRENDING_LIMIT)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

use crate::database::{Result, ServiceDatabase};
use chrono::{DateTime, Duration, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::warn;

/// Closed elections do not change; entries stay fresh for a year.
pub const DEFAULT_MAX_AGE_SECS: i64 = 60 * 60 * 24 * 365;

/// Kinds of cached response. Each has its own key prefix, versioned
/// separately and bumped whenever that response's serialized shape changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheGroup {
    Analysis,
    Profile,
}

impl CacheGroup {
    pub const ALL: [CacheGroup; 2] = [CacheGroup::Analysis, CacheGroup::Profile];

    pub fn prefix(&self) -> &'static str {
        match self {
            CacheGroup::Analysis => "analise-eleitoral:v4",
            CacheGroup::Profile => "candidato:v13",
        }
    }
}

pub fn cache_key(group: CacheGroup, slug: &str) -> String {
    format!("{}:{}", group.prefix(), slug)
}

#[derive(Debug, PartialEq)]
pub enum CacheLookup<T> {
    Fresh(T),
    /// Older than the max age; still served while a refresh runs.
    Stale(T),
    Miss,
}

/// Computed responses cached by group and candidate slug.
#[derive(Clone)]
pub struct AnalysisCache {
    pool: SqlitePool,
    max_age: Duration,
}

impl AnalysisCache {
    pub fn new(db: &ServiceDatabase, max_age: Duration) -> Self {
        Self {
            pool: db.pool().clone(),
            max_age,
        }
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        group: CacheGroup,
        slug: &str,
        now: DateTime<Utc>,
    ) -> Result<CacheLookup<T>> {
        let row: Option<(String, i64)> =
            sqlx::query_as("SELECT payload, stored_at FROM analysis_cache WHERE key = ?")
                .bind(cache_key(group, slug))
                .fetch_optional(&self.pool)
                .await?;

        let (payload, stored_at) = match row {
            Some(row) => row,
            None => return Ok(CacheLookup::Miss),
        };

        let value: T = match serde_json::from_str(&payload) {
            Ok(value) => value,
            Err(e) => {
                warn!(slug, group = group.prefix(), error = %e, "discarding unreadable cache entry");
                return Ok(CacheLookup::Miss);
            }
        };

        if now.timestamp_millis() - stored_at > self.max_age.num_milliseconds() {
            Ok(CacheLookup::Stale(value))
        } else {
            Ok(CacheLookup::Fresh(value))
        }
    }

    pub async fn put<T: Serialize>(
        &self,
        group: CacheGroup,
        slug: &str,
        value: &T,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let payload = serde_json::to_string(value)?;

        sqlx::query(
            r#"
            INSERT INTO analysis_cache (key, payload, stored_at)
            VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                payload = excluded.payload,
                stored_at = excluded.stored_at
            "#,
        )
        .bind(cache_key(group, slug))
        .bind(payload)
        .bind(now.timestamp_millis())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Drop every cached response for one slug. Returns the keys removed.
    pub async fn invalidate(&self, slug: &str) -> Result<Vec<String>> {
        let mut keys: Vec<String> =
            sqlx::query_scalar("DELETE FROM analysis_cache WHERE key IN (?, ?) RETURNING key")
                .bind(cache_key(CacheGroup::Analysis, slug))
                .bind(cache_key(CacheGroup::Profile, slug))
                .fetch_all(&self.pool)
                .await?;
        keys.sort();

        Ok(keys)
    }

    pub async fn invalidate_all(&self) -> Result<Vec<String>> {
        let mut keys: Vec<String> = sqlx::query_scalar("DELETE FROM analysis_cache RETURNING key")
            .fetch_all(&self.pool)
            .await?;
        keys.sort();

        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::pipeline::tests::dataset;
    use crate::analysis::{analyze_candidate, candidate_profile, AnalysisResponse, CandidateProfile};

    const ANALYSIS: CacheGroup = CacheGroup::Analysis;

    async fn cache() -> AnalysisCache {
        let db = ServiceDatabase::create_in_memory().await.unwrap();
        AnalysisCache::new(&db, Duration::days(1))
    }

    async fn response() -> AnalysisResponse {
        analyze_candidate(&dataset(), "pe-maria-souza").await.unwrap()
    }

    #[test]
    fn test_keys_are_versioned_per_group() {
        assert_eq!(
            "analise-eleitoral:v4:pe-maria-souza",
            cache_key(CacheGroup::Analysis, "pe-maria-souza")
        );
        assert_eq!(
            "candidato:v13:pe-maria-souza",
            cache_key(CacheGroup::Profile, "pe-maria-souza")
        );
    }

    #[tokio::test]
    async fn test_miss() {
        let cache = cache().await;
        let lookup: CacheLookup<AnalysisResponse> =
            cache.get(ANALYSIS, "pe-ninguem", Utc::now()).await.unwrap();
        assert_eq!(CacheLookup::Miss, lookup);
    }

    #[tokio::test]
    async fn test_fresh_then_stale() {
        let cache = cache().await;
        let response = response().await;
        let stored_at = Utc::now();
        cache.put(ANALYSIS, "pe-maria-souza", &response, stored_at).await.unwrap();

        let later = stored_at + Duration::hours(23);
        assert_eq!(
            CacheLookup::Fresh(response.clone()),
            cache.get(ANALYSIS, "pe-maria-souza", later).await.unwrap()
        );

        let much_later = stored_at + Duration::days(2);
        assert_eq!(
            CacheLookup::Stale(response),
            cache.get(ANALYSIS, "pe-maria-souza", much_later).await.unwrap()
        );
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let cache = cache().await;
        let mut response = response().await;
        let first = Utc::now() - Duration::days(5);
        cache.put(ANALYSIS, "pe-maria-souza", &response, first).await.unwrap();

        response.analyses.truncate(1);
        response.summary.total_elections = 1;
        let now = Utc::now();
        cache.put(ANALYSIS, "pe-maria-souza", &response, now).await.unwrap();

        assert_eq!(
            CacheLookup::Fresh(response),
            cache.get(ANALYSIS, "pe-maria-souza", now).await.unwrap()
        );
    }

    #[tokio::test]
    async fn test_groups_do_not_collide() {
        let cache = cache().await;
        let profile = candidate_profile(&dataset(), "pe-maria-souza").await.unwrap();
        let now = Utc::now();
        cache.put(CacheGroup::Profile, "pe-maria-souza", &profile, now).await.unwrap();

        let analysis: CacheLookup<AnalysisResponse> =
            cache.get(ANALYSIS, "pe-maria-souza", now).await.unwrap();
        assert_eq!(CacheLookup::Miss, analysis);
        let lookup: CacheLookup<CandidateProfile> =
            cache.get(CacheGroup::Profile, "pe-maria-souza", now).await.unwrap();
        match lookup {
            CacheLookup::Fresh(cached) => {
                assert_eq!(profile.stats, cached.stats);
                assert_eq!(profile.elections, cached.elections);
            }
            other => panic!("expected a fresh profile, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_invalidate() {
        let cache = cache().await;
        let response = response().await;
        let profile = candidate_profile(&dataset(), "pe-maria-souza").await.unwrap();
        let now = Utc::now();
        cache.put(ANALYSIS, "pe-maria-souza", &response, now).await.unwrap();
        cache.put(CacheGroup::Profile, "pe-maria-souza", &profile, now).await.unwrap();
        cache.put(ANALYSIS, "pe-outra-pessoa", &response, now).await.unwrap();

        assert_eq!(
            vec![
                "analise-eleitoral:v4:pe-maria-souza".to_string(),
                "candidato:v13:pe-maria-souza".to_string(),
            ],
            cache.invalidate("pe-maria-souza").await.unwrap()
        );
        assert!(cache.invalidate("pe-maria-souza").await.unwrap().is_empty());
        let gone: CacheLookup<AnalysisResponse> =
            cache.get(ANALYSIS, "pe-maria-souza", now).await.unwrap();
        assert_eq!(CacheLookup::Miss, gone);
        let kept: CacheLookup<AnalysisResponse> =
            cache.get(ANALYSIS, "pe-outra-pessoa", now).await.unwrap();
        assert!(matches!(kept, CacheLookup::Fresh(_)));

        assert_eq!(
            vec!["analise-eleitoral:v4:pe-outra-pessoa".to_string()],
            cache.invalidate_all().await.unwrap()
        );
    }

    #[tokio::test]
    async fn test_unreadable_entry_is_a_miss() {
        let cache = cache().await;
        sqlx::query("INSERT INTO analysis_cache (key, payload, stored_at) VALUES (?, ?, ?)")
            .bind(cache_key(ANALYSIS, "pe-quebrado"))
            .bind("{\"analises\": 3}")
            .bind(Utc::now().timestamp_millis())
            .execute(&cache.pool)
            .await
            .unwrap();
        let lookup: CacheLookup<AnalysisResponse> =
            cache.get(ANALYSIS, "pe-quebrado", Utc::now()).await.unwrap();
        assert_eq!(CacheLookup::Miss, lookup);
    }
}

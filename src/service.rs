//! Cached analysis with view tracking, shared by the CLI and the HTTP server.
//!
//! Cache reads are stale-while-revalidate: an entry past its max age is still
//! served while a background task recomputes it. At most one revalidation
//! runs per cache key. Cache writes and view tracking never fail a request;
//! their errors are only logged.

use crate::analysis::{
    analyze_candidate, candidate_profile, AnalysisResponse, AnalysisResult, CandidateProfile,
};
use crate::database::cache::{cache_key, AnalysisCache, CacheGroup, CacheLookup};
use crate::database::tracking::{TrackedCandidate, TrendingCandidate, ViewTracker};
use crate::database;
use crate::slug::parse_candidate_slug;
use crate::source::ElectoralSource;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Stale,
    Miss,
    Bypass,
}

impl CacheStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "HIT",
            CacheStatus::Stale => "STALE",
            CacheStatus::Miss => "MISS",
            CacheStatus::Bypass => "BYPASS",
        }
    }
}

type KeySet = Arc<Mutex<HashSet<String>>>;

/// Holds a cache key in the in-flight set until dropped.
struct InFlight {
    keys: KeySet,
    key: String,
}

impl InFlight {
    /// `None` when the key is already being revalidated.
    fn claim(keys: &KeySet, key: String) -> Option<InFlight> {
        let inserted = keys
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.clone());

        if inserted {
            Some(InFlight {
                keys: Arc::clone(keys),
                key,
            })
        } else {
            None
        }
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.keys
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}

pub struct AnalysisService<S> {
    source: Arc<S>,
    cache: AnalysisCache,
    tracker: ViewTracker,
    revalidating: KeySet,
}

impl<S> Clone for AnalysisService<S> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            cache: self.cache.clone(),
            tracker: self.tracker.clone(),
            revalidating: Arc::clone(&self.revalidating),
        }
    }
}

impl<S> AnalysisService<S>
where
    S: ElectoralSource + Send + Sync + 'static,
{
    pub fn new(source: S, cache: AnalysisCache, tracker: ViewTracker) -> Self {
        Self {
            source: Arc::new(source),
            cache,
            tracker,
            revalidating: KeySet::default(),
        }
    }

    pub async fn analyze(&self, slug: &str) -> AnalysisResult<(AnalysisResponse, CacheStatus)> {
        if let Some(cached) = self.cached(CacheGroup::Analysis, slug).await {
            return Ok(cached);
        }

        let response = self.compute_analysis(slug).await?;
        Ok((response, CacheStatus::Miss))
    }

    /// Skip the cache read, recompute, and store the result.
    pub async fn refresh(&self, slug: &str) -> AnalysisResult<(AnalysisResponse, CacheStatus)> {
        let response = self.compute_analysis(slug).await?;
        Ok((response, CacheStatus::Bypass))
    }

    pub async fn profile(&self, slug: &str) -> AnalysisResult<(CandidateProfile, CacheStatus)> {
        if let Some(cached) = self.cached(CacheGroup::Profile, slug).await {
            return Ok(cached);
        }

        let profile = self.compute_profile(slug).await?;
        Ok((profile, CacheStatus::Miss))
    }

    pub async fn refresh_profile(
        &self,
        slug: &str,
    ) -> AnalysisResult<(CandidateProfile, CacheStatus)> {
        let profile = self.compute_profile(slug).await?;
        Ok((profile, CacheStatus::Bypass))
    }

    /// A fresh or stale cached value. Stale values trigger a background
    /// revalidation. Read failures count as a miss.
    async fn cached<T: DeserializeOwned>(
        &self,
        group: CacheGroup,
        slug: &str,
    ) -> Option<(T, CacheStatus)> {
        match self.cache.get(group, slug, Utc::now()).await {
            Ok(CacheLookup::Fresh(value)) => {
                debug!(slug, group = group.prefix(), "cache hit");
                Some((value, CacheStatus::Hit))
            }
            Ok(CacheLookup::Stale(value)) => {
                debug!(slug, group = group.prefix(), "serving stale entry");
                self.spawn_revalidation(group, slug);
                Some((value, CacheStatus::Stale))
            }
            Ok(CacheLookup::Miss) => None,
            Err(e) => {
                warn!(slug, error = %e, "cache read failed");
                None
            }
        }
    }

    async fn compute_analysis(&self, slug: &str) -> AnalysisResult<AnalysisResponse> {
        let response = analyze_candidate(self.source.as_ref(), slug).await?;
        self.store(CacheGroup::Analysis, slug, &response).await;
        Ok(response)
    }

    async fn compute_profile(&self, slug: &str) -> AnalysisResult<CandidateProfile> {
        let profile = candidate_profile(self.source.as_ref(), slug).await?;
        self.store(CacheGroup::Profile, slug, &profile).await;
        Ok(profile)
    }

    async fn store<T: Serialize + Sync>(&self, group: CacheGroup, slug: &str, value: &T) {
        if let Err(e) = self.cache.put(group, slug, value, Utc::now()).await {
            warn!(slug, group = group.prefix(), error = %e, "cache write failed");
        }
    }

    async fn recompute(&self, group: CacheGroup, slug: &str) -> AnalysisResult<()> {
        match group {
            CacheGroup::Analysis => self.compute_analysis(slug).await.map(|_| ()),
            CacheGroup::Profile => self.compute_profile(slug).await.map(|_| ()),
        }
    }

    /// Recompute one entry in the background. `None` when a revalidation of
    /// the same key is already running.
    fn spawn_revalidation(&self, group: CacheGroup, slug: &str) -> Option<JoinHandle<()>> {
        let key = cache_key(group, slug);
        let Some(in_flight) = InFlight::claim(&self.revalidating, key) else {
            debug!(slug, group = group.prefix(), "revalidation already running");
            return None;
        };

        let service = self.clone();
        let slug = slug.to_string();

        Some(tokio::spawn(async move {
            let _in_flight = in_flight;
            match service.recompute(group, &slug).await {
                Ok(()) => info!(slug = %slug, group = group.prefix(), "revalidated cache entry"),
                Err(e) => warn!(slug = %slug, error = %e, "revalidation failed"),
            }
        }))
    }

    /// Record a view of a successful analysis in the background. Nothing is
    /// recorded when no contest was analyzable.
    pub fn track_view(&self, slug: &str, response: &AnalysisResponse) -> Option<JoinHandle<()>> {
        let uf = parse_candidate_slug(slug).ok()?.uf;
        let candidate = TrackedCandidate::from_response(slug, response)?;
        let tracker = self.tracker.clone();

        Some(tokio::spawn(async move {
            match tracker.record(&uf, &candidate, Utc::now()).await {
                Ok(count) => debug!(slug = %candidate.slug, uf = %uf, count, "view recorded"),
                Err(e) => warn!(slug = %candidate.slug, error = %e, "view tracking failed"),
            }
        }))
    }

    pub async fn trending(&self, uf: &str) -> database::Result<Vec<TrendingCandidate>> {
        self.tracker.trending(uf, Utc::now()).await
    }

    pub async fn invalidate(&self, slug: &str) -> database::Result<Vec<String>> {
        let keys = self.cache.invalidate(slug).await?;
        info!(slug, removed = keys.len(), "cache invalidated");
        Ok(keys)
    }

    pub async fn invalidate_all(&self) -> database::Result<Vec<String>> {
        let keys = self.cache.invalidate_all().await?;
        info!(removed = keys.len(), "cache cleared");
        Ok(keys)
    }
}

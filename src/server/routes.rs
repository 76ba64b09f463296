use super::error::AppError;
use super::state::AppState;
use crate::slug::normalize_uf;
use crate::source::ElectoralSource;
use axum::{
    extract::{Path, Query, State},
    http::{header::AUTHORIZATION, HeaderMap, HeaderName},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

pub const CACHE_STATUS_HEADER: HeaderName = HeaderName::from_static("x-cache");

#[derive(Deserialize)]
pub struct SlugParams {
    slug: Option<String>,
}

impl SlugParams {
    fn required(self) -> Result<String, AppError> {
        self.slug
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or(AppError::MissingSlug)
    }
}

pub async fn analysis_handler<S>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<SlugParams>,
) -> Result<Response, AppError>
where
    S: ElectoralSource + Send + Sync + 'static,
{
    let slug = params.required()?;

    let (response, cache_status) = state.service.analyze(&slug).await?;
    state.service.track_view(&slug, &response);

    Ok(([(CACHE_STATUS_HEADER, cache_status.as_str())], Json(response)).into_response())
}

pub async fn profile_handler<S>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<SlugParams>,
) -> Result<Response, AppError>
where
    S: ElectoralSource + Send + Sync + 'static,
{
    let slug = params.required()?;
    let (profile, cache_status) = state.service.profile(&slug).await?;

    Ok(([(CACHE_STATUS_HEADER, cache_status.as_str())], Json(profile)).into_response())
}

#[derive(Deserialize)]
pub struct InvalidateParams {
    slug: Option<String>,
    all: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InvalidateResponse {
    pub success: bool,
    pub message: String,
    pub keys: Vec<String>,
}

pub async fn invalidate_handler<S>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Query(params): Query<InvalidateParams>,
) -> Result<Json<InvalidateResponse>, AppError>
where
    S: ElectoralSource + Send + Sync + 'static,
{
    if let Some(token) = &state.invalidate_token {
        let expected = format!("Bearer {}", token);
        let provided = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
        if provided != Some(expected.as_str()) {
            return Err(AppError::Unauthorized);
        }
    }

    let keys = if params.all.as_deref() == Some("true") {
        state.service.invalidate_all().await?
    } else {
        match params.slug.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(slug) => state.service.invalidate(slug).await?,
            None => return Err(AppError::MissingInvalidationTarget),
        }
    };

    Ok(Json(InvalidateResponse {
        success: true,
        message: format!("Cache invalidado: {} item(s)", keys.len()),
        keys,
    }))
}

pub async fn trending_handler<S>(
    State(state): State<Arc<AppState<S>>>,
    Path(uf): Path<String>,
) -> Result<Response, AppError>
where
    S: ElectoralSource + Send + Sync + 'static,
{
    let uf = normalize_uf(&uf).ok_or(AppError::InvalidUf(uf))?;

    // Trending is decoration; a storage failure yields an empty list.
    let trending = match state.service.trending(&uf).await {
        Ok(trending) => trending,
        Err(e) => {
            warn!(uf = %uf, error = %e, "trending lookup failed");
            Vec::new()
        }
    };

    Ok(Json(trending).into_response())
}

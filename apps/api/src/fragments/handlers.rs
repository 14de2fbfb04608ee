//! Axum route handlers for the Fragment API.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

use crate::errors::AppError;
use crate::fragments::store::CategoryCount;
use crate::knowledge::domain::Domain;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct FragmentStatsResponse {
    pub domain: Domain,
    pub available: bool,
    pub total: i64,
    pub categories: Vec<CategoryCount>,
}

/// GET /api/v1/fragments/:domain/stats
///
/// Category counts for a domain. A missing store is reported, not an error.
pub async fn handle_fragment_stats(
    State(state): State<AppState>,
    Path(domain): Path<String>,
) -> Result<Json<FragmentStatsResponse>, AppError> {
    let domain = domain
        .parse::<Domain>()
        .map_err(AppError::NotFound)?;

    let engine = state.engine();
    let stats = engine.category_stats(domain.as_str()).await;
    engine.close().await;

    let available = stats.is_some();
    let categories = stats.unwrap_or_default();
    let total = categories.iter().map(|c| c.count).sum();

    Ok(Json(FragmentStatsResponse {
        domain,
        available,
        total,
        categories,
    }))
}

//! Authority scoring handlers

use anyhow::Context;
use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::AppState;
use lexrank_authority::{
    DanglingStrategy, DocumentAuthorityScore, PageRankConfig, RunLogEntry, RunResult, TopDocument,
};
use lexrank_common::errors::{AppError, Result};

/// Optional overrides of the engine's default run configuration
#[derive(Debug, Default, Deserialize, Validate)]
pub struct CalculateRequest {
    #[validate(range(exclusive_min = 0.0, exclusive_max = 1.0))]
    pub damping_factor: Option<f64>,

    #[validate(range(min = 1, max = 10000))]
    pub max_iterations: Option<u32>,

    #[validate(range(exclusive_min = 0.0))]
    pub convergence_threshold: Option<f64>,

    pub dangling_strategy: Option<DanglingStrategy>,
}

impl CalculateRequest {
    fn apply(self, defaults: PageRankConfig) -> PageRankConfig {
        PageRankConfig {
            damping_factor: self.damping_factor.unwrap_or(defaults.damping_factor),
            max_iterations: self.max_iterations.unwrap_or(defaults.max_iterations),
            convergence_threshold: self
                .convergence_threshold
                .unwrap_or(defaults.convergence_threshold),
            dangling_strategy: self.dangling_strategy.unwrap_or(defaults.dangling_strategy),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct TopQuery {
    #[validate(range(min = 1, max = 1000))]
    #[serde(default = "default_top_limit")]
    pub limit: usize,
}

fn default_top_limit() -> usize { 20 }

#[derive(Debug, Deserialize, Validate)]
pub struct RunsQuery {
    #[validate(range(min = 1, max = 100))]
    #[serde(default = "default_runs_limit")]
    pub limit: usize,
}

fn default_runs_limit() -> usize { 20 }

#[derive(Serialize)]
pub struct TopDocumentsResponse {
    pub documents: Vec<TopDocument>,
    pub count: usize,
}

#[derive(Serialize)]
pub struct RunsResponse {
    pub runs: Vec<RunLogEntry>,
}

fn validation_error(e: validator::ValidationErrors) -> AppError {
    AppError::Validation {
        message: e.to_string(),
        field: e.field_errors().keys().next().map(|f| f.to_string()),
    }
}

/// Run PageRank over the whole corpus
pub async fn calculate(
    State(state): State<AppState>,
    request: Option<Json<CalculateRequest>>,
) -> Result<Json<RunResult>> {
    let request = request.map(|Json(r)| r).unwrap_or_default();
    request.validate().map_err(validation_error)?;

    let config = request.apply(*state.engine.defaults());

    // Detached so a dropped client connection cannot abort a run mid-write
    let engine = state.engine.clone();
    let run = tokio::spawn(async move { engine.calculate_page_rank(Some(config)).await })
        .await
        .context("PageRank task failed")??;

    Ok(Json(run))
}

/// Highest ranked documents
pub async fn top_documents(
    State(state): State<AppState>,
    Query(query): Query<TopQuery>,
) -> Result<Json<TopDocumentsResponse>> {
    query.validate().map_err(validation_error)?;

    let documents = state.engine.get_top_documents(query.limit).await?;

    Ok(Json(TopDocumentsResponse {
        count: documents.len(),
        documents,
    }))
}

/// Stored authority of one document
pub async fn get_document(
    State(state): State<AppState>,
    Path(document_id): Path<Uuid>,
) -> Result<Json<DocumentAuthorityScore>> {
    let score = state
        .engine
        .get_document_authority(document_id)
        .await?
        .ok_or_else(|| AppError::DocumentNotFound {
            id: document_id.to_string(),
        })?;

    Ok(Json(score))
}

/// Latest run log entries
pub async fn recent_runs(
    State(state): State<AppState>,
    Query(query): Query<RunsQuery>,
) -> Result<Json<RunsResponse>> {
    query.validate().map_err(validation_error)?;

    let runs = state.engine.recent_runs(query.limit).await?;
    Ok(Json(RunsResponse { runs }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_merge_with_defaults() {
        let request = CalculateRequest {
            max_iterations: Some(5),
            dangling_strategy: Some(DanglingStrategy::Redistribute),
            ..CalculateRequest::default()
        };
        let config = request.apply(PageRankConfig::default());

        assert_eq!(config.damping_factor, 0.85);
        assert_eq!(config.max_iterations, 5);
        assert_eq!(config.convergence_threshold, 0.0001);
        assert_eq!(config.dangling_strategy, DanglingStrategy::Redistribute);
    }

    #[test]
    fn test_request_bounds() {
        let request = CalculateRequest {
            damping_factor: Some(1.0),
            ..CalculateRequest::default()
        };
        assert!(request.validate().is_err());

        assert!(TopQuery { limit: 1001 }.validate().is_err());
        assert!(TopQuery { limit: 0 }.validate().is_err());
        tokio_test::assert_ok!(TopQuery { limit: 1000 }.validate());
    }
}

//! Citation validation handlers

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;
use lexrank_authority::{CitationValidity, ParsedCitation};

#[derive(Serialize)]
pub struct ValidateResponse {
    pub valid: bool,
}

#[derive(Serialize)]
pub struct ClearCacheResponse {
    pub cleared: usize,
}

/// Structural check of one parsed citation; an invalid citation is not an error
pub async fn validate(
    State(state): State<AppState>,
    Json(citation): Json<ParsedCitation>,
) -> Json<ValidateResponse> {
    Json(ValidateResponse {
        valid: state.validator.validate(&citation),
    })
}

/// Cached validity record of a citation
pub async fn check_validity(
    State(state): State<AppState>,
    Json(citation): Json<ParsedCitation>,
) -> Json<CitationValidity> {
    Json(state.validator.check_validity(&citation))
}

/// Drop every cached validity decision
pub async fn clear_cache(State(state): State<AppState>) -> Json<ClearCacheResponse> {
    let cleared = state.validator.cache_len();
    state.validator.clear_cache();
    Json(ClearCacheResponse { cleared })
}

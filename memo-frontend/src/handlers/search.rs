//! Debounced catalog search handlers.
//!
//! Each request runs through the session's search lane: the debounce window
//! settles first, a newer query supersedes an older in-flight one, and a
//! stale response is discarded rather than surfaced. A failed upstream call
//! degrades to an empty list with a notice, never stale data.

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use memo_core::search::SearchOutcome;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::dtos::{SearchQuery, SearchResponse, SearchStatus};
use crate::error::AppError;
use crate::middleware::tracing::RequestId;
use crate::services::farm_api::{CounterpartyHit, CounterpartyKind, FarmApiError, ProductHit};
use crate::startup::{AppState, SearchLanes};

fn lanes_for(state: &AppState, memo_id: Uuid) -> Result<Arc<SearchLanes>, AppError> {
    state
        .sessions
        .get(&memo_id)
        .map(|entry| entry.lanes.clone())
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("no open memo session {memo_id}")))
}

fn into_response<T: Serialize>(
    outcome: Result<SearchOutcome<T>, FarmApiError>,
) -> Json<SearchResponse<T>> {
    match outcome {
        Ok(SearchOutcome::Results(data)) => Json(SearchResponse::results(data)),
        Ok(SearchOutcome::TooShort) => Json(SearchResponse::empty(SearchStatus::TooShort)),
        Ok(SearchOutcome::Superseded) => Json(SearchResponse::empty(SearchStatus::Superseded)),
        Err(err) => {
            tracing::warn!(error = %err, "Catalog search failed, returning empty result set");
            Json(SearchResponse::failed(err.to_string()))
        }
    }
}

pub async fn search_products(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(memo_id): Path<Uuid>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchResponse<ProductHit>>, AppError> {
    let lanes = lanes_for(&state, memo_id)?;
    let api = state.api.clone();
    let outcome = lanes
        .products
        .run(&query.q, move |settled| async move {
            api.search_products(&settled, Some(&request_id.0)).await
        })
        .await;
    Ok(into_response(outcome))
}

async fn search_counterparty(
    state: AppState,
    request_id: RequestId,
    memo_id: Uuid,
    query: SearchQuery,
    kind: CounterpartyKind,
) -> Result<Json<SearchResponse<CounterpartyHit>>, AppError> {
    let lanes = lanes_for(&state, memo_id)?;
    let lane = match kind {
        CounterpartyKind::Customer => &lanes.customers,
        CounterpartyKind::Supplier => &lanes.suppliers,
    };
    let api = state.api.clone();
    let outcome = lane
        .run(&query.q, move |settled| async move {
            api.search_counterparties(kind, &settled, Some(&request_id.0))
                .await
        })
        .await;
    Ok(into_response(outcome))
}

pub async fn search_customers(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(memo_id): Path<Uuid>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchResponse<CounterpartyHit>>, AppError> {
    search_counterparty(state, request_id, memo_id, query, CounterpartyKind::Customer).await
}

pub async fn search_suppliers(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(memo_id): Path<Uuid>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchResponse<CounterpartyHit>>, AppError> {
    search_counterparty(state, request_id, memo_id, query, CounterpartyKind::Supplier).await
}

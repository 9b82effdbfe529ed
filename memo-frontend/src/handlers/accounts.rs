//! Payment account handlers.

use axum::{
    extract::{Extension, Query, State},
    http::StatusCode,
    Json,
};
use memo_core::reconcile::PaymentMethod;
use serde::Deserialize;

use crate::dtos::{AccountListResponse, CreateAccountRequest};
use crate::error::AppError;
use crate::middleware::tracing::RequestId;
use crate::startup::AppState;
use crate::utils::validation::ValidatedJson;

#[derive(Debug, Deserialize)]
pub struct AccountFilter {
    /// Restrict to accounts of one payment method.
    #[serde(default)]
    pub method: Option<String>,
}

/// List payment accounts, optionally filtered by method.
pub async fn list_accounts(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Query(filter): Query<AccountFilter>,
) -> Result<Json<AccountListResponse>, AppError> {
    let method = match filter.method.as_deref() {
        None | Some("") => None,
        Some(name) => Some(PaymentMethod::from_str(name).ok_or_else(|| {
            AppError::BadRequest(anyhow::anyhow!(
                "payment method must be cash, bank, or mobile, got '{name}'"
            ))
        })?),
    };

    let mut accounts = state
        .api
        .payment_accounts(Some(&request_id.0))
        .await
        .map_err(|e| AppError::Upstream(e.to_string()))?;

    if let Some(method) = method {
        accounts.retain(|account| account.account_type == method);
    }

    Ok(Json(AccountListResponse { data: accounts }))
}

/// Create a payment account from a structured, validated request.
///
/// Required fields are checked per account type before anything reaches the
/// farm API; the legacy flow collected them through blocking browser dialogs.
pub async fn create_account(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    ValidatedJson(payload): ValidatedJson<CreateAccountRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    let body = serde_json::to_value(&payload)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("serialize account request: {e}")))?;

    let created = state
        .api
        .create_payment_account(&body, Some(&request_id.0))
        .await
        .map_err(|e| AppError::Upstream(e.to_string()))?;

    tracing::info!(account_type = %payload.account_type, "Payment account created");

    Ok((StatusCode::CREATED, Json(created)))
}

//! Memo session handlers.
//!
//! Each handler is a thin view over the session engine: it resolves the
//! session, applies one operation, and returns the refreshed memo view. The
//! session lock is never held across a farm API call.

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use memo_core::error::{LedgerError, SessionError};
use memo_core::reconcile::PaymentMethod;
use memo_core::session::{MemoSession, MemoSide};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::dtos::{
    AddLineRequest, AddLineResponse, CreateMemoRequest, MemoView, PaymentUpdateRequest,
    SelectCounterpartyRequest, SubmitRequest, SubmitResponse, UpdateLineRequest,
};
use crate::error::AppError;
use crate::middleware::tracing::RequestId;
use crate::services::metrics::record_submission;
use crate::startup::{AppState, SessionEntry};

fn memo_not_found(memo_id: Uuid) -> AppError {
    AppError::NotFound(anyhow::anyhow!("no open memo session {memo_id}"))
}

/// Open a new memo session for one form.
pub async fn create_memo(
    State(state): State<AppState>,
    Json(payload): Json<CreateMemoRequest>,
) -> Result<(StatusCode, Json<MemoView>), AppError> {
    let side = MemoSide::from_str(&payload.side).ok_or_else(|| {
        AppError::BadRequest(anyhow::anyhow!(
            "side must be 'sale' or 'purchase', got '{}'",
            payload.side
        ))
    })?;

    let session = MemoSession::new(side);
    let memo_id = session.memo_id();
    let view = MemoView::from(&session);
    state
        .sessions
        .insert(memo_id, SessionEntry::new(session, &state.settings.search));

    tracing::info!(memo_id = %memo_id, side = %side, "Opened memo session");

    Ok((StatusCode::CREATED, Json(view)))
}

pub async fn get_memo(
    State(state): State<AppState>,
    Path(memo_id): Path<Uuid>,
) -> Result<Json<MemoView>, AppError> {
    let entry = state
        .sessions
        .get(&memo_id)
        .ok_or_else(|| memo_not_found(memo_id))?;
    Ok(Json(MemoView::from(&entry.session)))
}

/// Abandon a session. Any in-flight search or submission response for it is
/// discarded when it eventually lands.
pub async fn abandon_memo(
    State(state): State<AppState>,
    Path(memo_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state
        .sessions
        .remove(&memo_id)
        .ok_or_else(|| memo_not_found(memo_id))?;
    tracing::info!(memo_id = %memo_id, "Abandoned memo session");
    Ok(StatusCode::NO_CONTENT)
}

/// Add a catalog line to the memo.
///
/// Sale memos consult the stock level first; below-1 stock needs an explicit
/// `confirm_low_stock` before the add proceeds. A duplicate product comes
/// back as a warning, never an error, with the memo unchanged.
pub async fn add_line(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(memo_id): Path<Uuid>,
    Json(payload): Json<AddLineRequest>,
) -> Result<Json<AddLineResponse>, AppError> {
    // First pass under the lock: duplicate short-circuit before any fetch.
    let side = {
        let entry = state
            .sessions
            .get(&memo_id)
            .ok_or_else(|| memo_not_found(memo_id))?;
        if entry.session.ledger().contains(&payload.product_id) {
            return Ok(Json(AddLineResponse {
                added: false,
                warning: Some(format!(
                    "'{}' is already on this memo",
                    payload.display_name
                )),
                requires_confirmation: false,
                available_stock: None,
                memo: MemoView::from(&entry.session),
            }));
        }
        entry.session.side()
    };

    // Stock is a sale-side display aid; a failed lookup means "unknown" and
    // never blocks the add.
    let available_stock = match side {
        MemoSide::Sale => {
            state
                .api
                .stock_level(&payload.product_id, Some(&request_id.0))
                .await
        }
        MemoSide::Purchase => None,
    };

    let low_stock = available_stock
        .map(|stock| stock < Decimal::ONE)
        .unwrap_or(false);

    let mut entry = state
        .sessions
        .get_mut(&memo_id)
        .ok_or_else(|| memo_not_found(memo_id))?;

    if low_stock && !payload.confirm_low_stock {
        return Ok(Json(AddLineResponse {
            added: false,
            warning: Some(format!(
                "'{}' has {} in stock; confirm to sell anyway",
                payload.display_name,
                available_stock.unwrap_or(Decimal::ZERO)
            )),
            requires_confirmation: true,
            available_stock,
            memo: MemoView::from(&entry.session),
        }));
    }

    let unit_price = payload.default_price(side);
    match entry.session.add_line(
        &payload.product_id,
        &payload.display_name,
        unit_price,
        available_stock,
    ) {
        Ok(()) => Ok(Json(AddLineResponse {
            added: true,
            warning: None,
            requires_confirmation: false,
            available_stock,
            memo: MemoView::from(&entry.session),
        })),
        Err(SessionError::Ledger(LedgerError::DuplicateLine { .. })) => {
            Ok(Json(AddLineResponse {
                added: false,
                warning: Some(format!(
                    "'{}' is already on this memo",
                    payload.display_name
                )),
                requires_confirmation: false,
                available_stock,
                memo: MemoView::from(&entry.session),
            }))
        }
        Err(err) => Err(err.into()),
    }
}

pub async fn update_line(
    State(state): State<AppState>,
    Path((memo_id, product_id)): Path<(Uuid, String)>,
    Json(payload): Json<UpdateLineRequest>,
) -> Result<Json<MemoView>, AppError> {
    if payload.quantity.is_none() && payload.unit_price.is_none() {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "provide quantity and/or unit_price"
        )));
    }

    let mut entry = state
        .sessions
        .get_mut(&memo_id)
        .ok_or_else(|| memo_not_found(memo_id))?;

    if let Some(quantity) = payload.quantity {
        entry.session.update_quantity(&product_id, quantity)?;
    }
    if let Some(unit_price) = payload.unit_price {
        entry.session.update_price(&product_id, unit_price)?;
    }

    Ok(Json(MemoView::from(&entry.session)))
}

pub async fn remove_line(
    State(state): State<AppState>,
    Path((memo_id, product_id)): Path<(Uuid, String)>,
) -> Result<Json<MemoView>, AppError> {
    let mut entry = state
        .sessions
        .get_mut(&memo_id)
        .ok_or_else(|| memo_not_found(memo_id))?;
    entry.session.remove_line(&product_id)?;
    Ok(Json(MemoView::from(&entry.session)))
}

pub async fn select_counterparty(
    State(state): State<AppState>,
    Path(memo_id): Path<Uuid>,
    Json(payload): Json<SelectCounterpartyRequest>,
) -> Result<Json<MemoView>, AppError> {
    let mut entry = state
        .sessions
        .get_mut(&memo_id)
        .ok_or_else(|| memo_not_found(memo_id))?;
    entry.session.select_counterparty(payload.into_domain())?;
    Ok(Json(MemoView::from(&entry.session)))
}

pub async fn clear_counterparty(
    State(state): State<AppState>,
    Path(memo_id): Path<Uuid>,
) -> Result<Json<MemoView>, AppError> {
    let mut entry = state
        .sessions
        .get_mut(&memo_id)
        .ok_or_else(|| memo_not_found(memo_id))?;
    entry.session.clear_counterparty()?;
    Ok(Json(MemoView::from(&entry.session)))
}

/// Update the payment selection and/or the amount paid.
///
/// A method change always goes through the session so the account pairing
/// invariant holds: the old account is cleared, and a sole default account
/// of the new method is pre-selected.
pub async fn update_payment(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(memo_id): Path<Uuid>,
    Json(payload): Json<PaymentUpdateRequest>,
) -> Result<Json<MemoView>, AppError> {
    // Fetch reference accounts only when the payment pairing is changing.
    let accounts = if payload.method.is_some() || payload.account_id.is_some() {
        state
            .api
            .payment_accounts(Some(&request_id.0))
            .await
            .map_err(|e| AppError::Upstream(e.to_string()))?
    } else {
        Vec::new()
    };

    let mut entry = state
        .sessions
        .get_mut(&memo_id)
        .ok_or_else(|| memo_not_found(memo_id))?;

    if let Some(method) = &payload.method {
        let method = match method.trim() {
            "" | "none" => None,
            name => Some(PaymentMethod::from_str(name).ok_or_else(|| {
                AppError::BadRequest(anyhow::anyhow!(
                    "payment method must be cash, bank, or mobile, got '{name}'"
                ))
            })?),
        };
        entry.session.set_payment_method(method, &accounts)?;
    }

    if let Some(account_id) = &payload.account_id {
        entry.session.set_payment_account(account_id, &accounts)?;
    }

    if let Some(paid_amount) = payload.paid_amount {
        entry.session.set_paid_amount(paid_amount)?;
    }

    Ok(Json(MemoView::from(&entry.session)))
}

/// Validate, package, and forward the memo to the farm API.
///
/// The session flips to `Submitting` before the upstream call and the lock
/// is released for its duration, so edits and duplicate submits are rejected
/// structurally while the request is in flight.
pub async fn submit_memo(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(memo_id): Path<Uuid>,
    payload: Option<Json<SubmitRequest>>,
) -> Result<Json<SubmitResponse>, AppError> {
    let date = payload
        .and_then(|Json(request)| request.date)
        .unwrap_or_else(|| chrono::Utc::now().date_naive());

    // Phase 1: validate and flip to Submitting under the lock.
    let (side, submission) = {
        let mut entry = state
            .sessions
            .get_mut(&memo_id)
            .ok_or_else(|| memo_not_found(memo_id))?;
        let submission = entry.session.begin_submit(date)?;
        (entry.session.side(), submission)
    };

    // Phase 2: the upstream call, with no session lock held.
    let result = state
        .api
        .submit_memo(side, &submission, Some(&request_id.0))
        .await;

    // Phase 3: record the outcome. The session may have been abandoned while
    // the request was in flight; if so the response is discarded, not retried.
    let mut entry = match state.sessions.get_mut(&memo_id) {
        Some(entry) => entry,
        None => {
            tracing::info!(memo_id = %memo_id, "Memo abandoned during submission; discarding result");
            record_submission(side.as_str(), "abandoned");
            return Err(memo_not_found(memo_id));
        }
    };

    match result {
        Ok(ack) if ack.success => {
            entry.session.complete_submit();
            record_submission(side.as_str(), "submitted");
            tracing::info!(memo_id = %memo_id, side = %side, "Memo submitted");
            Ok(Json(SubmitResponse {
                success: true,
                message: ack.message,
                memo_ref: ack.memo_id,
                memo: MemoView::from(&entry.session),
            }))
        }
        Ok(ack) => {
            let message = ack
                .message
                .unwrap_or_else(|| "memo submission failed".to_string());
            entry.session.fail_submit(&message);
            record_submission(side.as_str(), "failed");
            tracing::warn!(memo_id = %memo_id, message = %message, "Farm API rejected memo");
            Err(AppError::Upstream(message))
        }
        Err(err) => {
            let message = err.to_string();
            entry.session.fail_submit(&message);
            record_submission(side.as_str(), "failed");
            tracing::warn!(memo_id = %memo_id, error = %message, "Memo submission failed");
            Err(AppError::Upstream(message))
        }
    }
}

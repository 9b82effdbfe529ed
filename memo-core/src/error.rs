//! Error taxonomy for the memo engine.

use serde::Serialize;
use thiserror::Error;

use crate::reconcile::PaymentMethod;
use crate::session::SessionState;

/// Errors raised by ledger mutations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LedgerError {
    /// The item is already on the memo. Non-fatal: callers surface this as a
    /// warning and leave the ledger untouched.
    #[error("'{item_id}' is already on this memo")]
    DuplicateLine { item_id: String },

    #[error("no line for item '{item_id}' on this memo")]
    UnknownLine { item_id: String },
}

/// One pre-submission validation failure, scoped to the field that caused it.
///
/// Failures are reported individually, never batched into a single generic
/// message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationFailure {
    pub field: String,
    pub message: String,
}

impl ValidationFailure {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Errors raised by memo session operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Mutation attempted while the session is not editable.
    #[error("memo is {state} and cannot be edited")]
    NotEditable { state: SessionState },

    /// A submission for this memo is already in flight.
    #[error("memo submission is already in progress")]
    SubmitInFlight,

    /// Pre-submission validation failed; no network call was made.
    #[error("memo failed validation")]
    Validation(Vec<ValidationFailure>),

    #[error("select a payment method before choosing an account")]
    MethodNotSet,

    #[error("unknown payment account '{account_id}'")]
    UnknownAccount { account_id: String },

    /// The chosen account does not belong to the selected payment method.
    #[error("account '{account_id}' is not a {method} account")]
    AccountMethodMismatch {
        account_id: String,
        method: PaymentMethod,
    },
}

//! Contracts for the payment-account surface.

use memo_core::reconcile::PaymentAccount;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

#[derive(Debug, Serialize)]
pub struct AccountListResponse {
    pub data: Vec<PaymentAccount>,
}

/// Structured replacement for the legacy prompt-dialog account creation:
/// required fields are validated here, before anything reaches the farm API.
#[derive(Debug, Deserialize, Serialize, Validate)]
#[validate(schema(function = "validate_account_fields"))]
pub struct CreateAccountRequest {
    /// "cash" | "bank" | "mobile".
    #[validate(length(min = 1, message = "account type is required"))]
    pub account_type: String,
    #[validate(length(min = 1, message = "account name is required"))]
    pub account_name: String,
    #[serde(default)]
    pub bank_name: Option<String>,
    #[serde(default)]
    pub account_number: Option<String>,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub wallet_number: Option<String>,
    #[serde(default)]
    pub is_default: bool,
}

fn non_empty(value: &Option<String>) -> bool {
    value.as_deref().map(|s| !s.trim().is_empty()).unwrap_or(false)
}

fn field_error(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(message.into());
    error
}

fn validate_account_fields(request: &CreateAccountRequest) -> Result<(), ValidationError> {
    match request.account_type.as_str() {
        "cash" => Ok(()),
        "bank" => {
            if !non_empty(&request.bank_name) {
                return Err(field_error(
                    "bank_name_required",
                    "bank name is required for bank accounts",
                ));
            }
            if !non_empty(&request.account_number) {
                return Err(field_error(
                    "account_number_required",
                    "account number is required for bank accounts",
                ));
            }
            Ok(())
        }
        "mobile" => {
            if !non_empty(&request.provider) {
                return Err(field_error(
                    "provider_required",
                    "wallet provider is required for mobile accounts",
                ));
            }
            if !non_empty(&request.wallet_number) {
                return Err(field_error(
                    "wallet_number_required",
                    "wallet number is required for mobile accounts",
                ));
            }
            Ok(())
        }
        _ => Err(field_error(
            "unknown_account_type",
            "account type must be cash, bank, or mobile",
        )),
    }
}

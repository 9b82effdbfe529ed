//! Payment selection and balance reconciliation.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::SessionError;
use crate::money::round2;

/// Payment channel for settling a memo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    Bank,
    Mobile,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Bank => "bank",
            PaymentMethod::Mobile => "mobile",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "cash" => Some(PaymentMethod::Cash),
            "bank" => Some(PaymentMethod::Bank),
            "mobile" => Some(PaymentMethod::Mobile),
            _ => None,
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A payment account owned by the farm API, referenced read-only by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentAccount {
    pub id: String,
    pub account_type: PaymentMethod,
    pub is_default: bool,
    pub balance: Decimal,
    /// Type-specific display name (bank name, wallet provider, "Cash box").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// The method/account pair a memo will settle through.
///
/// The pairing invariant — `account_id` always references an account whose
/// type matches `method` — is maintained by [`PaymentSelection::set_method`]
/// and [`PaymentSelection::set_account`]; nothing else writes these fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentSelection {
    pub method: Option<PaymentMethod>,
    pub account_id: Option<String>,
}

impl PaymentSelection {
    /// Switch payment methods.
    ///
    /// The previous account never survives a method change; if the new
    /// method has exactly one account flagged default, it is pre-selected.
    pub fn set_method(&mut self, method: Option<PaymentMethod>, accounts: &[PaymentAccount]) {
        if self.method == method {
            return;
        }
        self.method = method;
        self.account_id = None;

        if let Some(method) = method {
            let mut defaults = accounts
                .iter()
                .filter(|account| account.account_type == method && account.is_default);
            if let (Some(first), None) = (defaults.next(), defaults.next()) {
                self.account_id = Some(first.id.clone());
            }
        }
    }

    /// Point the selection at a specific account of the current method.
    pub fn set_account(
        &mut self,
        account_id: &str,
        accounts: &[PaymentAccount],
    ) -> Result<(), SessionError> {
        let method = self.method.ok_or(SessionError::MethodNotSet)?;
        let account = accounts
            .iter()
            .find(|account| account.id == account_id)
            .ok_or_else(|| SessionError::UnknownAccount {
                account_id: account_id.to_string(),
            })?;
        if account.account_type != method {
            return Err(SessionError::AccountMethodMismatch {
                account_id: account_id.to_string(),
                method,
            });
        }
        self.account_id = Some(account.id.clone());
        Ok(())
    }
}

/// Outcome of settling a memo total against the amount paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReconciliationResult {
    pub grand_total: Decimal,
    pub paid_amount: Decimal,
    /// Signed remainder: positive is still owed, negative is credit created
    /// by an overpayment.
    pub due: Decimal,
}

impl ReconciliationResult {
    /// Presentation label for the signed `due` figure.
    pub fn label(&self) -> &'static str {
        if self.due.is_sign_negative() && !self.due.is_zero() {
            "Credit"
        } else {
            "Due"
        }
    }
}

/// Settle a grand total against the amount paid. Overpayment is allowed and
/// yields a negative due (a credit).
pub fn reconcile(grand_total: Decimal, paid_amount: Decimal) -> ReconciliationResult {
    ReconciliationResult {
        grand_total,
        paid_amount,
        due: round2(grand_total - paid_amount),
    }
}

/// Standing balance of a counterparty prior to the current memo.
pub fn net_balance(prior_due: Decimal, prior_advance: Decimal) -> Decimal {
    round2(prior_due - prior_advance)
}

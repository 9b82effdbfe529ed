//! Memo session: the single controller behind every open memo form.
//!
//! The source of record for one purchase or sale in progress. All mutation
//! goes through methods that enforce the session lifecycle, so every thin
//! view over the session sees the same invariants.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{SessionError, ValidationFailure};
use crate::ledger::Ledger;
use crate::money::{clamp_non_negative, round2};
use crate::reconcile::{
    net_balance, reconcile, PaymentAccount, PaymentMethod, PaymentSelection, ReconciliationResult,
};

/// Which side of the trade this memo records.
///
/// Fixes the sign convention for due/advance figures instead of inferring it
/// from context: for [`MemoSide::Sale`] a positive balance is owed by the
/// customer to the farm; for [`MemoSide::Purchase`] a positive balance is
/// owed by the farm to the supplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoSide {
    Sale,
    Purchase,
}

impl MemoSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemoSide::Sale => "sale",
            MemoSide::Purchase => "purchase",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "sale" => Some(MemoSide::Sale),
            "purchase" => Some(MemoSide::Purchase),
            _ => None,
        }
    }
}

impl std::fmt::Display for MemoSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lifecycle of a memo form session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Empty,
    Editing,
    Submitting,
    Submitted,
    Failed,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Empty => "empty",
            SessionState::Editing => "editing",
            SessionState::Submitting => "submitting",
            SessionState::Submitted => "submitted",
            SessionState::Failed => "failed",
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Customer or supplier identified for this memo, with the server-side
/// standing captured at selection time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counterparty {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    /// Amount outstanding prior to this memo.
    #[serde(default)]
    pub due: Decimal,
    /// Prior credit balance, reducing future due.
    #[serde(default)]
    pub advance: Decimal,
}

impl Counterparty {
    /// Standing balance: `due - advance`, sign interpreted per memo side.
    pub fn net_balance(&self) -> Decimal {
        net_balance(self.due, self.advance)
    }
}

/// One line of the wire payload sent to the farm API on submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionLine {
    pub product_id: String,
    pub qty: Decimal,
    pub price: Decimal,
    pub subtotal: Decimal,
}

/// Wire payload for `POST /sales/create` and `POST /purchases`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemoSubmission {
    pub counterparty_id: String,
    pub products: Vec<SubmissionLine>,
    pub total_amount: Decimal,
    pub paid_amount: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    pub payment_due: Decimal,
    pub date: NaiveDate,
}

/// One memo form in progress. Owned exclusively by a single open form;
/// discarded once submitted or abandoned.
#[derive(Debug, Clone, Serialize)]
pub struct MemoSession {
    memo_id: Uuid,
    side: MemoSide,
    ledger: Ledger,
    counterparty: Option<Counterparty>,
    payment: PaymentSelection,
    paid_amount: Decimal,
    state: SessionState,
    last_error: Option<String>,
}

impl MemoSession {
    pub fn new(side: MemoSide) -> Self {
        Self {
            memo_id: Uuid::new_v4(),
            side,
            ledger: Ledger::new(),
            counterparty: None,
            payment: PaymentSelection::default(),
            paid_amount: Decimal::ZERO,
            state: SessionState::Empty,
            last_error: None,
        }
    }

    pub fn memo_id(&self) -> Uuid {
        self.memo_id
    }

    pub fn side(&self) -> MemoSide {
        self.side
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn counterparty(&self) -> Option<&Counterparty> {
        self.counterparty.as_ref()
    }

    pub fn payment(&self) -> &PaymentSelection {
        &self.payment
    }

    pub fn paid_amount(&self) -> Decimal {
        self.paid_amount
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Current settlement of the ledger total against the amount paid.
    pub fn reconciliation(&self) -> ReconciliationResult {
        reconcile(self.ledger.grand_total(), self.paid_amount)
    }

    fn ensure_editable(&self) -> Result<(), SessionError> {
        match self.state {
            SessionState::Empty | SessionState::Editing | SessionState::Failed => Ok(()),
            state => Err(SessionError::NotEditable { state }),
        }
    }

    fn mark_edited(&mut self) {
        self.state = SessionState::Editing;
        self.last_error = None;
    }

    /// Add a catalog line with quantity 1 at the given default price.
    ///
    /// A duplicate item is rejected without touching the session; the caller
    /// surfaces the duplicate as a warning.
    pub fn add_line(
        &mut self,
        item_id: &str,
        display_name: &str,
        default_price: Decimal,
        available_stock: Option<Decimal>,
    ) -> Result<(), SessionError> {
        self.ensure_editable()?;
        self.ledger
            .add_line(item_id, display_name, default_price, available_stock)?;
        self.mark_edited();
        Ok(())
    }

    pub fn update_quantity(&mut self, item_id: &str, quantity: Decimal) -> Result<(), SessionError> {
        self.ensure_editable()?;
        self.ledger.update_quantity(item_id, quantity)?;
        self.mark_edited();
        Ok(())
    }

    pub fn update_price(&mut self, item_id: &str, unit_price: Decimal) -> Result<(), SessionError> {
        self.ensure_editable()?;
        self.ledger.update_price(item_id, unit_price)?;
        self.mark_edited();
        Ok(())
    }

    pub fn remove_line(&mut self, item_id: &str) -> Result<(), SessionError> {
        self.ensure_editable()?;
        self.ledger.remove_line(item_id);
        self.mark_edited();
        Ok(())
    }

    /// Replace the session's counterparty with a fresh server-side snapshot.
    pub fn select_counterparty(&mut self, counterparty: Counterparty) -> Result<(), SessionError> {
        self.ensure_editable()?;
        self.counterparty = Some(counterparty);
        self.mark_edited();
        Ok(())
    }

    /// Explicit clear, distinguishable from "never selected".
    pub fn clear_counterparty(&mut self) -> Result<(), SessionError> {
        self.ensure_editable()?;
        self.counterparty = None;
        self.mark_edited();
        Ok(())
    }

    /// Switch payment methods; see [`PaymentSelection::set_method`].
    pub fn set_payment_method(
        &mut self,
        method: Option<PaymentMethod>,
        accounts: &[PaymentAccount],
    ) -> Result<(), SessionError> {
        self.ensure_editable()?;
        self.payment.set_method(method, accounts);
        self.mark_edited();
        Ok(())
    }

    pub fn set_payment_account(
        &mut self,
        account_id: &str,
        accounts: &[PaymentAccount],
    ) -> Result<(), SessionError> {
        self.ensure_editable()?;
        self.payment.set_account(account_id, accounts)?;
        self.mark_edited();
        Ok(())
    }

    pub fn set_paid_amount(&mut self, amount: Decimal) -> Result<(), SessionError> {
        self.ensure_editable()?;
        self.paid_amount = round2(clamp_non_negative(amount));
        self.mark_edited();
        Ok(())
    }

    /// Field-scoped pre-submission checks. Empty means the memo may submit.
    pub fn validate_for_submit(&self) -> Vec<ValidationFailure> {
        let mut failures = Vec::new();

        if self.counterparty.is_none() {
            let who = match self.side {
                MemoSide::Sale => "customer",
                MemoSide::Purchase => "supplier",
            };
            failures.push(ValidationFailure::new(
                "counterparty",
                format!("select a {who} for this memo"),
            ));
        }

        if self.ledger.is_empty() {
            failures.push(ValidationFailure::new("lines", "add at least one product"));
        }

        if self.paid_amount > Decimal::ZERO {
            if self.payment.method.is_none() {
                failures.push(ValidationFailure::new(
                    "payment_method",
                    "select a payment method for the amount paid",
                ));
            } else if self.payment.account_id.is_none() {
                failures.push(ValidationFailure::new(
                    "payment_account",
                    "select a payment account for the amount paid",
                ));
            }
        }

        failures
    }

    /// Validate, flip to `Submitting`, and produce the wire payload.
    ///
    /// Validation failures block before any network call and leave the
    /// session untouched.
    pub fn begin_submit(&mut self, date: NaiveDate) -> Result<MemoSubmission, SessionError> {
        match self.state {
            SessionState::Submitting => return Err(SessionError::SubmitInFlight),
            SessionState::Submitted => {
                return Err(SessionError::NotEditable { state: self.state })
            }
            _ => {}
        }

        let failures = self.validate_for_submit();
        if !failures.is_empty() {
            return Err(SessionError::Validation(failures));
        }
        let counterparty = match &self.counterparty {
            Some(counterparty) => counterparty,
            None => {
                return Err(SessionError::Validation(vec![ValidationFailure::new(
                    "counterparty",
                    "select a counterparty for this memo",
                )]))
            }
        };

        let reconciliation = self.reconciliation();
        let submission = MemoSubmission {
            counterparty_id: counterparty.id.clone(),
            products: self
                .ledger
                .lines()
                .iter()
                .map(|line| SubmissionLine {
                    product_id: line.item_id.clone(),
                    qty: line.quantity,
                    price: line.unit_price,
                    subtotal: line.subtotal,
                })
                .collect(),
            total_amount: reconciliation.grand_total,
            paid_amount: reconciliation.paid_amount,
            payment_method: self.payment.method.map(|m| m.as_str().to_string()),
            account_id: self.payment.account_id.clone(),
            payment_due: reconciliation.due,
            date,
        };

        self.state = SessionState::Submitting;
        self.last_error = None;
        Ok(submission)
    }

    /// The farm API accepted the memo; the session is terminal.
    pub fn complete_submit(&mut self) {
        self.state = SessionState::Submitted;
        self.last_error = None;
    }

    /// The farm API rejected the memo or the call failed. Everything the
    /// user entered stays intact and the message is surfaced.
    pub fn fail_submit(&mut self, message: impl Into<String>) {
        self.state = SessionState::Failed;
        self.last_error = Some(message.into());
    }
}

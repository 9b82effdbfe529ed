//! Request and response contracts for the memo session surface.

use chrono::NaiveDate;
use memo_core::ledger::LineItem;
use memo_core::reconcile::PaymentMethod;
use memo_core::session::{Counterparty, MemoSession, MemoSide, SessionState};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::utils::lenient_decimal_opt;

#[derive(Debug, Deserialize)]
pub struct CreateMemoRequest {
    pub side: String,
}

#[derive(Debug, Deserialize)]
pub struct AddLineRequest {
    #[serde(deserialize_with = "crate::utils::opaque_id")]
    pub product_id: String,
    pub display_name: String,
    /// Sale price from the catalog hit.
    #[serde(default, deserialize_with = "lenient_decimal_opt")]
    pub price: Option<Decimal>,
    /// Purchase price from the catalog hit.
    #[serde(default, deserialize_with = "lenient_decimal_opt")]
    pub purchase_price: Option<Decimal>,
    /// Explicit override; wins over the side default.
    #[serde(default, deserialize_with = "lenient_decimal_opt")]
    pub unit_price: Option<Decimal>,
    /// User confirmed adding despite low stock.
    #[serde(default)]
    pub confirm_low_stock: bool,
}

impl AddLineRequest {
    /// Default unit price for the memo side: sale price when selling,
    /// purchase price (falling back to sale price) when buying.
    pub fn default_price(&self, side: MemoSide) -> Decimal {
        self.unit_price
            .or(match side {
                MemoSide::Sale => self.price,
                MemoSide::Purchase => self.purchase_price.or(self.price),
            })
            .unwrap_or(Decimal::ZERO)
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateLineRequest {
    #[serde(default, deserialize_with = "lenient_decimal_opt")]
    pub quantity: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_decimal_opt")]
    pub unit_price: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
pub struct SelectCounterpartyRequest {
    #[serde(deserialize_with = "crate::utils::opaque_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "lenient_decimal_opt")]
    pub due: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_decimal_opt")]
    pub advance: Option<Decimal>,
}

impl SelectCounterpartyRequest {
    pub fn into_domain(self) -> Counterparty {
        Counterparty {
            id: self.id,
            name: self.name,
            phone: self.phone,
            address: self.address,
            due: self.due.unwrap_or(Decimal::ZERO),
            advance: self.advance.unwrap_or(Decimal::ZERO),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PaymentUpdateRequest {
    /// "cash" | "bank" | "mobile"; empty string clears the method.
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub account_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_decimal_opt")]
    pub paid_amount: Option<Decimal>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SubmitRequest {
    /// Memo date; defaults to today when omitted.
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct LineView {
    pub product_id: String,
    pub display_name: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_stock: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock_after_sale: Option<Decimal>,
}

impl From<&LineItem> for LineView {
    fn from(line: &LineItem) -> Self {
        Self {
            product_id: line.item_id.clone(),
            display_name: line.display_name.clone(),
            quantity: line.quantity,
            unit_price: line.unit_price,
            subtotal: line.subtotal,
            available_stock: line.available_stock,
            stock_after_sale: line.stock_after_sale(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CounterpartyView {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub due: Decimal,
    pub advance: Decimal,
    pub net_balance: Decimal,
    /// "Due" for a positive standing, "Advance" for a credit.
    pub standing_label: &'static str,
}

impl From<&Counterparty> for CounterpartyView {
    fn from(counterparty: &Counterparty) -> Self {
        let net_balance = counterparty.net_balance();
        Self {
            id: counterparty.id.clone(),
            name: counterparty.name.clone(),
            phone: counterparty.phone.clone(),
            address: counterparty.address.clone(),
            due: counterparty.due,
            advance: counterparty.advance,
            net_balance,
            standing_label: if net_balance.is_sign_negative() && !net_balance.is_zero() {
                "Advance"
            } else {
                "Due"
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PaymentView {
    pub method: Option<PaymentMethod>,
    pub account_id: Option<String>,
}

/// Everything the presentation layer needs to render one memo form.
#[derive(Debug, Serialize)]
pub struct MemoView {
    pub memo_id: Uuid,
    pub side: MemoSide,
    pub state: SessionState,
    pub lines: Vec<LineView>,
    pub grand_total: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub counterparty: Option<CounterpartyView>,
    pub payment: PaymentView,
    pub paid_amount: Decimal,
    pub due: Decimal,
    /// "Due" or "Credit" depending on the sign of `due`.
    pub due_label: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl From<&MemoSession> for MemoView {
    fn from(session: &MemoSession) -> Self {
        let reconciliation = session.reconciliation();
        Self {
            memo_id: session.memo_id(),
            side: session.side(),
            state: session.state(),
            lines: session.ledger().lines().iter().map(LineView::from).collect(),
            grand_total: reconciliation.grand_total,
            counterparty: session.counterparty().map(CounterpartyView::from),
            payment: PaymentView {
                method: session.payment().method,
                account_id: session.payment().account_id.clone(),
            },
            paid_amount: reconciliation.paid_amount,
            due: reconciliation.due,
            due_label: reconciliation.label(),
            last_error: session.last_error().map(|s| s.to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AddLineResponse {
    pub added: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    pub requires_confirmation: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_stock: Option<Decimal>,
    pub memo: MemoView,
}

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memo_ref: Option<serde_json::Value>,
    pub memo: MemoView,
}

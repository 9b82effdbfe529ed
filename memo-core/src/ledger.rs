//! Line-item ledger for purchase and sale memos.
//!
//! The ledger is an ordered collection of catalog lines; insertion order is
//! display order. Derived figures (per-line subtotal, grand total) are
//! recomputed synchronously on every mutation so the displayed total can
//! never go stale relative to the visible inputs.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;
use crate::money::{clamp_non_negative, round2, sum};

/// One catalog product on a memo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub item_id: String,
    pub display_name: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    /// Always `round2(quantity * unit_price)`; never stored independently of
    /// its inputs.
    pub subtotal: Decimal,
    /// Stock level captured when the line was added (sale memos only).
    /// Display aid for "stock after sale"; not re-queried on edits.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_stock: Option<Decimal>,
}

impl LineItem {
    fn recompute(&mut self) {
        self.subtotal = round2(self.quantity * self.unit_price);
    }

    /// Projected stock once this sale line ships.
    pub fn stock_after_sale(&self) -> Option<Decimal> {
        self.available_stock.map(|stock| stock - self.quantity)
    }
}

/// Ordered collection of memo lines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    lines: Vec<LineItem>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[LineItem] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn contains(&self, item_id: &str) -> bool {
        self.lines.iter().any(|line| line.item_id == item_id)
    }

    pub fn line(&self, item_id: &str) -> Option<&LineItem> {
        self.lines.iter().find(|line| line.item_id == item_id)
    }

    /// Append a line for `item_id` with quantity 1 at the given default
    /// price. A duplicate id is rejected so the caller can surface a warning;
    /// the ledger is left untouched.
    pub fn add_line(
        &mut self,
        item_id: &str,
        display_name: &str,
        default_price: Decimal,
        available_stock: Option<Decimal>,
    ) -> Result<(), LedgerError> {
        if self.contains(item_id) {
            return Err(LedgerError::DuplicateLine {
                item_id: item_id.to_string(),
            });
        }

        let mut line = LineItem {
            item_id: item_id.to_string(),
            display_name: display_name.to_string(),
            quantity: Decimal::ONE,
            unit_price: clamp_non_negative(default_price),
            subtotal: Decimal::ZERO,
            available_stock,
        };
        line.recompute();
        self.lines.push(line);
        Ok(())
    }

    /// Set a line's quantity, clamped to `>= 0`, and recompute its subtotal.
    pub fn update_quantity(&mut self, item_id: &str, quantity: Decimal) -> Result<(), LedgerError> {
        let line = self.line_mut(item_id)?;
        line.quantity = clamp_non_negative(quantity);
        line.recompute();
        Ok(())
    }

    /// Set a line's unit price, clamped to `>= 0`, and recompute its subtotal.
    pub fn update_price(&mut self, item_id: &str, unit_price: Decimal) -> Result<(), LedgerError> {
        let line = self.line_mut(item_id)?;
        line.unit_price = clamp_non_negative(unit_price);
        line.recompute();
        Ok(())
    }

    /// Remove a line. Absent ids are a no-op, not an error.
    pub fn remove_line(&mut self, item_id: &str) {
        self.lines.retain(|line| line.item_id != item_id);
    }

    /// Grand total of all line subtotals, rounded to 2 decimal places.
    pub fn grand_total(&self) -> Decimal {
        sum(self.lines.iter().map(|line| line.subtotal))
    }

    fn line_mut(&mut self, item_id: &str) -> Result<&mut LineItem, LedgerError> {
        self.lines
            .iter_mut()
            .find(|line| line.item_id == item_id)
            .ok_or_else(|| LedgerError::UnknownLine {
                item_id: item_id.to_string(),
            })
    }
}

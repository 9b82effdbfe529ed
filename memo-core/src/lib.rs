//! memo-core: the session engine behind farm purchase and sale memos.
//!
//! One memo session owns a line-item ledger, a counterparty selection, and a
//! payment selection, and walks the `Empty -> Editing -> Submitting ->
//! {Submitted | Failed}` lifecycle. All money figures flow through the
//! [`money`] helpers so a total computed for submission is identical to the
//! one displayed.

#![allow(clippy::should_implement_trait)]

pub mod error;
pub mod ledger;
pub mod money;
pub mod reconcile;
pub mod search;
pub mod session;

pub use error::{LedgerError, SessionError, ValidationFailure};
pub use ledger::{Ledger, LineItem};
pub use reconcile::{
    reconcile, net_balance, PaymentAccount, PaymentMethod, PaymentSelection, ReconciliationResult,
};
pub use search::{SearchLane, SearchOutcome};
pub use session::{Counterparty, MemoSession, MemoSide, MemoSubmission, SessionState};

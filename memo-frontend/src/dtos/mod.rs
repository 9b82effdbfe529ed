pub mod accounts;
pub mod memos;
pub mod search;

pub use accounts::{AccountListResponse, CreateAccountRequest};
pub use memos::{
    AddLineRequest, AddLineResponse, CounterpartyView, CreateMemoRequest, LineView, MemoView,
    PaymentUpdateRequest, PaymentView, SelectCounterpartyRequest, SubmitRequest, SubmitResponse,
    UpdateLineRequest,
};
pub use search::{SearchQuery, SearchResponse, SearchStatus};

//! Contracts for the debounced search surface.

use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStatus {
    /// The query settled and these are the current results.
    Results,
    /// Below the minimum query length; nothing was fetched.
    TooShort,
    /// A newer query took over; this response carries nothing.
    Superseded,
    /// The farm API call failed; the list is empty, not stale.
    Failed,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse<T> {
    pub status: SearchStatus,
    pub data: Vec<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

impl<T> SearchResponse<T> {
    pub fn results(data: Vec<T>) -> Self {
        Self {
            status: SearchStatus::Results,
            data,
            notice: None,
        }
    }

    pub fn empty(status: SearchStatus) -> Self {
        Self {
            status,
            data: Vec::new(),
            notice: None,
        }
    }

    pub fn failed(notice: String) -> Self {
        Self {
            status: SearchStatus::Failed,
            data: Vec::new(),
            notice: Some(notice),
        }
    }
}

//! HTTP client for the external farm REST API.
//!
//! Every upstream shape is normalized here at the boundary; nothing
//! downstream trusts a loosely-typed payload. Server-provided error messages
//! are preserved verbatim so submission failures can surface them unchanged.

use memo_core::reconcile::{PaymentAccount, PaymentMethod};
use memo_core::session::{Counterparty, MemoSide, MemoSubmission};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::config::FarmApiSettings;
use crate::middleware::tracing::REQUEST_ID_HEADER;
use crate::utils::opaque_id;

#[derive(Debug, Error)]
pub enum FarmApiError {
    /// Transport-level failure: DNS, connect, timeout, body read.
    #[error("farm API unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    /// Upstream answered but the payload did not match the contract.
    #[error("farm API returned an unexpected payload: {0}")]
    Contract(String),

    /// Upstream rejected the request. `message` is the server's own when the
    /// body carried one.
    #[error("{message}")]
    Rejected { status: u16, message: String },
}

/// Product catalog hit from `/products/search`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductHit {
    #[serde(deserialize_with = "opaque_id")]
    pub id: String,
    pub item_name: String,
    #[serde(default)]
    pub price: Decimal,
    #[serde(default)]
    pub purchase_price: Decimal,
}

/// Customer or supplier hit from `/customers/search` / `/suppliers/search`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CounterpartyHit {
    #[serde(deserialize_with = "opaque_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub due: Decimal,
    #[serde(default)]
    pub advance: Decimal,
}

impl CounterpartyHit {
    pub fn into_domain(self) -> Counterparty {
        Counterparty {
            id: self.id,
            name: self.name,
            phone: self.phone,
            address: self.address,
            due: self.due,
            advance: self.advance,
        }
    }
}

/// Which counterparty catalog a search targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterpartyKind {
    Customer,
    Supplier,
}

impl CounterpartyKind {
    fn search_path(&self) -> &'static str {
        match self {
            CounterpartyKind::Customer => "/customers/search",
            CounterpartyKind::Supplier => "/suppliers/search",
        }
    }
}

/// Payment account as the farm API ships it.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentAccountDto {
    #[serde(deserialize_with = "opaque_id")]
    pub id: String,
    #[serde(rename = "type")]
    pub account_type: String,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub balance: Decimal,
    #[serde(default)]
    pub account_name: Option<String>,
    #[serde(default)]
    pub bank_name: Option<String>,
    #[serde(default)]
    pub provider: Option<String>,
}

impl PaymentAccountDto {
    /// Normalize to the domain account. Accounts with an unrecognized type
    /// are dropped at the boundary rather than trusted downstream.
    pub fn into_domain(self) -> Option<PaymentAccount> {
        let account_type = PaymentMethod::from_str(&self.account_type)?;
        Some(PaymentAccount {
            id: self.id,
            account_type,
            is_default: self.is_default,
            balance: self.balance,
            label: self.account_name.or(self.bank_name).or(self.provider),
        })
    }
}

/// Acknowledgement for a memo submission.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitAck {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, alias = "memoId")]
    pub memo_id: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct DataEnvelope<T> {
    data: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct StockEnvelope {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    stock: Option<Decimal>,
}

#[derive(Clone)]
pub struct FarmApiClient {
    http: Client,
    base_url: String,
}

impl FarmApiClient {
    pub fn new(settings: &FarmApiSettings) -> Result<Self, FarmApiError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .build()?;
        Ok(Self {
            http,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn search_products(
        &self,
        query: &str,
        request_id: Option<&str>,
    ) -> Result<Vec<ProductHit>, FarmApiError> {
        let envelope: DataEnvelope<ProductHit> = self
            .get_json("/products/search", &[("q", query)], request_id)
            .await?;
        Ok(envelope.data)
    }

    pub async fn search_counterparties(
        &self,
        kind: CounterpartyKind,
        query: &str,
        request_id: Option<&str>,
    ) -> Result<Vec<CounterpartyHit>, FarmApiError> {
        let envelope: DataEnvelope<CounterpartyHit> = self
            .get_json(kind.search_path(), &[("q", query)], request_id)
            .await?;
        Ok(envelope.data)
    }

    /// Current stock for a product, or `None` when the level is unknown.
    ///
    /// A failed stock check never blocks the sale workflow; it degrades to
    /// "stock unknown" with a warning in the log.
    pub async fn stock_level(
        &self,
        product_id: &str,
        request_id: Option<&str>,
    ) -> Option<Decimal> {
        let path = format!("/inventory/stock/{product_id}");
        match self
            .get_json::<StockEnvelope>(&path, &[], request_id)
            .await
        {
            Ok(envelope) if envelope.success => envelope.stock,
            Ok(_) => None,
            Err(err) => {
                tracing::warn!(product_id = %product_id, error = %err, "Stock check failed, treating stock as unknown");
                None
            }
        }
    }

    pub async fn payment_accounts(
        &self,
        request_id: Option<&str>,
    ) -> Result<Vec<PaymentAccount>, FarmApiError> {
        let envelope: DataEnvelope<PaymentAccountDto> = self
            .get_json("/payment_accounts", &[], request_id)
            .await?;
        Ok(envelope
            .data
            .into_iter()
            .filter_map(PaymentAccountDto::into_domain)
            .collect())
    }

    pub async fn create_payment_account(
        &self,
        body: &serde_json::Value,
        request_id: Option<&str>,
    ) -> Result<serde_json::Value, FarmApiError> {
        self.post_json("/payment_accounts", body, request_id).await
    }

    /// Forward a packaged memo to the side-appropriate endpoint.
    pub async fn submit_memo(
        &self,
        side: MemoSide,
        submission: &MemoSubmission,
        request_id: Option<&str>,
    ) -> Result<SubmitAck, FarmApiError> {
        let path = match side {
            MemoSide::Sale => "/sales/create",
            MemoSide::Purchase => "/purchases",
        };
        self.post_json(path, submission, request_id).await
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        request_id: Option<&str>,
    ) -> Result<T, FarmApiError> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.http.get(&url);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(id) = request_id {
            request = request.header(REQUEST_ID_HEADER, id);
        }
        let response = request.send().await.map_err(|e| {
            tracing::error!("Failed to send GET request to {}: {}", url, e);
            FarmApiError::Transport(e)
        })?;
        Self::decode(response).await
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        request_id: Option<&str>,
    ) -> Result<T, FarmApiError> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.http.post(&url).json(body);
        if let Some(id) = request_id {
            request = request.header(REQUEST_ID_HEADER, id);
        }
        let response = request.send().await.map_err(|e| {
            tracing::error!("Failed to send POST request to {}: {}", url, e);
            FarmApiError::Transport(e)
        })?;
        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, FarmApiError> {
        let status = response.status();
        if !status.is_success() {
            let message = Self::server_message(response)
                .await
                .unwrap_or_else(|| format!("farm API returned HTTP {status}"));
            return Err(FarmApiError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| FarmApiError::Contract(e.to_string()))
    }

    /// Extract the server's own error message when the body carries one.
    async fn server_message(response: reqwest::Response) -> Option<String> {
        let body: serde_json::Value = response.json().await.ok()?;
        body.get("message")
            .or_else(|| body.get("error"))
            .and_then(|value| value.as_str())
            .map(|message| message.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_product_hit_accepts_numeric_ids() {
        let hit: ProductHit = serde_json::from_value(serde_json::json!({
            "id": 42,
            "item_name": "Layer Feed 50kg",
            "price": 2750.5,
            "purchase_price": "2500"
        }))
        .unwrap();
        assert_eq!(hit.id, "42");
        assert_eq!(hit.price, Decimal::from_str("2750.5").unwrap());
        assert_eq!(hit.purchase_price, Decimal::from_str("2500").unwrap());
    }

    #[test]
    fn test_counterparty_hit_defaults_missing_balances() {
        let hit: CounterpartyHit = serde_json::from_value(serde_json::json!({
            "id": "s9",
            "name": "Karim Poultry Supplies"
        }))
        .unwrap();
        let counterparty = hit.into_domain();
        assert_eq!(counterparty.due, Decimal::ZERO);
        assert_eq!(counterparty.advance, Decimal::ZERO);
        assert_eq!(counterparty.net_balance(), Decimal::ZERO);
    }

    #[test]
    fn test_unknown_account_type_dropped_at_boundary() {
        let dto: PaymentAccountDto = serde_json::from_value(serde_json::json!({
            "id": "x1",
            "type": "crypto",
            "balance": 10
        }))
        .unwrap();
        assert!(dto.into_domain().is_none());

        let dto: PaymentAccountDto = serde_json::from_value(serde_json::json!({
            "id": "b1",
            "type": "bank",
            "is_default": true,
            "balance": "5000",
            "bank_name": "City Bank"
        }))
        .unwrap();
        let account = dto.into_domain().unwrap();
        assert_eq!(account.account_type, PaymentMethod::Bank);
        assert_eq!(account.label.as_deref(), Some("City Bank"));
    }
}

#![allow(dead_code)]

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use memo_frontend::config::{
    FarmApiSettings, SearchSettings, ServerSettings, Settings, TelemetrySettings,
};
use memo_frontend::startup::Application;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// In-process stand-in for the external farm REST API.
pub struct MockFarmState {
    pub products: Vec<Value>,
    pub customers: Vec<Value>,
    pub suppliers: Vec<Value>,
    pub accounts: Vec<Value>,
    pub stock: HashMap<String, Value>,
    pub product_search_calls: AtomicUsize,
    pub customer_search_calls: AtomicUsize,
    pub supplier_search_calls: AtomicUsize,
    pub stock_calls: AtomicUsize,
    pub submissions: Mutex<Vec<(String, Value)>>,
    pub created_accounts: Mutex<Vec<Value>>,
    pub reject_submissions: AtomicBool,
    pub reject_message: Mutex<String>,
    pub search_errors: AtomicBool,
    pub stock_errors: AtomicBool,
}

impl Default for MockFarmState {
    fn default() -> Self {
        let products = vec![
            json!({ "id": "p1", "item_name": "Layer Feed 50kg", "price": 100, "purchase_price": 90 }),
            json!({ "id": "p2", "item_name": "Broiler Feed 50kg", "price": 50, "purchase_price": 45 }),
            json!({ "id": "p3", "item_name": "Day-old Chicks", "price": 45, "purchase_price": 40 }),
        ];
        let customers = vec![json!({
            "id": "c1",
            "name": "Rahim Traders",
            "phone": "01711-000000",
            "address": "Gazipur",
            "due": 150,
            "advance": 40
        })];
        let suppliers = vec![json!({
            "id": "s1",
            "name": "Karim Poultry Supplies",
            "phone": "01911-000000",
            "address": "Savar",
            "due": 0,
            "advance": 75.5
        })];
        let accounts = vec![
            json!({ "id": "cash-1", "type": "cash", "is_default": true, "balance": 5000, "account_name": "Cash box" }),
            json!({ "id": "bank-1", "type": "bank", "is_default": true, "balance": 120000, "bank_name": "City Bank" }),
            json!({ "id": "bank-2", "type": "bank", "is_default": false, "balance": 3000, "bank_name": "Agri Bank" }),
            json!({ "id": "mob-1", "type": "mobile", "is_default": true, "balance": 800, "provider": "bKash" }),
            json!({ "id": "mob-2", "type": "mobile", "is_default": true, "balance": 200, "provider": "Nagad" }),
        ];
        let mut stock = HashMap::new();
        stock.insert("p1".to_string(), json!(20));
        stock.insert("p2".to_string(), json!(15));
        stock.insert("p3".to_string(), json!(0));

        Self {
            products,
            customers,
            suppliers,
            accounts,
            stock,
            product_search_calls: AtomicUsize::new(0),
            customer_search_calls: AtomicUsize::new(0),
            supplier_search_calls: AtomicUsize::new(0),
            stock_calls: AtomicUsize::new(0),
            submissions: Mutex::new(Vec::new()),
            created_accounts: Mutex::new(Vec::new()),
            reject_submissions: AtomicBool::new(false),
            reject_message: Mutex::new("memo rejected".to_string()),
            search_errors: AtomicBool::new(false),
            stock_errors: AtomicBool::new(false),
        }
    }
}

impl MockFarmState {
    pub fn submission_count(&self) -> usize {
        self.submissions.lock().unwrap().len()
    }

    pub fn last_submission(&self) -> (String, Value) {
        self.submissions
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no submissions recorded")
    }

    pub fn set_rejection(&self, message: &str) {
        *self.reject_message.lock().unwrap() = message.to_string();
        self.reject_submissions.store(true, Ordering::SeqCst);
    }

    pub fn clear_rejection(&self) {
        self.reject_submissions.store(false, Ordering::SeqCst);
    }
}

#[derive(Deserialize)]
struct SearchParams {
    #[serde(default)]
    q: String,
}

fn filter_by_name(entries: &[Value], field: &str, query: &str) -> Vec<Value> {
    let needle = query.to_lowercase();
    entries
        .iter()
        .filter(|entry| {
            entry[field]
                .as_str()
                .map(|name| name.to_lowercase().contains(&needle))
                .unwrap_or(false)
        })
        .cloned()
        .collect()
}

async fn products_search(
    State(farm): State<Arc<MockFarmState>>,
    Query(params): Query<SearchParams>,
) -> impl IntoResponse {
    farm.product_search_calls.fetch_add(1, Ordering::SeqCst);
    if farm.search_errors.load(Ordering::SeqCst) {
        return (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "message": "catalog offline" })));
    }
    let data = filter_by_name(&farm.products, "item_name", &params.q);
    (StatusCode::OK, Json(json!({ "data": data })))
}

async fn customers_search(
    State(farm): State<Arc<MockFarmState>>,
    Query(params): Query<SearchParams>,
) -> impl IntoResponse {
    farm.customer_search_calls.fetch_add(1, Ordering::SeqCst);
    let data = filter_by_name(&farm.customers, "name", &params.q);
    (StatusCode::OK, Json(json!({ "data": data })))
}

async fn suppliers_search(
    State(farm): State<Arc<MockFarmState>>,
    Query(params): Query<SearchParams>,
) -> impl IntoResponse {
    farm.supplier_search_calls.fetch_add(1, Ordering::SeqCst);
    let data = filter_by_name(&farm.suppliers, "name", &params.q);
    (StatusCode::OK, Json(json!({ "data": data })))
}

async fn stock_level(
    State(farm): State<Arc<MockFarmState>>,
    Path(product_id): Path<String>,
) -> impl IntoResponse {
    farm.stock_calls.fetch_add(1, Ordering::SeqCst);
    if farm.stock_errors.load(Ordering::SeqCst) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "message": "inventory offline" })),
        );
    }
    match farm.stock.get(&product_id) {
        Some(stock) => (StatusCode::OK, Json(json!({ "success": true, "stock": stock }))),
        None => (StatusCode::OK, Json(json!({ "success": false }))),
    }
}

async fn payment_accounts(State(farm): State<Arc<MockFarmState>>) -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "data": farm.accounts })))
}

async fn create_payment_account(
    State(farm): State<Arc<MockFarmState>>,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    farm.created_accounts.lock().unwrap().push(body.clone());
    let mut created = body;
    created["id"] = json!("acct-new");
    (StatusCode::CREATED, Json(json!({ "success": true, "data": created })))
}

async fn record_submission(farm: Arc<MockFarmState>, path: &str, body: Value) -> impl IntoResponse {
    if farm.reject_submissions.load(Ordering::SeqCst) {
        let message = farm.reject_message.lock().unwrap().clone();
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "success": false, "message": message })),
        );
    }
    farm.submissions
        .lock()
        .unwrap()
        .push((path.to_string(), body));
    (
        StatusCode::OK,
        Json(json!({ "success": true, "message": "saved", "memoId": "M-1001" })),
    )
}

async fn create_sale(
    State(farm): State<Arc<MockFarmState>>,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    record_submission(farm, "/sales/create", body).await
}

async fn create_purchase(
    State(farm): State<Arc<MockFarmState>>,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    record_submission(farm, "/purchases", body).await
}

fn mock_farm_router(farm: Arc<MockFarmState>) -> Router {
    let api = Router::new()
        .route("/products/search", get(products_search))
        .route("/customers/search", get(customers_search))
        .route("/suppliers/search", get(suppliers_search))
        .route("/inventory/stock/:product_id", get(stock_level))
        .route(
            "/payment_accounts",
            get(payment_accounts).post(create_payment_account),
        )
        .route("/sales/create", post(create_sale))
        .route("/purchases", post(create_purchase))
        .with_state(farm);
    Router::new().nest("/api", api)
}

async fn spawn_mock_farm(farm: Arc<MockFarmState>) -> String {
    let router = mock_farm_router(farm);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind mock farm listener");
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, router).await.ok();
    });
    format!("http://127.0.0.1:{port}/api")
}

pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
    pub farm: Arc<MockFarmState>,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with(MockFarmState::default()).await
    }

    pub async fn spawn_with(farm: MockFarmState) -> Self {
        let farm = Arc::new(farm);
        let farm_url = spawn_mock_farm(farm.clone()).await;

        let settings = Settings {
            server: ServerSettings {
                host: "127.0.0.1".to_string(),
                port: 0, // Random port
            },
            farm_api: FarmApiSettings {
                base_url: farm_url,
                timeout_seconds: 5,
            },
            search: SearchSettings {
                debounce_ms: 80,
                min_chars: 3,
            },
            telemetry: TelemetrySettings {
                otlp_endpoint: None,
                log_level: "info".to_string(),
            },
        };

        let app = Application::build(settings)
            .await
            .expect("Failed to build test application");
        let port = app.port();
        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        let client = reqwest::Client::new();
        let address = format!("http://127.0.0.1:{port}");

        // Wait for the server to be ready by polling the health endpoint
        let health_url = format!("{address}/health");
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(20)).await;
        }

        TestApp {
            address,
            client,
            farm,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn get_json(&self, path: &str) -> (reqwest::StatusCode, Value) {
        let response = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("request failed");
        let status = response.status();
        let body = response.json().await.unwrap_or(Value::Null);
        (status, body)
    }

    pub async fn post_json(&self, path: &str, body: Value) -> (reqwest::StatusCode, Value) {
        let response = self
            .client
            .post(self.url(path))
            .json(&body)
            .send()
            .await
            .expect("request failed");
        let status = response.status();
        let body = response.json().await.unwrap_or(Value::Null);
        (status, body)
    }

    pub async fn put_json(&self, path: &str, body: Value) -> (reqwest::StatusCode, Value) {
        let response = self
            .client
            .put(self.url(path))
            .json(&body)
            .send()
            .await
            .expect("request failed");
        let status = response.status();
        let body = response.json().await.unwrap_or(Value::Null);
        (status, body)
    }

    pub async fn delete(&self, path: &str) -> reqwest::StatusCode {
        self.client
            .delete(self.url(path))
            .send()
            .await
            .expect("request failed")
            .status()
    }

    /// Open a memo session and return its id.
    pub async fn create_memo(&self, side: &str) -> Uuid {
        let (status, body) = self.post_json("/memos", json!({ "side": side })).await;
        assert_eq!(status, reqwest::StatusCode::CREATED, "create memo: {body}");
        Uuid::parse_str(body["memo_id"].as_str().expect("memo_id missing")).unwrap()
    }

    /// Select the default test customer/supplier on a memo.
    pub async fn select_counterparty(&self, memo_id: Uuid, counterparty: Value) {
        let (status, body) = self
            .put_json(&format!("/memos/{memo_id}/counterparty"), counterparty)
            .await;
        assert_eq!(status, reqwest::StatusCode::OK, "select counterparty: {body}");
    }
}

/// Parse a money field the BFF serialized (string or number) into a Decimal.
pub fn dec(value: &Value) -> Decimal {
    match value {
        Value::String(s) => Decimal::from_str(s).expect("not a decimal string"),
        Value::Number(n) => Decimal::from_str(&n.to_string()).expect("not a decimal number"),
        other => panic!("expected a numeric value, got {other}"),
    }
}

pub fn customer_fixture() -> Value {
    json!({
        "id": "c1",
        "name": "Rahim Traders",
        "phone": "01711-000000",
        "address": "Gazipur",
        "due": 150,
        "advance": 40
    })
}

pub fn supplier_fixture() -> Value {
    json!({
        "id": "s1",
        "name": "Karim Poultry Supplies",
        "phone": "01911-000000",
        "address": "Savar",
        "due": 0,
        "advance": 75.5
    })
}

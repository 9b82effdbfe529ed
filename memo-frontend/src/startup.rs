//! Application startup and lifecycle management.

use axum::{
    middleware::from_fn,
    routing::{get, post, put},
    Router,
};
use dashmap::DashMap;
use memo_core::search::SearchLane;
use memo_core::session::MemoSession;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::config::{SearchSettings, Settings};
use crate::handlers::{
    accounts::{create_account, list_accounts},
    health::health_check,
    memos::{
        abandon_memo, add_line, clear_counterparty, create_memo, get_memo, remove_line,
        select_counterparty, submit_memo, update_line, update_payment,
    },
    metrics::metrics_endpoint,
    search::{search_customers, search_products, search_suppliers},
};
use crate::middleware::{metrics::metrics_middleware, tracing::request_id_middleware};
use crate::services::farm_api::FarmApiClient;

/// One debounced lane per search box on the memo form.
#[derive(Debug)]
pub struct SearchLanes {
    pub products: SearchLane,
    pub customers: SearchLane,
    pub suppliers: SearchLane,
}

impl SearchLanes {
    pub fn new(settings: &SearchSettings) -> Self {
        let debounce = Duration::from_millis(settings.debounce_ms);
        Self {
            products: SearchLane::new(debounce, settings.min_chars),
            customers: SearchLane::new(debounce, settings.min_chars),
            suppliers: SearchLane::new(debounce, settings.min_chars),
        }
    }
}

/// One open memo form: the session plus its search lanes.
pub struct SessionEntry {
    pub session: MemoSession,
    pub lanes: Arc<SearchLanes>,
}

impl SessionEntry {
    pub fn new(session: MemoSession, settings: &SearchSettings) -> Self {
        Self {
            session,
            lanes: Arc::new(SearchLanes::new(settings)),
        }
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<DashMap<Uuid, SessionEntry>>,
    pub api: Arc<FarmApiClient>,
    pub settings: Settings,
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Build the application with the given configuration.
    pub async fn build(settings: Settings) -> Result<Self, anyhow::Error> {
        let api = Arc::new(FarmApiClient::new(&settings.farm_api).map_err(|e| {
            tracing::error!("Failed to build farm API client: {}", e);
            anyhow::anyhow!("Farm API client error: {}", e)
        })?);

        let state = AppState {
            sessions: Arc::new(DashMap::new()),
            api,
            settings: settings.clone(),
        };

        // Port 0 binds a random port for testing.
        let address = format!("{}:{}", settings.server.host, settings.server.port);
        let listener = TcpListener::bind(&address).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", address, e);
            anyhow::anyhow!("Failed to bind to address {}: {}", address, e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("memo-frontend listening on port {}", port);

        Ok(Self {
            port,
            listener,
            state,
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn state(&self) -> AppState {
        self.state.clone()
    }

    /// Run the application until stopped.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        let app = build_router(self.state);
        axum::serve(self.listener, app).await
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_endpoint))
        .route("/memos", post(create_memo))
        .route("/memos/:memo_id", get(get_memo).delete(abandon_memo))
        .route("/memos/:memo_id/lines", post(add_line))
        .route(
            "/memos/:memo_id/lines/:product_id",
            put(update_line).delete(remove_line),
        )
        .route(
            "/memos/:memo_id/counterparty",
            put(select_counterparty).delete(clear_counterparty),
        )
        .route("/memos/:memo_id/payment", put(update_payment))
        .route("/memos/:memo_id/search/products", get(search_products))
        .route("/memos/:memo_id/search/customers", get(search_customers))
        .route("/memos/:memo_id/search/suppliers", get(search_suppliers))
        .route("/memos/:memo_id/submit", post(submit_memo))
        .route("/accounts", get(list_accounts).post(create_account))
        .layer(from_fn(metrics_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

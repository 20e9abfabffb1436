// The transport shim: an HTTP API over one shared ledger.
//
// The daemon holds the transactions so clients don't re-parse csvs for
// every query. Credentials are checked here, before the core is touched;
// the core itself assumes it is already authorized. The mutex serializes
// access, so one request mutates the ledger at a time.

use std::sync::{Arc, Mutex};

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::filters::TransactionFilter;
use crate::ledger::Ledger;
use crate::transaction::TxId;

/// Credentials a request must present.
#[derive(Debug, Clone, Default)]
pub struct Login {
    pub username: String,
    pub password: String,
}

impl Login {
    fn accepts(&self, username: &str, password: &str) -> bool {
        self.username == username && self.password == password
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<Mutex<Ledger>>,
    pub login: Login,
}

impl AppState {
    pub fn new(ledger: Ledger, login: Login) -> Self {
        AppState {
            ledger: Arc::new(Mutex::new(ledger)),
            login,
        }
    }
}

/// API response wrapper.
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            error: None,
        }
    }
}

impl ApiResponse<()> {
    fn err(message: String) -> Self {
        Self {
            success: false,
            data: (),
            error: Some(message),
        }
    }
}

fn unauthorized() -> axum::response::Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(ApiResponse::err("bad credentials".to_string())),
    )
        .into_response()
}

// ============================================================================
// REQUESTS
// ============================================================================

#[derive(Deserialize)]
pub struct LoadRequest {
    pub username: String,
    pub password: String,
    /// Substitutes accounts named `this` and names the perspective.
    #[serde(default)]
    pub this_name: String,
    /// Csv rows, headers first.
    pub lines: String,
    #[serde(default)]
    pub skip_invalid: bool,
}

#[derive(Deserialize)]
pub struct DumpRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub filter: TransactionFilter,
}

#[derive(Deserialize)]
pub struct ClearRequest {
    pub username: String,
    pub password: String,
}

// ============================================================================
// HANDLERS
// ============================================================================

/// GET /api/ping - liveness check
async fn ping() -> impl IntoResponse {
    Json(ApiResponse::ok("pong"))
}

/// POST /api/load - load csv rows into the shared ledger
async fn load(State(state): State<AppState>, Json(req): Json<LoadRequest>) -> impl IntoResponse {
    if !state.login.accepts(&req.username, &req.password) {
        return unauthorized();
    }

    let mut ledger = state.ledger.lock().unwrap();
    match ledger.load_str(&req.lines, &req.this_name, None, req.skip_invalid) {
        Ok(ids) => {
            info!(rows = ids.len(), this_name = %req.this_name, "remote load");
            (StatusCode::OK, Json(ApiResponse::<Vec<TxId>>::ok(ids))).into_response()
        }
        Err(e) => (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::err(e.to_string())),
        )
            .into_response(),
    }
}

/// POST /api/dump - filtered transactions as a csv string
async fn dump(State(state): State<AppState>, Json(req): Json<DumpRequest>) -> impl IntoResponse {
    if !state.login.accepts(&req.username, &req.password) {
        return unauthorized();
    }

    let ledger = state.ledger.lock().unwrap();
    match ledger.dump(&req.filter) {
        Ok(csv) => (StatusCode::OK, Json(ApiResponse::ok(csv))).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::err(e.to_string())),
        )
            .into_response(),
    }
}

/// POST /api/clear - drop everything and start from scratch
async fn clear(State(state): State<AppState>, Json(req): Json<ClearRequest>) -> impl IntoResponse {
    if !state.login.accepts(&req.username, &req.password) {
        return unauthorized();
    }

    let mut ledger = state.ledger.lock().unwrap();
    ledger.clear();
    info!("ledger cleared");
    (StatusCode::OK, Json(ApiResponse::ok("cleared"))).into_response()
}

/// Build the API router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/ping", get(ping))
        .route("/api/load", post(load))
        .route("/api/dump", post(dump))
        .route("/api/clear", post(clear))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ============================================================================
// TESTS
// ============================================================================

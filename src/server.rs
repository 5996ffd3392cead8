//! HTTP endpoints
//!
//! Two routers: the public one (`/word`, `/health`) and the internal one
//! (number management and the manual send trigger). They are bound to
//! separate listeners so the internal routes can stay on loopback.

use crate::dispatch::Dispatcher;
use crate::error::{Error, Result};
use crate::store::NumberStore;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

pub type AppState = Arc<Dispatcher>;

#[derive(Debug, Serialize, PartialEq)]
pub struct WordResponse {
    #[serde(rename = "Message")]
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct NumbersResponse {
    #[serde(rename = "Numbers")]
    pub numbers: Vec<String>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct SendResponse {
    #[serde(rename = "Word")]
    pub word: String,
    #[serde(rename = "Sent")]
    pub sent: usize,
    #[serde(rename = "Failed")]
    pub failed: usize,
}

/// Error wrapper that renders `{ "code", "message" }`
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self.0 {
            Error::ExhaustedWordList { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "exhausted_word_list")
            }
            Error::Sqlite(_) | Error::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "storage"),
            Error::Provider { .. } | Error::Http(_) => (StatusCode::BAD_GATEWAY, "provider"),
            Error::Json(_) | Error::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        };

        let body = Json(json!({
            "code": code,
            "message": self.0.to_string(),
        }));
        (status, body).into_response()
    }
}

type ApiResult<T> = std::result::Result<T, ApiError>;

/// Routes callable from outside
pub fn public_router(state: AppState) -> Router {
    Router::new()
        .route("/word", get(todays_word))
        .route("/health", get(health))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Routes only the host (scheduler, operators) should reach
pub fn internal_router(state: AppState) -> Router {
    Router::new()
        .route("/send-messages", post(send_messages))
        .route("/add-number/{number}", post(add_number))
        .route("/remove-number/{number}", post(remove_number))
        .route("/get-numbers", get(get_numbers))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// GET /word
async fn todays_word(State(state): State<AppState>) -> ApiResult<Json<WordResponse>> {
    let word = state.selector().todays_word(&Utc::now())?;
    Ok(Json(WordResponse {
        message: word.to_string(),
    }))
}

/// GET /health
async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// POST /send-messages
async fn send_messages(State(state): State<AppState>) -> ApiResult<Json<SendResponse>> {
    let report = state.send_daily(Utc::now()).await?;
    Ok(Json(SendResponse {
        sent: report.sent(),
        failed: report.failed(),
        word: report.word,
    }))
}

/// Run a store call on the blocking pool so SQLite never stalls a worker
async fn with_store<T, F>(state: AppState, op: F) -> ApiResult<T>
where
    T: Send + 'static,
    F: FnOnce(&NumberStore) -> Result<T> + Send + 'static,
{
    let result = tokio::task::spawn_blocking(move || op(&state.store()))
        .await
        .map_err(|e| Error::Io(std::io::Error::other(e)))?;
    Ok(result?)
}

/// POST /add-number/{number}
async fn add_number(
    State(state): State<AppState>,
    Path(number): Path<String>,
) -> ApiResult<StatusCode> {
    with_store(state, move |store| store.add(&number)).await?;
    Ok(StatusCode::OK)
}

/// POST /remove-number/{number}
async fn remove_number(
    State(state): State<AppState>,
    Path(number): Path<String>,
) -> ApiResult<StatusCode> {
    with_store(state, move |store| store.remove(&number)).await?;
    Ok(StatusCode::OK)
}

/// GET /get-numbers
async fn get_numbers(State(state): State<AppState>) -> ApiResult<Json<NumbersResponse>> {
    let numbers = with_store(state, |store| store.list()).await?;
    Ok(Json(NumbersResponse { numbers }))
}

/// Bind and serve a router until the listener fails
pub async fn serve(name: &'static str, addr: SocketAddr, router: Router) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(listener = name, addr = %listener.local_addr()?, "HTTP listener ready");
    axum::serve(listener, router).await
}

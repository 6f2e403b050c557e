// src/api/server.rs
//! HTTP surface: `GET /events` and `GET /health`.

use crate::config::ServerConfig;
use crate::error::{ErrorCategory, EventError};
use crate::events::{EventList, EventService};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use log::{error, info, warn};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

pub const DEFAULT_STARTS_AT: &str = "2021-07-30T21:00:01";
pub const DEFAULT_ENDS_AT: &str = "2021-08-30T21:00:00";

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<EventService>,
}

/// Query parameters of `GET /events`; both bounds are inclusive.
#[derive(Debug, Clone, Deserialize)]
pub struct EventsQuery {
    #[serde(default = "default_starts_at")]
    pub starts_at: String,
    #[serde(default = "default_ends_at")]
    pub ends_at: String,
}

fn default_starts_at() -> String {
    DEFAULT_STARTS_AT.to_string()
}

fn default_ends_at() -> String {
    DEFAULT_ENDS_AT.to_string()
}

/// Service error rendered as a JSON body with a mapped status.
#[derive(Debug)]
pub struct ApiError(pub EventError);

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match &self.0 {
            EventError::ParseError(_) | EventError::InvalidRange(_) => StatusCode::BAD_REQUEST,
            EventError::DecodeError(_) | EventError::UpstreamUnavailable(_) => StatusCode::BAD_GATEWAY,
            EventError::UpstreamTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            EventError::CacheUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            EventError::SerializationError(_) | EventError::ConfigError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<EventError> for ApiError {
    fn from(err: EventError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match self.0.categorize() {
            ErrorCategory::Client => warn!("Rejected request ({}): {}", status, self.0),
            _ => error!("Request failed ({}): {}", status, self.0),
        }
        let body = json!({
            "error": {
                "kind": self.0.kind(),
                "message": self.0.to_string(),
            }
        });
        (status, Json(body)).into_response()
    }
}

pub fn create_router(service: Arc<EventService>) -> Router {
    Router::new()
        .route("/events", get(list_events))
        .route("/health", get(health_check))
        .with_state(AppState { service })
}

async fn list_events(
    State(state): State<AppState>,
    Query(params): Query<EventsQuery>,
) -> Result<Json<EventList>, ApiError> {
    info!("GET /events starts_at={} ends_at={}", params.starts_at, params.ends_at);
    let events = state
        .service
        .get_by_range(params.starts_at.trim(), params.ends_at.trim())
        .await?;
    Ok(Json(EventList { events }))
}

async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "stats": state.service.stats(),
    }))
}

pub struct ApiServer {
    config: ServerConfig,
    service: Arc<EventService>,
}

impl ApiServer {
    pub fn new(config: ServerConfig, service: Arc<EventService>) -> Self {
        Self { config, service }
    }

    /// Binds and serves until Ctrl-C.
    pub async fn start(self) -> std::io::Result<()> {
        let app = create_router(self.service);
        let address = self.config.bind_address();
        let listener = tokio::net::TcpListener::bind(&address).await?;

        info!("Events API listening on {}", address);
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        info!("Events API stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use serde::Serialize;

use crate::routes::AppState;

pub const BANNER: &str = "LINE 短影音標題產生器運行中";

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub gateway: HealthCheck,
    pub memory: HealthCheck,
    pub checked_at: String,
}

pub async fn banner() -> &'static str {
    BANNER
}

/// Reports configuration-level readiness only; the gateway is not probed per request.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let payload = HealthResponse {
        status: "ready",
        service: HealthCheck {
            status: "ready",
            detail: format!("reeltitle-server {}", env!("CARGO_PKG_VERSION")),
        },
        gateway: HealthCheck { status: "configured", detail: state.gateway_label.to_string() },
        memory: HealthCheck {
            status: "ready",
            detail: format!("{} tracked senders", state.memory.tracked_senders()),
        },
        checked_at: Utc::now().to_rfc3339(),
    };

    (StatusCode::OK, Json(payload))
}

use std::sync::Arc;
use std::time::Duration;

use axum::{
    routing::{get, post},
    Router,
};
use reeltitle_core::ConversationMemory;
use reeltitle_line::WebhookProcessor;
use tracing::{info, warn};

use crate::bootstrap::Application;
use crate::health;
use crate::webhook::{self, InFlight};

#[derive(Clone)]
pub struct AppState {
    pub processor: Arc<WebhookProcessor>,
    pub memory: Arc<dyn ConversationMemory>,
    /// `provider/model`, as shown by the health endpoint.
    pub gateway_label: Arc<str>,
    pub in_flight: InFlight,
}

impl AppState {
    pub fn from_application(app: &Application) -> Self {
        Self {
            processor: Arc::clone(&app.processor),
            memory: app.memory.clone(),
            gateway_label: format!("{}/{}", app.config.llm.provider, app.config.llm.model).into(),
            in_flight: InFlight::default(),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health::banner))
        .route("/health", get(health::health))
        .route("/webhook", post(webhook::receive))
        .with_state(state)
}

pub async fn serve<F>(
    bind_address: &str,
    port: u16,
    state: AppState,
    grace: Duration,
    shutdown: F,
) -> std::io::Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let address = format!("{bind_address}:{port}");
    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!(
        event_name = "system.http.start",
        correlation_id = "bootstrap",
        bind_address = %address,
        "webhook server listening"
    );

    let in_flight = state.in_flight.clone();
    axum::serve(listener, router(state)).with_graceful_shutdown(shutdown).await?;

    let pending = in_flight.count();
    if pending > 0 {
        info!(
            event_name = "system.http.draining",
            correlation_id = "shutdown",
            pending,
            grace_secs = grace.as_secs(),
            "waiting for in-flight deliveries"
        );
        if tokio::time::timeout(grace, in_flight.wait_idle()).await.is_err() {
            warn!(
                event_name = "system.http.drain_timeout",
                correlation_id = "shutdown",
                abandoned = in_flight.count(),
                "grace period elapsed with deliveries still in flight"
            );
        }
    }
    Ok(())
}

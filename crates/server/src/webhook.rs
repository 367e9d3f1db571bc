use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::{body::Bytes, extract::State, http::StatusCode};
use reeltitle_line::{parse_delivery, EventContext};
use tokio::sync::Notify;
use tracing::{info, warn, Instrument};

use crate::routes::AppState;

/// Counts webhook deliveries still being processed after their acknowledgment.
#[derive(Clone, Default)]
pub struct InFlight {
    inner: Arc<InFlightInner>,
}

#[derive(Default)]
struct InFlightInner {
    count: AtomicUsize,
    idle: Notify,
}

pub struct InFlightGuard {
    inner: Arc<InFlightInner>,
}

impl InFlight {
    pub fn enter(&self) -> InFlightGuard {
        self.inner.count.fetch_add(1, Ordering::SeqCst);
        InFlightGuard { inner: Arc::clone(&self.inner) }
    }

    pub fn count(&self) -> usize {
        self.inner.count.load(Ordering::SeqCst)
    }

    pub async fn wait_idle(&self) {
        loop {
            let notified = self.inner.idle.notified();
            if self.count() == 0 {
                return;
            }
            notified.await;
        }
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if self.inner.count.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.inner.idle.notify_waiters();
        }
    }
}

/// Always acknowledges with 200. Parsing happens inline; answering happens on a spawned
/// task so the platform never waits on model or delivery latency.
pub async fn receive(State(state): State<AppState>, body: Bytes) -> StatusCode {
    let ctx = EventContext::generate();

    let delivery = match parse_delivery(&body) {
        Ok(delivery) => delivery,
        Err(error) => {
            warn!(
                event_name = "ingress.line.payload_rejected",
                correlation_id = %ctx.correlation_id,
                body_bytes = body.len(),
                error = %error,
                "ignoring malformed webhook payload"
            );
            return StatusCode::OK;
        }
    };

    info!(
        event_name = "ingress.line.delivery_received",
        correlation_id = %ctx.correlation_id,
        events = delivery.event_count(),
        text_messages = delivery.messages.len(),
        "received LINE webhook delivery"
    );

    if delivery.messages.is_empty() {
        return StatusCode::OK;
    }

    let guard = state.in_flight.enter();
    let processor = Arc::clone(&state.processor);
    let span = tracing::info_span!("delivery", correlation_id = %ctx.correlation_id);
    tokio::spawn(
        async move {
            let _guard = guard;
            processor.process(&delivery.messages, &ctx).await;
        }
        .instrument(span),
    );

    StatusCode::OK
}

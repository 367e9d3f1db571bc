use std::sync::Arc;

use async_trait::async_trait;
use reeltitle_core::InterfaceError;
use tracing::{info, warn};

use crate::events::{EventContext, InboundTextMessage};
use crate::reply::ReplySender;

/// Produces the reply text for one inbound message. Errors carry a fixed user-safe message.
#[async_trait]
pub trait TextMessageService: Send + Sync {
    async fn handle_text_message(
        &self,
        message: &InboundTextMessage,
        ctx: &EventContext,
    ) -> Result<String, InterfaceError>;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub replied: usize,
    pub apologized: usize,
    pub dropped: usize,
    pub delivery_failures: usize,
}

/// Handles the text messages of one webhook delivery, strictly in order. Nothing here
/// fails outward: every failure is logged and counted in the report.
pub struct WebhookProcessor {
    service: Arc<dyn TextMessageService>,
    replies: Arc<dyn ReplySender>,
    reply_on_failure: bool,
}

impl WebhookProcessor {
    pub fn new(
        service: Arc<dyn TextMessageService>,
        replies: Arc<dyn ReplySender>,
        reply_on_failure: bool,
    ) -> Self {
        Self { service, replies, reply_on_failure }
    }

    pub async fn process(
        &self,
        messages: &[InboundTextMessage],
        ctx: &EventContext,
    ) -> DeliveryReport {
        let mut report = DeliveryReport::default();

        for message in messages {
            let text = match self.service.handle_text_message(message, ctx).await {
                Ok(text) => {
                    report.replied += 1;
                    text
                }
                Err(error) => {
                    warn!(
                        event_name = "processor.reply_failed",
                        correlation_id = %ctx.correlation_id,
                        sender = %message.sender,
                        error = %error,
                        "could not produce a reply"
                    );
                    if !self.reply_on_failure {
                        report.dropped += 1;
                        continue;
                    }
                    report.apologized += 1;
                    error.user_message().to_owned()
                }
            };

            if let Err(error) = self.replies.send(&message.reply_token, &text).await {
                report.delivery_failures += 1;
                warn!(
                    event_name = "delivery.line.reply_failed",
                    correlation_id = %ctx.correlation_id,
                    sender = %message.sender,
                    error = %error,
                    "reply delivery failed; not retrying"
                );
            }
        }

        info!(
            event_name = "processor.delivery_completed",
            correlation_id = %ctx.correlation_id,
            messages = messages.len(),
            replied = report.replied,
            apologized = report.apologized,
            dropped = report.dropped,
            delivery_failures = report.delivery_failures,
            "webhook delivery processed"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use reeltitle_core::{DeliveryError, InterfaceError};

    use super::{DeliveryReport, WebhookProcessor};
    use crate::events::{EventContext, InboundTextMessage};
    use crate::testing::{RecordingReplySender, ScriptedTextService};

    fn message(sender: &str, text: &str, token: &str) -> InboundTextMessage {
        InboundTextMessage {
            sender: sender.to_owned(),
            text: text.to_owned(),
            reply_token: token.to_owned(),
        }
    }

    fn generation_failure() -> InterfaceError {
        InterfaceError::GenerationUnavailable {
            message: "completion endpoint returned 503: overloaded".to_owned(),
            correlation_id: "req-1".to_owned(),
        }
    }

    #[tokio::test]
    async fn messages_are_answered_in_order() {
        let service = Arc::new(ScriptedTextService::echo());
        let replies = Arc::new(RecordingReplySender::default());
        let processor = WebhookProcessor::new(service.clone(), replies.clone(), true);

        let report = processor
            .process(
                &[message("U1", "first", "rt-1"), message("U2", "second", "rt-2")],
                &EventContext::new("req-1"),
            )
            .await;

        assert_eq!(report, DeliveryReport { replied: 2, ..DeliveryReport::default() });
        assert_eq!(service.seen(), vec!["first", "second"]);
        assert_eq!(
            replies.sent(),
            vec![
                ("rt-1".to_owned(), "echo: first".to_owned()),
                ("rt-2".to_owned(), "echo: second".to_owned()),
            ]
        );
    }

    #[tokio::test]
    async fn failure_sends_fixed_apology_without_technical_detail() {
        let service = Arc::new(ScriptedTextService::with_results(vec![Err(generation_failure())]));
        let replies = Arc::new(RecordingReplySender::default());
        let processor = WebhookProcessor::new(service, replies.clone(), true);

        let report = processor.process(&[message("U1", "x", "rt-1")], &EventContext::default()).await;

        assert_eq!(report.apologized, 1);
        let sent = replies.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].1, generation_failure().user_message());
        assert!(!sent[0].1.contains("503"));
    }

    #[tokio::test]
    async fn failure_is_silently_dropped_when_apology_disabled() {
        let service = Arc::new(ScriptedTextService::with_results(vec![
            Err(generation_failure()),
            Ok("second reply".to_owned()),
        ]));
        let replies = Arc::new(RecordingReplySender::default());
        let processor = WebhookProcessor::new(service, replies.clone(), false);

        let report = processor
            .process(
                &[message("U1", "a", "rt-1"), message("U1", "b", "rt-2")],
                &EventContext::default(),
            )
            .await;

        assert_eq!(report.dropped, 1);
        assert_eq!(report.replied, 1);
        assert_eq!(replies.sent(), vec![("rt-2".to_owned(), "second reply".to_owned())]);
    }

    #[tokio::test]
    async fn delivery_failure_does_not_stop_later_events() {
        let service = Arc::new(ScriptedTextService::echo());
        let replies = Arc::new(RecordingReplySender::failing_first(DeliveryError::Rejected {
            status: 400,
            body: "Invalid reply token".to_owned(),
        }));
        let processor = WebhookProcessor::new(service, replies.clone(), true);

        let report = processor
            .process(
                &[message("U1", "a", "expired"), message("U1", "b", "rt-2")],
                &EventContext::default(),
            )
            .await;

        assert_eq!(report.delivery_failures, 1);
        assert_eq!(report.replied, 2);
        assert_eq!(replies.sent(), vec![("rt-2".to_owned(), "echo: b".to_owned())]);
    }

    #[tokio::test]
    async fn empty_delivery_is_a_no_op() {
        let replies = Arc::new(RecordingReplySender::default());
        let processor =
            WebhookProcessor::new(Arc::new(ScriptedTextService::echo()), replies.clone(), true);

        let report = processor.process(&[], &EventContext::default()).await;

        assert_eq!(report, DeliveryReport::default());
        assert!(replies.sent().is_empty());
    }
}

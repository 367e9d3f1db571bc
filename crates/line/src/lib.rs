//! LINE Messaging API interface
//!
//! - **Events** (`events`) - tolerant parsing of webhook deliveries into text messages
//! - **Processor** (`processor`) - answers one delivery's messages in order
//! - **Reply** (`reply`) - reply-token delivery through the LINE reply endpoint
//!
//! # Architecture
//!
//! ```text
//! POST /webhook → parse_delivery → WebhookProcessor → TextMessageService → reply text
//!                                         ↓
//!                                   ReplySender (LINE reply API)
//! ```
//!
//! Signature verification of inbound deliveries is not performed here.

pub mod events;
pub mod processor;
pub mod reply;

#[cfg(test)]
mod testing;

pub use events::{parse_delivery, EventContext, InboundTextMessage, ParsedDelivery, PayloadError};
pub use processor::{DeliveryReport, TextMessageService, WebhookProcessor};
pub use reply::{LineReplyClient, ReplySender};

pub mod config;
pub mod errors;
pub mod intent;
pub mod memory;

pub use errors::{ApplicationError, DeliveryError, GatewayError, InterfaceError};
pub use intent::Intent;
pub use memory::{BoundedMemoryStore, ConversationMemory, MemoryPolicy};

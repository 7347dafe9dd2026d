//! Transport traits
//!
//! The client only needs a way to push a message towards the peer. Inbound
//! traffic reaches it through `Dispatcher::dispatch`.
use async_trait::async_trait;

use crate::error::Result;
use crate::message::Message;

/// Trait for sending messages to the peer
#[async_trait]
pub trait Sender: Send + Sync {
    /// Fire-and-forget send of one message
    async fn send_message(&self, message: &Message) -> Result<()>;
}

//! Inbound ports. The transport adapter calls into the application.

use crate::domain::{DomainError, Message};

/// Entry point for every incoming message read from the transport's update stream.
#[async_trait::async_trait]
pub trait IncomingPort: Send + Sync {
    async fn on_message(&self, message: Message);
}

/// One route target of the dispatch table.
#[async_trait::async_trait]
pub trait MessageHandler: Send + Sync {
    /// Handle `message`. `args` is the text after the command name (empty for predicate routes).
    async fn handle(&self, message: Message, args: String) -> Result<(), DomainError>;
}

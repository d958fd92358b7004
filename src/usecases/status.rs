//! Status sink backed by a chat reply that is edited in place.

use crate::domain::{DomainError, Message};
use crate::ports::{StatusSink, TgGateway};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;

/// First push replies to `anchor`; later pushes edit that reply.
pub struct ReplyStatus {
    tg: Arc<dyn TgGateway>,
    anchor: Message,
    status: Mutex<Option<Message>>,
}

impl ReplyStatus {
    pub fn new(tg: Arc<dyn TgGateway>, anchor: Message) -> Self {
        Self {
            tg,
            anchor,
            status: Mutex::new(None),
        }
    }
}

#[async_trait]
impl StatusSink for ReplyStatus {
    async fn push(&self, text: &str) -> Result<(), DomainError> {
        let mut status = self.status.lock().await;
        match status.as_ref() {
            Some(msg) => match self.tg.edit_text(msg, text).await {
                Err(DomainError::NotModified) => Ok(()),
                other => other,
            },
            None => {
                *status = Some(self.tg.reply(&self.anchor, text).await?);
                Ok(())
            }
        }
    }
}

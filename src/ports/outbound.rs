//! Outbound ports. Application calls into infrastructure.
//!
//! Implemented by adapters.

use crate::domain::{AnalysisError, AnalysisResult, Chat, ChatRef, DomainError, Message};
use std::path::{Path, PathBuf};

/// Telegram API gateway. Resolve chats, walk history, download media, edit captions.
///
/// Every call may fail with `DomainError::FloodWait`; permission problems surface as
/// `DomainError::Permission` and edits with unchanged content as `DomainError::NotModified`.
#[async_trait::async_trait]
pub trait TgGateway: Send + Sync {
    /// Resolve an id or handle to a concrete chat.
    async fn resolve_chat(&self, chat: &ChatRef) -> Result<Chat, DomainError>;

    /// Lazy message history of `chat` in transport order. `limit == 0` means unbounded.
    async fn history(
        &self,
        chat: &Chat,
        limit: usize,
    ) -> Result<Box<dyn HistoryCursor>, DomainError>;

    /// Download the media of `message` to `dest_path`. Returns the path actually written.
    async fn download_media(
        &self,
        message: &Message,
        dest_path: &Path,
    ) -> Result<PathBuf, DomainError>;

    /// Replace the text of `message` with plain `text` (status messages).
    async fn edit_text(&self, message: &Message, text: &str) -> Result<(), DomainError>;

    /// Replace the caption of `message` with HTML `markup`, as read from `Message::text`.
    async fn edit_caption(&self, message: &Message, markup: &str) -> Result<(), DomainError>;

    /// Send a plain-text reply to `message`. Returns the sent message.
    async fn reply(&self, message: &Message, text: &str) -> Result<Message, DomainError>;
}

/// Paginated message source. Pulls one message at a time.
#[async_trait::async_trait]
pub trait HistoryCursor: Send {
    /// Next message, or `None` when the history (or limit) is exhausted.
    async fn next(&mut self) -> Result<Option<Message>, DomainError>;
}

/// External media analysis program (e.g. `mediainfo`).
#[async_trait::async_trait]
pub trait MediaAnalyzer: Send + Sync {
    async fn analyze(&self, path: &Path) -> Result<AnalysisResult, AnalysisError>;
}

/// Operator-facing status display for long-running work.
#[async_trait::async_trait]
pub trait StatusSink: Send + Sync {
    /// Show `text` as the current status. Errors are recoverable for the caller.
    async fn push(&self, text: &str) -> Result<(), DomainError>;
}

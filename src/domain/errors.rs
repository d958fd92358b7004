//! Domain errors. Used by ports and use cases.
//!
//! Adapters map infrastructure errors into these. Every port call returns one of
//! these tags so callers can decide continue-vs-abort without unwinding.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Telegram gateway error: {0}")]
    TgGateway(String),

    /// Chat does not exist or is not visible to the bot.
    #[error("Chat not found: {0}")]
    ChatNotFound(String),

    /// Admin rights missing, not a participant, or channel is private. Fatal for a scan.
    #[error("Permission denied: {0}")]
    Permission(String),

    /// FloodWait error: caller should wait `seconds` before the next request.
    #[error("FloodWait: retry after {seconds} seconds")]
    FloodWait { seconds: u64 },

    /// Edit was rejected because the new content equals the current content.
    #[error("Message not modified")]
    NotModified,

    #[error("Media download failed: {0}")]
    Media(String),

    #[error("Media analysis failed: {0}")]
    Analysis(#[from] AnalysisError),

    #[error("I/O error: {0}")]
    Io(String),
}

impl DomainError {
    pub fn is_permission(&self) -> bool {
        matches!(self, DomainError::Permission(_))
    }
}

/// Failure of the external analysis program.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("analysis tool '{0}' not found (is it installed and in PATH?)")]
    ToolNotFound(String),

    #[error("analysis tool exited with {status}: {stderr}")]
    ToolExecution { status: String, stderr: String },

    #[error("could not decode analysis output: {0}")]
    MalformedOutput(String),

    #[error("analysis timed out after {0} seconds")]
    Timeout(u64),

    #[error("unexpected analysis error: {0}")]
    Unexpected(String),
}

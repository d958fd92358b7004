//! Route handlers: `/start`, `/processhistory` and direct file uploads.

use crate::domain::command::{ProcessHistoryArgs, START_TEXT};
use crate::domain::{DomainError, MediaType, Message, ScanEnd};
use crate::ports::{MessageHandler, TgGateway};
use crate::usecases::history_scanner::HistoryScanner;
use crate::usecases::item_processor::ItemProcessor;
use crate::usecases::status::ReplyStatus;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{error, info};

pub const SCAN_BUSY_TEXT: &str =
    "A history scan is already running. Try again when it has finished.";
pub const UPLOAD_PROCESSING_TEXT: &str = "Processing your file...";
pub const UPLOAD_DONE_TEXT: &str = "MediaInfo added to caption!";
pub const UPLOAD_FAILED_TEXT: &str = "Failed to process your file or add MediaInfo.";

/// `/start`: usage help.
pub struct StartHandler {
    tg: Arc<dyn TgGateway>,
}

impl StartHandler {
    pub fn new(tg: Arc<dyn TgGateway>) -> Self {
        Self { tg }
    }
}

#[async_trait]
impl MessageHandler for StartHandler {
    async fn handle(&self, message: Message, _args: String) -> Result<(), DomainError> {
        self.tg.reply(&message, START_TEXT).await?;
        Ok(())
    }
}

/// `/processhistory <chat> [limit]`. One scan at a time.
pub struct ProcessHistoryHandler {
    tg: Arc<dyn TgGateway>,
    scanner: Arc<HistoryScanner>,
    scan_slot: Arc<Semaphore>,
}

impl ProcessHistoryHandler {
    pub fn new(tg: Arc<dyn TgGateway>, scanner: Arc<HistoryScanner>) -> Self {
        Self {
            tg,
            scanner,
            scan_slot: Arc::new(Semaphore::new(1)),
        }
    }
}

#[async_trait]
impl MessageHandler for ProcessHistoryHandler {
    async fn handle(&self, message: Message, args: String) -> Result<(), DomainError> {
        let args = match ProcessHistoryArgs::parse(&args) {
            Ok(args) => args,
            Err(usage) => {
                self.tg.reply(&message, &usage.to_string()).await?;
                return Ok(());
            }
        };

        let Ok(_permit) = self.scan_slot.try_acquire() else {
            info!(chat = %args.chat, "scan rejected: another scan is running");
            self.tg.reply(&message, SCAN_BUSY_TEXT).await?;
            return Ok(());
        };

        info!(chat = %args.chat, limit = args.limit, "history scan requested");
        let sink = ReplyStatus::new(Arc::clone(&self.tg), message);
        let report = self.scanner.scan(&args.chat, args.limit, &sink).await;
        match &report.end {
            ScanEnd::Completed => info!(
                chat = %args.chat,
                scanned = report.progress.scanned,
                edited = report.progress.edited,
                failed = report.progress.failed,
                "history scan completed"
            ),
            end => error!(chat = %args.chat, end = ?end, "history scan did not complete"),
        }
        Ok(())
    }
}

/// Reactive mode: a user sends a file to the bot directly.
pub struct DirectUploadHandler {
    tg: Arc<dyn TgGateway>,
    processor: Arc<ItemProcessor>,
}

impl DirectUploadHandler {
    pub fn new(tg: Arc<dyn TgGateway>, processor: Arc<ItemProcessor>) -> Self {
        Self { tg, processor }
    }

    /// Route predicate: anything carrying a video, audio or document.
    pub fn accepts(message: &Message) -> bool {
        message.media.as_ref().is_some_and(|m| {
            matches!(
                m.media_type,
                MediaType::Video | MediaType::Audio | MediaType::Document
            )
        })
    }
}

#[async_trait]
impl MessageHandler for DirectUploadHandler {
    async fn handle(&self, message: Message, _args: String) -> Result<(), DomainError> {
        if message.analyzable_media().is_none() {
            info!(
                chat_id = message.chat_id,
                msg_id = message.id,
                mime = ?message.media.as_ref().and_then(|m| m.mime_type.as_deref()),
                "skipping direct document that is not audio/video"
            );
            return Ok(());
        }

        let status = self.tg.reply(&message, UPLOAD_PROCESSING_TEXT).await?;
        let text = match self.processor.process(&message, &message).await {
            Ok(outcome) if outcome.is_success() => UPLOAD_DONE_TEXT,
            Ok(outcome) => {
                info!(chat_id = message.chat_id, msg_id = message.id, outcome = ?outcome, "direct upload not captioned");
                UPLOAD_FAILED_TEXT
            }
            Err(e) => {
                error!(chat_id = message.chat_id, msg_id = message.id, error = %e, "direct upload failed");
                UPLOAD_FAILED_TEXT
            }
        };
        self.tg.edit_text(&status, text).await
    }
}

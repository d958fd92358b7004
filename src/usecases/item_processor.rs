//! Per-message pipeline: download -> analyze -> summarize -> merge caption -> edit -> cleanup.
//!
//! - Only `DomainError::Permission` escapes as `Err`; everything else becomes an outcome
//! - FloodWait sleeps `wait + margin` and reports `Failed(RateLimited)`; no self-retry
//! - The temp file is removed on every path

use crate::domain::{
    caption, DomainError, FailureReason, MediaReference, Message, ProcessingOutcome, Summary,
};
use crate::ports::{MediaAnalyzer, TgGateway};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Paths and pacing for the item pipeline.
#[derive(Debug, Clone)]
pub struct ProcessorSettings {
    pub temp_dir: PathBuf,
    /// Added to every FloodWait before giving the item up.
    pub flood_margin: Duration,
}

/// Which step of the pipeline an error came from.
#[derive(Debug, Clone, Copy)]
enum Stage {
    Download,
    Analysis,
    Edit,
}

/// Internal early exit of the pipeline, resolved into an outcome by `process`.
enum Halt {
    Fatal(DomainError),
    RateLimited(u64),
    Failed(FailureReason),
}

impl Halt {
    fn classify(stage: Stage, err: DomainError) -> Self {
        match err {
            DomainError::Permission(_) => Halt::Fatal(err),
            DomainError::FloodWait { seconds } => Halt::RateLimited(seconds),
            DomainError::Io(_) => Halt::Failed(FailureReason::Unexpected(err.to_string())),
            other => {
                let detail = other.to_string();
                Halt::Failed(match stage {
                    Stage::Download => FailureReason::Download(detail),
                    Stage::Analysis => FailureReason::Analysis(detail),
                    Stage::Edit => FailureReason::Edit(detail),
                })
            }
        }
    }
}

/// Processes one media message into a caption carrying its MediaInfo summary.
pub struct ItemProcessor {
    tg: Arc<dyn TgGateway>,
    analyzer: Arc<dyn MediaAnalyzer>,
    settings: ProcessorSettings,
}

impl ItemProcessor {
    pub fn new(
        tg: Arc<dyn TgGateway>,
        analyzer: Arc<dyn MediaAnalyzer>,
        settings: ProcessorSettings,
    ) -> Self {
        Self {
            tg,
            analyzer,
            settings,
        }
    }

    /// Download the media of `source`, analyze it and rewrite the caption of `target`.
    ///
    /// History items pass the same message as both; direct uploads may differ.
    ///
    /// # Errors
    /// Only permission-class failures (`DomainError::Permission`), which should abort
    /// the surrounding scan.
    pub async fn process(
        &self,
        source: &Message,
        target: &Message,
    ) -> Result<ProcessingOutcome, DomainError> {
        let Some(media) = source.analyzable_media() else {
            debug!(
                chat_id = source.chat_id,
                msg_id = source.id,
                "not audio/video media, skipping"
            );
            return Ok(ProcessingOutcome::SkippedNotMedia);
        };

        let temp_path = self.settings.temp_dir.join(media.temp_file_name());
        let result = self.run(source, target, media, &temp_path).await;
        remove_temp_file(&temp_path).await;

        match result {
            Ok(outcome) => Ok(outcome),
            Err(Halt::Fatal(e)) => {
                error!(chat_id = target.chat_id, msg_id = target.id, error = %e, "permission error, aborting");
                Err(e)
            }
            Err(Halt::RateLimited(seconds)) => {
                let pause = Duration::from_secs(seconds) + self.settings.flood_margin;
                warn!(
                    chat_id = target.chat_id,
                    msg_id = target.id,
                    wait_secs = seconds,
                    pause_secs = pause.as_secs(),
                    "FloodWait while processing item, pausing"
                );
                tokio::time::sleep(pause).await;
                Ok(ProcessingOutcome::Failed(FailureReason::RateLimited {
                    seconds,
                }))
            }
            Err(Halt::Failed(reason)) => {
                warn!(chat_id = target.chat_id, msg_id = target.id, reason = %reason, "item failed");
                Ok(ProcessingOutcome::Failed(reason))
            }
        }
    }

    async fn run(
        &self,
        source: &Message,
        target: &Message,
        media: &MediaReference,
        temp_path: &Path,
    ) -> Result<ProcessingOutcome, Halt> {
        info!(
            chat_id = source.chat_id,
            msg_id = source.id,
            file_id = media.file_id,
            size = media.size,
            path = %temp_path.display(),
            "downloading media"
        );
        let downloaded = self
            .tg
            .download_media(source, temp_path)
            .await
            .map_err(|e| Halt::classify(Stage::Download, e))?;

        match tokio::fs::try_exists(&downloaded).await {
            Ok(true) => {}
            Ok(false) => {
                return Err(Halt::Failed(FailureReason::Download(format!(
                    "file missing after download: {}",
                    downloaded.display()
                ))));
            }
            Err(e) => {
                remove_temp_file(&downloaded).await;
                return Err(Halt::classify(Stage::Download, DomainError::Io(e.to_string())));
            }
        }

        let result = self.analyzer.analyze(&downloaded).await;
        if downloaded != temp_path {
            remove_temp_file(&downloaded).await;
        }
        let analysis = result.map_err(|e| Halt::classify(Stage::Analysis, e.into()))?;

        let summary = Summary::extract(&analysis);
        let merged = caption::merge(&target.text, &summary);

        if merged == target.text {
            info!(
                chat_id = target.chat_id,
                msg_id = target.id,
                "caption already up-to-date"
            );
            return Ok(ProcessingOutcome::AlreadyCurrent);
        }

        match self.tg.edit_caption(target, &merged).await {
            Ok(()) => {
                info!(
                    chat_id = target.chat_id,
                    msg_id = target.id,
                    "caption edited"
                );
                Ok(ProcessingOutcome::EditedNewCaption)
            }
            Err(DomainError::NotModified) => {
                info!(
                    chat_id = target.chat_id,
                    msg_id = target.id,
                    "caption not modified"
                );
                Ok(ProcessingOutcome::AlreadyCurrent)
            }
            Err(e) => Err(Halt::classify(Stage::Edit, e)),
        }
    }
}

/// Delete a downloaded artifact if present. Failures are logged, never escalated.
async fn remove_temp_file(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!(path = %path.display(), "temp file deleted"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => error!(path = %path.display(), error = %e, "failed to delete temp file"),
    }
}

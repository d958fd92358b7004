//! Bulk mode: walk a chat's history and caption every qualifying media message.
//!
//! Resolving -> Scanning -> Reporting, or Scanning -> Aborted on a permission error,
//! a FloodWait from the history source, or a broken history stream.
//! One item is fully processed before the next one is pulled.

use crate::domain::scan::unresolved_text;
use crate::domain::{Chat, ChatRef, DomainError, ScanAbort, ScanEnd, ScanProgress};
use crate::ports::{StatusSink, TgGateway};
use crate::usecases::item_processor::ItemProcessor;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{error, info, warn};

/// Pacing of a history scan.
#[derive(Debug, Clone)]
pub struct ScanSettings {
    /// Pause after each processed media item (global rate limit).
    pub item_delay: Duration,
    /// Minimum time between progress snapshots, measured from the last successful push.
    pub progress_interval: Duration,
    /// Added to FloodWait durations returned by the status sink.
    pub flood_margin: Duration,
}

/// Result of one scan run.
#[derive(Debug, Clone)]
pub struct ScanReport {
    pub chat: Option<Chat>,
    pub progress: ScanProgress,
    pub end: ScanEnd,
}

/// History scanner. Owns the progress counters of its run.
pub struct HistoryScanner {
    tg: Arc<dyn TgGateway>,
    processor: Arc<ItemProcessor>,
    settings: ScanSettings,
}

impl HistoryScanner {
    pub fn new(
        tg: Arc<dyn TgGateway>,
        processor: Arc<ItemProcessor>,
        settings: ScanSettings,
    ) -> Self {
        Self {
            tg,
            processor,
            settings,
        }
    }

    /// Scan up to `limit` messages of `chat_ref` (0 = all), reporting to `sink`.
    pub async fn scan(&self, chat_ref: &ChatRef, limit: usize, sink: &dyn StatusSink) -> ScanReport {
        let chat = match self.tg.resolve_chat(chat_ref).await {
            Ok(chat) => chat,
            Err(e) => {
                warn!(chat = %chat_ref, error = %e, "could not resolve chat");
                let reason = e.to_string();
                self.push_final(sink, &unresolved_text(&chat_ref.to_string(), &reason))
                    .await;
                return ScanReport {
                    chat: None,
                    progress: ScanProgress::new(chat_ref.to_string(), limit),
                    end: ScanEnd::Unresolved(reason),
                };
            }
        };
        info!(chat_id = chat.id, title = %chat.title, limit, "target chat resolved");

        let mut progress = ScanProgress::new(chat.title.clone(), limit);
        if let Err(e) = sink.push(&progress.start_text()).await {
            warn!(chat_id = chat.id, error = %e, "could not post start status");
        }

        let end = match self.scan_messages(&chat, limit, sink, &mut progress).await {
            Ok(()) => {
                info!(
                    chat_id = chat.id,
                    scanned = progress.scanned,
                    edited = progress.edited,
                    failed = progress.failed,
                    "history scan finished"
                );
                self.push_final(sink, &progress.final_text()).await;
                ScanEnd::Completed
            }
            Err(abort) => {
                error!(
                    chat_id = chat.id,
                    reason = ?abort,
                    scanned = progress.scanned,
                    "history scan aborted"
                );
                self.push_final(sink, &progress.aborted_text(&abort)).await;
                ScanEnd::Aborted(abort)
            }
        };

        ScanReport {
            chat: Some(chat),
            progress,
            end,
        }
    }

    async fn scan_messages(
        &self,
        chat: &Chat,
        limit: usize,
        sink: &dyn StatusSink,
        progress: &mut ScanProgress,
    ) -> Result<(), ScanAbort> {
        let mut history = self.tg.history(chat, limit).await.map_err(abort_reason)?;
        let mut last_push = Instant::now();

        while let Some(message) = history.next().await.map_err(abort_reason)? {
            progress.scanned += 1;

            if message.analyzable_media().is_some() {
                info!(chat_id = chat.id, msg_id = message.id, "found media in history");
                let outcome = self
                    .processor
                    .process(&message, &message)
                    .await
                    .map_err(abort_reason)?;
                progress.record(&outcome);
                tokio::time::sleep(self.settings.item_delay).await;
            }

            if last_push.elapsed() >= self.settings.progress_interval {
                self.push_progress(sink, progress).await;
                last_push = Instant::now();
            }
        }
        Ok(())
    }

    /// Push a progress snapshot. Sink errors never abort the scan; FloodWait pauses first.
    async fn push_progress(&self, sink: &dyn StatusSink, progress: &ScanProgress) {
        match sink.push(&progress.progress_text()).await {
            Ok(()) => {}
            Err(DomainError::FloodWait { seconds }) => {
                warn!(wait_secs = seconds, "FloodWait on status update, pausing updates");
                tokio::time::sleep(Duration::from_secs(seconds) + self.settings.flood_margin)
                    .await;
            }
            Err(e) => error!(error = %e, "error updating status"),
        }
    }

    async fn push_final(&self, sink: &dyn StatusSink, text: &str) {
        if let Err(e) = sink.push(text).await {
            error!(error = %e, "could not post final status");
        }
    }
}

fn abort_reason(err: DomainError) -> ScanAbort {
    match err {
        DomainError::Permission(e) => ScanAbort::Permission(e),
        DomainError::FloodWait { seconds } => ScanAbort::RateLimited { seconds },
        other => ScanAbort::Unexpected(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::{
        media_message, test_chat, text_message, video_message, MockAnalyzer, MockTgGateway,
        RecordingSink,
    };
    use crate::domain::{AnalysisResult, MediaType, Message, Track};
    use crate::usecases::item_processor::ProcessorSettings;
    use std::path::Path;

    fn chat_ref() -> ChatRef {
        ChatRef::Username("testchannel".into())
    }

    fn scanner(tg: Arc<MockTgGateway>, dir: &Path) -> HistoryScanner {
        let analyzer = Arc::new(MockAnalyzer::returning(AnalysisResult::with_tracks(vec![
            Track::video(Some("AVC")),
        ])));
        let processor = Arc::new(ItemProcessor::new(
            tg.clone(),
            analyzer,
            ProcessorSettings {
                temp_dir: dir.to_path_buf(),
                flood_margin: Duration::from_secs(5),
            },
        ));
        HistoryScanner::new(
            tg,
            processor,
            ScanSettings {
                item_delay: Duration::from_secs(3),
                progress_interval: Duration::from_secs(15),
                flood_margin: Duration::from_secs(5),
            },
        )
    }

    fn gateway(history: Vec<Message>) -> MockTgGateway {
        MockTgGateway::new()
            .with_chat(chat_ref(), test_chat())
            .with_history(history.into_iter().map(Ok).collect())
    }

    #[tokio::test(start_paused = true)]
    async fn test_counts_mixed_history() {
        let dir = tempfile::tempdir().unwrap();
        let tg = Arc::new(
            gateway(vec![
                text_message(5, "hello"),
                video_message(4, "Episode 2"),
                media_message(3, "", MediaType::Photo, "image/jpeg"),
                video_message(2, "Episode 1"),
                text_message(1, "channel created"),
            ])
            .fail_download(2, DomainError::Media("FILE_REFERENCE_EXPIRED".into())),
        );
        let sink = RecordingSink::new();

        let report = scanner(tg.clone(), dir.path())
            .scan(&chat_ref(), 0, &sink)
            .await;

        assert_eq!(report.end, ScanEnd::Completed);
        assert_eq!(
            (report.progress.scanned, report.progress.edited, report.progress.failed),
            (5, 1, 1)
        );
        assert_eq!(tg.downloads(), vec![4, 2]);

        let texts = sink.texts();
        assert!(texts[0].starts_with("🚀 Starting history processing"));
        let last = texts.last().unwrap();
        assert!(last.contains("Finished"));
        assert!(last.contains("Total Scanned: 5\nEdited: 1\nFailed: 1"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_permission_error_aborts_scan() {
        let dir = tempfile::tempdir().unwrap();
        let tg = Arc::new(
            gateway(vec![
                video_message(5, ""),
                video_message(4, ""),
                video_message(3, ""),
                video_message(2, ""),
            ])
            .fail_edit(4, DomainError::Permission("CHAT_ADMIN_REQUIRED".into())),
        );
        let sink = RecordingSink::new();

        let report = scanner(tg.clone(), dir.path())
            .scan(&chat_ref(), 0, &sink)
            .await;

        assert_eq!(
            report.end,
            ScanEnd::Aborted(ScanAbort::Permission("CHAT_ADMIN_REQUIRED".into()))
        );
        assert_eq!(tg.downloads(), vec![5, 4]);
        assert_eq!(tg.pulled(), 2);
        assert_eq!(report.progress.scanned, 2);
        assert_eq!(report.progress.edited, 1);
        let last = sink.texts().pop().unwrap();
        assert!(last.contains("No permission"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_history_flood_wait_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let tg = Arc::new(
            MockTgGateway::new()
                .with_chat(chat_ref(), test_chat())
                .with_history(vec![
                    Ok(text_message(3, "a")),
                    Err(DomainError::FloodWait { seconds: 120 }),
                    Ok(video_message(1, "")),
                ]),
        );
        let sink = RecordingSink::new();

        let report = scanner(tg.clone(), dir.path())
            .scan(&chat_ref(), 0, &sink)
            .await;

        assert_eq!(
            report.end,
            ScanEnd::Aborted(ScanAbort::RateLimited { seconds: 120 })
        );
        assert!(tg.downloads().is_empty());
        assert!(sink.texts().pop().unwrap().contains("FloodWait 120s"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unresolved_chat_never_scans() {
        let dir = tempfile::tempdir().unwrap();
        let tg = Arc::new(gateway(vec![video_message(1, "")]));
        let sink = RecordingSink::new();

        let missing = ChatRef::Username("nope".into());
        let report = scanner(tg.clone(), dir.path()).scan(&missing, 0, &sink).await;

        assert!(matches!(report.end, ScanEnd::Unresolved(_)));
        assert_eq!(tg.pulled(), 0);
        let texts = sink.texts();
        assert_eq!(texts.len(), 1);
        assert!(texts[0].starts_with("Could not access/find chat: \"@nope\""));
    }

    #[tokio::test(start_paused = true)]
    async fn test_limit_bounds_history() {
        let dir = tempfile::tempdir().unwrap();
        let tg = Arc::new(gateway((1..=10).rev().map(|i| text_message(i, "t")).collect()));
        let sink = RecordingSink::new();

        let report = scanner(tg.clone(), dir.path())
            .scan(&chat_ref(), 4, &sink)
            .await;

        assert_eq!(report.progress.scanned, 4);
        assert_eq!(report.progress.limit, 4);
        assert!(sink.texts()[0].contains("Limit: 4 msgs"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_progress_snapshots_every_interval() {
        let dir = tempfile::tempdir().unwrap();
        let tg = Arc::new(gateway((1..=6).rev().map(|i| video_message(i, "")).collect()));
        let sink = RecordingSink::new();

        let report = scanner(tg.clone(), dir.path())
            .scan(&chat_ref(), 0, &sink)
            .await;

        assert_eq!(report.progress.edited, 6);
        let progress: Vec<String> = sink
            .texts()
            .into_iter()
            .filter(|t| t.starts_with("⏳ Progress"))
            .collect();
        assert_eq!(progress.len(), 1);
        assert!(progress[0].contains("Scanned: 5"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sink_flood_wait_does_not_abort() {
        let dir = tempfile::tempdir().unwrap();
        let tg = Arc::new(gateway((1..=6).rev().map(|i| video_message(i, "")).collect()));
        let sink = RecordingSink::new();
        // Attempt 1 is the start status, attempt 2 the first progress snapshot.
        sink.fail_attempt(2, DomainError::FloodWait { seconds: 10 });

        let started = Instant::now();
        let report = scanner(tg.clone(), dir.path())
            .scan(&chat_ref(), 0, &sink)
            .await;

        assert_eq!(report.end, ScanEnd::Completed);
        assert_eq!(report.progress.edited, 6);
        assert!(started.elapsed() >= Duration::from_secs(18 + 15));
        let texts = sink.texts();
        assert_eq!(texts.len(), 2);
        assert!(texts[1].contains("Finished"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sink_errors_do_not_abort() {
        let dir = tempfile::tempdir().unwrap();
        let tg = Arc::new(gateway(vec![video_message(1, "")]));
        let sink = RecordingSink::new();
        sink.fail_attempt(1, DomainError::TgGateway("MESSAGE_ID_INVALID".into()));

        let report = scanner(tg.clone(), dir.path())
            .scan(&chat_ref(), 0, &sink)
            .await;

        assert_eq!(report.end, ScanEnd::Completed);
        assert_eq!(report.progress.edited, 1);
    }
}

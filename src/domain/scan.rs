//! Scan bookkeeping: per-item outcomes, progress counters and operator-facing texts.

use std::fmt;

/// Result of processing one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessingOutcome {
    EditedNewCaption,
    AlreadyCurrent,
    SkippedNotMedia,
    Failed(FailureReason),
}

impl ProcessingOutcome {
    /// Caption now carries the current summary (edited or already there).
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            ProcessingOutcome::EditedNewCaption | ProcessingOutcome::AlreadyCurrent
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    Download(String),
    Analysis(String),
    RateLimited { seconds: u64 },
    Edit(String),
    Unexpected(String),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Download(e) => write!(f, "download failed: {}", e),
            FailureReason::Analysis(e) => write!(f, "analysis failed: {}", e),
            FailureReason::RateLimited { seconds } => write!(f, "rate limited ({}s)", seconds),
            FailureReason::Edit(e) => write!(f, "caption edit failed: {}", e),
            FailureReason::Unexpected(e) => write!(f, "unexpected error: {}", e),
        }
    }
}

/// Counters for one history scan. Monotonic within a run; never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanProgress {
    pub chat_title: String,
    /// 0 = whole history.
    pub limit: usize,
    pub scanned: u64,
    pub edited: u64,
    pub failed: u64,
}

impl ScanProgress {
    pub fn new(chat_title: impl Into<String>, limit: usize) -> Self {
        Self {
            chat_title: chat_title.into(),
            limit,
            scanned: 0,
            edited: 0,
            failed: 0,
        }
    }

    /// Count one outcome. Skipped messages touch neither counter.
    pub fn record(&mut self, outcome: &ProcessingOutcome) {
        match outcome {
            ProcessingOutcome::EditedNewCaption | ProcessingOutcome::AlreadyCurrent => {
                self.edited += 1
            }
            ProcessingOutcome::Failed(_) => self.failed += 1,
            ProcessingOutcome::SkippedNotMedia => {}
        }
    }

    fn limit_label(&self) -> String {
        if self.limit == 0 {
            "all".to_string()
        } else {
            self.limit.to_string()
        }
    }

    pub fn start_text(&self) -> String {
        format!(
            "🚀 Starting history processing for: \"{}\" (Limit: {} msgs).\nThis may take time.",
            self.chat_title,
            self.limit_label()
        )
    }

    pub fn progress_text(&self) -> String {
        format!(
            "⏳ Progress for: \"{}\"\nScanned: {}\nEdited: {}\nFailed: {}",
            self.chat_title, self.scanned, self.edited, self.failed
        )
    }

    pub fn final_text(&self) -> String {
        format!(
            "✅ Finished for: \"{}\".\n\nTotal Scanned: {}\nEdited: {}\nFailed: {}",
            self.chat_title, self.scanned, self.edited, self.failed
        )
    }

    pub fn aborted_text(&self, reason: &ScanAbort) -> String {
        let headline = match reason {
            ScanAbort::Permission(e) => format!(
                "❌ Error: No permission for chat \"{}\". Details: {}",
                self.chat_title, e
            ),
            ScanAbort::RateLimited { seconds } => format!(
                "❌ Operation for \"{}\" paused (FloodWait {}s). Try later.",
                self.chat_title, seconds
            ),
            ScanAbort::Unexpected(e) => {
                format!("❌ Unexpected error for \"{}\": {}", self.chat_title, e)
            }
        };
        format!(
            "{}\n\nScanned: {}\nEdited: {}\nFailed: {}",
            headline, self.scanned, self.edited, self.failed
        )
    }
}

/// Why a scan stopped before exhausting the history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanAbort {
    Permission(String),
    RateLimited { seconds: u64 },
    Unexpected(String),
}

/// Terminal state of a scan run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanEnd {
    /// History exhausted; final report pushed.
    Completed,
    Aborted(ScanAbort),
    /// Chat could not be resolved; scanning never started.
    Unresolved(String),
}

pub fn unresolved_text(input: &str, error: &str) -> String {
    format!("Could not access/find chat: \"{}\". Error: {}", input, error)
}

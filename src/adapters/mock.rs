//! In-memory port implementations for tests.
//!
//! `MockTgGateway` serves a scripted history and records downloads, edits and replies.
//! Caption and text edits share one record and one failure script.
//! Downloads write a small placeholder file so the temp-file lifecycle is real.

use crate::domain::{
    AnalysisError, AnalysisResult, Chat, ChatRef, DomainError, MediaReference, MediaType, Message,
    MessageHandle,
};
use crate::ports::{HistoryCursor, MediaAnalyzer, StatusSink, TgGateway};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const CHAT_ID: i64 = -1001234567890;

pub fn text_message(id: i32, text: &str) -> Message {
    Message {
        id,
        chat_id: CHAT_ID,
        text: text.to_string(),
        media: None,
        handle: MessageHandle::empty(),
    }
}

pub fn media_message(id: i32, caption: &str, media_type: MediaType, mime: &str) -> Message {
    Message {
        media: Some(MediaReference {
            file_id: 9000 + i64::from(id),
            file_name: Some(format!("clip {}.mkv", id)),
            mime_type: Some(mime.to_string()),
            media_type,
            size: 4096,
        }),
        ..text_message(id, caption)
    }
}

pub fn video_message(id: i32, caption: &str) -> Message {
    media_message(id, caption, MediaType::Video, "video/mp4")
}

pub fn test_chat() -> Chat {
    Chat {
        id: CHAT_ID,
        title: "Test Channel".to_string(),
        username: Some("testchannel".to_string()),
    }
}

type Script = Arc<Mutex<VecDeque<Result<Message, DomainError>>>>;

#[derive(Default)]
pub struct MockTgGateway {
    chats: HashMap<ChatRef, Chat>,
    history: Script,
    pulled: Arc<AtomicUsize>,
    download_failures: HashMap<i32, DomainError>,
    missing_files: HashSet<i32>,
    edit_failures: HashMap<i32, DomainError>,
    reply_failure: Option<DomainError>,
    downloads: Mutex<Vec<i32>>,
    edits: Mutex<Vec<(i32, String)>>,
    replies: Mutex<Vec<(i32, String)>>,
}

impl MockTgGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_chat(mut self, chat_ref: ChatRef, chat: Chat) -> Self {
        self.chats.insert(chat_ref, chat);
        self
    }

    pub fn with_history(self, messages: Vec<Result<Message, DomainError>>) -> Self {
        *self.history.lock().unwrap() = messages.into();
        self
    }

    pub fn fail_download(mut self, msg_id: i32, err: DomainError) -> Self {
        self.download_failures.insert(msg_id, err);
        self
    }

    /// Download reports success but writes nothing.
    pub fn lose_download(mut self, msg_id: i32) -> Self {
        self.missing_files.insert(msg_id);
        self
    }

    pub fn fail_edit(mut self, msg_id: i32, err: DomainError) -> Self {
        self.edit_failures.insert(msg_id, err);
        self
    }

    pub fn fail_replies(mut self, err: DomainError) -> Self {
        self.reply_failure = Some(err);
        self
    }

    pub fn downloads(&self) -> Vec<i32> {
        self.downloads.lock().unwrap().clone()
    }

    pub fn edits(&self) -> Vec<(i32, String)> {
        self.edits.lock().unwrap().clone()
    }

    pub fn replies(&self) -> Vec<(i32, String)> {
        self.replies.lock().unwrap().clone()
    }

    /// Messages handed out by history cursors so far.
    pub fn pulled(&self) -> usize {
        self.pulled.load(Ordering::SeqCst)
    }
}

struct MockCursor {
    script: Script,
    pulled: Arc<AtomicUsize>,
    remaining: Option<usize>,
}

#[async_trait]
impl HistoryCursor for MockCursor {
    async fn next(&mut self) -> Result<Option<Message>, DomainError> {
        if self.remaining == Some(0) {
            return Ok(None);
        }
        let item = self.script.lock().unwrap().pop_front();
        match item {
            Some(Ok(msg)) => {
                self.pulled.fetch_add(1, Ordering::SeqCst);
                if let Some(n) = self.remaining.as_mut() {
                    *n -= 1;
                }
                Ok(Some(msg))
            }
            Some(Err(e)) => Err(e),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl TgGateway for MockTgGateway {
    async fn resolve_chat(&self, chat: &ChatRef) -> Result<Chat, DomainError> {
        self.chats
            .get(chat)
            .cloned()
            .ok_or_else(|| DomainError::ChatNotFound(chat.to_string()))
    }

    async fn history(
        &self,
        _chat: &Chat,
        limit: usize,
    ) -> Result<Box<dyn HistoryCursor>, DomainError> {
        Ok(Box::new(MockCursor {
            script: Arc::clone(&self.history),
            pulled: Arc::clone(&self.pulled),
            remaining: (limit > 0).then_some(limit),
        }))
    }

    async fn download_media(
        &self,
        message: &Message,
        dest_path: &Path,
    ) -> Result<PathBuf, DomainError> {
        self.downloads.lock().unwrap().push(message.id);
        if let Some(err) = self.download_failures.get(&message.id) {
            return Err(err.clone());
        }
        if !self.missing_files.contains(&message.id) {
            std::fs::write(dest_path, b"fake media payload")
                .map_err(|e| DomainError::Io(e.to_string()))?;
        }
        Ok(dest_path.to_path_buf())
    }

    async fn edit_text(&self, message: &Message, text: &str) -> Result<(), DomainError> {
        if let Some(err) = self.edit_failures.get(&message.id) {
            return Err(err.clone());
        }
        self.edits
            .lock()
            .unwrap()
            .push((message.id, text.to_string()));
        Ok(())
    }

    async fn edit_caption(&self, message: &Message, markup: &str) -> Result<(), DomainError> {
        self.edit_text(message, markup).await
    }

    async fn reply(&self, message: &Message, text: &str) -> Result<Message, DomainError> {
        if let Some(err) = &self.reply_failure {
            return Err(err.clone());
        }
        let mut replies = self.replies.lock().unwrap();
        replies.push((message.id, text.to_string()));
        Ok(Message {
            id: 50_000 + replies.len() as i32,
            chat_id: message.chat_id,
            text: text.to_string(),
            media: None,
            handle: MessageHandle::empty(),
        })
    }
}

type AnalyzeFn = dyn Fn(&Path) -> Result<AnalysisResult, AnalysisError> + Send + Sync;

/// Analyzer driven by a closure; records whether the file existed when analyzed.
pub struct MockAnalyzer {
    respond: Box<AnalyzeFn>,
    seen: Mutex<Vec<(PathBuf, bool)>>,
}

impl MockAnalyzer {
    pub fn new(
        respond: impl Fn(&Path) -> Result<AnalysisResult, AnalysisError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            respond: Box::new(respond),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn returning(result: AnalysisResult) -> Self {
        Self::new(move |_| Ok(result.clone()))
    }

    pub fn failing(err: AnalysisError) -> Self {
        Self::new(move |_| Err(err.clone()))
    }

    /// (path, existed) for every call.
    pub fn seen(&self) -> Vec<(PathBuf, bool)> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaAnalyzer for MockAnalyzer {
    async fn analyze(&self, path: &Path) -> Result<AnalysisResult, AnalysisError> {
        self.seen
            .lock()
            .unwrap()
            .push((path.to_path_buf(), path.exists()));
        (self.respond)(path)
    }
}

/// Sink that records every pushed text; individual push attempts can be scripted to fail.
#[derive(Default)]
pub struct RecordingSink {
    texts: Mutex<Vec<String>>,
    attempts: AtomicUsize,
    failures: Mutex<HashMap<usize, DomainError>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the `n`-th push attempt (1-based) with `err`.
    pub fn fail_attempt(&self, n: usize, err: DomainError) {
        self.failures.lock().unwrap().insert(n, err);
    }

    pub fn texts(&self) -> Vec<String> {
        self.texts.lock().unwrap().clone()
    }
}

#[async_trait]
impl StatusSink for RecordingSink {
    async fn push(&self, text: &str) -> Result<(), DomainError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(err) = self.failures.lock().unwrap().remove(&attempt) {
            return Err(err);
        }
        self.texts.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

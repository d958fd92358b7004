//! Implements TgGateway using grammers Client.
//!
//! RPC failures are tagged (FloodWait, Permission, NotModified, ChatNotFound)
//! and returned; callers decide whether to wait, skip or abort.

use crate::adapters::telegram::mapper::{self, TgHandle};
use crate::domain::{Chat, ChatRef, DomainError, Message};
use crate::ports::{HistoryCursor, TgGateway};
use async_trait::async_trait;
use grammers_client::grammers_tl_types as tl;
use grammers_client::types::Peer;
use grammers_client::{Client, InputMessage};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, warn};

#[derive(Clone)]
struct CachedPeer {
    peer: Peer,
    input: tl::enums::InputPeer,
}

/// Telegram gateway adapter. `Client` is cheap to clone; no outer lock.
pub struct GrammersTgGateway {
    client: Client,
    /// Resolved peers by Bot API id, so history and edits never re-resolve.
    peer_cache: Mutex<HashMap<i64, CachedPeer>>,
}

impl GrammersTgGateway {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            peer_cache: Mutex::new(HashMap::new()),
        }
    }

    async fn cache_peer(&self, peer: Peer) -> Result<Chat, DomainError> {
        let chat = mapper::chat_from_peer(&peer);
        let peer_ref = peer
            .to_ref()
            .await
            .ok_or_else(|| DomainError::TgGateway("peer not in session cache".into()))?;
        let input: tl::enums::InputPeer = peer_ref.into();
        self.peer_cache
            .lock()
            .await
            .insert(chat.id, CachedPeer { peer, input });
        Ok(chat)
    }

    /// Input peer for an incoming message's chat: cached if resolved, bare otherwise.
    pub async fn input_peer_for(&self, chat_id: i64) -> tl::enums::InputPeer {
        match self.peer_cache.lock().await.get(&chat_id) {
            Some(cached) => cached.input.clone(),
            None => mapper::bare_input_peer(chat_id),
        }
    }

    /// Map a live update into a domain Message.
    pub async fn message_from_update(
        &self,
        msg: &grammers_client::types::update::Message,
    ) -> Message {
        let chat_id = msg.peer_id().bot_api_dialog_id();
        let peer = self.input_peer_for(chat_id).await;
        mapper::message_to_domain(msg.id(), chat_id, &msg.html_text(), msg.media(), peer)
    }
}

fn handle_of(message: &Message) -> Result<&TgHandle, DomainError> {
    message
        .handle
        .downcast_ref::<TgHandle>()
        .ok_or_else(|| DomainError::TgGateway(format!("message {} has no peer", message.id)))
}

/// Cached entry for `chat_id`. Bots cannot list dialogs, so an id the bot has not
/// resolved before (by username) is reported as not found.
fn cached<T: Clone>(cache: &HashMap<i64, T>, chat_id: i64) -> Result<T, DomainError> {
    cache.get(&chat_id).cloned().ok_or_else(|| {
        DomainError::ChatNotFound(format!(
            "{} is not known to the bot yet; use the @username form",
            chat_id
        ))
    })
}

type HistoryItem = Result<Option<Message>, DomainError>;

/// Pull-driven history: a task walks the server iterator one item ahead of the consumer.
/// The producer always ends with `Ok(None)` or an error; a channel closed before that
/// means the producer died.
struct ChannelCursor {
    rx: mpsc::Receiver<HistoryItem>,
    finished: bool,
}

impl ChannelCursor {
    fn new(rx: mpsc::Receiver<HistoryItem>) -> Self {
        Self {
            rx,
            finished: false,
        }
    }
}

#[async_trait]
impl HistoryCursor for ChannelCursor {
    async fn next(&mut self) -> Result<Option<Message>, DomainError> {
        if self.finished {
            return Ok(None);
        }
        match self.rx.recv().await {
            Some(item) => {
                self.finished = !matches!(item, Ok(Some(_)));
                item
            }
            None => {
                self.finished = true;
                Err(DomainError::TgGateway("history stream closed before the end".into()))
            }
        }
    }
}

#[async_trait]
impl TgGateway for GrammersTgGateway {
    async fn resolve_chat(&self, chat: &ChatRef) -> Result<Chat, DomainError> {
        let peer = match chat {
            ChatRef::Username(name) => self
                .client
                .resolve_username(name)
                .await
                .map_err(|e| mapper::map_invocation(&e))?,
            ChatRef::Id(id) => {
                let entry = cached(&*self.peer_cache.lock().await, *id)?;
                return Ok(mapper::chat_from_peer(&entry.peer));
            }
        };
        let peer = peer.ok_or_else(|| DomainError::ChatNotFound(chat.to_string()))?;
        let resolved = self.cache_peer(peer).await?;
        debug!(chat_id = resolved.id, title = %resolved.title, "chat resolved");
        Ok(resolved)
    }

    async fn history(
        &self,
        chat: &Chat,
        limit: usize,
    ) -> Result<Box<dyn HistoryCursor>, DomainError> {
        let entry = cached(&*self.peer_cache.lock().await, chat.id)?;

        let (tx, rx) = mpsc::channel(1);
        let client = self.client.clone();
        let chat_id = chat.id;
        tokio::spawn(async move {
            let mut iter = client.iter_messages(&entry.peer);
            if limit > 0 {
                iter = iter.limit(limit);
            }
            loop {
                let item = match iter.next().await {
                    Ok(Some(m)) => Ok(Some(mapper::message_to_domain(
                        m.id(),
                        chat_id,
                        &m.html_text(),
                        m.media(),
                        entry.input.clone(),
                    ))),
                    Ok(None) => Ok(None),
                    Err(e) => {
                        warn!(chat_id, error = %e, "history fetch failed");
                        Err(mapper::map_invocation(&e))
                    }
                };
                let last = !matches!(item, Ok(Some(_)));
                if tx.send(item).await.is_err() || last {
                    break;
                }
            }
        });
        Ok(Box::new(ChannelCursor::new(rx)))
    }

    async fn download_media(
        &self,
        message: &Message,
        dest_path: &Path,
    ) -> Result<PathBuf, DomainError> {
        let media = handle_of(message)?
            .media
            .as_ref()
            .ok_or_else(|| DomainError::Media("message has no media".into()))?;

        self.client
            .download_media(media, dest_path)
            .await
            .map_err(|e| DomainError::Media(e.to_string()))?;

        debug!(
            chat_id = message.chat_id,
            msg_id = message.id,
            path = %dest_path.display(),
            "media downloaded"
        );
        Ok(dest_path.to_path_buf())
    }

    async fn edit_text(&self, message: &Message, text: &str) -> Result<(), DomainError> {
        let peer = handle_of(message)?.peer.clone();
        self.client
            .edit_message(peer, message.id, InputMessage::new().text(text))
            .await
            .map_err(|e| mapper::map_invocation(&e))?;
        Ok(())
    }

    async fn edit_caption(&self, message: &Message, markup: &str) -> Result<(), DomainError> {
        let peer = handle_of(message)?.peer.clone();
        self.client
            .edit_message(peer, message.id, InputMessage::new().html(markup))
            .await
            .map_err(|e| mapper::map_invocation(&e))?;
        Ok(())
    }

    async fn reply(&self, message: &Message, text: &str) -> Result<Message, DomainError> {
        let peer = handle_of(message)?.peer.clone();
        let sent = self
            .client
            .send_message(
                peer.clone(),
                InputMessage::new().text(text).reply_to(Some(message.id)),
            )
            .await
            .map_err(|e| mapper::map_invocation(&e))?;
        Ok(mapper::message_to_domain(
            sent.id(),
            message.chat_id,
            text,
            None,
            peer,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::text_message;

    #[test]
    fn test_uncached_id_is_not_found() {
        let mut cache = HashMap::new();
        cache.insert(-1001234567890_i64, "chan");
        assert_eq!(cached(&cache, -1001234567890), Ok("chan"));
        assert!(matches!(
            cached(&cache, -1009999999999),
            Err(DomainError::ChatNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_cursor_ends_after_terminal_item() {
        let (tx, rx) = mpsc::channel(4);
        tx.send(Ok(Some(text_message(1, "a")))).await.unwrap();
        tx.send(Ok(None)).await.unwrap();
        drop(tx);

        let mut cursor = ChannelCursor::new(rx);
        assert_eq!(cursor.next().await.unwrap().map(|m| m.id), Some(1));
        assert!(cursor.next().await.unwrap().is_none());
        assert!(cursor.next().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_cursor_reports_dead_producer() {
        let (tx, rx) = mpsc::channel(4);
        tx.send(Ok(Some(text_message(1, "a")))).await.unwrap();
        drop(tx);

        let mut cursor = ChannelCursor::new(rx);
        assert!(cursor.next().await.unwrap().is_some());
        assert!(matches!(
            cursor.next().await,
            Err(DomainError::TgGateway(_))
        ));
    }

    #[tokio::test]
    async fn test_cursor_passes_errors_through_once() {
        let (tx, rx) = mpsc::channel(4);
        tx.send(Err(DomainError::FloodWait { seconds: 9 }))
            .await
            .unwrap();
        drop(tx);

        let mut cursor = ChannelCursor::new(rx);
        assert_eq!(
            cursor.next().await.unwrap_err(),
            DomainError::FloodWait { seconds: 9 }
        );
        assert!(cursor.next().await.unwrap().is_none());
    }
}

//! Domain entities. Pure data structures for the core business.
//!
//! No Telegram/IO types here; adapters map into these.

use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Operator-supplied chat reference, as typed after `/processhistory`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ChatRef {
    /// Bot-API dialog id (e.g. `-1001234567890`).
    Id(i64),
    /// Public handle without the leading `@`.
    Username(String),
}

impl ChatRef {
    /// Parse `-100123`, `@name`, `name`, `t.me/name` or `https://t.me/name`.
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        if input.is_empty() {
            return None;
        }
        if let Ok(id) = input.parse::<i64>() {
            return Some(ChatRef::Id(id));
        }
        let username = input
            .trim_start_matches("https://")
            .trim_start_matches("http://")
            .trim_start_matches("t.me/")
            .trim_start_matches('@')
            .trim_end_matches('/');
        if username.is_empty() {
            None
        } else {
            Some(ChatRef::Username(username.to_string()))
        }
    }
}

impl fmt::Display for ChatRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatRef::Id(id) => write!(f, "{}", id),
            ChatRef::Username(name) => write!(f, "@{}", name),
        }
    }
}

/// A resolved Telegram chat (user, group, or channel).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chat {
    pub id: i64,
    pub title: String,
    pub username: Option<String>,
}

/// Opaque transport handle attached to a message.
///
/// Adapters store their native message object here so download/edit can act on it
/// without re-fetching. The domain never looks inside.
#[derive(Clone)]
pub struct MessageHandle(Arc<dyn Any + Send + Sync>);

impl MessageHandle {
    pub fn new<T: Any + Send + Sync>(inner: T) -> Self {
        Self(Arc::new(inner))
    }

    /// Handle with no transport payload (tests, synthetic messages).
    pub fn empty() -> Self {
        Self::new(())
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }
}

impl fmt::Debug for MessageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MessageHandle(..)")
    }
}

/// A single message from a chat, either from history or a live update.
#[derive(Debug, Clone)]
pub struct Message {
    pub id: i32,
    pub chat_id: i64,
    /// Message text, or the caption for media messages.
    pub text: String,
    pub media: Option<MediaReference>,
    pub handle: MessageHandle,
}

impl Message {
    /// Private dialogs with users have positive bot-API ids.
    pub fn is_private(&self) -> bool {
        self.chat_id > 0
    }

    /// Media attached to this message that the analyzer can handle.
    pub fn analyzable_media(&self) -> Option<&MediaReference> {
        self.media.as_ref().filter(|m| m.is_analyzable())
    }
}

/// Reference to a downloadable file attached to a message. Immutable once mapped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaReference {
    /// Unique file identifier (Telegram document id).
    pub file_id: i64,
    pub file_name: Option<String>,
    pub mime_type: Option<String>,
    pub media_type: MediaType,
    pub size: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Video,
    Audio,
    /// Generic document; qualifies only with an audio/video MIME type.
    Document,
    Photo,
    Other,
}

impl MediaReference {
    /// Video, audio, or a document whose MIME type is audio/video.
    pub fn is_analyzable(&self) -> bool {
        match self.media_type {
            MediaType::Video | MediaType::Audio => true,
            MediaType::Document => self
                .mime_type
                .as_deref()
                .is_some_and(|m| m.contains("video/") || m.contains("audio/")),
            MediaType::Photo | MediaType::Other => false,
        }
    }

    /// Collision-resistant temp file name: `<file_id>_<name>`, restricted to `[A-Za-z0-9._-]`.
    pub fn temp_file_name(&self) -> String {
        let name = self.file_name.as_deref().unwrap_or("unknown_file");
        format!("{}_{}", self.file_id, name)
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                    c
                } else {
                    '_'
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn media(media_type: MediaType, mime: Option<&str>, name: Option<&str>) -> MediaReference {
        MediaReference {
            file_id: 5012,
            file_name: name.map(String::from),
            mime_type: mime.map(String::from),
            media_type,
            size: 1024,
        }
    }

    #[test]
    fn test_chat_ref_parse() {
        assert_eq!(ChatRef::parse("-1001234567890"), Some(ChatRef::Id(-1001234567890)));
        assert_eq!(
            ChatRef::parse("@mychannel"),
            Some(ChatRef::Username("mychannel".into()))
        );
        assert_eq!(
            ChatRef::parse("https://t.me/mychannel"),
            Some(ChatRef::Username("mychannel".into()))
        );
        assert_eq!(ChatRef::parse("   "), None);
        assert_eq!(ChatRef::parse("@"), None);
    }

    #[test]
    fn test_analyzable_classification() {
        assert!(media(MediaType::Video, None, None).is_analyzable());
        assert!(media(MediaType::Audio, Some("audio/ogg"), None).is_analyzable());
        assert!(media(MediaType::Document, Some("video/x-matroska"), None).is_analyzable());
        assert!(!media(MediaType::Document, Some("application/pdf"), None).is_analyzable());
        assert!(!media(MediaType::Document, None, None).is_analyzable());
        assert!(!media(MediaType::Photo, Some("image/jpeg"), None).is_analyzable());
    }

    #[test]
    fn test_temp_file_name_sanitized() {
        let m = media(MediaType::Video, None, Some("My Movie (2024)/ä.mkv"));
        assert_eq!(m.temp_file_name(), "5012_My_Movie__2024___.mkv");

        let unnamed = media(MediaType::Audio, None, None);
        assert_eq!(unnamed.temp_file_name(), "5012_unknown_file");
    }
}

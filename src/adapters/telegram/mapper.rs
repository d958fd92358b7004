//! Map Grammers types to domain entities and RPC failures to DomainError tags.

use crate::domain::{Chat, DomainError, MediaReference, MediaType, Message, MessageHandle};
use grammers_client::grammers_tl_types as tl;
use grammers_client::types::{Media, Peer};
use grammers_client::InvocationError;

/// Bot API ids of channels and supergroups are `-100xxxxxxxxxx`.
const CHANNEL_ID_OFFSET: i64 = 1_000_000_000_000;

/// Adapter-private payload carried in `Message::handle`.
pub struct TgHandle {
    pub peer: tl::enums::InputPeer,
    pub media: Option<Media>,
}

pub fn chat_from_peer(peer: &Peer) -> Chat {
    let id = peer.id().bot_api_dialog_id();
    Chat {
        id,
        title: peer
            .name()
            .map(String::from)
            .unwrap_or_else(|| id.to_string()),
        username: peer.username().map(String::from),
    }
}

/// Input peer from a bare Bot API id, without an access hash.
/// Works for users that have talked to the bot; channels need a resolved peer.
pub fn bare_input_peer(chat_id: i64) -> tl::enums::InputPeer {
    if chat_id > 0 {
        tl::enums::InputPeer::User(tl::types::InputPeerUser {
            user_id: chat_id,
            access_hash: 0,
        })
    } else if chat_id <= -CHANNEL_ID_OFFSET {
        tl::enums::InputPeer::Channel(tl::types::InputPeerChannel {
            channel_id: -chat_id - CHANNEL_ID_OFFSET,
            access_hash: 0,
        })
    } else {
        tl::enums::InputPeer::Chat(tl::types::InputPeerChat { chat_id: -chat_id })
    }
}

/// Document attributes that make a video/audio MIME type something other than a
/// captionable video or audio file.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DocumentFlags {
    pub animated: bool,
    pub voice: bool,
    pub round_video: bool,
    pub sticker: bool,
}

impl DocumentFlags {
    pub fn from_attributes(attributes: &[tl::enums::DocumentAttribute]) -> Self {
        let mut flags = Self::default();
        for attribute in attributes {
            match attribute {
                tl::enums::DocumentAttribute::Animated => flags.animated = true,
                tl::enums::DocumentAttribute::Sticker(_) => flags.sticker = true,
                tl::enums::DocumentAttribute::Audio(a) if a.voice => flags.voice = true,
                tl::enums::DocumentAttribute::Video(v) if v.round_message => {
                    flags.round_video = true
                }
                _ => {}
            }
        }
        flags
    }

    fn any(self) -> bool {
        self.animated || self.voice || self.round_video || self.sticker
    }
}

/// GIFs, voice notes, round videos and stickers are never analyzed.
pub fn media_type_for_document(mime: Option<&str>, flags: DocumentFlags) -> MediaType {
    if flags.any() {
        MediaType::Other
    } else {
        media_type_for_mime(mime)
    }
}

pub fn media_type_for_mime(mime: Option<&str>) -> MediaType {
    match mime {
        Some(m) if m.starts_with("video/") => MediaType::Video,
        Some(m) if m.starts_with("audio/") => MediaType::Audio,
        Some("application/x-tgsticker") => MediaType::Other,
        _ => MediaType::Document,
    }
}

fn media_reference(media: &Media) -> MediaReference {
    match media {
        Media::Document(d) => {
            let mime = d.mime_type().map(String::from);
            let name = d.name();
            let flags = match d.raw.document.as_ref() {
                Some(tl::enums::Document::Document(doc)) => {
                    DocumentFlags::from_attributes(&doc.attributes)
                }
                _ => DocumentFlags::default(),
            };
            MediaReference {
                file_id: d.id(),
                file_name: (!name.is_empty()).then(|| name.to_string()),
                media_type: media_type_for_document(mime.as_deref(), flags),
                mime_type: mime,
                size: d.size(),
            }
        }
        Media::Photo(p) => MediaReference {
            file_id: p.id(),
            file_name: None,
            mime_type: Some("image/jpeg".to_string()),
            media_type: MediaType::Photo,
            size: 0,
        },
        _ => MediaReference {
            file_id: 0,
            file_name: None,
            mime_type: None,
            media_type: MediaType::Other,
            size: 0,
        },
    }
}

/// Build a domain Message. `text` is the caption (or text) as HTML markup, so
/// edits written back through `edit_caption` keep the original formatting.
pub fn message_to_domain(
    id: i32,
    chat_id: i64,
    text: &str,
    media: Option<Media>,
    peer: tl::enums::InputPeer,
) -> Message {
    Message {
        id,
        chat_id,
        text: text.to_string(),
        media: media.as_ref().map(media_reference),
        handle: MessageHandle::new(TgHandle { peer, media }),
    }
}

const FLOOD_NAMES: &[&str] = &["FLOOD_WAIT", "FLOOD_PREMIUM_WAIT", "SLOWMODE_WAIT"];

const PERMISSION_NAMES: &[&str] = &[
    "CHAT_ADMIN_REQUIRED",
    "CHAT_WRITE_FORBIDDEN",
    "CHAT_FORBIDDEN",
    "CHANNEL_PRIVATE",
    "USER_NOT_PARTICIPANT",
    "USER_BANNED_IN_CHANNEL",
    "MESSAGE_AUTHOR_REQUIRED",
    "MESSAGE_EDIT_TIME_EXPIRED",
    "RIGHT_FORBIDDEN",
];

const NOT_FOUND_NAMES: &[&str] = &[
    "USERNAME_NOT_OCCUPIED",
    "USERNAME_INVALID",
    "CHANNEL_INVALID",
    "CHAT_ID_INVALID",
    "PEER_ID_INVALID",
];

/// Tag an RPC failure by code and name.
pub fn classify_rpc(code: i32, name: &str, value: Option<u32>) -> DomainError {
    if code == 420 || FLOOD_NAMES.contains(&name) {
        return DomainError::FloodWait {
            seconds: u64::from(value.unwrap_or(60)),
        };
    }
    if name == "MESSAGE_NOT_MODIFIED" {
        return DomainError::NotModified;
    }
    if PERMISSION_NAMES.contains(&name) || code == 403 {
        return DomainError::Permission(name.to_string());
    }
    if NOT_FOUND_NAMES.contains(&name) {
        return DomainError::ChatNotFound(name.to_string());
    }
    DomainError::TgGateway(format!("{} ({})", name, code))
}

pub fn map_invocation(err: &InvocationError) -> DomainError {
    match err {
        InvocationError::Rpc(rpc) => classify_rpc(rpc.code, &rpc.name, rpc.value),
        other => DomainError::TgGateway(other.to_string()),
    }
}

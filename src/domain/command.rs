//! Bot command parsing. Pure text in, typed arguments out.

use crate::domain::entities::ChatRef;
use thiserror::Error;

pub const START_TEXT: &str = "Hi! I add MediaInfo to file captions in channels/groups where I am admin.\n\n\
Commands:\n\
/processhistory <chat_id_or_username> [limit] - Scans messages and updates captions.\n\
  * <chat_id_or_username>: e.g. @mychannel or -1001234567890\n\
  * [limit]: Optional. Number of recent messages (e.g. 100). 0 or omit for all (use with caution!).\n\n\
Example: /processhistory @mychannel 50\n\n\
You can also send me a video or audio file directly.";

pub const PROCESS_HISTORY_USAGE: &str =
    "Usage: /processhistory <chat_id_or_username> [limit]\nExample: /processhistory @mychannel 100";

/// Split `/name@bot rest` into (`name`, `rest`). `None` when the text is not a command.
pub fn split_command(text: &str) -> Option<(&str, &str)> {
    let text = text.trim_start();
    let rest = text.strip_prefix('/')?;
    let (head, args) = match rest.find(char::is_whitespace) {
        Some(idx) => (&rest[..idx], rest[idx..].trim()),
        None => (rest, ""),
    };
    let name = head.split('@').next().unwrap_or(head);
    if name.is_empty() {
        None
    } else {
        Some((name, args))
    }
}

/// Arguments of `/processhistory`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessHistoryArgs {
    pub chat: ChatRef,
    /// 0 = whole history.
    pub limit: usize,
}

/// Rejections shown verbatim to the user.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UsageError {
    #[error("{}", PROCESS_HISTORY_USAGE)]
    MissingChat,
    #[error("Invalid limit. Must be a number.")]
    InvalidLimit,
    #[error("Limit cannot be negative. Use 0 or omit for all messages.")]
    NegativeLimit,
}

impl ProcessHistoryArgs {
    pub fn parse(args: &str) -> Result<Self, UsageError> {
        let mut parts = args.split_whitespace();
        let chat_input = parts.next().ok_or(UsageError::MissingChat)?;
        let chat = ChatRef::parse(chat_input).ok_or(UsageError::MissingChat)?;
        let limit = match parts.next() {
            None => 0,
            Some(raw) => {
                let n: i64 = raw.parse().map_err(|_| UsageError::InvalidLimit)?;
                if n < 0 {
                    return Err(UsageError::NegativeLimit);
                }
                usize::try_from(n).map_err(|_| UsageError::InvalidLimit)?
            }
        };
        Ok(Self { chat, limit })
    }
}

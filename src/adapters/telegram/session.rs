//! Bot session storage.
//!
//! A SqliteSession file keeps the bot authorization and the peer cache across
//! restarts, so `bot_sign_in` runs only once per session file.

use grammers_session::storages::SqliteSession;
use std::path::Path;
use std::sync::Arc;

/// Open (or create) the session file, creating parent directories as needed.
pub async fn open_bot_session(path: impl AsRef<Path>) -> anyhow::Result<Arc<SqliteSession>> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| anyhow::anyhow!("create session directory {}: {}", parent.display(), e))?;
    }
    let session = SqliteSession::open(path)
        .map_err(|e| anyhow::anyhow!("open session file {}: {}", path.display(), e))?;
    Ok(Arc::new(session))
}

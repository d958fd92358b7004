//! Bot connection and update loop. Implements the inbound side.
//!
//! Signs in with the bot token, then feeds every incoming (non-outgoing) message
//! to an `IncomingPort`.

use crate::adapters::telegram::client::GrammersTgGateway;
use crate::ports::IncomingPort;
use grammers_client::client::UpdatesConfiguration;
use grammers_client::types::update::Update;
use grammers_client::Client;
use grammers_mtsender::SenderPool;
use grammers_session::storages::SqliteSession;
use std::sync::Arc;
use tracing::{info, warn};

pub struct BotCredentials {
    pub api_id: i32,
    pub api_hash: String,
    pub bot_token: String,
}

/// Connect, sign in and process updates until the stream fails.
///
/// `wire` receives the gateway once the client is authorized and returns the
/// port that handles incoming messages.
pub async fn run(
    session: Arc<SqliteSession>,
    creds: BotCredentials,
    wire: impl FnOnce(Arc<GrammersTgGateway>) -> Arc<dyn IncomingPort>,
) -> anyhow::Result<()> {
    let pool = SenderPool::new(session, creds.api_id);
    let client = Client::new(&pool);
    let SenderPool {
        runner, updates, ..
    } = pool;
    tokio::spawn(runner.run());

    if !client
        .is_authorized()
        .await
        .map_err(|e| anyhow::anyhow!("check bot authorization: {}", e))?
    {
        info!("bot signing in with token");
        client
            .bot_sign_in(&creds.bot_token, &creds.api_hash)
            .await
            .map_err(|e| anyhow::anyhow!("bot sign in failed: {}", e))?;
    }

    let me = client
        .get_me()
        .await
        .map_err(|e| anyhow::anyhow!("get bot info: {}", e))?;
    info!(username = me.username().unwrap_or("?"), "bot authorized");

    let tg = Arc::new(GrammersTgGateway::new(client.clone()));
    let port = wire(Arc::clone(&tg));

    let mut stream = client.stream_updates(
        updates,
        UpdatesConfiguration {
            catch_up: false,
            ..Default::default()
        },
    );

    loop {
        match stream.next().await {
            Ok(Update::NewMessage(message)) if !message.outgoing() => {
                let message = tg.message_from_update(&message).await;
                port.on_message(message).await;
            }
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, "update stream failed");
                return Err(anyhow::anyhow!("update stream: {}", e));
            }
        }
    }
}

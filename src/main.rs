//! Wiring & DI. Entry point: load config, bootstrap adapters, inject into use cases, run the bot.
//! No business logic here.

use dotenv::dotenv;
use std::sync::Arc;
use tg_mediainfo::adapters::telegram::bot::{self, BotCredentials};
use tg_mediainfo::adapters::telegram::session::open_bot_session;
use tg_mediainfo::adapters::telegram::GrammersTgGateway;
use tg_mediainfo::adapters::tools::MediaInfoCli;
use tg_mediainfo::ports::{IncomingPort, MediaAnalyzer, TgGateway};
use tg_mediainfo::shared::config::AppConfig;
use tg_mediainfo::usecases::{
    DirectUploadHandler, Dispatcher, HistoryScanner, ItemProcessor, ProcessHistoryHandler,
    ProcessorSettings, Route, ScanSettings, Scope, StartHandler,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_loaded = dotenv();
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,grammers_mtsender=warn,grammers_session=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match &env_loaded {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(_) => info!("no .env found, using process environment"),
    }

    let cfg = AppConfig::load().map_err(|e| anyhow::anyhow!("load config: {}", e))?;
    let Some(api_id) = cfg.api_id.filter(|id| *id != 0) else {
        anyhow::bail!("Set TG_MEDIAINFO_API_ID (env or .env). Get from https://my.telegram.org");
    };
    let Some(api_hash) = cfg.api_hash.clone().filter(|h| !h.is_empty()) else {
        anyhow::bail!("Set TG_MEDIAINFO_API_HASH (env or .env)");
    };
    let Some(bot_token) = cfg.bot_token() else {
        anyhow::bail!("Set TG_MEDIAINFO_BOT_TOKEN (from @BotFather)");
    };

    let temp_dir = cfg.temp_dir_or_default();
    tokio::fs::create_dir_all(&temp_dir)
        .await
        .map_err(|e| anyhow::anyhow!("create temp dir {}: {}", temp_dir.display(), e))?;
    info!(path = %temp_dir.display(), "temp download directory");

    let mediainfo_bin = cfg.mediainfo_bin_or_default();
    let analyzer: Arc<dyn MediaAnalyzer> =
        Arc::new(MediaInfoCli::new(mediainfo_bin.clone(), cfg.analysis_timeout()));
    info!(bin = %mediainfo_bin, timeout_secs = cfg.analysis_timeout().as_secs(), "analysis tool");

    let session_path = cfg.session_path_or_default();
    let session = open_bot_session(&session_path).await?;
    info!(path = %session_path.display(), "session file");

    let processor_settings = ProcessorSettings {
        temp_dir,
        flood_margin: cfg.flood_margin(),
    };
    let scan_settings = ScanSettings {
        item_delay: cfg.item_delay(),
        progress_interval: cfg.progress_interval(),
        flood_margin: cfg.flood_margin(),
    };

    let wire = move |gateway: Arc<GrammersTgGateway>| -> Arc<dyn IncomingPort> {
        let tg: Arc<dyn TgGateway> = gateway;
        let processor = Arc::new(ItemProcessor::new(
            Arc::clone(&tg),
            analyzer,
            processor_settings,
        ));
        let scanner = Arc::new(HistoryScanner::new(
            Arc::clone(&tg),
            Arc::clone(&processor),
            scan_settings,
        ));
        Arc::new(
            Dispatcher::new()
                .route(
                    Route::Command("start"),
                    Scope::Private,
                    Arc::new(StartHandler::new(Arc::clone(&tg))),
                )
                .route(
                    Route::Command("processhistory"),
                    Scope::Private,
                    Arc::new(ProcessHistoryHandler::new(Arc::clone(&tg), scanner)),
                )
                .route(
                    Route::Predicate(DirectUploadHandler::accepts),
                    Scope::Private,
                    Arc::new(DirectUploadHandler::new(tg, processor)),
                ),
        )
    };

    let creds = BotCredentials {
        api_id,
        api_hash,
        bot_token,
    };

    info!("bot starting");
    tokio::select! {
        res = bot::run(session, creds, wire) => res?,
        _ = tokio::signal::ctrl_c() => warn!("interrupted, shutting down"),
    }
    info!("bot stopped");
    Ok(())
}

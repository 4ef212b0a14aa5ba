use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info, warn};

use common::logger::init_tracing;
use signal_engine::MergeEngine;
use signal_hub::{
    api::{AppState, build_router},
    broadcast::Broadcaster,
    config::AppConfig,
    db::Db,
    ingest::{IngestPipeline, IngestRouter},
    metrics::counters::Counters,
    notify::{DiscordNotifier, EmailNotifier, NotificationDispatcher, Notifier},
    persistence::{
        Snapshotter, SqlxSnapshotRepository, SqlxWatchlistRepository, WatchlistRepository,
    },
    sector::{HttpSectorProvider, run_sector_refresher},
};

/// Builds the enabled transports. A transport that fails to build is
/// logged and left out; the other keeps working.
fn build_notifiers(cfg: &AppConfig) -> Vec<Arc<dyn Notifier>> {
    let mut notifiers: Vec<Arc<dyn Notifier>> = Vec::new();

    if let Some(url) = &cfg.discord_webhook_url {
        match DiscordNotifier::new(url.clone()) {
            Ok(n) => notifiers.push(Arc::new(n)),
            Err(e) => error!(error = %e, "discord transport disabled"),
        }
    }

    if let Some(email) = &cfg.email {
        match EmailNotifier::new(email.clone()) {
            Ok(n) => notifiers.push(Arc::new(n)),
            Err(e) => error!(error = %e, "email transport disabled"),
        }
    }

    notifiers
}

/// Restores engine state and the watch list. Persistence problems are
/// logged; the service then starts empty.
async fn restore_state(
    engine: &MergeEngine,
    snapshotter: &Snapshotter,
    watchlist_repo: &dyn WatchlistRepository,
) {
    match snapshotter.restore().await {
        Ok(true) => info!("engine state restored"),
        Ok(false) => {}
        Err(e) => error!(error = ?e, "snapshot restore failed; starting empty"),
    }

    match watchlist_repo.load().await {
        Ok(symbols) => {
            info!(starred = symbols.len(), "watch list loaded");
            engine.watchlist().replace(symbols);
        }
        Err(e) => error!(error = ?e, "watch list load failed"),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    sqlx::any::install_default_drivers();

    let cfg = AppConfig::from_env();
    init_tracing("signal-hub", cfg.production);

    info!(addr = %cfg.http_addr, "Starting signal hub...");

    let db = Db::connect(&cfg.database_url)
        .await
        .context("connect database")?;
    db.migrate().await.context("migrate database")?;

    let engine = Arc::new(MergeEngine::new());
    let counters = Counters::default();

    let snapshotter = Snapshotter::new(
        engine.clone(),
        Arc::new(SqlxSnapshotRepository::new(db.pool.clone())),
        counters.clone(),
    );
    let watchlist_repo: Arc<dyn WatchlistRepository> =
        Arc::new(SqlxWatchlistRepository::new(db.pool.clone()));

    // Restore happens before any update is accepted.
    restore_state(&engine, &snapshotter, watchlist_repo.as_ref()).await;

    let dispatcher =
        NotificationDispatcher::new(build_notifiers(&cfg), cfg.notify_timeout, counters.clone());
    info!(transports = ?dispatcher.transports(), "notification transports");

    let broadcaster = Broadcaster::new(cfg.broadcast_capacity);
    let pipeline = IngestPipeline::new(
        engine.clone(),
        dispatcher,
        broadcaster.clone(),
        counters.clone(),
    );

    let (ingest, ingest_rx) = IngestRouter::channel(cfg.ingest_queue_capacity);
    let router = Arc::new(IngestRouter::new(pipeline, cfg.per_symbol_queue_capacity));
    let router_task = tokio::spawn(router.run(ingest_rx));

    tokio::spawn(snapshotter.clone().run(cfg.snapshot_interval));

    match &cfg.sector_api_url {
        Some(url) => match HttpSectorProvider::new(url.clone()) {
            Ok(provider) => {
                tokio::spawn(run_sector_refresher(
                    engine.clone(),
                    Arc::new(provider),
                    cfg.sector_refresh_interval,
                    counters.clone(),
                ));
            }
            Err(e) => error!(error = %e, "sector lookups disabled"),
        },
        None => warn!("SECTOR_API_URL not set; sector lookups disabled"),
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let app = build_router(AppState {
        engine: engine.clone(),
        ingest,
        watchlist_repo,
        broadcaster,
        counters,
        shutdown: shutdown_rx,
    });

    let listener = TcpListener::bind(&cfg.http_addr)
        .await
        .with_context(|| format!("bind {}", cfg.http_addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            let _ = shutdown_tx.send(true);
        })
        .await
        .context("http server")?;

    // The server owned the last ingest handle; the router drains and exits.
    if let Err(e) = router_task.await {
        error!(error = %e, "ingest router task failed");
    }

    if let Err(e) = snapshotter.save_now().await {
        error!(error = ?e, "final snapshot failed");
    }

    info!("signal hub stopped");
    Ok(())
}

mod config;
mod db;
mod documents;
mod errors;
mod matching;
mod models;
mod notify;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::documents::PdfTextProvider;
use crate::matching::engine::{MatchEngine, NotificationSettings};
use crate::matching::store::{InMemoryMatchStore, MatchStore, SqliteMatchStore};
use crate::notify::{LogNotifier, Notifier, WebhookNotifier};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on malformed env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting SkillSync v{}", env!("CARGO_PKG_VERSION"));

    // Initialize the match record store
    let store = open_store(&config.database_url).await?;

    // Initialize the notifier (webhook when configured, log-only otherwise)
    let notify_timeout = Duration::from_secs(config.notify_timeout_secs);
    let notifier: Arc<dyn Notifier> = match &config.notify_webhook_url {
        Some(url) => {
            info!("Shortlist notifications go to webhook {url}");
            Arc::new(WebhookNotifier::new(url.clone(), notify_timeout)?)
        }
        None => {
            info!("No NOTIFY_WEBHOOK_URL set; shortlist notifications are logged only");
            Arc::new(LogNotifier)
        }
    };

    info!(
        "Vocabulary: {} terms, default threshold {:.2}",
        config.vocabulary.len(),
        config.match_threshold
    );

    let engine = MatchEngine::new(
        config.vocabulary.clone(),
        Arc::clone(&store),
        NotificationSettings {
            notifier,
            recipient: config.notify_recipient.clone(),
            timeout: notify_timeout,
        },
    );

    // Build app state
    let state = AppState {
        config: config.clone(),
        engine: Arc::new(engine),
        documents: Arc::new(PdfTextProvider),
    };

    // Build router
    let app = build_router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    );

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    store.close().await;
    info!("Shutdown complete");

    Ok(())
}

/// `DATABASE_URL=memory` selects the volatile store; anything else is a SQLite URL.
async fn open_store(database_url: &str) -> Result<Arc<dyn MatchStore>> {
    if database_url == "memory" {
        info!("Using in-memory match store; records are lost on exit");
        return Ok(Arc::new(InMemoryMatchStore::new()));
    }
    let pool = create_pool(database_url).await?;
    Ok(Arc::new(SqliteMatchStore::new(pool)))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

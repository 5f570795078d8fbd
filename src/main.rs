//! Recipe bot - a turn-based cooking assistant
//!
//! Walks a user through choosing a recipe, its ingredients and its
//! instructions, one utterance at a time, over an HTTP API.

mod api;
mod bot;
mod catalog;
mod config;
mod db;
mod matchers;
mod nlu;
mod prompts;
mod reply;
mod rules;
mod runtime;
mod state_machine;
mod units;

use api::{create_router, AppState};
use bot::RecipeBot;
use catalog::RecipeCatalog;
use config::AppConfig;
use db::Database;
use nlu::{Classifier, LuisClassifier, NoopClassifier};
use reply::ReplySequencer;
use runtime::RuntimeManager;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    let filter = std::env::var("RECIPE_BOT_LOG")
        .ok()
        .and_then(|directives| tracing_subscriber::EnvFilter::try_new(directives).ok())
        .or_else(|| tracing_subscriber::EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| "recipe_bot=info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    let config = AppConfig::from_env();

    // Recipe catalog
    let catalog = match &config.catalog_path {
        Some(path) => {
            tracing::info!(path = %path.display(), "Loading recipe catalog");
            RecipeCatalog::load(path)?
        }
        None => RecipeCatalog::bundled()?,
    };
    tracing::info!(recipes = catalog.len(), "Recipe catalog ready");

    // Intent classifier
    let classifier: Arc<dyn Classifier> = match LuisClassifier::from_config(&config.nlu) {
        Ok(Some(luis)) => {
            tracing::info!(endpoint = %config.nlu.endpoint, "LUIS classifier configured");
            Arc::new(luis)
        }
        Ok(None) => {
            tracing::warn!("No classifier configured. Set LUIS_APP_ID and LUIS_KEY.");
            Arc::new(NoopClassifier)
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to build LUIS classifier, running without one");
            Arc::new(NoopClassifier)
        }
    };

    let bot = RecipeBot::new(Arc::new(catalog), classifier, config.bot.clone())?;

    // Ensure database directory exists
    if let Some(parent) = config.db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    tracing::info!(path = %config.db_path.display(), "Opening database");
    let db = Database::open(&config.db_path)?;

    let runtime = Arc::new(RuntimeManager::new(
        db,
        Arc::new(bot),
        ReplySequencer::new(config.reply_delay),
    ));

    // Create router
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let compression = CompressionLayer::new()
        .gzip(true)
        .br(true)
        .deflate(true)
        .zstd(true);

    let app = create_router(AppState::new(runtime.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(compression);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Recipe bot listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    runtime.shutdown();
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

//! siteintel server entry point.
//!
//! Loads configuration, refuses to start without a model service credential,
//! and serves the analysis API over HTTP.

use std::sync::Arc;

use anyhow::{Context, Result};
use siteintel_client::{FetchClient, FetchConfig, ModelClient, ModelConfig};
use siteintel_core::{AppConfig, ResultCache};
use tracing_subscriber::EnvFilter;

mod analyzer;
mod error;
mod handler;

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,siteintel=debug"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load().context("failed to load configuration")?;
    init_tracing(config.log_json);

    let model_config = ModelConfig::from_app_config(&config).context("refusing to start")?;
    let model = ModelClient::new(model_config).context("failed to build model client")?;
    let fetcher = FetchClient::new(FetchConfig::from(&config)).context("failed to build fetch client")?;

    let cache = Arc::new(ResultCache::new(config.cache_ttl()));
    spawn_cache_sweeper(cache.clone());

    let analyzer =
        analyzer::Analyzer::new(Arc::new(fetcher), Arc::new(model), cache).with_resolve_dns(config.resolve_dns);
    let app = handler::router(analyzer);

    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!(
        addr = %addr,
        model = %config.model,
        cache_ttl_secs = config.cache_ttl_secs,
        resolve_dns = config.resolve_dns,
        "siteintel listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("siteintel stopped");
    Ok(())
}

/// Periodically drop expired cache entries that were never read again.
fn spawn_cache_sweeper(cache: Arc<ResultCache>) {
    let period = cache.ttl();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.tick().await;
        loop {
            interval.tick().await;
            let removed = cache.purge_expired().await;
            if removed > 0 {
                tracing::debug!("swept {} expired cache entries", removed);
            }
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}

//! Run command.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use gitsync_config::Config;
use gitsync_core::{Repo, Scheduler};
use gitsync_webhook::{WebhookDispatcher, build_router};
use tokio::net::TcpListener;
use tracing::info;

/// Runs the run command.
///
/// Any repository whose directory cannot be used stops startup. After that,
/// errors are logged and the process keeps running until Ctrl-C.
pub fn run(config: Option<&Path>) -> Result<()> {
    let config = super::load(config)?;
    let repos = super::repos(&config)?;

    for repo in &repos {
        repo.prepare()
            .with_context(|| format!("cannot use {} for {}", repo.path().display(), repo.url()))?;
    }

    // Create a tokio runtime for the scheduler and the webhook server
    let rt = tokio::runtime::Runtime::new().context("failed to create async runtime")?;
    rt.block_on(async { run_async(&config, repos).await })
}

async fn run_async(config: &Config, repos: Vec<Arc<Repo>>) -> Result<()> {
    let scheduler = Scheduler::start(&repos).await;
    info!(polled = scheduler.len(), "scheduler started");

    let dispatcher = WebhookDispatcher::new(repos);
    if dispatcher.is_empty() {
        shutdown_signal().await;
    } else {
        let listener = TcpListener::bind(config.server.listen)
            .await
            .with_context(|| format!("failed to listen on {}", config.server.listen))?;
        info!(
            addr = %config.server.listen,
            hooks = dispatcher.len(),
            "webhook server listening"
        );
        axum::serve(listener, build_router(dispatcher))
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("webhook server failed")?;
    }

    scheduler.shutdown();
    info!("stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "cannot listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

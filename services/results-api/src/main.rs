// Copyright 2025 Render Bench Contributors
// SPDX-License-Identifier: Apache-2.0

use anyhow::Context;
use render_bench_benchmarks::ResultsStore;
use results_api::{app, config::ServiceConfig, init_tracing, models::AppState};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing();

    let config = ServiceConfig::load().context("failed to load configuration")?;
    let state = Arc::new(AppState::new(ResultsStore::new(&config.results_dir)));
    let router = app(state, config.static_dir.as_deref());

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!(
        addr = %addr,
        results_dir = %config.results_dir.display(),
        "Results API listening"
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Results API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}

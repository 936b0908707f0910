// Copyright 2025 Render Bench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Results API service for Render Bench.
//!
//! Serves the snapshots and latest pointer written by `render-bench run`:
//!
//! - `GET /api/results/latest`: the most recent result set, or 404
//! - `GET /api/results`: every snapshot as `{filename, data}`, or 500
//! - `GET /health`: liveness probe
//!
//! Handlers hold no mutable state; every request reads the results directory
//! afresh.

pub mod config;
pub mod error;
pub mod models;
pub mod routes;

use axum::Router;
use std::path::Path;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing_subscriber::EnvFilter;

use crate::models::AppState;

/// Build the application router. When `static_dir` is set, unmatched paths
/// are served from it (the dashboard front end).
pub fn app(state: Arc<AppState>, static_dir: Option<&Path>) -> Router {
    let mut router = Router::new()
        .merge(routes::results::routes())
        .merge(routes::health::routes());

    if let Some(dir) = static_dir {
        router = router.fallback_service(ServeDir::new(dir));
    }

    router
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Install the global tracing subscriber (`RUST_LOG`, default `info`;
/// `LOG_FORMAT=json` for JSON lines).
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}

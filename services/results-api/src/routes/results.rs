// Copyright 2025 Render Bench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Read-only access to persisted benchmark runs.

use axum::{extract::State, routing::get, Json, Router};
use render_bench_benchmarks::{ResultSet, SnapshotEntry};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::models::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/results/latest", get(latest_results))
        .route("/api/results", get(all_results))
}

async fn latest_results(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ResultSet>, ApiError> {
    let store = state.store.clone();
    let results = tokio::task::spawn_blocking(move || store.read_latest())
        .await
        .map_err(|e| ApiError::read_failed(e.to_string()))?
        .map_err(|e| {
            warn!(error = %e, "Latest results unavailable");
            ApiError::no_results(e.to_string())
        })?;

    debug!(targets = results.len(), "Serving latest results");
    Ok(Json(results))
}

async fn all_results(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<SnapshotEntry>>, ApiError> {
    let store = state.store.clone();
    let snapshots = tokio::task::spawn_blocking(move || store.list_snapshots())
        .await
        .map_err(|e| ApiError::read_failed(e.to_string()))?
        .map_err(|e| {
            warn!(error = %e, "Failed to list snapshots");
            ApiError::read_failed(e.to_string())
        })?;

    debug!(snapshots = snapshots.len(), "Serving snapshot listing");
    Ok(Json(snapshots))
}

#[cfg(test)]
mod tests {
    use crate::{app, models::AppState};
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        Router,
    };
    use http_body_util::BodyExt;
    use render_bench_benchmarks::{default_targets, BenchmarkResult, Metrics, ResultSet, ResultsStore};
    use serde_json::Value;
    use std::path::Path;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn router(dir: &Path) -> Router {
        app(Arc::new(AppState::new(ResultsStore::new(dir))), None)
    }

    async fn get(router: Router, uri: &str) -> (StatusCode, Value) {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn sample_results() -> ResultSet {
        default_targets()
            .into_iter()
            .zip([92.0, 98.0, 75.0])
            .map(|(target, performance)| {
                BenchmarkResult::success(
                    target,
                    Metrics {
                        performance,
                        ..Metrics::default()
                    },
                )
            })
            .collect::<Vec<_>>()
            .into()
    }

    #[tokio::test]
    async fn test_latest_without_results_is_not_found() {
        let dir = tempfile::tempdir().unwrap();

        let (status, body) = get(router(dir.path()), "/api/results/latest").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "No results found");
        assert!(body["message"].as_str().is_some_and(|m| !m.is_empty()));
    }

    #[tokio::test]
    async fn test_latest_returns_persisted_results() {
        let dir = tempfile::tempdir().unwrap();
        let results = sample_results();
        ResultsStore::new(dir.path()).persist(&results).unwrap();

        let (status, body) = get(router(dir.path()), "/api/results/latest").await;

        assert_eq!(status, StatusCode::OK);
        let served: ResultSet = serde_json::from_value(body).unwrap();
        assert_eq!(served, results);
    }

    #[tokio::test]
    async fn test_corrupt_latest_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("latest.json"), "{ truncated").unwrap();

        let (status, body) = get(router(dir.path()), "/api/results/latest").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "No results found");
    }

    #[tokio::test]
    async fn test_latest_fills_missing_metrics_and_keeps_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        let stored = r#"[{"name":"Next.js SSR","url":"http://localhost:3000/ssr",
            "framework":"nextjs","renderMethod":"ssr",
            "timestamp":"2025-01-15T10:30:00.000Z","metrics":{"performance":92}}]"#;
        std::fs::write(dir.path().join("latest.json"), stored).unwrap();

        let (status, body) = get(router(dir.path()), "/api/results/latest").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["timestamp"], "2025-01-15T10:30:00.000Z");
        assert_eq!(body[0]["metrics"]["performance"], 92.0);
        assert_eq!(body[0]["metrics"]["ttfb"], 0.0);
        assert!(body[0].get("error").is_none());
    }

    #[tokio::test]
    async fn test_list_rejects_result_with_metrics_and_error() {
        let dir = tempfile::tempdir().unwrap();
        let stored = r#"[{"name":"Next.js SSR","url":"http://localhost:3000/ssr",
            "framework":"nextjs","renderMethod":"ssr",
            "timestamp":"2025-01-15T10:30:00.000Z",
            "metrics":{"performance":92},"error":"Navigation timeout"}]"#;
        std::fs::write(dir.path().join("benchmark-A.json"), stored).unwrap();

        let (status, body) = get(router(dir.path()), "/api/results").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Failed to read results");
    }

    #[tokio::test]
    async fn test_list_returns_only_snapshots() {
        let dir = tempfile::tempdir().unwrap();
        let json = serde_json::to_string(&sample_results()).unwrap();
        std::fs::write(dir.path().join("benchmark-A.json"), &json).unwrap();
        std::fs::write(dir.path().join("benchmark-B.json"), &json).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "scratch").unwrap();

        let (status, body) = get(router(dir.path()), "/api/results").await;

        assert_eq!(status, StatusCode::OK);
        let entries = body.as_array().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["filename"], "benchmark-A.json");
        assert_eq!(entries[0]["data"].as_array().map(Vec::len), Some(3));
    }

    #[tokio::test]
    async fn test_list_counts_every_persisted_run() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResultsStore::new(dir.path());
        store.persist(&sample_results()).unwrap();
        store.persist(&sample_results()).unwrap();

        let (status, body) = get(router(dir.path()), "/api/results").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().map(Vec::len), Some(2));
    }

    #[tokio::test]
    async fn test_list_on_missing_directory_is_server_error() {
        let dir = tempfile::tempdir().unwrap();

        let (status, body) = get(router(&dir.path().join("missing")), "/api/results").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Failed to read results");
    }
}

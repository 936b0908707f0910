// Copyright 2025 Render Bench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Run orchestration.
//!
//! A run acquires one browser session, audits every target strictly one after
//! another, and releases the session on every exit path. Audits are never run
//! concurrently: all targets share the session's debugging endpoint and
//! throttling, and overlapping audits would skew each other's measurements.

use crate::browser::{BrowserError, BrowserLauncher, BrowserSession};
use crate::runner::AuditRunner;
use futures::FutureExt;
use render_bench_benchmarks::{BenchmarkTarget, ResultSet};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Sequences the audit runner over a target list.
#[derive(Clone)]
pub struct RunOrchestrator {
    launcher: Arc<dyn BrowserLauncher>,
    runner: AuditRunner,
}

impl RunOrchestrator {
    /// Create an orchestrator.
    pub fn new(launcher: Arc<dyn BrowserLauncher>, runner: AuditRunner) -> Self {
        Self { launcher, runner }
    }

    /// Audit every target once, in order.
    ///
    /// The returned set has one result per target regardless of individual
    /// failures. Only a failure to acquire the browser fails the run.
    pub async fn run_all(&self, targets: &[BenchmarkTarget]) -> Result<ResultSet, BrowserError> {
        info!(targets = targets.len(), "Starting benchmark run");
        let session = self.launcher.acquire().await?;

        let outcome = AssertUnwindSafe(self.visit(targets, session.as_ref()))
            .catch_unwind()
            .await;

        if let Err(e) = session.release().await {
            warn!(error = %e, "Failed to release browser session");
        }

        match outcome {
            Ok(results) => {
                info!(
                    total = results.len(),
                    failed = results.failure_count(),
                    "Benchmark run complete"
                );
                Ok(results)
            }
            Err(payload) => panic::resume_unwind(payload),
        }
    }

    async fn visit(&self, targets: &[BenchmarkTarget], session: &dyn BrowserSession) -> ResultSet {
        let mut results = ResultSet::with_capacity(targets.len());
        for (index, target) in targets.iter().enumerate() {
            debug!(index, total = targets.len(), url = %target.url, "Visiting target");
            results.push(self.runner.run(target, session).await);
        }
        results
    }
}

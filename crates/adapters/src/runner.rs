// Copyright 2025 Render Bench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Single-target audit runner.
//!
//! [`AuditRunner::run`] turns every audit failure into a failure-variant
//! [`BenchmarkResult`]. Nothing a target does can abort the run.

use crate::audit::Auditor;
use crate::browser::BrowserSession;
use render_bench_benchmarks::{extract, BenchmarkResult, BenchmarkTarget};
use std::sync::Arc;
use tracing::{info, warn};

/// Audits one target at a time through a shared browser session.
#[derive(Clone)]
pub struct AuditRunner {
    auditor: Arc<dyn Auditor>,
}

impl AuditRunner {
    /// Create a runner backed by `auditor`.
    pub fn new(auditor: Arc<dyn Auditor>) -> Self {
        Self { auditor }
    }

    /// Audit `target` and return its result. Never fails.
    pub async fn run(&self, target: &BenchmarkTarget, session: &dyn BrowserSession) -> BenchmarkResult {
        info!(name = %target.name, url = %target.url, "Benchmarking target");

        match self.auditor.audit(&target.url, session.endpoint()).await {
            Ok(report) => {
                let metrics = extract(&report);
                info!(
                    name = %target.name,
                    performance = metrics.performance,
                    ttfb = metrics.ttfb,
                    fcp = metrics.fcp,
                    lcp = metrics.lcp,
                    cls = metrics.cls,
                    "Audit completed"
                );
                BenchmarkResult::success(target.clone(), metrics)
            }
            Err(e) => {
                warn!(name = %target.name, error = %e, "Audit failed");
                BenchmarkResult::failure(target.clone(), e.to_string())
            }
        }
    }
}

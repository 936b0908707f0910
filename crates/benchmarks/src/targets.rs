//! Target registry.
//!
//! The registry is the fixed, ordered list of pages a run audits. It is
//! decided at process start and never mutated while a run is in flight.

use crate::result::{BenchmarkTarget, RenderMethod};

/// Base URL of the demo application when none is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";

/// Framework label of the bundled demo pages.
pub const DEFAULT_FRAMEWORK: &str = "nextjs";

/// Default targets: one Next.js page per rendering strategy.
pub fn default_targets() -> Vec<BenchmarkTarget> {
    targets_for(DEFAULT_BASE_URL)
}

/// The three demo targets served under `base_url`.
pub fn targets_for(base_url: &str) -> Vec<BenchmarkTarget> {
    let base = base_url.trim_end_matches('/');
    RenderMethod::ALL
        .iter()
        .map(|method| {
            BenchmarkTarget::new(
                format!("Next.js {}", method.as_str().to_uppercase()),
                format!("{base}/{method}"),
                DEFAULT_FRAMEWORK,
                *method,
            )
        })
        .collect()
}

// Copyright 2025 Render Bench Contributors
// SPDX-License-Identifier: Apache-2.0

use render_bench_benchmarks::ResultsStore;

/// Shared, read-only handler state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub store: ResultsStore,
}

impl AppState {
    pub fn new(store: ResultsStore) -> Self {
        Self { store }
    }
}

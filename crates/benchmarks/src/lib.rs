//! Canonical benchmark data model for Render Bench.
//!
//! This crate holds everything about a run that does not need a browser:
//! the target registry, the metrics extractor, the results store and the
//! reports derived from a result set.
//!
//! # Quick Start
//!
//! ```no_run
//! use render_bench_benchmarks::{summarize, ResultSet, ResultsStore};
//!
//! let store = ResultsStore::new("benchmarks/results");
//! let latest: ResultSet = store.read_latest()?;
//! println!("{}", summarize(&latest));
//! # Ok::<(), render_bench_benchmarks::io::StoreError>(())
//! ```
//!
//! # Modules
//!
//! - [`result`] - Targets, metrics and the `BenchmarkResult` tagged union
//! - [`targets`] - The default target registry
//! - [`extract`] - Lighthouse report to `Metrics` mapping
//! - [`io`] - Snapshot and latest-pointer persistence
//! - [`summary`] - Console comparison table
//! - [`markdown`] - Markdown report generation

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod extract;
pub mod io;
pub mod markdown;
pub mod result;
pub mod summary;
pub mod targets;

pub use extract::extract;
pub use io::{ResultsStore, Snapshot, SnapshotEntry, StoreError};
pub use result::{BenchmarkResult, BenchmarkTarget, Metrics, Outcome, RenderMethod, ResultSet};
pub use summary::summarize;
pub use targets::default_targets;

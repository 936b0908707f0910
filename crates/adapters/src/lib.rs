// Copyright 2025 Render Bench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Browser, auditor and orchestration adapters for Render Bench.
//!
//! - **Browser**: one headless Chrome per run ([`browser`])
//! - **Audit**: the Lighthouse capability behind the [`Auditor`] seam ([`audit`])
//! - **Runner**: per-target failure isolation ([`runner`])
//! - **Orchestrator**: sequential run over the target registry ([`orchestrator`])
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use render_bench_adapters::prelude::*;
//! use render_bench_benchmarks::default_targets;
//!
//! let orchestrator = RunOrchestrator::new(
//!     Arc::new(ChromeLauncher::default()),
//!     AuditRunner::new(Arc::new(LighthouseAuditor::default())),
//! );
//! let results = orchestrator.run_all(&default_targets()).await?;
//! ```

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod audit;
pub mod browser;
pub mod orchestrator;
pub mod runner;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use super::audit::{AuditError, AuditSettings, Auditor, LighthouseAuditor};
    pub use super::browser::{
        BrowserConfig, BrowserError, BrowserLauncher, BrowserSession, ChromeLauncher,
    };
    pub use super::orchestrator::RunOrchestrator;
    pub use super::runner::AuditRunner;
}

pub use audit::{Auditor, LighthouseAuditor};
pub use browser::{BrowserLauncher, ChromeLauncher};
pub use orchestrator::RunOrchestrator;
pub use runner::AuditRunner;

#[cfg(all(test, unix))]
pub(crate) mod test_support {
    use std::io::Write;
    use std::os::unix::fs::PermissionsExt;
    use std::path::Path;
    use tokio::sync::Mutex;

    /// Held by every test that executes a freshly written script. A fork in
    /// a parallel test that inherits the write descriptor makes `exec` fail
    /// with `ETXTBSY`.
    pub(crate) static EXEC_LOCK: Mutex<()> = Mutex::const_new(());

    /// Write an executable `/bin/sh` script at `path`, closed and synced
    /// before the mode change.
    pub(crate) fn write_script(path: &Path, body: &str) {
        let mut file = std::fs::File::create(path).unwrap();
        writeln!(file, "#!/bin/sh\n{body}").unwrap();
        file.sync_all().unwrap();
        drop(file);
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).unwrap();
    }
}

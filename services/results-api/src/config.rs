// Copyright 2025 Render Bench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Service configuration.
//!
//! Read from `RESULTS_API__*` environment variables, with the bare `HOST` and
//! `PORT` variables taking precedence for compatibility with common hosting
//! platforms.

use config::{Config, ConfigError, Environment};
use render_bench_benchmarks::io::RESULTS_DIR;
use serde::Deserialize;
use std::path::PathBuf;

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "RESULTS_API";

/// Results API settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Listen address.
    pub host: String,
    /// Listen port.
    pub port: u16,
    /// Directory written by `render-bench run`.
    pub results_dir: PathBuf,
    /// Optional dashboard assets served at `/`.
    pub static_dir: Option<PathBuf>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
            results_dir: PathBuf::from(RESULTS_DIR),
            static_dir: None,
        }
    }
}

impl ServiceConfig {
    /// Load settings from the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("host", std::env::var("HOST").ok())?
            .set_override_option("port", std::env::var("PORT").ok())?
            .build()?
            .try_deserialize()
    }

    /// `host:port` string to bind.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

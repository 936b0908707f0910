//! Run configuration.
//!
//! Layered with the `config` crate: built-in defaults, then an optional TOML
//! file (`render-bench.toml` in the working directory, or `--config`), then
//! `RENDER_BENCH__*` environment variables (`__` separates nested keys, e.g.
//! `RENDER_BENCH__AUDIT__MAX_WAIT_FOR_LOAD_MS=45000`).

use config::{Config, ConfigError, Environment, File};
use render_bench_adapters::audit::AuditSettings;
use render_bench_adapters::browser::BrowserConfig;
use render_bench_benchmarks::io::RESULTS_DIR;
use render_bench_benchmarks::targets::{targets_for, DEFAULT_BASE_URL, DEFAULT_FRAMEWORK};
use render_bench_benchmarks::{BenchmarkTarget, RenderMethod};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "render-bench.toml";

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "RENDER_BENCH";

/// A target entry in the config file.
#[derive(Debug, Clone, Deserialize)]
pub struct TargetConfig {
    /// Display name.
    pub name: String,
    /// Page URL.
    pub url: String,
    /// Framework label; defaults to `nextjs`.
    #[serde(default = "default_framework")]
    pub framework: String,
    /// Rendering strategy.
    pub render_method: RenderMethod,
}

fn default_framework() -> String {
    DEFAULT_FRAMEWORK.to_string()
}

impl From<TargetConfig> for BenchmarkTarget {
    fn from(target: TargetConfig) -> Self {
        BenchmarkTarget::new(target.name, target.url, target.framework, target.render_method)
    }
}

/// Everything a benchmark run needs to know before it starts.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BenchConfig {
    /// Directory holding snapshots and `latest.json`.
    pub results_dir: PathBuf,
    /// Base URL of the demo pages, used when `targets` is empty.
    pub base_url: String,
    /// Explicit target list; replaces the default registry when non-empty.
    pub targets: Vec<TargetConfig>,
    /// Browser launch settings.
    pub browser: BrowserConfig,
    /// Lighthouse settings.
    pub audit: AuditSettings,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            results_dir: PathBuf::from(RESULTS_DIR),
            base_url: DEFAULT_BASE_URL.to_string(),
            targets: Vec::new(),
            browser: BrowserConfig::default(),
            audit: AuditSettings::default(),
        }
    }
}

impl BenchConfig {
    /// Load configuration from `path` (required) or the default file
    /// (optional), overlaid with environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// The target registry for this run, in audit order.
    pub fn targets(&self) -> Vec<BenchmarkTarget> {
        if self.targets.is_empty() {
            targets_for(&self.base_url)
        } else {
            self.targets.iter().cloned().map(Into::into).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_defaults_use_demo_targets() {
        let config = BenchConfig::default();
        let targets = config.targets();

        assert_eq!(config.results_dir, PathBuf::from("benchmarks/results"));
        assert_eq!(targets.len(), 3);
        assert_eq!(targets[0].url, "http://localhost:3000/ssr");
        assert_eq!(config.audit.throttling.rtt_ms, 40);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bench.toml");
        fs::write(
            &path,
            r#"
results_dir = "out/results"
base_url = "http://127.0.0.1:4000"

[browser]
launch_timeout_secs = 5

[audit]
max_wait_for_load_ms = 45000

[audit.throttling]
rtt_ms = 150
"#,
        )
        .unwrap();

        let config = BenchConfig::load(Some(&path)).unwrap();

        assert_eq!(config.results_dir, PathBuf::from("out/results"));
        assert_eq!(config.targets()[2].url, "http://127.0.0.1:4000/csr");
        assert_eq!(config.browser.launch_timeout_secs, 5);
        assert_eq!(config.audit.max_wait_for_load_ms, Some(45000));
        assert_eq!(config.audit.throttling.rtt_ms, 150);
        assert_eq!(config.audit.throttling.throughput_kbps, 10240);
    }

    #[test]
    fn test_explicit_targets_replace_registry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bench.toml");
        fs::write(
            &path,
            r#"
[[targets]]
name = "Astro SSG"
url = "http://localhost:4321/"
framework = "astro"
render_method = "ssg"

[[targets]]
name = "Next.js CSR"
url = "http://localhost:3000/csr"
render_method = "csr"
"#,
        )
        .unwrap();

        let targets = BenchConfig::load(Some(&path)).unwrap().targets();

        assert_eq!(targets.len(), 2);
        assert_eq!(targets[0].framework, "astro");
        assert_eq!(targets[0].render_method, RenderMethod::Ssg);
        assert_eq!(targets[1].framework, "nextjs");
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(BenchConfig::load(Some(&dir.path().join("absent.toml"))).is_err());
    }
}

// Copyright 2025 Render Bench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Headless browser session management.
//!
//! A run holds exactly one browser process. [`BrowserLauncher::acquire`]
//! starts it and [`BrowserSession::release`] terminates it. Chrome children
//! are spawned with kill-on-drop, so a session dropped without an explicit
//! release still takes its process down with it.
//!
//! # Example
//!
//! ```ignore
//! use render_bench_adapters::browser::{BrowserConfig, BrowserLauncher, ChromeLauncher};
//!
//! let launcher = ChromeLauncher::new(BrowserConfig::default());
//! let session = launcher.acquire().await?;
//! println!("DevTools on port {}", session.endpoint().port);
//! session.release().await?;
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tempfile::TempDir;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader, Lines};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace};
use url::Url;

/// Environment variable consulted for the browser binary.
pub const CHROME_BIN_ENV: &str = "CHROME_BIN";

/// Binary names searched on `PATH`, in order.
pub const CHROME_CANDIDATES: &[&str] = &[
    "google-chrome-stable",
    "google-chrome",
    "chromium",
    "chromium-browser",
    "chrome",
];

const DEVTOOLS_ANNOUNCEMENT: &str = "DevTools listening on ";

/// Errors that can occur while acquiring or releasing a browser.
#[derive(Debug, Error)]
pub enum BrowserError {
    /// No browser binary could be located.
    #[error(
        "No Chrome/Chromium binary found (looked for {candidates}); \
         set browser.chrome_path or CHROME_BIN"
    )]
    NotFound {
        /// Names that were searched for.
        candidates: String,
    },

    /// A configured browser path does not exist.
    #[error("Browser binary not found: {}", .0.display())]
    InvalidPath(PathBuf),

    /// The throwaway profile directory could not be created.
    #[error("Failed to create browser profile directory: {0}")]
    Profile(#[source] io::Error),

    /// Spawning the browser process failed.
    #[error("Failed to launch browser at {}: {source}", .path.display())]
    Launch {
        /// Browser binary.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// The browser exited or closed stderr before announcing its endpoint.
    #[error("Browser exited before announcing a DevTools endpoint: {0}")]
    EarlyExit(String),

    /// The browser did not announce its endpoint in time.
    #[error("Browser did not announce a DevTools endpoint within {0:?}")]
    EndpointTimeout(Duration),

    /// The announced endpoint could not be parsed.
    #[error("Invalid DevTools endpoint {url}: {reason}")]
    InvalidEndpoint {
        /// Announced URL.
        url: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Terminating the browser failed.
    #[error("Failed to terminate browser: {0}")]
    Release(#[source] io::Error),
}

/// Result type for browser operations.
pub type Result<T> = std::result::Result<T, BrowserError>;

/// Remote debugging endpoint of a running browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DevToolsEndpoint {
    /// Browser-level WebSocket URL.
    pub ws_url: String,
    /// Remote debugging port.
    pub port: u16,
}

impl DevToolsEndpoint {
    /// Parse a `ws://host:port/devtools/browser/<id>` URL.
    pub fn parse(ws_url: &str) -> Result<Self> {
        let invalid = |reason: &str| BrowserError::InvalidEndpoint {
            url: ws_url.to_string(),
            reason: reason.to_string(),
        };

        let url = Url::parse(ws_url).map_err(|e| invalid(&e.to_string()))?;
        if !matches!(url.scheme(), "ws" | "wss") {
            return Err(invalid("expected a ws:// URL"));
        }
        let port = url.port().ok_or_else(|| invalid("missing port"))?;

        Ok(Self {
            ws_url: ws_url.to_string(),
            port,
        })
    }
}

/// Browser launch settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Explicit browser binary; falls back to `CHROME_BIN`, then `PATH`.
    pub chrome_path: Option<PathBuf>,
    /// How long to wait for the DevTools endpoint announcement.
    pub launch_timeout_secs: u64,
    /// Extra command-line flags appended after the defaults.
    pub extra_args: Vec<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            chrome_path: None,
            launch_timeout_secs: 30,
            extra_args: Vec::new(),
        }
    }
}

/// An open browser that audits can attach to.
#[async_trait]
pub trait BrowserSession: Send + Sync {
    /// The session's remote debugging endpoint.
    fn endpoint(&self) -> &DevToolsEndpoint;

    /// Terminate the browser.
    async fn release(self: Box<Self>) -> Result<()>;
}

/// Starts browser sessions.
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    /// Launch a browser and wait until its debugging endpoint is reachable.
    async fn acquire(&self) -> Result<Box<dyn BrowserSession>>;
}

/// Launches a local headless Chrome/Chromium.
#[derive(Debug, Clone, Default)]
pub struct ChromeLauncher {
    config: BrowserConfig,
}

impl ChromeLauncher {
    /// Create a launcher with the given settings.
    pub fn new(config: BrowserConfig) -> Self {
        Self { config }
    }

    /// Locate the browser binary.
    pub fn resolve_binary(&self) -> Result<PathBuf> {
        if let Some(path) = &self.config.chrome_path {
            return resolve_program_path(path);
        }

        if let Ok(value) = std::env::var(CHROME_BIN_ENV) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return resolve_program_path(Path::new(trimmed));
            }
        }

        CHROME_CANDIDATES
            .iter()
            .find_map(|name| find_in_path(name))
            .ok_or_else(|| BrowserError::NotFound {
                candidates: CHROME_CANDIDATES.join(", "),
            })
    }

    fn launch_timeout(&self) -> Duration {
        Duration::from_secs(self.config.launch_timeout_secs)
    }
}

#[async_trait]
impl BrowserLauncher for ChromeLauncher {
    async fn acquire(&self) -> Result<Box<dyn BrowserSession>> {
        let binary = self.resolve_binary()?;
        let profile = tempfile::Builder::new()
            .prefix("render-bench-chrome-")
            .tempdir()
            .map_err(BrowserError::Profile)?;

        let args = chrome_args(profile.path(), &self.config.extra_args);
        debug!(binary = %binary.display(), args = %args.join(" "), "Launching browser");

        let mut child = Command::new(&binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| BrowserError::Launch {
                path: binary.clone(),
                source,
            })?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| BrowserError::EarlyExit("stderr was not captured".to_string()))?;
        let mut lines = BufReader::new(stderr).lines();

        let timeout = self.launch_timeout();
        let ws_url = match tokio::time::timeout(timeout, wait_for_endpoint(&mut lines)).await {
            Ok(announced) => announced?,
            Err(_) => return Err(BrowserError::EndpointTimeout(timeout)),
        };
        let endpoint = DevToolsEndpoint::parse(&ws_url)?;

        // Keep draining stderr so the browser never blocks on a full pipe.
        let log_task = tokio::spawn(async move {
            while let Ok(Some(line)) = lines.next_line().await {
                trace!(line = %line, "chrome");
            }
        });

        info!(
            binary = %binary.display(),
            port = endpoint.port,
            pid = ?child.id(),
            "Browser launched"
        );

        Ok(Box::new(ChromeSession {
            child,
            endpoint,
            log_task,
            profile,
        }))
    }
}

/// A running Chrome process and its throwaway profile.
pub struct ChromeSession {
    child: Child,
    endpoint: DevToolsEndpoint,
    log_task: JoinHandle<()>,
    profile: TempDir,
}

#[async_trait]
impl BrowserSession for ChromeSession {
    fn endpoint(&self) -> &DevToolsEndpoint {
        &self.endpoint
    }

    async fn release(self: Box<Self>) -> Result<()> {
        let ChromeSession {
            mut child,
            endpoint,
            log_task,
            profile,
        } = *self;

        let still_running = child.try_wait().map_err(BrowserError::Release)?.is_none();
        if still_running {
            child.kill().await.map_err(BrowserError::Release)?;
        }
        log_task.abort();
        // The profile directory can only go once the process is gone.
        drop(profile);

        info!(port = endpoint.port, "Browser closed");
        Ok(())
    }
}

/// Command-line flags for a headless, sandbox-disabled browser suitable for
/// CI containers.
pub fn chrome_args(profile_dir: &Path, extra: &[String]) -> Vec<String> {
    let mut args = vec![
        "--headless=new".to_string(),
        "--no-sandbox".to_string(),
        "--disable-setuid-sandbox".to_string(),
        "--disable-gpu".to_string(),
        "--disable-dev-shm-usage".to_string(),
        "--no-first-run".to_string(),
        "--no-default-browser-check".to_string(),
        "--disable-component-update".to_string(),
        "--disable-default-apps".to_string(),
        "--disable-sync".to_string(),
        "--remote-debugging-port=0".to_string(),
        format!("--user-data-dir={}", profile_dir.display()),
    ];
    args.extend(extra.iter().cloned());
    args.push("about:blank".to_string());
    args
}

/// Extract the WebSocket URL from a `DevTools listening on ws://...` line.
pub fn parse_devtools_line(line: &str) -> Option<&str> {
    line.split_once(DEVTOOLS_ANNOUNCEMENT)
        .map(|(_, rest)| rest.trim())
        .filter(|url| !url.is_empty())
}

async fn wait_for_endpoint<R>(lines: &mut Lines<BufReader<R>>) -> Result<String>
where
    R: AsyncRead + Unpin,
{
    let mut last_line = String::new();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if let Some(url) = parse_devtools_line(&line) {
                    return Ok(url.to_string());
                }
                trace!(line = %line, "chrome");
                last_line = line;
            }
            Ok(None) if last_line.is_empty() => {
                return Err(BrowserError::EarlyExit("no output".to_string()))
            }
            Ok(None) => return Err(BrowserError::EarlyExit(last_line)),
            Err(e) => return Err(BrowserError::EarlyExit(e.to_string())),
        }
    }
}

fn resolve_program_path(program: &Path) -> Result<PathBuf> {
    let has_separator = program.components().count() > 1;
    if has_separator || program.is_absolute() {
        if program.is_file() {
            return Ok(program.to_path_buf());
        }
        return Err(BrowserError::InvalidPath(program.to_path_buf()));
    }

    program
        .to_str()
        .and_then(find_in_path)
        .ok_or_else(|| BrowserError::InvalidPath(program.to_path_buf()))
}

fn find_in_path(program: &str) -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var)
        .map(|dir| dir.join(program))
        .find(|candidate| candidate.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_devtools_line() {
        let line = "DevTools listening on ws://127.0.0.1:36123/devtools/browser/7f0c-11";
        assert_eq!(
            parse_devtools_line(line),
            Some("ws://127.0.0.1:36123/devtools/browser/7f0c-11")
        );
        assert_eq!(parse_devtools_line("[0101/000000.1:ERROR] gpu"), None);
    }

    #[test]
    fn test_endpoint_parse_extracts_port() {
        let endpoint = DevToolsEndpoint::parse("ws://127.0.0.1:9222/devtools/browser/abc").unwrap();
        assert_eq!(endpoint.port, 9222);
    }

    #[test]
    fn test_endpoint_parse_rejects_non_websocket() {
        assert!(DevToolsEndpoint::parse("http://127.0.0.1:9222/json").is_err());
        assert!(DevToolsEndpoint::parse("not a url").is_err());
    }

    #[test]
    fn test_chrome_args_are_headless_and_unsandboxed() {
        let args = chrome_args(Path::new("/tmp/profile"), &["--lang=en-US".to_string()]);

        assert!(args.contains(&"--headless=new".to_string()));
        assert!(args.contains(&"--no-sandbox".to_string()));
        assert!(args.contains(&"--disable-setuid-sandbox".to_string()));
        assert!(args.contains(&"--remote-debugging-port=0".to_string()));
        assert!(args.contains(&"--user-data-dir=/tmp/profile".to_string()));
        assert!(args.contains(&"--lang=en-US".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("about:blank"));
    }

    #[test]
    fn test_missing_configured_binary_is_an_error() {
        let launcher = ChromeLauncher::new(BrowserConfig {
            chrome_path: Some(PathBuf::from("/definitely/not/here/chrome")),
            ..BrowserConfig::default()
        });

        assert!(matches!(
            launcher.resolve_binary(),
            Err(BrowserError::InvalidPath(_))
        ));
    }

    #[cfg(unix)]
    fn fake_browser(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("chrome");
        crate::test_support::write_script(&path, body);
        path
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_acquire_reads_endpoint_and_release_terminates() {
        let _exec = crate::test_support::EXEC_LOCK.lock().await;
        let dir = tempfile::tempdir().unwrap();
        let chrome = fake_browser(
            dir.path(),
            "echo 'starting' >&2\n\
             echo 'DevTools listening on ws://127.0.0.1:9333/devtools/browser/abc' >&2\n\
             exec sleep 30",
        );
        let launcher = ChromeLauncher::new(BrowserConfig {
            chrome_path: Some(chrome),
            ..BrowserConfig::default()
        });

        let session = launcher.acquire().await.unwrap();
        assert_eq!(session.endpoint().port, 9333);
        session.release().await.unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_acquire_fails_when_browser_exits_early() {
        let _exec = crate::test_support::EXEC_LOCK.lock().await;
        let dir = tempfile::tempdir().unwrap();
        let chrome = fake_browser(dir.path(), "echo 'cannot open display' >&2\nexit 1");
        let launcher = ChromeLauncher::new(BrowserConfig {
            chrome_path: Some(chrome),
            ..BrowserConfig::default()
        });

        match launcher.acquire().await {
            Err(BrowserError::EarlyExit(detail)) => assert_eq!(detail, "cannot open display"),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("acquire should fail"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_acquire_times_out_without_announcement() {
        let _exec = crate::test_support::EXEC_LOCK.lock().await;
        let dir = tempfile::tempdir().unwrap();
        let chrome = fake_browser(dir.path(), "exec sleep 30");
        let launcher = ChromeLauncher::new(BrowserConfig {
            chrome_path: Some(chrome),
            launch_timeout_secs: 0,
            ..BrowserConfig::default()
        });

        assert!(matches!(
            launcher.acquire().await,
            Err(BrowserError::EndpointTimeout(_))
        ));
    }
}

// Copyright 2025 Render Bench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Performance auditing capability.
//!
//! The [`Auditor`] trait is the seam for the third-party auditor. The
//! production implementation, [`LighthouseAuditor`], shells out to the
//! `lighthouse` CLI and attaches it to an already running browser through
//! its remote debugging port, so every target in a run shares one browser
//! and one throttling profile.

use crate::browser::DevToolsEndpoint;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io;
use std::path::PathBuf;
use std::process::Stdio;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

/// Errors that can occur while auditing a page.
#[derive(Debug, Error)]
pub enum AuditError {
    /// The auditor process could not be started.
    #[error("Failed to launch auditor {}: {source}", .program.display())]
    Spawn {
        /// Auditor binary.
        program: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// The auditor exited unsuccessfully.
    #[error("Auditor exited with {status}: {detail}")]
    Failed {
        /// Exit status description.
        status: String,
        /// Last line of the auditor's stderr.
        detail: String,
    },

    /// The auditor's output was not a JSON report.
    #[error("Auditor produced an invalid report: {0}")]
    InvalidReport(#[from] serde_json::Error),

    /// The auditor ran but the page could not be audited, e.g. a navigation
    /// timeout. Carries the auditor's own message.
    #[error("{0}")]
    Runtime(String),
}

/// Result type for audit operations.
pub type Result<T> = std::result::Result<T, AuditError>;

/// Runs a performance audit of one URL through an open browser.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Auditor: Send + Sync {
    /// Audit `url` using the browser behind `endpoint` and return the raw
    /// report object.
    async fn audit(&self, url: &str, endpoint: &DevToolsEndpoint) -> Result<Value>;
}

/// Network and CPU throttling applied to every audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThrottlingProfile {
    /// Simulated round-trip time.
    pub rtt_ms: u32,
    /// Simulated throughput.
    pub throughput_kbps: u32,
    /// CPU slowdown factor.
    pub cpu_slowdown_multiplier: f64,
}

impl Default for ThrottlingProfile {
    fn default() -> Self {
        Self {
            rtt_ms: 40,
            throughput_kbps: 10 * 1024,
            cpu_slowdown_multiplier: 1.0,
        }
    }
}

/// Emulated viewport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenEmulation {
    /// Viewport width in CSS pixels.
    pub width: u32,
    /// Viewport height in CSS pixels.
    pub height: u32,
    /// Device pixel ratio.
    pub device_scale_factor: f64,
}

impl Default for ScreenEmulation {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            device_scale_factor: 1.0,
        }
    }
}

/// Lighthouse invocation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditSettings {
    /// Lighthouse CLI binary.
    pub lighthouse_path: PathBuf,
    /// Throttling profile shared by all targets.
    pub throttling: ThrottlingProfile,
    /// Desktop viewport emulation.
    pub screen: ScreenEmulation,
    /// Lighthouse's own page-load limit, if set.
    pub max_wait_for_load_ms: Option<u64>,
}

impl Default for AuditSettings {
    fn default() -> Self {
        Self {
            lighthouse_path: PathBuf::from("lighthouse"),
            throttling: ThrottlingProfile::default(),
            screen: ScreenEmulation::default(),
            max_wait_for_load_ms: None,
        }
    }
}

/// Audits pages with the Lighthouse CLI.
#[derive(Debug, Clone, Default)]
pub struct LighthouseAuditor {
    settings: AuditSettings,
}

impl LighthouseAuditor {
    /// Create an auditor with the given settings.
    pub fn new(settings: AuditSettings) -> Self {
        Self { settings }
    }

    /// Command-line arguments for auditing `url` through `endpoint`:
    /// performance category only, desktop form factor, fixed throttling.
    pub fn args(&self, url: &str, endpoint: &DevToolsEndpoint) -> Vec<String> {
        let throttling = &self.settings.throttling;
        let screen = &self.settings.screen;

        let mut args = vec![
            url.to_string(),
            format!("--port={}", endpoint.port),
            "--output=json".to_string(),
            "--output-path=stdout".to_string(),
            "--quiet".to_string(),
            "--only-categories=performance".to_string(),
            "--form-factor=desktop".to_string(),
            format!("--throttling.rttMs={}", throttling.rtt_ms),
            format!("--throttling.throughputKbps={}", throttling.throughput_kbps),
            format!(
                "--throttling.cpuSlowdownMultiplier={}",
                throttling.cpu_slowdown_multiplier
            ),
            "--screenEmulation.mobile=false".to_string(),
            format!("--screenEmulation.width={}", screen.width),
            format!("--screenEmulation.height={}", screen.height),
            format!(
                "--screenEmulation.deviceScaleFactor={}",
                screen.device_scale_factor
            ),
        ];
        if let Some(ms) = self.settings.max_wait_for_load_ms {
            args.push(format!("--max-wait-for-load={ms}"));
        }
        args
    }
}

#[async_trait]
impl Auditor for LighthouseAuditor {
    async fn audit(&self, url: &str, endpoint: &DevToolsEndpoint) -> Result<Value> {
        let program = &self.settings.lighthouse_path;
        debug!(url, port = endpoint.port, "Running Lighthouse");

        let output = Command::new(program)
            .args(self.args(url, endpoint))
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| AuditError::Spawn {
                program: program.clone(),
                source,
            })?;

        // Lighthouse still prints a report when the page itself failed to
        // load; its runtimeError is the more useful message.
        let report = serde_json::from_slice::<Value>(&output.stdout);
        if let Ok(report) = &report {
            if let Some(message) = runtime_error(report) {
                return Err(AuditError::Runtime(message.to_string()));
            }
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let detail = stderr
                .lines()
                .rev()
                .find(|line| !line.trim().is_empty())
                .unwrap_or("no output")
                .trim()
                .to_string();
            return Err(AuditError::Failed {
                status: output.status.to_string(),
                detail,
            });
        }

        Ok(report?)
    }
}

/// Message of a report's `runtimeError`, if the page could not be audited.
pub fn runtime_error(report: &Value) -> Option<&str> {
    report
        .pointer("/runtimeError/message")
        .and_then(Value::as_str)
        .filter(|message| !message.is_empty())
}

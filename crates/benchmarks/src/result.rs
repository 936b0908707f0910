//! Benchmark result types.
//!
//! This module provides the canonical target, metrics and result types shared
//! by the runner, the results store and the query service. The JSON shape of
//! these types is the persisted on-disk format, so field names are stable.

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Rendering strategy used by a benchmark target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMethod {
    /// Server-side rendering on every request.
    Ssr,
    /// Static generation at build time.
    Ssg,
    /// Client-side rendering in the browser.
    Csr,
}

impl RenderMethod {
    /// All render methods, in comparison-table order.
    pub const ALL: [RenderMethod; 3] = [RenderMethod::Ssr, RenderMethod::Ssg, RenderMethod::Csr];

    /// Lowercase identifier used in JSON and configuration.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ssr => "ssr",
            Self::Ssg => "ssg",
            Self::Csr => "csr",
        }
    }
}

impl fmt::Display for RenderMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One page/rendering-strategy combination to audit.
///
/// Targets are identified by their URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkTarget {
    /// Human readable label, e.g. `Next.js SSR`.
    pub name: String,
    /// Page URL handed to the auditor.
    pub url: String,
    /// Framework that produced the page.
    pub framework: String,
    /// Rendering strategy of the page.
    pub render_method: RenderMethod,
}

impl BenchmarkTarget {
    /// Create a new target.
    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        framework: impl Into<String>,
        render_method: RenderMethod,
    ) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            framework: framework.into(),
            render_method,
        }
    }
}

/// Canonical eight-field metrics record derived from an audit report.
///
/// `performance` is a score in `[0, 100]`; timings are milliseconds and `cls`
/// is the unitless layout shift score. Fields absent from stored JSON read
/// as 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Metrics {
    /// Overall performance score.
    pub performance: f64,
    /// Time to first byte.
    pub ttfb: f64,
    /// First contentful paint.
    pub fcp: f64,
    /// Largest contentful paint.
    pub lcp: f64,
    /// Cumulative layout shift.
    pub cls: f64,
    /// Total blocking time.
    pub tbt: f64,
    /// Speed index.
    pub si: f64,
    /// Time to interactive.
    pub tti: f64,
}

/// Outcome of auditing a single target.
///
/// Flattened into [`BenchmarkResult`], so a result carries either a
/// `metrics` object or an `error` string, never both.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Outcome {
    /// The audit completed and metrics were extracted.
    #[serde(rename = "metrics")]
    Success(Metrics),
    /// The audit failed; carries the failure message.
    #[serde(rename = "error")]
    Failure(String),
}

/// Canonical benchmark result structure.
///
/// Reading rejects entries that carry both `metrics` and `error`, or
/// neither.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StoredResult")]
pub struct BenchmarkResult {
    /// The audited target.
    #[serde(flatten)]
    pub target: BenchmarkTarget,
    /// Timestamp when the audit settled, millisecond precision.
    #[serde(serialize_with = "serialize_millis")]
    pub timestamp: DateTime<Utc>,
    /// Metrics or failure message.
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl BenchmarkResult {
    /// Message recorded when a failure carries no text of its own.
    pub const UNKNOWN_FAILURE: &'static str = "unknown audit failure";

    /// Create a success result stamped with the current time.
    pub fn success(target: BenchmarkTarget, metrics: Metrics) -> Self {
        Self {
            target,
            timestamp: now_millis(),
            outcome: Outcome::Success(metrics),
        }
    }

    /// Create a failure result stamped with the current time.
    ///
    /// An empty message is replaced with [`Self::UNKNOWN_FAILURE`].
    pub fn failure(target: BenchmarkTarget, error: impl Into<String>) -> Self {
        let mut error = error.into();
        if error.trim().is_empty() {
            error = Self::UNKNOWN_FAILURE.to_string();
        }
        Self {
            target,
            timestamp: now_millis(),
            outcome: Outcome::Failure(error),
        }
    }

    /// Metrics of a success result.
    pub fn metrics(&self) -> Option<&Metrics> {
        match &self.outcome {
            Outcome::Success(metrics) => Some(metrics),
            Outcome::Failure(_) => None,
        }
    }

    /// Failure message of a failure result.
    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Success(_) => None,
            Outcome::Failure(error) => Some(error),
        }
    }

    /// Whether the audit succeeded.
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, Outcome::Success(_))
    }
}

/// On-disk shape of a result before the outcome is validated.
#[derive(Deserialize)]
struct StoredResult {
    #[serde(flatten)]
    target: BenchmarkTarget,
    timestamp: DateTime<Utc>,
    #[serde(default)]
    metrics: Option<Metrics>,
    #[serde(default)]
    error: Option<String>,
}

impl TryFrom<StoredResult> for BenchmarkResult {
    type Error = String;

    fn try_from(stored: StoredResult) -> Result<Self, Self::Error> {
        let outcome = match (stored.metrics, stored.error) {
            (Some(metrics), None) => Outcome::Success(metrics),
            (None, Some(error)) => Outcome::Failure(error),
            (Some(_), Some(_)) => {
                return Err(format!(
                    "result for {:?} has both `metrics` and `error`",
                    stored.target.name
                ))
            }
            (None, None) => {
                return Err(format!(
                    "result for {:?} has neither `metrics` nor `error`",
                    stored.target.name
                ))
            }
        };
        Ok(Self {
            target: stored.target,
            timestamp: stored.timestamp,
            outcome,
        })
    }
}

fn now_millis() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

fn serialize_millis<S: Serializer>(at: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&at.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// Ordered per-target outcomes of one run.
///
/// Serialized as a bare JSON array; order follows the target registry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultSet(Vec<BenchmarkResult>);

impl ResultSet {
    /// Create an empty result set sized for `capacity` targets.
    pub fn with_capacity(capacity: usize) -> Self {
        Self(Vec::with_capacity(capacity))
    }

    /// Append the next target's result.
    pub fn push(&mut self, result: BenchmarkResult) {
        self.0.push(result);
    }

    /// Number of results.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set holds no results.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over results in target order.
    pub fn iter(&self) -> std::slice::Iter<'_, BenchmarkResult> {
        self.0.iter()
    }

    /// Iterate over successful results paired with their metrics.
    pub fn successes(&self) -> impl Iterator<Item = (&BenchmarkResult, &Metrics)> {
        self.0.iter().filter_map(|r| r.metrics().map(|m| (r, m)))
    }

    /// Number of failed results.
    pub fn failure_count(&self) -> usize {
        self.0.iter().filter(|r| !r.is_success()).count()
    }

    /// Borrow the results as a slice.
    pub fn as_slice(&self) -> &[BenchmarkResult] {
        &self.0
    }
}

impl From<Vec<BenchmarkResult>> for ResultSet {
    fn from(results: Vec<BenchmarkResult>) -> Self {
        Self(results)
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a BenchmarkResult;
    type IntoIter = std::slice::Iter<'a, BenchmarkResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

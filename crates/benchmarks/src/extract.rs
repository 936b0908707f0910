//! Metrics extraction from raw Lighthouse reports.
//!
//! [`extract`] never fails: absent, non-numeric or non-finite values become
//! `0`, so a malformed report yields zeroed metrics instead of a failed target.

use crate::result::Metrics;
use serde_json::Value;

/// Audit identifiers read from `audits.<id>.numericValue`.
pub mod audit_ids {
    /// Time to first byte.
    pub const SERVER_RESPONSE_TIME: &str = "server-response-time";
    /// First contentful paint.
    pub const FIRST_CONTENTFUL_PAINT: &str = "first-contentful-paint";
    /// Largest contentful paint.
    pub const LARGEST_CONTENTFUL_PAINT: &str = "largest-contentful-paint";
    /// Cumulative layout shift.
    pub const CUMULATIVE_LAYOUT_SHIFT: &str = "cumulative-layout-shift";
    /// Total blocking time.
    pub const TOTAL_BLOCKING_TIME: &str = "total-blocking-time";
    /// Speed index.
    pub const SPEED_INDEX: &str = "speed-index";
    /// Time to interactive.
    pub const INTERACTIVE: &str = "interactive";
}

/// Map a Lighthouse result object to canonical metrics.
pub fn extract(report: &Value) -> Metrics {
    let score = non_negative(report.pointer("/categories/performance/score"));

    Metrics {
        performance: (score * 100.0).min(100.0),
        ttfb: audit_value(report, audit_ids::SERVER_RESPONSE_TIME),
        fcp: audit_value(report, audit_ids::FIRST_CONTENTFUL_PAINT),
        lcp: audit_value(report, audit_ids::LARGEST_CONTENTFUL_PAINT),
        cls: audit_value(report, audit_ids::CUMULATIVE_LAYOUT_SHIFT),
        tbt: audit_value(report, audit_ids::TOTAL_BLOCKING_TIME),
        si: audit_value(report, audit_ids::SPEED_INDEX),
        tti: audit_value(report, audit_ids::INTERACTIVE),
    }
}

fn audit_value(report: &Value, id: &str) -> f64 {
    non_negative(
        report
            .get("audits")
            .and_then(|audits| audits.get(id))
            .and_then(|audit| audit.get("numericValue")),
    )
}

fn non_negative(value: Option<&Value>) -> f64 {
    match value.and_then(Value::as_f64) {
        Some(v) if v.is_finite() && v > 0.0 => v,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn full_report() -> Value {
        json!({
            "categories": { "performance": { "score": 0.92 } },
            "audits": {
                "server-response-time": { "numericValue": 120.5 },
                "first-contentful-paint": { "numericValue": 800.0 },
                "largest-contentful-paint": { "numericValue": 1200.0 },
                "cumulative-layout-shift": { "numericValue": 0.015 },
                "total-blocking-time": { "numericValue": 40.0 },
                "speed-index": { "numericValue": 950.0 },
                "interactive": { "numericValue": 1500.0 }
            }
        })
    }

    #[test]
    fn test_extract_empty_report_is_all_zero() {
        assert_eq!(extract(&json!({})), Metrics::default());
    }

    #[test]
    fn test_extract_non_object_report_is_all_zero() {
        assert_eq!(extract(&json!("not a report")), Metrics::default());
        assert_eq!(extract(&Value::Null), Metrics::default());
    }

    #[test]
    fn test_extract_full_report() {
        let metrics = extract(&full_report());
        assert!((metrics.performance - 92.0).abs() < 1e-9);
        assert_eq!(metrics.ttfb, 120.5);
        assert_eq!(metrics.fcp, 800.0);
        assert_eq!(metrics.lcp, 1200.0);
        assert_eq!(metrics.cls, 0.015);
        assert_eq!(metrics.tbt, 40.0);
        assert_eq!(metrics.si, 950.0);
        assert_eq!(metrics.tti, 1500.0);
    }

    #[test]
    fn test_missing_layout_shift_audit_defaults_to_zero() {
        let mut report = full_report();
        report["audits"]
            .as_object_mut()
            .unwrap()
            .remove(audit_ids::CUMULATIVE_LAYOUT_SHIFT);

        let metrics = extract(&report);
        assert_eq!(metrics.cls, 0.0);
        assert_eq!(metrics.lcp, 1200.0);
    }

    #[test]
    fn test_non_numeric_values_default_to_zero() {
        let report = json!({
            "categories": { "performance": { "score": null } },
            "audits": { "speed-index": { "numericValue": "fast" } }
        });

        let metrics = extract(&report);
        assert_eq!(metrics.performance, 0.0);
        assert_eq!(metrics.si, 0.0);
    }

    #[test]
    fn test_performance_is_clamped_to_range() {
        let over = json!({ "categories": { "performance": { "score": 1.7 } } });
        let under = json!({ "categories": { "performance": { "score": -0.3 } } });

        assert_eq!(extract(&over).performance, 100.0);
        assert_eq!(extract(&under).performance, 0.0);
    }
}

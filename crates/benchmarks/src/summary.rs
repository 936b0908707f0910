//! Console summary of a run.
//!
//! [`summarize`] only reads its input, so rendering the same result set twice
//! yields identical text. Failed targets are left out of every section.

use crate::result::{Metrics, RenderMethod, ResultSet};
use std::fmt::Write;

const RULE_WIDTH: usize = 80;

/// Notice printed when no target produced metrics.
pub const NOTHING_TO_SUMMARIZE: &str = "No successful benchmarks to summarize.";

/// Render the per-target score listing and, when each render method has
/// exactly one successful result, the side-by-side Core Web Vitals table.
pub fn summarize(results: &ResultSet) -> String {
    let mut output = String::new();
    let rule = "=".repeat(RULE_WIDTH);

    let _ = writeln!(output, "{rule}");
    let _ = writeln!(output, "BENCHMARK SUMMARY");
    let _ = writeln!(output, "{rule}");
    let _ = writeln!(output);

    if results.successes().next().is_none() {
        let _ = writeln!(output, "{NOTHING_TO_SUMMARIZE}");
        return output;
    }

    let _ = writeln!(output, "Performance Scores:");
    for (result, metrics) in results.successes() {
        let _ = writeln!(
            output,
            "  {:<20}: {:.1}/100",
            result.target.name, metrics.performance
        );
    }

    if let Some([ssr, ssg, csr]) = comparison_columns(results) {
        let _ = writeln!(output);
        let _ = writeln!(output, "Core Web Vitals:");
        let _ = writeln!(output, "  Metric      SSR        SSG        CSR");
        let _ = writeln!(output, "  {}", "-".repeat(40));
        let rows: [(&str, fn(&Metrics) -> String, &str); 4] = [
            ("TTFB", |m| format!("{:.0}", m.ttfb), "ms"),
            ("FCP", |m| format!("{:.0}", m.fcp), "ms"),
            ("LCP", |m| format!("{:.0}", m.lcp), "ms"),
            ("CLS", |m| format!("{:.3}", m.cls), ""),
        ];
        for (label, value, unit) in rows {
            let _ = writeln!(
                output,
                "  {:<12}{:<11}{:<11}{}{}",
                label,
                value(ssr),
                value(ssg),
                value(csr),
                unit
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "{rule}");
    output
}

/// Metrics for the SSR, SSG and CSR columns, if each has exactly one success.
fn comparison_columns(results: &ResultSet) -> Option<[&Metrics; 3]> {
    let column = move |method: RenderMethod| {
        let mut matches = results
            .successes()
            .filter(move |(r, _)| r.target.render_method == method)
            .map(|(_, m)| m);
        match (matches.next(), matches.next()) {
            (Some(metrics), None) => Some(metrics),
            _ => None,
        }
    };

    Some([
        column(RenderMethod::Ssr)?,
        column(RenderMethod::Ssg)?,
        column(RenderMethod::Csr)?,
    ])
}

//! Markdown output generation for benchmark results.
//!
//! Unlike the console summary, the markdown report lists every target,
//! including failures, so it can be committed alongside the snapshots.

use crate::result::{Outcome, ResultSet};
use std::fmt::Write;

/// Generate a markdown report from a result set.
pub fn render_report(results: &ResultSet) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Benchmark Summary");
    let _ = writeln!(output);
    let _ = writeln!(output, "## Results");
    let _ = writeln!(output);
    let _ = writeln!(
        output,
        "| Target | Render | Timestamp | Score | TTFB (ms) | FCP (ms) | LCP (ms) | CLS | TBT (ms) | SI (ms) | TTI (ms) |"
    );
    let _ = writeln!(
        output,
        "|--------|--------|-----------|-------|-----------|----------|----------|-----|----------|---------|----------|"
    );

    for result in results {
        let timestamp = result.timestamp.format("%Y-%m-%d %H:%M:%S UTC");
        match &result.outcome {
            Outcome::Success(m) => {
                let _ = writeln!(
                    output,
                    "| {} | {} | {} | {:.1} | {:.0} | {:.0} | {:.0} | {:.3} | {:.0} | {:.0} | {:.0} |",
                    result.target.name,
                    result.target.render_method,
                    timestamp,
                    m.performance,
                    m.ttfb,
                    m.fcp,
                    m.lcp,
                    m.cls,
                    m.tbt,
                    m.si,
                    m.tti
                );
            }
            Outcome::Failure(error) => {
                let _ = writeln!(
                    output,
                    "| {} | {} | {} | failed: {} | | | | | | | |",
                    result.target.name,
                    result.target.render_method,
                    timestamp,
                    escape_cell(error)
                );
            }
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "---");
    let _ = writeln!(
        output,
        "Total targets: {} ({} failed)",
        results.len(),
        results.failure_count()
    );

    output
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

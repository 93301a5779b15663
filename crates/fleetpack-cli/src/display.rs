//! Display formatting for CLI output
//!
//! Render reports are grouped by the configuration entry they concern,
//! with hints shown under each error.

use console::style;
use fleetpack_engine::RenderReport;

/// Print every error of a report, grouped by subject
pub fn display_render_report(report: &RenderReport) {
    println!(
        "  {} Validation failed: {}",
        style("✗").red(),
        style(report.summary()).bold()
    );
    println!();

    for (subject, errors) in &report.errors_by_subject {
        println!(
            "  {} {} ({})",
            style("→").blue(),
            style(subject).yellow(),
            pluralize(errors.len(), "error", "errors")
        );

        for error in errors {
            println!(
                "    {} {} {}",
                style("✗").red(),
                error,
                style(format!("[{}]", error.kind().to_code_string())).dim()
            );

            if let Some(help) = error.help_text() {
                println!("      {} {}", style("hint:").blue(), help);
            }
        }
        println!();
    }
}

/// `1 error`, `3 errors`
pub fn pluralize(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{} {}", count, singular)
    } else {
        format!("{} {}", count, plural)
    }
}

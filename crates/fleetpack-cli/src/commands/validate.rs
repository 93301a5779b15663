//! Validate command - report every configuration error without rendering

use console::style;
use std::path::Path;

use super::{ValuesArgs, prepare};
use crate::display::display_render_report;
use crate::error::{CliError, Result};

pub fn run(
    pack_path: &Path,
    release_name: &str,
    namespace: &str,
    values: &ValuesArgs<'_>,
    json_output: bool,
) -> Result<()> {
    let inputs = prepare(pack_path, release_name, namespace, values)?;
    let meta = &inputs.pack.pack.metadata;

    if !json_output {
        println!(
            "{} Validating {} v{}{}",
            style("→").blue(),
            meta.name,
            meta.version,
            values
                .environment
                .map(|e| format!(" for environment {}", style(e).cyan()))
                .unwrap_or_default()
        );
    }

    let report = inputs.engine.validate(&inputs.context);

    if json_output {
        let output = serde_json::json!({
            "valid": !report.has_errors(),
            "pack": {
                "name": meta.name,
                "version": meta.version.to_string(),
            },
            "environment": values.environment,
            "errors": report.errors().map(|e| {
                serde_json::json!({
                    "kind": e.kind().to_code_string(),
                    "message": e.to_string(),
                    "help": e.help_text(),
                })
            }).collect::<Vec<_>>(),
        });
        let text = serde_json::to_string_pretty(&output).map_err(|e| CliError::Other {
            message: format!("Failed to serialize report: {}", e),
        })?;
        println!("{}", text);
    } else if report.has_errors() {
        println!();
        display_render_report(&report);
    } else {
        println!("  {} Configuration is valid", style("✓").green());
        println!();
        println!("{} Validation passed!", style("✓").green().bold());
    }

    match report.first() {
        Some(first) => Err(CliError::ValidationFailed {
            summary: report.summary(),
            kind: first.kind(),
        }),
        None => Ok(()),
    }
}

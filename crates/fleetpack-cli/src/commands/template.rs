//! Template command - render manifests locally

use console::style;
use std::fs;
use std::io::Write;
use std::path::Path;

use super::{ValuesArgs, prepare};
use crate::error::{CliError, Result};

pub struct TemplateOptions<'a> {
    pub output_dir: Option<&'a Path>,
    pub show_only: &'a [String],
    pub show_values: bool,
}

pub fn run(
    name: &str,
    pack_path: &Path,
    namespace: &str,
    values: &ValuesArgs<'_>,
    options: &TemplateOptions<'_>,
) -> Result<()> {
    let inputs = prepare(pack_path, name, namespace, values)?;

    // Show merged values if requested
    if options.show_values {
        let yaml = serde_yaml::to_string(&inputs.context.values).map_err(|e| CliError::Other {
            message: format!("Failed to serialize values: {}", e),
        })?;
        println!("{}", style("# Computed Values").cyan().bold());
        println!("---");
        println!("{}", yaml.trim_end());
        println!("---");
        println!();
    }

    let manifests = inputs.engine.render(&inputs.context)?;
    let manifests = if options.show_only.is_empty() {
        manifests
    } else {
        manifests.filter_sources(options.show_only)
    };

    match options.output_dir {
        Some(output_path) => {
            fs::create_dir_all(output_path)?;

            for (filename, content) in manifests.by_source()? {
                let file_path = output_path.join(&filename);

                // Create parent directories if needed
                if let Some(parent) = file_path.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::write(&file_path, content)?;

                println!("{} {}", style("wrote").green(), file_path.display());
            }
        }
        None => {
            let yaml = manifests.to_yaml()?;
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(yaml.as_bytes())?;
            stdout.flush()?;
        }
    }

    Ok(())
}

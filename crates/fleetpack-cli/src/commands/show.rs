//! Show command - display pack information and resolved settings

use console::style;
use fleetpack_core::{Layer, ResolvedApp};
use std::path::Path;

use super::{ValuesArgs, prepare};
use crate::display::pluralize;
use crate::error::{CliError, Result};

pub fn run(
    path: &Path,
    release_name: &str,
    namespace: &str,
    values: &ValuesArgs<'_>,
    resolved: bool,
    json_output: bool,
) -> Result<()> {
    let inputs = prepare(path, release_name, namespace, values)?;
    let pack = &inputs.pack;
    let meta = &pack.pack.metadata;

    if json_output {
        let resolution = inputs.engine.resolve(&inputs.context);
        let apps: Vec<&ResolvedApp> = resolution.apps.iter().filter_map(|a| a.as_ref().ok()).collect();
        let output = serde_json::json!({
            "pack": {
                "name": meta.name,
                "version": meta.version.to_string(),
                "appVersion": meta.app_version,
            },
            "environments": pack.environments()?,
            "global": resolution.global.as_ref().ok(),
            "apps": apps,
            "errors": resolution.errors().iter().map(|e| e.to_string()).collect::<Vec<_>>(),
        });
        let text = serde_json::to_string_pretty(&output).map_err(|e| CliError::Other {
            message: format!("Failed to serialize resolved settings: {}", e),
        })?;
        println!("{}", text);
        return Ok(());
    }

    println!("{}", style(&meta.name).cyan().bold());
    println!("{}", style("=".repeat(meta.name.len())).dim());
    println!();

    // Basic info
    println!("{}: {}", style("Version").bold(), meta.version);

    if let Some(desc) = &meta.description {
        println!("{}: {}", style("Description").bold(), desc);
    }

    if let Some(app_version) = &meta.app_version {
        println!("{}: {}", style("App Version").bold(), app_version);
    }

    println!("{}: {}", style("Managed By").bold(), pack.pack.engine.managed_by);
    println!("{}: {}", style("Color Label").bold(), pack.pack.engine.color_label);

    let environments = pack.environments()?;
    println!();
    if environments.is_empty() {
        println!("{}: none", style("Environments").bold());
    } else {
        println!("{}:", style("Environments").bold());
        for env in &environments {
            let marker = if values.environment == Some(env.as_str()) {
                style("*").green().to_string()
            } else {
                " ".to_string()
            };
            println!("  {} {}", marker, env);
        }
    }

    println!();
    println!(
        "{}: {}",
        style("Applications").bold(),
        pluralize(inputs.context.values.apps.len(), "app", "apps")
    );

    if !resolved {
        for app in &inputs.context.values.apps {
            println!("  - {}", app.name);
        }
        return Ok(());
    }

    let resolution = inputs.engine.resolve(&inputs.context);

    if let Ok(global) = &resolution.global {
        println!();
        println!("{}", style("Global").bold());
        println!("  namespace: {} {}", global.namespace, origin(global.origins.get("namespace")));
        println!(
            "  activeColor: {} {}",
            global.active_color,
            origin(global.origins.get("activeColor"))
        );
    }

    for app in resolution.apps.iter().filter_map(|a| a.as_ref().ok()) {
        println!();
        print_app(app);
    }

    let errors = resolution.errors();
    if !errors.is_empty() {
        println!();
        println!(
            "{} {} while resolving:",
            style("✗").red(),
            pluralize(errors.len(), "error", "errors")
        );
        for error in &errors {
            println!("  {} {}", style("✗").red(), error);
        }
    }

    Ok(())
}

fn print_app(app: &ResolvedApp) {
    println!("{} {}", style("→").blue(), style(&app.name).yellow().bold());

    let field = |name: &str, value: String| {
        println!("    {}: {} {}", name, value, origin(app.origins.get(name)));
    };

    field("namespace", app.namespace.clone());
    field("replicas", app.replicas.to_string());
    field("image", app.image.reference.clone());
    field("color", app.color.to_string());
    field("activeColor", app.active_color.to_string());
    println!(
        "    service: {}",
        app.service.map(|s| s.as_str()).unwrap_or("none")
    );
    if let Some(hpa) = &app.hpa {
        field("hpa", format!("{}..{} replicas", hpa.min_replicas, hpa.max_replicas));
    }
    if let Some(resources) = &app.resources {
        let requests = [&resources.requests.cpu, &resources.requests.memory]
            .into_iter()
            .flatten()
            .cloned()
            .collect::<Vec<_>>()
            .join(", ");
        field("resources", format!("requests [{}]", requests));
    }
}

fn origin(layer: Option<&Layer>) -> String {
    match layer {
        Some(layer) => style(format!("({})", layer)).dim().to_string(),
        None => String::new(),
    }
}

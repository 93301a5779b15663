//! Fleetpack CLI - render blue/green microservice fleets into Kubernetes manifests

use clap::{Args, Parser, Subcommand};
use miette::Result;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod display;
mod error;
mod exit_codes;

use commands::ValuesArgs;
use commands::template::TemplateOptions;

#[derive(Parser)]
#[command(name = "fleetpack")]
#[command(author = "Fleetpack Contributors")]
#[command(version)]
#[command(about = "Render blue/green microservice fleets into Kubernetes manifests", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug output
    #[arg(long, global = true)]
    debug: bool,
}

/// Where values come from
#[derive(Args)]
struct ValuesSource {
    /// Values file(s) to merge over values.yaml
    #[arg(short = 'f', long = "values")]
    values: Vec<PathBuf>,

    /// Set values on command line (key=value)
    #[arg(long = "set")]
    set: Vec<String>,

    /// Environment overlay from the pack's environments/ directory
    #[arg(short, long)]
    environment: Option<String>,

    /// Release namespace, used when no namespace is configured
    #[arg(short, long, default_value = "default")]
    namespace: String,
}

impl ValuesSource {
    fn as_args(&self) -> ValuesArgs<'_> {
        ValuesArgs {
            files: &self.values,
            set: &self.set,
            environment: self.environment.as_deref(),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Render manifests locally
    Template {
        /// Release name
        name: String,

        /// Pack path
        pack: PathBuf,

        #[command(flatten)]
        source: ValuesSource,

        /// Output directory (if not set, outputs to stdout)
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Show only manifests from these sources (e.g. `api` or `ingress.yaml`)
        #[arg(short = 's', long)]
        show_only: Vec<String>,

        /// Show merged values before the manifests
        #[arg(long)]
        show_values: bool,
    },

    /// Validate configuration and report every error
    Validate {
        /// Pack path
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Release name
        #[arg(long, default_value = "release")]
        release: String,

        #[command(flatten)]
        source: ValuesSource,

        /// Output validation results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show pack information
    Show {
        /// Pack path
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Release name
        #[arg(long, default_value = "release")]
        release: String,

        #[command(flatten)]
        source: ValuesSource,

        /// Show resolved per-app settings and where each came from
        #[arg(long)]
        resolved: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing(debug: bool) {
    let default = if debug {
        "fleetpack=debug,fleetpack_core=debug,fleetpack_engine=debug"
    } else {
        "warn"
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

fn main() -> Result<()> {
    // Setup miette for nice error display
    miette::set_panic_hook();

    let cli = Cli::parse();
    init_tracing(cli.debug);

    let result = match cli.command {
        Commands::Template {
            name,
            pack,
            source,
            output_dir,
            show_only,
            show_values,
        } => commands::template::run(
            &name,
            &pack,
            &source.namespace,
            &source.as_args(),
            &TemplateOptions {
                output_dir: output_dir.as_deref(),
                show_only: &show_only,
                show_values,
            },
        ),

        Commands::Validate {
            path,
            release,
            source,
            json,
        } => commands::validate::run(&path, &release, &source.namespace, &source.as_args(), json),

        Commands::Show {
            path,
            release,
            source,
            resolved,
            json,
        } => commands::show::run(
            &path,
            &release,
            &source.namespace,
            &source.as_args(),
            resolved,
            json,
        ),
    };

    if let Err(err) = result {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }

    Ok(())
}

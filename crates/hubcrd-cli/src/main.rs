//! hubcrd CLI - Validate hub.traefik.io manifests against their CRDs

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod display;
mod error;
mod exit_codes;
mod registry;
mod suggestions;

use crate::error::Result;
use crate::registry::RegistryOptions;

#[derive(Parser)]
#[command(name = "hubcrd")]
#[command(author = "hubcrd Contributors")]
#[command(version)]
#[command(about = "Validate hub.traefik.io manifests against their CRDs", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Extra CRD files or directories to register
    #[arg(long = "crds", env = "HUBCRD_CRDS", value_delimiter = ',', global = true)]
    crds: Vec<PathBuf>,

    /// Do not register the embedded hub.traefik.io CRDs
    #[arg(long, env = "HUBCRD_NO_EMBEDDED", global = true)]
    no_embedded: bool,

    /// Also register the CRDs of the current kube context
    #[arg(long, global = true)]
    from_cluster: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate manifest files or directories
    Validate {
        /// Manifest files or directories
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Output validation results as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the registered kinds
    Kinds {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() {
    // Setup miette for nice error display
    miette::set_panic_hook();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let code = if err.use_stderr() {
                exit_codes::USAGE_ERROR
            } else {
                exit_codes::SUCCESS
            };
            let _ = err.print();
            std::process::exit(code);
        }
    };

    init_tracing(cli.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let options = RegistryOptions {
        crds: cli.crds,
        no_embedded: cli.no_embedded,
        from_cluster: cli.from_cluster,
    };

    match cli.command {
        Commands::Validate { paths, json } => commands::validate::run(&paths, &options, json).await,
        Commands::Kinds { json } => commands::kinds::run(&options, json).await,
    }
}

/// Log to stderr; `RUST_LOG` overrides the `-v` level
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

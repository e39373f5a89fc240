//! Chartify CLI - Turn Kubernetes manifests into a Helm chart

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod error;
mod exit_codes;

use error::CliError;

#[derive(Parser)]
#[command(name = "chartify")]
#[command(author = "Chartify Contributors")]
#[command(version)]
#[command(about = "Turn Kubernetes manifests into a Helm chart", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert manifests read from files or stdin into a chart
    Convert {
        /// Chart directory (its name is the chart name)
        #[arg(default_value = "chart")]
        chart_dir: PathBuf,

        /// Manifest files or directories (reads stdin when omitted)
        #[arg(short = 'f', long = "file")]
        files: Vec<PathBuf>,

        /// Application name (detected from object names when omitted)
        #[arg(long)]
        app_name: Option<String>,

        /// Add an imagePullSecrets toggle to every pod spec
        #[arg(long)]
        image_pull_secrets: bool,

        /// Cluster domain used in service DNS names
        #[arg(long, env = "KUBERNETES_CLUSTER_DOMAIN")]
        cluster_domain: Option<String>,

        /// Options file (YAML); flags override its entries
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Print the chart instead of writing it
        #[arg(long)]
        dry_run: bool,
    },

    /// List transformers in dispatch order and the kinds they claim
    Kinds,
}

#[tokio::main]
async fn main() {
    // Setup miette for nice error display
    miette::set_panic_hook();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Convert {
            chart_dir,
            files,
            app_name,
            image_pull_secrets,
            cluster_domain,
            config,
            dry_run,
        } => {
            let options = commands::convert::ConvertArgs {
                chart_dir,
                files,
                app_name,
                image_pull_secrets,
                cluster_domain,
                config,
                dry_run,
            };
            commands::convert::run(options).await
        }

        Commands::Kinds => commands::kinds::run(),
    };

    if let Err(err) = result {
        exit_with(err);
    }
}

/// Log level from `-v` unless `RUST_LOG` is set
fn init_tracing(verbosity: u8) {
    let default = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn exit_with(err: CliError) -> ! {
    let code = err.exit_code();
    eprintln!("{:?}", miette::Report::new(err));
    std::process::exit(code);
}

use clap::{Parser, Subcommand};
use std::process::ExitCode;
use unpage_core::Config;

mod graph;
mod logging;

#[derive(Parser)]
#[command(name = "unpage")]
#[command(about = "Infrastructure knowledge graph for SRE automation", long_about = None)]
struct Cli {
    /// Configuration profile (defaults to $UNPAGE_PROFILE, then "default")
    #[arg(long, global = true)]
    profile: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build and inspect the infrastructure knowledge graph
    Graph {
        #[command(subcommand)]
        command: graph::GraphCommand,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let config = match Config::load(cli.profile.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Commands::Graph { command } => graph::run(command, &config).await,
    }
}

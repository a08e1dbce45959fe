//! `unpage graph ...` commands.

mod build;
mod inspect;
mod logs;
mod status;

use clap::Subcommand;
use std::process::ExitCode;
use std::time::Duration;
use unpage_core::Config;

/// Exit code after SIGINT or SIGTERM.
pub(crate) const EXIT_INTERRUPTED: u8 = 130;

#[derive(Subcommand)]
pub enum GraphCommand {
    /// Build the knowledge graph from every enabled plugin
    Build {
        /// Run the build in a detached process logging to the profile log file
        #[arg(long)]
        background: bool,

        /// Rebuild continuously, sleeping this many seconds between builds
        /// (defaults to graph.interval_secs)
        #[arg(
            long,
            value_name = "SECONDS",
            num_args = 0..=1,
            value_parser = clap::value_parser!(u64).range(1..)
        )]
        interval: Option<Option<u64>>,
    },
    /// Check whether a graph build is running
    Status,
    /// Stop a running graph build
    Stop,
    /// Show the background build log
    Logs {
        /// Keep printing new lines as they are written
        #[arg(short, long)]
        follow: bool,

        /// Number of trailing lines to print
        #[arg(short = 'n', long, default_value_t = 50)]
        lines: usize,
    },
    /// Look up a node in the saved graph by any of its identifiers
    Inspect {
        /// Node id, name, IP address, self link, ...
        identifier: String,

        /// Print the node and its edges as JSON
        #[arg(long)]
        json: bool,
    },
}

pub async fn run(command: GraphCommand, config: &Config) -> ExitCode {
    match command {
        GraphCommand::Build {
            background,
            interval,
        } => {
            let interval = interval
                .map(|secs| Duration::from_secs(secs.unwrap_or(config.graph.interval_secs)));
            if background {
                build::start_background(config)
            } else {
                build::run(config, interval).await
            }
        }
        GraphCommand::Status => status::status(config),
        GraphCommand::Stop => status::stop(config),
        GraphCommand::Logs { follow, lines } => logs::run(config, follow, lines).await,
        GraphCommand::Inspect { identifier, json } => inspect::run(config, &identifier, json),
    }
}

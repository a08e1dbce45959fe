use indicatif::{ProgressBar, ProgressStyle};
use std::ffi::OsString;
use std::fs::{self, OpenOptions};
use std::io;
use std::path::Path;
use std::process::{Command, ExitCode, Stdio};
use std::time::Duration;
use unpage_core::build::{cleanup_pid_file, inspect_pid_file};
use unpage_core::{
    BuildError, BuildLock, BuildReport, Config, GraphBuildOrchestrator, PidStatus, PluginManager,
};

use super::EXIT_INTERRUPTED;

/// Build in the foreground, once or every `interval`.
pub async fn run(config: &Config, interval: Option<Duration>) -> ExitCode {
    let lock = match BuildLock::acquire(config.pid_path()) {
        Ok(Some(lock)) => lock,
        Ok(None) => {
            print_already_running();
            return ExitCode::FAILURE;
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let plugins = PluginManager::from_config(config);
    if plugins.is_empty() {
        tracing::warn!(
            profile = %config.profile,
            "No graph plugins enabled; the graph will be empty"
        );
    }
    let orchestrator = GraphBuildOrchestrator::from_plugins(&plugins)
        .with_timeout(config.graph.build_timeout());
    let snapshot = config.snapshot_path();

    // Dropping the build future aborts every populator
    let code = tokio::select! {
        code = build_loop(&orchestrator, &snapshot, interval) => code,
        _ = shutdown_signal() => {
            println!("Graph build interrupted");
            ExitCode::from(EXIT_INTERRUPTED)
        }
    };

    drop(lock);
    code
}

async fn build_loop(
    orchestrator: &GraphBuildOrchestrator,
    snapshot: &Path,
    interval: Option<Duration>,
) -> ExitCode {
    loop {
        let result = build_once(orchestrator, snapshot).await;

        let Some(interval) = interval else {
            return match result {
                Ok(()) => ExitCode::SUCCESS,
                Err(_) => ExitCode::FAILURE,
            };
        };

        if result.is_err() {
            tracing::warn!("Build cycle failed; keeping the previous snapshot");
        }
        println!("Next build in {}s", interval.as_secs());
        tokio::time::sleep(interval).await;
    }
}

async fn build_once(
    orchestrator: &GraphBuildOrchestrator,
    snapshot: &Path,
) -> Result<(), BuildError> {
    println!("Building graph...");

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner} {msg} [{elapsed}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(format!(
        "Populating from {}",
        orchestrator.populator_names().join(", ")
    ));
    spinner.enable_steady_tick(Duration::from_millis(120));

    let result = orchestrator.run_cycle(snapshot).await;
    spinner.finish_and_clear();

    match result {
        Ok(report) => {
            print_report(&report, snapshot);
            Ok(())
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            Err(e)
        }
    }
}

fn print_report(report: &BuildReport, snapshot: &Path) {
    println!("Graph built in {:.2}s", report.elapsed.as_secs_f64());
    println!("Graph saved to {}", snapshot.display());
    println!();
    println!("=== Summary ===");
    println!("Nodes: {}", report.stats.nodes);
    println!("Edges: {}", report.stats.edges);
    println!("Identifiers: {}", report.stats.identifiers);
    if report.inference.dangling_references > 0 {
        println!(
            "Unresolved references: {}",
            report.inference.dangling_references
        );
    }

    if !report.stats.nodes_by_type.is_empty() {
        println!();
        println!("Nodes by type:");
        for (node_type, count) in &report.stats.nodes_by_type {
            println!("  {}: {}", node_type, count);
        }
    }

    if !report.stats.edges_by_relationship.is_empty() {
        println!();
        println!("Edges by relationship:");
        for (relationship, count) in &report.stats.edges_by_relationship {
            println!("  {}: {}", relationship, count);
        }
    }
}

fn print_already_running() {
    println!("Graph build already running");
    println!("Use 'unpage graph stop' to stop it if needed");
}

/// Re-run this command without `--background` in a detached process.
///
/// The child takes the build lock itself; this only refuses to start a
/// second build while one is visibly running.
pub fn start_background(config: &Config) -> ExitCode {
    let pid_path = config.pid_path();
    match inspect_pid_file(&pid_path) {
        Ok(PidStatus::Running(_)) => {
            print_already_running();
            return ExitCode::FAILURE;
        }
        Ok(PidStatus::Stale(_)) | Ok(PidStatus::Corrupted) => {
            if let Err(e) = cleanup_pid_file(&pid_path) {
                eprintln!("Error: {}", e);
                return ExitCode::FAILURE;
            }
        }
        Ok(PidStatus::NotRunning) => {}
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    }

    match spawn_detached(&config.log_path()) {
        Ok(pid) => {
            println!("Graph building started in background (PID: {})", pid);
            println!("Check progress: unpage graph logs --follow");
            println!("Stop with: unpage graph stop");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: failed to start background build: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn spawn_detached(log_path: &Path) -> io::Result<u32> {
    if let Some(parent) = log_path.parent() {
        fs::create_dir_all(parent)?;
    }
    let log = OpenOptions::new().create(true).append(true).open(log_path)?;

    let args: Vec<OsString> = std::env::args_os()
        .skip(1)
        .filter(|arg| arg.to_str() != Some("--background"))
        .collect();

    let mut command = Command::new(std::env::current_exe()?);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(log.try_clone()?)
        .stderr(log);

    // Own process group, so Ctrl-C in this terminal does not reach the build
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        command.process_group(0);
    }

    let child = command.spawn()?;
    tracing::debug!(pid = child.id(), log = %log_path.display(), "Spawned background build");
    Ok(child.id())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        if let (Ok(mut sigterm), Ok(mut sigint)) = (
            signal(SignalKind::terminate()),
            signal(SignalKind::interrupt()),
        ) {
            tokio::select! {
                _ = sigterm.recv() => {}
                _ = sigint.recv() => {}
            }
            return;
        }
    }

    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}

use std::process::ExitCode;
use unpage_core::build::{cleanup_pid_file, inspect_pid_file, terminate};
use unpage_core::{Config, PidStatus};

pub fn status(config: &Config) -> ExitCode {
    let pid_path = config.pid_path();
    match inspect_pid_file(&pid_path) {
        Ok(PidStatus::Running(pid)) => {
            println!("Graph build running (PID: {})", pid);
            if config.log_path().exists() {
                println!("View logs: unpage graph logs --follow");
            }
            ExitCode::SUCCESS
        }
        Ok(PidStatus::Stale(pid)) => {
            tracing::info!(pid, "Cleaning up stale PID file");
            clean_up(&pid_path);
            print_not_running(config);
            ExitCode::FAILURE
        }
        Ok(PidStatus::Corrupted) => {
            tracing::info!(path = %pid_path.display(), "Cleaning up corrupted PID file");
            clean_up(&pid_path);
            print_not_running(config);
            ExitCode::FAILURE
        }
        Ok(PidStatus::NotRunning) => {
            print_not_running(config);
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

pub fn stop(config: &Config) -> ExitCode {
    let pid_path = config.pid_path();
    match inspect_pid_file(&pid_path) {
        Ok(PidStatus::Running(pid)) => {
            println!("Stopping graph build (PID: {})...", pid);
            if let Err(e) = terminate(pid) {
                eprintln!("Error: {}", e);
                return ExitCode::FAILURE;
            }
            clean_up(&pid_path);
            println!("Graph build stopped successfully");
            ExitCode::SUCCESS
        }
        Ok(PidStatus::Stale(_)) | Ok(PidStatus::Corrupted) => {
            clean_up(&pid_path);
            print_not_running(config);
            ExitCode::FAILURE
        }
        Ok(PidStatus::NotRunning) => {
            print_not_running(config);
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn print_not_running(config: &Config) {
    println!("No graph build running for profile '{}'", config.profile);
}

fn clean_up(pid_path: &std::path::Path) {
    if let Err(e) = cleanup_pid_file(pid_path) {
        tracing::warn!(error = %e, "Failed to remove PID file");
    }
}

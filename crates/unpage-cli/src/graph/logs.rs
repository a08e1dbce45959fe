use std::io::SeekFrom;
use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use unpage_core::Config;

const POLL_INTERVAL: Duration = Duration::from_millis(500);

pub async fn run(config: &Config, follow: bool, lines: usize) -> ExitCode {
    let path = config.log_path();
    if !path.exists() {
        println!("No log file found");
        println!("Expected location: {}", path.display());
        println!("Start a background build with: unpage graph build --background");
        return ExitCode::FAILURE;
    }

    println!("Log file: {}", path.display());

    let content = match tokio::fs::read(&path).await {
        Ok(content) => content,
        Err(e) => {
            eprintln!("Error: failed to read {}: {}", path.display(), e);
            return ExitCode::FAILURE;
        }
    };

    if !follow {
        println!("Recent logs:");
        print!("{}", last_lines(&String::from_utf8_lossy(&content), lines));
        return ExitCode::SUCCESS;
    }

    println!("Following logs (Ctrl+C to stop)");
    print!("{}", last_lines(&String::from_utf8_lossy(&content), lines));

    tokio::select! {
        result = follow_file(&path, content.len() as u64) => {
            if let Err(e) = result {
                eprintln!("Error: {}", e);
                return ExitCode::FAILURE;
            }
        }
        _ = tokio::signal::ctrl_c() => {}
    }
    println!();
    println!("Stopped following logs");
    ExitCode::SUCCESS
}

/// Print bytes appended after `offset` until cancelled.
async fn follow_file(path: &Path, mut offset: u64) -> std::io::Result<()> {
    loop {
        tokio::time::sleep(POLL_INTERVAL).await;

        let len = tokio::fs::metadata(path).await?.len();
        if len < offset {
            // Truncated or replaced
            offset = 0;
        }
        if len == offset {
            continue;
        }

        let mut file = tokio::fs::File::open(path).await?;
        file.seek(SeekFrom::Start(offset)).await?;
        let mut appended = Vec::new();
        file.read_to_end(&mut appended).await?;
        offset += appended.len() as u64;
        print!("{}", String::from_utf8_lossy(&appended));
    }
}

/// The last `n` lines of `content`, each ending in a newline.
fn last_lines(content: &str, n: usize) -> String {
    let all: Vec<&str> = content.lines().collect();
    let start = all.len().saturating_sub(n);
    all[start..].iter().map(|line| format!("{}\n", line)).collect()
}

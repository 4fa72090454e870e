use anyhow::{Context, Result};
use clap::Parser;
use std::io::{self, Write};
use std::path::Path;
use std::process::{Command, ExitCode};
use tracing::info;
use tracing_subscriber::EnvFilter;

use memberroster::cli::Cli;
use memberroster::config;
use memberroster::discovery::DiscoveryError;
use memberroster::runner;
use memberroster::session::Credentials;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.init {
        return match config::init_config() {
            Ok(path) => {
                println!("Wrote default configuration to {}", path.display());
                ExitCode::SUCCESS
            }
            Err(err) => {
                eprintln!("Error: {err}");
                ExitCode::FAILURE
            }
        };
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            // The portal answers a rejected login with a page that has no
            // roster links, so this is the only failure with a dedicated
            // user-facing message. Everything else terminates the run with
            // the raw error chain.
            if matches!(
                err.downcast_ref::<DiscoveryError>(),
                Some(DiscoveryError::NoRosterLinks)
            ) {
                eprintln!("Invalid login. Please check your username and password and try again.");
                ExitCode::from(2)
            } else {
                eprintln!("Error: {err:#}");
                ExitCode::FAILURE
            }
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = config::load()?;

    let username = match cli.username {
        Some(username) => username,
        None => prompt("Username: ")?,
    };
    let password = match cli.password {
        Some(password) => password,
        None => prompt("Password: ")?,
    };

    let report = runner::run(
        &config,
        Credentials { username, password },
        &cli.workdir,
    )
    .await?;

    info!("Pipeline finished");
    println!("Member roster written to {}", report.display());

    if !cli.no_open {
        open_report(&report)?;
    }
    Ok(())
}

fn prompt(label: &str) -> Result<String> {
    print!("{label}");
    io::stdout().flush().context("Failed to flush stdout")?;
    let mut value = String::new();
    io::stdin()
        .read_line(&mut value)
        .context("Failed to read input")?;
    Ok(value.trim().to_string())
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("memberroster={level}")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Open the finished workbook with the host OS default handler.
fn open_report(path: &Path) -> Result<()> {
    #[cfg(target_os = "windows")]
    let status = Command::new("cmd").args(["/C", "start", ""]).arg(path).status();
    #[cfg(target_os = "macos")]
    let status = Command::new("open").arg(path).status();
    #[cfg(all(unix, not(target_os = "macos")))]
    let status = Command::new("xdg-open").arg(path).status();

    let status = status.with_context(|| format!("Failed to open {}", path.display()))?;
    if !status.success() {
        tracing::warn!("Opening {} exited with {status}", path.display());
    }
    Ok(())
}

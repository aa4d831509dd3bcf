use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde::Deserialize;
use tracing_subscriber::EnvFilter;
use vuln_bridge_core::{render_report, CliScanner, OutputFormat, ScanResult, ScannerSettings};

#[derive(Parser, Debug)]
#[command(
    name = "vuln-bridge",
    author,
    version,
    about = "Vulnerability Scan Orchestration CLI"
)]
struct Cli {
    /// Executable name or path used to invoke the scanner
    #[arg(long, value_name = "CMD", global = true)]
    scanner: Option<String>,

    /// Directory holding a managed scanner install
    #[arg(long, value_name = "DIR", global = true)]
    install_dir: Option<PathBuf>,

    /// TOML config file with a [scanner] section
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Report whether the scanner CLI is available on this host
    Status {
        /// Emit machine-readable JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Scan a project directory for known vulnerabilities
    ///
    /// Exits 0 when the scan is clean, 1 when issues are found and 2 when
    /// the scan itself fails.
    Test {
        /// Project root to scan
        #[arg(long, value_name = "DIR", default_value = ".")]
        path: PathBuf,

        /// Emit the decoded result as JSON instead of a report
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(error) => {
            eprintln!("{} {error:#}", "error:".red().bold());
            ExitCode::from(2)
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let settings = load_settings(&cli)?;
    match cli.command.unwrap_or(Commands::Status { json: false }) {
        Commands::Status { json } => status(settings, json),
        Commands::Test { path, json } => run_scan(settings, &path, json),
    }
}

fn status(settings: ScannerSettings, json: bool) -> Result<ExitCode> {
    let scanner = CliScanner::with_settings(settings);
    let installed = scanner.is_installed();
    let resolved = scanner.settings();
    if json {
        let payload = serde_json::json!({
            "installed": installed,
            "command": resolved.resolved_command(),
            "managedPath": resolved.managed_binary_path(),
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else if installed {
        println!(
            "{} scanner CLI is ready ({})",
            "[OK]".green(),
            resolved.resolved_command()
        );
    } else {
        println!("{} scanner CLI not found", "[--]".yellow());
        println!(
            "Install `vulnscan` and make sure it is on PATH, or set {} to the executable.",
            ScannerSettings::COMMAND_ENV
        );
        println!(
            "A managed install would be picked up from {}.",
            resolved.managed_binary_path().display()
        );
    }
    Ok(if installed {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}

fn run_scan(settings: ScannerSettings, path: &Path, json: bool) -> Result<ExitCode> {
    let scanner = CliScanner::with_settings(settings);
    let started = Instant::now();
    let result = scanner
        .scan(path)
        .with_context(|| format!("scan of {} failed", path.display()))?;
    let format = if json {
        OutputFormat::Json
    } else {
        OutputFormat::Human
    };
    print!("{}", render_report(&result, format)?);
    if !json && result.ok {
        println!(
            "Completed in {}",
            humantime::format_duration(round_to_millis(started.elapsed()))
        );
    }
    Ok(scan_exit_code(&result))
}

/// 0 clean, 1 findings, 2 the scanner itself reported failure.
fn scan_exit_code(result: &ScanResult) -> ExitCode {
    if !result.ok {
        ExitCode::from(2)
    } else if result.issues.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}

fn round_to_millis(elapsed: Duration) -> Duration {
    Duration::from_millis(elapsed.as_millis() as u64)
}

fn load_settings(cli: &Cli) -> Result<ScannerSettings> {
    let mut settings = ScannerSettings::default();
    if let Some(path) = &cli.config {
        settings = settings.overridden_by(file_settings(path)?);
    }
    settings = settings.overridden_by(ScannerSettings::from_env());
    let flags = ScannerSettings {
        command: cli.scanner.clone(),
        install_dir: cli.install_dir.clone(),
    };
    let merged = settings.overridden_by(flags);
    tracing::debug!(
        command = ?merged.command,
        install_dir = ?merged.install_dir,
        "resolved scanner settings"
    );
    Ok(merged)
}

/// Shape of the optional `--config` file.
#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    #[serde(default)]
    scanner: ScannerSection,
}

#[derive(Debug, Default, Deserialize)]
struct ScannerSection {
    command: Option<String>,
    install_dir: Option<PathBuf>,
}

fn file_settings(path: &Path) -> Result<ScannerSettings> {
    let loaded: FileSettings = config::Config::builder()
        .add_source(config::File::from(path.to_path_buf()))
        .build()
        .with_context(|| format!("failed to read config file {}", path.display()))?
        .try_deserialize()
        .with_context(|| format!("config file {} is not valid", path.display()))?;
    Ok(ScannerSettings {
        command: loaded.scanner.command,
        install_dir: loaded.scanner.install_dir,
    })
}

fn init_tracing() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init();
}

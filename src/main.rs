//! Remote Database Backup Tool
//!
//! Dumps each configured database on its remote host over SSH, pulls the
//! compressed dump back to local storage, optionally mirrors it to a second
//! directory and emails a consolidated report.

// backupper/src/main.rs
mod backup;
mod config;
mod errors;
mod remote;
mod report;
mod utils;

use anyhow::{Context, Result};
use config::AppConfig;
use remote::ssh::SshTransport;
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

/// Main entry point for the backup tool
fn main() -> ExitCode {
    match run_app() {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("❌ Error: {:?}", e);
            ExitCode::FAILURE
        }
    }
}

/// Usage: `backupper [config.json] [TARGET ...]`
///
/// The first argument is the configuration file path; any further arguments
/// restrict the run to the named targets. Per-target failures are report
/// content, not process failures.
fn run_app() -> Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    let config_path = args
        .first()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.json"));
    let only: Option<Vec<String>> = if args.len() > 1 {
        Some(args[1..].to_vec())
    } else {
        None
    };

    let app_config = AppConfig::load_from_json(&config_path).with_context(|| {
        format!(
            "Failed to load application configuration from {}",
            config_path.display()
        )
    })?;

    println!("🚀 Starting Backup Process...");
    let report = backup::run_backup_flow(&app_config, only.as_deref(), &SshTransport);
    println!(
        "✅ Backup run completed: {}/{} targets succeeded.",
        report.success_count(),
        report.len()
    );
    Ok(())
}

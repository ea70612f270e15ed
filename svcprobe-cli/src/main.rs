//! `check_service`: a monitoring-plugin probe for one system service.
//!
//! Prints exactly one `STATUS - message` line on stdout and exits with the
//! plugin status code (0 OK, 1 WARNING, 2 CRITICAL, 3 UNKNOWN). Diagnostics
//! go to stderr.

mod args;

use anyhow::{Context, Result};
use args::Args;
use clap::error::ErrorKind;
use clap::Parser;
use std::process::ExitCode;
use svcprobe_core::{check_service, CheckResult, SystemProvider};
use tracing::Level;

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = e.print();
            return ExitCode::SUCCESS;
        }
        Err(e) => return report(&CheckResult::unknown(usage_error(&e))),
    };

    let result = run(&args).unwrap_or_else(|e| CheckResult::unknown(format!("{:#}", e)));
    report(&result)
}

fn run(args: &Args) -> Result<CheckResult> {
    let name = args
        .name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .context("No service name was supplied")?;

    init_logging(args.log_level())?;

    tracing::info!(
        service = name,
        interval_ms = args.sample_interval,
        thresholds = ?args.thresholds(),
        "checking service"
    );

    let provider = SystemProvider::new(args.sample_interval());
    Ok(check_service(&provider, name, &args.thresholds()))
}

fn init_logging(level: Level) -> Result<()> {
    // stdout carries the plugin result and nothing else
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialise logging: {}", e))
}

fn report(result: &CheckResult) -> ExitCode {
    println!("{}", result);
    ExitCode::from(result.exit_code())
}

fn usage_error(error: &clap::Error) -> String {
    let rendered = error.to_string();
    let first = rendered.lines().next().unwrap_or_default();
    first.strip_prefix("error: ").unwrap_or(first).to_string()
}

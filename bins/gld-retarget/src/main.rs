//! Replays a header dump through the GLD difficulty rules.
//!
//! Reads JSON-lines headers from a file (or stdin), recomputes the target
//! every header must declare and reports headers whose bits disagree. Exits
//! with status 1 when any mismatch is found.

use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use gld_consensus::retarget::RetargetEngine;
use gld_core::chain_state::MemoryHeaderChain;
use tracing::info;

mod replay;
mod settings;

use replay::{read_headers, replay, summarize};
use settings::{Overrides, Settings};

#[derive(Parser, Debug)]
#[command(
    name = "gld-retarget",
    version,
    about = "Recompute and check the difficulty bits of a header dump"
)]
struct Args {
    /// JSON-lines header dump; `-` reads stdin
    #[arg(long, default_value = "-")]
    headers: String,

    /// Network preset (main, test, regtest)
    #[arg(long)]
    network: Option<String>,

    /// JSON rule file replacing the network preset
    #[arg(long)]
    rules: Option<PathBuf>,

    /// Config file (TOML or JSON); GLD_* environment variables override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print every checked header, not only mismatches
    #[arg(long)]
    all: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Log output format ("text" or "json")
    #[arg(long)]
    log_format: Option<String>,
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();
    let settings = Settings::load(
        args.config.as_deref(),
        Overrides {
            network: args.network.clone(),
            rules_file: args.rules.clone(),
            log_level: args.log_level.clone(),
            log_format: args.log_format.clone(),
        },
    )?;

    init_logging(&settings.log_level, &settings.log_format);

    let rules = settings.rule_set()?;
    info!(
        network = %settings.network,
        rules_file = ?settings.rules_file,
        "gld-retarget v{}",
        env!("CARGO_PKG_VERSION")
    );

    let headers = if args.headers == "-" {
        read_headers(io::stdin().lock())?
    } else {
        let file = File::open(&args.headers)
            .with_context(|| format!("failed to open {}", args.headers))?;
        read_headers(BufReader::new(file))?
    };
    let chain = MemoryHeaderChain::from_headers(headers).context("header dump is not contiguous")?;
    info!(
        headers = chain.len(),
        first = ?chain.base_height(),
        "loaded header dump"
    );

    let engine = RetargetEngine::new(rules);
    let rows = replay(&engine, &chain)?;
    for row in rows.iter().filter(|r| args.all || r.is_mismatch()) {
        let expected = row
            .expected
            .map_or_else(|| "-".to_string(), |bits| bits.to_string());
        let status = if row.is_mismatch() { "MISMATCH" } else { "ok" };
        println!(
            "{}\t{}\t{}\t{}\t{}",
            row.height, row.epoch, row.declared, expected, status
        );
    }

    let summary = summarize(&rows);
    info!(
        checked = summary.checked,
        skipped = summary.skipped,
        mismatches = summary.mismatches,
        "replay complete"
    );
    Ok(if summary.mismatches == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Initialize tracing subscriber with the given log level and output format.
///
/// Logs go to stderr so the report on stdout stays machine-readable. Pass
/// `format = "json"` for structured output; anything else is plain text.
fn init_logging(level_str: &str, format: &str) {
    use tracing_subscriber::filter::EnvFilter;
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level_str));

    if format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(io::stderr))
            .init();
    }
}

//! `prtip`: a controlled-rate TCP connect-scan engine.
//!
//! Parses CLI flags into a [`prtip_core::Config`], builds a [`prtip_scanner::ScanDriver`], and
//! drives it to completion, printing the banner/config-box/summary per SPEC_FULL §6 and mapping
//! errors onto exit codes per SPEC_FULL §7.

mod args;
mod banner;
mod error;
mod output;

use args::Args;
use clap::Parser;
use prtip_scanner::{ScanDriver, StdoutSink};
use std::process::ExitCode;

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => ExitCode::from(error::report(&err) as u8),
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .without_time()
        .init();
}

fn run(args: Args) -> prtip_core::Result<()> {
    let (config, targets, target_file) = args.resolve()?;

    banner::print_banner(env!("CARGO_PKG_VERSION"));
    let target_hint = match &target_file {
        Some(path) => format!("file {}", path.display()),
        None => format!("{} token(s)", targets.len()),
    };
    banner::print_config_box(&config, &target_hint);

    let debug_log = config.output.debug_log;
    let mut sink = if debug_log {
        StdoutSink::with_debug_log(config.scan.show_closed, std::path::Path::new("debug_reply_log.txt"))
            .map_err(prtip_core::Error::Io)?
    } else {
        StdoutSink::new(config.scan.show_closed)
    };

    let mut driver = ScanDriver::new(config, targets, target_file)?;
    let outcome = driver.run(&mut sink)?;

    output::print_summary(&outcome.stats);
    Ok(())
}

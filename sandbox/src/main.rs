//! `hostlink`: run a compiled module against the Hostlink bridge.
//!
//! Usage:
//!
//! ```bash
//! hostlink [OPTIONS] [WASM] [ARGS]...
//! ```
//!
//! Logs go to stderr; `RUST_LOG` overrides the default `warn` filter and
//! `--verbose` forces `debug`. Exits with status 1 when the module cannot
//! be loaded or the guest traps.

use std::process::ExitCode;

use clap::Parser;
use hostlink_sandbox::cli::Cli;
use hostlink_sandbox::{Sandbox, SandboxError};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), SandboxError> {
    let sandbox = Sandbox::from_file(&cli.wasm, cli.sandbox_config())?;
    let report = sandbox.run(cli.args)?;
    tracing::debug!(
        entry_point = report.entry_point,
        pending_reads = report.host.reads.len(),
        live_refs = report.host.refs.len(),
        live_blocks = report.host.heap.live_count(),
        "module finished"
    );
    Ok(())
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

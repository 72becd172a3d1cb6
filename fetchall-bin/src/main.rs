//! `fetchall` sends a stream of HTTP requests concurrently and prints the
//! outcome of each request as soon as it completes.
//!
//! The fetchall binary is a wrapper around fetchall-lib, which provides
//! the dispatcher and the redirect-following executor.
//!
//! Fetch a single URL:
//! ```sh
//! fetchall https://example.com
//! ```
//!
//! Read requests from a file, one per line, in the format `[METHOD] URL [BODY]`:
//! ```sh
//! fetchall requests.txt
//! ```
//!
//! Read requests from stdin, with at most 16 requests in flight:
//! ```sh
//! cat requests.txt | fetchall --max-concurrency 16 -
//! ```
#![warn(clippy::all, clippy::pedantic)]
#![warn(
    absolute_paths_not_starting_with_crate,
    rustdoc::invalid_html_tags,
    missing_copy_implementations,
    missing_debug_implementations,
    semicolon_in_expressions_from_macros,
    unreachable_pub,
    unused_extern_crates,
    variant_size_differences,
    clippy::missing_const_for_fn
)]
#![deny(anonymous_parameters, macro_use_extern_crate)]
#![deny(missing_docs)]

use std::io;
use std::path::PathBuf;

use anyhow::{Error, Result, bail};
use clap::Parser;
use formatters::log::init_logging;
use log::{error, warn};

mod client;
mod commands;
mod formatters;
mod input;
mod options;
mod parse;
mod stats;
mod verbosity;

use crate::commands::CommandParams;
use crate::formatters::stats::output_statistics;
use crate::options::{Config, FETCHALL_CONFIG_FILE, FetchallOptions};

/// A C-like enum that can be cast to `i32` and used as process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExitCode {
    Success = 0,
    // NOTE: exit code 1 is used for any `Result::Err` bubbled up to `main()`
    // using the `?` operator.
    #[allow(unused)]
    UnexpectedFailure = 1,
    FetchFailure = 2,
    ConfigFile = 3,
}

fn main() -> Result<()> {
    // std::process::exit doesn't guarantee that all destructors will be run,
    // therefore we wrap the main code in another function to ensure that.
    // See: https://doc.rust-lang.org/stable/std/process/fn.exit.html
    let exit_code = run_main()?;
    std::process::exit(exit_code);
}

/// Merge a config file into the options from the command line.
///
/// An explicit `--config` file must exist, `fetchall.toml` in the current
/// directory is only loaded if present. Either one is an error if it is
/// invalid. On error, `opts` is left untouched.
fn merge_config_file(opts: &mut FetchallOptions) -> Result<()> {
    let (path, kind) = match &opts.config_file {
        Some(path) => (path.clone(), "configuration file"),
        None => {
            let default_config = PathBuf::from(FETCHALL_CONFIG_FILE);
            if !default_config.is_file() {
                return Ok(());
            }
            (default_config, "default configuration file")
        }
    };

    match Config::load_from_file(&path) {
        Ok(config) => {
            opts.config.merge(config);
            Ok(())
        }
        Err(e) => bail!("Cannot load {kind} `{}`: {e:?}", path.display()),
    }
}

/// Set up runtime and call fetchall entrypoint
fn run_main() -> Result<i32> {
    use std::process::exit;

    let mut opts = FetchallOptions::parse();

    if let Err(e) = merge_config_file(&mut opts) {
        // Only the command line is known at this point
        init_logging(&opts.config.verbose, &opts.config.mode);
        error!(
            "Error while loading config: {e}\n\
            See: fetchall.example.toml in the fetchall {} sources",
            env!("CARGO_PKG_VERSION")
        );
        exit(ExitCode::ConfigFile as i32);
    }
    init_logging(&opts.config.verbose, &opts.config.mode);

    let runtime = match opts.config.threads {
        Some(threads) => {
            // We define our own runtime instead of the `tokio::main` attribute
            // since we want to make the number of threads configurable
            tokio::runtime::Builder::new_multi_thread()
                .worker_threads(threads)
                .enable_all()
                .build()?
        }
        None => tokio::runtime::Runtime::new()?,
    };

    match runtime.block_on(run(&opts)) {
        Err(e) if Some(io::ErrorKind::BrokenPipe) == underlying_io_error_kind(&e) => {
            exit(ExitCode::Success as i32);
        }
        res => res,
    }
}

/// Check if the given error can be traced back to an `io::ErrorKind`
/// This is helpful for troubleshooting the root cause of an error.
/// Code is taken from the anyhow documentation.
fn underlying_io_error_kind(error: &Error) -> Option<io::ErrorKind> {
    for cause in error.chain() {
        if let Some(io_error) = cause.downcast_ref::<io::Error>() {
            return Some(io_error.kind());
        }
    }
    None
}

/// Run fetchall on the given inputs
async fn run(opts: &FetchallOptions) -> Result<i32> {
    let client = client::create(&opts.config)?;
    let params = CommandParams {
        client,
        inputs: opts.inputs(),
        formatter: formatters::get_response_formatter(&opts.config.mode),
        cfg: opts.config.clone(),
    };

    let (stats, exit_code) = commands::fetch(params).await?;
    output_statistics(&stats, &opts.config)?;

    if stats.is_empty() {
        warn!("No requests found in the given inputs");
    }

    Ok(exit_code as i32)
}

use std::io::{self, Write};
use std::time::Instant;

use anyhow::{Context, Result};
use fetchall_lib::{CancellationToken, Dispatcher, Executor};
use futures::StreamExt;
use log::{info, warn};

use super::CommandParams;
use crate::ExitCode;
use crate::input;
use crate::stats::ResponseStats;

/// Send all requests of the inputs and print each result as it arrives.
///
/// Pressing Ctrl-C stops reading further requests. Requests which were
/// already read still report a result, so the summary is complete.
pub(crate) async fn fetch(params: CommandParams) -> Result<(ResponseStats, ExitCode)> {
    let CommandParams {
        client,
        inputs,
        formatter,
        cfg,
    } = params;

    let cancel = CancellationToken::new();
    let interrupt = tokio::spawn(cancel_on_ctrl_c(cancel.clone()));

    let executor = Executor::new(client).max_redirects(cfg.max_redirects);
    let mut dispatcher = Dispatcher::new(executor).buffer(cfg.buffer);
    if let Some(max) = cfg.max_concurrency {
        dispatcher = dispatcher.max_concurrency(max);
    }

    let (requests, reader) = input::stream(inputs, cfg.method.to_ascii_uppercase());

    let start = Instant::now();
    let mut stats = ResponseStats::new(&cfg.accept);
    let mut results = dispatcher.dispatch(cancel.clone(), requests);
    while let Some(result) = results.next().await {
        writeln!(io::stdout(), "{}", formatter.format_response(&result))?;
        stats.add(result);
    }
    stats.finish(start.elapsed());
    interrupt.abort();

    if cancel.is_cancelled() {
        // The reader may still be waiting for input that nobody wants
        reader.abort();
        info!("Cancelled after {} results", stats.total);
    } else {
        reader.await.context("Input reader stopped unexpectedly")??;
    }

    let code = if stats.is_success() {
        ExitCode::Success
    } else {
        ExitCode::FetchFailure
    };
    Ok((stats, code))
}

async fn cancel_on_ctrl_c(cancel: CancellationToken) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            warn!("Received Ctrl-C, waiting for running requests to finish");
            cancel.cancel();
        }
        Err(e) => warn!("Cannot listen for Ctrl-C: {e}"),
    }
}

mod compact;
mod json;

pub(crate) use compact::Compact;
pub(crate) use json::Json;

use std::fs;

use anyhow::{Context, Result};

use crate::formatters::get_stats_formatter;
use crate::options::Config;
use crate::stats::ResponseStats;

pub(crate) trait StatsFormatter {
    /// Format the stats of all results
    fn format(&self, stats: &ResponseStats) -> Result<String>;
}

/// Write the summary to the `--output` file, or to stdout if none is set
pub(crate) fn output_statistics(stats: &ResponseStats, cfg: &Config) -> Result<()> {
    let formatter = get_stats_formatter(&cfg.format, &cfg.mode);
    let formatted = formatter.format(stats)?;

    if let Some(output) = &cfg.output {
        fs::write(output, formatted)
            .with_context(|| format!("Cannot write summary to `{}`", output.display()))?;
    } else {
        println!("\n{formatted}");
    }
    Ok(())
}

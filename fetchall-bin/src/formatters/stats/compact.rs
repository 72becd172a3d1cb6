use anyhow::Result;
use console::Style;
use std::{
    fmt::{self, Display},
    sync::LazyLock,
};

use crate::formatters::color::{BOLD_GREEN, BOLD_PINK, BOLD_YELLOW, DIM, NORMAL, color};
use crate::{formatters::get_response_formatter, options, stats::ResponseStats};

use super::StatsFormatter;

struct CompactResponseStats<'a> {
    stats: &'a ResponseStats,
    mode: options::OutputMode,
}

impl Display for CompactResponseStats<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stats = self.stats;

        if !stats.failures.is_empty() {
            let request = if stats.failures.len() == 1 {
                "request"
            } else {
                "requests"
            };

            color!(
                f,
                BOLD_PINK,
                "Issues found in {} {request}. Find details below.\n\n",
                stats.failures.len()
            )?;

            let response_formatter = get_response_formatter(&self.mode);
            for result in &stats.failures {
                writeln!(f, "{}", response_formatter.format_response(result))?;
            }
            writeln!(f)?;
        }

        color!(f, NORMAL, "🔍 {} Total", stats.total)?;
        color!(f, DIM, " (in {}s)", stats.duration_secs)?;
        color!(f, BOLD_GREEN, " ✅ {} OK", stats.successful)?;

        let total_errors = stats.total - stats.successful;
        let err_str = if total_errors == 1 { "Error" } else { "Errors" };
        color!(f, BOLD_PINK, " 🚫 {} {}", total_errors, err_str)?;

        write_if_any(stats.failed_status, "❓", "Failed status", &BOLD_PINK, f)?;
        write_if_any(stats.transport_errors, "🔌", "Network errors", &BOLD_PINK, f)?;
        write_if_any(stats.malformed, "⛔", "Malformed", &BOLD_YELLOW, f)?;
        write_if_any(stats.redirect_limit, "🔀", "Redirect limit", &BOLD_YELLOW, f)?;
        write_if_any(stats.cancelled, "👻", "Cancelled", &BOLD_YELLOW, f)?;

        Ok(())
    }
}

fn write_if_any(
    value: usize,
    symbol: &str,
    text: &str,
    style: &LazyLock<Style>,
    f: &mut fmt::Formatter<'_>,
) -> Result<(), fmt::Error> {
    if value > 0 {
        color!(f, style, " {} {} {}", symbol, value, text)?;
    }
    Ok(())
}

pub(crate) struct Compact {
    mode: options::OutputMode,
}

impl Compact {
    pub(crate) const fn new(mode: options::OutputMode) -> Self {
        Self { mode }
    }
}

impl StatsFormatter for Compact {
    fn format(&self, stats: &ResponseStats) -> Result<String> {
        let compact = CompactResponseStats {
            stats,
            mode: self.mode.clone(),
        };
        Ok(compact.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::OutputMode;
    use fetchall_lib::{ErrorKind, FetchResult};
    use http::StatusCode;

    #[test]
    fn test_formatter() {
        let mut stats = ResponseStats::new(&[]);
        stats.add(FetchResult::ok(0, "https://example.com/ok".into(), StatusCode::OK));
        stats.add(FetchResult::ok(
            1,
            "https://example.com/missing".into(),
            StatusCode::NOT_FOUND,
        ));
        stats.add(FetchResult::failed(
            2,
            "https://example.com/later".into(),
            ErrorKind::Cancelled,
        ));

        let formatter = Compact::new(OutputMode::Plain);
        let result = console::strip_ansi_codes(&formatter.format(&stats).unwrap()).to_string();

        assert!(result.contains("Issues found in 2 requests."));
        assert!(result.contains("[404] https://example.com/missing (#1)\n"));
        assert!(result.contains("[ERR] https://example.com/later (#2) | Request cancelled"));
        assert!(!result.contains("https://example.com/ok"));
        assert!(result.contains("🔍 3 Total"));
        assert!(result.contains("✅ 1 OK"));
        assert!(result.contains("🚫 2 Errors"));
        assert!(result.contains("👻 1 Cancelled"));
        assert!(!result.contains("Network errors"));
    }

    #[test]
    fn test_formatter_without_failures() {
        let mut stats = ResponseStats::new(&[]);
        stats.add(FetchResult::ok(0, "https://example.com".into(), StatusCode::OK));

        let result = Compact::new(OutputMode::Plain).format(&stats).unwrap();
        let result = console::strip_ansi_codes(&result).to_string();

        assert!(!result.contains("Issues found"));
        assert!(result.contains("🚫 0 Errors"));
    }
}

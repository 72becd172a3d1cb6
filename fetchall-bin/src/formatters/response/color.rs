use console::Style;
use fetchall_lib::FetchResult;
use std::sync::LazyLock;

use crate::formatters::color::{DIM, GREEN, PINK, YELLOW};

use super::{MAX_RESPONSE_OUTPUT_WIDTH, ResponseFormatter, details, status_text};

/// A colorized formatter for fetch results
///
/// This formatter is used if the terminal supports color and the user
/// has not explicitly requested plain, uncolored output.
pub(crate) struct ColorFormatter;

impl ColorFormatter {
    /// Determine the color for formatted output based on the outcome.
    fn status_color(result: &FetchResult) -> &'static LazyLock<Style> {
        match (&result.error, result.status) {
            (Some(error), _) if error.is_cancelled() => &DIM,
            (Some(_), _) => &PINK,
            (None, Some(status)) if status.as_u16() >= 400 => &YELLOW,
            (None, _) => &GREEN,
        }
    }

    /// Right-align the status within the status column.
    fn format_status(result: &FetchResult) -> String {
        let status = status_text(result);

        // Calculate the effective padding. Ensure it's non-negative to avoid panic.
        let padding = MAX_RESPONSE_OUTPUT_WIDTH.saturating_sub(status.len() + 2); // +2 for brackets

        format!("{}[{status}]", " ".repeat(padding))
    }
}

impl ResponseFormatter for ColorFormatter {
    fn format_response(&self, result: &FetchResult) -> String {
        let colored_status = ColorFormatter::status_color(result)
            .apply_to(ColorFormatter::format_status(result));
        format!("{colored_status} {}", details(result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fetchall_lib::ErrorKind;
    use http::StatusCode;
    use pretty_assertions::assert_eq;

    /// Helper function to strip ANSI color codes for tests
    fn strip_ansi_codes(s: &str) -> String {
        console::strip_ansi_codes(s).to_string()
    }

    #[test]
    fn test_format_status() {
        let result = FetchResult::ok(0, "https://example.com".into(), StatusCode::OK);
        assert_eq!(ColorFormatter::format_status(&result), "  [200]");
    }

    #[test]
    fn test_format_response_with_error() {
        let result = FetchResult::failed(
            2,
            "https://example.com/404".into(),
            ErrorKind::Transport("connection refused".into()),
        );
        let formatted = strip_ansi_codes(&ColorFormatter.format_response(&result));
        assert_eq!(
            formatted,
            "  [ERR] https://example.com/404 (#2) | Network error: connection refused"
        );
    }

    #[test]
    fn test_status_color() {
        let url = String::from("https://example.com");
        let ok = FetchResult::ok(0, url.clone(), StatusCode::OK);
        let not_found = FetchResult::ok(0, url.clone(), StatusCode::NOT_FOUND);
        let cancelled = FetchResult::failed(0, url, ErrorKind::Cancelled);

        assert!(std::ptr::eq(ColorFormatter::status_color(&ok), &GREEN));
        assert!(std::ptr::eq(ColorFormatter::status_color(&not_found), &YELLOW));
        assert!(std::ptr::eq(ColorFormatter::status_color(&cancelled), &DIM));
    }
}

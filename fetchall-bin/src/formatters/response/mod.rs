use fetchall_lib::FetchResult;

mod color;
mod plain;

pub(crate) use color::ColorFormatter;
pub(crate) use plain::PlainFormatter;

/// Desired total width of the status column for the color formatter
///
/// This is the width of the longest log level, `[ERROR]`, so that log
/// messages line up with results.
pub(crate) const MAX_RESPONSE_OUTPUT_WIDTH: usize = 7;

/// A trait for formatting a single fetch result
///
/// This trait is used to convert a result into a human-readable line.
/// It can be implemented for different formatting styles such as
/// colorized output or plaintext.
pub(crate) trait ResponseFormatter: Send + Sync {
    /// Format the result into a human-readable string
    fn format_response(&self, result: &FetchResult) -> String;
}

/// The status code, or `ERR` if no response was received
fn status_text(result: &FetchResult) -> String {
    result
        .status
        .map_or_else(|| "ERR".to_string(), |status| status.as_u16().to_string())
}

/// Everything after the status: the URL, the index and the error, if any
fn details(result: &FetchResult) -> String {
    match &result.error {
        Some(error) => format!("{} (#{}) | {error}", result.url, result.index),
        None => format!("{} (#{})", result.url, result.index),
    }
}

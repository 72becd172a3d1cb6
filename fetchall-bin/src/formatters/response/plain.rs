use fetchall_lib::FetchResult;

use super::{ResponseFormatter, details, status_text};

/// A basic formatter that prints results without any color codes or other
/// formatting.
///
/// This formatter is used when the user has requested plain output
/// or when the terminal does not support color.
pub(crate) struct PlainFormatter;

impl ResponseFormatter for PlainFormatter {
    fn format_response(&self, result: &FetchResult) -> String {
        format!("[{}] {}", status_text(result), details(result))
    }
}

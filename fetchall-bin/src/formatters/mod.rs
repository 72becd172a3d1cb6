pub(crate) mod color;
pub(crate) mod log;
pub(crate) mod response;
pub(crate) mod stats;

use self::{response::ResponseFormatter, stats::StatsFormatter};
use crate::options::{OutputMode, StatsFormat};

/// Detects whether stdout supports color. This takes into account the
/// `NO_COLOR` and `CLICOLOR_FORCE` environment variables.
fn supports_color() -> bool {
    console::colors_enabled()
}

pub(crate) fn get_stats_formatter(
    format: &StatsFormat,
    mode: &OutputMode,
) -> Box<dyn StatsFormatter> {
    match format {
        StatsFormat::Compact => Box::new(stats::Compact::new(mode.clone())),
        StatsFormat::Json => Box::new(stats::Json::new()),
    }
}

/// Create a response formatter based on the given output mode
pub(crate) fn get_response_formatter(mode: &OutputMode) -> Box<dyn ResponseFormatter> {
    if !supports_color() {
        return Box::new(response::PlainFormatter);
    }
    match mode {
        OutputMode::Plain => Box::new(response::PlainFormatter),
        OutputMode::Color => Box::new(response::ColorFormatter),
    }
}

//! Log output on stderr, next to the results on stdout.
//!
//! `RUST_LOG` takes precedence. Without it, the verbosity flags choose the
//! level of fetchall's own modules, while other crates such as the HTTP
//! stack only get to report problems.
use std::io::Write;

use env_logger::Builder;
use log::LevelFilter;

use crate::{
    formatters::{self, response::MAX_RESPONSE_OUTPUT_WIDTH},
    options::OutputMode,
    verbosity::Verbosity,
};

/// Modules which follow the verbosity flags
const OWN_MODULES: [&str; 2] = ["fetchall", "fetchall_lib"];

/// Most detailed level for all other crates
const DEPENDENCY_LEVEL: LevelFilter = LevelFilter::Warn;

/// Install the global logger.
///
/// Call this once, after the configuration file was merged, so that its
/// `verbose` setting is honored.
pub(crate) fn init_logging(verbose: &Verbosity, mode: &OutputMode) {
    let rust_log = std::env::var("RUST_LOG").ok();
    builder(verbose.log_level_filter(), mode, rust_log.as_deref()).init();
}

fn builder(level: LevelFilter, mode: &OutputMode, rust_log: Option<&str>) -> Builder {
    let mut builder = Builder::new();
    match rust_log {
        Some(filters) => {
            builder.parse_filters(filters);
        }
        None => {
            builder.filter_level(DEPENDENCY_LEVEL.min(level));
            for module in OWN_MODULES {
                builder.filter_module(module, level);
            }
        }
    }

    if mode.is_plain() {
        builder.format(|buf, record| writeln!(buf, "[{}] {}", record.level(), record.args()));
    } else {
        // Right-align the level so messages line up with the result lines
        builder.format(|buf, record| {
            let label = format!("[{}]", record.level());
            let color = formatters::color::color_for_level(record.level());
            writeln!(
                buf,
                "{} {}",
                color.apply_to(format!("{label:>width$}", width = MAX_RESPONSE_OUTPUT_WIDTH)),
                record.args()
            )
        });
    }
    builder
}

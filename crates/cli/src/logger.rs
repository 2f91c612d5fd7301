//! Colored terminal backend for the `log` facade.
//!
//! Lines look like `[builder] built 3 documents ...`: the prefix is the last
//! module segment of the record's target, colored by level. Warnings and
//! errors go to stderr.

use log::{Level, LevelFilter, Log, Metadata, Record};
use owo_colors::{OwoColorize, Stream};
use std::io::Write;

static LOGGER: Logger = Logger;

struct Logger;

/// Installs the logger. Debug records are shown only with `verbose`, and
/// only for inkpress's own crates.
pub fn init(verbose: bool) -> Result<(), log::SetLoggerError> {
    log::set_logger(&LOGGER)?;
    log::set_max_level(if verbose { LevelFilter::Debug } else { LevelFilter::Info });
    Ok(())
}

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level() && (metadata.level() <= Level::Warn || is_own(metadata.target()))
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let level = record.level();
        let line = format!("[{}]", module(record.target()));
        if level <= Level::Warn {
            let mut stderr = std::io::stderr().lock();
            writeln!(stderr, "{} {}", paint(level, &line, Stream::Stderr), record.args()).ok();
        } else {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{} {}", paint(level, &line, Stream::Stdout), record.args()).ok();
        }
    }

    fn flush(&self) {
        std::io::stdout().flush().ok();
    }
}

fn is_own(target: &str) -> bool {
    target == "inkpress" || target.starts_with("inkpress::") || target.starts_with("inkpress_")
}

/// `inkpress_collection::builder` -> `builder`.
fn module(target: &str) -> &str {
    target.rsplit("::").next().unwrap_or(target)
}

fn paint(level: Level, text: &str, stream: Stream) -> String {
    match level {
        Level::Error => text.if_supports_color(stream, |t| t.red()).to_string(),
        Level::Warn => text.if_supports_color(stream, |t| t.yellow()).to_string(),
        Level::Info => text.if_supports_color(stream, |t| t.green()).to_string(),
        Level::Debug | Level::Trace => text.if_supports_color(stream, |t| t.dimmed()).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_is_the_last_module_segment() {
        assert_eq!(module("inkpress_collection::builder"), "builder");
        assert_eq!(module("inkpress"), "inkpress");
        assert_eq!(module("inkpress::watch"), "watch");
    }

    #[test]
    fn only_own_targets_count_as_ours() {
        assert!(is_own("inkpress_render::transform::diagram"));
        assert!(is_own("inkpress::watch"));
        assert!(!is_own("notify::inotify"));
        assert!(!is_own("inkpressive"));
    }
}

// SPDX-License-Identifier: MIT OR Apache-2.0

//! This optional feature adds support for the `log` crate, providing a
//! logger which writes decorated records to stderr.
//!
//! Every record is prefixed with its level and source location:
//!
//! ```text
//! [ INFO]: src/patch.rs@152: Misc0 at 0x0036: 0x0800 -> 0x0000
//! ```
//!
//! Continuation lines of multi-line messages repeat the level only.
//! Records are formatted into one buffer first, so lines of concurrent
//! records do not interleave.

use core::fmt::{self, Write};
use log::{LevelFilter, SetLoggerError};
use std::io::{self, Write as _};

/// Global logger object
static LOGGER: Logger = Logger::new();

/// Install the stderr logger and let records up to `level` through.
///
/// Fails if a logger is already installed.
pub fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
    log::set_logger(&LOGGER)?;
    log::set_max_level(level);
    Ok(())
}

/// Logging implementation which writes to stderr.
#[derive(Debug, Default)]
pub struct Logger(());

impl Logger {
    /// Creates a new logger.
    #[must_use]
    pub const fn new() -> Self {
        Self(())
    }
}

impl log::Log for Logger {
    fn enabled(&self, _metadata: &log::Metadata) -> bool {
        // Filtering already happens in `log` through the max level.
        true
    }

    fn log(&self, record: &log::Record) {
        let mut buf = String::new();
        let _ = DecoratedLog::write(
            &mut buf,
            record.level(),
            record.args(),
            record.file().unwrap_or("<unknown file>"),
            record.line().unwrap_or(0),
        );
        // A logger has nowhere to report its own failures.
        let _ = io::stderr().lock().write_all(buf.as_bytes());
    }

    fn flush(&self) {
        let _ = io::stderr().flush();
    }
}

/// Writer wrapper which prints a log level in front of every line of text
///
/// The fmt::Arguments of a record can only be handed to a fmt::Write
/// implementation, so the decoration is injected in the middle of the
/// fmt::Write machinery by intercepting the strings sent to the writer.
/// Line breaks are held back until more text follows, so trailing ones are
/// dropped and every record ends with exactly one newline.
struct DecoratedLog<'writer, 'a, W: fmt::Write> {
    writer: &'writer mut W,
    log_level: log::Level,
    started: bool,
    pending_breaks: usize,
    file: &'a str,
    line: u32,
}

impl<'writer, 'a, W: fmt::Write> DecoratedLog<'writer, 'a, W> {
    // Call this method to print a level-annotated log
    fn write(
        writer: &'writer mut W,
        log_level: log::Level,
        args: &fmt::Arguments,
        file: &'a str,
        line: u32,
    ) -> fmt::Result {
        let mut decorated_writer = Self {
            writer,
            log_level,
            started: false,
            pending_breaks: 0,
            file,
            line,
        };
        write!(decorated_writer, "{}", *args)?;
        decorated_writer.start_text()?;
        writeln!(decorated_writer.writer)
    }

    /// Emit the record prefix, or the held back line breaks each followed
    /// by the continuation prefix.
    fn start_text(&mut self) -> fmt::Result {
        if !self.started {
            self.started = true;
            return write!(
                self.writer,
                "[{:>5}]: {:>12}@{:03}: ",
                self.log_level, self.file, self.line
            );
        }
        for _ in 0..self.pending_breaks {
            write!(self.writer, "\n{}: ", self.log_level)?;
        }
        self.pending_breaks = 0;
        Ok(())
    }
}

impl<W: fmt::Write> fmt::Write for DecoratedLog<'_, '_, W> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for (index, text) in s.split('\n').enumerate() {
            if index > 0 {
                self.pending_breaks += 1;
            }
            if !text.is_empty() {
                self.start_text()?;
                self.writer.write_str(text)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::Level;

    #[test]
    fn test_decorated_single_line() {
        let mut out = String::new();
        DecoratedLog::write(
            &mut out,
            Level::Info,
            &format_args!("EMP SR settings pointer: {:#06x}", 0x10),
            "src/phy_cap.rs",
            38,
        )
        .unwrap();
        assert_eq!(
            out,
            "[ INFO]: src/phy_cap.rs@038: EMP SR settings pointer: 0x0010\n"
        );
    }

    #[test]
    fn test_decorated_multi_line() {
        let mut out = String::new();
        DecoratedLog::write(
            &mut out,
            Level::Warn,
            &format_args!("first\nsecond"),
            "src/patch.rs",
            7,
        )
        .unwrap();
        assert_eq!(out, "[ WARN]: src/patch.rs@007: first\nWARN: second\n");
    }

    #[test]
    fn test_decorated_break_between_pieces() {
        let mut out = String::new();
        DecoratedLog::write(
            &mut out,
            Level::Trace,
            &format_args!("first\n{}\n\n{}", "second", 4),
            "src/nvm.rs",
            44,
        )
        .unwrap();
        assert_eq!(
            out,
            "[TRACE]:   src/nvm.rs@044: first\nTRACE: second\nTRACE: \nTRACE: 4\n"
        );
    }

    #[test]
    fn test_decorated_trailing_newline() {
        let mut out = String::new();
        DecoratedLog::write(
            &mut out,
            Level::Debug,
            &format_args!("Misc{}: skipped\n", 2),
            "src/patch.rs",
            172,
        )
        .unwrap();
        assert_eq!(out, "[DEBUG]: src/patch.rs@172: Misc2: skipped\n");
    }
}

// Copyright 2018-2020 argmin developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Verbosity-gated diagnostics channel.
//!
//! Errors and warnings go to stderr; info and debug go to stdout (§6). Verbosity is kept
//! per-session, falling back to a process-wide default (an `AtomicU8`) rather than the
//! process-global mutable verbosity the distilled source uses, so sessions stay independently
//! testable. With the `diagnostics` feature disabled, [`Diagnostics::log`] compiles away to
//! nothing heavier than the level comparison.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

/// Severity levels, ordered from least to most verbose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    /// No diagnostic output at all.
    None = 0,
    /// Errors only.
    Error = 1,
    /// Errors and warnings.
    Warn = 2,
    /// Errors, warnings and informational messages.
    Info = 3,
    /// Everything, including debug-level detail (e.g. catalogue scan misses).
    Debug = 4,
}

/// The severity of a single diagnostic record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    /// Routed to stderr.
    Error,
    /// Routed to stderr.
    Warn,
    /// Routed to stdout.
    Info,
    /// Routed to stdout.
    Debug,
}

impl Level {
    fn verbosity(self) -> Verbosity {
        match self {
            Level::Error => Verbosity::Error,
            Level::Warn => Verbosity::Warn,
            Level::Info => Verbosity::Info,
            Level::Debug => Verbosity::Debug,
        }
    }

    fn to_stderr(self) -> bool {
        matches!(self, Level::Error | Level::Warn)
    }
}

static PROCESS_DEFAULT: AtomicU8 = AtomicU8::new(Verbosity::Warn as u8);

/// Set the process-wide default verbosity used by sessions that have not overridden it.
pub fn set_process_default(level: Verbosity) {
    PROCESS_DEFAULT.store(level as u8, Ordering::Relaxed);
}

fn process_default() -> Verbosity {
    match PROCESS_DEFAULT.load(Ordering::Relaxed) {
        0 => Verbosity::None,
        1 => Verbosity::Error,
        2 => Verbosity::Warn,
        3 => Verbosity::Info,
        _ => Verbosity::Debug,
    }
}

/// A session's diagnostics sink.
///
/// Holds its own verbosity (defaulting to the process-wide setting at construction) plus, when
/// the `diagnostics` feature is enabled, a pair of `slog::Logger` drains: one for stderr
/// (error/warn), one for stdout (info/debug).
pub struct Diagnostics {
    verbosity: Verbosity,
    #[cfg(feature = "diagnostics")]
    err_log: slog::Logger,
    #[cfg(feature = "diagnostics")]
    out_log: slog::Logger,
}

impl Diagnostics {
    /// Build diagnostics at the process-wide default verbosity.
    pub fn new() -> Self {
        Diagnostics::at(process_default())
    }

    /// Build diagnostics at an explicit verbosity, overriding the process-wide default.
    pub fn at(verbosity: Verbosity) -> Self {
        Diagnostics {
            verbosity,
            #[cfg(feature = "diagnostics")]
            err_log: build_logger(std::io::stderr()),
            #[cfg(feature = "diagnostics")]
            out_log: build_logger(std::io::stdout()),
        }
    }

    /// Current verbosity.
    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    /// Override the verbosity for this session.
    pub fn set_verbosity(&mut self, verbosity: Verbosity) {
        self.verbosity = verbosity;
    }

    /// Emit a diagnostic record if `level` is enabled by the current verbosity.
    pub fn log(&self, level: Level, message: impl fmt::Display) {
        if level.verbosity() > self.verbosity {
            return;
        }
        #[cfg(feature = "diagnostics")]
        {
            let logger = if level.to_stderr() {
                &self.err_log
            } else {
                &self.out_log
            };
            match level {
                Level::Error => slog::error!(logger, "{}", message),
                Level::Warn => slog::warn!(logger, "{}", message),
                Level::Info => slog::info!(logger, "{}", message),
                Level::Debug => slog::debug!(logger, "{}", message),
            }
        }
        #[cfg(not(feature = "diagnostics"))]
        {
            let _ = (level, message.to_string());
        }
    }

    /// Convenience wrapper for [`Level::Error`].
    pub fn error(&self, message: impl fmt::Display) {
        self.log(Level::Error, message)
    }

    /// Convenience wrapper for [`Level::Warn`].
    pub fn warn(&self, message: impl fmt::Display) {
        self.log(Level::Warn, message)
    }

    /// Convenience wrapper for [`Level::Info`].
    pub fn info(&self, message: impl fmt::Display) {
        self.log(Level::Info, message)
    }

    /// Convenience wrapper for [`Level::Debug`].
    pub fn debug(&self, message: impl fmt::Display) {
        self.log(Level::Debug, message)
    }
}

impl Default for Diagnostics {
    fn default() -> Self {
        Diagnostics::new()
    }
}

#[cfg(feature = "diagnostics")]
fn build_logger<W>(writer: W) -> slog::Logger
where
    W: std::io::Write + Send + 'static,
{
    use slog::Drain;
    let decorator = slog_term::PlainDecorator::new(writer);
    let drain = slog_term::FullFormat::new(decorator).build().fuse();
    let drain = slog_async::Async::new(drain).build().fuse();
    slog::Logger::root(drain, slog::o!())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_ordering() {
        assert!(Verbosity::None < Verbosity::Error);
        assert!(Verbosity::Error < Verbosity::Warn);
        assert!(Verbosity::Warn < Verbosity::Info);
        assert!(Verbosity::Info < Verbosity::Debug);
    }

    #[test]
    fn gating_respects_verbosity() {
        let diag = Diagnostics::at(Verbosity::Warn);
        // Nothing to assert on output directly (it goes to real stdio), but at least this
        // must not panic at any level.
        diag.error("e");
        diag.warn("w");
        diag.info("i");
        diag.debug("d");
    }

    #[test]
    fn process_default_round_trips() {
        set_process_default(Verbosity::Debug);
        assert_eq!(process_default(), Verbosity::Debug);
        set_process_default(Verbosity::Warn);
        assert_eq!(process_default(), Verbosity::Warn);
    }
}

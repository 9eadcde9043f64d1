// Copyright 2018-2020 argmin developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Error taxonomy shared by every operation in this crate.
//!
//! [`ErrorKind`] enumerates the failure categories a caller can match on; [`Error`] is the
//! public, `anyhow`-backed type every fallible operation returns. This mirrors the split the
//! reference toolbox uses internally (a `thiserror` enum that `.into()`s into `anyhow::Error`).

use std::fmt;
use thiserror::Error as ThisError;

/// Failure categories every fallible operation in this crate can produce.
///
/// This is not the Rust error *type* hierarchy; it is the taxonomy a caller reasons about
/// regardless of which method or driver operation raised it.
#[derive(Debug, Clone, ThisError)]
pub enum ErrorKind {
    /// Null or malformed input, dimension <= 0, unknown configuration name, or a configuration
    /// value of the wrong type.
    #[error("invalid argument: {text}")]
    InvalidArgument {
        /// Human-readable detail.
        text: String,
    },
    /// A single-variate method was selected with `d > 1`, or an optional capability was
    /// requested that the bound method does not expose.
    #[error("unsupported: {text}")]
    Unsupported {
        /// Human-readable detail.
        text: String,
    },
    /// `result` was requested before `done` reached `Complete`, or `seed` was called outside of
    /// a method's initial mode.
    #[error("not ready: {text}")]
    NotReady {
        /// Human-readable detail.
        text: String,
    },
    /// `next`/`set_value` were called after completion, or the caller otherwise violated the
    /// method's state machine.
    #[error("state violation: {text}")]
    StateViolation {
        /// Human-readable detail.
        text: String,
    },
    /// A root finder's initial endpoints do not bracket a sign change.
    #[error("bracket invalid: {text}")]
    BracketInvalid {
        /// Human-readable detail.
        text: String,
    },
    /// A derivative/secant denominator fell below the protection threshold.
    #[error("numerical singularity: {text}")]
    NumericalSingularity {
        /// Human-readable detail.
        text: String,
    },
    /// The iteration budget was exhausted. This is reported as completion with a reason, never
    /// as a hard failure, but shares the taxonomy so callers can match on it uniformly.
    #[error("budget exhausted: {text}")]
    BudgetExhausted {
        /// Human-readable detail.
        text: String,
    },
    /// Allocation failed, or catalogue enumeration failed.
    #[error("resource error: {text}")]
    Resource {
        /// Human-readable detail.
        text: String,
    },
}

/// The error type returned by every fallible operation in this crate.
///
/// Wraps [`ErrorKind`] in `anyhow::Error` the way the reference toolbox's core crate does
/// (`pub use anyhow::Error` plus a `thiserror` enum convertible into it), which keeps the public
/// signature a plain `Result<T, Error>` while still letting a caller recover the taxonomy via
/// [`Error::kind`].
#[derive(Debug)]
pub struct Error(anyhow::Error);

impl Error {
    /// Construct an error of the given kind.
    pub fn new(kind: ErrorKind) -> Self {
        Error(anyhow::Error::new(kind))
    }

    /// Recover the structured [`ErrorKind`], if this error originated from one.
    ///
    /// Errors that entered the crate from an external `anyhow`/`std::error::Error` source (none
    /// currently do, but the type permits it) return `None`.
    pub fn kind(&self) -> Option<&ErrorKind> {
        self.0.downcast_ref::<ErrorKind>()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error::new(kind)
    }
}

/// Shorthand for constructing an [`Error`] of kind [`ErrorKind::InvalidArgument`].
pub fn invalid_argument<T: Into<String>>(text: T) -> Error {
    ErrorKind::InvalidArgument { text: text.into() }.into()
}

/// Shorthand for constructing an [`Error`] of kind [`ErrorKind::Unsupported`].
pub fn unsupported<T: Into<String>>(text: T) -> Error {
    ErrorKind::Unsupported { text: text.into() }.into()
}

/// Shorthand for constructing an [`Error`] of kind [`ErrorKind::NotReady`].
pub fn not_ready<T: Into<String>>(text: T) -> Error {
    ErrorKind::NotReady { text: text.into() }.into()
}

/// Shorthand for constructing an [`Error`] of kind [`ErrorKind::StateViolation`].
pub fn state_violation<T: Into<String>>(text: T) -> Error {
    ErrorKind::StateViolation { text: text.into() }.into()
}

/// Shorthand for constructing an [`Error`] of kind [`ErrorKind::BracketInvalid`].
pub fn bracket_invalid<T: Into<String>>(text: T) -> Error {
    ErrorKind::BracketInvalid { text: text.into() }.into()
}

/// Shorthand for constructing an [`Error`] of kind [`ErrorKind::NumericalSingularity`].
pub fn numerical_singularity<T: Into<String>>(text: T) -> Error {
    ErrorKind::NumericalSingularity { text: text.into() }.into()
}

/// Shorthand for constructing an [`Error`] of kind [`ErrorKind::Resource`].
pub fn resource<T: Into<String>>(text: T) -> Error {
    ErrorKind::Resource { text: text.into() }.into()
}

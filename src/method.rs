// Copyright 2018-2020 argmin developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! The capability contract every method implements (§4.2).
//!
//! A bound method is a `Box<dyn Method>` trait object; [`Session`](crate::session::Session)
//! drives it through `next`/`set_value`/`done` and exposes the name-keyed configuration surface
//! via `hparam_set`/`hparam_get`/`result`. Optional capabilities (`info`, `hparam_set`,
//! `hparam_get`, `seed`, `set_value_with_gradient`, `result`) have default implementations that
//! return [`crate::error::ErrorKind::Unsupported`], so a method only needs to override what it
//! actually offers. `take_warnings` is the one optional capability that defaults to a no-op
//! rather than `Unsupported`, since most methods never have anything to repair.

use crate::error::{unsupported, Error};
use crate::rng::RandomSource;
use crate::value::Value;

/// The outcome of checking whether a method has finished iterating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// More `next`/`set_value` rounds are required.
    Continue,
    /// The method has converged (or exhausted its budget); `result` and `next` behave per §4.3.
    Complete,
}

impl Outcome {
    /// `true` when the method has finished.
    pub fn is_complete(self) -> bool {
        self == Outcome::Complete
    }
}

/// The uniform capability contract every method implements.
///
/// Every method is a resumable state machine: `next` produces the point to evaluate, the caller
/// evaluates it out of band, and `set_value` (or `set_value_with_gradient`) reports the result
/// back, advancing the internal state by exactly one step.
pub trait Method {
    /// The method's canonical, catalogue-registered name.
    fn name(&self) -> &'static str;

    /// A human-readable description of hyper-parameters, results and references.
    ///
    /// Optional; the default indicates the capability is unsupported, matching the contract
    /// table in §4.2 ("opt").
    fn info(&self) -> Result<String, Error> {
        Err(unsupported(format!(
            "method `{}` does not provide an info string",
            self.name()
        )))
    }

    /// Typed hyper-parameter setter. Reshapes internal buffers if a structural parameter (e.g.
    /// population size) changes.
    fn hparam_set(&mut self, id: &str, value: Value) -> Result<(), Error> {
        let _ = value;
        Err(unsupported(format!(
            "method `{}` has no hyper-parameter named `{}`",
            self.name(),
            id
        )))
    }

    /// Typed hyper-parameter getter.
    fn hparam_get(&self, id: &str) -> Result<Value, Error> {
        Err(unsupported(format!(
            "method `{}` has no hyper-parameter named `{}`",
            self.name(),
            id
        )))
    }

    /// Drain any warnings accumulated since the last call (e.g. a hyper-parameter silently
    /// repaired per §7: an out-of-range Nelder-Mead coefficient, a clamped population size, a
    /// swapped bound). `Session` calls this after `hparam_set` and `next` and routes whatever
    /// comes back through its diagnostics sink; methods with nothing to repair never override it.
    fn take_warnings(&mut self) -> Vec<String> {
        Vec::new()
    }

    /// Supply an initial point. Valid only while the method is in its `initial` mode; methods
    /// that enforce this return [`crate::error::ErrorKind::NotReady`] otherwise.
    fn seed(&mut self, v: &[f64]) -> Result<(), Error> {
        let _ = v;
        Err(unsupported(format!(
            "method `{}` does not accept a seed",
            self.name()
        )))
    }

    /// Produce the next input point to evaluate, writing it into `out` (length `d`).
    ///
    /// Must not succeed once [`Method::done`] has returned [`Outcome::Complete`]; callers that
    /// violate this get [`crate::error::ErrorKind::StateViolation`].
    ///
    /// `rng` is the session-injected randomness source; methods that do not need randomness
    /// ignore it.
    fn next(&mut self, rng: &mut dyn RandomSource, out: &mut [f64]) -> Result<(), Error>;

    /// Record `f(v) = fv`, advancing the state machine by one step.
    fn set_value(&mut self, v: &[f64], fv: f64) -> Result<(), Error>;

    /// As [`Method::set_value`], but with a gradient at `v`.
    ///
    /// Methods that do not need a gradient fall back to `set_value`; methods that require one
    /// (e.g. Newton-Raphson) override this and make plain `set_value` an error.
    fn set_value_with_gradient(&mut self, v: &[f64], fv: f64, g: &[f64]) -> Result<(), Error> {
        let _ = g;
        self.set_value(v, fv)
    }

    /// Whether the method has finished iterating.
    fn done(&self) -> Outcome;

    /// Named typed result getter, valid only after [`Method::done`] returns
    /// [`Outcome::Complete`].
    fn result(&self, id: &str) -> Result<Value, Error> {
        Err(unsupported(format!(
            "method `{}` has no result named `{}`",
            self.name(),
            id
        )))
    }
}

/// Constructs a boxed method instance for `d` dimensions.
///
/// Catalogue entries store one of these per provider; `method_select` calls it to instantiate
/// the bound method. Declared suitable for `d` is enforced by the constructor itself (methods
/// that are single-variate reject `d > 1`).
pub type Constructor = fn(d: usize) -> Result<Box<dyn Method>, Error>;

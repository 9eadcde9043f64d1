// Copyright 2018-2020 argmin developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! The driver a caller actually talks to (§4.1 - §4.3, component D).
//!
//! A [`Session`] owns the catalogue, the bound [`Method`](crate::method::Method), the
//! session-local [`RandomSource`] and [`Diagnostics`] sink, and the best-point-seen tracker that
//! every method gets for free regardless of whether it tracks its own incumbent.

use crate::catalogue::{catalogue_populate, method_select, Catalogue, CatalogueRoot};
use crate::diagnostics::{Diagnostics, Level, Verbosity};
use crate::error::{invalid_argument, not_ready, state_violation, Error};
use crate::method::{Method, Outcome};
use crate::rng::{default_source, RandomSource};
use crate::value::Value;

/// Drives a single bound method through its ask/tell loop.
///
/// Dimension `d` is fixed for the life of the session; selecting a different method re-binds a
/// fresh instance for the same `d` and resets the best-point tracker.
pub struct Session {
    catalogue: Catalogue,
    d: usize,
    method: Option<Box<dyn Method>>,
    rng: Box<dyn RandomSource + Send>,
    diagnostics: Diagnostics,
    best_point: Option<Vec<f64>>,
    best_value: f64,
    awaiting_value: bool,
}

impl Session {
    /// Open a session for `d`-dimensional problems against the default builtin catalogue.
    pub fn open(d: usize) -> Result<Self, Error> {
        Session::with_catalogue(catalogue_populate(CatalogueRoot::Builtin)?, d)
    }

    /// Open a session against a caller-supplied catalogue (e.g. a restricted or extended one).
    pub fn with_catalogue(catalogue: Catalogue, d: usize) -> Result<Self, Error> {
        if d == 0 {
            return Err(invalid_argument("session dimension must be >= 1"));
        }
        Ok(Session {
            catalogue,
            d,
            method: None,
            rng: default_source(),
            diagnostics: Diagnostics::new(),
            best_point: None,
            best_value: f64::INFINITY,
            awaiting_value: false,
        })
    }

    /// Replace the session's randomness source (e.g. a deterministic `rand_xoshiro` stream in
    /// tests).
    pub fn set_random_source(&mut self, rng: Box<dyn RandomSource + Send>) {
        self.rng = rng;
    }

    /// Override this session's diagnostic verbosity.
    pub fn set_verbosity(&mut self, verbosity: Verbosity) {
        self.diagnostics.set_verbosity(verbosity);
    }

    /// This session's dimension.
    pub fn dim(&self) -> usize {
        self.d
    }

    /// Bind `name` from the catalogue as the active method, discarding any previously bound
    /// method and resetting the best-point tracker.
    pub fn method_select(&mut self, name: &str) -> Result<(), Error> {
        let method = method_select(&self.catalogue, name, self.d)?;
        self.diagnostics.info(format!("bound method `{}`", name));
        self.method = Some(method);
        self.best_point = None;
        self.best_value = f64::INFINITY;
        self.awaiting_value = false;
        Ok(())
    }

    fn drain_warnings(&mut self) {
        let warnings = match self.method.as_deref_mut() {
            Some(m) => m.take_warnings(),
            None => return,
        };
        for w in warnings {
            self.diagnostics.warn(w);
        }
    }

    fn bound(&self) -> Result<&dyn Method, Error> {
        self.method
            .as_deref()
            .ok_or_else(|| not_ready("no method is bound; call `method_select` first"))
    }

    fn bound_mut(&mut self) -> Result<&mut (dyn Method + 'static), Error> {
        self.method
            .as_deref_mut()
            .ok_or_else(|| not_ready("no method is bound; call `method_select` first"))
    }

    /// A human-readable description of the bound method's hyper-parameters and results.
    pub fn method_info(&self) -> Result<String, Error> {
        self.bound()?.info()
    }

    /// Set a hyper-parameter on the bound method.
    pub fn hparam_set(&mut self, id: &str, value: Value) -> Result<(), Error> {
        let result = self.bound_mut()?.hparam_set(id, value);
        self.drain_warnings();
        result
    }

    /// Read a hyper-parameter from the bound method.
    pub fn hparam_get(&self, id: &str) -> Result<Value, Error> {
        self.bound()?.hparam_get(id)
    }

    /// Supply an initial point to the bound method.
    pub fn seed(&mut self, v: &[f64]) -> Result<(), Error> {
        if v.len() != self.d {
            return Err(invalid_argument(format!(
                "seed has length {}, expected {}",
                v.len(),
                self.d
            )));
        }
        self.bound_mut()?.seed(v)
    }

    /// Ask the bound method for the next point to evaluate.
    pub fn next(&mut self, out: &mut [f64]) -> Result<(), Error> {
        if out.len() != self.d {
            return Err(invalid_argument(format!(
                "`next` output buffer has length {}, expected {}",
                out.len(),
                self.d
            )));
        }
        if self.bound()?.done().is_complete() {
            return Err(state_violation("`next` called after the method is already complete"));
        }
        if self.awaiting_value {
            return Err(state_violation(
                "`next` called twice without an intervening `set_value`",
            ));
        }
        let result = {
            let rng = &mut *self.rng;
            let method = self
                .method
                .as_deref_mut()
                .ok_or_else(|| not_ready("no method is bound; call `method_select` first"))?;
            method.next(rng, out)
        };
        self.drain_warnings();
        if result.is_ok() {
            self.awaiting_value = true;
        }
        result
    }

    fn track_best(&mut self, v: &[f64], fv: f64) {
        if fv < self.best_value {
            self.best_value = fv;
            self.best_point = Some(v.to_vec());
        }
    }

    /// Report `f(v) = fv` to the bound method, tracking it against the session's best-seen point
    /// (earliest point wins a tie).
    pub fn set_value(&mut self, v: &[f64], fv: f64) -> Result<(), Error> {
        if v.len() != self.d {
            return Err(invalid_argument(format!(
                "`set_value` point has length {}, expected {}",
                v.len(),
                self.d
            )));
        }
        self.awaiting_value = false;
        self.track_best(v, fv);
        let result = self.bound_mut()?.set_value(v, fv);
        if let Err(e) = &result {
            self.diagnostics.log(Level::Debug, format!("set_value failed: {}", e));
        }
        result
    }

    /// As [`Session::set_value`], but with a gradient at `v`.
    pub fn set_value_with_gradient(&mut self, v: &[f64], fv: f64, g: &[f64]) -> Result<(), Error> {
        if v.len() != self.d || g.len() != self.d {
            return Err(invalid_argument(
                "`set_value_with_gradient` point/gradient length must match session dimension",
            ));
        }
        self.awaiting_value = false;
        self.track_best(v, fv);
        self.bound_mut()?.set_value_with_gradient(v, fv, g)
    }

    /// Whether the bound method has finished iterating.
    pub fn done(&self) -> Result<Outcome, Error> {
        Ok(self.bound()?.done())
    }

    /// The best point and value seen across every `set_value`/`set_value_with_gradient` call this
    /// session has processed, independent of what the bound method itself tracks internally.
    pub fn best(&self) -> Result<(&[f64], f64), Error> {
        match &self.best_point {
            Some(p) => Ok((p.as_slice(), self.best_value)),
            None => Err(not_ready("no value has been reported to this session yet")),
        }
    }

    /// Read a named result from the bound method.
    pub fn result(&self, id: &str) -> Result<Value, Error> {
        let method = self.bound()?;
        if !method.done().is_complete() {
            return Err(not_ready("`result` requested before the method reached completion"));
        }
        method.result(id)
    }

    /// Close the session, releasing the bound method and randomness source.
    ///
    /// `Session` has no external resources beyond ordinary heap allocations, so this is
    /// equivalent to dropping it; it exists as an explicit lifecycle bookend mirroring
    /// `session_open`.
    pub fn close(self) {
        self.diagnostics.info("session closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_dimension() {
        assert!(Session::open(0).is_err());
    }

    #[test]
    fn operations_before_method_select_are_not_ready() {
        let s = Session::open(1).unwrap();
        assert!(s.method_info().is_err());
        assert!(s.hparam_get("lower").is_err());
        assert!(s.done().is_err());
    }

    #[test]
    fn drives_bisection_end_to_end() {
        let mut s = Session::open(1).unwrap();
        s.method_select("bisection").unwrap();
        s.hparam_set("lower", Value::Scalar(0.0)).unwrap();
        s.hparam_set("upper", Value::Scalar(2.0)).unwrap();
        let mut x = [0.0f64; 1];
        while !s.done().unwrap().is_complete() {
            s.next(&mut x).unwrap();
            s.set_value(&x, x[0] * x[0] - 2.0).unwrap();
        }
        let root = s.result("root").unwrap().as_scalar().unwrap();
        assert!((root - 2f64.sqrt()).abs() < 1e-3);
        let (best_x, best_v) = s.best().unwrap();
        assert!(best_v <= 1e-3);
        assert_eq!(best_x.len(), 1);
    }

    #[test]
    fn best_tracks_earliest_point_on_ties() {
        let mut s = Session::open(1).unwrap();
        s.method_select("bisection").unwrap();
        s.hparam_set("lower", Value::Scalar(-1.0)).unwrap();
        s.hparam_set("upper", Value::Scalar(1.0)).unwrap();
        s.set_value(&[-1.0], 5.0).unwrap();
        s.set_value(&[1.0], 5.0).unwrap();
        let (best_x, _) = s.best().unwrap();
        assert_eq!(best_x, &[-1.0]);
    }

    #[test]
    fn rejects_mismatched_dimension() {
        let mut s = Session::open(2).unwrap();
        s.method_select("nelder-mead").unwrap();
        assert!(s.seed(&[1.0]).is_err());
    }

    #[test]
    fn method_info_is_available_once_bound() {
        let mut s = Session::open(1).unwrap();
        s.method_select("bisection").unwrap();
        let info = s.method_info().unwrap();
        assert!(info.contains("bisection"));
    }

    #[test]
    fn repeated_next_without_set_value_is_a_state_violation() {
        let mut s = Session::open(1).unwrap();
        s.method_select("bisection").unwrap();
        s.hparam_set("lower", Value::Scalar(0.0)).unwrap();
        s.hparam_set("upper", Value::Scalar(2.0)).unwrap();
        let mut x = [0.0f64; 1];
        s.next(&mut x).unwrap();
        assert!(s.next(&mut x).is_err());
        s.set_value(&x, x[0] * x[0] - 2.0).unwrap();
        s.next(&mut x).unwrap();
    }

    #[test]
    fn method_select_resets_the_awaiting_value_flag() {
        let mut s = Session::open(1).unwrap();
        s.method_select("bisection").unwrap();
        s.hparam_set("lower", Value::Scalar(0.0)).unwrap();
        s.hparam_set("upper", Value::Scalar(2.0)).unwrap();
        let mut x = [0.0f64; 1];
        s.next(&mut x).unwrap();
        s.method_select("bisection").unwrap();
        s.hparam_set("lower", Value::Scalar(0.0)).unwrap();
        s.hparam_set("upper", Value::Scalar(2.0)).unwrap();
        s.next(&mut x).unwrap();
    }

    #[test]
    fn out_of_range_hparam_is_accepted_and_warning_drained_without_error() {
        let mut s = Session::open(2).unwrap();
        s.method_select("nelder-mead").unwrap();
        assert!(s.hparam_set("alpha", Value::Scalar(-1.0)).is_ok());
    }
}

// Copyright 2018-2020 argmin developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Brent-Dekker root finder (§4.6).
//!
//! Combines bisection with secant/inverse-quadratic interpolation while maintaining a bracket
//! `[b, c]` (with `a` the previous `b`), guaranteeing convergence the way plain secant iteration
//! cannot.

use crate::error::{bracket_invalid, invalid_argument, state_violation, Error};
use crate::method::{Method, Outcome};
use crate::rng::RandomSource;
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    NeedFa,
    NeedFb,
    Running,
    Done,
    Failed,
}

/// Brent-Dekker: root finder combining bisection, secant and inverse quadratic interpolation.
pub struct BrentDekker {
    x_0: Option<f64>,
    x_1: Option<f64>,
    macheps: f64,
    t: f64,
    a: f64,
    b: f64,
    c: f64,
    f_a: f64,
    f_b: f64,
    f_c: f64,
    d: f64,
    e: f64,
    mode: Mode,
    root: f64,
}

impl BrentDekker {
    /// Construct for dimension `d`; Brent-Dekker is single-variate.
    pub fn init(d: usize) -> Result<Box<dyn Method>, Error> {
        if d != 1 {
            return Err(crate::error::unsupported(
                "brent-dekker is single-variate and does not support d > 1",
            ));
        }
        Ok(Box::new(BrentDekker {
            x_0: None,
            x_1: None,
            macheps: 1e-10,
            t: 1e-6,
            a: f64::NAN,
            b: f64::NAN,
            c: f64::NAN,
            f_a: f64::NAN,
            f_b: f64::NAN,
            f_c: f64::NAN,
            d: f64::NAN,
            e: f64::NAN,
            mode: Mode::NeedFa,
            root: f64::NAN,
        }))
    }

    /// Runs one full classical Brent-Dekker loop body: reinitialize/rotate the triple, check
    /// termination, and if not terminated compute the next `b` to evaluate (leaving it
    /// unevaluated in `self.b`).
    fn loop_body(&mut self) {
        if self.f_b * self.f_c > 0.0 {
            self.c = self.a;
            self.f_c = self.f_a;
            self.d = self.b - self.a;
            self.e = self.d;
        }
        if self.f_c.abs() < self.f_b.abs() {
            self.a = self.b;
            self.b = self.c;
            self.c = self.a;
            self.f_a = self.f_b;
            self.f_b = self.f_c;
            self.f_c = self.f_a;
        }
        let tol = 2.0 * self.macheps * self.b.abs() + self.t;
        let m = 0.5 * (self.c - self.b);
        if m.abs() <= tol || self.f_b == 0.0 {
            self.root = self.b;
            self.mode = Mode::Done;
            return;
        }
        if self.e.abs() < tol || self.f_a.abs() <= self.f_b.abs() {
            self.d = m;
            self.e = m;
        } else {
            let s = self.f_b / self.f_a;
            let (mut p, mut q);
            if self.a == self.c {
                p = 2.0 * m * s;
                q = 1.0 - s;
            } else {
                let qq = self.f_a / self.f_c;
                let r = self.f_b / self.f_c;
                p = s * (2.0 * m * qq * (qq - r) - (self.b - self.a) * (r - 1.0));
                q = (qq - 1.0) * (r - 1.0) * (s - 1.0);
            }
            if p > 0.0 {
                q = -q;
            } else {
                p = -p;
            }
            if 2.0 * p < 3.0 * m * q - (tol * q).abs() && p < (s * q / 2.0).abs() {
                self.e = self.d;
                self.d = p / q;
            } else {
                self.d = m;
                self.e = m;
            }
        }
        self.a = self.b;
        self.f_a = self.f_b;
        if self.d.abs() > tol {
            self.b += self.d;
        } else {
            self.b += m.signum() * tol;
        }
    }
}

impl Method for BrentDekker {
    fn name(&self) -> &'static str {
        "brent-dekker"
    }

    fn hparam_set(&mut self, id: &str, value: Value) -> Result<(), Error> {
        match id {
            "x_0" => {
                if self.mode != Mode::NeedFa {
                    return Err(state_violation(
                        "brent-dekker: `x_0` can only be set before iterating",
                    ));
                }
                self.x_0 = Some(value.as_scalar()?);
                Ok(())
            }
            "x_1" => {
                if self.mode != Mode::NeedFa && self.mode != Mode::NeedFb {
                    return Err(state_violation(
                        "brent-dekker: `x_1` can only be set before iterating",
                    ));
                }
                self.x_1 = Some(value.as_scalar()?);
                Ok(())
            }
            "macheps" => {
                self.macheps = value.as_scalar()?;
                Ok(())
            }
            "t" => {
                self.t = value.as_scalar()?;
                Ok(())
            }
            other => Err(invalid_argument(format!(
                "brent-dekker has no hyper-parameter named `{}`",
                other
            ))),
        }
    }

    fn info(&self) -> Result<String, Error> {
        Ok("brent-dekker: root finder combining bisection with secant/inverse-quadratic \
            interpolation, bisection-safeguarded so it never leaves the bracket. \
            Hyper-parameters: x_0, x_1 (required, must bracket a sign change), macheps \
            (default 1e-10), t (default 1e-6). Result: root."
            .to_string())
    }

    fn hparam_get(&self, id: &str) -> Result<Value, Error> {
        match id {
            "x_0" => Ok(Value::Scalar(self.x_0.unwrap_or(f64::NAN))),
            "x_1" => Ok(Value::Scalar(self.x_1.unwrap_or(f64::NAN))),
            "macheps" => Ok(Value::Scalar(self.macheps)),
            "t" => Ok(Value::Scalar(self.t)),
            other => Err(invalid_argument(format!(
                "brent-dekker has no hyper-parameter named `{}`",
                other
            ))),
        }
    }

    fn next(&mut self, _rng: &mut dyn RandomSource, out: &mut [f64]) -> Result<(), Error> {
        match self.mode {
            Mode::NeedFa => {
                out[0] = self.x_0.ok_or_else(|| {
                    invalid_argument("brent-dekker: `x_0` must be set before iterating")
                })?;
                Ok(())
            }
            Mode::NeedFb => {
                out[0] = self.x_1.ok_or_else(|| {
                    invalid_argument("brent-dekker: `x_1` must be set before iterating")
                })?;
                Ok(())
            }
            Mode::Running => {
                out[0] = self.b;
                Ok(())
            }
            Mode::Done | Mode::Failed => Err(state_violation(
                "brent-dekker: `next` called after completion",
            )),
        }
    }

    fn set_value(&mut self, v: &[f64], fv: f64) -> Result<(), Error> {
        match self.mode {
            Mode::NeedFa => {
                self.a = v[0];
                self.f_a = fv;
                self.mode = Mode::NeedFb;
                Ok(())
            }
            Mode::NeedFb => {
                self.b = v[0];
                self.f_b = fv;
                if self.f_a * self.f_b > 0.0 {
                    self.mode = Mode::Failed;
                    return Err(bracket_invalid(
                        "brent-dekker: f(x_0) and f(x_1) do not bracket a sign change",
                    ));
                }
                self.c = self.a;
                self.f_c = self.f_a;
                self.d = self.b - self.a;
                self.e = self.d;
                self.mode = Mode::Running;
                self.loop_body();
                Ok(())
            }
            Mode::Running => {
                self.b = v[0];
                self.f_b = fv;
                self.loop_body();
                Ok(())
            }
            Mode::Done | Mode::Failed => Err(state_violation(
                "brent-dekker: `set_value` called after completion",
            )),
        }
    }

    fn done(&self) -> Outcome {
        match self.mode {
            Mode::Done | Mode::Failed => Outcome::Complete,
            _ => Outcome::Continue,
        }
    }

    fn result(&self, id: &str) -> Result<Value, Error> {
        if id != "root" {
            return Err(invalid_argument(format!(
                "brent-dekker has no result named `{}`",
                id
            )));
        }
        match self.mode {
            Mode::Done => Ok(Value::Scalar(self.root)),
            Mode::Failed => Err(bracket_invalid(
                "brent-dekker: bracket was invalid, no root available",
            )),
            _ => Err(crate::error::not_ready("brent-dekker: not yet complete")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::default_source;
    use approx::assert_abs_diff_eq;

    fn drive(f: impl Fn(f64) -> f64, lower: f64, upper: f64) -> Box<dyn Method> {
        let mut m = BrentDekker::init(1).unwrap();
        m.hparam_set("x_0", Value::Scalar(lower)).unwrap();
        m.hparam_set("x_1", Value::Scalar(upper)).unwrap();
        let mut rng = default_source();
        let mut x = [0.0f64; 1];
        let mut iters = 0;
        while !m.done().is_complete() {
            m.next(rng.as_mut(), &mut x).unwrap();
            let fv = f(x[0]);
            m.set_value(&x, fv).unwrap();
            iters += 1;
            assert!(iters < 200, "brent-dekker did not converge");
        }
        m
    }

    #[test]
    fn finds_root_of_x_squared_minus_two() {
        let m = drive(|x| x * x - 2.0, 0.0, 2.0);
        let root = m.result("root").unwrap().as_scalar().unwrap();
        assert_abs_diff_eq!(root, 2f64.sqrt(), epsilon = 1e-6);
    }

    #[test]
    fn rejects_non_bracketing_interval() {
        let mut m = BrentDekker::init(1).unwrap();
        m.hparam_set("x_0", Value::Scalar(1.0)).unwrap();
        m.hparam_set("x_1", Value::Scalar(2.0)).unwrap();
        let mut rng = default_source();
        let mut x = [0.0f64; 1];
        m.next(rng.as_mut(), &mut x).unwrap();
        m.set_value(&x, x[0] * x[0] - 0.5).unwrap();
        m.next(rng.as_mut(), &mut x).unwrap();
        let err = m.set_value(&x, x[0] * x[0] - 0.5).unwrap_err();
        assert!(matches!(
            err.kind(),
            Some(crate::error::ErrorKind::BracketInvalid { .. })
        ));
    }

    #[test]
    fn rejects_multivariate() {
        assert!(BrentDekker::init(2).is_err());
    }
}

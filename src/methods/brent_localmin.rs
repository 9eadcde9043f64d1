// Copyright 2018-2020 argmin developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Brent's single-variate local minimizer (§4.5).
//!
//! Golden-section search safeguarded by parabolic interpolation through the three best points
//! seen so far, the classical `localmin`/`fmin` routine without derivatives.

use crate::error::{invalid_argument, state_violation, Error};
use crate::method::{Method, Outcome};
use crate::rng::RandomSource;
use crate::value::Value;

/// `(3 - sqrt(5)) / 2`, the golden-section ratio.
const GOLDEN: f64 = 0.38196601125010515;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    NeedX,
    Running,
    Done,
}

/// Brent's derivative-free local minimizer over a bracketing interval `[a, b]`.
pub struct BrentLocalMin {
    x_0: Option<f64>,
    x_1: Option<f64>,
    t: f64,
    eps: f64,
    a: f64,
    b: f64,
    x: f64,
    w: f64,
    vv: f64,
    fx: f64,
    fw: f64,
    fvv: f64,
    d: f64,
    e: f64,
    u: f64,
    mode: Mode,
    root: f64,
    f_root: f64,
}

impl BrentLocalMin {
    /// Construct for dimension `d`; this minimizer is single-variate.
    pub fn init(d: usize) -> Result<Box<dyn Method>, Error> {
        if d != 1 {
            return Err(crate::error::unsupported(
                "brent-localmin is single-variate and does not support d > 1",
            ));
        }
        Ok(Box::new(BrentLocalMin {
            x_0: None,
            x_1: None,
            t: 1e-6,
            eps: 1e-10,
            a: f64::NAN,
            b: f64::NAN,
            x: f64::NAN,
            w: f64::NAN,
            vv: f64::NAN,
            fx: f64::NAN,
            fw: f64::NAN,
            fvv: f64::NAN,
            d: 0.0,
            e: 0.0,
            u: f64::NAN,
            mode: Mode::NeedX,
            root: f64::NAN,
            f_root: f64::NAN,
        }))
    }

    /// Checks termination; if not converged, computes the next trial point `u` (golden-section
    /// or parabolic-interpolation step) and leaves it unevaluated in `self.u`.
    fn loop_body(&mut self) {
        let m = 0.5 * (self.a + self.b);
        let tol1 = self.eps * self.x.abs() + self.t;
        let tol2 = 2.0 * tol1;
        if (self.x - m).abs() <= tol2 - 0.5 * (self.b - self.a) {
            self.root = self.x;
            self.f_root = self.fx;
            self.mode = Mode::Done;
            return;
        }
        let mut use_golden = true;
        if self.e.abs() > tol1 {
            let r = (self.x - self.w) * (self.fx - self.fvv);
            let q0 = (self.x - self.vv) * (self.fx - self.fw);
            let mut p = (self.x - self.vv) * q0 - (self.x - self.w) * r;
            let mut q = 2.0 * (q0 - r);
            if q > 0.0 {
                p = -p;
            } else {
                q = -q;
            }
            let e_prev = self.e;
            self.e = self.d;
            if p.abs() < (0.5 * q * e_prev).abs()
                && p > q * (self.a - self.x)
                && p < q * (self.b - self.x)
            {
                self.d = p / q;
                use_golden = false;
                let candidate = self.x + self.d;
                if (candidate - self.a) < tol2 || (self.b - candidate) < tol2 {
                    self.d = if m >= self.x { tol1 } else { -tol1 };
                }
            }
        }
        if use_golden {
            self.e = if self.x >= m { self.a - self.x } else { self.b - self.x };
            self.d = GOLDEN * self.e;
        }
        self.u = if self.d.abs() >= tol1 {
            self.x + self.d
        } else {
            self.x + self.d.signum() * tol1
        };
    }

    /// Folds an evaluated trial point `(u, fu)` into the running best-three-points triplet.
    fn absorb(&mut self, fu: f64) {
        let u = self.u;
        if fu <= self.fx {
            if u >= self.x {
                self.a = self.x;
            } else {
                self.b = self.x;
            }
            self.vv = self.w;
            self.fvv = self.fw;
            self.w = self.x;
            self.fw = self.fx;
            self.x = u;
            self.fx = fu;
        } else {
            if u < self.x {
                self.a = u;
            } else {
                self.b = u;
            }
            if fu <= self.fw || self.w == self.x {
                self.vv = self.w;
                self.fvv = self.fw;
                self.w = u;
                self.fw = fu;
            } else if fu <= self.fvv || self.vv == self.x || self.vv == self.w {
                self.vv = u;
                self.fvv = fu;
            }
        }
    }
}

impl Method for BrentLocalMin {
    fn name(&self) -> &'static str {
        "brent-localmin"
    }

    fn hparam_set(&mut self, id: &str, value: Value) -> Result<(), Error> {
        match id {
            "x_0" => {
                if self.mode != Mode::NeedX {
                    return Err(state_violation(
                        "brent-localmin: `x_0` can only be set before iterating",
                    ));
                }
                self.x_0 = Some(value.as_scalar()?);
                Ok(())
            }
            "x_1" => {
                if self.mode != Mode::NeedX {
                    return Err(state_violation(
                        "brent-localmin: `x_1` can only be set before iterating",
                    ));
                }
                self.x_1 = Some(value.as_scalar()?);
                Ok(())
            }
            "t" => {
                self.t = value.as_scalar()?;
                Ok(())
            }
            "eps" => {
                self.eps = value.as_scalar()?;
                Ok(())
            }
            other => Err(invalid_argument(format!(
                "brent-localmin has no hyper-parameter named `{}`",
                other
            ))),
        }
    }

    fn info(&self) -> Result<String, Error> {
        Ok("brent-localmin: single-variate minimizer over a bracket [x_0, x_1], golden-section \
            search safeguarded by parabolic interpolation through the best three points seen. \
            Hyper-parameters: x_0, x_1 (required), eps (default 1e-10), t (default 1e-6). \
            Results: x, value."
            .to_string())
    }

    fn hparam_get(&self, id: &str) -> Result<Value, Error> {
        match id {
            "x_0" => Ok(Value::Scalar(self.x_0.unwrap_or(f64::NAN))),
            "x_1" => Ok(Value::Scalar(self.x_1.unwrap_or(f64::NAN))),
            "t" => Ok(Value::Scalar(self.t)),
            "eps" => Ok(Value::Scalar(self.eps)),
            other => Err(invalid_argument(format!(
                "brent-localmin has no hyper-parameter named `{}`",
                other
            ))),
        }
    }

    fn next(&mut self, _rng: &mut dyn RandomSource, out: &mut [f64]) -> Result<(), Error> {
        match self.mode {
            Mode::NeedX => {
                let a = self
                    .x_0
                    .ok_or_else(|| invalid_argument("brent-localmin: `x_0` must be set before iterating"))?;
                let b = self
                    .x_1
                    .ok_or_else(|| invalid_argument("brent-localmin: `x_1` must be set before iterating"))?;
                self.a = a;
                self.b = b;
                out[0] = a + GOLDEN * (b - a);
                Ok(())
            }
            Mode::Running => {
                out[0] = self.u;
                Ok(())
            }
            Mode::Done => Err(state_violation(
                "brent-localmin: `next` called after completion",
            )),
        }
    }

    fn set_value(&mut self, v: &[f64], fv: f64) -> Result<(), Error> {
        match self.mode {
            Mode::NeedX => {
                self.x = v[0];
                self.w = self.x;
                self.vv = self.x;
                self.fx = fv;
                self.fw = fv;
                self.fvv = fv;
                self.d = 0.0;
                self.e = 0.0;
                self.mode = Mode::Running;
                self.loop_body();
                Ok(())
            }
            Mode::Running => {
                self.u = v[0];
                self.absorb(fv);
                self.loop_body();
                Ok(())
            }
            Mode::Done => Err(state_violation(
                "brent-localmin: `set_value` called after completion",
            )),
        }
    }

    fn done(&self) -> Outcome {
        match self.mode {
            Mode::Done => Outcome::Complete,
            _ => Outcome::Continue,
        }
    }

    fn result(&self, id: &str) -> Result<Value, Error> {
        match id {
            "x" if self.mode == Mode::Done => Ok(Value::Scalar(self.root)),
            "value" if self.mode == Mode::Done => Ok(Value::Scalar(self.f_root)),
            "x" | "value" => Err(crate::error::not_ready("brent-localmin: not yet complete")),
            other => Err(invalid_argument(format!(
                "brent-localmin has no result named `{}`",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::default_source;
    use approx::assert_abs_diff_eq;

    fn drive(f: impl Fn(f64) -> f64, lower: f64, upper: f64) -> Box<dyn Method> {
        let mut m = BrentLocalMin::init(1).unwrap();
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
            assert!(iters < 500, "brent-localmin did not converge");
        }
        m
    }

    #[test]
    fn finds_minimum_of_parabola() {
        let m = drive(|x| (x - 1.5) * (x - 1.5) + 3.0, 0.0, 5.0);
        let x = m.result("x").unwrap().as_scalar().unwrap();
        let value = m.result("value").unwrap().as_scalar().unwrap();
        assert_abs_diff_eq!(x, 1.5, epsilon = 1e-4);
        assert_abs_diff_eq!(value, 3.0, epsilon = 1e-6);
    }

    #[test]
    fn finds_minimum_away_from_bracket_center() {
        let m = drive(|x| (x - 4.2).powi(2), -10.0, 10.0);
        let x = m.result("x").unwrap().as_scalar().unwrap();
        assert_abs_diff_eq!(x, 4.2, epsilon = 1e-3);
    }

    #[test]
    fn rejects_multivariate() {
        assert!(BrentLocalMin::init(2).is_err());
    }
}

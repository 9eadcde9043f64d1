// Copyright 2018-2020 argmin developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Secant root finder (§4.8).

use crate::error::{invalid_argument, numerical_singularity, state_violation, Error};
use crate::method::{Method, Outcome};
use crate::rng::RandomSource;
use crate::value::Value;

/// Denominator protection threshold; a source-level protected constant, not user-configurable.
const EPS_MACHINE: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    NeedX0,
    NeedX1,
    Running,
    Done,
    Failed,
}

/// Secant method: approximates the derivative from the last two evaluated points.
pub struct Secant {
    x_0: Option<f64>,
    x_1: Option<f64>,
    f_tol: f64,
    x_prev: f64,
    f_prev: f64,
    x_next: f64,
    mode: Mode,
    root: f64,
}

impl Secant {
    /// Construct for dimension `d`; secant is single-variate.
    pub fn init(d: usize) -> Result<Box<dyn Method>, Error> {
        if d != 1 {
            return Err(crate::error::unsupported(
                "secant is single-variate and does not support d > 1",
            ));
        }
        Ok(Box::new(Secant {
            x_0: None,
            x_1: None,
            f_tol: 1e-6,
            x_prev: f64::NAN,
            f_prev: f64::NAN,
            x_next: f64::NAN,
            mode: Mode::NeedX0,
            root: f64::NAN,
        }))
    }

    fn step(&mut self, x: f64, f: f64) -> Result<(), Error> {
        let denom = f - self.f_prev;
        if denom.abs() < EPS_MACHINE {
            self.mode = Mode::Failed;
            return Err(numerical_singularity(
                "secant: |f - f_prev| fell below the protected denominator threshold",
            ));
        }
        self.x_next = self.x_prev - self.f_prev * (x - self.x_prev) / denom;
        self.x_prev = x;
        self.f_prev = f;
        if self.f_prev.abs() < self.f_tol {
            self.root = x;
            self.mode = Mode::Done;
        } else {
            self.mode = Mode::Running;
        }
        Ok(())
    }
}

impl Method for Secant {
    fn name(&self) -> &'static str {
        "secant"
    }

    fn hparam_set(&mut self, id: &str, value: Value) -> Result<(), Error> {
        match id {
            "x_0" => {
                if self.mode != Mode::NeedX0 {
                    return Err(state_violation("secant: `x_0` can only be set before iterating"));
                }
                self.x_0 = Some(value.as_scalar()?);
                Ok(())
            }
            "x_1" => {
                if self.mode != Mode::NeedX0 && self.mode != Mode::NeedX1 {
                    return Err(state_violation("secant: `x_1` can only be set before iterating"));
                }
                self.x_1 = Some(value.as_scalar()?);
                Ok(())
            }
            "f_tol" => {
                self.f_tol = value.as_scalar()?;
                Ok(())
            }
            other => Err(invalid_argument(format!(
                "secant has no hyper-parameter named `{}`",
                other
            ))),
        }
    }

    fn info(&self) -> Result<String, Error> {
        Ok("secant: root finder using linear interpolation between the last two evaluated \
            points. Hyper-parameters: x_0, x_1 (required bootstrap points), f_tol (default \
            1e-6). Fails with numerical-singularity if |f - f_prev| underflows a protected \
            threshold. Result: root."
            .to_string())
    }

    fn hparam_get(&self, id: &str) -> Result<Value, Error> {
        match id {
            "x_0" => Ok(Value::Scalar(self.x_0.unwrap_or(f64::NAN))),
            "x_1" => Ok(Value::Scalar(self.x_1.unwrap_or(f64::NAN))),
            "f_tol" => Ok(Value::Scalar(self.f_tol)),
            other => Err(invalid_argument(format!(
                "secant has no hyper-parameter named `{}`",
                other
            ))),
        }
    }

    fn next(&mut self, _rng: &mut dyn RandomSource, out: &mut [f64]) -> Result<(), Error> {
        match self.mode {
            Mode::NeedX0 => {
                out[0] = self
                    .x_0
                    .ok_or_else(|| invalid_argument("secant: `x_0` must be set before iterating"))?;
                Ok(())
            }
            Mode::NeedX1 => {
                out[0] = self
                    .x_1
                    .ok_or_else(|| invalid_argument("secant: `x_1` must be set before iterating"))?;
                Ok(())
            }
            Mode::Running => {
                out[0] = self.x_next;
                Ok(())
            }
            Mode::Done | Mode::Failed => Err(state_violation("secant: `next` called after completion")),
        }
    }

    fn set_value(&mut self, v: &[f64], fv: f64) -> Result<(), Error> {
        match self.mode {
            Mode::NeedX0 => {
                self.x_prev = v[0];
                self.f_prev = fv;
                self.mode = Mode::NeedX1;
                Ok(())
            }
            Mode::NeedX1 | Mode::Running => self.step(v[0], fv),
            Mode::Done | Mode::Failed => {
                Err(state_violation("secant: `set_value` called after completion"))
            }
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
            return Err(invalid_argument(format!("secant has no result named `{}`", id)));
        }
        match self.mode {
            Mode::Done => Ok(Value::Scalar(self.root)),
            Mode::Failed => Err(numerical_singularity("secant: iteration failed, no root available")),
            _ => Err(crate::error::not_ready("secant: not yet complete")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::default_source;
    use approx::assert_abs_diff_eq;

    #[test]
    fn finds_root_of_x_squared_minus_two() {
        let mut m = Secant::init(1).unwrap();
        m.hparam_set("x_0", Value::Scalar(1.0)).unwrap();
        m.hparam_set("x_1", Value::Scalar(2.0)).unwrap();
        m.hparam_set("f_tol", Value::Scalar(1e-10)).unwrap();
        let mut rng = default_source();
        let mut x = [0.0f64; 1];
        let mut iters = 0;
        while !m.done().is_complete() {
            m.next(rng.as_mut(), &mut x).unwrap();
            m.set_value(&x, x[0] * x[0] - 2.0).unwrap();
            iters += 1;
            assert!(iters < 100, "secant did not converge");
        }
        let root = m.result("root").unwrap().as_scalar().unwrap();
        assert_abs_diff_eq!(root, 2f64.sqrt(), epsilon = 1e-6);
    }

    #[test]
    fn state_violation_after_completion() {
        let mut m = Secant::init(1).unwrap();
        m.hparam_set("x_0", Value::Scalar(1.0)).unwrap();
        m.hparam_set("x_1", Value::Scalar(2.0)).unwrap();
        m.hparam_set("f_tol", Value::Scalar(1e-10)).unwrap();
        let mut rng = default_source();
        let mut x = [0.0f64; 1];
        while !m.done().is_complete() {
            m.next(rng.as_mut(), &mut x).unwrap();
            m.set_value(&x, x[0] * x[0] - 2.0).unwrap();
        }
        assert!(m.next(rng.as_mut(), &mut x).is_err());
    }
}

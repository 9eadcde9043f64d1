// Copyright 2018-2020 argmin developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Newton-Raphson root finder (§4.8).
//!
//! Unlike every other method in this crate, Newton-Raphson *requires* a gradient at each
//! iteration: plain [`Method::set_value`] is an error here, not a fallback path.

use crate::error::{invalid_argument, numerical_singularity, state_violation, unsupported, Error};
use crate::method::{Method, Outcome};
use crate::rng::RandomSource;
use crate::value::Value;

const EPS_MACHINE: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    NeedX0,
    Running,
    Done,
    Failed,
}

/// Newton-Raphson: `x_{n+1} = x_n - f(x_n) / f'(x_n)`.
pub struct NewtonRaphson {
    x_0: Option<f64>,
    f_tol: f64,
    x_next: f64,
    mode: Mode,
    root: f64,
}

impl NewtonRaphson {
    /// Construct for dimension `d`; Newton-Raphson is single-variate.
    pub fn init(d: usize) -> Result<Box<dyn Method>, Error> {
        if d != 1 {
            return Err(crate::error::unsupported(
                "newton-raphson is single-variate and does not support d > 1",
            ));
        }
        Ok(Box::new(NewtonRaphson {
            x_0: None,
            f_tol: 1e-6,
            x_next: f64::NAN,
            mode: Mode::NeedX0,
            root: f64::NAN,
        }))
    }

    fn step(&mut self, x: f64, f: f64, g: f64) -> Result<(), Error> {
        if g.abs() < EPS_MACHINE {
            self.mode = Mode::Failed;
            return Err(numerical_singularity(
                "newton-raphson: |f'(x)| fell below the protected denominator threshold",
            ));
        }
        self.x_next = x - f / g;
        if f.abs() < self.f_tol {
            self.root = x;
            self.mode = Mode::Done;
        } else {
            self.mode = Mode::Running;
        }
        Ok(())
    }
}

impl Method for NewtonRaphson {
    fn name(&self) -> &'static str {
        "newton-raphson"
    }

    fn hparam_set(&mut self, id: &str, value: Value) -> Result<(), Error> {
        match id {
            "x_0" => {
                if self.mode != Mode::NeedX0 {
                    return Err(state_violation(
                        "newton-raphson: `x_0` can only be set before iterating",
                    ));
                }
                self.x_0 = Some(value.as_scalar()?);
                Ok(())
            }
            "f_tol" => {
                self.f_tol = value.as_scalar()?;
                Ok(())
            }
            other => Err(invalid_argument(format!(
                "newton-raphson has no hyper-parameter named `{}`",
                other
            ))),
        }
    }

    fn info(&self) -> Result<String, Error> {
        Ok("newton-raphson: root finder using x_next = x - f(x)/f'(x). Requires a gradient at \
            every step via set_value_with_gradient; plain set_value is unsupported. \
            Hyper-parameters: x_0 (required), f_tol (default 1e-6). Result: root."
            .to_string())
    }

    fn hparam_get(&self, id: &str) -> Result<Value, Error> {
        match id {
            "x_0" => Ok(Value::Scalar(self.x_0.unwrap_or(f64::NAN))),
            "f_tol" => Ok(Value::Scalar(self.f_tol)),
            other => Err(invalid_argument(format!(
                "newton-raphson has no hyper-parameter named `{}`",
                other
            ))),
        }
    }

    fn next(&mut self, _rng: &mut dyn RandomSource, out: &mut [f64]) -> Result<(), Error> {
        match self.mode {
            Mode::NeedX0 => {
                out[0] = self.x_0.ok_or_else(|| {
                    invalid_argument("newton-raphson: `x_0` must be set before iterating")
                })?;
                Ok(())
            }
            Mode::Running => {
                out[0] = self.x_next;
                Ok(())
            }
            Mode::Done | Mode::Failed => Err(state_violation(
                "newton-raphson: `next` called after completion",
            )),
        }
    }

    fn set_value(&mut self, _v: &[f64], _fv: f64) -> Result<(), Error> {
        Err(unsupported(
            "newton-raphson requires a gradient; call set_value_with_gradient",
        ))
    }

    fn set_value_with_gradient(&mut self, v: &[f64], fv: f64, g: &[f64]) -> Result<(), Error> {
        match self.mode {
            Mode::NeedX0 | Mode::Running => self.step(v[0], fv, g[0]),
            Mode::Done | Mode::Failed => Err(state_violation(
                "newton-raphson: `set_value_with_gradient` called after completion",
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
                "newton-raphson has no result named `{}`",
                id
            )));
        }
        match self.mode {
            Mode::Done => Ok(Value::Scalar(self.root)),
            Mode::Failed => Err(numerical_singularity(
                "newton-raphson: iteration failed, no root available",
            )),
            _ => Err(crate::error::not_ready("newton-raphson: not yet complete")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::default_source;
    use approx::assert_abs_diff_eq;

    #[test]
    fn finds_sqrt_two() {
        let mut m = NewtonRaphson::init(1).unwrap();
        m.hparam_set("x_0", Value::Scalar(1.5)).unwrap();
        m.hparam_set("f_tol", Value::Scalar(1e-10)).unwrap();
        let mut rng = default_source();
        let mut x = [0.0f64; 1];
        let mut iters = 0;
        while !m.done().is_complete() {
            m.next(rng.as_mut(), &mut x).unwrap();
            let f = x[0] * x[0] - 2.0;
            let g = 2.0 * x[0];
            m.set_value_with_gradient(&x, f, &[g]).unwrap();
            iters += 1;
            assert!(iters < 50, "newton-raphson did not converge");
        }
        let root = m.result("root").unwrap().as_scalar().unwrap();
        assert_abs_diff_eq!(root, 2f64.sqrt(), epsilon = 1e-5);
    }

    #[test]
    fn plain_set_value_is_unsupported() {
        let mut m = NewtonRaphson::init(1).unwrap();
        m.hparam_set("x_0", Value::Scalar(1.5)).unwrap();
        let mut rng = default_source();
        let mut x = [0.0f64; 1];
        m.next(rng.as_mut(), &mut x).unwrap();
        let err = m.set_value(&x, 0.25).unwrap_err();
        assert!(matches!(
            err.kind(),
            Some(crate::error::ErrorKind::Unsupported { .. })
        ));
    }
}

// Copyright 2018-2020 argmin developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Forward-difference gradient estimation (§4.11).
//!
//! Requests `f(x0)` once to fix the base value, then `f(x0 + h_k * e_k)` for each coordinate `k`
//! and combines it against the base value into `grad_k = (f(x0 + h_k e_k) - f(x0)) / h_k`. Useful
//! as a standalone component, or to feed [`crate::methods::newton_raphson::NewtonRaphson`] a
//! gradient the caller cannot derive analytically.

use crate::error::{invalid_argument, not_ready, state_violation, Error};
use crate::method::{Method, Outcome};
use crate::rng::RandomSource;
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Initial,
    Running(usize),
    Done,
}

/// Forward-difference gradient estimate of `f` at a configured base point.
pub struct GradientEstimate {
    d: usize,
    x0: Option<Vec<f64>>,
    step: f64,
    step_vec: Option<Vec<f64>>,
    fx0: f64,
    gradient: Vec<f64>,
    mode: Mode,
}

impl GradientEstimate {
    /// Construct for dimension `d`.
    pub fn init(d: usize) -> Result<Box<dyn Method>, Error> {
        if d == 0 {
            return Err(invalid_argument("gradient-estimate requires d >= 1"));
        }
        Ok(Box::new(GradientEstimate {
            d,
            x0: None,
            step: 1e-3,
            step_vec: None,
            fx0: f64::NAN,
            gradient: vec![f64::NAN; d],
            mode: Mode::Initial,
        }))
    }

    fn step_for(&self, k: usize) -> f64 {
        match &self.step_vec {
            Some(v) => v[k],
            None => self.step,
        }
    }

    fn sample_point(&self, k: usize) -> Vec<f64> {
        let x0 = self.x0.as_ref().expect("x0 set before sampling");
        let mut v = x0.clone();
        v[k] += self.step_for(k);
        v
    }
}

impl Method for GradientEstimate {
    fn name(&self) -> &'static str {
        "gradient-estimate"
    }

    fn hparam_set(&mut self, id: &str, value: Value) -> Result<(), Error> {
        match id {
            "x0" => {
                if self.mode != Mode::Initial {
                    return Err(state_violation(
                        "gradient-estimate: `x0` can only be set before iterating",
                    ));
                }
                let v = value.as_vector()?;
                if v.len() != self.d {
                    return Err(invalid_argument(format!(
                        "gradient-estimate: `x0` has length {}, expected {}",
                        v.len(),
                        self.d
                    )));
                }
                self.x0 = Some(v.to_vec());
                Ok(())
            }
            "step" => {
                self.step = value.as_scalar()?;
                Ok(())
            }
            "step_vec" => {
                let v = value.as_vector()?;
                if v.len() != self.d {
                    return Err(invalid_argument(format!(
                        "gradient-estimate: `step_vec` has length {}, expected {}",
                        v.len(),
                        self.d
                    )));
                }
                self.step_vec = Some(v.to_vec());
                Ok(())
            }
            other => Err(invalid_argument(format!(
                "gradient-estimate has no hyper-parameter named `{}`",
                other
            ))),
        }
    }

    fn info(&self) -> Result<String, Error> {
        Ok("gradient-estimate: forward-difference gradient of f at a configured base point x0. \
            Hyper-parameters: x0 (required), step (scalar, default 1e-3), step_vec (optional \
            per-dimension override). Result: gradient."
            .to_string())
    }

    fn hparam_get(&self, id: &str) -> Result<Value, Error> {
        match id {
            "x0" => Ok(Value::Vector(self.x0.clone().unwrap_or_default())),
            "step" => Ok(Value::Scalar(self.step)),
            "step_vec" => Ok(Value::Vector(self.step_vec.clone().unwrap_or_default())),
            other => Err(invalid_argument(format!(
                "gradient-estimate has no hyper-parameter named `{}`",
                other
            ))),
        }
    }

    fn next(&mut self, _rng: &mut dyn RandomSource, out: &mut [f64]) -> Result<(), Error> {
        match self.mode {
            Mode::Initial => {
                let x0 = self
                    .x0
                    .as_ref()
                    .ok_or_else(|| invalid_argument("gradient-estimate: `x0` must be set before iterating"))?;
                out.copy_from_slice(x0);
                Ok(())
            }
            Mode::Running(k) => {
                out.copy_from_slice(&self.sample_point(k));
                Ok(())
            }
            Mode::Done => Err(state_violation(
                "gradient-estimate: `next` called after completion",
            )),
        }
    }

    fn set_value(&mut self, _v: &[f64], fv: f64) -> Result<(), Error> {
        match self.mode {
            Mode::Initial => {
                self.fx0 = fv;
                self.mode = Mode::Running(0);
                Ok(())
            }
            Mode::Running(k) => {
                self.gradient[k] = (fv - self.fx0) / self.step_for(k);
                if k + 1 == self.d {
                    self.mode = Mode::Done;
                } else {
                    self.mode = Mode::Running(k + 1);
                }
                Ok(())
            }
            Mode::Done => Err(state_violation(
                "gradient-estimate: `set_value` called after completion",
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
        if id != "gradient" {
            return Err(invalid_argument(format!(
                "gradient-estimate has no result named `{}`",
                id
            )));
        }
        if self.mode != Mode::Done {
            return Err(not_ready("gradient-estimate: not yet complete"));
        }
        Ok(Value::Vector(self.gradient.clone()))
    }
}

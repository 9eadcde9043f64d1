// Copyright 2018-2020 argmin developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Bisection root finder (§4.7).

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

/// Bisection: maintains `[a, b]` with `f(a) < 0 < f(b)`, halving the bracket each step.
pub struct Bisection {
    a: Option<f64>,
    b: Option<f64>,
    fa: f64,
    fb: f64,
    x_tol: f64,
    f_tol: f64,
    mode: Mode,
    root: f64,
}

impl Bisection {
    /// Construct for dimension `d`; bisection is single-variate.
    pub fn init(d: usize) -> Result<Box<dyn Method>, Error> {
        if d != 1 {
            return Err(crate::error::unsupported(
                "bisection is single-variate and does not support d > 1",
            ));
        }
        Ok(Box::new(Bisection {
            a: None,
            b: None,
            fa: f64::NAN,
            fb: f64::NAN,
            x_tol: 1e-6,
            f_tol: 1e-6,
            mode: Mode::NeedFa,
            root: f64::NAN,
        }))
    }

    fn check_bootstrap_mutable(&self) -> Result<(), Error> {
        match self.mode {
            Mode::NeedFa | Mode::NeedFb => Ok(()),
            _ => Err(state_violation(
                "bisection: lower/upper can only be set before the bracket has been sampled",
            )),
        }
    }
}

impl Method for Bisection {
    fn name(&self) -> &'static str {
        "bisection"
    }

    fn hparam_set(&mut self, id: &str, value: Value) -> Result<(), Error> {
        match id {
            "lower" => {
                self.check_bootstrap_mutable()?;
                self.a = Some(value.as_scalar()?);
                Ok(())
            }
            "upper" => {
                self.check_bootstrap_mutable()?;
                self.b = Some(value.as_scalar()?);
                Ok(())
            }
            "x_tol" => {
                self.x_tol = value.as_scalar()?;
                Ok(())
            }
            "f_tol" => {
                self.f_tol = value.as_scalar()?;
                Ok(())
            }
            other => Err(invalid_argument(format!(
                "bisection has no hyper-parameter named `{}`",
                other
            ))),
        }
    }

    fn info(&self) -> Result<String, Error> {
        Ok("bisection: root finder over a bracket [lower, upper] with f(lower) < 0 < f(upper). \
            Hyper-parameters: lower, upper (required), x_tol (default 1e-6), f_tol (default \
            1e-6). Result: root."
            .to_string())
    }

    fn hparam_get(&self, id: &str) -> Result<Value, Error> {
        match id {
            "lower" => Ok(Value::Scalar(self.a.unwrap_or(f64::NAN))),
            "upper" => Ok(Value::Scalar(self.b.unwrap_or(f64::NAN))),
            "x_tol" => Ok(Value::Scalar(self.x_tol)),
            "f_tol" => Ok(Value::Scalar(self.f_tol)),
            other => Err(invalid_argument(format!(
                "bisection has no hyper-parameter named `{}`",
                other
            ))),
        }
    }

    fn next(&mut self, _rng: &mut dyn RandomSource, out: &mut [f64]) -> Result<(), Error> {
        match self.mode {
            Mode::NeedFa => {
                out[0] = self
                    .a
                    .ok_or_else(|| invalid_argument("bisection: `lower` must be set before iterating"))?;
                Ok(())
            }
            Mode::NeedFb => {
                out[0] = self
                    .b
                    .ok_or_else(|| invalid_argument("bisection: `upper` must be set before iterating"))?;
                Ok(())
            }
            Mode::Running => {
                out[0] = 0.5 * (self.a.unwrap() + self.b.unwrap());
                Ok(())
            }
            Mode::Done | Mode::Failed => Err(state_violation(
                "bisection: `next` called after completion",
            )),
        }
    }

    fn set_value(&mut self, v: &[f64], fv: f64) -> Result<(), Error> {
        match self.mode {
            Mode::NeedFa => {
                self.fa = fv;
                self.mode = Mode::NeedFb;
                Ok(())
            }
            Mode::NeedFb => {
                self.fb = fv;
                if self.fa > 0.0 && self.fb < 0.0 {
                    std::mem::swap(&mut self.a, &mut self.b);
                    std::mem::swap(&mut self.fa, &mut self.fb);
                }
                if !(self.fa < 0.0 && self.fb > 0.0) {
                    self.mode = Mode::Failed;
                    return Err(bracket_invalid(
                        "bisection: f(lower) and f(upper) do not bracket a sign change",
                    ));
                }
                self.mode = Mode::Running;
                Ok(())
            }
            Mode::Running => {
                let m = v[0];
                if fv < 0.0 {
                    self.a = Some(m);
                    self.fa = fv;
                } else if fv > 0.0 {
                    self.b = Some(m);
                    self.fb = fv;
                } else {
                    self.root = m;
                    self.mode = Mode::Done;
                    return Ok(());
                }
                let (a, b) = (self.a.unwrap(), self.b.unwrap());
                if (b - a).abs() < self.x_tol || (self.fb - self.fa).abs() < self.f_tol {
                    self.root = 0.5 * (a + b);
                    self.mode = Mode::Done;
                }
                Ok(())
            }
            Mode::Done | Mode::Failed => Err(state_violation(
                "bisection: `set_value` called after completion",
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
                "bisection has no result named `{}`",
                id
            )));
        }
        match self.mode {
            Mode::Done => Ok(Value::Scalar(self.root)),
            Mode::Failed => Err(bracket_invalid(
                "bisection: bracket was invalid, no root available",
            )),
            _ => Err(crate::error::not_ready("bisection: not yet complete")),
        }
    }
}

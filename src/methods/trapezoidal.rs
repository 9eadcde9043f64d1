// Copyright 2018-2020 argmin developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Composite trapezoidal quadrature (§4.10).
//!
//! Requests `f` at the `n + 1` evenly spaced nodes of `[lower, upper]` and accumulates the
//! weighted sum as each value comes back, rather than waiting for a full sample vector.

use crate::error::{invalid_argument, state_violation, Error};
use crate::method::{Method, Outcome};
use crate::rng::RandomSource;
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    AwaitBounds,
    Sampling(usize),
    Done,
}

/// Composite trapezoidal rule over `n` equal subintervals of `[lower, upper]`.
pub struct Trapezoidal {
    lower: Option<f64>,
    upper: Option<f64>,
    n: usize,
    h: f64,
    accumulator: f64,
    mode: Mode,
}

impl Trapezoidal {
    /// Construct for dimension `d`; quadrature is single-variate.
    pub fn init(d: usize) -> Result<Box<dyn Method>, Error> {
        if d != 1 {
            return Err(crate::error::unsupported(
                "trapezoidal is single-variate and does not support d > 1",
            ));
        }
        Ok(Box::new(Trapezoidal {
            lower: None,
            upper: None,
            n: 100,
            h: f64::NAN,
            accumulator: 0.0,
            mode: Mode::AwaitBounds,
        }))
    }

    fn weight(&self, i: usize) -> f64 {
        if i == 0 || i == self.n {
            0.5
        } else {
            1.0
        }
    }
}

impl Method for Trapezoidal {
    fn name(&self) -> &'static str {
        "trapezoidal"
    }

    fn hparam_set(&mut self, id: &str, value: Value) -> Result<(), Error> {
        match id {
            "lower" => {
                if self.mode != Mode::AwaitBounds {
                    return Err(state_violation(
                        "trapezoidal: `lower` can only be set before iterating",
                    ));
                }
                self.lower = Some(value.as_scalar()?);
                Ok(())
            }
            "upper" => {
                if self.mode != Mode::AwaitBounds {
                    return Err(state_violation(
                        "trapezoidal: `upper` can only be set before iterating",
                    ));
                }
                self.upper = Some(value.as_scalar()?);
                Ok(())
            }
            "n" | "subintervals" => {
                if self.mode != Mode::AwaitBounds {
                    return Err(state_violation(
                        "trapezoidal: `n` can only be set before iterating",
                    ));
                }
                let n = value.as_index()?;
                if n == 0 {
                    return Err(invalid_argument("trapezoidal: `n` must be >= 1"));
                }
                self.n = n;
                Ok(())
            }
            other => Err(invalid_argument(format!(
                "trapezoidal has no hyper-parameter named `{}`",
                other
            ))),
        }
    }

    fn info(&self) -> Result<String, Error> {
        Ok("trapezoidal: composite trapezoidal quadrature over n equal subintervals of \
            [lower, upper]. Hyper-parameters: lower, upper (required), n (alias \
            subintervals, default 100). Result: area."
            .to_string())
    }

    fn hparam_get(&self, id: &str) -> Result<Value, Error> {
        match id {
            "lower" => Ok(Value::Scalar(self.lower.unwrap_or(f64::NAN))),
            "upper" => Ok(Value::Scalar(self.upper.unwrap_or(f64::NAN))),
            "n" | "subintervals" => Ok(Value::Index(self.n)),
            other => Err(invalid_argument(format!(
                "trapezoidal has no hyper-parameter named `{}`",
                other
            ))),
        }
    }

    fn next(&mut self, _rng: &mut dyn RandomSource, out: &mut [f64]) -> Result<(), Error> {
        match self.mode {
            Mode::AwaitBounds => {
                let a = self
                    .lower
                    .ok_or_else(|| invalid_argument("trapezoidal: `lower` must be set before iterating"))?;
                let b = self
                    .upper
                    .ok_or_else(|| invalid_argument("trapezoidal: `upper` must be set before iterating"))?;
                self.h = (b - a) / self.n as f64;
                self.mode = Mode::Sampling(0);
                out[0] = a;
                Ok(())
            }
            Mode::Sampling(i) => {
                out[0] = self.lower.unwrap() + i as f64 * self.h;
                Ok(())
            }
            Mode::Done => Err(state_violation("trapezoidal: `next` called after completion")),
        }
    }

    fn set_value(&mut self, _v: &[f64], fv: f64) -> Result<(), Error> {
        match self.mode {
            Mode::AwaitBounds => Err(invalid_argument(
                "trapezoidal: call `next` to obtain the first node before reporting a value",
            )),
            Mode::Sampling(i) => {
                self.accumulator += self.weight(i) * fv;
                if i == self.n {
                    self.accumulator *= self.h;
                    self.mode = Mode::Done;
                } else {
                    self.mode = Mode::Sampling(i + 1);
                }
                Ok(())
            }
            Mode::Done => Err(state_violation("trapezoidal: `set_value` called after completion")),
        }
    }

    fn done(&self) -> Outcome {
        match self.mode {
            Mode::Done => Outcome::Complete,
            _ => Outcome::Continue,
        }
    }

    fn result(&self, id: &str) -> Result<Value, Error> {
        if id != "area" {
            return Err(invalid_argument(format!(
                "trapezoidal has no result named `{}`",
                id
            )));
        }
        if self.mode != Mode::Done {
            return Err(crate::error::not_ready("trapezoidal: not yet complete"));
        }
        Ok(Value::Scalar(self.accumulator))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::default_source;
    use approx::assert_abs_diff_eq;

    fn integrate(f: impl Fn(f64) -> f64, lower: f64, upper: f64, n: usize) -> f64 {
        let mut m = Trapezoidal::init(1).unwrap();
        m.hparam_set("lower", Value::Scalar(lower)).unwrap();
        m.hparam_set("upper", Value::Scalar(upper)).unwrap();
        m.hparam_set("n", Value::Index(n)).unwrap();
        let mut rng = default_source();
        let mut x = [0.0f64; 1];
        while !m.done().is_complete() {
            m.next(rng.as_mut(), &mut x).unwrap();
            m.set_value(&x, f(x[0])).unwrap();
        }
        m.result("area").unwrap().as_scalar().unwrap()
    }

    #[test]
    fn integrates_identity_exactly() {
        let v = integrate(|x| x, 0.0, 1.0, 10);
        assert_abs_diff_eq!(v, 0.5, epsilon = 1e-12);
    }

    #[test]
    fn approximates_sine_integral() {
        let v = integrate(|x| x.sin(), 0.0, std::f64::consts::PI, 2000);
        assert_abs_diff_eq!(v, 2.0, epsilon = 1e-5);
    }

    #[test]
    fn rejects_multivariate() {
        assert!(Trapezoidal::init(2).is_err());
    }

    #[test]
    fn subintervals_is_an_alias_for_n() {
        let mut m = Trapezoidal::init(1).unwrap();
        m.hparam_set("subintervals", Value::Index(8)).unwrap();
        assert_eq!(m.hparam_get("n").unwrap().as_index().unwrap(), 8);
        assert_eq!(m.hparam_get("subintervals").unwrap().as_index().unwrap(), 8);
    }
}

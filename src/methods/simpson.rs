// Copyright 2018-2020 argmin developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Composite Simpson's rule quadrature (§4.10).
//!
//! As [`crate::methods::trapezoidal::Trapezoidal`], but fits a parabola through each pair of
//! subintervals, weighting interior nodes `4` (odd index) or `2` (even index) and requiring `n`
//! even.

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

/// Composite Simpson's rule over `n` (even) equal subintervals of `[lower, upper]`.
pub struct Simpson {
    lower: Option<f64>,
    upper: Option<f64>,
    n: usize,
    h: f64,
    accumulator: f64,
    mode: Mode,
}

impl Simpson {
    /// Construct for dimension `d`; quadrature is single-variate.
    pub fn init(d: usize) -> Result<Box<dyn Method>, Error> {
        if d != 1 {
            return Err(crate::error::unsupported(
                "simpson is single-variate and does not support d > 1",
            ));
        }
        Ok(Box::new(Simpson {
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
            1.0
        } else if i % 2 == 1 {
            4.0
        } else {
            2.0
        }
    }
}

impl Method for Simpson {
    fn name(&self) -> &'static str {
        "simpson"
    }

    fn hparam_set(&mut self, id: &str, value: Value) -> Result<(), Error> {
        match id {
            "lower" => {
                if self.mode != Mode::AwaitBounds {
                    return Err(state_violation("simpson: `lower` can only be set before iterating"));
                }
                self.lower = Some(value.as_scalar()?);
                Ok(())
            }
            "upper" => {
                if self.mode != Mode::AwaitBounds {
                    return Err(state_violation("simpson: `upper` can only be set before iterating"));
                }
                self.upper = Some(value.as_scalar()?);
                Ok(())
            }
            "n" | "subintervals" => {
                if self.mode != Mode::AwaitBounds {
                    return Err(state_violation("simpson: `n` can only be set before iterating"));
                }
                let n = value.as_index()?;
                if n == 0 || n % 2 != 0 {
                    return Err(invalid_argument("simpson: `n` must be a positive even integer"));
                }
                self.n = n;
                Ok(())
            }
            other => Err(invalid_argument(format!(
                "simpson has no hyper-parameter named `{}`",
                other
            ))),
        }
    }

    fn info(&self) -> Result<String, Error> {
        Ok("simpson: composite Simpson's rule quadrature over n (even) equal subintervals of \
            [lower, upper]. Hyper-parameters: lower, upper (required), n (alias subintervals, \
            must be even, default 100). Result: area."
            .to_string())
    }

    fn hparam_get(&self, id: &str) -> Result<Value, Error> {
        match id {
            "lower" => Ok(Value::Scalar(self.lower.unwrap_or(f64::NAN))),
            "upper" => Ok(Value::Scalar(self.upper.unwrap_or(f64::NAN))),
            "n" | "subintervals" => Ok(Value::Index(self.n)),
            other => Err(invalid_argument(format!(
                "simpson has no hyper-parameter named `{}`",
                other
            ))),
        }
    }

    fn next(&mut self, _rng: &mut dyn RandomSource, out: &mut [f64]) -> Result<(), Error> {
        match self.mode {
            Mode::AwaitBounds => {
                let a = self
                    .lower
                    .ok_or_else(|| invalid_argument("simpson: `lower` must be set before iterating"))?;
                let b = self
                    .upper
                    .ok_or_else(|| invalid_argument("simpson: `upper` must be set before iterating"))?;
                self.h = (b - a) / self.n as f64;
                self.mode = Mode::Sampling(0);
                out[0] = a;
                Ok(())
            }
            Mode::Sampling(i) => {
                out[0] = self.lower.unwrap() + i as f64 * self.h;
                Ok(())
            }
            Mode::Done => Err(state_violation("simpson: `next` called after completion")),
        }
    }

    fn set_value(&mut self, _v: &[f64], fv: f64) -> Result<(), Error> {
        match self.mode {
            Mode::AwaitBounds => Err(invalid_argument(
                "simpson: call `next` to obtain the first node before reporting a value",
            )),
            Mode::Sampling(i) => {
                self.accumulator += self.weight(i) * fv;
                if i == self.n {
                    self.accumulator *= self.h / 3.0;
                    self.mode = Mode::Done;
                } else {
                    self.mode = Mode::Sampling(i + 1);
                }
                Ok(())
            }
            Mode::Done => Err(state_violation("simpson: `set_value` called after completion")),
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
            return Err(invalid_argument(format!("simpson has no result named `{}`", id)));
        }
        if self.mode != Mode::Done {
            return Err(crate::error::not_ready("simpson: not yet complete"));
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
        let mut m = Simpson::init(1).unwrap();
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
    fn integrates_cubic_exactly() {
        let v = integrate(|x| x * x * x, 0.0, 2.0, 4);
        assert_abs_diff_eq!(v, 4.0, epsilon = 1e-10);
    }

    #[test]
    fn rejects_odd_subinterval_count() {
        let mut m = Simpson::init(1).unwrap();
        assert!(m.hparam_set("n", Value::Index(3)).is_err());
    }

    #[test]
    fn rejects_multivariate() {
        assert!(Simpson::init(2).is_err());
    }

    #[test]
    fn subintervals_is_an_alias_for_n() {
        let mut m = Simpson::init(1).unwrap();
        m.hparam_set("subintervals", Value::Index(6)).unwrap();
        assert_eq!(m.hparam_get("n").unwrap().as_index().unwrap(), 6);
        assert_eq!(m.hparam_get("subintervals").unwrap().as_index().unwrap(), 6);
    }
}

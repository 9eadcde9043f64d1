// Copyright 2018-2020 argmin developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Nelder-Mead simplex minimizer (§4.4).
//!
//! Maintains a simplex of `d + 1` vertices and moves it downhill by reflecting, expanding or
//! contracting around the centroid of its best `d` vertices, shrinking the whole simplex toward
//! its best vertex only when every other move fails to improve on the worst one.

use crate::error::{invalid_argument, not_ready, state_violation, Error};
use crate::method::{Method, Outcome};
use crate::rng::RandomSource;
use crate::value::Value;
use crate::vector;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    AwaitSeed,
    BuildSimplex(usize),
    AwaitReflect,
    AwaitExpand,
    AwaitContractOutside,
    AwaitContractInside,
    Shrink(usize),
    Done,
}

/// Nelder-Mead downhill simplex search.
pub struct NelderMead {
    d: usize,
    alpha: f64,
    beta: f64,
    gamma: f64,
    delta: f64,
    max_iterations: usize,
    dist_threshold: f64,
    iter: usize,
    x0: Option<Vec<f64>>,
    simplex: Vec<Vec<f64>>,
    fvals: Vec<f64>,
    pending: Vec<f64>,
    centroid: Vec<f64>,
    xr: Vec<f64>,
    fr: f64,
    mode: Mode,
    warnings: Vec<String>,
}

impl NelderMead {
    /// Construct for dimension `d`.
    pub fn init(d: usize) -> Result<Box<dyn Method>, Error> {
        if d == 0 {
            return Err(invalid_argument("nelder-mead requires d >= 1"));
        }
        Ok(Box::new(NelderMead {
            d,
            alpha: 1.0,
            beta: 0.5,
            gamma: 2.0,
            delta: 0.5,
            max_iterations: 30,
            dist_threshold: 1e-5,
            iter: 0,
            x0: None,
            simplex: Vec::new(),
            fvals: Vec::new(),
            pending: vec![0.0; d],
            centroid: vec![0.0; d],
            xr: vec![0.0; d],
            fr: f64::NAN,
            mode: Mode::AwaitSeed,
            warnings: Vec::new(),
        }))
    }

    /// The bootstrap point for simplex vertex `vertex_index`: the seed itself for `0`, otherwise
    /// the seed with element `vertex_index - 1` incremented by `vertex_index`.
    fn vertex_for_build(&self, vertex_index: usize) -> Vec<f64> {
        let x0 = self.x0.as_ref().expect("x0 set before BuildSimplex");
        if vertex_index == 0 {
            x0.clone()
        } else {
            let mut v = x0.clone();
            v[vertex_index - 1] += vertex_index as f64;
            v
        }
    }

    fn worst(&self) -> usize {
        self.d
    }

    fn sort_simplex(&mut self) {
        let mut order: Vec<usize> = (0..=self.d).collect();
        order.sort_by(|&a, &b| self.fvals[a].partial_cmp(&self.fvals[b]).unwrap());
        let simplex: Vec<Vec<f64>> = order.iter().map(|&i| self.simplex[i].clone()).collect();
        let fvals: Vec<f64> = order.iter().map(|&i| self.fvals[i]).collect();
        self.simplex = simplex;
        self.fvals = fvals;
    }

    /// Sorts the simplex, checks convergence/budget, and either finishes or stages the next
    /// reflection point. Never called while a shrink sub-state is still in flight.
    fn start_iteration(&mut self) {
        self.sort_simplex();

        let converged = vector::dist(&self.simplex[0], &self.simplex[self.d]) < self.dist_threshold;
        if self.iter > self.max_iterations || converged {
            self.mode = Mode::Done;
            return;
        }

        self.iter += 1;
        vector::reset(&mut self.centroid);
        for v in &self.simplex[0..self.d] {
            for (c, x) in self.centroid.iter_mut().zip(v) {
                *c += x / self.d as f64;
            }
        }
        let worst = self.worst();
        self.xr = (0..self.d)
            .map(|i| self.centroid[i] + self.alpha * (self.centroid[i] - self.simplex[worst][i]))
            .collect();
        self.pending = self.xr.clone();
        self.mode = Mode::AwaitReflect;
    }

    fn replace_worst(&mut self, point: Vec<f64>, fv: f64) {
        let worst = self.worst();
        self.simplex[worst] = point;
        self.fvals[worst] = fv;
        self.start_iteration();
    }

    fn begin_shrink(&mut self) {
        self.mode = Mode::Shrink(1);
        self.pending = self.shrink_point(1);
    }

    fn shrink_point(&self, i: usize) -> Vec<f64> {
        let best = &self.simplex[0];
        (0..self.d)
            .map(|k| best[k] + self.delta * (self.simplex[i][k] - best[k]))
            .collect()
    }
}

impl Method for NelderMead {
    fn name(&self) -> &'static str {
        "nelder-mead"
    }

    fn hparam_set(&mut self, id: &str, value: Value) -> Result<(), Error> {
        match id {
            "alpha" => {
                self.alpha = value.as_scalar()?;
                if self.alpha <= 0.0 {
                    self.warnings.push(format!(
                        "nelder-mead: `alpha` should be > 0, got {}",
                        self.alpha
                    ));
                }
                Ok(())
            }
            "beta" => {
                self.beta = value.as_scalar()?;
                if !(0.0 < self.beta && self.beta < 1.0) {
                    self.warnings.push(format!(
                        "nelder-mead: `beta` should be in (0, 1), got {}",
                        self.beta
                    ));
                }
                Ok(())
            }
            "gamma" => {
                self.gamma = value.as_scalar()?;
                if self.gamma <= 1.0 {
                    self.warnings.push(format!(
                        "nelder-mead: `gamma` should be > 1, got {}",
                        self.gamma
                    ));
                }
                Ok(())
            }
            "delta" => {
                self.delta = value.as_scalar()?;
                if !(0.0 < self.delta && self.delta < 1.0) {
                    self.warnings.push(format!(
                        "nelder-mead: `delta` should be in (0, 1), got {}",
                        self.delta
                    ));
                }
                Ok(())
            }
            "max_iterations" => {
                self.max_iterations = value.as_index()?;
                Ok(())
            }
            "dist_threshold" => {
                self.dist_threshold = value.as_scalar()?;
                Ok(())
            }
            other => Err(invalid_argument(format!(
                "nelder-mead has no hyper-parameter named `{}`",
                other
            ))),
        }
    }

    fn info(&self) -> Result<String, Error> {
        Ok("nelder-mead: multi-variate minimizer over a simplex of d+1 points, moved downhill \
            by reflection/expansion/contraction around the centroid of the best d vertices, \
            shrinking toward the best vertex when every other move fails. Requires a seed. \
            Hyper-parameters: alpha (default 1), beta (default 0.5), gamma (default 2), delta \
            (default 0.5), max_iterations (default 30), dist_threshold (default 1e-5). \
            Results: x, value. Reference: Nelder & Mead, Computer Journal 7(4), 1965."
            .to_string())
    }

    fn take_warnings(&mut self) -> Vec<String> {
        std::mem::take(&mut self.warnings)
    }

    fn hparam_get(&self, id: &str) -> Result<Value, Error> {
        match id {
            "alpha" => Ok(Value::Scalar(self.alpha)),
            "beta" => Ok(Value::Scalar(self.beta)),
            "gamma" => Ok(Value::Scalar(self.gamma)),
            "delta" => Ok(Value::Scalar(self.delta)),
            "max_iterations" => Ok(Value::Index(self.max_iterations)),
            "dist_threshold" => Ok(Value::Scalar(self.dist_threshold)),
            other => Err(invalid_argument(format!(
                "nelder-mead has no hyper-parameter named `{}`",
                other
            ))),
        }
    }

    fn seed(&mut self, v: &[f64]) -> Result<(), Error> {
        if self.mode != Mode::AwaitSeed {
            return Err(not_ready("nelder-mead: seed is only accepted before the initial simplex is built"));
        }
        if v.len() != self.d {
            return Err(invalid_argument(format!(
                "nelder-mead: seed has length {}, expected {}",
                v.len(),
                self.d
            )));
        }
        self.x0 = Some(v.to_vec());
        self.simplex = vec![vec![0.0; self.d]; self.d + 1];
        self.fvals = vec![f64::NAN; self.d + 1];
        self.mode = Mode::BuildSimplex(0);
        self.pending = self.vertex_for_build(0);
        Ok(())
    }

    fn next(&mut self, _rng: &mut dyn RandomSource, out: &mut [f64]) -> Result<(), Error> {
        match self.mode {
            Mode::AwaitSeed => Err(not_ready("nelder-mead: call `seed` before iterating")),
            Mode::Done => Err(state_violation("nelder-mead: `next` called after completion")),
            _ => {
                vector::copy_into(out, &self.pending);
                Ok(())
            }
        }
    }

    fn set_value(&mut self, v: &[f64], fv: f64) -> Result<(), Error> {
        match self.mode {
            Mode::AwaitSeed => Err(not_ready("nelder-mead: call `seed` before iterating")),
            Mode::BuildSimplex(i) => {
                self.simplex[i] = v.to_vec();
                self.fvals[i] = fv;
                let next_i = i + 1;
                if next_i <= self.d {
                    self.mode = Mode::BuildSimplex(next_i);
                    self.pending = self.vertex_for_build(next_i);
                } else {
                    self.start_iteration();
                }
                Ok(())
            }
            Mode::AwaitReflect => {
                self.fr = fv;
                if fv < self.fvals[0] {
                    self.pending = (0..self.d)
                        .map(|k| self.centroid[k] + self.gamma * (self.xr[k] - self.centroid[k]))
                        .collect();
                    self.mode = Mode::AwaitExpand;
                } else if fv < self.fvals[self.d - 1] {
                    self.replace_worst(v.to_vec(), fv);
                } else if fv < self.fvals[self.d] {
                    self.pending = (0..self.d)
                        .map(|k| self.centroid[k] + self.beta * (self.xr[k] - self.centroid[k]))
                        .collect();
                    self.mode = Mode::AwaitContractOutside;
                } else {
                    let worst = self.worst();
                    self.pending = (0..self.d)
                        .map(|k| self.centroid[k] - self.beta * (self.centroid[k] - self.simplex[worst][k]))
                        .collect();
                    self.mode = Mode::AwaitContractInside;
                }
                Ok(())
            }
            Mode::AwaitExpand => {
                if fv < self.fr {
                    self.replace_worst(v.to_vec(), fv);
                } else {
                    self.replace_worst(self.xr.clone(), self.fr);
                }
                Ok(())
            }
            Mode::AwaitContractOutside => {
                if fv < self.fr {
                    self.replace_worst(v.to_vec(), fv);
                } else {
                    self.begin_shrink();
                }
                Ok(())
            }
            Mode::AwaitContractInside => {
                if fv < self.fvals[self.d] {
                    self.replace_worst(v.to_vec(), fv);
                } else {
                    self.begin_shrink();
                }
                Ok(())
            }
            Mode::Shrink(i) => {
                self.simplex[i] = v.to_vec();
                self.fvals[i] = fv;
                if i < self.d {
                    self.mode = Mode::Shrink(i + 1);
                    self.pending = self.shrink_point(i + 1);
                } else {
                    self.start_iteration();
                }
                Ok(())
            }
            Mode::Done => Err(state_violation("nelder-mead: `set_value` called after completion")),
        }
    }

    fn done(&self) -> Outcome {
        match self.mode {
            Mode::Done => Outcome::Complete,
            _ => Outcome::Continue,
        }
    }

    fn result(&self, id: &str) -> Result<Value, Error> {
        if self.mode != Mode::Done {
            return Err(crate::error::not_ready("nelder-mead: not yet complete"));
        }
        match id {
            "x" => Ok(Value::Vector(self.simplex[0].clone())),
            "value" => Ok(Value::Scalar(self.fvals[0])),
            other => Err(invalid_argument(format!(
                "nelder-mead has no result named `{}`",
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

    fn drive(f: impl Fn(&[f64]) -> f64, d: usize, x0: Vec<f64>) -> Box<dyn Method> {
        let mut m = NelderMead::init(d).unwrap();
        m.seed(&x0).unwrap();
        let mut rng = default_source();
        let mut x = vec![0.0; d];
        let mut iters = 0;
        while !m.done().is_complete() {
            m.next(rng.as_mut(), &mut x).unwrap();
            let fv = f(&x);
            m.set_value(&x, fv).unwrap();
            iters += 1;
            assert!(iters < 5000, "nelder-mead did not converge");
        }
        m
    }

    #[test]
    fn minimizes_sphere() {
        let m = drive(|x| x.iter().map(|v| v * v).sum(), 2, vec![3.0, -2.0]);
        let x = m.result("x").unwrap();
        let x = x.as_vector().unwrap();
        assert_abs_diff_eq!(x[0], 0.0, epsilon = 1e-1);
        assert_abs_diff_eq!(x[1], 0.0, epsilon = 1e-1);
    }

    #[test]
    fn terminates_within_iteration_cap() {
        let rosenbrock = |x: &[f64]| {
            let a = 1.0 - x[0];
            let b = x[1] - x[0] * x[0];
            a * a + 100.0 * b * b
        };
        let m = drive(rosenbrock, 2, vec![-1.2, 1.0]);
        assert!(m.done().is_complete());
        let _ = m.result("value").unwrap().as_scalar().unwrap();
    }

    #[test]
    fn bootstrap_perturbs_one_axis_per_vertex() {
        let mut m = NelderMead::init(2).unwrap();
        m.seed(&[1.0, 1.0]).unwrap();
        let mut rng = default_source();
        let mut x = vec![0.0; 2];
        m.next(rng.as_mut(), &mut x).unwrap();
        assert_eq!(x, vec![1.0, 1.0]);
        m.set_value(&x, 0.0).unwrap();
        m.next(rng.as_mut(), &mut x).unwrap();
        assert_eq!(x, vec![2.0, 1.0]);
        m.set_value(&x, 0.0).unwrap();
        m.next(rng.as_mut(), &mut x).unwrap();
        assert_eq!(x, vec![1.0, 4.0]);
    }

    #[test]
    fn rejects_seed_of_wrong_length() {
        let mut m = NelderMead::init(2).unwrap();
        assert!(m.seed(&[1.0]).is_err());
    }

    #[test]
    fn warns_but_accepts_out_of_range_coefficients() {
        let mut m = NelderMead::init(2).unwrap();
        assert!(m.hparam_set("alpha", Value::Scalar(-1.0)).is_ok());
        assert!(m.hparam_set("gamma", Value::Scalar(1.0)).is_ok());
        assert!(m.hparam_set("beta", Value::Scalar(1.5)).is_ok());
        assert!(m.hparam_set("delta", Value::Scalar(0.0)).is_ok());
        let warnings = m.take_warnings();
        assert_eq!(warnings.len(), 4);
        assert_eq!(m.hparam_get("alpha").unwrap().as_scalar().unwrap(), -1.0);
    }

    #[test]
    fn in_range_coefficients_warn_nothing() {
        let mut m = NelderMead::init(2).unwrap();
        m.hparam_set("alpha", Value::Scalar(1.0)).unwrap();
        m.hparam_set("beta", Value::Scalar(0.5)).unwrap();
        m.hparam_set("gamma", Value::Scalar(2.0)).unwrap();
        m.hparam_set("delta", Value::Scalar(0.5)).unwrap();
        assert!(m.take_warnings().is_empty());
    }
}

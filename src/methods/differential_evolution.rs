// Copyright 2018-2020 argmin developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Differential evolution (§4.9).
//!
//! Keeps two generations, `x` (being filled this pass) and `x_prev` (the reference generation
//! mutation draws from). Each trial vector is accepted into `x` only if it strictly improves on
//! the incumbent at the same population index; once a full pass over the population completes,
//! the generations swap and the iteration budget ticks down by one. Unlike every other method in
//! this crate, `next` consumes the session-injected [`RandomSource`] to draw donor indices and,
//! during the initial generation, the starting population itself.

use crate::error::{invalid_argument, state_violation, Error};
use crate::method::{Method, Outcome};
use crate::rng::RandomSource;
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Initial(usize),
    Running(usize),
    Done,
}

/// Which mutation formula [`DifferentialEvolution::mutate`] draws from, named for clarity even
/// though neither name is exposed across the public API (only `F`/`lambda` are, per §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scheme {
    /// `x_r1 + F * (x_r2 - x_r3)`, selected when `lambda == 0`.
    Rand1,
    /// `x_i + lambda * (x_best - x_i) + F * (x_r2 - x_r3)`, selected when `lambda != 0`.
    Best2,
}

/// Differential evolution over two generations of `NP` vectors.
pub struct DifferentialEvolution {
    d: usize,
    np: usize,
    f: f64,
    lambda: f64,
    iterations: usize,
    f_tol: Option<f64>,
    start: Option<Vec<f64>>,
    lower: Option<Vec<f64>>,
    upper: Option<Vec<f64>>,
    population_built: bool,
    pending_ready: bool,
    x: Vec<Vec<f64>>,
    x_prev: Vec<Vec<f64>>,
    fx: Vec<f64>,
    fx_prev: Vec<f64>,
    best: usize,
    gen_best: Option<usize>,
    pending: Vec<f64>,
    mode: Mode,
    warnings: Vec<String>,
}

impl DifferentialEvolution {
    /// Construct for dimension `d`.
    pub fn init(d: usize) -> Result<Box<dyn Method>, Error> {
        if d == 0 {
            return Err(invalid_argument("differential-evolution requires d >= 1"));
        }
        Ok(Box::new(DifferentialEvolution {
            d,
            np: 10 * d,
            f: 0.5,
            lambda: 0.1,
            iterations: 1000,
            f_tol: None,
            start: None,
            lower: None,
            upper: None,
            population_built: false,
            pending_ready: false,
            x: Vec::new(),
            x_prev: Vec::new(),
            fx: Vec::new(),
            fx_prev: Vec::new(),
            best: 0,
            gen_best: None,
            pending: vec![0.0; d],
            mode: Mode::Initial(0),
            warnings: Vec::new(),
        }))
    }

    fn require_unbuilt(&self, what: &str) -> Result<(), Error> {
        if self.population_built {
            return Err(state_violation(format!(
                "differential-evolution: `{}` can only be set before the population is built",
                what
            )));
        }
        Ok(())
    }

    fn normalize_bounds(&mut self) {
        let mut swapped = Vec::new();
        if let (Some(lower), Some(upper)) = (self.lower.as_mut(), self.upper.as_mut()) {
            for k in 0..self.d {
                if lower[k] > upper[k] {
                    std::mem::swap(&mut lower[k], &mut upper[k]);
                    swapped.push(k);
                }
            }
        }
        if !swapped.is_empty() {
            self.warnings.push(format!(
                "differential-evolution: lower/upper were inverted at coordinate(s) {:?}, swapped automatically",
                swapped
            ));
        }
    }

    fn clamp_vector(&self, v: Vec<f64>) -> Vec<f64> {
        match (&self.lower, &self.upper) {
            (Some(lower), Some(upper)) => v
                .iter()
                .enumerate()
                .map(|(k, &x)| x.max(lower[k]).min(upper[k]))
                .collect(),
            _ => v,
        }
    }

    fn sample_individual(&self, rng: &mut dyn RandomSource) -> Vec<f64> {
        let raw = if let Some(start) = &self.start {
            (0..self.d)
                .map(|k| start[k] + rng.uniform_range(-0.5, 0.5))
                .collect()
        } else if let (Some(lower), Some(upper)) = (&self.lower, &self.upper) {
            (0..self.d).map(|k| rng.uniform_range(lower[k], upper[k])).collect()
        } else {
            (0..self.d).map(|_| rng.uniform_range(-0.5, 0.5)).collect()
        };
        self.clamp_vector(raw)
    }

    fn distinct_index(&self, rng: &mut dyn RandomSource, exclude: &[usize]) -> usize {
        loop {
            let i = rng.uniform_index(self.np);
            if !exclude.contains(&i) {
                return i;
            }
        }
    }

    /// Which scheme `mutate` uses for the current configuration.
    fn scheme(&self) -> Scheme {
        if self.lambda != 0.0 {
            Scheme::Best2
        } else {
            Scheme::Rand1
        }
    }

    /// Draws the trial vector for population index `i` against the reference generation.
    fn mutate(&self, rng: &mut dyn RandomSource, i: usize) -> Vec<f64> {
        let raw = match self.scheme() {
            Scheme::Best2 => {
                let r2 = self.distinct_index(rng, &[]);
                let r3 = self.distinct_index(rng, &[r2]);
                (0..self.d)
                    .map(|k| {
                        self.x_prev[i][k]
                            + self.lambda * (self.x_prev[self.best][k] - self.x_prev[i][k])
                            + self.f * (self.x_prev[r2][k] - self.x_prev[r3][k])
                    })
                    .collect()
            }
            Scheme::Rand1 if self.f != 0.0 => {
                let r1 = self.distinct_index(rng, &[]);
                let r2 = self.distinct_index(rng, &[r1]);
                let r3 = self.distinct_index(rng, &[r1, r2]);
                (0..self.d)
                    .map(|k| self.x_prev[r1][k] + self.f * (self.x_prev[r2][k] - self.x_prev[r3][k]))
                    .collect()
            }
            Scheme::Rand1 => self.x_prev[i].clone(),
        };
        self.clamp_vector(raw)
    }

    fn build_population(&mut self) {
        self.normalize_bounds();
        self.x = vec![vec![0.0; self.d]; self.np];
        self.x_prev = vec![vec![0.0; self.d]; self.np];
        self.fx = vec![f64::NAN; self.np];
        self.fx_prev = vec![f64::NAN; self.np];
        self.population_built = true;
    }

    /// Swaps generations, decrements the iteration budget, and decides the next mode.
    ///
    /// `self.best` is taken from `gen_best`, the argmin tracked while the generation now being
    /// swapped into `x_prev` was filled (see `set_value`); it must never be read from the stale
    /// cross-generation index that was valid two generations ago.
    ///
    /// Mirrors the iteration-count termination of §4.9. When `f_tol` is configured, also checks
    /// the early-source tolerance condition (`fx[best] < f_tol && fx_prev[best] < f_tol`) as an
    /// additional, optional stopping criterion.
    fn end_generation(&mut self) {
        self.best = self.gen_best.take().expect("gen_best set before a generation completes");
        std::mem::swap(&mut self.x, &mut self.x_prev);
        std::mem::swap(&mut self.fx, &mut self.fx_prev);
        self.iterations = self.iterations.saturating_sub(1);
        let tolerance_met = self
            .f_tol
            .map(|tol| self.fx[self.best] < tol && self.fx_prev[self.best] < tol)
            .unwrap_or(false);
        self.mode = if self.iterations == 0 || tolerance_met {
            Mode::Done
        } else {
            Mode::Running(0)
        };
    }
}

impl Method for DifferentialEvolution {
    fn name(&self) -> &'static str {
        "differential-evolution"
    }

    fn hparam_set(&mut self, id: &str, value: Value) -> Result<(), Error> {
        match id {
            "NP" => {
                self.require_unbuilt("NP")?;
                let np = value.as_index()?;
                self.np = np.max(3);
                if np < 3 {
                    self.warnings.push(format!(
                        "differential-evolution: `NP` must be >= 3, got {}, clamped to {}",
                        np, self.np
                    ));
                }
                Ok(())
            }
            "F" => {
                self.f = value.as_scalar()?;
                Ok(())
            }
            "lambda" => {
                self.lambda = value.as_scalar()?;
                Ok(())
            }
            "iterations" => {
                self.iterations = value.as_index()?;
                Ok(())
            }
            "f_tol" => {
                self.f_tol = Some(value.as_scalar()?);
                Ok(())
            }
            "start" => {
                self.require_unbuilt("start")?;
                let v = value.as_vector()?;
                if v.len() != self.d {
                    return Err(invalid_argument(format!(
                        "differential-evolution: `start` has length {}, expected {}",
                        v.len(),
                        self.d
                    )));
                }
                self.start = Some(v.to_vec());
                Ok(())
            }
            "lower" => {
                self.require_unbuilt("lower")?;
                let v = value.as_vector()?;
                if v.len() != self.d {
                    return Err(invalid_argument(format!(
                        "differential-evolution: `lower` has length {}, expected {}",
                        v.len(),
                        self.d
                    )));
                }
                self.lower = Some(v.to_vec());
                Ok(())
            }
            "upper" => {
                self.require_unbuilt("upper")?;
                let v = value.as_vector()?;
                if v.len() != self.d {
                    return Err(invalid_argument(format!(
                        "differential-evolution: `upper` has length {}, expected {}",
                        v.len(),
                        self.d
                    )));
                }
                self.upper = Some(v.to_vec());
                Ok(())
            }
            other => Err(invalid_argument(format!(
                "differential-evolution has no hyper-parameter named `{}`",
                other
            ))),
        }
    }

    fn info(&self) -> Result<String, Error> {
        Ok("differential-evolution: population-based multi-variate minimizer over NP candidate \
            vectors per generation; mutation scheme is DE/rand/1 when lambda == 0, DE/best/2 \
            otherwise, with no crossover. Hyper-parameters: NP (default 10*d, clamped up to \
            >= 3), F (default 0.5), lambda (default 0.1), iterations (default 1000), f_tol \
            (optional early-stop), start/lower/upper (optional). Results: minimum x, minimum f."
            .to_string())
    }

    fn take_warnings(&mut self) -> Vec<String> {
        std::mem::take(&mut self.warnings)
    }

    fn hparam_get(&self, id: &str) -> Result<Value, Error> {
        match id {
            "NP" => Ok(Value::Index(self.np)),
            "F" => Ok(Value::Scalar(self.f)),
            "lambda" => Ok(Value::Scalar(self.lambda)),
            "iterations" => Ok(Value::Index(self.iterations)),
            "f_tol" => Ok(Value::Scalar(self.f_tol.unwrap_or(f64::NAN))),
            "start" => Ok(Value::Vector(self.start.clone().unwrap_or_default())),
            "lower" => Ok(Value::Vector(self.lower.clone().unwrap_or_default())),
            "upper" => Ok(Value::Vector(self.upper.clone().unwrap_or_default())),
            other => Err(invalid_argument(format!(
                "differential-evolution has no hyper-parameter named `{}`",
                other
            ))),
        }
    }

    fn next(&mut self, rng: &mut dyn RandomSource, out: &mut [f64]) -> Result<(), Error> {
        match self.mode {
            Mode::Done => Err(state_violation("differential-evolution: `next` called after completion")),
            Mode::Initial(_) if self.pending_ready => {
                out.copy_from_slice(&self.pending);
                Ok(())
            }
            Mode::Initial(i) => {
                if i == 0 && !self.population_built {
                    self.build_population();
                }
                self.pending = self.sample_individual(rng);
                self.pending_ready = true;
                out.copy_from_slice(&self.pending);
                Ok(())
            }
            Mode::Running(_) if self.pending_ready => {
                out.copy_from_slice(&self.pending);
                Ok(())
            }
            Mode::Running(i) => {
                self.pending = self.mutate(rng, i);
                self.pending_ready = true;
                out.copy_from_slice(&self.pending);
                Ok(())
            }
        }
    }

    fn set_value(&mut self, v: &[f64], fv: f64) -> Result<(), Error> {
        match self.mode {
            Mode::Initial(i) => {
                self.x[i] = v.to_vec();
                self.fx[i] = fv;
                if self.gen_best.map_or(true, |b| fv < self.fx[b]) {
                    self.gen_best = Some(i);
                }
                self.pending_ready = false;
                let next_i = i + 1;
                if next_i < self.np {
                    self.mode = Mode::Initial(next_i);
                } else {
                    self.end_generation();
                }
                Ok(())
            }
            Mode::Running(i) => {
                if fv < self.fx_prev[i] {
                    self.x[i] = v.to_vec();
                    self.fx[i] = fv;
                } else {
                    self.x[i] = self.x_prev[i].clone();
                    self.fx[i] = self.fx_prev[i];
                }
                if self.gen_best.map_or(true, |b| self.fx[i] < self.fx[b]) {
                    self.gen_best = Some(i);
                }
                self.pending_ready = false;
                let next_i = i + 1;
                if next_i < self.np {
                    self.mode = Mode::Running(next_i);
                } else {
                    self.end_generation();
                }
                Ok(())
            }
            Mode::Done => Err(state_violation("differential-evolution: `set_value` called after completion")),
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
            return Err(crate::error::not_ready("differential-evolution: not yet complete"));
        }
        match id {
            "minimum x" => Ok(Value::Vector(self.x_prev[self.best].clone())),
            "minimum f" => Ok(Value::Scalar(self.fx_prev[self.best])),
            other => Err(invalid_argument(format!(
                "differential-evolution has no result named `{}`",
                other
            ))),
        }
    }
}

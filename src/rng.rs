// Copyright 2018-2020 argmin developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! The injected randomness source used by differential evolution (§1.1, §4.9).
//!
//! Per the Design Notes, randomness is a per-session dependency rather than a process-global
//! generator: [`Session`](crate::session::Session) owns a `Box<dyn RandomSource>`, defaulting to
//! a system-seeded [`rand::rngs::StdRng`] but swappable for a deterministic stream (e.g.
//! `rand_xoshiro`) in tests, making property 14 (determinism under a fixed seed) checkable.

use rand::{Rng, RngCore, SeedableRng};

/// A source of uniform randomness, object-safe so it can live behind `Box<dyn RandomSource>`.
pub trait RandomSource {
    /// Draw a value uniformly from `[0, 1)`.
    fn uniform01(&mut self) -> f64;

    /// Draw a value uniformly from `[lo, hi)`.
    fn uniform_range(&mut self, lo: f64, hi: f64) -> f64 {
        lo + self.uniform01() * (hi - lo)
    }

    /// Draw an index uniformly from `[0, bound)`.
    fn uniform_index(&mut self, bound: usize) -> usize;
}

impl<T: RngCore> RandomSource for T {
    fn uniform01(&mut self) -> f64 {
        self.gen_range(0.0..1.0)
    }

    fn uniform_index(&mut self, bound: usize) -> usize {
        self.gen_range(0..bound)
    }
}

/// Build the default randomness source: a [`rand::rngs::StdRng`] seeded from system entropy.
pub fn default_source() -> Box<dyn RandomSource + Send> {
    Box::new(rand::rngs::StdRng::from_entropy())
}

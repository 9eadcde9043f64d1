// Copyright 2018-2020 argmin developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Crate-level integration tests for the method-specific testable properties (§8, properties
//! 5-14), each driven end-to-end through the public [`Session`] API rather than a method's own
//! unit tests.

use approx::assert_abs_diff_eq;
use asktell::rng::RandomSource;
use asktell::session::Session;
use asktell::value::Value;
use asktell::vector::l2;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

fn run_to_completion(s: &mut Session, d: usize, f: impl Fn(&[f64]) -> f64) {
    let mut x = vec![0.0; d];
    while !s.done().unwrap().is_complete() {
        s.next(&mut x).unwrap();
        let fv = f(&x);
        s.set_value(&x, fv).unwrap();
    }
}

/// Property 5 (bisection half): converges to a root with `|f(x*)| < f_tol` or `|b-a| < x_tol`.
#[test]
fn bisection_converges_to_a_root() {
    let mut s = Session::open(1).unwrap();
    s.method_select("bisection").unwrap();
    s.hparam_set("lower", Value::Scalar(0.0)).unwrap();
    s.hparam_set("upper", Value::Scalar(2.0)).unwrap();
    run_to_completion(&mut s, 1, |x| x[0] * x[0] - 2.0);
    let root = s.result("root").unwrap().as_scalar().unwrap();
    assert_abs_diff_eq!(root, std::f64::consts::SQRT_2, epsilon = 1e-4);
}

/// Property 5 (Brent-Dekker half): same convergence guarantee on the same bracketed problem.
#[test]
fn brent_dekker_converges_to_a_root() {
    let mut s = Session::open(1).unwrap();
    s.method_select("brent-dekker").unwrap();
    s.hparam_set("x_0", Value::Scalar(0.0)).unwrap();
    s.hparam_set("x_1", Value::Scalar(2.0)).unwrap();
    run_to_completion(&mut s, 1, |x| x[0] * x[0] - 2.0);
    let root = s.result("root").unwrap().as_scalar().unwrap();
    assert_abs_diff_eq!(root, std::f64::consts::SQRT_2, epsilon = 1e-6);
}

/// Property 6: Newton-Raphson on `f(x) = x^2 - 2`, `x_0 = 1.5`, `f_tol = 1e-10`, terminates with
/// `|x* - sqrt(2)| < 1e-5`.
#[test]
fn newton_raphson_finds_sqrt_two() {
    let mut s = Session::open(1).unwrap();
    s.method_select("newton-raphson").unwrap();
    s.hparam_set("x_0", Value::Scalar(1.5)).unwrap();
    s.hparam_set("f_tol", Value::Scalar(1e-10)).unwrap();

    let mut x = [0.0f64; 1];
    while !s.done().unwrap().is_complete() {
        s.next(&mut x).unwrap();
        let fv = x[0] * x[0] - 2.0;
        let g = 2.0 * x[0];
        s.set_value_with_gradient(&x, fv, &[g]).unwrap();
    }
    let root = s.result("root").unwrap().as_scalar().unwrap();
    assert!((root - std::f64::consts::SQRT_2).abs() < 1e-5);
}

/// Property 7: secant with the same bootstrap makes progress toward the root in the same
/// direction as Newton-Raphson on the same function.
#[test]
fn secant_progresses_same_direction_as_newton_raphson() {
    let f = |x: f64| x * x - 2.0;

    let mut secant = Session::open(1).unwrap();
    secant.method_select("secant").unwrap();
    secant.hparam_set("x_0", Value::Scalar(1.0)).unwrap();
    secant.hparam_set("x_1", Value::Scalar(2.0)).unwrap();
    let mut x = [0.0f64; 1];
    secant.next(&mut x).unwrap();
    secant.set_value(&x, f(x[0])).unwrap();
    secant.next(&mut x).unwrap();
    secant.set_value(&x, f(x[0])).unwrap();
    secant.next(&mut x).unwrap();
    let secant_third = x[0];

    let mut newton = Session::open(1).unwrap();
    newton.method_select("newton-raphson").unwrap();
    newton.hparam_set("x_0", Value::Scalar(2.0)).unwrap();
    newton.next(&mut x).unwrap();
    newton.set_value_with_gradient(&x, f(x[0]), &[2.0 * x[0]]).unwrap();
    newton.next(&mut x).unwrap();
    let newton_second = x[0];

    // Both start past the root (2.0 > sqrt(2)) and must move down toward it, not away.
    assert!(secant_third < 2.0);
    assert!(newton_second < 2.0);
}

/// Property 8: trapezoidal on `f(x) = x` over `[0,1]` returns exactly 0.5 for any `n >= 1`.
#[test]
fn trapezoidal_integrates_identity_exactly() {
    for n in [1usize, 4, 10, 37] {
        let mut s = Session::open(1).unwrap();
        s.method_select("trapezoidal").unwrap();
        s.hparam_set("lower", Value::Scalar(0.0)).unwrap();
        s.hparam_set("upper", Value::Scalar(1.0)).unwrap();
        s.hparam_set("n", Value::Index(n)).unwrap();
        run_to_completion(&mut s, 1, |x| x[0]);
        let area = s.result("area").unwrap().as_scalar().unwrap();
        assert_abs_diff_eq!(area, 0.5, epsilon = 1e-12);
    }
}

/// Property 9: Simpson's on `f(x) = x^2` over `[0,1]`, `n=2`, returns exactly 1/3.
#[test]
fn simpson_integrates_quadratic_exactly() {
    let mut s = Session::open(1).unwrap();
    s.method_select("simpson").unwrap();
    s.hparam_set("lower", Value::Scalar(0.0)).unwrap();
    s.hparam_set("upper", Value::Scalar(1.0)).unwrap();
    s.hparam_set("n", Value::Index(2)).unwrap();
    run_to_completion(&mut s, 1, |x| x[0] * x[0]);
    let area = s.result("area").unwrap().as_scalar().unwrap();
    assert_abs_diff_eq!(area, 1.0 / 3.0, epsilon = 1e-12);
}

/// Property 10: Simpson's on `f(x) = 1/(1+x^2)` over `[0,1]`, `n=4`, estimates `pi/4` to 1e-3.
#[test]
fn simpson_estimates_pi_over_four() {
    let mut s = Session::open(1).unwrap();
    s.method_select("simpson").unwrap();
    s.hparam_set("lower", Value::Scalar(0.0)).unwrap();
    s.hparam_set("upper", Value::Scalar(1.0)).unwrap();
    s.hparam_set("n", Value::Index(4)).unwrap();
    run_to_completion(&mut s, 1, |x| 1.0 / (1.0 + x[0] * x[0]));
    let area = s.result("area").unwrap().as_scalar().unwrap();
    assert_abs_diff_eq!(area, std::f64::consts::FRAC_PI_4, epsilon = 1e-3);
}

/// Property 11: Nelder-Mead on the 2D Rosenbrock function, default hyper-parameters, seed
/// `(0,0)`, converges (within an iteration cap) to a best point within `L2` distance 0.5 of
/// `(1,1)`.
#[test]
fn nelder_mead_converges_on_rosenbrock() {
    let mut s = Session::open(2).unwrap();
    s.method_select("nelder-mead").unwrap();
    s.seed(&[0.0, 0.0]).unwrap();

    let rosenbrock = |x: &[f64]| (1.0 - x[0]).powi(2) + 100.0 * (x[1] - x[0] * x[0]).powi(2);
    let mut x = vec![0.0; 2];
    let mut iters = 0;
    while !s.done().unwrap().is_complete() {
        s.next(&mut x).unwrap();
        let fv = rosenbrock(&x);
        s.set_value(&x, fv).unwrap();
        iters += 1;
        assert!(iters < 20_000, "nelder-mead did not converge within the iteration cap");
    }
    let (best_x, _) = s.best().unwrap();
    assert!(l2(&[best_x[0] - 1.0, best_x[1] - 1.0]) < 0.5);
}

/// Property 12: differential evolution on the 2D Ackley function, `NP=20`, `iterations=10000`,
/// `start=(1,1)`, returns a `minimum f` within 1e-2 of 0.
#[test]
fn differential_evolution_converges_on_ackley() {
    let ackley = |x: &[f64]| -> f64 {
        let n = x.len() as f64;
        let sum_sq: f64 = x.iter().map(|v| v * v).sum();
        let sum_cos: f64 = x.iter().map(|v| (2.0 * std::f64::consts::PI * v).cos()).sum();
        -20.0 * (-0.2 * (sum_sq / n).sqrt()).exp() - (sum_cos / n).exp()
            + 20.0
            + std::f64::consts::E
    };

    let mut s = Session::open(2).unwrap();
    s.method_select("differential-evolution").unwrap();
    s.set_random_source(Box::new(Xoshiro256PlusPlus::seed_from_u64(42)) as Box<dyn RandomSource + Send>);
    s.hparam_set("NP", Value::Index(20)).unwrap();
    s.hparam_set("iterations", Value::Index(10_000)).unwrap();
    s.hparam_set("start", Value::Vector(vec![1.0, 1.0])).unwrap();
    s.hparam_set("lower", Value::Vector(vec![-5.0, -5.0])).unwrap();
    s.hparam_set("upper", Value::Vector(vec![5.0, 5.0])).unwrap();

    run_to_completion(&mut s, 2, ackley);
    let value = s.result("minimum f").unwrap().as_scalar().unwrap();
    assert!(value < 1e-2, "minimum f was {value}, expected within 1e-2 of 0");
}

/// Property 13: gradient estimate on `f(x,y) = 3x^2 y` at `(1,2)`, `step = 1e-4`, returns a
/// gradient within 1e-2 of `(12, 3)`.
#[test]
fn gradient_estimate_matches_analytic_gradient() {
    let mut s = Session::open(2).unwrap();
    s.method_select("gradient-estimate").unwrap();
    s.hparam_set("x0", Value::Vector(vec![1.0, 2.0])).unwrap();
    s.hparam_set("step", Value::Scalar(1e-4)).unwrap();
    run_to_completion(&mut s, 2, |x| 3.0 * x[0] * x[0] * x[1]);
    let g = s.result("gradient").unwrap();
    let g = g.as_vector().unwrap();
    assert_abs_diff_eq!(g[0], 12.0, epsilon = 1e-2);
    assert_abs_diff_eq!(g[1], 3.0, epsilon = 1e-2);
}

/// Property 14: the state machine is deterministic under a fixed pseudo-random seed and input
/// sequence, demonstrated on differential evolution (the one method whose `next` consumes
/// randomness).
#[test]
fn differential_evolution_is_deterministic_under_a_fixed_seed() {
    let run = || {
        let mut s = Session::open(2).unwrap();
        s.method_select("differential-evolution").unwrap();
        s.set_random_source(Box::new(Xoshiro256PlusPlus::seed_from_u64(99)) as Box<dyn RandomSource + Send>);
        s.hparam_set("lower", Value::Vector(vec![-3.0, -3.0])).unwrap();
        s.hparam_set("upper", Value::Vector(vec![3.0, 3.0])).unwrap();
        s.hparam_set("iterations", Value::Index(200)).unwrap();
        run_to_completion(&mut s, 2, |x| x.iter().map(|v| v * v).sum());
        s.result("minimum f").unwrap().as_scalar().unwrap()
    };
    assert_eq!(run(), run());
}

// Copyright 2018-2020 argmin developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! A pure Rust toolbox of ask/tell numerical methods.
//!
//! Every method in this crate — root finders, minimizers, quadrature rules, a gradient estimator
//! — follows the same inversion-of-control protocol instead of calling back into a caller-supplied
//! objective function: the caller drives the loop, asking the method for the next point to
//! evaluate with [`Method::next`](method::Method::next), evaluating it however it likes (in
//! process, over the network, against a simulator), and telling the method the result with
//! [`Method::set_value`](method::Method::set_value). This makes every method trivially usable from
//! contexts where the objective cannot be expressed as a plain Rust closure.
//!
//! [`Session`](session::Session) is the entry point most callers want: it binds a method from the
//! builtin [`catalogue`], drives it, and tracks the best point/value seen independently of
//! whatever the bound method tracks internally. Callers who need direct access to a method (to
//! embed it inside a larger control loop, for instance) can construct one directly through
//! [`catalogue::method_select`] and drive the [`method::Method`] trait object themselves.
//!
//! ```
//! use asktell::session::Session;
//! use asktell::value::Value;
//!
//! let mut session = Session::open(1).unwrap();
//! session.method_select("bisection").unwrap();
//! session.hparam_set("lower", Value::Scalar(0.0)).unwrap();
//! session.hparam_set("upper", Value::Scalar(2.0)).unwrap();
//!
//! let mut x = [0.0f64; 1];
//! while !session.done().unwrap().is_complete() {
//!     session.next(&mut x).unwrap();
//!     session.set_value(&x, x[0] * x[0] - 2.0).unwrap();
//! }
//! let root = session.result("root").unwrap().as_scalar().unwrap();
//! assert!((root - std::f64::consts::SQRT_2).abs() < 1e-6);
//! ```
#![warn(missing_docs)]

/// The method catalogue: a name-keyed registry of builtin method providers.
pub mod catalogue;

/// Verbosity-gated diagnostics channel.
pub mod diagnostics;

/// The shared error taxonomy.
pub mod error;

/// The capability contract every method implements.
pub mod method;

/// The ten builtin method implementations.
pub mod methods;

/// The injected randomness source used by differential evolution.
pub mod rng;

/// The session driver most callers should use.
pub mod session;

/// The name-keyed configuration value type.
pub mod value;

/// Dense vector helpers shared by every method.
pub mod vector;

// Copyright 2018-2020 argmin developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! The closed, name-keyed configuration value type shared by `hparam_set`/`hparam_get`/`result`.

use crate::error::{invalid_argument, Error};

/// A typed value exchanged through the name-keyed hyper-parameter and result surface.
///
/// Every method declares, per identifier, which variant it expects or returns; passing the
/// wrong variant to `hparam_set` is an `invalid-argument` error, not a silent coercion.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A single real number.
    Scalar(f64),
    /// A dense real vector.
    Vector(Vec<f64>),
    /// A non-negative integer (population sizes, subinterval counts, iteration budgets).
    Index(usize),
}

impl Value {
    /// Extract the scalar, or fail with `invalid-argument`.
    pub fn as_scalar(&self) -> Result<f64, Error> {
        match self {
            Value::Scalar(v) => Ok(*v),
            other => Err(invalid_argument(format!(
                "expected a scalar value, found {}",
                other.kind_name()
            ))),
        }
    }

    /// Extract the vector, or fail with `invalid-argument`.
    pub fn as_vector(&self) -> Result<&[f64], Error> {
        match self {
            Value::Vector(v) => Ok(v),
            other => Err(invalid_argument(format!(
                "expected a vector value, found {}",
                other.kind_name()
            ))),
        }
    }

    /// Extract the index, or fail with `invalid-argument`.
    pub fn as_index(&self) -> Result<usize, Error> {
        match self {
            Value::Index(v) => Ok(*v),
            other => Err(invalid_argument(format!(
                "expected an index value, found {}",
                other.kind_name()
            ))),
        }
    }

    fn kind_name(&self) -> &'static str {
        match self {
            Value::Scalar(_) => "scalar",
            Value::Vector(_) => "vector",
            Value::Index(_) => "index",
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Scalar(v)
    }
}

impl From<Vec<f64>> for Value {
    fn from(v: Vec<f64>) -> Self {
        Value::Vector(v)
    }
}

impl From<usize> for Value {
    fn from(v: usize) -> Self {
        Value::Index(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_accessor_rejects_vector() {
        let v = Value::Vector(vec![1.0, 2.0]);
        assert!(v.as_scalar().is_err());
        assert_eq!(v.as_vector().unwrap(), &[1.0, 2.0]);
    }

    #[test]
    fn conversions() {
        let s: Value = 3.0.into();
        assert_eq!(s.as_scalar().unwrap(), 3.0);
        let i: Value = 7usize.into();
        assert_eq!(i.as_index().unwrap(), 7);
    }
}

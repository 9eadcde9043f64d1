// Copyright 2018-2020 argmin developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! The method catalogue (§4.1, component C).
//!
//! A name-keyed registry of [`Constructor`] function pointers, not a dynamic plugin loader: every
//! provider is a builtin compiled into this crate. [`catalogue_populate`] builds the catalogue
//! [`Session::open`](crate::session::Session::open) uses by default; a caller who wants a
//! restricted or extended catalogue constructs their own [`Catalogue`] and registers providers on
//! it directly.

use crate::error::{invalid_argument, resource, unsupported, Error};
use crate::method::{Constructor, Method};
use crate::methods::{
    bisection::Bisection, brent_dekker::BrentDekker, brent_localmin::BrentLocalMin,
    differential_evolution::DifferentialEvolution, gradient_estimate::GradientEstimate,
    nelder_mead::NelderMead, newton_raphson::NewtonRaphson, secant::Secant, simpson::Simpson,
    trapezoidal::Trapezoidal,
};

/// Where a catalogue's providers come from.
///
/// The only implemented root is [`CatalogueRoot::Builtin`]; `Named` is reserved for a future
/// dynamic-loader backend (a plugin directory, say) that this crate does not implement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogueRoot {
    /// The ten providers compiled into this crate.
    Builtin,
    /// Reserved for a future out-of-process loader; unimplemented.
    Named(String),
}

/// One registered method provider.
#[derive(Clone, Copy)]
pub struct CatalogueEntry {
    /// The name a caller passes to `method_select`.
    pub name: &'static str,
    /// A one-line human-readable summary.
    pub summary: &'static str,
    constructor: Constructor,
}

/// The name-keyed registry of method providers.
#[derive(Clone, Default)]
pub struct Catalogue {
    entries: Vec<CatalogueEntry>,
}

impl Catalogue {
    /// An empty catalogue with no registered providers.
    pub fn new() -> Self {
        Catalogue { entries: Vec::new() }
    }

    /// Register a provider under `name`. A later registration of the same name shadows an
    /// earlier one, so callers can override a builtin by re-registering it.
    pub fn register(&mut self, name: &'static str, summary: &'static str, constructor: Constructor) {
        self.entries.retain(|e| e.name != name);
        self.entries.push(CatalogueEntry {
            name,
            summary,
            constructor,
        });
    }

    /// Iterate over every registered entry, in registration order.
    pub fn entries(&self) -> &[CatalogueEntry] {
        &self.entries
    }

    /// Look up the entry registered under `name`.
    pub fn find(&self, name: &str) -> Result<&CatalogueEntry, Error> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .ok_or_else(|| unsupported(format!("no method named `{}` is registered", name)))
    }
}

/// Build the catalogue populated with the providers found under `root`.
///
/// The only implemented root is [`CatalogueRoot::Builtin`], which always succeeds and yields the
/// ten built-in providers in a fixed, deterministic order — the same order a linear scan of
/// [`method_select`] walks. `CatalogueRoot::Named` is reserved for a future dynamic-loader
/// backend and currently fails with a `resource` error.
pub fn catalogue_populate(root: CatalogueRoot) -> Result<Catalogue, Error> {
    match root {
        CatalogueRoot::Builtin => Ok(catalogue_populate_builtin()),
        CatalogueRoot::Named(name) => Err(resource(format!(
            "catalogue root `{}` is not implemented by this crate",
            name
        ))),
    }
}

fn catalogue_populate_builtin() -> Catalogue {
    let mut c = Catalogue::new();
    c.register(
        "bisection",
        "Root finder: halves a sign-changing bracket each step.",
        Bisection::init,
    );
    c.register(
        "secant",
        "Root finder: linear interpolation from the last two evaluated points.",
        Secant::init,
    );
    c.register(
        "newton-raphson",
        "Root finder: requires a gradient at every step.",
        NewtonRaphson::init,
    );
    c.register(
        "brent-dekker",
        "Root finder: bisection safeguarding secant/inverse-quadratic interpolation.",
        BrentDekker::init,
    );
    c.register(
        "brent-localmin",
        "Single-variate minimizer: golden section safeguarded by parabolic interpolation.",
        BrentLocalMin::init,
    );
    c.register(
        "nelder-mead",
        "Multi-variate minimizer: downhill simplex search.",
        NelderMead::init,
    );
    c.register(
        "differential-evolution",
        "Multi-variate minimizer: population-based, randomized mutation and selection.",
        DifferentialEvolution::init,
    );
    c.register(
        "trapezoidal",
        "Quadrature: composite trapezoidal rule.",
        Trapezoidal::init,
    );
    c.register(
        "simpson",
        "Quadrature: composite Simpson's rule.",
        Simpson::init,
    );
    c.register(
        "gradient-estimate",
        "Forward-difference gradient estimate at a configured point.",
        GradientEstimate::init,
    );
    c
}

/// Instantiate the method registered under `name` for dimension `d`.
///
/// Scans the catalogue in order; for the first entry whose name matches, attempts to
/// instantiate it for `d`. If instantiation fails with a recoverable error (anything other than
/// the method declaring `d` unsuitable), the scan continues to another entry of the same name —
/// moot for the builtin catalogue, where [`Catalogue::register`] shadows same-named entries
/// rather than let duplicates coexist, but kept so a caller-assembled catalogue with genuine
/// duplicates behaves per the documented scan contract.
pub fn method_select(catalogue: &Catalogue, name: &str, d: usize) -> Result<Box<dyn Method>, Error> {
    if d < 1 {
        return Err(invalid_argument("dimension must be >= 1"));
    }
    let mut last_err: Option<Error> = None;
    let mut matched = false;
    for entry in catalogue.entries().iter().filter(|e| e.name == name) {
        matched = true;
        match (entry.constructor)(d) {
            Ok(method) => return Ok(method),
            Err(e) => last_err = Some(e),
        }
    }
    match last_err {
        Some(e) => Err(e),
        None if matched => Err(resource(format!("method `{}` failed to construct", name))),
        None => Err(unsupported(format!("no method named `{}` is registered", name))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn populated_catalogue_has_ten_entries() {
        let c = catalogue_populate(CatalogueRoot::Builtin).unwrap();
        assert_eq!(c.entries().len(), 10);
    }

    #[test]
    fn unknown_name_is_unsupported() {
        let c = catalogue_populate(CatalogueRoot::Builtin).unwrap();
        let err = c.find("not-a-method").unwrap_err();
        assert!(matches!(
            err.kind(),
            Some(crate::error::ErrorKind::Unsupported { .. })
        ));
    }

    #[test]
    fn method_select_builds_a_working_method() {
        let c = catalogue_populate(CatalogueRoot::Builtin).unwrap();
        let m = method_select(&c, "bisection", 1).unwrap();
        assert_eq!(m.name(), "bisection");
    }

    #[test]
    fn method_select_rejects_unsuitable_dimension() {
        let c = catalogue_populate(CatalogueRoot::Builtin).unwrap();
        assert!(method_select(&c, "secant", 3).is_err());
    }

    #[test]
    fn registering_same_name_twice_shadows_the_first() {
        let mut c = Catalogue::new();
        c.register("bisection", "first", Bisection::init);
        c.register("bisection", "second", Bisection::init);
        assert_eq!(c.entries().len(), 1);
        assert_eq!(c.find("bisection").unwrap().summary, "second");
    }

    #[test]
    fn named_root_is_not_implemented() {
        assert!(catalogue_populate(CatalogueRoot::Named("plugins".into())).is_err());
    }

    #[test]
    fn method_select_rejects_zero_dimension() {
        let c = catalogue_populate(CatalogueRoot::Builtin).unwrap();
        assert!(method_select(&c, "bisection", 0).is_err());
    }
}

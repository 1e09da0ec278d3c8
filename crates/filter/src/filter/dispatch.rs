//! Context-aware application of a filter.
//!
//! The mode is chosen per call from the shape of the context:
//! - `filters` is a mapping → composable: fragments are returned to the
//!   caller, who combines them with AND/OR.
//! - otherwise → legacy: values come from the request parameters and every
//!   fragment is conjoined into the query directly.

use serde_json::{Map, Value};

use super::{Capability, Filter, FilterPass};
use crate::query::Predicate;
use crate::request::RequestParameters;

/// Caller-supplied context for one application.
#[derive(Debug, Default, Clone, Copy)]
pub struct ApplyContext<'a> {
    /// Structured filter values, property → value.
    pub filters: Option<&'a Value>,
    /// Request parameters read in legacy mode.
    pub request: Option<&'a RequestParameters>,
}

impl<'a> ApplyContext<'a> {
    pub fn composable(filters: &'a Value) -> Self {
        Self {
            filters: Some(filters),
            request: None,
        }
    }

    pub fn legacy(request: &'a RequestParameters) -> Self {
        Self {
            filters: None,
            request: Some(request),
        }
    }
}

/// Dispatch mode selected from an [`ApplyContext`].
#[derive(Debug, Clone, Copy)]
pub enum Mode<'a> {
    Legacy(Option<&'a RequestParameters>),
    Composable(&'a Map<String, Value>),
}

impl<'a> Mode<'a> {
    pub fn select(context: &ApplyContext<'a>) -> Self {
        match context.filters {
            Some(Value::Object(filters)) => Mode::Composable(filters),
            Some(_) => {
                tracing::debug!("filter context is not a mapping; falling back to legacy mode");
                Mode::Legacy(context.request)
            }
            None => Mode::Legacy(context.request),
        }
    }
}

/// Apply `filter` to the query.
///
/// In composable mode the generated fragments are conjoined; in legacy mode
/// the request parameters are filtered and conjoined directly.
pub fn apply(filter: &dyn Filter, pass: &mut FilterPass<'_>, context: &ApplyContext<'_>) {
    match Mode::select(context) {
        Mode::Legacy(request) => apply_legacy(filter, pass, request),
        Mode::Composable(filters) => {
            for predicate in generate_composable(filter, pass, filters) {
                pass.query.and_where(predicate);
            }
        }
    }
}

/// Generate the fragments for `context` without conjoining them.
///
/// Parameters and joins are registered on the query; the caller must add
/// every returned fragment exactly once. In legacy mode the filter is
/// applied directly and nothing is returned.
pub fn generate_expressions(
    filter: &dyn Filter,
    pass: &mut FilterPass<'_>,
    context: &ApplyContext<'_>,
) -> Vec<Predicate> {
    match Mode::select(context) {
        Mode::Legacy(request) => {
            apply_legacy(filter, pass, request);
            Vec::new()
        }
        Mode::Composable(filters) => generate_composable(filter, pass, filters),
    }
}

fn generate_composable(
    filter: &dyn Filter,
    pass: &mut FilterPass<'_>,
    filters: &Map<String, Value>,
) -> Vec<Predicate> {
    if filter.capability() != Capability::FragmentGenerating {
        tracing::debug!(
            resource = pass.resource,
            "filter applies directly; skipped in composable mode"
        );
        return Vec::new();
    }

    let mut result = Vec::new();
    for (property, value) in filters {
        let property = filter.core().denormalize_property_name(property);
        if let Some(predicates) = filter.filter_property(&property, value, pass) {
            result.extend(predicates);
        }
    }

    result
}

fn apply_legacy(
    filter: &dyn Filter,
    pass: &mut FilterPass<'_>,
    request: Option<&RequestParameters>,
) {
    let Some(request) = request else {
        return;
    };

    for (property, value) in request.iter() {
        let property = filter.core().denormalize_property_name(property);
        if let Some(predicates) = filter.filter_property(&property, value, pass) {
            for predicate in predicates {
                pass.query.and_where(predicate);
            }
        }
    }
}

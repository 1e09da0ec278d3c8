//! Request filters.
//!
//! This module provides:
//! - DateFilter, NumericFilter, RangeFilter: per-kind expression builders
//! - PropertyGate: enabled / mapped / kind checks
//! - dispatch: legacy vs composable application of a filter
//! - normalize: shared value normalizers

pub mod date;
pub mod dispatch;
mod gate;
pub mod normalize;
pub mod numeric;
pub mod range;

pub use date::{DateFilter, DateOperator, NullManagement};
pub use dispatch::{ApplyContext, Mode};
pub use gate::{FieldKind, PropertyGate, PropertyMap};
pub use numeric::NumericFilter;
pub use range::{RangeFilter, RangeOperator};

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::diagnostics::{DiagnosticSink, Severity, TracingSink};
use crate::error::InvalidFilterValue;
use crate::metadata::MetadataProvider;
use crate::naming::{NameConverter, convert_path};
use crate::query::{Predicate, QueryNameGenerator, QueryTarget};

/// How a filter contributes to a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Mutates the query itself; skipped when fragments are requested.
    DirectApply,
    /// Returns self-contained fragments for the caller to combine.
    FragmentGenerating,
}

/// Everything a filter needs for one application pass.
pub struct FilterPass<'a> {
    pub query: &'a mut dyn QueryTarget,
    pub names: &'a mut dyn QueryNameGenerator,
    pub resource: &'a str,
    pub operation: Option<&'a str>,
}

impl<'a> FilterPass<'a> {
    pub fn new(
        query: &'a mut dyn QueryTarget,
        names: &'a mut dyn QueryNameGenerator,
        resource: &'a str,
    ) -> Self {
        Self {
            query,
            names,
            resource,
            operation: None,
        }
    }

    pub fn with_operation(mut self, operation: &'a str) -> Self {
        self.operation = Some(operation);
        self
    }
}

/// Describes one query parameter a filter accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterDescription {
    pub property: String,
    #[serde(rename = "type")]
    pub value_type: String,
    pub required: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_collection: bool,
}

impl FilterDescription {
    pub fn new(property: &str, value_type: &str) -> Self {
        Self {
            property: property.to_string(),
            value_type: value_type.to_string(),
            required: false,
            is_collection: false,
        }
    }

    pub fn collection(mut self) -> Self {
        self.is_collection = true;
        self
    }
}

/// State shared by every filter kind: the property gate, the diagnostic
/// sink and the optional name converter.
#[derive(Clone)]
pub struct FilterCore {
    pub gate: PropertyGate,
    diagnostics: Arc<dyn DiagnosticSink>,
    name_converter: Option<Arc<dyn NameConverter>>,
}

impl FilterCore {
    pub fn new(metadata: Arc<dyn MetadataProvider>, properties: Option<PropertyMap>) -> Self {
        Self {
            gate: PropertyGate::new(metadata, properties),
            diagnostics: Arc::new(TracingSink),
            name_converter: None,
        }
    }

    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn DiagnosticSink>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn with_name_converter(mut self, converter: Arc<dyn NameConverter>) -> Self {
        self.name_converter = Some(converter);
        self
    }

    pub fn report(&self, severity: Severity, error: &InvalidFilterValue) {
        self.diagnostics.report(severity, error);
    }

    /// Public parameter name → internal property name.
    pub fn denormalize_property_name(&self, property: &str) -> String {
        match &self.name_converter {
            Some(converter) => convert_path(property, |s| converter.denormalize(s)),
            None => property.to_string(),
        }
    }

    /// Internal property name → public parameter name.
    pub fn normalize_property_name(&self, property: &str) -> String {
        match &self.name_converter {
            Some(converter) => convert_path(property, |s| converter.normalize(s)),
            None => property.to_string(),
        }
    }
}

/// A filter applicable to a single property at a time.
pub trait Filter: Send + Sync {
    fn capability(&self) -> Capability;

    fn core(&self) -> &FilterCore;

    /// Build the fragments for one property.
    ///
    /// `None` means the filter does not apply (property not filterable,
    /// value of the wrong shape, nothing valid); `Some(vec![])` means it
    /// applies but every sub-clause was dropped.
    fn filter_property(
        &self,
        property: &str,
        value: &Value,
        pass: &mut FilterPass<'_>,
    ) -> Option<Vec<Predicate>>;

    /// Query parameters accepted for `resource`, keyed by parameter name.
    fn description(&self, resource: &str) -> BTreeMap<String, FilterDescription>;
}

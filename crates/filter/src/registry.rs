//! Filter registry.
//!
//! Holds the configured filters per resource, in declaration order, and
//! runs them together over one query.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::{Definition, FilterDeclaration, FilterKind};
use crate::diagnostics::DiagnosticSink;
use crate::error::ConfigError;
use crate::filter::{
    ApplyContext, DateFilter, Filter, FilterCore, FilterDescription, FilterPass, NumericFilter,
    PropertyMap, RangeFilter, dispatch,
};
use crate::metadata::{MetadataProvider, SchemaMetadata};
use crate::query::{Predicate, QueryBuilder};

/// Validate a filter name: alphanumeric, underscore, dot or hyphen, starting
/// with a letter or underscore.
fn is_valid_filter_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 64
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
        && name.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_')
}

struct Registration {
    name: String,
    filter: Box<dyn Filter>,
}

/// Registry of filters keyed by resource.
pub struct FilterRegistry {
    metadata: Arc<SchemaMetadata>,
    filters: BTreeMap<String, Vec<Registration>>,
}

impl FilterRegistry {
    /// Create an empty registry over `metadata`.
    pub fn new(metadata: Arc<SchemaMetadata>) -> Self {
        Self {
            metadata,
            filters: BTreeMap::new(),
        }
    }

    /// Build a registry from a parsed definition.
    ///
    /// Returns the registry and warnings for entries that were accepted with
    /// caveats (unmapped properties, replaced names).
    pub fn from_definition(
        definition: Definition,
        diagnostics: Arc<dyn DiagnosticSink>,
    ) -> Result<(Self, Vec<String>), ConfigError> {
        let metadata = Arc::new(SchemaMetadata::new(definition.resources)?);
        let converter = definition.name_converter.map(|kind| kind.build());
        let mut registry = Self::new(Arc::clone(&metadata));
        let mut warnings = Vec::new();

        for declaration in definition.filters {
            if !is_valid_filter_name(&declaration.name) {
                return Err(ConfigError::InvalidFilterName(declaration.name));
            }
            if metadata.resource(&declaration.resource).is_none() {
                return Err(ConfigError::UnknownResource {
                    filter: declaration.name,
                    resource: declaration.resource,
                });
            }

            let FilterDeclaration {
                name,
                kind,
                resource,
                properties,
            } = declaration;
            let properties: Option<PropertyMap> = properties.map(Into::into);

            for property in properties.iter().flat_map(|p| p.keys()) {
                if !metadata.is_property_mapped(&resource, property) {
                    warnings.push(format!(
                        "filter '{name}': property '{property}' is not mapped on '{resource}' and will be ignored"
                    ));
                }
            }

            let provider: Arc<dyn MetadataProvider> = metadata.clone();
            let mut core =
                FilterCore::new(provider, properties).with_diagnostics(Arc::clone(&diagnostics));
            if let Some(converter) = &converter {
                core = core.with_name_converter(Arc::clone(converter));
            }

            if registry.register(&resource, &name, build_filter(kind, core)) {
                warnings.push(format!(
                    "filter '{name}' on '{resource}' overwrites an earlier declaration"
                ));
            }
        }

        tracing::debug!(
            filters = registry.filters.values().map(Vec::len).sum::<usize>(),
            warnings = warnings.len(),
            "filter registry built"
        );

        Ok((registry, warnings))
    }

    /// Register `filter` for `resource` under `name`.
    ///
    /// Returns `true` if a filter with the same name was replaced.
    pub fn register(&mut self, resource: &str, name: &str, filter: Box<dyn Filter>) -> bool {
        let registrations = self.filters.entry(resource.to_string()).or_default();
        if let Some(existing) = registrations.iter_mut().find(|r| r.name == name) {
            existing.filter = filter;
            return true;
        }
        registrations.push(Registration {
            name: name.to_string(),
            filter,
        });
        false
    }

    pub fn metadata(&self) -> &SchemaMetadata {
        &self.metadata
    }

    /// Filters registered for `resource`, in declaration order.
    pub fn filters_for(&self, resource: &str) -> impl Iterator<Item = (&str, &dyn Filter)> {
        self.filters
            .get(resource)
            .into_iter()
            .flatten()
            .map(|r| (r.name.as_str(), r.filter.as_ref()))
    }

    pub fn get(&self, resource: &str, name: &str) -> Option<&dyn Filter> {
        self.filters_for(resource)
            .find(|(n, _)| *n == name)
            .map(|(_, filter)| filter)
    }

    /// A fresh query over `resource` aliased as `alias`.
    pub fn query_for(&self, resource: &str, alias: &str) -> Option<QueryBuilder> {
        let table = self.metadata.table_for(resource)?;
        Some(QueryBuilder::new(resource, &table, alias))
    }

    /// Apply every filter of `pass.resource`.
    pub fn apply(&self, pass: &mut FilterPass<'_>, context: &ApplyContext<'_>) {
        for (name, filter) in self.filters_for(pass.resource) {
            tracing::trace!(filter = name, resource = pass.resource, "applying filter");
            dispatch::apply(filter, pass, context);
        }
    }

    /// Generate the fragments of every filter of `pass.resource`, in
    /// declaration order.
    pub fn generate_expressions(
        &self,
        pass: &mut FilterPass<'_>,
        context: &ApplyContext<'_>,
    ) -> Vec<Predicate> {
        let mut expressions = Vec::new();
        for (_, filter) in self.filters_for(pass.resource) {
            expressions.extend(dispatch::generate_expressions(filter, pass, context));
        }
        expressions
    }

    /// Merged parameter descriptions of every filter of `resource`.
    pub fn describe(&self, resource: &str) -> BTreeMap<String, FilterDescription> {
        let mut description = BTreeMap::new();
        for (_, filter) in self.filters_for(resource) {
            description.extend(filter.description(resource));
        }
        description
    }
}

fn build_filter(kind: FilterKind, core: FilterCore) -> Box<dyn Filter> {
    match kind {
        FilterKind::Date => Box::new(DateFilter::new(core)),
        FilterKind::Numeric => Box::new(NumericFilter::new(core)),
        FilterKind::Range => Box::new(RangeFilter::new(core)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_names() {
        assert!(is_valid_filter_name("dummy.date"));
        assert!(is_valid_filter_name("_price-range"));
        assert!(!is_valid_filter_name(""));
        assert!(!is_valid_filter_name("1st"));
        assert!(!is_valid_filter_name("has space"));
        assert!(!is_valid_filter_name(&"a".repeat(65)));
    }
}

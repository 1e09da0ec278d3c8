//! Sieve test utilities.
//!
//! Helpers for integration testing: a Dummy/RelatedDummy schema fixture, a
//! diagnostic sink that records what it receives, and a query harness that
//! hands out filter passes.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;

use sieve_filter::diagnostics::{DiagnosticSink, Severity};
use sieve_filter::error::InvalidFilterValue;
use sieve_filter::filter::{FilterCore, FilterPass, NullManagement, PropertyMap};
use sieve_filter::metadata::{ResourceDefinition, SchemaMetadata};
use sieve_filter::query::{DefaultQueryNameGenerator, ParameterValue, Predicate, QueryBuilder};

/// Schema used across the integration tests.
pub const DUMMY_SCHEMA: &str = r#"
Dummy:
  fields:
    id: integer
    name: string
    age: integer
    price: decimal
    rating: float
    createdAt: datetime
    updatedAt: datetime_immutable
    dummyDate: date
  associations:
    relatedDummy:
      target: RelatedDummy
RelatedDummy:
  table: related_dummy
  fields:
    id: integer
    age: smallint
    dummyDate: datetime
  associations:
    thirdLevel:
      target: ThirdLevel
      join: inner
ThirdLevel:
  fields:
    id: integer
    level: integer
"#;

/// Metadata built from [`DUMMY_SCHEMA`].
pub fn dummy_metadata() -> Arc<SchemaMetadata> {
    let resources: BTreeMap<String, ResourceDefinition> = match serde_yml::from_str(DUMMY_SCHEMA) {
        Ok(resources) => resources,
        Err(e) => panic!("fixture schema is invalid: {e}"),
    };
    match SchemaMetadata::new(resources) {
        Ok(metadata) => Arc::new(metadata),
        Err(e) => panic!("fixture schema is inconsistent: {e}"),
    }
}

/// Enabled-properties map from `(property, null management)` pairs.
pub fn properties(entries: &[(&str, Option<&str>)]) -> PropertyMap {
    entries
        .iter()
        .map(|(property, policy)| {
            (
                property.to_string(),
                policy.map(|p| NullManagement::from(p.to_string())),
            )
        })
        .collect()
}

/// Diagnostic sink that keeps every report.
#[derive(Debug, Default)]
pub struct RecordingSink {
    entries: Mutex<Vec<(Severity, InvalidFilterValue)>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn entries(&self) -> Vec<(Severity, InvalidFilterValue)> {
        self.entries.lock().clone()
    }

    /// Rendered messages, in report order.
    pub fn messages(&self) -> Vec<String> {
        self.entries
            .lock()
            .iter()
            .map(|(_, error)| error.to_string())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl DiagnosticSink for RecordingSink {
    fn report(&self, severity: Severity, error: &InvalidFilterValue) {
        self.entries.lock().push((severity, error.clone()));
    }
}

/// Filter core over the Dummy schema, reporting into a fresh
/// [`RecordingSink`].
pub fn recording_core(properties: Option<PropertyMap>) -> (FilterCore, Arc<RecordingSink>) {
    let sink = RecordingSink::new();
    let core = FilterCore::new(dummy_metadata(), properties).with_diagnostics(sink.clone());
    (core, sink)
}

/// A query plus its name generator, for one test.
pub struct Harness {
    pub resource: String,
    pub query: QueryBuilder,
    pub names: DefaultQueryNameGenerator,
}

impl Harness {
    /// Query over `Dummy` aliased `o`.
    pub fn dummy() -> Self {
        Self::new("Dummy", "dummy", "o")
    }

    pub fn new(resource: &str, table: &str, alias: &str) -> Self {
        Self {
            resource: resource.to_string(),
            query: QueryBuilder::new(resource, table, alias),
            names: DefaultQueryNameGenerator::new(),
        }
    }

    /// Query over `Dummy` without a root alias.
    pub fn unaliased() -> Self {
        Self {
            resource: "Dummy".to_string(),
            query: QueryBuilder::unaliased("Dummy", "dummy"),
            names: DefaultQueryNameGenerator::new(),
        }
    }

    pub fn pass(&mut self) -> FilterPass<'_> {
        FilterPass::new(&mut self.query, &mut self.names, &self.resource)
    }

    /// Value bound to parameter `name`.
    pub fn value(&self, name: &str) -> Option<&ParameterValue> {
        self.query.parameter(name).map(|p| &p.value)
    }

    /// Rendered WHERE clauses, in the order they were added.
    pub fn wheres(&self) -> Vec<String> {
        rendered(self.query.wheres())
    }
}

/// Render predicates to their DQL text.
pub fn rendered(predicates: &[Predicate]) -> Vec<String> {
    predicates.iter().map(ToString::to_string).collect()
}

/// Assertion helpers for rendered queries.
pub mod assert {
    /// Assert that a string contains a substring.
    pub fn contains(haystack: &str, needle: &str) {
        assert!(
            haystack.contains(needle),
            "Expected string to contain '{needle}'\nActual: {haystack}"
        );
    }

    /// Assert that a string does not contain a substring.
    pub fn not_contains(haystack: &str, needle: &str) {
        assert!(
            !haystack.contains(needle),
            "Expected string to NOT contain '{needle}'\nActual: {haystack}"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sieve_filter::metadata::{FieldType, MetadataProvider};

    #[test]
    fn fixture_schema_loads() {
        let metadata = dummy_metadata();
        assert_eq!(
            metadata.field_type("Dummy", "createdAt"),
            Some(FieldType::DateTime)
        );
        assert_eq!(
            metadata.field_type("Dummy", "relatedDummy.thirdLevel.level"),
            Some(FieldType::Integer)
        );
        assert_eq!(metadata.table_for("RelatedDummy").as_deref(), Some("related_dummy"));
    }

    #[test]
    fn recording_sink_keeps_reports() {
        let sink = RecordingSink::new();
        assert!(sink.is_empty());

        sink.report(
            Severity::Notice,
            &InvalidFilterValue::InvalidNumeric {
                property: "age".to_string(),
            },
        );

        assert_eq!(sink.len(), 1);
        assert_eq!(sink.entries()[0].0, Severity::Notice);
        assert::contains(&sink.messages()[0], "\"age\"");
    }

    #[test]
    fn properties_helper_parses_policies() {
        let map = properties(&[("createdAt", Some("exclude_null")), ("age", None)]);
        assert_eq!(
            map.get("createdAt"),
            Some(&Some(NullManagement::ExcludeNull))
        );
        assert_eq!(map.get("age"), Some(&None));
    }
}

//! Resource metadata consumed by the filters.
//!
//! - `FieldType`: DBAL-style field type names
//! - `MetadataProvider`: mapping, nesting and join resolution
//! - `SchemaMetadata`: provider backed by a declarative schema

mod schema;

pub use schema::{AssociationDefinition, ResourceDefinition, SchemaMetadata};

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::query::{QueryNameGenerator, QueryTarget};

/// Field type of a mapped property, named after the DBAL type it maps to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldType {
    BigInt,
    Decimal,
    Float,
    Integer,
    SmallInt,
    Date,
    DateTime,
    DateTimeTz,
    Time,
    DateImmutable,
    DateTimeImmutable,
    DateTimeTzImmutable,
    TimeImmutable,
    String,
    Text,
    Boolean,
    /// Any type the filters have no special handling for.
    Other(String),
}

impl FieldType {
    pub fn as_str(&self) -> &str {
        match self {
            FieldType::BigInt => "bigint",
            FieldType::Decimal => "decimal",
            FieldType::Float => "float",
            FieldType::Integer => "integer",
            FieldType::SmallInt => "smallint",
            FieldType::Date => "date",
            FieldType::DateTime => "datetime",
            FieldType::DateTimeTz => "datetimetz",
            FieldType::Time => "time",
            FieldType::DateImmutable => "date_immutable",
            FieldType::DateTimeImmutable => "datetime_immutable",
            FieldType::DateTimeTzImmutable => "datetimetz_immutable",
            FieldType::TimeImmutable => "time_immutable",
            FieldType::String => "string",
            FieldType::Text => "text",
            FieldType::Boolean => "boolean",
            FieldType::Other(name) => name,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            FieldType::BigInt
                | FieldType::Decimal
                | FieldType::Float
                | FieldType::Integer
                | FieldType::SmallInt
        )
    }

    pub fn is_date(&self) -> bool {
        matches!(
            self,
            FieldType::Date
                | FieldType::DateTime
                | FieldType::DateTimeTz
                | FieldType::Time
                | FieldType::DateImmutable
                | FieldType::DateTimeImmutable
                | FieldType::DateTimeTzImmutable
                | FieldType::TimeImmutable
        )
    }

    pub fn is_immutable(&self) -> bool {
        self.as_str().ends_with("_immutable")
    }
}

impl From<&str> for FieldType {
    fn from(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "bigint" => FieldType::BigInt,
            "decimal" => FieldType::Decimal,
            "float" => FieldType::Float,
            "integer" => FieldType::Integer,
            "smallint" => FieldType::SmallInt,
            "date" => FieldType::Date,
            "datetime" => FieldType::DateTime,
            "datetimetz" => FieldType::DateTimeTz,
            "time" => FieldType::Time,
            "date_immutable" => FieldType::DateImmutable,
            "datetime_immutable" => FieldType::DateTimeImmutable,
            "datetimetz_immutable" => FieldType::DateTimeTzImmutable,
            "time_immutable" => FieldType::TimeImmutable,
            "string" => FieldType::String,
            "text" => FieldType::Text,
            "boolean" => FieldType::Boolean,
            _ => FieldType::Other(name.to_string()),
        }
    }
}

impl From<String> for FieldType {
    fn from(name: String) -> Self {
        FieldType::from(name.as_str())
    }
}

impl From<FieldType> for String {
    fn from(ty: FieldType) -> Self {
        ty.as_str().to_string()
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read-only view of resource metadata.
///
/// Lookups are expected to be in-memory; implementations are shared across
/// concurrent filter passes.
pub trait MetadataProvider: Send + Sync {
    /// Field type of `property` on `resource`, following associations for
    /// nested paths. `None` when the property is not a mapped field.
    fn field_type(&self, resource: &str, property: &str) -> Option<FieldType>;

    fn is_property_mapped(&self, resource: &str, property: &str) -> bool {
        self.field_type(resource, property).is_some()
    }

    /// Whether `property` traverses an association of `resource`.
    fn is_property_nested(&self, resource: &str, property: &str) -> bool;

    /// Every mapped field of `resource` (associations excluded).
    fn field_names(&self, resource: &str) -> Vec<String>;

    /// Register the joins needed to reach a nested property and return the
    /// alias and field the predicate must use.
    fn add_joins_for_nested_property(
        &self,
        property: &str,
        root_alias: &str,
        query: &mut dyn QueryTarget,
        names: &mut dyn QueryNameGenerator,
        resource: &str,
    ) -> Option<(String, String)>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_type_names_round_trip() {
        for name in [
            "bigint",
            "decimal",
            "datetimetz_immutable",
            "time",
            "boolean",
        ] {
            assert_eq!(FieldType::from(name).as_str(), name);
        }
        assert_eq!(FieldType::from("DateTime"), FieldType::DateTime);
        assert_eq!(
            FieldType::from("json"),
            FieldType::Other("json".to_string())
        );
    }

    #[test]
    fn field_kinds() {
        assert!(FieldType::SmallInt.is_numeric());
        assert!(!FieldType::SmallInt.is_date());
        assert!(FieldType::DateTimeImmutable.is_date());
        assert!(FieldType::DateTimeImmutable.is_immutable());
        assert!(!FieldType::String.is_numeric());
        assert!(!FieldType::Other("json".to_string()).is_date());
    }

    #[test]
    fn field_type_deserializes_from_yaml_name() {
        let ty: Result<FieldType, _> = serde_json::from_str("\"date_immutable\"");
        assert_eq!(ty.ok(), Some(FieldType::DateImmutable));
    }
}

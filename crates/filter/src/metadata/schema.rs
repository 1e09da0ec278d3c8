//! Metadata provider backed by a declarative resource schema.

use std::collections::BTreeMap;

use convert_case::{Case, Casing};
use serde::{Deserialize, Serialize};

use super::{FieldType, MetadataProvider};
use crate::error::ConfigError;
use crate::query::{Join, JoinKind, QueryNameGenerator, QueryTarget};

/// Schema of one resource.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceDefinition {
    /// Table name; defaults to the snake_case resource name.
    pub table: Option<String>,

    /// Mapped fields and their types.
    #[serde(default)]
    pub fields: BTreeMap<String, FieldType>,

    /// Associations to other resources.
    #[serde(default)]
    pub associations: BTreeMap<String, AssociationDefinition>,
}

/// A to-one association.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssociationDefinition {
    /// Target resource name.
    pub target: String,

    /// Join column on the owning side (default: `<association>_id`).
    pub local_column: Option<String>,

    /// Referenced column on the target side.
    #[serde(default = "default_foreign_column")]
    pub foreign_column: String,

    #[serde(default)]
    pub join: JoinKind,
}

fn default_foreign_column() -> String {
    "id".to_string()
}

/// In-memory metadata for a set of resources.
#[derive(Debug, Clone, Default)]
pub struct SchemaMetadata {
    resources: BTreeMap<String, ResourceDefinition>,
}

impl SchemaMetadata {
    /// Build the schema, checking that every association targets a known
    /// resource.
    pub fn new(resources: BTreeMap<String, ResourceDefinition>) -> Result<Self, ConfigError> {
        for (name, resource) in &resources {
            for (association, definition) in &resource.associations {
                if !resources.contains_key(&definition.target) {
                    return Err(ConfigError::UnknownAssociationTarget {
                        resource: name.clone(),
                        association: association.clone(),
                        target: definition.target.clone(),
                    });
                }
            }
        }

        Ok(Self { resources })
    }

    pub fn resource(&self, name: &str) -> Option<&ResourceDefinition> {
        self.resources.get(name)
    }

    pub fn resource_names(&self) -> impl Iterator<Item = &str> {
        self.resources.keys().map(String::as_str)
    }

    /// Table backing `resource`.
    pub fn table_for(&self, resource: &str) -> Option<String> {
        let definition = self.resources.get(resource)?;
        Some(
            definition
                .table
                .clone()
                .unwrap_or_else(|| resource.to_case(Case::Snake)),
        )
    }

    /// Walk `property` through associations; returns the resource owning the
    /// leaf and the leaf name.
    fn resolve<'a>(
        &'a self,
        resource: &str,
        property: &'a str,
    ) -> Option<(&'a ResourceDefinition, &'a str)> {
        let mut current = self.resources.get(resource)?;
        let mut segments = property.split('.').peekable();

        while let Some(segment) = segments.next() {
            if segments.peek().is_none() {
                return Some((current, segment));
            }
            let association = current.associations.get(segment)?;
            current = self.resources.get(&association.target)?;
        }

        None
    }
}

impl MetadataProvider for SchemaMetadata {
    fn field_type(&self, resource: &str, property: &str) -> Option<FieldType> {
        let (owner, field) = self.resolve(resource, property)?;
        owner.fields.get(field).cloned()
    }

    fn is_property_nested(&self, resource: &str, property: &str) -> bool {
        let Some((head, _)) = property.split_once('.') else {
            return false;
        };
        self.resources
            .get(resource)
            .is_some_and(|r| r.associations.contains_key(head))
    }

    fn field_names(&self, resource: &str) -> Vec<String> {
        self.resources
            .get(resource)
            .map(|r| r.fields.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn add_joins_for_nested_property(
        &self,
        property: &str,
        root_alias: &str,
        query: &mut dyn QueryTarget,
        names: &mut dyn QueryNameGenerator,
        resource: &str,
    ) -> Option<(String, String)> {
        let (associations, field) = property.rsplit_once('.')?;
        let mut current = self.resources.get(resource)?;
        let mut alias = root_alias.to_string();

        for association in associations.split('.') {
            let definition = current.associations.get(association)?;
            let path = format!("{alias}.{association}");

            alias = match query.find_join(&path) {
                Some(existing) => existing.alias.clone(),
                None => {
                    let join_alias = names.generate_join_alias(association);
                    query.add_join(Join {
                        kind: definition.join,
                        path,
                        alias: join_alias.clone(),
                        parent_alias: alias,
                        table: self.table_for(&definition.target),
                        local_column: definition
                            .local_column
                            .clone()
                            .unwrap_or_else(|| format!("{}_id", association.to_case(Case::Snake))),
                        foreign_column: definition.foreign_column.clone(),
                    });
                    join_alias
                }
            };
            current = self.resources.get(&definition.target)?;
        }

        tracing::debug!(property, alias = %alias, field, "nested property joined");
        Some((alias, field.to_string()))
    }
}

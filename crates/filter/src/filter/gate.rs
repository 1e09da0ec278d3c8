//! Property gate: is a property enabled, mapped and of the expected kind?

use std::collections::BTreeMap;
use std::sync::Arc;

use super::FilterPass;
use super::date::NullManagement;
use crate::metadata::{FieldType, MetadataProvider};
use crate::query::Column;

/// Enabled properties of a filter, with an optional per-property
/// null-management policy (only the date filter reads it).
pub type PropertyMap = BTreeMap<String, Option<NullManagement>>;

/// Kind of field a filter accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Date,
    Numeric,
    /// Any mapped field.
    Any,
}

impl FieldKind {
    fn matches(self, ty: &FieldType) -> bool {
        match self {
            FieldKind::Date => ty.is_date(),
            FieldKind::Numeric => ty.is_numeric(),
            FieldKind::Any => true,
        }
    }
}

#[derive(Clone)]
pub struct PropertyGate {
    metadata: Arc<dyn MetadataProvider>,
    properties: Option<PropertyMap>,
}

impl PropertyGate {
    /// `properties: None` enables every non-nested property.
    pub fn new(metadata: Arc<dyn MetadataProvider>, properties: Option<PropertyMap>) -> Self {
        Self {
            metadata,
            properties,
        }
    }

    pub fn metadata(&self) -> &dyn MetadataProvider {
        self.metadata.as_ref()
    }

    pub fn properties(&self) -> Option<&PropertyMap> {
        self.properties.as_ref()
    }

    pub fn is_property_enabled(&self, resource: &str, property: &str) -> bool {
        match &self.properties {
            // Nested properties must always be listed explicitly.
            None => !self.metadata.is_property_nested(resource, property),
            Some(properties) => properties.contains_key(property),
        }
    }

    pub fn is_property_mapped(&self, resource: &str, property: &str) -> bool {
        self.metadata.is_property_mapped(resource, property)
    }

    pub fn field_type(&self, resource: &str, property: &str) -> Option<FieldType> {
        self.metadata.field_type(resource, property)
    }

    pub fn matches_kind(&self, resource: &str, property: &str, kind: FieldKind) -> bool {
        self.field_type(resource, property)
            .is_some_and(|ty| kind.matches(&ty))
    }

    pub fn is_filterable(&self, resource: &str, property: &str, kind: FieldKind) -> bool {
        self.is_property_enabled(resource, property)
            && self.is_property_mapped(resource, property)
            && self.matches_kind(resource, property, kind)
    }

    /// Configured null-management policy of `property`.
    pub fn null_management(&self, property: &str) -> Option<&NullManagement> {
        self.properties
            .as_ref()
            .and_then(|p| p.get(property))
            .and_then(Option::as_ref)
    }

    /// Properties to describe: the explicit list, or every mapped field.
    pub fn described_properties(&self, resource: &str) -> Vec<String> {
        match &self.properties {
            Some(properties) => properties.keys().cloned().collect(),
            None => self.metadata.field_names(resource),
        }
    }

    /// Column a predicate on `property` must use, registering joins for
    /// nested properties. `None` when the query has no root alias.
    pub fn resolve_column(&self, property: &str, pass: &mut FilterPass<'_>) -> Option<Column> {
        let Some(root_alias) = pass.query.root_alias().map(str::to_string) else {
            tracing::debug!(property, "query has no root alias; filter not applicable");
            return None;
        };

        if self.metadata.is_property_nested(pass.resource, property) {
            let (alias, field) = self.metadata.add_joins_for_nested_property(
                property,
                &root_alias,
                &mut *pass.query,
                &mut *pass.names,
                pass.resource,
            )?;
            return Some(Column::new(alias, field));
        }

        Some(Column::new(root_alias, property))
    }
}

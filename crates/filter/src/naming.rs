//! Property name conversion between the public (request) naming convention
//! and the internal property names of a resource.

use convert_case::{Case, Casing};

/// Converts property names between their internal and public forms.
pub trait NameConverter: Send + Sync {
    /// Internal property name → public parameter name.
    fn normalize(&self, property: &str) -> String;

    /// Public parameter name → internal property name.
    fn denormalize(&self, property: &str) -> String;
}

/// `createdAt` ↔ `created_at`.
#[derive(Debug, Default, Clone, Copy)]
pub struct CamelCaseToSnakeCaseNameConverter;

impl NameConverter for CamelCaseToSnakeCaseNameConverter {
    fn normalize(&self, property: &str) -> String {
        property.to_case(Case::Snake)
    }

    fn denormalize(&self, property: &str) -> String {
        property.to_case(Case::Camel)
    }
}

/// Apply `convert` to every segment of a dot-separated property path.
pub(crate) fn convert_path(property: &str, convert: impl Fn(&str) -> String) -> String {
    property
        .split('.')
        .map(convert)
        .collect::<Vec<_>>()
        .join(".")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camel_case_round_trip() {
        let converter = CamelCaseToSnakeCaseNameConverter;
        assert_eq!(converter.normalize("createdAt"), "created_at");
        assert_eq!(converter.denormalize("created_at"), "createdAt");
        assert_eq!(converter.denormalize("age"), "age");
    }

    #[test]
    fn paths_convert_per_segment() {
        let converter = CamelCaseToSnakeCaseNameConverter;
        let path = convert_path("related_dummy.created_at", |s| converter.denormalize(s));
        assert_eq!(path, "relatedDummy.createdAt");
    }
}

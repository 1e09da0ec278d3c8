//! Date interval filter.
//!
//! `createdAt[after]=2023-01-01&createdAt[strictly_before]=2024-01-01`
//! produces one fragment per valid operator. A per-property null-management
//! policy decides whether rows with a NULL date are kept or dropped.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::normalize::{normalize_date_value, parse_date};
use super::{Capability, FieldKind, Filter, FilterCore, FilterDescription, FilterPass};
use crate::diagnostics::Severity;
use crate::error::InvalidFilterValue;
use crate::metadata::FieldType;
use crate::query::{Column, Comparison, Predicate};

/// How NULL dates are treated by the comparison operators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NullManagement {
    ExcludeNull,
    IncludeNullBefore,
    IncludeNullAfter,
    IncludeNullBeforeAndAfter,
    /// Any other configured value; behaves like `ExcludeNull`.
    Unrecognized(String),
}

impl NullManagement {
    pub fn as_str(&self) -> &str {
        match self {
            NullManagement::ExcludeNull => "exclude_null",
            NullManagement::IncludeNullBefore => "include_null_before",
            NullManagement::IncludeNullAfter => "include_null_after",
            NullManagement::IncludeNullBeforeAndAfter => "include_null_before_and_after",
            NullManagement::Unrecognized(value) => value,
        }
    }

    /// Whether NULL rows are included for `operator`.
    fn includes_null(&self, operator: DateOperator) -> bool {
        match self {
            NullManagement::IncludeNullBefore => operator.is_before(),
            NullManagement::IncludeNullAfter => !operator.is_before(),
            NullManagement::IncludeNullBeforeAndAfter => true,
            NullManagement::ExcludeNull | NullManagement::Unrecognized(_) => false,
        }
    }
}

impl From<String> for NullManagement {
    fn from(value: String) -> Self {
        match value.as_str() {
            "exclude_null" => NullManagement::ExcludeNull,
            "include_null_before" => NullManagement::IncludeNullBefore,
            "include_null_after" => NullManagement::IncludeNullAfter,
            "include_null_before_and_after" => NullManagement::IncludeNullBeforeAndAfter,
            _ => NullManagement::Unrecognized(value),
        }
    }
}

impl From<NullManagement> for String {
    fn from(value: NullManagement) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for NullManagement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Date comparison operators, in the order they are evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateOperator {
    Before,
    StrictlyBefore,
    After,
    StrictlyAfter,
}

impl DateOperator {
    pub const ALL: [DateOperator; 4] = [
        DateOperator::Before,
        DateOperator::StrictlyBefore,
        DateOperator::After,
        DateOperator::StrictlyAfter,
    ];

    /// Query parameter key.
    pub fn key(self) -> &'static str {
        match self {
            DateOperator::Before => "before",
            DateOperator::StrictlyBefore => "strictly_before",
            DateOperator::After => "after",
            DateOperator::StrictlyAfter => "strictly_after",
        }
    }

    pub fn comparison(self) -> Comparison {
        match self {
            DateOperator::Before => Comparison::Lte,
            DateOperator::StrictlyBefore => Comparison::Lt,
            DateOperator::After => Comparison::Gte,
            DateOperator::StrictlyAfter => Comparison::Gt,
        }
    }

    pub fn is_before(self) -> bool {
        matches!(self, DateOperator::Before | DateOperator::StrictlyBefore)
    }
}

/// Filters a collection by date intervals.
pub struct DateFilter {
    core: FilterCore,
}

impl DateFilter {
    pub fn new(core: FilterCore) -> Self {
        Self { core }
    }

    fn add_where(
        &self,
        pass: &mut FilterPass<'_>,
        column: &Column,
        operator: DateOperator,
        value: &Value,
        null_management: Option<&NullManagement>,
        field_type: Option<&FieldType>,
    ) -> Option<Predicate> {
        let raw = match normalize_date_value(value, operator.key()) {
            Ok(raw) => raw,
            Err(e) => {
                self.core.report(Severity::Notice, &e);
                return None;
            }
        };

        let Some(date) = parse_date(raw) else {
            self.core.report(
                Severity::Notice,
                &InvalidFilterValue::InvalidDate {
                    field: column.field.clone(),
                },
            );
            return None;
        };

        let parameter = pass.names.generate_parameter_name(&column.field);
        pass.query
            .set_parameter(&parameter, date.into(), field_type.cloned());

        let base = Predicate::compare(column.clone(), operator.comparison(), parameter);

        let predicate = match null_management {
            None => base,
            Some(NullManagement::ExcludeNull) => {
                Predicate::all([Predicate::IsNotNull(column.clone()), base])
            }
            Some(policy) if policy.includes_null(operator) => {
                Predicate::any([base, Predicate::IsNull(column.clone())])
            }
            Some(_) => Predicate::all([base, Predicate::IsNotNull(column.clone())]),
        };

        Some(predicate)
    }
}

impl Filter for DateFilter {
    fn capability(&self) -> Capability {
        Capability::FragmentGenerating
    }

    fn core(&self) -> &FilterCore {
        &self.core
    }

    fn filter_property(
        &self,
        property: &str,
        value: &Value,
        pass: &mut FilterPass<'_>,
    ) -> Option<Vec<Predicate>> {
        let values = value.as_object()?;
        if !self
            .core
            .gate
            .is_filterable(pass.resource, property, FieldKind::Date)
        {
            return None;
        }

        let column = self.core.gate.resolve_column(property, pass)?;
        let null_management = self.core.gate.null_management(property);
        let field_type = self.core.gate.field_type(pass.resource, property);

        let mut wheres = Vec::new();
        for operator in DateOperator::ALL {
            let Some(raw) = values.get(operator.key()) else {
                continue;
            };
            if raw.is_null() {
                continue;
            }
            if let Some(predicate) = self.add_where(
                pass,
                &column,
                operator,
                raw,
                null_management,
                field_type.as_ref(),
            ) {
                wheres.push(predicate);
            }
        }

        Some(wheres)
    }

    fn description(&self, resource: &str) -> BTreeMap<String, FilterDescription> {
        let mut description = BTreeMap::new();

        for property in self.core.gate.described_properties(resource) {
            if !self
                .core
                .gate
                .is_property_mapped(resource, &property)
                || !self
                    .core
                    .gate
                    .matches_kind(resource, &property, FieldKind::Date)
            {
                continue;
            }

            let name = self.core.normalize_property_name(&property);
            for operator in DateOperator::ALL {
                description.insert(
                    format!("{name}[{}]", operator.key()),
                    FilterDescription::new(&name, "DateTimeInterface"),
                );
            }
        }

        description
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_management_parses_known_and_unknown_values() {
        assert_eq!(
            NullManagement::from("exclude_null".to_string()),
            NullManagement::ExcludeNull
        );
        assert_eq!(
            NullManagement::from("include_null_before_and_after".to_string()),
            NullManagement::IncludeNullBeforeAndAfter
        );
        assert_eq!(
            NullManagement::from("sometimes".to_string()),
            NullManagement::Unrecognized("sometimes".to_string())
        );
    }

    #[test]
    fn include_null_policies_pick_their_side() {
        let before = NullManagement::IncludeNullBefore;
        assert!(before.includes_null(DateOperator::Before));
        assert!(before.includes_null(DateOperator::StrictlyBefore));
        assert!(!before.includes_null(DateOperator::After));

        let after = NullManagement::IncludeNullAfter;
        assert!(after.includes_null(DateOperator::StrictlyAfter));
        assert!(!after.includes_null(DateOperator::Before));

        let both = NullManagement::IncludeNullBeforeAndAfter;
        assert!(
            DateOperator::ALL
                .iter()
                .all(|op| both.includes_null(*op))
        );
        assert!(!NullManagement::Unrecognized("x".to_string()).includes_null(DateOperator::Before));
    }

    #[test]
    fn operators_map_to_comparisons() {
        assert_eq!(DateOperator::Before.comparison(), Comparison::Lte);
        assert_eq!(DateOperator::StrictlyBefore.comparison(), Comparison::Lt);
        assert_eq!(DateOperator::After.comparison(), Comparison::Gte);
        assert_eq!(DateOperator::StrictlyAfter.comparison(), Comparison::Gt);
    }
}

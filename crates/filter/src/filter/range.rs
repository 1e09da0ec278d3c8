//! Range filter.
//!
//! `price[between]=10..20`, `price[gt]=10`, `price[lte]=99.5`. Each operator
//! contributes at most one fragment; unknown operators are ignored.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde_json::{Map, Value};

use super::normalize::{normalize_between, normalize_range_value};
use super::{Capability, FieldKind, Filter, FilterCore, FilterDescription, FilterPass};
use crate::diagnostics::Severity;
use crate::error::InvalidFilterValue;
use crate::query::{Column, Comparison, Predicate};

/// Range operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeOperator {
    Between,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
}

impl RangeOperator {
    pub const ALL: [RangeOperator; 5] = [
        RangeOperator::Between,
        RangeOperator::GreaterThan,
        RangeOperator::GreaterThanOrEqual,
        RangeOperator::LessThan,
        RangeOperator::LessThanOrEqual,
    ];

    /// Query parameter key.
    pub fn key(self) -> &'static str {
        match self {
            RangeOperator::Between => "between",
            RangeOperator::GreaterThan => "gt",
            RangeOperator::GreaterThanOrEqual => "gte",
            RangeOperator::LessThan => "lt",
            RangeOperator::LessThanOrEqual => "lte",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.key() == key)
    }

    /// Comparison for single-bound operators; `None` for `between`.
    fn comparison(self) -> Option<Comparison> {
        match self {
            RangeOperator::Between => None,
            RangeOperator::GreaterThan => Some(Comparison::Gt),
            RangeOperator::GreaterThanOrEqual => Some(Comparison::Gte),
            RangeOperator::LessThan => Some(Comparison::Lt),
            RangeOperator::LessThanOrEqual => Some(Comparison::Lte),
        }
    }
}

/// Filters a collection by numeric ranges.
pub struct RangeFilter {
    core: FilterCore,
}

impl RangeFilter {
    pub fn new(core: FilterCore) -> Self {
        Self { core }
    }

    /// Keep the supported operators, in the order the client sent them.
    fn normalize_operators<'v>(
        &self,
        values: &'v Map<String, Value>,
        property: &str,
    ) -> Option<Vec<(RangeOperator, &'v Value)>> {
        let operators: Vec<_> = values
            .iter()
            .filter_map(|(key, value)| RangeOperator::from_key(key).map(|op| (op, value)))
            .collect();

        if operators.is_empty() {
            let keys: Vec<&str> = RangeOperator::ALL.iter().map(|op| op.key()).collect();
            self.core.report(
                Severity::Notice,
                &InvalidFilterValue::NoOperator {
                    property: property.to_string(),
                    operators: keys.join("\", \""),
                },
            );
            return None;
        }

        Some(operators)
    }

    fn add_where(
        &self,
        pass: &mut FilterPass<'_>,
        column: &Column,
        operator: RangeOperator,
        value: &Value,
    ) -> Option<Predicate> {
        let Some(comparison) = operator.comparison() else {
            return self.add_between(pass, column, value);
        };

        let number = match normalize_range_value(value, operator.key()) {
            Ok(number) => number,
            Err(e) => {
                self.core.report(Severity::Notice, &e);
                return None;
            }
        };

        let parameter = pass.names.generate_parameter_name(&column.field);
        pass.query.set_parameter(&parameter, number.into(), None);
        Some(Predicate::compare(column.clone(), comparison, parameter))
    }

    fn add_between(
        &self,
        pass: &mut FilterPass<'_>,
        column: &Column,
        value: &Value,
    ) -> Option<Predicate> {
        let (low, high) = match normalize_between(value, RangeOperator::Between.key()) {
            Ok(bounds) => bounds,
            Err(e) => {
                self.core.report(Severity::Notice, &e);
                return None;
            }
        };

        let parameter = pass.names.generate_parameter_name(&column.field);

        if low.compare(high) == Some(Ordering::Equal) {
            pass.query.set_parameter(&parameter, low.into(), None);
            return Some(Predicate::compare(column.clone(), Comparison::Eq, parameter));
        }

        let low_name = format!("{parameter}_1");
        let high_name = format!("{parameter}_2");
        pass.query.set_parameter(&low_name, low.into(), None);
        pass.query.set_parameter(&high_name, high.into(), None);

        Some(Predicate::Between {
            column: column.clone(),
            low: low_name,
            high: high_name,
        })
    }
}

impl Filter for RangeFilter {
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
            .is_filterable(pass.resource, property, FieldKind::Any)
        {
            return None;
        }

        let operators = self.normalize_operators(values, property)?;
        let column = self.core.gate.resolve_column(property, pass)?;

        let wheres = operators
            .into_iter()
            .filter_map(|(operator, value)| self.add_where(pass, &column, operator, value))
            .collect();

        Some(wheres)
    }

    fn description(&self, resource: &str) -> BTreeMap<String, FilterDescription> {
        let mut description = BTreeMap::new();

        for property in self.core.gate.described_properties(resource) {
            if !self.core.gate.is_property_mapped(resource, &property) {
                continue;
            }

            let name = self.core.normalize_property_name(&property);
            for operator in RangeOperator::ALL {
                description.insert(
                    format!("{name}[{}]", operator.key()),
                    FilterDescription::new(&name, "string"),
                );
            }
        }

        description
    }
}

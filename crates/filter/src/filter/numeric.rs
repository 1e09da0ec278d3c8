//! Numeric equality / membership filter.
//!
//! `age=30` matches by equality, `age[]=30&age[]=31` by membership. If any
//! value is not numeric the whole property is ignored.

use std::collections::BTreeMap;

use serde_json::Value;

use super::normalize::normalize_numeric_values;
use super::{Capability, FieldKind, Filter, FilterCore, FilterDescription, FilterPass};
use crate::diagnostics::Severity;
use crate::metadata::FieldType;
use crate::query::{Comparison, ParameterValue, Predicate};

/// Filters a collection by equality of numeric properties.
pub struct NumericFilter {
    core: FilterCore,
}

impl NumericFilter {
    pub fn new(core: FilterCore) -> Self {
        Self { core }
    }
}

/// Value type advertised in descriptions for a numeric field type.
fn described_type(ty: Option<&FieldType>) -> &'static str {
    match ty {
        None | Some(FieldType::Decimal) => "string",
        Some(FieldType::Float) => "float",
        Some(_) => "int",
    }
}

impl Filter for NumericFilter {
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
        if !self
            .core
            .gate
            .is_filterable(pass.resource, property, FieldKind::Numeric)
        {
            return None;
        }

        let values = match normalize_numeric_values(value, property) {
            Ok(values) => values,
            Err(e) => {
                self.core.report(Severity::Notice, &e);
                return None;
            }
        };

        let column = self.core.gate.resolve_column(property, pass)?;
        let field_type = self.core.gate.field_type(pass.resource, property);
        let parameter = pass.names.generate_parameter_name(&column.field);

        let predicate = if let [single] = values.as_slice() {
            pass.query.set_parameter(
                &parameter,
                single.coerce(field_type.as_ref()),
                field_type.clone(),
            );
            Predicate::compare(column, Comparison::Eq, parameter)
        } else {
            let list = values
                .iter()
                .map(|n| n.coerce(field_type.as_ref()))
                .collect();
            pass.query
                .set_parameter(&parameter, ParameterValue::List(list), None);
            Predicate::In { column, parameter }
        };

        Some(vec![predicate])
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
                    .matches_kind(resource, &property, FieldKind::Numeric)
            {
                continue;
            }

            let ty = self.core.gate.field_type(resource, &property);
            let value_type = described_type(ty.as_ref());
            let name = self.core.normalize_property_name(&property);

            description.insert(name.clone(), FilterDescription::new(&name, value_type));
            description.insert(
                format!("{name}[]"),
                FilterDescription::new(&name, value_type).collection(),
            );
        }

        description
    }
}

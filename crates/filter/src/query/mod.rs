//! Query target abstraction.
//!
//! Filters never build SQL themselves. They register named parameters and
//! joins on a [`QueryTarget`] and return [`Predicate`] fragments that the
//! caller combines. [`QueryBuilder`] is the in-memory target; it renders a
//! DQL-style text form and, through SeaQuery, real SQL.

mod builder;
mod names;
mod render;

pub use builder::QueryBuilder;
pub use names::{DefaultQueryNameGenerator, QueryNameGenerator};

use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::metadata::FieldType;

/// A field reached through a query alias (`o.createdAt`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Column {
    pub alias: String,
    pub field: String,
}

impl Column {
    pub fn new(alias: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            field: field.into(),
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.alias, self.field)
    }
}

/// Binary comparison operators used by the filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Comparison {
    Eq,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl Comparison {
    pub fn as_str(self) -> &'static str {
        match self {
            Comparison::Eq => "=",
            Comparison::Lt => "<",
            Comparison::Lte => "<=",
            Comparison::Gt => ">",
            Comparison::Gte => ">=",
        }
    }
}

/// A self-contained boolean predicate over named parameters.
///
/// Compound predicates always render parenthesized, so any fragment can be
/// AND-ed or OR-ed with any other without changing its meaning.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Predicate {
    /// `column <op> :parameter`
    Compare {
        column: Column,
        op: Comparison,
        parameter: String,
    },
    /// `column IN (:parameter)` where the parameter holds a list.
    In { column: Column, parameter: String },
    /// `column BETWEEN :low AND :high`
    Between {
        column: Column,
        low: String,
        high: String,
    },
    IsNull(Column),
    IsNotNull(Column),
    /// Conjunction.
    All(Vec<Predicate>),
    /// Disjunction.
    Any(Vec<Predicate>),
}

impl Predicate {
    pub fn compare(column: Column, op: Comparison, parameter: impl Into<String>) -> Self {
        Predicate::Compare {
            column,
            op,
            parameter: parameter.into(),
        }
    }

    pub fn all(parts: impl IntoIterator<Item = Predicate>) -> Self {
        Predicate::All(parts.into_iter().collect())
    }

    pub fn any(parts: impl IntoIterator<Item = Predicate>) -> Self {
        Predicate::Any(parts.into_iter().collect())
    }

    /// Names of every parameter this predicate references.
    pub fn parameter_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_parameter_names(&mut names);
        names
    }

    fn collect_parameter_names<'a>(&'a self, names: &mut Vec<&'a str>) {
        match self {
            Predicate::Compare { parameter, .. } | Predicate::In { parameter, .. } => {
                names.push(parameter);
            }
            Predicate::Between { low, high, .. } => {
                names.push(low);
                names.push(high);
            }
            Predicate::IsNull(_) | Predicate::IsNotNull(_) => {}
            Predicate::All(parts) | Predicate::Any(parts) => {
                for part in parts {
                    part.collect_parameter_names(names);
                }
            }
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Compare {
                column,
                op,
                parameter,
            } => write!(f, "{column} {} :{parameter}", op.as_str()),
            Predicate::In { column, parameter } => write!(f, "{column} IN (:{parameter})"),
            Predicate::Between { column, low, high } => {
                write!(f, "{column} BETWEEN :{low} AND :{high}")
            }
            Predicate::IsNull(column) => write!(f, "{column} IS NULL"),
            Predicate::IsNotNull(column) => write!(f, "{column} IS NOT NULL"),
            Predicate::All(parts) => write_composite(f, parts, " AND ", "1 = 1"),
            Predicate::Any(parts) => write_composite(f, parts, " OR ", "1 = 0"),
        }
    }
}

fn write_composite(
    f: &mut fmt::Formatter<'_>,
    parts: &[Predicate],
    separator: &str,
    empty: &str,
) -> fmt::Result {
    match parts {
        [] => f.write_str(empty),
        [single] => write!(f, "{single}"),
        _ => {
            let rendered: Vec<String> = parts.iter().map(ToString::to_string).collect();
            write!(f, "({})", rendered.join(separator))
        }
    }
}

/// A value bound to a named parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParameterValue {
    Int(i64),
    Float(f64),
    /// Text, including decimals kept as strings to avoid precision loss.
    Text(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    DateTimeTz(DateTime<FixedOffset>),
    Time(NaiveTime),
    List(Vec<ParameterValue>),
}

/// A named parameter registered on a query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Parameter {
    pub name: String,
    pub value: ParameterValue,
    /// Binding type hint, usually the field type of the filtered property.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub ty: Option<FieldType>,
}

/// Join type for association joins.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinKind {
    #[default]
    Left,
    Inner,
}

/// An association join registered for a nested property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Join {
    pub kind: JoinKind,
    /// Association path relative to the parent alias (`o.relatedDummy`).
    pub path: String,
    /// Alias of the joined side.
    pub alias: String,
    pub parent_alias: String,
    /// Table of the joined resource, when known.
    pub table: Option<String>,
    /// Column on the parent side of the join condition.
    pub local_column: String,
    /// Column on the joined side of the join condition.
    pub foreign_column: String,
}

/// A mutable query under construction.
///
/// A target is owned by a single filter pass; callers serialize access.
pub trait QueryTarget {
    /// Alias of the root entity, if the query has one.
    fn root_alias(&self) -> Option<&str>;

    /// Register a parameter; registering an existing name replaces it.
    fn set_parameter(&mut self, name: &str, value: ParameterValue, ty: Option<FieldType>);

    /// Conjoin a predicate into the WHERE clause.
    fn and_where(&mut self, predicate: Predicate);

    /// Find a previously registered join by association path.
    fn find_join(&self, path: &str) -> Option<&Join>;

    fn add_join(&mut self, join: Join);
}

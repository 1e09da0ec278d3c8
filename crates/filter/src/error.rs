//! Error types.
//!
//! `InvalidFilterValue` never escapes a filter pass: it is handed to the
//! diagnostic sink and the offending sub-clause is dropped. The other errors
//! belong to rendering and configuration, which run outside a pass.

use thiserror::Error;

/// A filter value supplied by the client that could not be used.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidFilterValue {
    #[error("invalid value for \"[{operator}]\", expected string")]
    ExpectedString { operator: String },

    #[error(
        "the field \"{field}\" has a wrong date format, use an ISO 8601 date or date-time"
    )]
    InvalidDate { field: String },

    #[error("invalid numeric value for \"{property}\" property")]
    InvalidNumeric { property: String },

    #[error(
        "at least one value is required, multiple values should be in \"{property}[]=firstvalue&{property}[]=secondvalue\" format"
    )]
    MissingValue { property: String },

    #[error("invalid value for \"[{operator}]\", expected number")]
    ExpectedNumber { operator: String },

    #[error("invalid format for \"[{operator}]\", expected \"<min>..<max>\"")]
    RangeFormat { operator: String },

    #[error("invalid values for \"[{operator}]\" range, expected numbers")]
    RangeValues { operator: String },

    #[error("invalid values for \"[{operator}]\" range, expected <min> to not exceed <max>")]
    RangeOrder { operator: String },

    #[error("at least one valid operator (\"{operators}\") is required for \"{property}\" property")]
    NoOperator { property: String, operators: String },
}

/// Errors raised while rendering a built query to SQL.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("parameter \":{0}\" is referenced by a predicate but was never bound")]
    UnboundParameter(String),

    #[error("parameter \":{0}\" holds a list and can only be used in an IN predicate")]
    UnexpectedList(String),

    #[error("join \"{0}\" has no table mapping")]
    UnmappedJoin(String),
}

/// Errors raised while building filters from a definition file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("filter \"{filter}\" targets unknown resource \"{resource}\"")]
    UnknownResource { filter: String, resource: String },

    #[error("association \"{association}\" of \"{resource}\" targets unknown resource \"{target}\"")]
    UnknownAssociationTarget {
        resource: String,
        association: String,
        target: String,
    },

    #[error("invalid filter name \"{0}\" (must be alphanumeric/underscore/dot/hyphen)")]
    InvalidFilterName(String),
}

//! Sieve: composable request filters for query builders.
//!
//! Filters turn client-supplied values (`createdAt[after]=2023-01-01`,
//! `age[]=30`, `price[between]=10..20`) into parameterized WHERE fragments
//! on a [`query::QueryTarget`]. Invalid input never fails a request: it is
//! reported to a [`diagnostics::DiagnosticSink`] and the offending sub-clause
//! is dropped.
//!
//! Each filter runs in one of two modes, picked from the shape of the
//! [`filter::ApplyContext`]:
//! - legacy: values come from the request parameters and every fragment is
//!   conjoined into the query;
//! - composable: values come from a structured mapping and fragments are
//!   returned for the caller to combine.

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod filter;
pub mod metadata;
pub mod naming;
pub mod query;
pub mod registry;
pub mod request;

pub use error::{ConfigError, InvalidFilterValue, RenderError};
pub use filter::{ApplyContext, Filter, FilterPass};
pub use registry::FilterRegistry;
pub use request::RequestParameters;

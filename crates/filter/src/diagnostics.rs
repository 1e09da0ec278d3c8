//! Diagnostic sink for silently dropped filter input.

use crate::error::InvalidFilterValue;

/// Severity attached to a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Client input was ignored; the request still succeeds.
    Notice,
    /// Something the operator should look at.
    Warning,
}

/// Receives diagnostics about filter input that was ignored.
///
/// Implementations must not block and must not fail.
pub trait DiagnosticSink: Send + Sync {
    fn report(&self, severity: Severity, error: &InvalidFilterValue);
}

/// Default sink: forwards every diagnostic to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&self, severity: Severity, error: &InvalidFilterValue) {
        match severity {
            Severity::Notice => {
                tracing::info!(target: "sieve::filter", error = %error, "invalid filter ignored");
            }
            Severity::Warning => {
                tracing::warn!(target: "sieve::filter", error = %error, "invalid filter ignored");
            }
        }
    }
}

//! Request guard pipeline.
//!
//! Composes the threat scanner and the schema validator into one gate in
//! front of a route handler:
//!
//! ```text
//! Incoming request:
//!     → traversal ceilings (413 on breach)
//!     → threat scan of body/query/params/headers (403 on match)
//!     → schema steps in configured order, fail-fast (4xx on failure)
//!     → canonicalized targets replace the raw ones
//!     → handler
//! ```
//!
//! Per request the progression is linear and terminal on first failure:
//!
//! ```text
//! Received → ThreatScanned → SchemaValidated → HandlerInvoked
//!     \____________ any failing check ____________→ Rejected
//! ```
//!
//! Every pipeline invocation is stateless and independent; the only shared
//! state is the compiled schema set and detector patterns, both immutable
//! after startup. Validation is synchronous and idempotent: re-running on
//! the same raw input yields the same outcome, and handlers never
//! re-validate a canonicalized value.

mod respond;
mod step;
mod target;

pub use respond::{ErrorHandler, GuardRejection};
pub use step::{GuardPlan, ValidationOptions, ValidationStep};
pub use target::{RequestParts, ValidationTarget};

/// Linear per-request progression, used for tracing and event metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Request entered the pipeline
    Received,
    /// Threat scan passed
    ThreatScanned,
    /// All schema steps passed
    SchemaValidated,
    /// Control handed to the route handler
    HandlerInvoked,
    /// Terminal: a check failed
    Rejected,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Phase::Received => "received",
            Phase::ThreatScanned => "threat-scanned",
            Phase::SchemaValidated => "schema-validated",
            Phase::HandlerInvoked => "handler-invoked",
            Phase::Rejected => "rejected",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_names() {
        assert_eq!(Phase::Received.to_string(), "received");
        assert_eq!(Phase::SchemaValidated.to_string(), "schema-validated");
        assert_eq!(Phase::Rejected.to_string(), "rejected");
    }
}

//! Rejection outcomes and the HTTP error envelope.
//!
//! Every rejection maps to the stable envelope
//! `{"success": false, "message": ..., "errors"?: [...]}`:
//!
//! | Outcome            | Status                      |
//! |--------------------|-----------------------------|
//! | Schema failure     | per-route option, default 400 |
//! | Threat finding     | 403, fixed                  |
//! | Over-limit payload | 413                         |
//! | Internal error     | 500, generic message only   |

use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use super::target::ValidationTarget;
use crate::events::{SecurityEvent, Severity};
use crate::scan::{LimitBreach, ThreatCategory, ThreatFinding};
use crate::validate::ValidationError;

/// Custom responder for schema failures
pub type ErrorHandler = Arc<dyn Fn(&[ValidationError]) -> Response + Send + Sync>;

/// A terminal pipeline outcome for a rejected request.
pub enum GuardRejection {
    /// Payload exceeded the traversal ceilings
    PayloadLimit(LimitBreach),
    /// A detector matched
    Threat(ThreatFinding),
    /// Schema validation failed
    Schema {
        /// Target that failed
        target: ValidationTarget,
        /// Status from the route options
        status: StatusCode,
        /// Every violated field, in order
        errors: Vec<ValidationError>,
        /// Route-supplied responder, if any
        handler: Option<ErrorHandler>,
    },
    /// Unexpected internal failure; the client learns nothing beyond 500
    Internal,
}

impl std::fmt::Debug for GuardRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GuardRejection::PayloadLimit(breach) => {
                f.debug_tuple("PayloadLimit").field(breach).finish()
            },
            GuardRejection::Threat(finding) => f.debug_tuple("Threat").field(finding).finish(),
            GuardRejection::Schema {
                target,
                status,
                errors,
                handler,
            } => f
                .debug_struct("Schema")
                .field("target", target)
                .field("status", status)
                .field("errors", errors)
                .field("handler", &handler.is_some())
                .finish(),
            GuardRejection::Internal => f.write_str("Internal"),
        }
    }
}

impl GuardRejection {
    /// Status this rejection responds with.
    ///
    /// Threat rejections are always 403 regardless of route options;
    /// security outcomes are not weakenable by configuration.
    pub fn status(&self) -> StatusCode {
        match self {
            GuardRejection::PayloadLimit(_) => StatusCode::PAYLOAD_TOO_LARGE,
            GuardRejection::Threat(_) => StatusCode::FORBIDDEN,
            GuardRejection::Schema { status, .. } => *status,
            GuardRejection::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Build the audit event for this rejection, if one is warranted.
    pub fn to_event(&self, source_ip: Option<&str>) -> Option<SecurityEvent> {
        let event = match self {
            GuardRejection::PayloadLimit(breach) => SecurityEvent::new(
                "payload-limit",
                Severity::High,
                format!("request rejected: {breach}"),
            ),
            GuardRejection::Threat(finding) => SecurityEvent::new(
                finding.category.as_str(),
                threat_severity(finding.category),
                format!("request blocked: {}", finding.note),
            )
            .with_metadata(json!({"target": finding.target})),
            GuardRejection::Schema { target, errors, .. } => SecurityEvent::new(
                "schema-validation",
                Severity::Medium,
                format!("request rejected: {} invalid field(s)", errors.len()),
            )
            .with_metadata(json!({
                "target": target,
                "fields": errors.iter().map(|e| e.path.to_string()).collect::<Vec<_>>(),
            })),
            // Internal errors are logged, not audited
            GuardRejection::Internal => return None,
        };

        Some(match source_ip {
            Some(ip) => event.with_source_ip(ip),
            None => event,
        })
    }
}

fn threat_severity(category: ThreatCategory) -> Severity {
    match category {
        ThreatCategory::SqlInjection
        | ThreatCategory::Xss
        | ThreatCategory::NoSqlInjection
        | ThreatCategory::PrototypePollution => Severity::High,
        ThreatCategory::HeaderInjection => Severity::Medium,
    }
}

impl IntoResponse for GuardRejection {
    fn into_response(self) -> Response {
        match self {
            GuardRejection::PayloadLimit(breach) => (
                StatusCode::PAYLOAD_TOO_LARGE,
                Json(json!({
                    "success": false,
                    "message": format!("Request rejected: {breach}"),
                })),
            )
                .into_response(),
            GuardRejection::Threat(finding) => (
                StatusCode::FORBIDDEN,
                Json(json!({
                    "success": false,
                    "message": format!("Request blocked: suspected {}", finding.category),
                    "category": finding.category,
                })),
            )
                .into_response(),
            GuardRejection::Schema {
                status,
                errors,
                handler,
                ..
            } => {
                if let Some(handler) = handler {
                    return handler(&errors);
                }
                (
                    status,
                    Json(json!({
                        "success": false,
                        "message": "Request validation failed",
                        "errors": errors,
                    })),
                )
                    .into_response()
            },
            GuardRejection::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "success": false,
                    "message": "Internal server error",
                })),
            )
                .into_response(),
        }
    }
}

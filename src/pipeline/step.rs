//! Validation steps and the multi-target plan.

use std::collections::HashMap;
use std::sync::Arc;

use axum::http::StatusCode;

use super::respond::{ErrorHandler, GuardRejection};
use super::target::{RequestParts, ValidationTarget};
use super::Phase;
use crate::scan::ThreatScanner;
use crate::schema::Schema;
use crate::validate::{validate, Mode};

/// Per-step validation options.
///
/// `strict_mode` and `allow_unknown_fields` describe mutually exclusive
/// semantics; when both are set, strict wins, so exactly one mode ever
/// applies to a validation call.
#[derive(Clone, Default)]
pub struct ValidationOptions {
    /// Reject any undeclared field
    pub strict_mode: bool,
    /// Preserve undeclared fields unvalidated (the default behavior; made
    /// explicit here so callers can state their intent)
    pub allow_unknown_fields: bool,
    /// Status for schema failures; `None` means 400
    pub error_status: Option<StatusCode>,
    /// Message overrides keyed by field path (e.g. `"address.city"`)
    pub custom_messages: HashMap<String, String>,
    /// Full custom responder for schema failures. Never consulted for
    /// threat rejections, whose 403 is not weakenable per route.
    pub error_handler: Option<ErrorHandler>,
}

impl ValidationOptions {
    /// Default options: passthrough mode, status 400
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable strict mode
    pub fn with_strict_mode(mut self) -> Self {
        self.strict_mode = true;
        self
    }

    /// State passthrough explicitly
    pub fn with_allow_unknown_fields(mut self) -> Self {
        self.allow_unknown_fields = true;
        self
    }

    /// Status returned on schema failure
    pub fn with_error_status(mut self, status: StatusCode) -> Self {
        self.error_status = Some(status);
        self
    }

    /// Override the message for one field path
    pub fn with_message(mut self, path: impl Into<String>, message: impl Into<String>) -> Self {
        self.custom_messages.insert(path.into(), message.into());
        self
    }

    /// Install a custom responder for schema failures
    pub fn with_error_handler(mut self, handler: ErrorHandler) -> Self {
        self.error_handler = Some(handler);
        self
    }

    /// The single effective mode (strict wins over allow-unknown)
    pub fn mode(&self) -> Mode {
        if self.strict_mode {
            Mode::Strict
        } else {
            Mode::Passthrough
        }
    }

    /// Effective schema-failure status
    pub fn status(&self) -> StatusCode {
        self.error_status.unwrap_or(StatusCode::BAD_REQUEST)
    }
}

impl std::fmt::Debug for ValidationOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidationOptions")
            .field("strict_mode", &self.strict_mode)
            .field("allow_unknown_fields", &self.allow_unknown_fields)
            .field("error_status", &self.error_status)
            .field("custom_messages", &self.custom_messages)
            .field("error_handler", &self.error_handler.is_some())
            .finish()
    }
}

/// One single-target validation step: schema + target + options.
#[derive(Debug, Clone)]
pub struct ValidationStep {
    target: ValidationTarget,
    schema: Arc<Schema>,
    options: ValidationOptions,
}

impl ValidationStep {
    /// Build a step with default options
    pub fn new(target: ValidationTarget, schema: Arc<Schema>) -> Self {
        Self {
            target,
            schema,
            options: ValidationOptions::default(),
        }
    }

    /// Replace the options
    pub fn with_options(mut self, options: ValidationOptions) -> Self {
        self.options = options;
        self
    }

    /// Target this step reads and replaces
    pub fn target(&self) -> ValidationTarget {
        self.target
    }

    /// Validate the step's target in place.
    ///
    /// On success the canonicalized value replaces the raw target; on
    /// failure the full error list is returned, never swallowed.
    pub(crate) fn run(&self, parts: &mut RequestParts) -> Result<(), GuardRejection> {
        match validate(&self.schema, parts.get(self.target), self.options.mode()) {
            Ok(canonical) => {
                parts.set(self.target, canonical);
                Ok(())
            },
            Err(mut errors) => {
                for error in &mut errors {
                    if let Some(message) = self.options.custom_messages.get(&error.path.to_string())
                    {
                        error.message = message.clone();
                    }
                }
                Err(GuardRejection::Schema {
                    target: self.target,
                    status: self.options.status(),
                    errors,
                    handler: self.options.error_handler.clone(),
                })
            },
        }
    }
}

/// Ordered composition of validation steps for one route.
///
/// Steps run sequentially with fail-fast short-circuit: the first failing
/// step aborts the chain, later steps never run, and no mutation from an
/// unexecuted step is ever applied.
#[derive(Debug, Clone, Default)]
pub struct GuardPlan {
    steps: Vec<ValidationStep>,
}

impl GuardPlan {
    /// Empty plan (threat scan only)
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a step
    pub fn step(mut self, step: ValidationStep) -> Self {
        self.steps.push(step);
        self
    }

    /// Configured steps in execution order
    pub fn steps(&self) -> &[ValidationStep] {
        &self.steps
    }

    /// Run the schema steps only (no threat scan), fail-fast.
    pub fn run(&self, parts: &mut RequestParts) -> Result<(), GuardRejection> {
        for step in &self.steps {
            step.run(parts)?;
        }
        Ok(())
    }

    /// Run the full pipeline: traversal ceilings and threat scan first,
    /// then the schema steps. Returns the first rejection encountered.
    pub fn inspect(
        &self,
        scanner: &ThreatScanner,
        parts: &mut RequestParts,
    ) -> Result<(), GuardRejection> {
        match scanner.scan(parts) {
            Err(breach) => {
                tracing::debug!(phase = %Phase::Rejected, %breach, "payload over limits");
                return Err(GuardRejection::PayloadLimit(breach));
            },
            Ok(Some(finding)) => {
                tracing::debug!(
                    phase = %Phase::Rejected,
                    category = %finding.category,
                    target = %finding.target,
                    "threat detected"
                );
                return Err(GuardRejection::Threat(finding));
            },
            Ok(None) => {
                tracing::trace!(phase = %Phase::ThreatScanned, "no threat found");
            },
        }

        self.run(parts).map_err(|rejection| {
            tracing::debug!(phase = %Phase::Rejected, "schema validation failed");
            rejection
        })?;

        tracing::trace!(phase = %Phase::SchemaValidated, "request canonicalized");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldSpec;
    use serde_json::json;

    fn title_schema() -> Arc<Schema> {
        Arc::new(
            Schema::builder()
                .field("title", FieldSpec::string().required().min_len(1))
                .build()
                .unwrap(),
        )
    }

    fn page_schema() -> Arc<Schema> {
        Arc::new(
            Schema::builder()
                .field("page", FieldSpec::integer().coerce().default_value(json!(1)))
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn test_strict_wins_over_allow_unknown() {
        let options = ValidationOptions::new()
            .with_strict_mode()
            .with_allow_unknown_fields();
        assert_eq!(options.mode(), Mode::Strict);
    }

    #[test]
    fn test_default_mode_is_passthrough() {
        assert_eq!(ValidationOptions::new().mode(), Mode::Passthrough);
        assert_eq!(ValidationOptions::new().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_error_status_override() {
        let step = ValidationStep::new(ValidationTarget::Body, title_schema()).with_options(
            ValidationOptions::new().with_error_status(StatusCode::UNPROCESSABLE_ENTITY),
        );
        let mut parts = RequestParts::new();
        parts.set_body(json!({}));

        match step.run(&mut parts) {
            Err(GuardRejection::Schema { status, .. }) => {
                assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
            },
            other => panic!("expected schema rejection, got {other:?}"),
        }
    }

    #[test]
    fn test_step_replaces_target_on_success() {
        let step = ValidationStep::new(ValidationTarget::Query, page_schema());
        let mut parts = RequestParts::new();
        parts.set_query(json!({"page": "4"}));

        step.run(&mut parts).unwrap();
        assert_eq!(parts.query(), &json!({"page": 4}));
    }

    #[test]
    fn test_step_failure_carries_all_errors() {
        let schema = Arc::new(
            Schema::builder()
                .field("a", FieldSpec::string().required())
                .field("b", FieldSpec::integer().required())
                .build()
                .unwrap(),
        );
        let step = ValidationStep::new(ValidationTarget::Body, schema);
        let mut parts = RequestParts::new();
        parts.set_body(json!({}));

        match step.run(&mut parts) {
            Err(GuardRejection::Schema { errors, status, .. }) => {
                assert_eq!(errors.len(), 2);
                assert_eq!(status, StatusCode::BAD_REQUEST);
            },
            other => panic!("expected schema rejection, got {other:?}"),
        }
    }

    #[test]
    fn test_custom_message_applied() {
        let step = ValidationStep::new(ValidationTarget::Body, title_schema()).with_options(
            ValidationOptions::new().with_message("title", "give it a name"),
        );
        let mut parts = RequestParts::new();
        parts.set_body(json!({}));

        match step.run(&mut parts) {
            Err(GuardRejection::Schema { errors, .. }) => {
                assert_eq!(errors[0].message, "give it a name");
            },
            other => panic!("expected schema rejection, got {other:?}"),
        }
    }

    #[test]
    fn test_plan_fail_fast_skips_later_steps() {
        let plan = GuardPlan::new()
            .step(ValidationStep::new(ValidationTarget::Body, title_schema()))
            .step(ValidationStep::new(ValidationTarget::Query, page_schema()));

        let mut parts = RequestParts::new();
        parts.set_body(json!({"title": ""})); // fails min_len
        parts.set_query(json!({"page": "2"}));

        let rejection = plan.run(&mut parts).unwrap_err();
        assert!(matches!(rejection, GuardRejection::Schema { target, .. }
            if target == ValidationTarget::Body));

        // The query step never ran: its coercion was not applied
        assert_eq!(parts.query(), &json!({"page": "2"}));
    }

    #[test]
    fn test_plan_runs_all_steps_in_order() {
        let plan = GuardPlan::new()
            .step(ValidationStep::new(ValidationTarget::Body, title_schema()))
            .step(ValidationStep::new(ValidationTarget::Query, page_schema()));

        let mut parts = RequestParts::new();
        parts.set_body(json!({"title": "ok"}));
        parts.set_query(json!({}));

        plan.run(&mut parts).unwrap();
        assert_eq!(parts.query(), &json!({"page": 1}));
    }

    #[test]
    fn test_inspect_threat_preempts_schema() {
        let scanner = ThreatScanner::new();
        let plan =
            GuardPlan::new().step(ValidationStep::new(ValidationTarget::Body, title_schema()));

        // Body fails the schema too, but the threat scan runs first
        let mut parts = RequestParts::new();
        parts.set_body(json!({"payload": "' OR 1=1--"}));

        let rejection = plan.inspect(&scanner, &mut parts).unwrap_err();
        assert!(matches!(rejection, GuardRejection::Threat(_)));
    }

    #[test]
    fn test_inspect_clean_request_passes() {
        let scanner = ThreatScanner::new();
        let plan =
            GuardPlan::new().step(ValidationStep::new(ValidationTarget::Body, title_schema()));

        let mut parts = RequestParts::new();
        parts.set_body(json!({"title": "clean"}));

        plan.inspect(&scanner, &mut parts).unwrap();
    }
}

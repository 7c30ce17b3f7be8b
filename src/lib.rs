//! # Reqguard - Request Validation & Threat Detection
//!
//! Schema-driven input validation composed with structural threat scanning,
//! packaged as middleware that guards JSON API endpoints. A defense-in-depth
//! gate: it rejects obviously hostile or malformed requests before handlers
//! run, and hands handlers canonicalized, typed input when they do.
//!
//! ## Pipeline
//!
//! ```text
//! Client                 Guard pipeline                    Handler
//!    |                        |                               |
//!    |------- request ------->|                               |
//!    |                        | traversal ceilings    (413)   |
//!    |                        | threat scan           (403)   |
//!    |                        | schema steps          (4xx)   |
//!    |                        |---- canonicalized input ----->|
//!    |<------ response -------|<------------------------------|
//! ```
//!
//! ## Detectors
//!
//! | Category              | Trigger                                          |
//! |-----------------------|--------------------------------------------------|
//! | `sql-injection`       | Quotes, SQL keywords, comment sequences          |
//! | `xss`                 | `<script`, `javascript:`, `on*=`, `eval(`        |
//! | `nosql-injection`     | Mongo operator keys or tokens                    |
//! | `header-injection`    | CR/LF in header values                           |
//! | `prototype-pollution` | `__proto__` / `constructor` / `prototype` keys   |
//!
//! Fixed evaluation order, first match wins, one category per request.
//! Detection is heuristic: it layers in front of parameterized queries and
//! output encoding, never replaces them.
//!
//! ## Quick Start
//!
//! ### Validate a value against a schema
//!
//! ```rust,ignore
//! use reqguard::schema::{FieldSpec, Schema};
//! use reqguard::validate::{validate, Mode};
//! use serde_json::json;
//!
//! let schema = Schema::builder()
//!     .field("page", FieldSpec::integer().coerce().default_value(json!(1)))
//!     .build()?;
//!
//! let canonical = validate(&schema, &json!({"page": "2"}), Mode::Passthrough)?;
//! assert_eq!(canonical, json!({"page": 2}));
//! ```
//!
//! ### Scan a payload for threats
//!
//! ```rust,ignore
//! use reqguard::scan::ThreatScanner;
//! use serde_json::json;
//!
//! let scanner = ThreatScanner::new();
//! let hit = scanner.scan_value(&json!({"title": "a' OR 1=1--"}))?;
//! assert!(hit.is_some());
//! ```
//!
//! ### Guard a route
//!
//! ```rust,ignore
//! use reqguard::pipeline::{GuardPlan, ValidationStep, ValidationTarget};
//!
//! let plan = GuardPlan::new()
//!     .step(ValidationStep::new(ValidationTarget::Body, schema.clone()));
//! // attach with reqguard::server::guard / RouteGuard, or call
//! // plan.inspect(&scanner, &mut parts) directly
//! ```
//!
//! ## Modules
//!
//! - [`scan`]: structural threat detection
//! - [`schema`]: declarative validation schemas
//! - [`validate`]: validation engine and error reporting
//! - [`pipeline`]: targets, steps, plans, and the rejection envelope
//! - [`events`]: security event auditing
//! - [`server`]: HTTP API server (axum-based)
//! - [`config`]: configuration management
//! - [`error`]: error types and result aliases

pub mod config;
pub mod error;
pub mod events;
pub mod pipeline;
pub mod scan;
pub mod schema;
pub mod server;
pub mod validate;

// Re-exports for convenience
pub use config::Config;
pub use error::{GuardError, Result};
pub use events::{EventDispatcher, SecurityEvent, SecurityEventSink, Severity};
pub use pipeline::{
    GuardPlan, GuardRejection, RequestParts, ValidationOptions, ValidationStep, ValidationTarget,
};
pub use scan::{ScanLimits, ThreatCategory, ThreatScanner};
pub use schema::{FieldSpec, Rule, Schema, SchemaCatalog};
pub use server::{AppState, ServerConfig};
pub use validate::{validate, Mode, ValidationError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

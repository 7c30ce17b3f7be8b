//! Schema validation.
//!
//! | Mode        | Undeclared fields                         |
//! |-------------|-------------------------------------------|
//! | Strict      | Each one is a violation                   |
//! | Passthrough | Preserved unvalidated and unmodified      |
//!
//! Validation produces either a canonicalized value (declared coercions
//! applied, defaults filled) or the full list of violations, never a partial
//! mix. It is pure, synchronous and idempotent; schemas are compiled once
//! and shared freely between concurrent requests.

mod engine;
mod error;

pub use engine::{validate, Mode};
pub use error::{FieldPath, PathSegment, ValidationError};

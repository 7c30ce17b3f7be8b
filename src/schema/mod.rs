//! Declarative validation schemas.
//!
//! A [`Schema`] is an immutable, compiled-once description of an expected
//! object shape: per-field type, presence, and constraint specs plus
//! cross-field rules. Building a schema is pure (no side effects, no
//! ambient registration) and built schemas are shared across concurrent
//! requests behind `Arc` without synchronization.
//!
//! # Example
//!
//! ```rust,ignore
//! use reqguard::schema::{FieldSpec, Rule, Schema};
//!
//! let schema = Schema::builder()
//!     .field("username", FieldSpec::string().required().min_len(3))
//!     .field("password", FieldSpec::string().required().min_len(8))
//!     .field("confirmPassword", FieldSpec::string().required())
//!     .rule(Rule::fields_equal("password", "confirmPassword"))
//!     .build()?;
//! ```

mod catalog;
mod field;

pub use catalog::SchemaCatalog;
pub use field::{FieldSpec, FieldType};

use crate::error::Result;

/// A cross-field rule evaluated after per-field checks
#[derive(Debug, Clone)]
pub enum Rule {
    /// Two fields must hold equal values (checked only when both are present)
    FieldsEqual {
        /// First field name
        field: String,
        /// Second field name
        other: String,
        /// Error message reported against `other` on mismatch
        message: String,
    },
}

impl Rule {
    /// Equality rule with the default message
    pub fn fields_equal(field: impl Into<String>, other: impl Into<String>) -> Self {
        let field = field.into();
        let other = other.into();
        let message = format!("must match {field}");
        Rule::FieldsEqual {
            field,
            other,
            message,
        }
    }

    /// Equality rule with a custom message
    pub fn fields_equal_with_message(
        field: impl Into<String>,
        other: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Rule::FieldsEqual {
            field: field.into(),
            other: other.into(),
            message: message.into(),
        }
    }
}

/// Immutable, compiled-once object schema.
///
/// Field order is the declaration order; validation errors come back in that
/// order, followed by unknown-field and rule errors.
#[derive(Debug, Clone)]
pub struct Schema {
    fields: Vec<(String, FieldSpec)>,
    rules: Vec<Rule>,
}

impl Schema {
    /// Start building a schema
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder {
            fields: Vec::new(),
            rules: Vec::new(),
        }
    }

    /// Declared fields in declaration order
    pub(crate) fn fields(&self) -> &[(String, FieldSpec)] {
        &self.fields
    }

    /// Cross-field rules
    pub(crate) fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Look up a field spec by name
    pub(crate) fn get(&self, name: &str) -> Option<&FieldSpec> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, spec)| spec)
    }

    /// Number of declared fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True when no fields are declared
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Compile every field's pattern constraints, recursively
    pub(crate) fn compile_fields(&mut self) -> Result<()> {
        for (_, spec) in &mut self.fields {
            spec.compile()?;
        }
        Ok(())
    }
}

/// Builder for [`Schema`]
#[derive(Debug, Clone)]
pub struct SchemaBuilder {
    fields: Vec<(String, FieldSpec)>,
    rules: Vec<Rule>,
}

impl SchemaBuilder {
    /// Declare a field
    pub fn field(mut self, name: impl Into<String>, spec: FieldSpec) -> Self {
        self.fields.push((name.into(), spec));
        self
    }

    /// Add a cross-field rule
    pub fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Finish the schema, compiling all pattern constraints
    pub fn build(self) -> Result<Schema> {
        let mut schema = Schema {
            fields: self.fields,
            rules: self.rules,
        };
        schema.compile_fields()?;
        Ok(schema)
    }
}

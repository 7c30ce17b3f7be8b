//! Field specifications.

use regex::Regex;
use serde_json::Value;

use super::Schema;
use crate::error::Result;

/// Expected type of a field's value
#[derive(Debug, Clone)]
pub enum FieldType {
    /// UTF-8 string
    String,
    /// Integer number
    Integer,
    /// Floating-point number (integers accepted)
    Float,
    /// Boolean
    Boolean,
    /// Nested object validated against its own schema
    Object(Box<Schema>),
    /// Array whose elements all satisfy one spec
    Array(Box<FieldSpec>),
}

/// Declarative description of one field: type, presence, and constraints.
///
/// Built with chained methods and frozen when the owning [`Schema`] is
/// built; pattern constraints are compiled exactly once at that point.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub(crate) ty: FieldType,
    pub(crate) required: bool,
    pub(crate) coerce: bool,
    pub(crate) default: Option<Value>,
    pub(crate) min_len: Option<usize>,
    pub(crate) max_len: Option<usize>,
    pub(crate) pattern_src: Option<String>,
    pub(crate) pattern: Option<Regex>,
    pub(crate) email: bool,
    pub(crate) min: Option<f64>,
    pub(crate) max: Option<f64>,
    pub(crate) min_items: Option<usize>,
    pub(crate) max_items: Option<usize>,
}

impl FieldSpec {
    fn with_type(ty: FieldType) -> Self {
        Self {
            ty,
            required: false,
            coerce: false,
            default: None,
            min_len: None,
            max_len: None,
            pattern_src: None,
            pattern: None,
            email: false,
            min: None,
            max: None,
            min_items: None,
            max_items: None,
        }
    }

    /// A string field
    pub fn string() -> Self {
        Self::with_type(FieldType::String)
    }

    /// An integer field
    pub fn integer() -> Self {
        Self::with_type(FieldType::Integer)
    }

    /// A float field
    pub fn float() -> Self {
        Self::with_type(FieldType::Float)
    }

    /// A boolean field
    pub fn boolean() -> Self {
        Self::with_type(FieldType::Boolean)
    }

    /// A nested object field
    pub fn object(schema: Schema) -> Self {
        Self::with_type(FieldType::Object(Box::new(schema)))
    }

    /// An array field with a per-element spec
    pub fn array(item: FieldSpec) -> Self {
        Self::with_type(FieldType::Array(Box::new(item)))
    }

    /// Mark the field required
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Allow string input to be coerced to the declared numeric/boolean
    /// type (query strings and path params arrive as strings)
    pub fn coerce(mut self) -> Self {
        self.coerce = true;
        self
    }

    /// Default value filled in when the field is absent
    pub fn default_value(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    /// Minimum string length in characters
    pub fn min_len(mut self, len: usize) -> Self {
        self.min_len = Some(len);
        self
    }

    /// Maximum string length in characters
    pub fn max_len(mut self, len: usize) -> Self {
        self.max_len = Some(len);
        self
    }

    /// Regex the whole string must match; compiled at schema build time
    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern_src = Some(pattern.into());
        self
    }

    /// Require a plausible email address
    pub fn email(mut self) -> Self {
        self.email = true;
        self
    }

    /// Minimum numeric value (inclusive)
    pub fn min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    /// Maximum numeric value (inclusive)
    pub fn max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    /// Minimum number of array elements
    pub fn min_items(mut self, n: usize) -> Self {
        self.min_items = Some(n);
        self
    }

    /// Maximum number of array elements
    pub fn max_items(mut self, n: usize) -> Self {
        self.max_items = Some(n);
        self
    }

    /// Compile pattern constraints, recursing into nested specs
    pub(crate) fn compile(&mut self) -> Result<()> {
        if let Some(src) = &self.pattern_src {
            self.pattern = Some(Regex::new(src)?);
        }

        match &mut self.ty {
            FieldType::Object(schema) => schema.compile_fields()?,
            FieldType::Array(item) => item.compile()?,
            _ => {},
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builder_chains() {
        let spec = FieldSpec::integer()
            .required()
            .coerce()
            .min(1.0)
            .max(100.0)
            .default_value(json!(20));

        assert!(spec.required);
        assert!(spec.coerce);
        assert_eq!(spec.min, Some(1.0));
        assert_eq!(spec.default, Some(json!(20)));
    }

    #[test]
    fn test_pattern_compiles() {
        let mut spec = FieldSpec::string().pattern(r"^[a-z]+$");
        spec.compile().unwrap();
        assert!(spec.pattern.is_some());
    }

    #[test]
    fn test_bad_pattern_fails_compile() {
        let mut spec = FieldSpec::string().pattern(r"([unclosed");
        assert!(spec.compile().is_err());
    }
}

//! Validation error reporting.

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

/// One step in a field path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// Object field name
    Key(String),
    /// Array index
    Index(usize),
}

/// Ordered location of a violated field: object keys and array indices from
/// the target root down.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FieldPath(Vec<PathSegment>);

impl FieldPath {
    /// The target root itself
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Extend with an object key
    pub fn key(&self, name: &str) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Key(name.to_string()));
        Self(segments)
    }

    /// Extend with an array index
    pub fn index(&self, index: usize) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Index(index));
        Self(segments)
    }

    /// Path segments from the root down
    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    /// True for the target root
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for FieldPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                PathSegment::Key(name) => {
                    if i > 0 {
                        f.write_str(".")?;
                    }
                    f.write_str(name)?;
                },
                PathSegment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

impl Serialize for FieldPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A single violated field: where and why.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Location of the violation
    pub path: FieldPath,
    /// Human-readable message; never echoes schema internals
    pub message: String,
}

impl ValidationError {
    /// Create an error at a path
    pub fn new(path: FieldPath, message: impl Into<String>) -> Self {
        Self {
            path,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.path.is_root() {
            f.write_str(&self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

impl Serialize for ValidationError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ValidationError", 2)?;
        state.serialize_field("path", &self.path)?;
        state.serialize_field("message", &self.message)?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_display() {
        let path = FieldPath::root().key("items").index(3).key("title");
        assert_eq!(path.to_string(), "items[3].title");
    }

    #[test]
    fn test_root_display() {
        assert_eq!(FieldPath::root().to_string(), "");
    }

    #[test]
    fn test_error_display() {
        let err = ValidationError::new(FieldPath::root().key("email"), "must be a valid email address");
        assert_eq!(err.to_string(), "email: must be a valid email address");
    }

    #[test]
    fn test_error_serializes_path_as_string() {
        let err = ValidationError::new(FieldPath::root().key("a").index(0), "bad");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["path"], "a[0]");
        assert_eq!(json["message"], "bad");
    }
}

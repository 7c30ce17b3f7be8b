//! Addressable request substructures.

use serde::Serialize;
use serde_json::{Map, Value};

/// The five independently addressable parts of an incoming request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationTarget {
    /// JSON request body
    Body,
    /// Query-string parameters
    Query,
    /// Path parameters
    Params,
    /// Request headers
    Headers,
    /// Request cookies
    Cookies,
}

impl ValidationTarget {
    /// Stable wire name for the target
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationTarget::Body => "body",
            ValidationTarget::Query => "query",
            ValidationTarget::Params => "params",
            ValidationTarget::Headers => "headers",
            ValidationTarget::Cookies => "cookies",
        }
    }
}

impl std::fmt::Display for ValidationTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of a request's five addressable parts as JSON values.
///
/// Access goes through one explicit accessor per target; no reflection or
/// by-name property lookup anywhere. Query, params, headers and cookies are
/// always objects with string values; the body is whatever JSON the client
/// sent (`Null` when absent).
#[derive(Debug, Clone, Default)]
pub struct RequestParts {
    body: Value,
    query: Value,
    params: Value,
    headers: Value,
    cookies: Value,
}

impl RequestParts {
    /// Create an empty snapshot (all targets empty objects, body `Null`)
    pub fn new() -> Self {
        Self {
            body: Value::Null,
            query: Value::Object(Map::new()),
            params: Value::Object(Map::new()),
            headers: Value::Object(Map::new()),
            cookies: Value::Object(Map::new()),
        }
    }

    /// Request body
    pub fn body(&self) -> &Value {
        &self.body
    }

    /// Query-string parameters
    pub fn query(&self) -> &Value {
        &self.query
    }

    /// Path parameters
    pub fn params(&self) -> &Value {
        &self.params
    }

    /// Request headers
    pub fn headers(&self) -> &Value {
        &self.headers
    }

    /// Request cookies
    pub fn cookies(&self) -> &Value {
        &self.cookies
    }

    /// Replace the body
    pub fn set_body(&mut self, value: Value) {
        self.body = value;
    }

    /// Replace the query parameters
    pub fn set_query(&mut self, value: Value) {
        self.query = value;
    }

    /// Replace the path parameters
    pub fn set_params(&mut self, value: Value) {
        self.params = value;
    }

    /// Replace the headers
    pub fn set_headers(&mut self, value: Value) {
        self.headers = value;
    }

    /// Replace the cookies
    pub fn set_cookies(&mut self, value: Value) {
        self.cookies = value;
    }

    /// Read the value at a target
    pub fn get(&self, target: ValidationTarget) -> &Value {
        match target {
            ValidationTarget::Body => self.body(),
            ValidationTarget::Query => self.query(),
            ValidationTarget::Params => self.params(),
            ValidationTarget::Headers => self.headers(),
            ValidationTarget::Cookies => self.cookies(),
        }
    }

    /// Replace the value at a target
    pub fn set(&mut self, target: ValidationTarget, value: Value) {
        match target {
            ValidationTarget::Body => self.set_body(value),
            ValidationTarget::Query => self.set_query(value),
            ValidationTarget::Params => self.set_params(value),
            ValidationTarget::Headers => self.set_headers(value),
            ValidationTarget::Cookies => self.set_cookies(value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_target_names() {
        assert_eq!(ValidationTarget::Body.as_str(), "body");
        assert_eq!(ValidationTarget::Cookies.to_string(), "cookies");
    }

    #[test]
    fn test_get_set_roundtrip() {
        let mut parts = RequestParts::new();
        assert!(parts.body().is_null());

        parts.set(ValidationTarget::Body, json!({"title": "ok"}));
        parts.set(ValidationTarget::Query, json!({"page": "2"}));

        assert_eq!(parts.get(ValidationTarget::Body), &json!({"title": "ok"}));
        assert_eq!(parts.get(ValidationTarget::Query), &json!({"page": "2"}));
        assert_eq!(parts.get(ValidationTarget::Params), &json!({}));
    }
}

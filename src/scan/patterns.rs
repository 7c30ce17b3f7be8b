//! Threat patterns for rule-based detection.
//!
//! Contains regex patterns and key tables for detecting common injection
//! attack types:
//! - SQL injection
//! - Cross-site scripting (XSS)
//! - NoSQL operator injection
//! - HTTP header injection
//! - Prototype pollution

use lazy_static::lazy_static;
use phf::phf_set;
use regex::Regex;
use serde::Serialize;

/// A threat detection pattern
#[derive(Debug, Clone)]
pub struct ThreatPattern {
    /// Pattern name
    pub name: &'static str,
    /// Regex pattern
    pub pattern: &'static str,
    /// Threat category
    pub category: ThreatCategory,
    /// Description
    pub description: &'static str,
}

/// Threat categories.
///
/// Evaluation order across categories is fixed (SQL, XSS, NoSQL, header,
/// prototype) and only the first matching category is reported per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ThreatCategory {
    /// SQL injection
    #[serde(rename = "sql-injection")]
    SqlInjection,
    /// Cross-site scripting
    #[serde(rename = "xss")]
    Xss,
    /// NoSQL operator injection
    #[serde(rename = "nosql-injection")]
    NoSqlInjection,
    /// HTTP header injection (CR/LF in header values)
    #[serde(rename = "header-injection")]
    HeaderInjection,
    /// Prototype pollution key smuggling
    #[serde(rename = "prototype-pollution")]
    PrototypePollution,
}

impl ThreatCategory {
    /// Stable wire name for the category
    pub fn as_str(&self) -> &'static str {
        match self {
            ThreatCategory::SqlInjection => "sql-injection",
            ThreatCategory::Xss => "xss",
            ThreatCategory::NoSqlInjection => "nosql-injection",
            ThreatCategory::HeaderInjection => "header-injection",
            ThreatCategory::PrototypePollution => "prototype-pollution",
        }
    }
}

impl std::fmt::Display for ThreatCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// SQL injection patterns.
///
/// Heuristic, not a SQL parser: quote characters, statement keywords, and
/// comment sequences are enough to flag a value for a defense-in-depth gate.
pub static SQL_PATTERNS: &[ThreatPattern] = &[
    ThreatPattern {
        name: "quote_characters",
        pattern: r#"['"`]"#,
        category: ThreatCategory::SqlInjection,
        description: "Quote characters used to break out of literals",
    },
    ThreatPattern {
        name: "sql_keywords",
        pattern: r"(?i)\b(select|insert|update|delete|drop|union|alter|create|truncate|exec|execute|declare)\b",
        category: ThreatCategory::SqlInjection,
        description: "SQL statement keywords",
    },
    ThreatPattern {
        name: "comment_sequences",
        pattern: r"--|/\*|\*/",
        category: ThreatCategory::SqlInjection,
        description: "SQL comment sequences used to truncate statements",
    },
];

/// Cross-site scripting patterns
pub static XSS_PATTERNS: &[ThreatPattern] = &[
    ThreatPattern {
        name: "script_tag",
        pattern: r"(?i)<\s*script",
        category: ThreatCategory::Xss,
        description: "Inline script tag",
    },
    ThreatPattern {
        name: "javascript_uri",
        pattern: r"(?i)javascript\s*:",
        category: ThreatCategory::Xss,
        description: "javascript: URI scheme",
    },
    ThreatPattern {
        name: "event_handler",
        pattern: r"(?i)\bon\w+\s*=",
        category: ThreatCategory::Xss,
        description: "Inline event handler attribute",
    },
    ThreatPattern {
        name: "eval_call",
        pattern: r"(?i)\beval\s*\(",
        category: ThreatCategory::Xss,
        description: "Direct eval invocation",
    },
];

/// NoSQL operator tokens appearing inside string values
pub static NOSQL_STRING_PATTERNS: &[ThreatPattern] = &[ThreatPattern {
    name: "operator_token",
    pattern: r"\$(ne|eq|gt|gte|lt|lte|in|nin|not|nor|and|or|where|regex|exists|expr|mod|size|all|type|text|search|elemMatch)\b",
    category: ThreatCategory::NoSqlInjection,
    description: "Mongo-style operator token inside a string value",
}];

/// Mongo-style operator keys checked against object keys at any depth
pub static NOSQL_OPERATOR_KEYS: phf::Set<&'static str> = phf_set! {
    "$ne", "$eq", "$gt", "$gte", "$lt", "$lte", "$in", "$nin",
    "$not", "$nor", "$and", "$or", "$where", "$regex", "$exists",
    "$expr", "$mod", "$size", "$all", "$type", "$text", "$search",
    "$elemMatch",
};

/// Object keys that rewrite the prototype chain in dynamic-language backends
pub static POLLUTION_KEYS: phf::Set<&'static str> = phf_set! {
    "__proto__", "constructor", "prototype",
};

lazy_static! {
    /// Compiled SQL injection patterns
    pub static ref SQL_REGEX: Vec<(Regex, &'static ThreatPattern)> = compile(SQL_PATTERNS);

    /// Compiled XSS patterns
    pub static ref XSS_REGEX: Vec<(Regex, &'static ThreatPattern)> = compile(XSS_PATTERNS);

    /// Compiled NoSQL string-value patterns
    pub static ref NOSQL_STRING_REGEX: Vec<(Regex, &'static ThreatPattern)> =
        compile(NOSQL_STRING_PATTERNS);
}

/// Compile a pattern table, dropping any pattern that fails to compile
fn compile(patterns: &'static [ThreatPattern]) -> Vec<(Regex, &'static ThreatPattern)> {
    patterns
        .iter()
        .filter_map(|p| Regex::new(p.pattern).ok().map(|r| (r, p)))
        .collect()
}

/// Match a string against a compiled pattern set
pub fn first_match<'a>(
    compiled: &'a [(Regex, &'static ThreatPattern)],
    content: &str,
) -> Option<&'static ThreatPattern> {
    compiled
        .iter()
        .find(|(regex, _)| regex.is_match(content))
        .map(|(_, pattern)| *pattern)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sql_detection() {
        let content = "a' OR 1=1--";
        let hit = first_match(&SQL_REGEX, content);
        assert!(hit.is_some());
        assert_eq!(hit.unwrap().category, ThreatCategory::SqlInjection);
    }

    #[test]
    fn test_sql_safe_content() {
        assert!(first_match(&SQL_REGEX, "hello world").is_none());
    }

    #[test]
    fn test_xss_detection() {
        assert!(first_match(&XSS_REGEX, "<script>alert(1)</script>").is_some());
        assert!(first_match(&XSS_REGEX, "javascript:alert(1)").is_some());
        assert!(first_match(&XSS_REGEX, "<img onerror=alert(1)>").is_some());
        assert!(first_match(&XSS_REGEX, "eval(document.cookie)").is_some());
        assert!(first_match(&XSS_REGEX, "a description of scripture").is_none());
    }

    #[test]
    fn test_nosql_string_token() {
        assert!(first_match(&NOSQL_STRING_REGEX, r#"{"$ne": null}"#).is_some());
        assert!(first_match(&NOSQL_STRING_REGEX, "price in dollars").is_none());
    }

    #[test]
    fn test_operator_key_set() {
        assert!(NOSQL_OPERATOR_KEYS.contains("$where"));
        assert!(NOSQL_OPERATOR_KEYS.contains("$gt"));
        assert!(!NOSQL_OPERATOR_KEYS.contains("price"));
    }

    #[test]
    fn test_pollution_key_set() {
        assert!(POLLUTION_KEYS.contains("__proto__"));
        assert!(POLLUTION_KEYS.contains("constructor"));
        assert!(POLLUTION_KEYS.contains("prototype"));
        assert!(!POLLUTION_KEYS.contains("proto"));
    }

    #[test]
    fn test_all_patterns_compile() {
        assert_eq!(SQL_REGEX.len(), SQL_PATTERNS.len());
        assert_eq!(XSS_REGEX.len(), XSS_PATTERNS.len());
        assert_eq!(NOSQL_STRING_REGEX.len(), NOSQL_STRING_PATTERNS.len());
    }
}

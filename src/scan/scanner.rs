//! Structural threat scanner.
//!
//! Walks arbitrary attacker-controlled JSON depth-first and matches strings
//! (and, for the key-based detectors, object keys) against the pattern
//! library. Traversal never starts before the payload has passed the
//! iterative depth/node precheck, so adversarial nesting is rejected without
//! recursing into it.

use std::panic::{catch_unwind, AssertUnwindSafe};

use serde_json::Value;

use super::patterns::{
    first_match, ThreatCategory, NOSQL_OPERATOR_KEYS, NOSQL_STRING_REGEX, POLLUTION_KEYS,
    SQL_REGEX, XSS_REGEX,
};
use crate::pipeline::{RequestParts, ValidationTarget};

/// Traversal ceilings for a single scanned value.
#[derive(Debug, Clone, Copy)]
pub struct ScanLimits {
    /// Maximum nesting depth
    pub max_depth: usize,
    /// Maximum number of nodes (objects, arrays, scalars)
    pub max_nodes: usize,
}

impl Default for ScanLimits {
    fn default() -> Self {
        Self {
            max_depth: 32,
            max_nodes: 50_000,
        }
    }
}

/// A payload exceeded a traversal ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitBreach {
    /// Nesting deeper than the configured maximum
    TooDeep {
        /// Depth at which traversal stopped
        depth: usize,
        /// Configured ceiling
        max: usize,
    },
    /// More nodes than the configured maximum
    TooManyNodes {
        /// Node count at which traversal stopped
        nodes: usize,
        /// Configured ceiling
        max: usize,
    },
    /// Raw payload larger than the configured maximum
    TooLarge {
        /// Configured ceiling in bytes
        max: usize,
    },
}

impl std::fmt::Display for LimitBreach {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LimitBreach::TooDeep { depth, max } => {
                write!(f, "payload nested deeper than {max} levels (reached {depth})")
            },
            LimitBreach::TooManyNodes { nodes, max } => {
                write!(f, "payload larger than {max} nodes (reached {nodes})")
            },
            LimitBreach::TooLarge { max } => {
                write!(f, "payload larger than {max} bytes")
            },
        }
    }
}

/// A detector's positive match.
#[derive(Debug, Clone)]
pub struct ThreatFinding {
    /// Matched category
    pub category: ThreatCategory,
    /// Request part the match was found in
    pub target: ValidationTarget,
    /// Short human-readable note about the match
    pub note: &'static str,
}

/// Common detector interface: a depth-first structural match over a value.
///
/// Detectors are stateless and share nothing; panics inside a detector are
/// contained by the scanner and count as a non-match for that detector only.
pub trait Detector: Send + Sync {
    /// Category this detector reports
    fn category(&self) -> ThreatCategory;

    /// Note attached to findings from this detector
    fn note(&self) -> &'static str;

    /// True when the value matches this detector's patterns
    fn detect(&self, value: &Value) -> bool;
}

/// SQL injection detector: string values only
struct SqlInjection;

impl Detector for SqlInjection {
    fn category(&self) -> ThreatCategory {
        ThreatCategory::SqlInjection
    }

    fn note(&self) -> &'static str {
        "string value matched a SQL injection pattern"
    }

    fn detect(&self, value: &Value) -> bool {
        any_string(value, &|s| first_match(&SQL_REGEX, s).is_some())
    }
}

/// XSS detector: string values only
struct CrossSiteScripting;

impl Detector for CrossSiteScripting {
    fn category(&self) -> ThreatCategory {
        ThreatCategory::Xss
    }

    fn note(&self) -> &'static str {
        "string value matched a cross-site scripting pattern"
    }

    fn detect(&self, value: &Value) -> bool {
        any_string(value, &|s| first_match(&XSS_REGEX, s).is_some())
    }
}

/// NoSQL operator injection: object keys first, then string values
struct NoSqlInjection;

impl Detector for NoSqlInjection {
    fn category(&self) -> ThreatCategory {
        ThreatCategory::NoSqlInjection
    }

    fn note(&self) -> &'static str {
        "Mongo-style operator found in a key or string value"
    }

    fn detect(&self, value: &Value) -> bool {
        match value {
            Value::Object(map) => {
                map.keys().any(|k| NOSQL_OPERATOR_KEYS.contains(k.as_str()))
                    || map.values().any(|v| self.detect(v))
            },
            Value::Array(items) => items.iter().any(|v| self.detect(v)),
            Value::String(s) => first_match(&NOSQL_STRING_REGEX, s).is_some(),
            _ => false,
        }
    }
}

/// Header injection: CR/LF in string values
struct HeaderInjection;

impl Detector for HeaderInjection {
    fn category(&self) -> ThreatCategory {
        ThreatCategory::HeaderInjection
    }

    fn note(&self) -> &'static str {
        "header value contains a CR or LF character"
    }

    fn detect(&self, value: &Value) -> bool {
        any_string(value, &|s| s.contains('\r') || s.contains('\n'))
    }
}

/// Prototype pollution: object keys only; array elements are recursed,
/// never treated as keys
struct PrototypePollution;

impl Detector for PrototypePollution {
    fn category(&self) -> ThreatCategory {
        ThreatCategory::PrototypePollution
    }

    fn note(&self) -> &'static str {
        "object key rewrites the prototype chain"
    }

    fn detect(&self, value: &Value) -> bool {
        match value {
            Value::Object(map) => {
                map.keys().any(|k| POLLUTION_KEYS.contains(k.as_str()))
                    || map.values().any(|v| self.detect(v))
            },
            Value::Array(items) => items.iter().any(|v| self.detect(v)),
            _ => false,
        }
    }
}

/// Depth-first walk applying `pred` to every string value
fn any_string(value: &Value, pred: &dyn Fn(&str) -> bool) -> bool {
    match value {
        Value::String(s) => pred(s),
        Value::Object(map) => map.values().any(|v| any_string(v, pred)),
        Value::Array(items) => items.iter().any(|v| any_string(v, pred)),
        _ => false,
    }
}

/// Structural threat scanner over a request's addressable parts.
///
/// Stateless apart from the immutable limits; safe for unsynchronized
/// concurrent use from any number of in-flight requests.
#[derive(Debug, Clone)]
pub struct ThreatScanner {
    limits: ScanLimits,
}

impl Default for ThreatScanner {
    fn default() -> Self {
        Self::new()
    }
}

/// Detectors in fixed evaluation order. First match wins; one category per
/// request even when several would match.
static DETECTORS: &[&(dyn Detector)] = &[
    &SqlInjection,
    &CrossSiteScripting,
    &NoSqlInjection,
    &HeaderInjection,
    &PrototypePollution,
];

/// Targets the structural detectors look at. Header values are only ever
/// examined by the header-injection detector.
static STRUCTURAL_TARGETS: &[ValidationTarget] = &[
    ValidationTarget::Body,
    ValidationTarget::Query,
    ValidationTarget::Params,
];

impl ThreatScanner {
    /// Create a scanner with default limits
    pub fn new() -> Self {
        Self {
            limits: ScanLimits::default(),
        }
    }

    /// Create a scanner with explicit limits
    pub fn with_limits(limits: ScanLimits) -> Self {
        Self { limits }
    }

    /// Configured limits
    pub fn limits(&self) -> ScanLimits {
        self.limits
    }

    /// Check a single value against the traversal ceilings.
    ///
    /// Iterative (explicit stack): the ceilings exist to protect the call
    /// stack, so the check itself must not recurse.
    pub fn check_limits(&self, value: &Value) -> Result<(), LimitBreach> {
        let mut stack: Vec<(&Value, usize)> = vec![(value, 1)];
        let mut nodes = 0usize;

        while let Some((current, depth)) = stack.pop() {
            nodes += 1;
            if nodes > self.limits.max_nodes {
                return Err(LimitBreach::TooManyNodes {
                    nodes,
                    max: self.limits.max_nodes,
                });
            }
            if depth > self.limits.max_depth {
                return Err(LimitBreach::TooDeep {
                    depth,
                    max: self.limits.max_depth,
                });
            }

            match current {
                Value::Object(map) => {
                    for v in map.values() {
                        stack.push((v, depth + 1));
                    }
                },
                Value::Array(items) => {
                    for v in items {
                        stack.push((v, depth + 1));
                    }
                },
                _ => {},
            }
        }

        Ok(())
    }

    /// Run one detector over one value with panic containment.
    ///
    /// A panicking detector counts as a non-match for that detector only;
    /// the remaining detectors still run.
    fn detect_guarded(&self, detector: &dyn Detector, value: &Value) -> bool {
        catch_unwind(AssertUnwindSafe(|| detector.detect(value))).unwrap_or_else(|_| {
            tracing::warn!(
                category = %detector.category(),
                "detector panicked; treating as non-match"
            );
            false
        })
    }

    /// Scan a single value with every structural detector, in order.
    ///
    /// Used by the direct `/scan` endpoint and the CLI; request scanning
    /// goes through [`ThreatScanner::scan`].
    pub fn scan_value(&self, value: &Value) -> Result<Option<ThreatCategory>, LimitBreach> {
        self.check_limits(value)?;

        for detector in DETECTORS {
            if self.detect_guarded(*detector, value) {
                return Ok(Some(detector.category()));
            }
        }

        Ok(None)
    }

    /// Scan a request's addressable parts.
    ///
    /// Body, query and path params are examined by the structural detectors;
    /// header values only by the header-injection detector. Fixed category
    /// order, first match wins.
    pub fn scan(&self, parts: &RequestParts) -> Result<Option<ThreatFinding>, LimitBreach> {
        for target in STRUCTURAL_TARGETS {
            self.check_limits(parts.get(*target))?;
        }
        self.check_limits(parts.headers())?;

        for detector in DETECTORS {
            let targets: &[ValidationTarget] =
                if detector.category() == ThreatCategory::HeaderInjection {
                    &[ValidationTarget::Headers]
                } else {
                    STRUCTURAL_TARGETS
                };

            for target in targets {
                if self.detect_guarded(*detector, parts.get(*target)) {
                    return Ok(Some(ThreatFinding {
                        category: detector.category(),
                        target: *target,
                        note: detector.note(),
                    }));
                }
            }
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parts_with_body(body: Value) -> RequestParts {
        let mut parts = RequestParts::new();
        parts.set_body(body);
        parts
    }

    #[test]
    fn test_sql_injection_in_body() {
        let scanner = ThreatScanner::new();
        let parts = parts_with_body(json!({"title": "a' OR 1=1--"}));

        let finding = scanner.scan(&parts).unwrap().unwrap();
        assert_eq!(finding.category, ThreatCategory::SqlInjection);
        assert_eq!(finding.target, ValidationTarget::Body);
    }

    #[test]
    fn test_clean_body_passes() {
        let scanner = ThreatScanner::new();
        let parts = parts_with_body(json!({"title": "hello world"}));

        assert!(scanner.scan(&parts).unwrap().is_none());
    }

    #[test]
    fn test_prototype_pollution_at_depth() {
        let scanner = ThreatScanner::new();
        let parts = parts_with_body(json!({"a": {"b": {"__proto__": 1}}}));

        let finding = scanner.scan(&parts).unwrap().unwrap();
        assert_eq!(finding.category, ThreatCategory::PrototypePollution);
    }

    #[test]
    fn test_pollution_key_in_array_element_is_not_a_key() {
        let scanner = ThreatScanner::new();
        // "__proto__" as an array *element* is a plain string, not a key
        let parts = parts_with_body(json!({"tags": ["__proto__"]}));

        assert!(scanner.scan(&parts).unwrap().is_none());
    }

    #[test]
    fn test_nosql_operator_key() {
        let scanner = ThreatScanner::new();
        let parts = parts_with_body(json!({"filter": {"age": {"$gt": ""}}}));

        let finding = scanner.scan(&parts).unwrap().unwrap();
        assert_eq!(finding.category, ThreatCategory::NoSqlInjection);
    }

    #[test]
    fn test_header_injection_in_header_value() {
        let scanner = ThreatScanner::new();
        let mut parts = RequestParts::new();
        parts.set_headers(json!({"x-test": "v\r\nSet-Cookie: evil=1"}));

        let finding = scanner.scan(&parts).unwrap().unwrap();
        assert_eq!(finding.category, ThreatCategory::HeaderInjection);
        assert_eq!(finding.target, ValidationTarget::Headers);
    }

    #[test]
    fn test_crlf_in_body_is_not_header_injection() {
        let scanner = ThreatScanner::new();
        // Multiline body text is legitimate; only header values are checked
        let parts = parts_with_body(json!({"notes": "line one\nline two"}));

        assert!(scanner.scan(&parts).unwrap().is_none());
    }

    #[test]
    fn test_first_match_wins_across_categories() {
        let scanner = ThreatScanner::new();
        // Matches both SQL (quote, keyword) and XSS (script tag); SQL is
        // evaluated first and is the only category reported
        let parts = parts_with_body(json!({"v": "' UNION SELECT <script>"}));

        let finding = scanner.scan(&parts).unwrap().unwrap();
        assert_eq!(finding.category, ThreatCategory::SqlInjection);
    }

    #[test]
    fn test_depth_limit_rejects_before_scan() {
        let scanner = ThreatScanner::with_limits(ScanLimits {
            max_depth: 8,
            max_nodes: 50_000,
        });

        let mut nested = json!("deep");
        for _ in 0..20 {
            nested = json!([nested]);
        }
        let parts = parts_with_body(nested);

        match scanner.scan(&parts) {
            Err(LimitBreach::TooDeep { max: 8, .. }) => {},
            other => panic!("expected TooDeep, got {other:?}"),
        }
    }

    #[test]
    fn test_node_limit() {
        let scanner = ThreatScanner::with_limits(ScanLimits {
            max_depth: 32,
            max_nodes: 10,
        });

        let wide: Vec<u32> = (0..100).collect();
        assert!(matches!(
            scanner.check_limits(&json!(wide)),
            Err(LimitBreach::TooManyNodes { max: 10, .. })
        ));
    }

    #[test]
    fn test_very_deep_payload_checked_without_overflow() {
        let scanner = ThreatScanner::new();

        // Far deeper than any sane stack would tolerate recursively
        let mut nested = json!(1);
        for _ in 0..10_000 {
            nested = json!([nested]);
        }

        assert!(matches!(
            scanner.check_limits(&nested),
            Err(LimitBreach::TooDeep { .. })
        ));

        // serde_json drops deep values recursively; unwind manually
        let mut current = nested;
        while let Value::Array(mut items) = current {
            current = items.pop().unwrap_or(Value::Null);
        }
    }

    #[test]
    fn test_query_and_params_scanned() {
        let scanner = ThreatScanner::new();
        let mut parts = RequestParts::new();
        parts.set_query(json!({"q": "<script>alert(1)</script>"}));

        let finding = scanner.scan(&parts).unwrap().unwrap();
        assert_eq!(finding.category, ThreatCategory::Xss);
        assert_eq!(finding.target, ValidationTarget::Query);
    }

    #[test]
    fn test_scan_value_direct() {
        let scanner = ThreatScanner::new();
        assert_eq!(
            scanner.scan_value(&json!({"$where": "1"})).unwrap(),
            Some(ThreatCategory::NoSqlInjection)
        );
        assert_eq!(scanner.scan_value(&json!({"name": "ok"})).unwrap(), None);
    }
}

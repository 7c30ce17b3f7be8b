//! Structural threat detection for request payloads.
//!
//! Five stateless detectors walk attacker-controlled JSON depth-first and
//! flag suspected injection/pollution patterns before any schema validation
//! runs.
//!
//! # Detectors
//!
//! | Category              | Trigger                                             |
//! |-----------------------|-----------------------------------------------------|
//! | `sql-injection`       | Quotes, SQL keywords, comment sequences             |
//! | `xss`                 | `<script`, `javascript:`, `on*=` handlers, `eval(`  |
//! | `nosql-injection`     | Mongo operator as object key or inside a string     |
//! | `header-injection`    | CR or LF inside a header value                      |
//! | `prototype-pollution` | `__proto__` / `constructor` / `prototype` keys      |
//!
//! Evaluation order is fixed (the table order) and the first match wins:
//! one category per request even when several patterns match.
//!
//! # Hardening
//!
//! Payloads pass an iterative depth/node precheck before any detector runs;
//! over-deep or oversized values are rejected outright so adversarial
//! nesting can never exhaust the call stack or CPU. Detection is a
//! heuristic gate layered in front of parameterized queries and output
//! encoding, not a replacement for either.
//!
//! # Usage
//!
//! ```rust,ignore
//! use reqguard::scan::ThreatScanner;
//! use serde_json::json;
//!
//! let scanner = ThreatScanner::new();
//! let hit = scanner.scan_value(&json!({"title": "a' OR 1=1--"})).unwrap();
//! assert!(hit.is_some());
//! ```

mod patterns;
mod scanner;

pub use patterns::{ThreatCategory, ThreatPattern, SQL_PATTERNS, XSS_PATTERNS};
pub use scanner::{Detector, LimitBreach, ScanLimits, ThreatFinding, ThreatScanner};

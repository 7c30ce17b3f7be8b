//! Per-route guard middleware.
//!
//! Bridges the transport to the pipeline: buffers the body under the
//! configured size ceiling, assembles the five addressable targets, runs
//! the route's [`GuardPlan`], and either responds with the rejection
//! envelope or hands the canonicalized targets to the handler through a
//! request extension.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::body::{to_bytes, Body};
use axum::extract::{ConnectInfo, FromRequestParts, RawPathParams, Request, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use serde_json::{Map, Value};

use super::state::AppState;
use crate::pipeline::{GuardPlan, GuardRejection, Phase, RequestParts, ValidationTarget};
use crate::scan::LimitBreach;
use crate::validate::{FieldPath, ValidationError};

/// Nesting ceiling serde_json enforces while parsing. Anything deeper never
/// materializes as a `Value` at all.
const PARSER_RECURSION_LIMIT: usize = 128;

/// A guarded route's context: shared state plus that route's plan.
#[derive(Clone)]
pub struct RouteGuard {
    state: Arc<AppState>,
    plan: Arc<GuardPlan>,
}

impl RouteGuard {
    /// Bind a plan to the shared state
    pub fn new(state: Arc<AppState>, plan: GuardPlan) -> Self {
        Self {
            state,
            plan: Arc::new(plan),
        }
    }
}

/// Canonicalized request parts, inserted as an extension once the pipeline
/// passes. Handlers read these instead of re-extracting (and never
/// re-validate) the raw request.
#[derive(Debug, Clone)]
pub struct Validated(pub RequestParts);

impl Validated {
    /// Canonicalized body
    pub fn body(&self) -> &Value {
        self.0.body()
    }

    /// Canonicalized query parameters
    pub fn query(&self) -> &Value {
        self.0.query()
    }

    /// Canonicalized path parameters
    pub fn params(&self) -> &Value {
        self.0.params()
    }
}

/// The middleware entry point; attach per route with
/// `axum::middleware::from_fn_with_state(RouteGuard::new(..), guard)`.
pub async fn guard(State(ctx): State<RouteGuard>, request: Request, next: Next) -> Response {
    let started = Instant::now();
    tracing::trace!(phase = %Phase::Received, "request entered pipeline");

    let (mut head, body) = request.into_parts();

    let source_ip = head
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip().to_string());

    // Path params were matched by the router before this layer ran
    let params = match RawPathParams::from_request_parts(&mut head, &()).await {
        Ok(raw) => {
            let mut map = Map::new();
            for (name, value) in raw.iter() {
                map.insert(name.to_string(), Value::String(value.to_string()));
            }
            Value::Object(map)
        },
        Err(_) => Value::Object(Map::new()),
    };

    let query = parse_query(head.uri.query());
    let headers = headers_value(&head.headers);
    let cookies = parse_cookies(&head.headers);

    let max_bytes = ctx.state.config.limits.max_body_bytes;
    let bytes = match to_bytes(body, max_bytes).await {
        Ok(bytes) => bytes,
        Err(_) => {
            let rejection = GuardRejection::PayloadLimit(LimitBreach::TooLarge { max: max_bytes });
            return reject(&ctx, rejection, source_ip.as_deref(), started);
        },
    };

    let body_value = if bytes.is_empty() {
        Value::Null
    } else {
        match serde_json::from_slice::<Value>(&bytes) {
            Ok(value) => value,
            Err(e) => {
                // serde_json enforces its own nesting ceiling while parsing;
                // breaching it is an over-deep payload, not a syntax error
                let rejection = if e.is_syntax() && e.to_string().contains("recursion limit") {
                    GuardRejection::PayloadLimit(LimitBreach::TooDeep {
                        depth: PARSER_RECURSION_LIMIT,
                        max: ctx.state.config.limits.max_depth,
                    })
                } else {
                    GuardRejection::Schema {
                        target: ValidationTarget::Body,
                        status: StatusCode::BAD_REQUEST,
                        errors: vec![ValidationError::new(
                            FieldPath::root(),
                            "must be valid JSON",
                        )],
                        handler: None,
                    }
                };
                return reject(&ctx, rejection, source_ip.as_deref(), started);
            },
        }
    };

    let mut parts = RequestParts::new();
    parts.set_body(body_value);
    parts.set_query(query);
    parts.set_params(params);
    parts.set_headers(headers);
    parts.set_cookies(cookies);

    // A panic anywhere in the pipeline becomes a generic 500; the client
    // never sees a crash or internal state
    let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        if ctx.state.config.scanning_enabled {
            ctx.plan.inspect(&ctx.state.scanner, &mut parts)
        } else {
            ctx.plan.run(&mut parts)
        }
    }))
    .unwrap_or_else(|_| {
        tracing::error!("guard pipeline panicked");
        Err(GuardRejection::Internal)
    });

    match outcome {
        Ok(()) => {
            ctx.state.stats.record_pass(started.elapsed());
            tracing::trace!(phase = %Phase::HandlerInvoked, "handing off to handler");

            let mut request = Request::from_parts(head, Body::from(bytes));
            request.extensions_mut().insert(Validated(parts));
            next.run(request).await
        },
        Err(rejection) => reject(&ctx, rejection, source_ip.as_deref(), started),
    }
}

/// Record, audit, and answer a rejection. Event dispatch is fire-and-forget
/// and never delays the response.
fn reject(
    ctx: &RouteGuard,
    rejection: GuardRejection,
    source_ip: Option<&str>,
    started: Instant,
) -> Response {
    ctx.state.stats.record_rejection(&rejection, started.elapsed());

    if let Some(event) = rejection.to_event(source_ip) {
        ctx.state.events.emit(event);
    }

    rejection.into_response()
}

/// Parse a query string into an object of string values. Repeated keys:
/// last one wins.
fn parse_query(query: Option<&str>) -> Value {
    let mut map = Map::new();
    if let Some(query) = query {
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            map.insert(key.into_owned(), Value::String(value.into_owned()));
        }
    }
    Value::Object(map)
}

/// Header names and values as an object of strings. Non-UTF-8 values are
/// replaced lossily rather than dropped, so they still reach the scanner.
fn headers_value(headers: &HeaderMap) -> Value {
    let mut map = Map::new();
    for (name, value) in headers {
        let value = match value.to_str() {
            Ok(value) => value.to_string(),
            Err(_) => String::from_utf8_lossy(value.as_bytes()).into_owned(),
        };
        map.insert(name.as_str().to_string(), Value::String(value));
    }
    Value::Object(map)
}

/// Cookie pairs from every `Cookie` header
fn parse_cookies(headers: &HeaderMap) -> Value {
    let mut map = Map::new();
    for value in headers.get_all(header::COOKIE) {
        if let Ok(raw) = value.to_str() {
            for pair in raw.split(';') {
                if let Some((name, value)) = pair.trim().split_once('=') {
                    map.insert(name.trim().to_string(), Value::String(value.trim().to_string()));
                }
            }
        }
    }
    Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use serde_json::json;

    #[test]
    fn test_parse_query() {
        let parsed = parse_query(Some("page=2&limit=10&q=a%20b"));
        assert_eq!(parsed, json!({"page": "2", "limit": "10", "q": "a b"}));
    }

    #[test]
    fn test_parse_query_empty() {
        assert_eq!(parse_query(None), json!({}));
        assert_eq!(parse_query(Some("")), json!({}));
    }

    #[test]
    fn test_parse_query_repeated_key_last_wins() {
        let parsed = parse_query(Some("a=1&a=2"));
        assert_eq!(parsed, json!({"a": "2"}));
    }

    #[test]
    fn test_headers_value() {
        let mut headers = HeaderMap::new();
        headers.insert("x-test", HeaderValue::from_static("value"));

        let parsed = headers_value(&headers);
        assert_eq!(parsed, json!({"x-test": "value"}));
    }

    #[test]
    fn test_parse_cookies() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("session=abc123; theme=dark"),
        );

        let parsed = parse_cookies(&headers);
        assert_eq!(parsed, json!({"session": "abc123", "theme": "dark"}));
    }

    #[test]
    fn test_parse_cookies_none() {
        assert_eq!(parse_cookies(&HeaderMap::new()), json!({}));
    }
}

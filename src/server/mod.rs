//! Reqguard HTTP server.
//!
//! An axum application whose API routes sit behind the guard pipeline:
//! - `/api/*` demo routes, each with its own validation plan
//! - `/scan` direct threat scanning
//! - `/health`, `/status`, `/stats`, `/stats/reset`
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use reqguard::server::{create_router, AppState, ServerConfig};
//!
//! let config = ServerConfig::default().with_port(8080);
//! let state = Arc::new(AppState::new(config)?);
//! let router = create_router(state);
//! ```

mod config;
mod handlers;
mod middleware;
mod state;
mod stats;

pub use config::ServerConfig;
pub use handlers::{create_router, health_check};
pub use middleware::{guard, RouteGuard, Validated};
pub use state::AppState;
pub use stats::{GuardStats, StatsSummary};

//! Configuration management.
//!
//! Supports configuration from:
//! - TOML config files
//! - Environment variables (`REQGUARD_*`)
//! - CLI arguments (for the server binary)

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{GuardError, Result};

/// Main configuration struct
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerSection,

    /// Payload traversal ceilings
    #[serde(default)]
    pub limits: LimitsConfig,

    /// Security event dispatch configuration
    #[serde(default)]
    pub events: EventsConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)
            .map_err(|e| GuardError::Config(format!("Failed to read config file: {e}")))?;

        toml::from_str(&content)
            .map_err(|e| GuardError::Config(format!("Failed to parse config: {e}")))
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(host) = std::env::var("REQGUARD_HOST") {
            config.server.host = host;
        }
        if let Ok(port) = std::env::var("REQGUARD_PORT") {
            if let Ok(port) = port.parse() {
                config.server.port = port;
            }
        }
        if let Ok(depth) = std::env::var("REQGUARD_MAX_DEPTH") {
            if let Ok(depth) = depth.parse() {
                config.limits.max_depth = depth;
            }
        }
        if let Ok(size) = std::env::var("REQGUARD_MAX_BODY_SIZE") {
            if let Ok(size) = size.parse() {
                config.limits.max_body_bytes = size;
            }
        }

        config
    }

    /// Merge with another config (other takes precedence)
    pub fn merge(self, other: Self) -> Self {
        Self {
            server: ServerSection {
                host: if other.server.host != ServerSection::default().host {
                    other.server.host
                } else {
                    self.server.host
                },
                port: if other.server.port != ServerSection::default().port {
                    other.server.port
                } else {
                    self.server.port
                },
                ..other.server
            },
            limits: other.limits,
            events: other.events,
        }
    }
}

/// HTTP server configuration section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSection {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Enable verbose logging
    pub verbose: bool,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            verbose: false,
        }
    }
}

impl ServerSection {
    /// Get the full listen address
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Payload traversal ceilings.
///
/// Enforced before any full structural scan so that adversarial deeply
/// nested payloads are rejected without exhausting the stack or CPU.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Maximum nesting depth of a scanned value
    pub max_depth: usize,

    /// Maximum number of nodes (objects, arrays, scalars) in a scanned value
    pub max_nodes: usize,

    /// Maximum request body size in bytes
    pub max_body_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_depth: 32,
            max_nodes: 50_000,
            max_body_bytes: 1024 * 1024, // 1MB
        }
    }
}

/// Security event dispatch configuration
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EventsConfig {
    /// Bounded channel capacity between the pipeline and the sink
    pub buffer_capacity: usize,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: 1024,
        }
    }
}

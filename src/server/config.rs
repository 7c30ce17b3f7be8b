//! Server configuration.

use std::net::SocketAddr;

use crate::config::{Config, LimitsConfig};

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address
    pub addr: SocketAddr,
    /// Enable threat scanning
    pub scanning_enabled: bool,
    /// Payload traversal ceilings
    pub limits: LimitsConfig,
    /// Security event channel capacity
    pub event_buffer: usize,
    /// Enable request logging
    pub logging: bool,
    /// CORS enabled
    pub cors_enabled: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            scanning_enabled: true,
            limits: LimitsConfig::default(),
            event_buffer: 1024,
            logging: true,
            cors_enabled: true,
        }
    }
}

impl ServerConfig {
    /// Build from a loaded [`Config`]
    pub fn from_config(config: &Config) -> Self {
        let addr = config
            .server
            .listen_addr()
            .parse()
            .unwrap_or_else(|_| SocketAddr::from(([127, 0, 0, 1], config.server.port)));

        Self {
            addr,
            limits: config.limits,
            event_buffer: config.events.buffer_capacity,
            ..Self::default()
        }
    }

    /// Create with custom port
    pub fn with_port(mut self, port: u16) -> Self {
        self.addr.set_port(port);
        self
    }

    /// Bind to all interfaces
    pub fn bind_all(mut self) -> Self {
        let port = self.addr.port();
        self.addr = SocketAddr::from(([0, 0, 0, 0], port));
        self
    }

    /// Set address directly
    pub fn with_addr(mut self, addr: SocketAddr) -> Self {
        self.addr = addr;
        self
    }

    /// Set payload ceilings
    pub fn with_limits(mut self, limits: LimitsConfig) -> Self {
        self.limits = limits;
        self
    }

    /// Disable threat scanning (schema validation still runs)
    pub fn without_scanning(mut self) -> Self {
        self.scanning_enabled = false;
        self
    }

    /// Set event channel capacity
    pub fn with_event_buffer(mut self, capacity: usize) -> Self {
        self.event_buffer = capacity;
        self
    }

    /// Disable logging
    pub fn without_logging(mut self) -> Self {
        self.logging = false;
        self
    }

    /// Disable CORS
    pub fn without_cors(mut self) -> Self {
        self.cors_enabled = false;
        self
    }
}

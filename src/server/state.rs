//! Application state.
//!
//! Everything a request needs is constructed once here and injected.
//! Schemas, detector patterns and limits are immutable after startup and
//! shared without locks.

use std::sync::Arc;
use std::time::{Duration, Instant};

use super::config::ServerConfig;
use super::stats::GuardStats;
use crate::error::Result;
use crate::events::{EventDispatcher, SecurityEventSink, TracingSink};
use crate::scan::{ScanLimits, ThreatScanner};
use crate::schema::SchemaCatalog;

/// Application state shared across handlers
pub struct AppState {
    /// Server configuration
    pub config: ServerConfig,
    /// Structural threat scanner
    pub scanner: ThreatScanner,
    /// Compiled schema set
    pub catalog: SchemaCatalog,
    /// Security event dispatch
    pub events: EventDispatcher,
    /// Pipeline statistics
    pub stats: GuardStats,
    /// Server start time
    pub start_time: Instant,
}

impl AppState {
    /// Create state with the default sink (structured log).
    ///
    /// Requires a running tokio runtime for the event drain task.
    pub fn new(config: ServerConfig) -> Result<Self> {
        Self::with_sink(config, Arc::new(TracingSink))
    }

    /// Create state with an explicit event sink
    pub fn with_sink(config: ServerConfig, sink: Arc<dyn SecurityEventSink>) -> Result<Self> {
        let scanner = ThreatScanner::with_limits(ScanLimits {
            max_depth: config.limits.max_depth,
            max_nodes: config.limits.max_nodes,
        });
        let catalog = SchemaCatalog::build()?;
        let events = EventDispatcher::new(sink, config.event_buffer);

        Ok(Self {
            config,
            scanner,
            catalog,
            events,
            stats: GuardStats::new(),
            start_time: Instant::now(),
        })
    }

    /// Get server uptime
    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_state_creation() {
        let state = AppState::new(ServerConfig::default()).unwrap();
        assert_eq!(state.stats.total_requests(), 0);
        assert_eq!(state.scanner.limits().max_depth, 32);
    }

    #[tokio::test]
    async fn test_state_honors_limits() {
        let mut config = ServerConfig::default();
        config.limits.max_depth = 4;

        let state = AppState::new(config).unwrap();
        assert_eq!(state.scanner.limits().max_depth, 4);
    }
}

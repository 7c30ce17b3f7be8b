//! Security event auditing.
//!
//! Threat detections and validation failures are reported as immutable
//! [`SecurityEvent`]s to an append-only [`SecurityEventSink`]. The sink is
//! an external collaborator: the core never reads events back, and a slow
//! or dead sink must never block, delay or fail an HTTP response. Dispatch
//! therefore goes through a bounded channel drained by a background task;
//! when the channel is full the event is dropped, counted and logged
//! locally.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Event severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational
    Low,
    /// Suspicious but commonly benign (e.g. schema failures)
    Medium,
    /// Likely attack traffic
    High,
    /// Active exploitation attempt
    Critical,
}

/// Immutable audit record describing a detected threat or validation
/// failure. Owned by the sink once appended.
#[derive(Debug, Clone, Serialize)]
pub struct SecurityEvent {
    /// Unique event id
    pub id: Uuid,
    /// Event category (threat category, `schema-validation`, `payload-limit`)
    pub category: String,
    /// Severity
    pub severity: Severity,
    /// Human-readable summary
    pub message: String,
    /// Client address, when known
    pub source_ip: Option<String>,
    /// Free-form structured context
    pub metadata: Value,
    /// Creation time
    pub timestamp: DateTime<Utc>,
}

impl SecurityEvent {
    /// Create an event stamped now
    pub fn new(category: impl Into<String>, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            category: category.into(),
            severity,
            message: message.into(),
            source_ip: None,
            metadata: Value::Null,
            timestamp: Utc::now(),
        }
    }

    /// Attach the client address
    pub fn with_source_ip(mut self, ip: impl Into<String>) -> Self {
        self.source_ip = Some(ip.into());
        self
    }

    /// Attach structured context
    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Append-only audit sink. Fire-and-forget: implementations must not
/// assume anyone handles their failures.
pub trait SecurityEventSink: Send + Sync {
    /// Append one event
    fn append(&self, event: SecurityEvent);
}

/// Sink that writes events to the structured log
#[derive(Debug, Default)]
pub struct TracingSink;

impl SecurityEventSink for TracingSink {
    fn append(&self, event: SecurityEvent) {
        tracing::warn!(
            event_id = %event.id,
            category = %event.category,
            severity = ?event.severity,
            source_ip = event.source_ip.as_deref().unwrap_or("-"),
            "{}",
            event.message
        );
    }
}

/// In-memory sink for tests
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<SecurityEvent>>,
}

impl MemorySink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of appended events
    pub fn events(&self) -> Vec<SecurityEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Number of appended events
    pub fn len(&self) -> usize {
        self.events.lock().map(|e| e.len()).unwrap_or(0)
    }

    /// True when nothing has been appended
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SecurityEventSink for MemorySink {
    fn append(&self, event: SecurityEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

/// Decouples event emission from the request path.
///
/// `emit` never blocks and never fails the caller: events flow through a
/// bounded channel to a background task that feeds the sink. Overflow and
/// shutdown drop the event with a local warning and a counter bump.
#[derive(Clone)]
pub struct EventDispatcher {
    tx: mpsc::Sender<SecurityEvent>,
    dropped: Arc<AtomicU64>,
}

impl EventDispatcher {
    /// Spawn the drain task and return the dispatcher.
    ///
    /// Requires a running tokio runtime.
    pub fn new(sink: Arc<dyn SecurityEventSink>, capacity: usize) -> Self {
        let (tx, mut rx) = mpsc::channel::<SecurityEvent>(capacity.max(1));

        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                sink.append(event);
            }
        });

        Self {
            tx,
            dropped: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Hand an event to the sink without waiting for it
    pub fn emit(&self, event: SecurityEvent) {
        if self.tx.try_send(event).is_err() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            tracing::warn!("security event dropped: sink backlog full or closed");
        }
    }

    /// Events dropped due to backlog or shutdown
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

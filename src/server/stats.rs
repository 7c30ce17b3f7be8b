//! Guard decision statistics.
//!
//! Tracks request counts, rejection outcomes, and decision latencies.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::{Duration, Instant};

use crate::pipeline::GuardRejection;

/// Thread-safe pipeline statistics
#[derive(Debug, Default)]
pub struct GuardStats {
    /// Total requests that entered the pipeline
    requests: AtomicU64,
    /// Requests that passed every check
    passed: AtomicU64,
    /// Requests rejected by a threat detector
    rejected_threat: AtomicU64,
    /// Requests rejected by schema validation
    rejected_schema: AtomicU64,
    /// Requests rejected by the traversal ceilings
    rejected_limit: AtomicU64,
    /// Internal errors surfaced as 500
    internal_errors: AtomicU64,
    /// Decision latencies (for percentile calculation)
    latencies: RwLock<Vec<Duration>>,
    /// Start time
    started_at: RwLock<Option<Instant>>,
}

impl GuardStats {
    /// Create new stats tracker
    pub fn new() -> Self {
        Self {
            started_at: RwLock::new(Some(Instant::now())),
            ..Default::default()
        }
    }

    /// Record a request that passed the full pipeline
    pub fn record_pass(&self, latency: Duration) {
        self.requests.fetch_add(1, Ordering::Relaxed);
        self.passed.fetch_add(1, Ordering::Relaxed);
        self.record_latency(latency);
    }

    /// Record a rejected request
    pub fn record_rejection(&self, rejection: &GuardRejection, latency: Duration) {
        self.requests.fetch_add(1, Ordering::Relaxed);
        match rejection {
            GuardRejection::Threat(_) => self.rejected_threat.fetch_add(1, Ordering::Relaxed),
            GuardRejection::Schema { .. } => self.rejected_schema.fetch_add(1, Ordering::Relaxed),
            GuardRejection::PayloadLimit(_) => self.rejected_limit.fetch_add(1, Ordering::Relaxed),
            GuardRejection::Internal => self.internal_errors.fetch_add(1, Ordering::Relaxed),
        };
        self.record_latency(latency);
    }

    fn record_latency(&self, latency: Duration) {
        if let Ok(mut latencies) = self.latencies.write() {
            latencies.push(latency);
            // Keep last 1000 latencies for percentile calculation
            if latencies.len() > 1000 {
                latencies.remove(0);
            }
        }
    }

    /// Get total requests
    pub fn total_requests(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }

    /// Get passed requests
    pub fn total_passed(&self) -> u64 {
        self.passed.load(Ordering::Relaxed)
    }

    /// Get threat rejections
    pub fn total_threats(&self) -> u64 {
        self.rejected_threat.load(Ordering::Relaxed)
    }

    /// Get schema rejections
    pub fn total_schema_failures(&self) -> u64 {
        self.rejected_schema.load(Ordering::Relaxed)
    }

    /// Get limit rejections
    pub fn total_limit_breaches(&self) -> u64 {
        self.rejected_limit.load(Ordering::Relaxed)
    }

    /// Get internal errors
    pub fn total_internal_errors(&self) -> u64 {
        self.internal_errors.load(Ordering::Relaxed)
    }

    /// Get p50 decision latency
    pub fn p50_latency(&self) -> Option<Duration> {
        self.percentile_latency(50)
    }

    /// Get p95 decision latency
    pub fn p95_latency(&self) -> Option<Duration> {
        self.percentile_latency(95)
    }

    /// Get p99 decision latency
    pub fn p99_latency(&self) -> Option<Duration> {
        self.percentile_latency(99)
    }

    /// Calculate percentile latency
    fn percentile_latency(&self, percentile: usize) -> Option<Duration> {
        let latencies = self.latencies.read().ok()?;
        if latencies.is_empty() {
            return None;
        }

        let mut sorted: Vec<_> = latencies.iter().copied().collect();
        sorted.sort();

        let idx = (sorted.len() * percentile / 100).min(sorted.len() - 1);
        Some(sorted[idx])
    }

    /// Get uptime
    pub fn uptime(&self) -> Duration {
        self.started_at
            .read()
            .ok()
            .and_then(|s| s.map(|start| start.elapsed()))
            .unwrap_or_default()
    }

    /// Get requests per second
    pub fn requests_per_second(&self) -> f64 {
        let uptime = self.uptime().as_secs_f64();
        if uptime > 0.0 {
            self.total_requests() as f64 / uptime
        } else {
            0.0
        }
    }

    /// Get summary as JSON-compatible struct
    pub fn summary(&self) -> StatsSummary {
        StatsSummary {
            total_requests: self.total_requests(),
            passed: self.total_passed(),
            rejected_threat: self.total_threats(),
            rejected_schema: self.total_schema_failures(),
            rejected_limit: self.total_limit_breaches(),
            internal_errors: self.total_internal_errors(),
            p50_latency_ms: self.p50_latency().map(|d| d.as_secs_f64() * 1000.0),
            p95_latency_ms: self.p95_latency().map(|d| d.as_secs_f64() * 1000.0),
            p99_latency_ms: self.p99_latency().map(|d| d.as_secs_f64() * 1000.0),
            uptime_secs: self.uptime().as_secs(),
            requests_per_second: self.requests_per_second(),
        }
    }

    /// Reset all statistics
    pub fn reset(&self) {
        self.requests.store(0, Ordering::Relaxed);
        self.passed.store(0, Ordering::Relaxed);
        self.rejected_threat.store(0, Ordering::Relaxed);
        self.rejected_schema.store(0, Ordering::Relaxed);
        self.rejected_limit.store(0, Ordering::Relaxed);
        self.internal_errors.store(0, Ordering::Relaxed);

        if let Ok(mut latencies) = self.latencies.write() {
            latencies.clear();
        }

        if let Ok(mut started) = self.started_at.write() {
            *started = Some(Instant::now());
        }
    }
}

/// Statistics summary for serialization.
#[derive(Debug, Clone, serde::Serialize)]
pub struct StatsSummary {
    /// Total requests that entered the pipeline.
    pub total_requests: u64,
    /// Requests that passed every check.
    pub passed: u64,
    /// Requests rejected by a threat detector.
    pub rejected_threat: u64,
    /// Requests rejected by schema validation.
    pub rejected_schema: u64,
    /// Requests rejected by the traversal ceilings.
    pub rejected_limit: u64,
    /// Internal errors surfaced as 500.
    pub internal_errors: u64,
    /// 50th percentile decision latency in milliseconds.
    pub p50_latency_ms: Option<f64>,
    /// 95th percentile decision latency in milliseconds.
    pub p95_latency_ms: Option<f64>,
    /// 99th percentile decision latency in milliseconds.
    pub p99_latency_ms: Option<f64>,
    /// Server uptime in seconds.
    pub uptime_secs: u64,
    /// Average requests per second.
    pub requests_per_second: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::{LimitBreach, ThreatCategory, ThreatFinding};
    use crate::pipeline::ValidationTarget;

    fn threat() -> GuardRejection {
        GuardRejection::Threat(ThreatFinding {
            category: ThreatCategory::Xss,
            target: ValidationTarget::Body,
            note: "matched",
        })
    }

    #[test]
    fn test_outcome_counters() {
        let stats = GuardStats::new();

        stats.record_pass(Duration::from_micros(50));
        stats.record_rejection(&threat(), Duration::from_micros(30));
        stats.record_rejection(
            &GuardRejection::PayloadLimit(LimitBreach::TooDeep { depth: 40, max: 32 }),
            Duration::from_micros(5),
        );

        assert_eq!(stats.total_requests(), 3);
        assert_eq!(stats.total_passed(), 1);
        assert_eq!(stats.total_threats(), 1);
        assert_eq!(stats.total_limit_breaches(), 1);
        assert_eq!(stats.total_schema_failures(), 0);
    }

    #[test]
    fn test_latency_percentiles() {
        let stats = GuardStats::new();

        for i in 1..=100 {
            stats.record_pass(Duration::from_millis(i));
        }

        let p50 = stats.p50_latency().unwrap();
        let p99 = stats.p99_latency().unwrap();

        assert!(p50.as_millis() >= 49 && p50.as_millis() <= 51);
        assert!(p99.as_millis() >= 98 && p99.as_millis() <= 100);
    }

    #[test]
    fn test_reset() {
        let stats = GuardStats::new();
        stats.record_pass(Duration::from_micros(10));
        stats.reset();

        assert_eq!(stats.total_requests(), 0);
        assert!(stats.p50_latency().is_none());
    }
}

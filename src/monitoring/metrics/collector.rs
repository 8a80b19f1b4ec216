//! Request metrics collector
//!
//! Tracks a sliding window of completed requests plus the number of open
//! connections, and derives the request and error rates reported in
//! every health snapshot.

use super::bounded::{BoundedPush, MAX_REQUEST_SAMPLES, prune_older_than};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Request rate, error rate and open connections at one instant
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RequestStats {
    /// Requests per minute over the window
    pub request_rate: f64,
    /// Percentage of windowed requests that ended in 5xx
    pub error_rate: f64,
    /// In-flight HTTP requests plus realtime sessions
    pub active_connections: u64,
}

/// Collector for request-level metrics
#[derive(Debug)]
pub struct RequestMetricsCollector {
    window: Duration,
    samples: Mutex<VecDeque<(Instant, bool)>>,
    in_flight: AtomicU64,
    sessions: AtomicU64,
    total: AtomicU64,
}

impl RequestMetricsCollector {
    /// Create a collector with the given sliding window
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            samples: Mutex::new(VecDeque::new()),
            in_flight: AtomicU64::new(0),
            sessions: AtomicU64::new(0),
            total: AtomicU64::new(0),
        }
    }

    /// Mark a request as started; the guard marks it finished on drop
    pub fn request_started(self: &Arc<Self>) -> ConnectionGuard {
        self.in_flight.fetch_add(1, Ordering::Relaxed);
        ConnectionGuard {
            collector: Arc::clone(self),
            kind: ConnectionKind::Request,
        }
    }

    /// Mark a realtime session as open; the guard closes it on drop
    pub fn session_opened(self: &Arc<Self>) -> ConnectionGuard {
        self.sessions.fetch_add(1, Ordering::Relaxed);
        ConnectionGuard {
            collector: Arc::clone(self),
            kind: ConnectionKind::Session,
        }
    }

    /// Record a completed request by status code
    pub fn record_request(&self, status_code: u16) {
        self.record_request_at(status_code, Instant::now());
    }

    fn record_request_at(&self, status_code: u16, at: Instant) {
        let is_error = status_code >= 500;
        let mut samples = self.samples.lock();
        prune_older_than(&mut samples, self.window, at);
        samples.push_bounded((at, is_error), MAX_REQUEST_SAMPLES);
        self.total.fetch_add(1, Ordering::Relaxed);
    }

    /// Current request statistics
    pub fn stats(&self) -> RequestStats {
        let now = Instant::now();
        let (count, errors) = {
            let mut samples = self.samples.lock();
            prune_older_than(&mut samples, self.window, now);
            let errors = samples.iter().filter(|(_, is_error)| *is_error).count();
            (samples.len(), errors)
        };

        let minutes = self.window.as_secs_f64() / 60.0;
        let request_rate = if minutes > 0.0 {
            count as f64 / minutes
        } else {
            0.0
        };
        let error_rate = if count > 0 {
            errors as f64 / count as f64 * 100.0
        } else {
            0.0
        };

        RequestStats {
            request_rate,
            error_rate,
            active_connections: self.active_connections(),
        }
    }

    /// In-flight requests plus open sessions
    pub fn active_connections(&self) -> u64 {
        self.in_flight.load(Ordering::Relaxed) + self.sessions.load(Ordering::Relaxed)
    }

    /// Open realtime sessions
    pub fn open_sessions(&self) -> u64 {
        self.sessions.load(Ordering::Relaxed)
    }

    /// Requests recorded since start
    pub fn total_requests(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }
}

impl Default for RequestMetricsCollector {
    fn default() -> Self {
        Self::new(Duration::from_secs(60))
    }
}

#[derive(Debug, Clone, Copy)]
enum ConnectionKind {
    Request,
    Session,
}

/// Decrements the matching counter when dropped
#[derive(Debug)]
pub struct ConnectionGuard {
    collector: Arc<RequestMetricsCollector>,
    kind: ConnectionKind,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        let counter = match self.kind {
            ConnectionKind::Request => &self.collector.in_flight,
            ConnectionKind::Session => &self.collector.sessions,
        };
        counter.fetch_sub(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
pub(super) fn record_at(collector: &RequestMetricsCollector, status_code: u16, at: Instant) {
    collector.record_request_at(status_code, at);
}

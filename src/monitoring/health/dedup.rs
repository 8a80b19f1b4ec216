//! Request deduplication for on-demand health checks
//!
//! Every caller arriving while a check is running awaits the same shared
//! future, so a burst of requests costs one probe cycle. A result that
//! completed less than `min_interval` ago is handed out directly.

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::utils::error::{HealthcastError, Result};

type SharedRun<T> = Shared<BoxFuture<'static, std::result::Result<T, String>>>;

struct DedupState<T> {
    in_flight: Option<(u64, SharedRun<T>)>,
    last: Option<(T, Instant)>,
    generation: u64,
}

struct Inner<T> {
    state: Mutex<DedupState<T>>,
    min_interval: Duration,
    max_reuse: Duration,
    runs: AtomicU64,
}

impl<T> Inner<T> {
    fn finish(&self, generation: u64, value: Option<(T, Instant)>) {
        let mut state = self.state.lock();
        if state
            .in_flight
            .as_ref()
            .is_some_and(|(current, _)| *current == generation)
        {
            state.in_flight = None;
        }
        if value.is_some() {
            state.last = value;
        }
    }
}

/// Collapses concurrent on-demand checks into one execution
pub struct RequestDeduplicator<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for RequestDeduplicator<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> RequestDeduplicator<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create a deduplicator
    ///
    /// `max_reuse` bounds how old a remembered result may be when it is
    /// returned for a request arriving inside `min_interval`.
    pub fn new(min_interval: Duration, max_reuse: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(DedupState {
                    in_flight: None,
                    last: None,
                    generation: 0,
                }),
                min_interval,
                max_reuse,
                runs: AtomicU64::new(0),
            }),
        }
    }

    /// Run `producer` unless a run is in flight or one just completed
    ///
    /// The producer executes on its own task; if it panics every waiting
    /// caller receives a `Dedup` error and the next call starts afresh.
    pub async fn get_or_run<F, Fut>(&self, producer: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        let (generation, run) = {
            let mut state = self.inner.state.lock();

            if let Some((value, completed_at)) = &state.last {
                let age = completed_at.elapsed();
                if age < self.inner.min_interval && age < self.inner.max_reuse {
                    debug!("Returning result completed {:?} ago", age);
                    return Ok(value.clone());
                }
            }

            match &state.in_flight {
                Some((generation, run)) => {
                    debug!("Joining in-flight health check");
                    (*generation, run.clone())
                }
                None => {
                    state.generation += 1;
                    let generation = state.generation;
                    self.inner.runs.fetch_add(1, Ordering::Relaxed);

                    let work = producer();
                    let inner = Arc::clone(&self.inner);
                    // The spawned task records the result itself, so it is kept
                    // even if every caller goes away before completion.
                    let task = tokio::spawn(async move {
                        let value = work.await;
                        inner.finish(generation, Some((value.clone(), Instant::now())));
                        value
                    });

                    let run: SharedRun<T> = async move {
                        task.await
                            .map_err(|e| format!("health check task failed: {}", e))
                    }
                    .boxed()
                    .shared();

                    state.in_flight = Some((generation, run.clone()));
                    (generation, run)
                }
            }
        };

        match run.await {
            Ok(value) => Ok(value),
            Err(message) => {
                warn!("{}", message);
                self.inner.finish(generation, None);
                Err(HealthcastError::dedup(message))
            }
        }
    }

    /// Number of producer executions so far
    pub fn runs(&self) -> u64 {
        self.inner.runs.load(Ordering::Relaxed)
    }

    /// Whether a run is currently in flight
    pub fn is_running(&self) -> bool {
        self.inner.state.lock().in_flight.is_some()
    }

    /// Most recent result and its age
    pub fn last_result(&self) -> Option<(T, Duration)> {
        self.inner
            .state
            .lock()
            .last
            .as_ref()
            .map(|(value, at)| (value.clone(), at.elapsed()))
    }
}

//! Double-click protection
//!
//! Deduplicates concurrent invocations of the same logical operation and
//! rejects repeats that arrive too soon after the previous one finished.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::{BoxFuture, FutureExt, Shared};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::config::ThrottleConfig;

/// Throttle rejections
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ThrottleError {
    #[error("Please wait {} more second(s) before trying again", wait_secs(.remaining))]
    TooSoon { key: String, remaining: Duration },
}

impl ThrottleError {
    pub fn remaining(&self) -> Duration {
        match self {
            Self::TooSoon { remaining, .. } => *remaining,
        }
    }
}

fn wait_secs(remaining: &Duration) -> u64 {
    remaining.as_millis().div_ceil(1000).max(1) as u64
}

type SharedCall<T> = Shared<BoxFuture<'static, T>>;

/// Bookkeeping for one key
struct CallState<T: Clone> {
    in_flight: Option<SharedCall<T>>,
    started_at: Instant,
    completed_at: Option<Instant>,
}

impl<T: Clone> CallState<T> {
    fn last_activity(&self) -> Instant {
        self.completed_at.unwrap_or(self.started_at)
    }
}

/// Per-key call deduplication with a cool-down window
///
/// Cloning shares the underlying registry.
pub struct ClickThrottler<T: Clone> {
    calls: Arc<Mutex<HashMap<String, CallState<T>>>>,
    config: ThrottleConfig,
}

impl<T: Clone> Clone for ClickThrottler<T> {
    fn clone(&self) -> Self {
        Self {
            calls: self.calls.clone(),
            config: self.config.clone(),
        }
    }
}

impl<T> ClickThrottler<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(config: ThrottleConfig) -> Self {
        debug!(?config, "ClickThrottler::new: called");
        Self {
            calls: Arc::new(Mutex::new(HashMap::new())),
            config,
        }
    }

    /// Run `f` under `key`
    ///
    /// Joins an in-flight call with the same key instead of starting another;
    /// rejects with [`ThrottleError::TooSoon`] when the previous call finished
    /// less than `delay` ago.
    pub async fn throttled_call<F, Fut>(&self, key: &str, f: F, delay: Duration) -> Result<T, ThrottleError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        debug!(%key, ?delay, "ClickThrottler::throttled_call: called");
        let call = {
            let mut calls = self.calls.lock().await;
            self.cleanup(&mut calls);

            let existing = calls.get(key).map(|s| (s.in_flight.clone(), s.completed_at));
            match existing {
                Some((Some(call), _)) => {
                    debug!(%key, "ClickThrottler::throttled_call: joining in-flight call");
                    call
                }
                Some((None, Some(done))) if done.elapsed() < delay => {
                    let remaining = delay.saturating_sub(done.elapsed());
                    info!(%key, ?remaining, "Throttled repeated call");
                    return Err(ThrottleError::TooSoon {
                        key: key.to_string(),
                        remaining,
                    });
                }
                _ => {
                    debug!(%key, "ClickThrottler::throttled_call: starting call");
                    let call = self.register(key, f());
                    calls.insert(
                        key.to_string(),
                        CallState {
                            in_flight: Some(call.clone()),
                            started_at: Instant::now(),
                            completed_at: None,
                        },
                    );
                    call
                }
            }
        };
        Ok(call.await)
    }

    /// Wrap the call so it records its own completion
    fn register<Fut>(&self, key: &str, fut: Fut) -> SharedCall<T>
    where
        Fut: Future<Output = T> + Send + 'static,
    {
        let calls = self.calls.clone();
        let key = key.to_string();
        async move {
            let output = fut.await;
            if let Some(state) = calls.lock().await.get_mut(&key) {
                state.in_flight = None;
                state.completed_at = Some(Instant::now());
            }
            debug!(%key, "ClickThrottler: call completed");
            output
        }
        .boxed()
        .shared()
    }

    /// Drop finished entries older than the retention window
    fn cleanup(&self, calls: &mut HashMap<String, CallState<T>>) {
        let retention = Duration::from_secs(self.config.retention_secs);
        let before = calls.len();
        calls.retain(|_, state| state.in_flight.is_some() || state.last_activity().elapsed() <= retention);
        if calls.len() != before {
            debug!(removed = before - calls.len(), "ClickThrottler::cleanup: pruned entries");
        }
    }

    /// Throttled call with the default delay
    pub async fn call<F, Fut>(&self, key: &str, f: F) -> Result<T, ThrottleError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        let delay = Duration::from_millis(self.config.default_delay_ms);
        self.throttled_call(key, f, delay).await
    }

    /// Content generation (3 s by default)
    pub async fn throttle_generation<F, Fut>(&self, key: &str, f: F) -> Result<T, ThrottleError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        let delay = Duration::from_millis(self.config.generation_delay_ms);
        self.throttled_call(key, f, delay).await
    }

    /// Sheet saves (1 s by default)
    pub async fn throttle_save<F, Fut>(&self, key: &str, f: F) -> Result<T, ThrottleError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        let delay = Duration::from_millis(self.config.save_delay_ms);
        self.throttled_call(key, f, delay).await
    }

    /// Client analysis (5 s by default)
    pub async fn throttle_analysis<F, Fut>(&self, key: &str, f: F) -> Result<T, ThrottleError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        let delay = Duration::from_millis(self.config.analysis_delay_ms);
        self.throttled_call(key, f, delay).await
    }

    /// Whether a call under `key` is currently running
    pub async fn is_in_flight(&self, key: &str) -> bool {
        self.calls
            .lock()
            .await
            .get(key)
            .is_some_and(|s| s.in_flight.is_some())
    }

    /// Number of tracked keys
    pub async fn tracked(&self) -> usize {
        self.calls.lock().await.len()
    }
}

/// Throttle key for a single-row operation
pub fn row_key(sheet_id: &str, row_index: usize) -> String {
    format!("gen_{}_row{}", sheet_id, row_index)
}

/// Throttle key for a multi-row operation; row order does not matter
pub fn rows_key(sheet_id: &str, row_indices: &[usize]) -> String {
    let mut rows = row_indices.to_vec();
    rows.sort_unstable();
    rows.dedup();
    let rows: Vec<String> = rows.iter().map(|r| r.to_string()).collect();
    format!("gen_{}_rows{}", sheet_id, rows.join("-"))
}

//! Retry policy for store operations, and a store wrapper that applies it.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use crate::ports::{KvStore, StoreError};

/// Bounded exponential backoff.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Delay before the first retry.
    pub base_delay: Duration,

    /// Backoff multiplier for exponential backoff.
    pub multiplier: f64,

    /// Total attempts including the first one.
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(200),
            multiplier: 2.0,
            max_attempts: 5,
        }
    }
}

impl RetryPolicy {
    /// Delay after the `attempts`-th failure (1-indexed).
    ///
    /// delay = base_delay * multiplier^(attempts - 1)
    pub fn next_delay(&self, attempts: u32) -> Duration {
        let base_secs = self.base_delay.as_secs_f64();
        let delay_secs = base_secs * self.multiplier.powi(attempts.saturating_sub(1) as i32);
        Duration::from_secs_f64(delay_secs)
    }

    /// Run `op` until it succeeds or the attempt budget is spent.
    /// The last error is returned when every attempt fails.
    pub async fn run<T, F, Fut>(&self, what: &str, mut op: F) -> Result<T, StoreError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, StoreError>>,
    {
        let mut attempts = 0;
        loop {
            attempts += 1;
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if attempts >= self.max_attempts.max(1) => return Err(err),
                Err(err) => {
                    let delay = self.next_delay(attempts);
                    warn!(
                        operation = what,
                        attempt = attempts,
                        max_attempts = self.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "store operation failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

/// Wraps a store so every `get` / `set` is retried with a [`RetryPolicy`].
pub struct RetryingStore {
    inner: Arc<dyn KvStore>,
    policy: RetryPolicy,
}

impl RetryingStore {
    pub fn new(inner: Arc<dyn KvStore>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl KvStore for RetryingStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.policy.run("GET", || self.inner.get(key)).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.policy.run("SET", || self.inner.set(key, value)).await
    }
}

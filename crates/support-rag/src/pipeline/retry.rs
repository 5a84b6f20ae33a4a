//! Retry policy with exponential backoff and an elapsed-time budget
//!
//! One policy is shared by every pipeline stage. Providers never retry on their
//! own; the orchestrator wraps each stage call in [`RetryPolicy::run`].

use std::fmt;
use std::future::Future;
use std::time::Duration;

use tokio::time::{sleep, Instant};

use crate::config::RetryConfig;
use crate::error::{Error, Result};

/// Decides whether an error is worth another attempt
pub type RetryClassifier = fn(&Error) -> bool;

/// Bounded retry with exponential backoff
#[derive(Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    initial_backoff: Duration,
    max_backoff: Duration,
    multiplier: f64,
    max_elapsed: Duration,
    jitter: bool,
    classifier: RetryClassifier,
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .field("initial_backoff", &self.initial_backoff)
            .field("max_backoff", &self.max_backoff)
            .field("multiplier", &self.multiplier)
            .field("max_elapsed", &self.max_elapsed)
            .field("jitter", &self.jitter)
            .finish()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

impl RetryPolicy {
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            initial_backoff: Duration::from_millis(config.initial_backoff_ms),
            max_backoff: Duration::from_millis(config.max_backoff_ms),
            multiplier: config.multiplier.max(1.0),
            max_elapsed: config.stage_timeout(),
            jitter: config.jitter,
            classifier: Error::is_retriable,
        }
    }

    /// Replace the retriable-kind classifier
    pub fn with_classifier(mut self, classifier: RetryClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Disable delay randomisation
    pub fn without_jitter(mut self) -> Self {
        self.jitter = false;
        self
    }

    /// Delay after the given failed attempt (1-based)
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(32) as i32;
        let base_ms = self.initial_backoff.as_millis() as f64 * self.multiplier.powi(exponent);
        let capped_ms = base_ms.min(self.max_backoff.as_millis() as f64);

        // ±25% jitter
        let delay_ms = if self.jitter {
            let spread = capped_ms / 4.0;
            (capped_ms + (rand::random::<f64>() * 2.0 - 1.0) * spread).max(0.0)
        } else {
            capped_ms
        };

        Duration::from_millis(delay_ms as u64)
    }

    /// Run `operation` until it succeeds, fails permanently or exhausts the budget
    ///
    /// The last error is returned when attempts run out. When the elapsed budget
    /// expires mid-attempt the in-flight future is dropped and `Error::Timeout`
    /// is returned.
    pub async fn run<F, Fut, T>(&self, operation: &str, mut f: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let started = Instant::now();
        match tokio::time::timeout(self.max_elapsed, self.attempt_loop(operation, &mut f, started))
            .await
        {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    "{} exceeded its {:?} budget",
                    operation,
                    self.max_elapsed
                );
                Err(Error::Timeout {
                    operation: operation.to_string(),
                    elapsed: started.elapsed(),
                })
            }
        }
    }

    async fn attempt_loop<F, Fut, T>(
        &self,
        operation: &str,
        f: &mut F,
        started: Instant,
    ) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 1;

        loop {
            match f().await {
                Ok(value) => {
                    if attempt > 1 {
                        tracing::debug!("{} succeeded on attempt {}", operation, attempt);
                    }
                    return Ok(value);
                }
                Err(e) => {
                    if !(self.classifier)(&e) {
                        return Err(e);
                    }
                    if attempt >= self.max_attempts {
                        tracing::warn!(
                            "{} failed after {} attempts: {}",
                            operation,
                            attempt,
                            e
                        );
                        return Err(e);
                    }

                    let delay = self.backoff_for(attempt);
                    if started.elapsed() + delay >= self.max_elapsed {
                        tracing::warn!(
                            "{} failed on attempt {} and the next retry would exceed its budget: {}",
                            operation,
                            attempt,
                            e
                        );
                        return Err(e);
                    }

                    tracing::warn!(
                        "{} failed (attempt {}/{}), retrying in {:?}: {}",
                        operation,
                        attempt,
                        self.max_attempts,
                        delay,
                        e
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

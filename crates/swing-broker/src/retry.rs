//! Bounded retry-with-sleep primitive.
//!
//! Every blocking external call in the system is expressed through
//! `RetryPolicy::run`, so attempt counting, inter-attempt sleeps and
//! retry logging are uniform. What happens on exhaustion is the
//! caller's choice, not a property of the policy.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::sleep;
use tracing::{debug, warn};

/// Result of a single attempt.
#[derive(Debug)]
pub enum Attempt<T, E> {
    /// The operation produced its value.
    Ready(T),
    /// Retryable condition (transient failure, "not yet"); the message
    /// is logged with the attempt count.
    Again(String),
    /// Non-retryable failure; returned to the caller immediately.
    Fail(E),
}

/// Terminal result of a retried operation.
#[derive(Debug)]
pub enum Outcome<T, E> {
    /// An attempt succeeded.
    Done(T),
    /// All attempts were consumed without success.
    Exhausted,
    /// An attempt failed in a way retrying cannot fix.
    Failed(E),
}

impl<T, E> Outcome<T, E> {
    /// The success value, if any.
    pub fn done(self) -> Option<T> {
        match self {
            Self::Done(v) => Some(v),
            _ => None,
        }
    }
}

/// Attempt/delay budget from configuration.
///
/// Serde shape used inside component configs; `policy()` produces the
/// runnable form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryBudget {
    /// Maximum number of attempts (at least 1).
    pub attempts: u32,
    /// Sleep between attempts, milliseconds.
    pub delay_ms: u64,
}

impl RetryBudget {
    pub fn new(attempts: u32, delay_ms: u64) -> Self {
        Self { attempts, delay_ms }
    }

    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.attempts, Duration::from_millis(self.delay_ms))
    }
}

/// Reusable bounded-retry value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Run `op` up to `max_attempts` times, sleeping `delay` between
    /// attempts. `op` receives the 1-based attempt number.
    pub async fn run<T, E, F, Fut>(&self, label: &str, mut op: F) -> Outcome<T, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Attempt<T, E>>,
        E: fmt::Display,
    {
        for attempt in 1..=self.max_attempts {
            match op(attempt).await {
                Attempt::Ready(value) => {
                    debug!(label, attempt, "operation succeeded");
                    return Outcome::Done(value);
                }
                Attempt::Fail(err) => {
                    warn!(label, attempt, error = %err, "non-retryable failure");
                    return Outcome::Failed(err);
                }
                Attempt::Again(why) => {
                    warn!(
                        label,
                        attempt,
                        max_attempts = self.max_attempts,
                        why = %why,
                        "attempt unsuccessful"
                    );
                    if attempt < self.max_attempts {
                        sleep(self.delay).await;
                    }
                }
            }
        }

        warn!(label, max_attempts = self.max_attempts, "attempts exhausted");
        Outcome::Exhausted
    }
}

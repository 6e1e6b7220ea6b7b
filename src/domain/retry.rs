//! Retry with exponential backoff.
//!
//! [`RetryState`] owns the attempt counter, the backoff arithmetic and the
//! retry/exhaustion logging. The executors differ only in how they suspend:
//! the blocking one through a [`Wait`], the async one through an [`AsyncWait`]
//! (the tokio timer by default). The wait before attempt `k` (k >= 2) is
//! always `base_delay * backoff_factor^(k-2)`.
//!
//! Dropping the future of the async executor while it waits abandons the wait
//! and makes no further attempt.

use crate::domain::error::TradingSystemError;
use crate::domain::operation::{AsyncOperation, Operation};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);
pub const DEFAULT_BACKOFF_FACTOR: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    backoff_factor: f64,
}

impl RetryPolicy {
    pub fn new(
        max_attempts: u32,
        base_delay: Duration,
        backoff_factor: f64,
    ) -> Result<Self, TradingSystemError> {
        if max_attempts < 1 {
            return Err(TradingSystemError::configuration(
                "max_attempts must be at least 1",
            ));
        }
        if !backoff_factor.is_finite() || backoff_factor < 1.0 {
            return Err(TradingSystemError::configuration(format!(
                "backoff_factor must be a finite number >= 1, got {backoff_factor}"
            )));
        }
        Ok(Self {
            max_attempts,
            base_delay,
            backoff_factor,
        })
    }

    /// Same as [`RetryPolicy::new`] with the base delay in (fractional) seconds.
    pub fn from_secs(
        max_attempts: u32,
        base_delay_secs: f64,
        backoff_factor: f64,
    ) -> Result<Self, TradingSystemError> {
        let base_delay = Duration::try_from_secs_f64(base_delay_secs).map_err(|_| {
            TradingSystemError::configuration(format!(
                "base_delay must be a finite number >= 0, got {base_delay_secs}"
            ))
        })?;
        Self::new(max_attempts, base_delay, backoff_factor)
    }

    /// Single attempt, no waiting.
    pub fn once() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            backoff_factor: 1.0,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    pub fn backoff_factor(&self) -> f64 {
        self.backoff_factor
    }

    /// Waits between consecutive attempts, in order.
    pub fn schedule(&self) -> Vec<Duration> {
        let mut state = RetryState::new(self);
        std::iter::from_fn(|| state.on_failure()).collect()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
            backoff_factor: DEFAULT_BACKOFF_FACTOR,
        }
    }
}

/// Per-invocation retry bookkeeping.
#[derive(Debug, Clone)]
pub struct RetryState {
    attempt: u32,
    delay: Duration,
    max_attempts: u32,
    backoff_factor: f64,
}

impl RetryState {
    pub fn new(policy: &RetryPolicy) -> Self {
        Self {
            attempt: 1,
            delay: policy.base_delay,
            max_attempts: policy.max_attempts,
            backoff_factor: policy.backoff_factor,
        }
    }

    /// The attempt currently in flight, starting at 1.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Record a failure of the current attempt. Returns the wait before the
    /// next attempt, or `None` once the attempt budget is spent.
    pub fn on_failure(&mut self) -> Option<Duration> {
        if self.attempt >= self.max_attempts {
            return None;
        }
        let wait = self.delay;
        self.delay = Duration::try_from_secs_f64(self.delay.as_secs_f64() * self.backoff_factor)
            .unwrap_or(Duration::MAX);
        self.attempt += 1;
        Some(wait)
    }
}

/// Blocking suspension between attempts.
pub trait Wait: Send + Sync {
    fn wait(&self, delay: Duration);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadWait;

impl Wait for ThreadWait {
    fn wait(&self, delay: Duration) {
        std::thread::sleep(delay);
    }
}

pub type WaitFuture<'a> = Pin<Box<dyn Future<Output = ()> + Send + 'a>>;

/// Cooperative suspension between attempts. Dropping the returned future
/// abandons the wait.
pub trait AsyncWait: Send + Sync {
    fn wait(&self, delay: Duration) -> WaitFuture<'_>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TokioWait;

impl AsyncWait for TokioWait {
    fn wait(&self, delay: Duration) -> WaitFuture<'_> {
        Box::pin(tokio::time::sleep(delay))
    }
}

pub struct Retrying<O> {
    inner: O,
    policy: RetryPolicy,
    waiter: Arc<dyn Wait>,
    async_waiter: Arc<dyn AsyncWait>,
}

/// Re-invoke `inner` on failure according to `policy`.
pub fn with_retry<O>(inner: O, policy: RetryPolicy) -> Retrying<O> {
    Retrying {
        inner,
        policy,
        waiter: Arc::new(ThreadWait),
        async_waiter: Arc::new(TokioWait),
    }
}

impl<O> Retrying<O> {
    /// Replace the blocking wait used by the synchronous executor.
    pub fn with_waiter(mut self, waiter: Arc<dyn Wait>) -> Self {
        self.waiter = waiter;
        self
    }

    /// Replace the cooperative wait used by the async executor.
    pub fn with_async_waiter(mut self, waiter: Arc<dyn AsyncWait>) -> Self {
        self.async_waiter = waiter;
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }
}

impl RetryState {
    /// Decide what follows a failed attempt of `name`: the wait before the
    /// next attempt, or `err` back once the budget is spent.
    pub fn after_failure(
        &mut self,
        name: &str,
        err: TradingSystemError,
    ) -> Result<Duration, TradingSystemError> {
        let attempt = self.attempt;
        match self.on_failure() {
            Some(delay) => {
                tracing::warn!(
                    operation = %name,
                    attempt,
                    error_kind = %err.kind(),
                    "{} attempt {} failed: {}. Retrying in {:.3}s",
                    name,
                    attempt,
                    err,
                    delay.as_secs_f64()
                );
                Ok(delay)
            }
            None => {
                tracing::error!(
                    operation = %name,
                    attempts = attempt,
                    error_kind = %err.kind(),
                    "{} failed after {} attempts: {}",
                    name,
                    attempt,
                    err
                );
                Err(err)
            }
        }
    }
}

impl<A, O> Operation<A> for Retrying<O>
where
    A: Clone,
    O: Operation<A>,
{
    type Output = O::Output;

    fn name(&self) -> &str {
        self.inner.name()
    }

    fn call(&self, args: A) -> Result<O::Output, TradingSystemError> {
        let mut state = RetryState::new(&self.policy);
        loop {
            match self.inner.call(args.clone()) {
                Ok(value) => return Ok(value),
                Err(err) => self.waiter.wait(state.after_failure(self.inner.name(), err)?),
            }
        }
    }
}

impl<A, O> AsyncOperation<A> for Retrying<O>
where
    A: Clone + Send,
    O: AsyncOperation<A>,
{
    type Output = O::Output;

    fn name(&self) -> &str {
        self.inner.name()
    }

    fn call(
        &self,
        args: A,
    ) -> impl Future<Output = Result<O::Output, TradingSystemError>> + Send {
        async move {
            let mut state = RetryState::new(&self.policy);
            loop {
                match self.inner.call(args.clone()).await {
                    Ok(value) => return Ok(value),
                    Err(err) => {
                        let delay = state.after_failure(self.inner.name(), err)?;
                        self.async_waiter.wait(delay).await;
                    }
                }
            }
        }
    }
}

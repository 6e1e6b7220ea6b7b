//! Wall-clock timing around an operation.
//!
//! Every invocation emits exactly one [`PerformanceRecord`] to the configured
//! sink, whether the wrapped operation succeeds or fails. Errors pass through
//! unchanged.

use crate::domain::error::{ErrorKind, TradingSystemError};
use crate::domain::operation::{AsyncOperation, Operation};
use crate::ports::telemetry_port::PerformanceSink;
use chrono::{DateTime, Utc};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure(ErrorKind),
}

#[derive(Debug, Clone)]
pub struct PerformanceRecord {
    pub operation: String,
    pub duration: Duration,
    pub outcome: Outcome,
    /// When the invocation started.
    pub timestamp: DateTime<Utc>,
}

impl PerformanceRecord {
    pub fn is_success(&self) -> bool {
        self.outcome == Outcome::Success
    }
}

pub struct Timed<O> {
    inner: O,
    sink: Arc<dyn PerformanceSink>,
}

/// Wrap `inner` so each call reports its duration and outcome to `sink`.
pub fn with_timing<O>(inner: O, sink: Arc<dyn PerformanceSink>) -> Timed<O> {
    Timed { inner, sink }
}

impl<O> Timed<O> {
    fn emit<T>(
        &self,
        operation: &str,
        timestamp: DateTime<Utc>,
        duration: Duration,
        result: &Result<T, TradingSystemError>,
    ) {
        let outcome = match result {
            Ok(_) => Outcome::Success,
            Err(e) => Outcome::Failure(e.kind()),
        };
        self.sink.record(&PerformanceRecord {
            operation: operation.to_string(),
            duration,
            outcome,
            timestamp,
        });
    }
}

impl<A, O> Operation<A> for Timed<O>
where
    O: Operation<A>,
{
    type Output = O::Output;

    fn name(&self) -> &str {
        self.inner.name()
    }

    fn call(&self, args: A) -> Result<O::Output, TradingSystemError> {
        let timestamp = Utc::now();
        let start = Instant::now();
        let result = self.inner.call(args);
        self.emit(self.inner.name(), timestamp, start.elapsed(), &result);
        result
    }
}

impl<A, O> AsyncOperation<A> for Timed<O>
where
    A: Send,
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
            let timestamp = Utc::now();
            // tokio's clock includes time spent suspended inside the operation
            let start = tokio::time::Instant::now();
            let result = self.inner.call(args).await;
            self.emit(self.inner.name(), timestamp, start.elapsed(), &result);
            result
        }
    }
}

//! Named operations that the wrappers compose around.
//!
//! Multiple positional arguments are passed as a tuple, named arguments as a
//! struct. Every wrapper implements the same trait with the same `A` and
//! `Output` as the operation it wraps, so stacks read inside-out in the order
//! the caller writes them.

use crate::domain::error::TradingSystemError;
use std::future::Future;

/// A named synchronous operation.
pub trait Operation<A> {
    type Output;

    /// Identity used by performance records and cache fingerprints.
    fn name(&self) -> &str;

    fn call(&self, args: A) -> Result<Self::Output, TradingSystemError>;
}

/// A named operation that may suspend while it runs.
pub trait AsyncOperation<A>: Send + Sync {
    type Output: Send;

    fn name(&self) -> &str;

    fn call(
        &self,
        args: A,
    ) -> impl Future<Output = Result<Self::Output, TradingSystemError>> + Send;
}

/// A closure lifted into an [`Operation`] or [`AsyncOperation`].
#[derive(Debug, Clone)]
pub struct Named<F> {
    name: String,
    f: F,
}

/// Lift a synchronous closure. Its error type is classified into the taxonomy
/// through `Into<TradingSystemError>`.
pub fn op<F>(name: impl Into<String>, f: F) -> Named<F> {
    Named {
        name: name.into(),
        f,
    }
}

/// Lift a closure returning a future.
pub fn async_op<F>(name: impl Into<String>, f: F) -> AsyncNamed<F> {
    AsyncNamed {
        name: name.into(),
        f,
    }
}

impl<F> Named<F> {
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<A, T, E, F> Operation<A> for Named<F>
where
    F: Fn(A) -> Result<T, E>,
    E: Into<TradingSystemError>,
{
    type Output = T;

    fn name(&self) -> &str {
        &self.name
    }

    fn call(&self, args: A) -> Result<T, TradingSystemError> {
        (self.f)(args).map_err(Into::into)
    }
}

#[derive(Debug, Clone)]
pub struct AsyncNamed<F> {
    name: String,
    f: F,
}

impl<F> AsyncNamed<F> {
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<A, T, E, F, Fut> AsyncOperation<A> for AsyncNamed<F>
where
    F: Fn(A) -> Fut + Send + Sync,
    Fut: Future<Output = Result<T, E>> + Send,
    T: Send,
    E: Into<TradingSystemError>,
{
    type Output = T;

    fn name(&self) -> &str {
        &self.name
    }

    fn call(&self, args: A) -> impl Future<Output = Result<T, TradingSystemError>> + Send {
        let fut = (self.f)(args);
        async move { fut.await.map_err(Into::into) }
    }
}

//! Cancellation plumbing for in-flight requests
//!
//! Every request issued by this crate returns a [`CancellableRequest`]: a
//! future that races the underlying transport operation against a
//! cancellation token. The token travels with the wrapper through every
//! chaining combinator, so a chain of any depth can be cancelled from its
//! outermost link and the single shared operation is aborted exactly once.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, OnceLock};
use std::task::{Context, Poll};

use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;

use crate::errors::{HttpollError, Result};

/// Message attached to a cancellation when none is supplied
pub const DEFAULT_CANCEL_MESSAGE: &str = "Request cancelled";

struct SourceInner {
    token: CancellationToken,
    message: OnceLock<String>,
}

/// Shared cancel trigger for one request chain.
///
/// Cloning shares the same token; cancelling any clone cancels them all.
/// The first `cancel` call wins the message slot, later calls are no-ops
/// on it (the token itself is idempotent).
#[derive(Clone)]
pub(crate) struct CancelSource {
    inner: Arc<SourceInner>,
}

impl CancelSource {
    pub(crate) fn new() -> Self {
        Self {
            inner: Arc::new(SourceInner {
                token: CancellationToken::new(),
                message: OnceLock::new(),
            }),
        }
    }

    pub(crate) fn cancel(&self, message: Option<&str>) {
        let _ = self
            .inner
            .message
            .set(message.unwrap_or(DEFAULT_CANCEL_MESSAGE).to_string());
        self.inner.token.cancel();
    }

    pub(crate) async fn cancelled(&self) {
        self.inner.token.cancelled().await;
    }

    pub(crate) fn reason(&self) -> String {
        self.inner
            .message
            .get()
            .cloned()
            .unwrap_or_else(|| DEFAULT_CANCEL_MESSAGE.to_string())
    }
}

/// Detached cancel capability for a request chain.
///
/// Obtained from [`CancellableRequest::cancel_handle`]; lets callers keep
/// the ability to abort a request after the future itself has been awaited
/// or moved elsewhere.
#[derive(Clone)]
pub struct CancelHandle {
    source: CancelSource,
}

impl CancelHandle {
    /// Abort the underlying operation. `message` becomes the payload of the
    /// resulting [`HttpollError::Cancelled`]; defaults to "Request cancelled".
    pub fn cancel(&self, message: Option<&str>) {
        self.source.cancel(message);
    }
}

/// An in-flight transport operation that can be cancelled through itself.
///
/// Resolves to `Ok(T)` or, when cancelled, to
/// [`HttpollError::Cancelled`] carrying the cancel message. The chaining
/// combinators (`map`, `and_then`, `map_err`, `or_else`, `finally`) each
/// return a new `CancellableRequest` sharing the same cancellation source,
/// so `cancel` works at any depth of the chain.
pub struct CancellableRequest<T> {
    future: BoxFuture<'static, Result<T>>,
    source: CancelSource,
}

impl<T: Send + 'static> CancellableRequest<T> {
    /// Wrap `future` so it races against `source`'s token. Cancellation is
    /// checked before the inner future is first polled, so a request
    /// cancelled before being awaited is never issued.
    pub(crate) fn new<F>(future: F, source: CancelSource) -> Self
    where
        F: Future<Output = Result<T>> + Send + 'static,
    {
        let race = source.clone();
        let future = Box::pin(async move {
            tokio::select! {
                biased;
                () = race.cancelled() => Err(HttpollError::Cancelled(race.reason())),
                result = future => result,
            }
        });
        Self { future, source }
    }

    /// Derive a chained wrapper carrying the same cancellation source.
    fn derive<U, F>(source: CancelSource, future: F) -> CancellableRequest<U>
    where
        F: Future<Output = Result<U>> + Send + 'static,
    {
        CancellableRequest {
            future: Box::pin(future),
            source,
        }
    }

    /// Success continuation: transform the resolved value.
    pub fn map<U, F>(self, f: F) -> CancellableRequest<U>
    where
        U: Send + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        let Self { future, source } = self;
        Self::derive(source, async move { future.await.map(f) })
    }

    /// Success continuation that may itself fail.
    pub fn and_then<U, F>(self, f: F) -> CancellableRequest<U>
    where
        U: Send + 'static,
        F: FnOnce(T) -> Result<U> + Send + 'static,
    {
        let Self { future, source } = self;
        Self::derive(source, async move { future.await.and_then(f) })
    }

    /// Failure continuation: transform the error.
    pub fn map_err<F>(self, f: F) -> CancellableRequest<T>
    where
        F: FnOnce(HttpollError) -> HttpollError + Send + 'static,
    {
        let Self { future, source } = self;
        Self::derive(source, async move { future.await.map_err(f) })
    }

    /// Failure continuation that may recover with a value.
    pub fn or_else<F>(self, f: F) -> CancellableRequest<T>
    where
        F: FnOnce(HttpollError) -> Result<T> + Send + 'static,
    {
        let Self { future, source } = self;
        Self::derive(source, async move { future.await.or_else(f) })
    }

    /// Completion continuation: runs after the operation settles, whether it
    /// succeeded, failed, or was cancelled. Does not alter the outcome.
    pub fn finally<F>(self, f: F) -> CancellableRequest<T>
    where
        F: FnOnce() + Send + 'static,
    {
        let Self { future, source } = self;
        Self::derive(source, async move {
            let result = future.await;
            f();
            result
        })
    }

    /// Abort the underlying operation. No-op if it has already settled.
    pub fn cancel(&self, message: Option<&str>) {
        self.source.cancel(message);
    }

    /// A detached handle that can cancel this request chain.
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            source: self.source.clone(),
        }
    }
}

impl<T> Future for CancellableRequest<T> {
    type Output = Result<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.future.as_mut().poll(cx)
    }
}

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::Context;
use std::task::Poll;

use opentelemetry::KeyValue;
use opentelemetry::global;
use opentelemetry::metrics::Counter;
use pin_project_lite::pin_project;
use tokio::time::Sleep;
use tokio::time::sleep;
use tower::BoxError;
use tower::Service;

use fault_bag::Bucket;
use fault_bag::Status;

use crate::error::FaultError;

#[derive(Clone, Debug)]
struct FaultServiceMetrics {
    backoff: Counter<u64>,
}

/// A service that records every wrapped call's outcome into a shared
/// [`Bucket`] and backs off while the bucket reports throttling.
///
/// The outcome of the *inner* call (`Ok` or `Err`) is what gets recorded;
/// the service never fabricates outcomes of its own. While the bucket is
/// saturated, `poll_ready` either sheds immediately with
/// [`FaultError::Throttled`] (fail-fast) or sleeps out the bucket's wait
/// hint and re-checks.
#[derive(Debug)]
pub struct FaultService<S> {
    inner: S,
    bag: Arc<Bucket>,
    sleep: Option<Pin<Box<Sleep>>>,
    fail_fast: bool,
    instruments: FaultServiceMetrics,
}

pin_project! {
    /// A future that records the inner call's outcome when it resolves.
    pub struct ResponseFuture<F> {
        #[pin]
        inner: F,
        bag: Arc<Bucket>,
    }
}

impl<F, T> Future for ResponseFuture<F>
where
    F: Future<Output = Result<T, BoxError>>,
{
    type Output = Result<T, BoxError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();
        match this.inner.poll(cx) {
            Poll::Ready(res) => {
                this.bag.record(res.is_err());
                Poll::Ready(res)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

// Manually implement Clone because Pin<Box<Sleep>> cannot be cloned
impl<S> Clone for FaultService<S>
where
    S: Clone,
{
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            bag: Arc::clone(&self.bag),
            // We start with a fresh backoff state for the new clone
            sleep: None,
            fail_fast: self.fail_fast,
            instruments: self.instruments.clone(),
        }
    }
}

impl<S, Req> Service<Req> for FaultService<S>
where
    S: Service<Req, Error = BoxError>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = ResponseFuture<S::Future>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        // 1. If we are currently backing off, check if we're done
        if let Some(ref mut fut) = self.sleep {
            match fut.as_mut().poll(cx) {
                Poll::Ready(_) => self.sleep = None,
                Poll::Pending => return Poll::Pending,
            }
        }

        // 2. Check inner service readiness FIRST so a saturated bucket
        // never masks an inner error
        match self.inner.poll_ready(cx) {
            Poll::Pending => return Poll::Pending,
            Poll::Ready(Err(e)) => return Poll::Ready(Err(e)),
            Poll::Ready(Ok(())) => {}
        }

        // 3. Consult the bucket
        match self.bag.status() {
            Status::Ok => Poll::Ready(Ok(())),
            Status::Throttling { wait_hint } => {
                let mode = if self.fail_fast { "shed" } else { "wait" };
                self.instruments
                    .backoff
                    .add(1, &[KeyValue::new("mode", mode)]);

                if self.fail_fast {
                    return Poll::Ready(Err(Box::new(FaultError::Throttled {
                        retry_after: wait_hint,
                    })));
                }

                // Sleep out the wait hint, then re-check the status. The
                // hint is advisory: the bucket may still be saturated on
                // wake, in which case we back off again.
                let mut sleep_fut = Box::pin(sleep(wait_hint));
                match sleep_fut.as_mut().poll(cx) {
                    Poll::Pending => {
                        self.sleep = Some(sleep_fut);
                        Poll::Pending
                    }
                    Poll::Ready(_) => {
                        // Immediate wakeup (sleep(0) or similar)
                        cx.waker().wake_by_ref();
                        Poll::Pending
                    }
                }
            }
        }
    }

    fn call(&mut self, req: Req) -> Self::Future {
        ResponseFuture {
            inner: self.inner.call(req),
            bag: Arc::clone(&self.bag),
        }
    }
}

impl<S> FaultService<S> {
    pub fn new(inner: S, bag: Arc<Bucket>) -> Self {
        let meter = global::meter("fault_service");
        let instruments = FaultServiceMetrics {
            backoff: meter.u64_counter("backoff").build(),
        };

        Self {
            inner,
            bag,
            sleep: None,
            fail_fast: false,
            instruments,
        }
    }

    /// Set whether the service should fail immediately while throttling.
    ///
    /// If `true`, `poll_ready` resolves with `FaultError::Throttled`
    /// instead of sleeping out the bucket's wait hint.
    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }
}

use std::sync::Arc;

use fault_bag::Bucket;
use tower::Layer;

use crate::service::FaultService;

/// Applies error-rate backoff to requests.
///
/// Every service built by this layer shares the same [`Bucket`], so
/// failures seen by any clone count against the whole group.
#[derive(Debug, Clone)]
pub struct FaultLayer {
    bag: Arc<Bucket>,
    fail_fast: bool,
}

impl FaultLayer {
    /// Create a FaultLayer around a shared bucket.
    pub fn new(bag: Arc<Bucket>) -> Self {
        FaultLayer {
            bag,
            fail_fast: false,
        }
    }

    /// Set whether built services should fail immediately while throttling.
    ///
    /// If `true`, the service will return `FaultError::Throttled` instead
    /// of sleeping out the bucket's wait hint.
    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }
}

impl<S> Layer<S> for FaultLayer {
    type Service = FaultService<S>;

    fn layer(&self, service: S) -> Self::Service {
        FaultService::new(service, Arc::clone(&self.bag)).with_fail_fast(self.fail_fast)
    }
}

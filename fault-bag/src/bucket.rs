use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio::time::interval_at;

use super::BagError;
use super::Status;

/// A bounded failure counter that leaks one unit per interval while its
/// leak task is running.
///
/// Share a bucket across threads or tasks with an `Arc`; every operation
/// takes `&self`.
#[derive(Debug)]
pub struct Bucket {
    capacity: usize,
    wait_hint: Duration,
    leak_interval: Duration,
    inner: Arc<Mutex<Inner>>,
}

/// All mutable state sits behind one guard: the level and the running
/// leak task. No partial locking.
#[derive(Debug)]
struct Inner {
    level: usize,
    leak: Option<LeakTask>,
}

#[derive(Debug)]
struct LeakTask {
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl Bucket {
    /// Creates a new `Bucket` with `level` at zero and no leak task.
    ///
    /// * `capacity` - failure units accumulated before throttling activates.
    /// * `wait_hint` - advisory backoff carried in [`Status::Throttling`].
    /// * `leak_interval` - period at which one unit drains while started.
    ///
    /// # Errors
    ///
    /// Returns [`BagError::InvalidConfiguration`] if `capacity` is zero or
    /// either duration is zero.
    pub fn new(
        capacity: usize,
        wait_hint: Duration,
        leak_interval: Duration,
    ) -> Result<Self, BagError> {
        if capacity == 0 || wait_hint.is_zero() || leak_interval.is_zero() {
            return Err(BagError::InvalidConfiguration);
        }
        Ok(Self {
            capacity,
            wait_hint,
            leak_interval,
            inner: Arc::new(Mutex::new(Inner {
                level: 0,
                leak: None,
            })),
        })
    }

    /// Records the outcome of one completed operation and returns the
    /// status derived from the post-mutation level.
    ///
    /// A failure raises the level by one, saturating at capacity. A success
    /// leaves the level untouched; draining happens only through time, so
    /// the signal tracks failure density rather than a success ratio.
    ///
    /// Never fails. Recording on a bucket that was never started is fine:
    /// failures still accumulate and can still throttle, they just never
    /// leak.
    pub fn record(&self, failed: bool) -> Status {
        let mut inner = self.lock();
        if failed {
            inner.level = (inner.level + 1).min(self.capacity);
        }
        let status = self.status_of(inner.level);
        drop(inner);
        status
    }

    /// [`Bucket::record`] plus a notification callback.
    ///
    /// The callback runs after the guard is released, so a callback that
    /// re-enters `record` on the same bucket cannot deadlock.
    pub fn record_with<F>(&self, failed: bool, on_status: F)
    where
        F: FnOnce(Status),
    {
        let status = self.record(failed);
        on_status(status);
    }

    /// Snapshot of the current status without mutating the level.
    pub fn status(&self) -> Status {
        let level = self.lock().level;
        self.status_of(level)
    }

    /// Snapshot of the current failure level, for diagnostics.
    pub fn level(&self) -> usize {
        self.lock().level
    }

    /// Starts the leak task, draining one unit per interval. The first
    /// tick lands one full interval after this call, not immediately.
    ///
    /// Must be called within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`BagError::AlreadyRunning`] if the leak task is already
    /// active; starting twice would double-drain the level.
    pub fn start(&self) -> Result<(), BagError> {
        let mut inner = self.lock();
        if inner.leak.is_some() {
            return Err(BagError::AlreadyRunning);
        }

        let (shutdown, mut signal) = oneshot::channel();
        // The task holds a Weak reference so a dropped bucket never pins
        // its own leak task alive; the closed channel also wakes it.
        let state = Arc::downgrade(&self.inner);
        let period = self.leak_interval;

        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            loop {
                tokio::select! {
                    _ = &mut signal => break,
                    _ = ticker.tick() => {
                        let Some(state) = state.upgrade() else { break };
                        let mut inner =
                            state.lock().unwrap_or_else(PoisonError::into_inner);
                        inner.level = inner.level.saturating_sub(1);
                    }
                }
            }
        });

        inner.leak = Some(LeakTask { shutdown, handle });
        Ok(())
    }

    /// Stops the leak task and waits for it to finish, so no tick is left
    /// racing against teardown.
    ///
    /// The guard is released before the join, so a `record` in flight on
    /// another thread can never deadlock against `stop`.
    ///
    /// # Errors
    ///
    /// Returns [`BagError::NotRunning`] if the leak task is not active.
    pub async fn stop(&self) -> Result<(), BagError> {
        let LeakTask { shutdown, handle } = {
            let mut inner = self.lock();
            inner.leak.take().ok_or(BagError::NotRunning)?
        };
        let _ = shutdown.send(());
        let _ = handle.await;
        Ok(())
    }

    fn status_of(&self, level: usize) -> Status {
        if level >= self.capacity {
            Status::Throttling {
                wait_hint: self.wait_hint,
            }
        } else {
            Status::Ok
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

//! Global admission control for upstream requests.
//!
//! Every network call the engine makes goes through a single [`RequestGate`]
//! so the upstream instance never sees more than `max_concurrency` requests
//! from us at once.  Waiters are admitted in arrival order: the gate is built
//! on tokio's fair [`Semaphore`].
//!
//! The gate is an ordinary value shared by `Arc`, not a global.  Tests build
//! their own gate and read [`peak`](RequestGate::peak) to check the bound.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::Semaphore;

use crate::error::FetchError;

/// Bounds the number of concurrently running upstream calls.
#[derive(Debug)]
pub struct RequestGate {
    permits: Semaphore,
    limit: usize,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

/// Marks one admitted task as running; dropping it ends the "running" state.
///
/// Dropped on success, error, unwinding, or when the admitted future itself
/// is dropped by a timeout.
struct RunningSlot<'a> {
    gate: &'a RequestGate,
}

impl Drop for RunningSlot<'_> {
    fn drop(&mut self) {
        self.gate.in_flight.fetch_sub(1, Ordering::AcqRel);
    }
}

impl RequestGate {
    /// Create a gate admitting at most `max_concurrency` tasks at once.
    /// A limit of zero is treated as one.
    pub fn new(max_concurrency: usize) -> Self {
        let limit = max_concurrency.max(1);
        Self {
            permits: Semaphore::new(limit),
            limit,
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    /// Run `task` once a slot is free, queueing FIFO behind earlier callers.
    ///
    /// The slot is released when `task` completes or when the returned future
    /// is dropped, whichever happens first.
    pub async fn admit<F, T>(&self, task: F) -> T
    where
        F: Future<Output = T>,
    {
        // `acquire` only fails on a closed semaphore; this one is never closed.
        let _permit = self.permits.acquire().await.ok();

        let now_running = self.in_flight.fetch_add(1, Ordering::AcqRel) + 1;
        self.peak.fetch_max(now_running, Ordering::AcqRel);
        let _slot = RunningSlot { gate: self };

        task.await
    }

    /// Admit an upstream call and bound its running time.
    ///
    /// The clock starts once the call is admitted, not while it waits in the
    /// queue.  On expiry the call is dropped (cancelling the request) and its
    /// slot is freed.
    pub async fn admit_with_timeout<F, T>(&self, limit: Duration, call: F) -> Result<T, FetchError>
    where
        F: Future<Output = Result<T, FetchError>>,
    {
        self.admit(async {
            tokio::time::timeout(limit, call)
                .await
                .unwrap_or(Err(FetchError::Timeout(limit)))
        })
        .await
    }

    /// Configured concurrency ceiling.
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Tasks currently running inside the gate.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Highest number of simultaneously running tasks seen so far.
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::Acquire)
    }
}

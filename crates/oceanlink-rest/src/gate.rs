//! Admission control for outbound array requests.
//!
//! [`ConcurrencyGate`] bounds how many requests are in flight at once. It
//! says nothing about throughput over time. Slots are handed out as
//! [`GatePermit`] guards that give the slot back when dropped, so a cancelled
//! request still releases it.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::codes::DEFAULT_MAX_CONCURRENT_REQUESTS;

struct GateCounters {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    admitted: AtomicUsize,
}

/// Counting gate in front of the transport.
#[derive(Clone)]
pub struct ConcurrencyGate {
    semaphore: Arc<Semaphore>,
    capacity: usize,
    counters: Arc<GateCounters>,
}

/// The gate was closed while waiting for a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateClosed;

impl ConcurrencyGate {
    /// Creates a gate with `capacity` slots (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
            counters: Arc::new(GateCounters {
                in_flight: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
                admitted: AtomicUsize::new(0),
            }),
        }
    }

    /// Waits for a free slot.
    pub async fn acquire(&self) -> Result<GatePermit, GateClosed> {
        let permit = Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .map_err(|_| GateClosed)?;
        let now = self.counters.in_flight.fetch_add(1, Ordering::AcqRel) + 1;
        self.counters.peak.fetch_max(now, Ordering::AcqRel);
        self.counters.admitted.fetch_add(1, Ordering::Relaxed);
        Ok(GatePermit {
            _permit: permit,
            counters: Arc::clone(&self.counters),
        })
    }

    /// Stops admitting; pending and future acquisitions fail.
    pub fn close(&self) {
        self.semaphore.close();
    }

    /// Configured number of slots.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slots free right now.
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Whether [`ConcurrencyGate::close`] was called.
    pub fn is_closed(&self) -> bool {
        self.semaphore.is_closed()
    }

    /// Slots currently held.
    pub fn in_flight(&self) -> usize {
        self.counters.in_flight.load(Ordering::Acquire)
    }

    /// Highest number of simultaneous holders observed.
    pub fn peak_in_flight(&self) -> usize {
        self.counters.peak.load(Ordering::Acquire)
    }

    /// Total number of slots handed out.
    pub fn admitted(&self) -> usize {
        self.counters.admitted.load(Ordering::Relaxed)
    }
}

impl Default for ConcurrencyGate {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CONCURRENT_REQUESTS)
    }
}

impl std::fmt::Debug for ConcurrencyGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConcurrencyGate")
            .field("capacity", &self.capacity)
            .field("in_flight", &self.in_flight())
            .field("peak", &self.peak_in_flight())
            .finish()
    }
}

/// RAII guard for one gate slot.
pub struct GatePermit {
    _permit: OwnedSemaphorePermit,
    counters: Arc<GateCounters>,
}

impl Drop for GatePermit {
    fn drop(&mut self) {
        self.counters.in_flight.fetch_sub(1, Ordering::AcqRel);
    }
}

//! Concurrency gate for heavy work

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::debug;

use crate::{KernelError, Result};

/// Counting gate bounding concurrent heavy tasks
///
/// Waiters queue FIFO. The permit releases on drop, so every exit path
/// (success, error, panic unwind) frees the slot.
#[derive(Debug)]
pub struct ConcurrencyGate {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

impl ConcurrencyGate {
    pub fn new(capacity: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// Wait for a free slot and claim it
    pub async fn acquire(&self) -> Result<OwnedSemaphorePermit> {
        debug!(
            "gate acquire: {}/{} slots free",
            self.semaphore.available_permits(),
            self.capacity
        );
        self.semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| KernelError::GateClosed)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slots currently free
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }
}

//! Per-job mutual exclusion.
//!
//! The record store has no locking, so every read-modify-write of one job's
//! records runs under that job's lock. Slots are created on demand and dropped
//! again once nobody holds or waits for them.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use printmaps_core::JobId;

#[derive(Debug, Default)]
pub struct JobLocks {
    slots: Mutex<HashMap<JobId, Arc<Mutex<()>>>>,
}

impl JobLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` while holding the lock of `id`.
    pub fn with_job<T>(&self, id: JobId, f: impl FnOnce() -> T) -> T {
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            slots.entry(id).or_default().clone()
        };

        let result = {
            let _guard = slot.lock().unwrap_or_else(PoisonError::into_inner);
            f()
        };

        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        // One reference in the map plus ours: nobody else is waiting.
        if Arc::strong_count(&slot) == 2 {
            slots.remove(&id);
        }
        result
    }

    /// Number of jobs that currently have a lock slot.
    pub fn active(&self) -> usize {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

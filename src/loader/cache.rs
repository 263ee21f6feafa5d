//! Explicit cache of loaded datasets
//!
//! Loading is the only I/O-bound step, so each distinct dataset is loaded
//! once and shared as an `Arc<Dataset>`. The cache is bounded: once
//! `capacity` datasets are held, the oldest-loaded entry is evicted. Entries
//! can also be invalidated individually or cleared when the underlying
//! files change.

use std::collections::VecDeque;
use std::sync::{Arc, PoisonError, RwLock};

use rustc_hash::FxHashMap;

use super::{Dataset, DatasetLoader};
use crate::error::{Error, Result};

#[derive(Debug, Default)]
struct CacheState {
    entries: FxHashMap<String, Arc<Dataset>>,
    /// Load order, oldest first
    order: VecDeque<String>,
}

fn lock_error<T>(_: PoisonError<T>) -> Error {
    Error::InvalidOperation("Failed to acquire lock on dataset cache".to_string())
}

/// Bounded, shareable dataset cache wrapping a loader
pub struct DatasetCache {
    loader: Box<dyn DatasetLoader>,
    state: RwLock<CacheState>,
    capacity: usize,
}

impl DatasetCache {
    #[must_use]
    pub fn new(loader: Box<dyn DatasetLoader>, capacity: usize) -> Self {
        Self {
            loader,
            state: RwLock::new(CacheState::default()),
            capacity: capacity.max(1),
        }
    }

    /// Return the named dataset, loading it on first use
    pub fn get(&self, name: &str) -> Result<Arc<Dataset>> {
        if let Some(dataset) = self.state.read().map_err(lock_error)?.entries.get(name) {
            return Ok(Arc::clone(dataset));
        }

        let dataset = Arc::new(self.loader.load(name)?);

        let mut state = self.state.write().map_err(lock_error)?;
        // Another reader may have loaded it meanwhile
        if let Some(existing) = state.entries.get(name) {
            return Ok(Arc::clone(existing));
        }
        state.entries.insert(name.to_string(), Arc::clone(&dataset));
        state.order.push_back(name.to_string());
        while state.entries.len() > self.capacity {
            let Some(oldest) = state.order.pop_front() else {
                break;
            };
            state.entries.remove(&oldest);
            log::warn!("Evicted dataset '{oldest}' from cache (capacity {})", self.capacity);
        }
        Ok(dataset)
    }

    /// Drop one dataset so the next `get` reloads it. Returns whether it was cached.
    pub fn invalidate(&self, name: &str) -> Result<bool> {
        let mut state = self.state.write().map_err(lock_error)?;
        state.order.retain(|n| n != name);
        Ok(state.entries.remove(name).is_some())
    }

    pub fn clear(&self) -> Result<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        state.entries.clear();
        state.order.clear();
        Ok(())
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.state
            .read()
            .is_ok_and(|state| state.entries.contains_key(name))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.state.read().map_or(0, |state| state.entries.len())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn loader(&self) -> &dyn DatasetLoader {
        self.loader.as_ref()
    }
}

//! Per-key model cache.
//!
//! The map lock only guards slot lookup. Loading happens under the slot's own
//! init lock, so a slow load blocks callers of that key and nobody else.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

use super::EmbeddingError;

struct Slot<M> {
    model: OnceLock<Arc<M>>,
    init: Mutex<()>,
}

impl<M> Slot<M> {
    fn new() -> Self {
        Self {
            model: OnceLock::new(),
            init: Mutex::new(()),
        }
    }
}

pub struct ModelCache<M> {
    slots: Mutex<HashMap<&'static str, Arc<Slot<M>>>>,
}

impl<M> Default for ModelCache<M> {
    fn default() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }
}

impl<M> ModelCache<M> {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, key: &'static str) -> Result<Arc<Slot<M>>, EmbeddingError> {
        let mut slots = self.slots.lock().map_err(|e| {
            EmbeddingError::InitFailed(format!("Failed to acquire model cache lock: {}", e))
        })?;
        Ok(slots
            .entry(key)
            .or_insert_with(|| Arc::new(Slot::new()))
            .clone())
    }

    /// Return the cached model for `key`, running `load` if there is none.
    ///
    /// Concurrent callers for the same key wait for a single load. A failed
    /// load leaves the slot empty so the next call retries.
    pub fn get_or_load<F>(&self, key: &'static str, load: F) -> Result<Arc<M>, EmbeddingError>
    where
        F: FnOnce() -> Result<M, EmbeddingError>,
    {
        let slot = self.slot(key)?;
        if let Some(model) = slot.model.get() {
            return Ok(model.clone());
        }

        let _init = slot.init.lock().map_err(|e| {
            EmbeddingError::InitFailed(format!("Failed to acquire model init lock: {}", e))
        })?;
        if let Some(model) = slot.model.get() {
            return Ok(model.clone());
        }

        let model = Arc::new(load()?);
        // only the init lock holder sets the cell
        let _ = slot.model.set(model.clone());
        Ok(model)
    }

    /// Whether `key` has a finished model. Never waits on a load in progress.
    pub fn is_loaded(&self, key: &str) -> bool {
        self.slots
            .lock()
            .map(|slots| {
                slots
                    .get(key)
                    .is_some_and(|slot| slot.model.get().is_some())
            })
            .unwrap_or(false)
    }

    /// Drop the model for `key`. Returns whether one was loaded.
    pub fn remove(&self, key: &str) -> bool {
        self.slots
            .lock()
            .map(|mut slots| {
                slots
                    .remove(key)
                    .is_some_and(|slot| slot.model.get().is_some())
            })
            .unwrap_or(false)
    }

    pub fn clear(&self) {
        if let Ok(mut slots) = self.slots.lock() {
            slots.clear();
        }
    }
}

//! Lazily populated, invalidatable caches owned by the store

use crate::error::{StorageError, StorageResult};
use std::sync::{Arc, RwLock};

/// A value derived from persisted state, rebuilt on first access after
/// [`Cache::invalidate`]
#[derive(Debug)]
pub struct Cache<T> {
    slot: RwLock<Option<Arc<T>>>,
}

impl<T> Default for Cache<T> {
    fn default() -> Self {
        Self {
            slot: RwLock::new(None),
        }
    }
}

impl<T> Cache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_populate(
        &self,
        populate: impl FnOnce() -> StorageResult<T>,
    ) -> StorageResult<Arc<T>> {
        {
            let slot = self
                .slot
                .read()
                .map_err(|e| StorageError::Lock(e.to_string()))?;
            if let Some(value) = slot.as_ref() {
                return Ok(Arc::clone(value));
            }
        }

        let mut slot = self
            .slot
            .write()
            .map_err(|e| StorageError::Lock(e.to_string()))?;
        if let Some(value) = slot.as_ref() {
            return Ok(Arc::clone(value));
        }
        let value = Arc::new(populate()?);
        *slot = Some(Arc::clone(&value));
        Ok(value)
    }

    pub fn invalidate(&self) {
        match self.slot.write() {
            Ok(mut slot) => *slot = None,
            Err(poisoned) => *poisoned.into_inner() = None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_populates_once_until_invalidated() {
        let cache = Cache::new();
        let calls = Cell::new(0);
        let load = || {
            calls.set(calls.get() + 1);
            Ok(calls.get())
        };

        assert_eq!(*cache.get_or_populate(load).unwrap(), 1);
        assert_eq!(*cache.get_or_populate(load).unwrap(), 1);
        cache.invalidate();
        assert_eq!(*cache.get_or_populate(load).unwrap(), 2);
    }

    #[test]
    fn test_failed_population_is_retried() {
        let cache: Cache<u32> = Cache::new();
        assert!(cache
            .get_or_populate(|| Err(StorageError::Database("down".into())))
            .is_err());
        assert_eq!(*cache.get_or_populate(|| Ok(7)).unwrap(), 7);
    }
}

//! FIFO block-descriptor cache, grounded on `lear/cvision/cachedesc.h`.
//!
//! Overlapping blocks between adjacent detection windows are recomputed
//! often enough that memoizing them by their top-left pixel pays for itself.
//! Capacity is derived from a megabyte budget the way the original's
//! `CacheDesc` does: `cachesize = budget_bytes / (sizeof(f32) * descriptor_length)`.

use std::collections::HashMap;
use std::collections::VecDeque;

use crate::error::{Error, Result};

/// Key identifying a cached block: its top-left pixel in the current
/// pyramid level's gradient field.
pub type CacheKey = (usize, usize);

/// Bounded FIFO cache of block descriptors for one `BlockSpec` at one
/// pyramid level. Cleared whenever a new image or pyramid level begins.
#[derive(Debug)]
pub struct DescriptorCache {
    capacity: usize,
    order: VecDeque<CacheKey>,
    entries: HashMap<CacheKey, Vec<f32>>,
}

impl DescriptorCache {
    /// Builds a cache sized for a `budget_mb` megabyte descriptor budget.
    /// `descriptor_length` is the per-entry vector length (`BlockSpec::descriptor_length`).
    pub fn new(budget_mb: usize, descriptor_length: usize) -> Result<Self> {
        if descriptor_length == 0 {
            return Err(Error::InvalidConfiguration(
                "descriptor length must be positive to size a cache".to_string(),
            ));
        }
        let budget_bytes = budget_mb * 1024 * 1024;
        let capacity = (budget_bytes / (std::mem::size_of::<f32>() * descriptor_length)).max(1);
        Ok(Self {
            capacity,
            order: VecDeque::with_capacity(capacity),
            entries: HashMap::with_capacity(capacity),
        })
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn get(&self, key: CacheKey) -> Option<&[f32]> {
        self.entries.get(&key).map(Vec::as_slice)
    }

    /// Inserts `descriptor` for `key`, evicting the oldest entry if the
    /// cache is at capacity. A re-insertion of an existing key does not
    /// move it in FIFO order, matching the original's ring-buffer eviction.
    pub fn insert(&mut self, key: CacheKey, descriptor: Vec<f32>) {
        if self.entries.contains_key(&key) {
            self.entries.insert(key, descriptor);
            return;
        }
        if self.entries.len() >= self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
            }
        }
        self.order.push_back(key);
        self.entries.insert(key, descriptor);
    }

    /// Drops all entries. Called at the start of each new image or pyramid level.
    pub fn clear(&mut self) {
        self.order.clear();
        self.entries.clear();
    }
}

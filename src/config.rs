//! Construction-time configuration.
//!
//! The bucket count is fixed once a map is built; nothing here feeds a
//! resize policy.

use crate::error::CapacityError;
use crate::index::TextFold;
use crate::map::ChainedHashMap;
use core::num::NonZeroUsize;

/// Bucket count used by `Default` and by a fresh [`Builder`].
pub const DEFAULT_CAPACITY: usize = 16;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MapConfig {
    /// Number of buckets. Must be positive.
    pub capacity: usize,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
        }
    }
}

impl MapConfig {
    pub fn validate(&self) -> Result<NonZeroUsize, CapacityError> {
        NonZeroUsize::new(self.capacity).ok_or(CapacityError::Zero)
    }
}

/// Step-by-step construction of a [`ChainedHashMap`].
///
/// ```
/// use chained_hashmap::Builder;
///
/// let mut m = Builder::new().capacity(10).build().unwrap();
/// m.put("apple", 1);
/// assert_eq!(m.capacity(), 10);
/// assert_eq!(m.get("apple"), Ok(&1));
/// ```
#[derive(Clone, Debug)]
pub struct Builder<S = TextFold> {
    config: MapConfig,
    indexer: S,
}

impl Builder<TextFold> {
    pub fn new() -> Self {
        Self {
            config: MapConfig::default(),
            indexer: TextFold,
        }
    }
}

impl Default for Builder<TextFold> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> Builder<S> {
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.config.capacity = capacity;
        self
    }

    pub fn config(mut self, config: MapConfig) -> Self {
        self.config = config;
        self
    }

    /// Swap the key-to-bucket function.
    pub fn indexer<T>(self, indexer: T) -> Builder<T> {
        Builder {
            config: self.config,
            indexer,
        }
    }

    /// Fails without allocating when the configured capacity is zero.
    pub fn build<K, V>(self) -> Result<ChainedHashMap<K, V, S>, CapacityError> {
        let capacity = self.config.validate()?;
        Ok(ChainedHashMap::with_capacity_and_indexer(capacity, self.indexer))
    }
}

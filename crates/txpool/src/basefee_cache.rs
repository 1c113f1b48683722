//! Memoizes `calc_base_fee` by parent header id. Bounded FIFO eviction keeps
//! this cheap for the small working set of recently-seen parents the
//! housekeeper and ingress actually revisit.

use std::collections::{HashMap, VecDeque};

use fee_market::{calc_base_fee, ForkConfig, Header};
use parking_lot::Mutex;
use txpool_primitives::{BigInt, Hash};

const DEFAULT_CAPACITY: usize = 256;

#[derive(Debug)]
struct Inner {
    entries: HashMap<Hash, BigInt>,
    order: VecDeque<Hash>,
    capacity: usize,
}

/// Memoizes [`fee_market::calc_base_fee`] by parent header id.
#[derive(Debug)]
pub struct BaseFeeCache {
    inner: Mutex<Inner>,
}

impl BaseFeeCache {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { inner: Mutex::new(Inner { entries: HashMap::new(), order: VecDeque::new(), capacity }) }
    }

    /// Returns the cached base fee for `parent`'s id, computing and
    /// inserting it on a miss.
    pub fn get_or_compute<H: Header>(&self, parent: &H, fork: &ForkConfig) -> BigInt {
        let id = parent.id();
        let mut inner = self.inner.lock();

        if let Some(cached) = inner.entries.get(&id) {
            return *cached;
        }

        let computed = calc_base_fee(parent, fork);

        if inner.entries.len() >= inner.capacity {
            if let Some(oldest) = inner.order.pop_front() {
                inner.entries.remove(&oldest);
            }
        }
        inner.entries.insert(id, computed);
        inner.order.push_back(id);

        computed
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for BaseFeeCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::B256;
    use fee_market::HeaderView;

    fn fork() -> ForkConfig {
        ForkConfig::galactica(0, BigInt::from(1_000_000_000u64))
    }

    fn header(id: u8, gas_limit: u64, gas_used: u64, base_fee: u64) -> HeaderView {
        HeaderView {
            parent_id: B256::ZERO,
            number: 1,
            timestamp: 10,
            gas_limit,
            gas_used,
            base_fee: Some(BigInt::from(base_fee)),
            total_score: 0,
            state_root: B256::ZERO,
            id: B256::from_slice(&[id; 32]),
        }
    }

    #[test]
    fn caches_result_for_repeated_parent_id() {
        let cache = BaseFeeCache::new();
        let parent = header(1, 20_000_000, 20_000_000, 1_000_000_000);
        let first = cache.get_or_compute(&parent, &fork());
        assert_eq!(cache.len(), 1);
        let second = cache.get_or_compute(&parent, &fork());
        assert_eq!(first, second);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn distinct_parent_ids_get_distinct_entries() {
        let cache = BaseFeeCache::new();
        cache.get_or_compute(&header(1, 20_000_000, 20_000_000, 1_000_000_000), &fork());
        cache.get_or_compute(&header(2, 20_000_000, 0, 1_000_000_000), &fork());
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn evicts_oldest_entry_once_over_capacity() {
        let cache = BaseFeeCache::with_capacity(2);
        cache.get_or_compute(&header(1, 20_000_000, 20_000_000, 1_000_000_000), &fork());
        cache.get_or_compute(&header(2, 20_000_000, 20_000_000, 1_000_000_000), &fork());
        cache.get_or_compute(&header(3, 20_000_000, 20_000_000, 1_000_000_000), &fork());
        assert_eq!(cache.len(), 2);
        assert!(!cache.inner.lock().entries.contains_key(&B256::from_slice(&[1u8; 32])));
    }
}

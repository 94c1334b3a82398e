//! Operation caches.
//!
//! All caches are pure memoization: clearing one at any point never changes
//! results. Cache entries hold plain handles, so the garbage collector clears
//! the caches before sweeping instead of tracing through them.

use std::collections::HashMap;
use std::hash::Hash;

use crate::reference::{Hom, Sdd};

/// Binary diagram operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpType {
    Union,
    Intersection,
    Difference,
}

/// Cache key for binary diagram operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OpKey {
    pub op: OpType,
    pub lhs: Sdd,
    pub rhs: Sdd,
}

impl OpKey {
    /// Create a key for a commutative operation, normalizing operand order.
    pub fn commutative(op: OpType, lhs: Sdd, rhs: Sdd) -> Self {
        let (lhs, rhs) = if lhs <= rhs { (lhs, rhs) } else { (rhs, lhs) };
        Self { op, lhs, rhs }
    }

    /// Create a key for a non-commutative operation.
    pub fn non_commutative(op: OpType, lhs: Sdd, rhs: Sdd) -> Self {
        Self { op, lhs, rhs }
    }
}

/// Cache key for homomorphism application.
pub type HomKey = (Hom, Sdd);

/// A `HashMap`-backed cache with hit/miss counters and an optional entry limit.
///
/// When an insertion would exceed the limit, the cache is cleared first.
#[derive(Debug)]
pub struct Cache<K, V> {
    map: HashMap<K, V>,
    limit: Option<usize>,
    hits: usize,
    misses: usize,
}

impl<K, V> Cache<K, V> {
    /// Create a new cache with capacity for `2^bits` entries.
    pub fn new(bits: usize, limit: Option<usize>) -> Self {
        assert!(bits <= 31, "Cache bits should be in the range 0..=31");
        Self {
            map: HashMap::with_capacity(1 << bits),
            limit,
            hits: 0,
            misses: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn hits(&self) -> usize {
        self.hits
    }

    pub fn misses(&self) -> usize {
        self.misses
    }

    /// Drop all entries. Counters are kept.
    pub fn clear(&mut self) {
        self.map.clear();
    }
}

impl<K, V> Cache<K, V>
where
    K: Hash + Eq,
    V: Clone,
{
    /// Look up a cached result.
    pub fn get(&mut self, key: &K) -> Option<V> {
        match self.map.get(key) {
            Some(v) => {
                self.hits += 1;
                Some(v.clone())
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Insert a result into the cache.
    pub fn insert(&mut self, key: K, value: V) {
        if let Some(limit) = self.limit {
            if self.map.len() >= limit {
                log::debug!("cache limit {} reached, clearing {} entries", limit, self.map.len());
                self.map.clear();
            }
        }
        self.map.insert(key, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache() {
        let mut cache = Cache::<(u64, u64), i32>::new(3, None);

        cache.insert((1, 2), 3);
        cache.insert((2, 3), 1);
        cache.insert((1, 3), 2);

        assert_eq!(cache.get(&(1, 2)), Some(3));
        assert_eq!(cache.get(&(2, 3)), Some(1));
        assert_eq!(cache.get(&(1, 3)), Some(2));
        assert_eq!(cache.get(&(2, 1)), None);
        assert_eq!(cache.get(&(3, 3)), None);
        assert_eq!(cache.hits(), 3);
        assert_eq!(cache.misses(), 2);
    }

    #[test]
    fn test_limit_clears() {
        let mut cache = Cache::<u32, u32>::new(2, Some(2));
        cache.insert(1, 1);
        cache.insert(2, 2);
        assert_eq!(cache.len(), 2);
        cache.insert(3, 3);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&1), None);
        assert_eq!(cache.get(&3), Some(3));
    }

    #[test]
    fn test_commutative_key() {
        let a = Sdd::new(5, 0, 0);
        let b = Sdd::new(9, 0, 0);
        assert_eq!(
            OpKey::commutative(OpType::Union, a, b),
            OpKey::commutative(OpType::Union, b, a)
        );
        assert_ne!(
            OpKey::non_commutative(OpType::Difference, a, b),
            OpKey::non_commutative(OpType::Difference, b, a)
        );
    }
}

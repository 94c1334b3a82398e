//! Value sets: the leaf-level domain of flat variables.
//!
//! A [`ValueSet`] is an immutable, sorted and deduplicated collection of `u32`.
//! It is built through a [`ValueSetBuilder`] which accumulates values in any
//! order and freezes them with [`ValueSetBuilder::build`].
//!
//! ```
//! use sdd_rs::values::{ValueSet, ValueSetBuilder};
//!
//! let mut builder = ValueSetBuilder::new();
//! builder.insert(3);
//! builder.insert(1);
//! builder.insert(3);
//! let values = builder.build();
//!
//! assert_eq!(values.as_slice(), &[1, 3]);
//! assert_eq!(values, ValueSet::from_iter([3, 1]));
//! ```

use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

/// An immutable sorted set of values.
///
/// Cloning is cheap: the storage is shared.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ValueSet(Rc<[u32]>);

impl ValueSet {
    /// The empty set.
    pub fn empty() -> Self {
        ValueSet(Rc::from([]))
    }

    /// A set with a single value.
    pub fn singleton(value: u32) -> Self {
        ValueSet(Rc::from([value]))
    }

    /// Wraps an already sorted and deduplicated vector.
    fn from_sorted(values: Vec<u32>) -> Self {
        debug_assert!(values.windows(2).all(|w| w[0] < w[1]));
        ValueSet(Rc::from(values))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, value: u32) -> bool {
        self.0.binary_search(&value).is_ok()
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.0.iter().copied()
    }

    /// Smallest value of the set, if any.
    pub fn first(&self) -> Option<u32> {
        self.0.first().copied()
    }

    /// Largest value of the set, if any.
    pub fn last(&self) -> Option<u32> {
        self.0.last().copied()
    }

    /// Set union (linear merge).
    pub fn union(&self, other: &ValueSet) -> ValueSet {
        if self.is_empty() || self == other {
            return other.clone();
        }
        if other.is_empty() {
            return self.clone();
        }
        let (a, b) = (self.as_slice(), other.as_slice());
        let mut res = Vec::with_capacity(a.len() + b.len());
        let (mut i, mut j) = (0, 0);
        while i < a.len() && j < b.len() {
            match a[i].cmp(&b[j]) {
                Ordering::Less => {
                    res.push(a[i]);
                    i += 1;
                }
                Ordering::Greater => {
                    res.push(b[j]);
                    j += 1;
                }
                Ordering::Equal => {
                    res.push(a[i]);
                    i += 1;
                    j += 1;
                }
            }
        }
        res.extend_from_slice(&a[i..]);
        res.extend_from_slice(&b[j..]);
        ValueSet::from_sorted(res)
    }

    /// Set intersection (linear merge).
    pub fn intersection(&self, other: &ValueSet) -> ValueSet {
        if self == other {
            return self.clone();
        }
        let (a, b) = (self.as_slice(), other.as_slice());
        let mut res = Vec::new();
        let (mut i, mut j) = (0, 0);
        while i < a.len() && j < b.len() {
            match a[i].cmp(&b[j]) {
                Ordering::Less => i += 1,
                Ordering::Greater => j += 1,
                Ordering::Equal => {
                    res.push(a[i]);
                    i += 1;
                    j += 1;
                }
            }
        }
        ValueSet::from_sorted(res)
    }

    /// Set difference `self \ other` (linear merge).
    pub fn difference(&self, other: &ValueSet) -> ValueSet {
        if other.is_empty() {
            return self.clone();
        }
        let (a, b) = (self.as_slice(), other.as_slice());
        let mut res = Vec::with_capacity(a.len());
        let (mut i, mut j) = (0, 0);
        while i < a.len() {
            if j >= b.len() {
                res.extend_from_slice(&a[i..]);
                break;
            }
            match a[i].cmp(&b[j]) {
                Ordering::Less => {
                    res.push(a[i]);
                    i += 1;
                }
                Ordering::Greater => j += 1,
                Ordering::Equal => {
                    i += 1;
                    j += 1;
                }
            }
        }
        ValueSet::from_sorted(res)
    }

    /// Returns true if the two sets share no value.
    pub fn is_disjoint(&self, other: &ValueSet) -> bool {
        let (a, b) = (self.as_slice(), other.as_slice());
        let (mut i, mut j) = (0, 0);
        while i < a.len() && j < b.len() {
            match a[i].cmp(&b[j]) {
                Ordering::Less => i += 1,
                Ordering::Greater => j += 1,
                Ordering::Equal => return false,
            }
        }
        true
    }
}

impl Default for ValueSet {
    fn default() -> Self {
        ValueSet::empty()
    }
}

impl FromIterator<u32> for ValueSet {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        let mut builder = ValueSetBuilder::new();
        for value in iter {
            builder.insert(value);
        }
        builder.build()
    }
}

impl<'a> IntoIterator for &'a ValueSet {
    type Item = &'a u32;
    type IntoIter = std::slice::Iter<'a, u32>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for ValueSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, v) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", v)?;
        }
        write!(f, "}}")
    }
}

impl fmt::Debug for ValueSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Accumulates values, then freezes them into a [`ValueSet`].
#[derive(Debug, Clone, Default)]
pub struct ValueSetBuilder {
    values: Vec<u32>,
}

impl ValueSetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            values: Vec::with_capacity(capacity),
        }
    }

    pub fn reserve(&mut self, additional: usize) {
        self.values.reserve(additional);
    }

    pub fn insert(&mut self, value: u32) {
        self.values.push(value);
    }

    /// Sorts, deduplicates and freezes the accumulated values.
    pub fn build(mut self) -> ValueSet {
        self.values.sort_unstable();
        self.values.dedup();
        ValueSet::from_sorted(self.values)
    }
}

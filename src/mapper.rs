//! Dense integer encoding of arbitrary values.
//!
//! Value sets hold `u32`; a [`ValueMap`] lets clients store any hashable data
//! by projecting it to consecutive integers on first sight.
//!
//! ```
//! use sdd_rs::mapper::ValueMap;
//!
//! let mut map = ValueMap::new();
//! assert_eq!(map.project("idle"), 0);
//! assert_eq!(map.project("busy"), 1);
//! assert_eq!(map.project("idle"), 0);
//! assert_eq!(map.reverse(1), Some(&"busy"));
//! assert_eq!(map.reverse(2), None);
//! ```

use std::collections::HashMap;
use std::hash::Hash;

#[derive(Debug, Clone)]
pub struct ValueMap<T> {
    projections: HashMap<T, u32>,
    values: Vec<T>,
}

impl<T> Default for ValueMap<T> {
    fn default() -> Self {
        Self {
            projections: HashMap::new(),
            values: Vec::new(),
        }
    }
}

impl<T: Eq + Hash + Clone> ValueMap<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the integer of `value`, assigning the next free one if unseen.
    pub fn project(&mut self, value: T) -> u32 {
        if let Some(&projection) = self.projections.get(&value) {
            return projection;
        }
        let projection = self.values.len() as u32;
        self.values.push(value.clone());
        self.projections.insert(value, projection);
        projection
    }

    /// Integer of `value`, if it was projected before.
    pub fn get(&self, value: &T) -> Option<u32> {
        self.projections.get(value).copied()
    }

    /// Value projected to `projection`.
    pub fn reverse(&self, projection: u32) -> Option<&T> {
        self.values.get(projection as usize)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

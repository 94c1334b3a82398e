//! Unique table: hash-consed storage of immutable values.
//!
//! Values are stored in a plain `Vec` of slots (indexed by handle) and looked
//! up through a `HashMap` from value to slot index. Freed slots are recycled
//! through a free list. Every slot carries a generation, bumped whenever its
//! value is dropped, so that handles to a recycled slot can be told apart.
//!
//! The first `reserved` slots are never allocated; the manager uses them for
//! the terminal diagrams.

use std::collections::HashMap;
use std::hash::Hash;

pub struct UniqueTable<T> {
    slots: Vec<Option<T>>,
    generations: Vec<u32>,
    index: HashMap<T, u32>,
    free: Vec<u32>,
    reserved: u32,
    /// Number of `put` calls answered by an existing value.
    hits: usize,
}

impl<T> UniqueTable<T>
where
    T: Clone + Eq + Hash,
{
    /// Create a new table with capacity for `2^bits` values.
    pub fn new(bits: usize, reserved: u32) -> Self {
        assert!(bits <= 31, "Table bits should be in the range 0..=31");

        let capacity = 1 << bits;
        let mut slots = Vec::with_capacity(capacity.max(reserved as usize));
        slots.resize_with(reserved as usize, || None);
        let generations = vec![0; reserved as usize];

        Self {
            slots,
            generations,
            index: HashMap::with_capacity(capacity),
            free: Vec::new(),
            reserved,
            hits: 0,
        }
    }

    /// Put a value into the table and return its index.
    ///
    /// An equal value already in the table is reused.
    pub fn put(&mut self, value: T) -> u32 {
        if let Some(&index) = self.index.get(&value) {
            self.hits += 1;
            return index;
        }
        let index = self.alloc();
        self.slots[index as usize] = Some(value.clone());
        self.index.insert(value, index);
        index
    }

    fn alloc(&mut self) -> u32 {
        if let Some(index) = self.free.pop() {
            return index;
        }
        let index = self.slots.len();
        assert!(index < u32::MAX as usize, "Table is full");
        self.slots.push(None);
        self.generations.push(0);
        index as u32
    }

    /// Get the value at the given index, if the slot is occupied.
    pub fn get(&self, index: u32) -> Option<&T> {
        self.slots.get(index as usize).and_then(|slot| slot.as_ref())
    }

    /// Generation of the slot at the given index.
    pub fn generation(&self, index: u32) -> u32 {
        self.generations.get(index as usize).copied().unwrap_or(0)
    }

    /// Number of live values.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Number of slots, free or occupied, reserved included.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn hits(&self) -> usize {
        self.hits
    }

    /// Iterate over the occupied slots.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|value| (i as u32, value)))
    }

    /// Drop every value whose index is not marked in `alive`.
    ///
    /// Returns the number of freed slots.
    pub fn retain(&mut self, alive: &[bool]) -> usize {
        let mut freed = 0;
        for i in self.reserved as usize..self.slots.len() {
            if alive.get(i).copied().unwrap_or(false) {
                continue;
            }
            if let Some(value) = self.slots[i].take() {
                self.index.remove(&value);
                self.generations[i] = self.generations[i].wrapping_add(1);
                self.free.push(i as u32);
                freed += 1;
            }
        }
        freed
    }
}

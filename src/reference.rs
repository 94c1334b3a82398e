use std::fmt::{Display, Formatter};

/// Handle to a canonical diagram owned by a [`Manager`][crate::sdd::Manager].
///
/// Handles are plain indices into the manager's unique table, tagged with the
/// generation of their slot and the epoch of the manager that created them.
/// Equality and hashing are O(1) and agree with set equality of the encoded
/// assignments.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Sdd {
    index: u32,
    generation: u32,
    epoch: u32,
}

impl Sdd {
    pub(crate) const ZERO_INDEX: u32 = 0;
    pub(crate) const ONE_INDEX: u32 = 1;

    pub(crate) const fn new(index: u32, generation: u32, epoch: u32) -> Self {
        Self {
            index,
            generation,
            epoch,
        }
    }

    /// Return the index of the diagram in the unique table.
    pub const fn index(self) -> u32 {
        self.index
    }

    pub(crate) const fn generation(self) -> u32 {
        self.generation
    }

    pub(crate) const fn epoch(self) -> u32 {
        self.epoch
    }

    pub const fn is_zero(self) -> bool {
        self.index == Self::ZERO_INDEX
    }

    pub const fn is_one(self) -> bool {
        self.index == Self::ONE_INDEX
    }

    pub const fn is_terminal(self) -> bool {
        self.index <= Self::ONE_INDEX
    }
}

impl Display for Sdd {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.index {
            Self::ZERO_INDEX => write!(f, "|0|"),
            Self::ONE_INDEX => write!(f, "|1|"),
            i => write!(f, "@{}", i),
        }
    }
}

/// Handle to an interned homomorphism owned by a [`Manager`][crate::sdd::Manager].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Hom {
    index: u32,
    generation: u32,
    epoch: u32,
}

impl Hom {
    pub(crate) const fn new(index: u32, generation: u32, epoch: u32) -> Self {
        Self {
            index,
            generation,
            epoch,
        }
    }

    /// Return the index of the homomorphism in the manager's table.
    pub const fn index(self) -> u32 {
        self.index
    }

    pub(crate) const fn generation(self) -> u32 {
        self.generation
    }

    pub(crate) const fn epoch(self) -> u32 {
        self.epoch
    }
}

impl Display for Hom {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "h{}", self.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminals() {
        let zero = Sdd::new(Sdd::ZERO_INDEX, 0, 7);
        let one = Sdd::new(Sdd::ONE_INDEX, 0, 7);
        let node = Sdd::new(5, 2, 7);
        assert!(zero.is_zero() && zero.is_terminal());
        assert!(one.is_one() && one.is_terminal());
        assert!(!node.is_terminal());
        assert_eq!(zero.to_string(), "|0|");
        assert_eq!(one.to_string(), "|1|");
        assert_eq!(node.to_string(), "@5");
    }

    #[test]
    fn test_epoch_distinguishes_handles() {
        assert_ne!(Sdd::new(3, 0, 1), Sdd::new(3, 0, 2));
        assert_eq!(Hom::new(3, 0, 1), Hom::new(3, 0, 1));
        assert_eq!(Hom::new(4, 0, 0).to_string(), "h4");
    }

    #[test]
    fn test_generation_distinguishes_handles() {
        let old = Sdd::new(3, 0, 1);
        let new = Sdd::new(3, 1, 1);
        assert_ne!(old, new);
        assert_eq!(old.index(), new.index());
        assert_eq!(new.generation(), 1);
        assert_ne!(Hom::new(3, 0, 1), Hom::new(3, 1, 1));
    }
}

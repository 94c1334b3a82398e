//! Type-safe wrapper for diagram variables.
//!
//! Diagram nodes do not store the user-facing identifiers of an order but the
//! *position* of the level inside the order tree, stamped with the order it
//! was built from. Positions are assigned depth-first from the top. Every
//! [`OrderBuilder::build`][crate::order::OrderBuilder::build] draws a fresh
//! stamp, so two orders of the same shape still yield distinct variables.
use std::fmt;

/// A variable: the position of a level in an [`Order`][crate::order::Order] (0-indexed, 0 is the top).
///
/// # Invariants
///
/// - Positions are unique inside one order tree, nested levels included
/// - All levels of one built order tree share the same stamp
/// - `Var::TERMINAL` is reserved for the two terminal nodes
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Var {
    stamp: u32,
    position: u32,
}

impl Var {
    /// Reserved variable of the terminal nodes.
    pub const TERMINAL: Var = Var {
        stamp: u32::MAX,
        position: u32::MAX,
    };

    /// Creates a new variable at the given position of the order stamped `stamp`.
    ///
    /// # Panics
    ///
    /// Panics if `position` collides with the reserved terminal variable.
    pub fn new(stamp: u32, position: u32) -> Self {
        assert_ne!(position, u32::MAX, "Position {} is reserved", u32::MAX);
        Var { stamp, position }
    }

    /// Returns the raw position.
    pub fn position(self) -> u32 {
        self.position
    }

    /// Returns the stamp of the order this variable belongs to.
    pub fn stamp(self) -> u32 {
        self.stamp
    }

    /// Returns the position as a `usize` for indexing.
    pub fn index(self) -> usize {
        self.position as usize
    }

    /// Checks if this is the reserved terminal variable.
    pub fn is_terminal(self) -> bool {
        self == Var::TERMINAL
    }
}

impl fmt::Display for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_terminal() {
            write!(f, "v⊥")
        } else {
            write!(f, "v{}", self.position)
        }
    }
}

impl From<Var> for u32 {
    fn from(var: Var) -> Self {
        var.position
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_var_creation() {
        let v0 = Var::new(4, 0);
        let v1 = Var::new(4, 1);
        assert_eq!(v0.position(), 0);
        assert_eq!(v0.stamp(), 4);
        assert_eq!(v1.index(), 1);
        assert!(v0 < v1);
        assert!(!v0.is_terminal());
        assert!(Var::TERMINAL.is_terminal());
    }

    #[test]
    fn test_stamp_distinguishes_vars() {
        assert_ne!(Var::new(0, 2), Var::new(1, 2));
        assert_eq!(Var::new(0, 2).to_string(), Var::new(1, 2).to_string());
    }

    #[test]
    #[should_panic(expected = "is reserved")]
    fn test_var_reserved_panics() {
        Var::new(0, u32::MAX);
    }

    #[test]
    fn test_display() {
        assert_eq!(Var::new(0, 3).to_string(), "v3");
        assert_eq!(Var::TERMINAL.to_string(), "v⊥");
    }
}

//! Iterator over the paths of a diagram.
//!
//! A path is one sequence of value sets, one per flat level of the order,
//! read along one branch of the diagram. Nested diagrams of hierarchical
//! levels are flattened into the path, so a path over the order
//! `[a, b[c, d], e]` holds the value sets of `a`, `c`, `d` and `e`.
//!
//! # Example
//!
//! ```
//! use sdd_rs::order::OrderBuilder;
//! use sdd_rs::sdd::Manager;
//! use sdd_rs::values::ValueSet;
//!
//! let mgr = Manager::init().unwrap();
//! let mut builder = OrderBuilder::new();
//! builder.push(1).push(0);
//! let order = builder.build().unwrap();
//!
//! let a = mgr.create_with(&order, |_| ValueSet::singleton(0));
//! let b = mgr.create_with(&order, |_| ValueSet::singleton(1));
//! let ab = mgr.union(a, b).unwrap();
//!
//! let paths: Vec<_> = mgr.paths(ab).collect();
//! assert_eq!(paths.len(), 2);
//! assert_eq!(paths[0].len(), 2);
//! ```
//!
//! Paths are produced lazily; the number of paths can be exponential in the
//! size of the diagram.

use std::fmt;
use std::rc::Rc;

use crate::error::{Result, SddError};
use crate::node::Valuation;
use crate::reference::Sdd;
use crate::sdd::Manager;
use crate::values::ValueSet;

impl Manager {
    /// Returns an iterator over all paths of the diagram.
    ///
    /// `|0|` has no path, `|1|` has exactly one, the empty path.
    pub fn paths(&self, sdd: Sdd) -> PathGenerator<'_> {
        self.check(sdd);
        PathGenerator::new(self, sdd)
    }
}

/// One path of a diagram: a value set per flat level, top first.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Path {
    values: Vec<ValueSet>,
}

impl Path {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value set of the `index`-th flat level of the path.
    pub fn value_set_at(&self, index: usize) -> Result<&ValueSet> {
        self.values.get(index).ok_or(SddError::IndexOutOfRange {
            index,
            len: self.values.len(),
        })
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ValueSet> {
        self.values.iter()
    }
}

impl IntoIterator for Path {
    type Item = ValueSet;
    type IntoIter = std::vec::IntoIter<ValueSet>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

impl<'a> IntoIterator for &'a Path {
    type Item = &'a ValueSet;
    type IntoIter = std::slice::Iter<'a, ValueSet>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, values) in self.values.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", values)?;
        }
        write!(f, "]")
    }
}

/// Diagrams still to traverse once the current one reaches `|1|`.
///
/// Pushed when entering a nested diagram: its successor continues the path.
type Continuation = Option<Rc<ContinuationNode>>;

struct ContinuationNode {
    sdd: Sdd,
    next: Continuation,
}

/// Frame on the exploration stack.
struct StackFrame {
    /// Node being explored.
    sdd: Sdd,
    /// Index of the arc currently followed.
    arc: usize,
    /// Length of the path before this node.
    path_len: usize,
    /// Continuation in effect at this node.
    continuation: Continuation,
}

/// An iterator over the paths of a diagram.
///
/// Created by [`Manager::paths()`]. Single-pass: create a new generator to
/// enumerate again.
///
/// # Implementation Notes
///
/// Depth-first traversal with an explicit stack. The current path is kept in
/// a single vector that grows and shrinks while backtracking; each yielded
/// [`Path`] is an independent copy.
pub struct PathGenerator<'a> {
    mgr: &'a Manager,
    root: Sdd,
    stack: Vec<StackFrame>,
    current_path: Vec<ValueSet>,
    started: bool,
    done: bool,
}

impl<'a> PathGenerator<'a> {
    fn new(mgr: &'a Manager, root: Sdd) -> Self {
        Self {
            mgr,
            root,
            stack: Vec::new(),
            current_path: Vec::new(),
            started: false,
            done: root.is_zero(),
        }
    }

    /// Follows `arc` from a node whose continuation is `continuation`.
    ///
    /// Returns the diagram to descend into and its continuation.
    fn follow(&mut self, arc: &(Valuation, Sdd), continuation: Continuation) -> (Sdd, Continuation) {
        let (valuation, succ) = arc;
        match valuation {
            Valuation::Values(values) => {
                self.current_path.push(values.clone());
                (*succ, continuation)
            }
            Valuation::Nested(nested) => {
                let continuation = Some(Rc::new(ContinuationNode {
                    sdd: *succ,
                    next: continuation,
                }));
                (*nested, continuation)
            }
        }
    }

    /// Descends along first arcs until a complete path is built.
    fn descend(&mut self, mut sdd: Sdd, mut continuation: Continuation) {
        loop {
            if sdd.is_one() {
                match continuation {
                    Some(node) => {
                        sdd = node.sdd;
                        continuation = node.next.clone();
                        continue;
                    }
                    None => return,
                }
            }
            // Canonical diagrams never reach `|0|` below a node.
            debug_assert!(!sdd.is_zero());

            let node = self.mgr.node(sdd);
            self.stack.push(StackFrame {
                sdd,
                arc: 0,
                path_len: self.current_path.len(),
                continuation: continuation.clone(),
            });
            (sdd, continuation) = self.follow(&node.arcs[0], continuation);
        }
    }

    /// Moves to the next sibling arc of the deepest frame that has one.
    fn backtrack(&mut self) -> bool {
        while let Some(frame) = self.stack.last_mut() {
            frame.arc += 1;
            let node = self.mgr.node(frame.sdd);
            if frame.arc < node.arcs.len() {
                let arc = frame.arc;
                let continuation = frame.continuation.clone();
                self.current_path.truncate(frame.path_len);
                let (sdd, continuation) = self.follow(&node.arcs[arc], continuation);
                self.descend(sdd, continuation);
                return true;
            }
            self.stack.pop();
        }
        false
    }
}

impl Iterator for PathGenerator<'_> {
    type Item = Path;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let found = if self.started {
            self.backtrack()
        } else {
            self.started = true;
            self.descend(self.root, None);
            true
        };

        if !found {
            self.done = true;
            return None;
        }
        Some(Path {
            values: self.current_path.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use test_log::test;

    use crate::order::{Order, OrderBuilder};

    fn flat_order(n: u32) -> Order {
        let mut builder = OrderBuilder::new();
        for id in (0..n).rev() {
            builder.push(id);
        }
        builder.build().unwrap()
    }

    fn set(values: &[u32]) -> ValueSet {
        values.iter().copied().collect()
    }

    #[test]
    fn test_terminals() {
        let mgr = Manager::init().unwrap();
        assert_eq!(mgr.paths(mgr.zero()).count(), 0);
        let paths: Vec<Path> = mgr.paths(mgr.one()).collect();
        assert_eq!(paths.len(), 1);
        assert!(paths[0].is_empty());
    }

    #[test]
    fn test_single_path() {
        let mgr = Manager::init().unwrap();
        let order = flat_order(3);
        let a = mgr.create_with(&order, |id| set(&[id, 5]));
        let paths: Vec<Path> = mgr.paths(a).collect();
        assert_eq!(paths.len(), 1);
        let path = &paths[0];
        assert_eq!(path.len(), 3);
        assert_eq!(path.value_set_at(0).unwrap(), &set(&[0, 5]));
        assert_eq!(path.value_set_at(2).unwrap(), &set(&[2, 5]));
        assert_eq!(
            path.value_set_at(3).unwrap_err(),
            SddError::IndexOutOfRange { index: 3, len: 3 }
        );
        assert_eq!(path.to_string(), "[{0,5}, {1,5}, {2,5}]");
    }

    #[test]
    fn test_full_product_is_a_single_path() {
        let mgr = Manager::init().unwrap();
        let order = flat_order(3);
        let mut all = mgr.zero();
        for a in 0..2 {
            for b in 0..3 {
                for c in 0..2 {
                    let values = [a, b, c];
                    let s = mgr.create_with(&order, |id| set(&[values[id as usize]]));
                    all = mgr.union(all, s).unwrap();
                }
            }
        }
        let paths: Vec<Path> = mgr.paths(all).collect();
        assert_eq!(paths.len(), 1);
        assert_eq!(mgr.size_u64(all), 12);
        assert_eq!(paths[0].to_string(), "[{0,1}, {0,1,2}, {0,1}]");
    }

    #[test]
    fn test_enumerates_every_path_once() {
        let mgr = Manager::init().unwrap();
        let order = flat_order(2);
        let mut all = mgr.zero();
        for (a, b) in [(0, 0), (0, 1), (1, 0), (2, 2)] {
            let s = mgr.create_with(&order, |id| set(&[if id == 0 { a } else { b }]));
            all = mgr.union(all, s).unwrap();
        }
        let paths: Vec<Path> = mgr.paths(all).collect();
        assert_eq!(paths.len(), 3);
        assert_eq!(mgr.size_u64(all), 4);

        let combinations: usize = paths
            .iter()
            .map(|p| (0..p.len()).map(|i| p.value_set_at(i).unwrap().len()).product::<usize>())
            .sum();
        assert_eq!(combinations, 4);

        let distinct: std::collections::HashSet<Path> = paths.iter().cloned().collect();
        assert_eq!(distinct.len(), 3);
        let mut rendered: Vec<String> = paths.iter().map(|p| p.to_string()).collect();
        rendered.sort();
        assert_eq!(rendered, vec!["[{0}, {0,1}]", "[{1}, {0}]", "[{2}, {2}]"]);
    }

    #[test]
    fn test_nested_levels_are_flattened() {
        let mgr = Manager::init().unwrap();
        let mut inner = OrderBuilder::new();
        inner.push(11).push(10);
        let mut builder = OrderBuilder::new();
        builder.push(2).push_nested(1, inner).push(0);
        let order = builder.build().unwrap();

        let a = mgr.create_with(&order, |id| set(&[id]));
        let b = mgr.create_with(&order, |id| if id == 11 { set(&[0]) } else { set(&[id]) });
        let ab = mgr.union(a, b).unwrap();

        let paths: Vec<Path> = mgr.paths(ab).collect();
        // Both nested diagrams lead to the same successor and are merged.
        assert_eq!(paths.len(), 1);
        let path = &paths[0];
        assert_eq!(path.len(), 4);
        assert_eq!(path.value_set_at(0).unwrap(), &set(&[0]));
        assert_eq!(path.value_set_at(1).unwrap(), &set(&[10]));
        assert_eq!(path.value_set_at(2).unwrap(), &set(&[0, 11]));
        assert_eq!(path.value_set_at(3).unwrap(), &set(&[2]));
        assert_eq!(mgr.size_u64(ab), 2);
    }
}

//! Variable orders.
//!
//! An [`Order`] is an immutable tree of identifiers: each level is either flat
//! (its domain is a [`ValueSet`][crate::values::ValueSet]) or hierarchical
//! (its domain is a set of diagrams over a nested order). Orders are built
//! once from an [`OrderBuilder`].
//!
//! ```
//! use sdd_rs::order::OrderBuilder;
//!
//! let mut inner = OrderBuilder::new();
//! inner.push(11);
//! inner.push(10);
//!
//! let mut builder = OrderBuilder::new();
//! builder.push(2);
//! builder.push_nested(1, inner);
//! builder.push(0);
//! let order = builder.build().unwrap();
//!
//! // The last pushed identifier is the top of the order.
//! assert_eq!(order.identifier(), Some(0));
//! assert_eq!(order.identifiers(), vec![0, 1, 10, 11, 2]);
//! ```

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::error::{Result, SddError};
use crate::types::Var;

/// User-facing name of a level of an order.
pub type Identifier = u32;

/// Stamp of the next built order.
static NEXT_STAMP: AtomicU32 = AtomicU32::new(0);

/// Accumulates the levels of an order.
///
/// Every [`push`][OrderBuilder::push] places its identifier on *top* of the
/// levels pushed so far.
#[derive(Debug, Clone, Default)]
pub struct OrderBuilder {
    /// Levels in push order; the last one is the top.
    levels: Vec<(Identifier, Option<OrderBuilder>)>,
}

impl OrderBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a flat level on top of the order.
    pub fn push(&mut self, identifier: Identifier) -> &mut Self {
        self.levels.push((identifier, None));
        self
    }

    /// Push a hierarchical level on top of the order.
    ///
    /// An empty `nested` builder yields a flat level.
    pub fn push_nested(&mut self, identifier: Identifier, nested: OrderBuilder) -> &mut Self {
        let nested = if nested.is_empty() { None } else { Some(nested) };
        self.levels.push((identifier, nested));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Number of levels at this depth.
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Freeze the builder.
    ///
    /// Fails with [`SddError::DuplicateIdentifier`] if an identifier occurs
    /// twice anywhere in the tree. An empty builder yields the empty order.
    ///
    /// Each call yields a distinct order: diagrams and homomorphisms built over
    /// it are rejected by any other order, even one built from the same builder.
    pub fn build(&self) -> Result<Order> {
        let mut seen = HashSet::new();
        self.check_duplicates(&mut seen)?;
        let stamp = NEXT_STAMP.fetch_add(1, Ordering::Relaxed);
        let mut counter = 0;
        Ok(self.assemble(self.levels.len(), stamp, &mut counter))
    }

    fn check_duplicates(&self, seen: &mut HashSet<Identifier>) -> Result<()> {
        for (identifier, nested) in self.levels.iter().rev() {
            if !seen.insert(*identifier) {
                return Err(SddError::DuplicateIdentifier(*identifier));
            }
            if let Some(nested) = nested {
                nested.check_duplicates(seen)?;
            }
        }
        Ok(())
    }

    /// Builds the order made of the first `count` pushed levels, assigning
    /// positions depth-first from the top.
    fn assemble(&self, count: usize, stamp: u32, counter: &mut u32) -> Order {
        if count == 0 {
            return Order::empty();
        }
        let (identifier, nested) = &self.levels[count - 1];
        let position = Var::new(stamp, *counter);
        *counter += 1;
        let nested = match nested {
            Some(builder) => builder.assemble(builder.levels.len(), stamp, counter),
            None => Order::empty(),
        };
        let next = self.assemble(count - 1, stamp, counter);
        Order(Some(Rc::new(OrderNode {
            identifier: *identifier,
            position,
            nested,
            next,
        })))
    }
}

#[derive(Debug)]
struct OrderNode {
    identifier: Identifier,
    position: Var,
    nested: Order,
    next: Order,
}

/// An immutable order: a linked list of levels, each possibly nesting another order.
///
/// Cloning is cheap. Clones and sub-orders ([`next`][Order::next],
/// [`nested`][Order::nested]) share the identity of the built order; separately
/// built orders never do.
#[derive(Debug, Clone, Default)]
pub struct Order(Option<Rc<OrderNode>>);

impl Order {
    /// The order without any level.
    pub fn empty() -> Self {
        Order(None)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }

    /// Identifier of the top level.
    pub fn identifier(&self) -> Option<Identifier> {
        self.0.as_ref().map(|n| n.identifier)
    }

    /// Position (diagram variable) of the top level.
    pub fn position(&self) -> Option<Var> {
        self.0.as_ref().map(|n| n.position)
    }

    /// Nested order of the top level; empty for flat levels.
    pub fn nested(&self) -> Order {
        self.0.as_ref().map(|n| n.nested.clone()).unwrap_or_default()
    }

    /// The order below the top level.
    pub fn next(&self) -> Order {
        self.0.as_ref().map(|n| n.next.clone()).unwrap_or_default()
    }

    /// Checks if the top level is hierarchical.
    pub fn is_hierarchical(&self) -> bool {
        self.0.as_ref().is_some_and(|n| !n.nested.is_empty())
    }

    /// Number of levels at this depth.
    pub fn len(&self) -> usize {
        let mut len = 0;
        let mut cur = self.0.as_ref();
        while let Some(node) = cur {
            len += 1;
            cur = node.next.0.as_ref();
        }
        len
    }

    /// Iterates over the levels at this depth, top first.
    pub fn levels(&self) -> Levels {
        Levels(self.clone())
    }

    /// All identifiers of the tree, depth-first from the top.
    pub fn identifiers(&self) -> Vec<Identifier> {
        let mut res = Vec::new();
        self.collect_identifiers(&mut res);
        res
    }

    fn collect_identifiers(&self, res: &mut Vec<Identifier>) {
        for level in self.levels() {
            if let Some(id) = level.identifier() {
                res.push(id);
            }
            level.nested().collect_identifiers(res);
        }
    }

    /// Position of `identifier` anywhere in the tree.
    pub fn position_of(&self, identifier: Identifier) -> Option<Var> {
        self.locate(identifier).and_then(|(_, level)| level.position())
    }

    pub fn contains(&self, identifier: Identifier) -> bool {
        self.locate(identifier).is_some()
    }

    /// Finds `identifier` in the tree.
    ///
    /// Returns the hierarchical levels enclosing it (outermost first) and the
    /// order whose top level is `identifier`.
    pub(crate) fn locate(&self, identifier: Identifier) -> Option<(Vec<Order>, Order)> {
        for level in self.levels() {
            if level.identifier() == Some(identifier) {
                return Some((Vec::new(), level));
            }
            if let Some((mut path, found)) = level.nested().locate(identifier) {
                path.insert(0, level);
                return Some((path, found));
            }
        }
        None
    }

    /// Maps every position of the tree to whether its level is hierarchical.
    pub(crate) fn kinds(&self) -> HashMap<Var, bool> {
        let mut res = HashMap::new();
        self.collect_kinds(&mut res);
        res
    }

    fn collect_kinds(&self, res: &mut HashMap<Var, bool>) {
        for level in self.levels() {
            if let Some(position) = level.position() {
                res.insert(position, level.is_hierarchical());
            }
            level.nested().collect_kinds(res);
        }
    }
}

/// Iterator over the levels of one depth of an [`Order`].
pub struct Levels(Order);

impl Iterator for Levels {
    type Item = Order;

    fn next(&mut self) -> Option<Self::Item> {
        if self.0.is_empty() {
            return None;
        }
        let next = self.0.next();
        Some(std::mem::replace(&mut self.0, next))
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, level) in self.levels().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            if let Some(id) = level.identifier() {
                write!(f, "{}", id)?;
            }
            if level.is_hierarchical() {
                write!(f, "{}", level.nested())?;
            }
        }
        write!(f, "]")
    }
}

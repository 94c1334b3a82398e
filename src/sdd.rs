//! The diagram manager: owns all nodes and homomorphisms and performs every operation.
//!
//! # Overview
//!
//! A hierarchical Set Decision Diagram encodes a set of assignments over the
//! levels of an [`Order`]. A node is labelled with a variable (the position of
//! a level) and carries arcs `(valuation, successor)`. On flat levels the
//! valuation is a [`ValueSet`]; on hierarchical levels it is itself a diagram
//! over the nested order.
//!
//! There are two terminals:
//!
//! - `|0|`: the empty set of assignments
//! - `|1|`: the set holding only the empty assignment
//!
//! # Canonicity
//!
//! Nodes are hash-consed in a unique table. Valuations of a node are
//! non-empty and pairwise disjoint, successors are non-zero and pairwise
//! distinct, and arcs are sorted by successor. Therefore two handles are equal
//! iff they encode the same set.
//!
//! # Quick Start
//!
//! ```
//! use sdd_rs::order::OrderBuilder;
//! use sdd_rs::sdd::Manager;
//! use sdd_rs::values::ValueSet;
//!
//! let mgr = Manager::init().unwrap();
//!
//! let mut builder = OrderBuilder::new();
//! builder.push(1).push(0);
//! let order = builder.build().unwrap();
//!
//! let a = mgr.create_with(&order, |id| ValueSet::singleton(id));
//! let b = mgr.create_with(&order, |_| ValueSet::singleton(7));
//! let u = mgr.union(a, b).unwrap();
//!
//! assert_eq!(mgr.size_u64(u), 2);
//! assert_eq!(mgr.intersection(u, a).unwrap(), a);
//! assert_eq!(mgr.to_string(a), "v0[{0} --> v1[{1} --> |1|]]");
//! ```
//!
//! # Lifecycle
//!
//! Only one manager may be alive per thread: [`Manager::init`] fails with
//! [`SddError::AlreadyInitialized`] otherwise. Handles are tagged with the
//! epoch of their manager; using a handle after its manager was shut down
//! panics. They are also tagged with the generation of their table slot, so a
//! handle reclaimed by [`Manager::collect_garbage`] panics on use instead of
//! aliasing whatever node later reuses the slot.

use std::cell::{Cell, RefCell};
use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU32, Ordering};

use log::{debug, info};
use num_bigint::BigUint;
use num_traits::{One, ToPrimitive, Zero};

use crate::cache::{Cache, HomKey, OpKey, OpType};
use crate::config::SddConfig;
use crate::error::{Result, SddError};
use crate::hom::HomEntry;
use crate::node::{SddNode, Valuation};
use crate::order::{Identifier, Order};
use crate::reference::{Hom, Sdd};
use crate::table::UniqueTable;
use crate::types::Var;
use crate::values::ValueSet;

thread_local! {
    static LIVE: Cell<bool> = const { Cell::new(false) };
}

static NEXT_EPOCH: AtomicU32 = AtomicU32::new(1);

/// Structural size of a diagram, as reported by [`Manager::node_count`].
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct NodeCount {
    /// Distinct flat nodes.
    pub flat: usize,
    /// Distinct hierarchical nodes.
    pub hierarchical: usize,
    /// Arcs of all distinct nodes.
    pub arcs: usize,
}

impl NodeCount {
    /// Total number of distinct non-terminal nodes.
    pub fn nodes(&self) -> usize {
        self.flat + self.hierarchical
    }
}

/// Table sizes and cache counters, as reported by [`Manager::stats`].
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct ManagerStats {
    pub nodes: usize,
    pub homs: usize,
    pub unique_hits: usize,
    pub cache_entries: usize,
    pub cache_hits: usize,
    pub cache_misses: usize,
    pub hom_cache_entries: usize,
    pub hom_cache_hits: usize,
    pub hom_cache_misses: usize,
}

pub struct Manager {
    pub(crate) epoch: u32,
    config: SddConfig,
    nodes: RefCell<UniqueTable<SddNode>>,
    pub(crate) homs: RefCell<UniqueTable<HomEntry>>,
    cache: RefCell<Cache<OpKey, Sdd>>,
    pub(crate) hom_cache: RefCell<Cache<HomKey, Sdd>>,
    size_cache: RefCell<Cache<Sdd, BigUint>>,
}

impl Manager {
    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Creates the manager of this thread with the default configuration.
    pub fn init() -> Result<Self> {
        Self::with_config(SddConfig::default())
    }

    /// Creates the manager of this thread.
    pub fn with_config(config: SddConfig) -> Result<Self> {
        if LIVE.with(|live| live.replace(true)) {
            return Err(SddError::AlreadyInitialized);
        }
        let epoch = NEXT_EPOCH.fetch_add(1, Ordering::Relaxed);
        info!("Initializing SDD manager #{} with {:?}", epoch, config);

        Ok(Self {
            epoch,
            nodes: RefCell::new(UniqueTable::new(config.table_bits, 2)),
            homs: RefCell::new(UniqueTable::new(config.table_bits, 0)),
            cache: RefCell::new(Cache::new(config.cache_bits, config.cache_limit)),
            hom_cache: RefCell::new(Cache::new(config.cache_bits, config.cache_limit)),
            size_cache: RefCell::new(Cache::new(config.cache_bits, config.cache_limit)),
            config,
        })
    }

    /// Shuts the manager down, invalidating every handle created under it.
    pub fn deinit(self) {
        drop(self);
    }

    pub fn config(&self) -> &SddConfig {
        &self.config
    }

    pub(crate) fn check(&self, sdd: Sdd) {
        assert_eq!(
            sdd.epoch(),
            self.epoch,
            "Diagram {} does not belong to the live manager",
            sdd
        );
    }

    pub(crate) fn check_hom(&self, hom: Hom) {
        assert_eq!(
            hom.epoch(),
            self.epoch,
            "Homomorphism {} does not belong to the live manager",
            hom
        );
    }

    // ========================================================================
    // Terminals and nodes
    // ========================================================================

    /// The empty set of assignments.
    pub fn zero(&self) -> Sdd {
        Sdd::new(Sdd::ZERO_INDEX, 0, self.epoch)
    }

    /// The set containing only the empty assignment.
    pub fn one(&self) -> Sdd {
        Sdd::new(Sdd::ONE_INDEX, 0, self.epoch)
    }

    /// The empty diagram.
    pub fn create(&self) -> Sdd {
        self.zero()
    }

    pub fn is_zero(&self, sdd: Sdd) -> bool {
        sdd.is_zero()
    }

    pub fn is_one(&self, sdd: Sdd) -> bool {
        sdd.is_one()
    }

    pub fn is_terminal(&self, sdd: Sdd) -> bool {
        sdd.is_terminal()
    }

    /// Two diagrams are equal iff they encode the same set.
    pub fn equals(&self, a: Sdd, b: Sdd) -> bool {
        self.check(a);
        self.check(b);
        a == b
    }

    /// Stable hash of the diagram identity.
    pub fn hash(&self, sdd: Sdd) -> u64 {
        self.check(sdd);
        let mut hasher = DefaultHasher::new();
        sdd.hash(&mut hasher);
        hasher.finish()
    }

    pub(crate) fn node(&self, sdd: Sdd) -> SddNode {
        self.check(sdd);
        assert!(!sdd.is_terminal(), "Terminal {} has no node", sdd);
        let nodes = self.nodes.borrow();
        match nodes.get(sdd.index()) {
            Some(node) if nodes.generation(sdd.index()) == sdd.generation() => node.clone(),
            _ => panic!("Diagram {} was reclaimed by the garbage collector", sdd),
        }
    }

    /// Variable of the top node, `None` for terminals.
    pub fn variable(&self, sdd: Sdd) -> Option<Var> {
        if sdd.is_terminal() {
            None
        } else {
            Some(self.node(sdd).var)
        }
    }

    /// Arcs of the top node; empty for terminals.
    pub fn arcs(&self, sdd: Sdd) -> Vec<(Valuation, Sdd)> {
        if sdd.is_terminal() {
            Vec::new()
        } else {
            self.node(sdd).arcs.to_vec()
        }
    }

    /// Interns a node from arcs with disjoint valuations and distinct successors.
    ///
    /// Arcs with an empty valuation or a zero successor are dropped.
    pub(crate) fn mk_node(&self, var: Var, mut arcs: Vec<(Valuation, Sdd)>) -> Sdd {
        arcs.retain(|(valuation, succ)| !succ.is_zero() && !valuation.is_empty());
        if arcs.is_empty() {
            return self.zero();
        }
        arcs.sort_by_key(|(_, succ)| *succ);
        debug_assert!(arcs.windows(2).all(|w| w[0].1 != w[1].1), "Successors must be distinct");

        let mut nodes = self.nodes.borrow_mut();
        let index = nodes.put(SddNode::new(var, arcs));
        Sdd::new(index, nodes.generation(index), self.epoch)
    }

    /// Merges arcs sharing a successor by uniting their valuations, then interns the node.
    ///
    /// Valuations must be pairwise disjoint.
    pub(crate) fn square_union(&self, var: Var, arcs: Vec<(Valuation, Sdd)>) -> Result<Sdd> {
        let mut merged: BTreeMap<Sdd, Valuation> = BTreeMap::new();
        for (valuation, succ) in arcs {
            if valuation.is_empty() || succ.is_zero() {
                continue;
            }
            let valuation = match merged.remove(&succ) {
                Some(prev) => self.combine(OpType::Union, var, &prev, &valuation)?,
                None => valuation,
            };
            merged.insert(succ, valuation);
        }
        Ok(self.mk_node(var, merged.into_iter().map(|(succ, valuation)| (valuation, succ)).collect()))
    }

    /// Builds the single assignment binding every flat identifier of `order`
    /// to `initializer(identifier)`.
    ///
    /// Hierarchical levels are built recursively from their nested order.
    pub fn create_with<F>(&self, order: &Order, mut initializer: F) -> Sdd
    where
        F: FnMut(Identifier) -> ValueSet,
    {
        self.build_assignment(order, &mut initializer)
    }

    fn build_assignment(&self, order: &Order, initializer: &mut dyn FnMut(Identifier) -> ValueSet) -> Sdd {
        let levels: Vec<Order> = order.levels().collect();
        let mut res = self.one();
        for level in levels.iter().rev() {
            let (Some(identifier), Some(var)) = (level.identifier(), level.position()) else {
                continue;
            };
            let valuation = if level.is_hierarchical() {
                Valuation::Nested(self.build_assignment(&level.nested(), initializer))
            } else {
                Valuation::Values(initializer(identifier))
            };
            res = self.mk_node(var, vec![(valuation, res)]);
        }
        res
    }

    // ========================================================================
    // Set operations
    // ========================================================================

    fn describe(&self, sdd: Sdd) -> String {
        match self.variable(sdd) {
            Some(var) => format!("{} rooted at {}", sdd, var),
            None => sdd.to_string(),
        }
    }

    fn incompatible(&self, a: Sdd, b: Sdd) -> SddError {
        SddError::IncompatibleDiagrams {
            lhs: self.describe(a),
            rhs: self.describe(b),
        }
    }

    /// Top nodes of two non-terminal diagrams sharing the same variable.
    fn node_pair(&self, a: Sdd, b: Sdd) -> Result<(SddNode, SddNode)> {
        if a.is_terminal() || b.is_terminal() {
            return Err(self.incompatible(a, b));
        }
        let (na, nb) = (self.node(a), self.node(b));
        if na.var != nb.var {
            return Err(self.incompatible(a, b));
        }
        Ok((na, nb))
    }

    /// Applies a set operation to two valuations of the same kind.
    pub(crate) fn combine(&self, op: OpType, var: Var, a: &Valuation, b: &Valuation) -> Result<Valuation> {
        match (a, b) {
            (Valuation::Values(x), Valuation::Values(y)) => Ok(Valuation::Values(match op {
                OpType::Union => x.union(y),
                OpType::Intersection => x.intersection(y),
                OpType::Difference => x.difference(y),
            })),
            (Valuation::Nested(x), Valuation::Nested(y)) => Ok(Valuation::Nested(match op {
                OpType::Union => self.union(*x, *y)?,
                OpType::Intersection => self.intersection(*x, *y)?,
                OpType::Difference => self.difference(*x, *y)?,
            })),
            _ => Err(SddError::ValuationMismatch(var)),
        }
    }

    fn cached(&self, key: &OpKey) -> Option<Sdd> {
        self.cache.borrow_mut().get(key)
    }

    /// Set union.
    pub fn union(&self, a: Sdd, b: Sdd) -> Result<Sdd> {
        self.check(a);
        self.check(b);

        if a == b || b.is_zero() {
            return Ok(a);
        }
        if a.is_zero() {
            return Ok(b);
        }

        let key = OpKey::commutative(OpType::Union, a, b);
        if let Some(res) = self.cached(&key) {
            debug!("union({}, {}) -> {} (cached)", a, b, res);
            return Ok(res);
        }

        let (na, nb) = self.node_pair(a, b)?;
        let var = na.var;

        // Refine the partition of `a` with every arc of `b`.
        let mut parts: Vec<(Valuation, Sdd)> = na.arcs.to_vec();
        for (beta, t) in nb.arcs.iter() {
            let mut rest = beta.clone();
            let mut next = Vec::with_capacity(parts.len() + 1);
            for (alpha, s) in parts {
                if rest.is_empty() {
                    next.push((alpha, s));
                    continue;
                }
                let common = self.combine(OpType::Intersection, var, &alpha, &rest)?;
                if common.is_empty() {
                    next.push((alpha, s));
                    continue;
                }
                let alpha_only = self.combine(OpType::Difference, var, &alpha, &rest)?;
                rest = self.combine(OpType::Difference, var, &rest, &alpha)?;
                if !alpha_only.is_empty() {
                    next.push((alpha_only, s));
                }
                next.push((common, self.union(s, *t)?));
            }
            if !rest.is_empty() {
                next.push((rest, *t));
            }
            parts = next;
        }

        let res = self.square_union(var, parts)?;
        debug!("union({}, {}) -> {}", a, b, res);
        self.cache.borrow_mut().insert(key, res);
        Ok(res)
    }

    /// Set intersection.
    pub fn intersection(&self, a: Sdd, b: Sdd) -> Result<Sdd> {
        self.check(a);
        self.check(b);

        if a == b {
            return Ok(a);
        }
        if a.is_zero() || b.is_zero() {
            return Ok(self.zero());
        }

        let key = OpKey::commutative(OpType::Intersection, a, b);
        if let Some(res) = self.cached(&key) {
            debug!("intersection({}, {}) -> {} (cached)", a, b, res);
            return Ok(res);
        }

        let (na, nb) = self.node_pair(a, b)?;
        let var = na.var;

        let mut arcs = Vec::new();
        for (alpha, s) in na.arcs.iter() {
            for (beta, t) in nb.arcs.iter() {
                let common = self.combine(OpType::Intersection, var, alpha, beta)?;
                if common.is_empty() {
                    continue;
                }
                let succ = self.intersection(*s, *t)?;
                if !succ.is_zero() {
                    arcs.push((common, succ));
                }
            }
        }

        let res = self.square_union(var, arcs)?;
        debug!("intersection({}, {}) -> {}", a, b, res);
        self.cache.borrow_mut().insert(key, res);
        Ok(res)
    }

    /// Set difference `a \ b`.
    pub fn difference(&self, a: Sdd, b: Sdd) -> Result<Sdd> {
        self.check(a);
        self.check(b);

        if a == b || a.is_zero() {
            return Ok(self.zero());
        }
        if b.is_zero() {
            return Ok(a);
        }

        let key = OpKey::non_commutative(OpType::Difference, a, b);
        if let Some(res) = self.cached(&key) {
            debug!("difference({}, {}) -> {} (cached)", a, b, res);
            return Ok(res);
        }

        let (na, nb) = self.node_pair(a, b)?;
        let var = na.var;

        let mut arcs = Vec::new();
        for (alpha, s) in na.arcs.iter() {
            let mut rest = alpha.clone();
            for (beta, t) in nb.arcs.iter() {
                if rest.is_empty() {
                    break;
                }
                let common = self.combine(OpType::Intersection, var, &rest, beta)?;
                if common.is_empty() {
                    continue;
                }
                rest = self.combine(OpType::Difference, var, &rest, beta)?;
                arcs.push((common, self.difference(*s, *t)?));
            }
            if !rest.is_empty() {
                arcs.push((rest, *s));
            }
        }

        let res = self.square_union(var, arcs)?;
        debug!("difference({}, {}) -> {}", a, b, res);
        self.cache.borrow_mut().insert(key, res);
        Ok(res)
    }

    /// Union of any number of diagrams; `|0|` for none.
    pub fn union_many<I>(&self, sdds: I) -> Result<Sdd>
    where
        I: IntoIterator<Item = Sdd>,
    {
        sdds.into_iter().try_fold(self.zero(), |acc, sdd| self.union(acc, sdd))
    }

    // ========================================================================
    // Inspection
    // ========================================================================

    /// Number of assignments encoded by the diagram.
    ///
    /// A flat arc contributes one assignment per value of its valuation.
    pub fn size(&self, sdd: Sdd) -> BigUint {
        self.check(sdd);
        if sdd.is_zero() {
            return BigUint::zero();
        }
        if sdd.is_one() {
            return BigUint::one();
        }

        if let Some(count) = self.size_cache.borrow_mut().get(&sdd) {
            return count;
        }

        let node = self.node(sdd);
        let mut count = BigUint::zero();
        for (valuation, succ) in node.arcs.iter() {
            let width = match valuation {
                Valuation::Values(values) => BigUint::from(values.len()),
                Valuation::Nested(nested) => self.size(*nested),
            };
            count += width * self.size(*succ);
        }

        self.size_cache.borrow_mut().insert(sdd, count.clone());
        count
    }

    /// [`size`][Manager::size] truncated to 64 bits: saturates at `u64::MAX`.
    pub fn size_u64(&self, sdd: Sdd) -> u64 {
        self.size(sdd).to_u64().unwrap_or(u64::MAX)
    }

    /// Distinct nodes (nested diagrams included) and arcs reachable from `sdd`.
    pub fn node_count(&self, sdd: Sdd) -> NodeCount {
        self.check(sdd);
        let mut count = NodeCount::default();
        let mut visited = HashSet::new();
        let mut stack = vec![sdd];

        while let Some(current) = stack.pop() {
            if current.is_terminal() || !visited.insert(current) {
                continue;
            }
            let node = self.node(current);
            if node.is_hierarchical() {
                count.hierarchical += 1;
            } else {
                count.flat += 1;
            }
            count.arcs += node.arcs.len();
            for (valuation, succ) in node.arcs.iter() {
                if let Valuation::Nested(nested) = valuation {
                    stack.push(*nested);
                }
                stack.push(*succ);
            }
        }

        count
    }

    /// Deterministic textual rendering of the diagram structure.
    ///
    /// Shared sub-diagrams are rendered once per occurrence.
    pub fn to_string(&self, sdd: Sdd) -> String {
        SddDisplay { manager: self, sdd }.to_string()
    }

    fn write_sdd(&self, f: &mut fmt::Formatter<'_>, sdd: Sdd) -> fmt::Result {
        if sdd.is_terminal() {
            return write!(f, "{}", sdd);
        }
        let node = self.node(sdd);
        write!(f, "{}[", node.var)?;
        for (i, (valuation, succ)) in node.arcs.iter().enumerate() {
            if i > 0 {
                f.write_str(" + ")?;
            }
            match valuation {
                Valuation::Values(values) => write!(f, "{}", values)?,
                Valuation::Nested(nested) => {
                    f.write_str("(")?;
                    self.write_sdd(f, *nested)?;
                    f.write_str(")")?;
                }
            }
            f.write_str(" --> ")?;
            self.write_sdd(f, *succ)?;
        }
        f.write_str("]")
    }

    // ========================================================================
    // Memory management
    // ========================================================================

    /// Drops all memoized results.
    pub fn clear_caches(&self) {
        self.cache.borrow_mut().clear();
        self.hom_cache.borrow_mut().clear();
        self.size_cache.borrow_mut().clear();
    }

    /// Reclaims every node and homomorphism not reachable from the roots.
    ///
    /// Caches are cleared first. Handles not reachable from the roots are
    /// invalid afterwards: using one panics, even once its slot is reused.
    pub fn collect_garbage(&self, sdd_roots: &[Sdd], hom_roots: &[Hom]) {
        debug!("Collecting garbage...");
        self.clear_caches();

        let mut alive_homs = vec![false; self.homs.borrow().capacity()];
        let mut sdd_stack: Vec<Sdd> = sdd_roots.to_vec();
        let mut hom_stack: Vec<Hom> = hom_roots.to_vec();

        while let Some(hom) = hom_stack.pop() {
            self.check_hom(hom);
            let index = hom.index() as usize;
            if alive_homs[index] {
                continue;
            }
            alive_homs[index] = true;
            let (homs, sdds) = self.hom_entry(hom).node.children();
            hom_stack.extend(homs);
            sdd_stack.extend(sdds);
        }

        let mut alive_nodes = vec![false; self.nodes.borrow().capacity()];
        while let Some(sdd) = sdd_stack.pop() {
            self.check(sdd);
            let index = sdd.index() as usize;
            if sdd.is_terminal() || alive_nodes[index] {
                continue;
            }
            alive_nodes[index] = true;
            for (valuation, succ) in self.node(sdd).arcs.iter() {
                if let Valuation::Nested(nested) = valuation {
                    sdd_stack.push(*nested);
                }
                sdd_stack.push(*succ);
            }
        }

        let freed_nodes = self.nodes.borrow_mut().retain(&alive_nodes);
        let freed_homs = self.homs.borrow_mut().retain(&alive_homs);
        info!(
            "Garbage collection freed {} nodes and {} homomorphisms ({} nodes and {} homomorphisms alive)",
            freed_nodes,
            freed_homs,
            self.nodes.borrow().len(),
            self.homs.borrow().len()
        );
    }

    pub fn stats(&self) -> ManagerStats {
        let nodes = self.nodes.borrow();
        let cache = self.cache.borrow();
        let hom_cache = self.hom_cache.borrow();
        ManagerStats {
            nodes: nodes.len(),
            homs: self.homs.borrow().len(),
            unique_hits: nodes.hits(),
            cache_entries: cache.len(),
            cache_hits: cache.hits(),
            cache_misses: cache.misses(),
            hom_cache_entries: hom_cache.len(),
            hom_cache_hits: hom_cache.hits(),
            hom_cache_misses: hom_cache.misses(),
        }
    }
}

impl Drop for Manager {
    fn drop(&mut self) {
        info!("Shutting down SDD manager #{}", self.epoch);
        let _ = LIVE.try_with(|live| live.set(false));
    }
}

struct SddDisplay<'a> {
    manager: &'a Manager,
    sdd: Sdd,
}

impl fmt::Display for SddDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.manager.write_sdd(f, self.sdd)
    }
}

impl fmt::Debug for Manager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stats = self.stats();
        f.debug_struct("Manager")
            .field("epoch", &self.epoch)
            .field("nodes", &stats.nodes)
            .field("homs", &stats.homs)
            .field("cache_entries", &stats.cache_entries)
            .field("hom_cache_entries", &stats.hom_cache_entries)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use test_log::test;

    use crate::order::OrderBuilder;

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
    fn test_init_twice_fails() {
        let mgr = Manager::init().unwrap();
        assert_eq!(Manager::init().unwrap_err(), SddError::AlreadyInitialized);
        mgr.deinit();
        let mgr = Manager::init().unwrap();
        drop(mgr);
    }

    #[test]
    #[should_panic(expected = "does not belong to the live manager")]
    fn test_stale_handle_panics() {
        let order = flat_order(1);
        let mgr = Manager::init().unwrap();
        let a = mgr.create_with(&order, |_| set(&[0]));
        mgr.deinit();
        let mgr = Manager::init().unwrap();
        mgr.size(a);
    }

    #[test]
    fn test_recycled_slot_yields_a_distinct_handle() {
        let order = flat_order(1);
        let mgr = Manager::init().unwrap();
        let keep = mgr.create_with(&order, |_| set(&[0]));
        let held = mgr.create_with(&order, |_| set(&[1, 2]));
        mgr.collect_garbage(&[keep], &[]);

        let other = mgr.create_with(&order, |_| set(&[5, 6, 7]));
        assert_eq!(other.index(), held.index());
        assert_ne!(other, held);
        assert_eq!(mgr.size_u64(other), 3);
        assert_eq!(mgr.size_u64(keep), 1);
    }

    #[test]
    #[should_panic(expected = "was reclaimed by the garbage collector")]
    fn test_reclaimed_handle_panics() {
        let order = flat_order(1);
        let mgr = Manager::init().unwrap();
        let keep = mgr.create_with(&order, |_| set(&[0]));
        let held = mgr.create_with(&order, |_| set(&[1, 2]));
        mgr.collect_garbage(&[keep], &[]);
        let _ = mgr.create_with(&order, |_| set(&[5, 6, 7]));
        mgr.size(held);
    }

    #[test]
    #[should_panic(expected = "Homomorphism")]
    fn test_reclaimed_hom_panics() {
        let order = flat_order(1);
        let mgr = Manager::init().unwrap();
        let c = mgr.create_with(&order, |_| set(&[0]));
        let held = mgr.cons(&order, set(&[1]).into(), mgr.identity()).unwrap();
        mgr.collect_garbage(&[c], &[mgr.identity()]);
        let _ = mgr.cons(&order, set(&[2]).into(), mgr.identity()).unwrap();
        let _ = mgr.apply(&order, held, c);
    }

    #[test]
    fn test_terminals() {
        let mgr = Manager::init().unwrap();
        assert!(mgr.is_zero(mgr.zero()));
        assert!(mgr.is_one(mgr.one()));
        assert_eq!(mgr.create(), mgr.zero());
        assert_eq!(mgr.size_u64(mgr.zero()), 0);
        assert_eq!(mgr.size_u64(mgr.one()), 1);
        assert_eq!(mgr.to_string(mgr.zero()), "|0|");
        assert_eq!(mgr.to_string(mgr.one()), "|1|");
        assert_eq!(mgr.union(mgr.one(), mgr.zero()).unwrap(), mgr.one());
        assert_eq!(mgr.intersection(mgr.one(), mgr.one()).unwrap(), mgr.one());
        assert_eq!(mgr.difference(mgr.one(), mgr.one()).unwrap(), mgr.zero());
    }

    #[test]
    fn test_create_with() {
        let mgr = Manager::init().unwrap();
        let order = flat_order(3);
        let a = mgr.create_with(&order, |id| set(&[id, id + 10]));
        assert_eq!(mgr.size_u64(a), 8);
        assert_eq!(mgr.to_string(a), "v0[{0,10} --> v1[{1,11} --> v2[{2,12} --> |1|]]]");
        assert_eq!(mgr.node_count(a), NodeCount { flat: 3, hierarchical: 0, arcs: 3 });

        let empty = mgr.create_with(&order, |id| if id == 1 { ValueSet::empty() } else { set(&[0]) });
        assert!(empty.is_zero());

        let same = mgr.create_with(&order, |id| set(&[id + 10, id]));
        assert_eq!(a, same);
        assert_eq!(mgr.hash(a), mgr.hash(same));
    }

    #[test]
    fn test_union_partitions_arcs() {
        let mgr = Manager::init().unwrap();
        let order = flat_order(2);
        let a = mgr.create_with(&order, |id| if id == 0 { set(&[0, 1]) } else { set(&[0]) });
        let b = mgr.create_with(&order, |id| if id == 0 { set(&[1, 2]) } else { set(&[1]) });
        let u = mgr.union(a, b).unwrap();

        assert_eq!(mgr.size_u64(u), 4);
        let arcs = mgr.arcs(u);
        assert_eq!(arcs.len(), 3);
        let mut valuations: Vec<ValueSet> = arcs.iter().map(|(v, _)| v.as_values().unwrap().clone()).collect();
        valuations.sort();
        assert_eq!(valuations, vec![set(&[0]), set(&[1]), set(&[2])]);
        for w in arcs.windows(2) {
            assert!(w[0].1 < w[1].1);
        }

        assert_eq!(mgr.union(b, a).unwrap(), u);
        assert_eq!(mgr.intersection(u, a).unwrap(), a);
        assert_eq!(mgr.difference(u, b).unwrap(), mgr.difference(a, b).unwrap());
        assert_eq!(mgr.union(mgr.difference(u, a).unwrap(), a).unwrap(), u);
    }

    #[test]
    fn test_square_union_merges_equal_successors() {
        let mgr = Manager::init().unwrap();
        let order = flat_order(2);
        let a = mgr.create_with(&order, |id| if id == 0 { set(&[0]) } else { set(&[5]) });
        let b = mgr.create_with(&order, |id| if id == 0 { set(&[1]) } else { set(&[5]) });
        let u = mgr.union(a, b).unwrap();
        let expected = mgr.create_with(&order, |id| if id == 0 { set(&[0, 1]) } else { set(&[5]) });
        assert_eq!(u, expected);
        assert_eq!(mgr.node_count(u).nodes(), 2);
    }

    #[test]
    fn test_incompatible_diagrams() {
        let mgr = Manager::init().unwrap();
        let a = mgr.create_with(&flat_order(2), |_| set(&[0]));
        let b = mgr.create_with(&flat_order(1), |_| set(&[0]));
        let one = mgr.one();
        assert!(matches!(mgr.union(a, one), Err(SddError::IncompatibleDiagrams { .. })));
        assert!(matches!(mgr.intersection(one, a), Err(SddError::IncompatibleDiagrams { .. })));

        let mut builder = OrderBuilder::new();
        builder.push(0).push(1);
        let c = mgr.create_with(&builder.build().unwrap(), |_| set(&[3]));
        // Same shape, but another order.
        assert!(matches!(mgr.union(a, c), Err(SddError::IncompatibleDiagrams { .. })));
        // Different depth: the second level of `a` meets `|1|`.
        assert!(matches!(mgr.union(a, b), Err(SddError::IncompatibleDiagrams { .. })));
    }

    #[test]
    fn test_hierarchical_union() {
        let mgr = Manager::init().unwrap();
        let mut inner = OrderBuilder::new();
        inner.push(11).push(10);
        let mut builder = OrderBuilder::new();
        builder.push(1).push_nested(0, inner);
        let order = builder.build().unwrap();

        let a = mgr.create_with(&order, |id| set(&[id % 2]));
        let b = mgr.create_with(&order, |id| set(&[id]));
        let u = mgr.union(a, b).unwrap();
        assert_eq!(mgr.size_u64(u), 2);
        assert_eq!(mgr.intersection(u, b).unwrap(), b);
        assert_eq!(mgr.difference(u, a).unwrap(), b);

        let count = mgr.node_count(a);
        assert_eq!(count.hierarchical, 1);
        assert_eq!(count.flat, 3);
        assert_eq!(mgr.to_string(a), "v0[(v1[{0} --> v2[{1} --> |1|]]) --> v3[{1} --> |1|]]");
    }

    #[test]
    fn test_size_saturates() {
        let mgr = Manager::init().unwrap();
        let order = flat_order(40);
        let wide: ValueSet = (0..8).collect();
        let a = mgr.create_with(&order, |_| wide.clone());
        assert_eq!(mgr.size(a), BigUint::from(8u32).pow(40));
        assert_eq!(mgr.size_u64(a), u64::MAX);
    }

    #[test]
    fn test_collect_garbage() {
        let mgr = Manager::init().unwrap();
        let order = flat_order(3);
        let keep = mgr.create_with(&order, |_| set(&[0]));
        let drop_me = mgr.create_with(&order, |_| set(&[1]));
        let before = mgr.stats().nodes;
        assert_eq!(before, 6);
        mgr.collect_garbage(&[keep], &[]);
        assert_eq!(mgr.stats().nodes, 3);
        assert_eq!(mgr.size_u64(keep), 1);
        let again = mgr.create_with(&order, |_| set(&[1]));
        assert_eq!(mgr.size_u64(again), 1);
        assert_ne!(again, drop_me);
    }
}

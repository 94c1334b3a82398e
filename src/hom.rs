//! Homomorphisms: interned, memoized transformers of diagrams.
//!
//! Every homomorphism is built by the [`Manager`] and referenced through a
//! [`Hom`] handle. Structurally equal homomorphisms share one handle, which is
//! what lets the `(Hom, Sdd)` evaluation cache hit.
//!
//! | Constructor | Semantics |
//! |---|---|
//! | [`identity`][Manager::identity] | `x` |
//! | [`constant(c)`][Manager::constant] | `c` |
//! | [`cons(o, v, h)`][Manager::cons] | `v · h(x)` on the top level of `o` |
//! | [`function(o, id, f)`][Manager::function] | `f` applied to the values of `id` |
//! | [`local(o, id, h)`][Manager::local] | `h` applied to the nested diagrams of `id` |
//! | [`composition(f, g)`][Manager::composition] | `f(g(x))` |
//! | [`sum(o, hs)`][Manager::sum] | `∪ h(x)` |
//! | [`hom_intersection(o, hs)`][Manager::hom_intersection] | `∩ h(x)` |
//! | [`fixpoint(h)`][Manager::fixpoint] | `(h + id)*` |
//!
//! [`rewrite`][Manager::rewrite] turns fixpoints of sums into saturation
//! forms, and [`apply`][Manager::apply] evaluates a homomorphism.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::rc::Rc;

use crate::error::{Result, SddError};
use crate::function::UserFunction;
use crate::node::Valuation;
use crate::order::{Identifier, Order};
use crate::reference::{Hom, Sdd};
use crate::sdd::Manager;
use crate::types::Var;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum HomNode {
    Identity,
    Constant(Sdd),
    Cons {
        var: Var,
        valuation: Valuation,
        next: Hom,
    },
    Function {
        var: Var,
        function: UserFunction,
    },
    Local {
        var: Var,
        hom: Hom,
    },
    Composition {
        left: Hom,
        right: Hom,
    },
    /// Flattened, deduplicated and sorted operands.
    Sum(Rc<[Hom]>),
    /// Flattened, deduplicated and sorted operands.
    Intersection(Rc<[Hom]>),
    /// Always holds `h + id`.
    Fixpoint(Hom),
    /// Saturation form of a fixpoint at level `var`: `f` skips `var`, `l` is a
    /// local on `var` and `g` holds the remaining operands.
    Saturation {
        var: Var,
        f: Option<Hom>,
        l: Option<Hom>,
        g: Rc<[Hom]>,
    },
}

impl HomNode {
    /// Homomorphisms and diagrams referenced by this node.
    pub(crate) fn children(&self) -> (Vec<Hom>, Vec<Sdd>) {
        match self {
            HomNode::Identity | HomNode::Function { .. } => (Vec::new(), Vec::new()),
            HomNode::Constant(sdd) => (Vec::new(), vec![*sdd]),
            HomNode::Cons { valuation, next, .. } => (vec![*next], valuation.as_nested().into_iter().collect()),
            HomNode::Local { hom, .. } | HomNode::Fixpoint(hom) => (vec![*hom], Vec::new()),
            HomNode::Composition { left, right } => (vec![*left, *right], Vec::new()),
            HomNode::Sum(ops) | HomNode::Intersection(ops) => (ops.to_vec(), Vec::new()),
            HomNode::Saturation { f, l, g, .. } => {
                let mut homs: Vec<Hom> = f.iter().chain(l.iter()).copied().collect();
                homs.extend(g.iter().copied());
                (homs, Vec::new())
            }
        }
    }
}

/// Variables a homomorphism may act on.
#[derive(Debug, Clone)]
pub(crate) enum Touch {
    All,
    /// Sorted.
    Vars(Rc<[Var]>),
}

impl Touch {
    fn none() -> Self {
        Touch::Vars(Rc::from([]))
    }

    fn single(var: Var) -> Self {
        Touch::Vars(Rc::from([var]))
    }

    fn union(&self, other: &Touch) -> Touch {
        match (self, other) {
            (Touch::Vars(a), Touch::Vars(b)) => {
                let vars: BTreeSet<Var> = a.iter().chain(b.iter()).copied().collect();
                Touch::Vars(vars.into_iter().collect())
            }
            _ => Touch::All,
        }
    }

    pub(crate) fn contains(&self, var: Var) -> bool {
        match self {
            Touch::All => true,
            Touch::Vars(vars) => vars.binary_search(&var).is_ok(),
        }
    }
}

/// An interned homomorphism together with its precomputed properties.
///
/// Equality and hashing only look at the node.
#[derive(Debug, Clone)]
pub(crate) struct HomEntry {
    pub node: HomNode,
    pub touch: Touch,
    pub selector: bool,
}

impl PartialEq for HomEntry {
    fn eq(&self, other: &Self) -> bool {
        self.node == other.node
    }
}

impl Eq for HomEntry {}

impl std::hash::Hash for HomEntry {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.node.hash(state);
    }
}

impl Manager {
    pub(crate) fn hom_entry(&self, hom: Hom) -> HomEntry {
        self.check_hom(hom);
        let homs = self.homs.borrow();
        match homs.get(hom.index()) {
            Some(entry) if homs.generation(hom.index()) == hom.generation() => entry.clone(),
            _ => panic!("Homomorphism {} was reclaimed by the garbage collector", hom),
        }
    }

    fn mk_hom(&self, node: HomNode) -> Hom {
        let (touch, selector) = match &node {
            HomNode::Identity => (Touch::none(), true),
            HomNode::Constant(_) | HomNode::Cons { .. } => (Touch::All, false),
            HomNode::Function { var, function } => (Touch::single(*var), function.is_selector()),
            HomNode::Local { var, hom } => (Touch::single(*var), self.hom_entry(*hom).selector),
            HomNode::Composition { left, right } => {
                let (l, r) = (self.hom_entry(*left), self.hom_entry(*right));
                (l.touch.union(&r.touch), l.selector && r.selector)
            }
            HomNode::Sum(ops) => {
                let entries: Vec<HomEntry> = ops.iter().map(|op| self.hom_entry(*op)).collect();
                let touch = entries.iter().fold(Touch::none(), |acc, e| acc.union(&e.touch));
                (touch, entries.iter().all(|e| e.selector))
            }
            HomNode::Intersection(ops) => {
                let entries: Vec<HomEntry> = ops.iter().map(|op| self.hom_entry(*op)).collect();
                let touch = entries.iter().fold(Touch::none(), |acc, e| acc.union(&e.touch));
                (touch, entries.iter().any(|e| e.selector))
            }
            HomNode::Fixpoint(hom) => {
                let entry = self.hom_entry(*hom);
                (entry.touch, entry.selector)
            }
            HomNode::Saturation { var, f, l, g } => {
                let entries: Vec<HomEntry> = f.iter().chain(l.iter()).chain(g.iter()).map(|op| self.hom_entry(*op)).collect();
                let touch = entries.iter().fold(Touch::single(*var), |acc, e| acc.union(&e.touch));
                (touch, entries.iter().all(|e| e.selector))
            }
        };
        let mut homs = self.homs.borrow_mut();
        let index = homs.put(HomEntry { node, touch, selector });
        Hom::new(index, homs.generation(index), self.epoch)
    }

    // ========================================================================
    // Constructors
    // ========================================================================

    pub fn identity(&self) -> Hom {
        self.mk_hom(HomNode::Identity)
    }

    /// Always returns `sdd`, whatever the input (`|0|` included).
    pub fn constant(&self, sdd: Sdd) -> Hom {
        self.check(sdd);
        self.mk_hom(HomNode::Constant(sdd))
    }

    /// Binds the top level of `order` to `valuation`, followed by `next(x)`.
    pub fn cons(&self, order: &Order, valuation: Valuation, next: Hom) -> Result<Hom> {
        self.check_hom(next);
        let var = order.position().ok_or(SddError::EmptyOrder)?;
        match &valuation {
            Valuation::Values(_) if order.is_hierarchical() => return Err(SddError::ValuationMismatch(var)),
            Valuation::Nested(_) if !order.is_hierarchical() => return Err(SddError::ValuationMismatch(var)),
            Valuation::Nested(sdd) => self.check(*sdd),
            Valuation::Values(_) => {}
        }
        Ok(self.mk_hom(HomNode::Cons { var, valuation, next }))
    }

    /// Wraps `inner` in locals for every hierarchical level enclosing `enclosing`.
    fn wrap_in_locals(&self, enclosing: &[Order], inner: Hom) -> Hom {
        enclosing.iter().rev().fold(inner, |hom, level| match level.position() {
            Some(var) => self.mk_hom(HomNode::Local { var, hom }),
            None => hom,
        })
    }

    /// Applies `function` to the values bound to the flat level `identifier`.
    ///
    /// `identifier` may be nested inside hierarchical levels of `order`.
    pub fn function(&self, order: &Order, identifier: Identifier, function: UserFunction) -> Result<Hom> {
        let (enclosing, level) = order.locate(identifier).ok_or(SddError::UnknownIdentifier(identifier))?;
        if level.is_hierarchical() {
            return Err(SddError::NotFlat(identifier));
        }
        let var = level.position().ok_or(SddError::UnknownIdentifier(identifier))?;
        let hom = self.mk_hom(HomNode::Function { var, function });
        Ok(self.wrap_in_locals(&enclosing, hom))
    }

    /// Applies `hom` to the nested diagrams of the hierarchical level `identifier`.
    ///
    /// `hom` must be built against the nested order of `identifier` as found in
    /// `order` (see [`Order::nested`]).
    pub fn local(&self, order: &Order, identifier: Identifier, hom: Hom) -> Result<Hom> {
        self.check_hom(hom);
        let (enclosing, level) = order.locate(identifier).ok_or(SddError::UnknownIdentifier(identifier))?;
        if !level.is_hierarchical() {
            return Err(SddError::NotHierarchical(identifier));
        }
        let var = level.position().ok_or(SddError::UnknownIdentifier(identifier))?;
        let hom = self.mk_hom(HomNode::Local { var, hom });
        Ok(self.wrap_in_locals(&enclosing, hom))
    }

    /// `left ∘ right`: applies `right`, then `left`.
    pub fn composition(&self, left: Hom, right: Hom) -> Hom {
        match (self.hom_entry(left).node, self.hom_entry(right).node) {
            (HomNode::Identity, _) => right,
            (_, HomNode::Identity) => left,
            (HomNode::Constant(_), _) => left,
            _ => self.mk_hom(HomNode::Composition { left, right }),
        }
    }

    /// Union of the images of all operands.
    pub fn sum(&self, order: &Order, ops: &[Hom]) -> Result<Hom> {
        let (first, rest) = ops.split_first().ok_or(SddError::EmptyOperands)?;
        for op in ops {
            self.validate_hom(order, *op)?;
        }
        Ok(self.sum_of(*first, rest))
    }

    pub(crate) fn sum_of(&self, first: Hom, rest: &[Hom]) -> Hom {
        let mut operands = BTreeSet::new();
        let mut locals: BTreeMap<Var, Vec<Hom>> = BTreeMap::new();

        let mut classify = |op: Hom, node: HomNode| match node {
            HomNode::Local { var, hom } => locals.entry(var).or_default().push(hom),
            _ => {
                operands.insert(op);
            }
        };
        for op in std::iter::once(first).chain(rest.iter().copied()) {
            match self.hom_entry(op).node {
                HomNode::Sum(inner) => {
                    for op in inner.iter() {
                        classify(*op, self.hom_entry(*op).node);
                    }
                }
                node => classify(op, node),
            }
        }

        for (var, homs) in locals {
            let hom = match homs.split_first() {
                Some((first, rest)) if !rest.is_empty() => self.sum_of(*first, rest),
                Some((first, _)) => *first,
                None => continue,
            };
            operands.insert(self.mk_hom(HomNode::Local { var, hom }));
        }

        if operands.len() == 1 {
            if let Some(op) = operands.first() {
                return *op;
            }
        }
        self.mk_hom(HomNode::Sum(operands.into_iter().collect()))
    }

    /// Intersection of the images of all operands.
    pub fn hom_intersection(&self, order: &Order, ops: &[Hom]) -> Result<Hom> {
        let (first, rest) = ops.split_first().ok_or(SddError::EmptyOperands)?;
        for op in ops {
            self.validate_hom(order, *op)?;
        }
        Ok(self.intersection_of(*first, rest))
    }

    pub(crate) fn intersection_of(&self, first: Hom, rest: &[Hom]) -> Hom {
        let mut operands = BTreeSet::new();
        for op in std::iter::once(first).chain(rest.iter().copied()) {
            match self.hom_entry(op).node {
                HomNode::Intersection(inner) => operands.extend(inner.iter().copied()),
                _ => {
                    operands.insert(op);
                }
            }
        }
        if operands.len() == 1 {
            if let Some(op) = operands.first() {
                return *op;
            }
        }
        self.mk_hom(HomNode::Intersection(operands.into_iter().collect()))
    }

    /// Applies `hom + id` until the result stops changing.
    pub fn fixpoint(&self, hom: Hom) -> Hom {
        match self.hom_entry(hom).node {
            HomNode::Identity | HomNode::Fixpoint(_) => hom,
            _ => {
                let body = self.sum_of(hom, &[self.identity()]);
                self.mk_hom(HomNode::Fixpoint(body))
            }
        }
    }

    pub(crate) fn saturation(&self, var: Var, f: Option<Hom>, l: Option<Hom>, g: Vec<Hom>) -> Hom {
        self.mk_hom(HomNode::Saturation {
            var,
            f,
            l,
            g: Rc::from(g),
        })
    }

    pub(crate) fn local_at(&self, var: Var, hom: Hom) -> Hom {
        self.mk_hom(HomNode::Local { var, hom })
    }

    // ========================================================================
    // Predicates
    // ========================================================================

    /// Checks if the image of any diagram is a subset of it.
    pub fn is_selector(&self, hom: Hom) -> bool {
        self.hom_entry(hom).selector
    }

    /// Checks if `hom` leaves the level `identifier` untouched.
    pub fn skips(&self, order: &Order, hom: Hom, identifier: Identifier) -> Result<bool> {
        let var = order.position_of(identifier).ok_or(SddError::UnknownIdentifier(identifier))?;
        Ok(!self.hom_entry(hom).touch.contains(var))
    }

    /// Checks that every level referenced by `hom` exists in `order` with the right kind.
    pub(crate) fn validate_hom(&self, order: &Order, hom: Hom) -> Result<()> {
        let kinds = order.kinds();
        let mut visited = BTreeSet::new();
        let mut stack = vec![hom];

        while let Some(hom) = stack.pop() {
            if !visited.insert(hom) {
                continue;
            }
            let node = self.hom_entry(hom).node;
            let expected = match &node {
                HomNode::Function { var, .. } => Some((*var, false)),
                HomNode::Local { var, .. } => Some((*var, true)),
                HomNode::Cons { var, valuation, .. } => Some((*var, !valuation.is_values())),
                _ => None,
            };
            if let Some((var, hierarchical)) = expected {
                match kinds.get(&var) {
                    Some(kind) if *kind == hierarchical => {}
                    Some(_) => {
                        return Err(SddError::OrderMismatch(format!(
                            "{} is not a {} level of order {}",
                            var,
                            if hierarchical { "hierarchical" } else { "flat" },
                            order
                        )))
                    }
                    None => {
                        return Err(SddError::OrderMismatch(format!(
                            "{} does not belong to order {}",
                            var, order
                        )))
                    }
                }
            }
            stack.extend(node.children().0);
        }

        Ok(())
    }

    // ========================================================================
    // Rendering
    // ========================================================================

    /// Textual rendering of a homomorphism, for debugging.
    pub fn hom_to_string(&self, hom: Hom) -> String {
        HomDisplay { manager: self, hom }.to_string()
    }

    fn write_list(&self, f: &mut fmt::Formatter<'_>, ops: &[Hom], sep: &str) -> fmt::Result {
        f.write_str("(")?;
        for (i, op) in ops.iter().enumerate() {
            if i > 0 {
                f.write_str(sep)?;
            }
            self.write_hom(f, *op)?;
        }
        f.write_str(")")
    }

    fn write_hom(&self, f: &mut fmt::Formatter<'_>, hom: Hom) -> fmt::Result {
        match self.hom_entry(hom).node {
            HomNode::Identity => f.write_str("id"),
            HomNode::Constant(sdd) => write!(f, "const({})", sdd),
            HomNode::Cons { var, valuation, next } => {
                write!(f, "cons({}, ", var)?;
                match valuation {
                    Valuation::Values(values) => write!(f, "{}", values)?,
                    Valuation::Nested(sdd) => write!(f, "{}", sdd)?,
                }
                f.write_str(", ")?;
                self.write_hom(f, next)?;
                f.write_str(")")
            }
            HomNode::Function { var, function } => write!(f, "fun({}, {:?})", var, function),
            HomNode::Local { var, hom } => {
                write!(f, "local({}, ", var)?;
                self.write_hom(f, hom)?;
                f.write_str(")")
            }
            HomNode::Composition { left, right } => self.write_list(f, &[left, right], " o "),
            HomNode::Sum(ops) => self.write_list(f, &ops, " + "),
            HomNode::Intersection(ops) => self.write_list(f, &ops, " & "),
            HomNode::Fixpoint(hom) => {
                self.write_hom(f, hom)?;
                f.write_str("*")
            }
            HomNode::Saturation { var, f: skip, l, g } => {
                write!(f, "sat({}, ", var)?;
                match skip {
                    Some(skip) => self.write_hom(f, skip)?,
                    None => f.write_str("-")?,
                }
                f.write_str(", ")?;
                match l {
                    Some(l) => self.write_hom(f, l)?,
                    None => f.write_str("-")?,
                }
                f.write_str(", ")?;
                self.write_list(f, &g, " + ")?;
                f.write_str(")")
            }
        }
    }
}

struct HomDisplay<'a> {
    manager: &'a Manager,
    hom: Hom,
}

impl fmt::Display for HomDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.manager.write_hom(f, self.hom)
    }
}

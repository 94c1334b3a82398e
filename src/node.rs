use std::rc::Rc;

use crate::reference::Sdd;
use crate::types::Var;
use crate::values::ValueSet;

/// Label of an arc: a set of values on flat levels, a nested diagram on hierarchical ones.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Valuation {
    Values(ValueSet),
    Nested(Sdd),
}

impl Valuation {
    /// Checks if the valuation denotes no assignment.
    pub fn is_empty(&self) -> bool {
        match self {
            Valuation::Values(values) => values.is_empty(),
            Valuation::Nested(sdd) => sdd.is_zero(),
        }
    }

    pub fn is_values(&self) -> bool {
        matches!(self, Valuation::Values(_))
    }

    pub fn as_values(&self) -> Option<&ValueSet> {
        match self {
            Valuation::Values(values) => Some(values),
            Valuation::Nested(_) => None,
        }
    }

    pub fn as_nested(&self) -> Option<Sdd> {
        match self {
            Valuation::Values(_) => None,
            Valuation::Nested(sdd) => Some(*sdd),
        }
    }
}

impl From<ValueSet> for Valuation {
    fn from(values: ValueSet) -> Self {
        Valuation::Values(values)
    }
}

impl From<Sdd> for Valuation {
    fn from(sdd: Sdd) -> Self {
        Valuation::Nested(sdd)
    }
}

/// A non-terminal diagram node.
///
/// # Invariants
///
/// - valuations are non-empty, pairwise disjoint and all of the same kind
/// - successors are non-zero and pairwise distinct
/// - arcs are sorted by successor
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SddNode {
    pub var: Var,
    pub arcs: Rc<[(Valuation, Sdd)]>,
}

impl SddNode {
    pub fn new(var: Var, arcs: Vec<(Valuation, Sdd)>) -> Self {
        Self {
            var,
            arcs: Rc::from(arcs),
        }
    }

    /// Checks if the node carries nested diagrams.
    pub fn is_hierarchical(&self) -> bool {
        self.arcs.first().is_some_and(|(valuation, _)| !valuation.is_values())
    }
}

//! Evaluation of homomorphisms.
//!
//! Evaluation descends the diagram in step with its variables. A homomorphism
//! that does not act on the variable of the current node is pushed to the
//! successors of every arc. Results are memoized per `(Hom, Sdd)`.

use log::debug;

use crate::error::{Result, SddError};
use crate::function::UserFunction;
use crate::hom::{HomEntry, HomNode};
use crate::node::{SddNode, Valuation};
use crate::order::Order;
use crate::reference::{Hom, Sdd};
use crate::sdd::Manager;
use crate::types::Var;

impl Manager {
    /// Evaluates `hom` on `sdd` under `order`.
    ///
    /// Fails with [`SddError::OrderMismatch`] if `sdd` or `hom` was not built
    /// over `order` (or one of its sub-orders, for homomorphisms).
    pub fn apply(&self, order: &Order, hom: Hom, sdd: Sdd) -> Result<Sdd> {
        self.check_hom(hom);
        self.check(sdd);
        self.validate_diagram(order, sdd)?;
        self.validate_hom(order, hom)?;

        let res = self.eval(hom, sdd)?;
        debug!("apply({}, {}) -> {}", hom, sdd, res);
        Ok(res)
    }

    fn validate_diagram(&self, order: &Order, sdd: Sdd) -> Result<()> {
        let Some(var) = self.variable(sdd) else {
            return Ok(());
        };
        let hierarchical = self.node(sdd).is_hierarchical();
        if order.position() != Some(var) || order.is_hierarchical() != hierarchical {
            return Err(SddError::OrderMismatch(format!(
                "diagram {} rooted at {} was not built over order {}",
                sdd, var, order
            )));
        }
        Ok(())
    }

    pub(crate) fn eval(&self, hom: Hom, sdd: Sdd) -> Result<Sdd> {
        let entry = self.hom_entry(hom);
        match entry.node {
            HomNode::Identity => return Ok(sdd),
            HomNode::Constant(c) => return Ok(c),
            _ => {}
        }

        let key = (hom, sdd);
        let cached = self.hom_cache.borrow_mut().get(&key);
        if let Some(res) = cached {
            return Ok(res);
        }

        let res = if sdd.is_terminal() {
            self.eval_node(&entry, sdd)?
        } else {
            let node = self.node(sdd);
            if entry.touch.contains(node.var) {
                self.eval_node(&entry, sdd)?
            } else {
                self.propagate(hom, &node)?
            }
        };

        self.hom_cache.borrow_mut().insert(key, res);
        Ok(res)
    }

    /// Applies `hom` to the successor of every arc.
    fn propagate(&self, hom: Hom, node: &SddNode) -> Result<Sdd> {
        let mut arcs = Vec::with_capacity(node.arcs.len());
        for (valuation, succ) in node.arcs.iter() {
            arcs.push((valuation.clone(), self.eval(hom, *succ)?));
        }
        self.square_union(node.var, arcs)
    }

    fn eval_node(&self, entry: &HomEntry, sdd: Sdd) -> Result<Sdd> {
        match &entry.node {
            HomNode::Identity => Ok(sdd),
            HomNode::Constant(c) => Ok(*c),
            HomNode::Cons { var, valuation, next } => {
                let succ = self.eval(*next, sdd)?;
                Ok(self.mk_node(*var, vec![(valuation.clone(), succ)]))
            }
            HomNode::Function { var, function } => self.eval_function(*var, function, sdd),
            HomNode::Local { var, hom } => self.eval_local(*var, *hom, sdd),
            HomNode::Composition { left, right } => {
                let inner = self.eval(*right, sdd)?;
                self.eval(*left, inner)
            }
            HomNode::Sum(ops) => {
                let mut res = self.zero();
                for op in ops.iter() {
                    let image = self.eval(*op, sdd)?;
                    res = self.union(res, image)?;
                }
                Ok(res)
            }
            HomNode::Intersection(ops) => {
                let mut res: Option<Sdd> = None;
                for op in ops.iter() {
                    let image = self.eval(*op, sdd)?;
                    let acc = match res {
                        Some(acc) => self.intersection(acc, image)?,
                        None => image,
                    };
                    if acc.is_zero() {
                        return Ok(acc);
                    }
                    res = Some(acc);
                }
                Ok(res.unwrap_or_else(|| self.zero()))
            }
            HomNode::Fixpoint(body) => {
                let mut current = sdd;
                let mut iterations = 0usize;
                loop {
                    let next = self.eval(*body, current)?;
                    iterations += 1;
                    if next == current {
                        debug!("fixpoint on {} stable after {} iterations", sdd, iterations);
                        return Ok(current);
                    }
                    current = next;
                }
            }
            HomNode::Saturation { f, l, g, .. } => {
                let mut current = sdd;
                loop {
                    let start = current;
                    if let Some(f) = f {
                        current = self.eval(*f, current)?;
                    }
                    if let Some(l) = l {
                        current = self.eval(*l, current)?;
                    }
                    for op in g.iter() {
                        let image = self.eval(*op, current)?;
                        current = self.union(current, image)?;
                    }
                    if current == start {
                        return Ok(current);
                    }
                }
            }
        }
    }

    fn unmatched(&self, var: Var, sdd: Sdd) -> Result<Sdd> {
        if sdd.is_zero() {
            return Ok(sdd);
        }
        Err(SddError::OrderMismatch(format!("level {} not found before {}", var, sdd)))
    }

    fn eval_function(&self, var: Var, function: &UserFunction, sdd: Sdd) -> Result<Sdd> {
        if sdd.is_terminal() {
            return self.unmatched(var, sdd);
        }
        let node = self.node(sdd);

        let mut images = Vec::with_capacity(node.arcs.len());
        let mut subsets = true;
        for (valuation, succ) in node.arcs.iter() {
            let Valuation::Values(values) = valuation else {
                return Err(SddError::ValuationMismatch(var));
            };
            let image = function.apply(values);
            if image.is_empty() {
                continue;
            }
            subsets &= image.difference(values).is_empty();
            images.push((Valuation::Values(image), *succ));
        }

        if function.is_selector() && !function.is_shifter() && subsets {
            // Images of disjoint valuations are still disjoint.
            return self.square_union(var, images);
        }
        self.union_many(images.into_iter().map(|arc| self.mk_node(var, vec![arc])))
    }

    fn eval_local(&self, var: Var, hom: Hom, sdd: Sdd) -> Result<Sdd> {
        if sdd.is_terminal() {
            return self.unmatched(var, sdd);
        }
        let node = self.node(sdd);
        let selector = self.is_selector(hom);

        let mut images = Vec::with_capacity(node.arcs.len());
        let mut subsets = true;
        for (valuation, succ) in node.arcs.iter() {
            let Valuation::Nested(nested) = valuation else {
                return Err(SddError::ValuationMismatch(var));
            };
            let image = self.eval(hom, *nested)?;
            if image.is_zero() {
                continue;
            }
            if selector {
                subsets &= self.difference(image, *nested)?.is_zero();
            }
            images.push((Valuation::Nested(image), *succ));
        }

        if selector && subsets {
            return self.square_union(var, images);
        }
        self.union_many(images.into_iter().map(|arc| self.mk_node(var, vec![arc])))
    }
}

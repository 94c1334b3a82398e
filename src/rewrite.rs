//! Saturation rewriting.
//!
//! A fixpoint over a sum is evaluated level by level: the operands that skip
//! the top variable are pushed to the next level as a fixpoint of their own,
//! the locals on the top variable are pushed into the nested order, and only
//! the remaining operands are iterated at the top. The rewritten form computes
//! the same diagrams as the original homomorphism.

use log::debug;

use crate::hom::HomNode;
use crate::order::Order;
use crate::reference::Hom;
use crate::sdd::Manager;
use crate::types::Var;

impl Manager {
    /// Restructures `hom` for evaluation over diagrams built on `order`.
    pub fn rewrite(&self, order: &Order, hom: Hom) -> Hom {
        let res = self.rewrite_at(order, hom);
        debug!("rewrite({}) -> {}", hom, res);
        res
    }

    fn rewrite_at(&self, order: &Order, hom: Hom) -> Hom {
        let Some(var) = order.position() else {
            return hom;
        };
        let entry = self.hom_entry(hom);

        match &entry.node {
            HomNode::Identity | HomNode::Constant(_) | HomNode::Cons { .. } | HomNode::Function { .. } => hom,
            _ if !entry.touch.contains(var) => self.rewrite_at(&order.next(), hom),
            HomNode::Fixpoint(body) => match self.hom_entry(*body).node {
                HomNode::Sum(ops) => self.rewrite_saturation(order, var, &ops),
                _ => hom,
            },
            HomNode::Sum(ops) => self.rewrite_sum(order, var, ops),
            HomNode::Intersection(ops) => {
                let ops: Vec<Hom> = ops.iter().map(|op| self.rewrite_at(order, *op)).collect();
                match ops.split_first() {
                    Some((first, rest)) => self.intersection_of(*first, rest),
                    None => hom,
                }
            }
            HomNode::Composition { left, right } => {
                let left = self.rewrite_at(order, *left);
                let right = self.rewrite_at(order, *right);
                self.composition(left, right)
            }
            HomNode::Local { var: local_var, hom: inner } if *local_var == var => {
                let inner = self.rewrite_at(&order.nested(), *inner);
                self.local_at(var, inner)
            }
            _ => hom,
        }
    }

    /// Groups the operands skipping `var` into one operand rewritten at the next level.
    fn rewrite_sum(&self, order: &Order, var: Var, ops: &[Hom]) -> Hom {
        let (skipping, touching): (Vec<Hom>, Vec<Hom>) =
            ops.iter().copied().partition(|op| !self.hom_entry(*op).touch.contains(var));

        let mut operands = Vec::with_capacity(touching.len() + 1);
        if let Some((first, rest)) = skipping.split_first() {
            let below = self.sum_of(*first, rest);
            operands.push(self.rewrite_at(&order.next(), below));
        }
        for op in touching {
            operands.push(self.rewrite_at(order, op));
        }

        match operands.split_first() {
            Some((first, rest)) => self.sum_of(*first, rest),
            None => self.identity(),
        }
    }

    /// Rewrites `fixpoint(sum(ops))` at level `var`.
    fn rewrite_saturation(&self, order: &Order, var: Var, ops: &[Hom]) -> Hom {
        let mut f_ops = Vec::new();
        let mut l_ops = Vec::new();
        let mut g_ops = Vec::new();

        for op in ops {
            let entry = self.hom_entry(*op);
            match entry.node {
                // Both `F` and `L` contain the identity.
                HomNode::Identity => {}
                _ if !entry.touch.contains(var) => f_ops.push(*op),
                HomNode::Local { var: local_var, hom } if local_var == var => l_ops.push(hom),
                _ => g_ops.push(self.rewrite_at(order, *op)),
            }
        }

        let f = f_ops.split_first().map(|(first, rest)| {
            let fixpoint = self.fixpoint(self.sum_of(*first, rest));
            self.rewrite_at(&order.next(), fixpoint)
        });
        let l = l_ops.split_first().map(|(first, rest)| {
            let fixpoint = self.fixpoint(self.sum_of(*first, rest));
            let inner = self.rewrite_at(&order.nested(), fixpoint);
            self.local_at(var, inner)
        });

        if f.is_none() && l.is_none() && g_ops.is_empty() {
            return self.identity();
        }
        self.saturation(var, f, l, g_ops)
    }
}

use test_log::test;

use sdd_rs::error::SddError;
use sdd_rs::function::{UserFunction, ValuesFunction};
use sdd_rs::node::Valuation;
use sdd_rs::order::{Order, OrderBuilder};
use sdd_rs::reference::{Hom, Sdd};
use sdd_rs::sdd::Manager;
use sdd_rs::values::ValueSet;

#[derive(Debug, PartialEq, Eq, Hash)]
struct KeepBelow(u32);

impl ValuesFunction for KeepBelow {
    fn apply(&self, values: &ValueSet) -> ValueSet {
        values.iter().filter(|&v| v < self.0).collect()
    }

    fn is_selector(&self) -> bool {
        true
    }
}

#[derive(Debug, PartialEq, Eq, Hash)]
struct Inc {
    bound: u32,
}

impl ValuesFunction for Inc {
    fn apply(&self, values: &ValueSet) -> ValueSet {
        values.iter().filter(|&v| v < self.bound).map(|v| v + 1).collect()
    }

    fn is_shifter(&self) -> bool {
        true
    }
}

fn inc(bound: u32) -> UserFunction {
    UserFunction::new(Inc { bound })
}

fn keep_below(limit: u32) -> UserFunction {
    UserFunction::new(KeepBelow(limit))
}

fn flat_order(n: u32) -> Order {
    let mut builder = OrderBuilder::new();
    for id in (0..n).rev() {
        builder.push(id);
    }
    builder.build().unwrap()
}

/// Two hierarchical levels `10[0, 1]` and `11[2, 3]`, then the flat level `4`.
fn nested_order() -> Order {
    let mut builder = OrderBuilder::new();
    builder.push(4);
    let mut second = OrderBuilder::new();
    second.push(3).push(2);
    builder.push_nested(11, second);
    let mut first = OrderBuilder::new();
    first.push(1).push(0);
    builder.push_nested(10, first);
    builder.build().unwrap()
}

fn set(values: &[u32]) -> ValueSet {
    values.iter().copied().collect()
}

/// Every assignment of `{0, 1, 2}` to the first two identifiers, `{0}` elsewhere.
fn grid(mgr: &Manager, order: &Order) -> Sdd {
    let mut res = mgr.zero();
    for a in 0..3 {
        for b in 0..3 {
            let s = mgr.create_with(order, |id| match id {
                0 => set(&[a]),
                1 => set(&[b]),
                _ => set(&[0]),
            });
            res = mgr.union(res, s).unwrap();
        }
    }
    res
}

#[test]
fn test_identity_and_constant() {
    let mgr = Manager::init().unwrap();
    let order = flat_order(3);
    let x = grid(&mgr, &order);
    let c = mgr.create_with(&order, |_| set(&[7]));

    assert_eq!(mgr.apply(&order, mgr.identity(), x).unwrap(), x);
    assert_eq!(mgr.apply(&order, mgr.constant(c), x).unwrap(), c);
    assert_eq!(mgr.apply(&order, mgr.constant(c), mgr.zero()).unwrap(), c);

    let f = mgr.function(&order, 0, inc(5)).unwrap();
    assert_eq!(mgr.composition(mgr.identity(), f), f);
    assert_eq!(mgr.composition(f, mgr.identity()), f);
    assert_eq!(mgr.composition(mgr.constant(c), f), mgr.constant(c));
}

#[test]
fn test_composition_sum_intersection_semantics() {
    let mgr = Manager::init().unwrap();
    let order = flat_order(3);
    let x = grid(&mgr, &order);
    let f = mgr.function(&order, 0, inc(2)).unwrap();
    let g = mgr.function(&order, 1, keep_below(2)).unwrap();

    let fx = mgr.apply(&order, f, x).unwrap();
    let gx = mgr.apply(&order, g, x).unwrap();

    let fg = mgr.composition(f, g);
    assert_eq!(mgr.apply(&order, fg, x).unwrap(), mgr.apply(&order, f, gx).unwrap());

    let sum = mgr.sum(&order, &[f, g]).unwrap();
    assert_eq!(mgr.apply(&order, sum, x).unwrap(), mgr.union(fx, gx).unwrap());

    let inter = mgr.hom_intersection(&order, &[f, g]).unwrap();
    assert_eq!(mgr.apply(&order, inter, x).unwrap(), mgr.intersection(fx, gx).unwrap());

    // inc(2) drops a = 2 and shifts the rest: 2 * 3 assignments
    assert_eq!(mgr.size_u64(fx), 6);
    assert_eq!(mgr.size_u64(gx), 6);
}

#[test]
fn test_selectors() {
    let mgr = Manager::init().unwrap();
    let order = flat_order(3);
    let x = grid(&mgr, &order);
    let s0 = mgr.function(&order, 0, keep_below(1)).unwrap();
    let s1 = mgr.function(&order, 1, keep_below(2)).unwrap();
    let f = mgr.function(&order, 0, inc(2)).unwrap();

    assert!(mgr.is_selector(s0));
    assert!(mgr.is_selector(mgr.sum(&order, &[s0, s1]).unwrap()));
    assert!(!mgr.is_selector(f));
    assert!(!mgr.is_selector(mgr.sum(&order, &[s0, f]).unwrap()));

    let both = mgr.composition(s0, s1);
    let selected = mgr.apply(&order, both, x).unwrap();
    assert_eq!(mgr.size_u64(selected), 2);
    assert_eq!(mgr.intersection(selected, x).unwrap(), selected);
}

#[test]
fn test_cons() {
    let mgr = Manager::init().unwrap();
    let order = flat_order(2);
    let tail = mgr.create_with(&order.next(), |_| set(&[1]));
    let h = mgr.cons(&order, Valuation::Values(set(&[3, 4])), mgr.constant(tail)).unwrap();
    let res = mgr.apply(&order, h, mgr.create_with(&order, |_| set(&[0]))).unwrap();
    assert_eq!(res, mgr.create_with(&order, |id| if id == 0 { set(&[3, 4]) } else { set(&[1]) }));
}

#[test]
fn test_fixpoint_is_monotone_and_closed() {
    let mgr = Manager::init().unwrap();
    let order = flat_order(3);
    let x = mgr.create_with(&order, |_| set(&[0]));
    let ops: Vec<Hom> = (0..3).map(|id| mgr.function(&order, id, inc(3)).unwrap()).collect();
    let step = mgr.sum(&order, &ops).unwrap();
    let fp = mgr.fixpoint(step);

    let reach = mgr.apply(&order, fp, x).unwrap();
    assert_eq!(mgr.union(reach, x).unwrap(), reach);
    let again = mgr.apply(&order, step, reach).unwrap();
    assert_eq!(mgr.union(reach, again).unwrap(), reach);
    assert_eq!(mgr.size_u64(reach), 64);

    assert_eq!(mgr.fixpoint(fp), fp);
    assert_eq!(mgr.fixpoint(mgr.identity()), mgr.identity());
}

#[test]
fn test_rewrite_preserves_results() {
    let mgr = Manager::init().unwrap();
    let order = flat_order(4);
    let x = mgr.create_with(&order, |_| set(&[0]));

    let f0 = mgr.function(&order, 0, inc(2)).unwrap();
    let f2 = mgr.function(&order, 2, inc(3)).unwrap();
    let f3 = mgr.function(&order, 3, inc(1)).unwrap();
    let s1 = mgr.function(&order, 1, keep_below(1)).unwrap();
    let pair = mgr.composition(f2, f0);

    let homs = [
        mgr.fixpoint(mgr.sum(&order, &[f0, f2, f3]).unwrap()),
        mgr.fixpoint(mgr.sum(&order, &[pair, f3]).unwrap()),
        mgr.sum(&order, &[f2, f3, s1]).unwrap(),
        mgr.composition(mgr.fixpoint(f3), mgr.fixpoint(f2)),
        mgr.hom_intersection(&order, &[mgr.fixpoint(f2), mgr.fixpoint(f3)]).unwrap(),
    ];
    for h in homs {
        let rewritten = mgr.rewrite(&order, h);
        assert_eq!(
            mgr.apply(&order, rewritten, x).unwrap(),
            mgr.apply(&order, h, x).unwrap(),
            "{}",
            mgr.hom_to_string(h)
        );
    }
}

#[test]
fn test_skips() {
    let mgr = Manager::init().unwrap();
    let order = nested_order();
    let f = mgr.function(&order, 2, inc(1)).unwrap();
    assert!(mgr.skips(&order, f, 10).unwrap());
    assert!(!mgr.skips(&order, f, 11).unwrap());
    assert!(mgr.skips(&order, f, 4).unwrap());
    assert!(mgr.skips(&order, mgr.identity(), 4).unwrap());
    assert_eq!(mgr.skips(&order, f, 99).unwrap_err(), SddError::UnknownIdentifier(99));
}

#[test]
fn test_functions_on_nested_levels() {
    let mgr = Manager::init().unwrap();
    let order = nested_order();
    let x = mgr.create_with(&order, |_| set(&[0]));

    let f1 = mgr.function(&order, 1, inc(2)).unwrap();
    let f2 = mgr.function(&order, 2, inc(1)).unwrap();
    let f4 = mgr.function(&order, 4, inc(1)).unwrap();
    let fp = mgr.fixpoint(mgr.sum(&order, &[f1, f2, f4]).unwrap());

    let reach = mgr.apply(&order, fp, x).unwrap();
    assert_eq!(mgr.size_u64(reach), 3 * 2 * 2);
    assert_eq!(mgr.apply(&order, mgr.rewrite(&order, fp), x).unwrap(), reach);
    assert!(mgr.node_count(reach).hierarchical >= 2);

    for path in mgr.paths(reach) {
        assert_eq!(path.len(), 5);
    }
}

#[test]
fn test_explicit_local() {
    let mgr = Manager::init().unwrap();
    let order = nested_order();
    let x = mgr.create_with(&order, |_| set(&[0]));

    // `order` is `10[0, 1]` on top: its nested order holds identifiers 0 and 1.
    let inner_order = order.nested();
    let inner = mgr.fixpoint(mgr.function(&inner_order, 0, inc(3)).unwrap());
    let local = mgr.local(&order, 10, inner).unwrap();
    let via_local = mgr.apply(&order, local, x).unwrap();

    let direct = mgr.fixpoint(mgr.function(&order, 0, inc(3)).unwrap());
    assert_eq!(via_local, mgr.apply(&order, direct, x).unwrap());
    assert_eq!(mgr.size_u64(via_local), 4);
}

#[test]
fn test_constructor_errors() {
    let mgr = Manager::init().unwrap();
    let order = nested_order();
    let id = mgr.identity();

    assert_eq!(mgr.sum(&order, &[]).unwrap_err(), SddError::EmptyOperands);
    assert_eq!(mgr.hom_intersection(&order, &[]).unwrap_err(), SddError::EmptyOperands);
    assert_eq!(
        mgr.function(&order, 42, inc(1)).unwrap_err(),
        SddError::UnknownIdentifier(42)
    );
    assert_eq!(mgr.function(&order, 10, inc(1)).unwrap_err(), SddError::NotFlat(10));
    assert_eq!(mgr.local(&order, 4, id).unwrap_err(), SddError::NotHierarchical(4));
    assert_eq!(
        mgr.cons(&Order::empty(), Valuation::Values(set(&[0])), id).unwrap_err(),
        SddError::EmptyOrder
    );
    assert!(matches!(
        mgr.cons(&order, Valuation::Values(set(&[0])), id),
        Err(SddError::ValuationMismatch(_))
    ));
}

#[test]
fn test_apply_under_wrong_order() {
    let mgr = Manager::init().unwrap();
    let small = flat_order(2);
    let large = flat_order(4);
    let f = mgr.function(&large, 3, inc(1)).unwrap();
    let x = mgr.create_with(&small, |_| set(&[0]));

    assert!(matches!(mgr.apply(&small, f, x), Err(SddError::OrderMismatch(_))));
    assert!(matches!(mgr.apply(&large, f, x), Err(SddError::OrderMismatch(_))));
}

#[test]
fn test_closure_functions_with_distinct_captures() {
    fn below(limit: u32) -> UserFunction {
        UserFunction::from_fn(("below", limit), true, false, move |values: &ValueSet| {
            values.iter().filter(|&v| v < limit).collect()
        })
    }

    let mgr = Manager::init().unwrap();
    let order = flat_order(3);
    let x = grid(&mgr, &order);
    let f = mgr.function(&order, 0, below(1)).unwrap();
    let g = mgr.function(&order, 0, below(2)).unwrap();
    assert_ne!(f, g);
    assert_eq!(f, mgr.function(&order, 0, below(1)).unwrap());

    assert_eq!(mgr.size_u64(mgr.apply(&order, f, x).unwrap()), 3);
    assert_eq!(mgr.size_u64(mgr.apply(&order, g, x).unwrap()), 6);
}

//! # sdd-rs: Hierarchical Set Decision Diagrams in Rust
//!
//! **`sdd-rs`** is a manager-centric library for **Set Decision Diagrams (SDDs)** and the
//! **homomorphisms** that transform them. It targets symbolic state-space generation:
//! the reachable states of a model are built as the fixpoint of a transition relation
//! expressed with homomorphisms.
//!
//! ## What is an SDD?
//!
//! An SDD encodes a set of assignments over the levels of an [`Order`][crate::order::Order].
//! Each node tests one level and carries arcs labelled with a **set of values** rather than
//! a single value. A level can itself be **hierarchical**: its arcs are then labelled with
//! diagrams over a nested order, which lets identical sub-structures be shared.
//! Diagrams are **canonical**: equal sets are represented by equal handles.
//!
//! ## Key Features
//!
//! - **Manager-Centric Architecture**: All operations go through the [`Manager`][crate::sdd::Manager], which owns the unique tables and operation caches.
//! - **Lightweight Handles**: [`Sdd`][crate::reference::Sdd] and [`Hom`][crate::reference::Hom] are `Copy` handles. Handles outliving their manager are detected.
//! - **Homomorphism Algebra**: identity, constants, cons, user functions, locals, composition, sum, intersection and fixpoint, all interned and memoized.
//! - **Saturation**: [`rewrite`][crate::sdd::Manager::rewrite] restructures fixpoints of sums so they are evaluated level by level.
//! - **Exact Counting**: [`size`][crate::sdd::Manager::size] returns a `BigUint`.
//!
//! ## Basic Usage
//!
//! ```rust
//! use sdd_rs::function::UserFunction;
//! use sdd_rs::order::OrderBuilder;
//! use sdd_rs::sdd::Manager;
//! use sdd_rs::values::ValueSet;
//!
//! // 1. Initialize the manager (one per thread)
//! let mgr = Manager::init().unwrap();
//!
//! // 2. Build an order: `x` on top of `y`
//! let mut builder = OrderBuilder::new();
//! builder.push(1).push(0);
//! let order = builder.build().unwrap();
//!
//! // 3. Initial state: x = 0, y = 0
//! let initial = mgr.create_with(&order, |_| ValueSet::singleton(0));
//!
//! // 4. Transition: increment `x` while it is below 3
//! let inc = UserFunction::from_fn("inc", false, true, |values: &ValueSet| {
//!     values.iter().filter(|&v| v < 3).map(|v| v + 1).collect()
//! });
//! let step = mgr.function(&order, 0, inc).unwrap();
//!
//! // 5. Reachable states
//! let reach = mgr.fixpoint(step);
//! let states = mgr.apply(&order, reach, initial).unwrap();
//! assert_eq!(mgr.size_u64(states), 4);
//! ```
//!
//! ## Core Components
//!
//! - **[`sdd`]**: The [`Manager`][crate::sdd::Manager], diagram construction and set operations.
//! - **[`order`]**: Orders of identifiers, flat or hierarchical.
//! - **[`hom`]**, **[`eval`]**, **[`rewrite`]**: Homomorphism construction, evaluation and saturation.
//! - **[`paths`]**: Enumeration of the paths of a diagram.
//! - **[`dot`]**: Utilities for visualizing diagrams using Graphviz.

pub mod cache;
pub mod config;
pub mod dot;
pub mod error;
pub mod eval;
pub mod function;
pub mod hom;
pub mod mapper;
pub mod node;
pub mod order;
pub mod paths;
pub mod reference;
pub mod rewrite;
pub mod sdd;
pub mod table;
pub mod types;
pub mod values;

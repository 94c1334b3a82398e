//! User-supplied transformations of value sets.
//!
//! A [`ValuesFunction`] is applied by [`Manager::function`][crate::sdd::Manager::function]
//! homomorphisms to the values bound to one flat level. Homomorphisms are
//! interned and their results memoized, so the function's equality must be
//! exact: two functions compare equal only if they have the same concrete
//! type, equal values and the same flags.
//!
//! ```
//! use sdd_rs::function::{UserFunction, ValuesFunction};
//! use sdd_rs::values::ValueSet;
//!
//! #[derive(Debug, PartialEq, Eq, Hash)]
//! struct Inc(u32);
//!
//! impl ValuesFunction for Inc {
//!     fn apply(&self, values: &ValueSet) -> ValueSet {
//!         values.iter().map(|v| v + self.0).collect()
//!     }
//!     fn is_shifter(&self) -> bool {
//!         true
//!     }
//! }
//!
//! let f = UserFunction::new(Inc(1));
//! assert_eq!(f.apply(&ValueSet::from_iter([0, 1])), ValueSet::from_iter([1, 2]));
//! assert_eq!(f, UserFunction::new(Inc(1)));
//! assert_ne!(f, UserFunction::new(Inc(2)));
//! ```

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use crate::values::ValueSet;

/// A pure transformation of the value set bound to a flat level.
pub trait ValuesFunction: Any + fmt::Debug {
    fn apply(&self, values: &ValueSet) -> ValueSet;

    /// The image is always a subset of the input.
    fn is_selector(&self) -> bool {
        false
    }

    /// The image may contain values absent from the input.
    fn is_shifter(&self) -> bool {
        false
    }
}

/// Object-safe equality and hashing over [`ValuesFunction`] implementors.
trait DynFunction: ValuesFunction {
    fn as_any(&self) -> &dyn Any;
    fn dyn_eq(&self, other: &dyn DynFunction) -> bool;
    fn dyn_hash(&self, state: &mut dyn Hasher);
}

impl<T> DynFunction for T
where
    T: ValuesFunction + Eq + Hash,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn dyn_eq(&self, other: &dyn DynFunction) -> bool {
        other.as_any().downcast_ref::<T>().is_some_and(|other| self == other)
    }

    fn dyn_hash(&self, mut state: &mut dyn Hasher) {
        TypeId::of::<T>().hash(&mut state);
        self.hash(&mut state);
    }
}

/// A shared, comparable handle to a [`ValuesFunction`].
#[derive(Clone)]
pub struct UserFunction(Rc<dyn DynFunction>);

impl UserFunction {
    pub fn new<T>(function: T) -> Self
    where
        T: ValuesFunction + Eq + Hash,
    {
        UserFunction(Rc::new(function))
    }

    /// Wraps a closure, identified by `token` and by the closure's type.
    ///
    /// Two closures created at the same place with equal tokens are equal.
    /// Such closures share their type whatever they capture, so `token` must
    /// include every captured value the result depends on. Otherwise closures
    /// with different captures are interned as one homomorphism, and one of
    /// them silently stands for the other.
    ///
    /// ```
    /// use sdd_rs::function::UserFunction;
    /// use sdd_rs::values::ValueSet;
    ///
    /// fn below(limit: u32) -> UserFunction {
    ///     UserFunction::from_fn(("below", limit), true, false, move |values: &ValueSet| {
    ///         values.iter().filter(|&v| v < limit).collect()
    ///     })
    /// }
    ///
    /// assert_eq!(below(2), below(2));
    /// assert_ne!(below(2), below(3));
    /// ```
    pub fn from_fn<K, F>(token: K, selector: bool, shifter: bool, f: F) -> Self
    where
        K: Eq + Hash + fmt::Debug + 'static,
        F: Fn(&ValueSet) -> ValueSet + 'static,
    {
        UserFunction::new(FnFunction {
            token,
            selector,
            shifter,
            f,
        })
    }

    pub fn apply(&self, values: &ValueSet) -> ValueSet {
        self.0.apply(values)
    }

    pub fn is_selector(&self) -> bool {
        self.0.is_selector()
    }

    pub fn is_shifter(&self) -> bool {
        self.0.is_shifter()
    }
}

impl PartialEq for UserFunction {
    fn eq(&self, other: &Self) -> bool {
        self.is_selector() == other.is_selector()
            && self.is_shifter() == other.is_shifter()
            && self.0.dyn_eq(&*other.0)
    }
}

impl Eq for UserFunction {}

impl Hash for UserFunction {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.dyn_hash(state);
        self.is_selector().hash(state);
        self.is_shifter().hash(state);
    }
}

impl fmt::Debug for UserFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

struct FnFunction<K, F> {
    token: K,
    selector: bool,
    shifter: bool,
    f: F,
}

impl<K: PartialEq, F> PartialEq for FnFunction<K, F> {
    fn eq(&self, other: &Self) -> bool {
        self.token == other.token && self.selector == other.selector && self.shifter == other.shifter
    }
}

impl<K: Eq, F> Eq for FnFunction<K, F> {}

impl<K: Hash, F> Hash for FnFunction<K, F> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.token.hash(state);
        self.selector.hash(state);
        self.shifter.hash(state);
    }
}

impl<K: fmt::Debug, F> fmt::Debug for FnFunction<K, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fn({:?})", self.token)
    }
}

impl<K, F> ValuesFunction for FnFunction<K, F>
where
    K: fmt::Debug + 'static,
    F: Fn(&ValueSet) -> ValueSet + 'static,
{
    fn apply(&self, values: &ValueSet) -> ValueSet {
        (self.f)(values)
    }

    fn is_selector(&self) -> bool {
        self.selector
    }

    fn is_shifter(&self) -> bool {
        self.shifter
    }
}

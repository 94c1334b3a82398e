//! Error type shared by all fallible operations of the library.

use thiserror::Error;

use crate::order::Identifier;
use crate::types::Var;

/// Errors reported by the manager, orders, homomorphisms and paths.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SddError {
    /// A manager is already alive in this thread.
    #[error("SDD library already initialized")]
    AlreadyInitialized,

    /// The same identifier was pushed twice into an order builder.
    #[error("identifier {0} occurs more than once in the order")]
    DuplicateIdentifier(Identifier),

    /// The identifier does not belong to the order.
    #[error("identifier {0} is not part of the order")]
    UnknownIdentifier(Identifier),

    /// The operation needs at least one level in the order.
    #[error("the order is empty")]
    EmptyOrder,

    /// A value-set operation was requested on a hierarchical level.
    #[error("identifier {0} is hierarchical, expected a flat level")]
    NotFlat(Identifier),

    /// A nested operation was requested on a flat level.
    #[error("identifier {0} is flat, expected a hierarchical level")]
    NotHierarchical(Identifier),

    /// A valuation of the wrong kind was given for a level.
    #[error("valuation kind does not match the level of variable {0}")]
    ValuationMismatch(Var),

    /// Two diagrams that were not built over the same order were combined.
    #[error("incompatible diagrams: {lhs} vs {rhs}")]
    IncompatibleDiagrams { lhs: String, rhs: String },

    /// A diagram or homomorphism was used under an order that does not describe it.
    #[error("order mismatch: {0}")]
    OrderMismatch(String),

    /// `sum` and `intersection` need at least one operand.
    #[error("homomorphism operation needs at least one operand")]
    EmptyOperands,

    /// Access past the end of a path.
    #[error("index {index} out of range for path of length {len}")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Convenient result alias.
pub type Result<T> = std::result::Result<T, SddError>;

//! Error types for kind construction, conversion and arithmetic.

use crate::kind::Operation;

/// Result type for kind and unit-value operations.
pub type KindResult<T> = Result<T, KindError>;

/// Error type for kind and unit-value operations.
///
/// Every failure is local and synchronous: nothing is retried or partially
/// applied, so callers are free to recover however they like.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum KindError {
    /// A value of one kind was used where a non-compatible kind was required.
    #[error("Incompatible kinds: cannot convert {from} to {to}")]
    IncompatibleKind {
        /// Source kind.
        from: String,
        /// Requested kind.
        to: String,
    },

    /// A family already has a different standard unit.
    #[error("Family {family} already has standard unit {existing}; cannot register {attempted}")]
    DuplicateStandardUnit {
        /// Family name.
        family: String,
        /// Standard unit already registered.
        existing: String,
        /// Unit that was rejected.
        attempted: String,
    },

    /// A compound kind was built directly from two compatible operands.
    #[error("Invalid compound {left} {op} {right}: operands are compatible, use value arithmetic instead")]
    InvalidCompoundConstruction {
        /// Requested operation.
        op: Operation,
        /// Left operand.
        left: String,
        /// Right operand.
        right: String,
    },

    /// No cast is registered, or a cast registration was rejected.
    #[error("Cast error: {0}")]
    Cast(String),

    /// An interned handle was used outside the registry that produced it.
    #[error("Interning misuse: {0}")]
    InterningMisuse(String),

    /// A unit was defined against something that is not a standard unit.
    #[error("Missing standard unit: {0}")]
    MissingStandardUnit(String),

    /// A unit definition carries an unusable conversion factor.
    #[error("Invalid unit definition: {0}")]
    InvalidUnitDefinition(String),

    /// Two payloads cannot be broadcast against each other.
    #[error("Payload shape mismatch: {left:?} vs {right:?}")]
    ShapeMismatch {
        /// Shape of the left payload.
        left: Vec<usize>,
        /// Shape of the right payload.
        right: Vec<usize>,
    },
}

impl KindError {
    pub(crate) fn incompatible(from: impl ToString, to: impl ToString) -> Self {
        KindError::IncompatibleKind {
            from: from.to_string(),
            to: to.to_string(),
        }
    }
}

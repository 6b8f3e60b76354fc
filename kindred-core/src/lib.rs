//! Core model for runtime unit kinds.
//!
//! `kindred-core` tracks what a number *means* at runtime:
//!
//! - A [`Kind`] is an interned unit identity: an atomic unit of a [`Family`],
//!   the unitless kind, or a product/quotient of two kinds.
//! - A [`UnitValue`] pairs a kind with a [`Payload`] (an `f64` array).
//! - Conversion between compatible kinds goes through the family's standard
//!   unit; conversions across families need a registered cast.
//! - Arithmetic builds compound kinds and simplifies them by cancelling
//!   identical factors.
//!
//! Most users should depend on `kindred` (the facade crate), which also ships
//! predefined unit families.
//!
//! # Quick start
//!
//! ```rust
//! use kindred_core::{KindRegistry, UnitValue};
//!
//! let registry = KindRegistry::new();
//! let length = registry.family("length").unwrap();
//! let time = registry.family("time").unwrap();
//! let meters = registry.standard_unit(&length, "meters", "m").unwrap();
//! let seconds = registry.standard_unit(&time, "seconds", "s").unwrap();
//!
//! let d = UnitValue::new(&meters, 100.0);
//! let t = UnitValue::new(&seconds, 20.0);
//! let v = (&d / &t).unwrap();
//! assert_eq!(v.to_string(), "5 (m/s)");
//!
//! let back = (&v * &t).unwrap();
//! assert_eq!(back.kind(), &meters);
//! ```
//!
//! # Registries
//!
//! Every kind belongs to the [`KindRegistry`] that interned it. The
//! process-wide instance is [`KindRegistry::global`]; tests and embedders can
//! create independent registries. [`KindRegistry::clear`] invalidates every
//! outstanding handle of that registry.
//!
//! # Errors
//!
//! Fallible operations return [`KindResult`]. Nothing panics on bad units;
//! payload arithmetic follows IEEE-754 semantics.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

// ─────────────────────────────────────────────────────────────────────────────
// Core modules
// ─────────────────────────────────────────────────────────────────────────────

mod analysis;
mod arithmetic;
mod cast;
mod error;
mod interning;
mod kind;
mod macros;
mod payload;
mod registry;
mod value;

/// TOML unit catalog.
pub mod catalog;

// ─────────────────────────────────────────────────────────────────────────────
// Public re-exports of core types
// ─────────────────────────────────────────────────────────────────────────────

pub use analysis::{flatten, is_equivalent, simplify, un_flatten, Flattened, KindTally};
pub use arithmetic::{do_add, do_div, do_mul, do_sub, negate};
pub use cast::{CastFn, CastRegistry};
pub use error::{KindError, KindResult};
pub use interning::{Internable, Interned, Interner};
pub use kind::{AtomicKind, CompoundKind, Conversion, Family, FamilyDef, Kind, KindClass, KindRepr, Operation};
pub use payload::Payload;
pub use registry::{CompoundFactories, KindRegistry};
pub use value::UnitValue;

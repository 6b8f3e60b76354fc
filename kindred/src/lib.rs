//! Numeric values that know their units.
//!
//! `kindred` is the user-facing crate in this workspace. It re-exports the full
//! API from `kindred-core` plus a set of predefined unit families (length,
//! time, energy, mass, temperature) and the built-in casts.
//!
//! A value is a [`UnitValue`]: an `f64` array tagged with a runtime [`Kind`].
//! Multiplying and dividing values builds compound kinds such as `(m/s)` and
//! cancels identical factors; adding values converts the right operand into
//! the left operand's unit.
//!
//! # Quick start
//!
//! ```rust
//! use kindred::units::{length, time};
//! use kindred::UnitValue;
//!
//! let d = UnitValue::new(&length::kilometers().unwrap(), 3.0);
//! let t = UnitValue::new(&time::minutes().unwrap(), 2.0);
//! let speed = (&d / &t).unwrap();
//! assert_eq!(speed.to_string(), "1.5 (km/min)");
//!
//! let standard = speed.to_standard().unwrap();
//! assert!((standard.payload().as_scalar().unwrap() - 25.0).abs() < 1e-9);
//! ```
//!
//! Adding incompatible values fails instead of producing nonsense:
//!
//! ```rust
//! use kindred::units::{length, time};
//! use kindred::{KindError, UnitValue};
//!
//! let d = UnitValue::new(&length::meters().unwrap(), 1.0);
//! let t = UnitValue::new(&time::seconds().unwrap(), 1.0);
//! assert!(matches!(d + t, Err(KindError::IncompatibleKind { .. })));
//! ```
//!
//! # Casts
//!
//! Values only convert within a family. [`install_casts`] registers the
//! built-in cross-family casts (metres to planar metres); further casts go
//! through [`CastRegistry::register`].

#![forbid(unsafe_code)]

pub use kindred_core::*;

mod casts;
pub mod units;

pub use casts::{install_casts, install_casts_in};

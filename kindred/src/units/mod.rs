//! Predefined unit families.
//!
//! Every accessor returns the kind interned in [`KindRegistry::global`]
//! (created on first use), so values built from these units mix freely with
//! kinds defined at runtime in the same registry.
//!
//! [`KindRegistry::global`]: crate::KindRegistry::global

pub mod energy;
pub mod length;
pub mod length2d;
pub mod mass;
pub mod temperature;
pub mod time;

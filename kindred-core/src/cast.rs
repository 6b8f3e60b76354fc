//! Registered conversions between families.
//!
//! Compatible kinds convert implicitly. Anything else, such as turning a 1-D
//! length into a 2-D position, needs a cast handler registered for the pair
//! of families.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use once_cell::sync::Lazy;

use crate::error::{KindError, KindResult};
use crate::kind::{CompoundKind, Family, Kind, KindClass, KindRepr};
use crate::payload::Payload;
use crate::value::UnitValue;

/// Cast handler: receives a value in the registered source kind and returns
/// the raw payload in the registered target kind.
pub type CastFn = dyn Fn(&UnitValue) -> KindResult<Payload> + Send + Sync;

static GLOBAL_CASTS: Lazy<CastRegistry> = Lazy::new(CastRegistry::new);

#[derive(Clone)]
struct CastEntry {
    from: Kind,
    to: Kind,
    handler: Arc<CastFn>,
}

/// Table of cast handlers keyed by (source family, target family).
#[derive(Default)]
pub struct CastRegistry {
    casts: RwLock<HashMap<(Family, Family), CastEntry>>,
}

impl fmt::Debug for CastRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CastRegistry").field("casts", &self.len()).finish()
    }
}

fn family_of(kind: &Kind) -> KindResult<Family> {
    match kind.class() {
        KindClass::Family(family) => Ok(family),
        _ => Err(KindError::Cast(format!(
            "{} is not an atomic kind; casts are registered between atomic kinds",
            kind
        ))),
    }
}

impl CastRegistry {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide table.
    pub fn global() -> &'static CastRegistry {
        &GLOBAL_CASTS
    }

    /// Registers `handler` for casts from the family of `from` to the family
    /// of `to`, replacing any previous handler for that pair.
    ///
    /// The handler receives values already converted into `from`, and its
    /// output is interpreted in `to`.
    pub fn register<F>(&self, from: &Kind, to: &Kind, handler: F) -> KindResult<()>
    where
        F: Fn(&UnitValue) -> KindResult<Payload> + Send + Sync + 'static,
    {
        let from_family = family_of(from)?;
        let to_family = family_of(to)?;
        if from.is_compatible(to) {
            return Err(KindError::Cast(format!(
                "{} and {} are both of family {} and convert directly",
                from, to, from_family
            )));
        }

        let entry = CastEntry {
            from: from.clone(),
            to: to.clone(),
            handler: Arc::new(handler),
        };
        let previous = self
            .casts
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((from_family.clone(), to_family.clone()), entry);
        if previous.is_some() {
            log::warn!("Replacing cast handler from {} to {}", from_family, to_family);
        } else {
            log::debug!("Registered cast from {} to {}", from_family, to_family);
        }
        Ok(())
    }

    /// Returns `true` if a handler exists for the family pair.
    pub fn contains(&self, from: &Family, to: &Family) -> bool {
        self.casts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&(from.clone(), to.clone()))
    }

    /// Number of registered handlers.
    pub fn len(&self) -> usize {
        self.casts.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Returns `true` if no handler is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes every handler.
    pub fn clear(&self) {
        self.casts.write().unwrap_or_else(PoisonError::into_inner).clear();
    }

    /// Casts `value` into `target`.
    ///
    /// Atomic values use the handler registered for their family pair.
    /// Compound values are cast operand by operand into a compound target
    /// with the same operation; operands that are already compatible are
    /// simply converted. Unitless values never cast.
    pub fn as_type(&self, value: &UnitValue, target: &Kind) -> KindResult<UnitValue> {
        log::debug!("Casting {} to {}", value.kind(), target);
        match value.kind().repr() {
            KindRepr::Unitless => Err(KindError::Cast(format!(
                "unitless values cannot be cast (to {})",
                target
            ))),
            KindRepr::Compound(source) => self.cast_compound(value, source, target),
            KindRepr::Atomic(atomic) => {
                let to_family = family_of(target)?;
                let key = (atomic.family().clone(), to_family);
                let entry = self
                    .casts
                    .read()
                    .unwrap_or_else(PoisonError::into_inner)
                    .get(&key)
                    .cloned()
                    .ok_or_else(|| {
                        KindError::Cast(format!(
                            "no cast registered from {} to {}",
                            key.0, key.1
                        ))
                    })?;

                let input = UnitValue::convert(&entry.from, value)?;
                let raw = (entry.handler)(&input)?;
                UnitValue::convert(target, &UnitValue::new(&entry.to, raw))
            }
        }
    }

    fn cast_operand(&self, value: &UnitValue, target: &Kind) -> KindResult<UnitValue> {
        if value.kind().is_compatible(target) {
            UnitValue::convert(target, value)
        } else {
            self.as_type(value, target)
        }
    }

    fn cast_compound(&self, value: &UnitValue, source: &CompoundKind, target: &Kind) -> KindResult<UnitValue> {
        let shape = target
            .as_compound()
            .filter(|t| t.op() == source.op())
            .ok_or_else(|| {
                KindError::Cast(format!(
                    "cannot cast compound {} to {}: operations differ",
                    value.kind(),
                    target
                ))
            })?;

        let left = UnitValue::new(source.left(), value.payload().clone());
        let right = UnitValue::new(source.right(), 1.0);
        let left = self.cast_operand(&left, shape.left())?;
        let right = self.cast_operand(&right, shape.right())?;
        target.apply_to(&left, &right)
    }
}

//! Kind registry: the owner of every interned family and kind.
//!
//! A [`KindRegistry`] is a cheap, cloneable handle. The process-wide instance
//! is available through [`KindRegistry::global`]; independent registries can
//! be created with [`KindRegistry::new`] and injected wherever a
//! [`CompoundFactories`] is expected.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use once_cell::sync::OnceCell;

use crate::error::{KindError, KindResult};
use crate::interning::Interner;
use crate::kind::{Conversion, Family, FamilyDef, Kind, KindArgs, KindNode, KindSpec, Operation};

static GLOBAL_REGISTRY: OnceCell<KindRegistry> = OnceCell::new();

/// Factories used by analysis and arithmetic to build result kinds.
///
/// Unlike [`KindRegistry::compound`], these never reject compatible operands:
/// `m * m` is a legitimate arithmetic result.
pub trait CompoundFactories {
    /// Interned `left * right`.
    fn mul(&self, left: &Kind, right: &Kind) -> KindResult<Kind>;
    /// Interned `left / right`.
    fn div(&self, left: &Kind, right: &Kind) -> KindResult<Kind>;
    /// The dimensionless kind.
    fn unitless(&self) -> KindResult<Kind>;
}

pub(crate) struct RegistryInner {
    kinds: Interner<KindNode>,
    families: Interner<FamilyDef>,
    standards: RwLock<HashMap<u64, Kind>>,
}

/// Handle to a set of interned families and kinds.
#[derive(Clone)]
pub struct KindRegistry {
    inner: Arc<RegistryInner>,
}

impl Default for KindRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for KindRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KindRegistry")
            .field("kinds", &self.inner.kinds.len())
            .field("families", &self.inner.families.len())
            .field("epoch", &self.inner.kinds.epoch())
            .finish()
    }
}

impl PartialEq for KindRegistry {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl KindRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                kinds: Interner::new(),
                families: Interner::new(),
                standards: RwLock::new(HashMap::new()),
            }),
        }
    }

    /// The process-wide registry.
    pub fn global() -> &'static KindRegistry {
        GLOBAL_REGISTRY.get_or_init(KindRegistry::new)
    }

    pub(crate) fn from_inner(inner: Arc<RegistryInner>) -> Self {
        Self { inner }
    }

    /// Returns the family called `name`, creating it on first use.
    pub fn family(&self, name: &str) -> KindResult<Family> {
        self.inner.families.get(name.to_string())
    }

    /// The dimensionless kind.
    pub fn unitless(&self) -> KindResult<Kind> {
        self.intern(KindSpec::Unitless)
    }

    /// Registers the standard unit of `family`.
    ///
    /// Calling again with the same name returns the existing kind; a
    /// different name fails with [`KindError::DuplicateStandardUnit`].
    pub fn standard_unit(&self, family: &Family, name: &str, symbol: &str) -> KindResult<Kind> {
        self.inner.families.check(family)?;

        let mut standards = self
            .inner
            .standards
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = standards.get(&family.id()) {
            let same = existing.as_atomic().is_some_and(|atomic| atomic.name() == name);
            if same {
                return Ok(existing.clone());
            }
            return Err(KindError::DuplicateStandardUnit {
                family: family.name().to_string(),
                existing: existing.name(),
                attempted: name.to_string(),
            });
        }

        let kind = self.intern(KindSpec::Atomic {
            family: family.clone(),
            name: name.to_string(),
            symbol: symbol.to_string(),
            conversion: Conversion::Standard,
            standard: None,
        })?;
        standards.insert(family.id(), kind.clone());
        log::debug!("Registered {} ({}) as standard unit of {}", name, symbol, family.name());
        Ok(kind)
    }

    /// Registers a unit with `standard = value * scale`.
    pub fn scaled_unit(&self, standard: &Kind, name: &str, symbol: &str, scale: f64) -> KindResult<Kind> {
        self.affine_unit(standard, name, symbol, scale, 0.0)
    }

    /// Registers a unit with `standard = value * scale + offset`.
    pub fn affine_unit(
        &self,
        standard: &Kind,
        name: &str,
        symbol: &str,
        scale: f64,
        offset: f64,
    ) -> KindResult<Kind> {
        self.check(standard)?;
        let family = match standard.as_atomic() {
            Some(atomic) if atomic.standard().is_none() => atomic.family().clone(),
            _ => {
                return Err(KindError::MissingStandardUnit(format!(
                    "{} is not the standard unit of a family; cannot define {} against it",
                    standard, name
                )))
            }
        };
        if !scale.is_finite() || scale == 0.0 || !offset.is_finite() {
            return Err(KindError::InvalidUnitDefinition(format!(
                "{} needs a finite non-zero scale and a finite offset (got scale {}, offset {})",
                name, scale, offset
            )));
        }

        let kind = self.intern(KindSpec::Atomic {
            family,
            name: name.to_string(),
            symbol: symbol.to_string(),
            conversion: Conversion::Linear { scale, offset },
            standard: Some(standard.clone()),
        })?;
        if kind.is_standard() {
            return Err(KindError::DuplicateStandardUnit {
                family: standard.name(),
                existing: kind.name(),
                attempted: name.to_string(),
            });
        }
        Ok(kind)
    }

    /// Standard unit registered for `family`.
    pub fn standard_for(&self, family: &Family) -> KindResult<Kind> {
        self.inner
            .standards
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&family.id())
            .cloned()
            .ok_or_else(|| {
                KindError::MissingStandardUnit(format!("family {} has no standard unit", family.name()))
            })
    }

    /// Builds `left op right` directly.
    ///
    /// Compatible operands (identical ones included) are rejected with
    /// [`KindError::InvalidCompoundConstruction`]; such combinations only
    /// arise from value arithmetic, which goes through [`CompoundFactories`].
    pub fn compound(&self, op: Operation, left: &Kind, right: &Kind) -> KindResult<Kind> {
        if left.is_compatible(right) {
            return Err(KindError::InvalidCompoundConstruction {
                op,
                left: left.to_string(),
                right: right.to_string(),
            });
        }
        self.derive(op, left, right)
    }

    pub(crate) fn derive(&self, op: Operation, left: &Kind, right: &Kind) -> KindResult<Kind> {
        self.check(left)?;
        self.check(right)?;
        self.intern(KindSpec::Compound {
            op,
            left: left.clone(),
            right: right.clone(),
        })
    }

    /// Verifies that `kind` was interned by this registry since the last
    /// [`KindRegistry::clear`].
    pub fn check(&self, kind: &Kind) -> KindResult<()> {
        self.inner.kinds.check(&kind.0)
    }

    /// Drops every interned family and kind.
    ///
    /// Outstanding handles stay usable as plain data but are rejected by
    /// [`KindRegistry::check`] and never compare equal to kinds built later.
    pub fn clear(&self) {
        self.inner.kinds.clear();
        self.inner.families.clear();
        self.inner
            .standards
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        log::debug!("Kind registry cleared");
    }

    /// Number of interned kinds.
    pub fn len(&self) -> usize {
        self.inner.kinds.len()
    }

    /// Returns `true` if no kind has been interned.
    pub fn is_empty(&self) -> bool {
        self.inner.kinds.is_empty()
    }

    fn intern(&self, spec: KindSpec) -> KindResult<Kind> {
        self.inner
            .kinds
            .get(KindArgs {
                registry: Arc::downgrade(&self.inner),
                spec,
            })
            .map(Kind)
    }
}

impl CompoundFactories for KindRegistry {
    fn mul(&self, left: &Kind, right: &Kind) -> KindResult<Kind> {
        self.derive(Operation::Mul, left, right)
    }

    fn div(&self, left: &Kind, right: &Kind) -> KindResult<Kind> {
        self.derive(Operation::Div, left, right)
    }

    fn unitless(&self) -> KindResult<Kind> {
        KindRegistry::unitless(self)
    }
}

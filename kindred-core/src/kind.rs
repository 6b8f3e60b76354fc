//! Kind identity model.
//!
//! A [`Kind`] names a unit family member (metres, seconds), the dimensionless
//! identity, or a product/quotient of two other kinds. Kinds are interned by
//! their [`KindRegistry`]: structurally identical kinds share one node, so
//! `==` on kinds is an identity check.
//!
//! ```rust
//! use kindred_core::KindRegistry;
//!
//! let registry = KindRegistry::new();
//! let length = registry.family("length").unwrap();
//! let meters = registry.standard_unit(&length, "meters", "m").unwrap();
//! let inches = registry.scaled_unit(&meters, "inches", "in", 0.0254).unwrap();
//!
//! assert!(meters.is_compatible(&inches));
//! assert_ne!(meters, inches);
//! ```

use std::fmt;
use std::sync::Weak;

use crate::error::{KindError, KindResult};
use crate::interning::{Internable, Interned};
use crate::payload::Payload;
use crate::registry::{KindRegistry, RegistryInner};
use crate::value::UnitValue;

// ─────────────────────────────────────────────────────────────────────────────
// Operations
// ─────────────────────────────────────────────────────────────────────────────

/// Operation joining the two operands of a compound kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Operation {
    /// Product of the operands.
    Mul,
    /// Left operand divided by the right one.
    Div,
}

impl Operation {
    /// Applies the operation to two payloads.
    pub fn apply(self, left: &Payload, right: &Payload) -> KindResult<Payload> {
        match self {
            Operation::Mul => left.mul(right),
            Operation::Div => left.div(right),
        }
    }

    /// Printable operator symbol.
    pub fn symbol(self) -> &'static str {
        match self {
            Operation::Mul => "*",
            Operation::Div => "/",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Families
// ─────────────────────────────────────────────────────────────────────────────

/// Interned data behind a [`Family`].
#[derive(Debug)]
pub struct FamilyDef {
    name: String,
}

impl FamilyDef {
    /// Family name, e.g. `"length"`.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for FamilyDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl Internable for FamilyDef {
    type Args = String;
    type Key = String;

    fn intern_key(args: &String) -> String {
        args.clone()
    }

    fn init(name: String) -> KindResult<Self> {
        Ok(FamilyDef { name })
    }
}

/// A dimension family such as length or time. Atomic kinds sharing a family
/// convert into each other through the family's standard unit.
pub type Family = Interned<FamilyDef>;

// ─────────────────────────────────────────────────────────────────────────────
// Conversions
// ─────────────────────────────────────────────────────────────────────────────

/// How an atomic kind maps onto its family's standard unit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Conversion {
    /// The unit is the standard unit of its family.
    Standard,
    /// `standard = value * scale + offset`.
    Linear {
        /// Multiplicative factor towards the standard unit.
        scale: f64,
        /// Additive offset applied after scaling.
        offset: f64,
    },
}

impl Conversion {
    /// Converts a payload in this unit into the standard unit.
    pub fn to_standard(&self, payload: &Payload) -> Payload {
        match *self {
            Conversion::Standard => payload.clone(),
            Conversion::Linear { scale, offset } => payload.map(|x| x * scale + offset),
        }
    }

    /// Converts a payload in the standard unit into this unit.
    pub fn from_standard(&self, payload: &Payload) -> Payload {
        match *self {
            Conversion::Standard => payload.clone(),
            Conversion::Linear { scale, offset } => payload.map(|x| (x - offset) / scale),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Kind variants
// ─────────────────────────────────────────────────────────────────────────────

/// A concrete, non-compound unit.
#[derive(Debug)]
pub struct AtomicKind {
    family: Family,
    name: String,
    symbol: String,
    conversion: Conversion,
    standard: Option<Kind>,
}

impl AtomicKind {
    /// Family this unit belongs to.
    pub fn family(&self) -> &Family {
        &self.family
    }

    /// Unit name, e.g. `"meters"`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Display symbol, e.g. `"m"`.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Conversion towards the standard unit.
    pub fn conversion(&self) -> Conversion {
        self.conversion
    }

    /// The family's standard unit, or `None` if this unit is the standard.
    pub fn standard(&self) -> Option<&Kind> {
        self.standard.as_ref()
    }
}

/// Product or quotient of two kinds.
#[derive(Debug)]
pub struct CompoundKind {
    op: Operation,
    left: Kind,
    right: Kind,
}

impl CompoundKind {
    /// Operation joining the operands.
    pub fn op(&self) -> Operation {
        self.op
    }

    /// Left operand.
    pub fn left(&self) -> &Kind {
        &self.left
    }

    /// Right operand.
    pub fn right(&self) -> &Kind {
        &self.right
    }
}

/// The closed set of kind variants.
#[derive(Debug)]
pub enum KindRepr {
    /// A concrete unit of some family.
    Atomic(AtomicKind),
    /// The dimensionless identity.
    Unitless,
    /// `left op right`.
    Compound(CompoundKind),
}

/// Coarse classification used to key casts.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum KindClass {
    /// The dimensionless kind.
    Unitless,
    /// An atomic kind of the given family.
    Family(Family),
    /// A compound kind with the given operation.
    Compound(Operation),
}

// ─────────────────────────────────────────────────────────────────────────────
// Interned node
// ─────────────────────────────────────────────────────────────────────────────

/// Interned node behind a [`Kind`] handle.
pub struct KindNode {
    registry: Weak<RegistryInner>,
    repr: KindRepr,
}

impl fmt::Debug for KindNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.repr.fmt(f)
    }
}

pub(crate) enum KindSpec {
    Atomic {
        family: Family,
        name: String,
        symbol: String,
        conversion: Conversion,
        standard: Option<Kind>,
    },
    Unitless,
    Compound {
        op: Operation,
        left: Kind,
        right: Kind,
    },
}

/// Constructor arguments for a [`KindNode`]; only the registry builds these.
pub struct KindArgs {
    pub(crate) registry: Weak<RegistryInner>,
    pub(crate) spec: KindSpec,
}

#[derive(Clone, PartialEq, Eq, Hash)]
enum KeyRepr {
    Atomic { family: u64, name: String },
    Unitless,
    Compound { op: Operation, left: u64, right: u64 },
}

/// Interning key for kinds. Atomic kinds are keyed by family and name only;
/// compound kinds by operation and operand identities.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct KindKey(KeyRepr);

impl Internable for KindNode {
    type Args = KindArgs;
    type Key = KindKey;

    fn intern_key(args: &KindArgs) -> KindKey {
        KindKey(match &args.spec {
            KindSpec::Atomic { family, name, .. } => KeyRepr::Atomic {
                family: family.id(),
                name: name.clone(),
            },
            KindSpec::Unitless => KeyRepr::Unitless,
            KindSpec::Compound { op, left, right } => KeyRepr::Compound {
                op: *op,
                left: left.id(),
                right: right.id(),
            },
        })
    }

    fn init(args: KindArgs) -> KindResult<Self> {
        let repr = match args.spec {
            KindSpec::Atomic {
                family,
                name,
                symbol,
                conversion,
                standard,
            } => KindRepr::Atomic(AtomicKind {
                family,
                name,
                symbol,
                conversion,
                standard,
            }),
            KindSpec::Unitless => KindRepr::Unitless,
            KindSpec::Compound { op, left, right } => {
                KindRepr::Compound(CompoundKind { op, left, right })
            }
        };
        Ok(KindNode {
            registry: args.registry,
            repr,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Kind handle
// ─────────────────────────────────────────────────────────────────────────────

/// Handle to an interned kind. Cheap to clone; compares by identity.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Kind(pub(crate) Interned<KindNode>);

impl Kind {
    /// The variant behind this handle.
    #[inline]
    pub fn repr(&self) -> &KindRepr {
        &self.0.repr
    }

    /// Interning id; grows with creation order.
    #[inline]
    pub fn id(&self) -> u64 {
        self.0.id()
    }

    /// Registry epoch this kind was created in.
    #[inline]
    pub fn epoch(&self) -> u64 {
        self.0.epoch()
    }

    /// Returns the atomic data if this is an atomic kind.
    pub fn as_atomic(&self) -> Option<&AtomicKind> {
        match self.repr() {
            KindRepr::Atomic(atomic) => Some(atomic),
            _ => None,
        }
    }

    /// Returns the compound data if this is a compound kind.
    pub fn as_compound(&self) -> Option<&CompoundKind> {
        match self.repr() {
            KindRepr::Compound(compound) => Some(compound),
            _ => None,
        }
    }

    /// Returns `true` for the dimensionless kind.
    pub fn is_unitless(&self) -> bool {
        matches!(self.repr(), KindRepr::Unitless)
    }

    /// Returns `true` for products and quotients.
    pub fn is_compound(&self) -> bool {
        matches!(self.repr(), KindRepr::Compound(_))
    }

    /// Returns `true` if every atomic factor is its family's standard unit.
    pub fn is_standard(&self) -> bool {
        match self.repr() {
            KindRepr::Atomic(atomic) => atomic.standard.is_none(),
            KindRepr::Unitless => true,
            KindRepr::Compound(c) => c.left.is_standard() && c.right.is_standard(),
        }
    }

    /// Coarse class of this kind.
    pub fn class(&self) -> KindClass {
        match self.repr() {
            KindRepr::Atomic(atomic) => KindClass::Family(atomic.family.clone()),
            KindRepr::Unitless => KindClass::Unitless,
            KindRepr::Compound(c) => KindClass::Compound(c.op),
        }
    }

    /// Returns `true` if values of the two kinds convert into each other
    /// without a cast.
    ///
    /// Atomic kinds are compatible within a family. Compound kinds need the
    /// same operation and pairwise compatible operands; operand order is
    /// ignored for products but not for quotients. The check is structural:
    /// differently associated products are not recognized here, see
    /// [`crate::is_equivalent`] for that.
    pub fn is_compatible(&self, other: &Kind) -> bool {
        if self == other {
            return true;
        }
        match (self.repr(), other.repr()) {
            (KindRepr::Atomic(a), KindRepr::Atomic(b)) => a.family == b.family,
            (KindRepr::Unitless, KindRepr::Unitless) => true,
            (KindRepr::Compound(a), KindRepr::Compound(b)) => {
                if a.op != b.op {
                    return false;
                }
                let in_order = a.left.is_compatible(&b.left) && a.right.is_compatible(&b.right);
                match a.op {
                    Operation::Mul => {
                        in_order
                            || (a.left.is_compatible(&b.right) && a.right.is_compatible(&b.left))
                    }
                    Operation::Div => in_order,
                }
            }
            _ => false,
        }
    }

    /// Registry that interned this kind.
    pub fn registry(&self) -> KindResult<KindRegistry> {
        self.0
            .registry
            .upgrade()
            .map(KindRegistry::from_inner)
            .ok_or_else(|| {
                KindError::InterningMisuse(format!(
                    "registry owning kind {} has been dropped",
                    self
                ))
            })
    }

    /// The standard-unit form of this kind.
    ///
    /// Atomic kinds map to their family's standard unit, compound kinds are
    /// rebuilt from their standardized operands.
    pub fn standard_unit_class(&self) -> KindResult<Kind> {
        match self.repr() {
            KindRepr::Atomic(atomic) => Ok(atomic.standard.clone().unwrap_or_else(|| self.clone())),
            KindRepr::Unitless => Ok(self.clone()),
            KindRepr::Compound(c) => {
                let left = c.left.standard_unit_class()?;
                let right = c.right.standard_unit_class()?;
                if left == c.left && right == c.right {
                    return Ok(self.clone());
                }
                self.registry()?.derive(c.op, &left, &right)
            }
        }
    }

    /// Converts a raw payload expressed in this kind into the standard form.
    ///
    /// Compound kinds treat the payload as carried by the left operand with
    /// the right operand fixed at one.
    pub fn to_standard_raw(&self, payload: &Payload) -> KindResult<Payload> {
        match self.repr() {
            KindRepr::Atomic(atomic) => Ok(atomic.conversion.to_standard(payload)),
            KindRepr::Unitless => Ok(payload.clone()),
            KindRepr::Compound(c) => {
                let left = c.left.to_standard_raw(payload)?;
                let unit_right = c.right.to_standard_raw(&Payload::scalar(1.0))?;
                c.op.apply(&left, &unit_right)
            }
        }
    }

    /// Inverse of [`Kind::to_standard_raw`].
    pub fn from_standard_raw(&self, payload: &Payload) -> KindResult<Payload> {
        match self.repr() {
            KindRepr::Atomic(atomic) => Ok(atomic.conversion.from_standard(payload)),
            KindRepr::Unitless => Ok(payload.clone()),
            KindRepr::Compound(c) => {
                let unit_right = c.right.to_standard_raw(&Payload::scalar(1.0))?;
                let left = match c.op {
                    Operation::Mul => payload.div(&unit_right)?,
                    Operation::Div => payload.mul(&unit_right)?,
                };
                c.left.from_standard_raw(&left)
            }
        }
    }

    /// Combines two operand values into a value of this compound kind.
    ///
    /// Each operand is first converted into the matching operand kind.
    pub fn apply_to(&self, left: &UnitValue, right: &UnitValue) -> KindResult<UnitValue> {
        let compound = self.as_compound().ok_or_else(|| {
            KindError::incompatible(format!("{} and {}", left.kind(), right.kind()), self)
        })?;
        let left = UnitValue::convert(&compound.left, left)?;
        let right = UnitValue::convert(&compound.right, right)?;
        let payload = compound.op.apply(left.payload(), right.payload())?;
        Ok(UnitValue::new(self, payload))
    }

    /// Human-readable name: the unit name for atomic kinds, the symbolic
    /// form otherwise.
    pub fn name(&self) -> String {
        match self.repr() {
            KindRepr::Atomic(atomic) => atomic.name.clone(),
            KindRepr::Unitless => "unitless".to_string(),
            KindRepr::Compound(_) => self.to_string(),
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.repr() {
            KindRepr::Atomic(atomic) => f.write_str(&atomic.symbol),
            KindRepr::Unitless => f.write_str("1"),
            KindRepr::Compound(c) => write!(f, "({}{}{})", c.left, c.op, c.right),
        }
    }
}

impl fmt::Debug for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Kind(#{} {})", self.id(), self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::CompoundFactories;

    struct Fixture {
        registry: KindRegistry,
        meters: Kind,
        inches: Kind,
        seconds: Kind,
        minutes: Kind,
    }

    fn fixture() -> Fixture {
        let registry = KindRegistry::new();
        let length = registry.family("length").unwrap();
        let time = registry.family("time").unwrap();
        let meters = registry.standard_unit(&length, "meters", "m").unwrap();
        let inches = registry.scaled_unit(&meters, "inches", "in", 0.0254).unwrap();
        let seconds = registry.standard_unit(&time, "seconds", "s").unwrap();
        let minutes = registry.scaled_unit(&seconds, "minutes", "min", 60.0).unwrap();
        Fixture {
            registry,
            meters,
            inches,
            seconds,
            minutes,
        }
    }

    #[test]
    fn atomic_compatibility_follows_family() {
        let f = fixture();
        assert!(f.meters.is_compatible(&f.inches));
        assert!(f.inches.is_compatible(&f.meters));
        assert!(!f.meters.is_compatible(&f.seconds));
    }

    #[test]
    fn unitless_is_only_compatible_with_itself() {
        let f = fixture();
        let unitless = f.registry.unitless().unwrap();
        assert!(unitless.is_compatible(&unitless));
        assert!(!unitless.is_compatible(&f.meters));
        assert!(!f.meters.is_compatible(&unitless));
    }

    #[test]
    fn mul_compatibility_ignores_operand_order() {
        let f = fixture();
        let ms = f.registry.compound(Operation::Mul, &f.meters, &f.seconds).unwrap();
        let sm = f.registry.compound(Operation::Mul, &f.seconds, &f.meters).unwrap();
        let in_min = f.registry.compound(Operation::Mul, &f.inches, &f.minutes).unwrap();
        assert!(ms.is_compatible(&sm));
        assert!(sm.is_compatible(&in_min));
    }

    #[test]
    fn div_compatibility_respects_operand_order() {
        let f = fixture();
        let m_per_s = f.registry.compound(Operation::Div, &f.meters, &f.seconds).unwrap();
        let s_per_m = f.registry.compound(Operation::Div, &f.seconds, &f.meters).unwrap();
        let in_per_min = f.registry.compound(Operation::Div, &f.inches, &f.minutes).unwrap();
        assert!(!m_per_s.is_compatible(&s_per_m));
        assert!(m_per_s.is_compatible(&in_per_min));
    }

    #[test]
    fn mul_and_div_are_never_compatible() {
        let f = fixture();
        let mul = f.registry.compound(Operation::Mul, &f.meters, &f.seconds).unwrap();
        let div = f.registry.compound(Operation::Div, &f.meters, &f.seconds).unwrap();
        assert!(!mul.is_compatible(&div));
        assert!(!mul.is_compatible(&f.meters));
    }

    #[test]
    fn standard_unit_class_of_atomic_and_compound() {
        let f = fixture();
        assert_eq!(f.inches.standard_unit_class().unwrap(), f.meters);
        assert_eq!(f.meters.standard_unit_class().unwrap(), f.meters);

        let speed = f.registry.compound(Operation::Div, &f.inches, &f.minutes).unwrap();
        let standard = speed.standard_unit_class().unwrap();
        let expected = f.registry.compound(Operation::Div, &f.meters, &f.seconds).unwrap();
        assert_eq!(standard, expected);
    }

    #[test]
    fn standard_unit_class_of_squared_compound_is_interned() {
        let f = fixture();
        let squared = f.registry.mul(&f.inches, &f.inches).unwrap();
        let first = squared.standard_unit_class().unwrap();
        let second = squared.standard_unit_class().unwrap();
        assert_eq!(first, second);
        assert_eq!(first, f.registry.mul(&f.meters, &f.meters).unwrap());
    }

    #[test]
    fn compound_raw_conversion_roundtrip() {
        let f = fixture();
        let speed = f.registry.compound(Operation::Div, &f.inches, &f.minutes).unwrap();
        let standard = speed.to_standard_raw(&Payload::scalar(60.0)).unwrap();
        assert!((standard.as_scalar().unwrap() - 0.0254).abs() < 1e-12);
        let back = speed.from_standard_raw(&standard).unwrap();
        assert!((back.as_scalar().unwrap() - 60.0).abs() < 1e-9);
    }

    #[test]
    fn display_forms() {
        let f = fixture();
        let speed = f.registry.compound(Operation::Div, &f.meters, &f.seconds).unwrap();
        assert_eq!(speed.to_string(), "(m/s)");
        assert_eq!(f.registry.unitless().unwrap().to_string(), "1");
        assert_eq!(f.inches.name(), "inches");
    }

    #[test]
    fn class_distinguishes_variants() {
        let f = fixture();
        let speed = f.registry.compound(Operation::Div, &f.meters, &f.seconds).unwrap();
        assert_eq!(speed.class(), KindClass::Compound(Operation::Div));
        assert_eq!(f.registry.unitless().unwrap().class(), KindClass::Unitless);
        match f.inches.class() {
            KindClass::Family(family) => assert_eq!(family.name(), "length"),
            other => panic!("unexpected class {:?}", other),
        }
    }

    #[test]
    fn registry_outlives_handles_or_reports_misuse() {
        let orphan = {
            let registry = KindRegistry::new();
            let length = registry.family("length").unwrap();
            registry.standard_unit(&length, "meters", "m").unwrap()
        };
        assert!(matches!(
            orphan.registry(),
            Err(KindError::InterningMisuse(_))
        ));
    }
}

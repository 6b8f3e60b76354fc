//! Unit values: a payload tagged with its kind.

use std::fmt;

use crate::analysis::simplify;
use crate::cast::CastRegistry;
use crate::error::{KindError, KindResult};
use crate::kind::Kind;
use crate::payload::Payload;
use crate::registry::KindRegistry;

/// A numeric payload interpreted in a specific kind.
///
/// ```rust
/// use kindred_core::{KindRegistry, UnitValue};
///
/// let registry = KindRegistry::new();
/// let length = registry.family("length").unwrap();
/// let meters = registry.standard_unit(&length, "meters", "m").unwrap();
/// let centimeters = registry.scaled_unit(&meters, "centimeters", "cm", 0.01).unwrap();
///
/// let value = UnitValue::new(&centimeters, 150.0);
/// let converted = UnitValue::convert(&meters, &value).unwrap();
/// assert!((converted.payload().as_scalar().unwrap() - 1.5).abs() < 1e-12);
/// ```
#[derive(Clone, Debug)]
pub struct UnitValue {
    kind: Kind,
    payload: Payload,
}

impl UnitValue {
    /// Wraps `payload` as a value of `kind`.
    pub fn new(kind: &Kind, payload: impl Into<Payload>) -> Self {
        Self {
            kind: kind.clone(),
            payload: payload.into(),
        }
    }

    /// Dimensionless value in `registry`.
    pub fn unitless(registry: &KindRegistry, payload: impl Into<Payload>) -> KindResult<Self> {
        Ok(Self::new(&registry.unitless()?, payload))
    }

    /// Re-expresses `value` in `kind`.
    ///
    /// Values already of `kind` are returned unchanged; otherwise the kinds
    /// must be compatible and the payload goes through the standard form.
    pub fn convert(kind: &Kind, value: &UnitValue) -> KindResult<Self> {
        if value.kind == *kind {
            return Ok(value.clone());
        }
        if !value.kind.is_compatible(kind) {
            return Err(KindError::incompatible(&value.kind, kind));
        }
        let standard = value.kind.to_standard_raw(&value.payload)?;
        Ok(Self {
            kind: kind.clone(),
            payload: kind.from_standard_raw(&standard)?,
        })
    }

    /// Kind of this value.
    pub fn kind(&self) -> &Kind {
        &self.kind
    }

    /// Raw payload in this value's kind.
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Splits the value into kind and payload.
    pub fn into_parts(self) -> (Kind, Payload) {
        (self.kind, self.payload)
    }

    /// Symbolic form of the kind, e.g. `"(m/s)"`.
    pub fn name(&self) -> String {
        self.kind.to_string()
    }

    /// Converts into the kind's standard unit class.
    pub fn to_standard(&self) -> KindResult<UnitValue> {
        let standard = self.kind.standard_unit_class()?;
        if standard == self.kind {
            return Ok(self.clone());
        }
        Ok(Self {
            payload: self.kind.to_standard_raw(&self.payload)?,
            kind: standard,
        })
    }

    /// Casts into a kind of another family through the process-wide
    /// [`CastRegistry`].
    pub fn cast_to(&self, target: &Kind) -> KindResult<UnitValue> {
        self.cast_to_in(CastRegistry::global(), target)
    }

    /// Casts into a kind of another family through `casts`.
    pub fn cast_to_in(&self, casts: &CastRegistry, target: &Kind) -> KindResult<UnitValue> {
        casts.as_type(self, target)
    }

    /// Exact element-wise equality after converting `other` into this kind.
    ///
    /// Fails with [`KindError::IncompatibleKind`] if the kinds do not convert.
    pub fn equals(&self, other: &UnitValue) -> KindResult<bool> {
        let other = UnitValue::convert(&self.kind, other)?;
        Ok(self.payload.array_eq(&other.payload))
    }

    /// Like [`UnitValue::equals`] but with an absolute tolerance.
    pub fn approx_equals(&self, other: &UnitValue, epsilon: f64) -> KindResult<bool> {
        let other = UnitValue::convert(&self.kind, other)?;
        Ok(self.payload.abs_diff_eq(&other.payload, epsilon))
    }

    /// Converts to standard units and then simplifies the kind.
    ///
    /// Unlike plain simplification this cancels factors that are different
    /// units of one family, e.g. `(in*m)/m` reduces to metres.
    pub fn reduce(&self) -> KindResult<UnitValue> {
        let standard = self.to_standard()?;
        let registry = standard.kind.registry()?;
        let simplified = simplify(&standard.kind, &registry)?;
        if simplified == standard.kind {
            return Ok(standard);
        }
        log::debug!("Reduced {} to {}", self.kind, simplified);
        Ok(Self {
            kind: simplified,
            payload: standard.payload,
        })
    }
}

impl fmt::Display for UnitValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.kind.is_unitless() {
            write!(f, "{}", self.payload)
        } else {
            write!(f, "{} {}", self.payload, self.kind)
        }
    }
}

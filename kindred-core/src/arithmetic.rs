//! Arithmetic on unit values.
//!
//! Multiplication and division build the compound result kind, apply it to
//! the operands and simplify. Addition and subtraction require compatible
//! operands. A unitless operand takes on the kind of the other side.
//!
//! The operator impls at the bottom use the registry that owns the left
//! operand's kind. Mixed with plain `f64` scalars, `value * x`, `x * value`
//! and `value / x` keep the value's kind; `x / value` yields the reciprocal
//! kind. `value ± x` and `x ± value` treat `x` as unitless, so the result
//! keeps the value's kind.

use std::ops::{Add, Div, Mul, Neg, Sub};

use crate::analysis::simplify;
use crate::error::KindResult;
use crate::payload::Payload;
use crate::registry::CompoundFactories;
use crate::value::UnitValue;

/// Re-expresses a combined value in its simplified kind, if simplification
/// changed anything. The payload is recomputed from the operands' standard
/// forms so cancelled factors of different scale stay correct.
fn finish(
    factories: &dyn CompoundFactories,
    combined: UnitValue,
    left: &UnitValue,
    right: &UnitValue,
) -> KindResult<UnitValue> {
    let simplified = simplify(combined.kind(), factories)?;
    if simplified == *combined.kind() {
        return Ok(combined);
    }
    let op = match combined.kind().as_compound() {
        Some(compound) => compound.op(),
        None => return Ok(combined),
    };
    let left_standard = left.kind().to_standard_raw(left.payload())?;
    let right_standard = right.kind().to_standard_raw(right.payload())?;
    let standard = op.apply(&left_standard, &right_standard)?;
    Ok(UnitValue::new(&simplified, simplified.from_standard_raw(&standard)?))
}

/// `left * right`.
pub fn do_mul(factories: &dyn CompoundFactories, left: &UnitValue, right: &UnitValue) -> KindResult<UnitValue> {
    if right.kind().is_unitless() {
        return Ok(UnitValue::new(left.kind(), left.payload().mul(right.payload())?));
    }
    if left.kind().is_unitless() {
        return Ok(UnitValue::new(right.kind(), left.payload().mul(right.payload())?));
    }

    let right = if right.kind().is_compatible(left.kind()) {
        UnitValue::convert(left.kind(), right)?
    } else {
        right.clone()
    };
    let kind = factories.mul(left.kind(), right.kind())?;
    let product = kind.apply_to(left, &right)?;
    finish(factories, product, left, &right)
}

/// `left / right`.
///
/// Dividing compatible values yields a unitless ratio.
pub fn do_div(factories: &dyn CompoundFactories, left: &UnitValue, right: &UnitValue) -> KindResult<UnitValue> {
    if right.kind().is_unitless() {
        return Ok(UnitValue::new(left.kind(), left.payload().div(right.payload())?));
    }
    if right.kind().is_compatible(left.kind()) {
        let right = UnitValue::convert(left.kind(), right)?;
        return Ok(UnitValue::new(
            &factories.unitless()?,
            left.payload().div(right.payload())?,
        ));
    }

    let kind = factories.div(left.kind(), right.kind())?;
    let quotient = kind.apply_to(left, right)?;
    finish(factories, quotient, left, right)
}

fn absorb_unitless(left: &UnitValue, right: &UnitValue) -> (UnitValue, UnitValue) {
    match (left.kind().is_unitless(), right.kind().is_unitless()) {
        (true, false) => (UnitValue::new(right.kind(), left.payload().clone()), right.clone()),
        (false, true) => (left.clone(), UnitValue::new(left.kind(), right.payload().clone())),
        _ => (left.clone(), right.clone()),
    }
}

/// `left + right`, expressed in the left operand's kind.
pub fn do_add(left: &UnitValue, right: &UnitValue) -> KindResult<UnitValue> {
    let (left, right) = absorb_unitless(left, right);
    let right = UnitValue::convert(left.kind(), &right)?;
    Ok(UnitValue::new(left.kind(), left.payload().add(right.payload())?))
}

/// `-value`.
pub fn negate(value: &UnitValue) -> UnitValue {
    UnitValue::new(value.kind(), value.payload().neg())
}

/// `left - right`, expressed in the left operand's kind.
pub fn do_sub(left: &UnitValue, right: &UnitValue) -> KindResult<UnitValue> {
    do_add(left, &negate(right))
}

fn mul_values(left: &UnitValue, right: &UnitValue) -> KindResult<UnitValue> {
    do_mul(&left.kind().registry()?, left, right)
}

fn div_values(left: &UnitValue, right: &UnitValue) -> KindResult<UnitValue> {
    do_div(&left.kind().registry()?, left, right)
}

// ─────────────────────────────────────────────────────────────────────────────
// Operator impls
// ─────────────────────────────────────────────────────────────────────────────

macro_rules! impl_value_op {
    ($trait:ident, $method:ident, $func:ident) => {
        impl $trait<&UnitValue> for &UnitValue {
            type Output = KindResult<UnitValue>;
            fn $method(self, rhs: &UnitValue) -> Self::Output {
                $func(self, rhs)
            }
        }

        impl $trait<UnitValue> for UnitValue {
            type Output = KindResult<UnitValue>;
            fn $method(self, rhs: UnitValue) -> Self::Output {
                $func(&self, &rhs)
            }
        }

        impl $trait<&UnitValue> for UnitValue {
            type Output = KindResult<UnitValue>;
            fn $method(self, rhs: &UnitValue) -> Self::Output {
                $func(&self, rhs)
            }
        }

        impl $trait<UnitValue> for &UnitValue {
            type Output = KindResult<UnitValue>;
            fn $method(self, rhs: UnitValue) -> Self::Output {
                $func(self, &rhs)
            }
        }
    };
}

impl_value_op!(Mul, mul, mul_values);
impl_value_op!(Div, div, div_values);
impl_value_op!(Add, add, do_add);
impl_value_op!(Sub, sub, do_sub);

impl Neg for UnitValue {
    type Output = UnitValue;
    fn neg(self) -> UnitValue {
        negate(&self)
    }
}

impl Neg for &UnitValue {
    type Output = UnitValue;
    fn neg(self) -> UnitValue {
        negate(self)
    }
}

impl Mul<f64> for &UnitValue {
    type Output = UnitValue;
    fn mul(self, rhs: f64) -> UnitValue {
        UnitValue::new(self.kind(), self.payload().map(|x| x * rhs))
    }
}

impl Mul<f64> for UnitValue {
    type Output = UnitValue;
    fn mul(self, rhs: f64) -> UnitValue {
        &self * rhs
    }
}

impl Mul<&UnitValue> for f64 {
    type Output = UnitValue;
    fn mul(self, rhs: &UnitValue) -> UnitValue {
        rhs * self
    }
}

impl Mul<UnitValue> for f64 {
    type Output = UnitValue;
    fn mul(self, rhs: UnitValue) -> UnitValue {
        &rhs * self
    }
}

impl Div<f64> for &UnitValue {
    type Output = UnitValue;
    fn div(self, rhs: f64) -> UnitValue {
        UnitValue::new(self.kind(), self.payload().map(|x| x / rhs))
    }
}

impl Div<f64> for UnitValue {
    type Output = UnitValue;
    fn div(self, rhs: f64) -> UnitValue {
        &self / rhs
    }
}

impl Div<&UnitValue> for f64 {
    type Output = KindResult<UnitValue>;
    fn div(self, rhs: &UnitValue) -> KindResult<UnitValue> {
        let registry = rhs.kind().registry()?;
        let numerator = UnitValue::unitless(&registry, Payload::scalar(self))?;
        do_div(&registry, &numerator, rhs)
    }
}

impl Div<UnitValue> for f64 {
    type Output = KindResult<UnitValue>;
    fn div(self, rhs: UnitValue) -> KindResult<UnitValue> {
        self / &rhs
    }
}

/// `value ± x` and `x ± value`: the scalar enters as a unitless value and
/// takes on the other operand's kind.
macro_rules! impl_scalar_op {
    ($trait:ident, $method:ident, $op:ident) => {
        impl $trait<f64> for &UnitValue {
            type Output = KindResult<UnitValue>;
            fn $method(self, rhs: f64) -> KindResult<UnitValue> {
                let scalar = UnitValue::unitless(&self.kind().registry()?, Payload::scalar(rhs))?;
                $op(self, &scalar)
            }
        }

        impl $trait<f64> for UnitValue {
            type Output = KindResult<UnitValue>;
            fn $method(self, rhs: f64) -> KindResult<UnitValue> {
                (&self).$method(rhs)
            }
        }

        impl $trait<&UnitValue> for f64 {
            type Output = KindResult<UnitValue>;
            fn $method(self, rhs: &UnitValue) -> KindResult<UnitValue> {
                let scalar = UnitValue::unitless(&rhs.kind().registry()?, Payload::scalar(self))?;
                $op(&scalar, rhs)
            }
        }

        impl $trait<UnitValue> for f64 {
            type Output = KindResult<UnitValue>;
            fn $method(self, rhs: UnitValue) -> KindResult<UnitValue> {
                self.$method(&rhs)
            }
        }
    };
}

impl_scalar_op!(Add, add, do_add);
impl_scalar_op!(Sub, sub, do_sub);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::KindError;
    use crate::kind::{Kind, Operation};
    use crate::registry::KindRegistry;
    use approx::assert_abs_diff_eq;

    struct Units {
        registry: KindRegistry,
        m: Kind,
        cm: Kind,
        inch: Kind,
        s: Kind,
        min: Kind,
    }

    fn units() -> Units {
        let registry = KindRegistry::new();
        let length = registry.family("length").unwrap();
        let time = registry.family("time").unwrap();
        let m = registry.standard_unit(&length, "meters", "m").unwrap();
        let cm = registry.scaled_unit(&m, "centimeters", "cm", 0.01).unwrap();
        let inch = registry.scaled_unit(&m, "inches", "in", 0.0254).unwrap();
        let s = registry.standard_unit(&time, "seconds", "s").unwrap();
        let min = registry.scaled_unit(&s, "minutes", "min", 60.0).unwrap();
        Units {
            registry,
            m,
            cm,
            inch,
            s,
            min,
        }
    }

    fn scalar(value: &UnitValue) -> f64 {
        value.payload().as_scalar().unwrap()
    }

    // ─── Multiplication ─────────────────────────────────────────────────────

    #[test]
    fn mul_builds_compound_kind() {
        let u = units();
        let a = UnitValue::new(&u.m, 2.0);
        let b = UnitValue::new(&u.s, 3.0);
        let product = (&a * &b).unwrap();
        assert_eq!(product.kind(), &u.registry.mul(&u.m, &u.s).unwrap());
        assert_abs_diff_eq!(scalar(&product), 6.0);
    }

    #[test]
    fn mul_converts_compatible_right_operand() {
        let u = units();
        let a = UnitValue::new(&u.m, 2.0);
        let b = UnitValue::new(&u.cm, 50.0);
        let product = (&a * &b).unwrap();
        assert_eq!(product.to_string(), "1 (m*m)");
    }

    #[test]
    fn mul_by_unitless_keeps_kind() {
        let u = units();
        let a = UnitValue::new(&u.m, [1.0, 2.0]);
        let two = UnitValue::unitless(&u.registry, 2.0).unwrap();
        assert_eq!((&a * &two).unwrap().kind(), &u.m);
        assert_eq!((&two * &a).unwrap().payload().to_vec(), vec![2.0, 4.0]);
        assert_eq!((&a * 3.0).payload().to_vec(), vec![3.0, 6.0]);
        assert_eq!((3.0 * &a).kind(), &u.m);
    }

    #[test]
    fn mul_simplifies_and_rescales() {
        let u = units();
        // (cm/s) * s -> cm
        let speed_kind = u.registry.compound(Operation::Div, &u.cm, &u.s).unwrap();
        let speed = UnitValue::new(&speed_kind, 5.0);
        let time = UnitValue::new(&u.s, 60.0);
        let distance = (&speed * &time).unwrap();
        assert_eq!(distance.kind(), &u.cm);
        assert_abs_diff_eq!(scalar(&distance), 300.0, epsilon = 1e-9);
    }

    #[test]
    fn mul_does_not_cancel_different_units_of_a_family() {
        let u = units();
        let speed_kind = u.registry.compound(Operation::Div, &u.cm, &u.s).unwrap();
        let speed = UnitValue::new(&speed_kind, 5.0);
        let time = UnitValue::new(&u.min, 1.0);
        let product = (&speed * &time).unwrap();
        assert!(product.kind().is_compound());
        let reduced = product.reduce().unwrap();
        assert_eq!(reduced.kind(), &u.m);
        assert_abs_diff_eq!(scalar(&reduced), 3.0, epsilon = 1e-9);
    }

    // ─── Division ───────────────────────────────────────────────────────────

    #[test]
    fn div_builds_speed() {
        let u = units();
        let d = UnitValue::new(&u.m, 10.0);
        let t = UnitValue::new(&u.s, 2.0);
        let speed = (&d / &t).unwrap();
        assert_eq!(speed.to_string(), "5 (m/s)");
    }

    #[test]
    fn div_of_compatible_values_is_unitless_ratio() {
        let u = units();
        let a = UnitValue::new(&u.m, 1.0);
        let b = UnitValue::new(&u.cm, 50.0);
        let ratio = (&a / &b).unwrap();
        assert!(ratio.kind().is_unitless());
        assert_abs_diff_eq!(scalar(&ratio), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn scalar_over_value_is_reciprocal() {
        let u = units();
        let t = UnitValue::new(&u.s, 4.0);
        let freq = (2.0 / &t).unwrap();
        let unitless = u.registry.unitless().unwrap();
        assert_eq!(freq.kind(), &u.registry.div(&unitless, &u.s).unwrap());
        assert_abs_diff_eq!(scalar(&freq), 0.5);
    }

    #[test]
    fn div_simplifies_compound_numerator() {
        let u = units();
        let area_kind = u.registry.compound(Operation::Mul, &u.inch, &u.s).unwrap();
        let area = UnitValue::new(&area_kind, 10.0);
        let time = UnitValue::new(&u.s, 2.0);
        let result = (&area / &time).unwrap();
        assert_eq!(result.kind(), &u.inch);
        assert_abs_diff_eq!(scalar(&result), 5.0, epsilon = 1e-9);
    }

    // ─── Addition / subtraction ─────────────────────────────────────────────

    #[test]
    fn add_converts_into_left_kind() {
        let u = units();
        let a = UnitValue::new(&u.m, 1.0);
        let b = UnitValue::new(&u.cm, 50.0);
        let sum = (&a + &b).unwrap();
        assert_eq!(sum.kind(), &u.m);
        assert_abs_diff_eq!(scalar(&sum), 1.5, epsilon = 1e-12);
    }

    #[test]
    fn add_incompatible_fails() {
        let u = units();
        let a = UnitValue::new(&u.m, 1.0);
        let b = UnitValue::new(&u.s, 1.0);
        assert!(matches!(a + b, Err(KindError::IncompatibleKind { .. })));
    }

    #[test]
    fn add_unitless_adopts_other_kind() {
        let u = units();
        let a = UnitValue::new(&u.m, 1.0);
        let one = UnitValue::unitless(&u.registry, 1.0).unwrap();
        let sum = (&one + &a).unwrap();
        assert_eq!(sum.kind(), &u.m);
        assert_abs_diff_eq!(scalar(&sum), 2.0);
    }

    #[test]
    fn sub_and_neg() {
        let u = units();
        let a = UnitValue::new(&u.m, 1.0);
        let b = UnitValue::new(&u.cm, 25.0);
        let diff = (&a - &b).unwrap();
        assert_abs_diff_eq!(scalar(&diff), 0.75, epsilon = 1e-12);
        assert_abs_diff_eq!(scalar(&-&a), -1.0);
    }

    #[test]
    fn add_broadcasts_payloads() {
        let u = units();
        let a = UnitValue::new(&u.m, [1.0, 2.0, 3.0]);
        let b = UnitValue::new(&u.m, 1.0);
        let sum = (&a + &b).unwrap();
        assert_eq!(sum.payload().to_vec(), vec![2.0, 3.0, 4.0]);

        let c = UnitValue::new(&u.m, [1.0, 2.0]);
        assert!(matches!(&a + &c, Err(KindError::ShapeMismatch { .. })));
    }

    #[test]
    fn scalar_add_and_sub_take_value_kind() {
        let u = units();
        let three = UnitValue::new(&u.m, 3.0);

        let less = (&three - 1.0).unwrap();
        assert!(less.equals(&UnitValue::new(&u.m, 2.0)).unwrap());

        let flipped = (1.0 - &three).unwrap();
        assert!(flipped.equals(&UnitValue::new(&u.m, -2.0)).unwrap());

        let more = (three.clone() + 0.5).unwrap();
        assert_eq!(more.kind(), &u.m);
        assert_abs_diff_eq!(scalar(&more), 3.5);
        assert_abs_diff_eq!(scalar(&(2.0 + three).unwrap()), 5.0);
    }
}

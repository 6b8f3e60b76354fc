//! Numeric payload carried by unit values.
//!
//! A [`Payload`] is an n-dimensional `f64` array. Scalars are zero-dimensional
//! arrays, so `3.0`, `vec![1.0, 2.0]` and `[1.0, 2.0, 3.0]` all normalize to the
//! same representation at the boundary. Binary operations are element-wise
//! with NumPy-style broadcasting in either direction.

use std::fmt;

use ndarray::{arr0, Array1, ArrayD, IxDyn, Zip};

use crate::error::{KindError, KindResult};

/// Element-wise numeric storage for a [`crate::UnitValue`].
#[derive(Clone, Debug, PartialEq)]
pub struct Payload(ArrayD<f64>);

impl Payload {
    /// Wraps an existing array.
    pub fn new(array: ArrayD<f64>) -> Self {
        Self(array)
    }

    /// Zero-dimensional payload holding `value`.
    pub fn scalar(value: f64) -> Self {
        Self(arr0(value).into_dyn())
    }

    /// Returns the value if this payload holds exactly one element.
    pub fn as_scalar(&self) -> Option<f64> {
        if self.0.len() == 1 {
            self.0.iter().next().copied()
        } else {
            None
        }
    }

    /// Borrows the underlying array.
    pub fn as_array(&self) -> &ArrayD<f64> {
        &self.0
    }

    /// Consumes the payload, returning the underlying array.
    pub fn into_array(self) -> ArrayD<f64> {
        self.0
    }

    /// Shape of the underlying array (empty for scalars).
    pub fn shape(&self) -> &[usize] {
        self.0.shape()
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the payload holds no elements.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Elements in logical order.
    pub fn to_vec(&self) -> Vec<f64> {
        self.0.iter().copied().collect()
    }

    /// Applies `f` to every element.
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        Self(self.0.mapv(f))
    }

    /// Combines two payloads element-wise with NumPy broadcasting.
    ///
    /// Both operands are stretched to their common shape, so `(3, 1)` against
    /// `(1, 4)` yields `(3, 4)`.
    pub fn zip_with(&self, other: &Payload, f: impl Fn(f64, f64) -> f64) -> KindResult<Payload> {
        let mismatch = || KindError::ShapeMismatch {
            left: self.0.shape().to_vec(),
            right: other.0.shape().to_vec(),
        };
        let shape = co_broadcast(self.0.shape(), other.0.shape()).ok_or_else(mismatch)?;
        let lhs = self.0.broadcast(IxDyn(&shape)).ok_or_else(mismatch)?;
        let rhs = other.0.broadcast(IxDyn(&shape)).ok_or_else(mismatch)?;
        Ok(Self(Zip::from(lhs).and(rhs).map_collect(|&a, &b| f(a, b))))
    }

    /// Element-wise sum.
    pub fn add(&self, other: &Payload) -> KindResult<Payload> {
        self.zip_with(other, |a, b| a + b)
    }

    /// Element-wise difference.
    pub fn sub(&self, other: &Payload) -> KindResult<Payload> {
        self.zip_with(other, |a, b| a - b)
    }

    /// Element-wise product.
    pub fn mul(&self, other: &Payload) -> KindResult<Payload> {
        self.zip_with(other, |a, b| a * b)
    }

    /// Element-wise quotient.
    pub fn div(&self, other: &Payload) -> KindResult<Payload> {
        self.zip_with(other, |a, b| a / b)
    }

    /// Element-wise negation.
    pub fn neg(&self) -> Payload {
        self.map(|x| -x)
    }

    /// Exact element-wise equality; shapes must match.
    pub fn array_eq(&self, other: &Payload) -> bool {
        self.0 == other.0
    }

    /// Element-wise equality within `epsilon`; shapes must match.
    pub fn abs_diff_eq(&self, other: &Payload, epsilon: f64) -> bool {
        self.0.shape() == other.0.shape()
            && self
                .0
                .iter()
                .zip(other.0.iter())
                .all(|(a, b)| (a - b).abs() <= epsilon)
    }
}

/// Common shape of two operands: right-aligned, each axis equal or `1`.
fn co_broadcast(left: &[usize], right: &[usize]) -> Option<Vec<usize>> {
    let ndim = left.len().max(right.len());
    let axis = |shape: &[usize], i: usize| {
        let pad = ndim - shape.len();
        if i < pad {
            1
        } else {
            shape[i - pad]
        }
    };
    (0..ndim)
        .map(|i| match (axis(left, i), axis(right, i)) {
            (a, b) if a == b => Some(a),
            (1, b) => Some(b),
            (a, 1) => Some(a),
            _ => None,
        })
        .collect()
}

impl Default for Payload {
    fn default() -> Self {
        Self::scalar(0.0)
    }
}

impl From<f64> for Payload {
    fn from(value: f64) -> Self {
        Self::scalar(value)
    }
}

impl From<i32> for Payload {
    fn from(value: i32) -> Self {
        Self::scalar(f64::from(value))
    }
}

impl From<Vec<f64>> for Payload {
    fn from(values: Vec<f64>) -> Self {
        Self(Array1::from(values).into_dyn())
    }
}

impl From<&[f64]> for Payload {
    fn from(values: &[f64]) -> Self {
        Self::from(values.to_vec())
    }
}

impl<const N: usize> From<[f64; N]> for Payload {
    fn from(values: [f64; N]) -> Self {
        Self::from(values.to_vec())
    }
}

impl From<Array1<f64>> for Payload {
    fn from(array: Array1<f64>) -> Self {
        Self(array.into_dyn())
    }
}

impl From<ArrayD<f64>> for Payload {
    fn from(array: ArrayD<f64>) -> Self {
        Self(array)
    }
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.ndim() {
            0 => match self.0.first() {
                Some(value) => write!(f, "{}", value),
                None => write!(f, "[]"),
            },
            _ => write!(f, "{}", self.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;

    #[test]
    fn scalar_roundtrip() {
        let p = Payload::from(3.5);
        assert_eq!(p.shape(), &[] as &[usize]);
        assert_eq!(p.as_scalar(), Some(3.5));
    }

    #[test]
    fn literal_shapes_normalize() {
        let from_vec = Payload::from(vec![1.0, 2.0, 3.0]);
        let from_slice = Payload::from(&[1.0, 2.0, 3.0][..]);
        let from_array = Payload::from([1.0, 2.0, 3.0]);
        assert!(from_vec.array_eq(&from_slice));
        assert!(from_vec.array_eq(&from_array));
        assert_eq!(from_vec.as_scalar(), None);
    }

    #[test]
    fn scalar_broadcasts_over_array() {
        let arr = Payload::from([1.0, 2.0, 3.0]);
        let two = Payload::from(2.0);
        assert_eq!(arr.mul(&two).unwrap().to_vec(), vec![2.0, 4.0, 6.0]);
        assert_eq!(two.sub(&arr).unwrap().to_vec(), vec![1.0, 0.0, -1.0]);
    }

    #[test]
    fn mismatched_shapes_error() {
        let a = Payload::from([1.0, 2.0]);
        let b = Payload::from([1.0, 2.0, 3.0]);
        assert_eq!(
            a.add(&b),
            Err(KindError::ShapeMismatch {
                left: vec![2],
                right: vec![3]
            })
        );
    }

    #[test]
    fn column_and_row_broadcast_to_grid() {
        let column = Payload::new(ndarray::arr2(&[[1.0], [2.0], [3.0]]).into_dyn());
        let row = Payload::new(ndarray::arr2(&[[10.0, 20.0, 30.0, 40.0]]).into_dyn());

        let sum = column.add(&row).unwrap();
        assert_eq!(sum.shape(), &[3, 4]);
        assert_eq!(sum.to_vec()[..4], [11.0, 21.0, 31.0, 41.0]);
        assert_eq!(sum.to_vec()[8..], [13.0, 23.0, 33.0, 43.0]);

        let flipped = row.sub(&column).unwrap();
        assert_eq!(flipped.shape(), &[3, 4]);
        assert_eq!(flipped.to_vec()[4], 8.0);
    }

    #[test]
    fn broadcast_pads_leading_axes() {
        let grid = Payload::new(ndarray::Array2::<f64>::ones((2, 3)).into_dyn());
        let row = Payload::from([1.0, 2.0, 3.0]);
        let product = row.mul(&grid).unwrap();
        assert_eq!(product.shape(), &[2, 3]);
        assert_eq!(product.to_vec(), vec![1.0, 2.0, 3.0, 1.0, 2.0, 3.0]);

        let tall = Payload::new(ndarray::Array2::<f64>::ones((2, 2)).into_dyn());
        assert!(matches!(row.add(&tall), Err(KindError::ShapeMismatch { .. })));
    }

    #[test]
    fn array_eq_requires_same_shape() {
        let scalar = Payload::from(1.0);
        let single = Payload::from([1.0]);
        assert!(!scalar.array_eq(&single));
        assert!(scalar.abs_diff_eq(&Payload::from(1.0 + 1e-12), 1e-9));
    }

    #[test]
    fn display_scalar_and_array() {
        assert_eq!(Payload::from(42.0).to_string(), "42");
        let rendered = Payload::from([1.0, 2.0]).to_string();
        assert!(rendered.starts_with('[') && rendered.ends_with(']'));
    }

    proptest! {
        #[test]
        fn prop_add_then_sub_restores(a in -1e6..1e6f64, b in -1e6..1e6f64) {
            let pa = Payload::from(a);
            let pb = Payload::from(b);
            let back = pa.add(&pb).unwrap().sub(&pb).unwrap();
            prop_assert!((back.as_scalar().unwrap() - a).abs() < 1e-6);
        }
    }

    #[test]
    fn neg_flips_every_element() {
        let p = Payload::from([1.0, -2.0]).neg();
        assert_abs_diff_eq!(p.to_vec()[0], -1.0);
        assert_abs_diff_eq!(p.to_vec()[1], 2.0);
    }
}

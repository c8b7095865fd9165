// SPDX-FileCopyrightText: 2025 Matthew Milner <matterhorn103@proton.me>
// SPDX-License-Identifier: MIT

use std::{
    fmt,
    ops::{Add, Div, Mul, Neg, Range, Rem, Sub},
};

use ndarray::{s, Array1};
use serde::{Deserialize, Serialize};

use crate::{
    config,
    derivative::{BinaryOp, UnaryOp},
    dispatch::ArrayFunction,
    error::{Result, UncertaintyError},
    jacobian::{self, AutoDiff},
    numeric::UncertainNumeric,
    scalar::UScalar,
    uncertainty::Uncertainty,
};

/// A one-dimensional array of independent uncertain values.
///
/// Element `i` is the quantity `values[i] ± errors[i]`. Elementwise
/// operations use the same closed-form rules as [`UScalar`]; reductions and
/// other array functions are propagated through their Jacobian.
///
/// # Example
///
/// ```
/// # use auto_uncertainties::UVector;
/// #
/// let v = UVector::new(vec![0.0, 2.5, 5.0, 7.5, 10.0], vec![0.1; 5]).unwrap();
/// let total = v.sum().unwrap();
/// assert_eq!(total.value(), 25.0);
/// assert!((total.error() - 0.223607).abs() < 1e-6);
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(into = "RawVector", try_from = "RawVector")]
pub struct UVector {
    values: Array1<f64>,
    errors: Array1<f64>,
}

/// Serialized form of [`UVector`], validated on the way in.
#[derive(Serialize, Deserialize)]
struct RawVector {
    values: Vec<f64>,
    #[serde(default)]
    errors: Option<Vec<f64>>,
}

impl From<UVector> for RawVector {
    fn from(v: UVector) -> Self {
        Self {
            values: v.values.to_vec(),
            errors: Some(v.errors.to_vec()),
        }
    }
}

impl TryFrom<RawVector> for UVector {
    type Error = UncertaintyError;

    fn try_from(raw: RawVector) -> Result<Self> {
        match raw.errors {
            Some(errors) => Self::new(raw.values, errors),
            None => Ok(Self::exact(raw.values)),
        }
    }
}

impl UVector {
    /// Creates a `UVector` from nominal values and standard deviations.
    ///
    /// Fails with [`UncertaintyError::ShapeMismatch`] if the lengths differ
    /// and with [`UncertaintyError::NegativeStdDev`] if any error is
    /// negative.
    pub fn new(values: impl Into<Array1<f64>>, errors: impl Into<Array1<f64>>) -> Result<Self> {
        let values = values.into();
        let errors = errors.into();
        if values.len() != errors.len() {
            return Err(UncertaintyError::shape("errors", values.len(), errors.len()));
        }
        if let Some(&error) = errors.iter().find(|&&e| e < 0.0) {
            return Err(UncertaintyError::NegativeStdDev { error });
        }
        Ok(Self { values, errors })
    }

    /// Creates a `UVector` with no uncertainty.
    pub fn exact(values: impl Into<Array1<f64>>) -> Self {
        let values = values.into();
        let errors = Array1::zeros(values.len());
        Self { values, errors }
    }

    /// Only for errors that are non-negative by construction.
    pub(crate) fn from_parts(values: Array1<f64>, errors: Array1<f64>) -> Self {
        debug_assert_eq!(values.len(), errors.len());
        Self { values, errors }
    }

    /// Collects scalars into a vector.
    pub fn from_sequence(items: &[UScalar]) -> Self {
        items.iter().copied().collect()
    }

    pub fn values(&self) -> &Array1<f64> {
        &self.values
    }

    pub fn errors(&self) -> &Array1<f64> {
        &self.errors
    }

    /// Elementwise `error / |value|`.
    pub fn relative(&self) -> Array1<f64> {
        &self.errors / &self.values.mapv(f64::abs)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<UScalar> {
        let value = *self.values.get(index)?;
        let error = *self.errors.get(index)?;
        Some(UScalar::from_parts(value, error))
    }

    pub fn iter(&self) -> impl Iterator<Item = UScalar> + '_ {
        self.values
            .iter()
            .zip(self.errors.iter())
            .map(|(&value, &error)| UScalar::from_parts(value, error))
    }

    /// A copy of the elements in `range`.
    pub fn slice(&self, range: Range<usize>) -> Result<Self> {
        if range.start > range.end || range.end > self.len() {
            return Err(UncertaintyError::shape("slice", self.len(), range.end));
        }
        Ok(Self {
            values: self.values.slice(s![range.clone()]).to_owned(),
            errors: self.errors.slice(s![range]).to_owned(),
        })
    }

    /// A copy with element `index` replaced.
    pub fn with_element(&self, index: usize, item: UScalar) -> Result<Self> {
        if index >= self.len() {
            return Err(UncertaintyError::shape("index", self.len(), index));
        }
        let mut result = self.clone();
        result.values[index] = item.value();
        result.errors[index] = item.error();
        Ok(result)
    }

    pub fn to_vec(&self) -> Vec<UScalar> {
        self.iter().collect()
    }

    /// The nominal values as a plain array.
    ///
    /// This discards the uncertainty: it logs a warning, or fails with
    /// [`UncertaintyError::Downcast`] if [`config::downcast_error`] is on.
    pub fn to_array(&self) -> Result<Array1<f64>> {
        config::downcast("to_array", self.len(), || self.values.clone())
    }

    pub(crate) fn map(&self, f: impl FnMut(UScalar) -> UScalar) -> Self {
        self.iter().map(f).collect()
    }

    /// Applies a unary operation to every element.
    pub fn apply(&self, op: UnaryOp) -> Self {
        self.map(|x| x.apply(op))
    }

    /// Applies a binary operation elementwise.
    pub fn try_combine(&self, op: BinaryOp, rhs: &Self) -> Result<Self> {
        if self.len() != rhs.len() {
            return Err(UncertaintyError::shape(op.name(), self.len(), rhs.len()));
        }
        Ok(self.iter().zip(rhs.iter()).map(|(x, y)| x.combine(op, y)).collect())
    }

    /// Applies a binary operation between every element and `rhs`.
    pub fn combine_scalar(&self, op: BinaryOp, rhs: UScalar) -> Self {
        self.map(|x| x.combine(op, rhs))
    }

    /// Compares elements pairwise with `cmp`.
    pub fn compare<F>(&self, rhs: &Self, mut cmp: F) -> Result<Array1<bool>>
    where
        F: FnMut(&UScalar, &UScalar) -> bool,
    {
        if self.len() != rhs.len() {
            return Err(UncertaintyError::shape("comparison", self.len(), rhs.len()));
        }
        Ok(self.iter().zip(rhs.iter()).map(|(x, y)| cmp(&x, &y)).collect())
    }

    /// Elementwise `==`, honouring [`config::compare_with_error`].
    pub fn eq_elements(&self, rhs: &Self) -> Result<Array1<bool>> {
        self.compare(rhs, |x, y| x == y)
    }

    pub fn lt_elements(&self, rhs: &Self) -> Result<Array1<bool>> {
        self.compare(rhs, |x, y| x < y)
    }

    pub fn gt_elements(&self, rhs: &Self) -> Result<Array1<bool>> {
        self.compare(rhs, |x, y| x > y)
    }

    /// Limits the values to `[min, max]`. The errors are unchanged.
    pub fn clip(&self, min: f64, max: f64) -> Self {
        Self {
            values: self.values.mapv(|x| x.max(min).min(max)),
            errors: self.errors.clone(),
        }
    }

    /// The index at which `value` would be inserted to keep the nominal
    /// values sorted, to the left of any equal values.
    pub fn searchsorted(&self, value: f64) -> usize {
        let (mut lo, mut hi) = (0, self.len());
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if self.values[mid] < value {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        lo
    }

    fn reduce(&self, f: ArrayFunction, others: &[&UVector]) -> Result<UScalar> {
        let mut args = vec![self];
        args.extend_from_slice(others);
        match jacobian::propagate(&AutoDiff::default(), &f, &args)? {
            Uncertainty::Scalar(x) => Ok(x),
            Uncertainty::Vector(v) => Err(UncertaintyError::shape(f.as_str(), 1, v.len())),
        }
    }

    fn transform(&self, f: ArrayFunction) -> Result<UVector> {
        match jacobian::propagate(&AutoDiff::default(), &f, &[self])? {
            Uncertainty::Vector(v) => Ok(v),
            Uncertainty::Scalar(x) => Ok(Self::from_sequence(&[x])),
        }
    }

    pub fn sum(&self) -> Result<UScalar> {
        self.reduce(ArrayFunction::Sum, &[])
    }

    pub fn prod(&self) -> Result<UScalar> {
        self.reduce(ArrayFunction::Prod, &[])
    }

    pub fn mean(&self) -> Result<UScalar> {
        self.reduce(ArrayFunction::Mean, &[])
    }

    /// Population variance of the nominal values.
    pub fn var(&self) -> Result<UScalar> {
        self.reduce(ArrayFunction::Var, &[])
    }

    /// Population standard deviation of the nominal values.
    pub fn std(&self) -> Result<UScalar> {
        self.reduce(ArrayFunction::Std, &[])
    }

    /// Euclidean norm.
    pub fn norm(&self) -> Result<UScalar> {
        self.reduce(ArrayFunction::Norm, &[])
    }

    pub fn dot(&self, rhs: &UVector) -> Result<UScalar> {
        self.reduce(ArrayFunction::Dot, &[rhs])
    }

    /// The element with the largest nominal value.
    pub fn max(&self) -> Result<UScalar> {
        self.reduce(ArrayFunction::Max, &[])
    }

    /// The element with the smallest nominal value.
    pub fn min(&self) -> Result<UScalar> {
        self.reduce(ArrayFunction::Min, &[])
    }

    pub fn cumsum(&self) -> Result<UVector> {
        self.transform(ArrayFunction::CumSum)
    }

    /// Differences between consecutive elements.
    pub fn diff(&self) -> Result<UVector> {
        self.transform(ArrayFunction::Diff)
    }
}

impl FromIterator<UScalar> for UVector {
    fn from_iter<I: IntoIterator<Item = UScalar>>(iter: I) -> Self {
        let (values, errors): (Vec<f64>, Vec<f64>) =
            iter.into_iter().map(|x| (x.value(), x.error())).unzip();
        Self::from_parts(Array1::from(values), Array1::from(errors))
    }
}

impl UncertainNumeric for UVector {
    type Numeric = Array1<f64>;

    fn nominal(&self) -> Array1<f64> {
        self.values.clone()
    }

    fn std_dev(&self) -> Array1<f64> {
        self.errors.clone()
    }
}

impl fmt::Display for UVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, x) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{x}")?;
        }
        f.write_str("]")
    }
}

impl Neg for &UVector {
    type Output = UVector;

    fn neg(self) -> UVector {
        self.map(|x| -x)
    }
}

impl Neg for UVector {
    type Output = UVector;

    fn neg(self) -> UVector {
        -&self
    }
}

/// Elementwise operators.
///
/// # Panics
///
/// Operators between two vectors panic if the lengths differ, as `ndarray`
/// operators do. Use [`UVector::try_combine`] to get an error instead.
macro_rules! impl_vector_op {
    ($Trait:ident, $method:ident, $op:expr) => {
        impl $Trait<&UVector> for &UVector {
            type Output = UVector;

            fn $method(self, rhs: &UVector) -> UVector {
                self.try_combine($op, rhs).unwrap_or_else(|e| panic!("{e}"))
            }
        }

        impl $Trait for UVector {
            type Output = UVector;

            fn $method(self, rhs: UVector) -> UVector {
                (&self).$method(&rhs)
            }
        }

        impl $Trait<UScalar> for &UVector {
            type Output = UVector;

            fn $method(self, rhs: UScalar) -> UVector {
                self.combine_scalar($op, rhs)
            }
        }

        impl $Trait<UScalar> for UVector {
            type Output = UVector;

            fn $method(self, rhs: UScalar) -> UVector {
                self.combine_scalar($op, rhs)
            }
        }

        impl $Trait<f64> for &UVector {
            type Output = UVector;

            fn $method(self, rhs: f64) -> UVector {
                self.combine_scalar($op, UScalar::exact(rhs))
            }
        }

        impl $Trait<f64> for UVector {
            type Output = UVector;

            fn $method(self, rhs: f64) -> UVector {
                self.combine_scalar($op, UScalar::exact(rhs))
            }
        }

        impl $Trait<&UVector> for UScalar {
            type Output = UVector;

            fn $method(self, rhs: &UVector) -> UVector {
                rhs.map(|y| self.combine($op, y))
            }
        }

        impl $Trait<UVector> for UScalar {
            type Output = UVector;

            fn $method(self, rhs: UVector) -> UVector {
                self.$method(&rhs)
            }
        }

        impl $Trait<&UVector> for f64 {
            type Output = UVector;

            fn $method(self, rhs: &UVector) -> UVector {
                UScalar::exact(self).$method(rhs)
            }
        }

        impl $Trait<UVector> for f64 {
            type Output = UVector;

            fn $method(self, rhs: UVector) -> UVector {
                UScalar::exact(self).$method(&rhs)
            }
        }
    };
}

impl_vector_op!(Add, add, BinaryOp::Add);
impl_vector_op!(Sub, sub, BinaryOp::Sub);
impl_vector_op!(Mul, mul, BinaryOp::Mul);
impl_vector_op!(Div, div, BinaryOp::Div);
impl_vector_op!(Rem, rem, BinaryOp::Rem);

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn v(values: &[f64], errors: &[f64]) -> UVector {
        UVector::new(values.to_vec(), errors.to_vec()).unwrap()
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-10,
            "actual={actual}, expected={expected}"
        );
    }

    #[test]
    fn new_validates() {
        assert_eq!(
            UVector::new(vec![1.0, 2.0], vec![0.1]).unwrap_err(),
            UncertaintyError::shape("errors", 2, 1)
        );
        assert_eq!(
            UVector::new(vec![1.0, 2.0], vec![0.1, -0.2]).unwrap_err(),
            UncertaintyError::NegativeStdDev { error: -0.2 }
        );
    }

    #[test]
    fn sequence_access() {
        let x = v(&[1.0, 2.0, 3.0], &[0.1, 0.2, 0.3]);
        assert_eq!(x.len(), 3);
        assert!(!x.is_empty());
        assert_eq!(x.get(1).unwrap().error(), 0.2);
        assert!(x.get(3).is_none());
        let middle = x.slice(1..3).unwrap();
        assert_eq!(middle.values(), &array![2.0, 3.0]);
        assert_eq!(middle.errors(), &array![0.2, 0.3]);
        assert!(x.slice(2..4).is_err());
        let items = x.to_vec();
        assert_eq!(items.len(), 3);
        assert_eq!(UVector::from_sequence(&items).errors(), x.errors());
    }

    #[test]
    fn with_element_returns_a_copy() {
        let x = v(&[1.0, 2.0], &[0.1, 0.2]);
        let y = x.with_element(0, UScalar::new(5.0, 0.5).unwrap()).unwrap();
        assert_eq!(y.values(), &array![5.0, 2.0]);
        assert_eq!(y.errors(), &array![0.5, 0.2]);
        assert_eq!(x.values(), &array![1.0, 2.0]);
        assert!(x.with_element(2, UScalar::ONE).is_err());
    }

    #[test]
    fn elementwise_function() {
        let x = v(&[0.0, 1.0], &[0.1, 0.2]);
        let y = x.apply(UnaryOp::Exp);
        assert_eq!(y.values(), &array![1.0, std::f64::consts::E]);
        assert_close(y.errors()[0], 0.1);
        assert_close(y.errors()[1], std::f64::consts::E * 0.2);
    }

    #[test]
    fn elementwise_arithmetic() {
        let a = v(&[10.0, 1.0], &[3.0, 0.1]);
        let b = v(&[20.0, 2.0], &[4.0, 0.0]);
        let sum = &a + &b;
        assert_eq!(sum.values(), &array![30.0, 3.0]);
        assert_eq!(sum.errors()[0], 5.0);
        assert_close(sum.errors()[1], 0.1);
        let scaled = 2.0 * &a;
        assert_eq!(scaled.errors(), &array![6.0, 0.2]);
        let shifted = a.clone() - 1.0;
        assert_eq!(shifted.values(), &array![9.0, 0.0]);
        assert_eq!((-a).values(), &array![-10.0, -1.0]);
    }

    #[test]
    fn try_combine_checks_length() {
        let a = v(&[1.0, 2.0], &[0.1, 0.1]);
        let b = v(&[1.0], &[0.1]);
        assert!(matches!(
            a.try_combine(BinaryOp::Add, &b),
            Err(UncertaintyError::ShapeMismatch { .. })
        ));
    }

    #[test]
    #[should_panic(expected = "shape mismatch")]
    fn operator_panics_on_length_mismatch() {
        let _ = v(&[1.0, 2.0], &[0.1, 0.1]) * v(&[1.0], &[0.1]);
    }

    #[test]
    fn reductions() {
        let x = v(&[1.0, 2.0, 3.0], &[0.1, 0.2, 0.2]);
        let total = x.sum().unwrap();
        assert_eq!(total.value(), 6.0);
        assert_close(total.error(), 0.3);
        let mean = x.mean().unwrap();
        assert_close(mean.value(), 2.0);
        assert_close(mean.error(), 0.1);
        let prod = x.prod().unwrap();
        assert_eq!(prod.value(), 6.0);
        assert_close(prod.error(), (0.36_f64 + 0.36 + 0.16).sqrt());
        assert_eq!(x.max().unwrap().error(), 0.2);
        assert_eq!(x.min().unwrap().value(), 1.0);
    }

    #[test]
    fn norm_and_dot() {
        let x = v(&[3.0, 4.0], &[0.5, 0.0]);
        let norm = x.norm().unwrap();
        assert_eq!(norm.value(), 5.0);
        assert_close(norm.error(), 0.3);
        let y = UVector::exact(vec![1.0, 2.0]);
        let dot = x.dot(&y).unwrap();
        assert_eq!(dot.value(), 11.0);
        assert_close(dot.error(), 0.5);
        assert!(x.dot(&UVector::exact(vec![1.0])).is_err());
    }

    #[test]
    fn variance() {
        let x = v(&[1.0, 3.0], &[0.1, 0.1]);
        let var = x.var().unwrap();
        assert_eq!(var.value(), 1.0);
        // ∂var/∂xᵢ = (xᵢ - mean) for two elements
        assert_close(var.error(), 0.02_f64.sqrt());
        assert_close(x.std().unwrap().value(), 1.0);
    }

    #[test]
    fn vector_valued_functions() {
        let x = v(&[1.0, 4.0, 9.0], &[0.1, 0.1, 0.1]);
        let diff = x.diff().unwrap();
        assert_eq!(diff.values(), &array![3.0, 5.0]);
        assert_close(diff.errors()[0], 0.02_f64.sqrt());
        let cumsum = x.cumsum().unwrap();
        assert_eq!(cumsum.values(), &array![1.0, 5.0, 14.0]);
        assert_close(cumsum.errors()[2], 0.03_f64.sqrt());
    }

    #[test]
    fn comparisons_use_nominal_values() {
        let a = v(&[1.0, 2.0, 3.0], &[0.5, 0.5, 0.5]);
        let b = v(&[1.0, 1.0, 4.0], &[0.0, 0.0, 0.0]);
        assert_eq!(a.eq_elements(&b).unwrap(), array![true, false, false]);
        assert_eq!(a.lt_elements(&b).unwrap(), array![false, false, true]);
        assert_eq!(a.gt_elements(&b).unwrap(), array![false, true, false]);
        assert!(a.eq_elements(&UVector::exact(vec![1.0])).is_err());
    }

    #[test]
    fn clip_keeps_errors() {
        let x = v(&[-2.0, 0.5, 7.0], &[0.1, 0.2, 0.3]).clip(0.0, 1.0);
        assert_eq!(x.values(), &array![0.0, 0.5, 1.0]);
        assert_eq!(x.errors(), &array![0.1, 0.2, 0.3]);
    }

    #[test]
    fn searchsorted() {
        let x = UVector::exact(vec![1.0, 2.0, 2.0, 5.0]);
        assert_eq!(x.searchsorted(0.0), 0);
        assert_eq!(x.searchsorted(2.0), 1);
        assert_eq!(x.searchsorted(3.0), 3);
        assert_eq!(x.searchsorted(9.0), 4);
    }

    #[test]
    fn relative() {
        let x = v(&[10.0, -4.0], &[1.0, 1.0]);
        assert_eq!(x.relative(), array![0.1, 0.25]);
    }

    #[test]
    fn display() {
        let x = v(&[1.0, 2.5], &[0.1, 0.2]);
        assert_eq!(x.to_string(), "[1 +/- 0.1, 2.5 +/- 0.2]");
        assert_eq!(UVector::exact(Vec::<f64>::new()).to_string(), "[]");
    }

    #[test]
    fn uncertain_numeric() {
        let x = v(&[1.0, 2.0], &[0.1, 0.2]);
        assert_eq!(x.nominal(), array![1.0, 2.0]);
        assert_eq!(x.std_dev(), array![0.1, 0.2]);
    }

    #[test]
    fn serde_validates() {
        let x: UVector = serde_json::from_str(r#"{"values": [1.0, 2.0], "errors": [0.1, 0.2]}"#).unwrap();
        assert_eq!(x.errors(), &array![0.1, 0.2]);
        let exact: UVector = serde_json::from_str(r#"{"values": [1.0]}"#).unwrap();
        assert_eq!(exact.errors(), &array![0.0]);
        assert!(serde_json::from_str::<UVector>(r#"{"values": [1.0], "errors": []}"#).is_err());
        assert_eq!(
            serde_json::to_string(&x).unwrap(),
            r#"{"values":[1.0,2.0],"errors":[0.1,0.2]}"#
        );
    }
}

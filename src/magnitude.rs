// SPDX-FileCopyrightText: 2025 Matthew Milner <matterhorn103@proton.me>
// SPDX-License-Identifier: MIT

use ndarray::Array1;

use crate::numeric::UncertainNumeric;

/// A plain number or a plain array of numbers, with no uncertainty.
///
/// Used as the input for constructing uncertain quantities and as the
/// output of operations that return plain values.
#[derive(Clone, Debug, PartialEq)]
pub enum Magnitude {
    Scalar(f64),
    Array(Array1<f64>),
}

impl Magnitude {
    /// The number of elements, or `None` for a scalar.
    pub fn len(&self) -> Option<usize> {
        match self {
            Self::Scalar(_) => None,
            Self::Array(a) => Some(a.len()),
        }
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self, Self::Scalar(_))
    }

    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            Self::Scalar(x) => Some(*x),
            Self::Array(_) => None,
        }
    }

    pub fn as_array(&self) -> Option<&Array1<f64>> {
        match self {
            Self::Scalar(_) => None,
            Self::Array(a) => Some(a),
        }
    }

    /// Expands to an array of length `len`, repeating a scalar.
    pub(crate) fn broadcast(&self, len: usize) -> Option<Array1<f64>> {
        match self {
            Self::Scalar(x) => Some(Array1::from_elem(len, *x)),
            Self::Array(a) if a.len() == len => Some(a.clone()),
            Self::Array(_) => None,
        }
    }
}

impl From<f64> for Magnitude {
    fn from(x: f64) -> Self {
        Self::Scalar(x)
    }
}

impl From<Array1<f64>> for Magnitude {
    fn from(a: Array1<f64>) -> Self {
        Self::Array(a)
    }
}

impl From<Vec<f64>> for Magnitude {
    fn from(v: Vec<f64>) -> Self {
        Self::Array(Array1::from(v))
    }
}

impl From<&[f64]> for Magnitude {
    fn from(s: &[f64]) -> Self {
        Self::Array(Array1::from(s.to_vec()))
    }
}

impl<const N: usize> From<[f64; N]> for Magnitude {
    fn from(a: [f64; N]) -> Self {
        Self::Array(Array1::from(a.to_vec()))
    }
}

impl UncertainNumeric for Magnitude {
    type Numeric = Magnitude;

    fn nominal(&self) -> Magnitude {
        self.clone()
    }

    fn std_dev(&self) -> Magnitude {
        match self {
            Self::Scalar(_) => Self::Scalar(0.0),
            Self::Array(a) => Self::Array(Array1::zeros(a.len())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn conversions() {
        assert_eq!(Magnitude::from(1.5), Magnitude::Scalar(1.5));
        assert_eq!(Magnitude::from(vec![1.0, 2.0]), Magnitude::Array(array![1.0, 2.0]));
        assert_eq!(Magnitude::from([1.0, 2.0]), Magnitude::Array(array![1.0, 2.0]));
        let slice: &[f64] = &[3.0];
        assert_eq!(Magnitude::from(slice).len(), Some(1));
    }

    #[test]
    fn broadcast_scalar() {
        assert_eq!(Magnitude::Scalar(0.1).broadcast(3), Some(array![0.1, 0.1, 0.1]));
    }

    #[test]
    fn broadcast_array_needs_matching_length() {
        let m = Magnitude::from(vec![1.0, 2.0]);
        assert_eq!(m.broadcast(2), Some(array![1.0, 2.0]));
        assert_eq!(m.broadcast(3), None);
    }

    #[test]
    fn plain_values_have_zero_std_dev() {
        assert_eq!(Magnitude::Scalar(4.0).std_dev(), Magnitude::Scalar(0.0));
        assert_eq!(
            Magnitude::from(vec![1.0, 2.0]).std_dev(),
            Magnitude::Array(array![0.0, 0.0])
        );
    }
}

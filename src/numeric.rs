// SPDX-FileCopyrightText: 2025 Matthew Milner <matterhorn103@proton.me>
// SPDX-License-Identifier: MIT

use ndarray::Array1;

/// A trait for numeric types that have an associated uncertainty.
///
/// Plain numbers implement it too, with an uncertainty of zero, so that
/// reductions over a mix of certain and uncertain inputs can treat every
/// input the same way.
pub trait UncertainNumeric {
    /// The type that is returned by accessing the value or uncertainty.
    type Numeric;

    /// Returns the nominal value without its uncertainty.
    fn nominal(&self) -> Self::Numeric;

    /// Returns the standard deviation.
    ///
    /// The standard deviation is never negative.
    fn std_dev(&self) -> Self::Numeric;
}

impl UncertainNumeric for f64 {
    type Numeric = f64;

    #[inline]
    fn nominal(&self) -> f64 {
        *self
    }

    #[inline]
    fn std_dev(&self) -> f64 {
        0.0
    }
}

impl UncertainNumeric for Array1<f64> {
    type Numeric = Array1<f64>;

    fn nominal(&self) -> Array1<f64> {
        self.clone()
    }

    fn std_dev(&self) -> Array1<f64> {
        Array1::zeros(self.len())
    }
}

impl UncertainNumeric for Vec<f64> {
    type Numeric = Array1<f64>;

    fn nominal(&self) -> Array1<f64> {
        Array1::from(self.clone())
    }

    fn std_dev(&self) -> Array1<f64> {
        Array1::zeros(self.len())
    }
}

/// Returns the nominal value(s) of any value, uncertain or not.
#[inline]
pub fn nominal_values<T: UncertainNumeric>(x: &T) -> T::Numeric {
    x.nominal()
}

/// Returns the standard deviation(s) of any value; zero for plain numbers.
#[inline]
pub fn std_devs<T: UncertainNumeric>(x: &T) -> T::Numeric {
    x.std_dev()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn plain_float() {
        assert_eq!(nominal_values(&2.5), 2.5);
        assert_eq!(std_devs(&2.5), 0.0);
    }

    #[test]
    fn plain_array() {
        let a = array![1.0, 2.0, 3.0];
        assert_eq!(nominal_values(&a), a);
        assert_eq!(std_devs(&a), array![0.0, 0.0, 0.0]);
    }

    #[test]
    fn plain_vec() {
        let v = vec![4.0, 5.0];
        assert_eq!(nominal_values(&v), array![4.0, 5.0]);
        assert_eq!(std_devs(&v), array![0.0, 0.0]);
    }
}

// SPDX-FileCopyrightText: 2025 Matthew Milner <matterhorn103@proton.me>
// SPDX-License-Identifier: MIT

use std::{
    fmt,
    ops::{Add, Div, Mul, Neg, Rem, Sub},
};

use crate::{
    derivative::{BinaryOp, UnaryOp},
    dispatch::{self, Arg, Dispatched},
    error::{Result, UncertaintyError},
    magnitude::Magnitude,
    numeric::UncertainNumeric,
    scalar::UScalar,
    vector::UVector,
};

/// An uncertain scalar or an uncertain vector.
///
/// Which of the two is decided at construction, from the shape of the
/// value, and never changes afterwards. Scalars propagate through the
/// derivative table only; vectors also support array functions by
/// automatic differentiation.
///
/// # Example
///
/// ```
/// # use auto_uncertainties::{Magnitude, Uncertainty};
/// #
/// let x = Uncertainty::new(vec![1.0, 2.0, 3.0], 0.1).unwrap();
/// assert_eq!(x.error(), Magnitude::from(vec![0.1, 0.1, 0.1]));
///
/// let y = Uncertainty::new(10.0, 3.0).unwrap() + Uncertainty::new(20.0, 4.0).unwrap();
/// assert_eq!(y.to_string(), "30 +/- 5");
/// ```
#[derive(Clone, Debug)]
pub enum Uncertainty {
    Scalar(UScalar),
    Vector(UVector),
}

impl Uncertainty {
    /// Creates an uncertain quantity. A scalar `error` is broadcast over an
    /// array `value`.
    ///
    /// Fails with [`UncertaintyError::ShapeMismatch`] if `error` is an array
    /// of a different length than `value`, or an array while `value` is a
    /// scalar.
    pub fn new(value: impl Into<Magnitude>, error: impl Into<Magnitude>) -> Result<Self> {
        match (value.into(), error.into()) {
            (Magnitude::Scalar(value), Magnitude::Scalar(error)) => {
                UScalar::new(value, error).map(Self::Scalar)
            }
            (Magnitude::Scalar(_), Magnitude::Array(errors)) => Err(UncertaintyError::shape(
                "error of a scalar value",
                0,
                errors.len(),
            )),
            (Magnitude::Array(values), error) => {
                let errors = error.broadcast(values.len()).ok_or_else(|| {
                    UncertaintyError::shape("error", values.len(), error.len().unwrap_or(1))
                })?;
                UVector::new(values, errors).map(Self::Vector)
            }
        }
    }

    /// Creates an uncertain quantity with zero error.
    pub fn exact(value: impl Into<Magnitude>) -> Self {
        match value.into() {
            Magnitude::Scalar(x) => Self::Scalar(UScalar::exact(x)),
            Magnitude::Array(a) => Self::Vector(UVector::exact(a)),
        }
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self, Self::Scalar(_))
    }

    pub fn as_scalar(&self) -> Option<UScalar> {
        match self {
            Self::Scalar(x) => Some(*x),
            Self::Vector(_) => None,
        }
    }

    pub fn as_vector(&self) -> Option<&UVector> {
        match self {
            Self::Scalar(_) => None,
            Self::Vector(v) => Some(v),
        }
    }

    /// The number of elements, or `None` for a scalar.
    pub fn len(&self) -> Option<usize> {
        self.as_vector().map(UVector::len)
    }

    pub fn value(&self) -> Magnitude {
        match self {
            Self::Scalar(x) => x.value().into(),
            Self::Vector(v) => v.values().clone().into(),
        }
    }

    pub fn error(&self) -> Magnitude {
        match self {
            Self::Scalar(x) => x.error().into(),
            Self::Vector(v) => v.errors().clone().into(),
        }
    }

    pub fn relative(&self) -> Magnitude {
        match self {
            Self::Scalar(x) => x.relative().into(),
            Self::Vector(v) => v.relative().into(),
        }
    }

    pub fn apply(&self, op: UnaryOp) -> Self {
        match self {
            Self::Scalar(x) => Self::Scalar(x.apply(op)),
            Self::Vector(v) => Self::Vector(v.apply(op)),
        }
    }

    /// Applies a binary operation, broadcasting a scalar against a vector.
    pub fn combine(&self, op: BinaryOp, rhs: &Self) -> Result<Self> {
        let result = match (self, rhs) {
            (Self::Scalar(x), Self::Scalar(y)) => Self::Scalar(x.combine(op, *y)),
            (Self::Vector(v), Self::Scalar(y)) => Self::Vector(v.combine_scalar(op, *y)),
            (Self::Scalar(x), Self::Vector(w)) => Self::Vector(w.map(|y| x.combine(op, y))),
            (Self::Vector(v), Self::Vector(w)) => Self::Vector(v.try_combine(op, w)?),
        };
        Ok(result)
    }

    /// Calls the function `name` through [`dispatch::dispatch`].
    pub fn call(&self, name: &str) -> Result<Dispatched> {
        dispatch::dispatch(name, &[Arg::from(self)])
    }

    /// Calls the two-argument function `name` with `self` first.
    pub fn call_with(&self, name: &str, rhs: &Self) -> Result<Dispatched> {
        dispatch::dispatch(name, &[Arg::from(self), Arg::from(rhs)])
    }

    /// The nominal value(s) as a plain number or array.
    ///
    /// A scalar simply drops its error. A vector goes through
    /// [`UVector::to_array`] and so follows the downcast policy.
    pub fn to_plain(&self) -> Result<Magnitude> {
        match self {
            Self::Scalar(x) => Ok(Magnitude::Scalar(x.to_f64())),
            Self::Vector(v) => v.to_array().map(Magnitude::Array),
        }
    }
}

impl From<UScalar> for Uncertainty {
    fn from(x: UScalar) -> Self {
        Self::Scalar(x)
    }
}

impl From<UVector> for Uncertainty {
    fn from(v: UVector) -> Self {
        Self::Vector(v)
    }
}

impl UncertainNumeric for Uncertainty {
    type Numeric = Magnitude;

    fn nominal(&self) -> Magnitude {
        self.value()
    }

    fn std_dev(&self) -> Magnitude {
        self.error()
    }
}

impl fmt::Display for Uncertainty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(x) => fmt::Display::fmt(x, f),
            Self::Vector(v) => fmt::Display::fmt(v, f),
        }
    }
}

impl Neg for &Uncertainty {
    type Output = Uncertainty;

    fn neg(self) -> Uncertainty {
        self.apply(UnaryOp::Neg)
    }
}

impl Neg for Uncertainty {
    type Output = Uncertainty;

    fn neg(self) -> Uncertainty {
        -&self
    }
}

/// # Panics
///
/// Panics if two vectors have different lengths; use
/// [`Uncertainty::combine`] to get an error instead.
macro_rules! impl_uncertainty_op {
    ($Trait:ident, $method:ident, $op:expr) => {
        impl $Trait<&Uncertainty> for &Uncertainty {
            type Output = Uncertainty;

            fn $method(self, rhs: &Uncertainty) -> Uncertainty {
                self.combine($op, rhs).unwrap_or_else(|e| panic!("{e}"))
            }
        }

        impl $Trait for Uncertainty {
            type Output = Uncertainty;

            fn $method(self, rhs: Uncertainty) -> Uncertainty {
                (&self).$method(&rhs)
            }
        }

        impl $Trait<f64> for &Uncertainty {
            type Output = Uncertainty;

            fn $method(self, rhs: f64) -> Uncertainty {
                self.$method(&Uncertainty::exact(rhs))
            }
        }

        impl $Trait<f64> for Uncertainty {
            type Output = Uncertainty;

            fn $method(self, rhs: f64) -> Uncertainty {
                (&self).$method(&Uncertainty::exact(rhs))
            }
        }

        impl $Trait<Uncertainty> for f64 {
            type Output = Uncertainty;

            fn $method(self, rhs: Uncertainty) -> Uncertainty {
                (&Uncertainty::exact(self)).$method(&rhs)
            }
        }
    };
}

impl_uncertainty_op!(Add, add, BinaryOp::Add);
impl_uncertainty_op!(Sub, sub, BinaryOp::Sub);
impl_uncertainty_op!(Mul, mul, BinaryOp::Mul);
impl_uncertainty_op!(Div, div, BinaryOp::Div);
impl_uncertainty_op!(Rem, rem, BinaryOp::Rem);

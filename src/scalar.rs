// SPDX-FileCopyrightText: 2025 Matthew Milner <matterhorn103@proton.me>
// SPDX-License-Identifier: MIT

use std::{
    cmp::Ordering,
    fmt,
    iter::{Product, Sum},
    ops::{Add, Div, Mul, Neg, Rem, Sub},
    str::FromStr,
    sync::LazyLock,
};

use num_traits::{Inv, Num, One, Pow, Zero};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{
    config,
    derivative::{BinaryOp, Operation, UnaryOp},
    error::{Result, UncertaintyError},
    format,
    numeric::UncertainNumeric,
};

/// A real number with an associated standard deviation.
///
/// Represents a normally distributed quantity _x_ ± _σ_. Every instance is
/// treated as independent of every other instance, even one constructed
/// from the same parameters, so `a - b` for two separately created but
/// identical values has a non-zero error.
///
/// # Example
///
/// ```
/// # use auto_uncertainties::UScalar;
/// #
/// let a = UScalar::new(10.0, 3.0).unwrap();
/// let b = UScalar::new(20.0, 4.0).unwrap();
/// let c = a + b;
/// assert_eq!(c.value(), 30.0);
/// assert_eq!(c.error(), 5.0);
/// ```
#[derive(Copy, Clone, Debug, Serialize, Deserialize)]
#[serde(try_from = "RawScalar")]
pub struct UScalar {
    value: f64,
    error: f64,
}

/// Unvalidated serialized form of [`UScalar`].
#[derive(Deserialize)]
struct RawScalar {
    value: f64,
    #[serde(default)]
    error: f64,
}

impl TryFrom<RawScalar> for UScalar {
    type Error = UncertaintyError;

    fn try_from(raw: RawScalar) -> Result<Self> {
        Self::new(raw.value, raw.error)
    }
}

impl UScalar {
    /// A constant representing 0 ± 0.
    pub const ZERO: UScalar = UScalar {
        value: 0.0,
        error: 0.0,
    };

    /// A constant representing 1 ± 0.
    pub const ONE: UScalar = UScalar {
        value: 1.0,
        error: 0.0,
    };

    /// Creates a `UScalar` from a nominal value and a standard deviation.
    ///
    /// Fails with [`UncertaintyError::NegativeStdDev`] if `error` is
    /// negative.
    ///
    /// # Example
    ///
    /// ```
    /// # use auto_uncertainties::UScalar;
    /// #
    /// let n = UScalar::new(0.251, 0.003).unwrap();
    /// assert_eq!(n.to_string(), "0.251 +/- 0.003");
    /// assert!(UScalar::new(1.0, -0.1).is_err());
    /// ```
    pub fn new(value: f64, error: f64) -> Result<Self> {
        if error < 0.0 {
            return Err(UncertaintyError::NegativeStdDev { error });
        }
        Ok(Self { value, error })
    }

    /// Creates a `UScalar` with no uncertainty.
    #[inline]
    pub const fn exact(value: f64) -> Self {
        Self { value, error: 0.0 }
    }

    /// Only for errors that are non-negative by construction.
    #[inline]
    pub(crate) const fn from_parts(value: f64, error: f64) -> Self {
        Self { value, error }
    }

    /// Returns the nominal value.
    #[inline]
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Returns the standard deviation.
    #[inline]
    pub fn error(&self) -> f64 {
        self.error
    }

    /// Returns the relative uncertainty, `error / |value|`.
    ///
    /// This is infinite for a zero value with non-zero error, and NaN for
    /// an exact zero.
    #[inline]
    pub fn relative(&self) -> f64 {
        self.error / self.value.abs()
    }

    /// Returns true if the `UScalar` has an uncertainty of zero.
    #[inline]
    pub fn is_exact(&self) -> bool {
        self.error == 0.0
    }

    /// Returns the nominal value, dropping the uncertainty.
    #[inline]
    pub fn to_f64(self) -> f64 {
        self.value
    }

    /// Applies a unary operation from the derivative table.
    pub fn apply(self, op: UnaryOp) -> Self {
        let value = op.eval(self.value);
        let error = linear_error([(op.derivative(self.value), self.error)]);
        Self::from_parts(value, error)
    }

    /// Applies a binary operation from the derivative table, treating
    /// `self` and `rhs` as independent.
    pub fn combine(self, op: BinaryOp, rhs: Self) -> Self {
        let value = op.eval(self.value, rhs.value);
        let (dx, dy) = op.partials(self.value, rhs.value);
        let error = linear_error([(dx, self.error), (dy, rhs.error)]);
        Self::from_parts(value, error)
    }

    /// Applies the unary operation called `name`.
    ///
    /// Fails with [`UncertaintyError::UnsupportedOperation`] for names not in
    /// the derivative table; there is no automatic differentiation fallback
    /// for scalars.
    pub fn call(self, name: &str) -> Result<Self> {
        propagate(Operation::lookup(name, 1)?, &[self])
    }

    /// Applies the binary operation called `name` with `self` on the left.
    pub fn call_with(self, name: &str, rhs: Self) -> Result<Self> {
        propagate(Operation::lookup(name, 2)?, &[self, rhs])
    }

    /// Returns the absolute value. The error is unchanged.
    pub fn abs(self) -> Self {
        self.apply(UnaryOp::Abs)
    }

    /// Rounds the nominal value to `ndigits` decimal places. The error is
    /// unchanged.
    pub fn round(self, ndigits: i32) -> Self {
        let factor = 10_f64.powi(ndigits);
        Self::from_parts((self.value * factor).round() / factor, self.error)
    }

    #[inline]
    pub fn recip(self) -> Self {
        self.apply(UnaryOp::Recip)
    }

    #[inline]
    pub fn sqrt(self) -> Self {
        self.apply(UnaryOp::Sqrt)
    }

    #[inline]
    pub fn exp(self) -> Self {
        self.apply(UnaryOp::Exp)
    }

    #[inline]
    pub fn ln(self) -> Self {
        self.apply(UnaryOp::Ln)
    }

    #[inline]
    pub fn log2(self) -> Self {
        self.apply(UnaryOp::Log2)
    }

    #[inline]
    pub fn log10(self) -> Self {
        self.apply(UnaryOp::Log10)
    }

    #[inline]
    pub fn sin(self) -> Self {
        self.apply(UnaryOp::Sin)
    }

    #[inline]
    pub fn cos(self) -> Self {
        self.apply(UnaryOp::Cos)
    }

    #[inline]
    pub fn tan(self) -> Self {
        self.apply(UnaryOp::Tan)
    }

    #[inline]
    pub fn asin(self) -> Self {
        self.apply(UnaryOp::Asin)
    }

    #[inline]
    pub fn acos(self) -> Self {
        self.apply(UnaryOp::Acos)
    }

    #[inline]
    pub fn atan(self) -> Self {
        self.apply(UnaryOp::Atan)
    }

    #[inline]
    pub fn sinh(self) -> Self {
        self.apply(UnaryOp::Sinh)
    }

    #[inline]
    pub fn cosh(self) -> Self {
        self.apply(UnaryOp::Cosh)
    }

    #[inline]
    pub fn tanh(self) -> Self {
        self.apply(UnaryOp::Tanh)
    }

    #[inline]
    pub fn powi(self, n: i32) -> Self {
        self.combine(BinaryOp::Pow, Self::exact(n.into()))
    }

    #[inline]
    pub fn powf(self, n: f64) -> Self {
        self.combine(BinaryOp::Pow, Self::exact(n))
    }

    #[inline]
    pub fn atan2(self, other: Self) -> Self {
        self.combine(BinaryOp::Atan2, other)
    }

    #[inline]
    pub fn hypot(self, other: Self) -> Self {
        self.combine(BinaryOp::Hypot, other)
    }

    /// Returns true if the values lie within their combined standard
    /// deviation of each other.
    pub fn overlaps(&self, other: &Self) -> bool {
        (self.value - other.value).abs() <= self.error.hypot(other.error)
    }
}

/// Combines first-order terms `(∂f/∂xᵢ, σᵢ)` into a standard deviation:
/// `sqrt(Σ (∂f/∂xᵢ · σᵢ)²)`.
///
/// Exact operands (σᵢ = 0) contribute nothing, even where their partial
/// derivative is infinite or NaN. Any other non-finite partial carries
/// through to the result.
pub fn linear_error<I>(terms: I) -> f64
where
    I: IntoIterator<Item = (f64, f64)>,
{
    terms
        .into_iter()
        .filter(|&(_, error)| error != 0.0)
        .map(|(partial, error)| {
            let term = partial * error;
            term * term
        })
        .fold(0.0, |acc, t| acc + t)
        .sqrt()
}

/// Propagates independent scalar operands through a table operation.
pub fn propagate(op: Operation, args: &[UScalar]) -> Result<UScalar> {
    let values: Vec<f64> = args.iter().map(|a| a.value).collect();
    let value = op.eval(&values)?;
    let partials = op.partials(&values)?;
    let error = linear_error(partials.into_iter().zip(args.iter().map(|a| a.error)));
    tracing::trace!(op = op.name(), value, error, "propagated scalar operation");
    Ok(UScalar::from_parts(value, error))
}

impl UncertainNumeric for UScalar {
    type Numeric = f64;

    #[inline]
    fn nominal(&self) -> f64 {
        self.value
    }

    #[inline]
    fn std_dev(&self) -> f64 {
        self.error
    }
}

impl From<f64> for UScalar {
    #[inline]
    fn from(value: f64) -> Self {
        Self::exact(value)
    }
}

macro_rules! impl_from_plain {
    ($T:ty) => {
        impl From<$T> for UScalar {
            fn from(t: $T) -> Self {
                Self::exact(t.into())
            }
        }
    };
}

impl_from_plain!(i8);
impl_from_plain!(i16);
impl_from_plain!(i32);
impl_from_plain!(u8);
impl_from_plain!(u16);
impl_from_plain!(u32);
impl_from_plain!(f32);

impl PartialEq for UScalar {
    /// Compares nominal values, or checks for overlap within the combined
    /// standard deviation if [`config::compare_with_error`] is on.
    fn eq(&self, other: &Self) -> bool {
        if config::compare_with_error() {
            self.overlaps(other)
        } else {
            self.value == other.value
        }
    }
}

impl PartialOrd for UScalar {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if config::compare_with_error() && self.overlaps(other) {
            Some(Ordering::Equal)
        } else {
            self.value.partial_cmp(&other.value)
        }
    }
}

impl PartialEq<f64> for UScalar {
    fn eq(&self, other: &f64) -> bool {
        *self == Self::exact(*other)
    }
}

impl PartialOrd<f64> for UScalar {
    fn partial_cmp(&self, other: &f64) -> Option<Ordering> {
        self.partial_cmp(&Self::exact(*other))
    }
}

impl Neg for UScalar {
    type Output = Self;

    fn neg(self) -> Self {
        Self::from_parts(-self.value, self.error)
    }
}

impl Neg for &UScalar {
    type Output = UScalar;

    fn neg(self) -> UScalar {
        -*self
    }
}

macro_rules! impl_binary_op {
    ($Trait:ident, $method:ident, $op:expr) => {
        impl $Trait for UScalar {
            type Output = Self;

            fn $method(self, rhs: Self) -> Self {
                self.combine($op, rhs)
            }
        }

        impl $Trait for &UScalar {
            type Output = UScalar;

            fn $method(self, rhs: Self) -> UScalar {
                self.combine($op, *rhs)
            }
        }
    };
}

impl_binary_op!(Add, add, BinaryOp::Add);
impl_binary_op!(Sub, sub, BinaryOp::Sub);
impl_binary_op!(Mul, mul, BinaryOp::Mul);
impl_binary_op!(Div, div, BinaryOp::Div);
impl_binary_op!(Rem, rem, BinaryOp::Rem);

macro_rules! impl_arithmetic_plain {
    ($t:ty) => {
        impl Add<$t> for UScalar {
            type Output = UScalar;

            fn add(self, rhs: $t) -> UScalar {
                self.combine(BinaryOp::Add, rhs.into())
            }
        }

        impl Add<UScalar> for $t {
            type Output = UScalar;

            fn add(self, rhs: UScalar) -> UScalar {
                let num: UScalar = self.into();
                num.combine(BinaryOp::Add, rhs)
            }
        }

        impl Sub<$t> for UScalar {
            type Output = UScalar;

            fn sub(self, rhs: $t) -> UScalar {
                self.combine(BinaryOp::Sub, rhs.into())
            }
        }

        impl Sub<UScalar> for $t {
            type Output = UScalar;

            fn sub(self, rhs: UScalar) -> UScalar {
                let num: UScalar = self.into();
                num.combine(BinaryOp::Sub, rhs)
            }
        }

        impl Mul<$t> for UScalar {
            type Output = UScalar;

            fn mul(self, rhs: $t) -> UScalar {
                self.combine(BinaryOp::Mul, rhs.into())
            }
        }

        impl Mul<UScalar> for $t {
            type Output = UScalar;

            fn mul(self, rhs: UScalar) -> UScalar {
                let num: UScalar = self.into();
                num.combine(BinaryOp::Mul, rhs)
            }
        }

        impl Div<$t> for UScalar {
            type Output = UScalar;

            fn div(self, rhs: $t) -> UScalar {
                self.combine(BinaryOp::Div, rhs.into())
            }
        }

        impl Div<UScalar> for $t {
            type Output = UScalar;

            fn div(self, rhs: UScalar) -> UScalar {
                let num: UScalar = self.into();
                num.combine(BinaryOp::Div, rhs)
            }
        }
    };
}

impl_arithmetic_plain!(f64);
impl_arithmetic_plain!(f32);
impl_arithmetic_plain!(i32);
impl_arithmetic_plain!(u32);

impl Zero for UScalar {
    #[inline]
    fn zero() -> Self {
        Self::ZERO
    }

    /// Returns true if the nominal value is zero, regardless of any
    /// uncertainty.
    #[inline]
    fn is_zero(&self) -> bool {
        self.value == 0.0
    }
}

impl One for UScalar {
    #[inline]
    fn one() -> Self {
        Self::ONE
    }
}

impl Num for UScalar {
    type FromStrRadixErr = UncertaintyError;

    /// Parses an exact number. Only radix 10 accepts a fractional part.
    fn from_str_radix(str: &str, radix: u32) -> Result<Self> {
        let value = <f64 as Num>::from_str_radix(str, radix)
            .map_err(|_e| UncertaintyError::Parse(str.into()))?;
        Ok(Self::exact(value))
    }
}

impl Pow<Self> for UScalar {
    type Output = Self;

    fn pow(self, rhs: Self) -> Self {
        self.combine(BinaryOp::Pow, rhs)
    }
}

impl Pow<f64> for UScalar {
    type Output = Self;

    fn pow(self, rhs: f64) -> Self {
        self.powf(rhs)
    }
}

impl Pow<i32> for UScalar {
    type Output = Self;

    fn pow(self, rhs: i32) -> Self {
        self.powi(rhs)
    }
}

impl Inv for UScalar {
    type Output = Self;

    #[inline]
    fn inv(self) -> Self {
        self.recip()
    }
}

impl Sum for UScalar {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, |acc, x| acc + x)
    }
}

impl<'a> Sum<&'a UScalar> for UScalar {
    fn sum<I: Iterator<Item = &'a UScalar>>(iter: I) -> Self {
        iter.fold(Self::ZERO, |acc, x| acc + *x)
    }
}

impl Product for UScalar {
    fn product<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ONE, |acc, x| acc * x)
    }
}

impl fmt::Display for UScalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = format::format_pair(self.value, self.error, config::display_rounding());
        f.write_str(&text)
    }
}

static PAIR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?P<value>\S+?)\s*(?:(?:\+/-|±)\s*(?P<error>\S+))?\s*$")
        .expect("pattern is valid")
});

impl FromStr for UScalar {
    type Err = UncertaintyError;

    /// Parses `"value +/- error"`, `"value ± error"` or a bare number.
    ///
    /// Both numbers accept anything `f64::from_str` does, including `inf`
    /// and `nan`.
    fn from_str(s: &str) -> Result<Self> {
        let caps = PAIR
            .captures(s)
            .ok_or_else(|| UncertaintyError::Parse(s.into()))?;
        let value = caps
            .name("value")
            .and_then(|m| f64::from_str(m.as_str()).ok())
            .ok_or_else(|| UncertaintyError::Parse(s.into()))?;
        let error = match caps.name("error") {
            Some(m) => f64::from_str(m.as_str()).map_err(|_e| UncertaintyError::Parse(s.into()))?,
            None => 0.0,
        };
        Self::new(value, error)
    }
}

// SPDX-FileCopyrightText: 2025 Matthew Milner <matterhorn103@proton.me>
// SPDX-License-Identifier: MIT

use std::{
    fmt,
    ops::{Add, Div, Mul, Neg, Sub},
};

use super::{chain, Real};
use crate::derivative::{BinaryOp, UnaryOp};

/// A dual number for forward-mode differentiation.
///
/// Carries a value and its derivative with respect to one seeded input.
/// A full Jacobian takes one pass per input.
#[derive(Copy, Clone, PartialEq)]
pub struct Dual {
    value: f64,
    tangent: f64,
}

impl Dual {
    #[inline]
    pub fn new(value: f64, tangent: f64) -> Self {
        Self { value, tangent }
    }

    /// The seeded input, with tangent 1.
    #[inline]
    pub fn variable(value: f64) -> Self {
        Self::new(value, 1.0)
    }

    /// The derivative with respect to the seeded input.
    #[inline]
    pub fn tangent(&self) -> f64 {
        self.tangent
    }
}

impl fmt::Debug for Dual {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Dual({} + {}ε)", self.value, self.tangent)
    }
}

impl Real for Dual {
    #[inline]
    fn constant(c: f64) -> Self {
        Self::new(c, 0.0)
    }

    #[inline]
    fn value(&self) -> f64 {
        self.value
    }

    fn unary(self, op: UnaryOp) -> Self {
        Self {
            value: op.eval(self.value),
            tangent: chain(op.derivative(self.value), self.tangent),
        }
    }

    fn binary(self, op: BinaryOp, rhs: Self) -> Self {
        let (dx, dy) = op.partials(self.value, rhs.value);
        Self {
            value: op.eval(self.value, rhs.value),
            tangent: chain(dx, self.tangent) + chain(dy, rhs.tangent),
        }
    }
}

impl Neg for Dual {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.value, -self.tangent)
    }
}

macro_rules! impl_dual_op {
    ($Trait:ident, $method:ident, $op:expr) => {
        impl $Trait for Dual {
            type Output = Self;

            #[inline]
            fn $method(self, rhs: Self) -> Self {
                self.binary($op, rhs)
            }
        }
    };
}

impl_dual_op!(Add, add, BinaryOp::Add);
impl_dual_op!(Sub, sub, BinaryOp::Sub);
impl_dual_op!(Mul, mul, BinaryOp::Mul);
impl_dual_op!(Div, div, BinaryOp::Div);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn product_rule() {
        let x = Dual::variable(3.0);
        let c = Dual::constant(4.0);
        let y = x * x * c;
        assert_eq!(y.value(), 36.0);
        assert_eq!(y.tangent(), 24.0);
    }

    #[test]
    fn quotient_rule() {
        let x = Dual::variable(2.0);
        let y = Dual::constant(1.0) / x;
        assert_eq!(y.value(), 0.5);
        assert_eq!(y.tangent(), -0.25);
    }

    #[test]
    fn elementary_functions() {
        let y = Dual::variable(0.0).exp();
        assert_eq!(y.value(), 1.0);
        assert_eq!(y.tangent(), 1.0);
        let y = Dual::variable(4.0).sqrt();
        assert_eq!(y.tangent(), 0.25);
    }

    #[test]
    fn constant_with_infinite_derivative() {
        // sqrt' is infinite at 0, but the constant carries no tangent
        let y = Dual::constant(0.0).sqrt() + Dual::variable(2.0);
        assert_eq!(y.value(), 2.0);
        assert_eq!(y.tangent(), 1.0);
    }

    #[test]
    fn debug() {
        assert_eq!(format!("{:?}", Dual::new(1.0, 2.0)), "Dual(1 + 2ε)");
    }
}

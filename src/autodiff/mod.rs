// SPDX-FileCopyrightText: 2025 Matthew Milner <matterhorn103@proton.me>
// SPDX-License-Identifier: MIT

//! Automatic differentiation over the operations of the derivative table.
//!
//! Array functions are written once, generically over [`Real`], and can
//! then be evaluated on plain `f64`s, on forward-mode [`Dual`] numbers or on
//! reverse-mode [`Var`]s recorded on a [`Tape`]. Every elementary
//! derivative comes from [`crate::derivative`], so both modes agree with
//! scalar propagation by construction.

mod dual;
mod reverse;

use std::{
    fmt::Debug,
    ops::{Add, Div, Mul, Neg, Sub},
};

pub use dual::Dual;
pub use reverse::{Tape, Var};

use crate::derivative::{BinaryOp, UnaryOp};

/// A number type that array functions can be evaluated on.
pub trait Real:
    Copy
    + Debug
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
{
    /// Lifts a plain number; its derivative with respect to anything is 0.
    fn constant(c: f64) -> Self;

    /// The primal value.
    fn value(&self) -> f64;

    fn unary(self, op: UnaryOp) -> Self;

    fn binary(self, op: BinaryOp, rhs: Self) -> Self;

    #[inline]
    fn zero() -> Self {
        Self::constant(0.0)
    }

    #[inline]
    fn square(self) -> Self {
        self.unary(UnaryOp::Square)
    }

    #[inline]
    fn sqrt(self) -> Self {
        self.unary(UnaryOp::Sqrt)
    }

    #[inline]
    fn exp(self) -> Self {
        self.unary(UnaryOp::Exp)
    }

    #[inline]
    fn ln(self) -> Self {
        self.unary(UnaryOp::Ln)
    }

    #[inline]
    fn abs(self) -> Self {
        self.unary(UnaryOp::Abs)
    }

    #[inline]
    fn powf(self, n: f64) -> Self {
        self.binary(BinaryOp::Pow, Self::constant(n))
    }
}

impl Real for f64 {
    #[inline]
    fn constant(c: f64) -> Self {
        c
    }

    #[inline]
    fn value(&self) -> f64 {
        *self
    }

    #[inline]
    fn unary(self, op: UnaryOp) -> Self {
        op.eval(self)
    }

    #[inline]
    fn binary(self, op: BinaryOp, rhs: Self) -> Self {
        op.eval(self, rhs)
    }
}

/// Chain rule for one operand. A zero on either side contributes nothing,
/// even against an infinite factor, so forward and reverse mode agree at
/// points such as `sqrt(0)`.
#[inline]
pub(crate) fn chain(partial: f64, tangent: f64) -> f64 {
    if partial == 0.0 || tangent == 0.0 {
        0.0
    } else {
        partial * tangent
    }
}

// SPDX-FileCopyrightText: 2025 Matthew Milner <matterhorn103@proton.me>
// SPDX-License-Identifier: MIT

//! Closed-form derivatives of every operation with a hand-written
//! propagation rule.
//!
//! The table is plain data: each operation can be looked up by name,
//! evaluated, and differentiated at a nominal value. Scalar propagation,
//! the elementwise array rules and both automatic differentiation modes
//! all take their derivatives from here, so the paths cannot disagree.
//!
//! Degenerate points are not trapped. `ln(0)` has derivative `inf`,
//! `sqrt(0)` has derivative `inf`, `x / 0` has partials `inf` and `nan`;
//! these flow into the propagated error exactly as `f64` arithmetic
//! produces them.

use std::fmt;

use crate::error::{Result, UncertaintyError};

/// An operation of one operand.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Neg,
    Pos,
    Abs,
    Square,
    Recip,
    Sqrt,
    Cbrt,
    Exp,
    Exp2,
    ExpM1,
    Ln,
    Log2,
    Log10,
    Ln1p,
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Sinh,
    Cosh,
    Tanh,
    Asinh,
    Acosh,
    Atanh,
    ToRadians,
    ToDegrees,
}

impl UnaryOp {
    /// Every unary operation in the table.
    pub const ALL: [UnaryOp; 28] = [
        Self::Neg,
        Self::Pos,
        Self::Abs,
        Self::Square,
        Self::Recip,
        Self::Sqrt,
        Self::Cbrt,
        Self::Exp,
        Self::Exp2,
        Self::ExpM1,
        Self::Ln,
        Self::Log2,
        Self::Log10,
        Self::Ln1p,
        Self::Sin,
        Self::Cos,
        Self::Tan,
        Self::Asin,
        Self::Acos,
        Self::Atan,
        Self::Sinh,
        Self::Cosh,
        Self::Tanh,
        Self::Asinh,
        Self::Acosh,
        Self::Atanh,
        Self::ToRadians,
        Self::ToDegrees,
    ];

    /// The canonical name used for lookups.
    pub fn name(self) -> &'static str {
        match self {
            Self::Neg => "negative",
            Self::Pos => "positive",
            Self::Abs => "abs",
            Self::Square => "square",
            Self::Recip => "reciprocal",
            Self::Sqrt => "sqrt",
            Self::Cbrt => "cbrt",
            Self::Exp => "exp",
            Self::Exp2 => "exp2",
            Self::ExpM1 => "expm1",
            Self::Ln => "log",
            Self::Log2 => "log2",
            Self::Log10 => "log10",
            Self::Ln1p => "log1p",
            Self::Sin => "sin",
            Self::Cos => "cos",
            Self::Tan => "tan",
            Self::Asin => "arcsin",
            Self::Acos => "arccos",
            Self::Atan => "arctan",
            Self::Sinh => "sinh",
            Self::Cosh => "cosh",
            Self::Tanh => "tanh",
            Self::Asinh => "arcsinh",
            Self::Acosh => "arccosh",
            Self::Atanh => "arctanh",
            Self::ToRadians => "deg2rad",
            Self::ToDegrees => "rad2deg",
        }
    }

    /// Looks an operation up by name.
    ///
    /// Besides the canonical names, the Rust method names (`ln`, `asin`,
    /// `to_radians`, ...) and a few common aliases are accepted.
    pub fn from_name(name: &str) -> Option<Self> {
        let op = match name {
            "neg" | "-" => Self::Neg,
            "pos" | "+" => Self::Pos,
            "absolute" | "fabs" => Self::Abs,
            "recip" => Self::Recip,
            "exp_m1" => Self::ExpM1,
            "ln" => Self::Ln,
            "ln_1p" => Self::Ln1p,
            "asin" => Self::Asin,
            "acos" => Self::Acos,
            "atan" => Self::Atan,
            "asinh" => Self::Asinh,
            "acosh" => Self::Acosh,
            "atanh" => Self::Atanh,
            "radians" | "to_radians" => Self::ToRadians,
            "degrees" | "to_degrees" => Self::ToDegrees,
            _ => return Self::ALL.into_iter().find(|op| op.name() == name),
        };
        Some(op)
    }

    /// Evaluates the operation at `x`.
    pub fn eval(self, x: f64) -> f64 {
        match self {
            Self::Neg => -x,
            Self::Pos => x,
            Self::Abs => x.abs(),
            Self::Square => x * x,
            Self::Recip => x.recip(),
            Self::Sqrt => x.sqrt(),
            Self::Cbrt => x.cbrt(),
            Self::Exp => x.exp(),
            Self::Exp2 => x.exp2(),
            Self::ExpM1 => x.exp_m1(),
            Self::Ln => x.ln(),
            Self::Log2 => x.log2(),
            Self::Log10 => x.log10(),
            Self::Ln1p => x.ln_1p(),
            Self::Sin => x.sin(),
            Self::Cos => x.cos(),
            Self::Tan => x.tan(),
            Self::Asin => x.asin(),
            Self::Acos => x.acos(),
            Self::Atan => x.atan(),
            Self::Sinh => x.sinh(),
            Self::Cosh => x.cosh(),
            Self::Tanh => x.tanh(),
            Self::Asinh => x.asinh(),
            Self::Acosh => x.acosh(),
            Self::Atanh => x.atanh(),
            Self::ToRadians => x.to_radians(),
            Self::ToDegrees => x.to_degrees(),
        }
    }

    /// The derivative of the operation at `x`.
    pub fn derivative(self, x: f64) -> f64 {
        match self {
            Self::Neg => -1.0,
            Self::Pos => 1.0,
            // Slope 1 at the kink, so |x| keeps the error of x everywhere
            Self::Abs => {
                if x < 0.0 {
                    -1.0
                } else {
                    1.0
                }
            }
            Self::Square => 2.0 * x,
            Self::Recip => -1.0 / (x * x),
            Self::Sqrt => 0.5 / x.sqrt(),
            Self::Cbrt => 1.0 / (3.0 * x.cbrt() * x.cbrt()),
            Self::Exp => x.exp(),
            Self::Exp2 => x.exp2() * std::f64::consts::LN_2,
            Self::ExpM1 => x.exp(),
            Self::Ln => 1.0 / x,
            Self::Log2 => 1.0 / (x * std::f64::consts::LN_2),
            Self::Log10 => 1.0 / (x * std::f64::consts::LN_10),
            Self::Ln1p => 1.0 / (1.0 + x),
            Self::Sin => x.cos(),
            Self::Cos => -x.sin(),
            Self::Tan => {
                let c = x.cos();
                1.0 / (c * c)
            }
            Self::Asin => 1.0 / (1.0 - x * x).sqrt(),
            Self::Acos => -1.0 / (1.0 - x * x).sqrt(),
            Self::Atan => 1.0 / (1.0 + x * x),
            Self::Sinh => x.cosh(),
            Self::Cosh => x.sinh(),
            Self::Tanh => {
                let c = x.cosh();
                1.0 / (c * c)
            }
            Self::Asinh => 1.0 / (x * x + 1.0).sqrt(),
            Self::Acosh => 1.0 / (x * x - 1.0).sqrt(),
            Self::Atanh => 1.0 / (1.0 - x * x),
            Self::ToRadians => std::f64::consts::PI / 180.0,
            Self::ToDegrees => 180.0 / std::f64::consts::PI,
        }
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An operation of two operands.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    Rem,
    Atan2,
    Hypot,
}

impl BinaryOp {
    /// Every binary operation in the table.
    pub const ALL: [BinaryOp; 8] = [
        Self::Add,
        Self::Sub,
        Self::Mul,
        Self::Div,
        Self::Pow,
        Self::Rem,
        Self::Atan2,
        Self::Hypot,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Sub => "subtract",
            Self::Mul => "multiply",
            Self::Div => "divide",
            Self::Pow => "power",
            Self::Rem => "remainder",
            Self::Atan2 => "arctan2",
            Self::Hypot => "hypot",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let op = match name {
            "+" => Self::Add,
            "-" | "sub" => Self::Sub,
            "*" | "mul" => Self::Mul,
            "/" | "div" | "true_divide" => Self::Div,
            "**" | "pow" | "powf" => Self::Pow,
            "%" | "rem" | "mod" | "fmod" => Self::Rem,
            "atan2" => Self::Atan2,
            _ => return Self::ALL.into_iter().find(|op| op.name() == name),
        };
        Some(op)
    }

    /// Evaluates `x op y`.
    pub fn eval(self, x: f64, y: f64) -> f64 {
        match self {
            Self::Add => x + y,
            Self::Sub => x - y,
            Self::Mul => x * y,
            Self::Div => x / y,
            Self::Pow => x.powf(y),
            Self::Rem => x % y,
            Self::Atan2 => x.atan2(y),
            Self::Hypot => x.hypot(y),
        }
    }

    /// The partial derivatives `(∂f/∂x, ∂f/∂y)` at `(x, y)`.
    pub fn partials(self, x: f64, y: f64) -> (f64, f64) {
        match self {
            Self::Add => (1.0, 1.0),
            Self::Sub => (1.0, -1.0),
            Self::Mul => (y, x),
            Self::Div => (1.0 / y, -x / (y * y)),
            Self::Pow => {
                // x^0 is constant, even at x = 0
                let dx = if y == 0.0 { 0.0 } else { y * x.powf(y - 1.0) };
                (dx, x.powf(y) * x.ln())
            }
            // `%` truncates toward zero
            Self::Rem => (1.0, -(x / y).trunc()),
            Self::Atan2 => {
                let r2 = x * x + y * y;
                (y / r2, -x / r2)
            }
            Self::Hypot => {
                let r = x.hypot(y);
                (x / r, y / r)
            }
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An entry of the derivative table.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    Unary(UnaryOp),
    Binary(BinaryOp),
}

impl Operation {
    /// Looks up an operation, preferring the unary reading of names such as
    /// `"-"` only when asked for one operand.
    pub fn lookup(name: &str, arity: usize) -> Result<Self> {
        let found = match arity {
            1 => UnaryOp::from_name(name).map(Self::Unary),
            2 => BinaryOp::from_name(name).map(Self::Binary),
            _ => None,
        };
        found.ok_or_else(|| UncertaintyError::unsupported(format!("{name}/{arity}")))
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Unary(op) => op.name(),
            Self::Binary(op) => op.name(),
        }
    }

    pub fn arity(self) -> usize {
        match self {
            Self::Unary(_) => 1,
            Self::Binary(_) => 2,
        }
    }

    /// Evaluates the operation at the nominal values in `args`.
    pub fn eval(self, args: &[f64]) -> Result<f64> {
        match (self, args) {
            (Self::Unary(op), [x]) => Ok(op.eval(*x)),
            (Self::Binary(op), [x, y]) => Ok(op.eval(*x, *y)),
            _ => Err(UncertaintyError::shape("operation arguments", self.arity(), args.len())),
        }
    }

    /// The partial derivatives with respect to each operand, evaluated at
    /// the nominal values in `args`.
    pub fn partials(self, args: &[f64]) -> Result<Vec<f64>> {
        match (self, args) {
            (Self::Unary(op), [x]) => Ok(vec![op.derivative(*x)]),
            (Self::Binary(op), [x, y]) => {
                let (dx, dy) = op.partials(*x, *y);
                Ok(vec![dx, dy])
            }
            _ => Err(UncertaintyError::shape("operation arguments", self.arity(), args.len())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STEP: f64 = 1e-6;

    fn central_difference(f: impl Fn(f64) -> f64, x: f64) -> f64 {
        (f(x + STEP) - f(x - STEP)) / (2.0 * STEP)
    }

    #[test]
    fn unary_names_round_trip() {
        for op in UnaryOp::ALL {
            assert_eq!(UnaryOp::from_name(op.name()), Some(op));
        }
    }

    #[test]
    fn binary_names_round_trip() {
        for op in BinaryOp::ALL {
            assert_eq!(BinaryOp::from_name(op.name()), Some(op));
        }
    }

    #[test]
    fn aliases() {
        assert_eq!(UnaryOp::from_name("ln"), Some(UnaryOp::Ln));
        assert_eq!(UnaryOp::from_name("asin"), Some(UnaryOp::Asin));
        assert_eq!(BinaryOp::from_name("*"), Some(BinaryOp::Mul));
        assert_eq!(BinaryOp::from_name("true_divide"), Some(BinaryOp::Div));
        assert_eq!(UnaryOp::from_name("gamma"), None);
    }

    #[test]
    fn unary_derivatives_match_finite_differences() {
        // A point inside every domain, including acosh's
        let x = 1.3;
        for op in UnaryOp::ALL {
            if op == UnaryOp::Asin || op == UnaryOp::Acos || op == UnaryOp::Atanh {
                continue;
            }
            let numeric = central_difference(|x| op.eval(x), x);
            let analytic = op.derivative(x);
            assert!(
                (numeric - analytic).abs() < 1e-5 * analytic.abs().max(1.0),
                "{op}: numeric={numeric}, analytic={analytic}"
            );
        }
        for op in [UnaryOp::Asin, UnaryOp::Acos, UnaryOp::Atanh] {
            let x = 0.4;
            let numeric = central_difference(|x| op.eval(x), x);
            assert!((numeric - op.derivative(x)).abs() < 1e-5, "{op}");
        }
    }

    #[test]
    fn binary_partials_match_finite_differences() {
        let (x, y) = (2.7, 1.9);
        for op in BinaryOp::ALL {
            let (dx, dy) = op.partials(x, y);
            let numeric_dx = central_difference(|x| op.eval(x, y), x);
            let numeric_dy = central_difference(|y| op.eval(x, y), y);
            assert!((numeric_dx - dx).abs() < 1e-5, "{op} dx");
            assert!((numeric_dy - dy).abs() < 1e-5, "{op} dy");
        }
    }

    #[test]
    fn quotient_rule() {
        let (dx, dy) = BinaryOp::Div.partials(3.0, 2.0);
        assert_eq!(dx, 0.5);
        assert_eq!(dy, -0.75);
    }

    #[test]
    fn degenerate_points_propagate() {
        assert_eq!(UnaryOp::Ln.derivative(0.0), f64::INFINITY);
        assert_eq!(UnaryOp::Sqrt.derivative(0.0), f64::INFINITY);
        let (dx, dy) = BinaryOp::Div.partials(1.0, 0.0);
        assert_eq!(dx, f64::INFINITY);
        assert_eq!(dy, f64::NEG_INFINITY);
        let (dx, dy) = BinaryOp::Div.partials(0.0, 0.0);
        assert_eq!(dx, f64::INFINITY);
        assert!(dy.is_nan());
    }

    #[test]
    fn constant_power_has_no_slope() {
        assert_eq!(BinaryOp::Pow.partials(0.0, 0.0).0, 0.0);
        assert_eq!(BinaryOp::Pow.partials(5.0, 0.0).0, 0.0);
        assert_eq!(BinaryOp::Pow.partials(2.0, 3.0).0, 12.0);
    }

    #[test]
    fn abs_slope() {
        assert_eq!(UnaryOp::Abs.derivative(0.0), 1.0);
        assert_eq!(UnaryOp::Abs.derivative(-2.0), -1.0);
    }

    #[test]
    fn lookup_by_arity() {
        assert_eq!(Operation::lookup("-", 1), Ok(Operation::Unary(UnaryOp::Neg)));
        assert_eq!(Operation::lookup("-", 2), Ok(Operation::Binary(BinaryOp::Sub)));
        assert!(matches!(
            Operation::lookup("gamma", 1),
            Err(UncertaintyError::UnsupportedOperation { .. })
        ));
        assert!(Operation::lookup("add", 3).is_err());
    }

    #[test]
    fn partials_check_argument_count() {
        let op = Operation::Binary(BinaryOp::Mul);
        assert_eq!(op.partials(&[2.0, 3.0]), Ok(vec![3.0, 2.0]));
        assert!(op.partials(&[2.0]).is_err());
    }
}

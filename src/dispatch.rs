// SPDX-FileCopyrightText: 2025 Matthew Milner <matterhorn103@proton.me>
// SPDX-License-Identifier: MIT

//! Routing of named numerical functions called on uncertain quantities.
//!
//! A call is resolved, in order, to:
//!
//! 1. an elementwise rule from the derivative table,
//! 2. an array function propagated through its Jacobian,
//! 3. a function that discards the uncertainty, subject to the downcast
//!    policy in [`crate::config`].
//!
//! Anything else fails with [`UncertaintyError::UnsupportedOperation`].
//! Only the first route is open to calls without a vector argument.

use std::fmt;

use ndarray::{Array1, ArrayView1};

use crate::{
    autodiff::Real,
    config,
    derivative::Operation,
    error::{Result, UncertaintyError},
    jacobian::{self, ArrayFn, AutoDiff, Differentiator},
    magnitude::Magnitude,
    scalar::UScalar,
    uncertainty::Uncertainty,
    vector::UVector,
};

/// Array functions without a closed-form rule.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ArrayFunction {
    Sum,
    Prod,
    Mean,
    /// Population variance.
    Var,
    /// Population standard deviation.
    Std,
    /// Euclidean norm.
    Norm,
    Dot,
    /// Trapezoidal integral of `y`, with unit spacing or over sample points
    /// `x` given as a second argument.
    Trapz,
    Max,
    Min,
    CumSum,
    CumProd,
    Diff,
    Flip,
}

impl ArrayFunction {
    pub const ALL: [ArrayFunction; 14] = [
        Self::Sum,
        Self::Prod,
        Self::Mean,
        Self::Var,
        Self::Std,
        Self::Norm,
        Self::Dot,
        Self::Trapz,
        Self::Max,
        Self::Min,
        Self::CumSum,
        Self::CumProd,
        Self::Diff,
        Self::Flip,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sum => "sum",
            Self::Prod => "prod",
            Self::Mean => "mean",
            Self::Var => "var",
            Self::Std => "std",
            Self::Norm => "norm",
            Self::Dot => "dot",
            Self::Trapz => "trapz",
            Self::Max => "max",
            Self::Min => "min",
            Self::CumSum => "cumsum",
            Self::CumProd => "cumprod",
            Self::Diff => "diff",
            Self::Flip => "flip",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let found = match name {
            "product" => Self::Prod,
            "amax" => Self::Max,
            "amin" => Self::Min,
            "trapezoid" => Self::Trapz,
            _ => return Self::ALL.into_iter().find(|f| f.as_str() == name),
        };
        Some(found)
    }

    fn unsupported_arity(self, arity: usize) -> UncertaintyError {
        UncertaintyError::unsupported(format!("{}/{arity}", self.as_str()))
    }
}

impl fmt::Display for ArrayFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn sum<R: Real>(x: &[R]) -> R {
    x.iter().fold(R::zero(), |acc, &xi| acc + xi)
}

fn mean<R: Real>(x: &[R]) -> R {
    sum(x) / R::constant(x.len() as f64)
}

fn variance<R: Real>(x: &[R]) -> R {
    let m = mean(x);
    let squares: Vec<R> = x.iter().map(|&xi| (xi - m).square()).collect();
    mean(&squares)
}

/// The element whose nominal value wins against every other under `pick`.
fn select<R: Real>(x: &[R], pick: impl Fn(f64, f64) -> bool, name: &str) -> Result<R> {
    let (&first, rest) = x
        .split_first()
        .ok_or_else(|| UncertaintyError::unsupported(format!("{name} of an empty array")))?;
    Ok(rest
        .iter()
        .fold(first, |best, &xi| if pick(xi.value(), best.value()) { xi } else { best }))
}

fn scan<R: Real>(x: &[R], init: R, step: impl Fn(R, R) -> R) -> Vec<R> {
    x.iter()
        .scan(init, |acc, &xi| {
            *acc = step(*acc, xi);
            Some(*acc)
        })
        .collect()
}

impl ArrayFn for ArrayFunction {
    fn name(&self) -> &str {
        self.as_str()
    }

    fn is_reduction(&self) -> bool {
        !matches!(
            self,
            Self::CumSum | Self::CumProd | Self::Diff | Self::Flip
        )
    }

    fn apply<R: Real>(&self, args: &[&[R]]) -> Result<Vec<R>> {
        let output = match (self, args) {
            (Self::Sum, [x]) => vec![sum(x)],
            (Self::Prod, [x]) => vec![x.iter().fold(R::constant(1.0), |acc, &xi| acc * xi)],
            (Self::Mean, [x]) => vec![mean(x)],
            (Self::Var, [x]) => vec![variance(x)],
            (Self::Std, [x]) => vec![variance(x).sqrt()],
            (Self::Norm, [x]) => {
                let squares: Vec<R> = x.iter().map(|&xi| xi.square()).collect();
                vec![sum(&squares).sqrt()]
            }
            (Self::Dot, [x, y]) => {
                if x.len() != y.len() {
                    return Err(UncertaintyError::shape("dot", x.len(), y.len()));
                }
                let products: Vec<R> = x.iter().zip(y.iter()).map(|(&a, &b)| a * b).collect();
                vec![sum(&products)]
            }
            (Self::Trapz, [y]) => {
                let half = R::constant(0.5);
                let areas: Vec<R> = y.windows(2).map(|w| (w[0] + w[1]) * half).collect();
                vec![sum(&areas)]
            }
            (Self::Trapz, [y, x]) => {
                if x.len() != y.len() {
                    return Err(UncertaintyError::shape("trapz", y.len(), x.len()));
                }
                let half = R::constant(0.5);
                let areas: Vec<R> = y
                    .windows(2)
                    .zip(x.windows(2))
                    .map(|(yw, xw)| (xw[1] - xw[0]) * (yw[0] + yw[1]) * half)
                    .collect();
                vec![sum(&areas)]
            }
            (Self::Max, [x]) => vec![select(x, |a, b| a > b, "max")?],
            (Self::Min, [x]) => vec![select(x, |a, b| a < b, "min")?],
            (Self::CumSum, [x]) => scan(x, R::zero(), |acc, xi| acc + xi),
            (Self::CumProd, [x]) => scan(x, R::constant(1.0), |acc, xi| acc * xi),
            (Self::Diff, [x]) => x.windows(2).map(|w| w[1] - w[0]).collect(),
            (Self::Flip, [x]) => x.iter().rev().copied().collect(),
            _ => return Err(self.unsupported_arity(args.len())),
        };
        Ok(output)
    }
}

/// Functions whose result carries no uncertainty.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum StripFunction {
    Floor,
    Ceil,
    /// Rounds half to even.
    Round,
    Trunc,
    Sign,
    ArgMax,
    ArgMin,
    ArgSort,
    IsNan,
    IsInf,
    IsFinite,
}

impl StripFunction {
    pub const ALL: [StripFunction; 11] = [
        Self::Floor,
        Self::Ceil,
        Self::Round,
        Self::Trunc,
        Self::Sign,
        Self::ArgMax,
        Self::ArgMin,
        Self::ArgSort,
        Self::IsNan,
        Self::IsInf,
        Self::IsFinite,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Floor => "floor",
            Self::Ceil => "ceil",
            Self::Round => "round",
            Self::Trunc => "trunc",
            Self::Sign => "sign",
            Self::ArgMax => "argmax",
            Self::ArgMin => "argmin",
            Self::ArgSort => "argsort",
            Self::IsNan => "isnan",
            Self::IsInf => "isinf",
            Self::IsFinite => "isfinite",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "rint" | "around" => Some(Self::Round),
            "fix" => Some(Self::Trunc),
            _ => Self::ALL.into_iter().find(|f| f.as_str() == name),
        }
    }

    /// Evaluates the function on nominal values.
    ///
    /// Indices are returned as floats, and predicates as `1.0` for true and
    /// `0.0` for false.
    pub fn apply(self, x: &Array1<f64>) -> Result<Magnitude> {
        let flag = |b: bool| if b { 1.0 } else { 0.0 };
        let result: Magnitude = match self {
            Self::Floor => x.mapv(f64::floor).into(),
            Self::Ceil => x.mapv(f64::ceil).into(),
            Self::Round => x.mapv(f64::round_ties_even).into(),
            Self::Trunc => x.mapv(f64::trunc).into(),
            Self::Sign => x.mapv(sign).into(),
            Self::ArgMax => Magnitude::Scalar(arg_select(x, |a, b| a > b, "argmax")? as f64),
            Self::ArgMin => Magnitude::Scalar(arg_select(x, |a, b| a < b, "argmin")? as f64),
            Self::ArgSort => {
                let mut indices: Vec<usize> = (0..x.len()).collect();
                indices.sort_by(|&i, &j| x[i].total_cmp(&x[j]));
                indices.into_iter().map(|i| i as f64).collect::<Vec<_>>().into()
            }
            Self::IsNan => x.mapv(|xi| flag(xi.is_nan())).into(),
            Self::IsInf => x.mapv(|xi| flag(xi.is_infinite())).into(),
            Self::IsFinite => x.mapv(|xi| flag(xi.is_finite())).into(),
        };
        Ok(result)
    }
}

impl fmt::Display for StripFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn sign(x: f64) -> f64 {
    if x == 0.0 || x.is_nan() {
        x
    } else {
        x.signum()
    }
}

fn arg_select(x: &Array1<f64>, pick: impl Fn(f64, f64) -> bool, name: &str) -> Result<usize> {
    if x.is_empty() {
        return Err(UncertaintyError::unsupported(format!("{name} of an empty array")));
    }
    Ok((1..x.len()).fold(0, |best, i| if pick(x[i], x[best]) { i } else { best }))
}

/// How a named function is handled.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Function {
    Elementwise(Operation),
    Array(ArrayFunction),
    Strip(StripFunction),
}

impl Function {
    /// Resolves `name` called with `arity` arguments.
    pub fn lookup(name: &str, arity: usize) -> Result<Self> {
        if let Ok(op) = Operation::lookup(name, arity) {
            return Ok(Self::Elementwise(op));
        }
        if let Some(f) = ArrayFunction::from_name(name) {
            return Ok(Self::Array(f));
        }
        if let Some(f) = StripFunction::from_name(name) {
            return Ok(Self::Strip(f));
        }
        Err(UncertaintyError::unsupported(name))
    }
}

/// An argument of a dispatched call.
#[derive(Clone, Debug)]
pub enum Arg<'a> {
    Scalar(UScalar),
    Vector(&'a UVector),
    Plain(f64),
    PlainArray(ArrayView1<'a, f64>),
}

impl Arg<'_> {
    fn is_vector(&self) -> bool {
        matches!(self, Self::Vector(_))
    }

    fn to_uncertainty(&self) -> Uncertainty {
        match self {
            Self::Scalar(x) => Uncertainty::Scalar(*x),
            Self::Vector(v) => Uncertainty::Vector((*v).clone()),
            Self::Plain(x) => Uncertainty::Scalar(UScalar::exact(*x)),
            Self::PlainArray(a) => Uncertainty::Vector(UVector::exact(a.to_owned())),
        }
    }

    fn to_vector(&self) -> UVector {
        match self {
            Self::Scalar(x) => UVector::from_sequence(&[*x]),
            Self::Vector(v) => (*v).clone(),
            Self::Plain(x) => UVector::exact(vec![*x]),
            Self::PlainArray(a) => UVector::exact(a.to_owned()),
        }
    }
}

impl<'a> From<&'a Uncertainty> for Arg<'a> {
    fn from(u: &'a Uncertainty) -> Self {
        match u {
            Uncertainty::Scalar(x) => Self::Scalar(*x),
            Uncertainty::Vector(v) => Self::Vector(v),
        }
    }
}

impl<'a> From<&'a UVector> for Arg<'a> {
    fn from(v: &'a UVector) -> Self {
        Self::Vector(v)
    }
}

impl From<UScalar> for Arg<'_> {
    fn from(x: UScalar) -> Self {
        Self::Scalar(x)
    }
}

impl From<f64> for Arg<'_> {
    fn from(x: f64) -> Self {
        Self::Plain(x)
    }
}

impl<'a> From<&'a Array1<f64>> for Arg<'a> {
    fn from(a: &'a Array1<f64>) -> Self {
        Self::PlainArray(a.view())
    }
}

impl<'a> From<&'a Magnitude> for Arg<'a> {
    fn from(m: &'a Magnitude) -> Self {
        match m {
            Magnitude::Scalar(x) => Self::Plain(*x),
            Magnitude::Array(a) => Self::PlainArray(a.view()),
        }
    }
}

/// The result of a dispatched call.
#[derive(Clone, Debug)]
pub enum Dispatched {
    Uncertain(Uncertainty),
    /// The function discarded the uncertainty.
    Plain(Magnitude),
}

impl Dispatched {
    pub fn uncertain(self) -> Option<Uncertainty> {
        match self {
            Self::Uncertain(u) => Some(u),
            Self::Plain(_) => None,
        }
    }

    pub fn plain(self) -> Option<Magnitude> {
        match self {
            Self::Uncertain(_) => None,
            Self::Plain(m) => Some(m),
        }
    }
}

/// Calls the function `name` on `args`, using automatic differentiation
/// for array functions.
///
/// # Example
///
/// ```
/// # use auto_uncertainties::{dispatch::{dispatch, Arg}, UVector};
/// #
/// let v = UVector::new(vec![1.0, 2.0], vec![0.3, 0.4]).unwrap();
/// let total = dispatch("sum", &[Arg::from(&v)]).unwrap();
/// assert_eq!(total.uncertain().unwrap().to_string(), "3 +/- 0.5");
/// ```
pub fn dispatch(name: &str, args: &[Arg<'_>]) -> Result<Dispatched> {
    dispatch_with(&AutoDiff::default(), name, args)
}

/// Like [`dispatch`], with array functions differentiated by `backend`.
pub fn dispatch_with<D: Differentiator>(
    backend: &D,
    name: &str,
    args: &[Arg<'_>],
) -> Result<Dispatched> {
    let function = Function::lookup(name, args.len())?;
    let has_vector = args.iter().any(Arg::is_vector);
    match function {
        Function::Elementwise(op) => {
            tracing::trace!(function = name, "dispatching to the elementwise rule");
            let operands: Vec<Uncertainty> = args.iter().map(Arg::to_uncertainty).collect();
            let result = match (op, operands.as_slice()) {
                (Operation::Unary(op), [x]) => x.apply(op),
                (Operation::Binary(op), [x, y]) => x.combine(op, y)?,
                _ => return Err(UncertaintyError::unsupported(name)),
            };
            Ok(Dispatched::Uncertain(result))
        }
        Function::Array(f) if has_vector => {
            tracing::debug!(function = name, "dispatching to Jacobian propagation");
            let vectors: Vec<UVector> = args.iter().map(Arg::to_vector).collect();
            let refs: Vec<&UVector> = vectors.iter().collect();
            jacobian::propagate(backend, &f, &refs).map(Dispatched::Uncertain)
        }
        Function::Strip(f) if has_vector => {
            let [Arg::Vector(v)] = args else {
                return Err(UncertaintyError::unsupported(format!("{name}/{}", args.len())));
            };
            tracing::debug!(function = name, "dispatching to a function without uncertainty");
            let result = config::downcast(name, v.len(), || f.apply(v.values()))?;
            result.map(Dispatched::Plain)
        }
        Function::Array(_) | Function::Strip(_) => {
            Err(UncertaintyError::unsupported(format!("{name} without an array argument")))
        }
    }
}

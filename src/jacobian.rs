// SPDX-FileCopyrightText: 2025 Matthew Milner <matterhorn103@proton.me>
// SPDX-License-Identifier: MIT

//! Propagation through array functions that have no hand-written rule.
//!
//! The function is differentiated at the nominal values of its inputs and
//! the resulting Jacobian is contracted with the (diagonal) input
//! covariance. How the Jacobian is obtained is up to a [`Differentiator`],
//! so that propagation can be checked against finite differences.

use ndarray::{Array1, Array2};

use crate::{
    autodiff::{Dual, Real, Tape},
    error::{Result, UncertaintyError},
    scalar::{linear_error, UScalar},
    uncertainty::Uncertainty,
    vector::UVector,
};

/// A function of one or more arrays, written once for any [`Real`].
///
/// Implementing this trait is all that is needed to propagate uncertainty
/// through a custom function with [`propagate`].
///
/// # Example
///
/// ```
/// # use auto_uncertainties::{autodiff::Real, jacobian::{self, ArrayFn, AutoDiff}};
/// # use auto_uncertainties::{Result, UVector};
/// struct SumOfSquares;
///
/// impl ArrayFn for SumOfSquares {
///     fn name(&self) -> &str {
///         "sum_of_squares"
///     }
///
///     fn is_reduction(&self) -> bool {
///         true
///     }
///
///     fn apply<R: Real>(&self, args: &[&[R]]) -> Result<Vec<R>> {
///         let total = args[0].iter().fold(R::zero(), |acc, &x| acc + x.square());
///         Ok(vec![total])
///     }
/// }
///
/// let x = UVector::new(vec![3.0, 4.0], vec![0.1, 0.1]).unwrap();
/// let y = jacobian::propagate(&AutoDiff::default(), &SumOfSquares, &[&x]).unwrap();
/// assert_eq!(y.to_string(), "25 +/- 1");
/// ```
pub trait ArrayFn {
    fn name(&self) -> &str;

    /// Whether the single output should be returned as a scalar.
    fn is_reduction(&self) -> bool {
        false
    }

    /// Evaluates the function on one slice per argument.
    fn apply<R: Real>(&self, args: &[&[R]]) -> Result<Vec<R>>;
}

/// Output values of a function together with its Jacobian.
///
/// `matrix[[j, i]]` is the derivative of output `j` with respect to input
/// `i`, where the inputs of every argument are laid out one after another.
#[derive(Clone, Debug, PartialEq)]
pub struct Jacobian {
    pub values: Array1<f64>,
    pub matrix: Array2<f64>,
}

/// Something that can differentiate an [`ArrayFn`].
pub trait Differentiator {
    fn jacobian<F: ArrayFn>(&self, f: &F, args: &[&[f64]]) -> Result<Jacobian>;

    /// The value and gradient of a function with a single output.
    fn gradient<F: ArrayFn>(&self, f: &F, args: &[&[f64]]) -> Result<(f64, Array1<f64>)> {
        let jacobian = self.jacobian(f, args)?;
        if jacobian.values.len() != 1 {
            return Err(UncertaintyError::shape("gradient", 1, jacobian.values.len()));
        }
        Ok((jacobian.values[0], jacobian.matrix.row(0).to_owned()))
    }
}

/// Which automatic differentiation mode [`AutoDiff`] uses.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Mode {
    /// Reverse mode when there are fewer outputs than inputs, forward mode
    /// otherwise.
    #[default]
    Auto,
    /// One pass of dual numbers per input.
    Forward,
    /// One taped evaluation, then one backward sweep per output.
    Reverse,
}

/// Exact derivatives by automatic differentiation.
///
/// Both modes use the same derivative table and give the same numbers; the
/// mode only changes how much work is done.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct AutoDiff {
    pub mode: Mode,
}

impl AutoDiff {
    pub fn forward() -> Self {
        Self { mode: Mode::Forward }
    }

    pub fn reverse() -> Self {
        Self { mode: Mode::Reverse }
    }
}

impl Differentiator for AutoDiff {
    fn jacobian<F: ArrayFn>(&self, f: &F, args: &[&[f64]]) -> Result<Jacobian> {
        match self.mode {
            Mode::Forward => forward(f, args),
            Mode::Reverse => reverse(f, args),
            Mode::Auto => {
                let inputs = input_count(args);
                let outputs = f.apply(args)?.len();
                if outputs < inputs {
                    reverse(f, args)
                } else {
                    forward(f, args)
                }
            }
        }
    }
}

/// Approximate derivatives by central differences.
///
/// The step for each input is `step * max(1, |x|)`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FiniteDifference {
    pub step: f64,
}

impl Default for FiniteDifference {
    fn default() -> Self {
        Self { step: 1e-6 }
    }
}

impl Differentiator for FiniteDifference {
    fn jacobian<F: ArrayFn>(&self, f: &F, args: &[&[f64]]) -> Result<Jacobian> {
        let values = Array1::from(f.apply(args)?);
        let mut matrix = Array2::zeros((values.len(), input_count(args)));
        let mut shifted: Vec<Vec<f64>> = args.iter().map(|arg| arg.to_vec()).collect();
        let mut column = 0;
        for (a, arg) in args.iter().enumerate() {
            for (i, &x) in arg.iter().enumerate() {
                let h = self.step * x.abs().max(1.0);
                shifted[a][i] = x + h;
                let above = apply_owned(f, &shifted)?;
                shifted[a][i] = x - h;
                let below = apply_owned(f, &shifted)?;
                shifted[a][i] = x;
                check_outputs(f, values.len(), above.len())?;
                check_outputs(f, values.len(), below.len())?;
                for (row, (hi, lo)) in above.iter().zip(&below).enumerate() {
                    matrix[[row, column]] = (hi - lo) / (2.0 * h);
                }
                column += 1;
            }
        }
        Ok(Jacobian { values, matrix })
    }
}

fn input_count<T>(args: &[&[T]]) -> usize {
    args.iter().map(|arg| arg.len()).sum()
}

fn apply_owned<F: ArrayFn, R: Real>(f: &F, args: &[Vec<R>]) -> Result<Vec<R>> {
    let slices: Vec<&[R]> = args.iter().map(Vec::as_slice).collect();
    f.apply(&slices)
}

fn check_outputs<F: ArrayFn>(f: &F, expected: usize, found: usize) -> Result<()> {
    if expected == found {
        Ok(())
    } else {
        tracing::debug!(function = f.name(), expected, found, "output length changed");
        Err(UncertaintyError::shape("function output", expected, found))
    }
}

fn forward<F: ArrayFn>(f: &F, args: &[&[f64]]) -> Result<Jacobian> {
    let values = Array1::from(f.apply(args)?);
    let mut matrix = Array2::zeros((values.len(), input_count(args)));
    let mut column = 0;
    for (a, arg) in args.iter().enumerate() {
        for i in 0..arg.len() {
            let seeded: Vec<Vec<Dual>> = args
                .iter()
                .enumerate()
                .map(|(b, other)| {
                    other
                        .iter()
                        .enumerate()
                        .map(|(j, &x)| {
                            if a == b && i == j {
                                Dual::variable(x)
                            } else {
                                Dual::constant(x)
                            }
                        })
                        .collect()
                })
                .collect();
            let outputs = apply_owned(f, &seeded)?;
            check_outputs(f, values.len(), outputs.len())?;
            for (row, y) in outputs.iter().enumerate() {
                matrix[[row, column]] = y.tangent();
            }
            column += 1;
        }
    }
    Ok(Jacobian { values, matrix })
}

fn reverse<F: ArrayFn>(f: &F, args: &[&[f64]]) -> Result<Jacobian> {
    let tape = Tape::new();
    let vars: Vec<Vec<_>> = args
        .iter()
        .map(|arg| arg.iter().map(|&x| tape.var(x)).collect())
        .collect();
    let outputs = apply_owned(f, &vars)?;
    let inputs: Vec<_> = vars.into_iter().flatten().collect();
    let values: Array1<f64> = outputs.iter().map(|y| y.value()).collect();
    let mut matrix = Array2::zeros((outputs.len(), inputs.len()));
    for (row, &y) in outputs.iter().enumerate() {
        for (column, g) in tape.gradient(y, &inputs).into_iter().enumerate() {
            matrix[[row, column]] = g;
        }
    }
    Ok(Jacobian { values, matrix })
}

/// Propagates independent uncertain arrays through `f`.
///
/// Output `j` gets the error `sqrt(Σᵢ (J[j, i] · σᵢ)²)`. Reductions give a
/// scalar, anything else a vector of the function's own output length.
pub fn propagate<D, F>(backend: &D, f: &F, args: &[&UVector]) -> Result<Uncertainty>
where
    D: Differentiator,
    F: ArrayFn,
{
    let values: Vec<Vec<f64>> = args.iter().map(|arg| arg.values().to_vec()).collect();
    let slices: Vec<&[f64]> = values.iter().map(Vec::as_slice).collect();
    let errors: Vec<f64> = args
        .iter()
        .flat_map(|arg| arg.errors().iter().copied())
        .collect();

    if f.is_reduction() {
        let (value, gradient) = backend.gradient(f, &slices)?;
        let error = linear_error(gradient.iter().copied().zip(errors.iter().copied()));
        tracing::debug!(function = f.name(), inputs = errors.len(), "propagated reduction");
        return Ok(Uncertainty::Scalar(UScalar::from_parts(value, error)));
    }

    let jacobian = backend.jacobian(f, &slices)?;
    let output_errors: Array1<f64> = jacobian
        .matrix
        .rows()
        .into_iter()
        .map(|row| linear_error(row.iter().copied().zip(errors.iter().copied())))
        .collect();
    tracing::debug!(
        function = f.name(),
        inputs = errors.len(),
        outputs = output_errors.len(),
        "propagated through the Jacobian"
    );
    Ok(Uncertainty::Vector(UVector::from_parts(
        jacobian.values,
        output_errors,
    )))
}

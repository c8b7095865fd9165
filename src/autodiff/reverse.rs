// SPDX-FileCopyrightText: 2025 Matthew Milner <matterhorn103@proton.me>
// SPDX-License-Identifier: MIT

use std::{
    cell::RefCell,
    ops::{Add, Div, Mul, Neg, Sub},
};

use super::{chain, Real};
use crate::derivative::{BinaryOp, UnaryOp};

/// One recorded operation: the indices of its operands on the tape and the
/// partial derivative with respect to each.
#[derive(Copy, Clone, Debug, Default)]
struct Node {
    parents: [Option<(usize, f64)>; 2],
}

/// A record of operations for reverse-mode differentiation.
///
/// Inputs are created with [`Tape::var`]; every operation on them appends a
/// node. [`Tape::gradient`] then sweeps the tape backwards once per output.
#[derive(Debug, Default)]
pub struct Tape {
    nodes: RefCell<Vec<Node>>,
}

/// A value recorded on a [`Tape`].
///
/// Values that were never connected to a tape input (constants) carry no
/// slot and are never recorded.
#[derive(Copy, Clone, Debug)]
pub struct Var<'t> {
    value: f64,
    slot: Option<(&'t Tape, usize)>,
}

impl Tape {
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of recorded nodes, inputs included.
    pub fn len(&self) -> usize {
        self.nodes.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.borrow().is_empty()
    }

    /// Creates an input.
    pub fn var(&self, value: f64) -> Var<'_> {
        let index = self.push(Node::default());
        Var {
            value,
            slot: Some((self, index)),
        }
    }

    fn push(&self, node: Node) -> usize {
        let mut nodes = self.nodes.borrow_mut();
        nodes.push(node);
        nodes.len() - 1
    }

    /// The derivatives of `output` with respect to each of `inputs`.
    pub fn gradient(&self, output: Var<'_>, inputs: &[Var<'_>]) -> Vec<f64> {
        let Some((_, out)) = output.slot else {
            return vec![0.0; inputs.len()];
        };
        let nodes = self.nodes.borrow();
        let mut adjoints = vec![0.0; out + 1];
        adjoints[out] = 1.0;
        for index in (0..=out).rev() {
            let adjoint = adjoints[index];
            if adjoint == 0.0 {
                continue;
            }
            for (parent, partial) in nodes[index].parents.iter().flatten() {
                adjoints[*parent] += chain(*partial, adjoint);
            }
        }
        inputs
            .iter()
            .map(|input| match input.slot {
                Some((_, index)) if index <= out => adjoints[index],
                _ => 0.0,
            })
            .collect()
    }
}

impl Real for Var<'_> {
    #[inline]
    fn constant(c: f64) -> Self {
        Self {
            value: c,
            slot: None,
        }
    }

    #[inline]
    fn value(&self) -> f64 {
        self.value
    }

    fn unary(self, op: UnaryOp) -> Self {
        let value = op.eval(self.value);
        let slot = self.slot.map(|(tape, index)| {
            let node = Node {
                parents: [Some((index, op.derivative(self.value))), None],
            };
            (tape, tape.push(node))
        });
        Self { value, slot }
    }

    fn binary(self, op: BinaryOp, rhs: Self) -> Self {
        let value = op.eval(self.value, rhs.value);
        let Some(tape) = self.slot.or(rhs.slot).map(|(tape, _)| tape) else {
            return Self::constant(value);
        };
        let (dx, dy) = op.partials(self.value, rhs.value);
        let node = Node {
            parents: [
                self.slot.map(|(_, index)| (index, dx)),
                rhs.slot.map(|(_, index)| (index, dy)),
            ],
        };
        Self {
            value,
            slot: Some((tape, tape.push(node))),
        }
    }
}

impl Neg for Var<'_> {
    type Output = Self;

    fn neg(self) -> Self {
        self.unary(UnaryOp::Neg)
    }
}

macro_rules! impl_var_op {
    ($Trait:ident, $method:ident, $op:expr) => {
        impl<'t> $Trait for Var<'t> {
            type Output = Self;

            #[inline]
            fn $method(self, rhs: Self) -> Self {
                self.binary($op, rhs)
            }
        }
    };
}

impl_var_op!(Add, add, BinaryOp::Add);
impl_var_op!(Sub, sub, BinaryOp::Sub);
impl_var_op!(Mul, mul, BinaryOp::Mul);
impl_var_op!(Div, div, BinaryOp::Div);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gradient_of_two_inputs() {
        let tape = Tape::new();
        let x = tape.var(3.0);
        let y = tape.var(4.0);
        // f = x² + 2xy + y²
        let f = x * x + Var::constant(2.0) * x * y + y * y;
        assert_eq!(f.value(), 49.0);
        assert_eq!(tape.gradient(f, &[x, y]), vec![14.0, 14.0]);
    }

    #[test]
    fn reused_intermediate_accumulates() {
        let tape = Tape::new();
        let x = tape.var(2.0);
        let s = x.exp();
        let f = s * s;
        let expected = 2.0 * (4.0_f64).exp();
        assert!((tape.gradient(f, &[x])[0] - expected).abs() < 1e-12);
    }

    #[test]
    fn constants_are_not_recorded() {
        let tape = Tape::new();
        let c = Var::constant(2.0) * Var::constant(3.0);
        assert_eq!(c.value(), 6.0);
        assert!(tape.is_empty());
        let x = tape.var(1.0);
        assert_eq!(tape.gradient(c, &[x]), vec![0.0]);
    }

    #[test]
    fn unrelated_input_has_zero_gradient() {
        let tape = Tape::new();
        let x = tape.var(1.0);
        let y = tape.var(5.0);
        let f = x.unary(UnaryOp::Sin);
        assert_eq!(tape.gradient(f, &[x, y]), vec![1_f64.cos(), 0.0]);
        assert_eq!(tape.len(), 3);
    }

    #[test]
    fn several_outputs_share_a_tape() {
        let tape = Tape::new();
        let x = tape.var(2.0);
        let y = tape.var(3.0);
        let sum = x + y;
        let product = x * y;
        assert_eq!(tape.gradient(sum, &[x, y]), vec![1.0, 1.0]);
        assert_eq!(tape.gradient(product, &[x, y]), vec![3.0, 2.0]);
    }
}

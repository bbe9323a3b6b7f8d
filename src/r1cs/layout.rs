//! The canonical variable layout
//!
//! Native (compiler) order: `[1, outputs, inputs, internal]`.
//! Canonical order: `[inputs, 1, outputs, internal]`.
//!
//! Only the first `1 + n_outputs + n_inputs` wires move; internal wires keep their index.

use std::ops::Range;

pub use zkmat_opt::LayoutMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// Block sizes of a constraint system
pub struct Layout {
    /// Outputs
    pub n_outputs: usize,
    /// Public inputs
    pub n_pub_inputs: usize,
    /// Private inputs
    pub n_prv_inputs: usize,
    /// All wires, including the constant
    pub n_vars: usize,
}

impl Layout {
    /// Sizes, in the order the compiler declares them
    pub fn new(n_outputs: usize, n_pub_inputs: usize, n_prv_inputs: usize, n_vars: usize) -> Self {
        Self {
            n_outputs,
            n_pub_inputs,
            n_prv_inputs,
            n_vars,
        }
    }

    /// Public and private inputs
    pub fn n_inputs(&self) -> usize {
        self.n_pub_inputs + self.n_prv_inputs
    }

    /// The highest native index that is not an internal signal
    pub fn last_io(&self) -> usize {
        self.n_outputs + self.n_inputs()
    }

    /// Native index -> canonical index.
    pub fn to_canonical(&self, index: usize) -> usize {
        if index > self.last_io() {
            index
        } else if index > self.n_outputs {
            index - self.n_outputs - 1
        } else if index > 0 {
            index + self.n_inputs()
        } else {
            self.n_inputs()
        }
    }

    /// Canonical index -> native index; the inverse of [Layout::to_canonical].
    pub fn from_canonical(&self, index: usize) -> usize {
        let n_inputs = self.n_inputs();
        if index > self.last_io() {
            index
        } else if index < n_inputs {
            index + self.n_outputs + 1
        } else if index == n_inputs {
            0
        } else {
            index - n_inputs
        }
    }

    /// Canonical positions of the inputs
    pub fn inputs(&self) -> Range<usize> {
        0..self.n_inputs()
    }

    /// Canonical position of the constant one
    pub fn one(&self) -> usize {
        self.n_inputs()
    }

    /// Canonical positions of the outputs
    pub fn outputs(&self) -> Range<usize> {
        self.n_inputs() + 1..self.last_io() + 1
    }

    /// Positions of the internal signals (the same in both layouts)
    pub fn internals(&self) -> Range<usize> {
        self.last_io() + 1..self.n_vars.max(self.last_io() + 1)
    }
}

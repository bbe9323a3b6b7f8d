//! Rank 1 Constraint Systems, as emitted by a circuit compiler
//!
//! A system is three equally long sequences of sparse rows (A, B, C). Wires are indexed in the
//! compiler's native layout:
//! * `0`: the constant one
//! * `1 ..= n_pub_out`: outputs
//! * then public inputs, then private inputs
//! * everything above: internal signals
//!
//! [layout] maps that layout to the canonical one, [witness] reorders witnesses to match, and
//! [export] writes the reindexed system out as sparse triplets.

use itertools::Itertools;
use log::{debug, trace};
use rayon::prelude::*;
use rug::Integer;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use zkmat_fields::{FieldError, FieldT, FieldV};

pub mod export;
pub mod file;
pub mod layout;
pub mod witness;

use layout::Layout;

#[derive(Error, Debug)]
/// An error reading, checking, or exporting a constraint system
pub enum R1csError {
    #[error("Malformed constraint system: {0}")]
    /// Inconsistent sizes or out-of-range wires
    MalformedConstraintSystem(String),
    #[error("Witness has {actual} entries, but the constraint system has {expected} wires")]
    /// The witness does not match the wire count
    WitnessLengthMismatch {
        /// wires
        expected: usize,
        /// witness entries
        actual: usize,
    },
    #[error("Constraint {constraint} is not satisfied")]
    /// A witness violates a constraint
    Unsatisfied {
        /// the first failing constraint
        constraint: usize,
    },
    #[error("Constraint system is over {r1cs}, but the witness is over {witness}")]
    /// Files disagree on the prime
    FieldMismatch {
        /// the system's field
        r1cs: FieldT,
        /// the witness' field
        witness: FieldT,
    },
    #[error("Bad file: {0}")]
    /// A file does not follow its format
    Format(String),
    #[error("{0}")]
    /// I/O
    Io(#[from] std::io::Error),
    #[error("{0}")]
    /// JSON (de)serialization
    Json(#[from] serde_json::Error),
    #[error("{0}")]
    /// A bad field element
    Field(#[from] FieldError),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// A sparse row: `(wire, coefficient)` pairs in the order the compiler listed them.
pub struct Lc {
    terms: Vec<(usize, Integer)>,
}

impl Lc {
    /// The empty (zero) combination
    pub fn new() -> Self {
        Self::default()
    }
    /// Append `coeff * wire`
    pub fn push(&mut self, wire: usize, coeff: Integer) {
        self.terms.push((wire, coeff));
    }
    /// Builder form of [Lc::push]
    pub fn with(mut self, wire: usize, coeff: impl Into<Integer>) -> Self {
        self.push(wire, coeff.into());
        self
    }
    /// Terms, in source order
    pub fn terms(&self) -> &[(usize, Integer)] {
        &self.terms
    }
    /// Number of terms
    pub fn len(&self) -> usize {
        self.terms.len()
    }
    /// Is this empty?
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
    /// Evaluate against a native-indexed witness.
    pub fn eval(&self, field: &FieldT, w: &[FieldV]) -> FieldV {
        let mut acc = field.zero();
        for (wire, coeff) in &self.terms {
            acc += field.new_v(coeff) * &w[*wire];
        }
        acc
    }
}

impl FromIterator<(usize, Integer)> for Lc {
    fn from_iter<T: IntoIterator<Item = (usize, Integer)>>(iter: T) -> Self {
        Self {
            terms: iter.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
/// Sizes declared by the compiler
pub struct Header {
    /// Total wires, including the constant; `nVars`
    pub n_wires: usize,
    /// Public outputs
    pub n_pub_out: usize,
    /// Public inputs
    pub n_pub_in: usize,
    /// Private inputs
    pub n_prv_in: usize,
    /// Labels (signals before optimization)
    pub n_labels: u64,
    /// Constraints
    pub n_constraints: usize,
}

impl Header {
    /// Public and private inputs
    pub fn n_inputs(&self) -> usize {
        self.n_pub_in + self.n_prv_in
    }

    /// The canonical layout for these sizes
    pub fn layout(&self) -> Layout {
        Layout::new(self.n_pub_out, self.n_pub_in, self.n_prv_in, self.n_wires)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A compiled constraint system. Validated on construction.
pub struct R1cs {
    field: FieldT,
    header: Header,
    a: Vec<Lc>,
    b: Vec<Lc>,
    c: Vec<Lc>,
}

impl R1cs {
    /// Assemble from the three coefficient matrices.
    pub fn new(
        field: FieldT,
        header: Header,
        a: Vec<Lc>,
        b: Vec<Lc>,
        c: Vec<Lc>,
    ) -> Result<Self, R1csError> {
        let r1cs = Self {
            field,
            header,
            a,
            b,
            c,
        };
        r1cs.validate()?;
        debug!(
            "R1cs over {}: {} wires, {} constraints, {} outputs, {} inputs",
            r1cs.field,
            header.n_wires,
            header.n_constraints,
            header.n_pub_out,
            header.n_inputs()
        );
        Ok(r1cs)
    }

    /// Assemble from `a * b = c` triples.
    pub fn from_constraints(
        field: FieldT,
        header: Header,
        constraints: Vec<(Lc, Lc, Lc)>,
    ) -> Result<Self, R1csError> {
        let mut a = Vec::with_capacity(constraints.len());
        let mut b = Vec::with_capacity(constraints.len());
        let mut c = Vec::with_capacity(constraints.len());
        for (x, y, z) in constraints {
            a.push(x);
            b.push(y);
            c.push(z);
        }
        Self::new(field, header, a, b, c)
    }

    /// Check that sizes agree and every wire exists.
    pub fn validate(&self) -> Result<(), R1csError> {
        let h = &self.header;
        if self.a.len() != self.b.len() || self.a.len() != self.c.len() {
            return Err(R1csError::MalformedConstraintSystem(format!(
                "A, B, C have {}, {}, {} rows",
                self.a.len(),
                self.b.len(),
                self.c.len()
            )));
        }
        if self.a.len() != h.n_constraints {
            return Err(R1csError::MalformedConstraintSystem(format!(
                "{} rows, but {} constraints declared",
                self.a.len(),
                h.n_constraints
            )));
        }
        if h.n_wires < 1 + h.n_pub_out + h.n_inputs() {
            return Err(R1csError::MalformedConstraintSystem(format!(
                "{} wires cannot hold the constant, {} outputs and {} inputs",
                h.n_wires,
                h.n_pub_out,
                h.n_inputs()
            )));
        }
        for (name, m) in [("A", &self.a), ("B", &self.b), ("C", &self.c)] {
            for (row, lc) in m.iter().enumerate() {
                if let Some((wire, _)) = lc.terms().iter().find(|(w, _)| *w >= h.n_wires) {
                    return Err(R1csError::MalformedConstraintSystem(format!(
                        "{name}[{row}] uses wire {wire}, but there are only {} wires",
                        h.n_wires
                    )));
                }
            }
        }
        Ok(())
    }

    /// The prime field
    pub fn field(&self) -> &FieldT {
        &self.field
    }
    /// Declared sizes
    pub fn header(&self) -> &Header {
        &self.header
    }
    /// The canonical layout for this system
    pub fn layout(&self) -> Layout {
        self.header.layout()
    }
    /// A rows
    pub fn a(&self) -> &[Lc] {
        &self.a
    }
    /// B rows
    pub fn b(&self) -> &[Lc] {
        &self.b
    }
    /// C rows
    pub fn c(&self) -> &[Lc] {
        &self.c
    }
    /// Number of constraints
    pub fn num_constraints(&self) -> usize {
        self.a.len()
    }
    /// Iterate over `(a, b, c)` rows
    pub fn constraints(&self) -> impl Iterator<Item = (&Lc, &Lc, &Lc)> {
        self.a
            .iter()
            .zip(&self.b)
            .zip(&self.c)
            .map(|((a, b), c)| (a, b, c))
    }

    fn holds(&self, i: usize, w: &[FieldV]) -> bool {
        let av = self.a[i].eval(&self.field, w);
        let bv = self.b[i].eval(&self.field, w);
        let cv = self.c[i].eval(&self.field, w);
        let ok = av.clone() * &bv == cv;
        if !ok {
            debug!(
                "Bad constraint {}: {} (value {}) * {} (value {}) != {} (value {})",
                i,
                format_lc(&self.a[i]),
                av,
                format_lc(&self.b[i]),
                bv,
                format_lc(&self.c[i]),
                cv
            );
        }
        ok
    }

    /// Check `<A_i, w> * <B_i, w> = <C_i, w>` for every row, against a native-indexed witness.
    pub fn check_witness(&self, w: &[FieldV]) -> Result<(), R1csError> {
        if w.len() != self.header.n_wires {
            return Err(R1csError::WitnessLengthMismatch {
                expected: self.header.n_wires,
                actual: w.len(),
            });
        }
        if let Some(v) = w.iter().find(|v| v.modulus() != self.field.modulus()) {
            return Err(R1csError::FieldMismatch {
                r1cs: self.field.clone(),
                witness: v.ty(),
            });
        }
        if !w[0].is_one() {
            return Err(R1csError::Format(format!(
                "witness wire 0 must be 1, found {}",
                w[0]
            )));
        }
        trace!("Checking {} constraints", self.num_constraints());
        match (0..self.num_constraints())
            .into_par_iter()
            .find_first(|i| !self.holds(*i, w))
        {
            Some(constraint) => Err(R1csError::Unsatisfied { constraint }),
            None => Ok(()),
        }
    }
}

/// A human-readable combination, e.g. `+3 w1 +1 w4`
pub fn format_lc(lc: &Lc) -> String {
    if lc.is_empty() {
        return "0".to_owned();
    }
    lc.terms()
        .iter()
        .map(|(wire, coeff)| format!("+{coeff} w{wire}"))
        .join(" ")
}

//! Checking circuits against the oracle
//!
//! A [CircuitBackend] runs a compiled matrix circuit on named inputs, and can prove and verify
//! that execution. [run_case] evaluates one [Case] with both the backend and the [oracle], lifts
//! the oracle's integers into the circuit's field, and compares them before asking the backend
//! for a proof.

use log::{debug, info};
use thiserror::Error;
use zkmat_fields::{FieldT, FieldV};

use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};

use crate::oracle::{self, Entry, Matrix, OracleError};

#[derive(Error, Debug)]
/// An error checking a circuit
pub enum DriverError {
    #[error("{0}")]
    /// The oracle rejected the inputs
    Oracle(#[from] OracleError),
    #[error("Backend error: {0}")]
    /// The circuit backend failed; its error, rendered
    Backend(String),
    #[error("Case {case}: expected {expected} outputs, circuit produced {actual}")]
    /// The circuit has the wrong number of outputs
    OutputLength {
        /// case name
        case: String,
        /// oracle outputs
        expected: usize,
        /// circuit outputs
        actual: usize,
    },
    #[error("Case {case}: output {index} is {actual}, but the oracle says {expected}")]
    /// The circuit computed something else
    OutputMismatch {
        /// case name
        case: String,
        /// flat output position
        index: usize,
        /// the oracle's value, in the field
        expected: FieldV,
        /// the circuit's value
        actual: FieldV,
    },
    #[error("Missing or mistyped input '{0}'")]
    /// A case lacks an input its operation reads
    MissingInput(String),
    #[error("Case {0}: the proof was rejected")]
    /// Verification returned false
    ProofRejected(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A named circuit input
pub enum InputValue {
    /// A single signal
    Scalar(Entry),
    /// A matrix of signals
    Matrix(Matrix),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Named circuit inputs, e.g. `in1`, `in2`, `scalar`, `filter`, `dummy`
pub struct Inputs(BTreeMap<String, InputValue>);

impl Inputs {
    /// No inputs
    pub fn new() -> Self {
        Self::default()
    }
    /// Add a matrix input
    pub fn matrix(mut self, name: &str, m: Matrix) -> Self {
        self.0.insert(name.to_owned(), InputValue::Matrix(m));
        self
    }
    /// Add a scalar input
    pub fn scalar(mut self, name: &str, s: Entry) -> Self {
        self.0.insert(name.to_owned(), InputValue::Scalar(s));
        self
    }
    /// Look up an input
    pub fn get(&self, name: &str) -> Option<&InputValue> {
        self.0.get(name)
    }
    /// Look up a matrix input
    pub fn get_matrix(&self, name: &str) -> Result<&Matrix, DriverError> {
        match self.0.get(name) {
            Some(InputValue::Matrix(m)) => Ok(m),
            _ => Err(DriverError::MissingInput(name.to_owned())),
        }
    }
    /// Look up a scalar input
    pub fn get_scalar(&self, name: &str) -> Result<Entry, DriverError> {
        match self.0.get(name) {
            Some(InputValue::Scalar(s)) => Ok(*s),
            _ => Err(DriverError::MissingInput(name.to_owned())),
        }
    }
    /// All inputs, by name
    pub fn iter(&self) -> impl Iterator<Item = (&String, &InputValue)> {
        self.0.iter()
    }
}

/// A circuit's public outputs, flattened row-major
pub type Outputs = Vec<FieldV>;

/// Something that can execute, prove, and verify a compiled circuit.
pub trait CircuitBackend {
    /// A proof
    type Proof;
    /// A backend failure
    type Error: Display;

    /// Compute the witness and return the circuit's outputs
    fn run_circuit(&mut self, inputs: &Inputs) -> Result<Outputs, Self::Error>;
    /// Prove an execution
    fn generate_proof(&mut self, inputs: &Inputs) -> Result<Self::Proof, Self::Error>;
    /// Check a proof
    fn verify_proof(&mut self, proof: &Self::Proof) -> Result<bool, Self::Error>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// A matrix circuit family
pub enum Operation {
    /// `out = in1 + in2`
    Add,
    /// `out = hadamard(in1, in2)`
    Hadamard,
    /// `out = scalar * in`
    ScalarMult,
    /// `out = transpose(in)`
    Transpose,
    /// `out = in1 * in2`
    Multiply,
    /// `out = in1 * in2`, with `in2` a column vector
    MultiplyVec,
    /// `out = in * in * in`
    Power,
    /// `out = det(in)`
    Determinant,
    /// `out = convolve(in, filter)`, sliding by `stride`
    Convolution {
        /// window step
        stride: usize,
    },
}

impl Display for Operation {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Operation::Add => write!(f, "add"),
            Operation::Hadamard => write!(f, "hadamard"),
            Operation::ScalarMult => write!(f, "scalar"),
            Operation::Transpose => write!(f, "transpose"),
            Operation::Multiply => write!(f, "multiply"),
            Operation::MultiplyVec => write!(f, "multiply-vec"),
            Operation::Power => write!(f, "power"),
            Operation::Determinant => write!(f, "determinant"),
            Operation::Convolution { stride } => write!(f, "convolution/{stride}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// One circuit execution to check
pub struct Case {
    /// Human-readable label
    pub name: String,
    /// The circuit family
    pub op: Operation,
    /// Its inputs
    pub inputs: Inputs,
}

impl Case {
    /// A named case
    pub fn new(name: impl Into<String>, op: Operation, inputs: Inputs) -> Self {
        Self {
            name: name.into(),
            op,
            inputs,
        }
    }

    /// The oracle's outputs, flattened row-major as the circuit exposes them
    pub fn expected(&self) -> Result<Vec<Entry>, DriverError> {
        let i = &self.inputs;
        let m = match self.op {
            Operation::Add => oracle::add(i.get_matrix("in1")?, i.get_matrix("in2")?)?,
            Operation::Hadamard => oracle::hadamard(i.get_matrix("in1")?, i.get_matrix("in2")?)?,
            Operation::ScalarMult => {
                oracle::scalar_mult(i.get_matrix("in")?, i.get_scalar("scalar")?)
            }
            Operation::Transpose => oracle::transpose(i.get_matrix("in")?),
            Operation::Multiply | Operation::MultiplyVec => {
                return Ok(oracle::multiply_flat(
                    i.get_matrix("in1")?,
                    i.get_matrix("in2")?,
                )?)
            }
            Operation::Power => oracle::power3(i.get_matrix("in")?)?,
            Operation::Determinant => {
                return Ok(vec![oracle::determinant(i.get_matrix("in")?)?])
            }
            Operation::Convolution { stride } => {
                oracle::convolve(i.get_matrix("in")?, i.get_matrix("filter")?, stride)?
            }
        };
        Ok(m.flat().to_vec())
    }
}

/// Check one case against `backend`, returning the verified proof.
pub fn run_case<B: CircuitBackend>(
    backend: &mut B,
    case: &Case,
    field: &FieldT,
) -> Result<B::Proof, DriverError> {
    let backend_err = |e: B::Error| DriverError::Backend(e.to_string());
    let expected: Vec<FieldV> = case.expected()?.into_iter().map(|e| field.new_v(e)).collect();
    debug!("Case {} ({}): expecting {} outputs", case.name, case.op, expected.len());

    let actual = backend.run_circuit(&case.inputs).map_err(backend_err)?;
    if actual.len() != expected.len() {
        return Err(DriverError::OutputLength {
            case: case.name.clone(),
            expected: expected.len(),
            actual: actual.len(),
        });
    }
    if let Some((index, (e, a))) = expected
        .iter()
        .zip(&actual)
        .enumerate()
        .find(|(_, (e, a))| e != a)
    {
        return Err(DriverError::OutputMismatch {
            case: case.name.clone(),
            index,
            expected: e.clone(),
            actual: a.clone(),
        });
    }

    let proof = backend.generate_proof(&case.inputs).map_err(backend_err)?;
    if !backend.verify_proof(&proof).map_err(backend_err)? {
        return Err(DriverError::ProofRejected(case.name.clone()));
    }
    info!("Case {}: ok", case.name);
    Ok(proof)
}

fn m4() -> Matrix {
    Matrix::from_flat(4, 4, (0..16).collect())
}

fn m4_rev() -> Matrix {
    Matrix::from_flat(4, 4, (0..16).rev().collect())
}

/// The standard 4x4 cases each matrix circuit is checked with.
pub fn fixtures() -> Vec<Case> {
    let filter = Matrix::from_flat(2, 2, vec![2, 2, 3, 3]);
    let column = Matrix::from_flat(4, 1, vec![15, 11, 4, 1]);
    let tall = Matrix::from_flat(4, 3, vec![0, 1, 2, 4, 5, 6, 8, 9, 10, 12, 13, 14]);
    let binary = |a: Matrix, b: Matrix| Inputs::new().matrix("in1", a).matrix("in2", b);
    vec![
        Case::new(
            "m4 + m4_rev",
            Operation::Add,
            binary(m4(), m4_rev()).scalar("dummy", 0),
        ),
        Case::new(
            "m4 + m4",
            Operation::Add,
            binary(m4(), m4()).scalar("dummy", 0),
        ),
        Case::new(
            "m4 conv [[2,2],[3,3]], step 1",
            Operation::Convolution { stride: 1 },
            Inputs::new()
                .matrix("in", m4())
                .matrix("filter", filter.clone())
                .scalar("dummy", 0),
        ),
        Case::new(
            "m4 conv [[2,2],[3,3]], step 2",
            Operation::Convolution { stride: 2 },
            Inputs::new()
                .matrix("in", m4())
                .matrix("filter", filter)
                .scalar("dummy", 0),
        ),
        Case::new(
            "det(m4)",
            Operation::Determinant,
            Inputs::new().matrix("in", m4()).scalar("dummy", 0),
        ),
        Case::new("m4 hadamard m4_rev", Operation::Hadamard, binary(m4(), m4_rev())),
        Case::new("m4 hadamard m4", Operation::Hadamard, binary(m4(), m4())),
        Case::new(
            "m4 * m4_rev",
            Operation::Multiply,
            binary(m4(), m4_rev()).scalar("dummy", 0),
        ),
        Case::new(
            "m4 * m4",
            Operation::Multiply,
            binary(m4(), m4()).scalar("dummy", 0),
        ),
        Case::new(
            "m4 * [15, 11, 4, 1]",
            Operation::MultiplyVec,
            binary(m4(), column).scalar("dummy", 0),
        ),
        Case::new(
            "m4 ** 3",
            Operation::Power,
            Inputs::new().matrix("in", m4()).scalar("dummy", 0),
        ),
        Case::new(
            "m4 * 3",
            Operation::ScalarMult,
            Inputs::new()
                .matrix("in", m4())
                .scalar("scalar", 3)
                .scalar("dummy", 0),
        ),
        Case::new(
            "transpose 4x3",
            Operation::Transpose,
            Inputs::new().matrix("in", tall),
        ),
    ]
}

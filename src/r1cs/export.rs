//! Export a constraint system and witness in the canonical layout
//!
//! The document is JSON:
//!
//! ```json
//! {
//!   "nInputs": 3, "nOutputs": 1, "nVars": 6, "nConstraints": 2,
//!   "wtns": ["3", "5", "7", "1", "22", "15"],
//!   "constraints": { "A": [[0, 0, "1"]], "B": [[0, 1, "1"]], "C": [[0, 5, "1"]] }
//! }
//! ```
//!
//! Every field element is a decimal string; counts and indices are plain numbers.

use fxhash::FxHashMap as HashMap;
use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};
use zkmat_fields::{FieldT, FieldV};

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use super::layout::{Layout, LayoutMode};
use super::witness::reindex_witness;
use super::{Lc, R1cs, R1csError};

/// `(constraint, canonical column, coefficient)`
pub type Triplet = (usize, usize, String);

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
/// The three coefficient matrices as sparse triplets
pub struct ExportedConstraints {
    /// A entries
    #[serde(rename = "A")]
    pub a: Vec<Triplet>,
    /// B entries
    #[serde(rename = "B")]
    pub b: Vec<Triplet>,
    /// C entries
    #[serde(rename = "C")]
    pub c: Vec<Triplet>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// A reindexed constraint system with its witness
pub struct ExportDoc {
    /// Public and private inputs
    #[serde(rename = "nInputs")]
    pub n_inputs: usize,
    /// Outputs
    #[serde(rename = "nOutputs")]
    pub n_outputs: usize,
    /// All wires
    #[serde(rename = "nVars")]
    pub n_vars: usize,
    /// Constraints
    #[serde(rename = "nConstraints")]
    pub n_constraints: usize,
    /// Canonical witness
    pub wtns: Vec<String>,
    /// Canonical constraints
    pub constraints: ExportedConstraints,
}

fn export_matrix(name: &str, rows: &[Lc], field: &FieldT, layout: &Layout) -> Vec<Triplet> {
    let mut out = Vec::new();
    for (i, lc) in rows.iter().enumerate() {
        for (wire, coeff) in lc.terms() {
            let coeff = field.new_v(coeff);
            if coeff.is_zero() {
                continue;
            }
            let col = layout.to_canonical(*wire);
            trace!("{name}: ({i}, {wire} -> {col}, {coeff})");
            out.push((i, col, coeff.to_string()));
        }
    }
    out
}

/// Reindex the columns of every nonzero coefficient, keeping row order and in-row order.
///
/// Coefficients are written as their canonical residue mod the field prime.
pub fn export_constraints(r1cs: &R1cs) -> Result<ExportedConstraints, R1csError> {
    r1cs.validate()?;
    let layout = r1cs.layout();
    let field = r1cs.field();
    Ok(ExportedConstraints {
        a: export_matrix("A", r1cs.a(), field, &layout),
        b: export_matrix("B", r1cs.b(), field, &layout),
        c: export_matrix("C", r1cs.c(), field, &layout),
    })
}

/// Build the export document for `r1cs` and its native-indexed witness.
pub fn export(r1cs: &R1cs, witness: &[FieldV], mode: LayoutMode) -> Result<ExportDoc, R1csError> {
    let header = r1cs.header();
    let layout = r1cs.layout();
    if let Some(v) = witness.iter().find(|v| v.modulus() != r1cs.field().modulus()) {
        return Err(R1csError::FieldMismatch {
            r1cs: r1cs.field().clone(),
            witness: v.ty(),
        });
    }
    let wtns = reindex_witness(witness, r1cs.field().one(), &layout, mode)?
        .iter()
        .map(FieldV::to_string)
        .collect();
    if mode == LayoutMode::Reference {
        warn!(
            "Reference layout: native wire {} is repeated at canonical index {}; later entries are shifted by one",
            layout.last_io(),
            layout.last_io() + 1
        );
    }
    let constraints = export_constraints(r1cs)?;
    debug!(
        "Exported {} constraints: {} A, {} B, {} C entries",
        header.n_constraints,
        constraints.a.len(),
        constraints.b.len(),
        constraints.c.len()
    );
    Ok(ExportDoc {
        n_inputs: header.n_inputs(),
        n_outputs: header.n_pub_out,
        n_vars: header.n_wires,
        n_constraints: header.n_constraints,
        wtns,
        constraints,
    })
}

impl ExportDoc {
    /// Serialize to a JSON string
    pub fn to_json(&self, pretty: bool) -> Result<String, R1csError> {
        Ok(if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        })
    }

    /// Write as JSON
    pub fn write_json<P: AsRef<Path>>(&self, path: P, pretty: bool) -> Result<(), R1csError> {
        let mut file = BufWriter::new(File::create(path)?);
        if pretty {
            serde_json::to_writer_pretty(&mut file, self)?;
        } else {
            serde_json::to_writer(&mut file, self)?;
        }
        file.flush()?;
        Ok(())
    }

    /// Read from JSON
    pub fn read_json<P: AsRef<Path>>(path: P) -> Result<Self, R1csError> {
        Ok(serde_json::from_reader(BufReader::new(File::open(path)?))?)
    }

    /// Check every constraint against the document's own (canonical) witness.
    ///
    /// Only meaningful when `wtns` is a permutation of the native witness; see [LayoutMode].
    pub fn check(&self, field: &FieldT) -> Result<(), R1csError> {
        if self.wtns.len() != self.n_vars {
            return Err(R1csError::WitnessLengthMismatch {
                expected: self.n_vars,
                actual: self.wtns.len(),
            });
        }
        let w = self
            .wtns
            .iter()
            .map(|s| field.parse_v(s))
            .collect::<Result<Vec<_>, _>>()?;
        let a = self.eval_rows(field, &self.constraints.a, &w)?;
        let b = self.eval_rows(field, &self.constraints.b, &w)?;
        let c = self.eval_rows(field, &self.constraints.c, &w)?;
        for i in 0..self.n_constraints {
            let ab = a.get(&i).cloned().unwrap_or_else(|| field.zero())
                * b.get(&i).cloned().unwrap_or_else(|| field.zero());
            let cv = c.get(&i).cloned().unwrap_or_else(|| field.zero());
            if ab != cv {
                debug!("Exported constraint {i}: {ab} != {cv}");
                return Err(R1csError::Unsatisfied { constraint: i });
            }
        }
        Ok(())
    }

    fn eval_rows(
        &self,
        field: &FieldT,
        triplets: &[Triplet],
        w: &[FieldV],
    ) -> Result<HashMap<usize, FieldV>, R1csError> {
        let mut rows: HashMap<usize, FieldV> = HashMap::default();
        for (row, col, value) in triplets {
            if *row >= self.n_constraints || *col >= w.len() {
                return Err(R1csError::MalformedConstraintSystem(format!(
                    "entry ({row}, {col}) outside {} constraints x {} wires",
                    self.n_constraints,
                    w.len()
                )));
            }
            let term = field.parse_v(value)? * &w[*col];
            *rows.entry(*row).or_insert_with(|| field.zero()) += term;
        }
        Ok(rows)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::r1cs::test::{mul_add, mul_add_witness};
    use crate::r1cs::{Header, Lc};

    #[test]
    fn triplets_use_canonical_columns() {
        // native [1, out, x, y, z, t] -> canonical [x, y, z, 1, out, t]
        let c = export_constraints(&mul_add()).unwrap();
        let minus_one = (FieldT::Bn254.modulus().clone() - 1u32).to_string();
        assert_eq!(c.a, vec![(0, 0, "1".to_owned())]);
        assert_eq!(c.b, vec![(0, 1, "1".to_owned())]);
        assert_eq!(
            c.c,
            vec![
                (0, 5, "1".to_owned()),
                (1, 5, "1".to_owned()),
                (1, 2, "1".to_owned()),
                (1, 4, minus_one),
            ]
        );
    }

    #[test]
    fn source_order_and_zeros() {
        let header = Header {
            n_wires: 4,
            n_pub_out: 1,
            n_pub_in: 1,
            n_prv_in: 0,
            n_labels: 4,
            n_constraints: 1,
        };
        let r1cs = R1cs::from_constraints(
            FieldT::Bn254,
            header,
            vec![(
                Lc::new().with(3, 2).with(0, 0).with(1, 5).with(2, 7),
                Lc::new().with(0, 1),
                Lc::new(),
            )],
        )
        .unwrap();
        let c = export_constraints(&r1cs).unwrap();
        let cols: Vec<usize> = c.a.iter().map(|t| t.1).collect();
        // wire 3 internal stays, wire 1 output -> 1 + 1, wire 2 input -> 0
        assert_eq!(cols, vec![3, 2, 0]);
        assert_eq!(c.b, vec![(0, 1, "1".to_owned())]);
        assert!(c.c.is_empty());
    }

    #[test]
    fn big_coefficients_are_exact() {
        let header = Header {
            n_wires: 2,
            n_pub_out: 1,
            n_pub_in: 0,
            n_prv_in: 0,
            n_labels: 2,
            n_constraints: 1,
        };
        let minus_one = FieldT::Bn254.modulus().clone() - 1u32;
        let r1cs = R1cs::from_constraints(
            FieldT::Bn254,
            header,
            vec![(Lc::new(), Lc::new(), Lc::new().with(1, minus_one.clone()))],
        )
        .unwrap();
        let doc = export(
            &r1cs,
            &[FieldT::Bn254.one(), FieldT::Bn254.zero()],
            LayoutMode::Corrected,
        )
        .unwrap();
        assert_eq!(doc.constraints.c[0].2, minus_one.to_string());
        let json = doc.to_json(false).unwrap();
        assert!(json.contains(&format!("\"{}\"", minus_one)));
        doc.check(&FieldT::Bn254).unwrap();
    }

    #[test]
    fn document_fields() {
        let doc = export(&mul_add(), &mul_add_witness(3, 5, 7), LayoutMode::Corrected).unwrap();
        assert_eq!(doc.n_inputs, 3);
        assert_eq!(doc.n_outputs, 1);
        assert_eq!(doc.n_vars, 6);
        assert_eq!(doc.n_constraints, 2);
        assert_eq!(doc.wtns, vec!["3", "5", "7", "1", "22", "15"]);
        let json: serde_json::Value = serde_json::from_str(&doc.to_json(true).unwrap()).unwrap();
        assert_eq!(json["nInputs"], 3);
        assert_eq!(json["nVars"], 6);
        assert_eq!(json["wtns"][4], "22");
        assert_eq!(json["constraints"]["A"][0], serde_json::json!([0, 0, "1"]));
    }

    #[test]
    fn corrected_export_is_satisfied() {
        let doc = export(&mul_add(), &mul_add_witness(4, -2, 9), LayoutMode::Corrected).unwrap();
        doc.check(&FieldT::Bn254).unwrap();
    }

    #[test]
    fn reference_export_shape() {
        let doc = export(&mul_add(), &mul_add_witness(3, 5, 7), LayoutMode::Reference).unwrap();
        // the last input (z = 7) is repeated ahead of the internal signal
        assert_eq!(doc.wtns, vec!["3", "5", "7", "1", "22", "7", "15"]);
        assert!(matches!(
            doc.check(&FieldT::Bn254),
            Err(R1csError::WitnessLengthMismatch {
                expected: 6,
                actual: 7
            })
        ));
    }

    #[test]
    fn broken_witness_fails_check() {
        let mut doc =
            export(&mul_add(), &mul_add_witness(3, 5, 7), LayoutMode::Corrected).unwrap();
        doc.wtns[4] = "21".to_owned();
        assert!(matches!(
            doc.check(&FieldT::Bn254),
            Err(R1csError::Unsatisfied { constraint: 1 })
        ));
    }

    #[test]
    fn field_mismatch() {
        let w: Vec<FieldV> = mul_add_witness(1, 2, 3)
            .into_iter()
            .map(|v| FieldT::Bls12381.new_v(v.i()))
            .collect();
        assert!(matches!(
            export(&mul_add(), &w, LayoutMode::Corrected),
            Err(R1csError::FieldMismatch { .. })
        ));
    }

    #[test]
    fn json_file_round_trip() {
        let path = std::env::temp_dir().join(format!("zkmat-export-{}.json", std::process::id()));
        let doc = export(&mul_add(), &mul_add_witness(3, 5, 7), LayoutMode::Reference).unwrap();
        doc.write_json(&path, true).unwrap();
        assert_eq!(ExportDoc::read_json(&path).unwrap(), doc);
        std::fs::remove_file(&path).unwrap();
    }
}

//! iden3 binary files: `.r1cs` constraint systems and `.wtns` witnesses
//!
//! Both formats start with a 4-byte magic, a `u32` version and a `u32` section count. Each
//! section is a `u32` type, a `u64` byte length, then its body. Integers are little-endian and
//! field elements are `n8` little-endian bytes.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use fxhash::FxHashMap as HashMap;
use log::debug;
use rug::integer::Order;
use rug::Integer;
use zkmat_fields::{FieldT, FieldV};

use std::fs::File;
use std::io::{BufReader, BufWriter, Cursor, Read, Write};
use std::path::Path;

use super::{Header, Lc, R1cs, R1csError};

const R1CS_MAGIC: &[u8; 4] = b"r1cs";
const R1CS_VERSION: u32 = 1;
const R1CS_HEADER: u32 = 1;
const R1CS_CONSTRAINTS: u32 = 2;
const R1CS_WIRE2LABEL: u32 = 3;

const WTNS_MAGIC: &[u8; 4] = b"wtns";
const WTNS_VERSION: u32 = 2;
const WTNS_HEADER: u32 = 1;
const WTNS_DATA: u32 = 2;

fn bad(msg: impl Into<String>) -> R1csError {
    R1csError::Format(msg.into())
}

/// Read all sections, keyed by type. Later duplicates are an error.
fn read_sections<R: Read>(
    mut r: R,
    magic: &[u8; 4],
    version: u32,
) -> Result<HashMap<u32, Vec<u8>>, R1csError> {
    let mut found = [0u8; 4];
    r.read_exact(&mut found)?;
    if &found != magic {
        return Err(bad(format!(
            "expected magic {:?}, found {:?}",
            String::from_utf8_lossy(magic),
            String::from_utf8_lossy(&found)
        )));
    }
    let v = r.read_u32::<LittleEndian>()?;
    if v != version {
        return Err(bad(format!("unsupported version {v}, expected {version}")));
    }
    let n_sections = r.read_u32::<LittleEndian>()?;
    let mut sections = HashMap::default();
    for _ in 0..n_sections {
        let ty = r.read_u32::<LittleEndian>()?;
        let size = r.read_u64::<LittleEndian>()?;
        let mut body = Vec::new();
        (&mut r).take(size).read_to_end(&mut body)?;
        if body.len() as u64 != size {
            return Err(bad(format!("section {ty} truncated")));
        }
        if sections.insert(ty, body).is_some() {
            return Err(bad(format!("duplicate section {ty}")));
        }
    }
    Ok(sections)
}

fn to_u32(n: usize, what: &str) -> Result<u32, R1csError> {
    u32::try_from(n).map_err(|_| bad(format!("{what} {n} does not fit in a u32")))
}

fn write_section<W: Write>(w: &mut W, ty: u32, body: &[u8]) -> Result<(), R1csError> {
    w.write_u32::<LittleEndian>(ty)?;
    w.write_u64::<LittleEndian>(body.len() as u64)?;
    w.write_all(body)?;
    Ok(())
}

fn read_prime<R: Read>(r: &mut R) -> Result<(usize, FieldT), R1csError> {
    let n8 = r.read_u32::<LittleEndian>()? as usize;
    if n8 == 0 || n8 % 8 != 0 {
        return Err(bad(format!("field element size {n8} is not a positive multiple of 8")));
    }
    let mut prime = Vec::new();
    (&mut *r).take(n8 as u64).read_to_end(&mut prime)?;
    if prime.len() != n8 {
        return Err(bad(format!("prime truncated: {} of {n8} bytes", prime.len())));
    }
    let prime = Integer::from_digits(&prime, Order::Lsf);
    if prime < 2 {
        return Err(bad(format!("bad prime {prime}")));
    }
    Ok((n8, FieldT::from(prime)))
}

fn write_prime<W: Write>(w: &mut W, n8: usize, field: &FieldT) -> Result<(), R1csError> {
    let mut bytes = field.modulus().to_digits::<u8>(Order::Lsf);
    if bytes.len() > n8 {
        return Err(bad(format!("{field} does not fit in {n8} bytes")));
    }
    bytes.resize(n8, 0);
    w.write_u32::<LittleEndian>(to_u32(n8, "field element size")?)?;
    w.write_all(&bytes)?;
    Ok(())
}

fn read_element<R: Read>(r: &mut R, n8: usize) -> Result<Integer, R1csError> {
    let mut bytes = vec![0u8; n8];
    r.read_exact(&mut bytes)?;
    Ok(Integer::from_digits(&bytes, Order::Lsf))
}

fn read_lc<R: Read>(r: &mut R, n8: usize) -> Result<Lc, R1csError> {
    let n_terms = r.read_u32::<LittleEndian>()?;
    let mut lc = Lc::new();
    for _ in 0..n_terms {
        let wire = r.read_u32::<LittleEndian>()? as usize;
        lc.push(wire, read_element(r, n8)?);
    }
    Ok(lc)
}

fn write_lc<W: Write>(w: &mut W, lc: &Lc, field: &FieldT, n8: usize) -> Result<(), R1csError> {
    w.write_u32::<LittleEndian>(to_u32(lc.len(), "term count")?)?;
    for (wire, coeff) in lc.terms() {
        w.write_u32::<LittleEndian>(to_u32(*wire, "wire")?)?;
        w.write_all(&field.new_v(coeff).to_le_bytes(n8)?)?;
    }
    Ok(())
}

/// Read a `.r1cs` constraint system.
pub fn read_r1cs<R: Read>(r: R) -> Result<R1cs, R1csError> {
    let sections = read_sections(r, R1CS_MAGIC, R1CS_VERSION)?;
    let header_bytes = sections
        .get(&R1CS_HEADER)
        .ok_or_else(|| bad("missing header section"))?;
    let mut h = Cursor::new(header_bytes);
    let (n8, field) = read_prime(&mut h)?;
    let header = Header {
        n_wires: h.read_u32::<LittleEndian>()? as usize,
        n_pub_out: h.read_u32::<LittleEndian>()? as usize,
        n_pub_in: h.read_u32::<LittleEndian>()? as usize,
        n_prv_in: h.read_u32::<LittleEndian>()? as usize,
        n_labels: h.read_u64::<LittleEndian>()?,
        n_constraints: h.read_u32::<LittleEndian>()? as usize,
    };
    debug!("r1cs header: {:?} over {}", header, field);

    let constraint_bytes = sections
        .get(&R1CS_CONSTRAINTS)
        .ok_or_else(|| bad("missing constraints section"))?;
    let mut c = Cursor::new(constraint_bytes);
    // each constraint holds at least three term counts
    let mut constraints = Vec::with_capacity(header.n_constraints.min(constraint_bytes.len() / 12));
    for _ in 0..header.n_constraints {
        let a = read_lc(&mut c, n8)?;
        let b = read_lc(&mut c, n8)?;
        let cc = read_lc(&mut c, n8)?;
        constraints.push((a, b, cc));
    }
    if c.position() != constraint_bytes.len() as u64 {
        return Err(bad(format!(
            "{} trailing bytes after {} constraints",
            constraint_bytes.len() as u64 - c.position(),
            header.n_constraints
        )));
    }
    R1cs::from_constraints(field, header, constraints)
}

/// Read a `.r1cs` file.
pub fn read_r1cs_file<P: AsRef<Path>>(path: P) -> Result<R1cs, R1csError> {
    read_r1cs(BufReader::new(File::open(path)?))
}

/// Write a `.r1cs` constraint system. Labels are the identity map on wires.
pub fn write_r1cs<W: Write>(mut w: W, r1cs: &R1cs) -> Result<(), R1csError> {
    let field = r1cs.field();
    let n8 = field.n8();
    let h = r1cs.header();

    let mut header = Vec::new();
    write_prime(&mut header, n8, field)?;
    for (n, what) in [
        (h.n_wires, "wire count"),
        (h.n_pub_out, "output count"),
        (h.n_pub_in, "public input count"),
        (h.n_prv_in, "private input count"),
    ] {
        header.write_u32::<LittleEndian>(to_u32(n, what)?)?;
    }
    header.write_u64::<LittleEndian>(h.n_labels)?;
    header.write_u32::<LittleEndian>(to_u32(h.n_constraints, "constraint count")?)?;

    let mut constraints = Vec::new();
    for (a, b, c) in r1cs.constraints() {
        write_lc(&mut constraints, a, field, n8)?;
        write_lc(&mut constraints, b, field, n8)?;
        write_lc(&mut constraints, c, field, n8)?;
    }

    let mut labels = Vec::new();
    for i in 0..h.n_wires {
        labels.write_u64::<LittleEndian>(i as u64)?;
    }

    w.write_all(R1CS_MAGIC)?;
    w.write_u32::<LittleEndian>(R1CS_VERSION)?;
    w.write_u32::<LittleEndian>(3)?;
    write_section(&mut w, R1CS_HEADER, &header)?;
    write_section(&mut w, R1CS_CONSTRAINTS, &constraints)?;
    write_section(&mut w, R1CS_WIRE2LABEL, &labels)?;
    Ok(())
}

/// Read a `.wtns` witness and the field it is over.
pub fn read_wtns<R: Read>(r: R) -> Result<(FieldT, Vec<FieldV>), R1csError> {
    let sections = read_sections(r, WTNS_MAGIC, WTNS_VERSION)?;
    let header_bytes = sections
        .get(&WTNS_HEADER)
        .ok_or_else(|| bad("missing witness header section"))?;
    let mut h = Cursor::new(header_bytes);
    let (n8, field) = read_prime(&mut h)?;
    let n = h.read_u32::<LittleEndian>()? as usize;

    let data = sections
        .get(&WTNS_DATA)
        .ok_or_else(|| bad("missing witness data section"))?;
    if data.len() != n * n8 {
        return Err(bad(format!(
            "witness data has {} bytes, expected {} x {}",
            data.len(),
            n,
            n8
        )));
    }
    let values = data.chunks(n8).map(|b| field.from_le_bytes(b)).collect();
    debug!("wtns: {} values over {}", n, field);
    Ok((field, values))
}

/// Read a `.wtns` file.
pub fn read_wtns_file<P: AsRef<Path>>(path: P) -> Result<(FieldT, Vec<FieldV>), R1csError> {
    read_wtns(BufReader::new(File::open(path)?))
}

/// Write a `.wtns` witness.
pub fn write_wtns<W: Write>(mut w: W, field: &FieldT, values: &[FieldV]) -> Result<(), R1csError> {
    let n8 = field.n8();
    let mut header = Vec::new();
    write_prime(&mut header, n8, field)?;
    header.write_u32::<LittleEndian>(to_u32(values.len(), "witness length")?)?;

    let mut data = Vec::with_capacity(values.len() * n8);
    for v in values {
        data.extend(v.to_le_bytes(n8)?);
    }

    w.write_all(WTNS_MAGIC)?;
    w.write_u32::<LittleEndian>(WTNS_VERSION)?;
    w.write_u32::<LittleEndian>(2)?;
    write_section(&mut w, WTNS_HEADER, &header)?;
    write_section(&mut w, WTNS_DATA, &data)?;
    Ok(())
}

/// Write a `.wtns` file.
pub fn write_wtns_file<P: AsRef<Path>>(
    path: P,
    field: &FieldT,
    values: &[FieldV],
) -> Result<(), R1csError> {
    let mut file = BufWriter::new(File::create(path)?);
    write_wtns(&mut file, field, values)?;
    file.flush()?;
    Ok(())
}

/// Read a JSON witness export: an array of decimal strings (or small numbers).
pub fn read_witness_json<R: Read>(r: R, field: &FieldT) -> Result<Vec<FieldV>, R1csError> {
    let raw: Vec<serde_json::Value> = serde_json::from_reader(r)?;
    raw.iter()
        .map(|v| match v {
            serde_json::Value::String(s) => Ok(field.parse_v(s)?),
            serde_json::Value::Number(n) => Ok(field.parse_v(&n.to_string())?),
            other => Err(bad(format!("witness entry {other} is not a number"))),
        })
        .collect()
}

/// Read a witness from either a `.json` export or a binary `.wtns` file, checking it is over
/// `field`.
pub fn read_witness_file<P: AsRef<Path>>(
    path: P,
    field: &FieldT,
) -> Result<Vec<FieldV>, R1csError> {
    let path = path.as_ref();
    if path.extension().map_or(false, |e| e == "json") {
        read_witness_json(BufReader::new(File::open(path)?), field)
    } else {
        let (wtns_field, values) = read_wtns_file(path)?;
        if &wtns_field != field {
            return Err(R1csError::FieldMismatch {
                r1cs: field.clone(),
                witness: wtns_field,
            });
        }
        Ok(values)
    }
}

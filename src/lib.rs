//! # zkmat
//!
//! Ground truth and plumbing for matrix circuits: an integer [oracle] for each matrix operation,
//! a [driver] that checks a circuit backend against it, and an [r1cs] pipeline that reorders a
//! compiled circuit's constraint system and witness into the canonical layout and exports them.

#![warn(missing_docs)]

pub mod cfg;
pub mod driver;
pub mod oracle;
pub mod r1cs;

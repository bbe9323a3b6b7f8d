//! Options for zkmat.
//!
//! ## Contents
//!
//! * A type for zkmat options [ZkmatOpt] containing fields for module options:
//!    * `field`: [FieldOpt]
//!    * `layout`: [LayoutOpt]
//!    * `export`: [ExportOpt]
//!    * all options types implement:
//!       * std's [Default]
//!       * clap's [Args]; all options are settable by
//!          * environmental variable (SHOUTY_SNEK_CASE), e.g., `"LAYOUT_MODE"`
//!          * long option (kebab-case), e.g., `"--layout-mode"`
//!       * these a guaranteed to agree (and we test this)
//!
//! ## Embedding in a binary
//!
//! ```rust
//! use zkmat_opt::{ZkmatOpt, clap::Parser};
//!
//! #[derive(Parser, Debug)]
//! struct BinaryOpt {
//!     #[command(flatten)]
//!     pub zkmat: ZkmatOpt,
//! }
//!
//! fn main() {
//!     let opt = BinaryOpt::parse();
//! }
//! ```

use clap::{ArgAction, Args, ValueEnum};

use std::default::Default;

/// Re-export our version of clap.
pub use clap;

#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
/// Options that configure zkmat
pub struct ZkmatOpt {
    /// Options for the prime field used
    #[command(flatten)]
    pub field: FieldOpt,
    /// Options for the canonical variable layout
    #[command(flatten)]
    pub layout: LayoutOpt,
    /// Options for the exported document
    #[command(flatten)]
    pub export: ExportOpt,
}

/// Options for the prime field used
#[derive(Args, Debug, Default, Clone, PartialEq, Eq)]
pub struct FieldOpt {
    /// Which field to use
    #[arg(
        long = "field-builtin",
        env = "FIELD_BUILTIN",
        value_enum,
        default_value = "bn254"
    )]
    pub builtin: BuiltinField,

    /// Which modulus to use (overrides [FieldOpt::builtin])
    #[arg(
        long = "field-custom-modulus",
        env = "FIELD_CUSTOM_MODULUS",
        default_value = ""
    )]
    pub custom_modulus: String,
}

#[derive(ValueEnum, Debug, PartialEq, Eq, Clone, Copy, Default)]
/// Which field to use
pub enum BuiltinField {
    /// BN-254 scalar field (circom's default prime)
    #[default]
    Bn254,
    /// BLS12-381 scalar field
    Bls12381,
    /// curve25519 scalar field
    Curve25519,
}

/// Options for the canonical variable layout
#[derive(Args, Debug, Default, Clone, PartialEq, Eq)]
pub struct LayoutOpt {
    /// How to lay out the canonical witness
    #[arg(
        long = "layout-mode",
        env = "LAYOUT_MODE",
        value_enum,
        default_value = "reference"
    )]
    pub mode: LayoutMode,
}

#[derive(ValueEnum, Debug, PartialEq, Eq, Clone, Copy, Default)]
/// How the canonical witness tail is sliced
pub enum LayoutMode {
    /// Match existing exported fixtures: the internal-signal block starts at the last input,
    /// so the witness is one entry longer than the number of wires.
    #[default]
    Reference,
    /// A true permutation of the native witness.
    Corrected,
}

/// Options for the exported document
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct ExportOpt {
    /// Indent the JSON output
    #[arg(
        long = "export-pretty",
        env = "EXPORT_PRETTY",
        action = ArgAction::Set,
        default_value = "true"
    )]
    pub pretty: bool,

    /// Check the exported constraints against the exported witness
    #[arg(
        long = "export-check",
        env = "EXPORT_CHECK",
        action = ArgAction::Set,
        default_value = "false"
    )]
    pub check: bool,
}

impl Default for ExportOpt {
    fn default() -> Self {
        Self {
            pretty: true,
            check: false,
        }
    }
}

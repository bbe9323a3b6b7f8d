//! zkmat Configuration
//!
//! [ZkmatCfg] resolves a [ZkmatOpt] (parsed from the command line or environment) into the
//! values the core needs. There is no process-wide configuration: build a [ZkmatCfg] and pass
//! what you need from it explicitly.

use zkmat_fields::FieldT;

use rug::Integer;
use thiserror::Error;

use std::convert::TryFrom;
use std::default::Default;

/// Re-export our clap version
pub use zkmat_opt::clap;
/// Re-export our clap [clap::Args]
pub use zkmat_opt::ZkmatOpt;

use crate::r1cs::layout::LayoutMode;

#[derive(Error, Debug, PartialEq, Eq)]
/// A bad configuration
pub enum CfgError {
    #[error("The field modulus '{0}' is not an integer")]
    /// The custom modulus does not parse
    NotAnInteger(String),
    #[error("The field modulus '{0}' is not a prime")]
    /// The custom modulus is composite (or too small)
    NotPrime(Integer),
}

/// A zkmat configuration. Constructible [TryFrom::try_from] [ZkmatOpt].
#[derive(Clone, Debug)]
pub struct ZkmatCfg {
    opt: ZkmatOpt,
    field: FieldT,
}

impl TryFrom<ZkmatOpt> for ZkmatCfg {
    type Error = CfgError;
    fn try_from(opt: ZkmatOpt) -> Result<Self, CfgError> {
        let field = if !opt.field.custom_modulus.is_empty() {
            let i = Integer::from_str_radix(opt.field.custom_modulus.trim(), 10)
                .map_err(|_| CfgError::NotAnInteger(opt.field.custom_modulus.clone()))?;
            if i < 2 || i.is_probably_prime(30) == rug::integer::IsPrime::No {
                return Err(CfgError::NotPrime(i));
            }
            FieldT::from(i)
        } else {
            match opt.field.builtin {
                zkmat_opt::BuiltinField::Bn254 => FieldT::Bn254,
                zkmat_opt::BuiltinField::Bls12381 => FieldT::Bls12381,
                zkmat_opt::BuiltinField::Curve25519 => FieldT::Curve25519,
            }
        };
        Ok(Self { opt, field })
    }
}

impl Default for ZkmatCfg {
    fn default() -> Self {
        Self {
            opt: ZkmatOpt::default(),
            field: FieldT::Bn254,
        }
    }
}

/// Used to expose all fields of [ZkmatOpt].
impl std::ops::Deref for ZkmatCfg {
    type Target = ZkmatOpt;

    fn deref(&self) -> &Self::Target {
        &self.opt
    }
}

/// Additional functionality
impl ZkmatCfg {
    /// The field circuit values live in
    pub fn field(&self) -> &FieldT {
        &self.field
    }
    /// How witnesses are laid out on export
    pub fn layout_mode(&self) -> LayoutMode {
        self.opt.layout.mode
    }
}

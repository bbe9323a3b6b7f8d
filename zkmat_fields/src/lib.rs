//! Prime fields for lifting oracle results and checking witnesses

use once_cell::sync::Lazy;
use paste::paste;
use rug::{
    integer::Order,
    ops::{RemRounding, RemRoundingAssign},
    Integer,
};
use std::fmt::{self, Display, Formatter};
use std::ops::{Add, AddAssign, Mul, MulAssign, Neg, Sub, SubAssign};
use std::sync::Arc;
use thiserror::Error;


/// Field moduli
pub mod moduli {
    use super::*;

    /// BN254 scalar field; the default circom prime
    pub static F_BN254_FMOD: Lazy<Arc<Integer>> = Lazy::new(|| {
        Arc::new(
            Integer::from_str_radix(
                "21888242871839275222246405745257275088548364400416034343698204186575808495617",
                10,
            )
            .unwrap(),
        )
    });
    /// BLS12-381 scalar field
    pub static F_BLS12381_FMOD: Lazy<Arc<Integer>> = Lazy::new(|| {
        Arc::new(
            Integer::from_str_radix(
                "52435875175126190479447740508185965837690552500527637822603658699938581184513",
                10,
            )
            .unwrap(),
        )
    });
    /// Scalar field of curve25519/ristretto255, as used by Spartan
    pub static F_CURVE25519_FMOD: Lazy<Arc<Integer>> = Lazy::new(|| {
        Arc::new(
            Integer::from_str_radix(
                "7237005577332262213973186563042994240857116359379907606001950938285454250989",
                10,
            )
            .unwrap(),
        )
    });
}

use moduli::{F_BLS12381_FMOD, F_BN254_FMOD, F_CURVE25519_FMOD};

#[derive(Error, Debug, PartialEq, Eq)]
/// An error building a field element
pub enum FieldError {
    #[error("'{0}' is not a decimal integer")]
    /// Not a decimal integer
    Parse(String),
    #[error("{len} byte element does not fit the {n8} byte representation")]
    /// Too many bytes for the field
    TooWide {
        /// bytes given
        len: usize,
        /// bytes expected
        n8: usize,
    },
}

#[derive(PartialEq, Eq, Clone, Debug, PartialOrd, Ord, Hash)]
/// A prime field
pub enum FieldT {
    /// BN254 scalar field
    Bn254,
    /// BLS12-381 scalar field
    Bls12381,
    /// curve25519 scalar field
    Curve25519,
    /// Some other prime
    IntField(Arc<Integer>),
}

impl Display for FieldT {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::Bn254 => write!(f, "FieldT::Bn254"),
            Self::Bls12381 => write!(f, "FieldT::Bls12381"),
            Self::Curve25519 => write!(f, "FieldT::Curve25519"),
            Self::IntField(m) => write!(f, "FieldT::(mod {})", &**m),
        }
    }
}

impl From<Integer> for FieldT {
    fn from(m: Integer) -> Self {
        match &m {
            m if m == &**F_BN254_FMOD => Self::Bn254,
            m if m == &**F_BLS12381_FMOD => Self::Bls12381,
            m if m == &**F_CURVE25519_FMOD => Self::Curve25519,
            _ => Self::IntField(Arc::new(m)),
        }
    }
}

impl From<&Integer> for FieldT {
    fn from(m: &Integer) -> Self {
        Self::from(m.clone())
    }
}

impl FieldT {
    #[inline]
    pub fn modulus(&self) -> &Integer {
        match self {
            Self::Bn254 => &F_BN254_FMOD,
            Self::Bls12381 => &F_BLS12381_FMOD,
            Self::Curve25519 => &F_CURVE25519_FMOD,
            Self::IntField(m) => m.as_ref(),
        }
    }

    #[inline]
    pub fn modulus_arc(&self) -> Arc<Integer> {
        match self {
            Self::Bn254 => F_BN254_FMOD.clone(),
            Self::Bls12381 => F_BLS12381_FMOD.clone(),
            Self::Curve25519 => F_CURVE25519_FMOD.clone(),
            Self::IntField(m) => m.clone(),
        }
    }

    /// Bytes per element in the iden3 binary formats: the modulus size rounded up to 8-byte words.
    pub fn n8(&self) -> usize {
        let bytes = self.modulus().significant_digits::<u8>();
        (bytes + 7) / 8 * 8
    }

    #[inline]
    pub fn zero(&self) -> FieldV {
        self.new_v(0)
    }

    #[inline]
    pub fn one(&self) -> FieldV {
        self.new_v(1)
    }

    /// Lift any integer into the field; negative values wrap around the modulus.
    #[inline]
    pub fn new_v<I>(&self, i: I) -> FieldV
    where
        Integer: From<I>,
    {
        FieldV::new(Integer::from(i), self.modulus_arc())
    }

    /// Parse a (possibly negative) decimal string.
    pub fn parse_v(&self, s: &str) -> Result<FieldV, FieldError> {
        let i = Integer::from_str_radix(s.trim(), 10)
            .map_err(|_| FieldError::Parse(s.to_owned()))?;
        Ok(FieldV::new(i, self.modulus_arc()))
    }

    /// Read a little-endian element, reducing it if needed.
    pub fn from_le_bytes(&self, bytes: &[u8]) -> FieldV {
        FieldV::new(Integer::from_digits(bytes, Order::Lsf), self.modulus_arc())
    }
}

#[derive(PartialEq, Eq, Clone, Debug, PartialOrd, Ord, Hash)]
/// A field element, always in `[0, m)`
pub struct FieldV {
    i: Integer,
    m: Arc<Integer>,
}

impl Display for FieldV {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self.i)
    }
}

#[allow(clippy::from_over_into)]
impl Into<Integer> for FieldV {
    fn into(self) -> Integer {
        self.i
    }
}

#[allow(clippy::from_over_into)]
impl Into<Integer> for &FieldV {
    fn into(self) -> Integer {
        self.i.clone()
    }
}

impl FieldV {
    /// Construct, reducing `i` mod `m`
    pub fn new(mut i: Integer, m: Arc<Integer>) -> Self {
        if i < 0 || i >= *m {
            i.rem_floor_assign(&*m);
        }
        Self { i, m }
    }

    #[track_caller]
    #[inline]
    /// Check value in-range (debug only)
    pub fn check(&self, location: &str) {
        debug_assert!(
            self.i >= 0 && self.i < *self.m,
            "Field elem out of range: {} mod {}\nat {}",
            self.i,
            self.m,
            location
        );
    }

    #[inline]
    pub fn ty(&self) -> FieldT {
        FieldT::from(&*self.m)
    }

    #[inline]
    pub fn modulus(&self) -> &Integer {
        &self.m
    }

    /// The canonical representative
    #[inline]
    pub fn i(&self) -> Integer {
        self.into()
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.i == 0
    }

    #[inline]
    pub fn is_one(&self) -> bool {
        self.i == 1
    }

    /// Little-endian, zero-padded to `n8` bytes.
    pub fn to_le_bytes(&self, n8: usize) -> Result<Vec<u8>, FieldError> {
        let mut bytes = self.i.to_digits::<u8>(Order::Lsf);
        if bytes.len() > n8 {
            return Err(FieldError::TooWide {
                len: bytes.len(),
                n8,
            });
        }
        bytes.resize(n8, 0);
        Ok(bytes)
    }
}

macro_rules! arith_impl {
    ($Trait: ident, $fn: ident) => {
        paste! {
            impl $Trait<FieldV> for FieldV {
                type Output = Self;
                fn $fn(mut self, other: Self) -> Self {
                    self.[<$fn _assign>](&other);
                    self
                }
            }

            impl $Trait<&FieldV> for FieldV {
                type Output = Self;
                fn $fn(mut self, other: &Self) -> Self {
                    self.[<$fn _assign>](other);
                    self
                }
            }

            impl [<$Trait Assign>]<&FieldV> for FieldV {
                #[track_caller]
                fn [<$fn _assign>](&mut self, other: &FieldV) {
                    assert_eq!(self.m, other.m, "Operation {} across fields", stringify!($fn));
                    self.i.[<$fn _assign>](&other.i);
                    self.i.rem_floor_assign(&*self.m);
                    self.check(stringify!($fn));
                }
            }

            impl [<$Trait Assign>]<FieldV> for FieldV {
                fn [<$fn _assign>](&mut self, other: FieldV) {
                    self.[<$fn _assign>](&other);
                }
            }
        }
    };
}

arith_impl!(Add, add);
arith_impl!(Sub, sub);
arith_impl!(Mul, mul);

impl Neg for FieldV {
    type Output = Self;
    fn neg(self) -> Self {
        let r = Self {
            i: (-self.i).rem_floor(&*self.m),
            m: self.m,
        };
        r.check("neg");
        r
    }
}

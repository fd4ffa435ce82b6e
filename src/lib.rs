//! Poseidon hash over the BN254 scalar field.
//!
//! The permutation uses x^5 S-boxes, 8 full rounds and a width-dependent
//! number of partial rounds evaluated with sparse matrices. Three entry
//! points are exposed:
//! - [`hash`]: sponge hash with the input length as capacity
//! - [`hash_with_cap`]: sponge hash with an explicit capacity tag
//! - [`hash_fixed`]: one permutation over `[0, inputs..]`
//!
//! The free functions use [`GeneratedConstants`]; bind a [`Poseidon`] to any
//! other [`ConstantProvider`] (for example a [`ConstantTable`] loaded from
//! circomlib JSON) to use different tables.

pub mod constants;
pub mod error;
pub mod field;
pub mod hasher;
pub mod permutation;
pub mod sponge;

#[cfg(feature = "wasm")]
pub mod wasm;

use alloy_primitives::U256;
use once_cell::sync::Lazy;

pub use constants::{ConstantProvider, ConstantTable, GeneratedConstants, PoseidonConstants, ReferenceConstants};
pub use error::PoseidonError;
pub use field::{Fp, MODULUS};
pub use hasher::{Poseidon, MAX_FIXED_ARITY};

static DEFAULT_HASHER: Lazy<Poseidon<GeneratedConstants>> = Lazy::new(Poseidon::default);

/// Process-wide hasher over the generated constants.
pub fn default_hasher() -> &'static Poseidon<GeneratedConstants> {
    &DEFAULT_HASHER
}

pub fn hash(inputs: &[U256], width: usize) -> Result<U256, PoseidonError> {
    DEFAULT_HASHER.hash(inputs, width)
}

pub fn hash_with_cap(inputs: &[U256], width: usize, cap: i64) -> Result<U256, PoseidonError> {
    DEFAULT_HASHER.hash_with_cap(inputs, width, cap)
}

pub fn hash_fixed(inputs: &[U256]) -> Result<U256, PoseidonError> {
    DEFAULT_HASHER.hash_fixed(inputs)
}

//! Public hash entry points over an injected constant provider.

use alloy_primitives::U256;

use crate::constants::{validate_width, ConstantProvider, GeneratedConstants, N_ROUNDS_P};
use crate::error::PoseidonError;
use crate::field::Fp;
use crate::permutation::permute;
use crate::sponge::absorb_and_squeeze;

/// Largest input count accepted by [`Poseidon::hash_fixed`].
pub const MAX_FIXED_ARITY: usize = N_ROUNDS_P.len();

/// Poseidon hasher bound to a constant provider.
///
/// All methods are stateless; the provider is only read.
#[derive(Clone, Debug, Default)]
pub struct Poseidon<P = GeneratedConstants> {
    provider: P,
}

impl<P: ConstantProvider> Poseidon<P> {
    pub fn new(provider: P) -> Self {
        Poseidon { provider }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Sponge hash with the input length as capacity.
    pub fn hash(&self, inputs: &[U256], width: usize) -> Result<U256, PoseidonError> {
        self.hash_with_cap(inputs, width, inputs.len() as i64)
    }

    /// Sponge hash with rate `width - 1` and an explicit capacity tag.
    ///
    /// Inputs are reduced mod p rather than checked; a negative tag is
    /// lifted to `p - |cap|`.
    pub fn hash_with_cap(&self, inputs: &[U256], width: usize, cap: i64) -> Result<U256, PoseidonError> {
        validate_width(width)?;
        let constants = self.provider.constants(width)?;

        let elements: Vec<Fp> = inputs.iter().map(|&x| Fp::from_u256(x)).collect();
        let digest = absorb_and_squeeze(constants, &elements, Fp::from_i64(cap));
        Ok(digest.to_u256())
    }

    /// Single-permutation hash of 1..=16 canonical field elements.
    ///
    /// The width is `inputs.len() + 1` and the capacity slot starts at zero.
    pub fn hash_fixed(&self, inputs: &[U256]) -> Result<U256, PoseidonError> {
        if inputs.is_empty() || inputs.len() > MAX_FIXED_ARITY {
            return Err(PoseidonError::InvalidArity {
                len: inputs.len(),
                max: MAX_FIXED_ARITY,
            });
        }

        let mut state = Vec::with_capacity(inputs.len() + 1);
        state.push(Fp::ZERO);
        for (index, &x) in inputs.iter().enumerate() {
            state.push(Fp::from_canonical(x).ok_or(PoseidonError::OutOfField { index })?);
        }

        let constants = self.provider.constants(state.len())?;
        permute(&mut state, constants);
        Ok(state[0].to_u256())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{ConstantTable, ReferenceConstants};
    use crate::field::MODULUS;

    /// Widths 2..=17 with a handful of partial rounds each.
    fn fast_hasher() -> Poseidon<ConstantTable> {
        let mut table = ConstantTable::new();
        for t in 2..=17 {
            table.insert(ReferenceConstants::generate(t, 2).optimize().unwrap());
        }
        Poseidon::new(table)
    }

    fn u(values: &[u64]) -> Vec<U256> {
        values.iter().map(|&v| U256::from(v)).collect()
    }

    #[test]
    fn test_poseidon_circomlib_compatibility() {
        let expected = U256::from_str_radix(
            "115cc0f5e7d690413df64c6b9662e9cf2a3617f2743245519e19607a4417189a",
            16,
        ).unwrap();
        let h = Poseidon::<GeneratedConstants>::default();
        assert_eq!(h.hash_fixed(&u(&[1, 2])).unwrap(), expected, "Poseidon hash does not match circomlib");
        // one block under a zero tag is the same single permutation
        assert_eq!(h.hash_with_cap(&u(&[1, 2]), 3, 0).unwrap(), expected);
    }

    #[test]
    fn test_hash_defaults_capacity_to_length() {
        let h = fast_hasher();
        let inputs = u(&[1, 2, 3]);
        assert_eq!(h.hash(&inputs, 3).unwrap(), h.hash_with_cap(&inputs, 3, 3).unwrap());
        assert_ne!(h.hash(&inputs, 3).unwrap(), h.hash_with_cap(&inputs, 3, 0).unwrap());
    }

    #[test]
    fn test_length_tag_separates_zero_padding() {
        let h = fast_hasher();
        // same absorbed state, different capacity
        assert_eq!(
            h.hash_with_cap(&u(&[5]), 3, 9).unwrap(),
            h.hash_with_cap(&u(&[5, 0]), 3, 9).unwrap()
        );
        assert_ne!(h.hash(&u(&[5]), 3).unwrap(), h.hash(&u(&[5, 0]), 3).unwrap());
    }

    #[test]
    fn test_width_validation_precedes_provider() {
        let h = Poseidon::new(ConstantTable::new());
        assert_eq!(
            h.hash(&u(&[1]), 1).unwrap_err(),
            PoseidonError::InvalidWidth {
                width: 1,
                min: 2,
                max: 17
            }
        );
        assert!(matches!(h.hash(&u(&[1]), 18), Err(PoseidonError::InvalidWidth { width: 18, .. })));
    }

    #[test]
    fn test_negative_capacity_is_lifted_mod_p() {
        let h = fast_hasher();
        let inputs = u(&[1, 2, 3]);
        let constants = h.provider().constants(3).unwrap();
        let elements: Vec<Fp> = inputs.iter().map(|&x| Fp::from_u256(x)).collect();
        let expected = absorb_and_squeeze(constants, &elements, -Fp::ONE);
        assert_eq!(h.hash_with_cap(&inputs, 3, -1).unwrap(), expected.to_u256());
        assert_ne!(h.hash_with_cap(&inputs, 3, -1).unwrap(), h.hash_with_cap(&inputs, 3, 1).unwrap());
    }

    #[test]
    fn test_hash_with_cap_reduces_inputs() {
        let h = fast_hasher();
        let wrapped = vec![MODULUS + U256::from(4u64)];
        assert_eq!(h.hash(&wrapped, 2).unwrap(), h.hash(&u(&[4]), 2).unwrap());
    }

    #[test]
    fn test_hash_fixed_arity_bounds() {
        let h = fast_hasher();
        assert_eq!(
            h.hash_fixed(&[]).unwrap_err(),
            PoseidonError::InvalidArity { len: 0, max: 16 }
        );
        let too_many = u(&[1; 17]);
        assert!(matches!(h.hash_fixed(&too_many), Err(PoseidonError::InvalidArity { len: 17, .. })));
        assert!(h.hash_fixed(&u(&[1; 16])).is_ok());
    }

    #[test]
    fn test_hash_fixed_field_membership() {
        let h = fast_hasher();
        assert_eq!(
            h.hash_fixed(&[U256::from(1u64), MODULUS]).unwrap_err(),
            PoseidonError::OutOfField { index: 1 }
        );
        assert!(h.hash_fixed(&[U256::from(1u64), MODULUS - U256::from(1u64)]).is_ok());
    }

    #[test]
    fn test_hash_fixed_is_single_permutation() {
        let h = fast_hasher();
        let inputs = u(&[3, 4]);
        let mut state = vec![Fp::ZERO, Fp::from_u64(3), Fp::from_u64(4)];
        permute(&mut state, h.provider().constants(3).unwrap());
        assert_eq!(h.hash_fixed(&inputs).unwrap(), state[0].to_u256());
        // no capacity flag, unlike the sponge with cap = 2
        assert_ne!(h.hash_fixed(&inputs).unwrap(), h.hash(&inputs, 3).unwrap());
    }
}

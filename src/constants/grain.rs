//! Grain LFSR in self-shrinking mode, the source of both the round constants
//! and the MDS points of the Poseidon reference parameter scripts.

use alloy_primitives::U256;

use crate::field::Fp;

const REGISTER_BITS: u32 = 80;
const REGISTER_MASK: u128 = (1u128 << REGISTER_BITS) - 1;
const FIELD_BITS: usize = 254;

#[derive(Clone)]
pub(crate) struct Grain {
    /// `bits[i]` of the reference description lives at bit `79 - i`.
    register: u128,
}

impl Grain {
    /// Seed for a prime field, x^alpha S-box, 254-bit elements.
    pub(crate) fn new(width: usize, full_rounds: usize, partial_rounds: usize) -> Self {
        let mut grain = Grain { register: 0 };
        grain.push_bits(1, 2);
        grain.push_bits(0, 4);
        grain.push_bits(FIELD_BITS as u64, 12);
        grain.push_bits(width as u64, 12);
        grain.push_bits(full_rounds as u64, 10);
        grain.push_bits(partial_rounds as u64, 10);
        grain.push_bits((1 << 30) - 1, 30);

        for _ in 0..160 {
            grain.clock();
        }
        grain
    }

    fn push_bits(&mut self, value: u64, count: u32) {
        for i in (0..count).rev() {
            let bit = (value >> i) & 1;
            self.register = ((self.register << 1) | bit as u128) & REGISTER_MASK;
        }
    }

    fn tap(&self, i: u32) -> u128 {
        (self.register >> (REGISTER_BITS - 1 - i)) & 1
    }

    fn clock(&mut self) -> bool {
        let bit = self.tap(62) ^ self.tap(51) ^ self.tap(38) ^ self.tap(23) ^ self.tap(13) ^ self.tap(0);
        self.register = ((self.register << 1) | bit) & REGISTER_MASK;
        bit == 1
    }

    /// Bits are drawn in pairs; the second is emitted only when the first is set.
    fn next_bit(&mut self) -> bool {
        loop {
            let keep = self.clock();
            let bit = self.clock();
            if keep {
                return bit;
            }
        }
    }

    fn sample_bits(&mut self) -> U256 {
        let mut value = U256::ZERO;
        for _ in 0..FIELD_BITS {
            value <<= 1usize;
            if self.next_bit() {
                value |= U256::from(1u64);
            }
        }
        value
    }

    /// Sample 254 bits big-endian, rejecting values outside the field.
    pub(crate) fn next_field_element(&mut self) -> Fp {
        loop {
            if let Some(element) = Fp::from_canonical(self.sample_bits()) {
                return element;
            }
        }
    }

    /// Sample 254 bits big-endian and reduce them mod p.
    pub(crate) fn next_raw(&mut self) -> Fp {
        Fp::from_u256(self.sample_bits())
    }
}

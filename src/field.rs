//! BN254 scalar field arithmetic
//!
//! `Fp` stores `a * R mod p` with R = 2^256 so that multiplication needs no
//! division. Values cross the public API as canonical `U256` integers in `[0, p)`.

use alloy_primitives::U256;
use core::fmt;
use core::ops::{Add, AddAssign, Mul, MulAssign, Neg, Sub, SubAssign};

use crate::error::PoseidonError;

/// BN254 scalar field modulus
/// p = 21888242871839275222246405745257275088548364400416034343698204186575808495617
pub const MODULUS: U256 = U256::from_limbs(MODULUS_LIMBS);

const MODULUS_LIMBS: [u64; 4] = [
    0x43e1f593f0000001,
    0x2833e84879b97091,
    0xb85045b68181585d,
    0x30644e72e131a029,
];

/// -p^{-1} mod 2^64
const INV: u64 = 0xc2e1f593efffffff;

/// R^2 mod p
const R2: [u64; 4] = [
    0x1bb8e645ae216da7,
    0x53fe3ab1e35c59e3,
    0x8c49833d53bb8085,
    0x0216d0b17f4e44a5,
];

/// Field element in Montgomery form.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fp([u64; 4]);

impl Fp {
    pub const ZERO: Fp = Fp([0, 0, 0, 0]);

    /// R mod p
    pub const ONE: Fp = Fp([
        0xac96341c4ffffffb,
        0x36fc76959f60cd29,
        0x666ea36f7879462e,
        0x0e0a77c19a07df2f,
    ]);

    /// Convert any 256-bit integer, reducing it mod p.
    pub fn from_u256(val: U256) -> Fp {
        mont_mul(val.as_limbs(), &R2)
    }

    /// Convert an integer that must already be a canonical representative.
    ///
    /// Returns `None` for values `>= p` instead of reducing them.
    pub fn from_canonical(val: U256) -> Option<Fp> {
        (val < MODULUS).then(|| Fp::from_u256(val))
    }

    pub fn from_u64(val: u64) -> Fp {
        Fp::from_u256(U256::from(val))
    }

    /// Negative values map to `p - |val|`.
    pub fn from_i64(val: i64) -> Fp {
        let magnitude = Fp::from_u64(val.unsigned_abs());
        if val < 0 {
            -magnitude
        } else {
            magnitude
        }
    }

    /// Canonical integer representative in `[0, p)`.
    pub fn to_u256(self) -> U256 {
        U256::from_limbs(mont_mul(&self.0, &[1, 0, 0, 0]).0)
    }

    pub fn is_zero(self) -> bool {
        self.0.iter().all(|&limb| limb == 0)
    }

    pub fn square(self) -> Fp {
        self * self
    }

    /// The Poseidon S-box: two squarings and one multiply.
    #[inline]
    pub fn pow5(self) -> Fp {
        let x2 = self.square();
        x2.square() * self
    }

    /// Left-to-right square-and-multiply.
    pub fn pow(self, exp: U256) -> Fp {
        let mut acc = Fp::ONE;
        for i in (0..exp.bit_len()).rev() {
            acc = acc.square();
            if exp.bit(i) {
                acc *= self;
            }
        }
        acc
    }

    /// Multiplicative inverse via Fermat, `None` for zero.
    pub fn inv(self) -> Option<Fp> {
        if self.is_zero() {
            return None;
        }
        Some(self.pow(MODULUS - U256::from(2u64)))
    }
}

impl Default for Fp {
    fn default() -> Self {
        Fp::ZERO
    }
}

impl From<u64> for Fp {
    fn from(val: u64) -> Self {
        Fp::from_u64(val)
    }
}

impl fmt::Debug for Fp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fp({:#x})", self.to_u256())
    }
}

impl fmt::Display for Fp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_u256())
    }
}

impl Add for Fp {
    type Output = Fp;

    #[inline]
    fn add(self, rhs: Fp) -> Fp {
        let mut sum = [0u64; 4];
        let mut carry = 0;
        for i in 0..4 {
            (sum[i], carry) = adc(self.0[i], rhs.0[i], carry);
        }
        // p < 2^254, so the sum never overflows 256 bits
        reduce_once(sum, carry)
    }
}

impl Sub for Fp {
    type Output = Fp;

    #[inline]
    fn sub(self, rhs: Fp) -> Fp {
        let mut diff = [0u64; 4];
        let mut borrow = 0;
        for i in 0..4 {
            (diff[i], borrow) = sbb(self.0[i], rhs.0[i], borrow);
        }
        let mask = 0u64.wrapping_sub(borrow);
        let mut carry = 0;
        for i in 0..4 {
            (diff[i], carry) = adc(diff[i], MODULUS_LIMBS[i] & mask, carry);
        }
        Fp(diff)
    }
}

impl Neg for Fp {
    type Output = Fp;

    fn neg(self) -> Fp {
        Fp::ZERO - self
    }
}

impl Mul for Fp {
    type Output = Fp;

    #[inline]
    fn mul(self, rhs: Fp) -> Fp {
        mont_mul(&self.0, &rhs.0)
    }
}

impl AddAssign for Fp {
    fn add_assign(&mut self, rhs: Fp) {
        *self = *self + rhs;
    }
}

impl SubAssign for Fp {
    fn sub_assign(&mut self, rhs: Fp) {
        *self = *self - rhs;
    }
}

impl MulAssign for Fp {
    fn mul_assign(&mut self, rhs: Fp) {
        *self = *self * rhs;
    }
}

/// Parse a decimal or `0x`-prefixed hex integer.
pub fn parse_u256(s: &str) -> Result<U256, PoseidonError> {
    let s = s.trim();
    let parse_err = |reason: String| PoseidonError::Parse {
        value: s.to_string(),
        reason,
    };
    if let Some(digits) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        let padded = if digits.len() % 2 == 1 {
            format!("0{digits}")
        } else {
            digits.to_string()
        };
        let bytes = hex::decode(&padded).map_err(|e| parse_err(e.to_string()))?;
        U256::try_from_be_slice(&bytes).ok_or_else(|| parse_err("more than 256 bits".to_string()))
    } else {
        U256::from_str_radix(s, 10).map_err(|e: ruint::ParseError| parse_err(e.to_string()))
    }
}

// ============================================================
// Limb arithmetic
// ============================================================

/// a + b*c + d, returning (lo, hi)
#[inline(always)]
fn mac(a: u64, b: u64, c: u64, d: u64) -> (u64, u64) {
    let res = (a as u128) + (b as u128) * (c as u128) + (d as u128);
    (res as u64, (res >> 64) as u64)
}

#[inline(always)]
fn adc(a: u64, b: u64, carry: u64) -> (u64, u64) {
    let res = (a as u128) + (b as u128) + (carry as u128);
    (res as u64, (res >> 64) as u64)
}

#[inline(always)]
fn sbb(a: u64, b: u64, borrow: u64) -> (u64, u64) {
    let res = (a as u128).wrapping_sub((b as u128) + (borrow as u128));
    (res as u64, (res >> 127) as u64)
}

/// Subtract p once if the 257-bit value `hi:limbs` is at least p.
#[inline(always)]
fn reduce_once(limbs: [u64; 4], hi: u64) -> Fp {
    let mut reduced = [0u64; 4];
    let mut borrow = 0;
    for i in 0..4 {
        (reduced[i], borrow) = sbb(limbs[i], MODULUS_LIMBS[i], borrow);
    }
    let (_, borrow) = sbb(hi, 0, borrow);
    // borrow set: value < p, keep it
    let mask = 0u64.wrapping_sub(borrow);
    let mut out = [0u64; 4];
    for i in 0..4 {
        out[i] = (limbs[i] & mask) | (reduced[i] & !mask);
    }
    Fp(out)
}

/// Montgomery product a*b*R^{-1} mod p (coarsely integrated operand scanning).
///
/// Requires `a < 2^256` and `b < p`.
#[inline]
fn mont_mul(a: &[u64; 4], b: &[u64; 4]) -> Fp {
    let mut t = [0u64; 6];
    for &b_i in b.iter() {
        let mut carry = 0;
        for j in 0..4 {
            (t[j], carry) = mac(t[j], a[j], b_i, carry);
        }
        let (t4, hi) = adc(t[4], carry, 0);
        t[4] = t4;
        t[5] = hi;

        let m = t[0].wrapping_mul(INV);
        let (_, mut carry) = mac(t[0], m, MODULUS_LIMBS[0], 0);
        for j in 1..4 {
            (t[j - 1], carry) = mac(t[j], m, MODULUS_LIMBS[j], carry);
        }
        let (t3, hi) = adc(t[4], carry, 0);
        t[3] = t3;
        t[4] = t[5] + hi;
    }
    reduce_once([t[0], t[1], t[2], t[3]], t[4])
}

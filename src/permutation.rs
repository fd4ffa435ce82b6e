//! Poseidon permutation
//!
//! `permute` runs the optimized schedule over a [`PoseidonConstants`] bundle:
//! 4 full rounds, the partial rounds with sparse mixing, 4 full rounds.
//! `permute_reference` runs the textbook round function and exists to
//! cross-check constant sets derived by [`ReferenceConstants::optimize`].

use crate::constants::{PoseidonConstants, ReferenceConstants, MAX_WIDTH, N_ROUNDS_F};
use crate::field::Fp;

/// A fixed-width permutation over field elements.
pub trait Permutation {
    fn width(&self) -> usize;
    fn permute(&self, state: &mut [Fp]);
}

impl Permutation for PoseidonConstants {
    fn width(&self) -> usize {
        PoseidonConstants::width(self)
    }

    fn permute(&self, state: &mut [Fp]) {
        permute(state, self)
    }
}

impl Permutation for ReferenceConstants {
    fn width(&self) -> usize {
        ReferenceConstants::width(self)
    }

    fn permute(&self, state: &mut [Fp]) {
        permute_reference(state, self)
    }
}

#[inline(always)]
fn sbox_full(state: &mut [Fp]) {
    for x in state.iter_mut() {
        *x = x.pow5();
    }
}

#[inline(always)]
fn add_round_constants(state: &mut [Fp], constants: &[Fp]) {
    for (x, c) in state.iter_mut().zip(constants) {
        *x += *c;
    }
}

/// state <- m · state
fn mix(state: &mut [Fp], m: &[Vec<Fp>]) {
    let t = state.len();
    let mut out = [Fp::ZERO; MAX_WIDTH];
    for (o, row) in out.iter_mut().zip(m) {
        *o = row.iter().zip(state.iter()).fold(Fp::ZERO, |acc, (&a, &s)| acc + a * s);
    }
    state.copy_from_slice(&out[..t]);
}

/// Multiply by the sparse matrix `[[s0, s1..s(t-1)], [s_t..s(2t-2), I]]`.
///
/// The new `state[0]` and every other update read the old `state[0]`.
fn sparse_mix(state: &mut [Fp], s: &[Fp]) {
    let t = state.len();
    let old0 = state[0];
    let new0 = s[..t].iter().zip(state.iter()).fold(Fp::ZERO, |acc, (&a, &x)| acc + a * x);
    for k in 1..t {
        state[k] += old0 * s[t + k - 1];
    }
    state[0] = new0;
}

/// Optimized Poseidon permutation, in place.
///
/// `state.len()` must equal `constants.width()`.
pub fn permute(state: &mut [Fp], constants: &PoseidonConstants) {
    let t = constants.width();
    debug_assert_eq!(state.len(), t, "state width does not match constants");
    let half = N_ROUNDS_F / 2;
    let rp = constants.partial_rounds();
    let arc = constants.arc();
    let m = constants.mds();

    add_round_constants(state, &arc[..t]);

    for i in 0..half - 1 {
        sbox_full(state);
        add_round_constants(state, &arc[(i + 1) * t..]);
        mix(state, m);
    }
    sbox_full(state);
    add_round_constants(state, &arc[half * t..]);
    mix(state, constants.pre_sparse());

    let partial_base = (half + 1) * t;
    for (i, s) in constants.sparse().iter().enumerate() {
        state[0] = state[0].pow5();
        state[0] += arc[partial_base + i];
        sparse_mix(state, s);
    }

    let tail_base = partial_base + rp;
    for i in 0..half - 1 {
        sbox_full(state);
        add_round_constants(state, &arc[tail_base + i * t..]);
        mix(state, m);
    }
    sbox_full(state);
    mix(state, m);
}

/// Textbook Poseidon: every round adds a full constant vector and mixes with M.
pub fn permute_reference(state: &mut [Fp], reference: &ReferenceConstants) {
    debug_assert_eq!(state.len(), reference.width(), "state width does not match constants");
    let half = N_ROUNDS_F / 2;
    let rp = reference.partial_rounds();
    for (r, rc) in reference.round_constants().iter().enumerate() {
        add_round_constants(state, rc);
        if r < half || r >= half + rp {
            sbox_full(state);
        } else {
            state[0] = state[0].pow5();
        }
        mix(state, reference.mds());
    }
}

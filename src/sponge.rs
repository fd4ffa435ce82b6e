//! Sponge construction over a Poseidon permutation.
//!
//! The capacity slot (`state[0]`) is seeded with a caller-chosen tag, input is
//! absorbed `rate = t - 1` elements at a time into `state[1..]`, and the
//! digest is squeezed from `state[0]` after the last permutation.

use tracing::trace;

use crate::field::Fp;
use crate::permutation::Permutation;

/// Add a block into the rate portion of the state.
///
/// Blocks shorter than the rate leave the remaining slots untouched, which
/// is the same as zero padding.
fn absorb_block(state: &mut [Fp], block: &[Fp]) {
    for (s, x) in state[1..].iter_mut().zip(block) {
        *s += *x;
    }
}

/// Absorb `inputs` under `capacity` and squeeze one element.
///
/// Runs `max(1, ceil(inputs.len() / rate))` permutations: full blocks while
/// more than a rate's worth remains, then the final (possibly empty or
/// full) block with one last permutation.
pub fn absorb_and_squeeze<P: Permutation + ?Sized>(perm: &P, inputs: &[Fp], capacity: Fp) -> Fp {
    let width = perm.width();
    let rate = width - 1;
    let mut state = vec![Fp::ZERO; width];
    state[0] = capacity;

    let mut remaining = inputs;
    let mut rounds = 0usize;
    while remaining.len() > rate {
        let (block, rest) = remaining.split_at(rate);
        assert_eq!(block.len(), rate, "unexpected absorption size");
        absorb_block(&mut state, block);
        perm.permute(&mut state);
        rounds += 1;
        remaining = rest;
    }

    absorb_block(&mut state, remaining);
    perm.permute(&mut state);
    rounds += 1;

    trace!(width, inputs = inputs.len(), permutations = rounds, "sponge squeezed");
    state[0]
}

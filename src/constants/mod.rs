//! Per-width Poseidon constant sets and the providers that supply them.
//!
//! A [`PoseidonConstants`] bundle holds the optimized-schedule layout consumed
//! by [`crate::permutation::permute`]:
//! - `arc`: t constants per full round plus t for the transition into the
//!   partial phase and one per partial round (`t * 8 + RP` in total)
//! - `mds`: the dense t×t mixing matrix
//! - `pre_sparse`: the t×t matrix applied once before the partial rounds
//! - `sparse`: one `2t - 1` entry sparse matrix per partial round

use std::sync::Arc;

use crate::error::PoseidonError;
use crate::field::Fp;

mod generate;
mod grain;
pub mod matrix;
mod table;

pub use generate::{GeneratedConstants, ReferenceConstants};
pub use matrix::Matrix;
pub use table::ConstantTable;

/// Number of full rounds, split evenly around the partial rounds.
pub const N_ROUNDS_F: usize = 8;

/// Partial rounds per width, indexed by `width - 2`.
pub const N_ROUNDS_P: [usize; 16] = [56, 57, 56, 60, 60, 63, 64, 63, 60, 66, 60, 65, 70, 60, 64, 68];

pub const MIN_WIDTH: usize = 2;
pub const MAX_WIDTH: usize = N_ROUNDS_P.len() + 1;

/// Partial-round count for `width`, if the width is supported.
pub fn partial_rounds(width: usize) -> Option<usize> {
    width.checked_sub(MIN_WIDTH).and_then(|i| N_ROUNDS_P.get(i)).copied()
}

pub fn validate_width(width: usize) -> Result<usize, PoseidonError> {
    partial_rounds(width).ok_or(PoseidonError::InvalidWidth {
        width,
        min: MIN_WIDTH,
        max: MAX_WIDTH,
    })
}

/// Immutable constant set for one state width.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoseidonConstants {
    width: usize,
    partial_rounds: usize,
    arc: Vec<Fp>,
    mds: Matrix,
    pre_sparse: Matrix,
    sparse: Vec<Vec<Fp>>,
}

impl PoseidonConstants {
    /// Bundle a constant set, checking every shape against `width`.
    ///
    /// The partial-round count is taken from `sparse.len()`, so synthetic
    /// sets with fewer rounds than [`N_ROUNDS_P`] are accepted.
    pub fn new(
        width: usize,
        arc: Vec<Fp>,
        mds: Matrix,
        pre_sparse: Matrix,
        sparse: Vec<Vec<Fp>>,
    ) -> Result<Self, PoseidonError> {
        let malformed = |reason: String| PoseidonError::MalformedConstants { width, reason };

        if !(MIN_WIDTH..=MAX_WIDTH).contains(&width) {
            return Err(malformed(format!("width must be in {MIN_WIDTH}..={MAX_WIDTH}")));
        }
        let partial_rounds = sparse.len();
        let expected_arc = width * N_ROUNDS_F + partial_rounds;
        if arc.len() != expected_arc {
            return Err(malformed(format!(
                "expected {expected_arc} round constants, got {}",
                arc.len()
            )));
        }
        if !matrix::is_square(&mds, width) {
            return Err(malformed(format!("mixing matrix is not {width}x{width}")));
        }
        if !matrix::is_square(&pre_sparse, width) {
            return Err(malformed(format!("pre-sparse matrix is not {width}x{width}")));
        }
        if let Some(i) = sparse.iter().position(|s| s.len() != 2 * width - 1) {
            return Err(malformed(format!(
                "sparse matrix {i} has {} entries, expected {}",
                sparse[i].len(),
                2 * width - 1
            )));
        }

        Ok(PoseidonConstants {
            width,
            partial_rounds,
            arc,
            mds,
            pre_sparse,
            sparse,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn rate(&self) -> usize {
        self.width - 1
    }

    pub fn partial_rounds(&self) -> usize {
        self.partial_rounds
    }

    pub fn arc(&self) -> &[Fp] {
        &self.arc
    }

    pub fn mds(&self) -> &Matrix {
        &self.mds
    }

    pub fn pre_sparse(&self) -> &Matrix {
        &self.pre_sparse
    }

    pub fn sparse(&self) -> &[Vec<Fp>] {
        &self.sparse
    }
}

/// Source of constant sets keyed by state width.
///
/// A width the provider cannot serve must be reported as
/// [`PoseidonError::InvalidWidth`].
pub trait ConstantProvider {
    fn constants(&self, width: usize) -> Result<&PoseidonConstants, PoseidonError>;
}

impl<T: ConstantProvider + ?Sized> ConstantProvider for &T {
    fn constants(&self, width: usize) -> Result<&PoseidonConstants, PoseidonError> {
        (**self).constants(width)
    }
}

impl<T: ConstantProvider + ?Sized> ConstantProvider for Arc<T> {
    fn constants(&self, width: usize) -> Result<&PoseidonConstants, PoseidonError> {
        (**self).constants(width)
    }
}

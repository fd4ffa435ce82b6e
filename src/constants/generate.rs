//! Deterministic constant generation.
//!
//! [`ReferenceConstants`] holds the textbook parameters: one round-constant
//! vector per round and a Cauchy MDS matrix, both drawn from one Grain
//! stream. [`ReferenceConstants::optimize`] rewrites them into the optimized schedule: round constants pushed through
//! the inverse MDS so partial rounds add a single scalar, and the partial-round
//! mixes factored into sparse matrices plus one dense transition matrix.

use once_cell::sync::OnceCell;
use tracing::debug;

use super::grain::Grain;
use super::matrix::{self, Matrix};
use super::{validate_width, ConstantProvider, PoseidonConstants, MAX_WIDTH, MIN_WIDTH, N_ROUNDS_F};
use crate::error::PoseidonError;
use crate::field::Fp;

/// Unoptimized Poseidon parameters for one width.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReferenceConstants {
    width: usize,
    partial_rounds: usize,
    round_constants: Vec<Vec<Fp>>,
    mds: Matrix,
}

impl ReferenceConstants {
    /// Grain LFSR round constants followed by a Cauchy MDS matrix whose
    /// points come from the same stream.
    pub fn generate(width: usize, partial_rounds: usize) -> Self {
        debug!(width, partial_rounds, "generating reference poseidon constants");
        let total_rounds = N_ROUNDS_F + partial_rounds;
        let mut grain = Grain::new(width, N_ROUNDS_F, partial_rounds);
        let round_constants = (0..total_rounds)
            .map(|_| (0..width).map(|_| grain.next_field_element()).collect())
            .collect();

        let mds = loop {
            let points: Vec<Fp> = (0..2 * width).map(|_| grain.next_raw()).collect();
            if let Some(mds) = cauchy_matrix(&points[..width], &points[width..]) {
                break mds;
            }
        };

        ReferenceConstants {
            width,
            partial_rounds,
            round_constants,
            mds,
        }
    }

    /// Bundle caller-supplied reference parameters.
    pub fn new(round_constants: Vec<Vec<Fp>>, mds: Matrix) -> Result<Self, PoseidonError> {
        let width = mds.len();
        let malformed = |reason: String| PoseidonError::MalformedConstants { width, reason };
        if !(MIN_WIDTH..=MAX_WIDTH).contains(&width) || !matrix::is_square(&mds, width) {
            return Err(malformed(format!(
                "mixing matrix must be square with width in {MIN_WIDTH}..={MAX_WIDTH}"
            )));
        }
        if round_constants.len() < N_ROUNDS_F {
            return Err(malformed(format!("expected at least {N_ROUNDS_F} rounds")));
        }
        if round_constants.iter().any(|rc| rc.len() != width) {
            return Err(malformed(format!("every round needs {width} constants")));
        }
        Ok(ReferenceConstants {
            width,
            partial_rounds: round_constants.len() - N_ROUNDS_F,
            round_constants,
            mds,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn partial_rounds(&self) -> usize {
        self.partial_rounds
    }

    pub fn round_constants(&self) -> &[Vec<Fp>] {
        &self.round_constants
    }

    pub fn mds(&self) -> &Matrix {
        &self.mds
    }

    /// Derive the optimized constant set computing the same permutation.
    pub fn optimize(&self) -> Result<PoseidonConstants, PoseidonError> {
        let t = self.width;
        let half = N_ROUNDS_F / 2;
        let rp = self.partial_rounds;
        let singular = |what: &str| PoseidonError::MalformedConstants {
            width: t,
            reason: format!("{what} is singular"),
        };
        let mds_inv = matrix::invert(&self.mds).ok_or_else(|| singular("mixing matrix"))?;
        let k = &self.round_constants;

        let mut arc = Vec::with_capacity(t * N_ROUNDS_F + rp);

        // First full rounds: the constants of round r are added before the
        // mix of round r - 1, so they travel through M^-1.
        arc.extend_from_slice(&k[0]);
        for rc in &k[1..half] {
            arc.extend(matrix::mul_vec(&mds_inv, rc));
        }

        // Partial rounds, walked backward: only element 0 passes the S-box, so
        // everything else in a round constant moves to the previous round.
        let mut carried = k[half + rp].clone();
        let mut scalars = vec![Fp::ZERO; rp];
        for i in (0..rp).rev() {
            let pulled = matrix::mul_vec(&mds_inv, &carried);
            scalars[i] = pulled[0];
            carried = k[half + i].clone();
            for (c, p) in carried.iter_mut().zip(&pulled).skip(1) {
                *c += *p;
            }
        }
        arc.extend(matrix::mul_vec(&mds_inv, &carried));
        arc.extend(scalars);

        // Last full rounds; the final round needs no constant of its own.
        for rc in &k[half + rp + 1..] {
            arc.extend(matrix::mul_vec(&mds_inv, rc));
        }

        // Factor each partial-round mix A = S·D with D = diag(1, Â), pushing D
        // into the preceding mix. What remains for the transition is P.
        let mut acc = self.mds.clone();
        let mut sparse = vec![Vec::new(); rp];
        for i in (0..rp).rev() {
            let hat = matrix::minor(&acc);
            let hat_inv = matrix::invert(&hat).ok_or_else(|| singular("partial-round minor"))?;
            let row: Vec<Fp> = acc[0][1..].to_vec();
            let b: Vec<Fp> = (0..t - 1)
                .map(|j| (0..t - 1).fold(Fp::ZERO, |s, m| s + row[m] * hat_inv[m][j]))
                .collect();

            let mut entries = Vec::with_capacity(2 * t - 1);
            entries.push(acc[0][0]);
            entries.extend(b);
            entries.extend(acc[1..].iter().map(|r| r[0]));
            sparse[i] = entries;

            let mut d = matrix::identity(t);
            for (r, hat_row) in hat.iter().enumerate() {
                d[r + 1][1..].copy_from_slice(hat_row);
            }
            acc = matrix::mul(&d, &self.mds);
        }

        PoseidonConstants::new(t, arc, self.mds.clone(), acc, sparse)
    }
}

/// `M[i][j] = 1 / (x_i + y_j)`, or `None` when the points repeat or a sum
/// vanishes.
fn cauchy_matrix(xs: &[Fp], ys: &[Fp]) -> Option<Matrix> {
    let points: Vec<&Fp> = xs.iter().chain(ys).collect();
    for (i, a) in points.iter().enumerate() {
        if points[i + 1..].contains(a) {
            return None;
        }
    }
    xs.iter()
        .map(|&x| ys.iter().map(|&y| (x + y).inv()).collect::<Option<Vec<Fp>>>())
        .collect()
}

/// Lazily generated constants for every supported width.
///
/// Each width is derived on first use and then shared read-only.
pub struct GeneratedConstants {
    cells: [OnceCell<PoseidonConstants>; MAX_WIDTH - 1],
}

impl GeneratedConstants {
    pub fn new() -> Self {
        GeneratedConstants {
            cells: std::array::from_fn(|_| OnceCell::new()),
        }
    }

    /// Reference parameters behind the optimized set for `width`.
    pub fn reference(width: usize) -> Result<ReferenceConstants, PoseidonError> {
        let partial_rounds = validate_width(width)?;
        Ok(ReferenceConstants::generate(width, partial_rounds))
    }
}

impl Default for GeneratedConstants {
    fn default() -> Self {
        Self::new()
    }
}

impl ConstantProvider for GeneratedConstants {
    fn constants(&self, width: usize) -> Result<&PoseidonConstants, PoseidonError> {
        validate_width(width)?;
        self.cells[width - MIN_WIDTH].get_or_try_init(|| {
            let constants = Self::reference(width)?.optimize()?;
            debug!(width, partial_rounds = constants.partial_rounds(), "poseidon constants ready");
            Ok(constants)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permutation::{permute, permute_reference};
    use alloy_primitives::U256;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha20Rng;

    fn random_state(rng: &mut ChaCha20Rng, t: usize) -> Vec<Fp> {
        (0..t)
            .map(|_| Fp::from_u256(U256::from_limbs(rng.gen::<[u64; 4]>())))
            .collect()
    }

    #[test]
    fn test_generated_shapes() {
        let reference = ReferenceConstants::generate(3, 57);
        assert_eq!(reference.round_constants().len(), 65);
        let optimized = reference.optimize().unwrap();
        assert_eq!(optimized.arc().len(), 3 * 8 + 57);
        assert_eq!(optimized.sparse().len(), 57);
        assert!(optimized.sparse().iter().all(|s| s.len() == 5));
    }

    #[test]
    fn test_cauchy_matrix_entries() {
        let xs = [Fp::from_u64(1), Fp::from_u64(2)];
        let ys = [Fp::from_u64(3), Fp::from_u64(5)];
        let m = cauchy_matrix(&xs, &ys).unwrap();
        for i in 0..2 {
            for j in 0..2 {
                assert_eq!(m[i][j] * (xs[i] + ys[j]), Fp::ONE);
            }
        }
        // repeated point
        assert!(cauchy_matrix(&xs, &[Fp::from_u64(2), Fp::from_u64(7)]).is_none());
        // x + y == 0
        assert!(cauchy_matrix(&xs, &[-Fp::from_u64(1), Fp::from_u64(7)]).is_none());
    }

    #[test]
    fn test_width_three_matches_circomlib_tables() {
        let reference = GeneratedConstants::reference(3).unwrap();
        let rc0 = U256::from_str_radix("0ee9a592ba9a9518d05986d656f40c2114c4993c11bb29938d21d47304cd8e6e", 16).unwrap();
        let m00 = U256::from_str_radix("109b7f411ba0e4c9b2b70caf5c36a7b194be7c11ad24378bfedb68592ba8118b", 16).unwrap();
        assert_eq!(reference.round_constants()[0][0].to_u256(), rc0);
        assert_eq!(reference.mds()[0][0].to_u256(), m00);
    }

    #[test]
    fn test_optimized_matches_reference_small() {
        let mut rng = ChaCha20Rng::seed_from_u64(7);
        for (t, rp) in [(2, 3), (3, 5), (4, 1), (5, 6)] {
            let reference = ReferenceConstants::generate(t, rp);
            let optimized = reference.optimize().unwrap();
            for _ in 0..4 {
                let input = random_state(&mut rng, t);
                let mut fast = input.clone();
                let mut slow = input;
                permute(&mut fast, &optimized);
                permute_reference(&mut slow, &reference);
                assert_eq!(fast, slow, "width {t}, {rp} partial rounds");
            }
        }
    }

    #[test]
    fn test_optimized_matches_reference_full_tables() {
        let mut rng = ChaCha20Rng::seed_from_u64(11);
        let provider = GeneratedConstants::new();
        for t in [2, 3, 6, 17] {
            let reference = GeneratedConstants::reference(t).unwrap();
            let optimized = provider.constants(t).unwrap();
            let input = random_state(&mut rng, t);
            let mut fast = input.clone();
            let mut slow = input;
            permute(&mut fast, optimized);
            permute_reference(&mut slow, &reference);
            assert_eq!(fast, slow, "width {t}");
        }
    }

    #[test]
    fn test_provider_caches_per_width() {
        let provider = GeneratedConstants::new();
        let a = provider.constants(4).unwrap() as *const PoseidonConstants;
        let b = provider.constants(4).unwrap() as *const PoseidonConstants;
        assert_eq!(a, b);
    }

    #[test]
    fn test_provider_rejects_unknown_width() {
        let provider = GeneratedConstants::new();
        assert!(matches!(provider.constants(1), Err(PoseidonError::InvalidWidth { .. })));
        assert!(matches!(provider.constants(18), Err(PoseidonError::InvalidWidth { .. })));
    }

    #[test]
    fn test_reference_new_validates() {
        let mds = matrix::identity(3);
        assert!(ReferenceConstants::new(vec![vec![Fp::ZERO; 3]; 10], mds.clone()).is_ok());
        assert!(ReferenceConstants::new(vec![vec![Fp::ZERO; 3]; 7], mds.clone()).is_err());
        assert!(ReferenceConstants::new(vec![vec![Fp::ZERO; 2]; 10], mds).is_err());
        let wide = matrix::identity(MAX_WIDTH + 1);
        assert!(ReferenceConstants::new(vec![vec![Fp::ZERO; MAX_WIDTH + 1]; 10], wide).is_err());
    }

    #[test]
    fn test_optimize_rejects_singular_mds() {
        let mut mds = matrix::identity(3);
        mds[2] = mds[1].clone();
        let reference = ReferenceConstants::new(vec![vec![Fp::ONE; 3]; 10], mds).unwrap();
        assert!(matches!(reference.optimize(), Err(PoseidonError::MalformedConstants { .. })));
    }
}

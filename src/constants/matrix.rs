//! Dense square matrices over `Fp`, row-major.

use crate::field::Fp;

pub type Matrix = Vec<Vec<Fp>>;

pub fn identity(n: usize) -> Matrix {
    (0..n)
        .map(|i| (0..n).map(|j| if i == j { Fp::ONE } else { Fp::ZERO }).collect())
        .collect()
}

pub fn is_square(m: &[Vec<Fp>], n: usize) -> bool {
    m.len() == n && m.iter().all(|row| row.len() == n)
}

/// m · v
pub fn mul_vec(m: &[Vec<Fp>], v: &[Fp]) -> Vec<Fp> {
    m.iter()
        .map(|row| row.iter().zip(v).fold(Fp::ZERO, |acc, (&a, &b)| acc + a * b))
        .collect()
}

/// a · b
pub fn mul(a: &[Vec<Fp>], b: &[Vec<Fp>]) -> Matrix {
    let n = b.first().map_or(0, Vec::len);
    a.iter()
        .map(|row| {
            (0..n)
                .map(|j| row.iter().zip(b).fold(Fp::ZERO, |acc, (&x, b_row)| acc + x * b_row[j]))
                .collect()
        })
        .collect()
}

pub fn transpose(m: &[Vec<Fp>]) -> Matrix {
    let cols = m.first().map_or(0, Vec::len);
    (0..cols).map(|j| m.iter().map(|row| row[j]).collect()).collect()
}

/// The lower-right block left after dropping row 0 and column 0.
pub fn minor(m: &[Vec<Fp>]) -> Matrix {
    m.iter().skip(1).map(|row| row[1..].to_vec()).collect()
}

/// Gauss-Jordan inversion; `None` when the matrix is singular.
pub fn invert(m: &[Vec<Fp>]) -> Option<Matrix> {
    let n = m.len();
    let mut work = m.to_vec();
    let mut inv = identity(n);

    for col in 0..n {
        let pivot = (col..n).find(|&row| !work[row][col].is_zero())?;
        work.swap(col, pivot);
        inv.swap(col, pivot);

        let scale = work[col][col].inv()?;
        for j in 0..n {
            work[col][j] *= scale;
            inv[col][j] *= scale;
        }

        for row in 0..n {
            if row == col || work[row][col].is_zero() {
                continue;
            }
            let factor = work[row][col];
            for j in 0..n {
                let w = work[col][j];
                let i = inv[col][j];
                work[row][j] -= factor * w;
                inv[row][j] -= factor * i;
            }
        }
    }
    Some(inv)
}

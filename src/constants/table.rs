//! Explicit width → constant-set tables and their JSON form.
//!
//! The JSON layout follows the circomlib optimized-constants file:
//!
//! ```json
//! { "C": [[..]], "S": [[..]], "M": [[[..]]], "P": [[[..]]] }
//! ```
//!
//! Entry `i` of every array belongs to width `i + 2`. `S` is flattened
//! (`2t - 1` entries per partial round) and `M`/`P` are stored column-major
//! relative to the state product, so they are transposed on the way in and out.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::matrix::{self, Matrix};
use super::{ConstantProvider, PoseidonConstants, MAX_WIDTH, MIN_WIDTH};
use crate::error::PoseidonError;
use crate::field::{parse_u256, Fp};

#[derive(Debug, Serialize, Deserialize)]
struct ConstantsFile {
    #[serde(rename = "C")]
    c: Vec<Vec<String>>,
    #[serde(rename = "S")]
    s: Vec<Vec<String>>,
    #[serde(rename = "M")]
    m: Vec<Vec<Vec<String>>>,
    #[serde(rename = "P")]
    p: Vec<Vec<Vec<String>>>,
}

/// Constant sets held in memory, keyed by width.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConstantTable {
    sets: BTreeMap<usize, PoseidonConstants>,
}

impl ConstantTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the set for `constants.width()`.
    pub fn insert(&mut self, constants: PoseidonConstants) -> Option<PoseidonConstants> {
        self.sets.insert(constants.width(), constants)
    }

    pub fn widths(&self) -> impl Iterator<Item = usize> + '_ {
        self.sets.keys().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// Copy the sets for `widths` out of another provider.
    pub fn from_provider<P: ConstantProvider + ?Sized>(
        provider: &P,
        widths: impl IntoIterator<Item = usize>,
    ) -> Result<Self, PoseidonError> {
        let mut table = ConstantTable::new();
        for width in widths {
            table.insert(provider.constants(width)?.clone());
        }
        Ok(table)
    }

    pub fn from_json(json: &str) -> Result<Self, PoseidonError> {
        let file: ConstantsFile = serde_json::from_str(json)?;
        let n = file.c.len();
        if file.s.len() != n || file.m.len() != n || file.p.len() != n {
            return Err(PoseidonError::Json(
                "C, S, M and P must list the same number of widths".to_string(),
            ));
        }

        let mut table = ConstantTable::new();
        for i in 0..n {
            let width = i + MIN_WIDTH;
            let arc = parse_elements(width, &file.c[i])?;
            let mds = matrix::transpose(&parse_matrix(width, &file.m[i])?);
            let pre_sparse = matrix::transpose(&parse_matrix(width, &file.p[i])?);

            let flat = parse_elements(width, &file.s[i])?;
            let chunk = 2 * width - 1;
            if flat.len() % chunk != 0 {
                return Err(PoseidonError::MalformedConstants {
                    width,
                    reason: format!("{} sparse entries is not a multiple of {chunk}", flat.len()),
                });
            }
            let sparse = flat.chunks(chunk).map(<[Fp]>::to_vec).collect();

            table.insert(PoseidonConstants::new(width, arc, mds, pre_sparse, sparse)?);
        }
        debug!(widths = n, "loaded poseidon constants from json");
        Ok(table)
    }

    /// Serialize to the circomlib layout; widths must run contiguously from 2.
    pub fn to_json(&self) -> Result<String, PoseidonError> {
        let contiguous = self.widths().enumerate().all(|(i, w)| w == i + MIN_WIDTH);
        if !contiguous {
            return Err(PoseidonError::Json(format!(
                "widths must run contiguously from {MIN_WIDTH}"
            )));
        }

        let hex_row = |row: &[Fp]| -> Vec<String> { row.iter().map(|x| format!("0x{:064x}", x.to_u256())).collect() };
        let hex_matrix = |m: &Matrix| -> Vec<Vec<String>> { matrix::transpose(m).iter().map(|r| hex_row(r)).collect() };

        let file = ConstantsFile {
            c: self.sets.values().map(|c| hex_row(c.arc())).collect(),
            s: self.sets.values().map(|c| hex_row(&c.sparse().concat())).collect(),
            m: self.sets.values().map(|c| hex_matrix(c.mds())).collect(),
            p: self.sets.values().map(|c| hex_matrix(c.pre_sparse())).collect(),
        };
        Ok(serde_json::to_string_pretty(&file)?)
    }
}

impl ConstantProvider for ConstantTable {
    fn constants(&self, width: usize) -> Result<&PoseidonConstants, PoseidonError> {
        self.sets.get(&width).ok_or_else(|| PoseidonError::InvalidWidth {
            width,
            min: self.sets.keys().next().copied().unwrap_or(MIN_WIDTH),
            max: self.sets.keys().next_back().copied().unwrap_or(MAX_WIDTH),
        })
    }
}

fn parse_elements(width: usize, values: &[String]) -> Result<Vec<Fp>, PoseidonError> {
    values
        .iter()
        .map(|v| {
            let n = parse_u256(v)?;
            Fp::from_canonical(n).ok_or_else(|| PoseidonError::MalformedConstants {
                width,
                reason: format!("{v} is not a canonical field element"),
            })
        })
        .collect()
}

fn parse_matrix(width: usize, rows: &[Vec<String>]) -> Result<Matrix, PoseidonError> {
    rows.iter().map(|row| parse_elements(width, row)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::ReferenceConstants;
    use crate::permutation::permute;

    fn small_table() -> ConstantTable {
        let mut table = ConstantTable::new();
        table.insert(ReferenceConstants::generate(2, 3).optimize().unwrap());
        table.insert(ReferenceConstants::generate(3, 2).optimize().unwrap());
        table
    }

    #[test]
    fn test_json_reload_is_identical() {
        let table = small_table();
        let json = table.to_json().unwrap();
        let reloaded = ConstantTable::from_json(&json).unwrap();
        assert_eq!(reloaded, table);
    }

    #[test]
    fn test_json_matrices_are_transposed() {
        let table = small_table();
        let json = table.to_json().unwrap();
        let raw: serde_json::Value = serde_json::from_str(&json).unwrap();
        let m = table.constants(3).unwrap().mds();
        // file M[0][1] holds the entry mixing state[0] into state[1]
        let entry = raw["M"][1][0][1].as_str().unwrap();
        assert_eq!(parse_u256(entry).unwrap(), m[1][0].to_u256());
    }

    #[test]
    fn test_json_accepts_decimal_values() {
        let table = small_table();
        let constants = table.constants(2).unwrap();
        let dec = |row: &[Fp]| -> Vec<String> { row.iter().map(|x| x.to_string()).collect() };
        let file = ConstantsFile {
            c: vec![dec(constants.arc())],
            s: vec![dec(&constants.sparse().concat())],
            m: vec![matrix::transpose(constants.mds()).iter().map(|r| dec(r)).collect()],
            p: vec![matrix::transpose(constants.pre_sparse()).iter().map(|r| dec(r)).collect()],
        };
        let json = serde_json::to_string(&file).unwrap();
        let loaded = ConstantTable::from_json(&json).unwrap();

        let mut a = vec![Fp::from_u64(1), Fp::from_u64(2)];
        let mut b = a.clone();
        permute(&mut a, constants);
        permute(&mut b, loaded.constants(2).unwrap());
        assert_eq!(a, b);
    }

    #[test]
    fn test_json_rejects_mismatched_sections() {
        let json = r#"{"C": [[]], "S": [], "M": [], "P": []}"#;
        assert!(matches!(ConstantTable::from_json(json), Err(PoseidonError::Json(_))));
        assert!(matches!(ConstantTable::from_json("not json"), Err(PoseidonError::Json(_))));
    }

    #[test]
    fn test_json_rejects_out_of_field_values() {
        let p = crate::field::MODULUS;
        let json = format!(r#"{{"C": [["{p}"]], "S": [[]], "M": [[]], "P": [[]]}}"#);
        assert!(matches!(
            ConstantTable::from_json(&json),
            Err(PoseidonError::MalformedConstants { width: 2, .. })
        ));
    }

    #[test]
    fn test_to_json_requires_contiguous_widths() {
        let mut table = ConstantTable::new();
        table.insert(ReferenceConstants::generate(3, 2).optimize().unwrap());
        assert!(table.to_json().is_err());
    }

    #[test]
    fn test_missing_width_reports_table_range() {
        let table = small_table();
        assert_eq!(
            table.constants(4).unwrap_err(),
            PoseidonError::InvalidWidth {
                width: 4,
                min: 2,
                max: 3
            }
        );
    }
}

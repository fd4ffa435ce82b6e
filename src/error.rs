//! Errors returned by the hash API and the constant providers.

use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum PoseidonError {
    /// The state width has no partial-round entry
    #[error("invalid width {width}, must be in {min}..={max}")]
    InvalidWidth { width: usize, min: usize, max: usize },

    /// Fixed-arity hash called with too few or too many inputs
    #[error("invalid inputs length {len}, must be in 1..={max}")]
    InvalidArity { len: usize, max: usize },

    /// Fixed-arity input is not a canonical field element
    #[error("input {index} is not inside the finite field")]
    OutOfField { index: usize },

    /// A constant set does not have the shape its width requires
    #[error("malformed constants for width {width}: {reason}")]
    MalformedConstants { width: usize, reason: String },

    /// An integer literal could not be parsed
    #[error("cannot parse {value:?}: {reason}")]
    Parse { value: String, reason: String },

    /// A constants file is not valid JSON for the expected layout
    #[error("constants json: {0}")]
    Json(String),
}

impl From<serde_json::Error> for PoseidonError {
    fn from(err: serde_json::Error) -> Self {
        PoseidonError::Json(err.to_string())
    }
}

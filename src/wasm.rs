//! WASM bindings for the Poseidon hash.
//!
//! Build with: `wasm-pack build --target web --features wasm --no-default-features`
//!
//! Inputs are JS arrays of decimal or `0x`-hex strings; digests come back as
//! `0x`-prefixed 64-digit hex.

use alloy_primitives::U256;
use js_sys::Array;
use wasm_bindgen::prelude::*;

use crate::field::parse_u256;
use crate::{default_hasher, PoseidonError};

fn to_js(err: PoseidonError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn parse_inputs(inputs: &Array) -> Result<Vec<U256>, JsValue> {
    inputs
        .iter()
        .map(|value| {
            let s = value
                .as_string()
                .ok_or_else(|| JsValue::from_str("inputs must be strings"))?;
            parse_u256(&s).map_err(to_js)
        })
        .collect()
}

fn to_hex(digest: U256) -> String {
    format!("0x{:064x}", digest)
}

/// WASM-accessible Poseidon hasher over the generated constants.
#[wasm_bindgen]
pub struct PoseidonWasm;

#[wasm_bindgen]
impl PoseidonWasm {
    #[wasm_bindgen(constructor)]
    pub fn new() -> PoseidonWasm {
        PoseidonWasm
    }

    /// Sponge hash with the input count as capacity.
    pub fn hash(&self, inputs: &Array, width: u32) -> Result<String, JsValue> {
        let inputs = parse_inputs(inputs)?;
        default_hasher().hash(&inputs, width as usize).map(to_hex).map_err(to_js)
    }

    #[wasm_bindgen(js_name = "hashWithCap")]
    pub fn hash_with_cap(&self, inputs: &Array, width: u32, cap: i32) -> Result<String, JsValue> {
        let inputs = parse_inputs(inputs)?;
        default_hasher()
            .hash_with_cap(&inputs, width as usize, cap as i64)
            .map(to_hex)
            .map_err(to_js)
    }

    #[wasm_bindgen(js_name = "hashFixed")]
    pub fn hash_fixed(&self, inputs: &Array) -> Result<String, JsValue> {
        let inputs = parse_inputs(inputs)?;
        default_hasher().hash_fixed(&inputs).map(to_hex).map_err(to_js)
    }
}

impl Default for PoseidonWasm {
    fn default() -> Self {
        Self::new()
    }
}

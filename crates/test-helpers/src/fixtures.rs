// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use anyhow::Result;
use fhex_invoke::{CircuitSignature, ClientParameters, CLIENT_PARAMETERS_FILE};
use fhex_keys::{LweKeyContext, LweParameters};
use std::sync::Arc;
use tempfile::TempDir;

pub const TEST_SEED: [u8; 32] = [7; 32];

/// Small parameters that keep tests fast while leaving room for 24-bit values.
pub fn test_parameters() -> LweParameters {
    LweParameters {
        dimension: 64,
        noise_log2: 30,
    }
}

pub fn test_keys() -> Arc<LweKeyContext> {
    seeded_keys(TEST_SEED)
}

pub fn seeded_keys(seed: [u8; 32]) -> Arc<LweKeyContext> {
    Arc::new(LweKeyContext::from_seed(test_parameters(), seed).expect("test parameters are valid"))
}

pub fn client_parameters(name: &str, signature: &CircuitSignature) -> ClientParameters {
    ClientParameters {
        function_name: name.to_string(),
        inputs: signature.inputs().to_vec(),
        outputs: signature.outputs().to_vec(),
        key: Some(test_parameters()),
    }
}

/// A library directory holding only `client_parameters.json`.
pub fn library_dir(params: &[ClientParameters]) -> Result<TempDir> {
    let dir = tempfile::tempdir()?;
    ClientParameters::save_all(&dir.path().join(CLIENT_PARAMETERS_FILE), params)?;
    Ok(dir)
}

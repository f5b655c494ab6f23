// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::error::{Error, Result};
use crate::gate::GateDescriptor;
use crate::signature::CircuitSignature;
use fhex_keys::LweParameters;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// File the compiler writes next to a circuit library.
pub const CLIENT_PARAMETERS_FILE: &str = "client_parameters.json";

/// Stem of the shared object in a library directory (`libfhexcircuit.so` on Linux).
pub const CIRCUIT_LIBRARY_NAME: &str = "fhexcircuit";

/// Everything a client needs to prepare arguments for one exported function.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClientParameters {
    pub function_name: String,
    pub inputs: Vec<GateDescriptor>,
    pub outputs: Vec<GateDescriptor>,
    /// Key parameters the circuit was compiled for, when the compiler pinned them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<LweParameters>,
}

impl ClientParameters {
    pub fn signature(&self) -> Result<CircuitSignature> {
        CircuitSignature::new(self.inputs.clone(), self.outputs.clone())
    }

    /// Reads the JSON array of client parameters stored at `path`.
    pub fn load_all(path: &Path) -> Result<Vec<Self>> {
        let contents = fs::read_to_string(path).map_err(|source| Error::ClientParametersIo {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| Error::ClientParametersFormat {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path, function_name: &str) -> Result<Self> {
        Self::load_all(path)?
            .into_iter()
            .find(|p| p.function_name == function_name)
            .ok_or_else(|| Error::UnknownSignature {
                name: function_name.to_string(),
            })
    }

    pub fn save_all(path: &Path, params: &[Self]) -> Result<()> {
        let io_error = |source| Error::ClientParametersIo {
            path: path.to_path_buf(),
            source,
        };
        let json = serde_json::to_string_pretty(params).map_err(|source| {
            Error::ClientParametersFormat {
                path: path.to_path_buf(),
                source,
            }
        })?;
        fs::write(path, json).map_err(io_error)
    }
}

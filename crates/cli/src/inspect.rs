// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use anyhow::{Context, Result};
use fhex_config::AppConfig;
use fhex_invoke::{ClientParameters, GateDescriptor, LweParameters, ResultKind, CLIENT_PARAMETERS_FILE};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Serialize, PartialEq)]
pub struct GateSummary {
    kind: ResultKind,
    encrypted: bool,
    width: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<Vec<usize>>,
}

impl From<&GateDescriptor> for GateSummary {
    fn from(gate: &GateDescriptor) -> Self {
        Self {
            kind: gate.kind(),
            encrypted: gate.is_encrypted(),
            width: gate.width(),
            dimensions: gate.dimensions().map(<[usize]>::to_vec),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FunctionSummary {
    function: String,
    arity: usize,
    inputs: Vec<GateSummary>,
    outputs: Vec<GateSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    key: Option<LweParameters>,
}

pub fn summarize(params: &ClientParameters) -> Result<FunctionSummary> {
    let signature = params
        .signature()
        .with_context(|| format!("Invalid signature for '{}'", params.function_name))?;
    Ok(FunctionSummary {
        function: params.function_name.clone(),
        arity: signature.arity(),
        inputs: signature.inputs().iter().map(GateSummary::from).collect(),
        outputs: signature.outputs().iter().map(GateSummary::from).collect(),
        key: params.key,
    })
}

pub fn execute(config: &AppConfig, function: &str, library_dir: Option<PathBuf>) -> Result<()> {
    let dir = library_dir.unwrap_or_else(|| config.library_dir.clone());
    let params = ClientParameters::load(&dir.join(CLIENT_PARAMETERS_FILE), function)?;
    println!("{}", serde_json::to_string_pretty(&summarize(&params)?)?);
    Ok(())
}

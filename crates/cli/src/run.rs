// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use anyhow::{anyhow, bail, Context, Result};
use fhex_config::AppConfig;
use fhex_invoke::{
    no_optimization, ArgumentSet, ClientParameters, CompiledModule, GateDescriptor, Invocable,
    KeyContext, LweKeyContext, LweParameters, CLIENT_PARAMETERS_FILE,
};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};
use zeroize::Zeroizing;

pub fn execute(
    config: &AppConfig,
    function: &str,
    library_dir: Option<PathBuf>,
    raw_args: &[String],
) -> Result<()> {
    let dir = library_dir.unwrap_or_else(|| config.library_dir.clone());
    let params = ClientParameters::load(&dir.join(CLIENT_PARAMETERS_FILE), function)?;
    let keys = key_context(config, params.key.unwrap_or(config.keys))?;

    let module = CompiledModule::from_library_dir(&dir)?;
    let invocable = Invocable::create(
        function,
        module,
        no_optimization,
        config.runtime_library.as_deref(),
    )?;

    let results = run_function(&invocable, keys, raw_args)?;
    println!("{}", serde_json::to_string_pretty(&results)?);
    Ok(())
}

/// Derives keys from the configured seed, or draws fresh ones.
pub fn key_context(config: &AppConfig, params: LweParameters) -> Result<Arc<LweKeyContext>> {
    let keys = match config.seed_bytes()? {
        Some(seed) => {
            let seed = Zeroizing::new(seed);
            debug!("Deriving keys from the configured seed");
            LweKeyContext::from_seed(params, *seed)
        }
        None => LweKeyContext::from_entropy(params),
    }
    .context("Could not create key context")?;
    Ok(Arc::new(keys))
}

/// Binds `raw_args`, invokes, and returns one JSON value per output.
pub fn run_function(
    invocable: &Invocable,
    keys: Arc<dyn KeyContext>,
    raw_args: &[String],
) -> Result<Vec<Value>> {
    let signature = invocable.signature().clone();
    if raw_args.len() != signature.inputs().len() {
        bail!(
            "'{}' takes {} arguments, got {}",
            invocable.name(),
            signature.inputs().len(),
            raw_args.len()
        );
    }

    let mut args = invocable.arguments(keys);
    for (pos, (gate, raw)) in signature.inputs().iter().zip(raw_args).enumerate() {
        bind_argument(&mut args, pos, gate, raw)
            .with_context(|| format!("Could not set argument {pos} to '{raw}'"))?;
    }

    invocable.invoke(&mut args)?;
    info!(function = invocable.name(), "Invocation complete");

    signature
        .outputs()
        .iter()
        .enumerate()
        .map(|(pos, gate)| decode_result(&args, pos, gate))
        .collect()
}

fn bind_argument(args: &mut ArgumentSet, pos: usize, gate: &GateDescriptor, raw: &str) -> Result<()> {
    let Some(dims) = gate.dimensions() else {
        args.set_arg(pos, parse_value(raw)?)?;
        return Ok(());
    };

    let values = raw
        .split(',')
        .map(|v| parse_value(v.trim()))
        .collect::<Result<Vec<u64>>>()?;
    match gate.storage_bits() {
        8 => args.set_arg_tensor(pos, &narrow::<u8>(&values)?, dims)?,
        16 => args.set_arg_tensor(pos, &narrow::<u16>(&values)?, dims)?,
        32 => args.set_arg_tensor(pos, &narrow::<u32>(&values)?, dims)?,
        _ => args.set_arg_tensor(pos, &values, dims)?,
    }
    Ok(())
}

fn decode_result(args: &ArgumentSet, pos: usize, gate: &GateDescriptor) -> Result<Value> {
    let Some(dims) = gate.dimensions() else {
        return Ok(json!(args.get_result(pos)?));
    };
    let values: Vec<u64> = match gate.storage_bits() {
        8 => widen(args.get_result_vec::<u8>(pos)?),
        16 => widen(args.get_result_vec::<u16>(pos)?),
        32 => widen(args.get_result_vec::<u32>(pos)?),
        _ => args.get_result_vec::<u64>(pos)?,
    };
    Ok(json!({ "dimensions": dims, "values": values }))
}

fn parse_value(raw: &str) -> Result<u64> {
    let parsed = match raw.strip_prefix("0x") {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => raw.parse(),
    };
    parsed.with_context(|| format!("'{raw}' is not an unsigned integer"))
}

fn narrow<T: TryFrom<u64>>(values: &[u64]) -> Result<Vec<T>> {
    values
        .iter()
        .map(|v| {
            T::try_from(*v)
                .map_err(|_| anyhow!("{v} does not fit in {} bits", size_of::<T>() * 8))
        })
        .collect()
}

fn widen<T: Into<u64>>(values: Vec<T>) -> Vec<u64> {
    values.into_iter().map(Into::into).collect()
}

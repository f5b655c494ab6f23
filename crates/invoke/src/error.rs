// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::gate::Direction;
use fhex_keys::KeyError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid {direction} position {pos}: the circuit declares {arity}")]
    InvalidPosition {
        pos: usize,
        arity: usize,
        direction: Direction,
    },

    #[error("Position {pos} is a scalar, not a tensor")]
    NotATensor { pos: usize },

    #[error("Position {pos} is a tensor, not a scalar")]
    NotAScalar { pos: usize },

    #[error("Width mismatch at position {pos}: expected {expected} bits, got {actual}")]
    WidthMismatch {
        pos: usize,
        expected: u32,
        actual: u32,
    },

    #[error("Shape mismatch at position {pos}: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        pos: usize,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("Size mismatch at position {pos}: shape holds {expected} elements, got {actual}")]
    SizeMismatch {
        pos: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Buffer size mismatch for result {pos}: result holds {expected} elements, buffer has {actual}")]
    BufferSizeMismatch {
        pos: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Argument {pos} was not set before invocation")]
    MissingArgument { pos: usize },

    #[error("Arity mismatch: the function takes {expected} pointers, the argument set has {actual}")]
    ArityMismatch { expected: usize, actual: usize },

    #[error("Argument set was built for a different signature (first difference at position {pos})")]
    SignatureMismatch { pos: usize },

    #[error("Results are not available until the circuit has been invoked")]
    ResultNotReady,

    #[error("Result slot {pos} no longer points at the buffer allocated for it")]
    ResultSlotOverwritten { pos: usize },

    #[error("Symbol '{name}' not found in the compiled module")]
    SymbolNotFound { name: String },

    #[error("No signature was provided for function '{name}'")]
    UnknownSignature { name: String },

    #[error("Could not link '{}': {source}", path.display())]
    LinkError {
        path: PathBuf,
        #[source]
        source: libloading::Error,
    },

    #[error("Optimization hook failed: {0:#}")]
    Optimization(anyhow::Error),

    #[error("Could not encrypt argument {pos}: {source}")]
    EncryptionError {
        pos: usize,
        #[source]
        source: KeyError,
    },

    #[error("Could not decrypt result {pos}: {source}")]
    DecryptionError {
        pos: usize,
        #[source]
        source: KeyError,
    },

    #[error("Invalid gate descriptor: {0}")]
    InvalidGate(String),

    #[error("Could not read client parameters from '{}': {source}", path.display())]
    ClientParametersIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not parse client parameters in '{}': {source}", path.display())]
    ClientParametersFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

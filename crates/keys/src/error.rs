// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use thiserror::Error as ThisError;

#[derive(ThisError, Debug, Clone, PartialEq, Eq)]
pub enum KeyError {
    #[error("Width {width} is not supported by this key context (1..={max})")]
    UnsupportedWidth { width: u32, max: u32 },

    #[error("Value {value} does not fit in {width} bits")]
    ValueOutOfRange { value: u64, width: u32 },

    #[error("Malformed ciphertext: expected {expected} words, found {actual}")]
    MalformedCiphertext { expected: usize, actual: usize },

    #[error("Ciphertext dimension {actual} does not match key dimension {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Invalid key parameters: {0}")]
    InvalidParameters(String),
}

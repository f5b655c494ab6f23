// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Word layout and plaintext encoding of LWE ciphertexts.
//!
//! A ciphertext of dimension `n` is `n + 2` words: `[n, a_0, .., a_{n-1}, b]`. The leading
//! header word makes the buffer self-describing, so native routines only need a thin pointer.
//! Arithmetic is modulo 2^64. A cleartext of `width` bits is placed just under one padding bit,
//! at `value << (63 - width)`.

use crate::{Ciphertext, KeyError};

pub const HEADER_WORDS: usize = 1;

/// Largest width the encoding can represent at all. Noise lowers the usable width further.
pub const MAX_ENCODABLE_WIDTH: u32 = 62;

pub fn ciphertext_words(dimension: usize) -> usize {
    HEADER_WORDS + dimension + 1
}

/// A noiseless encryption of zero: header set, mask and body cleared.
pub fn blank(dimension: usize) -> Ciphertext {
    let mut words = vec![0u64; ciphertext_words(dimension)];
    words[0] = dimension as u64;
    Ciphertext::from_words(words)
}

/// Reads the dimension from the header and checks it against the buffer length.
///
/// The header may have been written by native code, so it is not trusted to be small. A header
/// whose word count does not fit in `usize` is reported with `expected: usize::MAX`.
pub fn dimension_of(words: &[u64]) -> Result<usize, KeyError> {
    let Some(&header) = words.first() else {
        return Err(KeyError::MalformedCiphertext {
            expected: ciphertext_words(0),
            actual: 0,
        });
    };
    let dimension = usize::try_from(header).ok();
    let expected = dimension.and_then(|d| d.checked_add(HEADER_WORDS + 1));
    match (dimension, expected) {
        (Some(dimension), Some(expected)) if expected == words.len() => Ok(dimension),
        _ => Err(KeyError::MalformedCiphertext {
            expected: expected.unwrap_or(usize::MAX),
            actual: words.len(),
        }),
    }
}

/// Splits a well-formed ciphertext into its mask and body.
pub fn split(words: &[u64]) -> Result<(&[u64], u64), KeyError> {
    let dimension = dimension_of(words)?;
    Ok((
        &words[HEADER_WORDS..HEADER_WORDS + dimension],
        words[HEADER_WORDS + dimension],
    ))
}

pub fn split_mut(words: &mut [u64]) -> Result<(&mut [u64], &mut u64), KeyError> {
    let dimension = dimension_of(words)?;
    let (mask, body) = words[HEADER_WORDS..].split_at_mut(dimension);
    Ok((mask, &mut body[0]))
}

fn shift(width: u32) -> u32 {
    63 - width
}

pub fn encode(value: u64, width: u32) -> u64 {
    value << shift(width)
}

/// Rounds a phase to the nearest encoded value and drops the padding bit.
pub fn decode(phase: u64, width: u32) -> u64 {
    let shift = shift(width);
    let rounded = phase.wrapping_add(1u64 << (shift - 1)) >> shift;
    rounded & ((1u64 << width) - 1)
}

// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{Ciphertext, KeyError};

/// Holder of the keys for one set of circuit parameters.
///
/// Implementations must be safe to call from several threads at once: argument sets running on
/// different threads share a single context. Contexts whose primitives need exclusive access
/// can be wrapped in [`crate::SerializedKeyContext`].
pub trait KeyContext: Send + Sync {
    /// Number of 64-bit words in one ciphertext under these parameters.
    fn ciphertext_size(&self) -> usize;

    /// Widest cleartext, in bits, that survives an encrypt/decrypt round trip.
    fn max_width(&self) -> u32;

    /// A blank ciphertext buffer that native code can write a result into.
    fn alloc_ciphertext(&self) -> Ciphertext;

    fn encrypt(&self, value: u64, width: u32) -> Result<Ciphertext, KeyError>;

    fn decrypt(&self, ciphertext: &[u64], width: u32) -> Result<u64, KeyError>;
}

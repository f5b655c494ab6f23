// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

/// An owned ciphertext buffer.
///
/// The words live in a boxed slice so the buffer address is stable for as long as the value
/// lives, even when the `Ciphertext` itself is moved. Native code holds on to that address.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ciphertext(Box<[u64]>);

impl Ciphertext {
    pub fn from_words(words: impl Into<Box<[u64]>>) -> Self {
        Self(words.into())
    }

    pub fn words(&self) -> &[u64] {
        &self.0
    }

    pub fn words_mut(&mut self) -> &mut [u64] {
        &mut self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_mut_ptr(&mut self) -> *mut u64 {
        self.0.as_mut_ptr()
    }

    pub fn into_words(self) -> Box<[u64]> {
        self.0
    }
}

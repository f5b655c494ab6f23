// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{Ciphertext, KeyContext, KeyError};
use std::sync::{Mutex, PoisonError};

/// Encrypt/decrypt primitives that need exclusive access, for example a key set backed by a
/// stateful native library.
pub trait KeyPrimitives: Send {
    fn ciphertext_size(&self) -> usize;
    fn max_width(&self) -> u32;
    fn alloc_ciphertext(&self) -> Ciphertext;
    fn encrypt(&mut self, value: u64, width: u32) -> Result<Ciphertext, KeyError>;
    fn decrypt(&mut self, ciphertext: &[u64], width: u32) -> Result<u64, KeyError>;
}

/// Puts a mutual-exclusion boundary around [`KeyPrimitives`] so they can be shared as a
/// [`KeyContext`] by argument sets on several threads.
pub struct SerializedKeyContext<P> {
    inner: Mutex<P>,
}

impl<P: KeyPrimitives> SerializedKeyContext<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner: Mutex::new(inner),
        }
    }

    pub fn into_inner(self) -> P {
        self.inner
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn with<R>(&self, f: impl FnOnce(&mut P) -> R) -> R {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }
}

impl<P: KeyPrimitives> KeyContext for SerializedKeyContext<P> {
    fn ciphertext_size(&self) -> usize {
        self.with(|p| p.ciphertext_size())
    }

    fn max_width(&self) -> u32 {
        self.with(|p| p.max_width())
    }

    fn alloc_ciphertext(&self) -> Ciphertext {
        self.with(|p| p.alloc_ciphertext())
    }

    fn encrypt(&self, value: u64, width: u32) -> Result<Ciphertext, KeyError> {
        self.with(|p| p.encrypt(value, width))
    }

    fn decrypt(&self, ciphertext: &[u64], width: u32) -> Result<u64, KeyError> {
        self.with(|p| p.decrypt(ciphertext, width))
    }
}

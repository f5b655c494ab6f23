// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::element::Element;
use fhex_keys::Ciphertext;
use std::ffi::c_void;
use tracing::trace;

/// A heap buffer whose address has been (or will be) handed to native code.
///
/// All variants keep their data behind a box, so moving the value never moves the data.
pub(crate) enum OwnedBuffer {
    Ciphertext(Ciphertext),
    /// Addresses of the element ciphertexts of an encrypted tensor.
    PointerTable(Box<[*mut u64]>),
    /// Cleartext tensor elements at their storage width, 8-byte aligned.
    Cleartext(Box<[u64]>),
}

impl OwnedBuffer {
    fn kind(&self) -> &'static str {
        match self {
            OwnedBuffer::Ciphertext(_) => "ciphertext",
            OwnedBuffer::PointerTable(_) => "pointer table",
            OwnedBuffer::Cleartext(_) => "cleartext",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct BufferId(usize);

/// Single owner of every buffer an argument set allocates.
///
/// Each buffer is freed exactly once: either by an explicit [`BufferArena::release`] when a
/// binding is replaced, or when the arena is dropped.
#[derive(Default)]
pub(crate) struct BufferArena {
    entries: Vec<Option<OwnedBuffer>>,
    free: Vec<usize>,
    live: usize,
}

impl BufferArena {
    pub fn adopt(&mut self, buffer: OwnedBuffer) -> BufferId {
        trace!(kind = buffer.kind(), "Adopting buffer");
        self.live += 1;
        match self.free.pop() {
            Some(index) => {
                self.entries[index] = Some(buffer);
                BufferId(index)
            }
            None => {
                self.entries.push(Some(buffer));
                BufferId(self.entries.len() - 1)
            }
        }
    }

    pub fn release(&mut self, id: BufferId) {
        let Some(buffer) = self.entries.get_mut(id.0).and_then(Option::take) else {
            debug_assert!(false, "buffer {id:?} released twice");
            return;
        };
        trace!(kind = buffer.kind(), "Releasing buffer");
        self.live -= 1;
        self.free.push(id.0);
    }

    pub fn live(&self) -> usize {
        self.live
    }

    pub fn ciphertext(&self, id: BufferId) -> &[u64] {
        match self.entries.get(id.0) {
            Some(Some(OwnedBuffer::Ciphertext(ct))) => ct.words(),
            _ => unreachable!("buffer {id:?} is not a live ciphertext"),
        }
    }

    pub fn pointer_table(&self, id: BufferId) -> &[*mut u64] {
        match self.entries.get(id.0) {
            Some(Some(OwnedBuffer::PointerTable(table))) => table,
            _ => unreachable!("buffer {id:?} is not a live pointer table"),
        }
    }

    pub fn cleartext(&self, id: BufferId) -> &[u64] {
        match self.entries.get(id.0) {
            Some(Some(OwnedBuffer::Cleartext(words))) => words,
            _ => unreachable!("buffer {id:?} is not a live cleartext buffer"),
        }
    }
}

impl Drop for BufferArena {
    fn drop(&mut self) {
        if self.live > 0 {
            trace!(released = self.live, "Releasing remaining buffers");
        }
    }
}

/// Buffers staged for one position, plus the address to install in its slot.
pub(crate) enum Staged {
    Value(u64),
    Buffers {
        address: *mut c_void,
        owned: Vec<OwnedBuffer>,
    },
}

impl Staged {
    pub fn ciphertext(mut ct: Ciphertext) -> Self {
        Staged::Buffers {
            address: ct.as_mut_ptr().cast(),
            owned: vec![OwnedBuffer::Ciphertext(ct)],
        }
    }

    /// Element ciphertexts followed by the table of their addresses.
    pub fn ciphertext_table(mut cts: Vec<Ciphertext>) -> Self {
        let mut table: Box<[*mut u64]> = cts.iter_mut().map(Ciphertext::as_mut_ptr).collect();
        let address = table.as_mut_ptr().cast();
        let mut owned: Vec<OwnedBuffer> = cts.into_iter().map(OwnedBuffer::Ciphertext).collect();
        owned.push(OwnedBuffer::PointerTable(table));
        Staged::Buffers { address, owned }
    }

    pub fn cleartext(mut words: Box<[u64]>) -> Self {
        Staged::Buffers {
            address: words.as_mut_ptr().cast(),
            owned: vec![OwnedBuffer::Cleartext(words)],
        }
    }
}

/// Zeroed, 8-byte aligned storage for `count` elements of `storage_bits` each.
pub(crate) fn staging_words(count: usize, storage_bits: u32) -> Box<[u64]> {
    let bytes = count * (storage_bits as usize / 8);
    vec![0u64; bytes.div_ceil(8)].into_boxed_slice()
}

/// Views staging storage as `count` elements of `T`.
///
/// The caller must have allocated `words` with [`staging_words`] for at least `count` elements
/// of `T::BITS`.
pub(crate) fn elements<T: Element>(words: &[u64], count: usize) -> &[T] {
    assert!(words.len() * 8 >= count * size_of::<T>());
    // SAFETY: `T` is a sealed unsigned integer with alignment <= 8, any bit pattern is valid,
    // and the length was checked above.
    unsafe { std::slice::from_raw_parts(words.as_ptr().cast::<T>(), count) }
}

pub(crate) fn elements_mut<T: Element>(words: &mut [u64], count: usize) -> &mut [T] {
    assert!(words.len() * 8 >= count * size_of::<T>());
    // SAFETY: see `elements`.
    unsafe { std::slice::from_raw_parts_mut(words.as_mut_ptr().cast::<T>(), count) }
}

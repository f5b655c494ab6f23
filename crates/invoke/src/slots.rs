// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use std::ffi::c_void;
use std::ptr;

/// One word of the packed calling convention: a cleartext scalar or a buffer address.
#[repr(C)]
#[derive(Clone, Copy)]
union RawSlot {
    value: u64,
    buffer: *mut c_void,
}

/// Fixed block of slot words, one per circuit position.
///
/// The block is only ever touched through the raw pointer it was created with, so the
/// addresses handed out by [`SlotBlock::call_vector`] stay valid for the block's lifetime.
pub(crate) struct SlotBlock {
    base: *mut RawSlot,
    len: usize,
}

impl SlotBlock {
    pub fn new(len: usize) -> Self {
        let words: Box<[RawSlot]> = vec![RawSlot { value: 0 }; len].into_boxed_slice();
        Self {
            base: Box::into_raw(words).cast::<RawSlot>(),
            len,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    fn slot(&self, offset: usize) -> *mut RawSlot {
        assert!(offset < self.len, "slot {offset} out of {}", self.len);
        // SAFETY: in bounds of the allocation made in `new`.
        unsafe { self.base.add(offset) }
    }

    /// One pointer per slot, in position order.
    pub fn call_vector(&self) -> Vec<*mut c_void> {
        (0..self.len).map(|i| self.slot(i).cast()).collect()
    }

    pub fn write_value(&mut self, offset: usize, value: u64) {
        // SAFETY: `slot` checks bounds; the block is exclusively owned.
        unsafe { self.slot(offset).write(RawSlot { value }) }
    }

    pub fn write_buffer(&mut self, offset: usize, buffer: *mut c_void) {
        // SAFETY: as above.
        unsafe { self.slot(offset).write(RawSlot { buffer }) }
    }

    pub fn read_value(&self, offset: usize) -> u64 {
        // SAFETY: every bit pattern is a valid u64.
        unsafe { self.slot(offset).read().value }
    }

    pub fn read_buffer(&self, offset: usize) -> *mut c_void {
        // SAFETY: the pointer is only compared, never dereferenced by callers.
        unsafe { self.slot(offset).read().buffer }
    }
}

impl Drop for SlotBlock {
    fn drop(&mut self) {
        // SAFETY: reconstructs the box leaked in `new` exactly once.
        unsafe { drop(Box::from_raw(ptr::slice_from_raw_parts_mut(self.base, self.len))) }
    }
}

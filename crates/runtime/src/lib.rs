// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Ciphertext arithmetic routines that compiled circuits call into.
//!
//! Every routine takes thin pointers to LWE ciphertexts in the [`fhex_keys::lwe`] word layout.
//! The header word of each operand carries its dimension. `res` may alias any operand.
//!
//! # Safety
//!
//! All pointers must reference well-formed ciphertexts that share one dimension and stay
//! valid for the duration of the call. Nothing is checked; a malformed operand is undefined
//! behavior, which is why argument marshaling happens in `fhex-invoke` before any call here.

use fhex_keys::lwe::{self, HEADER_WORDS};

#[inline(always)]
unsafe fn len(ct: *const u64) -> usize {
    lwe::ciphertext_words(*ct as usize)
}

#[inline(always)]
unsafe fn body(ct: *mut u64) -> *mut u64 {
    ct.add(len(ct) - 1)
}

/// Applies `f` word by word over mask and body, then copies the header.
#[inline(always)]
unsafe fn map_words(res: *mut u64, a: *const u64, mut f: impl FnMut(usize, u64) -> u64) {
    let n = len(a);
    for i in HEADER_WORDS..n {
        *res.add(i) = f(i, *a.add(i));
    }
    *res = *a;
}

/// Total number of words of the ciphertext at `ct`, header included.
#[no_mangle]
pub unsafe extern "C" fn fhex_lwe_size(ct: *const u64) -> u64 {
    len(ct) as u64
}

#[no_mangle]
pub unsafe extern "C" fn fhex_lwe_zero(res: *mut u64) {
    map_words(res, res, |_, _| 0);
}

#[no_mangle]
pub unsafe extern "C" fn fhex_lwe_copy(res: *mut u64, a: *const u64) {
    map_words(res, a, |_, x| x);
}

#[no_mangle]
pub unsafe extern "C" fn fhex_lwe_add(res: *mut u64, a: *const u64, b: *const u64) {
    map_words(res, a, |i, x| x.wrapping_add(*b.add(i)));
}

#[no_mangle]
pub unsafe extern "C" fn fhex_lwe_neg(res: *mut u64, a: *const u64) {
    map_words(res, a, |_, x| x.wrapping_neg());
}

/// `res = a + plaintext`, where `plaintext` is already encoded (see [`fhex_encode_plaintext`]).
#[no_mangle]
pub unsafe extern "C" fn fhex_lwe_add_plaintext(res: *mut u64, a: *const u64, plaintext: u64) {
    fhex_lwe_copy(res, a);
    let b = body(res);
    *b = (*b).wrapping_add(plaintext);
}

#[no_mangle]
pub unsafe extern "C" fn fhex_lwe_mul_cleartext(res: *mut u64, a: *const u64, cleartext: u64) {
    map_words(res, a, |_, x| x.wrapping_mul(cleartext));
}

/// `acc += a * cleartext`
#[no_mangle]
pub unsafe extern "C" fn fhex_lwe_mul_cleartext_add(acc: *mut u64, a: *const u64, cleartext: u64) {
    map_words(acc, a, |i, x| (*acc.add(i)).wrapping_add(x.wrapping_mul(cleartext)));
}

#[no_mangle]
pub extern "C" fn fhex_encode_plaintext(value: u64, width: u32) -> u64 {
    lwe::encode(value, width)
}

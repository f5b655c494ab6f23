// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Hand-lowered circuits in the packed calling convention, built on the runtime routines.

use fhex_invoke::{CircuitSignature, CompiledModule, GateDescriptor};
use fhex_runtime::{
    fhex_encode_plaintext, fhex_lwe_add, fhex_lwe_add_plaintext, fhex_lwe_copy,
    fhex_lwe_mul_cleartext, fhex_lwe_mul_cleartext_add, fhex_lwe_neg, fhex_lwe_zero,
};
use std::ffi::c_void;

pub const ADD: &str = "add";
pub const DOT_PRODUCT: &str = "dot_product";
pub const IDENTITY: &str = "identity";
pub const PASSTHROUGH: &str = "passthrough";
pub const TRANSPOSE: &str = "transpose";
pub const SCALE: &str = "scale";
pub const WIDEN: &str = "widen";
pub const SUM_AND_DIFFERENCE: &str = "sum_and_difference";
pub const REDIRECT: &str = "redirect";
pub const REDIRECT_ELEMENT: &str = "redirect_element";

pub const DOT_WEIGHTS: [u64; 4] = [1, 2, 3, 4];
pub const SCALE_FACTOR: u64 = 3;

static FOREIGN_CIPHERTEXT: [u64; 3] = [1, 0, 0];

unsafe fn scalar(args: *mut *mut c_void, pos: usize) -> u64 {
    *(*args.add(pos)).cast::<u64>()
}

unsafe fn set_scalar(args: *mut *mut c_void, pos: usize, value: u64) {
    *(*args.add(pos)).cast::<u64>() = value;
}

unsafe fn buffer<T>(args: *mut *mut c_void, pos: usize) -> *mut T {
    *(*args.add(pos)).cast::<*mut T>()
}

fn scalar_gate(width: u32, encrypted: bool) -> GateDescriptor {
    GateDescriptor::scalar(width, encrypted).expect("valid scalar gate")
}

fn tensor_gate(width: u32, encrypted: bool, dims: &[usize]) -> GateDescriptor {
    GateDescriptor::tensor(width, encrypted, dims.to_vec()).expect("valid tensor gate")
}

fn signature(inputs: Vec<GateDescriptor>, outputs: Vec<GateDescriptor>) -> CircuitSignature {
    CircuitSignature::new(inputs, outputs).expect("valid signature")
}

/// `(encrypted u8 a, cleartext u8 b) -> encrypted a + b`
pub unsafe extern "C" fn add(args: *mut *mut c_void) {
    let a = buffer::<u64>(args, 0);
    let b = scalar(args, 1);
    let out = buffer::<u64>(args, 2);
    fhex_lwe_add_plaintext(out, a, fhex_encode_plaintext(b, 8));
}

pub fn add_signature() -> CircuitSignature {
    signature(
        vec![scalar_gate(8, true), scalar_gate(8, false)],
        vec![scalar_gate(8, true)],
    )
}

/// Encrypted `[u8; 4]` dotted with [`DOT_WEIGHTS`].
pub unsafe extern "C" fn dot_product(args: *mut *mut c_void) {
    let elements = buffer::<*mut u64>(args, 0);
    let out = buffer::<u64>(args, 1);
    fhex_lwe_zero(out);
    for (i, weight) in DOT_WEIGHTS.iter().enumerate() {
        fhex_lwe_mul_cleartext_add(out, *elements.add(i), *weight);
    }
}

pub fn dot_product_signature() -> CircuitSignature {
    signature(
        vec![tensor_gate(8, true, &[DOT_WEIGHTS.len()])],
        vec![scalar_gate(8, true)],
    )
}

/// Cleartext 64-bit identity.
pub unsafe extern "C" fn identity(args: *mut *mut c_void) {
    set_scalar(args, 1, scalar(args, 0));
}

pub fn identity_signature() -> CircuitSignature {
    signature(vec![scalar_gate(64, false)], vec![scalar_gate(64, false)])
}

/// Copies one encrypted scalar of any width to the result.
pub unsafe extern "C" fn passthrough(args: *mut *mut c_void) {
    fhex_lwe_copy(buffer::<u64>(args, 1), buffer::<u64>(args, 0));
}

pub fn passthrough_signature(width: u32) -> CircuitSignature {
    signature(vec![scalar_gate(width, true)], vec![scalar_gate(width, true)])
}

/// Cleartext `u8` matrix, 2x3 to 3x2.
pub unsafe extern "C" fn transpose(args: *mut *mut c_void) {
    let src = buffer::<u8>(args, 0);
    let dst = buffer::<u8>(args, 1);
    for row in 0..2 {
        for col in 0..3 {
            *dst.add(col * 2 + row) = *src.add(row * 3 + col);
        }
    }
}

pub fn transpose_signature() -> CircuitSignature {
    signature(
        vec![tensor_gate(8, false, &[2, 3])],
        vec![tensor_gate(8, false, &[3, 2])],
    )
}

/// Encrypted 2x2 matrix times [`SCALE_FACTOR`].
pub unsafe extern "C" fn scale(args: *mut *mut c_void) {
    let src = buffer::<*mut u64>(args, 0);
    let dst = buffer::<*mut u64>(args, 1);
    for i in 0..4 {
        fhex_lwe_mul_cleartext(*dst.add(i), *src.add(i), SCALE_FACTOR);
    }
}

pub fn scale_signature() -> CircuitSignature {
    signature(
        vec![tensor_gate(8, true, &[2, 2])],
        vec![tensor_gate(8, true, &[2, 2])],
    )
}

/// Cleartext `u8` vector to `u16`, repeating each byte in both halves.
pub unsafe extern "C" fn widen(args: *mut *mut c_void) {
    let src = buffer::<u8>(args, 0);
    let dst = buffer::<u16>(args, 1);
    for i in 0..4 {
        let byte = *src.add(i) as u16;
        *dst.add(i) = (byte << 8) | byte;
    }
}

pub fn widen_signature() -> CircuitSignature {
    signature(
        vec![tensor_gate(8, false, &[4])],
        vec![tensor_gate(16, false, &[4])],
    )
}

/// `(encrypted a, encrypted b) -> (a + b, a - b)`, both modulo 2^8.
pub unsafe extern "C" fn sum_and_difference(args: *mut *mut c_void) {
    let a = buffer::<u64>(args, 0);
    let b = buffer::<u64>(args, 1);
    let sum = buffer::<u64>(args, 2);
    let difference = buffer::<u64>(args, 3);
    fhex_lwe_add(sum, a, b);
    fhex_lwe_neg(difference, b);
    fhex_lwe_add(difference, difference, a);
}

pub fn sum_and_difference_signature() -> CircuitSignature {
    signature(
        vec![scalar_gate(8, true), scalar_gate(8, true)],
        vec![scalar_gate(8, true), scalar_gate(8, true)],
    )
}

/// Misbehaves by pointing its result slot at memory the caller does not own.
pub unsafe extern "C" fn redirect(args: *mut *mut c_void) {
    *(*args).cast::<*const u64>() = FOREIGN_CIPHERTEXT.as_ptr();
}

pub fn redirect_signature() -> CircuitSignature {
    signature(vec![], vec![scalar_gate(8, true)])
}

/// Leaves the result table in place but repoints its first element at foreign memory.
pub unsafe extern "C" fn redirect_element(args: *mut *mut c_void) {
    let table = buffer::<*mut u64>(args, 0);
    *table = FOREIGN_CIPHERTEXT.as_ptr().cast_mut();
}

pub fn redirect_element_signature() -> CircuitSignature {
    signature(vec![], vec![tensor_gate(8, true, &[2])])
}

/// Every sample circuit, registered in-process.
pub fn sample_module() -> CompiledModule {
    CompiledModule::in_process()
        .with_function(ADD, add, add_signature())
        .with_function(DOT_PRODUCT, dot_product, dot_product_signature())
        .with_function(IDENTITY, identity, identity_signature())
        .with_function(PASSTHROUGH, passthrough, passthrough_signature(8))
        .with_function(TRANSPOSE, transpose, transpose_signature())
        .with_function(SCALE, scale, scale_signature())
        .with_function(WIDEN, widen, widen_signature())
        .with_function(
            SUM_AND_DIFFERENCE,
            sum_and_difference,
            sum_and_difference_signature(),
        )
        .with_function(REDIRECT, redirect, redirect_signature())
        .with_function(
            REDIRECT_ELEMENT,
            redirect_element,
            redirect_element_signature(),
        )
}

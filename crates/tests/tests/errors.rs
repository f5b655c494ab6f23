// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use anyhow::Result;
use fhex_invoke::{
    no_optimization, CircuitSignature, CompiledModule, Direction, Error, GateDescriptor, Invocable,
};
use fhex_test_helpers::{
    sample_module, scale, test_keys, ADD, DOT_PRODUCT, IDENTITY, PASSTHROUGH, REDIRECT,
    REDIRECT_ELEMENT, SCALE, TRANSPOSE,
};
use fhex_keys::KeyError;
use std::ffi::c_void;

fn invocable(name: &str) -> Result<Invocable> {
    Ok(Invocable::create(name, sample_module(), no_optimization, None)?)
}

#[test]
fn test_width_mismatch_allocates_nothing() -> Result<()> {
    let add = invocable(ADD)?;
    let mut args = add.arguments(test_keys());
    let before = args.live_buffers();

    let err = args.set_arg(0, 256).unwrap_err();
    assert!(matches!(
        err,
        Error::WidthMismatch {
            pos: 0,
            expected: 8,
            actual: 9
        }
    ));
    assert_eq!(args.live_buffers(), before);
    Ok(())
}

#[test]
fn test_scalar_results_have_no_dimensions() -> Result<()> {
    let add = invocable(ADD)?;
    let mut args = add.arguments(test_keys());
    assert!(matches!(
        args.result_dimensions(0),
        Err(Error::NotATensor { pos: 0 })
    ));
    assert!(matches!(
        args.result_vector_size(0),
        Err(Error::NotATensor { pos: 0 })
    ));

    args.set_arg(0, 1)?;
    args.set_arg(1, 2)?;
    add.invoke(&mut args)?;
    assert!(matches!(
        args.get_result_vec::<u8>(0),
        Err(Error::NotATensor { pos: 0 })
    ));
    Ok(())
}

#[test]
fn test_positions_are_checked() -> Result<()> {
    let add = invocable(ADD)?;
    let mut args = add.arguments(test_keys());
    assert!(matches!(
        args.set_arg(2, 1),
        Err(Error::InvalidPosition {
            pos: 2,
            arity: 2,
            direction: Direction::Input
        })
    ));
    assert!(matches!(
        args.result_kind(1),
        Err(Error::InvalidPosition {
            pos: 1,
            arity: 1,
            direction: Direction::Output
        })
    ));
    Ok(())
}

#[test]
fn test_tensor_shape_errors() -> Result<()> {
    let transpose = invocable(TRANSPOSE)?;
    let mut args = transpose.arguments(test_keys());
    assert!(matches!(
        args.set_arg(0, 1),
        Err(Error::NotAScalar { pos: 0 })
    ));
    assert!(matches!(
        args.set_arg_tensor::<u8>(0, &[1, 2, 3, 4, 5, 6], &[3, 2]),
        Err(Error::ShapeMismatch { pos: 0, ref expected, ref actual })
            if expected == &[2, 3] && actual == &[3, 2]
    ));
    assert!(matches!(
        args.set_arg_vector::<u8>(0, &[1, 2, 3, 4, 5, 6]),
        Err(Error::ShapeMismatch { .. })
    ));
    assert!(matches!(
        args.set_arg_tensor::<u8>(0, &[1, 2, 3], &[2, 3]),
        Err(Error::SizeMismatch {
            pos: 0,
            expected: 6,
            actual: 3
        })
    ));
    assert!(matches!(
        args.set_arg_tensor::<u32>(0, &[1, 2, 3, 4, 5, 6], &[2, 3]),
        Err(Error::WidthMismatch {
            pos: 0,
            expected: 8,
            actual: 32
        })
    ));
    Ok(())
}

#[test]
fn test_invocation_preconditions() -> Result<()> {
    let add = invocable(ADD)?;

    let mut args = add.arguments(test_keys());
    args.set_arg(1, 5)?;
    assert!(matches!(
        add.invoke(&mut args),
        Err(Error::MissingArgument { pos: 0 })
    ));
    assert!(matches!(args.get_result(0), Err(Error::ResultNotReady)));

    let dot = invocable(DOT_PRODUCT)?;
    let mut dot_args = dot.arguments(test_keys());
    assert!(matches!(
        add.invoke(&mut dot_args),
        Err(Error::ArityMismatch {
            expected: 3,
            actual: 2
        })
    ));

    // Same arity, different gate types.
    let identity = invocable(IDENTITY)?;
    let passthrough = invocable(PASSTHROUGH)?;
    let mut identity_args = identity.arguments(test_keys());
    identity_args.set_arg(0, 1)?;
    assert!(matches!(
        passthrough.invoke(&mut identity_args),
        Err(Error::SignatureMismatch { pos: 0 })
    ));
    Ok(())
}

#[test]
fn test_redirected_result_is_not_followed() -> Result<()> {
    let redirect = invocable(REDIRECT)?;
    let mut args = redirect.arguments(test_keys());
    redirect.invoke(&mut args)?;
    assert!(matches!(
        args.get_result(0),
        Err(Error::ResultSlotOverwritten { pos: 0 })
    ));
    Ok(())
}

#[test]
fn test_redirected_tensor_element_is_not_followed() -> Result<()> {
    let redirect = invocable(REDIRECT_ELEMENT)?;
    let mut args = redirect.arguments(test_keys());
    redirect.invoke(&mut args)?;
    assert!(matches!(
        args.get_result_vec::<u8>(0),
        Err(Error::ResultSlotOverwritten { pos: 0 })
    ));
    Ok(())
}

#[test]
fn test_tensor_elements_wider_than_the_gate() -> Result<()> {
    let nibbles = GateDescriptor::tensor(4, true, vec![2, 2])?;
    let module = CompiledModule::in_process().with_function(
        SCALE,
        scale,
        CircuitSignature::new(vec![nibbles.clone()], vec![nibbles])?,
    );
    let f = Invocable::create(SCALE, module, no_optimization, None)?;
    let mut args = f.arguments(test_keys());
    let before = args.live_buffers();

    assert!(matches!(
        args.set_arg_tensor::<u8>(0, &[1, 2, 3, 16], &[2, 2]),
        Err(Error::WidthMismatch {
            pos: 0,
            expected: 4,
            actual: 5
        })
    ));
    assert_eq!(args.live_buffers(), before);

    args.set_arg_tensor::<u8>(0, &[1, 2, 3, 15], &[2, 2])?;
    f.invoke(&mut args)?;
    assert_eq!(args.get_result_vec::<u8>(0)?, vec![3, 6, 9, 13]);
    Ok(())
}

/// Overwrites the dimension header of its encrypted result.
unsafe extern "C" fn corrupt_header(args: *mut *mut c_void) {
    let out = *(*args).cast::<*mut u64>();
    *out = u64::MAX;
}

#[test]
fn test_corrupted_result_is_a_decryption_error() -> Result<()> {
    let module = CompiledModule::in_process().with_function(
        "corrupt_header",
        corrupt_header,
        CircuitSignature::new(vec![], vec![GateDescriptor::scalar(8, true)?])?,
    );
    let f = Invocable::create("corrupt_header", module, no_optimization, None)?;
    let mut args = f.arguments(test_keys());
    f.invoke(&mut args)?;
    assert!(matches!(
        args.get_result(0),
        Err(Error::DecryptionError {
            pos: 0,
            source: KeyError::MalformedCiphertext { .. }
        })
    ));
    Ok(())
}

#[test]
fn test_result_buffer_must_match() -> Result<()> {
    let transpose = invocable(TRANSPOSE)?;
    let mut args = transpose.arguments(test_keys());
    args.set_arg_tensor::<u8>(0, &[0; 6], &[2, 3])?;
    transpose.invoke(&mut args)?;

    let mut short = [0u8; 5];
    assert!(matches!(
        args.get_result_tensor(0, &mut short),
        Err(Error::BufferSizeMismatch {
            pos: 0,
            expected: 6,
            actual: 5
        })
    ));
    Ok(())
}

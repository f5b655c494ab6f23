// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use anyhow::Result;
use fhex_invoke::{no_optimization, Error, Invocable, ResultKind};
use fhex_test_helpers::{
    sample_module, test_keys, ADD, DOT_PRODUCT, IDENTITY, SCALE, SCALE_FACTOR,
    SUM_AND_DIFFERENCE, TRANSPOSE, WIDEN,
};
use fhex_tests::test_tracing;

fn invocable(name: &str) -> Result<Invocable> {
    Ok(Invocable::create(name, sample_module(), no_optimization, None)?)
}

#[test]
fn test_encrypted_plus_cleartext() -> Result<()> {
    let _guard = test_tracing("debug");
    let add = invocable(ADD)?;

    let mut args = add.arguments(test_keys());
    args.set_arg(0, 3)?;
    args.set_arg(1, 5)?;
    add.invoke(&mut args)?;

    assert_eq!(args.result_kind(0)?, ResultKind::Scalar);
    assert_eq!(args.result_width(0)?, 8);
    assert_eq!(args.get_result(0)?, 8);
    Ok(())
}

#[test]
fn test_encrypted_dot_product() -> Result<()> {
    let dot = invocable(DOT_PRODUCT)?;

    let mut args = dot.arguments(test_keys());
    args.set_arg_vector::<u8>(0, &[1, 1, 1, 1])?;
    dot.invoke(&mut args)?;
    assert_eq!(args.get_result(0)?, 10);

    args.set_arg_tensor::<u8>(0, &[4, 3, 2, 1], &[4])?;
    dot.invoke(&mut args)?;
    assert_eq!(args.get_result(0)?, 4 + 6 + 6 + 4);
    Ok(())
}

#[test]
fn test_cleartext_identity() -> Result<()> {
    let identity = invocable(IDENTITY)?;
    for value in [0, 1, 42, u32::MAX as u64, u64::MAX] {
        let mut args = identity.arguments(test_keys());
        args.set_arg(0, value)?;
        identity.invoke(&mut args)?;
        assert_eq!(args.get_result(0)?, value);
    }
    Ok(())
}

#[test]
fn test_multiple_results() -> Result<()> {
    let f = invocable(SUM_AND_DIFFERENCE)?;
    let mut args = f.arguments(test_keys());

    args.set_arg(0, 7)?;
    args.set_arg(1, 3)?;
    f.invoke(&mut args)?;
    assert_eq!((args.get_result(0)?, args.get_result(1)?), (10, 4));

    // Arithmetic wraps at the declared width.
    args.set_arg(0, 3)?;
    args.set_arg(1, 7)?;
    f.invoke(&mut args)?;
    assert_eq!((args.get_result(0)?, args.get_result(1)?), (10, 252));
    Ok(())
}

#[test]
fn test_cleartext_tensors() -> Result<()> {
    let transpose = invocable(TRANSPOSE)?;
    let mut args = transpose.arguments(test_keys());
    args.set_arg_tensor::<u8>(0, &[1, 2, 3, 4, 5, 6], &[2, 3])?;
    transpose.invoke(&mut args)?;

    assert_eq!(args.result_kind(0)?, ResultKind::Tensor);
    assert_eq!(args.result_dimensions(0)?, &[3, 2]);
    let mut out = [0u8; 6];
    args.get_result_tensor(0, &mut out)?;
    assert_eq!(out, [1, 4, 2, 5, 3, 6]);

    let widen = invocable(WIDEN)?;
    let mut args = widen.arguments(test_keys());
    args.set_arg_vector::<u8>(0, &[0, 1, 0x7f, 0xff])?;
    widen.invoke(&mut args)?;
    assert_eq!(args.result_width(0)?, 16);
    assert_eq!(
        args.get_result_vec::<u16>(0)?,
        vec![0, 0x0101, 0x7f7f, 0xffff]
    );
    Ok(())
}

#[test]
fn test_encrypted_tensors() -> Result<()> {
    let scale = invocable(SCALE)?;
    let mut args = scale.arguments(test_keys());
    let input = [1u8, 5, 20, 80];
    args.set_arg_tensor(0, &input, &[2, 2])?;
    scale.invoke(&mut args)?;

    let expected: Vec<u8> = input
        .iter()
        .map(|v| (*v as u64 * SCALE_FACTOR % 256) as u8)
        .collect();
    assert_eq!(args.result_vector_size(0)?, 4);
    assert_eq!(args.get_result_vec::<u8>(0)?, expected);
    Ok(())
}

#[test]
fn test_results_follow_the_latest_invocation() -> Result<()> {
    let add = invocable(ADD)?;
    let mut args = add.arguments(test_keys());
    args.set_arg(0, 1)?;
    args.set_arg(1, 1)?;
    add.invoke(&mut args)?;
    assert_eq!(args.get_result(0)?, 2);

    args.set_arg(1, 9)?;
    assert!(matches!(args.get_result(0), Err(Error::ResultNotReady)));

    add.invoke(&mut args)?;
    assert_eq!(args.get_result(0)?, 10);
    Ok(())
}

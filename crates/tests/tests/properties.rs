// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use fhex_invoke::{no_optimization, CompiledModule, GateDescriptor, Invocable};
use fhex_test_helpers::{
    passthrough, passthrough_signature, sample_module, test_keys, IDENTITY, PASSTHROUGH,
};
use proptest::prelude::*;

fn passthrough_at(width: u32) -> Invocable {
    let module = CompiledModule::in_process().with_function(
        PASSTHROUGH,
        passthrough,
        passthrough_signature(width),
    );
    Invocable::create(PASSTHROUGH, module, no_optimization, None).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn encrypted_values_survive_a_call(width in 1u32..=24, raw in any::<u64>()) {
        let value = raw & ((1u64 << width) - 1);
        let f = passthrough_at(width);
        let mut args = f.arguments(test_keys());
        args.set_arg(0, value).unwrap();
        f.invoke(&mut args).unwrap();
        prop_assert_eq!(args.get_result(0).unwrap(), value);
    }

    #[test]
    fn cleartext_values_are_passed_verbatim(value in any::<u64>()) {
        let f = Invocable::create(IDENTITY, sample_module(), no_optimization, None).unwrap();
        let mut args = f.arguments(test_keys());
        args.set_arg(0, value).unwrap();
        f.invoke(&mut args).unwrap();
        prop_assert_eq!(args.get_result(0).unwrap(), value);
    }

    #[test]
    fn vector_size_is_the_product_of_dimensions(
        dims in prop::collection::vec(1usize..6, 1..4),
        width in 1u32..=64,
        encrypted in any::<bool>(),
    ) {
        let gate = GateDescriptor::tensor(width, encrypted, dims.clone()).unwrap();
        prop_assert_eq!(gate.element_count(), dims.iter().product::<usize>());
        prop_assert_eq!(gate.dimensions(), Some(dims.as_slice()));
    }
}

// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use anyhow::Result;
use fhex_invoke::{no_optimization, Invocable};
use fhex_keys::{
    Ciphertext, KeyContext, KeyError, KeyPrimitives, LweKeyContext, SerializedKeyContext,
};
use fhex_test_helpers::{sample_module, test_parameters, ADD, DOT_PRODUCT, TEST_SEED};
use std::sync::Arc;
use std::thread;

/// Forwards to an LWE key set and counts every call it serves.
struct CountingKeys {
    inner: LweKeyContext,
    encryptions: usize,
    decryptions: usize,
}

impl KeyPrimitives for CountingKeys {
    fn ciphertext_size(&self) -> usize {
        self.inner.ciphertext_size()
    }

    fn max_width(&self) -> u32 {
        self.inner.max_width()
    }

    fn alloc_ciphertext(&self) -> Ciphertext {
        self.inner.alloc_ciphertext()
    }

    fn encrypt(&mut self, value: u64, width: u32) -> Result<Ciphertext, KeyError> {
        self.encryptions += 1;
        self.inner.encrypt(value, width)
    }

    fn decrypt(&mut self, ciphertext: &[u64], width: u32) -> Result<u64, KeyError> {
        self.decryptions += 1;
        self.inner.decrypt(ciphertext, width)
    }
}

#[test]
fn test_shared_invocable_across_threads() -> Result<()> {
    let add = Arc::new(Invocable::create(
        ADD,
        sample_module(),
        no_optimization,
        None,
    )?);
    let keys = Arc::new(LweKeyContext::from_seed(test_parameters(), TEST_SEED)?);

    thread::scope(|s| {
        let handles: Vec<_> = (0..4u64)
            .map(|t| {
                let add = add.clone();
                let keys = keys.clone();
                s.spawn(move || -> Result<()> {
                    let mut args = add.arguments(keys);
                    for v in 0..20u64 {
                        let a = (t * 20 + v) % 256;
                        args.set_arg(0, a)?;
                        args.set_arg(1, t)?;
                        add.invoke(&mut args)?;
                        assert_eq!(args.get_result(0)?, (a + t) % 256);
                    }
                    Ok(())
                })
            })
            .collect();
        handles
            .into_iter()
            .try_for_each(|h| h.join().expect("worker panicked"))
    })
}

#[test]
fn test_serialized_key_context() -> Result<()> {
    let dot = Invocable::create(DOT_PRODUCT, sample_module(), no_optimization, None)?;
    let keys = Arc::new(SerializedKeyContext::new(CountingKeys {
        inner: LweKeyContext::from_seed(test_parameters(), TEST_SEED)?,
        encryptions: 0,
        decryptions: 0,
    }));

    thread::scope(|s| -> Result<()> {
        let workers: Vec<_> = (1..=3u64)
            .map(|t| {
                let keys: Arc<dyn KeyContext> = keys.clone();
                let dot = &dot;
                s.spawn(move || -> Result<u64> {
                    let mut args = dot.arguments(keys);
                    args.set_arg_vector::<u8>(0, &[t as u8; 4])?;
                    dot.invoke(&mut args)?;
                    Ok(args.get_result(0)?)
                })
            })
            .collect();
        for (t, worker) in (1..=3u64).zip(workers) {
            let result = worker.join().expect("worker panicked")?;
            assert_eq!(result, t * 10);
        }
        Ok(())
    })?;

    let counts = Arc::try_unwrap(keys)
        .ok()
        .expect("no other owners")
        .into_inner();
    assert_eq!(counts.encryptions, 12);
    assert_eq!(counts.decryptions, 3);
    Ok(())
}

// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::arena::{self, BufferArena, BufferId, Staged};
use crate::element::Element;
use crate::error::{Error, Result};
use crate::gate::{GateDescriptor, ResultKind};
use crate::signature::CircuitSignature;
use crate::slots::SlotBlock;
use fhex_keys::{Ciphertext, KeyContext};
use std::ffi::c_void;
use std::sync::Arc;
use tracing::{debug, warn};

struct Binding {
    offset: usize,
    /// Address installed in the slot, if the position is passed by reference.
    address: Option<*mut c_void>,
    owned: Vec<BufferId>,
}

/// Marshals the arguments and results of one invocation.
///
/// An argument set is built from a circuit signature and the key context used to encrypt its
/// inputs and decrypt its outputs. Output buffers are allocated up front so the native code
/// can write its results in place; inputs are staged as they are set. Every buffer is owned by
/// the set and freed with it.
///
/// Argument sets are not shared between threads while in use: create one per concurrent
/// invocation.
pub struct ArgumentSet {
    signature: Arc<CircuitSignature>,
    keys: Arc<dyn KeyContext>,
    slots: SlotBlock,
    call_vector: Vec<*mut c_void>,
    inputs: Vec<Option<Binding>>,
    outputs: Vec<Binding>,
    arena: BufferArena,
    ready: bool,
}

// SAFETY: the raw pointers held here only reference buffers owned by the same value (the slot
// block and the arena), so moving the set to another thread moves the pointees with it.
unsafe impl Send for ArgumentSet {}

impl ArgumentSet {
    pub fn new(signature: Arc<CircuitSignature>, keys: Arc<dyn KeyContext>) -> Self {
        let slots = SlotBlock::new(signature.arity());
        let call_vector = slots.call_vector();
        let mut set = Self {
            inputs: signature.inputs().iter().map(|_| None).collect(),
            outputs: Vec::with_capacity(signature.outputs().len()),
            signature: signature.clone(),
            keys,
            slots,
            call_vector,
            arena: BufferArena::default(),
            ready: false,
        };

        let first_output = signature.inputs().len();
        for (pos, gate) in signature.outputs().iter().enumerate() {
            let staged = set.allocate_output(gate);
            let binding = set.install(first_output + pos, staged);
            set.outputs.push(binding);
        }
        debug!(
            arity = signature.arity(),
            buffers = set.arena.live(),
            "Allocated argument set"
        );
        set
    }

    pub fn signature(&self) -> &Arc<CircuitSignature> {
        &self.signature
    }

    /// Buffers currently owned by this set.
    pub fn live_buffers(&self) -> usize {
        self.arena.live()
    }

    /// Whether results from a completed invocation are available.
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Binds a scalar input. Encrypted positions are encrypted under the set's key context.
    pub fn set_arg(&mut self, pos: usize, value: u64) -> Result<()> {
        let signature = self.signature.clone();
        let gate = signature.input_gate(pos)?;
        if !gate.is_scalar() {
            return Err(Error::NotAScalar { pos });
        }
        let actual = significant_bits(value);
        if actual > gate.width() {
            return Err(Error::WidthMismatch {
                pos,
                expected: gate.width(),
                actual,
            });
        }

        let staged = if gate.is_encrypted() {
            let ct = self
                .keys
                .encrypt(value, gate.width())
                .map_err(|source| Error::EncryptionError { pos, source })?;
            Staged::ciphertext(ct)
        } else {
            Staged::Value(value)
        };
        self.bind_input(pos, staged);
        Ok(())
    }

    /// Binds a tensor input given as row-major elements and the shape they describe.
    ///
    /// The element type must be the machine integer the gate stores its width in, and `shape`
    /// must equal the declared dimensions exactly.
    pub fn set_arg_tensor<T: Element>(&mut self, pos: usize, data: &[T], shape: &[usize]) -> Result<()> {
        let signature = self.signature.clone();
        let gate = signature.input_gate(pos)?;
        let Some(dims) = gate.dimensions() else {
            return Err(Error::NotATensor { pos });
        };
        if T::BITS != gate.storage_bits() {
            return Err(Error::WidthMismatch {
                pos,
                expected: gate.storage_bits(),
                actual: T::BITS,
            });
        }
        if shape != dims {
            return Err(Error::ShapeMismatch {
                pos,
                expected: dims.to_vec(),
                actual: shape.to_vec(),
            });
        }
        let expected = gate.element_count();
        if data.len() != expected {
            return Err(Error::SizeMismatch {
                pos,
                expected,
                actual: data.len(),
            });
        }
        let widest = data.iter().map(|v| significant_bits(v.to_u64())).max();
        if let Some(actual) = widest.filter(|bits| *bits > gate.width()) {
            return Err(Error::WidthMismatch {
                pos,
                expected: gate.width(),
                actual,
            });
        }

        let staged = if gate.is_encrypted() {
            // Partially encrypted tensors are dropped here on error.
            let cts = data
                .iter()
                .map(|v| self.keys.encrypt(v.to_u64(), gate.width()))
                .collect::<std::result::Result<Vec<Ciphertext>, _>>()
                .map_err(|source| Error::EncryptionError { pos, source })?;
            Staged::ciphertext_table(cts)
        } else {
            let mut words = arena::staging_words(data.len(), gate.storage_bits());
            arena::elements_mut::<T>(&mut words, data.len()).copy_from_slice(data);
            Staged::cleartext(words)
        };
        self.bind_input(pos, staged);
        Ok(())
    }

    /// Binds a rank-1 tensor input.
    pub fn set_arg_vector<T: Element>(&mut self, pos: usize, data: &[T]) -> Result<()> {
        self.set_arg_tensor(pos, data, &[data.len()])
    }

    /// Reads a scalar result, decrypting it when the output gate is encrypted.
    pub fn get_result(&self, pos: usize) -> Result<u64> {
        let gate = self.signature.output_gate(pos)?;
        if !gate.is_scalar() {
            return Err(Error::NotAScalar { pos });
        }
        self.ensure_ready()?;
        let binding = &self.outputs[pos];
        if !gate.is_encrypted() {
            return Ok(self.slots.read_value(binding.offset));
        }
        self.check_slot(pos, binding)?;
        self.keys
            .decrypt(self.arena.ciphertext(binding.owned[0]), gate.width())
            .map_err(|source| Error::DecryptionError { pos, source })
    }

    /// Copies a tensor result into `out`, which must hold exactly the declared element count.
    pub fn get_result_tensor<T: Element>(&self, pos: usize, out: &mut [T]) -> Result<()> {
        let gate = self.signature.output_gate(pos)?;
        if gate.is_scalar() {
            return Err(Error::NotATensor { pos });
        }
        if T::BITS != gate.storage_bits() {
            return Err(Error::WidthMismatch {
                pos,
                expected: gate.storage_bits(),
                actual: T::BITS,
            });
        }
        let expected = gate.element_count();
        if out.len() != expected {
            return Err(Error::BufferSizeMismatch {
                pos,
                expected,
                actual: out.len(),
            });
        }
        self.ensure_ready()?;
        let binding = &self.outputs[pos];
        self.check_slot(pos, binding)?;

        if gate.is_encrypted() {
            // The native side may have repointed individual elements, not just the table.
            let elements = &binding.owned[..expected];
            let table = self.arena.pointer_table(binding.owned[expected]);
            let repointed = elements.iter().zip(table).any(|(id, entry)| {
                !std::ptr::eq(entry.cast_const(), self.arena.ciphertext(*id).as_ptr())
            });
            if repointed {
                return Err(Error::ResultSlotOverwritten { pos });
            }
            for (element, id) in out.iter_mut().zip(elements) {
                let value = self
                    .keys
                    .decrypt(self.arena.ciphertext(*id), gate.width())
                    .map_err(|source| Error::DecryptionError { pos, source })?;
                *element = T::from_u64(value);
            }
        } else {
            let words = self.arena.cleartext(binding.owned[0]);
            out.copy_from_slice(arena::elements::<T>(words, expected));
        }
        Ok(())
    }

    /// Reads a tensor result into a freshly allocated vector.
    pub fn get_result_vec<T: Element>(&self, pos: usize) -> Result<Vec<T>> {
        let mut out = vec![T::default(); self.signature.result_vector_size(pos)?];
        self.get_result_tensor(pos, &mut out)?;
        Ok(out)
    }

    pub fn result_kind(&self, pos: usize) -> Result<ResultKind> {
        self.signature.result_kind(pos)
    }

    pub fn result_width(&self, pos: usize) -> Result<u32> {
        self.signature.result_width(pos)
    }

    pub fn result_dimensions(&self, pos: usize) -> Result<&[usize]> {
        self.signature.result_dimensions(pos)
    }

    pub fn result_vector_size(&self, pos: usize) -> Result<usize> {
        self.signature.result_vector_size(pos)
    }

    pub(crate) fn arity(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn ensure_complete(&self) -> Result<()> {
        match self.inputs.iter().position(Option::is_none) {
            Some(pos) => Err(Error::MissingArgument { pos }),
            None => Ok(()),
        }
    }

    pub(crate) fn call_vector_mut(&mut self) -> &mut [*mut c_void] {
        &mut self.call_vector
    }

    pub(crate) fn mark_ready(&mut self) {
        self.ready = true;
    }

    fn ensure_ready(&self) -> Result<()> {
        if self.ready {
            Ok(())
        } else {
            Err(Error::ResultNotReady)
        }
    }

    fn check_slot(&self, pos: usize, binding: &Binding) -> Result<()> {
        match binding.address {
            Some(address) if self.slots.read_buffer(binding.offset) != address => {
                Err(Error::ResultSlotOverwritten { pos })
            }
            _ => Ok(()),
        }
    }

    fn allocate_output(&self, gate: &GateDescriptor) -> Staged {
        match (gate.is_scalar(), gate.is_encrypted()) {
            (true, false) => Staged::Value(0),
            (true, true) => Staged::ciphertext(self.keys.alloc_ciphertext()),
            (false, false) => {
                Staged::cleartext(arena::staging_words(gate.element_count(), gate.storage_bits()))
            }
            (false, true) => Staged::ciphertext_table(
                (0..gate.element_count())
                    .map(|_| self.keys.alloc_ciphertext())
                    .collect(),
            ),
        }
    }

    fn install(&mut self, offset: usize, staged: Staged) -> Binding {
        match staged {
            Staged::Value(value) => {
                self.slots.write_value(offset, value);
                Binding {
                    offset,
                    address: None,
                    owned: vec![],
                }
            }
            Staged::Buffers { address, owned } => {
                self.slots.write_buffer(offset, address);
                Binding {
                    offset,
                    address: Some(address),
                    owned: owned.into_iter().map(|b| self.arena.adopt(b)).collect(),
                }
            }
        }
    }

    fn bind_input(&mut self, pos: usize, staged: Staged) {
        let binding = self.install(pos, staged);
        if let Some(previous) = self.inputs[pos].replace(binding) {
            warn!(
                pos,
                released = previous.owned.len(),
                "Argument was already set, replacing it"
            );
            for id in previous.owned {
                self.arena.release(id);
            }
        }
        self.ready = false;
    }
}

fn significant_bits(value: u64) -> u32 {
    u64::BITS - value.leading_zeros()
}

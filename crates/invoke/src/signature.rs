// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::error::{Error, Result};
use crate::gate::{Direction, GateDescriptor, ResultKind};
use serde::{Deserialize, Serialize};

/// Ordered input and output gates of one compiled function.
///
/// The native function receives `arity()` pointers: one per input, then one per output.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SignatureParts")]
pub struct CircuitSignature {
    inputs: Vec<GateDescriptor>,
    outputs: Vec<GateDescriptor>,
}

#[derive(Deserialize)]
struct SignatureParts {
    inputs: Vec<GateDescriptor>,
    outputs: Vec<GateDescriptor>,
}

impl TryFrom<SignatureParts> for CircuitSignature {
    type Error = Error;

    fn try_from(parts: SignatureParts) -> Result<Self> {
        CircuitSignature::new(parts.inputs, parts.outputs)
    }
}

impl CircuitSignature {
    pub fn new(inputs: Vec<GateDescriptor>, outputs: Vec<GateDescriptor>) -> Result<Self> {
        if outputs.is_empty() {
            return Err(Error::InvalidGate(
                "a circuit needs at least one output to hold its result".into(),
            ));
        }
        Ok(Self { inputs, outputs })
    }

    pub fn inputs(&self) -> &[GateDescriptor] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[GateDescriptor] {
        &self.outputs
    }

    pub fn arity(&self) -> usize {
        self.inputs.len() + self.outputs.len()
    }

    pub fn input_gate(&self, pos: usize) -> Result<&GateDescriptor> {
        self.inputs.get(pos).ok_or(Error::InvalidPosition {
            pos,
            arity: self.inputs.len(),
            direction: Direction::Input,
        })
    }

    pub fn output_gate(&self, pos: usize) -> Result<&GateDescriptor> {
        self.outputs.get(pos).ok_or(Error::InvalidPosition {
            pos,
            arity: self.outputs.len(),
            direction: Direction::Output,
        })
    }

    pub fn result_kind(&self, pos: usize) -> Result<ResultKind> {
        Ok(self.output_gate(pos)?.kind())
    }

    /// Width of the scalar result, or of each element of a tensor result.
    pub fn result_width(&self, pos: usize) -> Result<u32> {
        Ok(self.output_gate(pos)?.width())
    }

    pub fn result_dimensions(&self, pos: usize) -> Result<&[usize]> {
        self.output_gate(pos)?
            .dimensions()
            .ok_or(Error::NotATensor { pos })
    }

    pub fn result_vector_size(&self, pos: usize) -> Result<usize> {
        Ok(self.result_dimensions(pos)?.iter().product())
    }

    /// First position at which two signatures disagree, counting inputs then outputs.
    pub(crate) fn first_difference(&self, other: &CircuitSignature) -> Option<usize> {
        let ours = self.inputs.iter().chain(&self.outputs);
        let theirs = other.inputs.iter().chain(&other.outputs);
        let common = ours.zip(theirs).position(|(a, b)| a != b);
        match common {
            Some(pos) => Some(pos),
            None if self.inputs.len() != other.inputs.len() => {
                Some(self.inputs.len().min(other.inputs.len()))
            }
            None if self.arity() != other.arity() => Some(self.arity().min(other.arity())),
            None => None,
        }
    }
}

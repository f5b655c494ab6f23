// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Widest cleartext element a gate may carry.
pub const MAX_GATE_WIDTH: u32 = 64;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Input,
    Output,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Input => write!(f, "input"),
            Direction::Output => write!(f, "output"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultKind {
    Scalar,
    Tensor,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GateShape {
    Scalar,
    Tensor(Vec<usize>),
}

/// Type of one circuit position as declared by the compiler.
///
/// The raw call only ever sees pointers; this descriptor is the sole source of truth for what
/// a position holds. Values are validated on construction and never change afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawGate", into = "RawGate")]
pub struct GateDescriptor {
    encrypted: bool,
    width: u32,
    shape: GateShape,
}

impl GateDescriptor {
    pub fn scalar(width: u32, encrypted: bool) -> Result<Self> {
        Self::new(width, encrypted, GateShape::Scalar)
    }

    pub fn tensor(width: u32, encrypted: bool, dimensions: impl Into<Vec<usize>>) -> Result<Self> {
        Self::new(width, encrypted, GateShape::Tensor(dimensions.into()))
    }

    fn new(width: u32, encrypted: bool, shape: GateShape) -> Result<Self> {
        if width == 0 || width > MAX_GATE_WIDTH {
            return Err(Error::InvalidGate(format!(
                "element width {width} is outside 1..={MAX_GATE_WIDTH}"
            )));
        }
        if let GateShape::Tensor(dims) = &shape {
            if dims.is_empty() {
                return Err(Error::InvalidGate("tensor rank must be at least 1".into()));
            }
            if dims.iter().any(|d| *d == 0) {
                return Err(Error::InvalidGate(format!(
                    "tensor dimensions must be positive, got {dims:?}"
                )));
            }
            let bytes = dims
                .iter()
                .try_fold(storage_bytes(width), |acc, d| acc.checked_mul(*d))
                .filter(|bytes| *bytes <= isize::MAX as usize);
            if bytes.is_none() {
                return Err(Error::InvalidGate(format!(
                    "tensor of shape {dims:?} is too large to stage"
                )));
            }
        }
        Ok(Self {
            encrypted,
            width,
            shape,
        })
    }

    pub fn is_encrypted(&self) -> bool {
        self.encrypted
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self.shape, GateShape::Scalar)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn shape(&self) -> &GateShape {
        &self.shape
    }

    pub fn kind(&self) -> ResultKind {
        match self.shape {
            GateShape::Scalar => ResultKind::Scalar,
            GateShape::Tensor(_) => ResultKind::Tensor,
        }
    }

    /// Tensor dimensions; `None` for scalars.
    pub fn dimensions(&self) -> Option<&[usize]> {
        match &self.shape {
            GateShape::Scalar => None,
            GateShape::Tensor(dims) => Some(dims),
        }
    }

    pub fn element_count(&self) -> usize {
        self.dimensions().map_or(1, |dims| dims.iter().product())
    }

    /// Bits of the machine integer that holds one cleartext element.
    pub fn storage_bits(&self) -> u32 {
        storage_bytes(self.width) as u32 * 8
    }
}

fn storage_bytes(width: u32) -> usize {
    width.next_power_of_two().max(8) as usize / 8
}

/// Wire form used in client parameters. An empty `dimensions` list is a scalar.
#[derive(Serialize, Deserialize)]
struct RawGate {
    encrypted: bool,
    width: u32,
    #[serde(default)]
    dimensions: Vec<usize>,
}

impl TryFrom<RawGate> for GateDescriptor {
    type Error = Error;

    fn try_from(raw: RawGate) -> Result<Self> {
        if raw.dimensions.is_empty() {
            GateDescriptor::scalar(raw.width, raw.encrypted)
        } else {
            GateDescriptor::tensor(raw.width, raw.encrypted, raw.dimensions)
        }
    }
}

impl From<GateDescriptor> for RawGate {
    fn from(gate: GateDescriptor) -> Self {
        let dimensions = match gate.shape {
            GateShape::Scalar => vec![],
            GateShape::Tensor(dims) => dims,
        };
        RawGate {
            encrypted: gate.encrypted,
            width: gate.width,
            dimensions,
        }
    }
}

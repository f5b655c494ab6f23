// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod arena;
mod arguments;
mod element;
mod error;
mod gate;
mod invocable;
mod module;
mod params;
mod signature;
mod slots;

pub use arguments::ArgumentSet;
pub use element::Element;
pub use error::{Error, Result};
pub use gate::{Direction, GateDescriptor, GateShape, ResultKind, MAX_GATE_WIDTH};
pub use invocable::{no_optimization, Invocable};
pub use module::{CompiledModule, RawEntryPoint};
pub use params::{ClientParameters, CIRCUIT_LIBRARY_NAME, CLIENT_PARAMETERS_FILE};
pub use signature::CircuitSignature;

// Re-exported so callers can build key contexts without depending on fhex-keys directly.
pub use fhex_keys::{KeyContext, LweKeyContext, LweParameters};

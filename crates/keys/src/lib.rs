// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod ciphertext;
mod context;
mod error;
pub mod lwe;
mod lwe_context;
mod serialized;

pub use ciphertext::Ciphertext;
pub use context::KeyContext;
pub use error::KeyError;
pub use lwe_context::{LweKeyContext, LweParameters, SharedRng};
pub use serialized::{KeyPrimitives, SerializedKeyContext};

// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::arguments::ArgumentSet;
use crate::error::{Error, Result};
use crate::module::{open_library, CompiledModule, RawEntryPoint};
use crate::signature::CircuitSignature;
use fhex_keys::KeyContext;
use libloading::Library;
use std::ffi::c_void;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Hook that leaves the module unchanged.
pub fn no_optimization(_: &mut CompiledModule) -> anyhow::Result<()> {
    Ok(())
}

/// A linked, callable circuit function.
///
/// An invocable is immutable once created and may be shared between threads; each concurrent
/// call needs its own [`ArgumentSet`].
pub struct Invocable {
    name: String,
    signature: Arc<CircuitSignature>,
    entry: RawEntryPoint,
    // Kept alive for as long as `entry` may be called.
    _module: Option<Arc<Library>>,
    _runtime: Option<Arc<Library>>,
}

impl std::fmt::Debug for Invocable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Invocable")
            .field("name", &self.name)
            .field("arity", &self.signature.arity())
            .finish()
    }
}

impl Invocable {
    /// Links `name` from `module`.
    ///
    /// `optimize` runs first and may rewrite the module. The runtime library, when given, is
    /// loaded with its symbols exported globally before the circuit library is opened.
    #[instrument(skip_all, fields(name = %name))]
    pub fn create<F>(
        name: &str,
        mut module: CompiledModule,
        optimize: F,
        runtime_library: Option<&Path>,
    ) -> Result<Self>
    where
        F: FnOnce(&mut CompiledModule) -> anyhow::Result<()>,
    {
        optimize(&mut module).map_err(Error::Optimization)?;

        let runtime = match runtime_library {
            Some(path) => {
                let library = open_library(path, true).map_err(|source| Error::LinkError {
                    path: path.to_path_buf(),
                    source,
                })?;
                debug!(path = %path.display(), "Loaded runtime library");
                Some(Arc::new(library))
            }
            None => None,
        };

        let library = module.open()?;
        let entry = module.resolve(name, library.as_deref())?;
        let signature = module
            .signature(name)
            .cloned()
            .ok_or_else(|| Error::UnknownSignature {
                name: name.to_string(),
            })?;

        info!(arity = signature.arity(), "Linked circuit function");
        Ok(Self {
            name: name.to_string(),
            signature,
            entry,
            _module: library,
            _runtime: runtime,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn signature(&self) -> &Arc<CircuitSignature> {
        &self.signature
    }

    /// Number of pointers the raw entry point expects.
    pub fn arity(&self) -> usize {
        self.signature.arity()
    }

    /// A fresh argument set for this function.
    pub fn arguments(&self, keys: Arc<dyn KeyContext>) -> ArgumentSet {
        ArgumentSet::new(self.signature.clone(), keys)
    }

    /// Calls the function with a fully bound argument set. Results are then readable from it.
    #[instrument(skip_all, fields(name = %self.name))]
    pub fn invoke(&self, args: &mut ArgumentSet) -> Result<()> {
        if args.arity() != self.arity() {
            return Err(Error::ArityMismatch {
                expected: self.arity(),
                actual: args.arity(),
            });
        }
        if !Arc::ptr_eq(args.signature(), &self.signature) {
            if let Some(pos) = self.signature.first_difference(args.signature()) {
                return Err(Error::SignatureMismatch { pos });
            }
        }
        args.ensure_complete()?;

        // SAFETY: the argument set was validated against this function's signature, so every
        // slot holds a value or a live buffer of the declared layout.
        unsafe { self.invoke_raw(args.call_vector_mut()) };
        args.mark_ready();
        debug!("Invocation finished");
        Ok(())
    }

    /// Calls the entry point with a caller-built pointer array.
    ///
    /// # Safety
    ///
    /// `pointers` must hold exactly [`Self::arity`] entries, each pointing at a word laid out
    /// the way the signature declares for its position, and output buffers must be writable.
    pub unsafe fn invoke_raw(&self, pointers: &mut [*mut c_void]) {
        debug_assert_eq!(pointers.len(), self.arity());
        (self.entry)(pointers.as_mut_ptr());
    }
}

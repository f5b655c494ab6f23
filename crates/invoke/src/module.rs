// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::error::{Error, Result};
use crate::params::{ClientParameters, CIRCUIT_LIBRARY_NAME, CLIENT_PARAMETERS_FILE};
use crate::signature::CircuitSignature;
use libloading::Library;
use std::collections::HashMap;
use std::ffi::c_void;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Entry point of a compiled function in the packed calling convention: a single pointer to
/// an array holding one pointer per position, inputs first, then outputs.
pub type RawEntryPoint = unsafe extern "C" fn(*mut *mut c_void);

/// A compiled circuit module awaiting linking.
///
/// Functions either live in a shared object, loaded when an [`Invocable`](crate::Invocable) is
/// created, or are registered directly from the current process. Optimization hooks may
/// override or alias entry points before symbols are resolved.
pub struct CompiledModule {
    path: Option<PathBuf>,
    entries: HashMap<String, RawEntryPoint>,
    aliases: HashMap<String, String>,
    signatures: HashMap<String, Arc<CircuitSignature>>,
}

impl CompiledModule {
    pub fn shared_object(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::in_process()
        }
    }

    pub fn in_process() -> Self {
        Self {
            path: None,
            entries: HashMap::new(),
            aliases: HashMap::new(),
            signatures: HashMap::new(),
        }
    }

    /// Opens a directory produced by the compiler: a circuit library plus its
    /// `client_parameters.json`.
    pub fn from_library_dir(dir: &Path) -> Result<Self> {
        let params = ClientParameters::load_all(&dir.join(CLIENT_PARAMETERS_FILE))?;
        let mut module = Self::shared_object(dir.join(libloading::library_filename(
            CIRCUIT_LIBRARY_NAME,
        )));
        for p in params {
            module.set_signature(&p.function_name, p.signature()?);
        }
        debug!(
            dir = %dir.display(),
            functions = module.signatures.len(),
            "Opened library directory"
        );
        Ok(module)
    }

    /// Registers an in-process function together with its signature.
    pub fn with_function(
        mut self,
        name: &str,
        entry: RawEntryPoint,
        signature: CircuitSignature,
    ) -> Self {
        self.define(name, entry);
        self.set_signature(name, signature);
        self
    }

    /// Defines or replaces the entry point for `name`; takes precedence over the shared object.
    pub fn define(&mut self, name: &str, entry: RawEntryPoint) -> Option<RawEntryPoint> {
        self.entries.insert(name.to_string(), entry)
    }

    /// Makes `name` resolve to the symbol `target`.
    pub fn alias(&mut self, name: &str, target: &str) {
        self.aliases.insert(name.to_string(), target.to_string());
    }

    pub fn set_signature(&mut self, name: &str, signature: CircuitSignature) {
        self.signatures
            .insert(name.to_string(), Arc::new(signature));
    }

    pub fn signature(&self, name: &str) -> Option<&Arc<CircuitSignature>> {
        self.signatures.get(name)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Names of functions with a known signature, sorted.
    pub fn function_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.signatures.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Loads the shared object, if any, with all of its symbols bound immediately.
    pub(crate) fn open(&self) -> Result<Option<Arc<Library>>> {
        let Some(path) = &self.path else {
            return Ok(None);
        };
        let library = open_library(path, false).map_err(|source| Error::LinkError {
            path: path.clone(),
            source,
        })?;
        info!(path = %path.display(), "Loaded circuit library");
        Ok(Some(Arc::new(library)))
    }

    pub(crate) fn resolve(&self, name: &str, library: Option<&Library>) -> Result<RawEntryPoint> {
        let target = self.aliases.get(name).map_or(name, String::as_str);
        if let Some(entry) = self.entries.get(target) {
            return Ok(*entry);
        }
        let not_found = || Error::SymbolNotFound {
            name: target.to_string(),
        };
        let library = library.ok_or_else(not_found)?;
        // SAFETY: exported circuit functions follow the packed calling convention.
        let symbol = unsafe { library.get::<RawEntryPoint>(target.as_bytes()) };
        symbol.map(|s| *s).map_err(|_| not_found())
    }
}

/// Opens a shared library with immediate binding. `global` makes its symbols available to
/// libraries loaded afterwards, which is how circuits find the runtime.
pub(crate) fn open_library(path: &Path, global: bool) -> std::result::Result<Library, libloading::Error> {
    #[cfg(unix)]
    {
        use libloading::os::unix::{Library as UnixLibrary, RTLD_GLOBAL, RTLD_LOCAL, RTLD_NOW};
        let visibility = if global { RTLD_GLOBAL } else { RTLD_LOCAL };
        // SAFETY: loading runs the library's initializers; callers only load circuit and
        // runtime libraries they were pointed at.
        unsafe { UnixLibrary::open(Some(path), RTLD_NOW | visibility) }.map(Library::from)
    }
    #[cfg(not(unix))]
    {
        let _ = global;
        // SAFETY: as above.
        unsafe { Library::new(path) }
    }
}

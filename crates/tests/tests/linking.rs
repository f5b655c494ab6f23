// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use anyhow::{bail, Result};
use fhex_invoke::{
    no_optimization, CompiledModule, Error, Invocable, CIRCUIT_LIBRARY_NAME,
};
use fhex_test_helpers::{
    add_signature, client_parameters, dot_product_signature, library_dir, sample_module,
    test_keys, ADD, DOT_PRODUCT,
};
use std::path::Path;

#[test]
fn test_unknown_symbol() {
    let err = Invocable::create("missing", sample_module(), no_optimization, None).unwrap_err();
    assert!(matches!(err, Error::SymbolNotFound { ref name } if name == "missing"));
}

#[test]
fn test_library_dir_without_library() -> Result<()> {
    let dir = library_dir(&[
        client_parameters(ADD, &add_signature()),
        client_parameters(DOT_PRODUCT, &dot_product_signature()),
    ])?;
    let module = CompiledModule::from_library_dir(dir.path())?;
    assert_eq!(module.function_names(), vec![ADD, DOT_PRODUCT]);
    assert_eq!(module.signature(ADD).map(|s| s.arity()), Some(3));

    let Err(Error::LinkError { path, .. }) =
        Invocable::create(ADD, module, no_optimization, None)
    else {
        bail!("link error expected");
    };
    assert!(path
        .to_string_lossy()
        .contains(CIRCUIT_LIBRARY_NAME));
    Ok(())
}

#[test]
fn test_missing_runtime_library() {
    let runtime = Path::new("/nonexistent/libfhex_runtime.so");
    let err = Invocable::create(ADD, sample_module(), no_optimization, Some(runtime)).unwrap_err();
    assert!(matches!(err, Error::LinkError { ref path, .. } if path == runtime));
    assert!(err.to_string().contains("/nonexistent/libfhex_runtime.so"));
}

#[test]
fn test_optimization_hook_failure() {
    let err = Invocable::create(
        ADD,
        sample_module(),
        |_: &mut CompiledModule| -> anyhow::Result<()> { bail!("unsupported operation") },
        None,
    )
    .unwrap_err();
    assert!(matches!(err, Error::Optimization(_)));
    assert!(err.to_string().contains("unsupported operation"));
}

#[test]
fn test_optimization_hook_can_export_aliases() -> Result<()> {
    let hook = |module: &mut CompiledModule| -> anyhow::Result<()> {
        module.alias("plus", ADD);
        module.set_signature("plus", add_signature());
        Ok(())
    };
    let plus = Invocable::create("plus", sample_module(), hook, None)?;
    assert_eq!(plus.name(), "plus");

    let mut args = plus.arguments(test_keys());
    args.set_arg(0, 40)?;
    args.set_arg(1, 2)?;
    plus.invoke(&mut args)?;
    assert_eq!(args.get_result(0)?, 42);
    Ok(())
}

#[test]
fn test_alias_without_signature() {
    let hook = |module: &mut CompiledModule| -> anyhow::Result<()> {
        module.alias("plus", ADD);
        Ok(())
    };
    let err = Invocable::create("plus", sample_module(), hook, None).unwrap_err();
    assert!(matches!(err, Error::UnknownSignature { ref name } if name == "plus"));
}

#[cfg(target_os = "linux")]
mod shared_objects {
    use super::*;
    use anyhow::Context;
    use std::path::PathBuf;

    /// Resolved by the dynamic loader's search path; already mapped into the test process.
    const LIBC: &str = "libc.so.6";

    fn mapped_libc() -> Result<PathBuf> {
        let maps = std::fs::read_to_string("/proc/self/maps")?;
        maps.lines()
            .filter_map(|line| line.split_whitespace().nth(5))
            .find(|path| {
                path.rsplit('/')
                    .next()
                    .is_some_and(|file| file.starts_with("libc.so") || file.starts_with("libc-"))
            })
            .map(PathBuf::from)
            .context("libc is not mapped into this process")
    }

    #[test]
    fn test_runtime_library_is_linked() -> Result<()> {
        let add = Invocable::create(ADD, sample_module(), no_optimization, Some(Path::new(LIBC)))?;
        let mut args = add.arguments(test_keys());
        args.set_arg(0, 3)?;
        args.set_arg(1, 5)?;
        add.invoke(&mut args)?;
        assert_eq!(args.get_result(0)?, 8);
        Ok(())
    }

    // The resolved entry points are never called: they are not circuits.
    #[test]
    fn test_symbols_resolve_from_a_loaded_library() -> Result<()> {
        let libc = |name: &str| {
            let mut module = CompiledModule::shared_object(LIBC);
            module.set_signature(name, add_signature());
            module
        };
        let strlen = Invocable::create("strlen", libc("strlen"), no_optimization, None)?;
        assert_eq!(strlen.name(), "strlen");
        assert_eq!(strlen.arity(), 3);

        let err = Invocable::create(
            "fhex_missing_circuit",
            libc("fhex_missing_circuit"),
            no_optimization,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, Error::SymbolNotFound { ref name } if name == "fhex_missing_circuit"));
        Ok(())
    }

    #[test]
    fn test_library_dir_links_its_library() -> Result<()> {
        let dir = library_dir(&[client_parameters("strlen", &add_signature())])?;
        let library = dir.path().join(format!("lib{CIRCUIT_LIBRARY_NAME}.so"));
        // A link, not a copy, so the loader hands back the libc already in the process.
        std::os::unix::fs::symlink(mapped_libc()?, &library)?;

        let module = CompiledModule::from_library_dir(dir.path())?;
        assert_eq!(module.path(), Some(library.as_path()));
        let strlen = Invocable::create("strlen", module, no_optimization, Some(Path::new(LIBC)))?;
        assert_eq!(strlen.signature().inputs().len(), 2);
        Ok(())
    }
}

// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use path_clean::clean;
use std::path::{Path, PathBuf};

/// Searches a directory and its ancestors for a file.
pub type FindInParent = fn(&Path, &str) -> Option<PathBuf>;

/// Nearest `filename` in `dir` or one of its ancestors.
pub fn find_in_parent(dir: &Path, filename: &str) -> Option<PathBuf> {
    dir.ancestors()
        .map(|ancestor| ancestor.join(filename))
        .find(|candidate| candidate.is_file())
}

/// Picks the configuration file to read.
///
/// An explicit `cli_file` always wins and is taken relative to `cwd`. Otherwise the nearest
/// `default_filename` at or above `cwd` is used, and failing that the one in
/// `default_config_dir`. The returned path need not exist.
pub fn resolve_config_path<P: Into<PathBuf>>(
    search: FindInParent,
    cwd: P,
    default_config_dir: P,
    default_filename: &str,
    cli_file: Option<P>,
) -> PathBuf {
    let cwd = cwd.into();
    match cli_file {
        Some(file) => relative_to(&cwd, &file.into()),
        None => search(&cwd, default_filename)
            .unwrap_or_else(|| clean(default_config_dir.into().join(default_filename))),
    }
}

/// Joins relative `path` onto `base`; absolute paths are returned unchanged.
pub fn relative_to(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        clean(base.join(path))
    }
}

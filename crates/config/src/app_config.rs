// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::load_config::{find_in_parent, relative_to, resolve_config_path};
use anyhow::{bail, Context, Result};
use fhex_keys::LweParameters;
use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const DEFAULT_CONFIG_NAME: &str = "fhex.config.yaml";
pub const ENV_PREFIX: &str = "FHEX_";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Parameters used when generating a key context.
    pub keys: LweParameters,
    /// Hex encoded 32 byte seed. Keys are derived from it when set, otherwise drawn from the OS.
    pub seed: Option<String>,
    /// Runtime library linked before any circuit library.
    pub runtime_library: Option<PathBuf>,
    /// Directory holding the circuit library and its client parameters.
    pub library_dir: PathBuf,
    #[serde(skip)]
    config_file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            keys: LweParameters::default(),
            seed: None,
            runtime_library: None,
            library_dir: PathBuf::from("."),
            config_file: None,
        }
    }
}

impl AppConfig {
    /// The file this configuration was read from, if any.
    pub fn config_file(&self) -> Option<&Path> {
        self.config_file.as_deref()
    }

    pub fn seed_bytes(&self) -> Result<Option<[u8; 32]>> {
        let Some(seed) = &self.seed else {
            return Ok(None);
        };
        let bytes = hex::decode(seed.trim_start_matches("0x")).context("Seed is not valid hex")?;
        let Ok(seed) = <[u8; 32]>::try_from(bytes.as_slice()) else {
            bail!("Seed must be 32 bytes, got {}", bytes.len());
        };
        Ok(Some(seed))
    }

    fn resolve_paths(mut self, base: &Path) -> Self {
        self.library_dir = relative_to(base, &self.library_dir);
        self.runtime_library = self.runtime_library.map(|p| relative_to(base, &p));
        self
    }
}

pub struct OsDirs;
impl OsDirs {
    pub fn config_dir() -> Result<PathBuf> {
        let dir = dirs::config_dir().context(
            "FHEX may only be run on an OS that can provide a config dir. See https://docs.rs/dirs for more information.",
        )?;
        Ok(dir.join("fhex"))
    }
}

/// Load the config at `cli_file`, the nearest `fhex.config.yaml`, or the OS config dir.
///
/// A missing file is only an error when it was asked for explicitly. Environment variables
/// prefixed with `FHEX_` override the file, with `__` separating nested keys
/// (`FHEX_KEYS__DIMENSION=512`).
pub fn load_config(cli_file: Option<PathBuf>) -> Result<AppConfig> {
    let explicit = cli_file.is_some();
    let cwd = env::current_dir()?;
    let path = resolve_config_path(
        find_in_parent,
        cwd.clone(),
        OsDirs::config_dir()?,
        DEFAULT_CONFIG_NAME,
        cli_file,
    );

    let mut figment = Figment::from(Serialized::defaults(AppConfig::default()));
    let base = if path.is_file() {
        figment = figment.merge(Yaml::file(&path));
        path.parent().map(Path::to_path_buf).unwrap_or(cwd)
    } else if explicit {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{} does not exist", path.display()),
        ))
        .context("Configuration file not found");
    } else {
        cwd
    };

    let config: AppConfig = figment
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()
        .context("Could not parse configuration")?;
    config
        .keys
        .validate()
        .context("Invalid key parameters in configuration")?;

    let found = path.is_file().then_some(path);
    debug!(config_file = ?found, "Loaded configuration");
    Ok(AppConfig {
        config_file: found,
        ..config.resolve_paths(&base)
    })
}

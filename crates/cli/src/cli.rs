// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use std::path::PathBuf;

use crate::{inspect, run};
use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use fhex_config::{load_config, AppConfig};
use fhex_logger::setup_simple_tracing;
use tracing::{info, instrument, Level};

const LONG_VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("FHEX_GIT_SHA"), ")");

#[derive(Parser, Debug)]
#[command(name = "fhex")]
#[command(version, long_version = LONG_VERSION)]
#[command(about = "Run and inspect compiled homomorphic circuits", long_about = None)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,

    /// Indicate error levels by adding additional `-v` arguments. Eg. `fhex -vvv` will give you
    /// trace level output
    #[arg(
        short,
        long,
        action = ArgAction::Count,
        global = true
    )]
    pub verbose: u8,

    /// Silence all output. This argument cannot be used alongside `-v`
    #[arg(
        short,
        long,
        action = ArgAction::SetTrue,
        conflicts_with = "verbose",
        global = true
    )]
    quiet: bool,
}

impl Cli {
    pub fn log_level(&self) -> Level {
        if self.quiet {
            Level::ERROR
        } else {
            match self.verbose {
                0 => Level::WARN,  //
                1 => Level::INFO,  // -v
                2 => Level::DEBUG, // -vv
                _ => Level::TRACE, // -vvv
            }
        }
    }

    #[instrument(skip_all)]
    pub fn execute(self) -> Result<()> {
        setup_simple_tracing(self.log_level());
        let config = self.load_config()?;
        info!("Config loaded from: {:?}", config.config_file());

        match self.command {
            Commands::Inspect {
                function,
                library_dir,
            } => inspect::execute(&config, &function, library_dir)?,
            Commands::Run {
                function,
                library_dir,
                args,
            } => run::execute(&config, &function, library_dir, &args)?,
        }

        Ok(())
    }

    pub fn load_config(&self) -> Result<AppConfig> {
        load_config(self.config.clone().map(PathBuf::from))
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the signature of a compiled function
    Inspect {
        /// Name of the exported function
        #[arg(long, short)]
        function: String,

        /// Directory holding the circuit library and client parameters. Defaults to the
        /// configured `library_dir`
        #[arg(long)]
        library_dir: Option<PathBuf>,
    },

    /// Encrypt arguments, run a compiled function and print the decrypted results as JSON
    Run {
        /// Name of the exported function
        #[arg(long, short)]
        function: String,

        /// Directory holding the circuit library and client parameters. Defaults to the
        /// configured `library_dir`
        #[arg(long)]
        library_dir: Option<PathBuf>,

        /// One value per input: an integer for scalars, comma separated integers for tensors
        #[arg(
            long = "arg",
            action = ArgAction::Append,
            value_name = "VALUE"
        )]
        args: Vec<String>,
    },
}

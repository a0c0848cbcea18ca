//! Command-line interface module.
//!
//! This module defines the CLI structure using Clap, including
//! all commands, arguments, and options.
//!
//! # Commands
//!
//! - `inspect`: Extract and print the interface of a module directory
//! - `validate`: Validate every module referenced by a blueprint
//! - `init`: Create an example configuration file
//!
//! # Example Usage
//!
//! ```bash
//! # Show the inputs and outputs of a Packer module
//! modinfo inspect ./modules/packer/custom-image
//!
//! # Same, as JSON written to a file
//! modinfo inspect ./modules/packer/custom-image --format json --output image.json
//!
//! # Validate a blueprint
//! modinfo validate blueprint.yaml
//!
//! # Initialize configuration
//! modinfo init
//! ```

use crate::types::OutputFormat;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// ModInfo - interface extraction and validation for HCL modules.
#[derive(Parser, Debug)]
#[command(
    name = "modinfo",
    author,
    version,
    about = "Interface metadata extraction and validation for HCL infrastructure modules",
    long_about = "ModInfo stages a module's HCL templates in a private workspace, extracts \
                  the variables and outputs they declare, and validates blueprint module \
                  settings against them."
)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, env = "MODINFO_CONFIG")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Settings that override the configuration file
    #[command(flatten)]
    pub overrides: GlobalOverrides,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Configuration overrides accepted by every command.
#[derive(Args, Debug, Default)]
pub struct GlobalOverrides {
    /// Directory in which staging workspaces are created
    #[arg(long, global = true, value_name = "DIR")]
    pub temp_root: Option<PathBuf>,

    /// Maximum number of modules read concurrently
    #[arg(long, global = true, value_name = "N")]
    pub max_concurrency: Option<usize>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract and print the interface of a module
    #[command(visible_alias = "i")]
    Inspect(InspectArgs),

    /// Validate the modules referenced by a blueprint
    #[command(visible_alias = "v")]
    Validate(ValidateArgs),

    /// Create an example configuration file
    Init,
}

/// Arguments for the inspect command.
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Module directories to inspect
    #[arg(value_name = "DIR", required = true)]
    pub sources: Vec<String>,

    /// Output format
    #[arg(short, long, default_value = "text", value_enum)]
    pub format: OutputFormat,

    /// Output file path (stdout if not specified)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// Arguments for the validate command.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Blueprint file to validate
    #[arg(value_name = "BLUEPRINT")]
    pub blueprint: PathBuf,

    /// Print the interfaces of all modules on success
    #[arg(long)]
    pub show_modules: bool,

    /// Output format for --show-modules
    #[arg(short, long, default_value = "text", value_enum)]
    pub format: OutputFormat,
}

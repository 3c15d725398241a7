//! # CLI Interface
//!
//! Defines the command-line argument structure for `strata-node` using
//! `clap` derive. Supports three subcommands: `demo`, `inspect`, and
//! `version`.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Strata operator node.
///
/// Operator tooling for the Strata yield vault and cross-domain router.
/// Drives the protocol library through a scripted capital lifecycle and
/// manages on-disk snapshots.
#[derive(Parser, Debug)]
#[command(
    name = "strata-node",
    about = "Strata operator node",
    version,
    propagate_version = true
)]
pub struct StrataNodeCli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the Strata node binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the scripted capital lifecycle against fresh or restored state
    /// and persist the resulting snapshots.
    Demo(DemoArgs),
    /// Print the snapshots stored in a data directory as JSON.
    Inspect(InspectArgs),
    /// Print version information and exit.
    Version,
}

/// Arguments for the `demo` subcommand.
#[derive(Parser, Debug)]
pub struct DemoArgs {
    /// Path to the data directory where snapshots are stored.
    ///
    /// Relative to the working directory; created on first run if it does
    /// not exist.
    #[arg(long, short = 'd', env = "STRATA_DATA_DIR", default_value = ".strata")]
    pub data_dir: PathBuf,

    /// Log output format: "pretty" or "json".
    #[arg(long, env = "STRATA_LOG_FORMAT", default_value = "pretty")]
    pub log_format: String,
}

/// Arguments for the `inspect` subcommand.
#[derive(Parser, Debug)]
pub struct InspectArgs {
    /// Path to the data directory to inspect.
    #[arg(long, short = 'd', env = "STRATA_DATA_DIR", default_value = ".strata")]
    pub data_dir: PathBuf,

    /// Address of the vault whose snapshot to print.
    #[arg(long, default_value = "vault-main")]
    pub vault: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli_structure() {
        // Ensures the derive macros produce a valid CLI definition.
        StrataNodeCli::command().debug_assert();
    }

    #[test]
    fn data_dir_defaults_to_relative_path() {
        // A literal "~" is never expanded by the shell when it comes from
        // a default, so the default must already be a usable path.
        let cli = StrataNodeCli::parse_from(["strata-node", "demo"]);
        let Commands::Demo(args) = cli.command else {
            panic!("expected the demo subcommand");
        };
        assert_eq!(args.data_dir, PathBuf::from(".strata"));
        assert!(!args.data_dir.to_string_lossy().contains('~'));
    }
}

//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// tolteca - Manage Toltec runtime context directories
#[derive(Parser, Debug)]
#[command(name = "tolteca")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Runtime context directory
    #[arg(short, long, global = true, env = "TOLTECA_DIR", default_value = ".")]
    pub dir: PathBuf,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Create a runtime context directory and write its setup file
    ///
    /// Creates bin/, cal/, log/ and 50_setup.yaml where missing.
    ///
    /// Examples:
    ///   tolteca init                 # Initialize the current directory
    ///   tolteca -d proj init         # Create and initialize proj/
    ///   tolteca init --force         # Re-run setup on an existing context
    Init {
        /// Overwrite an existing setup block
        #[arg(short, long)]
        force: bool,
    },

    /// Write the setup file with extra settings
    ///
    /// Examples:
    ///   tolteca setup --set notes=init
    ///   tolteca setup --overwrite --set apps.obs_planner.site_name=lmt
    Setup {
        /// Overwrite an existing setup block
        #[arg(long)]
        overwrite: bool,

        /// Extra setting as KEY=VALUE; dotted keys nest, values are YAML
        #[arg(short, long = "set", value_name = "KEY=VALUE")]
        set: Vec<String>,
    },

    /// Print the effective config as YAML
    Config,

    /// Symlink an executable into the bin directory
    Link {
        /// File to link to
        src: PathBuf,

        /// Name of the link (defaults to the file name of SRC)
        #[arg(short, long)]
        name: Option<String>,
    },

    /// List config files in merge order
    Files,
}

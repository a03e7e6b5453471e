//! Init command implementation
//!
//! Creates the runtime context layout and writes the setup block.

use std::path::Path;

use colored::Colorize;
use tolteca_core::{PopulateOptions, RuntimeContext};

use crate::error::Result;

/// Run the init command
///
/// With `force` an existing setup block is overwritten (and backed up).
pub fn run_init(dir: &Path, force: bool) -> Result<()> {
    println!(
        "{} Initializing runtime context in {}...",
        "=>".blue().bold(),
        dir.display().to_string().cyan()
    );

    let mut ctx = RuntimeContext::from_dir(dir, PopulateOptions::create())?;
    ctx.setup(None, force)?;

    println!("{} {} initialized!", "OK".green().bold(), ctx);
    Ok(())
}

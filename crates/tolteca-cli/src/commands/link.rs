//! Link command implementation

use std::path::Path;

use colored::Colorize;
use tolteca_core::{PopulateOptions, RuntimeContext};

use crate::error::Result;

/// Symlink `src` into the bin directory of the runtime context at `dir`
///
/// A relative `src` is resolved against the current directory.
pub fn run_link(dir: &Path, src: &Path, name: Option<&str>) -> Result<()> {
    let ctx = RuntimeContext::from_dir(dir, PopulateOptions::default())?;
    let src = std::path::absolute(src)?;
    let dst = ctx.symlink_to_bindir(&src, name)?;

    println!(
        "{} {} -> {}",
        "OK".green().bold(),
        dst.display().to_string().cyan(),
        src.display()
    );
    Ok(())
}

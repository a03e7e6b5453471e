//! Config file listing command

use std::path::Path;

use colored::Colorize;
use tolteca_core::RuntimeContext;

use crate::error::Result;

/// Print the config files of the runtime context at `dir` in merge order
pub fn run_files(dir: &Path) -> Result<()> {
    let ctx = RuntimeContext::new(Some(dir.to_path_buf()), None)?;
    let files = ctx.config_files()?.unwrap_or_default();

    if files.is_empty() {
        println!("{}", "(no config files)".dimmed());
    }
    for file in files {
        println!("{}", file.display());
    }
    Ok(())
}

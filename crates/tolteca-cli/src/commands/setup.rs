//! Setup command implementation

use std::path::Path;

use colored::Colorize;
use serde_yaml::{Mapping, Value};
use tolteca_core::merge::{mapping_from_dotted, rupdate_mapping};
use tolteca_core::{PopulateOptions, RuntimeContext};

use crate::error::{CliError, Result};

/// Run the setup command on an existing runtime context
pub fn run_setup(dir: &Path, overwrite: bool, assignments: &[String]) -> Result<()> {
    let extra = parse_assignments(assignments)?;
    let mut ctx = RuntimeContext::from_dir(dir, PopulateOptions::default())?;
    ctx.setup(Some(&extra), overwrite)?;

    println!(
        "{} Wrote {}",
        "OK".green().bold(),
        ctx.setup_file()?.display().to_string().cyan()
    );
    Ok(())
}

/// Turn `KEY=VALUE` arguments into one mapping.
///
/// Dotted keys become nested mappings and values are parsed as YAML, so
/// `a.b=1` gives `{a: {b: 1}}`. Later assignments win.
pub fn parse_assignments(assignments: &[String]) -> Result<Mapping> {
    let mut extra = Mapping::new();
    for assignment in assignments {
        let (key, value) = assignment.split_once('=').ok_or_else(|| {
            CliError::user(format!("Invalid setting '{assignment}', expected KEY=VALUE"))
        })?;
        let key = key.trim();
        if key.split('.').any(str::is_empty) {
            return Err(CliError::user(format!(
                "Invalid setting '{assignment}', key must not be empty"
            )));
        }
        let value: Value = serde_yaml::from_str(value)?;
        rupdate_mapping(&mut extra, &mapping_from_dotted(key, value));
    }
    Ok(extra)
}

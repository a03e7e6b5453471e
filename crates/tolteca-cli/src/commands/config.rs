//! Config display command

use std::path::Path;

use tolteca_core::RuntimeContext;

use crate::error::Result;

/// Print the effective config of the runtime context at `dir` as YAML
pub fn run_config(dir: &Path) -> Result<()> {
    let ctx = RuntimeContext::new(Some(dir.to_path_buf()), None)?;
    print!("{}", render_config(&ctx)?);
    Ok(())
}

fn render_config(ctx: &RuntimeContext) -> Result<String> {
    Ok(serde_yaml::to_string(ctx.config()?)?)
}

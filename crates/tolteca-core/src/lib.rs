//! Runtime context management for tolteca
//!
//! A runtime context is a working directory (or an in-memory config) that
//! carries per-project settings for the Toltec data reduction tools:
//!
//! - **Content table**: the named files and directories a context directory holds
//! - **Populator**: creates or validates that structure on disk
//! - **Collector**: discovers numbered YAML config files and merges them
//! - **Schema**: validates merged configs, with caller-supplied extensions
//! - **RuntimeContext**: the facade, with a lazily built and cached config
//!
//! # Layout
//!
//! ```text
//! <root>/
//!   bin/            symlinked executables
//!   cal/            calibration data
//!   log/            logs
//!   50_setup.yaml   setup block written by `RuntimeContext::setup`
//!   NN_*.yaml       further config files, merged in file name order
//! ```
//!
//! # Example
//!
//! ```no_run
//! use tolteca_core::{PopulateOptions, RuntimeContext};
//!
//! # fn main() -> tolteca_core::Result<()> {
//! let mut ctx = RuntimeContext::from_dir("/data/proj", PopulateOptions::create())?;
//! ctx.setup(None, false)?;
//! let config = ctx.config()?;
//! println!("{:?}", config.get("setup"));
//! # Ok(())
//! # }
//! ```

pub mod apps;
pub mod collector;
pub mod contents;
pub mod context;
pub mod error;
pub mod merge;
pub mod schema;
pub mod stamp;

pub use apps::{AppConfig, AppRegistry, ObsPlannerConfig, PhysicalType, Quantity, get_app_config};
pub use collector::{collect_config_files, collect_config_from_files};
pub use contents::{
    ContentDescriptor, ContentKind, ContentTable, PopulateOptions, RootPath, populate_dir,
};
pub use context::{ContentEntry, ContextBuilder, ContextProfile, ContextSource, RuntimeContext};
pub use error::{Error, Result};
pub use merge::{merge_all, rupdate, rupdate_mapping};
pub use schema::{KeyMatcher, Rule, Schema, ValidationEnv, Validator, base_schema};
pub use stamp::{Stamper, StaticStamper, SystemStamper};

/// Version of the running software, recorded in setup blocks.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Application config sections
//!
//! Dashboard applications keep their settings under `apps.<name>` in the
//! effective config of a runtime context. Each application declares a
//! schema; [`AppRegistry`] turns the registered schemas into a schema
//! extension for a context profile, and [`get_app_config`] reads one
//! application's section into its typed config.

mod obs_planner;
mod quantity;

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde_yaml::{Mapping, Value};

use crate::context::RuntimeContext;
use crate::schema::{Rule, Schema, ValidationEnv};
use crate::{Error, Result};

pub use obs_planner::ObsPlannerConfig;
pub use quantity::{PhysicalType, Quantity, quantity_rule};

/// Top-level key holding application sections.
pub const APPS_KEY: &str = "apps";

/// Typed config of one application.
pub trait AppConfig: DeserializeOwned {
    /// Name of the section under `apps`.
    const NAME: &'static str;

    /// Schema of the section.
    fn schema() -> Schema;
}

/// Registered application schemas by name.
#[derive(Debug, Clone, Default)]
pub struct AppRegistry {
    schemas: BTreeMap<String, Schema>,
}

impl AppRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the applications shipped in this crate.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register::<ObsPlannerConfig>();
        registry
    }

    pub fn register<T: AppConfig>(&mut self) -> &mut Self {
        tracing::debug!(app = T::NAME, "registered app config");
        self.schemas.insert(T::NAME.to_string(), T::schema());
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }

    /// Schema extension validating `apps.<name>` for every registered app.
    pub fn schema_extension(&self) -> Schema {
        let apps = self
            .schemas
            .iter()
            .fold(Schema::new(), |apps, (name, schema)| {
                apps.optional(name.clone(), Rule::Nested(schema.clone()))
            });
        Schema::new().optional(APPS_KEY, Rule::Nested(apps))
    }
}

/// Read and validate the `apps.<T::NAME>` section of `ctx`.
///
/// A missing section yields the application's defaults.
pub fn get_app_config<T: AppConfig>(ctx: &RuntimeContext) -> Result<T> {
    let path = format!("{APPS_KEY}.{}", T::NAME);
    let section = ctx
        .config()?
        .get(APPS_KEY)
        .and_then(|apps| apps.get(T::NAME))
        .cloned()
        .unwrap_or(Value::Null);
    let section = match section {
        Value::Null => Mapping::new(),
        Value::Mapping(mapping) => mapping,
        _ => return Err(Error::validation(path, "expected a mapping")),
    };

    let env = ValidationEnv::new(ctx.stamper().version());
    let validated = T::schema().validate_under(section, &env, &path)?;
    Ok(serde_yaml::from_value(Value::Mapping(validated))?)
}

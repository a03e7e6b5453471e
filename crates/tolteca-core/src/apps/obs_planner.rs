//! Observation planner app settings

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::quantity::{PhysicalType, Quantity, quantity_rule};
use super::AppConfig;
use crate::schema::{Rule, Schema};

/// Settings of the observation planner dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObsPlannerConfig {
    /// Maximum length of the raster scan model.
    pub raster_model_length_max: Quantity,
    /// Maximum length of the lissajous model.
    pub lissajous_model_length_max: Quantity,
    /// Maximum observation time.
    pub t_exp_max: Quantity,
    pub site_name: String,
    pub instru_name: String,
    /// Catalog of pointing sources, relative to the context root.
    pub pointing_catalog_path: Option<PathBuf>,
    /// YAML file with planner presets, relative to the context root.
    pub presets_config_path: Option<PathBuf>,
    pub title_text: String,
}

impl Default for ObsPlannerConfig {
    fn default() -> Self {
        Self {
            raster_model_length_max: Quantity::new(3.0, "deg"),
            lissajous_model_length_max: Quantity::new(20.0, "arcmin"),
            t_exp_max: Quantity::new(1.0, "hour"),
            site_name: "lmt".to_string(),
            instru_name: "toltec".to_string(),
            pointing_catalog_path: None,
            presets_config_path: None,
            title_text: "Obs Planner".to_string(),
        }
    }
}

impl AppConfig for ObsPlannerConfig {
    const NAME: &'static str = "obs_planner";

    fn schema() -> Schema {
        Schema::new()
            .optional("raster_model_length_max", quantity_rule(PhysicalType::Angle))
            .optional("lissajous_model_length_max", quantity_rule(PhysicalType::Angle))
            .optional("t_exp_max", quantity_rule(PhysicalType::Time))
            .optional("site_name", Rule::one_of(["lmt"]))
            .optional("instru_name", Rule::one_of(["toltec"]))
            .optional("pointing_catalog_path", Rule::rel_path().or_null())
            .optional("presets_config_path", Rule::rel_path().or_null())
            .optional("title_text", Rule::string())
    }
}

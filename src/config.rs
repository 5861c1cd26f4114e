//! Configuration management for the schema enhancer
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (schema-enhancer.toml)
//! - Environment variables (SCHEMA_ENHANCER__*)
//!
//! ## Example config file (schema-enhancer.toml):
//! ```toml
//! [convert]
//! schema_id = "https://fundserv.com/tfs/xml-aligned-schema"
//! root_elements = ["OrdSet"]
//! raw_pattern_recovery = true
//!
//! [convert.name_overrides]
//! "sintype" = "SINType"
//!
//! [enhance]
//! strict = true
//! extra_base_types = ["Amt9V2N", "YesNo1"]
//!
//! [[enhance.field_mappings]]
//! contains = "Date"
//! canonical = "Date8"
//!
//! [batch]
//! extensions = ["yaml", "yml"]
//! keywords = ["openapi", "swagger", "paths", "components"]
//! ```

use config_crate::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::batch::BatchOptions;
use crate::convert::ConverterOptions;
use crate::error::Result;
use crate::pipeline::EnhancerOptions;

/// Base name of the configuration file
pub const CONFIG_FILE: &str = "schema-enhancer.toml";

/// Main configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnhancerConfig {
    /// Type system conversion
    #[serde(default)]
    pub convert: ConverterOptions,

    /// Document enhancement
    #[serde(default)]
    pub enhance: EnhancerOptions,

    /// Batch discovery
    #[serde(default)]
    pub batch: BatchOptions,
}

impl EnhancerConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration, adding a required file on top of the defaults
    pub fn load_from(config_path: Option<&str>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_locations = [
            "schema-enhancer.toml",
            ".schema-enhancer.toml",
            "config/schema-enhancer.toml",
        ];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        // XDG config directory
        if let Some(config_dir) = directories::ProjectDirs::from("com", "fundserv", "schema-enhancer") {
            let xdg_config = config_dir.config_dir().join(CONFIG_FILE);
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // SCHEMA_ENHANCER__ENHANCE__STRICT=true
        builder = builder.add_source(
            Environment::with_prefix("SCHEMA_ENHANCER")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }

    /// Save configuration to a file
    pub fn save(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }
}

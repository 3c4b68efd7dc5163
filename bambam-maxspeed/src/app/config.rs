use std::path::Path;

use config::{builder::DefaultState, Config, ConfigBuilder, File};
use serde::{Deserialize, Serialize};

use crate::{error::MaxspeedError, serialize::SerializerConfig};

/// options for building a maxspeed section from producer records.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct MaxspeedBuildConfig {
    /// replace speeds that have no macro with the nearest tabulated speed
    /// instead of dropping the feature.
    #[serde(default)]
    pub round_to_closest_macro: bool,
    /// write the serializer summary as JSON next to the section file.
    #[serde(default)]
    pub write_summary: bool,
    #[serde(default)]
    pub serializer: SerializerConfig,
}

impl MaxspeedBuildConfig {
    pub fn from_file(path: &Path) -> Result<MaxspeedBuildConfig, MaxspeedError> {
        let filename = path.to_str().unwrap_or_default();
        let builder = Config::builder().add_source(File::from(path));
        MaxspeedBuildConfig::from_builder(builder, filename)
    }

    fn from_builder(
        builder: ConfigBuilder<DefaultState>,
        source: &str,
    ) -> Result<MaxspeedBuildConfig, MaxspeedError> {
        let config = builder.build().map_err(|e| {
            let msg = format!("file '{source}' produced error: {e}");
            MaxspeedError::InvalidUserInput(msg)
        })?;
        config.try_deserialize::<MaxspeedBuildConfig>().map_err(|e| {
            let msg = format!("error reading build configuration in '{source}': {e}");
            MaxspeedError::InvalidUserInput(msg)
        })
    }
}

use crate::error::MapError;
use serde::Deserialize;
use std::path::PathBuf;

/// Tunables for level assembly and contact responses.
///
/// Every field has a default, so a config document only needs the values it
/// changes.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LevelConfig {
    /// Name of the point marker that sets the actor's spawn.
    pub start_marker: String,
    /// Object layer name treated as a background layer (case-insensitive).
    pub background_layer: String,
    /// Boolean property that marks a hazard.
    pub hazard_property: String,
    /// Boolean property that marks a bumper.
    pub bumper_property: String,
    /// Boolean property that marks the goal.
    pub goal_property: String,
    /// Magnitude of the push a bumper gives the actor.
    pub bumper_impulse: f32,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            start_marker: "start".to_owned(),
            background_layer: "background".to_owned(),
            hazard_property: "is_hazard".to_owned(),
            bumper_property: "is_bumper".to_owned(),
            goal_property: "is_goal".to_owned(),
            bumper_impulse: 0.02,
        }
    }
}

impl LevelConfig {
    /// Parse a JSON config document. Unknown fields are ignored.
    pub fn from_json_str(txt: &str) -> Result<Self, MapError> {
        serde_json::from_str(txt).map_err(|source| MapError::Json {
            path: PathBuf::from("<config>"),
            source,
        })
    }
}

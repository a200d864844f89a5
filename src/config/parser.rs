use super::SwarmDefinition;
use crate::errors::{Error, Result};
use std::fs;
use std::path::Path;
use tracing::info;

/// Loads and parses a swarm definition, choosing the format by extension.
///
/// # Arguments
///
/// * `file_path` - Path to a `.yaml`/`.yml`, `.toml` or `.json` file
///
/// # Errors
///
/// Returns an error if:
/// * The extension is not one of the supported formats
/// * The file cannot be read
/// * The content cannot be parsed into a [`SwarmDefinition`]
pub fn load_swarm_definition(file_path: impl AsRef<Path>) -> Result<SwarmDefinition> {
    let path = file_path.as_ref();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let content = || fs::read_to_string(path);
    let definition: SwarmDefinition = match extension.as_str() {
        "yaml" | "yml" => serde_yaml::from_str(&content()?)?,
        "toml" => toml::from_str(&content()?)?,
        "json" => serde_json::from_str(&content()?)?,
        other => {
            return Err(Error::Configuration(format!(
                "unsupported swarm definition format '{}' for {}",
                other,
                path.display()
            )))
        }
    };

    info!("Loaded swarm definition: {:?}", definition.name);
    Ok(definition)
}

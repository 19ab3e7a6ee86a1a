pub mod config;
pub mod replay;
pub mod serve;

use std::path::Path;

use holo_common::config::AppConfig;

/// Load the configuration from `path`, or from the standard location.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<AppConfig> {
    match path {
        Some(path) => AppConfig::load_from(path)
            .map_err(|e| anyhow::anyhow!("Failed to load config {}: {e}", path.display())),
        None => Ok(AppConfig::load()),
    }
}

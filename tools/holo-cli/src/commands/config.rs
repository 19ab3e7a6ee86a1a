//! Show or write the effective configuration.

use std::path::PathBuf;

use holo_common::config::config_file_path;

pub fn run(config: Option<PathBuf>, write: Option<PathBuf>) -> anyhow::Result<()> {
    let effective = super::load_config(config.as_deref())?;

    match write {
        Some(path) => {
            effective
                .save_to(&path)
                .map_err(|e| anyhow::anyhow!("Failed to write config: {e}"))?;
            println!("Configuration written to: {}", path.display());
        }
        None => {
            println!("{}", serde_json::to_string_pretty(&effective)?);
            eprintln!("# standard location: {}", config_file_path().display());
        }
    }

    Ok(())
}

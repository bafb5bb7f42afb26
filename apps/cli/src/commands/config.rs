//! # Config Commands

use std::path::PathBuf;

use anyhow::Result;

use posflow_client::ClientConfig;

pub fn show(config: &ClientConfig) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(config)?);
    if let Some(path) = ClientConfig::default_config_path() {
        println!("default config file: {}", path.display());
    }
    if let Some(dir) = config.data_dir() {
        println!("data dir: {}", dir.display());
    }
    Ok(())
}

pub fn init(config: &ClientConfig, path: Option<PathBuf>) -> Result<()> {
    config.save(path.clone())?;
    match path.or_else(ClientConfig::default_config_path) {
        Some(p) => println!("Wrote {}", p.display()),
        None => println!("Configuration written"),
    }
    Ok(())
}

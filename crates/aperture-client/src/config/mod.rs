//! Client configuration: strict YAML config file and programmatic options.

pub mod options;
pub mod schema;

use std::fs;

use aperture_core::error::{ApertureError, Result};

pub use options::{ClientSettings, Options};
pub use schema::{AgentSection, ClientConfig, ClientSection};

pub fn load_from_file(path: &str) -> Result<ClientConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| ApertureError::InvalidConfig(format!("read config failed: {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<ClientConfig> {
    let cfg: ClientConfig = serde_yaml::from_str(s)
        .map_err(|e| ApertureError::InvalidConfig(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}

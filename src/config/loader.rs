// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::model::{FlowFile, RawFlowFile};
use crate::errors::Result;

/// Load a flow file and return the raw, unvalidated [`RawFlowFile`].
///
/// This only performs TOML deserialization. Use [`load_and_validate`] to also
/// check dependencies and acyclicity.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawFlowFile> {
    let contents = fs::read_to_string(path.as_ref())?;
    let raw: RawFlowFile = toml::from_str(&contents)?;
    Ok(raw)
}

/// Load a flow file from `path` and validate it.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<FlowFile> {
    let raw = load_from_path(&path)?;
    let flow = FlowFile::try_from(raw)?;
    Ok(flow)
}

/// `Dagwork.toml` in the current working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Dagwork.toml")
}

// src/config/loader.rs

use std::fs;
use std::path::Path;

use crate::config::model::RawProcessFile;
use crate::config::validate::validate_file;
use crate::descriptor::ProcessDescriptor;
use crate::errors::Result;

/// Load a descriptor file from a given path and return the raw model.
///
/// This only performs TOML deserialization; use [`load_and_validate`] to
/// get typed descriptors.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawProcessFile> {
    let contents = fs::read_to_string(path.as_ref())?;
    let file: RawProcessFile = toml::from_str(&contents)?;
    Ok(file)
}

/// Load a descriptor file and convert every `[process.<name>]` table into
/// a [`ProcessDescriptor`], in name order.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<Vec<ProcessDescriptor>> {
    let raw = load_from_path(&path)?;
    validate_file(raw)
}

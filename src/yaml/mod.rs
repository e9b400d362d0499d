//! YAML loading with source-annotated errors

pub mod diagnostics;

pub use diagnostics::{YamlError, YamlSyntaxError};

use std::path::Path;

use serde::de::DeserializeOwned;

/// Read and deserialize a YAML file
pub fn load_file<T: DeserializeOwned>(path: &Path) -> Result<T, YamlError> {
    let source = std::fs::read_to_string(path)?;
    parse_str(&source, &path.display().to_string())
}

/// Deserialize YAML text, naming `filename` in any error report
pub fn parse_str<T: DeserializeOwned>(source: &str, filename: &str) -> Result<T, YamlError> {
    serde_yml::from_str(source)
        .map_err(|e| YamlSyntaxError::from_serde_error(&e, source, filename).into())
}

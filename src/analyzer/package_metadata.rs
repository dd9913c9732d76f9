//! Reads `pyproject.toml` at the analysis root, when present.

use std::path::Path;

use tracing::debug;

use crate::error::Result;

/// Parsed `pyproject.toml` as a JSON value, or None when the file does not
/// exist. A file that exists but fails to parse is an error the caller
/// downgrades or propagates as it sees fit.
pub fn read_package_metadata(root: &Path) -> Result<Option<serde_json::Value>> {
    let path = root.join("pyproject.toml");
    if !path.exists() {
        return Ok(None);
    }
    debug!(path = %path.display(), "reading package metadata");
    let text = std::fs::read_to_string(&path)?;
    let value: toml::Value = toml::from_str(&text)?;
    Ok(Some(serde_json::to_value(value)?))
}

//! # Persistence Format
//!
//! Text serialization for the configuration document.
//!
//! File I/O operations are in the app layer.
//!
//! Two encodings are supported, selected from the file extension:
//! - YAML (`.yaml`, `.yml` and anything unrecognized)
//! - TOML (`.toml`)
//!
//! Unset optional fields are omitted on output, so a document that is
//! loaded and saved without changes keeps its shape.

use crate::primitives::MAX_CONFIG_SIZE;
use crate::{SearchConfig, SyncError};
use std::path::Path;

// =============================================================================
// FORMAT SELECTION
// =============================================================================

/// Encoding of a configuration document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConfigFormat {
    #[default]
    Yaml,
    Toml,
}

impl ConfigFormat {
    /// Pick the encoding from a file extension.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Self::Toml,
            _ => Self::Yaml,
        }
    }
}

// =============================================================================
// SERIALIZATION FUNCTIONS
// =============================================================================

/// Parse a configuration document.
///
/// This is a pure transformation - no file I/O. A blank document parses to
/// an empty configuration.
pub fn config_from_str(text: &str, format: ConfigFormat) -> Result<SearchConfig, SyncError> {
    if text.len() > MAX_CONFIG_SIZE {
        return Err(SyncError::Persistence(format!(
            "Document size {} bytes exceeds maximum allowed {} bytes",
            text.len(),
            MAX_CONFIG_SIZE
        )));
    }

    if text.trim().is_empty() {
        return Ok(SearchConfig::default());
    }

    match format {
        ConfigFormat::Yaml => serde_yaml::from_str(text)
            .map_err(|e| SyncError::Persistence(format!("parse yaml: {e}"))),
        ConfigFormat::Toml => {
            toml::from_str(text).map_err(|e| SyncError::Persistence(format!("parse toml: {e}")))
        }
    }
}

/// Serialize a configuration document.
///
/// This is a pure transformation - no file I/O.
pub fn config_to_string(config: &SearchConfig, format: ConfigFormat) -> Result<String, SyncError> {
    match format {
        ConfigFormat::Yaml => serde_yaml::to_string(config)
            .map_err(|e| SyncError::Persistence(format!("marshal yaml: {e}"))),
        ConfigFormat::Toml => toml::to_string(config)
            .map_err(|e| SyncError::Persistence(format!("marshal toml: {e}"))),
    }
}

// =============================================================================
// TESTS
// =============================================================================

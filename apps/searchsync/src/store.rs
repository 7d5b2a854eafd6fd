//! # File Store
//!
//! Reads and writes the definitions document on disk. The encoding is
//! picked from the file extension.

use searchsync_core::primitives::MAX_CONFIG_SIZE;
use searchsync_core::{
    ConfigFormat, ConfigStore, SearchConfig, SyncError, config_from_str, config_to_string,
};
use std::fs;
use std::io::Write;
use std::path::Path;

/// [`ConfigStore`] backed by the local filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileStore;

impl FileStore {
    /// Create a file store.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

fn validate_file_size(path: &Path) -> Result<(), SyncError> {
    let metadata = fs::metadata(path)
        .map_err(|e| SyncError::Persistence(format!("read config {}: {e}", path.display())))?;

    let limit = u64::try_from(MAX_CONFIG_SIZE).unwrap_or(u64::MAX);
    if metadata.len() > limit {
        return Err(SyncError::Persistence(format!(
            "config {} is {} bytes, exceeds maximum {MAX_CONFIG_SIZE}",
            path.display(),
            metadata.len()
        )));
    }
    Ok(())
}

impl ConfigStore for FileStore {
    fn load(&self, path: &Path) -> Result<SearchConfig, SyncError> {
        validate_file_size(path)?;

        let text = fs::read_to_string(path)
            .map_err(|e| SyncError::Persistence(format!("read config {}: {e}", path.display())))?;
        let config = config_from_str(&text, ConfigFormat::from_path(path))?;

        tracing::debug!(
            path = %path.display(),
            searches = config.searches.len(),
            templates = config.templates.len(),
            "config loaded"
        );
        Ok(config)
    }

    fn save(&self, path: &Path, config: &SearchConfig) -> Result<(), SyncError> {
        let text = config_to_string(config, ConfigFormat::from_path(path))?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                SyncError::Persistence(format!("create config dir {}: {e}", parent.display()))
            })?;
        }

        let mut file = open_private(path)
            .map_err(|e| SyncError::Persistence(format!("write config {}: {e}", path.display())))?;
        file.write_all(text.as_bytes())
            .map_err(|e| SyncError::Persistence(format!("write config {}: {e}", path.display())))?;

        tracing::info!(path = %path.display(), "config saved");
        Ok(())
    }
}

#[cfg(unix)]
fn open_private(path: &Path) -> std::io::Result<fs::File> {
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    // mode() only applies on creation
    file.set_permissions(fs::Permissions::from_mode(0o600))?;
    Ok(file)
}

#[cfg(not(unix))]
fn open_private(path: &Path) -> std::io::Result<fs::File> {
    fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
}

//! # Config Path Resolution
//!
//! Chooses the definitions file from the `--config` flag or the
//! environment.

use crate::error::AppError;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// File name looked up in the config directory.
pub const CONFIG_FILE_NAME: &str = ".github-searches.yaml";

/// Resolve the config path from the flag, `XDG_CONFIG_HOME` and the home directory.
pub fn resolve_config_path(flag: Option<&Path>) -> Result<PathBuf, AppError> {
    resolve_with(
        flag,
        std::env::var_os("XDG_CONFIG_HOME"),
        dirs::home_dir(),
        std::env::current_dir().ok(),
    )
}

/// Resolution with every environment input passed in explicitly.
///
/// 1. An explicit path wins; `~` expands to `home`, relative paths are
///    joined onto `cwd`.
/// 2. `$XDG_CONFIG_HOME/.github-searches.yaml`
/// 3. `<home>/.config/.github-searches.yaml`
pub fn resolve_with(
    flag: Option<&Path>,
    xdg_config_home: Option<OsString>,
    home: Option<PathBuf>,
    cwd: Option<PathBuf>,
) -> Result<PathBuf, AppError> {
    if let Some(path) = flag.filter(|p| !p.as_os_str().is_empty()) {
        return expand_path(path, home, cwd);
    }

    if let Some(xdg) = xdg_config_home.filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(xdg).join(CONFIG_FILE_NAME));
    }

    let home = home.ok_or_else(|| AppError::Path("locate home dir".to_string()))?;
    Ok(home.join(".config").join(CONFIG_FILE_NAME))
}

fn expand_path(
    path: &Path,
    home: Option<PathBuf>,
    cwd: Option<PathBuf>,
) -> Result<PathBuf, AppError> {
    let expanded = match path.strip_prefix("~") {
        Ok(rest) => home
            .ok_or_else(|| AppError::Path("resolve home dir".to_string()))?
            .join(rest),
        Err(_) => path.to_path_buf(),
    };

    if expanded.is_absolute() {
        return Ok(expanded);
    }

    let cwd = cwd.ok_or_else(|| AppError::Path("resolve absolute path".to_string()))?;
    Ok(cwd.join(expanded))
}

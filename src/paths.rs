//! Path resolution for tursoform
//!
//! # Environment Variables
//!
//! - `TURSOFORM_CONFIG` - Override the configuration file
//! - `TURSOFORM_STATE` - Override the state file
//!
//! # Path Resolution Priority
//!
//! For config_file():
//! 1. `--config` flag
//! 2. `TURSOFORM_CONFIG` environment variable
//! 3. `./tursoform.toml`
//!
//! For state_file():
//! 1. `--state` flag
//! 2. `TURSOFORM_STATE` environment variable
//! 3. `tursoform.state.json` next to the configuration file

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Environment variable for config file override
pub const ENV_CONFIG: &str = "TURSOFORM_CONFIG";

/// Environment variable for state file override
pub const ENV_STATE: &str = "TURSOFORM_STATE";

pub const CONFIG_FILE_NAME: &str = "tursoform.toml";
pub const STATE_FILE_NAME: &str = "tursoform.state.json";

/// Resolve the configuration file
pub fn config_file(flag: Option<&str>) -> PathBuf {
    if let Some(path) = flag {
        return expand(path);
    }

    if let Ok(path) = std::env::var(ENV_CONFIG) {
        let path = expand(&path);
        log::debug!("Using config file from {}: {}", ENV_CONFIG, path.display());
        return path;
    }

    PathBuf::from(CONFIG_FILE_NAME)
}

/// Resolve the state file
pub fn state_file(flag: Option<&str>, config_file: &Path) -> PathBuf {
    if let Some(path) = flag {
        return expand(path);
    }

    if let Ok(path) = std::env::var(ENV_STATE) {
        let path = expand(&path);
        log::debug!("Using state file from {}: {}", ENV_STATE, path.display());
        return path;
    }

    let path = config_file
        .parent()
        .map_or_else(|| PathBuf::from(STATE_FILE_NAME), |dir| dir.join(STATE_FILE_NAME));
    log::debug!("Using state file next to config: {}", path.display());
    path
}

/// Credentials written outside the project: `<config_dir>/tursoform/credentials.toml`
pub fn credentials_file() -> Result<PathBuf> {
    let dir = dirs::config_dir().context("Could not determine config directory")?;
    Ok(dir.join("tursoform").join("credentials.toml"))
}

/// Expand ~ and environment variables in a path string.
///
/// # Examples
///
/// ```ignore
/// let config = paths::expand("~/infra/tursoform.toml");
/// let state = paths::expand("$HOME/state/tursoform.state.json");
/// ```
pub fn expand(path: &str) -> PathBuf {
    let expanded = shellexpand::full(path).unwrap_or(std::borrow::Cow::Borrowed(path));
    PathBuf::from(expanded.as_ref())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    /// Helper to run a test with temporary env var
    ///
    /// # Safety
    /// This function uses unsafe env::set_var/remove_var which can cause issues
    /// if other threads read environment variables concurrently.
    /// Only use in single-threaded test contexts.
    fn with_env_var<F, R>(key: &str, value: &str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let original = env::var(key).ok();
        // SAFETY: Tests run in isolation and don't read env vars concurrently
        unsafe { env::set_var(key, value) };
        let result = f();
        match original {
            // SAFETY: Tests run in isolation
            Some(v) => unsafe { env::set_var(key, v) },
            None => unsafe { env::remove_var(key) },
        }
        result
    }

    #[test]
    fn test_config_flag_wins() {
        assert_eq!(
            config_file(Some("/from/flag.toml")),
            PathBuf::from("/from/flag.toml")
        );
    }

    #[test]
    fn test_config_env_override() {
        with_env_var(ENV_CONFIG, "/custom/infra.toml", || {
            assert_eq!(config_file(None), PathBuf::from("/custom/infra.toml"));
        });
    }

    #[test]
    fn test_state_env_override() {
        with_env_var(ENV_STATE, "/custom/state.json", || {
            assert_eq!(
                state_file(None, Path::new("/infra/tursoform.toml")),
                PathBuf::from("/custom/state.json")
            );
        });
    }

    #[test]
    fn test_state_flag_wins() {
        assert_eq!(
            state_file(Some("/flag/state.json"), Path::new("/infra/tursoform.toml")),
            PathBuf::from("/flag/state.json")
        );
    }

    #[test]
    fn test_expand_tilde() {
        let home = dirs::home_dir().unwrap();
        assert_eq!(
            expand("~/infra/tursoform.toml"),
            home.join("infra").join("tursoform.toml")
        );
    }

    #[test]
    fn test_expand_plain_path() {
        assert_eq!(expand("/etc/tursoform.toml"), PathBuf::from("/etc/tursoform.toml"));
    }

    #[test]
    fn test_credentials_file_location() {
        if let Ok(path) = credentials_file() {
            assert!(path.ends_with("tursoform/credentials.toml"));
        }
    }
}

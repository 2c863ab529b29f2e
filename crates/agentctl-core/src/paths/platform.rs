//! Root directory resolution.
//!
//! Every function takes the `Environment` explicitly; nothing here reads
//! process-global variables.

use std::path::{Path, PathBuf};

use super::error::PathError;
use crate::environment::Environment;

/// Overrides the data root.
pub const DATA_DIR_VAR: &str = "AGENTCTL_DATA_DIR";

/// Overrides the IDE config file location.
pub const CONFIG_PATH_VAR: &str = "AGENTCTL_CONFIG";

/// IDE config path relative to the home directory.
pub const DEFAULT_CONFIG_RELATIVE: &str = ".cursor/mcp.json";

/// Get the root directory for application data (logs, manifest, backups).
///
/// Resolution order:
/// 1. `AGENTCTL_DATA_DIR` (highest priority)
/// 2. The platform data directory derived from the injected environment
///    (e.g., `$XDG_DATA_HOME/agentctl` or `~/.local/share/agentctl`)
///
/// The directory is not created here; writers create what they need.
pub fn data_root(env: &Environment) -> Result<PathBuf, PathError> {
    if let Some(path) = env.var(DATA_DIR_VAR) {
        return normalize_user_path(path, env);
    }

    Ok(local_data_dir(env)?.join("agentctl"))
}

#[cfg(target_os = "macos")]
fn local_data_dir(env: &Environment) -> Result<PathBuf, PathError> {
    let home = env.home().ok_or(PathError::NoDataDir)?;
    Ok(home.join("Library").join("Application Support"))
}

#[cfg(windows)]
fn local_data_dir(env: &Environment) -> Result<PathBuf, PathError> {
    if let Some(dir) = env.var("LOCALAPPDATA") {
        return Ok(PathBuf::from(dir));
    }
    let home = env.home().ok_or(PathError::NoDataDir)?;
    Ok(home.join("AppData").join("Local"))
}

#[cfg(not(any(target_os = "macos", windows)))]
fn local_data_dir(env: &Environment) -> Result<PathBuf, PathError> {
    // Relative XDG values are invalid and ignored
    if let Some(dir) = env.var("XDG_DATA_HOME").map(PathBuf::from) {
        if dir.is_absolute() {
            return Ok(dir);
        }
    }
    let home = env.home().ok_or(PathError::NoDataDir)?;
    Ok(home.join(".local").join("share"))
}

/// Location of the IDE's MCP config file.
///
/// Resolution order:
/// 1. `AGENTCTL_CONFIG`
/// 2. `<home>/.cursor/mcp.json`
pub fn config_path(env: &Environment) -> Result<PathBuf, PathError> {
    if let Some(path) = env.var(CONFIG_PATH_VAR) {
        return normalize_user_path(path, env);
    }

    let home = env.home().ok_or(PathError::NoHomeDir)?;
    Ok(home.join(DEFAULT_CONFIG_RELATIVE))
}

/// Normalize a user-provided path, expanding `~` and making it absolute.
pub fn normalize_user_path(raw: &str, env: &Environment) -> Result<PathBuf, PathError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(PathError::EmptyPath);
    }

    let expanded = if trimmed == "~" || trimmed.starts_with("~/") {
        let home = env.home().ok_or(PathError::NoHomeDir)?;
        if trimmed == "~" {
            home.clone()
        } else {
            home.join(trimmed.trim_start_matches("~/"))
        }
    } else {
        PathBuf::from(trimmed)
    };

    absolutize(&expanded, env)
}

/// Join a relative path onto the captured working directory.
pub fn absolutize(path: &Path, env: &Environment) -> Result<PathBuf, PathError> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    env.cwd()
        .map(|cwd| cwd.join(path))
        .ok_or_else(|| PathError::CurrentDirError("working directory unknown".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(unix)]
    fn data_root_honors_override() {
        let env = Environment::new().with_var(DATA_DIR_VAR, "/srv/agentctl");
        assert_eq!(data_root(&env).unwrap(), PathBuf::from("/srv/agentctl"));
    }

    #[test]
    #[cfg(all(unix, not(target_os = "macos")))]
    fn data_root_derives_from_injected_home() {
        let env = Environment::new().with_home("/home/dev");
        assert_eq!(
            data_root(&env).unwrap(),
            PathBuf::from("/home/dev/.local/share/agentctl")
        );

        let env = env.with_var("XDG_DATA_HOME", "/xdg/data");
        assert_eq!(data_root(&env).unwrap(), PathBuf::from("/xdg/data/agentctl"));

        assert!(matches!(
            data_root(&Environment::new()),
            Err(PathError::NoDataDir)
        ));
    }

    #[test]
    #[cfg(unix)]
    fn relative_paths_join_the_captured_cwd() {
        let env = Environment::new().with_cwd("/work/project");
        assert_eq!(
            normalize_user_path("cfg/mcp.json", &env).unwrap(),
            PathBuf::from("/work/project/cfg/mcp.json")
        );
        assert!(matches!(
            normalize_user_path("cfg/mcp.json", &Environment::new()),
            Err(PathError::CurrentDirError(_))
        ));
    }

    #[test]
    #[cfg(unix)]
    fn config_path_defaults_under_home() {
        let env = Environment::new().with_home("/home/dev");
        assert_eq!(
            config_path(&env).unwrap(),
            PathBuf::from("/home/dev/.cursor/mcp.json")
        );
    }

    #[test]
    fn config_path_without_home_fails() {
        assert!(matches!(
            config_path(&Environment::new()),
            Err(PathError::NoHomeDir)
        ));
    }

    #[test]
    #[cfg(unix)]
    fn tilde_expands_against_injected_home() {
        let env = Environment::new().with_home("/home/dev");
        assert_eq!(
            normalize_user_path("~/cfg/mcp.json", &env).unwrap(),
            PathBuf::from("/home/dev/cfg/mcp.json")
        );
        assert!(matches!(
            normalize_user_path("  ", &env),
            Err(PathError::EmptyPath)
        ));
    }
}

//! Path utilities for agentctl data directories and the IDE config file.
//!
//! # Design
//!
//! - Returns `PathBuf` and `PathError` for clear error handling
//! - Takes an explicit `Environment`; no implicit global lookups
//! - No interactive/terminal I/O

mod error;
mod platform;
mod resolver;

pub use error::PathError;
pub use platform::{
    CONFIG_PATH_VAR, DATA_DIR_VAR, DEFAULT_CONFIG_RELATIVE, absolutize, config_path, data_root,
    normalize_user_path,
};
pub use resolver::{MANIFEST_FILE, ResolvedPaths};

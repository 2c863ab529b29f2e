//! Crash-safe file replacement shared by the config and manifest stores.
//!
//! # Protocol
//! 1. Write to `<file>.tmp` in the same directory
//! 2. `sync_all` the temp file
//! 3. Rename over `<file>` (atomic on Unix/macOS)
//!
//! Readers therefore see either the old content or the new content, never
//! a partial write.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Sibling temp path used while `path` is being replaced.
pub fn temp_path_for(path: &Path) -> io::Result<PathBuf> {
    let mut temp_name = path
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"))?
        .to_os_string();
    temp_name.push(".tmp");
    Ok(path.with_file_name(temp_name))
}

/// Replace `path` with `bytes`, creating parent directories as needed.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let temp_path = temp_path_for(path)?;
    {
        let mut file = fs::File::create(&temp_path)?;
        file.write_all(bytes)?;
        file.sync_all()?;
    }

    fs::rename(&temp_path, path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_content_and_leaves_no_temp_file() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("nested").join("state.json");

        write_atomic(&path, b"first").unwrap();
        write_atomic(&path, b"second").unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"second");
        assert!(!temp_path_for(&path).unwrap().exists());
    }

    #[test]
    fn rejects_paths_without_a_file_name() {
        let err = write_atomic(Path::new("/"), b"x").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }
}

//! File I/O primitives with consistent error handling.

use crate::error::{Error, Result};
use std::fs;
use std::path::Path;

fn io_error(e: std::io::Error, path: &Path, operation: &str) -> Error {
    if e.kind() == std::io::ErrorKind::NotFound {
        Error::internal_io(
            format!("File not found: {}", path.display()),
            Some(operation.to_string()),
        )
    } else {
        Error::internal_io(
            format!("{}: {}", path.display(), e),
            Some(operation.to_string()),
        )
    }
}

/// Read file contents as UTF-8 text.
pub fn read_file(path: &Path, operation: &str) -> Result<String> {
    fs::read_to_string(path).map_err(|e| io_error(e, path, operation))
}

/// Read raw file contents.
pub fn read_bytes(path: &Path, operation: &str) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| io_error(e, path, operation))
}

/// Create `dir` and all of its parents if missing.
pub fn ensure_dir(dir: &Path, operation: &str) -> Result<()> {
    fs::create_dir_all(dir).map_err(|e| io_error(e, dir, operation))
}

/// Write content to file atomically (write to .tmp, then rename).
///
/// Parent directories are created as needed. The rename is atomic on POSIX
/// filesystems, so readers see either the old content or the new content.
pub fn write_file_atomic(path: &Path, content: &[u8], operation: &str) -> Result<()> {
    let parent = path.parent().ok_or_else(|| {
        Error::internal_io(
            format!("Invalid path: {}", path.display()),
            Some(operation.to_string()),
        )
    })?;

    let filename = path.file_name().ok_or_else(|| {
        Error::internal_io(
            format!("Invalid path: {}", path.display()),
            Some(operation.to_string()),
        )
    })?;

    if !parent.as_os_str().is_empty() {
        ensure_dir(parent, operation)?;
    }

    let tmp_path = parent.join(format!("{}.tmp", filename.to_string_lossy()));

    fs::write(&tmp_path, content)
        .map_err(|e| io_error(e, &tmp_path, &format!("{} (write temp)", operation)))?;

    fs::rename(&tmp_path, path)
        .map_err(|e| io_error(e, path, &format!("{} (rename)", operation)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn read_file_succeeds_for_existing_file() {
        let mut temp = NamedTempFile::new().unwrap();
        writeln!(temp, "test content").unwrap();

        let content = read_file(temp.path(), "test read").unwrap();
        assert!(content.contains("test content"));
    }

    #[test]
    fn read_file_returns_error_for_missing_file() {
        let result = read_file(Path::new("/nonexistent/path.txt"), "test read");
        let err = result.unwrap_err();
        assert_eq!(err.code.as_str(), "internal.io_error");
        assert!(err.details["error"]
            .as_str()
            .unwrap()
            .contains("File not found"));
    }

    #[test]
    fn write_file_atomic_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a/b/c.txt");

        write_file_atomic(&path, b"nested", "test write").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "nested");
        assert!(!dir.path().join("a/b/c.txt.tmp").exists());
    }

    #[test]
    fn write_file_atomic_overwrites_existing_content() {
        let temp = NamedTempFile::new().unwrap();
        fs::write(temp.path(), "old content that is longer").unwrap();

        write_file_atomic(temp.path(), b"new", "test write").unwrap();

        assert_eq!(fs::read_to_string(temp.path()).unwrap(), "new");
    }
}

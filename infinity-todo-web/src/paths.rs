//! Database location for the server binary. The store itself only ever
//! receives a resolved path.

use std::env;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub const DB_FILE_NAME: &str = "todo.db";

/// Resolve the database path.
/// Checks `PORTABLE_EXECUTABLE_DIR`, then `USER_DATA_PATH`, and falls back to
/// the directory of the running executable.
pub fn db_path() -> Result<PathBuf> {
    let dir = resolve_db_dir(
        env::var_os("PORTABLE_EXECUTABLE_DIR"),
        env::var_os("USER_DATA_PATH"),
        env::current_exe,
    )?;
    Ok(dir.join(DB_FILE_NAME))
}

fn resolve_db_dir(
    portable_dir: Option<OsString>,
    user_data_dir: Option<OsString>,
    current_exe: impl FnOnce() -> io::Result<PathBuf>,
) -> Result<PathBuf> {
    if let Some(dir) = portable_dir.filter(|d| !d.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    if let Some(dir) = user_data_dir.filter(|d| !d.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    let exe = current_exe().context("failed to locate the running executable")?;
    Ok(exe
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(".")))
}

pub fn ensure_db_dir(db_path: &Path) -> Result<()> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exe() -> io::Result<PathBuf> {
        Ok(PathBuf::from("/opt/todo/bin/infinity-todo-server"))
    }

    #[test]
    fn portable_dir_wins() {
        let dir = resolve_db_dir(Some("/portable".into()), Some("/appdata".into()), exe).unwrap();
        assert_eq!(dir, PathBuf::from("/portable"));
    }

    #[test]
    fn user_data_before_exe_dir() {
        let dir = resolve_db_dir(None, Some("/appdata".into()), exe).unwrap();
        assert_eq!(dir, PathBuf::from("/appdata"));
    }

    #[test]
    fn falls_back_to_exe_dir() {
        let dir = resolve_db_dir(Some(OsString::new()), None, exe).unwrap();
        assert_eq!(dir, PathBuf::from("/opt/todo/bin"));
    }

    #[test]
    fn exe_lookup_failure_is_reported() {
        let err = resolve_db_dir(None, None, || Err(io::Error::other("gone"))).unwrap_err();
        assert!(err.to_string().contains("executable"));
    }

    #[test]
    fn creates_missing_parent_dirs() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("a").join("b").join(DB_FILE_NAME);
        ensure_db_dir(&path).unwrap();
        assert!(path.parent().unwrap().is_dir());
        ensure_db_dir(Path::new(DB_FILE_NAME)).unwrap();
    }
}

//! Filesystem helpers shared by the installer and the archive step.
//!
//! Failures come back as `InstallError::FilesystemError` naming the
//! operation and path, which is what the user sees when an attempt fails.

use std::path::Path;
use tokio::fs;
use vernal_errors::InstallError;

fn filesystem_error(operation: &str, path: &Path, err: &std::io::Error) -> InstallError {
    InstallError::FilesystemError {
        operation: operation.to_string(),
        path: path.display().to_string(),
        message: err.to_string(),
    }
}

/// Create a directory and all missing parents; existing directories are fine.
///
/// # Errors
///
/// Returns an error if the directory cannot be created.
pub async fn create_dir_all(path: &Path) -> Result<(), InstallError> {
    fs::create_dir_all(path)
        .await
        .map_err(|e| filesystem_error("create_dir_all", path, &e))
}

/// Remove a directory tree; a missing directory is not an error.
///
/// # Errors
///
/// Returns an error if the directory exists but cannot be removed.
pub async fn remove_dir_all(path: &Path) -> Result<(), InstallError> {
    match fs::remove_dir_all(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(filesystem_error("remove_dir_all", path, &e)),
    }
}

/// Write `contents` next to `path` and rename it into place.
///
/// # Errors
///
/// Returns an error if the temporary file cannot be written or renamed.
pub async fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), InstallError> {
    let mut staging = path.as_os_str().to_os_string();
    staging.push(".tmp");
    let staging = std::path::PathBuf::from(staging);

    fs::write(&staging, contents)
        .await
        .map_err(|e| filesystem_error("write", &staging, &e))?;
    if let Err(e) = fs::rename(&staging, path).await {
        let _ = fs::remove_file(&staging).await;
        return Err(filesystem_error("rename", path, &e));
    }
    Ok(())
}

/// Whether `path` exists
pub async fn exists(path: &Path) -> bool {
    fs::metadata(path).await.is_ok()
}

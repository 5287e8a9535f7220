//! Service configuration file (`config.yml`)
//!
//! One `key: "value"` line per entry, keys in ascending order, ASCII only.
//! Values are written unescaped, so quotes and backslashes are refused.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;
use vernal_errors::InstallError;
use vernal_platform::fs;

/// Render the configuration mapping.
///
/// # Errors
///
/// Returns `InstallError::ConfigWriteFailed` if a key or value is not ASCII
/// or would break the line format.
pub fn render(entries: &BTreeMap<String, String>, path: &Path) -> Result<String, InstallError> {
    let mut contents = String::new();
    for (key, value) in entries {
        check_field(path, "key", key)?;
        check_field(path, "value", value)?;
        let _ = writeln!(contents, "{key}: \"{value}\"");
    }
    Ok(contents)
}

/// Render `entries` and write them to `path`, replacing any previous file.
///
/// # Errors
///
/// Returns `InstallError::ConfigWriteFailed` for unencodable content and a
/// filesystem error if the file cannot be written.
pub async fn write(entries: &BTreeMap<String, String>, path: &Path) -> Result<(), InstallError> {
    let contents = render(entries, path)?;
    fs::write_atomic(path, contents.as_bytes()).await
}

fn check_field(path: &Path, what: &str, text: &str) -> Result<(), InstallError> {
    let problem = if !text.is_ascii() {
        "is not ASCII"
    } else if text.contains(['\n', '\r']) {
        "contains a line break"
    } else if text.contains(['"', '\\']) {
        "contains a quote or backslash"
    } else {
        return Ok(());
    };
    Err(InstallError::ConfigWriteFailed {
        path: path.display().to_string(),
        message: format!("{what} `{}` {problem}", text.escape_default()),
    })
}

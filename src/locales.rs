use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::StoreError;

pub const DEFAULT_LOCALES_DIR: &str = "js/locales";

/// Translated text keyed by message key. Sorted so the written file is stable.
pub type LocaleMapping = BTreeMap<String, String>;

/// A locale names a file directly inside the locales directory.
pub fn validate_locale(locale: &str) -> Result<(), String> {
    let trimmed = locale.trim();
    if trimmed.is_empty() {
        return Err("locale name is empty".to_string());
    }
    if trimmed == "." || trimmed == ".." || trimmed.contains(['/', '\\', '\0']) {
        return Err(format!(
            "invalid locale '{}': must not contain path separators",
            locale
        ));
    }
    Ok(())
}

pub fn locale_path(dir: &Path, locale: &str) -> PathBuf {
    dir.join(format!("{}.json", locale))
}

pub fn read_locale(path: &Path) -> Result<LocaleMapping, StoreError> {
    let content = fs::read_to_string(path).map_err(|source| StoreError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| StoreError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Replaces the whole file with the pretty-printed mapping.
///
/// Content goes to a temporary file next to the target first and is then
/// renamed into place.
pub fn write_locale(path: &Path, translations: &LocaleMapping) -> Result<(), StoreError> {
    let write_err = |source| StoreError::Write {
        path: path.to_path_buf(),
        source,
    };
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir).map_err(write_err)?;

    let mut content =
        serde_json::to_string_pretty(translations).map_err(|source| StoreError::Serialize {
            path: path.to_path_buf(),
            source,
        })?;
    content.push('\n');

    let mut file = tempfile::Builder::new()
        .prefix(".locale-")
        .suffix(".json.tmp")
        .tempfile_in(&dir)
        .map_err(write_err)?;
    file.write_all(content.as_bytes()).map_err(write_err)?;
    file.persist(path).map_err(|err| write_err(err.error))?;
    Ok(())
}

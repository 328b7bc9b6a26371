use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::locales::DEFAULT_LOCALES_DIR;
use crate::messages::DEFAULT_MESSAGES_PATH;
use crate::sync::{DEFAULT_BATCH_SIZE, DEFAULT_LOCALE, DEFAULT_MAX_RETRIES, retry};

pub const SETTINGS_FILE: &str = "locale-sync.toml";
pub const LOCAL_SETTINGS_FILE: &str = "locale-sync.local.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub locales: Vec<String>,
    pub batch_size: usize,
    pub max_retries: u32,
    pub model: String,
    pub messages_path: PathBuf,
    pub locales_dir: PathBuf,
    pub request_timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            locales: vec![DEFAULT_LOCALE.to_string()],
            batch_size: DEFAULT_BATCH_SIZE,
            max_retries: DEFAULT_MAX_RETRIES,
            model: "openai".to_string(),
            messages_path: PathBuf::from(DEFAULT_MESSAGES_PATH),
            locales_dir: PathBuf::from(DEFAULT_LOCALES_DIR),
            request_timeout: retry::REQUEST_TIMEOUT,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    sync: Option<SyncSettings>,
}

#[derive(Debug, Default, Deserialize)]
struct SyncSettings {
    locales: Option<Vec<String>>,
    batch_size: Option<usize>,
    max_retries: Option<u32>,
    model: Option<String>,
    messages_path: Option<String>,
    locales_dir: Option<String>,
    request_timeout_secs: Option<u64>,
}

/// Values given on the command line. They win over every other layer.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub locales: Option<Vec<String>>,
    pub batch_size: Option<usize>,
    pub max_retries: Option<u32>,
    pub model: Option<String>,
    pub messages_path: Option<PathBuf>,
    pub locales_dir: Option<PathBuf>,
}

/// Defaults, then settings files, then the environment, then `overrides`.
pub fn load_settings(extra_path: Option<&Path>, overrides: &Overrides) -> Result<Settings> {
    load_settings_from(
        Path::new("."),
        extra_path,
        |key| std::env::var(key).ok(),
        overrides,
    )
}

pub(crate) fn load_settings_from<F>(
    dir: &Path,
    extra_path: Option<&Path>,
    env: F,
    overrides: &Overrides,
) -> Result<Settings>
where
    F: Fn(&str) -> Option<String>,
{
    let mut settings = Settings::default();
    if let Some(model) = env("OPENAI_MODEL").filter(|value| !value.trim().is_empty()) {
        settings.model = format!("openai:{}", model.trim());
    }

    let mut ordered_paths = vec![dir.join(SETTINGS_FILE), dir.join(LOCAL_SETTINGS_FILE)];
    if let Some(extra) = extra_path {
        if !extra.exists() {
            return Err(anyhow!("settings file not found: {}", extra.display()));
        }
        ordered_paths.push(extra.to_path_buf());
    }

    for path in ordered_paths {
        if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("failed to read settings: {}", path.display()))?;
            let parsed: SettingsFile = toml::from_str(&content)
                .with_context(|| format!("failed to parse settings: {}", path.display()))?;
            settings.merge(parsed);
        }
    }

    settings.apply_env(env);
    settings.apply_overrides(overrides);
    Ok(settings)
}

impl Settings {
    fn merge(&mut self, incoming: SettingsFile) {
        let Some(sync) = incoming.sync else {
            return;
        };
        if let Some(locales) = sync.locales {
            let locales = clean_locales(locales);
            if !locales.is_empty() {
                self.locales = locales;
            }
        }
        if let Some(size) = sync.batch_size {
            if size > 0 {
                self.batch_size = size;
            }
        }
        if let Some(retries) = sync.max_retries {
            if retries > 0 {
                self.max_retries = retries;
            }
        }
        if let Some(model) = sync.model {
            if !model.trim().is_empty() {
                self.model = model.trim().to_string();
            }
        }
        if let Some(path) = sync.messages_path {
            if !path.trim().is_empty() {
                self.messages_path = PathBuf::from(path.trim());
            }
        }
        if let Some(dir) = sync.locales_dir {
            if !dir.trim().is_empty() {
                self.locales_dir = PathBuf::from(dir.trim());
            }
        }
        if let Some(secs) = sync.request_timeout_secs {
            if secs > 0 {
                self.request_timeout = Duration::from_secs(secs);
            }
        }
    }

    fn apply_env<F>(&mut self, env: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(size) = env("SYNC_BATCH_SIZE").and_then(|value| value.trim().parse().ok()) {
            self.batch_size = size;
        }
        if let Some(retries) = env("SYNC_MAX_RETRIES").and_then(|value| value.trim().parse().ok())
        {
            self.max_retries = retries;
        }
        if let Some(model) = env("SYNC_MODEL").filter(|value| !value.trim().is_empty()) {
            self.model = model.trim().to_string();
        }
        if let Some(locales) = env("SYNC_DEFAULT_LOCALES") {
            let locales = parse_locale_list(&locales);
            if !locales.is_empty() {
                self.locales = locales;
            }
        }
    }

    fn apply_overrides(&mut self, overrides: &Overrides) {
        if let Some(locales) = &overrides.locales {
            let locales = clean_locales(locales.clone());
            if !locales.is_empty() {
                self.locales = locales;
            }
        }
        if let Some(size) = overrides.batch_size {
            self.batch_size = size;
        }
        if let Some(retries) = overrides.max_retries {
            self.max_retries = retries;
        }
        if let Some(model) = &overrides.model {
            self.model = model.clone();
        }
        if let Some(path) = &overrides.messages_path {
            self.messages_path = path.clone();
        }
        if let Some(dir) = &overrides.locales_dir {
            self.locales_dir = dir.clone();
        }
    }
}

/// Splits `pidgin, en,fr` into trimmed, non-empty locale names.
pub fn parse_locale_list(value: &str) -> Vec<String> {
    clean_locales(value.split(',').map(str::to_string).collect())
}

fn clean_locales(locales: Vec<String>) -> Vec<String> {
    locales
        .into_iter()
        .map(|locale| locale.trim().to_string())
        .filter(|locale| !locale.is_empty())
        .collect()
}

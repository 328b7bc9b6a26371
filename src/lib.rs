use anyhow::Result;
use std::fmt::Write as _;
use std::path::Path;

pub mod error;
pub mod locales;
pub mod logging;
pub mod messages;
pub mod providers;
pub mod settings;
pub mod sync;
#[cfg(test)]
mod test_util;

pub use error::{BackendError, ParseError, RetryExhausted, StoreError, SyncError};
pub use messages::Message;
pub use providers::{CompletionRequest, ProviderKind, TranslationClient};
pub use settings::{Overrides, Settings};
pub use sync::{LocaleFile, LocaleReport, LocaleStatus, SyncConfig, SyncReport};

/// What the command line asked for, before settings files and the
/// environment are folded in.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub overrides: Overrides,
    pub key: Option<String>,
    pub settings_path: Option<String>,
}

pub async fn run_sync(config: Config) -> Result<String> {
    let sync_config = resolve_sync_config(&config)?;
    let report = sync::sync_all(&sync_config).await?;
    Ok(format_sync_report(&report))
}

pub fn run_status(config: Config) -> Result<String> {
    let sync_config = resolve_sync_config(&config)?;
    let statuses = sync::status(&sync_config)?;
    Ok(format_status(&statuses))
}

pub fn show_config(config: Config) -> Result<String> {
    let sync_config = resolve_sync_config(&config)?;
    Ok(format_show_config(&sync_config))
}

pub fn resolve_sync_config(config: &Config) -> Result<SyncConfig> {
    let settings_path = config.settings_path.as_deref().map(Path::new);
    let settings = settings::load_settings(settings_path, &config.overrides)?;
    // An unknown model is reported by the engine; the key lookup just comes up empty.
    let credential = providers::resolve_provider_selection(&settings.model)
        .ok()
        .and_then(|selection| providers::resolve_key(selection.provider, config.key.as_deref()))
        .unwrap_or_default();
    Ok(sync_config_from(settings, credential))
}

fn sync_config_from(settings: Settings, credential: String) -> SyncConfig {
    let mut sync_config = SyncConfig::new(settings.locales, settings.model, credential);
    sync_config.batch_size = settings.batch_size;
    sync_config.max_retries = settings.max_retries;
    sync_config.messages_path = settings.messages_path;
    sync_config.locales_dir = settings.locales_dir;
    sync_config.request_timeout = settings.request_timeout;
    sync_config
}

pub fn format_sync_report(report: &SyncReport) -> String {
    let mut out = String::new();
    for locale in &report.locales {
        if locale.written {
            let _ = writeln!(
                out,
                "{}: added {} of {} missing keys in {} batch(es) -> {}",
                locale.locale,
                locale.added,
                locale.missing,
                locale.batches,
                locale.path.display()
            );
        } else {
            let _ = writeln!(
                out,
                "{}: up to date ({} keys)",
                locale.locale, locale.existing
            );
        }
    }
    out.trim_end().to_string()
}

pub fn format_status(statuses: &[LocaleStatus]) -> String {
    let mut out = String::new();
    for status in statuses {
        let total = status.translated + status.missing;
        let _ = write!(
            out,
            "{}: {}/{} translated, {} missing",
            status.locale, status.translated, total, status.missing
        );
        match &status.file {
            LocaleFile::Found => {}
            LocaleFile::Missing => out.push_str(" (no locale file)"),
            LocaleFile::Unreadable(reason) => {
                let _ = write!(out, " (unreadable locale file: {})", reason);
            }
        }
        out.push('\n');
    }
    out.trim_end().to_string()
}

pub fn format_show_config(config: &SyncConfig) -> String {
    let provider = match providers::resolve_provider_selection(&config.model) {
        Ok(selection) => format!("{} ({})", selection.provider.as_str(), selection.model),
        Err(err) => format!("unresolved: {}", err),
    };
    let api_key = if config.credential.trim().is_empty() {
        "(not set)"
    } else {
        "(set)"
    };
    let lines = [
        format!("locales: {}", config.locales.join(", ")),
        format!("batch_size: {}", config.batch_size),
        format!("max_retries: {}", config.max_retries),
        format!("model: {}", config.model),
        format!("provider: {}", provider),
        format!("messages_path: {}", config.messages_path.display()),
        format!("locales_dir: {}", config.locales_dir.display()),
        format!("request_timeout: {}s", config.request_timeout.as_secs()),
        format!("api_key: {}", api_key),
    ];
    lines.join("\n")
}

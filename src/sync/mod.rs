use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::{Instrument, error, info, info_span, warn};

use crate::error::{StoreError, SyncError};
use crate::locales::{
    self, LocaleMapping, locale_path, read_locale, validate_locale, write_locale,
};
use crate::logging::Timer;
use crate::messages::{self, Message, load_messages};
use crate::providers::{
    CompletionRequest, TranslationClient, build_client, resolve_provider_selection,
};

pub mod diff;
pub mod parse;
pub mod prompt;
pub mod retry;

pub use diff::{Batch, batch_count, batches, diff_keys};
pub use parse::parse_translations;
pub use prompt::build_translation_prompt;
pub use retry::{RetryPolicy, translate_batch};

pub const DEFAULT_LOCALE: &str = "pidgin";
pub const DEFAULT_BATCH_SIZE: usize = 200;
pub const DEFAULT_MAX_RETRIES: u32 = 3;

#[derive(Clone)]
pub struct SyncConfig {
    pub locales: Vec<String>,
    pub batch_size: usize,
    pub max_retries: u32,
    /// `provider`, `provider:model`, or a bare model name.
    pub model: String,
    pub credential: String,
    pub messages_path: PathBuf,
    pub locales_dir: PathBuf,
    pub request_timeout: Duration,
    pub backoff_base: Duration,
    /// Replaces the backend built from `model` and `credential`.
    pub client: Option<Arc<dyn TranslationClient>>,
}

impl SyncConfig {
    pub fn new(locales: Vec<String>, model: impl Into<String>, credential: impl Into<String>) -> Self {
        Self {
            locales,
            batch_size: DEFAULT_BATCH_SIZE,
            max_retries: DEFAULT_MAX_RETRIES,
            model: model.into(),
            credential: credential.into(),
            messages_path: PathBuf::from(messages::DEFAULT_MESSAGES_PATH),
            locales_dir: PathBuf::from(locales::DEFAULT_LOCALES_DIR),
            request_timeout: retry::REQUEST_TIMEOUT,
            backoff_base: retry::BACKOFF_BASE,
            client: None,
        }
    }

    pub fn with_client(mut self, client: Arc<dyn TranslationClient>) -> Self {
        self.client = Some(client);
        self
    }

    fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_retries,
            backoff_base: self.backoff_base,
            request_timeout: self.request_timeout,
        }
    }
}

impl fmt::Debug for SyncConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncConfig")
            .field("locales", &self.locales)
            .field("batch_size", &self.batch_size)
            .field("max_retries", &self.max_retries)
            .field("model", &self.model)
            .field("has_credential", &!self.credential.trim().is_empty())
            .field("messages_path", &self.messages_path)
            .field("locales_dir", &self.locales_dir)
            .field("request_timeout", &self.request_timeout)
            .field("backoff_base", &self.backoff_base)
            .field("client_override", &self.client.is_some())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocaleReport {
    pub locale: String,
    pub path: PathBuf,
    /// Entries in the locale file before this run.
    pub existing: usize,
    pub missing: usize,
    /// Entries gained by this run.
    pub added: usize,
    pub batches: usize,
    pub written: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub locales: Vec<LocaleReport>,
}

impl SyncReport {
    pub fn written(&self) -> impl Iterator<Item = &LocaleReport> {
        self.locales.iter().filter(|report| report.written)
    }
}

/// What was found on disk for a locale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocaleFile {
    Found,
    Missing,
    /// The file exists but could not be read or parsed.
    Unreadable(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocaleStatus {
    pub locale: String,
    pub path: PathBuf,
    pub file: LocaleFile,
    pub translated: usize,
    pub missing: usize,
}

struct Backend {
    client: Arc<dyn TranslationClient>,
    model: String,
    policy: RetryPolicy,
}

/// Brings every configured locale up to date with the canonical messages.
///
/// Locales run in order and the first failure stops the run. A locale file is
/// only written once all of its batches succeeded.
pub async fn sync_all(config: &SyncConfig) -> Result<SyncReport, SyncError> {
    let _timer = Timer::start("sync_process");
    run_sync(config).instrument(info_span!("sync")).await
}

/// Syncs a single locale against an already loaded message list.
pub async fn sync_locale(
    messages: &[Message],
    locale: &str,
    config: &SyncConfig,
) -> Result<LocaleReport, SyncError> {
    let backend = prepare(config)?;
    validate_locale(locale).map_err(SyncError::Configuration)?;
    sync_locale_with(&backend, messages, locale, config)
        .instrument(info_span!("sync_locale", locale))
        .await
}

/// Per-locale counts of translated and missing keys. Never calls a backend.
pub fn status(config: &SyncConfig) -> Result<Vec<LocaleStatus>, SyncError> {
    check_locales(&config.locales)?;
    let messages = load_messages(&config.messages_path).map_err(SyncError::Messages)?;
    Ok(config
        .locales
        .iter()
        .map(|locale| locale_status(&messages, locale, &config.locales_dir))
        .collect())
}

fn locale_status(messages: &[Message], locale: &str, dir: &Path) -> LocaleStatus {
    let path = locale_path(dir, locale);
    let (file, existing) = match read_locale(&path) {
        Ok(existing) => (LocaleFile::Found, existing),
        Err(StoreError::Read { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
            (LocaleFile::Missing, LocaleMapping::new())
        }
        Err(err) => {
            warn!(locale, error = %err, "failed to read locale file");
            (LocaleFile::Unreadable(err.to_string()), LocaleMapping::new())
        }
    };
    let missing = diff_keys(messages, &existing).len();
    LocaleStatus {
        locale: locale.to_string(),
        path,
        file,
        translated: messages.len() - missing,
        missing,
    }
}

async fn run_sync(config: &SyncConfig) -> Result<SyncReport, SyncError> {
    info!(
        locales = ?config.locales,
        batch_size = config.batch_size,
        model = %config.model,
        has_api_key = !config.credential.trim().is_empty(),
        "starting sync process"
    );

    let backend = prepare(config)?;
    let messages = load_messages(&config.messages_path).map_err(|err| {
        error!(error = %err, "failed to read messages");
        SyncError::Messages(err)
    })?;
    info!(count = messages.len(), "loaded messages");

    let mut report = SyncReport::default();
    for locale in &config.locales {
        let result = sync_locale_with(&backend, &messages, locale, config)
            .instrument(info_span!("sync_locale", locale = %locale))
            .await;
        match result {
            Ok(locale_report) => report.locales.push(locale_report),
            Err(err) => {
                error!(locale = %locale, error = %err, "failed to sync locale");
                return Err(err);
            }
        }
    }

    info!("sync process completed successfully");
    Ok(report)
}

fn prepare(config: &SyncConfig) -> Result<Backend, SyncError> {
    let selection = resolve_provider_selection(&config.model).map_err(SyncError::Configuration)?;
    if config.credential.trim().is_empty() {
        error!(
            help = "Set OPENAI_API_KEY (or the selected provider's key) or create a .env file",
            "API key not found"
        );
        return Err(SyncError::configuration(
            "API key not found in settings, environment variables or .env file",
        ));
    }
    if config.batch_size < 1 {
        return Err(SyncError::configuration("batch size must be at least 1"));
    }
    if config.max_retries < 1 {
        return Err(SyncError::configuration("max retries must be at least 1"));
    }
    check_locales(&config.locales)?;

    let client = match &config.client {
        Some(client) => Arc::clone(client),
        None => build_client(selection.provider, config.credential.clone()),
    };
    Ok(Backend {
        client,
        model: selection.model,
        policy: config.retry_policy(),
    })
}

fn check_locales(locales: &[String]) -> Result<(), SyncError> {
    for locale in locales {
        validate_locale(locale).map_err(SyncError::Configuration)?;
    }
    Ok(())
}

async fn sync_locale_with(
    backend: &Backend,
    messages: &[Message],
    locale: &str,
    config: &SyncConfig,
) -> Result<LocaleReport, SyncError> {
    let _timer = Timer::start("sync_locale");
    info!("syncing locale");

    let path = locale_path(&config.locales_dir, locale);
    let mut translations = match read_locale(&path) {
        Ok(existing) => existing,
        Err(err) => {
            warn!(error = %err, "failed to read existing locale file, starting fresh");
            LocaleMapping::new()
        }
    };
    let existing = translations.len();
    info!(count = existing, "loaded existing translations");

    let missing = diff_keys(messages, &translations);
    let mut report = LocaleReport {
        locale: locale.to_string(),
        path,
        existing,
        missing: missing.len(),
        added: 0,
        batches: batch_count(missing.len(), config.batch_size),
        written: false,
    };
    if missing.is_empty() {
        info!("no missing keys for locale");
        return Ok(report);
    }
    info!(count = missing.len(), "found missing keys");

    for batch in batches(&missing, config.batch_size) {
        info!(
            batch = batch.number,
            total_batches = batch.total,
            keys_in_batch = batch.items.len(),
            "processing batch"
        );
        let request = CompletionRequest {
            prompt: build_translation_prompt(batch.items, locale),
            model: backend.model.clone(),
        };
        let parsed = translate_batch(
            backend.client.as_ref(),
            &request,
            &backend.policy,
            locale,
            batch.number,
        )
        .await
        .map_err(|source| SyncError::Locale {
            locale: locale.to_string(),
            batch: batch.number,
            source,
        })?;

        let added = parsed.len();
        translations.extend(parsed);
        info!(batch = batch.number, translations_added = added, "batch completed");
    }

    write_locale(&report.path, &translations).map_err(|source| SyncError::Persist {
        locale: locale.to_string(),
        source,
    })?;
    report.added = translations.len() - existing;
    report.written = true;
    info!(total_keys = translations.len(), "locale sync completed");
    Ok(report)
}

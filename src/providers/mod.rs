use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::Deserialize;

use crate::error::BackendError;

mod claude;
mod gemini;
mod openai;

pub use claude::Claude;
pub use gemini::Gemini;
pub use openai::OpenAI;

pub const SYSTEM_PROMPT: &str = "You are a professional translator. Translate UI strings accurately while preserving placeholders, formatting, and context. Return only the requested format.";

pub(crate) const MAX_TOKENS: u32 = 2000;
pub(crate) const TEMPERATURE: f32 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    OpenAI,
    Gemini,
    Claude,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAI => "openai",
            ProviderKind::Gemini => "gemini",
            ProviderKind::Claude => "claude",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderKind::OpenAI => openai::DEFAULT_MODEL,
            ProviderKind::Gemini => gemini::DEFAULT_MODEL,
            ProviderKind::Claude => claude::DEFAULT_MODEL,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSelection {
    pub provider: ProviderKind,
    pub model: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    pub prompt: String,
    pub model: String,
}

pub type CompletionFuture = Pin<Box<dyn Future<Output = Result<String, BackendError>> + Send>>;

/// A text-generation backend: one prompt in, the first reply's text out.
pub trait TranslationClient: Send + Sync {
    fn complete(&self, request: CompletionRequest) -> CompletionFuture;
}

pub fn build_client(provider: ProviderKind, key: String) -> Arc<dyn TranslationClient> {
    match provider {
        ProviderKind::OpenAI => Arc::new(OpenAI::new(key)),
        ProviderKind::Gemini => Arc::new(Gemini::new(key)),
        ProviderKind::Claude => Arc::new(Claude::new(key)),
    }
}

/// Resolves `provider`, `provider:model`, or a bare model name.
pub fn resolve_provider_selection(model_arg: &str) -> Result<ProviderSelection, String> {
    let raw = model_arg.trim();
    if raw.is_empty() {
        return Err("model argument is empty".to_string());
    }

    if let Some(provider) = provider_from_name(&raw.to_lowercase()) {
        return Ok(ProviderSelection {
            provider,
            model: provider.default_model().to_string(),
        });
    }

    if let Some((provider_part, model_part)) = raw.split_once(':')
        && let Some(provider) = provider_from_name(&provider_part.trim().to_lowercase())
    {
        let model = model_part.trim();
        let model = if model.is_empty() {
            provider.default_model()
        } else {
            model
        };
        return Ok(ProviderSelection {
            provider,
            model: model.to_string(),
        });
    }

    if let Some(provider) = provider_from_model_name(&raw.to_lowercase()) {
        return Ok(ProviderSelection {
            provider,
            model: raw.to_string(),
        });
    }

    Err(format!(
        "unable to infer provider from model '{}'. Use provider:model (openai:, gemini:, claude:)",
        raw
    ))
}

pub fn resolve_key(provider: ProviderKind, override_key: Option<&str>) -> Option<String> {
    resolve_key_with(provider, override_key, |key| std::env::var(key).ok())
}

pub(crate) fn resolve_key_with<F>(
    provider: ProviderKind,
    override_key: Option<&str>,
    env: F,
) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(key) = override_key.filter(|key| !key.trim().is_empty()) {
        return Some(key.to_string());
    }
    let get = |name: &str| env(name).filter(|value| !value.trim().is_empty());
    match provider {
        ProviderKind::OpenAI => get("OPENAI_API_KEY"),
        ProviderKind::Gemini => get("GEMINI_API_KEY").or_else(|| get("GOOGLE_API_KEY")),
        ProviderKind::Claude => get("ANTHROPIC_API_KEY"),
    }
}

fn provider_from_name(name: &str) -> Option<ProviderKind> {
    match name {
        "openai" => Some(ProviderKind::OpenAI),
        "gemini" | "google" => Some(ProviderKind::Gemini),
        "claude" | "anthropic" => Some(ProviderKind::Claude),
        _ => None,
    }
}

fn provider_from_model_name(name: &str) -> Option<ProviderKind> {
    if ["gpt-", "o1", "o3", "o4", "chatgpt"]
        .iter()
        .any(|prefix| name.starts_with(prefix))
    {
        return Some(ProviderKind::OpenAI);
    }
    if name.starts_with("claude") {
        return Some(ProviderKind::Claude);
    }
    if name.starts_with("gemini") {
        return Some(ProviderKind::Gemini);
    }
    None
}

pub(crate) async fn send_json(
    provider: &'static str,
    request: reqwest::RequestBuilder,
    extract_error: fn(&str) -> Option<String>,
) -> Result<String, BackendError> {
    let response = request
        .send()
        .await
        .map_err(|source| BackendError::Transport { provider, source })?;
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|source| BackendError::Transport { provider, source })?;
    if status.is_success() {
        return Ok(text);
    }
    Err(BackendError::Status {
        provider,
        status: status.as_u16(),
        message: extract_error(&text).unwrap_or(text),
    })
}

pub(crate) fn format_error_parts(
    message: Option<String>,
    kind: Option<String>,
    code: Option<String>,
) -> String {
    let mut parts = Vec::new();
    if let Some(message) = message.filter(|value| !value.trim().is_empty()) {
        parts.push(message);
    }
    if let Some(kind) = kind.filter(|value| !value.trim().is_empty()) {
        parts.push(format!("type: {}", kind));
    }
    if let Some(code) = code.filter(|value| !value.trim().is_empty()) {
        parts.push(format!("code: {}", code));
    }
    if parts.is_empty() {
        "unknown error".to_string()
    } else {
        parts.join(" | ")
    }
}

/// Error envelope shared by the three APIs: `{"error": {"message", "type"|"status", "code"}}`.
pub(crate) fn extract_api_error(body: &str) -> Option<String> {
    #[derive(Deserialize)]
    struct ErrorBody {
        error: Option<ApiError>,
    }

    #[derive(Deserialize)]
    struct ApiError {
        message: Option<String>,
        #[serde(rename = "type", alias = "status")]
        kind: Option<String>,
        code: Option<serde_json::Value>,
    }

    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    let error = parsed.error?;
    let code = error.code.map(|value| match value {
        serde_json::Value::String(text) => text,
        other => other.to_string(),
    });
    Some(format_error_parts(error.message, error.kind, code))
}

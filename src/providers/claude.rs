use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::{
    CompletionFuture, CompletionRequest, MAX_TOKENS, SYSTEM_PROMPT, TEMPERATURE,
    TranslationClient, extract_api_error, send_json,
};
use crate::error::BackendError;

const PROVIDER: &str = "Claude";
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";
pub(crate) const DEFAULT_MODEL: &str = "claude-3-5-sonnet-latest";

#[derive(Debug, Clone)]
pub struct Claude {
    key: String,
    client: reqwest::Client,
}

impl Claude {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            client: reqwest::Client::new(),
        }
    }
}

impl TranslationClient for Claude {
    fn complete(&self, request: CompletionRequest) -> CompletionFuture {
        let provider = self.clone();
        Box::pin(async move {
            let body = json!({
                "model": request.model,
                "max_tokens": MAX_TOKENS,
                "temperature": TEMPERATURE,
                "system": SYSTEM_PROMPT,
                "messages": [
                    {"role": "user", "content": request.prompt}
                ]
            });
            let text = send_json(
                PROVIDER,
                provider
                    .client
                    .post(base_url())
                    .header("x-api-key", &provider.key)
                    .header("anthropic-version", API_VERSION)
                    .json(&body),
                extract_api_error,
            )
            .await?;
            extract_reply(&text)
        })
    }
}

fn base_url() -> String {
    std::env::var("ANTHROPIC_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string())
}

fn extract_reply(text: &str) -> Result<String, BackendError> {
    let payload: ClaudeResponse = serde_json::from_str(text).map_err(|source| {
        BackendError::Decode {
            provider: PROVIDER,
            source,
        }
    })?;
    let blocks = payload
        .content
        .into_iter()
        .filter(|block| block.kind == "text")
        .filter_map(|block| block.text)
        .collect::<Vec<_>>();
    if blocks.is_empty() {
        return Err(BackendError::EmptyReply { provider: PROVIDER });
    }
    let content = blocks.join("\n");
    debug!(
        response_length = content.len(),
        output_tokens = payload.usage.and_then(|usage| usage.output_tokens),
        "received Claude response"
    );
    Ok(content)
}

#[derive(Debug, Deserialize)]
struct ClaudeResponse {
    #[serde(default)]
    content: Vec<ClaudeContent>,
    usage: Option<ClaudeUsage>,
}

#[derive(Debug, Deserialize)]
struct ClaudeContent {
    #[serde(rename = "type")]
    kind: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ClaudeUsage {
    output_tokens: Option<u64>,
}

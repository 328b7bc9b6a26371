use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::{
    CompletionFuture, CompletionRequest, MAX_TOKENS, SYSTEM_PROMPT, TEMPERATURE,
    TranslationClient, extract_api_error, send_json,
};
use crate::error::BackendError;

const PROVIDER: &str = "OpenAI";
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub(crate) const DEFAULT_MODEL: &str = "gpt-4o-mini";

#[derive(Debug, Clone)]
pub struct OpenAI {
    key: String,
    client: reqwest::Client,
}

impl OpenAI {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            client: reqwest::Client::new(),
        }
    }
}

impl TranslationClient for OpenAI {
    fn complete(&self, request: CompletionRequest) -> CompletionFuture {
        let provider = self.clone();
        Box::pin(async move {
            let url = format!("{}/chat/completions", base_url());
            let body = json!({
                "model": request.model,
                "messages": [
                    {"role": "system", "content": SYSTEM_PROMPT},
                    {"role": "user", "content": request.prompt}
                ],
                "max_tokens": MAX_TOKENS,
                "temperature": TEMPERATURE
            });
            let text = send_json(
                PROVIDER,
                provider
                    .client
                    .post(&url)
                    .bearer_auth(&provider.key)
                    .json(&body),
                extract_api_error,
            )
            .await?;
            extract_reply(&text)
        })
    }
}

fn base_url() -> String {
    std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string())
}

fn extract_reply(text: &str) -> Result<String, BackendError> {
    let payload: ChatResponse = serde_json::from_str(text).map_err(|source| {
        BackendError::Decode {
            provider: PROVIDER,
            source,
        }
    })?;
    let choice = payload
        .choices
        .into_iter()
        .next()
        .ok_or(BackendError::EmptyReply { provider: PROVIDER })?;
    let content = choice.message.content.unwrap_or_default();
    debug!(
        response_length = content.len(),
        usage_tokens = payload.usage.and_then(|usage| usage.total_tokens),
        "received OpenAI response"
    );
    Ok(content)
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    total_tokens: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_first_choice_content() {
        let payload = include_str!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/tests/fixtures/openai_chat_response.json"
        ));
        let reply = extract_reply(payload).expect("reply");
        assert_eq!(reply, "greeting: \"How far\"\nfarewell: \"I dey go\"");
    }

    #[test]
    fn zero_choices_is_an_error() {
        let err = extract_reply(r#"{"choices": []}"#).unwrap_err();
        assert!(matches!(err, BackendError::EmptyReply { .. }));
    }

    #[test]
    fn invalid_json_is_a_decode_error() {
        let err = extract_reply("<html>").unwrap_err();
        assert!(matches!(err, BackendError::Decode { .. }));
    }
}

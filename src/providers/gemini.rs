use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::{
    CompletionFuture, CompletionRequest, MAX_TOKENS, SYSTEM_PROMPT, TEMPERATURE,
    TranslationClient, extract_api_error, send_json,
};
use crate::error::BackendError;

const PROVIDER: &str = "Gemini";
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub(crate) const DEFAULT_MODEL: &str = "gemini-1.5-flash";

#[derive(Debug, Clone)]
pub struct Gemini {
    key: String,
    client: reqwest::Client,
}

impl Gemini {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            client: reqwest::Client::new(),
        }
    }
}

impl TranslationClient for Gemini {
    fn complete(&self, request: CompletionRequest) -> CompletionFuture {
        let provider = self.clone();
        Box::pin(async move {
            let url = format!("{}/models/{}:generateContent", base_url(), request.model);
            let body = json!({
                "systemInstruction": {"parts": [{"text": SYSTEM_PROMPT}]},
                "contents": [
                    {"role": "user", "parts": [{"text": request.prompt}]}
                ],
                "generationConfig": {
                    "maxOutputTokens": MAX_TOKENS,
                    "temperature": TEMPERATURE
                }
            });
            let text = send_json(
                PROVIDER,
                provider
                    .client
                    .post(&url)
                    .header("x-goog-api-key", &provider.key)
                    .json(&body),
                extract_api_error,
            )
            .await?;
            extract_reply(&text)
        })
    }
}

fn base_url() -> String {
    std::env::var("GEMINI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string())
}

fn extract_reply(text: &str) -> Result<String, BackendError> {
    let payload: GeminiResponse = serde_json::from_str(text).map_err(|source| {
        BackendError::Decode {
            provider: PROVIDER,
            source,
        }
    })?;
    let content = payload
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .ok_or(BackendError::EmptyReply { provider: PROVIDER })?;
    let reply = content
        .parts
        .into_iter()
        .filter_map(|part| part.text)
        .collect::<Vec<_>>()
        .join("\n");
    debug!(
        response_length = reply.len(),
        usage_tokens = payload
            .usage_metadata
            .and_then(|usage| usage.total_token_count),
        "received Gemini response"
    );
    Ok(reply)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    usage_metadata: Option<GeminiUsage>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Deserialize)]
struct GeminiPart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsage {
    total_token_count: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_candidate_text() {
        let payload = include_str!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/tests/fixtures/gemini_generate_response.json"
        ));
        let reply = extract_reply(payload).expect("reply");
        assert_eq!(reply, "greeting: \"Hola\"\nfarewell: \"Adiós\"");
    }

    #[test]
    fn parts_are_joined_line_by_line() {
        let payload = r#"{"candidates": [{"content": {"parts": [
            {"text": "greeting: \"Hola\""},
            {"text": "farewell: \"Adiós\""}
        ]}}]}"#;
        let reply = extract_reply(payload).expect("reply");
        assert_eq!(reply, "greeting: \"Hola\"\nfarewell: \"Adiós\"");
    }

    #[test]
    fn missing_candidates_is_an_error() {
        let err = extract_reply(r#"{"candidates": []}"#).unwrap_err();
        assert!(matches!(err, BackendError::EmptyReply { .. }));
    }
}

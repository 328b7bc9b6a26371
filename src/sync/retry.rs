use std::collections::BTreeMap;
use std::time::Duration;

use tokio::time::{sleep, timeout};
use tracing::{info, warn};

use super::parse::parse_translations;
use crate::error::{AttemptError, BackendError, RetryExhausted};
use crate::logging::Timer;
use crate::providers::{CompletionRequest, TranslationClient};

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
pub const BACKOFF_BASE: Duration = Duration::from_secs(1);
const MAX_BACKOFF_EXPONENT: u32 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_base: Duration,
    pub request_timeout: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            backoff_base: BACKOFF_BASE,
            request_timeout: REQUEST_TIMEOUT,
        }
    }

    /// Wait inserted before `attempt` (1-based): none for the first, then
    /// `base * 2^(attempt - 1)`.
    pub fn delay_before(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            return Duration::ZERO;
        }
        let exponent = (attempt - 1).min(MAX_BACKOFF_EXPONENT);
        self.backoff_base.saturating_mul(1u32 << exponent)
    }
}

/// Runs one batch request until it parses or the attempts run out.
///
/// The same request is resent on every attempt. Backend failures, timeouts and
/// unparsable replies are all retried.
pub async fn translate_batch(
    client: &dyn TranslationClient,
    request: &CompletionRequest,
    policy: &RetryPolicy,
    locale: &str,
    batch: usize,
) -> Result<BTreeMap<String, String>, RetryExhausted> {
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match attempt_once(client, request.clone(), policy.request_timeout).await {
            Ok(translations) => {
                info!(
                    locale,
                    batch,
                    attempt,
                    translations_count = translations.len(),
                    "translation successful"
                );
                return Ok(translations);
            }
            Err(err) => {
                warn!(locale, batch, attempt, error = %err, "translation attempt failed");
                if attempt >= max_attempts {
                    return Err(RetryExhausted {
                        attempts: attempt,
                        last: err,
                    });
                }
            }
        }

        attempt += 1;
        let wait = policy.delay_before(attempt);
        info!(
            locale,
            batch,
            attempt,
            backoff_seconds = wait.as_secs_f64(),
            "retrying translation"
        );
        sleep(wait).await;
    }
}

async fn attempt_once(
    client: &dyn TranslationClient,
    request: CompletionRequest,
    deadline: Duration,
) -> Result<BTreeMap<String, String>, AttemptError> {
    let _timer = Timer::start("backend_call");
    let reply = timeout(deadline, client.complete(request)).await;
    let reply = reply.map_err(|_| BackendError::Timeout(deadline))??;
    Ok(parse_translations(&reply)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{ScriptedClient, Step};
    use tokio::time::Instant;

    fn request() -> CompletionRequest {
        CompletionRequest {
            prompt: "prompt".to_string(),
            model: "test-model".to_string(),
        }
    }

    #[test]
    fn backoff_doubles_from_two_seconds() {
        let policy = RetryPolicy::new(5);
        assert_eq!(policy.delay_before(1), Duration::ZERO);
        assert_eq!(policy.delay_before(2), Duration::from_secs(2));
        assert_eq!(policy.delay_before(3), Duration::from_secs(4));
        assert_eq!(policy.delay_before(4), Duration::from_secs(8));
    }

    #[tokio::test(start_paused = true)]
    async fn fails_once_then_succeeds() {
        let client = ScriptedClient::new(vec![
            Step::fail("temporary outage"),
            Step::reply("a: \"A\""),
        ]);
        let started = Instant::now();

        let translations = translate_batch(&client, &request(), &RetryPolicy::new(2), "fr", 1)
            .await
            .expect("translations");

        assert_eq!(client.calls(), 2);
        assert_eq!(translations["a"], "A");
        assert_eq!(started.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn single_attempt_reports_one_attempt() {
        let client = ScriptedClient::always(Step::fail("down"));

        let err = translate_batch(&client, &request(), &RetryPolicy::new(1), "fr", 1)
            .await
            .unwrap_err();

        assert_eq!(client.calls(), 1);
        assert_eq!(err.attempts, 1);
        assert!(err.to_string().contains("after 1 attempts"));
    }

    #[tokio::test(start_paused = true)]
    async fn exhausts_with_growing_backoff() {
        let client = ScriptedClient::always(Step::fail("down"));
        let started = Instant::now();

        let err = translate_batch(&client, &request(), &RetryPolicy::new(3), "fr", 1)
            .await
            .unwrap_err();

        assert_eq!(client.calls(), 3);
        assert_eq!(err.attempts, 3);
        assert_eq!(started.elapsed(), Duration::from_secs(2 + 4));
    }

    #[tokio::test(start_paused = true)]
    async fn unparsable_reply_is_retried() {
        let client = ScriptedClient::new(vec![
            Step::reply("I could not translate that."),
            Step::reply("a: \"A\""),
        ]);

        let translations = translate_batch(&client, &request(), &RetryPolicy::new(3), "fr", 1)
            .await
            .expect("translations");

        assert_eq!(client.calls(), 2);
        assert_eq!(translations.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn parse_failure_is_kept_as_last_error() {
        let client = ScriptedClient::always(Step::reply("no pairs here"));

        let err = translate_batch(&client, &request(), &RetryPolicy::new(2), "fr", 1)
            .await
            .unwrap_err();

        assert!(matches!(err.last, AttemptError::Parse(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_backend_times_out_and_is_retried() {
        let client = ScriptedClient::new(vec![Step::Hang, Step::reply("a: \"A\"")]);
        let policy = RetryPolicy {
            request_timeout: Duration::from_secs(5),
            ..RetryPolicy::new(2)
        };
        let started = Instant::now();

        let translations = translate_batch(&client, &request(), &policy, "fr", 1)
            .await
            .expect("translations");

        assert_eq!(translations["a"], "A");
        assert_eq!(started.elapsed(), Duration::from_secs(5 + 2));
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_error_names_the_deadline() {
        let client = ScriptedClient::always(Step::Hang);

        let err = translate_batch(&client, &request(), &RetryPolicy::new(1), "fr", 1)
            .await
            .unwrap_err();

        assert!(matches!(
            err.last,
            AttemptError::Backend(BackendError::Timeout(deadline)) if deadline == REQUEST_TIMEOUT
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn sends_the_same_prompt_every_attempt() {
        let client = ScriptedClient::new(vec![Step::fail("one"), Step::reply("a: \"A\"")]);

        translate_batch(&client, &request(), &RetryPolicy::new(2), "fr", 1)
            .await
            .expect("translations");

        let requests = client.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0], requests[1]);
        assert_eq!(requests[0].model, "test-model");
    }
}

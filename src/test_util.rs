use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::BackendError;
use crate::messages::Message;
use crate::providers::{CompletionFuture, CompletionRequest, TranslationClient};

#[derive(Debug, Clone)]
pub(crate) enum Step {
    Reply(String),
    Fail(String),
    Hang,
}

impl Step {
    pub(crate) fn reply(text: &str) -> Self {
        Step::Reply(text.to_string())
    }

    pub(crate) fn fail(message: &str) -> Self {
        Step::Fail(message.to_string())
    }
}

/// Plays back a fixed sequence of backend outcomes and records every request.
pub(crate) struct ScriptedClient {
    steps: Mutex<VecDeque<Step>>,
    fallback: Option<Step>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedClient {
    pub(crate) fn new(steps: Vec<Step>) -> Self {
        Self {
            steps: Mutex::new(steps.into()),
            fallback: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn always(step: Step) -> Self {
        Self {
            steps: Mutex::new(VecDeque::new()),
            fallback: Some(step),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.requests.lock().expect("requests lock").len()
    }

    pub(crate) fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().expect("requests lock").clone()
    }
}

impl TranslationClient for ScriptedClient {
    fn complete(&self, request: CompletionRequest) -> CompletionFuture {
        self.requests.lock().expect("requests lock").push(request);
        let step = self
            .steps
            .lock()
            .expect("steps lock")
            .pop_front()
            .or_else(|| self.fallback.clone())
            .unwrap_or_else(|| Step::fail("script exhausted"));
        Box::pin(async move {
            match step {
                Step::Reply(text) => Ok(text),
                Step::Fail(message) => Err(BackendError::other(message)),
                Step::Hang => std::future::pending().await,
            }
        })
    }
}

pub(crate) fn write_messages(dir: &Path, entries: &[(&str, &str)]) -> PathBuf {
    let messages = entries
        .iter()
        .map(|(key, default)| Message::new(*key, *default))
        .collect::<Vec<_>>();
    let path = dir.join("js/dist/messages.json");
    fs::create_dir_all(path.parent().expect("messages dir")).expect("create messages dir");
    fs::write(
        &path,
        serde_json::to_string(&messages).expect("serialize messages"),
    )
    .expect("write messages");
    path
}

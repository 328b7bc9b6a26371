use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::StoreError;

pub const DEFAULT_MESSAGES_PATH: &str = "js/dist/messages.json";

/// One extracted UI string, as written by the extraction build step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub key: String,
    pub default: String,
    #[serde(default)]
    pub file: String,
    #[serde(default)]
    pub loc: Location,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub line: u32,
    pub column: u32,
}

impl Message {
    pub fn new(key: impl Into<String>, default: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            default: default.into(),
            file: String::new(),
            loc: Location::default(),
        }
    }
}

/// Loads the canonical message list in file order.
pub fn load_messages(path: &Path) -> Result<Vec<Message>, StoreError> {
    let content = fs::read_to_string(path).map_err(|source| StoreError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| StoreError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

use std::collections::BTreeMap;

use crate::error::ParseError;

/// Collects `KEY: "value"` lines from a free-form reply.
///
/// Later lines win over earlier ones with the same key. Keys are not checked
/// against the batch that was requested.
pub fn parse_translations(reply: &str) -> Result<BTreeMap<String, String>, ParseError> {
    let mut translations = BTreeMap::new();
    for line in reply.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim();
        let value = strip_quotes(value.trim());
        if key.is_empty() || value.is_empty() {
            continue;
        }
        translations.insert(key.to_string(), value.to_string());
    }

    if translations.is_empty() {
        return Err(ParseError {
            raw: reply.to_string(),
        });
    }
    Ok(translations)
}

fn strip_quotes(value: &str) -> &str {
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_quoted_lines() {
        let parsed = parse_translations("a: \"A\"\nb: \"B\"").expect("parsed");
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed["a"], "A");
        assert_eq!(parsed["b"], "B");
    }

    #[test]
    fn tolerates_noise_and_unquoted_values() {
        let reply = "Here are your translations:\n\n  greeting :  How far  \r\nfarewell: \"I dey go\"\n";
        let parsed = parse_translations(reply).expect("parsed");
        assert_eq!(parsed.get("greeting").map(String::as_str), Some("How far"));
        assert_eq!(parsed.get("farewell").map(String::as_str), Some("I dey go"));
        // The preamble has an empty value after its colon and is dropped.
        assert!(!parsed.contains_key("Here are your translations"));
    }

    #[test]
    fn splits_on_first_colon_only() {
        let parsed = parse_translations("time: \"at 10:30\"").expect("parsed");
        assert_eq!(parsed["time"], "at 10:30");
    }

    #[test]
    fn strips_exactly_one_pair_of_quotes() {
        let parsed = parse_translations("a: \"\"quoted\"\"").expect("parsed");
        assert_eq!(parsed["a"], "\"quoted\"");
    }

    #[test]
    fn empty_values_and_keys_are_dropped() {
        let parsed = parse_translations("a: \"\"\n: \"orphan\"\nb: \"B\"").expect("parsed");
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed["b"], "B");
    }

    #[test]
    fn last_duplicate_wins() {
        let parsed = parse_translations("a: \"first\"\na: \"second\"").expect("parsed");
        assert_eq!(parsed["a"], "second");
    }

    #[test]
    fn reply_without_pairs_is_a_parse_error() {
        let err = parse_translations("Sorry, I cannot help with that.\n\n").unwrap_err();
        assert_eq!(err.raw, "Sorry, I cannot help with that.\n\n");
        assert!(err.to_string().contains("Sorry, I cannot help"));
        assert!(parse_translations("").is_err());
    }
}

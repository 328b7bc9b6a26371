use std::fmt::Write;

use crate::messages::Message;

/// Renders the user prompt for one batch.
///
/// Defaults are substituted literally; quotes inside them are not escaped.
pub fn build_translation_prompt(batch: &[&Message], locale: &str) -> String {
    let mut prompt = format!(
        "Translate these UI strings into {} preserving placeholders and maintaining the same tone and context. Return only the translations in the format KEY: \"Translation\":\n\n",
        locale
    );
    for message in batch {
        let _ = writeln!(prompt, "{}: \"{}\"", message.key, message.default);
    }
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_names_locale_and_lists_messages() {
        let greeting = Message::new("greeting", "Hello, {name}!");
        let farewell = Message::new("farewell", "Goodbye");
        let prompt = build_translation_prompt(&[&greeting, &farewell], "pidgin");

        assert!(prompt.contains("into pidgin"));
        assert!(prompt.contains("greeting: \"Hello, {name}!\"\n"));
        assert!(prompt.contains("farewell: \"Goodbye\"\n"));
        let greeting_at = prompt.find("greeting:").expect("greeting line");
        let farewell_at = prompt.find("farewell:").expect("farewell line");
        assert!(greeting_at < farewell_at);
    }

    #[test]
    fn quotes_are_not_escaped() {
        let quoted = Message::new("quote", "Say \"hi\"");
        let prompt = build_translation_prompt(&[&quoted], "fr");
        assert!(prompt.ends_with("quote: \"Say \"hi\"\"\n"));
    }
}

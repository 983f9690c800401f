//! Sentence and word splitting.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Terminal punctuation, optional closing quotes/brackets, then whitespace
    static ref SENTENCE_END: Regex =
        Regex::new(r#"[.!?…]+["'”’)\]]*\s+"#).expect("Invalid sentence regex");
    static ref WORD: Regex = Regex::new(r"[\p{L}\p{N}']+").expect("Invalid word regex");
}

/// Splits text into trimmed, non-empty sentences.
///
/// Text without terminal punctuation is a single sentence.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut start = 0;

    for m in SENTENCE_END.find_iter(text) {
        let sentence = text[start..m.end()].trim();
        if !sentence.is_empty() {
            sentences.push(sentence.to_string());
        }
        start = m.end();
    }

    let tail = text[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail.to_string());
    }

    sentences
}

/// Lowercase word tokens; punctuation is dropped.
pub fn words(text: &str) -> Vec<String> {
    WORD.find_iter(text)
        .map(|m| m.as_str().trim_matches('\'').to_lowercase())
        .filter(|w| !w.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_basic() {
        let s = split_sentences("I love this. Do you? Absolutely!");
        assert_eq!(s, vec!["I love this.", "Do you?", "Absolutely!"]);
    }

    #[test]
    fn test_no_terminator_is_one_sentence() {
        assert_eq!(split_sentences("  just talking here  "), vec!["just talking here"]);
    }

    #[test]
    fn test_quotes_and_ellipsis() {
        let s = split_sentences("She said \"stop.\" Then… silence. 3.14 is pi");
        assert_eq!(s, vec!["She said \"stop.\"", "Then…", "silence.", "3.14 is pi"]);
    }

    #[test]
    fn test_words() {
        assert_eq!(words("Don't PANIC, it's fine!"), vec!["don't", "panic", "it's", "fine"]);
        assert!(words("... !!").is_empty());
    }
}

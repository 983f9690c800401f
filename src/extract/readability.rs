//! Flesch-Kincaid grade with a vowel-group syllable heuristic.

use super::text::{split_sentences, words};

/// Grade level of `text`; 0.0 for text without words.
pub fn flesch_kincaid_grade(text: &str) -> f64 {
    let tokens = words(text);
    if tokens.is_empty() {
        return 0.0;
    }

    let sentence_count = split_sentences(text).len().max(1) as f64;
    let word_count = tokens.len() as f64;
    let syllables: usize = tokens.iter().map(|w| count_syllables(w)).sum();

    0.39 * (word_count / sentence_count) + 11.8 * (syllables as f64 / word_count) - 15.59
}

/// Counts vowel groups, dropping a silent trailing `e`. Never below one.
pub fn count_syllables(word: &str) -> usize {
    let word = word.to_lowercase();
    let chars: Vec<char> = word.chars().filter(char::is_ascii_alphabetic).collect();
    if chars.is_empty() {
        return 1;
    }

    let is_vowel = |c: char| matches!(c, 'a' | 'e' | 'i' | 'o' | 'u' | 'y');

    let mut count = 0;
    let mut prev_vowel = false;
    for &c in &chars {
        let vowel = is_vowel(c);
        if vowel && !prev_vowel {
            count += 1;
        }
        prev_vowel = vowel;
    }

    let n = chars.len();
    if n > 2 && chars[n - 1] == 'e' && chars[n - 2] != 'l' && !is_vowel(chars[n - 2]) && count > 1 {
        count -= 1;
    }

    count.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syllables() {
        assert_eq!(count_syllables("cat"), 1);
        assert_eq!(count_syllables("happy"), 2);
        assert_eq!(count_syllables("beautiful"), 3);
        assert_eq!(count_syllables("make"), 1);
        assert_eq!(count_syllables("table"), 2);
        assert_eq!(count_syllables("123"), 1);
    }

    #[test]
    fn test_grade_orders_texts() {
        let simple = flesch_kincaid_grade("The cat sat. The dog ran.");
        let dense = flesch_kincaid_grade(
            "Institutional accountability necessitates comprehensive organizational transparency regarding administrative responsibilities.",
        );
        assert!(simple < dense);
        assert!(simple < 2.0);
        assert!(dense > 15.0);
    }

    #[test]
    fn test_empty_text() {
        assert_eq!(flesch_kincaid_grade("   "), 0.0);
    }
}

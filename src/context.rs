//! Rolling word buffer feeding the slow estimator.

use std::collections::VecDeque;

/// Bounded FIFO of recent transcript words; oldest words are evicted first.
#[derive(Debug, Clone)]
pub struct ContextBuffer {
    words: VecDeque<String>,
    capacity: usize,
}

impl ContextBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            words: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends the whitespace-separated words of `text`.
    pub fn extend_from_text(&mut self, text: &str) {
        for word in text.split_whitespace() {
            if self.words.len() == self.capacity {
                self.words.pop_front();
            }
            self.words.push_back(word.to_string());
        }
    }

    /// Last `max_words` words joined by single spaces.
    pub fn recent_text(&self, max_words: usize) -> String {
        let skip = self.words.len().saturating_sub(max_words);
        self.words
            .iter()
            .skip(skip)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evicts_oldest() {
        let mut buf = ContextBuffer::new(3);
        buf.extend_from_text("one two");
        buf.extend_from_text("three   four\nfive");
        assert_eq!(buf.len(), 3);
        assert_eq!(buf.recent_text(10), "three four five");
    }

    #[test]
    fn test_trailing_window() {
        let mut buf = ContextBuffer::new(200);
        let text: Vec<String> = (0..150).map(|i| format!("w{i}")).collect();
        buf.extend_from_text(&text.join(" "));

        let window = buf.recent_text(100);
        let words: Vec<&str> = window.split(' ').collect();
        assert_eq!(words.len(), 100);
        assert_eq!(words[0], "w50");
        assert_eq!(words[99], "w149");
    }

    #[test]
    fn test_empty() {
        let buf = ContextBuffer::new(5);
        assert!(buf.is_empty());
        assert_eq!(buf.recent_text(100), "");
    }
}

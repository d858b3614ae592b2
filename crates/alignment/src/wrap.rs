//! Line wrapping for cue text.
//!
//! Two-line cues pick the most balanced break, nudged toward breaking after
//! punctuation. Longer cues fill lines greedily.

use diacap_caption_model::settings::RechunkConfig;
use diacap_caption_model::span::char_len;

use crate::text::{ends_clause, ends_sentence};

/// Per-line limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WrapLimits {
    pub max_line_chars: usize,
    pub max_lines: usize,
    pub max_words_per_line: Option<usize>,
}

impl WrapLimits {
    pub fn from_config(config: &RechunkConfig) -> Self {
        Self {
            max_line_chars: config.max_line_chars,
            max_lines: config.max_lines_per_cue,
            max_words_per_line: config.max_words_per_line,
        }
    }

    fn line_fits(&self, words: &[&str]) -> bool {
        let chars =
            words.iter().map(|w| char_len(w)).sum::<usize>() + words.len().saturating_sub(1);
        chars <= self.max_line_chars
            && self
                .max_words_per_line
                .map_or(true, |max| words.len() <= max)
    }
}

/// Wrap `words` within `limits`, or `None` if they cannot fit.
pub fn wrap(words: &[&str], limits: &WrapLimits) -> Option<Vec<String>> {
    if words.is_empty() {
        return Some(Vec::new());
    }
    if limits.line_fits(words) {
        return Some(vec![words.join(" ")]);
    }
    match limits.max_lines {
        0 | 1 => None,
        2 => balanced_two_lines(words, limits),
        max_lines => {
            let lines = greedy_fill(words, limits);
            let fits = lines.len() <= max_lines && lines.iter().all(|line| limits.line_fits(line));
            fits.then(|| lines.iter().map(|line| line.join(" ")).collect())
        }
    }
}

/// Wrap `words`, exceeding the line count or width when they cannot fit.
pub fn wrap_lenient(words: &[&str], limits: &WrapLimits) -> Vec<String> {
    wrap(words, limits).unwrap_or_else(|| {
        greedy_fill(words, limits)
            .iter()
            .map(|line| line.join(" "))
            .collect()
    })
}

fn balanced_two_lines(words: &[&str], limits: &WrapLimits) -> Option<Vec<String>> {
    let mut best: Option<(i64, usize)> = None;
    for k in 1..words.len() {
        let (first, second) = words.split_at(k);
        if !limits.line_fits(first) || !limits.line_fits(second) {
            continue;
        }
        let first_text = first.join(" ");
        let second_text = second.join(" ");
        let balance = char_len(&first_text).abs_diff(char_len(&second_text)) as i64;

        let mut score = balance;
        if ends_sentence(&first_text) {
            score -= 2;
        } else {
            score += 3;
        }
        if ends_clause(&first_text) {
            score -= 1;
        }

        if best.map_or(true, |(best_score, _)| score < best_score) {
            best = Some((score, k));
        }
    }
    best.map(|(_, k)| vec![words[..k].join(" "), words[k..].join(" ")])
}

fn greedy_fill<'a>(words: &[&'a str], limits: &WrapLimits) -> Vec<Vec<&'a str>> {
    let mut lines: Vec<Vec<&'a str>> = Vec::new();
    let mut current: Vec<&'a str> = Vec::new();
    for &word in words {
        current.push(word);
        if current.len() > 1 && !limits.line_fits(&current) {
            current.pop();
            lines.push(std::mem::take(&mut current));
            current.push(word);
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits(max_line_chars: usize, max_lines: usize) -> WrapLimits {
        WrapLimits {
            max_line_chars,
            max_lines,
            max_words_per_line: None,
        }
    }

    fn words(text: &str) -> Vec<&str> {
        text.split_whitespace().collect()
    }

    #[test]
    fn test_single_line_when_it_fits() {
        let lines = wrap(&words("Hi there"), &limits(42, 2)).unwrap();
        assert_eq!(lines, vec!["Hi there"]);
    }

    #[test]
    fn test_two_lines_prefer_sentence_break() {
        let lines = wrap(&words("We agree. Now let us go"), &limits(15, 2)).unwrap();
        assert_eq!(lines, vec!["We agree.", "Now let us go"]);
    }

    #[test]
    fn test_two_lines_balance_without_punctuation() {
        let lines = wrap(&words("one two three four five six"), &limits(16, 2)).unwrap();
        assert_eq!(lines, vec!["one two three", "four five six"]);
    }

    #[test]
    fn test_word_limit_forces_break() {
        let limits = WrapLimits {
            max_line_chars: 100,
            max_lines: 2,
            max_words_per_line: Some(3),
        };
        let lines = wrap(&words("a b c d e f"), &limits).unwrap();
        assert_eq!(lines, vec!["a b c", "d e f"]);
        assert!(wrap(&words("a b c d e f g"), &limits).is_none());
    }

    #[test]
    fn test_greedy_fill_for_three_lines() {
        let lines = wrap(&words("aaa bbb ccc ddd eee"), &limits(7, 3)).unwrap();
        assert_eq!(lines, vec!["aaa bbb", "ccc ddd", "eee"]);
        assert!(wrap(&words("aaa bbb ccc ddd eee fff ggg"), &limits(7, 3)).is_none());
    }

    #[test]
    fn test_lenient_never_drops_words() {
        let lines = wrap_lenient(&words("supercalifragilistic word"), &limits(8, 1));
        assert_eq!(lines, vec!["supercalifragilistic", "word"]);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(wrap(&[], &limits(10, 2)), Some(Vec::new()));
    }
}

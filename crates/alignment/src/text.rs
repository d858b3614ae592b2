//! Punctuation and token classification used when choosing cue breaks.

use std::sync::LazyLock;

use regex::Regex;

static SENTENCE_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?…]+$").expect("sentence-end pattern is valid"));

static CLAUSE_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[,:;—-]$").expect("clause-end pattern is valid"));

static ABBREVIATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(mr|mrs|ms|dr|st|sr|jr|vs|etc|e\.g|i\.e|u\.s)\.?$")
        .expect("abbreviation pattern is valid")
});

static NUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\$?\d[\d,.\-/]*%?$").expect("numeric pattern is valid"));

/// Text ends with sentence punctuation (`.`, `!`, `?`, `…`).
pub fn ends_sentence(text: &str) -> bool {
    SENTENCE_END.is_match(text.trim_end())
}

/// Text ends with clause punctuation (`,`, `:`, `;`, dash).
pub fn ends_clause(text: &str) -> bool {
    CLAUSE_END.is_match(text.trim_end())
}

/// Breaking after this text would strand an abbreviation or split a number
/// (`Dr.`, `e.g.`, `$3.5`, `12%`).
pub fn is_bad_split_token(text: &str) -> bool {
    let Some(last) = text.split_whitespace().last() else {
        return false;
    };
    ABBREVIATION.is_match(last) || NUMERIC.is_match(last)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentence_and_clause_endings() {
        assert!(ends_sentence("Done."));
        assert!(ends_sentence("really?! "));
        assert!(ends_sentence("and then…"));
        assert!(!ends_sentence("well,"));
        assert!(ends_clause("well,"));
        assert!(ends_clause("first:"));
        assert!(!ends_clause("word"));
    }

    #[test]
    fn test_bad_split_tokens() {
        assert!(is_bad_split_token("Dr."));
        assert!(is_bad_split_token("see e.g."));
        assert!(is_bad_split_token("U.S."));
        assert!(is_bad_split_token("3.5%"));
        assert!(is_bad_split_token("$1,200."));
        assert!(!is_bad_split_token("Done."));
        assert!(!is_bad_split_token(""));
    }
}

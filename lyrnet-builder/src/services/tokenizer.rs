//! Word tokenizer for normalized lyrics
//!
//! Unicode word segmentation followed by Penn Treebank style clitic
//! splitting, so "don't" becomes ["do", "n't"] and "gonna" becomes
//! ["gon", "na"]. A word-initial apostrophe stays attached ("'cause",
//! "'em"). Tokens are lowercased; punctuation yields none.

use unicode_segmentation::UnicodeSegmentation;

/// Suffix clitics split off their host word
const CLITIC_SUFFIXES: &[&str] = &["n't", "'s", "'re", "'ve", "'ll", "'d", "'m"];

/// Whole-word contractions and their parts
const SPLIT_CONTRACTIONS: &[(&str, &[&str])] = &[
    ("cannot", &["can", "not"]),
    ("d'ye", &["d", "'ye"]),
    ("gimme", &["gim", "me"]),
    ("gonna", &["gon", "na"]),
    ("gotta", &["got", "ta"]),
    ("lemme", &["lem", "me"]),
    ("more'n", &["more", "'n"]),
    ("wanna", &["wan", "na"]),
];

/// Split text into word tokens
pub fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    for (start, word) in text.unicode_word_indices() {
        let mut word = word.replace('\u{2019}', "'");
        if has_leading_apostrophe(text, start) {
            word.insert(0, '\'');
        }
        split_word(&word, &mut tokens);
    }
    tokens
}

/// Apostrophe directly before `start` that does not follow a letter or digit
fn has_leading_apostrophe(text: &str, start: usize) -> bool {
    let mut before = text[..start].chars().rev();
    matches!(before.next(), Some('\'' | '\u{2019}'))
        && !before.next().is_some_and(char::is_alphanumeric)
}

fn split_word(word: &str, tokens: &mut Vec<String>) {
    let lower = word.to_lowercase();

    if let Some((_, parts)) = SPLIT_CONTRACTIONS.iter().find(|(w, _)| *w == lower) {
        tokens.extend(parts.iter().map(|p| p.to_string()));
        return;
    }

    for suffix in CLITIC_SUFFIXES {
        if lower.len() > suffix.len() && lower.ends_with(suffix) {
            let split_at = lower.len() - suffix.len();
            tokens.push(lower[..split_at].to_string());
            tokens.push(lower[split_at..].to_string());
            return;
        }
    }

    tokens.push(lower);
}

//! FILENAME: chart-engine/src/shapes/word_cloud.rs
//! PURPOSE: Word frequencies of one text dimension.

use crate::view::WordCount;
use engine::{Record, Value};
use once_cell::sync::Lazy;
use regex::Regex;
use rustc_hash::FxHashMap;

/// Number of words returned.
pub const MAX_WORDS: usize = 100;

const STOP_WORDS: [&str; 23] = [
    "the", "a", "an", "and", "or", "in", "of", "to", "is", "it", "for", "with", "on", "as", "by",
    "that", "this", "i", "you", "he", "she", "we", "they",
];

static PUNCTUATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.,/#!$%^&*;:{}=\-_`~()]").expect("punctuation class is a valid pattern"));

/// Counts words in `text_field`: lower-cased, punctuation stripped, split on
/// whitespace, stop-words dropped. Most frequent first; equal counts keep the
/// order in which the words were first seen.
pub fn build_word_cloud(records: &[Record], text_field: &str) -> Vec<WordCount> {
    let mut counts: FxHashMap<String, usize> = FxHashMap::default();
    let mut order: Vec<String> = Vec::new();

    for record in records {
        let Value::Text(text) = record.value(text_field) else {
            continue;
        };
        let cleaned = PUNCTUATION.replace_all(&text.to_lowercase(), "").into_owned();
        for word in cleaned.split_whitespace() {
            if STOP_WORDS.contains(&word) {
                continue;
            }
            match counts.get_mut(word) {
                Some(count) => *count += 1,
                None => {
                    counts.insert(word.to_string(), 1);
                    order.push(word.to_string());
                }
            }
        }
    }

    let mut words: Vec<WordCount> = order
        .into_iter()
        .map(|name| {
            let value = counts.get(&name).copied().unwrap_or(0);
            WordCount { name, value }
        })
        .collect();
    words.sort_by(|a, b| b.value.cmp(&a.value));
    words.truncate(MAX_WORDS);
    words
}

use std::collections::HashSet;

/// Shortest word that can score.
pub const MIN_WORD_LENGTH: usize = 3;

pub struct ScoringEngine;

impl ScoringEngine {
    /// Points for a word of `length` letters. Clients run the same table for
    /// optimistic display, so any change here must ship to both sides.
    pub fn score_for_length(length: usize) -> i32 {
        match length {
            0..=2 => 0,
            3 => 100,
            4 => 300,
            5 => 1200,
            6 => 2000,
            n => 2000 + 400 * (n as i32 - 6),
        }
    }

    /// Score a single word by its letter count.
    pub fn score_word(word: &str) -> i32 {
        Self::score_for_length(word.trim().chars().count())
    }

    /// Sum over distinct words, case-insensitive. Used to recompute totals
    /// rather than trusting a client-claimed figure.
    pub fn total_for_words<I, S>(words: I) -> i32
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        words
            .into_iter()
            .map(|w| w.as_ref().trim().to_lowercase())
            .filter(|w| seen.insert(w.clone()))
            .map(|w| Self::score_word(&w))
            .sum()
    }
}

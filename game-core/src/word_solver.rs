use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::{MIN_WORD_LENGTH, WordList, normalize_word};

/// Base words longer than this are not expanded; 2^20 subsets is already
/// far beyond any playable round.
pub const MAX_BASE_LETTERS: usize = 20;

#[derive(Debug, thiserror::Error)]
pub enum DictionaryError {
    #[error("dictionary unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictionaryEntry {
    pub word: String,
    pub length: usize,
}

/// Backing dictionary, indexed by canonical (sorted-letter) form.
#[async_trait]
pub trait DictionaryProvider: Send + Sync {
    async fn lookup_by_canonical_forms(
        &self,
        forms: &HashSet<String>,
    ) -> Result<Vec<DictionaryEntry>, DictionaryError>;

    /// A random word of `length` letters other than `exclude`.
    async fn random_word(
        &self,
        length: usize,
        exclude: Option<&str>,
    ) -> Result<Option<String>, DictionaryError>;
}

/// Sorted lowercase letters of `word`. Anagrams share a canonical form.
pub fn canonical_form(word: &str) -> String {
    let mut letters: Vec<char> = word.trim().to_lowercase().chars().collect();
    letters.sort_unstable();
    letters.into_iter().collect()
}

/// True when every letter of `word` is available in `letters`, counting
/// repeats.
pub fn is_sub_multiset(word: &str, letters: &str) -> bool {
    let mut available: HashMap<char, usize> = HashMap::new();
    for ch in letters.to_lowercase().chars() {
        *available.entry(ch).or_insert(0) += 1;
    }

    for ch in word.to_lowercase().chars() {
        match available.get_mut(&ch) {
            Some(count) if *count > 0 => *count -= 1,
            _ => return false,
        }
    }
    true
}

/// Canonical forms of every letter subset of size `min_length..=len`.
/// Repeated letters produce repeated subsets; the set keeps each lookup key
/// once.
pub fn canonical_subsets(letters: &str, min_length: usize) -> HashSet<String> {
    let mut sorted: Vec<char> = letters
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphabetic())
        .collect();
    sorted.sort_unstable();

    let mut seen = HashSet::new();
    let n = sorted.len();
    if n == 0 || n > MAX_BASE_LETTERS || n < min_length {
        return seen;
    }

    for mask in 1u32..(1u32 << n) {
        if (mask.count_ones() as usize) < min_length {
            continue;
        }
        // Picking in index order from a sorted vector keeps the key sorted.
        let key: String = (0..n)
            .filter(|i| mask & (1 << i) != 0)
            .map(|i| sorted[i])
            .collect();
        seen.insert(key);
    }

    seen
}

/// Computes the full solution set for a base word. Deterministic for a
/// given dictionary snapshot, so it is computed once per round and stored.
pub struct WordSolver {
    provider: Arc<dyn DictionaryProvider>,
    fallback: WordList,
    min_length: usize,
}

impl WordSolver {
    pub fn new(provider: Arc<dyn DictionaryProvider>) -> Self {
        Self {
            provider,
            fallback: WordList::fallback(),
            min_length: MIN_WORD_LENGTH,
        }
    }

    /// Raise the shortest accepted word. Never below `MIN_WORD_LENGTH`.
    pub fn with_min_length(mut self, min_length: usize) -> Self {
        self.min_length = min_length.max(MIN_WORD_LENGTH);
        self
    }

    pub fn with_fallback(mut self, fallback: WordList) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn min_length(&self) -> usize {
        self.min_length
    }

    /// Every dictionary word of at least `min_length` letters that can be
    /// spelled from `letters`. Falls back to the bundled list when the
    /// provider is down or has nothing for these letters; never fails.
    pub async fn compute_valid_words(&self, letters: &str) -> BTreeSet<String> {
        let letters = letters.trim().to_lowercase();
        let forms = canonical_subsets(&letters, self.min_length);
        if forms.is_empty() {
            return BTreeSet::new();
        }

        match self.provider.lookup_by_canonical_forms(&forms).await {
            Ok(entries) => {
                let words: BTreeSet<String> = entries
                    .into_iter()
                    .map(|entry| entry.word.to_lowercase())
                    .filter(|word| word.chars().count() >= self.min_length)
                    .filter(|word| is_sub_multiset(word, &letters))
                    .collect();

                if words.is_empty() {
                    warn!(
                        "Dictionary has no words for '{}', using fallback list",
                        letters
                    );
                    return self.fallback.solutions(&letters, self.min_length);
                }

                debug!(
                    "Computed {} valid words for '{}' from {} canonical forms",
                    words.len(),
                    letters,
                    forms.len()
                );
                words
            }
            Err(e) => {
                warn!("{}; using fallback list for '{}'", e, letters);
                self.fallback.solutions(&letters, self.min_length)
            }
        }
    }

    /// A random base word of exactly `length` letters other than `previous`,
    /// or `None` if neither the dictionary nor the fallback list has one.
    /// `previous` comes back only when it is the sole word of that length.
    pub async fn pick_base_word(&self, length: usize, previous: Option<&str>) -> Option<String> {
        let previous = previous.map(normalize_word);
        let exclude = previous.as_deref();

        match self.provider.random_word(length, exclude).await {
            Ok(Some(word)) => return Some(word.to_lowercase()),
            Ok(None) => {
                debug!("Dictionary has no other {}-letter words, trying fallback", length);
            }
            Err(e) => {
                warn!("{}; picking {}-letter word from fallback", e, length);
            }
        }
        if let Some(word) = self.fallback.random_word(length, exclude) {
            return Some(word);
        }

        let repeat = previous.filter(|word| word.chars().count() == length);
        if let Some(word) = &repeat {
            debug!("'{}' is the only {}-letter word, reusing it", word, length);
        }
        repeat
    }
}

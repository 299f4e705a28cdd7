use async_trait::async_trait;
use rand::seq::SliceRandom;
use std::collections::{BTreeSet, HashMap, HashSet};

use crate::{
    DictionaryEntry, DictionaryError, DictionaryProvider, MIN_WORD_LENGTH, canonical_form,
    is_sub_multiset,
};

/// Small bundled list used when the dictionary store is unreachable.
/// Degraded, but every base word here has a playable set of sub-words.
pub const FALLBACK_WORDS: &str = "
# base words
planet
garden
danger
gander
stream
master
silent
listen
enlist
tinsel
orange
anagram
# planet
plan plane plant lane lean leap pale peal pant pelt tape late tale teal neat
ant tan pan nap pen net ten lap pal pat tap apt eat tea ate ale let pet nape
panel penal plate pleat petal leapt
# garden
range anger grade raged dare dear read near earn rang drag grad grand aged
gear rage den end and ran red rag nag age ear era are darn dean
# stream
tamer team meat mate tame steam mast mats star rats tars arts seam same mare
ream term rest east seat sear rate tear art rat tar arm ram mat sat sea set
# silent
inlet islet tiles stile lines liens lent lest lens line lies list slit silt
tine tile nets nest sent tens sit its tin nit lit lie sin
# orange
groan organ argon gone roan gore ogre ore roe oar ego one eon nor
# anagram
gram man mag
";

/// Normalize a submitted word for comparison: trimmed and lowercase.
pub fn normalize_word(word: &str) -> String {
    word.trim().to_lowercase()
}

/// In-memory dictionary, indexed by canonical form.
#[derive(Debug, Clone, Default)]
pub struct WordList {
    words: HashSet<String>,
    by_canonical: HashMap<String, Vec<String>>,
}

impl WordList {
    /// Build from whitespace-separated words; `#` starts a comment line.
    pub fn new(word_list: &str) -> Self {
        let mut list = Self::default();
        for word in word_list
            .lines()
            .filter(|line| !line.trim().starts_with('#'))
            .flat_map(str::split_whitespace)
        {
            list.insert(word);
        }
        list
    }

    pub fn fallback() -> Self {
        Self::new(FALLBACK_WORDS)
    }

    fn insert(&mut self, word: &str) {
        let word = normalize_word(word);
        if word.chars().count() < MIN_WORD_LENGTH || !Self::is_alphabetic(&word) {
            return;
        }
        if self.words.insert(word.clone()) {
            self.by_canonical
                .entry(canonical_form(&word))
                .or_default()
                .push(word);
        }
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(&normalize_word(word))
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn words(&self) -> impl Iterator<Item = &String> {
        self.words.iter()
    }

    pub fn random_word(&self, length: usize, exclude: Option<&str>) -> Option<String> {
        let mut candidates: Vec<&String> = self
            .words
            .iter()
            .filter(|word| word.chars().count() == length)
            .filter(|word| exclude != Some(word.as_str()))
            .collect();
        // HashSet order is unspecified; sort so the choice depends only on the RNG.
        candidates.sort();
        candidates.choose(&mut rand::thread_rng()).map(|w| (*w).clone())
    }

    /// Every listed word spellable from `letters`, same rule as the solver.
    pub fn solutions(&self, letters: &str, min_length: usize) -> BTreeSet<String> {
        self.words
            .iter()
            .filter(|word| word.chars().count() >= min_length)
            .filter(|word| is_sub_multiset(word, letters))
            .cloned()
            .collect()
    }

    /// Check if word contains only alphabetic characters
    pub fn is_alphabetic(word: &str) -> bool {
        !word.is_empty() && word.chars().all(|c| c.is_alphabetic())
    }
}

#[async_trait]
impl DictionaryProvider for WordList {
    async fn lookup_by_canonical_forms(
        &self,
        forms: &HashSet<String>,
    ) -> Result<Vec<DictionaryEntry>, DictionaryError> {
        Ok(forms
            .iter()
            .filter_map(|form| self.by_canonical.get(form))
            .flatten()
            .map(|word| DictionaryEntry {
                word: word.clone(),
                length: word.chars().count(),
            })
            .collect())
    }

    async fn random_word(
        &self,
        length: usize,
        exclude: Option<&str>,
    ) -> Result<Option<String>, DictionaryError> {
        Ok(WordList::random_word(self, length, exclude))
    }
}

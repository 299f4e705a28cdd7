use async_trait::async_trait;
use game_core::{
    DictionaryEntry, DictionaryError, DictionaryProvider, MIN_WORD_LENGTH, WordList,
    canonical_form, normalize_word,
};
use sea_orm::sea_query::{Expr, OnConflict, Order};
use sea_orm::{
    ActiveValue::Set, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, TransactionTrait,
};
use std::collections::HashSet;
use tracing::info;

use crate::StoreResult;
use crate::entities::{dictionary_words, prelude::*};

/// Rows per statement; keeps bound parameters well under SQLite's limit.
const BATCH_SIZE: usize = 200;

/// Dictionary table, indexed by canonical form for the word solver.
#[derive(Clone)]
pub struct DictionaryRepository {
    db: DatabaseConnection,
}

impl DictionaryRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Insert words with their canonical form. Words that are too short,
    /// not alphabetic, or already present are skipped. Returns how many
    /// rows were added.
    pub async fn seed<'a, I>(&self, words: I) -> StoreResult<u64>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut seen = HashSet::new();
        let rows: Vec<dictionary_words::ActiveModel> = words
            .into_iter()
            .map(normalize_word)
            .filter(|word| word.chars().count() >= MIN_WORD_LENGTH && WordList::is_alphabetic(word))
            .filter(|word| seen.insert(word.clone()))
            .map(|word| dictionary_words::ActiveModel {
                canonical: Set(canonical_form(&word)),
                length: Set(word.chars().count() as i32),
                word: Set(word),
                ..Default::default()
            })
            .collect();

        let txn = self.db.begin().await?;
        let mut inserted = 0;
        for batch in rows.chunks(BATCH_SIZE) {
            inserted += DictionaryWords::insert_many(batch.to_vec())
                .on_conflict(
                    OnConflict::column(dictionary_words::Column::Word)
                        .do_nothing()
                        .to_owned(),
                )
                .exec_without_returning(&txn)
                .await?;
        }
        txn.commit().await?;

        info!("Seeded {} dictionary words ({} offered)", inserted, rows.len());
        Ok(inserted)
    }

    pub async fn seed_word_list(&self, list: &WordList) -> StoreResult<u64> {
        self.seed(list.words().map(String::as_str)).await
    }

    pub async fn count(&self) -> StoreResult<u64> {
        Ok(DictionaryWords::find().count(&self.db).await?)
    }
}

fn unavailable(e: DbErr) -> DictionaryError {
    DictionaryError::Unavailable(e.to_string())
}

#[async_trait]
impl DictionaryProvider for DictionaryRepository {
    async fn lookup_by_canonical_forms(
        &self,
        forms: &HashSet<String>,
    ) -> Result<Vec<DictionaryEntry>, DictionaryError> {
        let forms: Vec<&str> = forms.iter().map(String::as_str).collect();
        let mut entries = Vec::new();

        for batch in forms.chunks(BATCH_SIZE) {
            let rows = DictionaryWords::find()
                .filter(dictionary_words::Column::Canonical.is_in(batch.iter().copied()))
                .all(&self.db)
                .await
                .map_err(unavailable)?;
            entries.extend(rows.into_iter().map(|row| DictionaryEntry {
                length: row.word.chars().count(),
                word: row.word,
            }));
        }

        Ok(entries)
    }

    async fn random_word(
        &self,
        length: usize,
        exclude: Option<&str>,
    ) -> Result<Option<String>, DictionaryError> {
        let Ok(length) = i32::try_from(length) else {
            return Ok(None);
        };
        let mut query = DictionaryWords::find().filter(dictionary_words::Column::Length.eq(length));
        if let Some(word) = exclude {
            query = query.filter(dictionary_words::Column::Word.ne(word));
        }
        let row = query
            .order_by(Expr::cust("RANDOM()"), Order::Asc)
            .one(&self.db)
            .await
            .map_err(unavailable)?;
        Ok(row.map(|row| row.word))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::connect_to_memory_database;
    use game_core::WordSolver;
    use migration::{Migrator, MigratorTrait};
    use std::sync::Arc;

    async fn setup_test_db() -> DictionaryRepository {
        let db = connect_to_memory_database().await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        DictionaryRepository::new(db)
    }

    #[tokio::test]
    async fn test_seed_skips_duplicates_and_junk() {
        let repo = setup_test_db().await;

        let added = repo
            .seed(["gram", "GRAM", "ab", "x1y", "anagram", "ram"])
            .await
            .unwrap();
        assert_eq!(added, 3);

        // Re-seeding is a no-op
        assert_eq!(repo.seed(["gram", "ram"]).await.unwrap(), 0);
        assert_eq!(repo.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_lookup_by_canonical_forms() {
        let repo = setup_test_db().await;
        repo.seed(["listen", "silent", "enlist", "tinsel", "lint"])
            .await
            .unwrap();

        let forms: HashSet<String> = [canonical_form("silent"), canonical_form("lint")]
            .into_iter()
            .collect();
        let mut words: Vec<String> = repo
            .lookup_by_canonical_forms(&forms)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.word)
            .collect();
        words.sort();
        assert_eq!(words, vec!["enlist", "lint", "listen", "silent", "tinsel"]);
    }

    #[tokio::test]
    async fn test_random_word_by_length() {
        let repo = setup_test_db().await;
        repo.seed(["planet", "garden", "plan"]).await.unwrap();

        for _ in 0..5 {
            let word = repo.random_word(6, None).await.unwrap().unwrap();
            assert!(word == "planet" || word == "garden");
        }
        assert!(repo.random_word(9, None).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_random_word_excludes_previous() {
        let repo = setup_test_db().await;
        repo.seed(["planet", "garden", "plan"]).await.unwrap();

        for _ in 0..10 {
            let word = repo.random_word(6, Some("planet")).await.unwrap();
            assert_eq!(word.as_deref(), Some("garden"));
        }
        repo.seed(["stream"]).await.unwrap();
        let word = repo.random_word(6, Some("garden")).await.unwrap().unwrap();
        assert_ne!(word, "garden");
        assert!(repo.random_word(4, Some("plan")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_solver_over_seeded_dictionary() {
        let repo = setup_test_db().await;
        repo.seed_word_list(&WordList::new(
            "anagram gram ram arm man ran rag nag mars aaaa banana",
        ))
        .await
        .unwrap();

        let solver = WordSolver::new(Arc::new(repo));
        let words = solver.compute_valid_words("anagram").await;
        for expected in ["anagram", "gram", "ram", "arm", "man", "ran"] {
            assert!(words.contains(expected), "missing {}", expected);
        }
        assert!(!words.contains("mars"));
        assert!(!words.contains("aaaa"));
    }
}

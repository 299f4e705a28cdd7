use chrono::{DateTime, Utc};
use game_types::{ScoreRecord, SessionId, UserId};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use uuid::Uuid;

use super::{decode_words, encode_words, to_db, to_utc};
use crate::entities::{prelude::*, score_history};
use crate::{StoreError, StoreResult};

/// A round result ready to be archived. `score` is the server-side total.
#[derive(Debug, Clone)]
pub struct NewScoreRecord {
    pub session_id: SessionId,
    pub user_id: UserId,
    pub display_name: String,
    pub round_index: i32,
    pub base_word: String,
    pub words: Vec<String>,
    pub claimed_score: i32,
    pub score: i32,
    pub flagged: bool,
}

/// Permanent per-round results. Rows are keyed by session id but carry no
/// foreign key, so they outlive the session.
#[derive(Clone)]
pub struct ScoreHistoryRepository {
    db: DatabaseConnection,
}

impl ScoreHistoryRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn model_to_record(model: score_history::Model) -> StoreResult<ScoreRecord> {
        let id = Uuid::parse_str(&model.id)
            .map_err(|e| StoreError::Corrupt(format!("score record id '{}': {}", model.id, e)))?;
        Ok(ScoreRecord {
            id,
            words: decode_words(&model.words)?,
            session_id: model.session_id,
            user_id: model.user_id,
            display_name: model.display_name,
            round_index: model.round_index,
            base_word: model.base_word,
            claimed_score: model.claimed_score,
            score: model.score,
            flagged: model.flagged,
            created_at: to_utc(model.created_at),
        })
    }

    /// Store a round result once per (session, user, round). A repeat call
    /// returns the record already stored; the flag says whether this call
    /// created it.
    pub async fn archive(
        &self,
        record: NewScoreRecord,
        now: DateTime<Utc>,
    ) -> StoreResult<(ScoreRecord, bool)> {
        let model = score_history::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            session_id: Set(record.session_id.clone()),
            user_id: Set(record.user_id.clone()),
            display_name: Set(record.display_name),
            round_index: Set(record.round_index),
            base_word: Set(record.base_word),
            words: Set(encode_words(&record.words)?),
            claimed_score: Set(record.claimed_score),
            score: Set(record.score),
            flagged: Set(record.flagged),
            created_at: Set(to_db(now)),
        };

        let inserted = ScoreHistory::insert(model)
            .on_conflict(
                OnConflict::columns([
                    score_history::Column::SessionId,
                    score_history::Column::UserId,
                    score_history::Column::RoundIndex,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        let stored = self
            .find(&record.session_id, &record.user_id, record.round_index)
            .await?
            .ok_or_else(|| {
                StoreError::Corrupt(format!(
                    "score record for {} in {} round {} missing after insert",
                    record.user_id, record.session_id, record.round_index
                ))
            })?;
        Ok((stored, inserted > 0))
    }

    pub async fn find(
        &self,
        session_id: &str,
        user_id: &str,
        round_index: i32,
    ) -> StoreResult<Option<ScoreRecord>> {
        ScoreHistory::find()
            .filter(score_history::Column::SessionId.eq(session_id))
            .filter(score_history::Column::UserId.eq(user_id))
            .filter(score_history::Column::RoundIndex.eq(round_index))
            .one(&self.db)
            .await?
            .map(Self::model_to_record)
            .transpose()
    }

    /// A user's archived rounds, newest first.
    pub async fn history_for_user(&self, user_id: &str, limit: u64) -> StoreResult<Vec<ScoreRecord>> {
        ScoreHistory::find()
            .filter(score_history::Column::UserId.eq(user_id))
            .order_by_desc(score_history::Column::CreatedAt)
            .order_by_desc(score_history::Column::RoundIndex)
            .limit(limit)
            .all(&self.db)
            .await?
            .into_iter()
            .map(Self::model_to_record)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::connect_to_memory_database;
    use chrono::Duration;
    use migration::{Migrator, MigratorTrait};

    async fn setup_test_db() -> ScoreHistoryRepository {
        let db = connect_to_memory_database().await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        ScoreHistoryRepository::new(db)
    }

    fn record(session_id: &str, round_index: i32, score: i32) -> NewScoreRecord {
        NewScoreRecord {
            session_id: session_id.to_string(),
            user_id: "user-alice".to_string(),
            display_name: "Alice".to_string(),
            round_index,
            base_word: "planet".to_string(),
            words: vec!["plan".to_string(), "plane".to_string()],
            claimed_score: score,
            score,
            flagged: false,
        }
    }

    #[tokio::test]
    async fn test_archive_is_once_per_round() {
        let repo = setup_test_db().await;
        let now = Utc::now();

        let (first, created) = repo.archive(record("ABC234", 1, 1500), now).await.unwrap();
        assert!(created);
        assert_eq!(first.words, vec!["plan", "plane"]);

        // A retry with a different claim keeps the first record
        let (second, created) = repo.archive(record("ABC234", 1, 9999), now).await.unwrap();
        assert!(!created);
        assert_eq!(second.id, first.id);
        assert_eq!(second.score, 1500);
    }

    #[tokio::test]
    async fn test_history_newest_first() {
        let repo = setup_test_db().await;
        let t0 = Utc::now();

        repo.archive(record("ABC234", 1, 300), t0).await.unwrap();
        repo.archive(record("ABC234", 2, 1200), t0 + Duration::minutes(2))
            .await
            .unwrap();
        repo.archive(record("XYZ789", 1, 2000), t0 + Duration::minutes(5))
            .await
            .unwrap();

        let history = repo.history_for_user("user-alice", 10).await.unwrap();
        let scores: Vec<i32> = history.iter().map(|r| r.score).collect();
        assert_eq!(scores, vec![2000, 1200, 300]);

        assert_eq!(repo.history_for_user("user-alice", 2).await.unwrap().len(), 2);
        assert!(repo.history_for_user("user-nobody", 10).await.unwrap().is_empty());
    }
}

pub mod dictionary_repository;
pub mod score_history_repository;
pub mod session_repository;

pub use dictionary_repository::DictionaryRepository;
pub use score_history_repository::{NewScoreRecord, ScoreHistoryRepository};
pub use session_repository::{Departure, NewSession, RoundWords, SessionRepository, SettingsChange};

use chrono::{DateTime, Utc};
use sea_orm::prelude::DateTimeWithTimeZone;

use crate::{StoreError, StoreResult};

pub(crate) fn to_db(at: DateTime<Utc>) -> DateTimeWithTimeZone {
    at.fixed_offset()
}

pub(crate) fn to_utc(at: DateTimeWithTimeZone) -> DateTime<Utc> {
    at.with_timezone(&Utc)
}

pub(crate) fn encode_words(words: &[String]) -> StoreResult<String> {
    serde_json::to_string(words).map_err(|e| StoreError::Corrupt(e.to_string()))
}

pub(crate) fn decode_words(raw: &str) -> StoreResult<Vec<String>> {
    serde_json::from_str(raw).map_err(|e| StoreError::Corrupt(format!("word list: {}", e)))
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

pub type SessionId = String;
pub type UserId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum SessionPhase {
    Waiting,  // Lobby, roster and settings may change
    Starting, // Host started, countdown running
    Active,   // Round in progress, words accepted
    Finished, // Time ran out, waiting for the host to start a new round
}

impl SessionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionPhase::Waiting => "waiting",
            SessionPhase::Starting => "starting",
            SessionPhase::Active => "active",
            SessionPhase::Finished => "finished",
        }
    }

    /// Parse a persisted phase. Unknown values yield `None` so the sweep can
    /// reclaim the row instead of failing the read.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "waiting" => Some(SessionPhase::Waiting),
            "starting" => Some(SessionPhase::Starting),
            "active" => Some(SessionPhase::Active),
            "finished" => Some(SessionPhase::Finished),
            _ => None,
        }
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Full session record as held by the store, including the solution set.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Session {
    pub id: SessionId,
    pub base_word: String,
    pub phase: SessionPhase,
    pub round_index: i32,
    pub time_limit_seconds: i32,
    pub max_players: i32,
    pub is_public: bool,
    pub countdown_ends_at: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub valid_words: Vec<String>,
    pub players: Vec<Player>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn player(&self, user_id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.user_id == user_id)
    }

    pub fn is_host(&self, user_id: &str) -> bool {
        self.player(user_id).is_some_and(|p| p.is_host)
    }

    pub fn word_length(&self) -> usize {
        self.base_word.chars().count()
    }

    pub fn is_full(&self) -> bool {
        self.players.len() as i32 >= self.max_players
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Player {
    pub user_id: UserId,
    pub display_name: String,
    pub is_host: bool,
    pub ready: bool,
    pub score: i32,
    pub found_words: Vec<String>,
    pub joined_at: DateTime<Utc>,
}

/// Host-chosen configuration used when creating a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SessionSettings {
    pub time_limit_seconds: i32,
    pub max_players: i32,
    pub is_public: bool,
    pub word_length: i32,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            time_limit_seconds: 120,
            max_players: 8,
            is_public: false,
            word_length: 6,
        }
    }
}

/// Partial settings change, only legal while the session is waiting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SettingsUpdate {
    pub time_limit_seconds: Option<i32>,
    pub max_players: Option<i32>,
    pub is_public: Option<bool>,
    pub word_length: Option<i32>,
}

impl SettingsUpdate {
    pub fn is_empty(&self) -> bool {
        self.time_limit_seconds.is_none()
            && self.max_players.is_none()
            && self.is_public.is_none()
            && self.word_length.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_round_trips_through_storage_string() {
        for phase in [
            SessionPhase::Waiting,
            SessionPhase::Starting,
            SessionPhase::Active,
            SessionPhase::Finished,
        ] {
            assert_eq!(SessionPhase::parse(phase.as_str()), Some(phase));
        }
        assert_eq!(SessionPhase::parse("paused"), None);
        assert_eq!(SessionPhase::parse(""), None);
    }

    #[test]
    fn test_phase_serializes_lowercase() {
        let json = serde_json::to_string(&SessionPhase::Active).unwrap();
        assert_eq!(json, "\"active\"");
    }

    #[test]
    fn test_settings_update_is_empty() {
        assert!(SettingsUpdate::default().is_empty());
        let update = SettingsUpdate {
            is_public: Some(true),
            ..Default::default()
        };
        assert!(!update.is_empty());
    }
}

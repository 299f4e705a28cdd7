use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::{GameError, Player, Session, SessionId, SessionPhase, UserId};

/// What a polling client sees. The solution set is only shipped once the
/// round is under way, so waiting players cannot study it early.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SessionSnapshot {
    pub id: SessionId,
    pub base_word: String,
    pub phase: SessionPhase,
    pub round_index: i32,
    pub time_limit_seconds: i32,
    pub max_players: i32,
    pub is_public: bool,
    pub countdown_ends_at: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub remaining_seconds: i64,
    pub server_time: DateTime<Utc>,
    pub players: Vec<Player>,
    pub valid_words: Option<Vec<String>>,
}

impl SessionSnapshot {
    pub fn new(session: &Session, remaining_seconds: i64, server_time: DateTime<Utc>) -> Self {
        let valid_words = match session.phase {
            SessionPhase::Active | SessionPhase::Finished => Some(session.valid_words.clone()),
            SessionPhase::Waiting | SessionPhase::Starting => None,
        };

        Self {
            id: session.id.clone(),
            base_word: session.base_word.clone(),
            phase: session.phase,
            round_index: session.round_index,
            time_limit_seconds: session.time_limit_seconds,
            max_players: session.max_players,
            is_public: session.is_public,
            countdown_ends_at: session.countdown_ends_at,
            started_at: session.started_at,
            remaining_seconds,
            server_time,
            players: session.players.clone(),
            valid_words,
        }
    }

    pub fn player(&self, user_id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.user_id == user_id)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CreateSessionRequest {
    pub time_limit_seconds: Option<i32>,
    pub max_players: Option<i32>,
    pub is_public: Option<bool>,
    pub word_length: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct KickRequest {
    pub user_id: UserId,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReadyRequest {
    pub ready: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SubmitWordRequest {
    pub word: String,
}

/// Outcome of a single word guess. Rejections are data, not errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SubmitWordResult {
    pub accepted: bool,
    pub points_awarded: i32,
    pub score: i32,
    pub reason: Option<GameError>,
}

impl SubmitWordResult {
    pub fn accepted(points_awarded: i32, score: i32) -> Self {
        Self {
            accepted: true,
            points_awarded,
            score,
            reason: None,
        }
    }

    pub fn rejected(reason: GameError, score: i32) -> Self {
        Self {
            accepted: false,
            points_awarded: 0,
            score,
            reason: Some(reason),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LeaveResult {
    pub session_deleted: bool,
    pub new_host: Option<UserId>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct KickResult {
    pub kicked_user_id: UserId,
    pub kicked_display_name: String,
    /// Score the kicked player held at removal, kept for UI feedback.
    pub final_score: i32,
    pub session: SessionSnapshot,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PublicSessionSummary {
    pub id: SessionId,
    pub host_name: String,
    pub player_count: i32,
    pub max_players: i32,
    pub word_length: i32,
    pub time_limit_seconds: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ArchiveRoundRequest {
    pub words: Vec<String>,
    pub claimed_score: i32,
}

/// Permanent per-round score record, independent of the live session.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ScoreRecord {
    pub id: Uuid,
    pub session_id: SessionId,
    pub user_id: UserId,
    pub display_name: String,
    pub round_index: i32,
    pub base_word: String,
    pub words: Vec<String>,
    pub claimed_score: i32,
    pub score: i32,
    pub flagged: bool,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_session(phase: SessionPhase) -> Session {
        let now = Utc::now();
        Session {
            id: "ABC123".to_string(),
            base_word: "planet".to_string(),
            phase,
            round_index: 1,
            time_limit_seconds: 60,
            max_players: 4,
            is_public: true,
            countdown_ends_at: None,
            started_at: None,
            valid_words: vec!["plan".to_string(), "plane".to_string()],
            players: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_snapshot_hides_solution_before_round() {
        let now = Utc::now();
        let snapshot = SessionSnapshot::new(&sample_session(SessionPhase::Waiting), 60, now);
        assert!(snapshot.valid_words.is_none());

        let snapshot = SessionSnapshot::new(&sample_session(SessionPhase::Starting), 60, now);
        assert!(snapshot.valid_words.is_none());
    }

    #[test]
    fn test_snapshot_ships_solution_during_round() {
        let now = Utc::now();
        let snapshot = SessionSnapshot::new(&sample_session(SessionPhase::Active), 42, now);
        assert_eq!(snapshot.valid_words.as_ref().map(Vec::len), Some(2));
        assert_eq!(snapshot.remaining_seconds, 42);
    }

    #[test]
    fn test_submit_result_constructors() {
        let ok = SubmitWordResult::accepted(300, 400);
        assert!(ok.accepted);
        assert!(ok.reason.is_none());

        let rejected = SubmitWordResult::rejected(GameError::GameNotActive, 400);
        assert!(!rejected.accepted);
        assert_eq!(rejected.points_awarded, 0);
        assert_eq!(rejected.score, 400);
    }
}

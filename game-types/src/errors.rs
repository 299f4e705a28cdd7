use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::SessionPhase;

/// Rejection reasons reported to callers. A rejection never leaves a
/// partial state change behind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, thiserror::Error)]
#[serde(tag = "code")]
#[ts(export)]
pub enum GameError {
    #[error("session {session_id} not found")]
    SessionNotFound { session_id: String },
    #[error("player {user_id} is not in this session")]
    PlayerNotFound { user_id: String },
    #[error("session is full ({max_players} players)")]
    CapacityExceeded { max_players: i32 },
    #[error("only the host can do that")]
    NotHost,
    #[error("the host cannot be kicked")]
    CannotKickHost,
    #[error("you cannot kick yourself")]
    CannotKickSelf,
    #[error("session is {current}, expected {expected}")]
    WrongPhase {
        current: SessionPhase,
        expected: SessionPhase,
    },
    #[error("the round is not active")]
    GameNotActive,
    #[error("words must be at least {min_length} letters")]
    TooShort { min_length: i32 },
    #[error("'{word}' was already found")]
    AlreadyFound { word: String },
    #[error("'{word}' is not a valid word for this round")]
    NotInDictionary { word: String },
    #[error("invalid settings: {reason}")]
    InvalidSettings { reason: String },
}

impl GameError {
    /// Stable machine-readable code, matching the serialized tag.
    pub fn code(&self) -> &'static str {
        match self {
            GameError::SessionNotFound { .. } => "SessionNotFound",
            GameError::PlayerNotFound { .. } => "PlayerNotFound",
            GameError::CapacityExceeded { .. } => "CapacityExceeded",
            GameError::NotHost => "NotHost",
            GameError::CannotKickHost => "CannotKickHost",
            GameError::CannotKickSelf => "CannotKickSelf",
            GameError::WrongPhase { .. } => "WrongPhase",
            GameError::GameNotActive => "GameNotActive",
            GameError::TooShort { .. } => "TooShort",
            GameError::AlreadyFound { .. } => "AlreadyFound",
            GameError::NotInDictionary { .. } => "NotInDictionary",
            GameError::InvalidSettings { .. } => "InvalidSettings",
        }
    }
}

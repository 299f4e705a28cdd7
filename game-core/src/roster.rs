use game_types::{GameError, Player, Session, SessionPhase, SessionSettings, SettingsUpdate};

use crate::{MAX_BASE_LETTERS, MIN_WORD_LENGTH, PhaseRules};

pub const MIN_PLAYERS: i32 = 2;
pub const MIN_TIME_LIMIT_SECONDS: i32 = 10;
pub const MAX_TIME_LIMIT_SECONDS: i32 = 3600;

/// How a join request lands on the roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    /// Already on the roster; only the display name is refreshed.
    Rejoin,
    New { is_host: bool },
}

/// Roster invariants, checked against a session read inside the same
/// transaction that applies the change.
pub struct RosterRules;

impl RosterRules {
    pub fn check_join(session: &Session, user_id: &str) -> Result<JoinKind, GameError> {
        if session.player(user_id).is_some() {
            return Ok(JoinKind::Rejoin);
        }
        if session.is_full() {
            return Err(GameError::CapacityExceeded {
                max_players: session.max_players,
            });
        }
        Ok(JoinKind::New {
            is_host: session.players.is_empty(),
        })
    }

    pub fn check_kick(session: &Session, requester: &str, target: &str) -> Result<(), GameError> {
        PhaseRules::require_host(session, requester)?;
        if requester == target {
            return Err(GameError::CannotKickSelf);
        }
        let target = session.player(target).ok_or_else(|| GameError::PlayerNotFound {
            user_id: target.to_string(),
        })?;
        if target.is_host {
            return Err(GameError::CannotKickHost);
        }
        PhaseRules::require_phase(session, SessionPhase::Waiting)
    }

    /// Who takes over when `leaving` goes: the longest-waiting remaining
    /// player. Ties on join time fall back to roster order.
    pub fn next_host<'a>(players: &'a [Player], leaving: &str) -> Option<&'a Player> {
        players
            .iter()
            .filter(|p| p.user_id != leaving)
            .min_by_key(|p| p.joined_at)
    }

    pub fn validate_settings(
        settings: &SessionSettings,
        max_players_limit: i32,
    ) -> Result<(), GameError> {
        Self::check_time_limit(settings.time_limit_seconds)?;
        Self::check_max_players(settings.max_players, 1, max_players_limit)?;
        Self::check_word_length(settings.word_length)
    }

    /// Range checks for a settings change. `max_players` may not drop
    /// below the current roster.
    pub fn validate_update(
        session: &Session,
        update: &SettingsUpdate,
        max_players_limit: i32,
    ) -> Result<(), GameError> {
        if update.is_empty() {
            return Err(invalid("no settings to change"));
        }
        if let Some(limit) = update.time_limit_seconds {
            Self::check_time_limit(limit)?;
        }
        if let Some(max_players) = update.max_players {
            let roster = i32::try_from(session.players.len()).unwrap_or(i32::MAX);
            Self::check_max_players(max_players, roster, max_players_limit)?;
        }
        if let Some(length) = update.word_length {
            Self::check_word_length(length)?;
        }
        Ok(())
    }

    fn check_time_limit(seconds: i32) -> Result<(), GameError> {
        if !(MIN_TIME_LIMIT_SECONDS..=MAX_TIME_LIMIT_SECONDS).contains(&seconds) {
            return Err(invalid(format!(
                "time limit must be between {} and {} seconds",
                MIN_TIME_LIMIT_SECONDS, MAX_TIME_LIMIT_SECONDS
            )));
        }
        Ok(())
    }

    fn check_max_players(max_players: i32, roster: i32, limit: i32) -> Result<(), GameError> {
        let floor = MIN_PLAYERS.max(roster);
        if max_players < floor || max_players > limit {
            return Err(invalid(format!(
                "max players must be between {} and {}",
                floor, limit
            )));
        }
        Ok(())
    }

    fn check_word_length(length: i32) -> Result<(), GameError> {
        let ok = usize::try_from(length)
            .map(|len| (MIN_WORD_LENGTH..=MAX_BASE_LETTERS).contains(&len))
            .unwrap_or(false);
        if !ok {
            return Err(invalid(format!(
                "word length must be between {} and {}",
                MIN_WORD_LENGTH, MAX_BASE_LETTERS
            )));
        }
        Ok(())
    }
}

fn invalid(reason: impl Into<String>) -> GameError {
    GameError::InvalidSettings {
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn player(id: &str, is_host: bool, joined_offset_secs: i64) -> Player {
        Player {
            user_id: id.to_string(),
            display_name: id.to_uppercase(),
            is_host,
            ready: false,
            score: 0,
            found_words: Vec::new(),
            joined_at: Utc::now() + Duration::seconds(joined_offset_secs),
        }
    }

    fn session(max_players: i32, players: Vec<Player>) -> Session {
        let now = Utc::now();
        Session {
            id: "ROSTER".to_string(),
            base_word: "stream".to_string(),
            phase: SessionPhase::Waiting,
            round_index: 1,
            time_limit_seconds: 60,
            max_players,
            is_public: false,
            countdown_ends_at: None,
            started_at: None,
            valid_words: Vec::new(),
            players,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_join_respects_capacity() {
        let s = session(2, vec![player("host", true, 0), player("guest", false, 1)]);
        assert_eq!(
            RosterRules::check_join(&s, "late"),
            Err(GameError::CapacityExceeded { max_players: 2 })
        );
        // Already on the roster: no capacity check
        assert_eq!(RosterRules::check_join(&s, "guest"), Ok(JoinKind::Rejoin));
    }

    #[test]
    fn test_first_joiner_becomes_host() {
        let s = session(4, vec![]);
        assert_eq!(
            RosterRules::check_join(&s, "first"),
            Ok(JoinKind::New { is_host: true })
        );
        let s = session(4, vec![player("host", true, 0)]);
        assert_eq!(
            RosterRules::check_join(&s, "second"),
            Ok(JoinKind::New { is_host: false })
        );
    }

    #[test]
    fn test_kick_rules() {
        let mut s = session(4, vec![player("host", true, 0), player("guest", false, 1)]);

        assert_eq!(RosterRules::check_kick(&s, "guest", "host"), Err(GameError::NotHost));
        assert_eq!(
            RosterRules::check_kick(&s, "host", "host"),
            Err(GameError::CannotKickSelf)
        );
        assert!(matches!(
            RosterRules::check_kick(&s, "host", "ghost"),
            Err(GameError::PlayerNotFound { .. })
        ));
        assert!(RosterRules::check_kick(&s, "host", "guest").is_ok());

        s.phase = SessionPhase::Active;
        assert!(matches!(
            RosterRules::check_kick(&s, "host", "guest"),
            Err(GameError::WrongPhase { .. })
        ));
    }

    #[test]
    fn test_next_host_is_longest_waiting() {
        let players = vec![
            player("host", true, 0),
            player("late", false, 30),
            player("early", false, 10),
        ];
        let next = RosterRules::next_host(&players, "host").unwrap();
        assert_eq!(next.user_id, "early");
        assert!(RosterRules::next_host(&players[..1], "host").is_none());
    }

    #[test]
    fn test_settings_ranges() {
        let mut settings = SessionSettings::default();
        assert!(RosterRules::validate_settings(&settings, 16).is_ok());

        settings.time_limit_seconds = 5;
        assert!(RosterRules::validate_settings(&settings, 16).is_err());

        settings = SessionSettings {
            max_players: 17,
            ..SessionSettings::default()
        };
        assert!(RosterRules::validate_settings(&settings, 16).is_err());

        settings = SessionSettings {
            word_length: 2,
            ..SessionSettings::default()
        };
        assert!(RosterRules::validate_settings(&settings, 16).is_err());
    }

    #[test]
    fn test_update_cannot_shrink_below_roster() {
        let s = session(
            4,
            vec![
                player("host", true, 0),
                player("a", false, 1),
                player("b", false, 2),
            ],
        );
        let shrink = SettingsUpdate {
            max_players: Some(2),
            ..SettingsUpdate::default()
        };
        assert!(matches!(
            RosterRules::validate_update(&s, &shrink, 16),
            Err(GameError::InvalidSettings { .. })
        ));

        let fits = SettingsUpdate {
            max_players: Some(3),
            ..SettingsUpdate::default()
        };
        assert!(RosterRules::validate_update(&s, &fits, 16).is_ok());
        assert!(RosterRules::validate_update(&s, &SettingsUpdate::default(), 16).is_err());
    }
}

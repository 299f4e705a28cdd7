use chrono::{DateTime, Utc};
use game_types::{GameError, Player, Session, SessionPhase};

use crate::TimeAuthority;

/// Result of re-deriving a session's phase from the clock.
#[derive(Debug, Clone)]
pub struct Reconciliation {
    pub session: Session,
    pub changed: bool,
}

pub struct PhaseRules;

impl PhaseRules {
    /// Legal edges of the lifecycle. `Waiting -> Active` is the all-ready
    /// auto-start; `Starting -> Finished` is a countdown and a round that
    /// both elapsed before the next read; `Finished -> Waiting` is a new
    /// round.
    pub fn can_transition(from: SessionPhase, to: SessionPhase) -> bool {
        matches!(
            (from, to),
            (SessionPhase::Waiting, SessionPhase::Starting)
                | (SessionPhase::Waiting, SessionPhase::Active)
                | (SessionPhase::Starting, SessionPhase::Active)
                | (SessionPhase::Starting, SessionPhase::Finished)
                | (SessionPhase::Active, SessionPhase::Finished)
                | (SessionPhase::Finished, SessionPhase::Waiting)
        )
    }

    pub fn require_phase(session: &Session, expected: SessionPhase) -> Result<(), GameError> {
        if session.phase == expected {
            Ok(())
        } else {
            Err(GameError::WrongPhase {
                current: session.phase,
                expected,
            })
        }
    }

    pub fn require_host(session: &Session, user_id: &str) -> Result<(), GameError> {
        match session.player(user_id) {
            None => Err(GameError::PlayerNotFound {
                user_id: user_id.to_string(),
            }),
            Some(player) if !player.is_host => Err(GameError::NotHost),
            Some(_) => Ok(()),
        }
    }

    /// Every non-host player is ready and there is at least one of them.
    /// The host's own flag never counts.
    pub fn all_ready(players: &[Player]) -> bool {
        let mut non_host = players.iter().filter(|p| !p.is_host).peekable();
        players.len() > 1 && non_host.peek().is_some() && non_host.all(|p| p.ready)
    }

    /// Apply time-driven transitions: a finished countdown promotes
    /// `Starting` to `Active` (anchored at the countdown end so every reader
    /// agrees), and an elapsed round moves `Active` to `Finished`. Both may
    /// happen in one call.
    pub fn reconcile(mut session: Session, now: DateTime<Utc>) -> Reconciliation {
        let mut changed = false;

        if session.phase == SessionPhase::Starting {
            if let Some(countdown_end) = session.countdown_ends_at {
                if now >= countdown_end {
                    session.phase = SessionPhase::Active;
                    session.started_at = Some(countdown_end);
                    changed = true;
                }
            }
        }

        if TimeAuthority::is_expired(&session, now) {
            session.phase = SessionPhase::Finished;
            changed = true;
        }

        Reconciliation { session, changed }
    }
}

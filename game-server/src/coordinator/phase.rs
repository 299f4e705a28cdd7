use tracing::info;

use game_core::{PhaseRules, RosterRules};
use game_persistence::repositories::SettingsChange;
use game_types::{SessionPhase, SessionSnapshot, SettingsUpdate};

use super::{CoordinatorResult, SessionCoordinator};

impl SessionCoordinator {
    /// Toggle a player's ready flag. The toggle that makes every non-host
    /// player ready starts the round.
    pub async fn set_ready(
        &self,
        session_id: &str,
        user_id: &str,
        ready: bool,
    ) -> CoordinatorResult<SessionSnapshot> {
        self.load(session_id).await?;
        let started = self
            .sessions
            .set_ready(session_id, user_id, ready, self.clock.now())
            .await?;
        if started {
            info!("Round started in session {} after all players readied", session_id);
        }
        self.snapshot(session_id).await
    }

    /// Host-initiated start, through the countdown when one is configured.
    pub async fn start(&self, session_id: &str, host_id: &str) -> CoordinatorResult<SessionSnapshot> {
        self.load(session_id).await?;
        let phase = self
            .sessions
            .start_round(
                session_id,
                host_id,
                self.settings.start_countdown,
                self.clock.now(),
            )
            .await?;
        info!("Host {} started session {}: now {}", host_id, session_id, phase);
        self.snapshot(session_id).await
    }

    /// `finished -> waiting` with a fresh base word of the same length.
    pub async fn new_round(
        &self,
        session_id: &str,
        host_id: &str,
    ) -> CoordinatorResult<SessionSnapshot> {
        let session = self.load(session_id).await?;
        PhaseRules::require_host(&session, host_id)?;
        PhaseRules::require_phase(&session, SessionPhase::Finished)?;

        let words = self
            .round_words(session.word_length(), Some(&session.base_word))
            .await?;
        self.sessions
            .start_new_round(
                session_id,
                host_id,
                session.round_index,
                words,
                self.clock.now(),
            )
            .await?;
        self.snapshot(session_id).await
    }

    pub async fn update_settings(
        &self,
        session_id: &str,
        host_id: &str,
        update: SettingsUpdate,
    ) -> CoordinatorResult<SessionSnapshot> {
        let session = self.load(session_id).await?;
        PhaseRules::require_host(&session, host_id)?;
        PhaseRules::require_phase(&session, SessionPhase::Waiting)?;
        RosterRules::validate_update(&session, &update, self.settings.max_players_limit)?;

        // A new length means a new word; base word and solutions move together.
        let words = match update.word_length {
            Some(length) if length as usize != session.word_length() => {
                Some(self.round_words(length as usize, None).await?)
            }
            _ => None,
        };

        let change = SettingsChange {
            time_limit_seconds: update.time_limit_seconds,
            max_players: update.max_players,
            is_public: update.is_public,
            words,
        };
        self.sessions
            .update_settings(session_id, host_id, change, self.clock.now())
            .await?;
        info!("Host {} updated settings of session {}", host_id, session_id);
        self.snapshot(session_id).await
    }
}

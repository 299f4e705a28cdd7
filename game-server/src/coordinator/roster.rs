use tracing::{debug, info};

use game_core::{JoinKind, RosterRules};
use game_persistence::repositories::NewSession;
use game_types::{
    CreateSessionRequest, KickResult, LeaveResult, Principal, SessionSettings, SessionSnapshot,
};

use super::{CoordinatorResult, SessionCoordinator};

impl SessionCoordinator {
    /// Create a waiting session with `host` as its only player.
    pub async fn create_session(
        &self,
        host: &Principal,
        request: CreateSessionRequest,
    ) -> CoordinatorResult<SessionSnapshot> {
        let defaults = &self.settings.defaults;
        let settings = SessionSettings {
            time_limit_seconds: request
                .time_limit_seconds
                .unwrap_or(defaults.time_limit_seconds),
            max_players: request.max_players.unwrap_or(defaults.max_players),
            is_public: request.is_public.unwrap_or(defaults.is_public),
            word_length: request.word_length.unwrap_or(defaults.word_length),
        };
        RosterRules::validate_settings(&settings, self.settings.max_players_limit)?;

        let words = self
            .round_words(settings.word_length as usize, None)
            .await?;
        let session = self
            .sessions
            .create(NewSession { words, settings }, host, self.clock.now())
            .await?;
        Ok(self.snapshot_of(&session))
    }

    pub async fn join(
        &self,
        session_id: &str,
        principal: &Principal,
    ) -> CoordinatorResult<SessionSnapshot> {
        match self
            .sessions
            .add_player(session_id, principal, self.clock.now())
            .await?
        {
            JoinKind::Rejoin => debug!("{} rejoined session {}", principal.user_id, session_id),
            JoinKind::New { is_host } => info!(
                "{} ({}) joined session {}{}",
                principal.display_name,
                principal.user_id,
                session_id,
                if is_host { " as host" } else { "" }
            ),
        }
        self.snapshot(session_id).await
    }

    pub async fn leave(&self, session_id: &str, user_id: &str) -> CoordinatorResult<LeaveResult> {
        let departure = self
            .sessions
            .remove_player(session_id, user_id, self.clock.now())
            .await?;
        info!("{} left session {}", user_id, session_id);

        Ok(LeaveResult {
            session_deleted: departure.session_deleted,
            new_host: departure.new_host,
        })
    }

    /// Host removes another player while the session is waiting.
    pub async fn kick(
        &self,
        session_id: &str,
        host_id: &str,
        target_id: &str,
    ) -> CoordinatorResult<KickResult> {
        // An elapsed countdown must count as started before the phase check.
        self.load(session_id).await?;
        let departure = self
            .sessions
            .kick_player(session_id, host_id, target_id, self.clock.now())
            .await?;
        info!(
            "Host {} kicked {} from session {} (score {})",
            host_id, target_id, session_id, departure.final_score
        );

        Ok(KickResult {
            kicked_user_id: departure.user_id,
            kicked_display_name: departure.display_name,
            final_score: departure.final_score,
            session: self.snapshot(session_id).await?,
        })
    }
}

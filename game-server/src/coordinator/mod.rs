//! The session coordinator: roster, phase and submission operations over
//! the session store. Handlers are stateless; every call reads the store,
//! reconciles the phase against the clock, and applies one atomic change.

mod phase;
mod roster;
mod submission;

use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

use game_core::{
    Clock, PhaseRules, Reconciliation, SessionCleanup, SessionSummary, SweepReason, TimeAuthority,
    WordSolver,
};
use game_persistence::repositories::{RoundWords, ScoreHistoryRepository, SessionRepository};
use game_persistence::StoreError;
use game_types::{GameError, PublicSessionSummary, Session, SessionId, SessionSettings, SessionSnapshot};

/// Reconcile-and-persist attempts before serving an unpersisted view.
const RECONCILE_ATTEMPTS: usize = 2;

#[derive(Debug, thiserror::Error)]
pub enum CoordinatorError {
    #[error(transparent)]
    Rejected(#[from] GameError),
    #[error("service unavailable: {0}")]
    Unavailable(String),
}

pub type CoordinatorResult<T> = Result<T, CoordinatorError>;

impl From<StoreError> for CoordinatorError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Rejected(reason) => CoordinatorError::Rejected(reason),
            StoreError::Database(e) => {
                error!("Session store failure: {}", e);
                CoordinatorError::Unavailable("session store unavailable".to_string())
            }
            StoreError::Corrupt(detail) => {
                error!("Unreadable session data: {}", detail);
                CoordinatorError::Unavailable(detail)
            }
        }
    }
}

/// What to do when an archived round's claimed score disagrees with the
/// recomputed one. The stored score is the recomputed one either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReconciliationPolicy {
    #[default]
    Lenient,
    Flag,
}

#[derive(Debug, Clone)]
pub struct CoordinatorSettings {
    pub defaults: SessionSettings,
    pub max_players_limit: i32,
    pub start_countdown: chrono::Duration,
    pub reconciliation: ReconciliationPolicy,
    pub public_listing_limit: usize,
    pub stale_waiting: Duration,
    pub stale_active: Duration,
}

impl Default for CoordinatorSettings {
    fn default() -> Self {
        let cleanup = SessionCleanup::default();
        Self {
            defaults: SessionSettings::default(),
            max_players_limit: 16,
            start_countdown: chrono::Duration::seconds(3),
            reconciliation: ReconciliationPolicy::Lenient,
            public_listing_limit: 20,
            stale_waiting: cleanup.stale_waiting_threshold,
            stale_active: cleanup.stale_active_threshold,
        }
    }
}

pub struct SessionCoordinator {
    sessions: SessionRepository,
    history: ScoreHistoryRepository,
    solver: WordSolver,
    clock: Arc<dyn Clock>,
    settings: CoordinatorSettings,
}

impl SessionCoordinator {
    pub fn new(
        sessions: SessionRepository,
        history: ScoreHistoryRepository,
        solver: WordSolver,
        clock: Arc<dyn Clock>,
        settings: CoordinatorSettings,
    ) -> Self {
        Self {
            sessions,
            history,
            solver,
            clock,
            settings,
        }
    }

    pub fn settings(&self) -> &CoordinatorSettings {
        &self.settings
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// The polling read path.
    pub async fn snapshot(&self, session_id: &str) -> CoordinatorResult<SessionSnapshot> {
        let session = self.load(session_id).await?;
        Ok(self.snapshot_of(&session))
    }

    pub async fn list_public_sessions(&self) -> CoordinatorResult<Vec<PublicSessionSummary>> {
        Ok(self
            .sessions
            .list_public(self.settings.public_listing_limit)
            .await?)
    }

    /// Delete empty, stale and unreadable sessions. Safe to run alongside
    /// normal traffic: a session touched after it was judged is kept.
    pub async fn sweep(&self) -> CoordinatorResult<Vec<(SessionId, SweepReason)>> {
        let cleanup = SessionCleanup::new(self.settings.stale_waiting, self.settings.stale_active);
        let summaries = self.sessions.summaries().await?;
        let doomed = cleanup.select_for_sweep(&summaries, self.clock.now());
        if doomed.is_empty() {
            debug!("Sweep found nothing to reclaim among {} sessions", summaries.len());
            return Ok(doomed);
        }

        for (id, reason) in &doomed {
            info!("Sweeping session {}: {}", id, reason);
        }
        let ids: HashSet<&SessionId> = doomed.iter().map(|(id, _)| id).collect();
        let judged: Vec<SessionSummary> = summaries
            .iter()
            .filter(|summary| ids.contains(&summary.id))
            .cloned()
            .collect();
        let deleted = self.sessions.delete_sessions(&judged).await?;
        info!("Sweep deleted {} of {} sessions", deleted, summaries.len());
        Ok(doomed)
    }

    /// Load a session and bring its phase up to date with the clock,
    /// persisting the correction when there is one.
    async fn load(&self, session_id: &str) -> CoordinatorResult<Session> {
        for _ in 0..RECONCILE_ATTEMPTS {
            let stored = self.find(session_id).await?;
            let from = stored.phase;
            let now = self.clock.now();
            let Reconciliation { session, changed } = PhaseRules::reconcile(stored, now);
            if !changed {
                return Ok(session);
            }
            if self.sessions.apply_reconciliation(from, &session, now).await? {
                info!("Session {} moved from {} to {}", session.id, from, session.phase);
                return Ok(session);
            }
            debug!("Session {} changed during reconciliation, reloading", session_id);
        }

        let stored = self.find(session_id).await?;
        Ok(PhaseRules::reconcile(stored, self.clock.now()).session)
    }

    async fn find(&self, session_id: &str) -> CoordinatorResult<Session> {
        self.sessions.find(session_id).await?.ok_or_else(|| {
            GameError::SessionNotFound {
                session_id: session_id.to_string(),
            }
            .into()
        })
    }

    fn snapshot_of(&self, session: &Session) -> SessionSnapshot {
        let now = self.clock.now();
        SessionSnapshot::new(session, TimeAuthority::remaining_seconds(session, now), now)
    }

    /// A base word of `length` letters with its solution set. `previous`
    /// is only reused when the dictionary has no other word of that length.
    async fn round_words(&self, length: usize, previous: Option<&str>) -> CoordinatorResult<RoundWords> {
        let base_word = self
            .solver
            .pick_base_word(length, previous)
            .await
            .ok_or_else(|| GameError::InvalidSettings {
                reason: format!("no {}-letter base words available", length),
            })?;
        let valid_words = self
            .solver
            .compute_valid_words(&base_word)
            .await
            .into_iter()
            .collect();

        Ok(RoundWords {
            base_word,
            valid_words,
        })
    }
}

use chrono::{DateTime, Utc};
use game_types::{SessionId, SessionPhase};
use std::fmt;
use std::time::Duration;

/// Just enough of a stored session to decide whether to reclaim it.
/// `phase` is `None` when the stored value is not a known phase.
#[derive(Debug, Clone)]
pub struct SessionSummary {
    pub id: SessionId,
    pub phase: Option<SessionPhase>,
    pub player_count: u64,
    pub updated_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepReason {
    EmptyRoster,
    InvalidPhase,
    StaleWaiting,
    StaleActive,
    StaleFinished,
}

impl fmt::Display for SweepReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            SweepReason::EmptyRoster => "empty roster",
            SweepReason::InvalidPhase => "invalid phase",
            SweepReason::StaleWaiting => "stale in lobby",
            SweepReason::StaleActive => "round exceeded maximum duration",
            SweepReason::StaleFinished => "idle after round",
        };
        f.write_str(reason)
    }
}

pub struct SessionCleanup {
    pub stale_waiting_threshold: Duration, // 1 hour without activity in the lobby
    pub stale_active_threshold: Duration,  // 2 hours since the round started
}

impl Default for SessionCleanup {
    fn default() -> Self {
        Self {
            stale_waiting_threshold: Duration::from_secs(3600), // 1 hour
            stale_active_threshold: Duration::from_secs(7200),  // 2 hours
        }
    }
}

impl SessionCleanup {
    pub fn new(stale_waiting_threshold: Duration, stale_active_threshold: Duration) -> Self {
        Self {
            stale_waiting_threshold,
            stale_active_threshold,
        }
    }

    /// Why this session should be deleted, if at all.
    pub fn sweep_reason(&self, summary: &SessionSummary, now: DateTime<Utc>) -> Option<SweepReason> {
        if summary.player_count == 0 {
            return Some(SweepReason::EmptyRoster);
        }

        let Some(phase) = summary.phase else {
            return Some(SweepReason::InvalidPhase);
        };

        let idle = Self::age(summary.updated_at, now);
        match phase {
            SessionPhase::Waiting | SessionPhase::Starting => {
                (idle > self.stale_waiting_threshold).then_some(SweepReason::StaleWaiting)
            }
            SessionPhase::Active => {
                let running = Self::age(summary.started_at.unwrap_or(summary.updated_at), now);
                (running > self.stale_active_threshold).then_some(SweepReason::StaleActive)
            }
            SessionPhase::Finished => {
                (idle > self.stale_waiting_threshold).then_some(SweepReason::StaleFinished)
            }
        }
    }

    /// Sessions to delete, with the reason for each.
    pub fn select_for_sweep(
        &self,
        summaries: &[SessionSummary],
        now: DateTime<Utc>,
    ) -> Vec<(SessionId, SweepReason)> {
        summaries
            .iter()
            .filter_map(|s| self.sweep_reason(s, now).map(|reason| (s.id.clone(), reason)))
            .collect()
    }

    fn age(since: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
        (now - since).to_std().unwrap_or(Duration::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(phase: Option<SessionPhase>, players: u64, idle_minutes: i64) -> SessionSummary {
        let updated_at = Utc::now() - chrono::Duration::minutes(idle_minutes);
        SessionSummary {
            id: "SWEEP1".to_string(),
            phase,
            player_count: players,
            updated_at,
            started_at: None,
        }
    }

    #[test]
    fn test_cleanup_configuration() {
        let cleanup = SessionCleanup::default();
        assert_eq!(cleanup.stale_waiting_threshold, Duration::from_secs(3600));
        assert_eq!(cleanup.stale_active_threshold, Duration::from_secs(7200));
    }

    #[test]
    fn test_empty_roster_is_swept_immediately() {
        let cleanup = SessionCleanup::default();
        let s = summary(Some(SessionPhase::Active), 0, 0);
        assert_eq!(cleanup.sweep_reason(&s, Utc::now()), Some(SweepReason::EmptyRoster));
    }

    #[test]
    fn test_invalid_phase_is_swept() {
        let cleanup = SessionCleanup::default();
        let s = summary(None, 3, 0);
        assert_eq!(cleanup.sweep_reason(&s, Utc::now()), Some(SweepReason::InvalidPhase));
    }

    #[test]
    fn test_waiting_staleness() {
        let cleanup = SessionCleanup::default();
        let now = Utc::now();
        assert_eq!(cleanup.sweep_reason(&summary(Some(SessionPhase::Waiting), 2, 30), now), None);
        assert_eq!(
            cleanup.sweep_reason(&summary(Some(SessionPhase::Waiting), 2, 61), now),
            Some(SweepReason::StaleWaiting)
        );
    }

    #[test]
    fn test_active_staleness_uses_round_start() {
        let cleanup = SessionCleanup::default();
        let now = Utc::now();

        let mut s = summary(Some(SessionPhase::Active), 2, 0);
        s.started_at = Some(now - chrono::Duration::minutes(90));
        assert_eq!(cleanup.sweep_reason(&s, now), None);

        s.started_at = Some(now - chrono::Duration::minutes(121));
        assert_eq!(cleanup.sweep_reason(&s, now), Some(SweepReason::StaleActive));
    }

    #[test]
    fn test_select_for_sweep_keeps_healthy_sessions() {
        let cleanup = SessionCleanup::default();
        let mut healthy = summary(Some(SessionPhase::Waiting), 2, 5);
        healthy.id = "KEEP".to_string();
        let mut empty = summary(Some(SessionPhase::Waiting), 0, 5);
        empty.id = "DROP".to_string();

        let selected = cleanup.select_for_sweep(&[healthy, empty], Utc::now());
        assert_eq!(selected, vec![("DROP".to_string(), SweepReason::EmptyRoster)]);
    }
}

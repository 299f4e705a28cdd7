use chrono::{DateTime, Duration, Utc};
use game_types::{Session, SessionPhase};
use std::fmt::Debug;
use std::sync::Mutex;

/// Source of "now" for every authoritative time decision.
pub trait Clock: Send + Sync + Debug {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }

    pub fn set(&self, to: DateTime<Utc>) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now = to;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Derives round timing from the persisted start anchor. Client countdowns
/// are display-only and never consulted.
pub struct TimeAuthority;

impl TimeAuthority {
    /// Whole seconds left in the round, never negative.
    ///
    /// Waiting and starting sessions report the full limit; finished ones
    /// report zero.
    pub fn remaining_seconds(session: &Session, now: DateTime<Utc>) -> i64 {
        let limit = i64::from(session.time_limit_seconds.max(0));
        match (session.phase, session.started_at) {
            (SessionPhase::Active, Some(started_at)) => {
                let elapsed = Self::elapsed_ms(started_at, now).div_euclid(1000);
                (limit - elapsed).clamp(0, limit)
            }
            (SessionPhase::Finished, _) => 0,
            _ => limit,
        }
    }

    pub fn elapsed_ms(started_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
        (now - started_at).num_milliseconds()
    }

    /// An active round is over once no whole second remains.
    pub fn is_expired(session: &Session, now: DateTime<Utc>) -> bool {
        session.phase == SessionPhase::Active
            && session.started_at.is_some()
            && Self::remaining_seconds(session, now) == 0
    }
}

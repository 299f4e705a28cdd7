use chrono::{DateTime, Duration, Utc};
use game_core::{JoinKind, PhaseRules, RosterRules, SessionSummary};
use game_types::{
    GameError, Player, Principal, PublicSessionSummary, Session, SessionPhase,
    SessionSettings, UserId,
};
use rand::Rng;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveValue::Set, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, SqlErr, TransactionTrait,
};
use std::collections::HashMap;
use tracing::{debug, info};

use super::{decode_words, encode_words, to_db, to_utc};
use crate::entities::{found_words, prelude::*, session_players, sessions};
use crate::{StoreError, StoreResult};

pub const JOIN_CODE_LENGTH: usize = 6;
const JOIN_CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
const MAX_JOIN_CODE_ATTEMPTS: usize = 10;
/// Sessions per sweep delete statement.
const DELETE_BATCH_SIZE: usize = 200;

/// A fresh join code. Ambiguous characters (0/O, 1/I) are left out.
pub fn generate_join_code() -> String {
    let mut rng = rand::thread_rng();
    (0..JOIN_CODE_LENGTH)
        .map(|_| JOIN_CODE_ALPHABET[rng.gen_range(0..JOIN_CODE_ALPHABET.len())] as char)
        .collect()
}

/// A base word and its solution set. Always written together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundWords {
    pub base_word: String,
    pub valid_words: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct NewSession {
    pub words: RoundWords,
    pub settings: SessionSettings,
}

/// Fields a host may change while the session is waiting.
#[derive(Debug, Clone, Default)]
pub struct SettingsChange {
    pub time_limit_seconds: Option<i32>,
    pub max_players: Option<i32>,
    pub is_public: Option<bool>,
    pub words: Option<RoundWords>,
}

/// What a leave or kick did to the roster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Departure {
    pub user_id: UserId,
    pub display_name: String,
    pub final_score: i32,
    pub new_host: Option<UserId>,
    pub session_deleted: bool,
}

struct PhaseChange {
    to: SessionPhase,
    countdown_ends_at: Option<DateTime<Utc>>,
    started_at: Option<DateTime<Utc>>,
}

/// The session store. Every mutation runs in one transaction scoped to one
/// session; preconditions are re-checked inside it.
#[derive(Clone)]
pub struct SessionRepository {
    db: DatabaseConnection,
}

impl SessionRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create(
        &self,
        new: NewSession,
        host: &Principal,
        now: DateTime<Utc>,
    ) -> StoreResult<Session> {
        let valid_words = encode_words(&new.words.valid_words)?;

        for attempt in 1..=MAX_JOIN_CODE_ATTEMPTS {
            let id = generate_join_code();
            let txn = self.db.begin().await?;

            let model = sessions::ActiveModel {
                id: Set(id.clone()),
                base_word: Set(new.words.base_word.clone()),
                phase: Set(SessionPhase::Waiting.as_str().to_string()),
                round_index: Set(1),
                time_limit_seconds: Set(new.settings.time_limit_seconds),
                max_players: Set(new.settings.max_players),
                is_public: Set(new.settings.is_public),
                countdown_ends_at: Set(None),
                started_at: Set(None),
                valid_words: Set(valid_words.clone()),
                created_at: Set(to_db(now)),
                updated_at: Set(to_db(now)),
            };

            match Sessions::insert(model).exec_without_returning(&txn).await {
                Ok(_) => {}
                Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                    debug!("Join code {} already taken (attempt {})", id, attempt);
                    continue;
                }
                Err(e) => return Err(e.into()),
            }

            insert_player(&txn, &id, host, true, now).await?;
            let session = require_session(&txn, &id).await?;
            txn.commit().await?;

            info!(
                "Created session {} for host {} with base word '{}' ({} valid words)",
                id,
                host.user_id,
                session.base_word,
                session.valid_words.len()
            );
            return Ok(session);
        }

        Err(DbErr::Custom("could not allocate a unique join code".to_string()).into())
    }

    pub async fn find(&self, session_id: &str) -> StoreResult<Option<Session>> {
        load_session(&self.db, session_id).await
    }

    /// Add `principal` to the roster, or refresh their display name if they
    /// are already on it.
    pub async fn add_player(
        &self,
        session_id: &str,
        principal: &Principal,
        now: DateTime<Utc>,
    ) -> StoreResult<JoinKind> {
        let txn = self.db.begin().await?;
        let session = require_session(&txn, session_id).await?;
        let kind = RosterRules::check_join(&session, &principal.user_id)?;

        match kind {
            JoinKind::Rejoin => {
                SessionPlayers::update_many()
                    .col_expr(
                        session_players::Column::DisplayName,
                        Expr::value(principal.display_name.clone()),
                    )
                    .filter(session_players::Column::SessionId.eq(session_id))
                    .filter(session_players::Column::UserId.eq(principal.user_id.as_str()))
                    .exec(&txn)
                    .await?;
            }
            JoinKind::New { is_host } => {
                insert_player(&txn, session_id, principal, is_host, now).await?;
                // Re-count with our row in place; a concurrent join may have
                // taken the last seat.
                let roster = count_players(&txn, session_id).await?;
                if roster > u64::try_from(session.max_players).unwrap_or(0) {
                    return Err(GameError::CapacityExceeded {
                        max_players: session.max_players,
                    }
                    .into());
                }
            }
        }

        touch(&txn, session_id, now).await?;
        txn.commit().await?;
        Ok(kind)
    }

    /// Remove a player. Hands the host role to the longest-waiting player
    /// when the host leaves, and deletes the session when nobody is left.
    pub async fn remove_player(
        &self,
        session_id: &str,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<Departure> {
        let txn = self.db.begin().await?;
        let session = require_session(&txn, session_id).await?;
        let departure = remove_from_roster(&txn, &session, user_id, now).await?;
        txn.commit().await?;
        Ok(departure)
    }

    pub async fn kick_player(
        &self,
        session_id: &str,
        requester: &str,
        target: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<Departure> {
        let txn = self.db.begin().await?;
        let session = require_session(&txn, session_id).await?;
        RosterRules::check_kick(&session, requester, target)?;
        let departure = remove_from_roster(&txn, &session, target, now).await?;
        txn.commit().await?;
        Ok(departure)
    }

    /// Set a player's ready flag. Returns true when this toggle completed the
    /// all-ready aggregate and started the round.
    pub async fn set_ready(
        &self,
        session_id: &str,
        user_id: &str,
        ready: bool,
        now: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let txn = self.db.begin().await?;
        let mut session = require_session(&txn, session_id).await?;
        PhaseRules::require_phase(&session, SessionPhase::Waiting)?;

        let player = session
            .players
            .iter_mut()
            .find(|p| p.user_id == user_id)
            .ok_or_else(|| GameError::PlayerNotFound {
                user_id: user_id.to_string(),
            })?;
        player.ready = ready;

        SessionPlayers::update_many()
            .col_expr(session_players::Column::Ready, Expr::value(ready))
            .filter(session_players::Column::SessionId.eq(session_id))
            .filter(session_players::Column::UserId.eq(user_id))
            .exec(&txn)
            .await?;

        let auto_started = if ready && PhaseRules::all_ready(&session.players) {
            let change = PhaseChange {
                to: SessionPhase::Active,
                countdown_ends_at: None,
                started_at: Some(now),
            };
            compare_and_set_phase(&txn, &session, SessionPhase::Waiting, &change, now).await?
        } else {
            touch(&txn, session_id, now).await?;
            false
        };

        txn.commit().await?;
        if auto_started {
            info!("Session {} auto-started: every player is ready", session_id);
        }
        Ok(auto_started)
    }

    /// Host start. A positive countdown parks the session in `Starting`;
    /// otherwise it goes straight to `Active`. Returns the new phase.
    pub async fn start_round(
        &self,
        session_id: &str,
        host_id: &str,
        countdown: Duration,
        now: DateTime<Utc>,
    ) -> StoreResult<SessionPhase> {
        let txn = self.db.begin().await?;
        let session = require_session(&txn, session_id).await?;
        PhaseRules::require_host(&session, host_id)?;
        PhaseRules::require_phase(&session, SessionPhase::Waiting)?;

        let change = if countdown > Duration::zero() {
            PhaseChange {
                to: SessionPhase::Starting,
                countdown_ends_at: Some(now + countdown),
                started_at: None,
            }
        } else {
            PhaseChange {
                to: SessionPhase::Active,
                countdown_ends_at: None,
                started_at: Some(now),
            }
        };

        if !compare_and_set_phase(&txn, &session, SessionPhase::Waiting, &change, now).await? {
            return Err(lost_race(&txn, session_id, SessionPhase::Waiting).await);
        }
        txn.commit().await?;
        Ok(change.to)
    }

    /// Persist a read-path reconciliation. Only succeeds if the stored row
    /// is still in `from` for the same round; false means another request
    /// got there first.
    pub async fn apply_reconciliation(
        &self,
        from: SessionPhase,
        session: &Session,
        now: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let change = PhaseChange {
            to: session.phase,
            countdown_ends_at: session.countdown_ends_at,
            started_at: session.started_at,
        };
        compare_and_set_phase(&self.db, session, from, &change, now).await
    }

    /// Score a word at most once. Returns the player's new score, or `None`
    /// if this player already has the word this round.
    pub async fn record_found_word(
        &self,
        session_id: &str,
        user_id: &str,
        round_index: i32,
        word: &str,
        points: i32,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<i32>> {
        let txn = self.db.begin().await?;

        let row = found_words::ActiveModel {
            session_id: Set(session_id.to_string()),
            user_id: Set(user_id.to_string()),
            round_index: Set(round_index),
            word: Set(word.to_string()),
            points: Set(points),
            found_at: Set(to_db(now)),
            ..Default::default()
        };
        let inserted = FoundWords::insert(row)
            .on_conflict(
                OnConflict::columns([
                    found_words::Column::SessionId,
                    found_words::Column::UserId,
                    found_words::Column::RoundIndex,
                    found_words::Column::Word,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(&txn)
            .await?;
        if inserted == 0 {
            return Ok(None);
        }

        // The round may have ended or rolled over since the caller looked.
        let live = Sessions::find()
            .filter(sessions::Column::Id.eq(session_id))
            .filter(sessions::Column::RoundIndex.eq(round_index))
            .filter(sessions::Column::Phase.eq(SessionPhase::Active.as_str()))
            .count(&txn)
            .await?;
        if live == 0 {
            return Err(GameError::GameNotActive.into());
        }

        let updated = SessionPlayers::update_many()
            .col_expr(
                session_players::Column::Score,
                Expr::col(session_players::Column::Score).add(points),
            )
            .filter(session_players::Column::SessionId.eq(session_id))
            .filter(session_players::Column::UserId.eq(user_id))
            .exec(&txn)
            .await?;
        if updated.rows_affected == 0 {
            return Err(player_not_found(user_id).into());
        }

        let score = SessionPlayers::find()
            .filter(session_players::Column::SessionId.eq(session_id))
            .filter(session_players::Column::UserId.eq(user_id))
            .one(&txn)
            .await?
            .map(|p| p.score)
            .ok_or_else(|| player_not_found(user_id))?;

        txn.commit().await?;
        Ok(Some(score))
    }

    /// `finished -> waiting` for round `expected_round`: new words, scores
    /// and ready flags reset, found words cleared. Returns the new round index.
    pub async fn start_new_round(
        &self,
        session_id: &str,
        host_id: &str,
        expected_round: i32,
        words: RoundWords,
        now: DateTime<Utc>,
    ) -> StoreResult<i32> {
        let txn = self.db.begin().await?;
        let session = require_session(&txn, session_id).await?;
        PhaseRules::require_host(&session, host_id)?;
        PhaseRules::require_phase(&session, SessionPhase::Finished)?;
        check_transition(SessionPhase::Finished, SessionPhase::Waiting)?;

        let next_round = expected_round + 1;
        let updated = Sessions::update_many()
            .col_expr(
                sessions::Column::Phase,
                Expr::value(SessionPhase::Waiting.as_str()),
            )
            .col_expr(sessions::Column::RoundIndex, Expr::value(next_round))
            .col_expr(sessions::Column::BaseWord, Expr::value(words.base_word.clone()))
            .col_expr(
                sessions::Column::ValidWords,
                Expr::value(encode_words(&words.valid_words)?),
            )
            .col_expr(
                sessions::Column::StartedAt,
                Expr::value(Option::<sea_orm::prelude::DateTimeWithTimeZone>::None),
            )
            .col_expr(
                sessions::Column::CountdownEndsAt,
                Expr::value(Option::<sea_orm::prelude::DateTimeWithTimeZone>::None),
            )
            .col_expr(sessions::Column::UpdatedAt, Expr::value(to_db(now)))
            .filter(sessions::Column::Id.eq(session_id))
            .filter(sessions::Column::Phase.eq(SessionPhase::Finished.as_str()))
            .filter(sessions::Column::RoundIndex.eq(expected_round))
            .exec(&txn)
            .await?;
        if updated.rows_affected == 0 {
            return Err(lost_race(&txn, session_id, SessionPhase::Finished).await);
        }

        SessionPlayers::update_many()
            .col_expr(session_players::Column::Score, Expr::value(0))
            .col_expr(session_players::Column::Ready, Expr::value(false))
            .filter(session_players::Column::SessionId.eq(session_id))
            .exec(&txn)
            .await?;

        FoundWords::delete_many()
            .filter(found_words::Column::SessionId.eq(session_id))
            .exec(&txn)
            .await?;

        txn.commit().await?;
        info!(
            "Session {} moved to round {} with base word '{}'",
            session_id, next_round, words.base_word
        );
        Ok(next_round)
    }

    pub async fn update_settings(
        &self,
        session_id: &str,
        host_id: &str,
        change: SettingsChange,
        now: DateTime<Utc>,
    ) -> StoreResult<()> {
        let txn = self.db.begin().await?;
        let session = require_session(&txn, session_id).await?;
        PhaseRules::require_host(&session, host_id)?;
        PhaseRules::require_phase(&session, SessionPhase::Waiting)?;

        if let Some(max_players) = change.max_players {
            if usize::try_from(max_players).unwrap_or(0) < session.players.len() {
                return Err(GameError::InvalidSettings {
                    reason: "max players is below the current roster".to_string(),
                }
                .into());
            }
        }

        let mut update = Sessions::update_many()
            .col_expr(sessions::Column::UpdatedAt, Expr::value(to_db(now)));
        if let Some(seconds) = change.time_limit_seconds {
            update = update.col_expr(sessions::Column::TimeLimitSeconds, Expr::value(seconds));
        }
        if let Some(max_players) = change.max_players {
            update = update.col_expr(sessions::Column::MaxPlayers, Expr::value(max_players));
        }
        if let Some(is_public) = change.is_public {
            update = update.col_expr(sessions::Column::IsPublic, Expr::value(is_public));
        }
        if let Some(words) = &change.words {
            update = update
                .col_expr(sessions::Column::BaseWord, Expr::value(words.base_word.clone()))
                .col_expr(
                    sessions::Column::ValidWords,
                    Expr::value(encode_words(&words.valid_words)?),
                );
        }

        let updated = update
            .filter(sessions::Column::Id.eq(session_id))
            .filter(sessions::Column::Phase.eq(SessionPhase::Waiting.as_str()))
            .exec(&txn)
            .await?;
        if updated.rows_affected == 0 {
            return Err(lost_race(&txn, session_id, SessionPhase::Waiting).await);
        }

        txn.commit().await?;
        Ok(())
    }

    /// Joinable public lobbies, newest first.
    pub async fn list_public(&self, limit: usize) -> StoreResult<Vec<PublicSessionSummary>> {
        let lobbies = Sessions::find()
            .filter(sessions::Column::IsPublic.eq(true))
            .filter(sessions::Column::Phase.eq(SessionPhase::Waiting.as_str()))
            .order_by_desc(sessions::Column::CreatedAt)
            .all(&self.db)
            .await?;
        if lobbies.is_empty() {
            return Ok(Vec::new());
        }

        let players = SessionPlayers::find()
            .filter(session_players::Column::SessionId.is_in(lobbies.iter().map(|s| s.id.clone())))
            .all(&self.db)
            .await?;

        let mut rosters: HashMap<String, (i32, Option<String>)> = HashMap::new();
        for player in players {
            let entry = rosters.entry(player.session_id).or_insert((0, None));
            entry.0 += 1;
            if player.is_host {
                entry.1 = Some(player.display_name);
            }
        }

        Ok(lobbies
            .into_iter()
            .filter_map(|lobby| {
                let (player_count, host_name) = rosters.remove(&lobby.id)?;
                if player_count >= lobby.max_players {
                    return None;
                }
                Some(PublicSessionSummary {
                    host_name: host_name.unwrap_or_default(),
                    player_count,
                    max_players: lobby.max_players,
                    word_length: lobby.base_word.chars().count() as i32,
                    time_limit_seconds: lobby.time_limit_seconds,
                    created_at: to_utc(lobby.created_at),
                    id: lobby.id,
                })
            })
            .take(limit)
            .collect())
    }

    /// Every stored session, reduced to what the sweep needs.
    pub async fn summaries(&self) -> StoreResult<Vec<SessionSummary>> {
        let counts: HashMap<String, i64> = SessionPlayers::find()
            .select_only()
            .column(session_players::Column::SessionId)
            .column_as(session_players::Column::Id.count(), "player_count")
            .group_by(session_players::Column::SessionId)
            .into_tuple::<(String, i64)>()
            .all(&self.db)
            .await?
            .into_iter()
            .collect();

        let sessions = Sessions::find().all(&self.db).await?;
        Ok(sessions
            .into_iter()
            .map(|model| SessionSummary {
                player_count: counts
                    .get(&model.id)
                    .and_then(|count| u64::try_from(*count).ok())
                    .unwrap_or(0),
                phase: SessionPhase::parse(&model.phase),
                updated_at: to_utc(model.updated_at),
                started_at: model.started_at.map(to_utc),
                id: model.id,
            })
            .collect())
    }

    /// Delete the summarized sessions that have not changed since their
    /// summary was taken; players and found words cascade.
    pub async fn delete_sessions(&self, judged: &[SessionSummary]) -> StoreResult<u64> {
        let mut deleted = 0;
        for batch in judged.chunks(DELETE_BATCH_SIZE) {
            let unchanged = batch.iter().fold(Condition::any(), |any, summary| {
                any.add(
                    Condition::all()
                        .add(sessions::Column::Id.eq(summary.id.as_str()))
                        .add(sessions::Column::UpdatedAt.lte(to_db(summary.updated_at))),
                )
            });
            deleted += Sessions::delete_many()
                .filter(unchanged)
                .exec(&self.db)
                .await?
                .rows_affected;
        }
        Ok(deleted)
    }
}

async fn load_session<C: ConnectionTrait>(conn: &C, id: &str) -> StoreResult<Option<Session>> {
    let Some(model) = Sessions::find_by_id(id).one(conn).await? else {
        return Ok(None);
    };

    let players = SessionPlayers::find()
        .filter(session_players::Column::SessionId.eq(id))
        .order_by_asc(session_players::Column::JoinedAt)
        .order_by_asc(session_players::Column::Id)
        .all(conn)
        .await?;

    let mut found: HashMap<String, Vec<String>> = HashMap::new();
    for row in FoundWords::find()
        .filter(found_words::Column::SessionId.eq(id))
        .filter(found_words::Column::RoundIndex.eq(model.round_index))
        .order_by_asc(found_words::Column::Id)
        .all(conn)
        .await?
    {
        found.entry(row.user_id).or_default().push(row.word);
    }

    let players = players
        .into_iter()
        .map(|p| {
            let found_words = found.remove(&p.user_id).unwrap_or_default();
            Player {
                user_id: p.user_id,
                display_name: p.display_name,
                is_host: p.is_host,
                ready: p.ready,
                score: p.score,
                found_words,
                joined_at: to_utc(p.joined_at),
            }
        })
        .collect();

    let phase = SessionPhase::parse(&model.phase).ok_or_else(|| {
        StoreError::Corrupt(format!("session {} has unknown phase '{}'", id, model.phase))
    })?;

    Ok(Some(Session {
        valid_words: decode_words(&model.valid_words)?,
        id: model.id,
        base_word: model.base_word,
        phase,
        round_index: model.round_index,
        time_limit_seconds: model.time_limit_seconds,
        max_players: model.max_players,
        is_public: model.is_public,
        countdown_ends_at: model.countdown_ends_at.map(to_utc),
        started_at: model.started_at.map(to_utc),
        players,
        created_at: to_utc(model.created_at),
        updated_at: to_utc(model.updated_at),
    }))
}

async fn require_session<C: ConnectionTrait>(conn: &C, id: &str) -> StoreResult<Session> {
    load_session(conn, id).await?.ok_or_else(|| {
        GameError::SessionNotFound {
            session_id: id.to_string(),
        }
        .into()
    })
}

async fn insert_player<C: ConnectionTrait>(
    conn: &C,
    session_id: &str,
    principal: &Principal,
    is_host: bool,
    now: DateTime<Utc>,
) -> StoreResult<()> {
    let model = session_players::ActiveModel {
        session_id: Set(session_id.to_string()),
        user_id: Set(principal.user_id.clone()),
        display_name: Set(principal.display_name.clone()),
        is_host: Set(is_host),
        ready: Set(false),
        score: Set(0),
        joined_at: Set(to_db(now)),
        ..Default::default()
    };
    SessionPlayers::insert(model).exec_without_returning(conn).await?;
    Ok(())
}

async fn count_players<C: ConnectionTrait>(conn: &C, session_id: &str) -> StoreResult<u64> {
    Ok(SessionPlayers::find()
        .filter(session_players::Column::SessionId.eq(session_id))
        .count(conn)
        .await?)
}

async fn remove_from_roster<C: ConnectionTrait>(
    conn: &C,
    session: &Session,
    user_id: &str,
    now: DateTime<Utc>,
) -> StoreResult<Departure> {
    let player = session
        .player(user_id)
        .ok_or_else(|| player_not_found(user_id))?;

    SessionPlayers::delete_many()
        .filter(session_players::Column::SessionId.eq(session.id.as_str()))
        .filter(session_players::Column::UserId.eq(user_id))
        .exec(conn)
        .await?;
    FoundWords::delete_many()
        .filter(found_words::Column::SessionId.eq(session.id.as_str()))
        .filter(found_words::Column::UserId.eq(user_id))
        .exec(conn)
        .await?;

    let mut departure = Departure {
        user_id: user_id.to_string(),
        display_name: player.display_name.clone(),
        final_score: player.score,
        new_host: None,
        session_deleted: false,
    };

    if count_players(conn, &session.id).await? == 0 {
        Sessions::delete_by_id(session.id.as_str()).exec(conn).await?;
        departure.session_deleted = true;
        info!("Session {} deleted: roster is empty", session.id);
        return Ok(departure);
    }

    if player.is_host {
        // The old host row is already gone, so the partial unique index
        // allows the promotion.
        if let Some(next) = RosterRules::next_host(&session.players, user_id) {
            SessionPlayers::update_many()
                .col_expr(session_players::Column::IsHost, Expr::value(true))
                .filter(session_players::Column::SessionId.eq(session.id.as_str()))
                .filter(session_players::Column::UserId.eq(next.user_id.as_str()))
                .exec(conn)
                .await?;
            info!(
                "Host of session {} passed from {} to {}",
                session.id, user_id, next.user_id
            );
            departure.new_host = Some(next.user_id.clone());
        }
    }

    touch(conn, &session.id, now).await?;
    Ok(departure)
}

async fn compare_and_set_phase<C: ConnectionTrait>(
    conn: &C,
    session: &Session,
    from: SessionPhase,
    change: &PhaseChange,
    now: DateTime<Utc>,
) -> StoreResult<bool> {
    check_transition(from, change.to)?;
    let result = Sessions::update_many()
        .col_expr(sessions::Column::Phase, Expr::value(change.to.as_str()))
        .col_expr(
            sessions::Column::CountdownEndsAt,
            Expr::value(change.countdown_ends_at.map(to_db)),
        )
        .col_expr(
            sessions::Column::StartedAt,
            Expr::value(change.started_at.map(to_db)),
        )
        .col_expr(sessions::Column::UpdatedAt, Expr::value(to_db(now)))
        .filter(sessions::Column::Id.eq(session.id.as_str()))
        .filter(sessions::Column::Phase.eq(from.as_str()))
        .filter(sessions::Column::RoundIndex.eq(session.round_index))
        .exec(conn)
        .await?;
    Ok(result.rows_affected == 1)
}

fn check_transition(from: SessionPhase, to: SessionPhase) -> StoreResult<()> {
    if PhaseRules::can_transition(from, to) {
        Ok(())
    } else {
        Err(StoreError::Corrupt(format!("illegal phase change {} -> {}", from, to)))
    }
}

async fn touch<C: ConnectionTrait>(conn: &C, session_id: &str, now: DateTime<Utc>) -> StoreResult<()> {
    Sessions::update_many()
        .col_expr(sessions::Column::UpdatedAt, Expr::value(to_db(now)))
        .filter(sessions::Column::Id.eq(session_id))
        .exec(conn)
        .await?;
    Ok(())
}

/// The rejection to report when a guarded update matched no row.
async fn lost_race<C: ConnectionTrait>(conn: &C, session_id: &str, expected: SessionPhase) -> StoreError {
    match Sessions::find_by_id(session_id).one(conn).await {
        Ok(Some(model)) => match SessionPhase::parse(&model.phase) {
            Some(current) => GameError::WrongPhase { current, expected }.into(),
            None => StoreError::Corrupt(format!("session {} has unknown phase", session_id)),
        },
        Ok(None) => GameError::SessionNotFound {
            session_id: session_id.to_string(),
        }
        .into(),
        Err(e) => e.into(),
    }
}

fn player_not_found(user_id: &str) -> GameError {
    GameError::PlayerNotFound {
        user_id: user_id.to_string(),
    }
}

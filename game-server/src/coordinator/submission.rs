use std::collections::{BTreeSet, HashSet};
use tracing::{debug, info, warn};

use game_core::{PhaseRules, ScoringEngine, normalize_word};
use game_persistence::StoreError;
use game_persistence::repositories::NewScoreRecord;
use game_types::{
    ArchiveRoundRequest, GameError, Player, ScoreRecord, Session, SessionPhase, SubmitWordResult,
};

use super::{CoordinatorResult, ReconciliationPolicy, SessionCoordinator};

impl SessionCoordinator {
    /// Score one word guess. Word-level rejections come back as data in the
    /// result; a missing session or player is an error.
    pub async fn submit_word(
        &self,
        session_id: &str,
        user_id: &str,
        word: &str,
    ) -> CoordinatorResult<SubmitWordResult> {
        let session = self.load(session_id).await?;
        let player = session
            .player(user_id)
            .ok_or_else(|| GameError::PlayerNotFound {
                user_id: user_id.to_string(),
            })?;

        let word = normalize_word(word);
        if let Err(reason) = check_submission(&session, player, &word, self.solver.min_length()) {
            debug!("Rejected '{}' from {} in {}: {}", word, user_id, session_id, reason);
            return Ok(SubmitWordResult::rejected(reason, player.score));
        }

        let points = ScoringEngine::score_for_length(word.chars().count());
        let recorded = self
            .sessions
            .record_found_word(
                session_id,
                user_id,
                session.round_index,
                &word,
                points,
                self.clock.now(),
            )
            .await;

        match recorded {
            Ok(Some(score)) => {
                debug!("{} scored '{}' for {} in {}", user_id, word, points, session_id);
                Ok(SubmitWordResult::accepted(points, score))
            }
            // Lost a race with a duplicate of the same guess
            Ok(None) => Ok(SubmitWordResult::rejected(
                GameError::AlreadyFound { word },
                player.score,
            )),
            Err(StoreError::Rejected(GameError::GameNotActive)) => Ok(SubmitWordResult::rejected(
                GameError::GameNotActive,
                player.score,
            )),
            Err(e) => Err(e.into()),
        }
    }

    /// Archive a player's finished round. The total is recomputed from the
    /// words that are valid for the round; the claimed total is only kept
    /// for comparison.
    pub async fn archive_round(
        &self,
        session_id: &str,
        user_id: &str,
        request: ArchiveRoundRequest,
    ) -> CoordinatorResult<ScoreRecord> {
        let session = self.load(session_id).await?;
        let player = session
            .player(user_id)
            .ok_or_else(|| GameError::PlayerNotFound {
                user_id: user_id.to_string(),
            })?;
        PhaseRules::require_phase(&session, SessionPhase::Finished)?;

        let valid: HashSet<&str> = session.valid_words.iter().map(String::as_str).collect();
        let words: Vec<String> = request
            .words
            .iter()
            .map(|w| normalize_word(w))
            .filter(|w| valid.contains(w.as_str()))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let score = ScoringEngine::total_for_words(&words);

        let flagged = score != request.claimed_score
            && self.settings.reconciliation == ReconciliationPolicy::Flag;
        if flagged {
            warn!(
                "Score mismatch for {} in session {} round {}: claimed {}, recomputed {}",
                user_id, session_id, session.round_index, request.claimed_score, score
            );
        } else if score != request.claimed_score {
            debug!(
                "Corrected claimed score {} to {} for {} in {}",
                request.claimed_score, score, user_id, session_id
            );
        }

        let (record, created) = self
            .history
            .archive(
                NewScoreRecord {
                    session_id: session.id.clone(),
                    user_id: user_id.to_string(),
                    display_name: player.display_name.clone(),
                    round_index: session.round_index,
                    base_word: session.base_word.clone(),
                    words,
                    claimed_score: request.claimed_score,
                    score,
                    flagged,
                },
                self.clock.now(),
            )
            .await?;

        if created {
            info!(
                "Archived round {} of session {} for {}: {} points",
                record.round_index, session_id, user_id, record.score
            );
        } else {
            debug!("Round {} of {} already archived for {}", record.round_index, session_id, user_id);
        }
        Ok(record)
    }

    pub async fn score_history(&self, user_id: &str, limit: u64) -> CoordinatorResult<Vec<ScoreRecord>> {
        Ok(self.history.history_for_user(user_id, limit).await?)
    }
}

/// Short-circuits on the first failed check: phase, length, repeat, then
/// dictionary membership.
fn check_submission(
    session: &Session,
    player: &Player,
    word: &str,
    min_length: usize,
) -> Result<(), GameError> {
    if session.phase != SessionPhase::Active {
        return Err(GameError::GameNotActive);
    }
    if word.chars().count() < min_length {
        return Err(GameError::TooShort {
            min_length: min_length as i32,
        });
    }
    if player.found_words.iter().any(|found| found == word) {
        return Err(GameError::AlreadyFound {
            word: word.to_string(),
        });
    }
    if !session.valid_words.iter().any(|valid| valid == word) {
        return Err(GameError::NotInDictionary {
            word: word.to_string(),
        });
    }
    Ok(())
}

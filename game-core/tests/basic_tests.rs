mod common;

use chrono::{Duration, Utc};
use common::*;
use game_core::{PhaseRules, ScoringEngine, TimeAuthority, WordSolver};
use game_types::SessionPhase;
use std::sync::Arc;

#[tokio::test]
async fn test_round_plays_out_on_pure_rules() {
    let solver = WordSolver::new(Arc::new(planet_dictionary()));
    let valid: Vec<String> = solver.compute_valid_words("planet").await.into_iter().collect();
    assert!(valid.contains(&"plan".to_string()));
    assert!(!valid.contains(&"planets".to_string()));
    assert!(!valid.contains(&"stamp".to_string()));

    let mut session = create_waiting_session("planet", valid);
    session.players[1].ready = true;
    assert!(PhaseRules::all_ready(&session.players));

    let t0 = Utc::now();
    start_round(&mut session, t0);
    assert_eq!(TimeAuthority::remaining_seconds(&session, t0), 60);
    assert_eq!(ScoringEngine::score_word("plan"), 300);

    let reconciled = PhaseRules::reconcile(session, t0 + Duration::seconds(61));
    assert!(reconciled.changed);
    assert_eq!(reconciled.session.phase, SessionPhase::Finished);
    assert_eq!(TimeAuthority::remaining_seconds(&reconciled.session, t0), 0);
}

#[tokio::test]
async fn test_every_solution_scores() {
    let solver = WordSolver::new(Arc::new(planet_dictionary()));
    let valid = solver.compute_valid_words("planet").await;
    assert!(valid.iter().all(|w| ScoringEngine::score_word(w) >= 100));
    assert!(valid.contains("planet"));
    assert_eq!(ScoringEngine::score_word("planet"), 2000);
}

#[test]
fn test_waiting_session_reports_full_time() {
    let session = create_waiting_session("planet", Vec::new());
    assert_eq!(TimeAuthority::remaining_seconds(&session, Utc::now()), 60);
    assert!(PhaseRules::require_phase(&session, SessionPhase::Waiting).is_ok());
    assert!(PhaseRules::require_host(&session, "test-player-host").is_ok());
}

use chrono::{DateTime, Utc};
use game_core::WordList;
use game_types::{Player, Session, SessionPhase};

/// A small dictionary around the base word "planet".
pub fn planet_dictionary() -> WordList {
    WordList::new(
        "planet plane plant panel plate pleat petal leapt plan lane lean leap pale \
         peal pant pelt tape late tale teal neat ant tan pan nap pen net ten lap pal \
         pat tap apt eat tea ate ale let pet nape planets stamp clap",
    )
}

pub fn create_test_player(name: &str, is_host: bool) -> Player {
    Player {
        user_id: format!("test-player-{}", name.to_lowercase()),
        display_name: name.to_string(),
        is_host,
        ready: false,
        score: 0,
        found_words: Vec::new(),
        joined_at: Utc::now(),
    }
}

/// A waiting session with a host and one guest.
pub fn create_waiting_session(base_word: &str, valid_words: Vec<String>) -> Session {
    let now = Utc::now();
    Session {
        id: "CORE01".to_string(),
        base_word: base_word.to_string(),
        phase: SessionPhase::Waiting,
        round_index: 1,
        time_limit_seconds: 60,
        max_players: 2,
        is_public: false,
        countdown_ends_at: None,
        started_at: None,
        valid_words,
        players: vec![
            create_test_player("Host", true),
            create_test_player("Guest", false),
        ],
        created_at: now,
        updated_at: now,
    }
}

pub fn start_round(session: &mut Session, at: DateTime<Utc>) {
    session.phase = SessionPhase::Active;
    session.started_at = Some(at);
}

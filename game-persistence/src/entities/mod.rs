pub mod prelude;

pub mod dictionary_words;
pub mod found_words;
pub mod score_history;
pub mod session_players;
pub mod sessions;

pub use super::dictionary_words::Entity as DictionaryWords;
pub use super::found_words::Entity as FoundWords;
pub use super::score_history::Entity as ScoreHistory;
pub use super::session_players::Entity as SessionPlayers;
pub use super::sessions::Entity as Sessions;

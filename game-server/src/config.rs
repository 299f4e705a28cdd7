use std::env;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

use crate::coordinator::{CoordinatorSettings, ReconciliationPolicy};
use game_core::MIN_WORD_LENGTH;
use game_types::SessionSettings;

const MAX_COUNTDOWN_SECONDS: i64 = 300;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub words_file: Option<String>,
    pub default_time_limit_seconds: i32,
    pub default_max_players: i32,
    pub max_players_limit: i32,
    pub default_word_length: i32,
    pub min_word_length: usize,
    pub start_countdown_seconds: i64,
    pub sweep_interval_seconds: u64,
    pub stale_waiting_minutes: u64,
    pub stale_active_minutes: u64,
    pub flag_score_mismatch: bool,
}

impl Config {
    pub fn new() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Missing keys take the default;
    /// unparseable ones take it too, with a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = SessionSettings::default();
        Self {
            host: lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: parse_or(&lookup, "PORT", 8080),
            database_url: lookup("DATABASE_URL")
                .unwrap_or_else(|| "sqlite://word_hunt.db?mode=rwc".to_string()),
            words_file: lookup("WORDS_FILE").filter(|path| !path.trim().is_empty()),
            default_time_limit_seconds: parse_or(
                &lookup,
                "DEFAULT_TIME_LIMIT_SECONDS",
                defaults.time_limit_seconds,
            ),
            default_max_players: parse_or(&lookup, "DEFAULT_MAX_PLAYERS", defaults.max_players),
            max_players_limit: parse_or(&lookup, "MAX_PLAYERS_LIMIT", 16),
            default_word_length: parse_or(&lookup, "DEFAULT_WORD_LENGTH", defaults.word_length),
            min_word_length: parse_or(&lookup, "MIN_WORD_LENGTH", MIN_WORD_LENGTH),
            start_countdown_seconds: parse_or(&lookup, "START_COUNTDOWN_SECONDS", 3),
            sweep_interval_seconds: parse_or(&lookup, "SWEEP_INTERVAL_SECONDS", 60),
            stale_waiting_minutes: parse_or(&lookup, "STALE_WAITING_MINUTES", 60),
            stale_active_minutes: parse_or(&lookup, "STALE_ACTIVE_MINUTES", 120),
            flag_score_mismatch: parse_or(&lookup, "FLAG_SCORE_MISMATCH", false),
        }
    }

    pub fn coordinator_settings(&self) -> CoordinatorSettings {
        CoordinatorSettings {
            defaults: SessionSettings {
                time_limit_seconds: self.default_time_limit_seconds,
                max_players: self.default_max_players,
                is_public: false,
                word_length: self.default_word_length,
            },
            max_players_limit: self.max_players_limit,
            start_countdown: chrono::Duration::seconds(
                self.start_countdown_seconds.clamp(0, MAX_COUNTDOWN_SECONDS),
            ),
            reconciliation: if self.flag_score_mismatch {
                ReconciliationPolicy::Flag
            } else {
                ReconciliationPolicy::Lenient
            },
            stale_waiting: minutes(self.stale_waiting_minutes),
            stale_active: minutes(self.stale_active_minutes),
            ..CoordinatorSettings::default()
        }
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_seconds.max(1))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

fn minutes(count: u64) -> Duration {
    Duration::from_secs(count.saturating_mul(60))
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|e| {
            warn!("Invalid {}='{}' ({}), using {}", key, raw, e, default);
            default
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert_eq!(config.default_time_limit_seconds, 120);
        assert_eq!(config.default_max_players, 8);
        assert_eq!(config.max_players_limit, 16);
        assert_eq!(config.default_word_length, 6);
        assert_eq!(config.min_word_length, 3);
        assert!(config.words_file.is_none());
        assert!(!config.flag_score_mismatch);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = config_from(&[("PORT", "eighty"), ("DEFAULT_MAX_PLAYERS", "-")]);
        assert_eq!(config.port, 8080);
        assert_eq!(config.default_max_players, 8);
    }

    #[test]
    fn test_coordinator_settings() {
        let config = config_from(&[
            ("START_COUNTDOWN_SECONDS", "0"),
            ("FLAG_SCORE_MISMATCH", "true"),
            ("STALE_WAITING_MINUTES", "5"),
        ]);
        let settings = config.coordinator_settings();
        assert_eq!(settings.start_countdown, chrono::Duration::zero());
        assert_eq!(settings.reconciliation, ReconciliationPolicy::Flag);
        assert_eq!(settings.stale_waiting, Duration::from_secs(300));
        assert_eq!(settings.defaults.word_length, 6);
    }

    #[test]
    fn test_huge_durations_saturate() {
        let huge = u64::MAX.to_string();
        let config = config_from(&[
            ("STALE_WAITING_MINUTES", huge.as_str()),
            ("STALE_ACTIVE_MINUTES", huge.as_str()),
            ("START_COUNTDOWN_SECONDS", "9223372036854775807"),
        ]);
        let settings = config.coordinator_settings();
        assert_eq!(settings.stale_waiting, Duration::from_secs(u64::MAX));
        assert_eq!(settings.stale_active, Duration::from_secs(u64::MAX));
        assert_eq!(settings.start_countdown, chrono::Duration::seconds(300));
    }
}

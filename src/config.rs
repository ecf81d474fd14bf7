//! Game tuning and server settings, loaded from the environment.

use std::net::SocketAddr;
use std::ops::RangeInclusive;
use std::path::PathBuf;
use std::time::Duration;

use crate::types::ValueRange;

/// Default range table: non-overlapping bands across orders of magnitude
pub const DEFAULT_VALUE_RANGES: &[(u64, u64)] = &[
    (500, 999),
    (1_000, 4_999),
    (5_000, 9_999),
    (10_000, 24_999),
    (25_000, 49_999),
    (50_000, 99_999),
    (100_000, 500_000),
];

/// Encouraging messages for a correct answer.
/// Placeholders: `{winner}`, `{correct}`, `{incorrect}`.
pub const DEFAULT_CORRECT_MESSAGES: &[&str] = &[
    "Nice! {winner} has {correct} stars vs {incorrect}.",
    "Correct! {correct} beats {incorrect}.",
    "You know your repos: {correct} vs {incorrect}.",
    "Spot on! {winner} wins with {correct} stars to {incorrect}.",
    "Stellar! {correct} stars vs {incorrect}.",
];

pub const DEFAULT_INCORRECT_MESSAGE: &str = "Nope! {winner} has {correct} stars vs {incorrect}.";

/// Verdict message for unknown, consumed, malformed or expired rounds
pub const GENERIC_LOSS_MESSAGE: &str = "Wrong!";

/// Longest accepted round window
pub const MAX_ROUND_SECONDS: u64 = 24 * 60 * 60;

/// Longest accepted retention past expiry
pub const MAX_REAPER_GRACE_SECONDS: u64 = 7 * 24 * 60 * 60;

#[derive(Debug, Clone)]
pub struct GameConfig {
    pub value_ranges: Vec<ValueRange>,
    pub round_duration: Duration,
    pub reward_points: u32,
    pub correct_messages: Vec<String>,
    pub incorrect_message: String,
    /// How long past expiry a round is kept so retried submissions still
    /// find their cached verdict
    pub reaper_grace: Duration,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            value_ranges: default_ranges(),
            round_duration: Duration::from_secs(30),
            reward_points: 50,
            correct_messages: DEFAULT_CORRECT_MESSAGES
                .iter()
                .map(|m| m.to_string())
                .collect(),
            incorrect_message: DEFAULT_INCORRECT_MESSAGE.to_string(),
            reaper_grace: Duration::from_secs(60),
        }
    }
}

fn default_ranges() -> Vec<ValueRange> {
    DEFAULT_VALUE_RANGES
        .iter()
        .map(|&(min, max)| ValueRange::new(min, max))
        .collect()
}

impl GameConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let value_ranges = match std::env::var("GAME_VALUE_RANGES") {
            Ok(raw) => match parse_ranges(&raw) {
                Ok(ranges) => ranges,
                Err(e) => {
                    tracing::warn!("Ignoring GAME_VALUE_RANGES ({}), using defaults", e);
                    defaults.value_ranges
                }
            },
            Err(_) => defaults.value_ranges,
        };

        let round_duration =
            seconds_var("GAME_ROUND_SECONDS", 1..=MAX_ROUND_SECONDS, defaults.round_duration);

        let reward_points = std::env::var("GAME_REWARD_POINTS")
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(defaults.reward_points);

        let correct_messages = std::env::var("GAME_CORRECT_MESSAGES")
            .ok()
            .map(|raw| {
                raw.split('|')
                    .map(str::trim)
                    .filter(|m| !m.is_empty())
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .filter(|messages| !messages.is_empty())
            .unwrap_or(defaults.correct_messages);

        let reaper_grace = seconds_var(
            "GAME_REAPER_GRACE_SECONDS",
            0..=MAX_REAPER_GRACE_SECONDS,
            defaults.reaper_grace,
        );

        tracing::info!(
            ranges = value_ranges.len(),
            round_secs = round_duration.as_secs(),
            reward_points,
            "Game config loaded"
        );

        Self {
            value_ranges,
            round_duration,
            reward_points,
            correct_messages,
            incorrect_message: defaults.incorrect_message,
            reaper_grace,
        }
    }
}

/// Read a whole number of seconds, falling back to `default` when unset,
/// unparseable or outside `allowed`
fn seconds_var(key: &str, allowed: RangeInclusive<u64>, default: Duration) -> Duration {
    let Ok(raw) = std::env::var(key) else {
        return default;
    };

    match raw.trim().parse::<u64>() {
        Ok(secs) if allowed.contains(&secs) => Duration::from_secs(secs),
        _ => {
            tracing::warn!(
                "Ignoring {} '{}' (expected {}..={} seconds), using {}s",
                key,
                raw,
                allowed.start(),
                allowed.end(),
                default.as_secs()
            );
            default
        }
    }
}

/// Parse a comma-separated range table, rejecting empty or overlapping tables
pub fn parse_ranges(raw: &str) -> Result<Vec<ValueRange>, String> {
    let mut ranges = raw
        .split(',')
        .filter(|part| !part.trim().is_empty())
        .map(str::parse::<ValueRange>)
        .collect::<Result<Vec<_>, _>>()?;

    if ranges.is_empty() {
        return Err("range table is empty".to_string());
    }

    ranges.sort_by_key(|r| r.min);
    for pair in ranges.windows(2) {
        if pair[0].overlaps(&pair[1]) {
            return Err(format!("ranges {} and {} overlap", pair[0], pair[1]));
        }
    }

    Ok(ranges)
}

/// Process-level settings for the HTTP server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    /// Snapshot file for the round store; memory-only when unset
    pub store_path: Option<PathBuf>,
    /// Directory holding a built frontend, served as fallback
    pub static_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            // 7827 spells "STAR" on a phone keypad
            addr: SocketAddr::from(([0, 0, 0, 0], 7827)),
            store_path: None,
            static_dir: None,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let addr = match std::env::var("STARDASH_ADDR") {
            Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
                tracing::warn!("Invalid STARDASH_ADDR '{}', using {}", raw, defaults.addr);
                defaults.addr
            }),
            Err(_) => defaults.addr,
        };

        let path_var = |key: &str| {
            std::env::var(key)
                .ok()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .map(PathBuf::from)
        };

        Self {
            addr,
            store_path: path_var("ROUND_STORE_PATH"),
            static_dir: path_var("STATIC_DIR"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_default_config() {
        let config = GameConfig::default();
        assert_eq!(config.round_duration, Duration::from_secs(30));
        assert_eq!(config.reward_points, 50);
        assert_eq!(config.value_ranges.len(), DEFAULT_VALUE_RANGES.len());
        assert!(parse_ranges("500-999,1000-4999").is_ok());
    }

    #[test]
    fn test_default_ranges_do_not_overlap() {
        let ranges = default_ranges();
        for pair in ranges.windows(2) {
            assert!(!pair[0].overlaps(&pair[1]));
        }
    }

    #[test]
    fn test_parse_ranges() {
        let ranges = parse_ranges("10000-20000, 1000-9999").unwrap();
        assert_eq!(
            ranges,
            vec![ValueRange::new(1000, 9999), ValueRange::new(10000, 20000)]
        );

        assert!(parse_ranges("").is_err());
        assert!(parse_ranges("1-10,5-20").unwrap_err().contains("overlap"));
        assert!(parse_ranges("1-10,x").is_err());
    }

    #[test]
    #[serial]
    fn test_game_config_from_env() {
        std::env::set_var("GAME_VALUE_RANGES", "1000-9999");
        std::env::set_var("GAME_ROUND_SECONDS", "45");
        std::env::set_var("GAME_REWARD_POINTS", "10");
        std::env::set_var("GAME_CORRECT_MESSAGES", "Yes {correct}| |Also {incorrect}");

        let config = GameConfig::from_env();
        assert_eq!(config.value_ranges, vec![ValueRange::new(1000, 9999)]);
        assert_eq!(config.round_duration, Duration::from_secs(45));
        assert_eq!(config.reward_points, 10);
        assert_eq!(
            config.correct_messages,
            vec!["Yes {correct}".to_string(), "Also {incorrect}".to_string()]
        );

        std::env::set_var("GAME_VALUE_RANGES", "1-10,5-20");
        std::env::set_var("GAME_ROUND_SECONDS", "0");
        let config = GameConfig::from_env();
        assert_eq!(config.value_ranges, default_ranges());
        assert_eq!(config.round_duration, Duration::from_secs(30));

        for key in [
            "GAME_VALUE_RANGES",
            "GAME_ROUND_SECONDS",
            "GAME_REWARD_POINTS",
            "GAME_CORRECT_MESSAGES",
        ] {
            std::env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn test_out_of_range_durations_fall_back() {
        std::env::set_var("GAME_ROUND_SECONDS", (1u64 << 50).to_string());
        std::env::set_var("GAME_REAPER_GRACE_SECONDS", u64::MAX.to_string());

        let config = GameConfig::from_env();
        assert_eq!(config.round_duration, Duration::from_secs(30));
        assert_eq!(config.reaper_grace, Duration::from_secs(60));

        std::env::set_var("GAME_ROUND_SECONDS", MAX_ROUND_SECONDS.to_string());
        std::env::set_var("GAME_REAPER_GRACE_SECONDS", "0");

        let config = GameConfig::from_env();
        assert_eq!(config.round_duration, Duration::from_secs(MAX_ROUND_SECONDS));
        assert_eq!(config.reaper_grace, Duration::ZERO);

        for key in ["GAME_ROUND_SECONDS", "GAME_REAPER_GRACE_SECONDS"] {
            std::env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn test_server_config_from_env() {
        std::env::set_var("STARDASH_ADDR", "127.0.0.1:8080");
        std::env::set_var("ROUND_STORE_PATH", "/tmp/rounds.json");
        std::env::set_var("STATIC_DIR", "  ");

        let config = ServerConfig::from_env();
        assert_eq!(config.addr, "127.0.0.1:8080".parse().unwrap());
        assert_eq!(config.store_path, Some(PathBuf::from("/tmp/rounds.json")));
        assert!(config.static_dir.is_none());

        std::env::set_var("STARDASH_ADDR", "garbage");
        assert_eq!(ServerConfig::from_env().addr, ServerConfig::default().addr);

        for key in ["STARDASH_ADDR", "ROUND_STORE_PATH", "STATIC_DIR"] {
            std::env::remove_var(key);
        }
    }
}

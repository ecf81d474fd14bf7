mod github;

use async_trait::async_trait;
use std::time::Duration;

use crate::types::{Candidate, ValueRange};

pub use github::GitHubSource;

/// Result type for candidate source operations
pub type SourceResult<T> = Result<T, SourceError>;

/// Errors that can occur while fetching a candidate pool
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("candidate source unavailable (status {status:?}): {message}")]
    Unavailable {
        status: Option<u16>,
        message: String,
    },

    #[error("candidate source returned malformed data: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        Self::Unavailable {
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }
}

/// Smallest pool that can still yield two distinct candidates
pub const MIN_POOL_SIZE: u32 = 2;

/// Largest page the search endpoint will return
pub const MAX_POOL_SIZE: u32 = 100;

/// A ranked external source of candidates.
///
/// Implementations issue one query per call and never retry; retry policy
/// belongs to whoever calls the round engine.
#[async_trait]
pub trait CandidateSource: Send + Sync {
    /// Fetch candidates whose ranking metric falls within `range`,
    /// sorted by metric descending
    async fn fetch_candidate_pool(&self, range: ValueRange) -> SourceResult<Vec<Candidate>>;

    /// Get the name of this source
    fn name(&self) -> &str;
}

/// Configuration for the ranked-search source
#[derive(Debug, Clone)]
pub struct SourceConfig {
    /// Base URL of the search API
    pub api_url: String,
    /// Optional bearer token (raises the search rate limit)
    pub token: Option<String>,
    /// Sent as User-Agent; the search API rejects anonymous clients
    pub user_agent: String,
    /// Number of items requested per query
    pub pool_size: u32,
    /// Extra search qualifier narrowing the item type
    pub item_filter: String,
    pub timeout: Duration,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.github.com".to_string(),
            token: None,
            user_agent: format!("stardash/{}", env!("CARGO_PKG_VERSION")),
            pool_size: 30,
            item_filter: "fork:false".to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

impl SourceConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let api_url = non_empty_var("SOURCE_API_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or(defaults.api_url);

        let token = non_empty_var("GITHUB_TOKEN");

        let pool_size = std::env::var("SOURCE_POOL_SIZE")
            .ok()
            .and_then(|s| s.trim().parse::<u32>().ok())
            .map(|size| size.clamp(MIN_POOL_SIZE, MAX_POOL_SIZE))
            .unwrap_or(defaults.pool_size);

        let item_filter = match std::env::var("SOURCE_ITEM_FILTER") {
            Ok(filter) => filter.trim().to_string(),
            Err(_) => defaults.item_filter,
        };

        let timeout = std::env::var("SOURCE_TIMEOUT")
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.timeout);

        Self {
            api_url,
            token,
            user_agent: defaults.user_agent,
            pool_size,
            item_filter,
            timeout,
        }
    }

    /// Search query selecting items in `range`
    pub fn query_for(&self, range: ValueRange) -> String {
        let stars = format!("stars:{}..{}", range.min, range.max);
        if self.item_filter.is_empty() {
            stars
        } else {
            format!("{} {}", stars, self.item_filter)
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

/// Render a metric the way the search UI does: 950, 4.2k, 1.3m
pub fn format_metric(value: u64) -> String {
    match value {
        0..=999 => value.to_string(),
        1_000..=999_999 => format!("{:.1}k", value as f64 / 1_000.0),
        _ => format!("{:.1}m", value as f64 / 1_000_000.0),
    }
}

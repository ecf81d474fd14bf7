use super::*;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use serde::Deserialize;
use std::time::Instant;

/// GitHub repository search, ranked by stargazer count
pub struct GitHubSource {
    config: SourceConfig,
    client: reqwest::Client,
}

impl GitHubSource {
    /// Create a new source with a pooled HTTP client
    pub fn new(config: SourceConfig) -> SourceResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self { config, client })
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    total_count: u64,
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    full_name: String,
    stargazers_count: u64,
    #[serde(default)]
    description: Option<String>,
}

impl From<SearchItem> for Candidate {
    fn from(item: SearchItem) -> Self {
        Candidate {
            display_metric: format_metric(item.stargazers_count),
            identifier: item.full_name,
            comparison_value: item.stargazers_count,
            description: item.description.unwrap_or_default(),
        }
    }
}

#[async_trait]
impl CandidateSource for GitHubSource {
    async fn fetch_candidate_pool(&self, range: ValueRange) -> SourceResult<Vec<Candidate>> {
        let start = Instant::now();
        let url = format!("{}/search/repositories", self.config.api_url);

        let mut request = self
            .client
            .get(&url)
            .query(&[
                ("q", self.config.query_for(range)),
                ("sort", "stars".to_string()),
                ("order", "desc".to_string()),
                ("per_page", self.config.pool_size.to_string()),
            ])
            .header(ACCEPT, "application/vnd.github+json");

        if let Some(token) = &self.config.token {
            request = request.header(AUTHORIZATION, format!("Bearer {}", token));
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Unavailable {
                status: Some(status.as_u16()),
                message: format!("search returned {}: {}", status, body.trim()),
            });
        }

        let body = response.text().await?;
        let parsed: SearchResponse =
            serde_json::from_str(&body).map_err(|e| SourceError::Malformed(e.to_string()))?;

        let returned = parsed.items.len();
        // Star counts move between indexing and the query; drop stragglers
        let pool: Vec<Candidate> = parsed
            .items
            .into_iter()
            .filter(|item| range.contains(item.stargazers_count))
            .map(Candidate::from)
            .collect();

        tracing::debug!(
            range = %range,
            total_count = parsed.total_count,
            returned,
            kept = pool.len(),
            latency_ms = start.elapsed().as_millis() as u64,
            "Fetched candidate pool"
        );

        Ok(pool)
    }

    fn name(&self) -> &str {
        "github"
    }
}

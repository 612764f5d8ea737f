use crate::error::{Result, StarSyncError};
use crate::models::{BatchResult, Descriptor, RateLimitState, RepoRef};
use crate::types::{GraphQlRateLimit, GraphQlRequest, GraphQlResponse, RepositoryStars};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

pub const GRAPHQL_URL: &str = "https://api.github.com/graphql";
const REPO_URL_PREFIX: &str = "https://github.com/";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Anything that can resolve star counts for a batch of descriptors.
///
/// `counts` in the result must have one entry per input descriptor, in
/// input order.
#[async_trait]
pub trait StarSource: Send + Sync {
    async fn fetch_batch(&self, batch: &[Descriptor]) -> Result<BatchResult>;
}

/// Split a `github_repo` URL into its owner and name.
pub fn parse_repo_url(url: &str) -> Result<RepoRef> {
    let path = url.strip_prefix(REPO_URL_PREFIX).unwrap_or(url);
    let parts: Vec<&str> = path.split('/').collect();

    match parts.as_slice() {
        [owner, name] if !owner.is_empty() && !name.is_empty() => Ok(RepoRef {
            owner: owner.to_string(),
            name: name.to_string(),
        }),
        _ => Err(StarSyncError::InvalidRepoUrl(url.to_string())),
    }
}

pub fn alias(position: usize) -> String {
    format!("repo{}", position)
}

/// Build one GraphQL document resolving every resolvable position.
///
/// Aliases carry the position within the batch, so unresolvable entries
/// leave a gap instead of shifting later results.
pub fn build_query(refs: &[Option<RepoRef>]) -> Option<String> {
    let mut fields = Vec::new();

    for (position, repo) in refs.iter().enumerate() {
        let Some(repo) = repo else { continue };
        fields.push(format!(
            "  {}: repository(owner: {}, name: {}) {{ stargazerCount }}",
            alias(position),
            graphql_string(&repo.owner),
            graphql_string(&repo.name),
        ));
    }

    if fields.is_empty() {
        return None;
    }

    fields.push("  rateLimit { cost remaining limit resetAt }".to_string());
    Some(format!("query {{\n{}\n}}", fields.join("\n")))
}

// JSON string escaping is a valid GraphQL string literal.
fn graphql_string(value: &str) -> String {
    serde_json::Value::from(value).to_string()
}

/// Map a GraphQL response back onto `len` batch positions.
///
/// Positions with no data (null, missing or malformed) resolve to zero.
pub fn resolve_counts(len: usize, response: &GraphQlResponse) -> Vec<u64> {
    (0..len)
        .map(|position| {
            response
                .data
                .as_ref()
                .and_then(|data| data.get(&alias(position)))
                .filter(|value| !value.is_null())
                .and_then(|value| serde_json::from_value::<RepositoryStars>(value.clone()).ok())
                .map(|repo| repo.stargazer_count)
                .unwrap_or(0)
        })
        .collect()
}

fn rate_limit_of(response: &GraphQlResponse) -> Option<RateLimitState> {
    let raw = response.data.as_ref()?.get("rateLimit")?.clone();
    serde_json::from_value::<GraphQlRateLimit>(raw).ok().map(RateLimitState::from)
}

pub struct GitHubClient {
    client: Client,
    endpoint: Url,
    token: String,
}

impl GitHubClient {
    pub fn new(token: String) -> Result<Self> {
        let endpoint = Url::parse(GRAPHQL_URL)
            .map_err(|e| StarSyncError::EnvError(format!("Invalid GraphQL URL: {}", e)))?;
        Self::with_endpoint(token, endpoint)
    }

    pub fn with_endpoint(token: String, endpoint: Url) -> Result<Self> {
        if token.trim().is_empty() {
            return Err(StarSyncError::AuthError("GitHub token is empty".to_string()));
        }

        let client = Client::builder()
            .user_agent(concat!("github-star-sync/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(GitHubClient {
            client,
            endpoint,
            token,
        })
    }

    /// POST a single GraphQL document. Non-success statuses are errors;
    /// partial `errors` in a successful response are not.
    pub async fn query(&self, query: String) -> Result<GraphQlResponse> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.token)
            .json(&GraphQlRequest { query })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StarSyncError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        let parsed: GraphQlResponse = serde_json::from_str(&body)?;
        Ok(parsed)
    }
}

#[async_trait]
impl StarSource for GitHubClient {
    async fn fetch_batch(&self, batch: &[Descriptor]) -> Result<BatchResult> {
        let refs: Vec<Option<RepoRef>> = batch
            .iter()
            .map(|descriptor| {
                let url = descriptor.github_repo().unwrap_or_default();
                match parse_repo_url(url) {
                    Ok(repo) => Some(repo),
                    Err(e) => {
                        warn!(
                            slug = %descriptor.slug,
                            error = %e,
                            "Unresolvable repository, defaulting to 0"
                        );
                        None
                    }
                }
            })
            .collect();

        let Some(query) = build_query(&refs) else {
            debug!(size = batch.len(), "No resolvable repositories in batch, skipping request");
            return Ok(BatchResult {
                counts: vec![0; batch.len()],
                rate_limit: None,
            });
        };

        let response = self.query(query).await?;

        for error in response.errors.iter().flatten() {
            let slug = error
                .alias()
                .and_then(|alias| alias.strip_prefix("repo"))
                .and_then(|position| position.parse::<usize>().ok())
                .and_then(|position| batch.get(position))
                .map(|descriptor| descriptor.slug.as_str())
                .unwrap_or("-");
            warn!(
                %slug,
                kind = error.kind.as_deref().unwrap_or("UNKNOWN"),
                "GitHub reported a partial error: {}",
                error.message
            );
        }

        let rate_limit = rate_limit_of(&response);
        if let Some(state) = &rate_limit {
            debug!(
                cost = state.cost,
                remaining = state.remaining,
                limit = state.limit,
                "GraphQL rate limit"
            );
            if state.is_low() {
                warn!(
                    remaining = state.remaining,
                    reset = %state.reset_time,
                    "⚠️ GitHub GraphQL rate limit running low"
                );
            }
        }

        Ok(BatchResult {
            counts: resolve_counts(batch.len(), &response),
            rate_limit,
        })
    }
}

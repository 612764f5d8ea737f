use crate::types::GraphQlRateLimit;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::fmt;
use std::path::PathBuf;

/// Name of the descriptor file inside each project folder.
pub const DESCRIPTOR_FILE: &str = "project.json";

/// One project descriptor loaded from `<root>/<slug>/project.json`
#[derive(Debug, Clone)]
pub struct Descriptor {
    pub slug: String,
    pub path: PathBuf,
    /// Full JSON object, insertion order preserved.
    pub record: Map<String, Value>,
}

impl Descriptor {
    pub fn github_repo(&self) -> Option<&str> {
        self.record.get("github_repo").and_then(Value::as_str)
    }

    pub fn stored_stars(&self) -> Option<&Value> {
        self.record.get("stars")
    }

    /// True when `fetched` is not the value currently recorded.
    ///
    /// An absent or non-numeric `stars` always counts as a change, even
    /// when the fetched count is zero.
    pub fn stars_differ(&self, fetched: u64) -> bool {
        match self.stored_stars() {
            Some(Value::Number(n)) if n.is_f64() => n.as_f64() != Some(fetched as f64),
            Some(Value::Number(n)) => n.as_u64() != Some(fetched),
            _ => true,
        }
    }

    pub fn set_stars(&mut self, stars: u64) {
        self.record.insert("stars".to_string(), Value::from(stars));
    }
}

/// Owner/name pair identifying a repository on GitHub
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// GraphQL rate limit state reported alongside each batch
#[derive(Debug, Clone)]
pub struct RateLimitState {
    pub cost: u32,
    pub remaining: u32,
    pub limit: u32,
    pub reset_time: DateTime<Utc>,
}

impl RateLimitState {
    pub fn is_low(&self) -> bool {
        self.remaining < self.limit / 20
    }
}

impl From<GraphQlRateLimit> for RateLimitState {
    fn from(raw: GraphQlRateLimit) -> Self {
        let reset_time = DateTime::parse_from_rfc3339(&raw.reset_at)
            .map(|t| t.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now() + chrono::Duration::hours(1));

        Self {
            cost: raw.cost,
            remaining: raw.remaining,
            limit: raw.limit,
            reset_time,
        }
    }
}

/// Counts for one batch, positionally aligned with the batch's descriptors
#[derive(Debug, Clone)]
pub struct BatchResult {
    pub counts: Vec<u64>,
    pub rate_limit: Option<RateLimitState>,
}

/// What happened to a single descriptor after its batch resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Updated { from: Option<u64>, to: u64 },
    WouldUpdate { from: Option<u64>, to: u64 },
    Unchanged(u64),
    WriteFailed,
}

/// Aggregated counters for one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncSummary {
    pub scanned: usize,
    pub loaded: usize,
    pub skipped_descriptors: usize,
    pub batches: usize,
    pub failed_batches: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub failed_descriptors: usize,
}

impl SyncSummary {
    pub fn record(&mut self, outcome: &SyncOutcome) {
        match outcome {
            SyncOutcome::Updated { .. } | SyncOutcome::WouldUpdate { .. } => self.updated += 1,
            SyncOutcome::Unchanged(_) => self.unchanged += 1,
            SyncOutcome::WriteFailed => self.failed_descriptors += 1,
        }
    }
}

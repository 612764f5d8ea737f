use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

// GitHub GraphQL request/response structures

#[derive(Debug, Serialize)]
pub struct GraphQlRequest {
    pub query: String,
}

#[derive(Debug, Deserialize)]
pub struct GraphQlResponse {
    #[serde(default)]
    pub data: Option<HashMap<String, Value>>,
    #[serde(default)]
    pub errors: Option<Vec<GraphQlError>>,
}

#[derive(Debug, Deserialize)]
pub struct GraphQlError {
    pub message: String,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub path: Option<Vec<Value>>,
}

impl GraphQlError {
    /// First path segment, which is the alias of the field that failed.
    pub fn alias(&self) -> Option<&str> {
        self.path.as_ref()?.first()?.as_str()
    }
}

#[derive(Debug, Deserialize)]
pub struct RepositoryStars {
    #[serde(rename = "stargazerCount")]
    pub stargazer_count: u64,
}

#[derive(Debug, Deserialize)]
pub struct GraphQlRateLimit {
    pub cost: u32,
    pub remaining: u32,
    pub limit: u32,
    #[serde(rename = "resetAt")]
    pub reset_at: String,
}

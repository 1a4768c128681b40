//! GitHub code search tool
//!
//! Issues one bounded request against the code search API and reduces the
//! file-level hits to the repositories that own them.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::GithubConfig;

use super::{Tool, ToolError, ToolOutput, ToolResult, CODE_SEARCH};

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    html_url: String,
}

/// Code search against the GitHub REST API
pub struct CodeSearchTool {
    client: Client,
    search_url: String,
    token: Option<String>,
    per_page: u32,
}

impl CodeSearchTool {
    /// Build a search tool from configuration
    pub fn new(config: &GithubConfig) -> Result<Self, ToolError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("leakhunt/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ToolError::Http(e.to_string()))?;

        Ok(Self {
            client,
            search_url: config.search_url.clone(),
            token: config.token.clone(),
            per_page: config.per_page,
        })
    }

    /// Run the search and return owning repositories in first-seen order
    pub async fn search(&self, query: &str) -> Result<Vec<String>, ToolError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ToolError::InvalidInput("empty search query".to_string()));
        }

        debug!(%query, "searching code");

        let per_page = self.per_page.to_string();
        let mut request = self
            .client
            .get(&self.search_url)
            .header("Accept", "application/vnd.github+json")
            .query(&[("q", query), ("per_page", per_page.as_str()), ("page", "1")]);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ToolError::Http(e.to_string()))?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "code search failed");
            return Err(ToolError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| ToolError::Parse(e.to_string()))?;

        Ok(extract_repositories(
            parsed.items.iter().map(|item| item.html_url.as_str()),
        ))
    }
}

#[async_trait]
impl Tool for CodeSearchTool {
    fn name(&self) -> &str {
        CODE_SEARCH
    }

    fn description(&self) -> &str {
        "Search public code with the GitHub code search grammar and list the owning repositories"
    }

    async fn invoke(&self, input: &str) -> ToolResult {
        self.search(input).await.map(ToolOutput::Repositories)
    }
}

/// Collapse file URLs to repository roots, keeping first-seen order
///
/// `https://github.com/owner/repo/blob/main/src/a.rs` becomes
/// `https://github.com/owner/repo`.
pub fn extract_repositories<'a>(urls: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut repositories: Vec<String> = Vec::new();
    for url in urls {
        let root = match url.split_once("/blob/") {
            Some((root, _)) => root,
            None => url,
        };
        let root = root.trim_end_matches('/');
        if root.is_empty() {
            continue;
        }
        if !repositories.iter().any(|r| r == root) {
            repositories.push(root.to_string());
        }
    }
    repositories
}

/// Build a code search query for a brand from credential markers
///
/// `hdfc` with the default markers becomes
/// `hdfc AND (api_key= OR apikey= OR access_token= OR secret= OR password=)`.
pub fn brand_query(brand: &str, terms: &[String]) -> String {
    let brand = brand.trim();
    if terms.is_empty() {
        return brand.to_string();
    }
    format!("{} AND ({})", brand, terms.join(" OR "))
}

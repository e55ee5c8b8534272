//! Live web search: one query against the DuckDuckGo html endpoint, then a
//! fetch of the top result and extraction of its readable text.
pub mod client;
pub mod extract;
pub mod links;
pub mod system;

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const SEARCH_BASE_URL: &str = "https://html.duckduckgo.com";
pub const SEARCH_ORIGIN: &str = "https://duckduckgo.com";
pub const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Settings for the search tool. The defaults are the values the fallback
/// ladder is tuned for; tests point the urls at a local mock server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Base of the results page, the query goes to `{base_url}/html/?q=`
    pub base_url: String,
    /// Origin prefixed to root-relative result links
    pub origin: String,
    pub user_agent: String,
    pub timeout_secs: u64,
    /// How many result anchors to collect from the results page
    pub max_results: usize,
    pub extract: ExtractConfig,
    /// Extracted content must be longer than this to be returned as a source
    pub min_content_length: usize,
}

impl SearchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            base_url: SEARCH_BASE_URL.to_string(),
            origin: SEARCH_ORIGIN.to_string(),
            user_agent: BROWSER_USER_AGENT.to_string(),
            timeout_secs: 10,
            max_results: 3,
            extract: ExtractConfig::default(),
            min_content_length: 100,
        }
    }
}

/// Bounds applied when turning a fetched page into an excerpt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    pub max_paragraphs: usize,
    /// Paragraphs must be longer than this (after trimming) to be kept
    pub min_paragraph_length: usize,
    pub max_length: usize,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            max_paragraphs: 8,
            min_paragraph_length: 50,
            max_length: 1500,
        }
    }
}

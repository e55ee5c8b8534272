use anyhow::Result;
use lazy_static::lazy_static;
use reqwest::Client;
use scraper::{Html, Selector};
use std::fmt;
use tracing::{debug, info, warn};

use super::extract::extract_text;
use super::links::normalize_result_url;
use super::SearchConfig;

lazy_static! {
    static ref RESULT_LINK: Selector = Selector::parse("a.result__a").unwrap();
}

/// A result anchor from the search results page
#[derive(Debug, Clone, PartialEq)]
pub struct ResultLink {
    pub title: String,
    pub href: String,
}

/// What a search produced, from best to worst
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// Readable text pulled from the top result
    Source { title: String, content: String },
    /// The top result could not be used, only the result titles are known
    Titles(Vec<String>),
    NoResults,
    /// The results page itself could not be fetched
    Failed(String),
}

impl fmt::Display for SearchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchOutcome::Source { title, content } => {
                write!(f, "Source: {}\n\n{}", title, content)
            }
            SearchOutcome::Titles(titles) => write!(f, "Search results: {}", titles.join(" | ")),
            SearchOutcome::NoResults => write!(f, "No results found"),
            SearchOutcome::Failed(reason) => write!(f, "Search failed: {}", reason),
        }
    }
}

/// Collect the first `limit` result anchors of a results page
pub fn parse_result_links(html: &str, limit: usize) -> Vec<ResultLink> {
    let document = Html::parse_document(html);
    document
        .select(&RESULT_LINK)
        .take(limit)
        .map(|anchor| ResultLink {
            title: anchor.text().collect::<String>().trim().to_string(),
            href: anchor.value().attr("href").unwrap_or_default().to_string(),
        })
        .collect()
}

/// Answers a query with a live web search.
///
/// At most two requests are made: the results page and the top result.
/// Neither is retried, a failed step degrades to a cheaper answer instead.
pub struct WebSearch {
    client: Client,
    config: SearchConfig,
}

impl WebSearch {
    pub fn new(config: SearchConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Run the search and render the outcome. Always returns a string.
    pub async fn search(&self, query: &str) -> String {
        self.run(query).await.to_string()
    }

    pub async fn run(&self, query: &str) -> SearchOutcome {
        let results_page = match self.fetch_results_page(query).await {
            Ok(body) => body,
            Err(e) => {
                warn!(query, error = %e, "search request failed");
                return SearchOutcome::Failed(e.to_string());
            }
        };

        // scraper documents are not Send, keep parsing out of the await points
        let links = parse_result_links(&results_page, self.config.max_results);
        let Some(first) = links.first() else {
            info!(query, "search returned no results");
            return SearchOutcome::NoResults;
        };

        let titles: Vec<String> = links.iter().map(|link| link.title.clone()).collect();
        let url = normalize_result_url(&first.href, &self.config.origin);
        debug!(%url, title = %first.title, "fetching top result");

        match self.fetch(&url).await {
            Ok(page) => {
                let content = extract_text(&page, &self.config.extract);
                debug!(%url, length = content.chars().count(), "extracted page content");
                if content.chars().count() > self.config.min_content_length {
                    SearchOutcome::Source {
                        title: first.title.clone(),
                        content,
                    }
                } else {
                    SearchOutcome::Titles(titles)
                }
            }
            Err(e) => {
                warn!(%url, error = %e, "could not fetch top result, falling back to titles");
                SearchOutcome::Titles(titles)
            }
        }
    }

    async fn fetch_results_page(&self, query: &str) -> reqwest::Result<String> {
        let url = format!(
            "{}/html/?q={}",
            self.config.base_url.trim_end_matches('/'),
            urlencoding::encode(query)
        );
        self.fetch(&url).await
    }

    async fn fetch(&self, url: &str) -> reqwest::Result<String> {
        let response = self.client.get(url).send().await?;
        debug!(url, final_url = %response.url(), status = %response.status(), "fetched");
        response.text().await
    }
}

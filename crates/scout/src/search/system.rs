use anyhow::Result;
use async_trait::async_trait;
use indoc::indoc;
use serde_json::json;

use super::client::WebSearch;
use super::SearchConfig;
use crate::errors::{AgentError, AgentResult};
use crate::models::tool::{Tool, ToolCall};
use crate::systems::System;

pub const SEARCH_TOOL_NAME: &str = "search_web";

/// Exposes [`WebSearch`] to the agent as the `search_web` tool
pub struct WebSearchSystem {
    tools: Vec<Tool>,
    search: WebSearch,
    instructions: String,
}

impl WebSearchSystem {
    pub fn new(config: SearchConfig) -> Result<Self> {
        let search_tool = Tool::new(
            SEARCH_TOOL_NAME,
            "Search the web for current information. Use this when you need up-to-date facts.",
            json!({
                "type": "object",
                "required": ["query"],
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "What to search for, phrased as a web search query."
                    }
                }
            }),
        );

        let instructions = indoc! {r#"
            Use `search_web` when a question needs recent or factual information you are not sure about.
            The tool returns either the text of the best matching page, prefixed by `Source:`,
            or a list of result titles. Base your answer on what the tool returned and say
            so when the search did not find anything useful.
        "#}
        .to_string();

        Ok(Self {
            tools: vec![search_tool],
            search: WebSearch::new(config)?,
            instructions,
        })
    }

    fn query<'a>(&self, tool_call: &'a ToolCall) -> AgentResult<&'a str> {
        // some models send the bare query string instead of an argument object
        tool_call
            .str_argument("query")
            .or_else(|| tool_call.arguments.as_str())
            .ok_or_else(|| AgentError::InvalidParameters("The query argument is required".into()))
    }
}

#[async_trait]
impl System for WebSearchSystem {
    fn name(&self) -> &str {
        "WebSearchSystem"
    }

    fn description(&self) -> &str {
        "Live web search that reads the top result"
    }

    fn instructions(&self) -> &str {
        &self.instructions
    }

    fn tools(&self) -> &[Tool] {
        &self.tools
    }

    fn activity(&self, tool_call: &ToolCall) -> Option<String> {
        let query = self.query(tool_call).ok()?;
        Some(format!("Searching the web for: {}", query))
    }

    async fn call(&self, tool_call: ToolCall) -> AgentResult<String> {
        match tool_call.name.as_str() {
            SEARCH_TOOL_NAME => {
                let query = self.query(&tool_call)?;
                Ok(self.search.search(query).await)
            }
            _ => Err(AgentError::ToolNotFound(tool_call.name)),
        }
    }
}

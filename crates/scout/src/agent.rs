use anyhow::Result;
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, error, info, warn};

use crate::errors::{AgentError, AgentResult};
use crate::models::message::{Message, MessageContent, ToolRequest};
use crate::models::role::Role;
use crate::models::tool::{Tool, ToolCall};
use crate::prompt_template::{load_prompt, SYSTEM_PROMPT};
use crate::providers::base::Provider;
use crate::systems::System;
use crate::tool_call::{looks_like_tool_call, normalize_text};

pub const MAX_ITERATIONS: usize = 5;
pub const MAX_ITERATIONS_MESSAGE: &str = "Max iterations reached";

#[derive(Clone, Debug, Serialize)]
struct SystemInfo {
    name: String,
    description: String,
    instructions: String,
}

impl SystemInfo {
    fn new(name: &str, description: &str, instructions: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            instructions: instructions.to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct AgentConfig {
    /// Model round trips allowed in a single turn
    pub max_iterations: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: MAX_ITERATIONS,
        }
    }
}

/// Agent integrates a foundational LLM with the systems it needs to pilot
pub struct Agent {
    systems: Vec<Box<dyn System>>,
    provider: Box<dyn Provider>,
    config: AgentConfig,
}

impl Agent {
    /// Create a new Agent with the specified provider
    pub fn new(provider: Box<dyn Provider>) -> Self {
        Self::with_config(provider, AgentConfig::default())
    }

    pub fn with_config(provider: Box<dyn Provider>, config: AgentConfig) -> Self {
        Self {
            systems: Vec::new(),
            provider,
            config,
        }
    }

    /// Add a system to the agent
    pub fn add_system(&mut self, system: Box<dyn System>) {
        self.systems.push(system);
    }

    /// Get all tools from all systems
    fn get_tools(&self) -> Vec<Tool> {
        self.systems
            .iter()
            .flat_map(|system| system.tools().iter().cloned())
            .collect()
    }

    /// Find the system that registered a tool of this name
    fn get_system_for_tool(&self, tool_name: &str) -> Option<&dyn System> {
        self.systems
            .iter()
            .find(|system| system.tools().iter().any(|tool| tool.name == tool_name))
            .map(|v| &**v)
    }

    fn get_system_prompt(&self) -> AgentResult<String> {
        let mut context = HashMap::new();
        let systems_info: Vec<SystemInfo> = self
            .systems
            .iter()
            .map(|system| {
                SystemInfo::new(system.name(), system.description(), system.instructions())
            })
            .collect();

        context.insert("systems", systems_info);
        load_prompt(SYSTEM_PROMPT, &context).map_err(|e| AgentError::Internal(e.to_string()))
    }

    /// Dispatch a single tool call to the system that owns it
    async fn dispatch_tool_call(&self, tool_call: ToolCall) -> AgentResult<String> {
        let system = self
            .get_system_for_tool(&tool_call.name)
            .ok_or_else(|| AgentError::ToolNotFound(tool_call.name.clone()))?;

        info!(tool = %tool_call.name, system = system.name(), "calling tool");
        system.call(tool_call).await
    }

    /// Answer one user message, given the earlier turns of the chat.
    ///
    /// This is the boundary for the chat surface: any failure during the turn
    /// is reported as an `Error: ...` reply and the turn's conversation dropped.
    pub async fn chat(&self, message: &str, history: &[(Role, String)]) -> String {
        let mut messages: Vec<Message> = history
            .iter()
            .filter_map(|(role, text)| match role {
                Role::User => Some(Message::user().with_text(text)),
                Role::Assistant => Some(Message::assistant().with_text(text)),
                // tool output cannot be replayed without the request it answered
                Role::Tool => None,
            })
            .collect();
        messages.push(Message::user().with_text(message));

        match self.run(messages).await {
            Ok(reply) => reply,
            Err(e) => {
                error!(error = %e, "turn failed");
                format!("Error: {}", e)
            }
        }
    }

    /// Drive the model until it answers without calling a tool.
    ///
    /// Each iteration sends the whole conversation, then runs every tool the
    /// model asked for, in order, appending one tool message per request.
    /// The final answer is prefixed with a line per tool activity so the user
    /// can see what was searched. Gives up with [`MAX_ITERATIONS_MESSAGE`]
    /// once the iteration budget is spent.
    pub async fn run(&self, mut messages: Vec<Message>) -> Result<String> {
        let tools = self.get_tools();
        let system_prompt = self.get_system_prompt()?;
        let mut activity: Vec<String> = Vec::new();

        for iteration in 0..self.config.max_iterations {
            let (mut response, usage) = self
                .provider
                .complete(&system_prompt, &messages, &tools)
                .await?;
            debug!(iteration, ?usage, text = %response.text(), "model response");

            let tool_requests = take_tool_requests(&mut response);
            let text = response.text();
            messages.push(response);

            if tool_requests.is_empty() {
                return Ok(render_reply(&activity, text));
            }

            for request in tool_requests {
                let tool_call = match request.tool_call {
                    Ok(tool_call) => tool_call,
                    Err(e) => {
                        // the request already carries its error back to the model
                        warn!(id = %request.id, error = %e, "skipping tool request");
                        continue;
                    }
                };

                if let Some(line) = self
                    .get_system_for_tool(&tool_call.name)
                    .and_then(|system| system.activity(&tool_call))
                {
                    activity.push(line);
                }

                let output = self.dispatch_tool_call(tool_call).await;
                if let Err(e) = &output {
                    warn!(id = %request.id, error = %e, "tool call failed");
                }
                messages.push(Message::tool().with_tool_response(request.id, output));
            }
        }

        warn!(
            max_iterations = self.config.max_iterations,
            "model kept calling tools, giving up"
        );
        Ok(MAX_ITERATIONS_MESSAGE.to_string())
    }
}

/// The tool requests of a model response.
///
/// Structured tool calls win. Without any, a reply whose text is a JSON tool
/// call is repaired in place: the text is replaced by the recovered request so
/// the conversation reads as a regular tool call from then on.
fn take_tool_requests(response: &mut Message) -> Vec<ToolRequest> {
    if response.has_tool_requests() {
        return response.tool_requests().into_iter().cloned().collect();
    }

    let text = response.text();
    if !looks_like_tool_call(&text) {
        return Vec::new();
    }

    match normalize_text(&text) {
        Some(request) => {
            warn!(id = %request.id, "recovered a tool call written as text");
            response
                .content
                .retain(|content| !matches!(content, MessageContent::Text(_)));
            response.content.push(request.clone().into());
            vec![request]
        }
        None => Vec::new(),
    }
}

fn render_reply(activity: &[String], text: String) -> String {
    if activity.is_empty() {
        text
    } else {
        format!("{}\n\n{}", activity.join("\n"), text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::base::Usage;
    use crate::providers::mock::MockProvider;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    // Stands in for the web search system without touching the network
    struct FakeSearchSystem {
        tools: Vec<Tool>,
        queries: Arc<Mutex<Vec<String>>>,
    }

    impl FakeSearchSystem {
        fn new() -> (Self, Arc<Mutex<Vec<String>>>) {
            let queries = Arc::new(Mutex::new(Vec::new()));
            let system = Self {
                tools: vec![Tool::new(
                    "search_web",
                    "Search the web",
                    json!({"type": "object", "properties": {"query": {"type": "string"}}, "required": ["query"]}),
                )],
                queries: queries.clone(),
            };
            (system, queries)
        }
    }

    #[async_trait]
    impl System for FakeSearchSystem {
        fn name(&self) -> &str {
            "FakeSearchSystem"
        }

        fn description(&self) -> &str {
            "A fake search system for testing"
        }

        fn instructions(&self) -> &str {
            "Fake search instructions"
        }

        fn tools(&self) -> &[Tool] {
            &self.tools
        }

        fn activity(&self, tool_call: &ToolCall) -> Option<String> {
            tool_call
                .str_argument("query")
                .map(|query| format!("Searching the web for: {}", query))
        }

        async fn call(&self, tool_call: ToolCall) -> AgentResult<String> {
            let query = tool_call.str_argument("query").unwrap_or_default().to_string();
            self.queries.lock().unwrap().push(query.clone());
            Ok(format!("Search results: {}", query))
        }
    }

    struct FailingProvider;

    #[async_trait]
    impl Provider for FailingProvider {
        async fn complete(
            &self,
            _system: &str,
            _messages: &[Message],
            _tools: &[Tool],
        ) -> Result<(Message, Usage)> {
            Err(anyhow::anyhow!("Server error: 500 Internal Server Error"))
        }
    }

    fn search_request(id: &str, query: &str) -> Message {
        Message::assistant().with_tool_request(
            id,
            Ok(ToolCall::new("search_web", json!({"query": query}))),
        )
    }

    fn agent_with_search(provider: &MockProvider) -> (Agent, Arc<Mutex<Vec<String>>>) {
        let mut agent = Agent::new(Box::new(provider.clone()));
        let (system, queries) = FakeSearchSystem::new();
        agent.add_system(Box::new(system));
        (agent, queries)
    }

    #[tokio::test]
    async fn test_simple_response_is_returned_verbatim() -> Result<()> {
        let provider = MockProvider::new(vec![Message::assistant().with_text("Hello!")]);
        let (agent, queries) = agent_with_search(&provider);

        let reply = agent.chat("Hi", &[]).await;

        assert_eq!(reply, "Hello!");
        assert_eq!(provider.requests().len(), 1);
        assert!(queries.lock().unwrap().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_tool_call_then_answer() -> Result<()> {
        let provider = MockProvider::new(vec![
            search_request("call_1", "weather in Paris"),
            Message::assistant().with_text("It is raining in Paris."),
        ]);
        let (agent, queries) = agent_with_search(&provider);

        let reply = agent.chat("Is it raining in Paris?", &[]).await;

        assert_eq!(
            reply,
            "Searching the web for: weather in Paris\n\nIt is raining in Paris."
        );
        assert_eq!(*queries.lock().unwrap(), vec!["weather in Paris"]);

        // the second round sees: user, assistant tool request, tool result
        let requests = provider.requests();
        assert_eq!(requests.len(), 2);
        let second = &requests[1];
        assert_eq!(second.len(), 3);
        assert_eq!(second[1].role, Role::Assistant);
        assert_eq!(second[2].role, Role::Tool);
        let response = second[2].content[0].as_tool_response().unwrap();
        assert_eq!(response.id, "call_1");
        assert_eq!(
            response.tool_result,
            Ok("Search results: weather in Paris".to_string())
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_multiple_tool_calls_run_in_order() -> Result<()> {
        let provider = MockProvider::new(vec![
            Message::assistant()
                .with_tool_request(
                    "1",
                    Ok(ToolCall::new("search_web", json!({"query": "first"}))),
                )
                .with_tool_request(
                    "2",
                    Ok(ToolCall::new("search_web", json!({"query": "second"}))),
                ),
            search_request("3", "third"),
            Message::assistant().with_text("All done!"),
        ]);
        let (agent, queries) = agent_with_search(&provider);

        let reply = agent.chat("Multiple calls", &[]).await;

        assert_eq!(
            reply,
            "Searching the web for: first\nSearching the web for: second\nSearching the web for: third\n\nAll done!"
        );
        assert_eq!(*queries.lock().unwrap(), vec!["first", "second", "third"]);

        let last = provider.requests().pop().unwrap();
        let ids: Vec<&str> = last
            .iter()
            .filter_map(|m| m.content[0].as_tool_response())
            .map(|r| r.id.as_str())
            .collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_tool_call_written_as_text_is_repaired() -> Result<()> {
        let provider = MockProvider::new(vec![
            Message::assistant().with_text(
                r#"{"name": "search_web", "parameters": {"query": "rain in Paris"}}"#,
            ),
            Message::assistant().with_text("Expect rain in Paris."),
        ]);
        let (agent, queries) = agent_with_search(&provider);

        let reply = agent.chat("Rain in Paris?", &[]).await;

        assert_eq!(
            reply,
            "Searching the web for: rain in Paris\n\nExpect rain in Paris."
        );
        assert_eq!(*queries.lock().unwrap(), vec!["rain in Paris"]);

        let second = &provider.requests()[1];
        let repaired = &second[1];
        assert_eq!(repaired.text(), "");
        let request = repaired.tool_requests()[0];
        assert_eq!(
            request.tool_call.as_ref().unwrap().arguments,
            json!({"query": "rain in Paris"})
        );
        let response = second[2].content[0].as_tool_response().unwrap();
        assert_eq!(response.id, request.id);
        Ok(())
    }

    #[tokio::test]
    async fn test_json_answer_without_tool_shape_is_not_repaired() -> Result<()> {
        let answer = r#"{"temperature": 12, "unit": "C"}"#;
        let provider = MockProvider::new(vec![Message::assistant().with_text(answer)]);
        let (agent, queries) = agent_with_search(&provider);

        assert_eq!(agent.chat("Give me json", &[]).await, answer);
        assert!(queries.lock().unwrap().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_max_iterations_reached() -> Result<()> {
        let responses = (0..10)
            .map(|i| search_request(&i.to_string(), "again"))
            .collect();
        let provider = MockProvider::new(responses);
        let (agent, queries) = agent_with_search(&provider);

        let reply = agent.chat("Loop forever", &[]).await;

        assert_eq!(reply, MAX_ITERATIONS_MESSAGE);
        assert_eq!(provider.requests().len(), MAX_ITERATIONS);
        assert_eq!(queries.lock().unwrap().len(), MAX_ITERATIONS);
        Ok(())
    }

    #[tokio::test]
    async fn test_answer_on_last_iteration_is_returned() -> Result<()> {
        let mut responses: Vec<Message> = (0..4)
            .map(|i| search_request(&i.to_string(), "more"))
            .collect();
        responses.push(Message::assistant().with_text("Finally."));
        let provider = MockProvider::new(responses);
        let (agent, _) = agent_with_search(&provider);

        let reply = agent.chat("Dig deep", &[]).await;

        assert!(reply.ends_with("\n\nFinally."));
        assert_eq!(provider.requests().len(), 5);
        Ok(())
    }

    #[tokio::test]
    async fn test_custom_iteration_budget() -> Result<()> {
        let provider = MockProvider::new(vec![
            search_request("1", "a"),
            search_request("2", "b"),
            Message::assistant().with_text("too late"),
        ]);
        let (system, _) = FakeSearchSystem::new();
        let mut agent = Agent::with_config(
            Box::new(provider.clone()),
            AgentConfig { max_iterations: 2 },
        );
        agent.add_system(Box::new(system));

        assert_eq!(agent.chat("q", &[]).await, MAX_ITERATIONS_MESSAGE);
        assert_eq!(provider.requests().len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_tool_does_not_fail_the_turn() -> Result<()> {
        let provider = MockProvider::new(vec![
            Message::assistant()
                .with_tool_request("1", Ok(ToolCall::new("read_file", json!({"path": "x"})))),
            Message::assistant().with_text("I can only search."),
        ]);
        let (agent, queries) = agent_with_search(&provider);

        let reply = agent.chat("Read a file", &[]).await;

        assert_eq!(reply, "I can only search.");
        assert!(queries.lock().unwrap().is_empty());
        let second = &provider.requests()[1];
        let response = second[2].content[0].as_tool_response().unwrap();
        assert_eq!(response.id, "1");
        assert_eq!(
            response.tool_result,
            Err(AgentError::ToolNotFound("read_file".to_string()))
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_uninterpretable_tool_request_is_skipped() -> Result<()> {
        let provider = MockProvider::new(vec![
            Message::assistant().with_tool_request(
                "bad",
                Err(AgentError::InvalidParameters("not json".to_string())),
            ),
            Message::assistant().with_text("Sorry about that."),
        ]);
        let (agent, queries) = agent_with_search(&provider);

        let reply = agent.chat("Search something", &[]).await;

        assert_eq!(reply, "Sorry about that.");
        assert!(queries.lock().unwrap().is_empty());
        // only the user message and the failed request, no tool message
        assert_eq!(provider.requests()[1].len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_history_is_replayed_before_the_new_message() -> Result<()> {
        let provider = MockProvider::new(vec![Message::assistant().with_text("Paris.")]);
        let (agent, _) = agent_with_search(&provider);
        let history = vec![
            (Role::User, "What is the capital of France?".to_string()),
            (Role::Assistant, "Paris.".to_string()),
        ];

        agent.chat("And of Italy?", &history).await;

        let first = &provider.requests()[0];
        let texts: Vec<(Role, String)> = first.iter().map(|m| (m.role, m.text())).collect();
        assert_eq!(
            texts,
            vec![
                (Role::User, "What is the capital of France?".to_string()),
                (Role::Assistant, "Paris.".to_string()),
                (Role::User, "And of Italy?".to_string()),
            ]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_provider_failure_becomes_error_reply() -> Result<()> {
        let agent = Agent::new(Box::new(FailingProvider));

        let reply = agent.chat("Hi", &[]).await;

        assert_eq!(reply, "Error: Server error: 500 Internal Server Error");
        Ok(())
    }

    #[tokio::test]
    async fn test_run_surfaces_provider_errors() {
        let agent = Agent::new(Box::new(FailingProvider));
        let result = agent.run(vec![Message::user().with_text("Hi")]).await;
        assert!(result.is_err());
    }

    #[test]
    fn test_system_prompt_includes_system_instructions() -> Result<()> {
        let provider = MockProvider::new(vec![]);
        let (agent, _) = agent_with_search(&provider);
        let prompt = agent.get_system_prompt()?;
        assert!(prompt.contains("FakeSearchSystem"));
        assert!(prompt.contains("Fake search instructions"));
        Ok(())
    }

    #[test]
    fn test_take_tool_requests_prefers_structured_calls() {
        let mut response = search_request("1", "structured")
            .with_text(r#"{"name": "search_web", "parameters": {"query": "text"}}"#);
        let requests = take_tool_requests(&mut response);
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].id, "1");
        // the text is left alone when a structured call exists
        assert!(!response.text().is_empty());
    }
}

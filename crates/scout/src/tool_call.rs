//! Recovery of tool calls that a model wrote into its text reply instead of
//! using the structured tool call channel.
//!
//! Small local models regularly answer with something like
//! `{"name": "search_web", "parameters": {"query": "..."}}` as plain content.
//! The text is only ever read as strict JSON, never evaluated.

use serde_json::{Map, Value};
use uuid::Uuid;

use crate::models::message::ToolRequest;
use crate::models::tool::ToolCall;

/// Generate a fresh identifier for a tool call request
pub fn new_call_id() -> String {
    format!("call_{}", Uuid::new_v4().simple())
}

fn parse_object(text: &str) -> Option<Map<String, Value>> {
    let trimmed = text.trim();
    if !(trimmed.starts_with('{') && trimmed.ends_with('}')) {
        return None;
    }
    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

/// True when the text is a JSON object carrying both a `name` and a `parameters` key
pub fn looks_like_tool_call(text: &str) -> bool {
    parse_object(text)
        .map(|map| map.contains_key("name") && map.contains_key("parameters"))
        .unwrap_or(false)
}

/// Turn a loosely shaped tool call into a request with a newly generated id.
///
/// `raw` may be a JSON string holding the call or an already parsed object.
/// Returns `None` when the shape does not match: `name` must be a string and
/// `parameters` must be an object.
pub fn normalize(raw: &Value) -> Option<ToolRequest> {
    let map = match raw {
        Value::String(text) => parse_object(text)?,
        Value::Object(map) => map.clone(),
        _ => return None,
    };

    let name = map.get("name")?.as_str()?;
    let parameters = map.get("parameters")?;
    if !parameters.is_object() {
        return None;
    }

    Some(ToolRequest {
        id: new_call_id(),
        tool_call: Ok(ToolCall::new(name, parameters.clone())),
    })
}

/// Same as [`normalize`] for free text
pub fn normalize_text(text: &str) -> Option<ToolRequest> {
    normalize(&Value::String(text.to_string()))
}

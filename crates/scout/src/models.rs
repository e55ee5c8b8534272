//! These models represent the objects passed around by the agent
//!
//! There are two formats we need to interact with:
//! - the ordered (role, text) history handed over by the chat surface
//! - openai-compatible chat completion messages/tools, sent from the agent to the LLM
//!
//! We always immediately convert those data models into the internal structs using
//! to/from helpers, so the agent loop only ever sees the types defined here.
pub mod content;
pub mod message;
pub mod role;
pub mod tool;

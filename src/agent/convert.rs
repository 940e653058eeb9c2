//! Normalization of the agent's heterogeneous return shapes.
//!
//! Browsing agents return different shapes depending on implementation: a
//! run history exposing a final extracted result, a transcript of messages,
//! a plain string, or arbitrary JSON. All of them collapse to a single
//! string through one ordered-preference function rather than type checks
//! scattered across call sites.

use serde::Serialize;

/// One message from the agent's transcript.
#[derive(Debug, Clone, Serialize)]
pub struct AgentMessage {
    pub role: String,
    pub content: String,
}

impl AgentMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }
}

/// A completed agent run with an optional final extracted result.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AgentHistory {
    /// Transcript of the agent's self-directed steps.
    pub messages: Vec<AgentMessage>,
    /// The agent's final extracted result, when it produced one.
    pub final_result: Option<String>,
}

impl AgentHistory {
    pub fn final_result(&self) -> Option<&str> {
        self.final_result.as_deref()
    }
}

/// The opaque result of one agent invocation.
#[derive(Debug, Clone)]
pub enum RawAgentResult {
    /// A run history exposing a final extracted result accessor
    History(AgentHistory),
    /// An ordered transcript of messages
    Messages(Vec<AgentMessage>),
    /// Already a plain string
    Text(String),
    /// Anything else the agent handed back
    Value(serde_json::Value),
}

impl RawAgentResult {
    /// Collapse any result shape into a single string.
    ///
    /// Preference order: the final extracted result if present, then the
    /// last message's textual content, then plain-string passthrough, then
    /// a JSON rendering of whatever remains.
    pub fn into_text(self) -> String {
        match self {
            RawAgentResult::History(history) => {
                if let Some(result) = history.final_result {
                    result
                } else if let Some(last) = history.messages.last() {
                    last.content.clone()
                } else {
                    serde_json::to_string(&history).unwrap_or_default()
                }
            }
            RawAgentResult::Messages(messages) => match messages.last() {
                Some(last) => last.content.clone(),
                None => String::new(),
            },
            RawAgentResult::Text(text) => text,
            RawAgentResult::Value(serde_json::Value::String(text)) => text,
            RawAgentResult::Value(value) => value.to_string(),
        }
    }
}

//! Agent invocation adapter.
//!
//! The browsing agent is an external collaborator: it receives one compiled
//! instruction, runs its own navigation loop to completion, and hands back a
//! result in one of several shapes. This module owns the seam (the
//! [`BrowsingAgent`] trait), the single-invocation adapter, and a built-in
//! chat-backed implementation.

pub mod convert;
pub mod task;

use async_trait::async_trait;
use tracing::debug;

use crate::error::Result;
use crate::llm::ChatClient;

pub use convert::{AgentHistory, AgentMessage, RawAgentResult};
pub use task::compile_task;

/// Fixed directive prefixed to every compiled instruction.
const DIRECTIVE: &str = "Follow the instructions below.";

const AGENT_SYSTEM: &str = "You are an autonomous web-browsing agent. Execute the task you are \
     given step by step and return only the requested output.";

/// Per-invocation agent flags.
#[derive(Debug, Clone, Copy, Default)]
pub struct AgentOptions {
    pub use_vision: bool,
    pub generate_gif: bool,
}

/// An autonomous browsing agent.
///
/// Implementations interpret a natural-language instruction and run a
/// self-directed navigation loop to satisfy it. The pipeline only observes
/// the final outcome; step-level control stays inside the implementation.
#[async_trait]
pub trait BrowsingAgent: Send + Sync {
    async fn run(
        &self,
        instruction: &str,
        llm: &ChatClient,
        options: AgentOptions,
    ) -> Result<RawAgentResult>;
}

/// Built-in agent that forwards the instruction to the chat backend in a
/// single completion.
///
/// This is the default wiring for backends whose models browse server-side;
/// browser-driving agents plug in behind [`BrowsingAgent`] instead.
pub struct ChatCompletionAgent;

#[async_trait]
impl BrowsingAgent for ChatCompletionAgent {
    async fn run(
        &self,
        instruction: &str,
        llm: &ChatClient,
        _options: AgentOptions,
    ) -> Result<RawAgentResult> {
        let text = llm.complete(AGENT_SYSTEM, instruction).await?;
        Ok(RawAgentResult::Text(text))
    }
}

/// Run the agent once and normalize its result to a single string.
///
/// No retry happens here; failures propagate unchanged so the caller owns
/// the continue-vs-abort decision.
pub async fn invoke(
    agent: &dyn BrowsingAgent,
    instruction: &str,
    llm: &ChatClient,
    options: AgentOptions,
) -> Result<String> {
    let combined = format!("{DIRECTIVE}\n{instruction}");
    debug!(
        platform = %llm.platform(),
        model = llm.model(),
        use_vision = options.use_vision,
        "invoking browsing agent"
    );
    let result = agent.run(&combined, llm, options).await?;
    Ok(result.into_text())
}

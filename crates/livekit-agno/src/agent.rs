use std::pin::Pin;

use crate::errors::AgentRunError;

/// One unit produced by the wrapped agent's streaming run.
///
/// The wrapped library emits different event shapes depending on its
/// configuration, so consumers dispatch over the variants in priority order
/// and skip anything without renderable content.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[non_exhaustive]
pub enum RunEvent {
    /// Incremental text content.
    Content { delta: String },
    /// Terminal run output carrying the complete result, if any.
    ///
    /// Used as a fallback when a run exposes no incremental events.
    Completed { content: Option<serde_json::Value> },
    /// Any other event shape that still exposes a generic content attribute.
    Other { content: Option<serde_json::Value> },
}

/// Asynchronous sequence of run events.
pub type RunEventStream =
    Pin<Box<dyn futures::Stream<Item = Result<RunEvent, AgentRunError>> + Send>>;

/// Input for one streaming run of the wrapped agent.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RunRequest {
    /// Flattened user input text.
    pub input: String,
    /// Whether the agent should stream incremental events.
    pub stream: bool,
    /// Conversation the run belongs to, when the agent keeps session memory.
    pub session_id: Option<String>,
    /// End user on whose behalf the run executes.
    pub user_id: Option<String>,
}

/// Asynchronous-run contract of the wrapped conversational agent.
///
/// The agent owns its own model, tools, instructions, and memory; this trait
/// only surfaces the pieces the adapter calls into.
#[async_trait::async_trait]
pub trait AgnoAgent: Send + Sync {
    /// Configured model identifier, if the agent has one.
    fn model_id(&self) -> Option<String>;

    /// Starts a streaming run for one piece of user input.
    ///
    /// Dropping the returned stream mid-run must release whatever resources
    /// the agent holds for it (for example an open provider connection).
    async fn arun(&self, request: RunRequest) -> Result<RunEventStream, AgentRunError>;
}

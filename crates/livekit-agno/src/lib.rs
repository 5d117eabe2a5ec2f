//! Voice-pipeline LLM backend backed by an Agno-style conversational agent.
//!
//! The adapter reads the host framework's chat context, feeds the most recent
//! user message to the wrapped agent's streaming run, and republishes the
//! resulting events as role-tagged text chunks on the host's stream contract.
//! The agent keeps its own model, tools, instructions, and memory; the
//! adapter is translation glue only.
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use livekit_agno::prelude::*;
//!
//! # async fn demo(agent: Arc<dyn AgnoAgent>) -> Result<(), LlmError> {
//! let backend = LlmAdapter::new(agent)
//!     .session_id("room-42")
//!     .user_id("participant-7");
//!
//! let mut ctx = ChatContext::new();
//! ctx.push(ChatMessage::user("What time is it?"));
//!
//! let mut stream = backend.chat(ChatRequest::new(ctx));
//! while let Some(chunk) = stream.next_chunk().await {
//!     print!("{}", chunk.delta.content);
//! }
//! stream.finish().await?;
//! # Ok(())
//! # }
//! ```

/// Adapter facade and the per-turn stream driver.
pub mod adapter;
/// Wrapped-agent run contract and event types.
pub mod agent;
/// Host chat-context data model.
pub mod chat;
/// Public error types.
pub mod errors;
/// Host-side streaming-LLM contract.
pub mod llm;
/// Common imports for typical usage.
pub mod prelude;

pub use adapter::{CHUNK_ID, LlmAdapter, PROVIDER};
pub use agent::{AgnoAgent, RunEvent, RunEventStream, RunRequest};
pub use chat::{ChatContext, ChatMessage, ChatRole, ContentPart, MessageContent};
pub use errors::{AgentRunError, LlmError};
pub use llm::{
    AbortHandle, ChatChunk, ChatRequest, ChoiceDelta, ConnectionOptions, LlmBackend, LlmStream,
    ToolChoice, ToolSpec,
};

/// Plugin version, as published in the package metadata.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

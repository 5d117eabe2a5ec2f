//! Common imports for typical adapter usage.
//!
//! This module intentionally exports the most frequently used contract and
//! adapter types so examples and application code need fewer import lines.
pub use crate::{
    AbortHandle, AgentRunError, AgnoAgent, ChatChunk, ChatContext, ChatMessage, ChatRequest,
    ChatRole, ChoiceDelta, ConnectionOptions, ContentPart, LlmAdapter, LlmBackend, LlmError,
    LlmStream, MessageContent, RunEvent, RunEventStream, RunRequest, ToolChoice, ToolSpec,
};

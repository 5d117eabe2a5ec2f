use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};

use crate::chat::{ChatContext, ChatRole};
use crate::errors::LlmError;

/// Incremental chunk delivered to the host's stream consumer.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ChatChunk {
    /// Synthetic chunk identifier; constant for a given backend.
    pub id: String,
    /// Role and text delta carried by this chunk.
    pub delta: ChoiceDelta,
}

/// Role plus text delta carried by a chunk.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ChoiceDelta {
    /// Author role, `Assistant` for model output.
    pub role: ChatRole,
    /// Text delta; never empty for an emitted chunk.
    pub content: String,
}

/// Function tool offered by the host for a single call.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ToolSpec {
    /// Tool name as exposed to the model.
    pub name: String,
    /// Natural-language description.
    pub description: String,
    /// JSON schema for the tool arguments.
    pub parameters: serde_json::Value,
}

/// Host preference for how tools should be selected.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum ToolChoice {
    /// Let the model decide.
    Auto,
    /// Never call tools.
    None,
    /// A tool call is required.
    Required,
    /// Force a specific named tool.
    Named(String),
}

/// Connection options the host attaches to each chat call.
///
/// The adapter carries these opaquely; it implements no timeout logic of its
/// own.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct ConnectionOptions {
    /// Optional connect/response timeout for backends that enforce one.
    pub timeout: Option<Duration>,
    /// Bounded chunk buffer size between the turn task and the consumer.
    pub stream_buffer_capacity: usize,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self {
            timeout: None,
            stream_buffer_capacity: 128,
        }
    }
}

/// One streaming chat call as issued by the host framework.
///
/// `tools`, `tool_choice`, `parallel_tool_calls`, and `extra` are part of the
/// host contract; whether a backend honors them is backend-specific.
#[derive(Clone, Debug)]
pub struct ChatRequest {
    /// Conversation history for the turn.
    pub chat_ctx: ChatContext,
    /// Per-call tools offered by the host.
    pub tools: Vec<ToolSpec>,
    /// Connection options for the turn.
    pub conn_options: ConnectionOptions,
    /// Tool selection preference.
    pub tool_choice: Option<ToolChoice>,
    /// Whether the model may call several tools in parallel.
    pub parallel_tool_calls: Option<bool>,
    /// Backend-specific extra fields, passed through opaquely.
    pub extra: HashMap<String, serde_json::Value>,
}

impl ChatRequest {
    /// Creates a request for the given context with default options.
    pub fn new(chat_ctx: ChatContext) -> Self {
        Self {
            chat_ctx,
            tools: Vec::new(),
            conn_options: ConnectionOptions::default(),
            tool_choice: None,
            parallel_tool_calls: None,
            extra: HashMap::new(),
        }
    }

    /// Sets the per-call tools.
    pub fn tools(mut self, tools: Vec<ToolSpec>) -> Self {
        self.tools = tools;
        self
    }

    /// Sets the connection options.
    pub fn conn_options(mut self, options: ConnectionOptions) -> Self {
        self.conn_options = options;
        self
    }

    /// Sets the tool selection preference.
    pub fn tool_choice(mut self, choice: ToolChoice) -> Self {
        self.tool_choice = Some(choice);
        self
    }

    /// Sets the parallel tool call preference.
    pub fn parallel_tool_calls(mut self, enabled: bool) -> Self {
        self.parallel_tool_calls = Some(enabled);
        self
    }

    /// Adds a backend-specific extra field.
    pub fn extra(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

/// Streaming-LLM contract every backend plugged into the voice pipeline
/// implements.
pub trait LlmBackend: Send + Sync {
    /// Identifier of the underlying model.
    fn model(&self) -> String;

    /// Stable label for the backing provider.
    fn provider(&self) -> &str;

    /// Starts one streaming chat turn and returns its stream handle.
    fn chat(&self, request: ChatRequest) -> LlmStream;
}

/// Handle used to request cancellation of a running chat turn.
#[derive(Clone)]
pub struct AbortHandle {
    tx: watch::Sender<bool>,
}

impl AbortHandle {
    pub(crate) fn new(tx: watch::Sender<bool>) -> Self {
        Self { tx }
    }

    /// Requests cancellation.
    ///
    /// Cancellation is best-effort and surfaces as `LlmError::Cancelled`
    /// from `finish`.
    pub fn abort(&self) {
        let _ = self.tx.send(true);
    }
}

/// Streaming handle for a single chat turn.
///
/// Chunks arrive strictly in the order the wrapped agent produced them; the
/// channel closing means the turn is over. Each handle is turn-scoped and
/// discarded after use.
pub struct LlmStream {
    turn_id: uuid::Uuid,
    rx: mpsc::Receiver<ChatChunk>,
    final_rx: oneshot::Receiver<Result<(), LlmError>>,
    abort_handle: AbortHandle,
}

impl LlmStream {
    pub(crate) fn new(
        turn_id: uuid::Uuid,
        rx: mpsc::Receiver<ChatChunk>,
        final_rx: oneshot::Receiver<Result<(), LlmError>>,
        abort_handle: AbortHandle,
    ) -> Self {
        Self {
            turn_id,
            rx,
            final_rx,
            abort_handle,
        }
    }

    /// Returns the turn id used for log correlation.
    pub fn turn_id(&self) -> uuid::Uuid {
        self.turn_id
    }

    /// Returns a handle that can cancel the turn.
    pub fn abort_handle(&self) -> AbortHandle {
        self.abort_handle.clone()
    }

    /// Waits for and returns the next chunk.
    ///
    /// Returns `None` once the turn is over (successfully or not); the
    /// terminal result is available from `finish`.
    pub async fn next_chunk(&mut self) -> Option<ChatChunk> {
        self.rx.recv().await
    }

    /// Drains any remaining chunks and returns the terminal turn result.
    ///
    /// Safe to call after consuming chunks manually with `next_chunk`.
    pub async fn finish(mut self) -> Result<(), LlmError> {
        while self.rx.recv().await.is_some() {}
        match self.final_rx.await {
            Ok(result) => result,
            Err(_) => Err(LlmError::protocol_msg(
                "turn task ended without a final result",
            )),
        }
    }

    /// Runs the turn to completion and returns the concatenated deltas.
    pub async fn collect_text(mut self) -> Result<String, LlmError> {
        let mut text = String::new();
        while let Some(chunk) = self.rx.recv().await {
            text.push_str(&chunk.delta.content);
        }
        match self.final_rx.await {
            Ok(Ok(())) => Ok(text),
            Ok(Err(err)) => Err(err),
            Err(_) => Err(LlmError::protocol_msg(
                "turn task ended without a final result",
            )),
        }
    }
}

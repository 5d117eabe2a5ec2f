/// Failure raised by the wrapped agent library while starting or producing a
/// run stream.
///
/// The adapter forwards these unmodified. Classifying, retrying, and backoff
/// belong to the host framework's backend error handling.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AgentRunError {
    /// The model provider behind the agent returned a failure.
    #[error("model error: {message}")]
    Model {
        message: String,
        status_code: Option<u16>,
    },
    /// Network or stream I/O towards the model provider failed.
    #[error("transport error: {message}")]
    Transport { message: String },
    /// The agent itself failed (tool error, invalid configuration, ...).
    #[error("agent error: {message}")]
    Agent { message: String },
}

impl AgentRunError {
    /// Creates a model-level error.
    pub fn model(message: impl Into<String>, status_code: Option<u16>) -> Self {
        Self::Model {
            message: message.into(),
            status_code,
        }
    }

    /// Creates a transport-level error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Creates an agent-level error.
    pub fn agent(message: impl Into<String>) -> Self {
        Self::Agent {
            message: message.into(),
        }
    }

    /// Returns the human-readable message for this error.
    pub fn message(&self) -> &str {
        match self {
            Self::Model { message, .. }
            | Self::Transport { message }
            | Self::Agent { message } => message,
        }
    }
}

/// Terminal error for a chat turn, as seen by the host framework.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LlmError {
    /// Failure propagated unmodified from the wrapped agent's run.
    #[error(transparent)]
    Agent(#[from] AgentRunError),
    /// The turn was cancelled through its abort handle.
    #[error("chat turn cancelled")]
    Cancelled,
    /// Invariant violation in the turn plumbing itself.
    #[error("protocol error: {0}")]
    Protocol(String),
}

impl LlmError {
    pub(crate) fn protocol_msg(message: impl Into<String>) -> Self {
        Self::Protocol(message.into())
    }
}

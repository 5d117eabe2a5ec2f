/// Role attached to a chat message.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// Instructions injected by the application.
    System,
    /// End-user input (typically a speech-to-text transcript).
    User,
    /// Model output.
    Assistant,
    /// Tool invocation results.
    Tool,
}

/// One part of a multimodal message body.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[non_exhaustive]
pub enum ContentPart {
    /// Plain text part.
    Text(String),
    /// Non-text payload (image reference, structured data, ...).
    Json(serde_json::Value),
}

/// Message body: plain text or an ordered list of mixed parts.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum MessageContent {
    /// Plain text body.
    Text(String),
    /// Multimodal body.
    Parts(Vec<ContentPart>),
}

impl MessageContent {
    /// Flattens the body into a single string.
    ///
    /// Parts are joined with single spaces; non-text parts are stringified
    /// (JSON strings render without quotes, everything else renders compact).
    pub fn flattened(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Parts(parts) => parts
                .iter()
                .map(part_text)
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

fn part_text(part: &ContentPart) -> String {
    match part {
        ContentPart::Text(text) => text.clone(),
        ContentPart::Json(serde_json::Value::String(text)) => text.clone(),
        ContentPart::Json(value) => value.to_string(),
    }
}

/// One role-tagged message in a chat context.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ChatMessage {
    /// Author role.
    pub role: ChatRole,
    /// Message body.
    pub content: MessageContent,
}

impl ChatMessage {
    /// Creates a message with an explicit role and body.
    pub fn new(role: ChatRole, content: MessageContent) -> Self {
        Self { role, content }
    }

    /// Creates a plain text user message.
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(ChatRole::User, MessageContent::Text(text.into()))
    }

    /// Creates a plain text assistant message.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(ChatRole::Assistant, MessageContent::Text(text.into()))
    }

    /// Creates a plain text system message.
    pub fn system(text: impl Into<String>) -> Self {
        Self::new(ChatRole::System, MessageContent::Text(text.into()))
    }
}

/// Ordered conversation history owned by the host framework.
///
/// The adapter only reads it; the mutation helpers exist for application
/// setup code and tests.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ChatContext {
    /// Messages in conversation order, oldest first.
    pub messages: Vec<ChatMessage>,
}

impl ChatContext {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a message.
    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    /// Appends a message, builder style.
    pub fn with_message(mut self, message: ChatMessage) -> Self {
        self.push(message);
        self
    }

    /// Text of the most recent user message, if any.
    ///
    /// Scans from the newest message backward and flattens the first
    /// user-role body found. `None` is an expected outcome, not an error:
    /// a turn with no user input simply produces no output.
    pub fn last_user_text(&self) -> Option<String> {
        self.messages
            .iter()
            .rev()
            .find(|msg| msg.role == ChatRole::User)
            .map(|msg| msg.content.flattened())
    }
}

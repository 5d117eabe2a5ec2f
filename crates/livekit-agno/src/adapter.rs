use std::sync::Arc;

use futures::StreamExt as _;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, warn};

use crate::agent::{AgnoAgent, RunEvent, RunRequest};
use crate::chat::{ChatContext, ChatRole};
use crate::errors::LlmError;
use crate::llm::{AbortHandle, ChatChunk, ChatRequest, ChoiceDelta, LlmBackend, LlmStream};

/// Chunk identifier used for every chunk this backend emits.
pub const CHUNK_ID: &str = "agno";

/// Provider label reported by the adapter, also the model fallback when the
/// wrapped agent has no model configured.
pub const PROVIDER: &str = "agno";

/// Wraps an Agno-style agent as a voice-pipeline LLM backend.
///
/// Configuration is immutable after construction; every `chat` call spawns an
/// independent turn-scoped stream. Session and user identity, when set, are
/// forwarded to each of the agent's runs (typical wiring uses the room name
/// and the participant identity).
pub struct LlmAdapter {
    agent: Arc<dyn AgnoAgent>,
    session_id: Option<String>,
    user_id: Option<String>,
}

impl LlmAdapter {
    /// Wraps an agent with no session or user identity attached.
    pub fn new(agent: Arc<dyn AgnoAgent>) -> Self {
        Self {
            agent,
            session_id: None,
            user_id: None,
        }
    }

    /// Sets the conversation id forwarded to every run.
    pub fn session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// Sets the end-user id forwarded to every run.
    pub fn user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }
}

impl LlmBackend for LlmAdapter {
    fn model(&self) -> String {
        self.agent
            .model_id()
            .unwrap_or_else(|| PROVIDER.to_string())
    }

    fn provider(&self) -> &str {
        PROVIDER
    }

    fn chat(&self, request: ChatRequest) -> LlmStream {
        if !request.tools.is_empty() {
            // Known gap: per-call tools are dropped in favor of the tool set
            // the wrapped agent was configured with.
            warn!(
                count = request.tools.len(),
                "ignoring per-call tools; the wrapped agent uses its preconfigured tool set"
            );
        }

        let capacity = request.conn_options.stream_buffer_capacity.max(1);
        let (tx, rx) = mpsc::channel(capacity);
        let (final_tx, final_rx) = oneshot::channel();
        let (abort_tx, abort_rx) = watch::channel(false);
        let abort_handle = AbortHandle::new(abort_tx);

        let turn = Turn {
            agent: self.agent.clone(),
            turn_id: uuid::Uuid::new_v4(),
            session_id: self.session_id.clone(),
            user_id: self.user_id.clone(),
        };
        let turn_id = turn.turn_id;
        tokio::spawn(run_turn(turn, request.chat_ctx, tx, final_tx, abort_rx));

        LlmStream::new(turn_id, rx, final_rx, abort_handle)
    }
}

struct Turn {
    agent: Arc<dyn AgnoAgent>,
    turn_id: uuid::Uuid,
    session_id: Option<String>,
    user_id: Option<String>,
}

async fn run_turn(
    turn: Turn,
    chat_ctx: ChatContext,
    tx: mpsc::Sender<ChatChunk>,
    final_tx: oneshot::Sender<Result<(), LlmError>>,
    mut abort_rx: watch::Receiver<bool>,
) {
    let turn_id = turn.turn_id;
    let input = match chat_ctx.last_user_text() {
        Some(text) if !text.is_empty() => text,
        _ => {
            debug!(turn_id = %turn_id, "no user input in chat context; ending turn without output");
            let _ = final_tx.send(Ok(()));
            return;
        }
    };

    debug!(turn_id = %turn_id, session_id = ?turn.session_id, "starting agent run");
    let started = turn
        .agent
        .arun(RunRequest {
            input,
            stream: true,
            session_id: turn.session_id,
            user_id: turn.user_id,
        })
        .await;
    let mut events = match started {
        Ok(events) => events,
        Err(err) => {
            let _ = final_tx.send(Err(err.into()));
            return;
        }
    };

    let mut seq = 0_u64;
    loop {
        tokio::select! {
            changed = abort_rx.changed() => {
                match changed {
                    Ok(_) if *abort_rx.borrow() => {
                        debug!(turn_id = %turn_id, "chat turn cancelled");
                        let _ = final_tx.send(Err(LlmError::Cancelled));
                        return;
                    }
                    Ok(_) => {}
                    // Every handle is gone: nobody can consume this turn.
                    Err(_) => {
                        let _ = final_tx.send(Err(LlmError::protocol_msg(
                            "chunk receiver dropped mid-turn",
                        )));
                        return;
                    }
                }
            }
            next = events.next() => {
                match next {
                    Some(Ok(event)) => {
                        let Some(chunk) = to_chat_chunk(&event) else {
                            continue;
                        };
                        debug!(turn_id = %turn_id, seq, "forwarding chunk");
                        seq = seq.saturating_add(1);
                        if tx.send(chunk).await.is_err() {
                            let _ = final_tx.send(Err(LlmError::protocol_msg(
                                "chunk receiver dropped mid-turn",
                            )));
                            return;
                        }
                    }
                    Some(Err(err)) => {
                        let _ = final_tx.send(Err(err.into()));
                        return;
                    }
                    None => {
                        debug!(turn_id = %turn_id, chunks = seq, "agent run complete");
                        let _ = final_tx.send(Ok(()));
                        return;
                    }
                }
            }
        }
    }
}

/// Maps one run event to an output chunk, or `None` when the event carries no
/// renderable content.
///
/// Dispatch is by priority: content increments are used verbatim, then
/// terminal output, then any generic content attribute. Unrecognized shapes
/// are skipped, never an error.
pub(crate) fn to_chat_chunk(event: &RunEvent) -> Option<ChatChunk> {
    let content = match event {
        RunEvent::Content { delta } => delta.clone(),
        RunEvent::Completed {
            content: Some(value),
        }
        | RunEvent::Other {
            content: Some(value),
        } if !value.is_null() => render_content(value),
        _ => return None,
    };
    if content.is_empty() {
        return None;
    }
    Some(ChatChunk {
        id: CHUNK_ID.to_string(),
        delta: ChoiceDelta {
            role: ChatRole::Assistant,
            content,
        },
    })
}

fn render_content(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::RunEventStream;
    use crate::chat::ChatMessage;
    use crate::errors::AgentRunError;
    use crate::llm::ToolSpec;
    use futures::stream;
    use std::sync::Mutex;

    struct FakeAgent {
        model_id: Option<String>,
        behavior: FakeAgentBehavior,
        seen: Mutex<Vec<RunRequest>>,
    }

    enum FakeAgentBehavior {
        Events(Vec<Result<RunEvent, AgentRunError>>),
        StartError(AgentRunError),
        Pending,
    }

    impl FakeAgent {
        fn with_events(events: Vec<Result<RunEvent, AgentRunError>>) -> Self {
            Self {
                model_id: Some("fake-model".into()),
                behavior: FakeAgentBehavior::Events(events),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait::async_trait]
    impl AgnoAgent for FakeAgent {
        fn model_id(&self) -> Option<String> {
            self.model_id.clone()
        }

        async fn arun(&self, request: RunRequest) -> Result<RunEventStream, AgentRunError> {
            self.seen.lock().expect("seen lock").push(request);
            match &self.behavior {
                FakeAgentBehavior::Events(events) => Ok(Box::pin(stream::iter(events.clone()))),
                FakeAgentBehavior::StartError(err) => Err(err.clone()),
                FakeAgentBehavior::Pending => Ok(Box::pin(stream::pending())),
            }
        }
    }

    fn user_ctx(text: &str) -> ChatContext {
        ChatContext::new().with_message(ChatMessage::user(text))
    }

    fn content(delta: &str) -> Result<RunEvent, AgentRunError> {
        Ok(RunEvent::Content {
            delta: delta.into(),
        })
    }

    async fn drain(stream: &mut LlmStream) -> Vec<String> {
        let mut deltas = Vec::new();
        while let Some(chunk) = stream.next_chunk().await {
            deltas.push(chunk.delta.content);
        }
        deltas
    }

    #[test]
    fn translator_uses_content_delta_verbatim() {
        let chunk = to_chat_chunk(&RunEvent::Content {
            delta: "hello".into(),
        })
        .expect("chunk");
        assert_eq!(chunk.id, CHUNK_ID);
        assert_eq!(chunk.delta.role, ChatRole::Assistant);
        assert_eq!(chunk.delta.content, "hello");
    }

    #[test]
    fn translator_skips_empty_or_missing_content() {
        assert_eq!(to_chat_chunk(&RunEvent::Content { delta: "".into() }), None);
        assert_eq!(to_chat_chunk(&RunEvent::Completed { content: None }), None);
        assert_eq!(
            to_chat_chunk(&RunEvent::Completed {
                content: Some(serde_json::Value::Null)
            }),
            None
        );
        assert_eq!(
            to_chat_chunk(&RunEvent::Other {
                content: Some(serde_json::Value::String(String::new()))
            }),
            None
        );
    }

    #[test]
    fn translator_stringifies_terminal_and_generic_content() {
        let completed = to_chat_chunk(&RunEvent::Completed {
            content: Some(serde_json::Value::String("full answer".into())),
        })
        .expect("completed chunk");
        assert_eq!(completed.delta.content, "full answer");

        let structured = to_chat_chunk(&RunEvent::Completed {
            content: Some(serde_json::json!({"answer": 42})),
        })
        .expect("structured chunk");
        assert_eq!(structured.delta.content, r#"{"answer":42}"#);

        let other = to_chat_chunk(&RunEvent::Other {
            content: Some(serde_json::Value::String("aside".into())),
        })
        .expect("other chunk");
        assert_eq!(other.delta.content, "aside");
    }

    #[tokio::test]
    async fn empty_content_events_produce_no_chunks() {
        let agent = Arc::new(FakeAgent::with_events(vec![
            content("Hi"),
            content(""),
            content(" there"),
        ]));
        let backend = LlmAdapter::new(agent);

        let mut stream = backend.chat(ChatRequest::new(user_ctx("hello")));
        let deltas = drain(&mut stream).await;
        assert_eq!(deltas, vec!["Hi".to_string(), " there".to_string()]);
        assert_eq!(stream.finish().await, Ok(()));
    }

    #[tokio::test]
    async fn single_user_turn_streams_agent_reply() {
        let agent = Arc::new(FakeAgent::with_events(vec![content("It's 3 PM.")]));
        let backend = LlmAdapter::new(agent.clone())
            .session_id("room-42")
            .user_id("participant-7");

        let mut stream = backend.chat(ChatRequest::new(user_ctx("What time is it?")));
        let deltas = drain(&mut stream).await;
        assert_eq!(deltas, vec!["It's 3 PM.".to_string()]);
        assert_eq!(stream.finish().await, Ok(()));

        let seen = agent.seen.lock().expect("seen lock");
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].input, "What time is it?");
        assert!(seen[0].stream);
        assert_eq!(seen[0].session_id.as_deref(), Some("room-42"));
        assert_eq!(seen[0].user_id.as_deref(), Some("participant-7"));
    }

    #[tokio::test]
    async fn mid_stream_error_ends_turn_with_that_error() {
        let err = AgentRunError::transport("connection reset");
        let agent = Arc::new(FakeAgent::with_events(vec![
            content("partial"),
            Err(err.clone()),
            content("never sent"),
        ]));
        let backend = LlmAdapter::new(agent);

        let mut stream = backend.chat(ChatRequest::new(user_ctx("hello")));
        let deltas = drain(&mut stream).await;
        assert_eq!(deltas, vec!["partial".to_string()]);
        assert_eq!(stream.finish().await, Err(LlmError::Agent(err)));
    }

    #[tokio::test]
    async fn start_error_propagates_with_no_chunks() {
        let err = AgentRunError::model("quota exceeded", Some(429));
        let agent = Arc::new(FakeAgent {
            model_id: None,
            behavior: FakeAgentBehavior::StartError(err.clone()),
            seen: Mutex::new(Vec::new()),
        });
        let backend = LlmAdapter::new(agent);

        let mut stream = backend.chat(ChatRequest::new(user_ctx("hello")));
        assert!(drain(&mut stream).await.is_empty());
        assert_eq!(stream.finish().await, Err(LlmError::Agent(err)));
    }

    #[tokio::test]
    async fn no_user_message_ends_turn_without_output() {
        let agent = Arc::new(FakeAgent::with_events(vec![content("unexpected")]));
        let backend = LlmAdapter::new(agent.clone());

        let ctx = ChatContext::new()
            .with_message(ChatMessage::system("be brief"))
            .with_message(ChatMessage::assistant("hello"));
        let mut stream = backend.chat(ChatRequest::new(ctx));
        assert!(drain(&mut stream).await.is_empty());
        assert_eq!(stream.finish().await, Ok(()));
        assert!(agent.seen.lock().expect("seen lock").is_empty());
    }

    #[tokio::test]
    async fn abort_cancels_a_pending_run() {
        let agent = Arc::new(FakeAgent {
            model_id: None,
            behavior: FakeAgentBehavior::Pending,
            seen: Mutex::new(Vec::new()),
        });
        let backend = LlmAdapter::new(agent);

        let stream = backend.chat(ChatRequest::new(user_ctx("hello")));
        let abort = stream.abort_handle();
        abort.abort();
        assert_eq!(stream.finish().await, Err(LlmError::Cancelled));
    }

    #[tokio::test]
    async fn per_call_tools_are_accepted_but_not_forwarded() {
        let agent = Arc::new(FakeAgent::with_events(vec![content("ok")]));
        let backend = LlmAdapter::new(agent.clone());

        let request = ChatRequest::new(user_ctx("hello")).tools(vec![ToolSpec {
            name: "get_weather".into(),
            description: "Weather lookup".into(),
            parameters: serde_json::json!({"type": "object"}),
        }]);
        let stream = backend.chat(request);
        assert_eq!(stream.collect_text().await, Ok("ok".to_string()));

        // The run request carries only the flattened input and identity; the
        // agent's own tool set applies.
        let seen = agent.seen.lock().expect("seen lock");
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].input, "hello");
    }

    #[tokio::test]
    async fn collect_text_concatenates_deltas() {
        let agent = Arc::new(FakeAgent::with_events(vec![
            content("a"),
            content("b"),
            content("c"),
        ]));
        let backend = LlmAdapter::new(agent);

        let stream = backend.chat(ChatRequest::new(user_ctx("hello")));
        assert_eq!(stream.collect_text().await, Ok("abc".to_string()));
    }

    #[test]
    fn model_falls_back_to_provider_label() {
        let configured = LlmAdapter::new(Arc::new(FakeAgent::with_events(vec![])));
        assert_eq!(configured.model(), "fake-model");
        assert_eq!(configured.provider(), PROVIDER);

        let bare = LlmAdapter::new(Arc::new(FakeAgent {
            model_id: None,
            behavior: FakeAgentBehavior::Events(vec![]),
            seen: Mutex::new(Vec::new()),
        }));
        assert_eq!(bare.model(), "agno");
    }

    #[tokio::test]
    async fn multimodal_user_content_is_flattened_for_the_agent() {
        let agent = Arc::new(FakeAgent::with_events(vec![content("seen")]));
        let backend = LlmAdapter::new(agent.clone());

        let ctx = ChatContext::new().with_message(ChatMessage::new(
            ChatRole::User,
            crate::chat::MessageContent::Parts(vec![
                crate::chat::ContentPart::Text("describe".into()),
                crate::chat::ContentPart::Json(serde_json::Value::String("this".into())),
            ]),
        ));
        let stream = backend.chat(ChatRequest::new(ctx));
        assert_eq!(stream.collect_text().await, Ok("seen".to_string()));
        assert_eq!(
            agent.seen.lock().expect("seen lock")[0].input,
            "describe this"
        );
    }
}

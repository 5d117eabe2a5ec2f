//! Collects one chat turn's full text from a scripted stand-in agent,
//! exercising the terminal-output fallback path (a run that streams no
//! incremental events and only reports its final result).

use std::sync::Arc;

use futures::stream;
use livekit_agno::prelude::*;

/// Stand-in agent that emits a single terminal output event.
struct FinalOnlyAgent;

#[async_trait::async_trait]
impl AgnoAgent for FinalOnlyAgent {
    fn model_id(&self) -> Option<String> {
        None
    }

    async fn arun(&self, request: RunRequest) -> Result<RunEventStream, AgentRunError> {
        let answer = format!("You said: {}", request.input);
        Ok(Box::pin(stream::iter(vec![Ok(RunEvent::Completed {
            content: Some(serde_json::Value::String(answer)),
        })])))
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), LlmError> {
    let backend = LlmAdapter::new(Arc::new(FinalOnlyAgent)).session_id("demo-room");
    println!("model: {} ({})", backend.model(), backend.provider());

    let ctx = ChatContext::new().with_message(ChatMessage::user("hello there"));
    let text = backend.chat(ChatRequest::new(ctx)).collect_text().await?;
    println!("{text}");
    Ok(())
}

//! Runs one chat turn against a scripted stand-in agent and prints the
//! streamed deltas.
//!
//! Network-free: the "agent" answers from a small canned table, word by word,
//! the way a configured agent would stream model output. Swap `ScriptedAgent`
//! for a real `AgnoAgent` implementation to plug in an actual backend.

use std::sync::Arc;

use futures::stream;
use livekit_agno::prelude::*;

/// Stand-in agent with canned, tool-flavored answers.
struct ScriptedAgent;

#[async_trait::async_trait]
impl AgnoAgent for ScriptedAgent {
    fn model_id(&self) -> Option<String> {
        Some("scripted-mini".into())
    }

    async fn arun(&self, request: RunRequest) -> Result<RunEventStream, AgentRunError> {
        let reply = if request.input.contains("time") {
            "It's 3 PM where I am."
        } else if request.input.contains("weather") {
            "Sunny and 22 degrees."
        } else {
            "I can tell you the time or the weather."
        };
        let events = reply
            .split_inclusive(' ')
            .map(|word| {
                Ok(RunEvent::Content {
                    delta: word.to_string(),
                })
            })
            .collect::<Vec<_>>();
        Ok(Box::pin(stream::iter(events)))
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), LlmError> {
    let backend = LlmAdapter::new(Arc::new(ScriptedAgent))
        .session_id("demo-room")
        .user_id("demo-user");

    let mut ctx = ChatContext::new();
    ctx.push(ChatMessage::user("What's the weather like?"));

    let mut stream = backend.chat(ChatRequest::new(ctx));
    while let Some(chunk) = stream.next_chunk().await {
        print!("{}", chunk.delta.content);
    }
    println!();
    stream.finish().await
}

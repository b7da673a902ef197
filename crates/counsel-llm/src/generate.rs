use anyhow::Result;
use futures::StreamExt;
use thiserror::Error;

use crate::abort::AbortSignal;
use crate::client::{ChatRequest, ModelClient};
use crate::message::ChatMessage;
use crate::streaming::StreamEvent;

/// Marker error returned when a generation run is cancelled mid-stream.
/// No partial result is persisted on this path.
#[derive(Debug, Error)]
#[error("generation aborted")]
pub struct Aborted;

#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    /// Fallback system prompt used when `messages` carries no system turn.
    pub prompt: Option<String>,
    pub signal: Option<AbortSignal>,
}

/// Drive a streaming generation to completion, invoking `on_reasoning` and
/// `on_chunk` for each incremental token batch, and return the full answer
/// text.
///
/// Both callbacks receive `(delta, accumulated_text)`.
pub async fn generate_text<R, C>(
    client: &dyn ModelClient,
    request: GenerateRequest,
    mut on_reasoning: R,
    mut on_chunk: C,
) -> Result<String>
where
    R: FnMut(&str, &str) + Send,
    C: FnMut(&str, &str) + Send,
{
    let mut messages = request.messages;
    let has_system = messages
        .iter()
        .any(|m| matches!(m, ChatMessage::System { .. }));
    if !has_system {
        if let Some(prompt) = request.prompt {
            messages.insert(0, ChatMessage::system(prompt));
        }
    }

    let mut stream = client
        .stream_chat(ChatRequest::new(request.model, messages))
        .await?;

    let mut signal = request.signal;
    let mut reasoning_text = String::new();
    let mut answer_text = String::new();

    loop {
        let next = match signal.as_mut() {
            Some(sig) => {
                tokio::select! {
                    _ = sig.cancelled() => return Err(Aborted.into()),
                    event = stream.next() => event,
                }
            }
            None => stream.next().await,
        };

        let Some(event) = next else { break };

        match event? {
            StreamEvent::Reasoning { content } => {
                reasoning_text.push_str(&content);
                on_reasoning(&content, &reasoning_text);
            }
            StreamEvent::Message { content } => {
                answer_text.push_str(&content);
                on_chunk(&content, &answer_text);
            }
            StreamEvent::Done { .. } => break,
        }
    }

    Ok(answer_text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abort::abort_pair;
    use crate::client::EventStream;
    use async_trait::async_trait;
    use std::time::Duration;

    /// Scripted client replaying a fixed event sequence.
    struct ScriptedClient {
        events: Vec<StreamEvent>,
        delay: Option<Duration>,
    }

    #[async_trait]
    impl ModelClient for ScriptedClient {
        async fn stream_chat(&self, _request: ChatRequest) -> Result<EventStream> {
            let events = self.events.clone();
            let delay = self.delay;
            Ok(Box::pin(async_stream::stream! {
                for event in events {
                    if let Some(delay) = delay {
                        tokio::time::sleep(delay).await;
                    }
                    yield Ok(event);
                }
            }))
        }
    }

    #[tokio::test]
    async fn accumulates_answer_and_reasoning_separately() {
        let client = ScriptedClient {
            events: vec![
                StreamEvent::Reasoning {
                    content: "think ".into(),
                },
                StreamEvent::Reasoning {
                    content: "hard".into(),
                },
                StreamEvent::Message {
                    content: "answer ".into(),
                },
                StreamEvent::Message {
                    content: "text".into(),
                },
                StreamEvent::Done {
                    finish_reason: Some("stop".into()),
                },
            ],
            delay: None,
        };

        let mut reasoning_seen = String::new();
        let request = GenerateRequest {
            model: "gpt-4.1".into(),
            messages: vec![ChatMessage::user("q")],
            prompt: None,
            signal: None,
        };

        let answer = generate_text(
            &client,
            request,
            |_delta, full| reasoning_seen = full.to_string(),
            |_delta, _full| {},
        )
        .await
        .unwrap();

        assert_eq!(answer, "answer text");
        assert_eq!(reasoning_seen, "think hard");
    }

    #[tokio::test]
    async fn fallback_prompt_becomes_system_turn_only_when_missing() {
        struct CapturingClient {
            tx: tokio::sync::mpsc::UnboundedSender<Vec<ChatMessage>>,
        }

        #[async_trait]
        impl ModelClient for CapturingClient {
            async fn stream_chat(&self, request: ChatRequest) -> Result<EventStream> {
                self.tx.send(request.messages).unwrap();
                Ok(Box::pin(futures::stream::iter(vec![Ok(StreamEvent::Done {
                    finish_reason: None,
                })])))
            }
        }

        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let client = CapturingClient { tx };

        let request = GenerateRequest {
            model: "gpt-4.1".into(),
            messages: vec![ChatMessage::user("q")],
            prompt: Some("be helpful".into()),
            signal: None,
        };
        generate_text(&client, request, |_, _| {}, |_, _| {})
            .await
            .unwrap();

        let sent = rx.recv().await.unwrap();
        assert_eq!(sent[0], ChatMessage::system("be helpful"));

        let request = GenerateRequest {
            model: "gpt-4.1".into(),
            messages: vec![ChatMessage::system("already set"), ChatMessage::user("q")],
            prompt: Some("be helpful".into()),
            signal: None,
        };
        generate_text(&client, request, |_, _| {}, |_, _| {})
            .await
            .unwrap();

        let sent = rx.recv().await.unwrap();
        assert_eq!(sent[0], ChatMessage::system("already set"));
        assert_eq!(sent.len(), 2);
    }

    #[tokio::test]
    async fn abort_interrupts_generation() {
        let client = ScriptedClient {
            events: vec![
                StreamEvent::Message {
                    content: "never-ending".into(),
                };
                100
            ],
            delay: Some(Duration::from_millis(10)),
        };

        let (handle, signal) = abort_pair();
        let request = GenerateRequest {
            model: "gpt-4.1".into(),
            messages: vec![ChatMessage::user("q")],
            prompt: None,
            signal: Some(signal),
        };

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(25)).await;
            handle.abort();
        });

        let err = generate_text(&client, request, |_, _| {}, |_, _| {})
            .await
            .unwrap_err();
        assert!(err.downcast_ref::<Aborted>().is_some());
    }
}

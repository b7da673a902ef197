use anyhow::Result;
use futures::{Stream, StreamExt};
use reqwest::Response;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::pin::Pin;

/// Incremental event emitted while a model response streams in.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    Reasoning {
        content: String,
    },

    Message {
        content: String,
    },

    Done {
        #[serde(skip_serializing_if = "Option::is_none")]
        finish_reason: Option<String>,
    },
}

/// Line accumulator for SSE byte streams.
///
/// Bytes go in as they arrive; complete lines come out once a newline is
/// observed, leaving partial tails buffered.
pub struct SseLineBuffer {
    buffer: VecDeque<u8>,
}

impl SseLineBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: VecDeque::with_capacity(capacity),
        }
    }

    pub fn extend(&mut self, bytes: &[u8]) {
        self.buffer.extend(bytes);
    }

    /// Extract the next complete line, trimmed. None until a newline arrives.
    pub fn next_line(&mut self) -> Option<Result<String>> {
        let newline_pos = self.buffer.iter().position(|&b| b == b'\n')?;
        let line_bytes: Vec<u8> = self.buffer.drain(..=newline_pos).collect();

        match std::str::from_utf8(&line_bytes) {
            Ok(line) => Some(Ok(line.trim().to_string())),
            Err(e) => Some(Err(anyhow::anyhow!("invalid UTF-8 in stream: {}", e))),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatStreamChunk {
    pub choices: Vec<StreamChoice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StreamChoice {
    pub delta: Delta,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Delta {
    pub content: Option<String>,
    /// Reasoning-token delta emitted by reasoning-capable models.
    pub reasoning_content: Option<String>,
}

impl ChatStreamChunk {
    fn to_stream_events(&self) -> Vec<StreamEvent> {
        let mut events = Vec::new();

        if let Some(choice) = self.choices.first() {
            if let Some(reasoning) = &choice.delta.reasoning_content {
                if !reasoning.is_empty() {
                    events.push(StreamEvent::Reasoning {
                        content: reasoning.clone(),
                    });
                }
            }

            if let Some(content) = &choice.delta.content {
                if !content.is_empty() {
                    events.push(StreamEvent::Message {
                        content: content.clone(),
                    });
                }
            }

            if let Some(finish_reason) = &choice.finish_reason {
                events.push(StreamEvent::Done {
                    finish_reason: Some(finish_reason.clone()),
                });
            }
        }

        events
    }
}

/// Parse an OpenAI-compatible `chat/completions` SSE response into stream
/// events.
pub fn parse_chat_sse_stream(
    response: Response,
) -> Pin<Box<dyn Stream<Item = Result<StreamEvent>> + Send>> {
    let stream = response.bytes_stream();

    Box::pin(async_stream::stream! {
        let mut byte_chunks = Box::pin(stream);
        let mut lines = SseLineBuffer::with_capacity(8192);

        while let Some(chunk_result) = byte_chunks.next().await {
            match chunk_result {
                Ok(bytes) => {
                    lines.extend(&bytes);

                    while let Some(line_result) = lines.next_line() {
                        let line = match line_result {
                            Ok(line) => line,
                            Err(e) => {
                                yield Err(e);
                                continue;
                            }
                        };

                        if line.is_empty() {
                            continue;
                        }

                        if let Some(data) = line.strip_prefix("data: ") {
                            if data == "[DONE]" {
                                yield Ok(StreamEvent::Done { finish_reason: None });
                                return;
                            }

                            match serde_json::from_str::<ChatStreamChunk>(data) {
                                Ok(chunk) => {
                                    for event in chunk.to_stream_events() {
                                        yield Ok(event);
                                    }
                                }
                                Err(e) => yield Err(anyhow::anyhow!("failed to parse chunk: {}", e)),
                            }
                        }
                    }
                }
                Err(e) => yield Err(anyhow::anyhow!("stream error: {}", e)),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_buffer_extracts_complete_lines() {
        let mut lines = SseLineBuffer::with_capacity(64);
        lines.extend(b"data: one\ndata: two\n");

        assert_eq!(lines.next_line().unwrap().unwrap(), "data: one");
        assert_eq!(lines.next_line().unwrap().unwrap(), "data: two");
        assert!(lines.next_line().is_none());
    }

    #[test]
    fn line_buffer_keeps_partial_tail() {
        let mut lines = SseLineBuffer::with_capacity(64);
        lines.extend(b"data: par");
        assert!(lines.next_line().is_none());

        lines.extend(b"tial\n");
        assert_eq!(lines.next_line().unwrap().unwrap(), "data: partial");
    }

    #[test]
    fn chunk_splits_reasoning_and_message() {
        let chunk: ChatStreamChunk = serde_json::from_str(
            r#"{"choices":[{"delta":{"content":"hi","reasoning_content":"think"},"finish_reason":null}]}"#,
        )
        .unwrap();
        let events = chunk.to_stream_events();
        assert!(matches!(&events[0], StreamEvent::Reasoning { content } if content == "think"));
        assert!(matches!(&events[1], StreamEvent::Message { content } if content == "hi"));
    }

    #[test]
    fn finish_reason_yields_done() {
        let chunk: ChatStreamChunk = serde_json::from_str(
            r#"{"choices":[{"delta":{"content":null,"reasoning_content":null},"finish_reason":"stop"}]}"#,
        )
        .unwrap();
        let events = chunk.to_stream_events();
        assert!(matches!(&events[0], StreamEvent::Done { finish_reason: Some(r) } if r == "stop"));
    }
}

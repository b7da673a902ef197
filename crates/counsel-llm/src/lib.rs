pub mod abort;
pub mod buffer;
pub mod client;
pub mod generate;
pub mod message;
pub mod streaming;

pub use abort::{abort_pair, AbortHandle, AbortSignal};
pub use buffer::{BufferedChunk, ChunkBuffer};
pub use client::{ChatRequest, EventStream, ModelClient, OpenAIClient};
pub use generate::{generate_text, Aborted, GenerateRequest};
pub use message::ChatMessage;
pub use streaming::{parse_chat_sse_stream, SseLineBuffer, StreamEvent};

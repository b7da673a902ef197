use anyhow::Result;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use counsel_llm::{generate_text, AbortSignal, ChatMessage, ChunkBuffer, GenerateRequest, ModelClient};

use crate::context::{humanized_date, FinishPayload, TaskContext};
use crate::events::{TaskStatus, WorkflowEvent};
use crate::task::{EventSender, Task, TaskKind, TaskOutcome};

const FLUSH_THRESHOLD: usize = 200;

/// Search-framed answer task. Receives redirects from the completion task
/// when web search is requested; answers from the model with a prompt that
/// asks it to ground claims the way a search summary would.
pub struct QuickSearchTask {
    model: Arc<dyn ModelClient>,
}

impl QuickSearchTask {
    pub fn new(model: Arc<dyn ModelClient>) -> Self {
        Self { model }
    }

    fn search_prompt() -> String {
        format!(
            "You are a research assistant. Today is {}. Answer the user's question \
             as a concise, well-sourced summary: state the key facts first, note \
             anything time-sensitive that may have changed, and say so explicitly \
             when you are unsure.",
            humanized_date()
        )
    }
}

#[async_trait]
impl Task for QuickSearchTask {
    fn kind(&self) -> TaskKind {
        TaskKind::QuickSearch
    }

    async fn run(
        &self,
        ctx: &mut TaskContext,
        events: EventSender,
        signal: AbortSignal,
    ) -> Result<TaskOutcome> {
        let messages: Vec<ChatMessage> = ctx
            .messages
            .iter()
            .filter(|m| m.is_conversational())
            .cloned()
            .collect();

        let answer_buffer = Arc::new(Mutex::new(ChunkBuffer::new(FLUSH_THRESHOLD, &["\n"])));

        let answer_events = events.clone();
        let answer_sink = Arc::clone(&answer_buffer);
        let on_chunk = move |chunk: &str, _full: &str| {
            let mut buffer = answer_sink.lock().expect("answer buffer poisoned");
            buffer.append(chunk);
            if buffer.should_flush() {
                if let Some(flushed) = buffer.flush() {
                    if answer_events
                        .try_send(WorkflowEvent::AnswerUpdate { text: flushed.delta })
                        .is_err()
                    {
                        tracing::warn!("dropping answer update: event channel full");
                    }
                }
            }
        };

        let request = GenerateRequest {
            model: ctx.mode.model_id().to_string(),
            messages,
            prompt: Some(Self::search_prompt()),
            signal: Some(signal),
        };

        // Search answers do not stream reasoning.
        let response =
            generate_text(self.model.as_ref(), request, |_, _| {}, on_chunk).await?;

        // Guard must drop before the send awaits.
        let pending_answer = answer_buffer
            .lock()
            .expect("answer buffer poisoned")
            .finalize();
        if let Some(flushed) = pending_answer {
            events
                .send(WorkflowEvent::AnswerUpdate { text: flushed.delta })
                .await?;
        }

        events
            .send(WorkflowEvent::AnswerComplete {
                full_text: response.clone(),
            })
            .await?;
        events
            .send(WorkflowEvent::StatusUpdate {
                status: TaskStatus::Completed,
            })
            .await?;

        ctx.answer = Some(response.clone());

        if let Some(on_finish) = &ctx.on_finish {
            on_finish(FinishPayload {
                answer: response,
                thread_id: ctx.thread_id.clone(),
                thread_item_id: ctx.thread_item_id.clone(),
            });
        }

        if ctx.show_suggestions && ctx.has_answer() {
            Ok(TaskOutcome::Next(TaskKind::Suggestions))
        } else {
            Ok(TaskOutcome::Done)
        }
    }
}

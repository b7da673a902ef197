use anyhow::Result;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use counsel_llm::{generate_text, AbortSignal, ChatMessage, ChunkBuffer, GenerateRequest, ModelClient};

use crate::context::{humanized_date, FinishPayload, TaskContext};
use crate::domain::domain_config;
use crate::events::{TaskStatus, WorkflowEvent};
use crate::task::{EventSender, Task, TaskKind, TaskOutcome};

/// Custom instructions longer than this are dropped from the system prompt.
const MAX_CUSTOM_INSTRUCTIONS_LEN: usize = 6000;

/// Flush threshold shared by both stream buffers.
const FLUSH_THRESHOLD: usize = 200;

/// The main answer-generation task.
///
/// Builds a system prompt from the domain table and user custom
/// instructions, streams the model output through dual chunk buffers
/// (reasoning breaks on blank lines, answers on line ends), and routes to
/// the suggestions task when enabled.
pub struct CompletionTask {
    model: Arc<dyn ModelClient>,
}

impl CompletionTask {
    pub fn new(model: Arc<dyn ModelClient>) -> Self {
        Self { model }
    }

    /// Prior turns worth sending: user/assistant messages with content.
    fn conversation_history(ctx: &TaskContext) -> Vec<ChatMessage> {
        ctx.messages
            .iter()
            .filter(|m| m.is_conversational())
            .cloned()
            .collect()
    }

    fn build_system_content(ctx: &TaskContext) -> String {
        let mut content = format!("Today is {}.", humanized_date());
        if let Some(geo) = &ctx.geo {
            content.push_str(&format!(
                " Current location is {}, {}.",
                geo.city, geo.country
            ));
        }

        if let Some(domain) = ctx.domain {
            content.push_str("\n\n");
            content.push_str(domain_config(domain).instructions);
        }

        if let Some(instructions) = &ctx.custom_instructions {
            if instructions.len() < MAX_CUSTOM_INSTRUCTIONS_LEN {
                content.push_str("\n\n");
                content.push_str(instructions);
            }
        }

        content
    }
}

#[async_trait]
impl Task for CompletionTask {
    fn kind(&self) -> TaskKind {
        TaskKind::Completion
    }

    async fn run(
        &self,
        ctx: &mut TaskContext,
        events: EventSender,
        signal: AbortSignal,
    ) -> Result<TaskOutcome> {
        let mut messages = Self::conversation_history(ctx);

        // System turn only when there is something domain- or user-specific
        // to say.
        if ctx.domain.is_some() || ctx.custom_instructions.is_some() {
            messages.insert(0, ChatMessage::system(Self::build_system_content(ctx)));
        }

        // Web search is a different pipeline entirely; hand off before any
        // generation happens here.
        if ctx.web_search {
            return Ok(TaskOutcome::Next(TaskKind::QuickSearch));
        }

        let reasoning_buffer = Arc::new(Mutex::new(ChunkBuffer::new(FLUSH_THRESHOLD, &["\n\n"])));
        let answer_buffer = Arc::new(Mutex::new(ChunkBuffer::new(FLUSH_THRESHOLD, &["\n"])));

        let reasoning_events = events.clone();
        let reasoning_sink = Arc::clone(&reasoning_buffer);
        let on_reasoning = move |chunk: &str, _full: &str| {
            let mut buffer = reasoning_sink.lock().expect("reasoning buffer poisoned");
            buffer.append(chunk);
            if buffer.should_flush() {
                if let Some(flushed) = buffer.flush() {
                    // Reasoning panes re-render from the full text.
                    if reasoning_events
                        .try_send(WorkflowEvent::ReasoningUpdate { text: flushed.text })
                        .is_err()
                    {
                        tracing::warn!("dropping reasoning update: event channel full");
                    }
                }
            }
        };

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
            prompt: Some(format!(
                "You are a helpful assistant that can answer questions and help with tasks.\n\
                 Today is {}.",
                humanized_date()
            )),
            signal: Some(signal),
        };

        let response = generate_text(self.model.as_ref(), request, on_reasoning, on_chunk).await?;

        // Close both buffers: whatever is pending goes out regardless of
        // threshold. The guard must drop before the send awaits.
        let pending_reasoning = reasoning_buffer
            .lock()
            .expect("reasoning buffer poisoned")
            .finalize();
        if let Some(flushed) = pending_reasoning {
            events
                .send(WorkflowEvent::ReasoningUpdate { text: flushed.text })
                .await?;
        }
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

#[cfg(test)]
mod tests {
    use super::*;
    use counsel_types::Domain;

    fn ctx_with(domain: Option<Domain>, custom: Option<String>) -> TaskContext {
        TaskContext::new(
            "t1",
            "i1",
            "u1",
            counsel_types::ChatMode::Gpt41,
            vec![ChatMessage::user("hello")],
        )
        .with_domain(domain)
        .with_custom_instructions(custom)
    }

    #[test]
    fn system_content_includes_domain_block() {
        let ctx = ctx_with(Some(Domain::Legal), None);
        let content = CompletionTask::build_system_content(&ctx);
        assert!(content.contains("specialized in legal advice"));
    }

    #[test]
    fn oversized_custom_instructions_are_dropped() {
        let oversized = "x".repeat(MAX_CUSTOM_INSTRUCTIONS_LEN);
        let ctx = ctx_with(Some(Domain::Legal), Some(oversized.clone()));
        let content = CompletionTask::build_system_content(&ctx);
        assert!(!content.contains(&oversized));

        let fitting = "answer in French".to_string();
        let ctx = ctx_with(Some(Domain::Legal), Some(fitting.clone()));
        let content = CompletionTask::build_system_content(&ctx);
        assert!(content.contains(&fitting));
    }

    #[test]
    fn history_drops_system_and_empty_turns() {
        let mut ctx = ctx_with(None, None);
        ctx.messages = vec![
            ChatMessage::system("sys"),
            ChatMessage::user("q"),
            ChatMessage::assistant(""),
            ChatMessage::assistant("a"),
        ];
        let history = CompletionTask::conversation_history(&ctx);
        assert_eq!(history.len(), 2);
        assert_eq!(history[0], ChatMessage::user("q"));
        assert_eq!(history[1], ChatMessage::assistant("a"));
    }

    #[test]
    fn geo_hint_lands_in_system_content() {
        let ctx = ctx_with(Some(Domain::RealEstate), None).with_geo(Some(crate::Geo {
            city: "Lisbon".into(),
            country: "Portugal".into(),
        }));
        let content = CompletionTask::build_system_content(&ctx);
        assert!(content.contains("Lisbon, Portugal"));
    }
}

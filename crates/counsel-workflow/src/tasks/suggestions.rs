use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use counsel_llm::{generate_text, AbortSignal, ChatMessage, GenerateRequest, ModelClient};

use crate::context::TaskContext;
use crate::events::WorkflowEvent;
use crate::task::{EventSender, Task, TaskKind, TaskOutcome};

const MAX_SUGGESTIONS: usize = 3;

/// Generates follow-up questions once an answer exists. Runs only when the
/// completion or quick-search task routed here; always terminal.
pub struct SuggestionsTask {
    model: Arc<dyn ModelClient>,
}

impl SuggestionsTask {
    pub fn new(model: Arc<dyn ModelClient>) -> Self {
        Self { model }
    }

    fn parse_suggestions(text: &str) -> Vec<String> {
        text.lines()
            .map(|line| {
                line.trim()
                    .trim_start_matches(['-', '*'])
                    .trim_start_matches(|c: char| c.is_ascii_digit() || c == '.' || c == ')')
                    .trim()
                    .to_string()
            })
            .filter(|line| !line.is_empty())
            .take(MAX_SUGGESTIONS)
            .collect()
    }
}

#[async_trait]
impl Task for SuggestionsTask {
    fn kind(&self) -> TaskKind {
        TaskKind::Suggestions
    }

    async fn run(
        &self,
        ctx: &mut TaskContext,
        events: EventSender,
        signal: AbortSignal,
    ) -> Result<TaskOutcome> {
        let question = ctx.last_user_message().unwrap_or_default().to_string();
        let answer = ctx.answer.clone().unwrap_or_default();

        let request = GenerateRequest {
            model: ctx.mode.model_id().to_string(),
            messages: vec![ChatMessage::user(format!(
                "The user asked:\n{question}\n\nThe assistant answered:\n{answer}\n\n\
                 Suggest up to {MAX_SUGGESTIONS} short follow-up questions the user might \
                 ask next. Write one per line with no numbering or commentary."
            ))],
            prompt: Some(
                "You generate concise follow-up questions for a chat conversation.".to_string(),
            ),
            signal: Some(signal),
        };

        let response =
            generate_text(self.model.as_ref(), request, |_, _| {}, |_, _| {}).await?;

        let suggestions = Self::parse_suggestions(&response);
        if !suggestions.is_empty() {
            events
                .send(WorkflowEvent::SuggestionsUpdate {
                    suggestions: suggestions.clone(),
                })
                .await?;
        }
        ctx.suggestions = suggestions;

        Ok(TaskOutcome::Done)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_lines() {
        let parsed = SuggestionsTask::parse_suggestions(
            "What about zoning rules?\nHow long does an appeal take?\n",
        );
        assert_eq!(
            parsed,
            vec![
                "What about zoning rules?".to_string(),
                "How long does an appeal take?".to_string(),
            ]
        );
    }

    #[test]
    fn strips_bullets_and_numbering() {
        let parsed =
            SuggestionsTask::parse_suggestions("1. First question?\n- Second question?\n");
        assert_eq!(parsed, vec!["First question?", "Second question?"]);
    }

    #[test]
    fn caps_at_three() {
        let parsed = SuggestionsTask::parse_suggestions("a?\nb?\nc?\nd?\ne?");
        assert_eq!(parsed.len(), 3);
    }

    #[test]
    fn skips_blank_lines() {
        let parsed = SuggestionsTask::parse_suggestions("\n\nonly one?\n\n");
        assert_eq!(parsed, vec!["only one?"]);
    }
}

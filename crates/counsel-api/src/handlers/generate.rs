use axum::{
    extract::{Path, State},
    response::sse::{Event, Sse},
    Extension, Json,
};
use futures::stream::{Stream, StreamExt};
use serde::Deserialize;
use std::convert::Infallible;
use std::sync::Arc;
use tokio_stream::wrappers::ReceiverStream;

use counsel_llm::{abort_pair, AbortHandle, ChatMessage};
use counsel_types::{ItemStatus, ThreadItem, ThreadItemPatch};
use counsel_workflow::{validate_question, FinishPayload, Geo, TaskContext, WorkflowEvent};

use crate::{
    error::{ApiError, ApiResult},
    middleware::AuthUser,
    state::AppState,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    #[serde(default)]
    pub web_search: bool,
    #[serde(default)]
    pub show_suggestions: bool,
    #[serde(default)]
    pub custom_instructions: Option<String>,
    #[serde(default)]
    pub geo: Option<GeoBody>,
}

#[derive(Debug, Deserialize)]
pub struct GeoBody {
    pub city: String,
    pub country: String,
}

/// Aborts the workflow run when the SSE stream is dropped, which is how a
/// client disconnect or explicit cancel reaches the task chain.
struct AbortOnDrop(AbortHandle);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

fn answer_text(item: &ThreadItem) -> Option<String> {
    match item.answer.as_ref()? {
        serde_json::Value::String(text) => Some(text.clone()),
        value => value
            .get("text")
            .and_then(|t| t.as_str())
            .map(str::to_string),
    }
}

/// Conversation history up to (and including) the target item's query.
fn build_messages(items: &[ThreadItem], target_id: &str) -> Vec<ChatMessage> {
    let mut messages = Vec::new();
    for item in items {
        if item.id == target_id {
            messages.push(ChatMessage::user(item.query.clone()));
            break;
        }
        messages.push(ChatMessage::user(item.query.clone()));
        if let Some(answer) = answer_text(item) {
            messages.push(ChatMessage::assistant(answer));
        }
    }
    messages
}

fn event_name(event: &WorkflowEvent) -> &'static str {
    match event {
        WorkflowEvent::Started { .. } => "started",
        WorkflowEvent::ReasoningUpdate { .. } => "reasoning_update",
        WorkflowEvent::AnswerUpdate { .. } => "answer_update",
        WorkflowEvent::AnswerComplete { .. } => "answer_complete",
        WorkflowEvent::SuggestionsUpdate { .. } => "suggestions_update",
        WorkflowEvent::StatusUpdate { .. } => "status_update",
        WorkflowEvent::Error { .. } => "error",
        WorkflowEvent::Finished { .. } => "finished",
    }
}

/// Runs the chat workflow for one thread item and streams its events.
pub async fn generate(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path((thread_id, item_id)): Path<(String, String)>,
    Json(req): Json<GenerateRequest>,
) -> ApiResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    let thread = state
        .threads
        .get(&thread_id, &user.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(thread_id.clone()))?;

    let items = state.items.list(&thread_id).await?;
    let item = items
        .iter()
        .find(|i| i.id == item_id)
        .ok_or_else(|| ApiError::NotFound(item_id.clone()))?
        .clone();

    // Restricted domains gate the question before any generation; a
    // rejection is recorded on the item itself.
    let validation = validate_question(&item.query, Some(thread.domain));
    if !validation.is_valid {
        let suggestion = validation
            .suggestion
            .unwrap_or_else(|| "Question is outside this domain".to_string());
        state
            .items
            .update(
                &item_id,
                ThreadItemPatch {
                    status: Some(ItemStatus::Error),
                    error: Some(suggestion.clone()),
                    ..Default::default()
                },
            )
            .await?;
        return Err(ApiError::BadRequest(suggestion));
    }

    state
        .items
        .update(
            &item_id,
            ThreadItemPatch {
                status: Some(ItemStatus::Pending),
                ..Default::default()
            },
        )
        .await?;

    let messages = build_messages(&items, &item.id);

    let item_store = Arc::clone(&state.items);
    let on_finish = Arc::new(move |payload: FinishPayload| {
        let item_store = Arc::clone(&item_store);
        tokio::spawn(async move {
            let patch = ThreadItemPatch {
                status: Some(ItemStatus::Completed),
                answer: Some(serde_json::Value::String(payload.answer)),
                ..Default::default()
            };
            if let Err(e) = item_store.update(&payload.thread_item_id, patch).await {
                tracing::error!(error = %e, "failed to persist generated answer");
            }
        });
    });

    let ctx = TaskContext::new(
        thread.id.clone(),
        item.id.clone(),
        user.user_id.clone(),
        item.mode,
        messages,
    )
    .with_domain(Some(thread.domain))
    .with_custom_instructions(req.custom_instructions)
    .with_web_search(req.web_search)
    .with_show_suggestions(req.show_suggestions)
    .with_geo(req.geo.map(|g| Geo {
        city: g.city,
        country: g.country,
    }))
    .with_on_finish(on_finish);

    let (handle, signal) = abort_pair();
    let receiver = state.workflow.spawn_run(ctx, signal);

    let guard = AbortOnDrop(handle);
    let sse_stream = ReceiverStream::new(receiver).map(move |event| {
        let _guard = &guard;
        let sse_event = Event::default().event(event_name(&event));
        let sse_event = match sse_event.json_data(&event) {
            Ok(e) => e,
            Err(e) => {
                tracing::error!(error = %e, "failed to serialize workflow event");
                Event::default().event("error").data("serialization failure")
            }
        };
        Ok::<Event, Infallible>(sse_event)
    });

    Ok(Sse::new(sse_stream))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use counsel_types::ChatMode;

    fn item(id: &str, query: &str, answer: Option<serde_json::Value>) -> ThreadItem {
        ThreadItem {
            id: id.to_string(),
            thread_id: "t".to_string(),
            parent_id: None,
            query: query.to_string(),
            mode: ChatMode::Gpt41,
            status: ItemStatus::Completed,
            error: None,
            image_attachment: None,
            tool_calls: None,
            tool_results: None,
            steps: None,
            answer,
            metadata: None,
            sources: vec![],
            suggestions: vec![],
            object: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn history_includes_prior_exchanges_and_target_query() {
        let items = vec![
            item("a", "first?", Some(serde_json::json!("answer one"))),
            item("b", "second?", Some(serde_json::json!({ "text": "answer two" }))),
            item("c", "third?", None),
            item("d", "future?", None),
        ];

        let messages = build_messages(&items, "c");
        assert_eq!(
            messages,
            vec![
                ChatMessage::user("first?"),
                ChatMessage::assistant("answer one"),
                ChatMessage::user("second?"),
                ChatMessage::assistant("answer two"),
                ChatMessage::user("third?"),
            ]
        );
    }

    #[test]
    fn unanswered_prior_items_contribute_only_their_query() {
        let items = vec![item("a", "q1", None), item("b", "q2", None)];
        let messages = build_messages(&items, "b");
        assert_eq!(
            messages,
            vec![ChatMessage::user("q1"), ChatMessage::user("q2")]
        );
    }
}

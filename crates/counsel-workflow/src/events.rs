use serde::{Deserialize, Serialize};

/// Overall status carried by status and finish events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Pending,
    Completed,
    Error,
    Aborted,
}

/// Event stream emitted by a workflow run.
///
/// `ReasoningUpdate` carries the full accumulated reasoning text so far;
/// `AnswerUpdate` carries only the newly flushed chunk. Both follow the
/// client rendering model: reasoning panes re-render whole, answers append.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkflowEvent {
    Started {
        run_id: String,
        thread_id: String,
        thread_item_id: String,
        timestamp: i64,
    },

    ReasoningUpdate {
        text: String,
    },

    AnswerUpdate {
        text: String,
    },

    AnswerComplete {
        full_text: String,
    },

    SuggestionsUpdate {
        suggestions: Vec<String>,
    },

    StatusUpdate {
        status: TaskStatus,
    },

    Error {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        task: Option<String>,
    },

    Finished {
        status: TaskStatus,
        duration_ms: u64,
    },
}

use anyhow::Result;
use async_trait::async_trait;
use counsel_llm::AbortSignal;
use tokio::sync::mpsc;

use crate::context::TaskContext;
use crate::events::WorkflowEvent;

pub type EventSender = mpsc::Sender<WorkflowEvent>;

/// Names the tasks the engine can route between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    Completion,
    QuickSearch,
    Suggestions,
}

impl TaskKind {
    pub fn name(&self) -> &'static str {
        match self {
            TaskKind::Completion => "completion",
            TaskKind::QuickSearch => "quick_search",
            TaskKind::Suggestions => "suggestions",
        }
    }
}

/// What a task decided after running: hand off to another task, or stop.
/// Redirection (abandoning this task before generating) and post-success
/// routing both use the same channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    Done,
    Next(TaskKind),
}

/// One unit of work in the chat workflow.
#[async_trait]
pub trait Task: Send + Sync {
    fn kind(&self) -> TaskKind;

    /// Execute against the shared context, emitting incremental events.
    async fn run(
        &self,
        ctx: &mut TaskContext,
        events: EventSender,
        signal: AbortSignal,
    ) -> Result<TaskOutcome>;
}

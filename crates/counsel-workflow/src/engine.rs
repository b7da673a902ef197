use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;
use tracing::{error, info, warn};

use counsel_llm::{AbortSignal, Aborted, ModelClient};

use crate::context::TaskContext;
use crate::events::{TaskStatus, WorkflowEvent};
use crate::task::{Task, TaskKind, TaskOutcome};
use crate::tasks::{CompletionTask, QuickSearchTask, SuggestionsTask};

/// Event channel capacity. Buffered flushing keeps event volume low, so a
/// run never comes close to this in practice.
const EVENT_CHANNEL_CAPACITY: usize = 1000;

/// Guardrail against routing cycles. The longest legitimate chain is
/// completion -> quick_search -> suggestions.
const MAX_ITERATIONS: usize = 4;

/// The chat workflow engine. Owns the task instances and drives a run from
/// the entry task until a task reports `Done`, streaming events to the
/// caller over a channel.
pub struct Workflow {
    completion: CompletionTask,
    quick_search: QuickSearchTask,
    suggestions: SuggestionsTask,
}

impl Workflow {
    pub fn new(model: Arc<dyn ModelClient>) -> Self {
        Self {
            completion: CompletionTask::new(Arc::clone(&model)),
            quick_search: QuickSearchTask::new(Arc::clone(&model)),
            suggestions: SuggestionsTask::new(model),
        }
    }

    fn task(&self, kind: TaskKind) -> &dyn Task {
        match kind {
            TaskKind::Completion => &self.completion,
            TaskKind::QuickSearch => &self.quick_search,
            TaskKind::Suggestions => &self.suggestions,
        }
    }

    /// Spawn a run on the current runtime and return its event stream. The
    /// run keeps going even if the receiver is dropped mid-stream.
    pub fn spawn_run(
        self: &Arc<Self>,
        ctx: TaskContext,
        signal: AbortSignal,
    ) -> mpsc::Receiver<WorkflowEvent> {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let engine = Arc::clone(self);
        tokio::spawn(async move {
            engine.run(ctx, signal, tx).await;
        });
        rx
    }

    /// Execute the task chain, starting at the completion task.
    pub async fn run(
        &self,
        mut ctx: TaskContext,
        signal: AbortSignal,
        events: mpsc::Sender<WorkflowEvent>,
    ) {
        let run_id = uuid::Uuid::new_v4().to_string();
        let started = Instant::now();

        info!(run_id = %run_id, thread_id = %ctx.thread_id, "workflow run started");

        let _ = events
            .send(WorkflowEvent::Started {
                run_id: run_id.clone(),
                thread_id: ctx.thread_id.clone(),
                thread_item_id: ctx.thread_item_id.clone(),
                timestamp: chrono::Utc::now().timestamp_millis(),
            })
            .await;

        let mut current = TaskKind::Completion;
        let mut iterations = 0;

        let final_status = loop {
            if iterations >= MAX_ITERATIONS {
                warn!(run_id = %run_id, "workflow exceeded iteration limit");
                let _ = events
                    .send(WorkflowEvent::Error {
                        message: "workflow exceeded iteration limit".to_string(),
                        task: Some(current.name().to_string()),
                    })
                    .await;
                break TaskStatus::Error;
            }
            iterations += 1;

            let task = self.task(current);
            match task.run(&mut ctx, events.clone(), signal.clone()).await {
                Ok(TaskOutcome::Done) => break TaskStatus::Completed,
                Ok(TaskOutcome::Next(next)) => {
                    info!(run_id = %run_id, from = current.name(), to = next.name(), "routing");
                    current = next;
                }
                Err(err) if err.is::<Aborted>() => {
                    info!(run_id = %run_id, task = current.name(), "run aborted");
                    let _ = events
                        .send(WorkflowEvent::StatusUpdate {
                            status: TaskStatus::Aborted,
                        })
                        .await;
                    break TaskStatus::Aborted;
                }
                Err(err) => {
                    error!(run_id = %run_id, task = current.name(), error = %err, "task failed");
                    let _ = events
                        .send(WorkflowEvent::Error {
                            message: err.to_string(),
                            task: Some(current.name().to_string()),
                        })
                        .await;
                    break TaskStatus::Error;
                }
            }
        };

        let duration_ms = started.elapsed().as_millis() as u64;
        info!(run_id = %run_id, status = ?final_status, duration_ms, "workflow run finished");

        let _ = events
            .send(WorkflowEvent::Finished {
                status: final_status,
                duration_ms,
            })
            .await;
    }
}

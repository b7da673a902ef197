use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use counsel_llm::{abort_pair, ChatRequest, EventStream, ModelClient, StreamEvent};
use counsel_types::{ChatMode, Domain};
use counsel_workflow::{
    tasks::{CompletionTask, QuickSearchTask},
    FinishPayload, Task, TaskContext, TaskOutcome, TaskStatus, Workflow, WorkflowEvent,
};

/// Scripted model that replays the same event sequence for every call and
/// records the requests it receives.
struct ScriptedClient {
    events: Vec<StreamEvent>,
    calls: AtomicUsize,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedClient {
    fn new(events: Vec<StreamEvent>) -> Self {
        Self {
            events,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn answering(text: &str) -> Self {
        Self::new(vec![
            StreamEvent::Message {
                content: text.to_string(),
            },
            StreamEvent::Done {
                finish_reason: Some("stop".to_string()),
            },
        ])
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ModelClient for ScriptedClient {
    async fn stream_chat(&self, request: ChatRequest) -> Result<EventStream> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request);
        let events = self.events.clone();
        Ok(Box::pin(futures::stream::iter(
            events.into_iter().map(Ok),
        )))
    }
}

fn base_ctx() -> TaskContext {
    TaskContext::new(
        "thread-1",
        "item-1",
        "user-1",
        ChatMode::Gpt41,
        vec![counsel_llm::ChatMessage::user("What is adverse possession?")],
    )
}

async fn drain(mut rx: tokio::sync::mpsc::Receiver<WorkflowEvent>) -> Vec<WorkflowEvent> {
    let mut out = Vec::new();
    while let Some(event) = rx.recv().await {
        out.push(event);
    }
    out
}

#[tokio::test]
async fn run_streams_answer_and_finishes_completed() {
    let client = Arc::new(ScriptedClient::answering("A legal doctrine."));
    let workflow = Arc::new(Workflow::new(client.clone()));
    let (_handle, signal) = abort_pair();

    let rx = workflow.spawn_run(base_ctx().with_domain(Some(Domain::Legal)), signal);
    let events = drain(rx).await;

    assert!(matches!(events.first(), Some(WorkflowEvent::Started { .. })));
    let answer: String = events
        .iter()
        .filter_map(|e| match e {
            WorkflowEvent::AnswerUpdate { text } => Some(text.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(answer, "A legal doctrine.");
    assert!(events.iter().any(|e| matches!(
        e,
        WorkflowEvent::AnswerComplete { full_text } if full_text == "A legal doctrine."
    )));
    assert!(matches!(
        events.last(),
        Some(WorkflowEvent::Finished {
            status: TaskStatus::Completed,
            ..
        })
    ));
    assert_eq!(client.call_count(), 1);
}

#[tokio::test]
async fn web_search_redirects_to_quick_search() {
    let client = Arc::new(ScriptedClient::answering("Search-grounded answer."));
    let workflow = Arc::new(Workflow::new(client.clone()));
    let (_handle, signal) = abort_pair();

    let rx = workflow.spawn_run(base_ctx().with_web_search(true), signal);
    let events = drain(rx).await;

    // Redirection happens before any generation, so only the quick-search
    // task calls the model.
    assert_eq!(client.call_count(), 1);
    let request = client.requests.lock().unwrap().remove(0);
    let system = request
        .messages
        .iter()
        .find_map(|m| match m {
            counsel_llm::ChatMessage::System { content } => Some(content.clone()),
            _ => None,
        })
        .unwrap();
    assert!(system.contains("research assistant"));
    assert!(matches!(
        events.last(),
        Some(WorkflowEvent::Finished {
            status: TaskStatus::Completed,
            ..
        })
    ));
}

#[tokio::test]
async fn suggestions_follow_a_successful_answer() {
    // First call answers, second call produces the follow-up list.
    struct TwoPhase {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ModelClient for TwoPhase {
        async fn stream_chat(&self, _request: ChatRequest) -> Result<EventStream> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            let text = if call == 0 {
                "An answer."
            } else {
                "How do I file?\nWhat does it cost?"
            };
            Ok(Box::pin(futures::stream::iter(vec![
                Ok(StreamEvent::Message {
                    content: text.to_string(),
                }),
                Ok(StreamEvent::Done { finish_reason: None }),
            ])))
        }
    }

    let client = Arc::new(TwoPhase {
        calls: AtomicUsize::new(0),
    });
    let workflow = Arc::new(Workflow::new(client.clone()));
    let (_handle, signal) = abort_pair();

    let rx = workflow.spawn_run(base_ctx().with_show_suggestions(true), signal);
    let events = drain(rx).await;

    assert_eq!(client.calls.load(Ordering::SeqCst), 2);
    let suggestions = events
        .iter()
        .find_map(|e| match e {
            WorkflowEvent::SuggestionsUpdate { suggestions } => Some(suggestions.clone()),
            _ => None,
        })
        .unwrap();
    assert_eq!(suggestions, vec!["How do I file?", "What does it cost?"]);
}

#[tokio::test]
async fn on_finish_receives_answer_and_ids() {
    let client = Arc::new(ScriptedClient::answering("Done answer."));
    let workflow = Arc::new(Workflow::new(client));
    let (_handle, signal) = abort_pair();

    let received: Arc<Mutex<Option<FinishPayload>>> = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&received);
    let ctx = base_ctx().with_on_finish(Arc::new(move |payload| {
        *sink.lock().unwrap() = Some(payload);
    }));

    let rx = workflow.spawn_run(ctx, signal);
    drain(rx).await;

    let payload = received.lock().unwrap().take().unwrap();
    assert_eq!(payload.answer, "Done answer.");
    assert_eq!(payload.thread_id, "thread-1");
    assert_eq!(payload.thread_item_id, "item-1");
}

#[tokio::test]
async fn aborted_run_finishes_with_aborted_status() {
    // A client whose stream never yields keeps the task pinned on the
    // abort branch of the select.
    struct Hanging;

    #[async_trait]
    impl ModelClient for Hanging {
        async fn stream_chat(&self, _request: ChatRequest) -> Result<EventStream> {
            Ok(Box::pin(futures::stream::pending()))
        }
    }

    let workflow = Arc::new(Workflow::new(Arc::new(Hanging)));
    let (handle, signal) = abort_pair();

    let rx = workflow.spawn_run(base_ctx(), signal);
    handle.abort();
    let events = drain(rx).await;

    assert!(events.iter().any(|e| matches!(
        e,
        WorkflowEvent::StatusUpdate {
            status: TaskStatus::Aborted
        }
    )));
    assert!(matches!(
        events.last(),
        Some(WorkflowEvent::Finished {
            status: TaskStatus::Aborted,
            ..
        })
    ));
}

#[tokio::test]
async fn model_failure_emits_error_event() {
    struct Failing;

    #[async_trait]
    impl ModelClient for Failing {
        async fn stream_chat(&self, _request: ChatRequest) -> Result<EventStream> {
            anyhow::bail!("provider unavailable")
        }
    }

    let workflow = Arc::new(Workflow::new(Arc::new(Failing)));
    let (_handle, signal) = abort_pair();

    let rx = workflow.spawn_run(base_ctx(), signal);
    let events = drain(rx).await;

    assert!(events.iter().any(|e| matches!(
        e,
        WorkflowEvent::Error { message, task }
            if message.contains("provider unavailable")
                && task.as_deref() == Some("completion")
    )));
    assert!(matches!(
        events.last(),
        Some(WorkflowEvent::Finished {
            status: TaskStatus::Error,
            ..
        })
    ));
}

#[tokio::test]
async fn task_runs_move_across_threads() {
    // Spawning the run futures requires them to be Send; a buffer guard
    // held across an event send would not be.
    let client: Arc<dyn ModelClient> = Arc::new(ScriptedClient::answering("Fine.\nReally."));
    let completion = CompletionTask::new(client.clone());
    let quick_search = QuickSearchTask::new(client);

    let (tx, rx) = tokio::sync::mpsc::channel(64);
    let (_handle, signal) = abort_pair();

    let joined = tokio::spawn(async move {
        let mut ctx = base_ctx();
        let first = completion.run(&mut ctx, tx.clone(), signal.clone()).await?;
        let mut ctx = base_ctx();
        let second = quick_search.run(&mut ctx, tx, signal).await?;
        Ok::<_, anyhow::Error>((first, second))
    });

    let (first, second) = joined.await.unwrap().unwrap();
    assert_eq!(first, TaskOutcome::Done);
    assert_eq!(second, TaskOutcome::Done);

    let events = drain(rx).await;
    assert!(events
        .iter()
        .any(|e| matches!(e, WorkflowEvent::AnswerComplete { .. })));
}

use std::sync::Arc;

use counsel_llm::ChatMessage;
use counsel_types::{ChatMode, Domain};

/// Coarse geolocation hint forwarded into the system prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Geo {
    pub city: String,
    pub country: String,
}

/// Delivered to the registered completion callback once an answer exists.
#[derive(Debug, Clone)]
pub struct FinishPayload {
    pub answer: String,
    pub thread_id: String,
    pub thread_item_id: String,
}

pub type FinishCallback = Arc<dyn Fn(FinishPayload) + Send + Sync>;

/// Shared conversation context threaded through the task chain. Tasks read
/// the request parameters and write back their results (`answer`,
/// `suggestions`).
#[derive(Clone)]
pub struct TaskContext {
    pub thread_id: String,
    pub thread_item_id: String,
    pub user_id: String,
    pub mode: ChatMode,
    pub messages: Vec<ChatMessage>,
    pub domain: Option<Domain>,
    pub custom_instructions: Option<String>,
    pub web_search: bool,
    pub show_suggestions: bool,
    pub geo: Option<Geo>,
    pub answer: Option<String>,
    pub suggestions: Vec<String>,
    pub on_finish: Option<FinishCallback>,
}

impl TaskContext {
    pub fn new(
        thread_id: impl Into<String>,
        thread_item_id: impl Into<String>,
        user_id: impl Into<String>,
        mode: ChatMode,
        messages: Vec<ChatMessage>,
    ) -> Self {
        Self {
            thread_id: thread_id.into(),
            thread_item_id: thread_item_id.into(),
            user_id: user_id.into(),
            mode,
            messages,
            domain: None,
            custom_instructions: None,
            web_search: false,
            show_suggestions: false,
            geo: None,
            answer: None,
            suggestions: Vec::new(),
            on_finish: None,
        }
    }

    pub fn with_domain(mut self, domain: Option<Domain>) -> Self {
        self.domain = domain;
        self
    }

    pub fn with_custom_instructions(mut self, instructions: Option<String>) -> Self {
        self.custom_instructions = instructions;
        self
    }

    pub fn with_web_search(mut self, web_search: bool) -> Self {
        self.web_search = web_search;
        self
    }

    pub fn with_show_suggestions(mut self, show_suggestions: bool) -> Self {
        self.show_suggestions = show_suggestions;
        self
    }

    pub fn with_geo(mut self, geo: Option<Geo>) -> Self {
        self.geo = geo;
        self
    }

    pub fn with_on_finish(mut self, callback: FinishCallback) -> Self {
        self.on_finish = Some(callback);
        self
    }

    /// True once a non-empty answer has been produced.
    pub fn has_answer(&self) -> bool {
        self.answer.as_deref().is_some_and(|a| !a.is_empty())
    }

    /// Most recent user turn, if any.
    pub fn last_user_message(&self) -> Option<&str> {
        self.messages.iter().rev().find_map(|m| match m {
            ChatMessage::User { content } => Some(content.as_str()),
            _ => None,
        })
    }
}

/// Date string used in prompts ("Friday, August 28, 2026").
pub fn humanized_date() -> String {
    chrono::Utc::now()
        .format("%A, %B %e, %Y")
        .to_string()
        .replace("  ", " ")
}

pub mod completion;
pub mod quick_search;
pub mod suggestions;

pub use completion::CompletionTask;
pub use quick_search::QuickSearchTask;
pub use suggestions::SuggestionsTask;

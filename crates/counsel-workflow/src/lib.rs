pub mod context;
pub mod domain;
pub mod engine;
pub mod events;
pub mod task;
pub mod tasks;

pub use context::{FinishCallback, FinishPayload, Geo, TaskContext};
pub use domain::{domain_config, validate_question, DomainConfig, DomainValidation};
pub use engine::Workflow;
pub use events::{TaskStatus, WorkflowEvent};
pub use task::{EventSender, Task, TaskKind, TaskOutcome};

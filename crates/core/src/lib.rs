pub mod config;
pub mod domain;
pub mod errors;
pub mod inference;
pub mod store;
pub mod validate;

pub use chrono;

pub use domain::conversation::{
    ConversationRole, ConversationState, ConversationStep, ConversationTurn,
};
pub use domain::task::{
    priority_for_departure, AgentResult, AgentTask, ResultMetadata, TaskId, TaskPriority,
    TaskStatus, WorkerKind,
};
pub use domain::trip::{RequiredField, ThreadId, TripRequest, UserId, REQUIRED_FIELDS};
pub use errors::{ApplicationError, DomainError};
pub use inference::{AircraftCategory, CategoryBand, CategoryRecommendation};
pub use store::{ConversationStore, StoreError};
pub use validate::ValidationOutcome;

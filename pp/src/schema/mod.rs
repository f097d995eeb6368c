//! Schema Layer
//!
//! Declarative contracts for every data shape that crosses the LLM boundary
//! or the HTTP boundary. The typed model lives in [`types`]; membership of
//! untrusted JSON in those types is decided by [`validate`], which rejects
//! unknown keys on every record-typed field.

pub mod types;
pub mod validate;

pub use types::{
    Action, Advice, CreateTaskListInput, CreateTasksEntities, DetectedIntent, EmailEntities,
    EmailStatus, EmptyEntities, EnrichedTask, Enrichment, ExecResults, ExecStatus, ExecuteResult,
    GenerateEmailInput, LogEntry, Plan, Preview, Priority, SendEmailInput, StepStatus,
    SummarizeTextInput, TimeRange, TimeRangePreset,
};
pub use validate::{validate_enrichment, validate_plan, SchemaViolations, Violation};

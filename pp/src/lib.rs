//! PlanPilot - prompt-to-action planner with human confirmation
//!
//! PlanPilot turns free-text user input into a typed automation plan via a
//! completion collaborator, previews it for confirmation, and only then
//! executes it (optionally dispatching email). The heart of the crate is
//! the contract between the untrusted, non-deterministic text generator and
//! the strictly typed downstream system: an invalid or unsafe plan is never
//! executed.
//!
//! # Core guarantees
//!
//! - **Closed-world validation**: every record crossing the LLM boundary
//!   rejects unknown keys ([`schema`])
//! - **Bounded repair**: one repair round, then deterministic fallback;
//!   never a retry loop ([`planner::generator`])
//! - **Total fallbacks**: the mock planner and fallback enrichment succeed
//!   on any input, so LLM failure is never an HTTP failure
//! - **Extract, never invent**: preview task candidates are literal tokens
//!   from the user's input ([`extract`])
//!
//! # Modules
//!
//! - [`schema`] - typed plan model and closed-world validator
//! - [`extract`] - deterministic task candidate extraction
//! - [`prompts`] - instruction texts for planning, repair, and enrichment
//! - [`llm`] - completion collaborator trait and provider clients
//! - [`planner`] - plan generation, mock fallback, enrichment
//! - [`executor`] - confirmed-run execution and email rendering
//! - [`server`] - axum HTTP surface
//! - [`config`] - configuration types and loading
//! - [`cli`] - command-line interface

pub mod cli;
pub mod config;
pub mod domain;
pub mod executor;
pub mod extract;
pub mod llm;
pub mod mailer;
pub mod planner;
pub mod prompts;
pub mod schema;
pub mod server;

// Re-export commonly used types
pub use config::{Config, EmailConfig, ExtractConfig, LlmConfig, ServerConfig};
pub use domain::Run;
pub use executor::{ExecError, Executor};
pub use extract::CandidateExtractor;
pub use llm::{CompletionRequest, CompletionResponse, LlmClient, LlmError};
pub use mailer::{MailError, Mailer, SmtpMailer};
pub use planner::{EnrichOutcome, EnrichmentGenerator, MockPlanner, PlanError, PlanGenerator};
pub use prompts::{PromptError, PromptLoader};
pub use schema::{
    Action, DetectedIntent, EnrichedTask, ExecuteResult, Plan, Preview, SchemaViolations,
    TimeRange, Violation,
};
pub use server::{AppState, ApiError};

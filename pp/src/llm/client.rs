//! LlmClient trait definition

use async_trait::async_trait;

use super::{CompletionRequest, CompletionResponse, LlmError};

/// Stateless LLM client - each call is independent
///
/// This is the core abstraction for the completion collaborator. Each
/// completion request is independent; no conversation state is maintained
/// between calls. The planner sends exactly one request per pipeline step
/// (plan, repair, enrich), so there is no streaming surface here.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send a single completion request (blocking until complete)
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;
}

//! Plan Generator - one completion call, validation, one repair attempt
//!
//! The state machine between the untrusted text generator and the typed
//! plan model: request, parse as literal JSON, validate against the schema
//! layer, and on validation failure issue exactly one repair request. Any
//! failure past that point is a hard failure reported with the original
//! cause; the caller falls back to the mock planner.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use crate::extract::CandidateExtractor;
use crate::llm::{CompletionRequest, LlmClient, LlmError, Message};
use crate::prompts::{PromptError, PromptLoader};
use crate::schema::{
    validate_plan, Action, DetectedIntent, Plan, Preview, SchemaViolations, SendEmailInput,
};

use super::mock::TASK_SUMMARY;

/// Subject used for the synthesized send_email step
pub const EMAIL_SUBJECT: &str = "Weekly Task Plan";

/// How much raw model output is kept for diagnostics
const SNIPPET_LEN: usize = 200;

/// Hard failures of the planning pipeline
///
/// Every variant means "fall back to the mock planner"; the message is
/// surfaced to the caller as `_ai_error`.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("completion request failed: {0}")]
    Transport(#[from] LlmError),

    #[error("AI returned non-JSON content: {snippet}")]
    NonJson { snippet: String },

    #[error("AI plan {0}")]
    Schema(#[from] SchemaViolations),

    #[error("no completion client configured")]
    NoClient,

    #[error("{0}")]
    Prompt(#[from] PromptError),
}

/// Generates validated plans from free text via the completion collaborator
pub struct PlanGenerator {
    llm: Option<Arc<dyn LlmClient>>,
    prompts: PromptLoader,
    extractor: CandidateExtractor,
    max_tokens: u32,
    temperature: f32,
}

impl PlanGenerator {
    pub fn new(
        llm: Option<Arc<dyn LlmClient>>,
        prompts: PromptLoader,
        extractor: CandidateExtractor,
        max_tokens: u32,
        temperature: f32,
    ) -> Self {
        Self {
            llm,
            prompts,
            extractor,
            max_tokens,
            temperature,
        }
    }

    /// Run the planning pipeline for one input
    ///
    /// Requesting -> Parsing -> Validating -> (Success | one Repair round).
    /// On success the plan has been post-processed: create_tasks previews are
    /// guaranteed candidates, and a send_email step is synthesized when the
    /// model forgot one.
    pub async fn plan(&self, input: &str) -> Result<Plan, PlanError> {
        let llm = self.llm.as_ref().ok_or(PlanError::NoClient)?;

        let content = self
            .complete(llm, &self.prompts.load("plan-system")?, input)
            .await?;

        let parsed: serde_json::Value = match serde_json::from_str(content.trim()) {
            Ok(value) => value,
            Err(_) => {
                return Err(PlanError::NonJson {
                    snippet: snippet(&content),
                });
            }
        };

        let plan = match validate_plan(&parsed) {
            Ok(plan) => plan,
            Err(violations) => {
                debug!(%violations, "plan failed validation, attempting one repair");
                match self.repair(llm, &content).await {
                    Ok(plan) => plan,
                    Err(repair_error) => {
                        // Repair failures are swallowed in favor of the root
                        // cause: operators need to see what was wrong with
                        // the first attempt.
                        warn!(error = %repair_error, "repair attempt failed");
                        return Err(PlanError::Schema(violations));
                    }
                }
            }
        };

        Ok(self.post_process(input, plan))
    }

    /// Issue exactly one repair request for a schema-invalid output
    async fn repair(&self, llm: &Arc<dyn LlmClient>, malformed: &str) -> Result<Plan, PlanError> {
        let content = self
            .complete(llm, &self.prompts.load("repair-system")?, malformed)
            .await?;

        let parsed: serde_json::Value =
            serde_json::from_str(content.trim()).map_err(|_| PlanError::NonJson {
                snippet: snippet(&content),
            })?;

        Ok(validate_plan(&parsed)?)
    }

    async fn complete(
        &self,
        llm: &Arc<dyn LlmClient>,
        system_prompt: &str,
        user_content: &str,
    ) -> Result<String, PlanError> {
        let request = CompletionRequest {
            system_prompt: system_prompt.to_string(),
            messages: vec![Message::user(user_content)],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let response = llm.complete(request).await?;
        Ok(response.content.unwrap_or_default())
    }

    /// Enforce the post-validation invariants on create_tasks plans
    fn post_process(&self, input: &str, mut plan: Plan) -> Plan {
        if !matches!(plan.detected_intent, DetectedIntent::CreateTasks { .. }) {
            return plan;
        }

        // Preview candidates: model output takes priority, extractor output
        // is the fallback, never merged
        let existing = plan.preview.take().unwrap_or_default();
        let task_candidates = if existing.task_candidates.is_empty() {
            self.extractor.extract(input)
        } else {
            existing.task_candidates
        };
        plan.preview = Some(Preview {
            task_candidates,
            summary: existing.summary.or_else(|| Some(TASK_SUMMARY.to_string())),
        });

        // Synthesize the send_email step the model tends to forget, so plans
        // are executable end-to-end without relying on it
        let task_list_id = plan
            .actions
            .iter()
            .find_map(|action| match action {
                Action::CreateTaskList { id, .. } => Some(id.clone()),
                _ => None,
            });
        let has_send_email = plan
            .actions
            .iter()
            .any(|action| matches!(action, Action::SendEmail { .. }));

        if let Some(task_list_id) = task_list_id
            && !has_send_email
        {
            plan.actions.push(Action::SendEmail {
                id: next_action_id(&plan.actions),
                input: SendEmailInput {
                    to: String::new(),
                    subject: EMAIL_SUBJECT.to_string(),
                    body: String::new(),
                },
                depends_on: Some(vec![task_list_id]),
            });
        }

        plan
    }
}

/// Next sequential action id following the "a1", "a2", ... convention
fn next_action_id(actions: &[Action]) -> String {
    let max_seen = actions
        .iter()
        .filter_map(|action| action.id().strip_prefix('a'))
        .filter_map(|n| n.parse::<u32>().ok())
        .max()
        .unwrap_or(actions.len() as u32);
    format!("a{}", max_seen + 1)
}

fn snippet(content: &str) -> String {
    content.chars().take(SNIPPET_LEN).collect()
}

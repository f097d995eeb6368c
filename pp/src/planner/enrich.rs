//! Enrichment Generator - second LLM round over confirmed tasks
//!
//! Assigns a priority and reason to each confirmed task candidate and
//! produces one advice message. There is no repair step here: any failure,
//! including a title set that diverges from the input, discards the whole
//! result in favor of the deterministic fallback. Partial trust is not
//! acceptable because downstream email rendering assumes title fidelity.

use std::sync::Arc;

use serde_json::json;
use thiserror::Error;
use tracing::{debug, warn};

use crate::llm::{CompletionRequest, LlmClient, LlmError, Message};
use crate::prompts::{PromptError, PromptLoader};
use crate::schema::{
    validate_enrichment, Advice, EnrichedTask, Enrichment, Priority, SchemaViolations, TimeRange,
};

/// Reason assigned to the first candidate by the fallback path
pub const FIRST_TASK_REASON: &str = "Start with the most important task to build momentum.";

/// Reason assigned to every other candidate by the fallback path
pub const OTHER_TASK_REASON: &str = "Keeps steady progress.";

/// Fixed advice message used by the fallback path
pub const FALLBACK_ADVICE: &str =
    "Tackle the high-priority task first, then work through the rest in order.";

/// Why an enrichment attempt was discarded
#[derive(Debug, Error)]
pub enum EnrichError {
    #[error("completion request failed: {0}")]
    Transport(#[from] LlmError),

    #[error("AI returned non-JSON content: {snippet}")]
    NonJson { snippet: String },

    #[error("AI enrichment {0}")]
    Schema(#[from] SchemaViolations),

    #[error("enrichment titles diverged from candidates: {0}")]
    Identity(String),

    #[error("no completion client configured")]
    NoClient,

    #[error("{0}")]
    Prompt(#[from] PromptError),
}

/// Outcome of an enrichment call
///
/// Always carries a usable enrichment; `fallback` records why the
/// deterministic path was taken, if it was.
#[derive(Debug, Clone)]
pub struct EnrichOutcome {
    pub enrichment: Enrichment,
    pub fallback: Option<String>,
}

/// Runs the enrichment round with a deterministic, total fallback
pub struct EnrichmentGenerator {
    llm: Option<Arc<dyn LlmClient>>,
    prompts: PromptLoader,
    max_tokens: u32,
}

impl EnrichmentGenerator {
    pub fn new(llm: Option<Arc<dyn LlmClient>>, prompts: PromptLoader, max_tokens: u32) -> Self {
        Self {
            llm,
            prompts,
            max_tokens,
        }
    }

    /// Enrich the confirmed candidates; never fails
    ///
    /// Either the model's result passes schema validation and the
    /// order-and-identity invariant, or the whole result is replaced by
    /// [`fallback_enrichment`].
    pub async fn enrich(&self, time_range: &TimeRange, candidates: &[String]) -> EnrichOutcome {
        match self.try_enrich(time_range, candidates).await {
            Ok(enrichment) => {
                debug!(task_count = enrichment.tasks.len(), "enrich: model result accepted");
                EnrichOutcome {
                    enrichment,
                    fallback: None,
                }
            }
            Err(reason) => {
                warn!(error = %reason, "enrichment failed, using deterministic fallback");
                EnrichOutcome {
                    enrichment: fallback_enrichment(candidates),
                    fallback: Some(reason.to_string()),
                }
            }
        }
    }

    async fn try_enrich(
        &self,
        time_range: &TimeRange,
        candidates: &[String],
    ) -> Result<Enrichment, EnrichError> {
        let llm = self.llm.as_ref().ok_or(EnrichError::NoClient)?;

        let system_prompt = self.prompts.load("enrich-system")?;
        let user_content = self.prompts.render(
            "enrich-user",
            &json!({
                "time_range": time_range.label(),
                "candidates": candidates,
            }),
        )?;

        let request = CompletionRequest {
            system_prompt,
            messages: vec![Message::user(user_content)],
            max_tokens: self.max_tokens,
            temperature: 0.2,
        };

        let response = llm.complete(request).await?;
        let content = response.content.unwrap_or_default();

        let parsed: serde_json::Value =
            serde_json::from_str(content.trim()).map_err(|_| EnrichError::NonJson {
                snippet: content.chars().take(200).collect(),
            })?;

        let enrichment = validate_enrichment(&parsed)?;
        check_identity(&enrichment.tasks, candidates).map_err(EnrichError::Identity)?;

        Ok(enrichment)
    }
}

/// Enforce the order-and-identity invariant
///
/// The returned titles must equal the input candidates pairwise: same
/// length, same order, same text. Renamed, reordered, dropped, or added
/// titles are all contract violations.
fn check_identity(tasks: &[EnrichedTask], candidates: &[String]) -> Result<(), String> {
    if tasks.len() != candidates.len() {
        return Err(format!(
            "expected {} tasks, got {}",
            candidates.len(),
            tasks.len()
        ));
    }
    for (idx, (task, candidate)) in tasks.iter().zip(candidates).enumerate() {
        if task.title != *candidate {
            return Err(format!(
                "title {} is '{}', expected '{}'",
                idx, task.title, candidate
            ));
        }
    }
    Ok(())
}

/// Deterministic, total enrichment used whenever the model cannot be trusted
pub fn fallback_enrichment(candidates: &[String]) -> Enrichment {
    let tasks = candidates
        .iter()
        .enumerate()
        .map(|(idx, title)| EnrichedTask {
            title: title.clone(),
            priority: if idx == 0 {
                Priority::High
            } else {
                Priority::Medium
            },
            reason: if idx == 0 {
                FIRST_TASK_REASON.to_string()
            } else {
                OTHER_TASK_REASON.to_string()
            },
        })
        .collect();

    Enrichment {
        tasks,
        advice: Advice {
            message: FALLBACK_ADVICE.to_string(),
        },
    }
}

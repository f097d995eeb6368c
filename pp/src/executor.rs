//! Run execution
//!
//! Executes the first actionable step of a confirmed plan and renders the
//! stored results into an email on request. Only the first create_task_list
//! action is executed today; `depends_on` edges on later actions are
//! advisory metadata, not a schedule.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use runstore::{Store, StoreError};

use crate::domain::Run;
use crate::extract::CandidateExtractor;
use crate::mailer::Mailer;
use crate::planner::generator::EMAIL_SUBJECT;
use crate::planner::EnrichmentGenerator;
use crate::schema::{
    Action, EmailStatus, ExecResults, ExecStatus, ExecuteResult, LogEntry, StepStatus,
};

/// Execution failures surfaced to the HTTP layer
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("Run not found")]
    NotFound,

    #[error("No actions to execute")]
    NoActions,

    #[error("Unsupported action type: {0}")]
    UnsupportedAction(String),

    #[error("Run is not executed yet")]
    NotExecuted,

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Executes confirmed runs against the run store
pub struct Executor {
    store: Store<Run>,
    enricher: EnrichmentGenerator,
    extractor: CandidateExtractor,
    mailer: Option<Arc<dyn Mailer>>,
}

impl Executor {
    pub fn new(
        store: Store<Run>,
        enricher: EnrichmentGenerator,
        extractor: CandidateExtractor,
        mailer: Option<Arc<dyn Mailer>>,
    ) -> Self {
        Self {
            store,
            enricher,
            extractor,
            mailer,
        }
    }

    /// Execute the first step of a stored run's plan
    ///
    /// Tasks come from the stored preview; when the preview is empty they
    /// are re-derived from the original input. Enrichment failure is never
    /// fatal: the deterministic fallback is used and the result still
    /// reports success, tagged with the fallback reason.
    pub async fn execute(&self, run_id: &str) -> Result<ExecuteResult, ExecError> {
        let run = self.store.get(run_id).await.ok_or(ExecError::NotFound)?;

        let first = run.plan.actions.first().ok_or(ExecError::NoActions)?;
        let Action::CreateTaskList { id, input, .. } = first else {
            return Err(ExecError::UnsupportedAction(first.type_name().to_string()));
        };

        let candidates = match run.plan.preview.as_ref() {
            Some(preview) if !preview.task_candidates.is_empty() => {
                preview.task_candidates.clone()
            }
            _ => self.extractor.extract(&run.input),
        };

        let outcome = self.enricher.enrich(&input.time_range, &candidates).await;

        let result = ExecuteResult {
            status: ExecStatus::Success,
            results: ExecResults {
                time_range: input.time_range.clone(),
                tasks: outcome.enrichment.tasks,
                advice: outcome.enrichment.advice,
            },
            logs: vec![LogEntry {
                step: id.clone(),
                action_type: first.type_name().to_string(),
                status: StepStatus::Done,
            }],
            email_status: None,
            enrichment_fallback: outcome.fallback,
        };

        // Single mutation of the run; a concurrent execute on the same id
        // is last-write-wins
        let mut updated = run;
        updated.set_execute_result(result.clone());
        self.store.update(updated).await?;

        info!(%run_id, task_count = result.results.tasks.len(), "run executed");
        Ok(result)
    }

    /// Send the stored execution results as an email
    ///
    /// Requires a prior successful execute. Reports the single dispatch
    /// attempt verbatim and does not mutate the stored run.
    pub async fn send_email(&self, run_id: &str, to: &str) -> Result<EmailStatus, ExecError> {
        let run = self.store.get(run_id).await.ok_or(ExecError::NotFound)?;

        if !run.executed_ok() {
            return Err(ExecError::NotExecuted);
        }
        let result = run.execute_result.as_ref().ok_or(ExecError::NotExecuted)?;

        let html = render_email_html(&result.results);

        let status = match &self.mailer {
            Some(mailer) => match mailer.send(to, EMAIL_SUBJECT, &html).await {
                Ok(()) => EmailStatus {
                    sent: true,
                    to: to.to_string(),
                    error: None,
                },
                Err(e) => {
                    warn!(%run_id, error = %e, "email dispatch failed");
                    EmailStatus {
                        sent: false,
                        to: to.to_string(),
                        error: Some(e.to_string()),
                    }
                }
            },
            None => EmailStatus {
                sent: false,
                to: to.to_string(),
                error: Some("email delivery is not configured".to_string()),
            },
        };

        Ok(status)
    }
}

/// Render execution results as a simple HTML email body
fn render_email_html(results: &ExecResults) -> String {
    let mut html = String::new();
    html.push_str("<h2>Weekly Task Plan</h2>\n");
    html.push_str(&format!(
        "<p>Time range: {}</p>\n<ul>\n",
        results.time_range.label()
    ));
    for task in &results.tasks {
        html.push_str(&format!(
            "<li><strong>{}</strong> [{}] {}</li>\n",
            task.title, task.priority, task.reason
        ));
    }
    html.push_str(&format!("</ul>\n<p>{}</p>\n", results.advice.message));
    html
}

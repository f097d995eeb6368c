//! HTTP surface
//!
//! A small axum router over the planning pipeline: create a run, inspect
//! it, confirm & execute it, and send the results by email.

pub mod error;
pub mod handlers;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use eyre::{Context, Result};
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use runstore::Store;

use crate::config::Config;
use crate::domain::Run;
use crate::executor::Executor;
use crate::extract::CandidateExtractor;
use crate::llm::create_client;
use crate::mailer::{Mailer, SmtpMailer};
use crate::planner::{EnrichmentGenerator, MockPlanner, PlanGenerator};
use crate::prompts::PromptLoader;

pub use error::ApiError;

/// Shared state behind every handler
pub struct AppState {
    pub store: Store<Run>,
    pub generator: PlanGenerator,
    pub mock: MockPlanner,
    pub executor: Executor,
}

impl AppState {
    /// Wire up the full pipeline from configuration
    ///
    /// A missing API key or unknown provider does not abort startup: the
    /// server comes up without a completion client and every planning
    /// request takes the mock fallback.
    pub fn from_config(config: &Config) -> Self {
        let llm = match create_client(&config.llm) {
            Ok(client) => Some(client),
            Err(e) => {
                warn!(error = %e, "no completion client available, planning will use the mock fallback");
                None
            }
        };

        let mailer: Option<Arc<dyn Mailer>> = if config.email.is_configured() {
            match SmtpMailer::from_config(&config.email) {
                Ok(m) => Some(Arc::new(m)),
                Err(e) => {
                    warn!(error = %e, "email delivery disabled");
                    None
                }
            }
        } else {
            None
        };

        let prompts = PromptLoader::new(".");
        let extractor = CandidateExtractor::new(
            config.extract.task_labels.clone(),
            config.extract.max_candidates,
        );
        let store: Store<Run> = Store::new();

        let generator = PlanGenerator::new(
            llm.clone(),
            prompts.clone(),
            extractor.clone(),
            config.llm.max_tokens,
            config.llm.temperature,
        );
        let enricher = EnrichmentGenerator::new(llm, prompts, config.llm.max_tokens);
        let executor = Executor::new(store.clone(), enricher, extractor, mailer);

        Self {
            store,
            generator,
            mock: MockPlanner::from_config(&config.extract),
            executor,
        }
    }
}

/// Build the API router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/runs", post(handlers::create_run))
        .route("/api/runs/{id}", get(handlers::get_run))
        .route("/api/runs/{id}/execute", post(handlers::execute_run))
        .route("/api/runs/{id}/email", post(handlers::email_run))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind and serve until the process is stopped
pub async fn serve(state: Arc<AppState>, bind: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .context(format!("Failed to bind {}", bind))?;

    info!("API listening on http://{}", bind);

    axum::serve(listener, router(state))
        .await
        .context("Server error")
}

//! Run domain type
//!
//! One Run per planning request: the original input, the validated (or
//! fallback) plan, and the execution result once the user has confirmed.
//! Runs live in the in-memory store for the process lifetime; they are
//! created once and mutated exactly once, when execution completes.

use runstore::{generate_id, now_ms, Record};
use serde::{Deserialize, Serialize};

use crate::schema::{ExecStatus, ExecuteResult, Plan};

/// A stored planning run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Run {
    /// Unique identifier, `run_` + UUIDv7
    pub id: String,

    /// Original user input, verbatim
    pub input: String,

    /// Whether the caller asked for a dry run (accepted, currently unused
    /// beyond being recorded)
    pub dry_run: bool,

    /// The validated plan awaiting confirmation
    pub plan: Plan,

    /// Set once when execution completes
    pub execute_result: Option<ExecuteResult>,

    /// Creation timestamp (Unix milliseconds)
    pub created_at: i64,

    /// Last update timestamp (Unix milliseconds)
    pub updated_at: i64,
}

impl Run {
    /// Create a new run with a generated id
    pub fn new(input: impl Into<String>, dry_run: bool, plan: Plan) -> Self {
        let now = now_ms();
        Self {
            id: generate_id("run"),
            input: input.into(),
            dry_run,
            plan,
            execute_result: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Record the execution result
    pub fn set_execute_result(&mut self, result: ExecuteResult) {
        self.execute_result = Some(result);
        self.updated_at = now_ms();
    }

    /// Whether this run has been executed successfully
    pub fn executed_ok(&self) -> bool {
        matches!(
            self.execute_result,
            Some(ExecuteResult {
                status: ExecStatus::Success,
                ..
            })
        )
    }
}

impl Record for Run {
    fn id(&self) -> &str {
        &self.id
    }

    fn updated_at(&self) -> i64 {
        self.updated_at
    }

    fn collection_name() -> &'static str {
        "runs"
    }
}

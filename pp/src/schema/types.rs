//! Typed plan model
//!
//! These are the value objects shared by the planner, the executor, and the
//! HTTP surface. Serialization matches the wire contract exactly: snake_case
//! keys, tagged unions on `type` / `intent`, optional fields omitted when
//! absent. Construction from untrusted JSON goes through
//! [`super::validate`], never through derived deserialization.

use serde::{Deserialize, Serialize};

/// Time range an action applies to - either a named preset or explicit dates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TimeRange {
    Preset {
        value: TimeRangePreset,
    },
    Custom {
        start_date: String,
        end_date: String,
    },
}

impl TimeRange {
    /// The default range used when the model cannot determine one
    pub fn next_week() -> Self {
        TimeRange::Preset {
            value: TimeRangePreset::NextWeek,
        }
    }

    /// Human-readable label, used when rendering results into an email
    pub fn label(&self) -> String {
        match self {
            TimeRange::Preset { value } => value.label().to_string(),
            TimeRange::Custom {
                start_date,
                end_date,
            } => format!("{} to {}", start_date, end_date),
        }
    }
}

/// Named time range presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeRangePreset {
    Today,
    Tomorrow,
    ThisWeek,
    NextWeek,
}

impl TimeRangePreset {
    pub fn label(&self) -> &'static str {
        match self {
            TimeRangePreset::Today => "today",
            TimeRangePreset::Tomorrow => "tomorrow",
            TimeRangePreset::ThisWeek => "this week",
            TimeRangePreset::NextWeek => "next week",
        }
    }
}

/// No entities for this intent; serializes to an empty object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmptyEntities {}

/// Entities extracted for a create_tasks intent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateTasksEntities {
    pub time_range: TimeRange,
}

/// Entities extracted for a generate_email intent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmailEntities {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
}

/// Classified user intent with its extracted entities
///
/// Each variant carries only the entity keys allowed for that intent; the
/// validator rejects anything else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum DetectedIntent {
    CreateTasks {
        confidence: f64,
        entities: CreateTasksEntities,
        missing_fields: Vec<String>,
        requires_confirmation: bool,
    },
    SummarizeText {
        confidence: f64,
        entities: EmptyEntities,
        missing_fields: Vec<String>,
        requires_confirmation: bool,
    },
    GenerateEmail {
        confidence: f64,
        entities: EmailEntities,
        missing_fields: Vec<String>,
        requires_confirmation: bool,
    },
    Unknown {
        confidence: f64,
        entities: EmptyEntities,
        missing_fields: Vec<String>,
        requires_confirmation: bool,
    },
}

impl DetectedIntent {
    /// Wire name of the intent variant
    pub fn intent_name(&self) -> &'static str {
        match self {
            DetectedIntent::CreateTasks { .. } => "create_tasks",
            DetectedIntent::SummarizeText { .. } => "summarize_text",
            DetectedIntent::GenerateEmail { .. } => "generate_email",
            DetectedIntent::Unknown { .. } => "unknown",
        }
    }

    pub fn confidence(&self) -> f64 {
        match self {
            DetectedIntent::CreateTasks { confidence, .. }
            | DetectedIntent::SummarizeText { confidence, .. }
            | DetectedIntent::GenerateEmail { confidence, .. }
            | DetectedIntent::Unknown { confidence, .. } => *confidence,
        }
    }

    /// The safe default the repair prompt instructs the model to emit when
    /// correction is not feasible
    pub fn unknown_default() -> Self {
        DetectedIntent::Unknown {
            confidence: 0.2,
            entities: EmptyEntities::default(),
            missing_fields: Vec::new(),
            requires_confirmation: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateTaskListInput {
    pub time_range: TimeRange,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummarizeTextInput {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateEmailInput {
    pub prompt: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendEmailInput {
    /// May be empty pending a user-supplied address
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// One proposed automation step
///
/// `depends_on` is advisory ordering metadata; see the executor for how
/// (little of) it is honored today.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    CreateTaskList {
        id: String,
        input: CreateTaskListInput,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        depends_on: Option<Vec<String>>,
    },
    SummarizeText {
        id: String,
        input: SummarizeTextInput,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        depends_on: Option<Vec<String>>,
    },
    GenerateEmail {
        id: String,
        input: GenerateEmailInput,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        depends_on: Option<Vec<String>>,
    },
    SendEmail {
        id: String,
        input: SendEmailInput,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        depends_on: Option<Vec<String>>,
    },
}

impl Action {
    pub fn id(&self) -> &str {
        match self {
            Action::CreateTaskList { id, .. }
            | Action::SummarizeText { id, .. }
            | Action::GenerateEmail { id, .. }
            | Action::SendEmail { id, .. } => id,
        }
    }

    /// Wire name of the action variant
    pub fn type_name(&self) -> &'static str {
        match self {
            Action::CreateTaskList { .. } => "create_task_list",
            Action::SummarizeText { .. } => "summarize_text",
            Action::GenerateEmail { .. } => "generate_email",
            Action::SendEmail { .. } => "send_email",
        }
    }
}

/// What the user reviews before confirming execution
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Preview {
    /// Literal task strings from the user's input, in mention order.
    /// Extracted, never invented.
    #[serde(default)]
    pub task_candidates: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

/// A validated plan: intent, proposed actions, and an optional preview
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub detected_intent: DetectedIntent,
    pub actions: Vec<Action>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview: Option<Preview>,
}

/// Task priority assigned during enrichment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Priority::High => write!(f, "high"),
            Priority::Medium => write!(f, "medium"),
            Priority::Low => write!(f, "low"),
        }
    }
}

/// A confirmed task with enrichment metadata
///
/// `title` must equal one of the original candidates verbatim; the
/// enrichment generator enforces this before results are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedTask {
    pub title: String,
    pub priority: Priority,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Advice {
    pub message: String,
}

/// Output of the enrichment round: per-task metadata plus one advice message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enrichment {
    pub tasks: Vec<EnrichedTask>,
    pub advice: Advice,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecStatus {
    Success,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Done,
    Failed,
}

/// One executed step, for the execution log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub step: String,
    #[serde(rename = "type")]
    pub action_type: String,
    pub status: StepStatus,
}

/// Outcome of one email dispatch attempt, reported verbatim
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailStatus {
    pub sent: bool,
    pub to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecResults {
    pub time_range: TimeRange,
    pub tasks: Vec<EnrichedTask>,
    pub advice: Advice,
}

/// Result of executing a confirmed run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecuteResult {
    pub status: ExecStatus,
    pub results: ExecResults,
    pub logs: Vec<LogEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_status: Option<EmailStatus>,
    /// Diagnostic tag set when enrichment fell back to the deterministic
    /// path; execution itself still succeeded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enrichment_fallback: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_range_preset_serialization() {
        let tr = TimeRange::next_week();
        let json = serde_json::to_value(&tr).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "preset", "value": "next_week"})
        );
    }

    #[test]
    fn test_time_range_custom_serialization() {
        let tr = TimeRange::Custom {
            start_date: "2026-08-10".to_string(),
            end_date: "2026-08-14".to_string(),
        };
        let json = serde_json::to_value(&tr).unwrap();
        assert_eq!(json["type"], "custom");
        assert_eq!(json["start_date"], "2026-08-10");
        assert_eq!(tr.label(), "2026-08-10 to 2026-08-14");
    }

    #[test]
    fn test_detected_intent_serialization() {
        let intent = DetectedIntent::CreateTasks {
            confidence: 0.82,
            entities: CreateTasksEntities {
                time_range: TimeRange::next_week(),
            },
            missing_fields: vec![],
            requires_confirmation: false,
        };

        let json = serde_json::to_value(&intent).unwrap();
        assert_eq!(json["intent"], "create_tasks");
        assert_eq!(json["confidence"], 0.82);
        assert_eq!(json["entities"]["time_range"]["value"], "next_week");
        assert_eq!(intent.intent_name(), "create_tasks");
    }

    #[test]
    fn test_empty_entities_serialize_to_empty_object() {
        let intent = DetectedIntent::Unknown {
            confidence: 0.2,
            entities: EmptyEntities::default(),
            missing_fields: vec![],
            requires_confirmation: false,
        };

        let json = serde_json::to_value(&intent).unwrap();
        assert_eq!(json["entities"], serde_json::json!({}));
    }

    #[test]
    fn test_action_serialization_omits_absent_depends_on() {
        let action = Action::CreateTaskList {
            id: "a1".to_string(),
            input: CreateTaskListInput {
                time_range: TimeRange::next_week(),
            },
            depends_on: None,
        };

        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["type"], "create_task_list");
        assert_eq!(json["id"], "a1");
        assert!(json.get("depends_on").is_none());
    }

    #[test]
    fn test_send_email_action_serialization() {
        let action = Action::SendEmail {
            id: "a2".to_string(),
            input: SendEmailInput {
                to: String::new(),
                subject: "Weekly Task Plan".to_string(),
                body: String::new(),
            },
            depends_on: Some(vec!["a1".to_string()]),
        };

        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["type"], "send_email");
        assert_eq!(json["input"]["to"], "");
        assert_eq!(json["depends_on"], serde_json::json!(["a1"]));
        assert_eq!(action.id(), "a2");
        assert_eq!(action.type_name(), "send_email");
    }

    #[test]
    fn test_log_entry_uses_type_key() {
        let entry = LogEntry {
            step: "a1".to_string(),
            action_type: "create_task_list".to_string(),
            status: StepStatus::Done,
        };

        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["type"], "create_task_list");
        assert_eq!(json["status"], "done");
    }

    #[test]
    fn test_execute_result_omits_empty_optionals() {
        let result = ExecuteResult {
            status: ExecStatus::Success,
            results: ExecResults {
                time_range: TimeRange::next_week(),
                tasks: vec![],
                advice: Advice {
                    message: "advice".to_string(),
                },
            },
            logs: vec![],
            email_status: None,
            enrichment_fallback: None,
        };

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["status"], "success");
        assert!(json.get("email_status").is_none());
        assert!(json.get("enrichment_fallback").is_none());
    }
}

//! Mock Planner - deterministic fallback planning
//!
//! The system's circuit-breaker: whenever the plan generator reaches hard
//! failure (transport down, non-JSON output, unrepairable schema), this
//! planner guarantees a schema-valid plan from keyword cues alone. It is
//! total: any input string produces a plan, never an error.

use tracing::debug;

use crate::config::ExtractConfig;
use crate::extract::CandidateExtractor;
use crate::schema::{
    Action, CreateTaskListInput, CreateTasksEntities, DetectedIntent, EmptyEntities,
    GenerateEmailInput, Plan, Preview, SummarizeTextInput, TimeRange,
};

/// Default preview summary for a create_tasks plan
pub const TASK_SUMMARY: &str =
    "I will create a task list for the selected period using tasks from your input.";

/// Keyword-based fallback planner
#[derive(Debug, Clone)]
pub struct MockPlanner {
    extractor: CandidateExtractor,
    summary_cues: Vec<String>,
    email_cues: Vec<String>,
}

impl MockPlanner {
    pub fn from_config(config: &ExtractConfig) -> Self {
        Self {
            extractor: CandidateExtractor::new(
                config.task_labels.clone(),
                config.max_candidates,
            ),
            summary_cues: config.summary_cues.iter().map(|c| c.to_lowercase()).collect(),
            email_cues: config.email_cues.iter().map(|c| c.to_lowercase()).collect(),
        }
    }

    /// Produce a plan for any input, first matching cue wins
    ///
    /// Decision order: summarization cue, then email cue, then the
    /// create_tasks default with a next_week preset and locally extracted
    /// candidates.
    pub fn plan(&self, input: &str) -> Plan {
        let text = input.to_lowercase();

        if self.summary_cues.iter().any(|cue| text.contains(cue)) {
            debug!("plan: summarize cue matched");
            return Plan {
                detected_intent: DetectedIntent::SummarizeText {
                    confidence: 0.8,
                    entities: EmptyEntities::default(),
                    missing_fields: vec![],
                    requires_confirmation: false,
                },
                actions: vec![Action::SummarizeText {
                    id: "a1".to_string(),
                    input: SummarizeTextInput {
                        text: input.to_string(),
                    },
                    depends_on: None,
                }],
                preview: Some(Preview {
                    task_candidates: vec![],
                    summary: Some("I will summarize the provided text.".to_string()),
                }),
            };
        }

        if self.email_cues.iter().any(|cue| text.contains(cue)) {
            debug!("plan: email cue matched");
            return Plan {
                detected_intent: DetectedIntent::GenerateEmail {
                    confidence: 0.8,
                    entities: Default::default(),
                    missing_fields: vec!["email_to".to_string()],
                    requires_confirmation: true,
                },
                actions: vec![Action::GenerateEmail {
                    id: "a1".to_string(),
                    input: GenerateEmailInput {
                        prompt: input.to_string(),
                    },
                    depends_on: None,
                }],
                preview: Some(Preview {
                    task_candidates: vec![],
                    summary: Some("I will draft an email based on your request.".to_string()),
                }),
            };
        }

        debug!("plan: defaulting to create_tasks");
        let time_range = TimeRange::next_week();
        let task_candidates = self.extractor.extract(input);

        Plan {
            detected_intent: DetectedIntent::CreateTasks {
                confidence: 0.75,
                entities: CreateTasksEntities {
                    time_range: time_range.clone(),
                },
                missing_fields: vec![],
                requires_confirmation: false,
            },
            actions: vec![Action::CreateTaskList {
                id: "a1".to_string(),
                input: CreateTaskListInput { time_range },
                depends_on: None,
            }],
            preview: Some(Preview {
                task_candidates,
                summary: Some(TASK_SUMMARY.to_string()),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::validate_plan;

    fn planner() -> MockPlanner {
        MockPlanner::from_config(&ExtractConfig::default())
    }

    fn assert_round_trips(plan: &Plan) {
        let value = serde_json::to_value(plan).unwrap();
        validate_plan(&value).expect("mock plan must pass schema validation");
    }

    #[test]
    fn test_summarize_cue() {
        let plan = planner().plan("Please write a summary of this article");
        assert_eq!(plan.detected_intent.intent_name(), "summarize_text");
        assert_eq!(plan.actions[0].type_name(), "summarize_text");
        assert_round_trips(&plan);
    }

    #[test]
    fn test_email_cue() {
        let plan = planner().plan("Draft an email to my manager about the delay");
        assert_eq!(plan.detected_intent.intent_name(), "generate_email");
        match &plan.detected_intent {
            DetectedIntent::GenerateEmail {
                missing_fields,
                requires_confirmation,
                ..
            } => {
                assert_eq!(missing_fields, &vec!["email_to".to_string()]);
                assert!(requires_confirmation);
            }
            other => panic!("unexpected intent: {:?}", other),
        }
        assert_round_trips(&plan);
    }

    #[test]
    fn test_summarize_cue_wins_over_email_cue() {
        let plan = planner().plan("summary of the email thread");
        assert_eq!(plan.detected_intent.intent_name(), "summarize_text");
    }

    #[test]
    fn test_default_create_tasks_with_candidates() {
        let plan = planner().plan("My plan for next week. Task: Gym, Reading");
        assert_eq!(plan.detected_intent.intent_name(), "create_tasks");
        assert_eq!(
            plan.preview.as_ref().unwrap().task_candidates,
            vec!["Gym", "Reading"]
        );
        assert_eq!(plan.actions[0].type_name(), "create_task_list");
        assert_round_trips(&plan);
    }

    #[test]
    fn test_total_on_degenerate_inputs() {
        let planner = planner();
        for input in ["", "   ", "日本語だけのテキスト", "задача без списка"] {
            let plan = planner.plan(input);
            assert_round_trips(&plan);
        }
    }

    #[test]
    fn test_total_on_max_length_input() {
        let input = "x".repeat(4000);
        let plan = planner().plan(&input);
        assert_eq!(plan.detected_intent.intent_name(), "create_tasks");
        assert_round_trips(&plan);
    }

    #[test]
    fn test_russian_cue_words() {
        let plan = planner().plan("Сделай резюме текста");
        assert_eq!(plan.detected_intent.intent_name(), "summarize_text");

        let plan = planner().plan("Напиши письмо коллеге");
        assert_eq!(plan.detected_intent.intent_name(), "generate_email");
    }
}

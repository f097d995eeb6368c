//! Closed-world validation of untrusted JSON against the plan model
//!
//! Serde's derived deserialization cannot reject unknown keys inside
//! internally tagged unions, so membership is decided by hand here. Every
//! record-typed field has a closed key set; an unknown key anywhere is a
//! violation. This is the primary defense against field smuggling from the
//! completion collaborator.
//!
//! Validation is accumulating, not fail-fast: all violations in a document
//! are collected so the repair prompt (and operators) see the full picture.

use chrono::NaiveDate;
use serde_json::{Map, Value};
use thiserror::Error;

use super::types::{
    Action, Advice, CreateTaskListInput, CreateTasksEntities, DetectedIntent, EmailEntities,
    EmptyEntities, EnrichedTask, Enrichment, GenerateEmailInput, Plan, Preview, Priority,
    SendEmailInput, SummarizeTextInput, TimeRange, TimeRangePreset,
};

/// A single schema violation: where and why
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// JSON path of the offending value, e.g. `actions[1].input.time_range`
    pub path: String,
    pub reason: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.reason)
    }
}

fn join_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(Violation::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// The structured list of violations produced when a document is rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("schema invalid: {}", join_violations(.0))]
pub struct SchemaViolations(pub Vec<Violation>);

/// Accumulates violations while a document is walked
struct Checker {
    violations: Vec<Violation>,
}

fn field(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", path, key)
    }
}

impl Checker {
    fn new() -> Self {
        Self {
            violations: Vec::new(),
        }
    }

    fn push(&mut self, path: impl Into<String>, reason: impl Into<String>) {
        self.violations.push(Violation {
            path: path.into(),
            reason: reason.into(),
        });
    }

    fn finish<T>(mut self, value: Option<T>) -> Result<T, SchemaViolations> {
        match value {
            Some(v) if self.violations.is_empty() => Ok(v),
            _ => {
                if self.violations.is_empty() {
                    self.push("", "document rejected");
                }
                Err(SchemaViolations(self.violations))
            }
        }
    }

    /// The value must be an object whose keys all come from `allowed`
    fn object<'a>(
        &mut self,
        value: &'a Value,
        path: &str,
        allowed: &[&str],
    ) -> Option<&'a Map<String, Value>> {
        let Some(map) = value.as_object() else {
            self.push(path, "expected an object");
            return None;
        };
        for key in map.keys() {
            if !allowed.contains(&key.as_str()) {
                self.push(field(path, key), "unknown key");
            }
        }
        Some(map)
    }

    fn req_str(&mut self, map: &Map<String, Value>, key: &str, path: &str) -> Option<String> {
        match map.get(key) {
            Some(Value::String(s)) => Some(s.clone()),
            Some(_) => {
                self.push(field(path, key), "expected a string");
                None
            }
            None => {
                self.push(field(path, key), "missing required field");
                None
            }
        }
    }

    /// Absent is fine; present but non-string is a violation
    fn opt_str(&mut self, map: &Map<String, Value>, key: &str, path: &str) -> Option<String> {
        match map.get(key) {
            Some(Value::String(s)) => Some(s.clone()),
            Some(_) => {
                self.push(field(path, key), "expected a string");
                None
            }
            None => None,
        }
    }

    fn req_bool(&mut self, map: &Map<String, Value>, key: &str, path: &str) -> Option<bool> {
        match map.get(key) {
            Some(Value::Bool(b)) => Some(*b),
            Some(_) => {
                self.push(field(path, key), "expected a boolean");
                None
            }
            None => {
                self.push(field(path, key), "missing required field");
                None
            }
        }
    }

    fn req_f64(&mut self, map: &Map<String, Value>, key: &str, path: &str) -> Option<f64> {
        match map.get(key).and_then(Value::as_f64) {
            Some(n) => Some(n),
            None => {
                self.push(field(path, key), "expected a number");
                None
            }
        }
    }

    fn str_array(&mut self, value: &Value, path: &str) -> Option<Vec<String>> {
        let Some(items) = value.as_array() else {
            self.push(path, "expected an array of strings");
            return None;
        };
        let mut out = Vec::with_capacity(items.len());
        for (idx, item) in items.iter().enumerate() {
            match item.as_str() {
                Some(s) => out.push(s.to_string()),
                None => self.push(format!("{}[{}]", path, idx), "expected a string"),
            }
        }
        Some(out)
    }

    fn req_str_array(
        &mut self,
        map: &Map<String, Value>,
        key: &str,
        path: &str,
    ) -> Option<Vec<String>> {
        match map.get(key) {
            Some(v) => self.str_array(v, &field(path, key)),
            None => {
                self.push(field(path, key), "missing required field");
                None
            }
        }
    }
}

/// Lightweight address shape check: something@domain.tld, no whitespace
fn looks_like_email(s: &str) -> bool {
    let Some((local, domain)) = s.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !s.chars().any(char::is_whitespace)
}

fn is_iso_date(s: &str) -> bool {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}

fn validate_time_range(c: &mut Checker, value: &Value, path: &str) -> Option<TimeRange> {
    let Some(map) = value.as_object() else {
        c.push(path, "expected an object");
        return None;
    };
    let map = map.clone();
    let tag = map.get("type").and_then(Value::as_str);
    match tag {
        Some("preset") => {
            c.object(value, path, &["type", "value"]);
            let raw = c.req_str(&map, "value", path)?;
            let preset = match raw.as_str() {
                "today" => TimeRangePreset::Today,
                "tomorrow" => TimeRangePreset::Tomorrow,
                "this_week" => TimeRangePreset::ThisWeek,
                "next_week" => TimeRangePreset::NextWeek,
                other => {
                    c.push(
                        field(path, "value"),
                        format!(
                            "unknown preset '{}', expected today|tomorrow|this_week|next_week",
                            other
                        ),
                    );
                    return None;
                }
            };
            Some(TimeRange::Preset { value: preset })
        }
        Some("custom") => {
            c.object(value, path, &["type", "start_date", "end_date"]);
            let start_date = c.req_str(&map, "start_date", path);
            let end_date = c.req_str(&map, "end_date", path);
            for (key, date) in [("start_date", &start_date), ("end_date", &end_date)] {
                if let Some(d) = date
                    && !is_iso_date(d)
                {
                    c.push(field(path, key), "must be a YYYY-MM-DD date");
                    return None;
                }
            }
            Some(TimeRange::Custom {
                start_date: start_date?,
                end_date: end_date?,
            })
        }
        Some(other) => {
            c.push(
                field(path, "type"),
                format!("unknown time range type '{}', expected preset|custom", other),
            );
            None
        }
        None => {
            c.push(field(path, "type"), "missing required field");
            None
        }
    }
}

fn validate_intent(c: &mut Checker, value: &Value, path: &str) -> Option<DetectedIntent> {
    let map = c.object(
        value,
        path,
        &[
            "intent",
            "confidence",
            "entities",
            "missing_fields",
            "requires_confirmation",
        ],
    )?;
    let map = map.clone();

    let confidence = c.req_f64(&map, "confidence", path);
    if let Some(conf) = confidence
        && !(0.0..=1.0).contains(&conf)
    {
        c.push(field(path, "confidence"), "must be between 0 and 1");
        return None;
    }
    let missing_fields = c.req_str_array(&map, "missing_fields", path);
    let requires_confirmation = c.req_bool(&map, "requires_confirmation", path);

    let entities_path = field(path, "entities");
    let entities_value = match map.get("entities") {
        Some(v) => v,
        None => {
            c.push(entities_path.as_str(), "missing required field");
            return None;
        }
    };

    let tag = map.get("intent").and_then(Value::as_str);
    match tag {
        Some("create_tasks") => {
            let ent_map = c.object(entities_value, &entities_path, &["time_range"])?;
            let time_range = match ent_map.get("time_range") {
                Some(tr) => validate_time_range(c, tr, &field(&entities_path, "time_range")),
                None => {
                    c.push(field(&entities_path, "time_range"), "missing required field");
                    None
                }
            };
            Some(DetectedIntent::CreateTasks {
                confidence: confidence?,
                entities: CreateTasksEntities {
                    time_range: time_range?,
                },
                missing_fields: missing_fields?,
                requires_confirmation: requires_confirmation?,
            })
        }
        Some("generate_email") => {
            let ent_map = c.object(entities_value, &entities_path, &["to", "subject"])?;
            let ent_map = ent_map.clone();
            let to = c.opt_str(&ent_map, "to", &entities_path);
            if let Some(addr) = &to
                && !looks_like_email(addr)
            {
                c.push(field(&entities_path, "to"), "must be an email address");
                return None;
            }
            let subject = c.opt_str(&ent_map, "subject", &entities_path);
            Some(DetectedIntent::GenerateEmail {
                confidence: confidence?,
                entities: EmailEntities { to, subject },
                missing_fields: missing_fields?,
                requires_confirmation: requires_confirmation?,
            })
        }
        Some(name @ ("summarize_text" | "unknown")) => {
            c.object(entities_value, &entities_path, &[])?;
            let confidence = confidence?;
            let missing_fields = missing_fields?;
            let requires_confirmation = requires_confirmation?;
            Some(if name == "summarize_text" {
                DetectedIntent::SummarizeText {
                    confidence,
                    entities: EmptyEntities::default(),
                    missing_fields,
                    requires_confirmation,
                }
            } else {
                DetectedIntent::Unknown {
                    confidence,
                    entities: EmptyEntities::default(),
                    missing_fields,
                    requires_confirmation,
                }
            })
        }
        Some(other) => {
            c.push(
                field(path, "intent"),
                format!(
                    "unknown intent '{}', expected create_tasks|summarize_text|generate_email|unknown",
                    other
                ),
            );
            None
        }
        None => {
            c.push(field(path, "intent"), "missing required field");
            None
        }
    }
}

fn validate_action(c: &mut Checker, value: &Value, path: &str) -> Option<Action> {
    let map = c.object(value, path, &["id", "type", "input", "depends_on"])?;
    let map = map.clone();

    let id = c.req_str(&map, "id", path);
    if let Some(action_id) = &id
        && action_id.is_empty()
    {
        c.push(field(path, "id"), "must not be empty");
        return None;
    }

    let depends_on = match map.get("depends_on") {
        Some(v) => Some(c.str_array(v, &field(path, "depends_on"))?),
        None => None,
    };

    let input_path = field(path, "input");
    let input_value = match map.get("input") {
        Some(v) => v,
        None => {
            c.push(input_path.as_str(), "missing required field");
            return None;
        }
    };

    let tag = map.get("type").and_then(Value::as_str);
    match tag {
        Some("create_task_list") => {
            let input_map = c.object(input_value, &input_path, &["time_range"])?;
            let time_range = match input_map.get("time_range") {
                Some(tr) => validate_time_range(c, tr, &field(&input_path, "time_range")),
                None => {
                    c.push(field(&input_path, "time_range"), "missing required field");
                    None
                }
            };
            Some(Action::CreateTaskList {
                id: id?,
                input: CreateTaskListInput {
                    time_range: time_range?,
                },
                depends_on,
            })
        }
        Some("summarize_text") => {
            let input_map = c.object(input_value, &input_path, &["text"])?.clone();
            let text = c.req_str(&input_map, "text", &input_path);
            Some(Action::SummarizeText {
                id: id?,
                input: SummarizeTextInput { text: text? },
                depends_on,
            })
        }
        Some("generate_email") => {
            let input_map = c.object(input_value, &input_path, &["prompt"])?.clone();
            let prompt = c.req_str(&input_map, "prompt", &input_path);
            Some(Action::GenerateEmail {
                id: id?,
                input: GenerateEmailInput { prompt: prompt? },
                depends_on,
            })
        }
        Some("send_email") => {
            let input_map = c
                .object(input_value, &input_path, &["to", "subject", "body"])?
                .clone();
            let to = c.req_str(&input_map, "to", &input_path);
            // An empty address is allowed: the user supplies it at send time
            if let Some(addr) = &to
                && !addr.is_empty()
                && !looks_like_email(addr)
            {
                c.push(field(&input_path, "to"), "must be empty or an email address");
                return None;
            }
            let subject = c.req_str(&input_map, "subject", &input_path);
            let body = c.req_str(&input_map, "body", &input_path);
            Some(Action::SendEmail {
                id: id?,
                input: SendEmailInput {
                    to: to?,
                    subject: subject?,
                    body: body?,
                },
                depends_on,
            })
        }
        Some(other) => {
            c.push(
                field(path, "type"),
                format!(
                    "unknown action type '{}', expected create_task_list|summarize_text|generate_email|send_email",
                    other
                ),
            );
            None
        }
        None => {
            c.push(field(path, "type"), "missing required field");
            None
        }
    }
}

fn validate_preview(c: &mut Checker, value: &Value, path: &str) -> Option<Preview> {
    let map = c
        .object(value, path, &["task_candidates", "summary"])?
        .clone();

    let task_candidates = match map.get("task_candidates") {
        Some(v) => c.str_array(v, &field(path, "task_candidates"))?,
        None => Vec::new(),
    };
    let summary = c.opt_str(&map, "summary", path);

    Some(Preview {
        task_candidates,
        summary,
    })
}

/// Decide membership of an untrusted JSON document in the [`Plan`] type
///
/// Plan validation is the conjunction of intent validation, element-wise
/// action validation, optional preview validation, and the cross-field
/// invariants (unique action ids; a create_tasks intent requires at least
/// one create_task_list action).
pub fn validate_plan(value: &Value) -> Result<Plan, SchemaViolations> {
    let mut c = Checker::new();

    let plan = (|c: &mut Checker| {
        let map = c.object(value, "", &["detected_intent", "actions", "preview"])?;
        let map = map.clone();

        let detected_intent = match map.get("detected_intent") {
            Some(v) => validate_intent(c, v, "detected_intent"),
            None => {
                c.push("detected_intent", "missing required field");
                None
            }
        };

        let actions = match map.get("actions").and_then(Value::as_array) {
            Some(items) => {
                let mut actions = Vec::with_capacity(items.len());
                for (idx, item) in items.iter().enumerate() {
                    if let Some(action) = validate_action(c, item, &format!("actions[{}]", idx)) {
                        actions.push(action);
                    }
                }
                if actions.len() == items.len() {
                    Some(actions)
                } else {
                    None
                }
            }
            None => {
                c.push("actions", "expected an array");
                None
            }
        };

        let preview = match map.get("preview") {
            Some(v) => Some(validate_preview(c, v, "preview")?),
            None => None,
        };

        let detected_intent = detected_intent?;
        let actions = actions?;

        let mut seen = std::collections::HashSet::new();
        for (idx, action) in actions.iter().enumerate() {
            if !seen.insert(action.id().to_string()) {
                c.push(
                    format!("actions[{}].id", idx),
                    format!("duplicate action id '{}'", action.id()),
                );
            }
        }

        if matches!(detected_intent, DetectedIntent::CreateTasks { .. })
            && !actions
                .iter()
                .any(|a| matches!(a, Action::CreateTaskList { .. }))
        {
            c.push("actions", "create_tasks plan requires a create_task_list action");
        }

        Some(Plan {
            detected_intent,
            actions,
            preview,
        })
    })(&mut c);

    c.finish(plan)
}

/// Decide membership of an untrusted JSON document in the [`Enrichment`] type
///
/// Only the shape is checked here; the order-and-identity invariant against
/// the original candidates is the enrichment generator's job.
pub fn validate_enrichment(value: &Value) -> Result<Enrichment, SchemaViolations> {
    let mut c = Checker::new();

    let enrichment = (|c: &mut Checker| {
        let map = c.object(value, "", &["tasks", "advice"])?.clone();

        let tasks = match map.get("tasks").and_then(Value::as_array) {
            Some(items) => {
                let mut tasks = Vec::with_capacity(items.len());
                for (idx, item) in items.iter().enumerate() {
                    let path = format!("tasks[{}]", idx);
                    let Some(task_map) = c.object(item, &path, &["title", "priority", "reason"])
                    else {
                        continue;
                    };
                    let task_map = task_map.clone();
                    let title = c.req_str(&task_map, "title", &path);
                    let reason = c.req_str(&task_map, "reason", &path);
                    let priority = match c.req_str(&task_map, "priority", &path).as_deref() {
                        Some("high") => Some(Priority::High),
                        Some("medium") => Some(Priority::Medium),
                        Some("low") => Some(Priority::Low),
                        Some(other) => {
                            c.push(
                                field(&path, "priority"),
                                format!("unknown priority '{}', expected high|medium|low", other),
                            );
                            None
                        }
                        None => None,
                    };
                    if let (Some(title), Some(priority), Some(reason)) = (title, priority, reason) {
                        tasks.push(EnrichedTask {
                            title,
                            priority,
                            reason,
                        });
                    }
                }
                if tasks.len() == items.len() {
                    Some(tasks)
                } else {
                    None
                }
            }
            None => {
                c.push("tasks", "expected an array");
                None
            }
        };

        let advice = match map.get("advice") {
            Some(v) => {
                let advice_map = c.object(v, "advice", &["message"])?.clone();
                let message = c.req_str(&advice_map, "message", "advice");
                Some(Advice { message: message? })
            }
            None => {
                c.push("advice", "missing required field");
                None
            }
        };

        Some(Enrichment {
            tasks: tasks?,
            advice: advice?,
        })
    })(&mut c);

    c.finish(enrichment)
}

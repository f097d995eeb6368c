//! Candidate Extractor
//!
//! Deterministic, LLM-independent extraction of literal task strings from
//! raw input text. Everything the preview shows as a task candidate must be
//! a literal token from the user's input; this module is where those tokens
//! come from when the model does not supply them.
//!
//! Label sets are injected through [`crate::config::ExtractConfig`] rather
//! than inlined, so locales can be extended without touching this code.

/// Pulls comma-separated task candidates out of free text
#[derive(Debug, Clone)]
pub struct CandidateExtractor {
    /// Label tokens marking the start of a task list, lowercase
    labels: Vec<String>,
    /// Hard cap on extracted candidates, bounds the preview payload
    max_candidates: usize,
}

impl CandidateExtractor {
    pub fn new(labels: Vec<String>, max_candidates: usize) -> Self {
        let labels = labels.into_iter().map(|l| l.to_lowercase()).collect();
        Self {
            labels,
            max_candidates,
        }
    }

    /// Extract task candidates from `input`
    ///
    /// Finds the earliest case-insensitive occurrence of any label, takes
    /// everything after it, splits on commas, trims each segment, drops
    /// empties, and caps the result. No label found means no candidates,
    /// which is a valid outcome, not an error.
    pub fn extract(&self, input: &str) -> Vec<String> {
        let chars: Vec<(usize, char)> = input.char_indices().collect();

        // Earliest label match wins; on a tie the longer label is consumed
        let mut found: Option<(usize, usize)> = None; // (char pos, byte offset after label)
        for start in 0..chars.len() {
            for label in &self.labels {
                if let Some(end) = match_label_at(input, &chars, start, label)
                    && found.is_none_or(|(pos, prev_end)| start < pos || (start == pos && end > prev_end))
                {
                    found = Some((start, end));
                }
            }
            if found.is_some_and(|(pos, _)| pos == start) {
                break;
            }
        }

        let Some((_, after_label)) = found else {
            return Vec::new();
        };

        input[after_label..]
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .take(self.max_candidates)
            .collect()
    }
}

/// Case-insensitive label match at a char position; returns the byte offset
/// just past the label on success
fn match_label_at(
    input: &str,
    chars: &[(usize, char)],
    start: usize,
    label: &str,
) -> Option<usize> {
    let mut idx = start;
    for label_char in label.chars() {
        let &(_, input_char) = chars.get(idx)?;
        if !input_char.to_lowercase().eq(label_char.to_lowercase()) {
            return None;
        }
        idx += 1;
    }
    match chars.get(idx) {
        Some(&(byte_offset, _)) => Some(byte_offset),
        None => Some(input.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExtractConfig;

    fn extractor() -> CandidateExtractor {
        let config = ExtractConfig::default();
        CandidateExtractor::new(config.task_labels, config.max_candidates)
    }

    #[test]
    fn test_extracts_comma_separated_candidates() {
        let candidates = extractor().extract("My plan for next week. Task: Gym, Reading");
        assert_eq!(candidates, vec!["Gym", "Reading"]);
    }

    #[test]
    fn test_label_match_is_case_insensitive() {
        let candidates = extractor().extract("TASK: a, b, c");
        assert_eq!(candidates, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_no_label_returns_empty() {
        assert!(extractor().extract("Plan my week please").is_empty());
        assert!(extractor().extract("").is_empty());
    }

    #[test]
    fn test_preserves_original_casing_and_order() {
        let candidates = extractor().extract("tasks: Write Report, call Bob, GYM");
        assert_eq!(candidates, vec!["Write Report", "call Bob", "GYM"]);
    }

    #[test]
    fn test_empty_segments_dropped() {
        let candidates = extractor().extract("task: a,, b, ,c,");
        assert_eq!(candidates, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_earliest_label_wins() {
        let candidates = extractor().extract("my tasks: first, second. task: other");
        assert_eq!(candidates[0], "first");
    }

    #[test]
    fn test_russian_label() {
        let candidates = extractor().extract("План на неделю. Задачи: спортзал, чтение");
        assert_eq!(candidates, vec!["спортзал", "чтение"]);
    }

    #[test]
    fn test_result_capped_at_max() {
        let many = (0..50).map(|i| format!("t{}", i)).collect::<Vec<_>>().join(", ");
        let candidates = extractor().extract(&format!("task: {}", many));
        assert_eq!(candidates.len(), 30);
        assert_eq!(candidates[0], "t0");
    }

    #[test]
    fn test_label_at_end_of_input() {
        assert!(extractor().extract("here is my task:").is_empty());
    }

    #[test]
    fn test_unicode_input_does_not_panic() {
        let extractor = extractor();
        extractor.extract("日本語のテキスト task: 買い物, 掃除");
        extractor.extract("ß İ ﬀ task: a");
    }
}

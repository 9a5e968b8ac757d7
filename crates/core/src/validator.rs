//! Static pattern checks over submitted code.
//!
//! Nothing here executes code. Input is whitespace-normalized once, then every
//! rule is evaluated on its own; a broken rule simply fails.

use crate::model::{CodeExercise, CodePredicate, CompletionPolicy, RuleId, ValidationRule};

//
// ─── RESULT ────────────────────────────────────────────────────────────────────
//

/// Outcome of a single rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleOutcome {
    pub rule_id: RuleId,
    pub satisfied: bool,
    /// Feedback text of the rule, shown when it is not satisfied.
    pub message: String,
}

/// Per-rule outcomes plus the derived score.
///
/// Ephemeral: recompute on every input change, never persist.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    outcomes: Vec<RuleOutcome>,
}

impl ValidationResult {
    #[must_use]
    pub fn outcomes(&self) -> &[RuleOutcome] {
        &self.outcomes
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    #[must_use]
    pub fn passed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.satisfied).count()
    }

    /// Fraction of satisfied rules, in `[0, 1]`.
    ///
    /// An empty rule set is trivially satisfied and scores `1.0`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn score(&self) -> f64 {
        if self.outcomes.is_empty() {
            return 1.0;
        }
        self.passed() as f64 / self.total() as f64
    }

    /// True when every rule passed.
    #[must_use]
    pub fn is_perfect(&self) -> bool {
        self.outcomes.iter().all(|o| o.satisfied)
    }

    /// Outcome for a specific rule, if it was part of the set.
    #[must_use]
    pub fn outcome(&self, rule_id: &RuleId) -> Option<&RuleOutcome> {
        self.outcomes.iter().find(|o| &o.rule_id == rule_id)
    }

    /// Feedback messages of the rules that did not pass, in rule order.
    #[must_use]
    pub fn unmet_messages(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|o| !o.satisfied)
            .map(|o| o.message.as_str())
            .collect()
    }

    /// Whether this result meets the given completion policy.
    #[must_use]
    pub fn meets(&self, policy: CompletionPolicy) -> bool {
        match policy {
            CompletionPolicy::AllRules => self.is_perfect(),
            CompletionPolicy::MinScore(threshold) => {
                let threshold = if threshold.is_finite() {
                    threshold.clamp(0.0, 1.0)
                } else {
                    1.0
                };
                self.score() >= threshold
            }
        }
    }
}

//
// ─── VALIDATION ────────────────────────────────────────────────────────────────
//

/// Collapses runs of whitespace to single spaces and trims both ends.
#[must_use]
pub fn normalize_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Evaluates `input` against `rules` in order.
///
/// Pure: identical inputs always produce identical results.
///
/// # Examples
///
/// ```
/// # use lesson_core::model::ValidationRule;
/// # use lesson_core::validator::validate;
/// let rules = vec![
///     ValidationRule::contains("h1", "<h1>", "Add a heading"),
///     ValidationRule::contains("p", "<p>", "Add a paragraph"),
/// ];
/// let result = validate("<h1>Hi</h1>", &rules);
/// assert_eq!(result.score(), 0.5);
/// ```
#[must_use]
pub fn validate(input: &str, rules: &[ValidationRule]) -> ValidationResult {
    let normalized = normalize_whitespace(input);
    let lowered = normalized.to_lowercase();
    let outcomes = rules
        .iter()
        .map(|rule| RuleOutcome {
            rule_id: rule.id().clone(),
            satisfied: evaluate(rule.predicate(), &normalized, &lowered),
            message: rule.message().to_owned(),
        })
        .collect();
    ValidationResult { outcomes }
}

/// Validates a submission for a coding exercise using its own rules.
#[must_use]
pub fn validate_exercise(input: &str, exercise: &CodeExercise) -> ValidationResult {
    validate(input, exercise.rules())
}

fn evaluate(predicate: &CodePredicate, normalized: &str, lowered: &str) -> bool {
    match predicate {
        CodePredicate::Contains(needle) => {
            let needle = normalize_whitespace(needle).to_lowercase();
            !needle.is_empty() && lowered.contains(&needle)
        }
        CodePredicate::BalancedTag(tag) => {
            let tag = tag.trim().to_lowercase();
            if tag.is_empty() {
                return false;
            }
            let opening = count_tags(lowered, &format!("<{tag}"));
            let closing = count_tags(lowered, &format!("</{tag}"));
            opening > 0 && opening == closing
        }
        CodePredicate::Matches(pattern) => pattern.is_match(normalized),
    }
}

/// Counts occurrences of `marker` that end a tag name (`>`, `/` or whitespace follows).
fn count_tags(haystack: &str, marker: &str) -> usize {
    haystack
        .match_indices(marker)
        .filter(|(idx, _)| {
            haystack[idx + marker.len()..]
                .chars()
                .next()
                .is_some_and(|c| c == '>' || c == '/' || c.is_whitespace())
        })
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heading_rules() -> Vec<ValidationRule> {
        vec![
            ValidationRule::contains("containsH1", "<h1>", "Add an <h1> heading"),
            ValidationRule::contains("containsP", "<p>", "Add a <p> paragraph"),
        ]
    }

    #[test]
    fn partial_credit_for_heading_only() {
        let result = validate("<h1>Hi</h1>", &heading_rules());
        assert!((result.score() - 0.5).abs() < f64::EPSILON);
        assert!(result.outcome(&RuleId::new("containsH1")).unwrap().satisfied);
        assert!(!result.outcome(&RuleId::new("containsP")).unwrap().satisfied);
        assert_eq!(result.unmet_messages(), vec!["Add a <p> paragraph"]);
    }

    #[test]
    fn zero_rules_score_one() {
        let result = validate("anything", &[]);
        assert_eq!(result.total(), 0);
        assert!((result.score() - 1.0).abs() < f64::EPSILON);
        assert!(result.is_perfect());
    }

    #[test]
    fn whitespace_is_normalized_before_matching() {
        assert_eq!(normalize_whitespace("  <h1>\n\t Hi  </h1>  "), "<h1> Hi </h1>");
        let rules = vec![ValidationRule::matches(
            "title",
            r"<title>my page</title>",
            "Add a title",
        )];
        let result = validate("<title>My\n   page</title>", &rules);
        assert!(result.is_perfect());
    }

    #[test]
    fn contains_needle_is_normalized_too() {
        let rules = vec![ValidationRule::contains(
            "link",
            "<a  href=",
            "Add a link",
        )];
        assert!(validate("<A\nhref=\"x\">x</a>", &rules).is_perfect());
    }

    #[test]
    fn invalid_regex_is_unsatisfied_not_fatal() {
        let rules = vec![
            ValidationRule::matches("broken", "(<h1", "never"),
            ValidationRule::contains("h1", "<h1>", "Add a heading"),
        ];
        let result = validate("(<h1>Hi</h1>", &rules);
        assert_eq!(result.passed(), 1);
        assert!(!result.outcome(&RuleId::new("broken")).unwrap().satisfied);
    }

    #[test]
    fn balanced_tag_counts_pairs() {
        let rules = vec![ValidationRule::balanced_tag("li", "li", "Close every <li>")];
        assert!(validate("<ul><li>a</li><li>b</li></ul>", &rules).is_perfect());
        assert!(!validate("<ul><li>a</li><li>b</ul>", &rules).is_perfect());
        assert!(!validate("<ul></ul>", &rules).is_perfect());
    }

    #[test]
    fn balanced_tag_ignores_longer_tag_names() {
        let rules = vec![ValidationRule::balanced_tag("p", "p", "Close every <p>")];
        assert!(validate("<p class=\"x\">a</p><pre>b</pre>", &rules).is_perfect());
        assert!(!validate("<p>a<pre>b</pre>", &rules).is_perfect());
    }

    #[test]
    fn validation_is_deterministic() {
        let rules = heading_rules();
        let input = "<h1>Hello</h1>\n<p>World</p>";
        assert_eq!(validate(input, &rules), validate(input, &rules));
    }

    #[test]
    fn min_score_policy_accepts_partial_matches() {
        let result = validate("<h1>Hi</h1>", &heading_rules());
        assert!(!result.meets(CompletionPolicy::AllRules));
        assert!(result.meets(CompletionPolicy::MinScore(0.5)));
        assert!(!result.meets(CompletionPolicy::MinScore(0.75)));
        assert!(!result.meets(CompletionPolicy::MinScore(f64::NAN)));
    }
}

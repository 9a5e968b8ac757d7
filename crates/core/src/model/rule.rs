use regex::{Regex, RegexBuilder};

use crate::model::ids::{RuleId, UnitId};

//
// ─── PATTERN ───────────────────────────────────────────────────────────────────
//

/// A regular expression kept together with its source text.
///
/// Compilation happens once, when the rule is defined. A source that does not
/// compile is kept (so it can be reported) but never matches anything.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    compiled: Option<Regex>,
}

impl Pattern {
    /// Compiles `source` case-insensitively.
    #[must_use]
    pub fn new(source: impl Into<String>) -> Self {
        let source = source.into();
        let compiled = RegexBuilder::new(&source)
            .case_insensitive(true)
            .build()
            .ok();
        Self { source, compiled }
    }

    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns true if the source compiled to a usable regex.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.compiled.is_some()
    }

    /// Returns true if the pattern matches anywhere in `haystack`.
    #[must_use]
    pub fn is_match(&self, haystack: &str) -> bool {
        self.compiled
            .as_ref()
            .is_some_and(|regex| regex.is_match(haystack))
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for Pattern {}

//
// ─── PREDICATES ────────────────────────────────────────────────────────────────
//

/// Closed set of checks a rule can perform on normalized input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodePredicate {
    /// Input contains the needle (case-insensitive, whitespace-normalized).
    Contains(String),
    /// Input has at least one `<tag>` and as many opening as closing tags.
    BalancedTag(String),
    /// Regex (case-insensitive) matches the normalized input.
    Matches(Pattern),
}

//
// ─── RULE ──────────────────────────────────────────────────────────────────────
//

/// Immutable validation rule attached to a coding exercise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationRule {
    id: RuleId,
    predicate: CodePredicate,
    message: String,
}

impl ValidationRule {
    #[must_use]
    pub fn new(id: impl Into<RuleId>, predicate: CodePredicate, message: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            predicate,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn contains(
        id: impl Into<RuleId>,
        needle: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(id, CodePredicate::Contains(needle.into()), message)
    }

    #[must_use]
    pub fn balanced_tag(
        id: impl Into<RuleId>,
        tag: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(id, CodePredicate::BalancedTag(tag.into()), message)
    }

    #[must_use]
    pub fn matches(
        id: impl Into<RuleId>,
        pattern: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(id, CodePredicate::Matches(Pattern::new(pattern)), message)
    }

    #[must_use]
    pub fn id(&self) -> &RuleId {
        &self.id
    }

    #[must_use]
    pub fn predicate(&self) -> &CodePredicate {
        &self.predicate
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

//
// ─── EXERCISE ──────────────────────────────────────────────────────────────────
//

/// When a validation result counts as "exercise done".
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum CompletionPolicy {
    /// Every rule must pass.
    #[default]
    AllRules,
    /// Score must reach the threshold (clamped to `[0, 1]`).
    MinScore(f64),
}

/// A coding exercise: the unit it completes plus the rules it is checked with.
#[derive(Debug, Clone, PartialEq)]
pub struct CodeExercise {
    unit: UnitId,
    title: String,
    rules: Vec<ValidationRule>,
    policy: CompletionPolicy,
}

impl CodeExercise {
    #[must_use]
    pub fn new(unit: impl Into<UnitId>, title: impl Into<String>, rules: Vec<ValidationRule>) -> Self {
        Self {
            unit: unit.into(),
            title: title.into(),
            rules,
            policy: CompletionPolicy::AllRules,
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: CompletionPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn unit(&self) -> &UnitId {
        &self.unit
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn rules(&self) -> &[ValidationRule] {
        &self.rules
    }

    #[must_use]
    pub fn policy(&self) -> CompletionPolicy {
        self.policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_pattern_never_matches() {
        let pattern = Pattern::new("(<h1");
        assert!(!pattern.is_valid());
        assert!(!pattern.is_match("(<h1"));
        assert_eq!(pattern.source(), "(<h1");
    }

    #[test]
    fn pattern_is_case_insensitive() {
        let pattern = Pattern::new("<title>.*</title>");
        assert!(pattern.is_match("<TITLE>My Page</TITLE>"));
    }

    #[test]
    fn patterns_compare_by_source() {
        assert_eq!(Pattern::new("a+"), Pattern::new("a+"));
        assert_ne!(Pattern::new("a+"), Pattern::new("b+"));
    }

    #[test]
    fn exercise_defaults_to_all_rules() {
        let exercise = CodeExercise::new("html-heading", "Heading", Vec::new());
        assert_eq!(exercise.policy(), CompletionPolicy::AllRules);
        let relaxed = exercise.with_policy(CompletionPolicy::MinScore(0.5));
        assert_eq!(relaxed.policy(), CompletionPolicy::MinScore(0.5));
    }
}

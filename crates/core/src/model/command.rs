use crate::model::UnitId;
use crate::model::rule::Pattern;

/// Placeholder replaced with the quoted argument of a command.
pub const ARG_PLACEHOLDER: &str = "{arg}";
/// Placeholder replaced with the current date. Outputs using it are not deterministic.
pub const DATE_PLACEHOLDER: &str = "{date}";

//
// ─── PATTERN ───────────────────────────────────────────────────────────────────
//

/// How a command line is recognized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandPattern {
    /// Exact match after trimming.
    Exact(String),
    /// Any of the listed spellings.
    AnyOf(Vec<String>),
    /// `prefix` followed by a required quoted argument, e.g. `git commit -m "msg"`.
    ///
    /// When the prefix matches but the argument is missing, `missing` is returned
    /// instead of the generic fallback.
    QuotedArgument { prefix: String, missing: String },
    /// Case-insensitive regex over the trimmed command.
    Regex(Pattern),
}

/// Result of matching one pattern against a command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PatternMatch {
    NoMatch,
    Matched { argument: Option<String> },
    MissingArgument,
}

impl CommandPattern {
    pub(crate) fn check(&self, command: &str) -> PatternMatch {
        match self {
            CommandPattern::Exact(expected) => {
                if command == expected {
                    PatternMatch::Matched { argument: None }
                } else {
                    PatternMatch::NoMatch
                }
            }
            CommandPattern::AnyOf(options) => {
                if options.iter().any(|o| o == command) {
                    PatternMatch::Matched { argument: None }
                } else {
                    PatternMatch::NoMatch
                }
            }
            CommandPattern::QuotedArgument { prefix, .. } => {
                let Some(rest) = command.strip_prefix(prefix.as_str()) else {
                    return PatternMatch::NoMatch;
                };
                if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
                    return PatternMatch::NoMatch;
                }
                match quoted_argument(rest.trim()) {
                    Some(argument) => PatternMatch::Matched {
                        argument: Some(argument),
                    },
                    None => PatternMatch::MissingArgument,
                }
            }
            CommandPattern::Regex(pattern) => {
                if pattern.is_match(command) {
                    PatternMatch::Matched { argument: None }
                } else {
                    PatternMatch::NoMatch
                }
            }
        }
    }
}

/// Extracts a non-empty `"..."` or `'...'` argument from the start of `rest`.
fn quoted_argument(rest: &str) -> Option<String> {
    let mut chars = rest.chars();
    let quote = chars.next().filter(|c| *c == '"' || *c == '\'')?;
    let body = chars.as_str();
    let end = body.find(quote)?;
    let inner = body[..end].trim();
    if inner.is_empty() {
        return None;
    }
    Some(inner.to_string())
}

//
// ─── ENTRY ─────────────────────────────────────────────────────────────────────
//

/// One row of a command table: pattern, canned output and the exercise it satisfies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandEntry {
    pattern: CommandPattern,
    output: String,
    satisfies: Option<UnitId>,
}

impl CommandEntry {
    #[must_use]
    pub fn new(pattern: CommandPattern, output: impl Into<String>) -> Self {
        Self {
            pattern,
            output: output.into(),
            satisfies: None,
        }
    }

    #[must_use]
    pub fn exact(command: impl Into<String>, output: impl Into<String>) -> Self {
        Self::new(CommandPattern::Exact(command.into()), output)
    }

    #[must_use]
    pub fn satisfies(mut self, unit: impl Into<UnitId>) -> Self {
        self.satisfies = Some(unit.into());
        self
    }

    #[must_use]
    pub fn pattern(&self) -> &CommandPattern {
        &self.pattern
    }

    #[must_use]
    pub fn output_template(&self) -> &str {
        &self.output
    }

    #[must_use]
    pub fn satisfied_unit(&self) -> Option<&UnitId> {
        self.satisfies.as_ref()
    }

    /// True if the output embeds the current date and must not be used as an oracle.
    #[must_use]
    pub fn is_time_dependent(&self) -> bool {
        self.output.contains(DATE_PLACEHOLDER)
    }
}

//
// ─── TABLE ─────────────────────────────────────────────────────────────────────
//

/// Command name and one-line description listed by the fallback response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VocabularyEntry {
    pub name: String,
    pub description: String,
}

/// Ordered, first-match-wins command table.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandTable {
    program: Option<String>,
    entries: Vec<CommandEntry>,
    clear_commands: Vec<String>,
    vocabulary: Vec<VocabularyEntry>,
}

impl CommandTable {
    /// Empty table with the usual `clear` pseudo-command.
    #[must_use]
    pub fn new() -> Self {
        Self {
            clear_commands: vec!["clear".to_string()],
            ..Self::default()
        }
    }

    /// Names the program whose sub-commands this table simulates (e.g. `git`).
    #[must_use]
    pub fn for_program(mut self, program: impl Into<String>) -> Self {
        self.program = Some(program.into());
        self
    }

    #[must_use]
    pub fn entry(mut self, entry: CommandEntry) -> Self {
        self.entries.push(entry);
        self
    }

    #[must_use]
    pub fn clear_command(mut self, command: impl Into<String>) -> Self {
        self.clear_commands.push(command.into());
        self
    }

    #[must_use]
    pub fn describe(mut self, name: impl Into<String>, description: impl Into<String>) -> Self {
        self.vocabulary.push(VocabularyEntry {
            name: name.into(),
            description: description.into(),
        });
        self
    }

    #[must_use]
    pub fn program(&self) -> Option<&str> {
        self.program.as_deref()
    }

    #[must_use]
    pub fn entries(&self) -> &[CommandEntry] {
        &self.entries
    }

    #[must_use]
    pub fn vocabulary(&self) -> &[VocabularyEntry] {
        &self.vocabulary
    }

    #[must_use]
    pub fn is_clear_command(&self, command: &str) -> bool {
        self.clear_commands.iter().any(|c| c == command)
    }

    /// Units this table can mark as satisfied, in table order.
    pub fn exercise_units(&self) -> impl Iterator<Item = &UnitId> {
        self.entries.iter().filter_map(CommandEntry::satisfied_unit)
    }
}

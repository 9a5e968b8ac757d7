//! Closed terminal simulator over a fixed command vocabulary.

use chrono::{DateTime, Utc};

use crate::model::command::{ARG_PLACEHOLDER, DATE_PLACEHOLDER, PatternMatch};
use crate::model::{CommandPattern, CommandTable, UnitId};

//
// ─── RESPONSE ──────────────────────────────────────────────────────────────────
//

/// How a response changes the session log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMutation {
    Append,
    Clear,
}

/// Which branch of the simulator produced a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    Recognized,
    /// Recognized command family, required argument absent.
    MissingArgument,
    /// Generic fallback listing the known vocabulary.
    Unrecognized,
    Clear,
}

/// Simulator response for one command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    pub output: String,
    pub satisfies: Option<UnitId>,
    pub mutation: SessionMutation,
    pub kind: ResponseKind,
}

impl CommandTable {
    /// Produces the response for `command` without touching any session.
    ///
    /// Only outputs containing the date placeholder depend on `now`.
    #[must_use]
    pub fn respond(&self, command: &str, now: DateTime<Utc>) -> CommandResult {
        let command = command.trim();
        if self.is_clear_command(command) {
            return CommandResult {
                output: String::new(),
                satisfies: None,
                mutation: SessionMutation::Clear,
                kind: ResponseKind::Clear,
            };
        }

        for entry in self.entries() {
            match entry.pattern().check(command) {
                PatternMatch::NoMatch => {}
                PatternMatch::Matched { argument } => {
                    return CommandResult {
                        output: render(entry.output_template(), argument.as_deref(), now),
                        satisfies: entry.satisfied_unit().cloned(),
                        mutation: SessionMutation::Append,
                        kind: ResponseKind::Recognized,
                    };
                }
                PatternMatch::MissingArgument => {
                    let output = match entry.pattern() {
                        CommandPattern::QuotedArgument { missing, .. } => missing.clone(),
                        _ => String::new(),
                    };
                    return CommandResult {
                        output,
                        satisfies: None,
                        mutation: SessionMutation::Append,
                        kind: ResponseKind::MissingArgument,
                    };
                }
            }
        }

        CommandResult {
            output: self.fallback(command),
            satisfies: None,
            mutation: SessionMutation::Append,
            kind: ResponseKind::Unrecognized,
        }
    }

    /// Responds to `command` and applies the result to `session`.
    ///
    /// Blank commands are ignored and return `None`.
    pub fn execute(
        &self,
        command: &str,
        session: &mut TerminalSession,
        now: DateTime<Utc>,
    ) -> Option<CommandResult> {
        let command = command.trim();
        if command.is_empty() {
            return None;
        }
        let result = self.respond(command, now);
        session.apply(command, &result);
        Some(result)
    }

    fn fallback(&self, command: &str) -> String {
        let mut words = command.split_whitespace();
        let first = words.next().unwrap_or(command);
        let (header, listing) = match self.program() {
            Some(program) if first == program => {
                let sub = words.next().unwrap_or(command);
                (
                    format!(
                        "{program}: '{sub}' is not a {program} command. See '{program} --help'."
                    ),
                    format!("The most commonly used {program} commands are:"),
                )
            }
            _ => (
                format!("{first}: command not found"),
                "Available commands:".to_string(),
            ),
        };

        let mut out = header;
        if !self.vocabulary().is_empty() {
            out.push_str("\n\n");
            out.push_str(&listing);
            for item in self.vocabulary() {
                out.push_str(&format!("\n   {:<10} {}", item.name, item.description));
            }
        }
        out
    }
}

fn render(template: &str, argument: Option<&str>, now: DateTime<Utc>) -> String {
    let mut out = template.to_string();
    if let Some(argument) = argument {
        out = out.replace(ARG_PLACEHOLDER, argument);
    }
    if out.contains(DATE_PLACEHOLDER) {
        out = out.replace(DATE_PLACEHOLDER, &now.format("%a %b %d %Y").to_string());
    }
    out
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One command and the output shown for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalEntry {
    pub command: String,
    pub output: String,
}

/// Append-only terminal log plus the current unfinished input.
///
/// Only a clear command truncates the log; exercise completion lives elsewhere
/// and is never affected by it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TerminalSession {
    history: Vec<TerminalEntry>,
    input: String,
}

impl TerminalSession {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn history(&self) -> &[TerminalEntry] {
        &self.history
    }

    #[must_use]
    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, input: impl Into<String>) {
        self.input = input.into();
    }

    /// Submits the pending input through `table`.
    ///
    /// Blank input is ignored (no history entry, input kept as is).
    pub fn submit(&mut self, table: &CommandTable, now: DateTime<Utc>) -> Option<CommandResult> {
        let command = self.input.clone();
        table.execute(&command, self, now)
    }

    fn apply(&mut self, command: &str, result: &CommandResult) {
        match result.mutation {
            SessionMutation::Append => self.history.push(TerminalEntry {
                command: command.to_string(),
                output: result.output.clone(),
            }),
            SessionMutation::Clear => self.history.clear(),
        }
        self.input.clear();
    }
}

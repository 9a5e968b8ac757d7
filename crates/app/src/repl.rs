//! Line commands understood by the interactive shell.

use std::fmt;

use lesson_core::model::{PhaseId, SectionId, UnitId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Status,
    Toggle(UnitId),
    Done(UnitId),
    Undo(UnitId),
    Complete(SectionId),
    Finish(SectionId),
    /// Starts multi-line code entry for an exercise; a lone `.` ends it.
    Code(UnitId),
    /// Runs a simulated terminal command.
    Shell(String),
    /// Shows the concept on screen.
    Concept,
    NextConcept,
    PreviousConcept,
    Advance,
    GoTo(PhaseId),
    Order,
    Place { step: String, slot: usize },
    ClearSlot(usize),
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    Empty,
    Unknown(String),
    MissingArgument { command: &'static str, argument: &'static str },
    InvalidSlot(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Empty => write!(f, "type a command, or `help`"),
            ParseError::Unknown(word) => write!(f, "unknown command: {word} (try `help`)"),
            ParseError::MissingArgument { command, argument } => {
                write!(f, "{command} requires <{argument}>")
            }
            ParseError::InvalidSlot(raw) => write!(f, "invalid slot number: {raw}"),
        }
    }
}

impl std::error::Error for ParseError {}

pub const HELP: &str = "\
Commands:
  status                 show phases, sections, and achievements
  toggle <unit>          flip a checklist item
  done <unit>            mark a unit done
  undo <unit>            mark a unit not done
  complete <section>     mark a section complete
  finish <section>       mark every unit of a section, then complete it
  code <unit>            submit code for an exercise (end with a lone `.`)
  $ <command>            run a command in the practice terminal
  concept                show the current concept
  next                   mark the concept read and show the next one
  prev                   go back one concept
  advance                move to the next phase
  goto <phase>           jump to an unlocked phase
  order                  show the command-ordering challenge
  place <step> <slot>    put a step into a slot (slots start at 1)
  clear-slot <slot>      empty a slot
  quit                   leave";

fn required<'a>(
    rest: Option<&'a str>,
    command: &'static str,
    argument: &'static str,
) -> Result<&'a str, ParseError> {
    rest.map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or(ParseError::MissingArgument { command, argument })
}

fn slot(raw: &str) -> Result<usize, ParseError> {
    raw.parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .ok_or_else(|| ParseError::InvalidSlot(raw.to_string()))
}

impl Command {
    /// Parses one input line.
    ///
    /// # Errors
    ///
    /// Returns `ParseError` for blank lines, unknown words, or missing arguments.
    pub fn parse(line: &str) -> Result<Self, ParseError> {
        let line = line.trim();
        if let Some(command) = line.strip_prefix('$') {
            return Ok(Self::Shell(command.trim().to_string()));
        }
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, Some(rest)),
            None => (line, None),
        };
        match word {
            "" => Err(ParseError::Empty),
            "help" | "?" => Ok(Self::Help),
            "status" => Ok(Self::Status),
            "toggle" => Ok(Self::Toggle(UnitId::new(required(rest, "toggle", "unit")?))),
            "done" => Ok(Self::Done(UnitId::new(required(rest, "done", "unit")?))),
            "undo" => Ok(Self::Undo(UnitId::new(required(rest, "undo", "unit")?))),
            "complete" => Ok(Self::Complete(SectionId::new(required(
                rest, "complete", "section",
            )?))),
            "finish" => Ok(Self::Finish(SectionId::new(required(
                rest, "finish", "section",
            )?))),
            "code" => Ok(Self::Code(UnitId::new(required(rest, "code", "unit")?))),
            "concept" => Ok(Self::Concept),
            "next" => Ok(Self::NextConcept),
            "prev" | "back" => Ok(Self::PreviousConcept),
            "advance" => Ok(Self::Advance),
            "goto" => Ok(Self::GoTo(PhaseId::new(required(rest, "goto", "phase")?))),
            "order" => Ok(Self::Order),
            "place" => {
                let args = required(rest, "place", "step")?;
                let (step, raw_slot) = args
                    .rsplit_once(char::is_whitespace)
                    .ok_or(ParseError::MissingArgument {
                        command: "place",
                        argument: "slot",
                    })?;
                Ok(Self::Place {
                    step: step.trim().to_string(),
                    slot: slot(raw_slot)?,
                })
            }
            "clear-slot" => Ok(Self::ClearSlot(slot(required(rest, "clear-slot", "slot")?)?)),
            "quit" | "exit" => Ok(Self::Quit),
            other => Err(ParseError::Unknown(other.to_string())),
        }
    }
}

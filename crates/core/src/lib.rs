#![forbid(unsafe_code)]

pub mod achievements;
pub mod catalog;
pub mod error;
pub mod gate;
pub mod model;
pub mod session;
pub mod terminal;
pub mod time;
pub mod tracker;
pub mod validator;

pub use time::Clock;

pub use achievements::AchievementEvaluator;
pub use error::Error;
pub use gate::{GateError, ProgressionGate};
pub use session::{CodeSubmission, CommandSubmission, ProgressEvent, ProgressSession, UnitToggle};
pub use terminal::{CommandResult, ResponseKind, SessionMutation, TerminalEntry, TerminalSession};
pub use tracker::{ProgressSummary, ProgressTracker, SectionStatus, ToggleOutcome};
pub use validator::{RuleOutcome, ValidationResult, validate, validate_exercise};

pub mod command;
mod completion;
mod concept;
mod course;
mod ids;
mod rule;
mod sequence;
mod snapshot;

pub use ids::{
    AchievementId, CourseId, LearnerId, ParseIdError, PhaseId, RuleId, SectionId, UnitId,
};

pub use command::{CommandEntry, CommandPattern, CommandTable, VocabularyEntry};
pub use completion::CompletionSet;
pub use concept::{Concept, ConceptStepper};
pub use course::{
    Achievement, ChecklistItem, CourseBuilder, CourseError, CourseOutline, PhaseDefinition,
    SectionDefinition, SectionRequirement,
};
pub use rule::{CodeExercise, CodePredicate, CompletionPolicy, Pattern, ValidationRule};
pub use sequence::{SequenceError, SequenceExercise};
pub use snapshot::{ProgressSnapshot, SNAPSHOT_VERSION};

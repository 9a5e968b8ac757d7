use std::collections::BTreeSet;

use thiserror::Error;

use crate::model::{
    AchievementId, CodeExercise, CommandTable, CompletionSet, Concept, CourseId, PhaseId, SectionId,
    UnitId,
};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CourseError {
    #[error("{kind} id cannot be blank")]
    BlankId { kind: &'static str },

    #[error("duplicate section: {0}")]
    DuplicateSection(SectionId),

    #[error("duplicate phase: {0}")]
    DuplicatePhase(PhaseId),

    #[error("duplicate achievement: {0}")]
    DuplicateAchievement(AchievementId),

    #[error("duplicate exercise unit: {0}")]
    DuplicateExercise(UnitId),

    #[error("duplicate concept unit: {0}")]
    DuplicateConcept(UnitId),

    #[error("phase {phase} ends with unknown section {section}")]
    UnknownTerminalSection { phase: PhaseId, section: SectionId },

    #[error("achievement {achievement} is triggered by undeclared unit {unit}")]
    UnknownTrigger {
        achievement: AchievementId,
        unit: UnitId,
    },

    #[error("prefix requirement of section {0} must ask for at least one unit")]
    EmptyPrefixCount(SectionId),

    #[error("a course needs at least one phase")]
    NoPhases,
}

//
// ─── REQUIREMENTS ──────────────────────────────────────────────────────────────
//

/// One line of a completion checklist.
///
/// Checked when its own unit is present (manual tick) or, if it has
/// dependencies, when all of them are present (auto-completed).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecklistItem {
    pub unit: UnitId,
    pub label: String,
    pub deps: Vec<UnitId>,
}

impl ChecklistItem {
    #[must_use]
    pub fn new(unit: impl Into<UnitId>, label: impl Into<String>) -> Self {
        Self {
            unit: unit.into(),
            label: label.into(),
            deps: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_deps<I, U>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = U>,
        U: Into<UnitId>,
    {
        self.deps = deps.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn is_manually_checked(&self, completed: &CompletionSet) -> bool {
        completed.contains(&self.unit)
    }

    #[must_use]
    pub fn is_auto_checked(&self, completed: &CompletionSet) -> bool {
        !self.deps.is_empty() && self.deps.iter().all(|d| completed.contains(d))
    }

    #[must_use]
    pub fn is_checked(&self, completed: &CompletionSet) -> bool {
        self.is_manually_checked(completed) || self.is_auto_checked(completed)
    }
}

/// What a section needs before its completion action unlocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionRequirement {
    /// No derived path; only the explicit completion action completes it.
    Manual,
    /// Every listed unit is done. An empty list is trivially met.
    AllOf(Vec<UnitId>),
    /// At least `count` done units start with `prefix`.
    PrefixCount { prefix: String, count: usize },
    /// Every checklist line is checked.
    Checklist(Vec<ChecklistItem>),
    /// Every nested requirement is met.
    Every(Vec<SectionRequirement>),
}

impl SectionRequirement {
    #[must_use]
    pub fn all_of<I, U>(units: I) -> Self
    where
        I: IntoIterator<Item = U>,
        U: Into<UnitId>,
    {
        Self::AllOf(units.into_iter().map(Into::into).collect())
    }

    #[must_use]
    pub fn is_met(&self, completed: &CompletionSet) -> bool {
        match self {
            SectionRequirement::Manual => false,
            SectionRequirement::AllOf(units) => units.iter().all(|u| completed.contains(u)),
            SectionRequirement::PrefixCount { prefix, count } => {
                completed.count_with_prefix(prefix) >= *count
            }
            SectionRequirement::Checklist(items) => {
                items.iter().all(|item| item.is_checked(completed))
            }
            SectionRequirement::Every(parts) => parts.iter().all(|part| part.is_met(completed)),
        }
    }

    /// Every unit id this requirement names directly.
    #[must_use]
    pub fn named_units(&self) -> Vec<&UnitId> {
        match self {
            SectionRequirement::Manual | SectionRequirement::PrefixCount { .. } => Vec::new(),
            SectionRequirement::AllOf(units) => units.iter().collect(),
            SectionRequirement::Checklist(items) => items
                .iter()
                .flat_map(|item| std::iter::once(&item.unit).chain(item.deps.iter()))
                .collect(),
            SectionRequirement::Every(parts) => {
                parts.iter().flat_map(SectionRequirement::named_units).collect()
            }
        }
    }

    fn has_empty_prefix_count(&self) -> bool {
        match self {
            SectionRequirement::PrefixCount { count, .. } => *count == 0,
            SectionRequirement::Every(parts) => parts.iter().any(Self::has_empty_prefix_count),
            _ => false,
        }
    }
}

//
// ─── DEFINITIONS ───────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionDefinition {
    pub id: SectionId,
    pub title: String,
    pub requirement: SectionRequirement,
}

impl SectionDefinition {
    #[must_use]
    pub fn new(
        id: impl Into<SectionId>,
        title: impl Into<String>,
        requirement: SectionRequirement,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            requirement,
        }
    }
}

/// Ordered stage of a course; done when its terminal section is done.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseDefinition {
    pub id: PhaseId,
    pub title: String,
    pub terminal_section: SectionId,
}

/// One-time unlock fired by the first completion of its trigger unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Achievement {
    pub id: AchievementId,
    pub title: String,
    pub description: String,
    pub trigger: UnitId,
}

impl Achievement {
    #[must_use]
    pub fn new(
        id: impl Into<AchievementId>,
        title: impl Into<String>,
        trigger: impl Into<UnitId>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            trigger: trigger.into(),
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

//
// ─── OUTLINE ───────────────────────────────────────────────────────────────────
//

/// Validated, immutable content configuration of one course.
#[derive(Debug, Clone, PartialEq)]
pub struct CourseOutline {
    id: CourseId,
    title: String,
    units: BTreeSet<UnitId>,
    sections: Vec<SectionDefinition>,
    phases: Vec<PhaseDefinition>,
    achievements: Vec<Achievement>,
    exercises: Vec<CodeExercise>,
    concepts: Vec<Concept>,
    commands: CommandTable,
}

impl CourseOutline {
    #[must_use]
    pub fn builder(id: impl Into<CourseId>, title: impl Into<String>) -> CourseBuilder {
        CourseBuilder::new(id, title)
    }

    #[must_use]
    pub fn id(&self) -> &CourseId {
        &self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn sections(&self) -> &[SectionDefinition] {
        &self.sections
    }

    #[must_use]
    pub fn phases(&self) -> &[PhaseDefinition] {
        &self.phases
    }

    #[must_use]
    pub fn achievements(&self) -> &[Achievement] {
        &self.achievements
    }

    #[must_use]
    pub fn exercises(&self) -> &[CodeExercise] {
        &self.exercises
    }

    /// Concept walkthrough, in reading order.
    #[must_use]
    pub fn concepts(&self) -> &[Concept] {
        &self.concepts
    }

    #[must_use]
    pub fn commands(&self) -> &CommandTable {
        &self.commands
    }

    pub fn units(&self) -> impl Iterator<Item = &UnitId> {
        self.units.iter()
    }

    #[must_use]
    pub fn is_known_unit(&self, unit: &UnitId) -> bool {
        self.units.contains(unit)
    }

    #[must_use]
    pub fn section(&self, id: &SectionId) -> Option<&SectionDefinition> {
        self.sections.iter().find(|s| &s.id == id)
    }

    #[must_use]
    pub fn exercise(&self, unit: &UnitId) -> Option<&CodeExercise> {
        self.exercises.iter().find(|e| e.unit() == unit)
    }

    #[must_use]
    pub fn phase_index(&self, id: &PhaseId) -> Option<usize> {
        self.phases.iter().position(|p| &p.id == id)
    }

    /// Phase whose terminal section is `section`, if any.
    #[must_use]
    pub fn phase_ending_with(&self, section: &SectionId) -> Option<&PhaseDefinition> {
        self.phases.iter().find(|p| &p.terminal_section == section)
    }
}

/// Collects course content and validates it into a `CourseOutline`.
#[derive(Debug, Clone)]
pub struct CourseBuilder {
    id: CourseId,
    title: String,
    units: Vec<UnitId>,
    sections: Vec<SectionDefinition>,
    phases: Vec<PhaseDefinition>,
    achievements: Vec<Achievement>,
    exercises: Vec<CodeExercise>,
    concepts: Vec<Concept>,
    commands: CommandTable,
}

impl CourseBuilder {
    #[must_use]
    pub fn new(id: impl Into<CourseId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            units: Vec::new(),
            sections: Vec::new(),
            phases: Vec::new(),
            achievements: Vec::new(),
            exercises: Vec::new(),
            concepts: Vec::new(),
            commands: CommandTable::new(),
        }
    }

    /// Declares units not named by any requirement (e.g. prefix-counted ones).
    #[must_use]
    pub fn units<I, U>(mut self, units: I) -> Self
    where
        I: IntoIterator<Item = U>,
        U: Into<UnitId>,
    {
        self.units.extend(units.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn section(mut self, section: SectionDefinition) -> Self {
        self.sections.push(section);
        self
    }

    #[must_use]
    pub fn phase(
        mut self,
        id: impl Into<PhaseId>,
        title: impl Into<String>,
        terminal_section: impl Into<SectionId>,
    ) -> Self {
        self.phases.push(PhaseDefinition {
            id: id.into(),
            title: title.into(),
            terminal_section: terminal_section.into(),
        });
        self
    }

    #[must_use]
    pub fn achievement(mut self, achievement: Achievement) -> Self {
        self.achievements.push(achievement);
        self
    }

    #[must_use]
    pub fn exercise(mut self, exercise: CodeExercise) -> Self {
        self.exercises.push(exercise);
        self
    }

    #[must_use]
    pub fn concept(mut self, concept: Concept) -> Self {
        self.concepts.push(concept);
        self
    }

    #[must_use]
    pub fn concepts<I>(mut self, concepts: I) -> Self
    where
        I: IntoIterator<Item = Concept>,
    {
        self.concepts.extend(concepts);
        self
    }

    #[must_use]
    pub fn commands(mut self, commands: CommandTable) -> Self {
        self.commands = commands;
        self
    }

    /// Validates the content and freezes it.
    ///
    /// Units named by requirements, exercises, concepts and the command table
    /// are declared implicitly.
    ///
    /// # Errors
    ///
    /// Returns `CourseError` for blank or duplicate ids, phases ending with an
    /// unknown section, achievements on undeclared units, or a course without phases.
    pub fn build(self) -> Result<CourseOutline, CourseError> {
        if self.id.is_blank() {
            return Err(CourseError::BlankId { kind: "course" });
        }
        if self.phases.is_empty() {
            return Err(CourseError::NoPhases);
        }

        let mut units: BTreeSet<UnitId> = BTreeSet::new();
        for unit in &self.units {
            insert_unit(&mut units, unit)?;
        }

        let mut section_ids = BTreeSet::new();
        for section in &self.sections {
            if section.id.is_blank() {
                return Err(CourseError::BlankId { kind: "section" });
            }
            if !section_ids.insert(section.id.clone()) {
                return Err(CourseError::DuplicateSection(section.id.clone()));
            }
            if section.requirement.has_empty_prefix_count() {
                return Err(CourseError::EmptyPrefixCount(section.id.clone()));
            }
            for unit in section.requirement.named_units() {
                insert_unit(&mut units, unit)?;
            }
        }

        let mut phase_ids = BTreeSet::new();
        for phase in &self.phases {
            if phase.id.is_blank() {
                return Err(CourseError::BlankId { kind: "phase" });
            }
            if !phase_ids.insert(phase.id.clone()) {
                return Err(CourseError::DuplicatePhase(phase.id.clone()));
            }
            if !section_ids.contains(&phase.terminal_section) {
                return Err(CourseError::UnknownTerminalSection {
                    phase: phase.id.clone(),
                    section: phase.terminal_section.clone(),
                });
            }
        }

        let mut exercise_units = BTreeSet::new();
        for exercise in &self.exercises {
            if !exercise_units.insert(exercise.unit().clone()) {
                return Err(CourseError::DuplicateExercise(exercise.unit().clone()));
            }
            insert_unit(&mut units, exercise.unit())?;
        }
        for unit in self.commands.exercise_units() {
            insert_unit(&mut units, unit)?;
        }
        let mut concept_units = BTreeSet::new();
        for concept in &self.concepts {
            if !concept_units.insert(concept.unit.clone()) {
                return Err(CourseError::DuplicateConcept(concept.unit.clone()));
            }
            insert_unit(&mut units, &concept.unit)?;
        }

        let mut achievement_ids = BTreeSet::new();
        for achievement in &self.achievements {
            if achievement.id.is_blank() {
                return Err(CourseError::BlankId {
                    kind: "achievement",
                });
            }
            if !achievement_ids.insert(achievement.id.clone()) {
                return Err(CourseError::DuplicateAchievement(achievement.id.clone()));
            }
            if !units.contains(&achievement.trigger) {
                return Err(CourseError::UnknownTrigger {
                    achievement: achievement.id.clone(),
                    unit: achievement.trigger.clone(),
                });
            }
        }

        Ok(CourseOutline {
            id: self.id,
            title: self.title,
            units,
            sections: self.sections,
            phases: self.phases,
            achievements: self.achievements,
            exercises: self.exercises,
            concepts: self.concepts,
            commands: self.commands,
        })
    }
}

fn insert_unit(units: &mut BTreeSet<UnitId>, unit: &UnitId) -> Result<(), CourseError> {
    if unit.is_blank() {
        return Err(CourseError::BlankId { kind: "unit" });
    }
    units.insert(unit.clone());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> CourseBuilder {
        CourseOutline::builder("demo", "Demo")
            .section(SectionDefinition::new(
                "intro",
                "Intro",
                SectionRequirement::all_of(["a", "b"]),
            ))
            .phase("setup", "Setup", "intro")
    }

    #[test]
    fn builds_and_declares_named_units() {
        let outline = base().build().unwrap();
        assert!(outline.is_known_unit(&UnitId::new("a")));
        assert!(outline.is_known_unit(&UnitId::new("b")));
        assert!(!outline.is_known_unit(&UnitId::new("c")));
        assert_eq!(outline.phase_index(&PhaseId::new("setup")), Some(0));
    }

    #[test]
    fn rejects_unknown_terminal_section() {
        let err = base().phase("next", "Next", "missing").build().unwrap_err();
        assert_eq!(
            err,
            CourseError::UnknownTerminalSection {
                phase: PhaseId::new("next"),
                section: SectionId::new("missing"),
            }
        );
    }

    #[test]
    fn rejects_duplicate_sections() {
        let err = base()
            .section(SectionDefinition::new("intro", "Again", SectionRequirement::Manual))
            .build()
            .unwrap_err();
        assert_eq!(err, CourseError::DuplicateSection(SectionId::new("intro")));
    }

    #[test]
    fn rejects_achievement_on_undeclared_unit() {
        let err = base()
            .achievement(Achievement::new("first", "First", "zzz"))
            .build()
            .unwrap_err();
        assert!(matches!(err, CourseError::UnknownTrigger { .. }));
    }

    #[test]
    fn rejects_course_without_phases() {
        let err = CourseOutline::builder("demo", "Demo").build().unwrap_err();
        assert_eq!(err, CourseError::NoPhases);
    }

    #[test]
    fn rejects_zero_prefix_count() {
        let err = base()
            .section(SectionDefinition::new(
                "cmds",
                "Commands",
                SectionRequirement::PrefixCount {
                    prefix: "cmd-".into(),
                    count: 0,
                },
            ))
            .build()
            .unwrap_err();
        assert_eq!(err, CourseError::EmptyPrefixCount(SectionId::new("cmds")));
    }

    #[test]
    fn checklist_items_auto_check_from_deps() {
        let item = ChecklistItem::new("section0-0", "Installed").with_deps(["dl", "run"]);
        let mut done = CompletionSet::new();
        assert!(!item.is_checked(&done));
        done.insert(UnitId::new("dl"));
        done.insert(UnitId::new("run"));
        assert!(item.is_auto_checked(&done));
        assert!(!item.is_manually_checked(&done));
        assert!(item.is_checked(&done));
    }

    #[test]
    fn checklist_item_without_deps_needs_manual_tick() {
        let item = ChecklistItem::new("confirm", "I confirm");
        let mut done = CompletionSet::new();
        assert!(!item.is_auto_checked(&done));
        done.insert(UnitId::new("confirm"));
        assert!(item.is_checked(&done));
    }

    #[test]
    fn concepts_declare_units_and_reject_duplicates() {
        let outline = base()
            .concept(Concept::new("concept-0", "What is Git?", "Tracking changes"))
            .build()
            .unwrap();
        assert!(outline.is_known_unit(&UnitId::new("concept-0")));
        assert_eq!(outline.concepts().len(), 1);

        let err = base()
            .concept(Concept::new("concept-0", "One", ""))
            .concept(Concept::new("concept-0", "Two", ""))
            .build()
            .unwrap_err();
        assert_eq!(err, CourseError::DuplicateConcept(UnitId::new("concept-0")));
    }

    #[test]
    fn manual_requirement_is_never_met() {
        assert!(!SectionRequirement::Manual.is_met(&CompletionSet::new()));
    }
}

//! Per-learner, per-course engine state.
//!
//! `ProgressSession` is the only owner of progress state and the only way to
//! mutate it. Every mutation returns the events it caused so the host can
//! render them and persist a fresh snapshot.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::achievements::AchievementEvaluator;
use crate::gate::{GateError, ProgressionGate};
use crate::model::{
    Achievement, AchievementId, Concept, ConceptStepper, CourseOutline, PhaseDefinition, PhaseId,
    ProgressSnapshot, SNAPSHOT_VERSION, SectionId, UnitId,
};
use crate::terminal::{CommandResult, TerminalSession};
use crate::time::Clock;
use crate::tracker::{ProgressSummary, ProgressTracker, SectionStatus, ToggleOutcome};
use crate::validator::{ValidationResult, validate_exercise};

//
// ─── EVENTS ────────────────────────────────────────────────────────────────────
//

/// Something the presentation layer may want to react to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    UnitCompleted(UnitId),
    UnitCleared(UnitId),
    /// Dependencies became met through unit changes; the completion action is unlocked.
    SectionReady(SectionId),
    /// The explicit completion action was taken for the first time.
    SectionCompleted(SectionId),
    PhaseCompleted(PhaseId),
    AchievementUnlocked(Achievement),
}

/// Result of toggling a unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitToggle {
    pub outcome: ToggleOutcome,
    pub events: Vec<ProgressEvent>,
}

/// Result of submitting code for an exercise.
#[derive(Debug, Clone, PartialEq)]
pub struct CodeSubmission {
    pub result: ValidationResult,
    /// True when the submission met the exercise's completion policy.
    pub accepted: bool,
    pub events: Vec<ProgressEvent>,
}

/// Result of running a terminal command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSubmission {
    pub result: CommandResult,
    pub events: Vec<ProgressEvent>,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone)]
pub struct ProgressSession {
    outline: Arc<CourseOutline>,
    tracker: ProgressTracker,
    achievements: AchievementEvaluator,
    gate: ProgressionGate,
    concepts: ConceptStepper,
    terminal: TerminalSession,
    clock: Clock,
}

impl ProgressSession {
    /// Empty progress at the first phase.
    #[must_use]
    pub fn new(outline: Arc<CourseOutline>, clock: Clock) -> Self {
        Self {
            tracker: ProgressTracker::new(Arc::clone(&outline)),
            achievements: AchievementEvaluator::new(Arc::clone(&outline)),
            gate: ProgressionGate::new(Arc::clone(&outline)),
            concepts: ConceptStepper::new(outline.concepts().len()),
            terminal: TerminalSession::new(),
            outline,
            clock,
        }
    }

    /// Rehydrates from a snapshot, or starts empty when there is none.
    #[must_use]
    pub fn restore(
        outline: Arc<CourseOutline>,
        snapshot: Option<ProgressSnapshot>,
        clock: Clock,
    ) -> Self {
        let Some(snapshot) = snapshot else {
            return Self::new(outline, clock);
        };
        let tracker = ProgressTracker::restore(
            Arc::clone(&outline),
            snapshot.completed_units,
            snapshot.completed_sections,
        );
        let achievements =
            AchievementEvaluator::restore(Arc::clone(&outline), snapshot.unlocked_achievements);
        let gate = ProgressionGate::restore(
            Arc::clone(&outline),
            &snapshot.current_phase,
            snapshot.completed_phases,
            &tracker,
        );
        let first_unread = outline
            .concepts()
            .iter()
            .position(|c| !tracker.is_unit_complete(&c.unit))
            .unwrap_or(usize::MAX);
        Self {
            concepts: ConceptStepper::at(outline.concepts().len(), first_unread),
            outline,
            tracker,
            achievements,
            gate,
            terminal: TerminalSession::new(),
            clock,
        }
    }

    /// Serializable picture of the current state.
    #[must_use]
    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            version: SNAPSHOT_VERSION,
            completed_units: self.tracker.persisted_units(),
            completed_sections: self.tracker.manually_completed_sections().cloned().collect(),
            unlocked_achievements: self.achievements.unlocked().to_vec(),
            current_phase: self.gate.current_phase().id.clone(),
            completed_phases: self.gate.completed_phases().cloned().collect(),
        }
    }

    #[must_use]
    pub fn outline(&self) -> &CourseOutline {
        &self.outline
    }

    #[must_use]
    pub fn tracker(&self) -> &ProgressTracker {
        &self.tracker
    }

    #[must_use]
    pub fn terminal(&self) -> &TerminalSession {
        &self.terminal
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    // ─── Units ─────────────────────────────────────────────────────────────────

    /// Flips a unit; unknown units change nothing and emit nothing.
    pub fn toggle_unit(&mut self, unit: &UnitId) -> UnitToggle {
        let ready_before = self.tracker.sections_with_met_dependencies();
        let outcome = self.tracker.toggle_unit(unit);
        let mut events = Vec::new();
        match outcome {
            ToggleOutcome::Completed => self.on_unit_added(unit, &mut events),
            ToggleOutcome::Cleared => events.push(ProgressEvent::UnitCleared(unit.clone())),
            ToggleOutcome::Unknown => return UnitToggle { outcome, events },
        }
        self.after_units_changed(&ready_before, &mut events);
        UnitToggle { outcome, events }
    }

    /// Sets a unit to the given membership (checkbox or quiz semantics).
    pub fn set_unit(&mut self, unit: &UnitId, done: bool) -> Vec<ProgressEvent> {
        let ready_before = self.tracker.sections_with_met_dependencies();
        let mut events = Vec::new();
        if done {
            if self.tracker.mark_unit(unit) {
                self.on_unit_added(unit, &mut events);
            }
        } else if self.tracker.clear_unit(unit) {
            events.push(ProgressEvent::UnitCleared(unit.clone()));
        }
        self.after_units_changed(&ready_before, &mut events);
        events
    }

    #[must_use]
    pub fn is_unit_complete(&self, unit: &UnitId) -> bool {
        self.tracker.is_unit_complete(unit)
    }

    // ─── Exercises ─────────────────────────────────────────────────────────────

    /// Validates `input` for the exercise completing `unit`.
    ///
    /// An accepted submission marks the unit done; a rejected one never clears
    /// it. Returns `None` if the outline has no such exercise.
    pub fn submit_code(&mut self, unit: &UnitId, input: &str) -> Option<CodeSubmission> {
        let exercise = self.outline.exercise(unit)?;
        let result = validate_exercise(input, exercise);
        let accepted = result.meets(exercise.policy());
        let events = if accepted {
            self.set_unit(unit, true)
        } else {
            Vec::new()
        };
        Some(CodeSubmission {
            result,
            accepted,
            events,
        })
    }

    /// Runs `command` through the course's command table.
    ///
    /// Blank commands are ignored. A clear command truncates the terminal log
    /// but leaves completed exercises alone.
    pub fn run_command(&mut self, command: &str) -> Option<CommandSubmission> {
        let now = self.clock.now();
        let result = self
            .outline
            .commands()
            .execute(command, &mut self.terminal, now)?;
        let events = match &result.satisfies {
            Some(unit) => self.set_unit(unit, true),
            None => Vec::new(),
        };
        Some(CommandSubmission { result, events })
    }

    pub fn set_terminal_input(&mut self, input: impl Into<String>) {
        self.terminal.set_input(input);
    }

    /// Runs the pending terminal input.
    pub fn submit_terminal_input(&mut self) -> Option<CommandSubmission> {
        let command = self.terminal.input().to_string();
        self.run_command(&command)
    }

    // ─── Concepts ──────────────────────────────────────────────────────────────

    /// Concept on screen, or `None` when the course has no walkthrough.
    #[must_use]
    pub fn current_concept(&self) -> Option<&Concept> {
        self.outline.concepts().get(self.concepts.current())
    }

    #[must_use]
    pub fn concept_index(&self) -> usize {
        self.concepts.current()
    }

    /// Marks the current concept read and moves to the next one.
    ///
    /// On the last concept the position stays put.
    pub fn next_concept(&mut self) -> Vec<ProgressEvent> {
        let Some(read) = self.concepts.forward() else {
            return Vec::new();
        };
        let Some(unit) = self.outline.concepts().get(read).map(|c| c.unit.clone()) else {
            return Vec::new();
        };
        self.set_unit(&unit, true)
    }

    /// Moves back one concept; false at the first one.
    pub fn previous_concept(&mut self) -> bool {
        self.concepts.back()
    }

    #[must_use]
    pub fn completed_concepts(&self) -> usize {
        self.outline
            .concepts()
            .iter()
            .filter(|c| self.tracker.is_unit_complete(&c.unit))
            .count()
    }

    #[must_use]
    pub fn all_concepts_completed(&self) -> bool {
        !self.outline.concepts().is_empty()
            && self.completed_concepts() == self.outline.concepts().len()
    }

    // ─── Sections ──────────────────────────────────────────────────────────────

    #[must_use]
    pub fn section_status(&self, section: &SectionId) -> Option<SectionStatus> {
        self.tracker.section_status(section)
    }

    #[must_use]
    pub fn is_section_complete(&self, section: &SectionId) -> bool {
        self.tracker.is_section_complete(section)
    }

    /// Explicit completion action.
    ///
    /// Emits `SectionCompleted` once per section; repeated calls are a no-op.
    pub fn complete_section(&mut self, section: &SectionId) -> Vec<ProgressEvent> {
        let mut events = Vec::new();
        if !self.tracker.complete_section(section) {
            return events;
        }
        events.push(ProgressEvent::SectionCompleted(section.clone()));
        if let Some(phase) = self.gate.record_section_completed(section) {
            events.push(ProgressEvent::PhaseCompleted(phase));
        }
        self.sync_phases(&mut events);
        events
    }

    /// Marks every unit the section names, then completes it.
    pub fn complete_section_filling_units(&mut self, section: &SectionId) -> Vec<ProgressEvent> {
        if self.outline.section(section).is_none() {
            return Vec::new();
        }
        let ready_before = self.tracker.sections_with_met_dependencies();
        let mut events = Vec::new();
        for unit in self.tracker.fill_section_units(section) {
            self.on_unit_added(&unit, &mut events);
        }
        self.after_units_changed(&ready_before, &mut events);
        events.extend(self.complete_section(section));
        events
    }

    #[must_use]
    pub fn summary(&self) -> ProgressSummary {
        self.tracker.summary()
    }

    // ─── Achievements ──────────────────────────────────────────────────────────

    #[must_use]
    pub fn unlocked_achievements(&self) -> &[AchievementId] {
        self.achievements.unlocked()
    }

    #[must_use]
    pub fn locked_achievements(&self) -> Vec<&Achievement> {
        self.achievements.locked()
    }

    // ─── Phases ────────────────────────────────────────────────────────────────

    #[must_use]
    pub fn current_phase(&self) -> &PhaseDefinition {
        self.gate.current_phase()
    }

    #[must_use]
    pub fn can_advance_to(&self, index: usize) -> bool {
        self.gate.can_advance_to(index)
    }

    #[must_use]
    pub fn is_phase_completed(&self, phase: &PhaseId) -> bool {
        self.gate.is_phase_completed(phase)
    }

    /// Moves to the next phase.
    ///
    /// # Errors
    ///
    /// Returns `GateError` when the current phase is unfinished or is the last one.
    pub fn advance(&mut self) -> Result<PhaseId, GateError> {
        self.gate.advance(&self.tracker)
    }

    /// Navigates to an already reachable phase.
    ///
    /// # Errors
    ///
    /// Returns `GateError` for unknown or locked phases.
    pub fn go_to(&mut self, phase: &PhaseId) -> Result<(), GateError> {
        self.gate.go_to(phase)
    }

    // ─── Internals ─────────────────────────────────────────────────────────────

    fn on_unit_added(&mut self, unit: &UnitId, events: &mut Vec<ProgressEvent>) {
        events.push(ProgressEvent::UnitCompleted(unit.clone()));
        events.extend(
            self.achievements
                .on_unit_completed(unit)
                .into_iter()
                .map(ProgressEvent::AchievementUnlocked),
        );
    }

    fn after_units_changed(
        &mut self,
        ready_before: &BTreeSet<SectionId>,
        events: &mut Vec<ProgressEvent>,
    ) {
        for section in self.tracker.ready_sections() {
            if !ready_before.contains(&section) {
                events.push(ProgressEvent::SectionReady(section));
            }
        }
        self.sync_phases(events);
    }

    fn sync_phases(&mut self, events: &mut Vec<ProgressEvent>) {
        events.extend(
            self.gate
                .sync_with(&self.tracker)
                .into_iter()
                .map(ProgressEvent::PhaseCompleted),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        CodeExercise, CommandEntry, CommandPattern, CommandTable, SectionDefinition,
        SectionRequirement, ValidationRule,
    };
    use crate::time::fixed_clock;

    fn outline() -> Arc<CourseOutline> {
        let commands = CommandTable::new()
            .for_program("git")
            .entry(CommandEntry::exact("git init", "Initialized empty Git repository").satisfies("ex1"))
            .entry(
                CommandEntry::new(
                    CommandPattern::QuotedArgument {
                        prefix: "git commit -m".into(),
                        missing: "error: switch `m' requires a value".into(),
                    },
                    "[main] {arg}",
                )
                .satisfies("ex2"),
            );
        Arc::new(
            CourseOutline::builder("demo", "Demo")
                .section(SectionDefinition::new(
                    "checklist",
                    "Checklist",
                    SectionRequirement::all_of(["a", "b", "c", "d"]),
                ))
                .section(SectionDefinition::new(
                    "terminal",
                    "Terminal",
                    SectionRequirement::all_of(["ex1", "ex2"]),
                ))
                .section(SectionDefinition::new("wrap-up", "Wrap up", SectionRequirement::Manual))
                .phase("p1", "One", "checklist")
                .phase("p2", "Two", "wrap-up")
                .exercise(CodeExercise::new(
                    "html-1",
                    "Heading",
                    vec![
                        ValidationRule::contains("h1", "<h1>", "Add a heading"),
                        ValidationRule::contains("p", "<p>", "Add a paragraph"),
                    ],
                ))
                .achievement(Achievement::new("first-commit", "First commit", "ex2"))
                .achievement(Achievement::new("checked-a", "Checked A", "a"))
                .commands(commands)
                .build()
                .unwrap(),
        )
    }

    fn session() -> ProgressSession {
        ProgressSession::new(outline(), fixed_clock())
    }

    fn unit(s: &str) -> UnitId {
        UnitId::new(s)
    }

    #[test]
    fn ready_is_visible_but_completion_waits_for_action() {
        let mut s = session();
        let checklist = SectionId::new("checklist");
        let mut all = Vec::new();
        for u in ["a", "b", "c", "d"] {
            all.extend(s.toggle_unit(&unit(u)).events);
        }
        assert!(s.is_section_complete(&checklist));
        assert!(s.section_status(&checklist).unwrap().is_ready());
        assert!(all.contains(&ProgressEvent::SectionReady(checklist.clone())));
        assert!(!all.contains(&ProgressEvent::SectionCompleted(checklist.clone())));

        let events = s.complete_section(&checklist);
        assert_eq!(events[0], ProgressEvent::SectionCompleted(checklist.clone()));
        assert!(s.complete_section(&checklist).is_empty());
    }

    #[test]
    fn achievement_fires_once_across_retoggles() {
        let mut s = session();
        let first = s.toggle_unit(&unit("a"));
        assert!(first
            .events
            .iter()
            .any(|e| matches!(e, ProgressEvent::AchievementUnlocked(a) if a.id.as_str() == "checked-a")));
        s.toggle_unit(&unit("a"));
        let again = s.toggle_unit(&unit("a"));
        assert!(!again
            .events
            .iter()
            .any(|e| matches!(e, ProgressEvent::AchievementUnlocked(_))));
        assert_eq!(s.unlocked_achievements(), &[AchievementId::new("checked-a")]);
    }

    #[test]
    fn terminal_commands_complete_exercises() {
        let mut s = session();
        let init = s.run_command("git init").unwrap();
        assert_eq!(init.result.output, "Initialized empty Git repository");
        assert!(s.is_unit_complete(&unit("ex1")));
        assert_eq!(init.events, vec![ProgressEvent::UnitCompleted(unit("ex1"))]);

        let missing = s.run_command("git commit -m").unwrap();
        assert!(missing.events.is_empty());
        assert!(!s.is_unit_complete(&unit("ex2")));

        let commit = s.run_command("git commit -m \"first\"").unwrap();
        assert!(commit.events.iter().any(|e| matches!(e, ProgressEvent::AchievementUnlocked(_))));
        assert!(commit
            .events
            .contains(&ProgressEvent::SectionReady(SectionId::new("terminal"))));
    }

    #[test]
    fn repeating_a_satisfying_command_does_not_uncomplete() {
        let mut s = session();
        s.run_command("git init");
        let again = s.run_command("git init").unwrap();
        assert!(again.events.is_empty());
        assert!(s.is_unit_complete(&unit("ex1")));
    }

    #[test]
    fn clear_keeps_completed_exercises() {
        let mut s = session();
        s.run_command("git init");
        s.run_command("clear");
        assert!(s.terminal().history().is_empty());
        assert!(s.is_unit_complete(&unit("ex1")));
    }

    #[test]
    fn code_submission_marks_exercise_when_accepted() {
        let mut s = session();
        let partial = s.submit_code(&unit("html-1"), "<h1>Hi</h1>").unwrap();
        assert!(!partial.accepted);
        assert!((partial.result.score() - 0.5).abs() < f64::EPSILON);
        assert!(!s.is_unit_complete(&unit("html-1")));

        let full = s
            .submit_code(&unit("html-1"), "<h1>Hi</h1>\n<p>There</p>")
            .unwrap();
        assert!(full.accepted);
        assert!(s.is_unit_complete(&unit("html-1")));

        let worse = s.submit_code(&unit("html-1"), "").unwrap();
        assert!(!worse.accepted);
        assert!(s.is_unit_complete(&unit("html-1")));
        assert!(s.submit_code(&unit("nope"), "x").is_none());
    }

    #[test]
    fn advance_waits_for_terminal_section() {
        let mut s = session();
        assert!(matches!(
            s.advance(),
            Err(GateError::TerminalSectionIncomplete { .. })
        ));
        let events = s.complete_section(&SectionId::new("checklist"));
        assert!(events.contains(&ProgressEvent::PhaseCompleted(PhaseId::new("p1"))));
        assert_eq!(s.advance().unwrap(), PhaseId::new("p2"));
        assert_eq!(s.current_phase().id, PhaseId::new("p2"));
    }

    #[test]
    fn snapshot_round_trips() {
        let mut s = session();
        s.toggle_unit(&unit("a"));
        s.run_command("git init");
        s.complete_section(&SectionId::new("checklist"));
        s.advance().unwrap();

        let snapshot = s.snapshot();
        let restored = ProgressSession::restore(outline(), Some(snapshot.clone()), fixed_clock());
        assert_eq!(restored.snapshot(), snapshot);
        assert_eq!(restored.current_phase().id, PhaseId::new("p2"));
        assert!(restored.is_section_complete(&SectionId::new("checklist")));
    }

    #[test]
    fn restore_without_snapshot_is_empty() {
        let s = ProgressSession::restore(outline(), None, fixed_clock());
        assert_eq!(s.snapshot(), ProgressSnapshot::empty(PhaseId::new("p1")));
    }

    #[test]
    fn fill_and_complete_marks_units_first() {
        let mut s = session();
        let events = s.complete_section_filling_units(&SectionId::new("checklist"));
        assert!(s.is_unit_complete(&unit("d")));
        let completed_at = events
            .iter()
            .position(|e| e == &ProgressEvent::SectionCompleted(SectionId::new("checklist")))
            .unwrap();
        let unit_at = events
            .iter()
            .position(|e| e == &ProgressEvent::UnitCompleted(unit("a")))
            .unwrap();
        assert!(unit_at < completed_at);
    }

    #[test]
    fn set_unit_is_idempotent() {
        let mut s = session();
        assert_eq!(s.set_unit(&unit("b"), true).len(), 1);
        assert!(s.set_unit(&unit("b"), true).is_empty());
        assert_eq!(
            s.set_unit(&unit("b"), false),
            vec![ProgressEvent::UnitCleared(unit("b"))]
        );
        assert!(s.set_unit(&unit("b"), false).is_empty());
    }

    fn git_session() -> ProgressSession {
        let outline = Arc::new(crate::catalog::git_basics::course().unwrap());
        ProgressSession::new(outline, fixed_clock())
    }

    #[test]
    fn finishing_a_later_phase_first_does_not_open_the_one_after() {
        let mut s = git_session();
        let events = s.complete_section(&SectionId::new("concepts"));
        assert_eq!(
            events,
            vec![ProgressEvent::SectionCompleted(SectionId::new("concepts"))]
        );
        assert!(!s.is_phase_completed(&PhaseId::new("concepts")));
        assert_eq!(
            s.go_to(&PhaseId::new("getting-started")),
            Err(GateError::Locked(PhaseId::new("getting-started")))
        );
        assert_eq!(s.current_phase().id, PhaseId::new("setup"));

        let events = s.complete_section(&SectionId::new("section4"));
        assert!(events.contains(&ProgressEvent::PhaseCompleted(PhaseId::new("setup"))));
        assert!(events.contains(&ProgressEvent::PhaseCompleted(PhaseId::new("concepts"))));
        assert!(s.go_to(&PhaseId::new("getting-started")).is_ok());
    }

    #[test]
    fn restored_out_of_order_phases_stay_locked() {
        let outline = Arc::new(crate::catalog::git_basics::course().unwrap());
        let mut snapshot = ProgressSnapshot::empty(PhaseId::new("getting-started"));
        snapshot.completed_phases = vec![PhaseId::new("concepts")];
        let s = ProgressSession::restore(outline, Some(snapshot), fixed_clock());
        assert_eq!(s.current_phase().id, PhaseId::new("setup"));
        assert!(!s.is_phase_completed(&PhaseId::new("concepts")));
        assert!(!s.can_advance_to(2));
    }

    #[test]
    fn retired_command_units_do_not_count_after_restore() {
        let outline = Arc::new(crate::catalog::git_basics::course().unwrap());
        let mut snapshot = ProgressSnapshot::empty(PhaseId::new("setup"));
        snapshot.completed_units = [
            "cmd-legacy-a",
            "cmd-legacy-b",
            "cmd-legacy-c",
            "sequence-challenge",
        ]
        .into_iter()
        .map(UnitId::new)
        .collect();
        let mut s = ProgressSession::restore(outline, Some(snapshot.clone()), fixed_clock());
        let commands = SectionId::new("section2");
        assert!(!s.section_status(&commands).unwrap().dependencies_met);
        assert_eq!(s.toggle_unit(&unit("cmd-legacy-a")).outcome, ToggleOutcome::Unknown);
        assert_eq!(s.snapshot().completed_units, snapshot.completed_units);
    }

    #[test]
    fn concept_walkthrough_completes_its_section() {
        let mut s = git_session();
        assert_eq!(s.concept_index(), 0);
        assert_eq!(s.current_concept().unwrap().title, "What is HTML?");
        assert!(!s.previous_concept());

        let events = s.next_concept();
        assert_eq!(events, vec![ProgressEvent::UnitCompleted(unit("concept-0"))]);
        assert_eq!(s.concept_index(), 1);
        assert!(s.previous_concept());
        assert_eq!(s.concept_index(), 0);
        assert!(s.next_concept().is_empty());

        let mut all = Vec::new();
        while !s.all_concepts_completed() {
            all.extend(s.next_concept());
        }
        assert_eq!(s.completed_concepts(), 5);
        assert_eq!(s.concept_index(), 4);
        assert!(all.contains(&ProgressEvent::SectionReady(SectionId::new("concepts"))));
        assert!(s.next_concept().is_empty());
        assert_eq!(s.concept_index(), 4);
    }

    #[test]
    fn restore_resumes_at_the_first_unread_concept() {
        let mut s = git_session();
        s.next_concept();
        s.next_concept();
        let outline = Arc::new(crate::catalog::git_basics::course().unwrap());
        let restored = ProgressSession::restore(outline, Some(s.snapshot()), fixed_clock());
        assert_eq!(restored.concept_index(), 2);
        assert_eq!(restored.completed_concepts(), 2);
    }
}

//! Strictly ordered phase progression.
//!
//! Phase `k + 1` is reachable iff phase `k` is in the completed set. Moving
//! back to (or between) reachable phases is always allowed.

use std::collections::BTreeSet;
use std::sync::Arc;

use thiserror::Error;

use crate::model::{CourseOutline, PhaseDefinition, PhaseId, SectionId};
use crate::tracker::ProgressTracker;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum GateError {
    #[error("phase {phase} is not finished: section {section} is incomplete")]
    TerminalSectionIncomplete { phase: PhaseId, section: SectionId },

    #[error("phase {0} is the last phase")]
    NoNextPhase(PhaseId),

    #[error("phase {0} is locked")]
    Locked(PhaseId),

    #[error("unknown phase: {0}")]
    UnknownPhase(PhaseId),
}

#[derive(Debug, Clone)]
pub struct ProgressionGate {
    outline: Arc<CourseOutline>,
    current: usize,
    completed: BTreeSet<PhaseId>,
}

impl ProgressionGate {
    #[must_use]
    pub fn new(outline: Arc<CourseOutline>) -> Self {
        Self {
            outline,
            current: 0,
            completed: BTreeSet::new(),
        }
    }

    /// Rehydrates the gate.
    ///
    /// Persisted completed phases are kept only as far as they form an
    /// unbroken run from the first phase; the tracker then extends that run.
    /// An unknown or unreachable current phase falls back to the furthest
    /// reachable phase before it.
    #[must_use]
    pub fn restore<I>(
        outline: Arc<CourseOutline>,
        current: &PhaseId,
        completed: I,
        tracker: &ProgressTracker,
    ) -> Self
    where
        I: IntoIterator<Item = PhaseId>,
    {
        let persisted: BTreeSet<PhaseId> = completed.into_iter().collect();
        let mut gate = Self::new(outline);
        let in_order: Vec<PhaseId> = gate
            .outline
            .phases()
            .iter()
            .map(|p| p.id.clone())
            .take_while(|id| persisted.contains(id))
            .collect();
        gate.completed.extend(in_order);
        gate.sync_with(tracker);
        let wanted = gate.outline.phase_index(current).unwrap_or(0);
        gate.current = (0..=wanted)
            .rev()
            .find(|idx| gate.can_advance_to(*idx))
            .unwrap_or(0);
        gate
    }

    /// Records phases in outline order while their terminal sections are
    /// complete, stopping at the first one that is not; returns the newly
    /// recorded ones.
    pub fn sync_with(&mut self, tracker: &ProgressTracker) -> Vec<PhaseId> {
        let mut newly = Vec::new();
        for phase in self.outline.phases() {
            if self.completed.contains(&phase.id) {
                continue;
            }
            if !tracker.is_section_complete(&phase.terminal_section) {
                break;
            }
            newly.push(phase.id.clone());
        }
        self.completed.extend(newly.iter().cloned());
        newly
    }

    /// Records the phase ended by `section`; returns it when newly completed.
    ///
    /// Refused while any earlier phase is still open.
    pub fn record_section_completed(&mut self, section: &SectionId) -> Option<PhaseId> {
        let phase = self.outline.phase_ending_with(section)?;
        let index = self.outline.phase_index(&phase.id)?;
        if !self.earlier_phases_completed(index) {
            return None;
        }
        if self.completed.insert(phase.id.clone()) {
            Some(phase.id.clone())
        } else {
            None
        }
    }

    fn earlier_phases_completed(&self, index: usize) -> bool {
        self.outline.phases()[..index]
            .iter()
            .all(|p| self.completed.contains(&p.id))
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    /// Outlines always have at least one phase and `current` stays in range.
    #[must_use]
    pub fn current_phase(&self) -> &PhaseDefinition {
        &self.outline.phases()[self.current]
    }

    #[must_use]
    pub fn is_phase_completed(&self, phase: &PhaseId) -> bool {
        self.completed.contains(phase)
    }

    pub fn completed_phases(&self) -> impl Iterator<Item = &PhaseId> {
        self.completed.iter()
    }

    /// True iff `index` is a phase and every phase before it gates it open.
    #[must_use]
    pub fn can_advance_to(&self, index: usize) -> bool {
        let phases = self.outline.phases();
        if index >= phases.len() {
            return false;
        }
        index == 0 || self.completed.contains(&phases[index - 1].id)
    }

    /// Moves to the next phase once the current phase's terminal section is complete.
    ///
    /// Completing the current phase is recorded even when there is no next phase.
    ///
    /// # Errors
    ///
    /// Returns `GateError::TerminalSectionIncomplete` if the terminal section is not
    /// complete, or `GateError::NoNextPhase` from the last phase.
    pub fn advance(&mut self, tracker: &ProgressTracker) -> Result<PhaseId, GateError> {
        let phase = self.current_phase().clone();
        if !tracker.is_section_complete(&phase.terminal_section) {
            return Err(GateError::TerminalSectionIncomplete {
                phase: phase.id,
                section: phase.terminal_section,
            });
        }
        self.completed.insert(phase.id.clone());
        let next = self.current + 1;
        if !self.can_advance_to(next) {
            return Err(GateError::NoNextPhase(phase.id));
        }
        self.current = next;
        Ok(self.current_phase().id.clone())
    }

    /// Jumps to any reachable phase (backward or lateral).
    ///
    /// # Errors
    ///
    /// Returns `GateError::UnknownPhase` or `GateError::Locked`.
    pub fn go_to(&mut self, phase: &PhaseId) -> Result<(), GateError> {
        let index = self
            .outline
            .phase_index(phase)
            .ok_or_else(|| GateError::UnknownPhase(phase.clone()))?;
        if !self.can_advance_to(index) {
            return Err(GateError::Locked(phase.clone()));
        }
        self.current = index;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{SectionDefinition, SectionRequirement, UnitId};

    fn outline() -> Arc<CourseOutline> {
        Arc::new(
            CourseOutline::builder("demo", "Demo")
                .section(SectionDefinition::new(
                    "s1",
                    "One",
                    SectionRequirement::all_of(["a"]),
                ))
                .section(SectionDefinition::new("s2", "Two", SectionRequirement::Manual))
                .section(SectionDefinition::new("s3", "Three", SectionRequirement::Manual))
                .phase("p1", "Phase 1", "s1")
                .phase("p2", "Phase 2", "s2")
                .phase("p3", "Phase 3", "s3")
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn advance_requires_terminal_section() {
        let outline = outline();
        let mut tracker = ProgressTracker::new(Arc::clone(&outline));
        let mut gate = ProgressionGate::new(outline);

        let err = gate.advance(&tracker).unwrap_err();
        assert_eq!(
            err,
            GateError::TerminalSectionIncomplete {
                phase: PhaseId::new("p1"),
                section: SectionId::new("s1"),
            }
        );
        assert_eq!(gate.current_index(), 0);

        tracker.complete_section(&SectionId::new("s1"));
        assert_eq!(gate.advance(&tracker).unwrap(), PhaseId::new("p2"));
        assert!(gate.is_phase_completed(&PhaseId::new("p1")));
    }

    #[test]
    fn dependency_completion_also_opens_the_gate() {
        let outline = outline();
        let mut tracker = ProgressTracker::new(Arc::clone(&outline));
        let mut gate = ProgressionGate::new(outline);
        tracker.toggle_unit(&UnitId::new("a"));
        assert_eq!(gate.advance(&tracker).unwrap(), PhaseId::new("p2"));
    }

    #[test]
    fn cannot_skip_ahead() {
        let outline = outline();
        let mut gate = ProgressionGate::new(outline);
        assert!(gate.can_advance_to(0));
        for k in 0..3 {
            assert!(!gate.can_advance_to(k + 1));
        }
        assert_eq!(
            gate.go_to(&PhaseId::new("p3")),
            Err(GateError::Locked(PhaseId::new("p3")))
        );
        assert_eq!(
            gate.go_to(&PhaseId::new("nope")),
            Err(GateError::UnknownPhase(PhaseId::new("nope")))
        );
    }

    #[test]
    fn backward_navigation_is_always_allowed() {
        let outline = outline();
        let mut tracker = ProgressTracker::new(Arc::clone(&outline));
        let mut gate = ProgressionGate::new(outline);
        tracker.complete_section(&SectionId::new("s1"));
        gate.advance(&tracker).unwrap();
        gate.go_to(&PhaseId::new("p1")).unwrap();
        assert_eq!(gate.current_index(), 0);
        gate.go_to(&PhaseId::new("p2")).unwrap();
        assert_eq!(gate.current_index(), 1);
    }

    #[test]
    fn last_phase_reports_no_next() {
        let outline = outline();
        let mut tracker = ProgressTracker::new(Arc::clone(&outline));
        let mut gate = ProgressionGate::new(outline);
        for s in ["s1", "s2", "s3"] {
            tracker.complete_section(&SectionId::new(s));
        }
        gate.advance(&tracker).unwrap();
        gate.advance(&tracker).unwrap();
        assert_eq!(
            gate.advance(&tracker),
            Err(GateError::NoNextPhase(PhaseId::new("p3")))
        );
        assert!(gate.is_phase_completed(&PhaseId::new("p3")));
    }

    #[test]
    fn restore_clamps_unreachable_current_phase() {
        let outline = outline();
        let tracker = ProgressTracker::new(Arc::clone(&outline));
        let gate = ProgressionGate::restore(
            Arc::clone(&outline),
            &PhaseId::new("p3"),
            [PhaseId::new("p1")],
            &tracker,
        );
        assert_eq!(gate.current_index(), 1);

        let unknown = ProgressionGate::restore(outline, &PhaseId::new("gone"), [], &tracker);
        assert_eq!(unknown.current_index(), 0);
    }

    #[test]
    fn record_section_completed_is_once() {
        let mut gate = ProgressionGate::new(outline());
        assert_eq!(
            gate.record_section_completed(&SectionId::new("s1")),
            Some(PhaseId::new("p1"))
        );
        assert_eq!(gate.record_section_completed(&SectionId::new("s1")), None);
        assert_eq!(gate.record_section_completed(&SectionId::new("other")), None);
    }

    #[test]
    fn later_sections_do_not_record_phases_out_of_order() {
        let outline = outline();
        let mut tracker = ProgressTracker::new(Arc::clone(&outline));
        let mut gate = ProgressionGate::new(outline);

        tracker.complete_section(&SectionId::new("s2"));
        assert_eq!(gate.record_section_completed(&SectionId::new("s2")), None);
        assert!(gate.sync_with(&tracker).is_empty());
        assert!(!gate.is_phase_completed(&PhaseId::new("p2")));
        assert_eq!(
            gate.go_to(&PhaseId::new("p3")),
            Err(GateError::Locked(PhaseId::new("p3")))
        );

        tracker.toggle_unit(&UnitId::new("a"));
        assert_eq!(
            gate.sync_with(&tracker),
            vec![PhaseId::new("p1"), PhaseId::new("p2")]
        );
        assert!(gate.can_advance_to(2));
    }

    #[test]
    fn restore_drops_phases_recorded_out_of_order() {
        let outline = outline();
        let tracker = ProgressTracker::new(Arc::clone(&outline));
        let gate = ProgressionGate::restore(
            outline,
            &PhaseId::new("p3"),
            [PhaseId::new("p2")],
            &tracker,
        );
        assert_eq!(gate.completed_phases().count(), 0);
        assert_eq!(gate.current_index(), 0);
        assert!(!gate.can_advance_to(2));
    }
}

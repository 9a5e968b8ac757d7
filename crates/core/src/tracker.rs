//! Completion state machine over units and sections.
//!
//! Section completion is two independent flags combined by OR:
//! `dependencies_met` (derived from units on demand) and `manually_completed`
//! (set only by the explicit completion action, never reverted).

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::model::{CompletionSet, CourseOutline, SectionId, SectionRequirement, UnitId};

//
// ─── OUTCOMES ──────────────────────────────────────────────────────────────────
//

/// Result of toggling a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Completed,
    Cleared,
    /// The outline does not define the unit; nothing changed.
    Unknown,
}

impl ToggleOutcome {
    /// Membership of the unit after the toggle.
    #[must_use]
    pub fn is_member(self) -> bool {
        matches!(self, ToggleOutcome::Completed)
    }
}

/// Both completion paths of a section, kept apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionStatus {
    pub dependencies_met: bool,
    pub manually_completed: bool,
}

impl SectionStatus {
    #[must_use]
    pub fn is_complete(self) -> bool {
        self.dependencies_met || self.manually_completed
    }

    /// Dependencies met, completion action not taken yet.
    #[must_use]
    pub fn is_ready(self) -> bool {
        self.dependencies_met && !self.manually_completed
    }
}

/// Course-level progress numbers for dashboards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressSummary {
    pub completed_sections: usize,
    pub total_sections: usize,
    pub percent: u8,
    /// First section, in outline order, that is not complete.
    pub next_section: Option<SectionId>,
}

//
// ─── TRACKER ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone)]
pub struct ProgressTracker {
    outline: Arc<CourseOutline>,
    completed: CompletionSet,
    /// Restored unit ids the outline does not define; carried, never evaluated.
    retained: BTreeSet<UnitId>,
    manual: BTreeSet<SectionId>,
}

impl ProgressTracker {
    #[must_use]
    pub fn new(outline: Arc<CourseOutline>) -> Self {
        Self {
            outline,
            completed: CompletionSet::new(),
            retained: BTreeSet::new(),
            manual: BTreeSet::new(),
        }
    }

    /// Rehydrates persisted state.
    ///
    /// Unit ids the outline no longer defines are set aside so that a round
    /// trip stays lossless; they never count toward derived completion.
    #[must_use]
    pub fn restore<U, S>(outline: Arc<CourseOutline>, units: U, sections: S) -> Self
    where
        U: IntoIterator<Item = UnitId>,
        S: IntoIterator<Item = SectionId>,
    {
        let (known, retained): (Vec<UnitId>, Vec<UnitId>) = units
            .into_iter()
            .partition(|unit| outline.is_known_unit(unit));
        Self {
            completed: known.into_iter().collect(),
            retained: retained.into_iter().collect(),
            manual: sections.into_iter().collect(),
            outline,
        }
    }

    #[must_use]
    pub fn outline(&self) -> &CourseOutline {
        &self.outline
    }

    #[must_use]
    pub fn completed_units(&self) -> &CompletionSet {
        &self.completed
    }

    /// Restored unit ids the outline does not define.
    pub fn retained_units(&self) -> impl Iterator<Item = &UnitId> {
        self.retained.iter()
    }

    /// Completed and retained unit ids together, sorted, for persistence.
    #[must_use]
    pub fn persisted_units(&self) -> Vec<UnitId> {
        let all: BTreeSet<&UnitId> = self.completed.iter().chain(&self.retained).collect();
        all.into_iter().cloned().collect()
    }

    /// Sections carrying the manual completion flag.
    pub fn manually_completed_sections(&self) -> impl Iterator<Item = &SectionId> {
        self.manual.iter()
    }

    #[must_use]
    pub fn is_unit_complete(&self, unit: &UnitId) -> bool {
        self.completed.contains(unit)
    }

    /// Flips membership of a defined unit.
    ///
    /// Toggling twice restores the original state. Unknown units are a no-op.
    pub fn toggle_unit(&mut self, unit: &UnitId) -> ToggleOutcome {
        if !self.outline.is_known_unit(unit) {
            return ToggleOutcome::Unknown;
        }
        if self.completed.toggle(unit) {
            ToggleOutcome::Completed
        } else {
            ToggleOutcome::Cleared
        }
    }

    /// Set-to-true for a defined unit; returns true only if it was newly added.
    pub fn mark_unit(&mut self, unit: &UnitId) -> bool {
        self.outline.is_known_unit(unit) && self.completed.insert(unit.clone())
    }

    /// Set-to-false for a unit; returns true only if it was present.
    pub fn clear_unit(&mut self, unit: &UnitId) -> bool {
        self.outline.is_known_unit(unit) && self.completed.remove(unit)
    }

    /// Both completion flags of a defined section.
    #[must_use]
    pub fn section_status(&self, section: &SectionId) -> Option<SectionStatus> {
        let definition = self.outline.section(section)?;
        Some(SectionStatus {
            dependencies_met: definition.requirement.is_met(&self.completed),
            manually_completed: self.manual.contains(section),
        })
    }

    /// `manually_completed OR dependencies_met`, recomputed on every call.
    #[must_use]
    pub fn is_section_complete(&self, section: &SectionId) -> bool {
        self.section_status(section)
            .is_some_and(SectionStatus::is_complete)
    }

    /// Sets the manual completion flag.
    ///
    /// Returns true only on the first transition of the flag; repeated calls
    /// and unknown sections are a no-op.
    pub fn complete_section(&mut self, section: &SectionId) -> bool {
        if self.outline.section(section).is_none() {
            return false;
        }
        self.manual.insert(section.clone())
    }

    /// Marks every unit the section names, returning those newly added.
    ///
    /// The completion flag itself is left to `complete_section`.
    pub fn fill_section_units(&mut self, section: &SectionId) -> Vec<UnitId> {
        let Some(definition) = self.outline.section(section) else {
            return Vec::new();
        };
        let names: Vec<UnitId> = match &definition.requirement {
            SectionRequirement::Checklist(items) => items
                .iter()
                .flat_map(|item| item.deps.iter().chain(std::iter::once(&item.unit)))
                .cloned()
                .collect(),
            other => other.named_units().into_iter().cloned().collect(),
        };
        names
            .into_iter()
            .filter(|unit| self.completed.insert(unit.clone()))
            .collect()
    }

    /// Sections whose dependency predicate currently holds.
    #[must_use]
    pub fn sections_with_met_dependencies(&self) -> BTreeSet<SectionId> {
        self.outline
            .sections()
            .iter()
            .filter(|s| s.requirement.is_met(&self.completed))
            .map(|s| s.id.clone())
            .collect()
    }

    /// Sections whose completion action is unlocked but not yet taken.
    #[must_use]
    pub fn ready_sections(&self) -> Vec<SectionId> {
        self.outline
            .sections()
            .iter()
            .filter(|s| !self.manual.contains(&s.id) && s.requirement.is_met(&self.completed))
            .map(|s| s.id.clone())
            .collect()
    }

    #[must_use]
    pub fn summary(&self) -> ProgressSummary {
        let sections = self.outline.sections();
        let completed_sections = sections
            .iter()
            .filter(|s| self.is_section_complete(&s.id))
            .count();
        let next_section = sections
            .iter()
            .find(|s| !self.is_section_complete(&s.id))
            .map(|s| s.id.clone());
        let percent = if sections.is_empty() {
            100
        } else {
            let rounded = (completed_sections * 100 + sections.len() / 2) / sections.len();
            u8::try_from(rounded).unwrap_or(100)
        };
        ProgressSummary {
            completed_sections,
            total_sections: sections.len(),
            percent,
            next_section,
        }
    }
}

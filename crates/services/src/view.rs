use serde::Serialize;

use lesson_core::ProgressSession;
use lesson_core::model::{AchievementId, CourseId, PhaseId, SectionId, UnitId};

/// Presentation-agnostic picture of a lesson session.
///
/// This is intentionally **not** a UI view-model: no pre-formatted strings,
/// only ids, titles, and flags the host renders as it likes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonView {
    pub course: CourseId,
    pub title: String,
    pub phases: Vec<PhaseView>,
    pub sections: Vec<SectionView>,
    pub achievements: Vec<AchievementView>,
    pub concepts: Vec<ConceptView>,
    pub completed_sections: usize,
    pub total_sections: usize,
    pub percent: u8,
    pub next_section: Option<SectionId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseView {
    pub id: PhaseId,
    pub title: String,
    pub current: bool,
    pub completed: bool,
    pub reachable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionView {
    pub id: SectionId,
    pub title: String,
    pub dependencies_met: bool,
    pub manually_completed: bool,
    pub complete: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConceptView {
    pub unit: UnitId,
    pub title: String,
    pub subtitle: String,
    pub key_points: Vec<String>,
    pub current: bool,
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementView {
    pub id: AchievementId,
    pub title: String,
    pub description: String,
    pub unlocked: bool,
}

impl LessonView {
    #[must_use]
    pub fn from_session(session: &ProgressSession) -> Self {
        let outline = session.outline();
        let current = &session.current_phase().id;
        let phases = outline
            .phases()
            .iter()
            .enumerate()
            .map(|(idx, phase)| PhaseView {
                id: phase.id.clone(),
                title: phase.title.clone(),
                current: &phase.id == current,
                completed: session.is_phase_completed(&phase.id),
                reachable: session.can_advance_to(idx),
            })
            .collect();
        let sections = outline
            .sections()
            .iter()
            .filter_map(|section| {
                let status = session.section_status(&section.id)?;
                Some(SectionView {
                    id: section.id.clone(),
                    title: section.title.clone(),
                    dependencies_met: status.dependencies_met,
                    manually_completed: status.manually_completed,
                    complete: status.is_complete(),
                })
            })
            .collect();
        let unlocked = session.unlocked_achievements();
        let achievements = outline
            .achievements()
            .iter()
            .map(|achievement| AchievementView {
                id: achievement.id.clone(),
                title: achievement.title.clone(),
                description: achievement.description.clone(),
                unlocked: unlocked.contains(&achievement.id),
            })
            .collect();
        let concepts = outline
            .concepts()
            .iter()
            .enumerate()
            .map(|(idx, concept)| ConceptView {
                unit: concept.unit.clone(),
                title: concept.title.clone(),
                subtitle: concept.subtitle.clone(),
                key_points: concept.key_points.clone(),
                current: idx == session.concept_index(),
                completed: session.is_unit_complete(&concept.unit),
            })
            .collect();
        let summary = session.summary();

        Self {
            course: outline.id().clone(),
            title: outline.title().to_string(),
            phases,
            sections,
            achievements,
            concepts,
            completed_sections: summary.completed_sections,
            total_sections: summary.total_sections,
            percent: summary.percent,
            next_section: summary.next_section,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lesson_core::catalog::git_basics;
    use lesson_core::time::fixed_clock;
    use std::sync::Arc;

    #[test]
    fn view_tracks_both_completion_flags() {
        let outline = Arc::new(git_basics::course().unwrap());
        let mut session = ProgressSession::new(outline, fixed_clock());
        for unit in ["section1-0", "section1-1", "section1-2", "section1-3"] {
            session.toggle_unit(&UnitId::new(unit));
        }

        let view = LessonView::from_session(&session);
        let section = view
            .sections
            .iter()
            .find(|s| s.id.as_str() == "section1")
            .unwrap();
        assert!(section.dependencies_met);
        assert!(!section.manually_completed);
        assert!(section.complete);
        assert_eq!(view.completed_sections, 1);
        assert_eq!(view.next_section, Some(SectionId::new("section0")));
        assert!(view.phases[0].current && view.phases[0].reachable);
        assert!(!view.phases[1].reachable);
    }

    #[test]
    fn serializes_camel_case() {
        let outline = Arc::new(git_basics::course().unwrap());
        let session = ProgressSession::new(outline, fixed_clock());
        let json = serde_json::to_value(LessonView::from_session(&session)).unwrap();
        assert_eq!(json["course"], "git-basics");
        assert_eq!(json["totalSections"], 7);
        assert_eq!(json["sections"][0]["dependenciesMet"], false);
        assert_eq!(json["concepts"][0]["keyPoints"].as_array().unwrap().len(), 4);
    }

    #[test]
    fn concepts_track_reading_position() {
        let outline = Arc::new(git_basics::course().unwrap());
        let mut session = ProgressSession::new(outline, fixed_clock());
        session.next_concept();

        let view = LessonView::from_session(&session);
        assert!(view.concepts[0].completed && !view.concepts[0].current);
        assert!(view.concepts[1].current && !view.concepts[1].completed);
    }
}

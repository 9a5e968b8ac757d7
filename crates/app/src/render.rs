use std::fmt::Write as _;

use lesson_core::model::SequenceExercise;
use lesson_core::{GateError, ProgressEvent, ToggleOutcome, ValidationResult};
use services::{ConceptView, LessonView};

fn mark(done: bool) -> &'static str {
    if done { "[x]" } else { "[ ]" }
}

pub fn view(view: &LessonView) -> String {
    let mut out = format!(
        "{} ({}% of sections, {}/{})\n",
        view.title, view.percent, view.completed_sections, view.total_sections
    );

    out.push_str("\nPhases:\n");
    for phase in &view.phases {
        let state = match (phase.current, phase.completed, phase.reachable) {
            (true, _, _) => "<- you are here",
            (false, true, _) => "done",
            (false, false, true) => "open",
            (false, false, false) => "locked",
        };
        let _ = writeln!(out, "  {} {:<16} {state}", mark(phase.completed), phase.id);
    }

    out.push_str("\nSections:\n");
    for section in &view.sections {
        let note = if section.manually_completed {
            ""
        } else if section.dependencies_met {
            " (ready: `complete` it)"
        } else {
            ""
        };
        let _ = writeln!(
            out,
            "  {} {:<14} {}{note}",
            mark(section.complete),
            section.id,
            section.title
        );
    }

    let unlocked: Vec<_> = view.achievements.iter().filter(|a| a.unlocked).collect();
    let _ = writeln!(
        out,
        "\nAchievements: {}/{}",
        unlocked.len(),
        view.achievements.len()
    );
    for achievement in unlocked {
        let _ = writeln!(out, "  * {}: {}", achievement.title, achievement.description);
    }

    if let Some(next) = &view.next_section {
        let _ = write!(out, "\nNext up: {next}");
    }
    out.trim_end().to_string()
}

/// The concept marked current, with reading progress.
pub fn concept(view: &LessonView) -> String {
    let Some((idx, concept)) = view
        .concepts
        .iter()
        .enumerate()
        .find(|(_, c)| c.current)
    else {
        return "this course has no concepts".to_string();
    };
    let read = view.concepts.iter().filter(|c| c.completed).count();
    let mut out = format!(
        "Concept {}/{}: {} {}\n{}",
        idx + 1,
        view.concepts.len(),
        concept.title,
        mark(concept.completed),
        concept.subtitle
    );
    for point in &concept.key_points {
        let _ = write!(out, "\n  - {point}");
    }
    let _ = write!(out, "\n({read}/{} read{})", view.concepts.len(), all_read(&view.concepts));
    out
}

fn all_read(concepts: &[ConceptView]) -> &'static str {
    if concepts.iter().all(|c| c.completed) {
        ", all done"
    } else {
        ""
    }
}

pub fn event(event: &ProgressEvent) -> String {
    match event {
        ProgressEvent::UnitCompleted(unit) => format!("+ {unit} done"),
        ProgressEvent::UnitCleared(unit) => format!("- {unit} cleared"),
        ProgressEvent::SectionReady(section) => {
            format!("> section {section} is ready to complete")
        }
        ProgressEvent::SectionCompleted(section) => format!("> section {section} completed"),
        ProgressEvent::PhaseCompleted(phase) => format!("> phase {phase} finished"),
        ProgressEvent::AchievementUnlocked(achievement) => {
            format!("* achievement unlocked: {}", achievement.title)
        }
    }
}

pub fn events(events: &[ProgressEvent]) -> String {
    events.iter().map(event).collect::<Vec<_>>().join("\n")
}

pub fn toggle(unit: &str, outcome: ToggleOutcome) -> Option<String> {
    match outcome {
        ToggleOutcome::Unknown => Some(format!("no such unit: {unit}")),
        ToggleOutcome::Completed | ToggleOutcome::Cleared => None,
    }
}

pub fn validation(result: &ValidationResult, accepted: bool) -> String {
    let mut out = format!(
        "{}/{} checks passed ({:.0}%)",
        result.passed(),
        result.total(),
        result.score() * 100.0
    );
    for message in result.unmet_messages() {
        let _ = write!(out, "\n  - {message}");
    }
    out.push_str(if accepted {
        "\nAccepted!"
    } else {
        "\nNot there yet."
    });
    out
}

pub fn gate_error(err: &GateError) -> String {
    match err {
        GateError::TerminalSectionIncomplete { section, .. } => {
            format!("finish section {section} first")
        }
        other => other.to_string(),
    }
}

pub fn sequence(exercise: &SequenceExercise) -> String {
    let mut out = String::from("Put the steps for starting a project in order:\n");
    for (idx, slot) in exercise.slots().iter().enumerate() {
        let _ = writeln!(out, "  {}. {}", idx + 1, slot.as_deref().unwrap_or("____"));
    }
    let unplaced = exercise.unplaced();
    if !unplaced.is_empty() {
        let _ = writeln!(out, "Unplaced: {}", unplaced.join(", "));
    }
    if exercise.is_correct() {
        out.push_str("Correct order!");
    } else if exercise.is_filled() {
        out.push_str("Not quite; try moving some steps.");
    }
    out.trim_end().to_string()
}

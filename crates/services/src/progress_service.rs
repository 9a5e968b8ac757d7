use chrono::{DateTime, Utc};
use std::sync::Arc;

use lesson_core::catalog;
use lesson_core::model::{CourseOutline, LearnerId, PhaseId, SectionId, UnitId};
use lesson_core::{
    CodeSubmission, CommandSubmission, GateError, ProgressEvent, ProgressSession, UnitToggle,
};
use storage::repository::{ProgressEntry, ProgressKey, ProgressRepository, StorageError};

use crate::Clock;
use crate::error::ProgressServiceError;
use crate::view::LessonView;

//
// ─── SERVICE ───────────────────────────────────────────────────────────────────
//

/// Opens lesson sessions and owns the persistence side of progress.
///
/// This service owns:
/// - the time source (`Clock`)
/// - repository access
#[derive(Clone)]
pub struct ProgressService {
    clock: Clock,
    progress: Arc<dyn ProgressRepository>,
}

impl ProgressService {
    #[must_use]
    pub fn new(clock: Clock, progress: Arc<dyn ProgressRepository>) -> Self {
        Self { clock, progress }
    }

    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Resumes `learner` in `outline`, starting fresh when nothing usable is stored.
    ///
    /// A corrupt or too-new snapshot is logged and replaced by empty progress.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` if the repository cannot be reached.
    pub async fn open_session(
        &self,
        learner: &LearnerId,
        outline: Arc<CourseOutline>,
    ) -> Result<LessonSession, ProgressServiceError> {
        let key = ProgressKey::new(learner.clone(), outline.id().clone());
        let snapshot = match self.progress.load_snapshot(&key).await {
            Ok(snapshot) => snapshot,
            Err(StorageError::Snapshot(err)) => {
                tracing::warn!(
                    learner = %key.learner,
                    course = %key.course,
                    error = %err,
                    "discarding unreadable progress snapshot"
                );
                None
            }
            Err(err) => return Err(err.into()),
        };
        tracing::debug!(
            learner = %key.learner,
            course = %key.course,
            resumed = snapshot.is_some(),
            "opened lesson session"
        );
        Ok(LessonSession {
            session: ProgressSession::restore(outline, snapshot, self.clock),
            key,
            clock: self.clock,
            progress: Arc::clone(&self.progress),
            last_save_failed: false,
        })
    }

    /// Opens one of the built-in courses by id.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::UnknownCourse` for ids not in the catalog.
    pub async fn open_builtin(
        &self,
        learner: &LearnerId,
        course_id: &str,
    ) -> Result<LessonSession, ProgressServiceError> {
        let outline = catalog::course(course_id)?
            .ok_or_else(|| ProgressServiceError::UnknownCourse(course_id.to_string()))?;
        self.open_session(learner, Arc::new(outline)).await
    }

    /// Forgets the stored progress of `learner` in `course`.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` on repository failure.
    pub async fn reset(
        &self,
        learner: &LearnerId,
        course_id: &str,
    ) -> Result<bool, ProgressServiceError> {
        let key = ProgressKey::new(learner.clone(), course_id);
        let removed = self.progress.delete_snapshot(&key).await?;
        tracing::info!(learner = %key.learner, course = %key.course, removed, "progress reset");
        Ok(removed)
    }

    /// Courses `learner` has progress in, most recent first.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` on repository failure.
    pub async fn progress_for(
        &self,
        learner: &LearnerId,
    ) -> Result<Vec<ProgressEntry>, ProgressServiceError> {
        Ok(self.progress.list_progress(learner).await?)
    }
}

//
// ─── LESSON SESSION ────────────────────────────────────────────────────────────
//

/// A `ProgressSession` bound to its storage key.
///
/// Every mutation that changes progress writes a fresh snapshot through. Save
/// failures are logged and remembered, never returned: the in-memory session
/// stays authoritative.
pub struct LessonSession {
    key: ProgressKey,
    session: ProgressSession,
    clock: Clock,
    progress: Arc<dyn ProgressRepository>,
    last_save_failed: bool,
}

impl LessonSession {
    #[must_use]
    pub fn key(&self) -> &ProgressKey {
        &self.key
    }

    /// Read access to the engine state.
    #[must_use]
    pub fn progress(&self) -> &ProgressSession {
        &self.session
    }

    #[must_use]
    pub fn last_save_failed(&self) -> bool {
        self.last_save_failed
    }

    #[must_use]
    pub fn view(&self) -> LessonView {
        LessonView::from_session(&self.session)
    }

    pub async fn toggle_unit(&mut self, unit: &UnitId) -> UnitToggle {
        let toggle = self.session.toggle_unit(unit);
        self.persist_if(!toggle.events.is_empty()).await;
        toggle
    }

    pub async fn set_unit(&mut self, unit: &UnitId, done: bool) -> Vec<ProgressEvent> {
        let events = self.session.set_unit(unit, done);
        self.persist_if(!events.is_empty()).await;
        events
    }

    pub async fn submit_code(&mut self, unit: &UnitId, input: &str) -> Option<CodeSubmission> {
        let submission = self.session.submit_code(unit, input)?;
        self.persist_if(!submission.events.is_empty()).await;
        Some(submission)
    }

    pub async fn run_command(&mut self, command: &str) -> Option<CommandSubmission> {
        let submission = self.session.run_command(command)?;
        self.persist_if(!submission.events.is_empty()).await;
        Some(submission)
    }

    pub async fn complete_section(&mut self, section: &SectionId) -> Vec<ProgressEvent> {
        let events = self.session.complete_section(section);
        self.persist_if(!events.is_empty()).await;
        events
    }

    pub async fn complete_section_filling_units(
        &mut self,
        section: &SectionId,
    ) -> Vec<ProgressEvent> {
        let events = self.session.complete_section_filling_units(section);
        self.persist_if(!events.is_empty()).await;
        events
    }

    /// Marks the current concept read and steps forward.
    pub async fn next_concept(&mut self) -> Vec<ProgressEvent> {
        let events = self.session.next_concept();
        self.persist_if(!events.is_empty()).await;
        events
    }

    /// Steps back one concept. The reading position is not persisted.
    pub fn previous_concept(&mut self) -> bool {
        self.session.previous_concept()
    }

    /// Moves to the next phase and saves the new position.
    ///
    /// # Errors
    ///
    /// Returns `GateError` when the gate refuses; a refused advance from the
    /// last phase may still have recorded that phase as completed.
    pub async fn advance(&mut self) -> Result<PhaseId, GateError> {
        let before = self.session.snapshot();
        let result = self.session.advance();
        self.persist_if(self.session.snapshot() != before).await;
        result
    }

    /// Navigates to a reachable phase and saves the new position.
    ///
    /// # Errors
    ///
    /// Returns `GateError` for unknown or locked phases.
    pub async fn go_to(&mut self, phase: &PhaseId) -> Result<(), GateError> {
        self.session.go_to(phase)?;
        self.persist().await;
        Ok(())
    }

    /// Writes the current snapshot; returns false (and logs) on failure.
    pub async fn persist(&mut self) -> bool {
        let snapshot = self.session.snapshot();
        match self
            .progress
            .save_snapshot(&self.key, &snapshot, self.clock.now())
            .await
        {
            Ok(()) => {
                self.last_save_failed = false;
                true
            }
            Err(err) => {
                tracing::warn!(
                    learner = %self.key.learner,
                    course = %self.key.course,
                    error = %err,
                    "failed to save progress snapshot"
                );
                self.last_save_failed = true;
                false
            }
        }
    }

    async fn persist_if(&mut self, changed: bool) {
        if changed {
            self.persist().await;
        }
    }
}

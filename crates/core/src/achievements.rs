//! Append-only achievement unlocks keyed by the unit that just completed.

use std::sync::Arc;

use crate::model::{Achievement, AchievementId, CourseOutline, UnitId};

#[derive(Debug, Clone)]
pub struct AchievementEvaluator {
    outline: Arc<CourseOutline>,
    unlocked: Vec<AchievementId>,
}

impl AchievementEvaluator {
    #[must_use]
    pub fn new(outline: Arc<CourseOutline>) -> Self {
        Self {
            outline,
            unlocked: Vec::new(),
        }
    }

    /// Rehydrates unlocked ids, dropping duplicates but keeping unlock order.
    #[must_use]
    pub fn restore<I>(outline: Arc<CourseOutline>, unlocked: I) -> Self
    where
        I: IntoIterator<Item = AchievementId>,
    {
        let mut evaluator = Self::new(outline);
        for id in unlocked {
            if !evaluator.unlocked.contains(&id) {
                evaluator.unlocked.push(id);
            }
        }
        evaluator
    }

    /// Unlocks every not-yet-unlocked achievement triggered by `unit`.
    ///
    /// Returns only the newly unlocked ones, in outline order. Re-processing
    /// a trigger whose achievements are already unlocked returns nothing.
    pub fn on_unit_completed(&mut self, unit: &UnitId) -> Vec<Achievement> {
        let fresh: Vec<Achievement> = self
            .outline
            .achievements()
            .iter()
            .filter(|a| &a.trigger == unit && !self.unlocked.contains(&a.id))
            .cloned()
            .collect();
        self.unlocked.extend(fresh.iter().map(|a| a.id.clone()));
        fresh
    }

    #[must_use]
    pub fn is_unlocked(&self, id: &AchievementId) -> bool {
        self.unlocked.contains(id)
    }

    /// Unlocked ids in unlock order.
    #[must_use]
    pub fn unlocked(&self) -> &[AchievementId] {
        &self.unlocked
    }

    /// Outline achievements not unlocked yet.
    #[must_use]
    pub fn locked(&self) -> Vec<&Achievement> {
        self.outline
            .achievements()
            .iter()
            .filter(|a| !self.unlocked.contains(&a.id))
            .collect()
    }
}

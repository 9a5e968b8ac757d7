use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SequenceError {
    #[error("slot {slot} is out of range (0..{len})")]
    SlotOutOfRange { slot: usize, len: usize },
    #[error("unknown step: {0}")]
    UnknownStep(String),
}

/// Ordering exercise: put a fixed set of steps into numbered slots.
///
/// A step occupies at most one slot; placing it again moves it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceExercise {
    expected: Vec<String>,
    slots: Vec<Option<String>>,
}

impl SequenceExercise {
    /// Creates an exercise whose correct answer is `expected`, with all slots empty.
    #[must_use]
    pub fn new(expected: Vec<String>) -> Self {
        let slots = vec![None; expected.len()];
        Self { expected, slots }
    }

    #[must_use]
    pub fn slots(&self) -> &[Option<String>] {
        &self.slots
    }

    /// Places `step` into `slot`, removing it from any other slot first.
    ///
    /// # Errors
    ///
    /// Returns `SequenceError` if the slot is out of range or the step is not part of the exercise.
    pub fn place(&mut self, step: &str, slot: usize) -> Result<(), SequenceError> {
        if slot >= self.slots.len() {
            return Err(SequenceError::SlotOutOfRange {
                slot,
                len: self.slots.len(),
            });
        }
        if !self.expected.iter().any(|s| s == step) {
            return Err(SequenceError::UnknownStep(step.to_string()));
        }
        for existing in &mut self.slots {
            if existing.as_deref() == Some(step) {
                *existing = None;
            }
        }
        self.slots[slot] = Some(step.to_string());
        Ok(())
    }

    /// Empties a slot. Out-of-range slots are ignored.
    pub fn clear_slot(&mut self, slot: usize) {
        if let Some(existing) = self.slots.get_mut(slot) {
            *existing = None;
        }
    }

    /// Steps not placed in any slot yet, in their original order.
    #[must_use]
    pub fn unplaced(&self) -> Vec<&str> {
        self.expected
            .iter()
            .filter(|step| !self.slots.iter().any(|s| s.as_ref() == Some(*step)))
            .map(String::as_str)
            .collect()
    }

    #[must_use]
    pub fn is_filled(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    /// True once every slot holds the expected step.
    #[must_use]
    pub fn is_correct(&self) -> bool {
        self.is_filled()
            && self
                .slots
                .iter()
                .zip(&self.expected)
                .all(|(slot, expected)| slot.as_ref() == Some(expected))
    }
}

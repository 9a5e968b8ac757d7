use crate::model::UnitId;

/// One explanatory card of a concept walkthrough.
///
/// Reading it (moving past it with `next`) completes `unit`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Concept {
    pub unit: UnitId,
    pub title: String,
    pub subtitle: String,
    pub key_points: Vec<String>,
}

impl Concept {
    #[must_use]
    pub fn new(
        unit: impl Into<UnitId>,
        title: impl Into<String>,
        subtitle: impl Into<String>,
    ) -> Self {
        Self {
            unit: unit.into(),
            title: title.into(),
            subtitle: subtitle.into(),
            key_points: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_key_points<I, S>(mut self, points: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.key_points = points.into_iter().map(Into::into).collect();
        self
    }
}

/// Cursor over an ordered list of concepts.
///
/// `forward` reports the concept being read and moves on unless it is the
/// last one; `back` always moves back when there is somewhere to go.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConceptStepper {
    len: usize,
    current: usize,
}

impl ConceptStepper {
    #[must_use]
    pub fn new(len: usize) -> Self {
        Self { len, current: 0 }
    }

    /// Stepper positioned at `current`, clamped to the last concept.
    #[must_use]
    pub fn at(len: usize, current: usize) -> Self {
        Self {
            len,
            current: current.min(len.saturating_sub(1)),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[must_use]
    pub fn current(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn is_first(&self) -> bool {
        self.current == 0
    }

    #[must_use]
    pub fn is_last(&self) -> bool {
        self.current + 1 >= self.len
    }

    /// Index of the concept just read, or `None` when there are no concepts.
    pub fn forward(&mut self) -> Option<usize> {
        if self.is_empty() {
            return None;
        }
        let read = self.current;
        if !self.is_last() {
            self.current += 1;
        }
        Some(read)
    }

    /// Moves back one concept; false at the first one.
    pub fn back(&mut self) -> bool {
        if self.is_first() {
            return false;
        }
        self.current -= 1;
        true
    }
}

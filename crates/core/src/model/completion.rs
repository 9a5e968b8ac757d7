use std::collections::BTreeSet;

use crate::model::UnitId;

/// Set of completed unit ids. Membership is the only truth for "is X done".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletionSet {
    units: BTreeSet<UnitId>,
}

impl CompletionSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn contains(&self, unit: &UnitId) -> bool {
        self.units.contains(unit)
    }

    /// Flips membership and returns the new membership.
    pub fn toggle(&mut self, unit: &UnitId) -> bool {
        if self.units.remove(unit) {
            false
        } else {
            self.units.insert(unit.clone());
            true
        }
    }

    /// Adds the unit; returns false if it was already present.
    pub fn insert(&mut self, unit: UnitId) -> bool {
        self.units.insert(unit)
    }

    /// Removes the unit; returns false if it was not present.
    pub fn remove(&mut self, unit: &UnitId) -> bool {
        self.units.remove(unit)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Number of completed units whose id starts with `prefix`.
    #[must_use]
    pub fn count_with_prefix(&self, prefix: &str) -> usize {
        self.units.iter().filter(|u| u.has_prefix(prefix)).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &UnitId> {
        self.units.iter()
    }
}

impl FromIterator<UnitId> for CompletionSet {
    fn from_iter<I: IntoIterator<Item = UnitId>>(iter: I) -> Self {
        Self {
            units: iter.into_iter().collect(),
        }
    }
}

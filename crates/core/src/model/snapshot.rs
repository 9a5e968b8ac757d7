use serde::{Deserialize, Serialize};

use crate::model::{AchievementId, PhaseId, SectionId, UnitId};

/// Current snapshot schema version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Flat, JSON-friendly picture of one learner's progress in one course.
///
/// Field names follow the persisted blob (`completedUnits`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSnapshot {
    pub version: u32,
    pub completed_units: Vec<UnitId>,
    pub completed_sections: Vec<SectionId>,
    pub unlocked_achievements: Vec<AchievementId>,
    pub current_phase: PhaseId,
    #[serde(default)]
    pub completed_phases: Vec<PhaseId>,
}

impl ProgressSnapshot {
    /// Empty progress positioned at `phase`.
    #[must_use]
    pub fn empty(phase: PhaseId) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            completed_units: Vec::new(),
            completed_sections: Vec::new(),
            unlocked_achievements: Vec::new(),
            current_phase: phase,
            completed_phases: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_camel_case_fields() {
        let mut snapshot = ProgressSnapshot::empty(PhaseId::new("setup"));
        snapshot.completed_units.push(UnitId::new("ex1"));
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["version"], 1);
        assert_eq!(json["completedUnits"][0], "ex1");
        assert_eq!(json["currentPhase"], "setup");
        assert!(json["completedPhases"].as_array().unwrap().is_empty());
    }
}

//! Versioned JSON codec for progress snapshots.
//!
//! Version 0 is the unversioned blob (`completedUnits`, `completedSections`,
//! `unlockedAchievements`, `currentPhase`). Every decode goes through
//! [`migrate`] so older blobs come out at [`SNAPSHOT_VERSION`].

use lesson_core::model::{
    AchievementId, PhaseId, ProgressSnapshot, SNAPSHOT_VERSION, SectionId, UnitId,
};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SnapshotError {
    #[error("malformed snapshot: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("unsupported snapshot version {0}")]
    UnsupportedVersion(u64),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacySnapshot {
    #[serde(default)]
    completed_units: Vec<UnitId>,
    #[serde(default)]
    completed_sections: Vec<SectionId>,
    #[serde(default)]
    unlocked_achievements: Vec<AchievementId>,
    current_phase: PhaseId,
}

impl From<LegacySnapshot> for ProgressSnapshot {
    fn from(legacy: LegacySnapshot) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            completed_units: legacy.completed_units,
            completed_sections: legacy.completed_sections,
            unlocked_achievements: legacy.unlocked_achievements,
            current_phase: legacy.current_phase,
            // Re-derived from complete terminal sections on restore.
            completed_phases: Vec::new(),
        }
    }
}

/// Serializes a snapshot at the current version.
///
/// # Errors
///
/// Returns `SnapshotError::Malformed` if serialization fails.
pub fn encode(snapshot: &ProgressSnapshot) -> Result<String, SnapshotError> {
    let current = ProgressSnapshot {
        version: SNAPSHOT_VERSION,
        ..snapshot.clone()
    };
    Ok(serde_json::to_string(&current)?)
}

/// Parses a stored blob of any known version.
///
/// # Errors
///
/// Returns `SnapshotError` for invalid JSON, wrong shapes, or versions newer
/// than this build understands.
pub fn decode(payload: &str) -> Result<ProgressSnapshot, SnapshotError> {
    let value: Value = serde_json::from_str(payload)?;
    migrate(value)
}

/// Upgrades a raw snapshot value to the current version.
///
/// # Errors
///
/// Returns `SnapshotError` if the value does not match its declared version.
pub fn migrate(value: Value) -> Result<ProgressSnapshot, SnapshotError> {
    let version = value.get("version").and_then(Value::as_u64).unwrap_or(0);
    match version {
        0 => Ok(serde_json::from_value::<LegacySnapshot>(value)?.into()),
        1 => Ok(serde_json::from_value(value)?),
        other => Err(SnapshotError::UnsupportedVersion(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn current_version_round_trips() {
        let mut snapshot = ProgressSnapshot::empty(PhaseId::new("concepts"));
        snapshot.completed_units = vec![UnitId::new("ex1"), UnitId::new("retired")];
        snapshot.completed_sections = vec![SectionId::new("section0")];
        snapshot.unlocked_achievements = vec![AchievementId::new("first-commit")];
        snapshot.completed_phases = vec![PhaseId::new("setup")];

        let decoded = decode(&encode(&snapshot).unwrap()).unwrap();
        assert_eq!(decoded, snapshot);
    }

    #[test]
    fn legacy_blob_is_migrated() {
        let legacy = r#"{
            "completedUnits": ["ex1", "ex2"],
            "completedSections": ["section0"],
            "unlockedAchievements": ["repo-initialized"],
            "currentPhase": "setup"
        }"#;
        let snapshot = decode(legacy).unwrap();
        assert_eq!(snapshot.version, SNAPSHOT_VERSION);
        assert_eq!(snapshot.completed_units.len(), 2);
        assert_eq!(snapshot.current_phase, PhaseId::new("setup"));
        assert!(snapshot.completed_phases.is_empty());
    }

    #[test]
    fn future_versions_are_rejected() {
        let err = decode(r#"{"version": 7, "currentPhase": "setup"}"#).unwrap_err();
        assert!(matches!(err, SnapshotError::UnsupportedVersion(7)));
    }

    #[test]
    fn garbage_is_malformed() {
        assert!(matches!(decode("{not json"), Err(SnapshotError::Malformed(_))));
        assert!(matches!(
            decode(r#"{"version": 1, "completedUnits": 3}"#),
            Err(SnapshotError::Malformed(_))
        ));
    }
}

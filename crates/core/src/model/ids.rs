use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Error type for parsing an ID from string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    kind: &'static str,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse {} from string: value is blank", self.kind)
    }
}

impl std::error::Error for ParseIdError {}

// Every content identifier is an opaque, trimmed, non-empty string. The
// lesson content owns the vocabulary; the engine only compares them.
macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier from any string-like value.
            ///
            /// Blank values are accepted here; use `FromStr` when the input
            /// comes from outside and must be validated.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Returns true if the identifier starts with `prefix`.
            #[must_use]
            pub fn has_prefix(&self, prefix: &str) -> bool {
                self.0.starts_with(prefix)
            }

            /// Returns true if the identifier is empty after trimming.
            #[must_use]
            pub fn is_blank(&self) -> bool {
                self.0.trim().is_empty()
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({:?})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.pad(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Err(ParseIdError {
                        kind: stringify!($name),
                    });
                }
                Ok(Self(trimmed.to_string()))
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id!(
    /// Atomic completable unit: checklist line, quiz answer, coding or terminal exercise.
    UnitId
);
string_id!(
    /// Named group of units gating later content.
    SectionId
);
string_id!(
    /// Top-level ordered stage of a course.
    PhaseId
);
string_id!(
    /// One-time unlock record.
    AchievementId
);
string_id!(
    /// Identifier of a single validation rule within an exercise.
    RuleId
);
string_id!(
    /// Identifier of a course outline.
    CourseId
);
string_id!(
    /// Identifier of the learner a progress snapshot belongs to.
    LearnerId
);

// ─── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_id_display() {
        let id = UnitId::new("ex1");
        assert_eq!(id.to_string(), "ex1");
    }

    #[test]
    fn unit_id_from_str_trims() {
        let id: UnitId = "  cmd-init ".parse().unwrap();
        assert_eq!(id, UnitId::new("cmd-init"));
    }

    #[test]
    fn section_id_from_str_rejects_blank() {
        let result = "   ".parse::<SectionId>();
        assert!(result.is_err());
    }

    #[test]
    fn prefix_check() {
        let id = UnitId::new("install-verify-install");
        assert!(id.has_prefix("install-"));
        assert!(!id.has_prefix("setup-"));
    }

    #[test]
    fn serializes_as_plain_string() {
        let id = PhaseId::new("setup");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"setup\"");
        let back: PhaseId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn debug_names_the_kind() {
        let id = AchievementId::new("first-commit-made");
        assert_eq!(format!("{id:?}"), "AchievementId(\"first-commit-made\")");
    }
}

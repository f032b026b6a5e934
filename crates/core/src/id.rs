//! Strongly-typed identifiers used across the domain.

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

macro_rules! uuid_id {
    ($(#[$doc:meta])* $t:ident, $name:literal) => {
        $(#[$doc])*
        #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $t(Uuid);

        impl $t {
            /// Create a new identifier.
            ///
            /// Uses UUIDv7 (time-ordered). Prefer passing IDs explicitly in tests
            /// for determinism.
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $t {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<Uuid> for $t {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        impl From<$t> for Uuid {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let uuid = Uuid::from_str(s)
                    .map_err(|e| DomainError::invalid_id(format!("{}: {}", $name, e)))?;
                Ok(Self(uuid))
            }
        }
    };
}

uuid_id!(
    /// Identifier of an academic (school) year.
    SchoolYearId,
    "SchoolYearId"
);
uuid_id!(CourseId, "CourseId");
uuid_id!(
    /// Identifier of a class level (grade, e.g. "10ª classe").
    ClassLevelId,
    "ClassLevelId"
);
uuid_id!(SubjectId, "SubjectId");
uuid_id!(RoomId, "RoomId");
uuid_id!(PeriodId, "PeriodId");
uuid_id!(
    /// Identifier of a class group (a "turma": students taught together).
    ClassGroupId,
    "ClassGroupId"
);
uuid_id!(CurriculumEntryId, "CurriculumEntryId");
uuid_id!(TeacherId, "TeacherId");
uuid_id!(AssignmentId, "AssignmentId");
uuid_id!(StudentId, "StudentId");
uuid_id!(EnrollmentId, "EnrollmentId");
uuid_id!(FeeItemId, "FeeItemId");
uuid_id!(InvoiceId, "InvoiceId");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_roundtrips_display() {
        let id = CourseId::new();
        let parsed: CourseId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn parse_error_names_the_identifier() {
        let err = "nope".parse::<StudentId>().unwrap_err();
        match err {
            DomainError::InvalidId(msg) => assert!(msg.starts_with("StudentId")),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}

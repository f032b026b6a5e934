use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use edugest_core::{
    ClassLevelId, CourseId, CurriculumEntryId, DomainError, DomainResult, Entity, SubjectId, Timestamps,
};

pub const MAX_WEEKLY_HOURS: u8 = 40;

/// One line of a curriculum grid: a subject taught in a course at a class
/// level, with its weekly load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurriculumEntry {
    pub id: CurriculumEntryId,
    pub course_id: CourseId,
    pub class_level_id: ClassLevelId,
    pub subject_id: SubjectId,
    pub weekly_hours: u8,
    #[serde(flatten)]
    pub timestamps: Timestamps,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewCurriculumEntry {
    pub course_id: CourseId,
    pub class_level_id: ClassLevelId,
    pub subject_id: SubjectId,
    pub weekly_hours: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CurriculumEntryPatch {
    pub weekly_hours: Option<u8>,
}

impl CurriculumEntry {
    pub fn create(input: NewCurriculumEntry, now: DateTime<Utc>) -> DomainResult<Self> {
        Ok(Self {
            id: CurriculumEntryId::new(),
            course_id: input.course_id,
            class_level_id: input.class_level_id,
            subject_id: input.subject_id,
            weekly_hours: validate_hours(input.weekly_hours)?,
            timestamps: Timestamps::new(now),
        })
    }

    pub fn apply(&mut self, patch: CurriculumEntryPatch, now: DateTime<Utc>) -> DomainResult<()> {
        if let Some(hours) = patch.weekly_hours {
            self.weekly_hours = validate_hours(hours)?;
        }
        self.timestamps.touch(now);
        Ok(())
    }

    /// Whether this grid line covers `subject` for the given course/class pair.
    pub fn covers(&self, course_id: CourseId, class_level_id: ClassLevelId, subject_id: SubjectId) -> bool {
        self.course_id == course_id && self.class_level_id == class_level_id && self.subject_id == subject_id
    }
}

fn validate_hours(hours: u8) -> DomainResult<u8> {
    if hours == 0 || hours > MAX_WEEKLY_HOURS {
        return Err(DomainError::validation(format!(
            "weekly_hours must be between 1 and {MAX_WEEKLY_HOURS}"
        )));
    }
    Ok(hours)
}

impl Entity for CurriculumEntry {
    type Id = CurriculumEntryId;
    const KIND: &'static str = "curriculum entry";

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn weekly_hours_bounds(hours in any::<u8>()) {
            let entry = CurriculumEntry::create(
                NewCurriculumEntry {
                    course_id: CourseId::new(),
                    class_level_id: ClassLevelId::new(),
                    subject_id: SubjectId::new(),
                    weekly_hours: hours,
                },
                Utc::now(),
            );
            prop_assert_eq!(entry.is_ok(), (1..=MAX_WEEKLY_HOURS).contains(&hours));
        }
    }
}

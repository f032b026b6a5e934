use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use edugest_academics::{ClassGroup, CurriculumEntry};
use edugest_core::{
    AssignmentId, ClassGroupId, DomainError, DomainResult, Entity, SchoolYearId, SubjectId, TeacherId,
    Timestamps,
};

use crate::Teacher;

/// A teacher teaching one subject to one class group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeachingAssignment {
    pub id: AssignmentId,
    pub teacher_id: TeacherId,
    pub class_group_id: ClassGroupId,
    pub subject_id: SubjectId,
    /// Copied from the class group so year-wide cascades need no join.
    pub school_year_id: SchoolYearId,
    #[serde(flatten)]
    pub timestamps: Timestamps,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewTeachingAssignment {
    pub teacher_id: TeacherId,
    pub class_group_id: ClassGroupId,
    pub subject_id: SubjectId,
}

impl TeachingAssignment {
    /// `grid` is the curriculum of the group's course + class level.
    pub fn create(
        teacher: &Teacher,
        group: &ClassGroup,
        subject_id: SubjectId,
        grid: &[CurriculumEntry],
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if !teacher.active {
            return Err(DomainError::invariant(format!(
                "teacher '{}' is inactive",
                teacher.full_name
            )));
        }
        if !grid
            .iter()
            .any(|entry| entry.covers(group.course_id, group.class_level_id, subject_id))
        {
            return Err(DomainError::invariant(format!(
                "subject is not part of the curriculum of class group '{}'",
                group.designation
            )));
        }

        Ok(Self {
            id: AssignmentId::new(),
            teacher_id: teacher.id,
            class_group_id: group.id,
            subject_id,
            school_year_id: group.school_year_id,
            timestamps: Timestamps::new(now),
        })
    }
}

impl Entity for TeachingAssignment {
    type Id = AssignmentId;
    const KIND: &'static str = "teaching assignment";

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

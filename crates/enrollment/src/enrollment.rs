use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use edugest_academics::ClassGroup;
use edugest_core::{
    ClassGroupId, DomainError, DomainResult, EnrollmentId, Entity, SchoolYearId, StudentId, Timestamps,
};

use crate::Student;

/// Enrollment lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnrollmentStatus {
    Active,
    Cancelled,
    Transferred,
}

impl EnrollmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnrollmentStatus::Active => "active",
            EnrollmentStatus::Cancelled => "cancelled",
            EnrollmentStatus::Transferred => "transferred",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(EnrollmentStatus::Active),
            "cancelled" => Some(EnrollmentStatus::Cancelled),
            "transferred" => Some(EnrollmentStatus::Transferred),
            _ => None,
        }
    }
}

/// A student's place in a class group for one school year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrollment {
    pub id: EnrollmentId,
    pub student_id: StudentId,
    pub class_group_id: ClassGroupId,
    pub school_year_id: SchoolYearId,
    pub status: EnrollmentStatus,
    pub enrolled_on: NaiveDate,
    pub status_changed_at: DateTime<Utc>,
    /// Set when the enrollment was moved between class groups.
    pub previous_class_group_id: Option<ClassGroupId>,
    #[serde(flatten)]
    pub timestamps: Timestamps,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewEnrollment {
    pub student_id: StudentId,
    pub class_group_id: ClassGroupId,
    /// Defaults to today.
    pub enrolled_on: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TransferEnrollment {
    pub class_group_id: ClassGroupId,
}

impl Enrollment {
    /// `active_in_group` is the current number of active enrollments in `group`.
    pub fn create(
        student: &Student,
        group: &ClassGroup,
        active_in_group: u64,
        enrolled_on: Option<NaiveDate>,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        ensure_vacancy(group, active_in_group)?;

        Ok(Self {
            id: EnrollmentId::new(),
            student_id: student.id,
            class_group_id: group.id,
            school_year_id: group.school_year_id,
            status: EnrollmentStatus::Active,
            enrolled_on: enrolled_on.unwrap_or_else(|| now.date_naive()),
            status_changed_at: now,
            previous_class_group_id: None,
            timestamps: Timestamps::new(now),
        })
    }

    pub fn is_active(&self) -> bool {
        self.status == EnrollmentStatus::Active
    }

    /// Cancelled enrollments no longer block re-enrollment in the same year.
    pub fn counts_towards_year(&self) -> bool {
        self.status != EnrollmentStatus::Cancelled
    }

    pub fn cancel(&mut self, now: DateTime<Utc>) -> DomainResult<()> {
        self.ensure_active()?;
        self.status = EnrollmentStatus::Cancelled;
        self.status_changed_at = now;
        self.timestamps.touch(now);
        Ok(())
    }

    /// The student left the school for another one; frees the seat.
    pub fn transfer_out(&mut self, now: DateTime<Utc>) -> DomainResult<()> {
        self.ensure_active()?;
        self.status = EnrollmentStatus::Transferred;
        self.status_changed_at = now;
        self.timestamps.touch(now);
        Ok(())
    }

    /// Move to `target` (same school year). The enrollment stays active.
    pub fn transfer(&mut self, target: &ClassGroup, active_in_target: u64, now: DateTime<Utc>) -> DomainResult<()> {
        self.ensure_active()?;
        if target.id == self.class_group_id {
            return Err(DomainError::validation("enrollment is already in that class group"));
        }
        if target.school_year_id != self.school_year_id {
            return Err(DomainError::invariant(
                "transfers must stay within the same school year",
            ));
        }
        ensure_vacancy(target, active_in_target)?;

        self.previous_class_group_id = Some(self.class_group_id);
        self.class_group_id = target.id;
        self.status_changed_at = now;
        self.timestamps.touch(now);
        Ok(())
    }

    fn ensure_active(&self) -> DomainResult<()> {
        if !self.is_active() {
            return Err(DomainError::invariant(format!(
                "enrollment is {}",
                self.status.as_str()
            )));
        }
        Ok(())
    }
}

fn ensure_vacancy(group: &ClassGroup, active: u64) -> DomainResult<()> {
    if !group.has_room_for(active) {
        return Err(DomainError::conflict(format!(
            "class group '{}' is full ({} of {})",
            group.designation, active, group.capacity
        )));
    }
    Ok(())
}

impl Entity for Enrollment {
    type Id = EnrollmentId;
    const KIND: &'static str = "enrollment";

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use edugest_academics::{NewClassGroup, NewRoom, Room};
    use edugest_core::{ClassLevelId, CourseId, PeriodId};

    use crate::NewStudent;

    fn student() -> Student {
        Student::create(
            NewStudent {
                full_name: "João Manuel".into(),
                document_number: "001234567LA042".into(),
                birth_date: NaiveDate::from_ymd_opt(2009, 3, 14).unwrap(),
                guardian_name: Some("Teresa Manuel".into()),
                tax_id: None,
                address: None,
                city: Some("Luanda".into()),
            },
            Utc::now(),
        )
        .unwrap()
    }

    fn group(year: SchoolYearId, capacity: u32) -> ClassGroup {
        let room = Room::create(
            NewRoom {
                designation: "Sala 7".into(),
                capacity: 40,
                location: None,
            },
            Utc::now(),
        )
        .unwrap();
        ClassGroup::create(
            NewClassGroup {
                designation: "11C".into(),
                school_year_id: year,
                course_id: CourseId::new(),
                class_level_id: ClassLevelId::new(),
                room_id: room.id,
                period_id: PeriodId::new(),
                capacity: Some(capacity),
            },
            &room,
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn full_group_rejects_enrollment() {
        let g = group(SchoolYearId::new(), 2);
        assert!(Enrollment::create(&student(), &g, 1, None, Utc::now()).is_ok());
        let err = Enrollment::create(&student(), &g, 2, None, Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[test]
    fn enrollment_takes_year_from_group() {
        let year = SchoolYearId::new();
        let e = Enrollment::create(&student(), &group(year, 30), 0, None, Utc::now()).unwrap();
        assert_eq!(e.school_year_id, year);
        assert!(e.is_active());
    }

    #[test]
    fn cancel_only_once() {
        let mut e = Enrollment::create(&student(), &group(SchoolYearId::new(), 30), 0, None, Utc::now()).unwrap();
        e.cancel(Utc::now()).unwrap();
        assert_eq!(e.status, EnrollmentStatus::Cancelled);
        assert!(!e.counts_towards_year());
        assert!(matches!(e.cancel(Utc::now()), Err(DomainError::InvariantViolation(_))));
    }

    #[test]
    fn transfer_out_keeps_counting_towards_year() {
        let mut e = Enrollment::create(&student(), &group(SchoolYearId::new(), 30), 0, None, Utc::now()).unwrap();
        e.transfer_out(Utc::now()).unwrap();
        assert_eq!(e.status, EnrollmentStatus::Transferred);
        assert!(!e.is_active());
        assert!(e.counts_towards_year());
    }

    #[test]
    fn transfer_within_year_records_previous_group() {
        let year = SchoolYearId::new();
        let from = group(year, 30);
        let to = group(year, 30);
        let mut e = Enrollment::create(&student(), &from, 0, None, Utc::now()).unwrap();
        e.transfer(&to, 10, Utc::now()).unwrap();
        assert_eq!(e.class_group_id, to.id);
        assert_eq!(e.previous_class_group_id, Some(from.id));
        assert!(e.is_active());
    }

    #[test]
    fn transfer_across_years_is_rejected() {
        let from = group(SchoolYearId::new(), 30);
        let to = group(SchoolYearId::new(), 30);
        let mut e = Enrollment::create(&student(), &from, 0, None, Utc::now()).unwrap();
        assert!(matches!(
            e.transfer(&to, 0, Utc::now()),
            Err(DomainError::InvariantViolation(_))
        ));
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use edugest_core::{
    text, ClassGroupId, ClassLevelId, CourseId, DomainError, DomainResult, Entity, PeriodId, RoomId,
    SchoolYearId, Timestamps,
};

use crate::Room;

/// A class group ("turma"): students of one course and class level who share
/// a room and a period during one school year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassGroup {
    pub id: ClassGroupId,
    pub designation: String,
    pub school_year_id: SchoolYearId,
    pub course_id: CourseId,
    pub class_level_id: ClassLevelId,
    pub room_id: RoomId,
    pub period_id: PeriodId,
    /// Maximum number of active enrollments.
    pub capacity: u32,
    #[serde(flatten)]
    pub timestamps: Timestamps,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewClassGroup {
    pub designation: String,
    pub school_year_id: SchoolYearId,
    pub course_id: CourseId,
    pub class_level_id: ClassLevelId,
    pub room_id: RoomId,
    pub period_id: PeriodId,
    /// Defaults to the room capacity.
    pub capacity: Option<u32>,
}

/// Year, course and class level are fixed once the group exists; enrollments
/// and assignments depend on them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ClassGroupPatch {
    pub designation: Option<String>,
    pub room_id: Option<RoomId>,
    pub period_id: Option<PeriodId>,
    pub capacity: Option<u32>,
}

impl ClassGroup {
    /// `room` must be the room referenced by `input.room_id`.
    pub fn create(input: NewClassGroup, room: &Room, now: DateTime<Utc>) -> DomainResult<Self> {
        debug_assert_eq!(input.room_id, room.id);
        let designation = text::required("designation", &input.designation)?;
        let capacity = validate_capacity(input.capacity.unwrap_or(room.capacity), room)?;

        Ok(Self {
            id: ClassGroupId::new(),
            designation,
            school_year_id: input.school_year_id,
            course_id: input.course_id,
            class_level_id: input.class_level_id,
            room_id: input.room_id,
            period_id: input.period_id,
            capacity,
            timestamps: Timestamps::new(now),
        })
    }

    /// `room` is the room the group will occupy after the patch.
    ///
    /// `active_enrollments` guards against shrinking below the current roll.
    pub fn apply(
        &mut self,
        patch: ClassGroupPatch,
        room: &Room,
        active_enrollments: u64,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        let designation = patch
            .designation
            .map(|d| text::required("designation", &d))
            .transpose()?;
        let capacity = validate_capacity(patch.capacity.unwrap_or(self.capacity), room)?;
        if u64::from(capacity) < active_enrollments {
            return Err(DomainError::invariant(format!(
                "capacity {capacity} is below the {active_enrollments} active enrollments"
            )));
        }

        if let Some(designation) = designation {
            self.designation = designation;
        }
        self.room_id = room.id;
        if let Some(period_id) = patch.period_id {
            self.period_id = period_id;
        }
        self.capacity = capacity;
        self.timestamps.touch(now);
        Ok(())
    }

    /// Seat rules re-checked by the store while it holds the room and the roll.
    pub fn check_seats(&self, room: &Room, active_enrollments: u64) -> DomainResult<()> {
        if self.capacity > room.capacity {
            return Err(DomainError::invariant(format!(
                "class group '{}' needs {} seats but room '{}' has {}",
                self.designation, self.capacity, room.designation, room.capacity
            )));
        }
        if u64::from(self.capacity) < active_enrollments {
            return Err(DomainError::invariant(format!(
                "capacity {} is below the {active_enrollments} active enrollments",
                self.capacity
            )));
        }
        Ok(())
    }

    pub fn has_room_for(&self, active_enrollments: u64) -> bool {
        active_enrollments < u64::from(self.capacity)
    }
}

fn validate_capacity(capacity: u32, room: &Room) -> DomainResult<u32> {
    if capacity == 0 {
        return Err(DomainError::validation("capacity must be greater than zero"));
    }
    if capacity > room.capacity {
        return Err(DomainError::validation(format!(
            "capacity {capacity} exceeds room '{}' capacity of {}",
            room.designation, room.capacity
        )));
    }
    Ok(capacity)
}

impl Entity for ClassGroup {
    type Id = ClassGroupId;
    const KIND: &'static str = "class group";

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NewRoom;

    fn room(capacity: u32) -> Room {
        Room::create(
            NewRoom {
                designation: "Sala 3".into(),
                capacity,
                location: None,
            },
            Utc::now(),
        )
        .unwrap()
    }

    fn new_group(room: &Room, capacity: Option<u32>) -> NewClassGroup {
        NewClassGroup {
            designation: "10A".into(),
            school_year_id: SchoolYearId::new(),
            course_id: CourseId::new(),
            class_level_id: ClassLevelId::new(),
            room_id: room.id,
            period_id: PeriodId::new(),
            capacity,
        }
    }

    #[test]
    fn capacity_defaults_to_room_capacity() {
        let room = room(35);
        let group = ClassGroup::create(new_group(&room, None), &room, Utc::now()).unwrap();
        assert_eq!(group.capacity, 35);
        assert!(group.has_room_for(34));
        assert!(!group.has_room_for(35));
    }

    #[test]
    fn capacity_cannot_exceed_room() {
        let room = room(30);
        let err = ClassGroup::create(new_group(&room, Some(31)), &room, Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn cannot_shrink_below_current_roll() {
        let room = room(30);
        let mut group = ClassGroup::create(new_group(&room, None), &room, Utc::now()).unwrap();
        let patch = ClassGroupPatch {
            capacity: Some(10),
            ..Default::default()
        };
        let err = group.apply(patch, &room, 12, Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
        assert_eq!(group.capacity, 30);
    }

    #[test]
    fn seat_check_covers_room_and_roll() {
        let room = room(30);
        let group = ClassGroup::create(new_group(&room, Some(25)), &room, Utc::now()).unwrap();
        assert!(group.check_seats(&room, 25).is_ok());

        let err = group.check_seats(&room, 26).unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));

        let mut shrunk = room.clone();
        shrunk.capacity = 20;
        let err = group.check_seats(&shrunk, 0).unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
    }

    #[test]
    fn moving_to_a_smaller_room_revalidates_capacity() {
        let big = room(40);
        let small = room(20);
        let mut group = ClassGroup::create(new_group(&big, None), &big, Utc::now()).unwrap();
        let patch = ClassGroupPatch {
            room_id: Some(small.id),
            ..Default::default()
        };
        assert!(group.apply(patch.clone(), &small, 0, Utc::now()).is_err());

        let patch = ClassGroupPatch {
            room_id: Some(small.id),
            capacity: Some(20),
            ..Default::default()
        };
        group.apply(patch, &small, 5, Utc::now()).unwrap();
        assert_eq!(group.room_id, small.id);
        assert_eq!(group.capacity, 20);
    }
}

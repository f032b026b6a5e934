use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use edugest_core::{text, DomainError, DomainResult, Entity, RoomId, Timestamps};

pub const MAX_ROOM_CAPACITY: u32 = 500;

/// A physical classroom.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub designation: String,
    pub capacity: u32,
    pub location: Option<String>,
    #[serde(flatten)]
    pub timestamps: Timestamps,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewRoom {
    pub designation: String,
    pub capacity: u32,
    pub location: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RoomPatch {
    pub designation: Option<String>,
    pub capacity: Option<u32>,
    pub location: Option<String>,
}

impl Room {
    pub fn create(input: NewRoom, now: DateTime<Utc>) -> DomainResult<Self> {
        Ok(Self {
            id: RoomId::new(),
            designation: text::required("designation", &input.designation)?,
            capacity: validate_capacity(input.capacity)?,
            location: text::optional(input.location.as_deref()),
            timestamps: Timestamps::new(now),
        })
    }

    pub fn apply(&mut self, patch: RoomPatch, now: DateTime<Utc>) -> DomainResult<()> {
        let designation = patch
            .designation
            .map(|d| text::required("designation", &d))
            .transpose()?;
        let capacity = patch.capacity.map(validate_capacity).transpose()?;
        if let Some(designation) = designation {
            self.designation = designation;
        }
        if let Some(capacity) = capacity {
            self.capacity = capacity;
        }
        if let Some(location) = patch.location {
            self.location = text::optional(Some(&location));
        }
        self.timestamps.touch(now);
        Ok(())
    }
}

fn validate_capacity(capacity: u32) -> DomainResult<u32> {
    if capacity == 0 || capacity > MAX_ROOM_CAPACITY {
        return Err(DomainError::validation(format!(
            "capacity must be between 1 and {MAX_ROOM_CAPACITY}"
        )));
    }
    Ok(capacity)
}

impl Entity for Room {
    type Id = RoomId;
    const KIND: &'static str = "room";

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_bounds() {
        let make = |capacity| {
            Room::create(
                NewRoom {
                    designation: "Sala 1".into(),
                    capacity,
                    location: None,
                },
                Utc::now(),
            )
        };
        assert!(make(0).is_err());
        assert!(make(501).is_err());
        assert_eq!(make(40).unwrap().capacity, 40);
    }
}

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use edugest_core::{text, DomainError, DomainResult, Entity, SchoolYearId, Timestamps};

/// An academic year, e.g. "2024/2025".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchoolYear {
    pub id: SchoolYearId,
    pub designation: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// At most one school year is current at any time (enforced by the store).
    pub is_current: bool,
    #[serde(flatten)]
    pub timestamps: Timestamps,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewSchoolYear {
    pub designation: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub is_current: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SchoolYearPatch {
    pub designation: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub is_current: Option<bool>,
}

impl SchoolYear {
    pub fn create(input: NewSchoolYear, now: DateTime<Utc>) -> DomainResult<Self> {
        let designation = text::required("designation", &input.designation)?;
        validate_range(input.start_date, input.end_date)?;

        Ok(Self {
            id: SchoolYearId::new(),
            designation,
            start_date: input.start_date,
            end_date: input.end_date,
            is_current: input.is_current,
            timestamps: Timestamps::new(now),
        })
    }

    pub fn apply(&mut self, patch: SchoolYearPatch, now: DateTime<Utc>) -> DomainResult<()> {
        let start = patch.start_date.unwrap_or(self.start_date);
        let end = patch.end_date.unwrap_or(self.end_date);
        validate_range(start, end)?;

        if let Some(designation) = patch.designation {
            self.designation = text::required("designation", &designation)?;
        }
        self.start_date = start;
        self.end_date = end;
        if let Some(current) = patch.is_current {
            self.is_current = current;
        }
        self.timestamps.touch(now);
        Ok(())
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }
}

fn validate_range(start: NaiveDate, end: NaiveDate) -> DomainResult<()> {
    if start >= end {
        return Err(DomainError::validation("start_date must be before end_date"));
    }
    Ok(())
}

impl Entity for SchoolYear {
    type Id = SchoolYearId;
    const KIND: &'static str = "school year";

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn new_year() -> NewSchoolYear {
        NewSchoolYear {
            designation: " 2024/2025 ".to_string(),
            start_date: date(2024, 9, 2),
            end_date: date(2025, 7, 31),
            is_current: true,
        }
    }

    #[test]
    fn create_trims_designation() {
        let year = SchoolYear::create(new_year(), Utc::now()).unwrap();
        assert_eq!(year.designation, "2024/2025");
        assert!(year.is_current);
        assert!(year.contains(date(2025, 1, 15)));
        assert!(!year.contains(date(2025, 8, 1)));
    }

    #[test]
    fn create_rejects_inverted_range() {
        let mut input = new_year();
        input.end_date = input.start_date;
        assert!(matches!(
            SchoolYear::create(input, Utc::now()),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn patch_validates_against_existing_dates() {
        let mut year = SchoolYear::create(new_year(), Utc::now()).unwrap();
        let patch = SchoolYearPatch {
            end_date: Some(date(2024, 1, 1)),
            ..Default::default()
        };
        assert!(year.apply(patch, Utc::now()).is_err());
        assert_eq!(year.end_date, date(2025, 7, 31));
    }
}

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use edugest_core::{text, DomainError, DomainResult, Entity, PeriodId, Timestamps};

/// A teaching shift (morning, afternoon, evening).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub id: PeriodId,
    pub designation: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    #[serde(flatten)]
    pub timestamps: Timestamps,
}

/// Times are accepted as `HH:MM` or `HH:MM:SS`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewPeriod {
    pub designation: String,
    pub start_time: String,
    pub end_time: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PeriodPatch {
    pub designation: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

impl Period {
    pub fn create(input: NewPeriod, now: DateTime<Utc>) -> DomainResult<Self> {
        let start_time = parse_time("start_time", &input.start_time)?;
        let end_time = parse_time("end_time", &input.end_time)?;
        validate_window(start_time, end_time)?;

        Ok(Self {
            id: PeriodId::new(),
            designation: text::required("designation", &input.designation)?,
            start_time,
            end_time,
            timestamps: Timestamps::new(now),
        })
    }

    pub fn apply(&mut self, patch: PeriodPatch, now: DateTime<Utc>) -> DomainResult<()> {
        let designation = patch
            .designation
            .map(|d| text::required("designation", &d))
            .transpose()?;
        let start = match patch.start_time {
            Some(raw) => parse_time("start_time", &raw)?,
            None => self.start_time,
        };
        let end = match patch.end_time {
            Some(raw) => parse_time("end_time", &raw)?,
            None => self.end_time,
        };
        validate_window(start, end)?;

        if let Some(designation) = designation {
            self.designation = designation;
        }
        self.start_time = start;
        self.end_time = end;
        self.timestamps.touch(now);
        Ok(())
    }
}

pub fn parse_time(field: &str, raw: &str) -> DomainResult<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .map_err(|_| DomainError::validation(format!("{field} must be formatted as HH:MM")))
}

fn validate_window(start: NaiveTime, end: NaiveTime) -> DomainResult<()> {
    if start >= end {
        return Err(DomainError::validation("start_time must be before end_time"));
    }
    Ok(())
}

impl Entity for Period {
    type Id = PeriodId;
    const KIND: &'static str = "period";

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

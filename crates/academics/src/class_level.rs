use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use edugest_core::{text, ClassLevelId, DomainError, DomainResult, Entity, Timestamps};

/// A grade level ("classe"), e.g. "10ª Classe" with grade 10.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassLevel {
    pub id: ClassLevelId,
    pub name: String,
    pub grade: u8,
    #[serde(flatten)]
    pub timestamps: Timestamps,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewClassLevel {
    pub name: String,
    pub grade: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ClassLevelPatch {
    pub name: Option<String>,
    pub grade: Option<u8>,
}

pub const MAX_GRADE: u8 = 13;

impl ClassLevel {
    pub fn create(input: NewClassLevel, now: DateTime<Utc>) -> DomainResult<Self> {
        Ok(Self {
            id: ClassLevelId::new(),
            name: text::required("name", &input.name)?,
            grade: validate_grade(input.grade)?,
            timestamps: Timestamps::new(now),
        })
    }

    pub fn apply(&mut self, patch: ClassLevelPatch, now: DateTime<Utc>) -> DomainResult<()> {
        let name = patch.name.map(|n| text::required("name", &n)).transpose()?;
        let grade = patch.grade.map(validate_grade).transpose()?;
        if let Some(name) = name {
            self.name = name;
        }
        if let Some(grade) = grade {
            self.grade = grade;
        }
        self.timestamps.touch(now);
        Ok(())
    }
}

fn validate_grade(grade: u8) -> DomainResult<u8> {
    if grade == 0 || grade > MAX_GRADE {
        return Err(DomainError::validation(format!(
            "grade must be between 1 and {MAX_GRADE}"
        )));
    }
    Ok(grade)
}

impl Entity for ClassLevel {
    type Id = ClassLevelId;
    const KIND: &'static str = "class";

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

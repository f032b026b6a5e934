use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use edugest_core::{text, CourseId, DomainResult, Entity, Timestamps};

/// A course of study (e.g. "Ciências Físicas e Biológicas").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub id: CourseId,
    pub name: String,
    /// Short unique code, upper-case alphanumerics.
    pub code: String,
    pub description: Option<String>,
    #[serde(flatten)]
    pub timestamps: Timestamps,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewCourse {
    pub name: String,
    pub code: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CoursePatch {
    pub name: Option<String>,
    pub code: Option<String>,
    /// `Some("")` clears the description.
    pub description: Option<String>,
}

impl Course {
    pub fn create(input: NewCourse, now: DateTime<Utc>) -> DomainResult<Self> {
        Ok(Self {
            id: CourseId::new(),
            name: text::required("name", &input.name)?,
            code: text::code("code", &input.code)?,
            description: text::optional(input.description.as_deref()),
            timestamps: Timestamps::new(now),
        })
    }

    pub fn apply(&mut self, patch: CoursePatch, now: DateTime<Utc>) -> DomainResult<()> {
        let name = patch.name.map(|n| text::required("name", &n)).transpose()?;
        let code = patch.code.map(|c| text::code("code", &c)).transpose()?;

        if let Some(name) = name {
            self.name = name;
        }
        if let Some(code) = code {
            self.code = code;
        }
        if let Some(description) = patch.description {
            self.description = text::optional(Some(&description));
        }
        self.timestamps.touch(now);
        Ok(())
    }
}

impl Entity for Course {
    type Id = CourseId;
    const KIND: &'static str = "course";

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

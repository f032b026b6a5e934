use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use edugest_core::{text, DomainResult, Entity, SubjectId, Timestamps};

/// A taught subject ("disciplina").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub id: SubjectId,
    pub name: String,
    pub code: String,
    #[serde(flatten)]
    pub timestamps: Timestamps,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewSubject {
    pub name: String,
    pub code: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SubjectPatch {
    pub name: Option<String>,
    pub code: Option<String>,
}

impl Subject {
    pub fn create(input: NewSubject, now: DateTime<Utc>) -> DomainResult<Self> {
        Ok(Self {
            id: SubjectId::new(),
            name: text::required("name", &input.name)?,
            code: text::code("code", &input.code)?,
            timestamps: Timestamps::new(now),
        })
    }

    pub fn apply(&mut self, patch: SubjectPatch, now: DateTime<Utc>) -> DomainResult<()> {
        let name = patch.name.map(|n| text::required("name", &n)).transpose()?;
        let code = patch.code.map(|c| text::code("code", &c)).transpose()?;
        if let Some(name) = name {
            self.name = name;
        }
        if let Some(code) = code {
            self.code = code;
        }
        self.timestamps.touch(now);
        Ok(())
    }
}

impl Entity for Subject {
    type Id = SubjectId;
    const KIND: &'static str = "subject";

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

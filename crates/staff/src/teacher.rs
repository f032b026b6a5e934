use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use edugest_core::{text, DomainResult, Entity, TeacherId, Timestamps};

/// A member of the teaching staff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Teacher {
    pub id: TeacherId,
    pub full_name: String,
    /// National identity card (BI) number; unique.
    pub document_number: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub academic_degree: Option<String>,
    pub active: bool,
    #[serde(flatten)]
    pub timestamps: Timestamps,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewTeacher {
    pub full_name: String,
    pub document_number: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub academic_degree: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TeacherPatch {
    pub full_name: Option<String>,
    pub document_number: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub academic_degree: Option<String>,
    pub active: Option<bool>,
}

impl Teacher {
    pub fn create(input: NewTeacher, now: DateTime<Utc>) -> DomainResult<Self> {
        Ok(Self {
            id: TeacherId::new(),
            full_name: text::required("full_name", &input.full_name)?,
            document_number: text::required("document_number", &input.document_number)?.to_uppercase(),
            email: text::email(input.email.as_deref())?,
            phone: text::optional(input.phone.as_deref()),
            academic_degree: text::optional(input.academic_degree.as_deref()),
            active: true,
            timestamps: Timestamps::new(now),
        })
    }

    pub fn apply(&mut self, patch: TeacherPatch, now: DateTime<Utc>) -> DomainResult<()> {
        let full_name = patch
            .full_name
            .map(|n| text::required("full_name", &n))
            .transpose()?;
        let document_number = patch
            .document_number
            .map(|d| text::required("document_number", &d).map(|d| d.to_uppercase()))
            .transpose()?;
        let email = patch.email.map(|e| text::email(Some(&e))).transpose()?;

        if let Some(full_name) = full_name {
            self.full_name = full_name;
        }
        if let Some(document_number) = document_number {
            self.document_number = document_number;
        }
        if let Some(email) = email {
            self.email = email;
        }
        if let Some(phone) = patch.phone {
            self.phone = text::optional(Some(&phone));
        }
        if let Some(degree) = patch.academic_degree {
            self.academic_degree = text::optional(Some(&degree));
        }
        if let Some(active) = patch.active {
            self.active = active;
        }
        self.timestamps.touch(now);
        Ok(())
    }
}

impl Entity for Teacher {
    type Id = TeacherId;
    const KIND: &'static str = "teacher";

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use edugest_core::{text, DomainError, DomainResult, Entity, StudentId, Timestamps};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: StudentId,
    pub full_name: String,
    pub document_number: String,
    pub birth_date: NaiveDate,
    pub guardian_name: Option<String>,
    /// Taxpayer number (NIF) used when invoicing; final consumer when absent.
    pub tax_id: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    #[serde(flatten)]
    pub timestamps: Timestamps,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewStudent {
    pub full_name: String,
    pub document_number: String,
    pub birth_date: NaiveDate,
    pub guardian_name: Option<String>,
    pub tax_id: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct StudentPatch {
    pub full_name: Option<String>,
    pub document_number: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub guardian_name: Option<String>,
    pub tax_id: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
}

impl Student {
    pub fn create(input: NewStudent, now: DateTime<Utc>) -> DomainResult<Self> {
        Ok(Self {
            id: StudentId::new(),
            full_name: text::required("full_name", &input.full_name)?,
            document_number: text::required("document_number", &input.document_number)?.to_uppercase(),
            birth_date: validate_birth_date(input.birth_date, now)?,
            guardian_name: text::optional(input.guardian_name.as_deref()),
            tax_id: text::optional(input.tax_id.as_deref()),
            address: text::optional(input.address.as_deref()),
            city: text::optional(input.city.as_deref()),
            timestamps: Timestamps::new(now),
        })
    }

    pub fn apply(&mut self, patch: StudentPatch, now: DateTime<Utc>) -> DomainResult<()> {
        let full_name = patch
            .full_name
            .map(|n| text::required("full_name", &n))
            .transpose()?;
        let document_number = patch
            .document_number
            .map(|d| text::required("document_number", &d).map(|d| d.to_uppercase()))
            .transpose()?;
        let birth_date = patch
            .birth_date
            .map(|d| validate_birth_date(d, now))
            .transpose()?;

        if let Some(full_name) = full_name {
            self.full_name = full_name;
        }
        if let Some(document_number) = document_number {
            self.document_number = document_number;
        }
        if let Some(birth_date) = birth_date {
            self.birth_date = birth_date;
        }
        if let Some(v) = patch.guardian_name {
            self.guardian_name = text::optional(Some(&v));
        }
        if let Some(v) = patch.tax_id {
            self.tax_id = text::optional(Some(&v));
        }
        if let Some(v) = patch.address {
            self.address = text::optional(Some(&v));
        }
        if let Some(v) = patch.city {
            self.city = text::optional(Some(&v));
        }
        self.timestamps.touch(now);
        Ok(())
    }
}

fn validate_birth_date(date: NaiveDate, now: DateTime<Utc>) -> DomainResult<NaiveDate> {
    if date > now.date_naive() {
        return Err(DomainError::validation("birth_date cannot be in the future"));
    }
    Ok(date)
}

impl Entity for Student {
    type Id = StudentId;
    const KIND: &'static str = "student";

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use edugest_academics::{
    ClassGroup, ClassLevel, Course, CurriculumEntry, Period, Room, SchoolYear, Subject,
};
use edugest_billing::{FeeItem, Invoice, InvoiceStatus};
use edugest_core::{Page, PageRequest};
use edugest_enrollment::{Enrollment, EnrollmentStatus, Student};
use edugest_infra::{Filter, ListQuery, Record};
use edugest_staff::{Teacher, TeachingAssignment};

use crate::app::errors;

// -------------------------
// Request DTOs
// -------------------------

/// Query string of every list endpoint.
///
/// Filters an entity does not have are rejected by the store with a
/// validation error.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub search: Option<String>,
    pub school_year_id: Option<String>,
    pub course_id: Option<String>,
    pub class_level_id: Option<String>,
    pub class_group_id: Option<String>,
    pub subject_id: Option<String>,
    pub teacher_id: Option<String>,
    pub student_id: Option<String>,
    pub status: Option<String>,
}

impl ListParams {
    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page, self.limit)
    }

    pub fn into_query<T: Listed>(self) -> Result<ListQuery, axum::response::Response> {
        let mut query = ListQuery::paged(self.page_request()).search(self.search);

        if let Some(raw) = self.school_year_id {
            query = query.filter(Filter::SchoolYear(parse_uuid("school_year_id", &raw)?.into()));
        }
        if let Some(raw) = self.course_id {
            query = query.filter(Filter::Course(parse_uuid("course_id", &raw)?.into()));
        }
        if let Some(raw) = self.class_level_id {
            query = query.filter(Filter::ClassLevel(parse_uuid("class_level_id", &raw)?.into()));
        }
        if let Some(raw) = self.class_group_id {
            query = query.filter(Filter::ClassGroup(parse_uuid("class_group_id", &raw)?.into()));
        }
        if let Some(raw) = self.subject_id {
            query = query.filter(Filter::Subject(parse_uuid("subject_id", &raw)?.into()));
        }
        if let Some(raw) = self.teacher_id {
            query = query.filter(Filter::Teacher(parse_uuid("teacher_id", &raw)?.into()));
        }
        if let Some(raw) = self.student_id {
            query = query.filter(Filter::Student(parse_uuid("student_id", &raw)?.into()));
        }

        if let Some(raw) = self.status {
            let filter = T::status_filter(&raw.to_lowercase()).ok_or_else(|| {
                errors::json_error(
                    StatusCode::BAD_REQUEST,
                    "validation_error",
                    format!("unknown {} status '{raw}'", T::KIND),
                )
            })?;
            query = query.filter(filter);
        }
        Ok(query)
    }
}

pub fn parse_uuid(name: &str, raw: &str) -> Result<Uuid, axum::response::Response> {
    Uuid::parse_str(raw.trim()).map_err(|_| {
        errors::json_error(
            StatusCode::BAD_REQUEST,
            "invalid_id",
            format!("{name} is not a valid id"),
        )
    })
}

#[derive(Debug, Deserialize)]
pub struct CancelInvoiceRequest {
    pub reason: String,
}

#[derive(Debug, Deserialize)]
pub struct SaftExportParams {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u64,
}

#[derive(Debug, Serialize)]
pub struct PageResponse<T> {
    pub data: Vec<T>,
    pub pagination: Pagination,
}

impl<T> From<Page<T>> for PageResponse<T> {
    fn from(page: Page<T>) -> Self {
        let pagination = Pagination {
            page: page.page,
            limit: page.limit,
            total: page.total,
            total_pages: page.total_pages(),
        };
        Self {
            data: page.items,
            pagination,
        }
    }
}

// -------------------------
// Listing
// -------------------------

/// A record exposed through the generic list/get handlers.
pub trait Listed: Record + Serialize {
    /// Parses the `status` query value for entities that have one.
    fn status_filter(_raw: &str) -> Option<Filter> {
        None
    }
}

impl Listed for SchoolYear {}
impl Listed for Course {}
impl Listed for ClassLevel {}
impl Listed for Subject {}
impl Listed for Room {}
impl Listed for Period {}
impl Listed for ClassGroup {}
impl Listed for CurriculumEntry {}
impl Listed for Teacher {}
impl Listed for TeachingAssignment {}
impl Listed for Student {}
impl Listed for FeeItem {}

impl Listed for Enrollment {
    fn status_filter(raw: &str) -> Option<Filter> {
        EnrollmentStatus::parse(raw).map(Filter::EnrollmentStatus)
    }
}

impl Listed for Invoice {
    fn status_filter(raw: &str) -> Option<Filter> {
        InvoiceStatus::parse(raw).map(Filter::InvoiceStatus)
    }
}

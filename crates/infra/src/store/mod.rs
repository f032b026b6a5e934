//! Persistence boundary for the school records.
//!
//! `SchoolStore` is the only thing the application layer talks to. It is a
//! bundle of one generic `Repository<T>` per entity plus the operations that
//! must touch several tables atomically (cascade deletes, activating a school
//! year, seat-checked enrollment writes, invoice numbering).
//!
//! Two implementations exist:
//! - `InMemorySchoolStore` (tests / dev), one `RwLock` over every table
//! - `PostgresSchoolStore` (production), sqlx over a `PgPool`
//!
//! Both enforce the same unique and restrict rules, so the service layer
//! behaves identically on either.

mod memory;
mod postgres;
mod record;

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use uuid::Uuid;

use edugest_academics::{
    ClassGroup, ClassLevel, Course, CurriculumEntry, Period, Room, SchoolYear, Subject,
};
use edugest_billing::{FeeItem, Invoice, InvoiceDraft, InvoiceSeries, InvoiceStatus};
use edugest_core::{
    ClassGroupId, ClassLevelId, CourseId, DomainError, PageRequest, SchoolYearId, StudentId,
    SubjectId, TeacherId,
};
use edugest_enrollment::{Enrollment, EnrollmentStatus, Student};
use edugest_staff::{Teacher, TeachingAssignment};

use crate::error::{StoreError, StoreResult};

pub use memory::InMemorySchoolStore;
pub use postgres::PostgresSchoolStore;
pub use record::Record;

/// Equality filter on one reference or status column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter {
    SchoolYear(SchoolYearId),
    Course(CourseId),
    ClassLevel(ClassLevelId),
    ClassGroup(ClassGroupId),
    Subject(SubjectId),
    Teacher(TeacherId),
    Student(StudentId),
    EnrollmentStatus(EnrollmentStatus),
    InvoiceStatus(InvoiceStatus),
}

impl Filter {
    /// Column the filter applies to; also the query-string key.
    pub fn column(&self) -> &'static str {
        match self {
            Filter::SchoolYear(_) => "school_year_id",
            Filter::Course(_) => "course_id",
            Filter::ClassLevel(_) => "class_level_id",
            Filter::ClassGroup(_) => "class_group_id",
            Filter::Subject(_) => "subject_id",
            Filter::Teacher(_) => "teacher_id",
            Filter::Student(_) => "student_id",
            Filter::EnrollmentStatus(_) | Filter::InvoiceStatus(_) => "status",
        }
    }
}

/// List request: optional page window, search term and filters (AND-ed).
///
/// `page: None` returns every matching row; used internally where the full set
/// is needed (curriculum grid, export).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub page: Option<PageRequest>,
    pub search: Option<String>,
    pub filters: Vec<Filter>,
}

impl ListQuery {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn paged(page: PageRequest) -> Self {
        Self {
            page: Some(page),
            ..Self::default()
        }
    }

    pub fn search(mut self, term: Option<String>) -> Self {
        self.search = term
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }
}

/// Rejects filters on columns the entity does not have.
pub(crate) fn ensure_filters<T: Record>(query: &ListQuery) -> StoreResult<()> {
    match query.filters.iter().find(|f| !T::supports(f)) {
        Some(f) => Err(StoreError::Domain(DomainError::validation(format!(
            "{} cannot be filtered by {}",
            T::KIND,
            f.column()
        )))),
        None => Ok(()),
    }
}

/// Outcome of a cascading delete: how many rows went from each table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CascadeSummary {
    pub entity: &'static str,
    pub id: Uuid,
    pub deleted: BTreeMap<&'static str, u64>,
}

impl CascadeSummary {
    pub fn new(entity: &'static str, id: impl Into<Uuid>) -> Self {
        Self {
            entity,
            id: id.into(),
            deleted: BTreeMap::new(),
        }
    }

    pub(crate) fn record(&mut self, table: &'static str, count: u64) {
        *self.deleted.entry(table).or_default() += count;
    }

    /// e.g. `school year deleted (class_groups: 2, enrollments: 31)`
    pub fn message(&self) -> String {
        let dependents: Vec<String> = self
            .deleted
            .iter()
            .map(|(table, count)| format!("{table}: {count}"))
            .collect();
        if dependents.is_empty() {
            format!("{} deleted", self.entity)
        } else {
            format!("{} deleted ({})", self.entity, dependents.join(", "))
        }
    }

    pub fn total(&self) -> u64 {
        self.deleted.values().sum()
    }
}

/// CRUD over one entity table.
///
/// `delete` is a plain (restricting) delete: it fails with a conflict while
/// other rows reference the target. Cascades live on `SchoolStore`.
#[async_trait]
pub trait Repository<T: Record>: Send + Sync {
    async fn insert(&self, record: &T) -> StoreResult<()>;

    async fn get(&self, id: T::Id) -> StoreResult<Option<T>>;

    /// Matching rows for the requested window plus the unpaged total.
    async fn list(&self, query: &ListQuery) -> StoreResult<(Vec<T>, u64)>;

    /// Fails with `NotFound` when the row is gone.
    async fn update(&self, record: &T) -> StoreResult<()>;

    async fn delete(&self, id: T::Id) -> StoreResult<()>;
}

#[async_trait]
pub trait SchoolStore:
    Repository<SchoolYear>
    + Repository<Course>
    + Repository<ClassLevel>
    + Repository<Subject>
    + Repository<Room>
    + Repository<Period>
    + Repository<ClassGroup>
    + Repository<CurriculumEntry>
    + Repository<Teacher>
    + Repository<TeachingAssignment>
    + Repository<Student>
    + Repository<Enrollment>
    + Repository<FeeItem>
    + Repository<Invoice>
{
    /// Flag `id` as the current school year and clear the flag everywhere else.
    async fn activate_school_year(&self, id: SchoolYearId, now: DateTime<Utc>)
        -> StoreResult<SchoolYear>;

    async fn current_school_year(&self) -> StoreResult<Option<SchoolYear>>;

    async fn count_active_enrollments(&self, group: ClassGroupId) -> StoreResult<u64>;

    /// Insert or update an enrollment while holding the target group's seat
    /// count; rejects with a conflict when an active enrollment would overflow it.
    async fn place_enrollment(&self, enrollment: &Enrollment, is_new: bool) -> StoreResult<()>;

    /// Insert or update a class group while holding its room and its roll;
    /// rejects seat counts the room or the active enrollments no longer allow.
    async fn place_class_group(&self, group: &ClassGroup, is_new: bool) -> StoreResult<()>;

    /// Update a room while holding the class groups it hosts.
    async fn resize_room(&self, room: &Room) -> StoreResult<()>;

    /// Number `draft` as the next document of `series` and persist it.
    async fn issue_invoice(
        &self,
        draft: InvoiceDraft,
        series: &InvoiceSeries,
        now: DateTime<Utc>,
    ) -> StoreResult<Invoice>;

    /// Every invoice of each series that has a document dated inside
    /// `[start, end]`, up to `end`, ordered by series then sequence.
    async fn invoices_in_series_until(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> StoreResult<Vec<Invoice>>;

    async fn delete_school_year_cascade(&self, id: SchoolYearId) -> StoreResult<CascadeSummary>;

    async fn delete_course_cascade(&self, id: CourseId) -> StoreResult<CascadeSummary>;

    async fn delete_class_level_cascade(&self, id: ClassLevelId) -> StoreResult<CascadeSummary>;

    async fn delete_class_group_cascade(&self, id: ClassGroupId) -> StoreResult<CascadeSummary>;

    async fn delete_teacher_cascade(&self, id: TeacherId) -> StoreResult<CascadeSummary>;

    /// Rejected with a conflict while the student has invoices.
    async fn delete_student_cascade(&self, id: StudentId) -> StoreResult<CascadeSummary>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cascade_message_lists_tables_alphabetically() {
        let mut summary = CascadeSummary::new("school year", Uuid::nil());
        summary.record("teaching_assignments", 9);
        summary.record("class_groups", 2);
        summary.record("enrollments", 31);
        assert_eq!(
            summary.message(),
            "school year deleted (class_groups: 2, enrollments: 31, teaching_assignments: 9)"
        );
        assert_eq!(summary.total(), 42);
    }

    #[test]
    fn blank_search_is_dropped() {
        let q = ListQuery::all().search(Some("   ".to_string()));
        assert_eq!(q.search, None);
        let q = ListQuery::all().search(Some(" Mat ".to_string()));
        assert_eq!(q.search.as_deref(), Some("Mat"));
    }
}

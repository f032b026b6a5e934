//! Postgres-backed school store.
//!
//! ## Error Mapping
//!
//! Constraint violations surface as `StoreError::Conflict` (see
//! `map_sqlx_error`); everything else is `StoreError::Backend`.
//!
//! ## Atomicity
//!
//! Multi-table operations (cascade deletes, activating a school year, seat
//! checked enrollment writes, invoice numbering) each run in one transaction.
//! Seat checks lock the class group row; invoice numbering takes a
//! transaction-scoped advisory lock on the series name.

mod rows;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use tracing::{Span, info, instrument};
use uuid::Uuid;

use edugest_academics::{ClassGroup, ClassLevel, Course, Room, SchoolYear};
use edugest_billing::{Invoice, InvoiceDraft, InvoiceSeries};
use edugest_core::{
    ClassGroupId, ClassLevelId, CourseId, Entity, SchoolYearId, StudentId, TeacherId,
};
use edugest_enrollment::{Enrollment, Student};
use edugest_staff::Teacher;

use super::{CascadeSummary, Filter, ListQuery, Repository, SchoolStore, ensure_filters};
use crate::error::{StoreError, StoreResult, map_sqlx_error};

pub use rows::PgRecord;
use rows::PgQuery;

const SCHEMA: &str = include_str!("../../../migrations/0001_init.sql");

/// Ordered deletes for one cascading entity. Every statement binds the root id as `$1`.
struct Cascade {
    table: &'static str,
    entity: &'static str,
    /// `SELECT EXISTS (...)` that rejects the whole cascade, with a message.
    blocked_by: Option<(&'static str, &'static str)>,
    steps: &'static [(&'static str, &'static str)],
}

const SCHOOL_YEAR_CASCADE: Cascade = Cascade {
    table: "school_years",
    entity: SchoolYear::KIND,
    blocked_by: None,
    steps: &[
        ("enrollments", "DELETE FROM enrollments WHERE school_year_id = $1"),
        (
            "teaching_assignments",
            "DELETE FROM teaching_assignments WHERE school_year_id = $1",
        ),
        ("class_groups", "DELETE FROM class_groups WHERE school_year_id = $1"),
    ],
};

const COURSE_CASCADE: Cascade = Cascade {
    table: "courses",
    entity: Course::KIND,
    blocked_by: None,
    steps: &[
        (
            "enrollments",
            "DELETE FROM enrollments WHERE class_group_id IN \
             (SELECT id FROM class_groups WHERE course_id = $1)",
        ),
        (
            "teaching_assignments",
            "DELETE FROM teaching_assignments WHERE class_group_id IN \
             (SELECT id FROM class_groups WHERE course_id = $1)",
        ),
        ("class_groups", "DELETE FROM class_groups WHERE course_id = $1"),
        ("curriculum_entries", "DELETE FROM curriculum_entries WHERE course_id = $1"),
    ],
};

const CLASS_LEVEL_CASCADE: Cascade = Cascade {
    table: "class_levels",
    entity: ClassLevel::KIND,
    blocked_by: None,
    steps: &[
        (
            "enrollments",
            "DELETE FROM enrollments WHERE class_group_id IN \
             (SELECT id FROM class_groups WHERE class_level_id = $1)",
        ),
        (
            "teaching_assignments",
            "DELETE FROM teaching_assignments WHERE class_group_id IN \
             (SELECT id FROM class_groups WHERE class_level_id = $1)",
        ),
        ("class_groups", "DELETE FROM class_groups WHERE class_level_id = $1"),
        (
            "curriculum_entries",
            "DELETE FROM curriculum_entries WHERE class_level_id = $1",
        ),
    ],
};

const CLASS_GROUP_CASCADE: Cascade = Cascade {
    table: "class_groups",
    entity: ClassGroup::KIND,
    blocked_by: None,
    steps: &[
        ("enrollments", "DELETE FROM enrollments WHERE class_group_id = $1"),
        (
            "teaching_assignments",
            "DELETE FROM teaching_assignments WHERE class_group_id = $1",
        ),
    ],
};

const TEACHER_CASCADE: Cascade = Cascade {
    table: "teachers",
    entity: Teacher::KIND,
    blocked_by: None,
    steps: &[(
        "teaching_assignments",
        "DELETE FROM teaching_assignments WHERE teacher_id = $1",
    )],
};

const STUDENT_CASCADE: Cascade = Cascade {
    table: "students",
    entity: Student::KIND,
    blocked_by: Some((
        "SELECT EXISTS (SELECT 1 FROM invoices WHERE student_id = $1)",
        "student has invoices and cannot be deleted",
    )),
    steps: &[("enrollments", "DELETE FROM enrollments WHERE student_id = $1")],
};

/// Postgres-backed `SchoolStore`.
///
/// Uses SQLx connection pool which is thread-safe (Arc + Send + Sync).
#[derive(Debug, Clone)]
pub struct PostgresSchoolStore {
    pool: Arc<PgPool>,
}

impl PostgresSchoolStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Open a pool against `database_url`.
    pub async fn connect(database_url: &str, max_connections: u32) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Apply the (idempotent) schema.
    #[instrument(skip(self), err)]
    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::raw_sql(SCHEMA)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("migrate", e))?;
        info!("schema applied");
        Ok(())
    }

    async fn run_cascade(&self, cascade: &Cascade, id: Uuid) -> StoreResult<CascadeSummary> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let lock = format!("SELECT id FROM {} WHERE id = $1 FOR UPDATE", cascade.table);
        let found = sqlx::query(&lock)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("lock_root", e))?;
        if found.is_none() {
            return Err(StoreError::not_found(cascade.entity));
        }

        if let Some((sql, message)) = cascade.blocked_by {
            let blocked: bool = sqlx::query(sql)
                .bind(id)
                .fetch_one(&mut *tx)
                .await
                .and_then(|row| row.try_get(0))
                .map_err(|e| map_sqlx_error("cascade_guard", e))?;
            if blocked {
                return Err(StoreError::Conflict(message.to_string()));
            }
        }

        let mut summary = CascadeSummary::new(cascade.entity, id);
        for &(table, sql) in cascade.steps {
            let result = sqlx::query(sql)
                .bind(id)
                .execute(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error("cascade_step", e))?;
            summary.record(table, result.rows_affected());
        }

        let delete = format!("DELETE FROM {} WHERE id = $1", cascade.table);
        sqlx::query(&delete)
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("cascade_root", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        info!(
            entity = cascade.entity,
            id = %id,
            removed = summary.total(),
            "{}",
            summary.message()
        );
        Ok(summary)
    }
}

fn select_sql<T: PgRecord>() -> String {
    format!("SELECT {} FROM {}", T::COLUMNS.join(", "), T::TABLE)
}

fn insert_sql<T: PgRecord>() -> String {
    let placeholders: Vec<String> = (1..=T::COLUMNS.len()).map(|i| format!("${i}")).collect();
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        T::TABLE,
        T::COLUMNS.join(", "),
        placeholders.join(", ")
    )
}

fn update_sql<T: PgRecord>() -> String {
    let assignments: Vec<String> = T::COLUMNS
        .iter()
        .enumerate()
        .skip(1)
        .map(|(i, column)| format!("{column} = ${}", i + 1))
        .collect();
    format!("UPDATE {} SET {} WHERE id = $1", T::TABLE, assignments.join(", "))
}

enum Arg {
    Uuid(Uuid),
    Text(String),
}

fn filter_arg(filter: &Filter) -> Arg {
    match filter {
        Filter::SchoolYear(id) => Arg::Uuid((*id).into()),
        Filter::Course(id) => Arg::Uuid((*id).into()),
        Filter::ClassLevel(id) => Arg::Uuid((*id).into()),
        Filter::ClassGroup(id) => Arg::Uuid((*id).into()),
        Filter::Subject(id) => Arg::Uuid((*id).into()),
        Filter::Teacher(id) => Arg::Uuid((*id).into()),
        Filter::Student(id) => Arg::Uuid((*id).into()),
        Filter::EnrollmentStatus(status) => Arg::Text(status.as_str().to_string()),
        Filter::InvoiceStatus(status) => Arg::Text(status.as_str().to_string()),
    }
}

fn bind_args<'q>(mut query: PgQuery<'q>, args: &'q [Arg]) -> PgQuery<'q> {
    for arg in args {
        query = match arg {
            Arg::Uuid(id) => query.bind(*id),
            Arg::Text(text) => query.bind(text.as_str()),
        };
    }
    query
}

/// `%term%` with LIKE wildcards in the term escaped.
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

fn decode_rows<T: PgRecord>(rows: Vec<PgRow>) -> StoreResult<Vec<T>> {
    rows.iter()
        .map(|row| T::from_row(row).map_err(|e| map_sqlx_error("decode_row", e)))
        .collect()
}

#[async_trait]
impl<T: PgRecord> Repository<T> for PostgresSchoolStore {
    #[instrument(skip(self, record), fields(table = T::TABLE), err)]
    async fn insert(&self, record: &T) -> StoreResult<()> {
        let sql = insert_sql::<T>();
        record
            .bind(sqlx::query(&sql))
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("insert", e))?;
        Ok(())
    }

    #[instrument(skip(self), fields(table = T::TABLE), err)]
    async fn get(&self, id: T::Id) -> StoreResult<Option<T>> {
        let key: Uuid = id.into();
        let sql = format!("{} WHERE id = $1", select_sql::<T>());
        let row = sqlx::query(&sql)
            .bind(key)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get", e))?;
        row.map(|row| T::from_row(&row).map_err(|e| map_sqlx_error("decode_row", e)))
            .transpose()
    }

    #[instrument(
        skip(self, query),
        fields(table = T::TABLE, total = tracing::field::Empty),
        err
    )]
    async fn list(&self, query: &ListQuery) -> StoreResult<(Vec<T>, u64)> {
        ensure_filters::<T>(query)?;

        let mut conditions = Vec::new();
        let mut args = Vec::new();
        if let (Some(term), Some(column)) = (&query.search, T::SEARCH_COLUMN) {
            args.push(Arg::Text(like_pattern(term)));
            conditions.push(format!("{column} ILIKE ${}", args.len()));
        }
        for filter in &query.filters {
            args.push(filter_arg(filter));
            conditions.push(format!("{} = ${}", filter.column(), args.len()));
        }
        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        };

        let count_sql = format!("SELECT COUNT(*) AS total FROM {}{where_clause}", T::TABLE);
        let total: i64 = bind_args(sqlx::query(&count_sql), &args)
            .fetch_one(&*self.pool)
            .await
            .and_then(|row| row.try_get("total"))
            .map_err(|e| map_sqlx_error("count", e))?;

        let window = match query.page {
            Some(page) => format!(" LIMIT {} OFFSET {}", page.limit, page.offset()),
            None => String::new(),
        };
        let page_sql = format!("{}{where_clause} ORDER BY id{window}", select_sql::<T>());
        let rows = bind_args(sqlx::query(&page_sql), &args)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list", e))?;

        Span::current().record("total", total);
        Ok((decode_rows(rows)?, total as u64))
    }

    #[instrument(skip(self, record), fields(table = T::TABLE), err)]
    async fn update(&self, record: &T) -> StoreResult<()> {
        let sql = update_sql::<T>();
        let result = record
            .bind(sqlx::query(&sql))
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("update", e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(T::KIND));
        }
        Ok(())
    }

    #[instrument(skip(self), fields(table = T::TABLE), err)]
    async fn delete(&self, id: T::Id) -> StoreResult<()> {
        let key: Uuid = id.into();
        if let Some((sql, dependents)) = T::DELETE_GUARD {
            let referenced: bool = sqlx::query(sql)
                .bind(key)
                .fetch_one(&*self.pool)
                .await
                .and_then(|row| row.try_get(0))
                .map_err(|e| map_sqlx_error("delete_guard", e))?;
            if referenced {
                return Err(StoreError::Conflict(format!(
                    "{} is still referenced by {dependents}",
                    T::KIND
                )));
            }
        }

        let sql = format!("DELETE FROM {} WHERE id = $1", T::TABLE);
        let result = sqlx::query(&sql)
            .bind(key)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete", e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(T::KIND));
        }
        Ok(())
    }
}

#[async_trait]
impl SchoolStore for PostgresSchoolStore {
    #[instrument(skip(self), fields(school_year_id = %id), err)]
    async fn activate_school_year(
        &self,
        id: SchoolYearId,
        now: DateTime<Utc>,
    ) -> StoreResult<SchoolYear> {
        let key = Uuid::from(id);
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let select = format!("{} WHERE id = $1 FOR UPDATE", select_sql::<SchoolYear>());
        let row = sqlx::query(&select)
            .bind(key)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("lock_school_year", e))?
            .ok_or_else(|| StoreError::not_found(SchoolYear::KIND))?;
        let mut year =
            SchoolYear::from_row(&row).map_err(|e| map_sqlx_error("decode_row", e))?;

        // Clear first: the partial unique index admits one current row.
        sqlx::query(
            r#"
            UPDATE school_years
            SET is_current = FALSE, updated_at = $2
            WHERE is_current AND id <> $1
            "#,
        )
        .bind(key)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("clear_current", e))?;

        if !year.is_current {
            sqlx::query("UPDATE school_years SET is_current = TRUE, updated_at = $2 WHERE id = $1")
                .bind(key)
                .bind(now)
                .execute(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error("set_current", e))?;
            year.is_current = true;
            year.timestamps.touch(now);
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;
        Ok(year)
    }

    #[instrument(skip(self), err)]
    async fn current_school_year(&self) -> StoreResult<Option<SchoolYear>> {
        let sql = format!("{} WHERE is_current", select_sql::<SchoolYear>());
        let row = sqlx::query(&sql)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("current_school_year", e))?;
        row.map(|row| SchoolYear::from_row(&row).map_err(|e| map_sqlx_error("decode_row", e)))
            .transpose()
    }

    #[instrument(skip(self), fields(class_group_id = %group), err)]
    async fn count_active_enrollments(&self, group: ClassGroupId) -> StoreResult<u64> {
        let total: i64 = sqlx::query(
            r#"
            SELECT COUNT(*) AS total
            FROM enrollments
            WHERE class_group_id = $1 AND status = 'active'
            "#,
        )
        .bind(Uuid::from(group))
        .fetch_one(&*self.pool)
        .await
        .and_then(|row| row.try_get("total"))
        .map_err(|e| map_sqlx_error("count_active_enrollments", e))?;
        Ok(total as u64)
    }

    #[instrument(
        skip(self, enrollment),
        fields(enrollment_id = %enrollment.id, class_group_id = %enrollment.class_group_id),
        err
    )]
    async fn place_enrollment(&self, enrollment: &Enrollment, is_new: bool) -> StoreResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        if enrollment.is_active() {
            let group = sqlx::query(
                "SELECT designation, capacity FROM class_groups WHERE id = $1 FOR UPDATE",
            )
            .bind(Uuid::from(enrollment.class_group_id))
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("lock_class_group", e))?
            .ok_or_else(|| StoreError::Conflict("referenced class group does not exist".into()))?;
            let designation: String = group
                .try_get("designation")
                .map_err(|e| map_sqlx_error("decode_row", e))?;
            let capacity: i32 = group
                .try_get("capacity")
                .map_err(|e| map_sqlx_error("decode_row", e))?;

            let seated: i64 = sqlx::query(
                r#"
                SELECT COUNT(*) AS total
                FROM enrollments
                WHERE class_group_id = $1 AND status = 'active' AND id <> $2
                "#,
            )
            .bind(Uuid::from(enrollment.class_group_id))
            .bind(Uuid::from(enrollment.id))
            .fetch_one(&mut *tx)
            .await
            .and_then(|row| row.try_get("total"))
            .map_err(|e| map_sqlx_error("count_seats", e))?;

            if seated >= i64::from(capacity) {
                return Err(StoreError::Conflict(format!(
                    "class group '{designation}' is full"
                )));
            }
        }

        let sql = if is_new {
            insert_sql::<Enrollment>()
        } else {
            update_sql::<Enrollment>()
        };
        let result = enrollment
            .bind(sqlx::query(&sql))
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("write_enrollment", e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(Enrollment::KIND));
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;
        Ok(())
    }

    #[instrument(
        skip(self, group),
        fields(class_group_id = %group.id, room_id = %group.room_id),
        err
    )]
    async fn place_class_group(&self, group: &ClassGroup, is_new: bool) -> StoreResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        // Blocks resize_room until commit.
        let sql = format!("{} WHERE id = $1 FOR SHARE", select_sql::<Room>());
        let row = sqlx::query(&sql)
            .bind(Uuid::from(group.room_id))
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("lock_room", e))?
            .ok_or_else(|| StoreError::Conflict("referenced room does not exist".into()))?;
        let room = Room::from_row(&row).map_err(|e| map_sqlx_error("decode_row", e))?;

        let mut seated = 0;
        if !is_new {
            // Serialises with place_enrollment on this group.
            sqlx::query("SELECT id FROM class_groups WHERE id = $1 FOR UPDATE")
                .bind(Uuid::from(group.id))
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error("lock_class_group", e))?
                .ok_or_else(|| StoreError::not_found(ClassGroup::KIND))?;
            let total: i64 = sqlx::query(
                r#"
                SELECT COUNT(*) AS total
                FROM enrollments
                WHERE class_group_id = $1 AND status = 'active'
                "#,
            )
            .bind(Uuid::from(group.id))
            .fetch_one(&mut *tx)
            .await
            .and_then(|row| row.try_get("total"))
            .map_err(|e| map_sqlx_error("count_seats", e))?;
            seated = total as u64;
        }
        group.check_seats(&room, seated)?;

        let sql = if is_new {
            insert_sql::<ClassGroup>()
        } else {
            update_sql::<ClassGroup>()
        };
        let result = group
            .bind(sqlx::query(&sql))
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("write_class_group", e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(ClassGroup::KIND));
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;
        Ok(())
    }

    #[instrument(skip(self, room), fields(room_id = %room.id), err)]
    async fn resize_room(&self, room: &Room) -> StoreResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        sqlx::query("SELECT id FROM rooms WHERE id = $1 FOR UPDATE")
            .bind(Uuid::from(room.id))
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("lock_room", e))?
            .ok_or_else(|| StoreError::not_found(Room::KIND))?;

        let sql = format!("{} WHERE room_id = $1 FOR SHARE", select_sql::<ClassGroup>());
        let rows = sqlx::query(&sql)
            .bind(Uuid::from(room.id))
            .fetch_all(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("lock_hosted_groups", e))?;
        for group in decode_rows::<ClassGroup>(rows)? {
            group.check_seats(room, 0)?;
        }

        let sql = update_sql::<Room>();
        room.bind(sqlx::query(&sql))
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("write_room", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;
        Ok(())
    }

    #[instrument(
        skip(self, draft),
        fields(series = %series.name(), invoice_number = tracing::field::Empty),
        err
    )]
    async fn issue_invoice(
        &self,
        draft: InvoiceDraft,
        series: &InvoiceSeries,
        now: DateTime<Utc>,
    ) -> StoreResult<Invoice> {
        let name = series.name();
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        // Serialises numbering per series until commit.
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(name.as_str())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("lock_series", e))?;

        let last = sqlx::query(
            r#"
            SELECT sequence, issue_date
            FROM invoices
            WHERE series = $1
            ORDER BY sequence DESC
            LIMIT 1
            "#,
        )
        .bind(name.as_str())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("last_invoice", e))?;

        let previous = match last {
            Some(row) => {
                let sequence: i32 = row
                    .try_get("sequence")
                    .map_err(|e| map_sqlx_error("decode_row", e))?;
                let issue_date: NaiveDate = row
                    .try_get("issue_date")
                    .map_err(|e| map_sqlx_error("decode_row", e))?;
                Some((sequence as u32, issue_date))
            }
            None => None,
        };

        let invoice = Invoice::issue(draft, series, previous, now)?;
        let sql = insert_sql::<Invoice>();
        invoice
            .bind(sqlx::query(&sql))
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("insert_invoice", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        Span::current().record("invoice_number", invoice.number.as_str());
        Ok(invoice)
    }

    #[instrument(skip(self), err)]
    async fn invoices_in_series_until(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> StoreResult<Vec<Invoice>> {
        let sql = format!(
            "{} WHERE issue_date <= $2 AND series IN \
             (SELECT DISTINCT series FROM invoices WHERE issue_date BETWEEN $1 AND $2) \
             ORDER BY series, sequence",
            select_sql::<Invoice>()
        );
        let rows = sqlx::query(&sql)
            .bind(start)
            .bind(end)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("invoices_in_series_until", e))?;
        decode_rows(rows)
    }

    async fn delete_school_year_cascade(&self, id: SchoolYearId) -> StoreResult<CascadeSummary> {
        self.run_cascade(&SCHOOL_YEAR_CASCADE, id.into()).await
    }

    async fn delete_course_cascade(&self, id: CourseId) -> StoreResult<CascadeSummary> {
        self.run_cascade(&COURSE_CASCADE, id.into()).await
    }

    async fn delete_class_level_cascade(&self, id: ClassLevelId) -> StoreResult<CascadeSummary> {
        self.run_cascade(&CLASS_LEVEL_CASCADE, id.into()).await
    }

    async fn delete_class_group_cascade(&self, id: ClassGroupId) -> StoreResult<CascadeSummary> {
        self.run_cascade(&CLASS_GROUP_CASCADE, id.into()).await
    }

    async fn delete_teacher_cascade(&self, id: TeacherId) -> StoreResult<CascadeSummary> {
        self.run_cascade(&TEACHER_CASCADE, id.into()).await
    }

    async fn delete_student_cascade(&self, id: StudentId) -> StoreResult<CascadeSummary> {
        self.run_cascade(&STUDENT_CASCADE, id.into()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_statement_skips_the_key_column() {
        let sql = update_sql::<SchoolYear>();
        assert_eq!(
            sql,
            "UPDATE school_years SET designation = $2, start_date = $3, end_date = $4, \
             is_current = $5, created_at = $6, updated_at = $7 WHERE id = $1"
        );
    }

    #[test]
    fn insert_statement_numbers_every_column() {
        let sql = insert_sql::<ClassLevel>();
        assert_eq!(
            sql,
            "INSERT INTO class_levels (id, name, grade, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5)"
        );
    }

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(like_pattern("10%_a"), "%10\\%\\_a%");
    }
}

//! Table mapping for every persisted entity.

use sqlx::postgres::{PgArguments, PgRow};
use sqlx::types::Json;
use sqlx::{Postgres, Row};
use uuid::Uuid;

use edugest_academics::{
    ClassGroup, ClassLevel, Course, CurriculumEntry, Period, Room, SchoolYear, Subject,
};
use edugest_billing::{FeeItem, Invoice, InvoiceLine, InvoiceStatus, TaxExemption};
use edugest_core::{Money, TaxRate, Timestamps};
use edugest_enrollment::{Enrollment, EnrollmentStatus, Student};
use edugest_staff::{Teacher, TeachingAssignment};

use crate::store::Record;

pub type PgQuery<'q> = sqlx::query::Query<'q, Postgres, PgArguments>;

pub trait PgRecord: Record {
    const TABLE: &'static str;

    /// `id` first and `created_at, updated_at` last; `bind` follows this order.
    const COLUMNS: &'static [&'static str];

    const SEARCH_COLUMN: Option<&'static str> = None;

    /// `SELECT EXISTS (...)` over `$1` for references the schema cannot
    /// express as a foreign key, with the name of the dependents.
    const DELETE_GUARD: Option<(&'static str, &'static str)> = None;

    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error>;

    fn bind<'q>(&'q self, query: PgQuery<'q>) -> PgQuery<'q>;
}

fn decode_error(msg: String) -> sqlx::Error {
    sqlx::Error::Decode(msg.into())
}

fn id<T: From<Uuid>>(row: &PgRow, column: &str) -> Result<T, sqlx::Error> {
    Ok(T::from(row.try_get::<Uuid, _>(column)?))
}

fn timestamps(row: &PgRow) -> Result<Timestamps, sqlx::Error> {
    Ok(Timestamps {
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn bind_timestamps<'q>(query: PgQuery<'q>, ts: &Timestamps) -> PgQuery<'q> {
    query.bind(ts.created_at).bind(ts.updated_at)
}

fn small(row: &PgRow, column: &str) -> Result<u8, sqlx::Error> {
    let value: i16 = row.try_get(column)?;
    u8::try_from(value).map_err(|_| decode_error(format!("{column} out of range: {value}")))
}

fn count(row: &PgRow, column: &str) -> Result<u32, sqlx::Error> {
    let value: i32 = row.try_get(column)?;
    u32::try_from(value).map_err(|_| decode_error(format!("{column} out of range: {value}")))
}

impl PgRecord for SchoolYear {
    const TABLE: &'static str = "school_years";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "designation",
        "start_date",
        "end_date",
        "is_current",
        "created_at",
        "updated_at",
    ];
    const SEARCH_COLUMN: Option<&'static str> = Some("designation");

    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: id(row, "id")?,
            designation: row.try_get("designation")?,
            start_date: row.try_get("start_date")?,
            end_date: row.try_get("end_date")?,
            is_current: row.try_get("is_current")?,
            timestamps: timestamps(row)?,
        })
    }

    fn bind<'q>(&'q self, query: PgQuery<'q>) -> PgQuery<'q> {
        let query = query
            .bind(Uuid::from(self.id))
            .bind(self.designation.as_str())
            .bind(self.start_date)
            .bind(self.end_date)
            .bind(self.is_current);
        bind_timestamps(query, &self.timestamps)
    }
}

impl PgRecord for Course {
    const TABLE: &'static str = "courses";
    const COLUMNS: &'static [&'static str] =
        &["id", "name", "code", "description", "created_at", "updated_at"];
    const SEARCH_COLUMN: Option<&'static str> = Some("name");

    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: id(row, "id")?,
            name: row.try_get("name")?,
            code: row.try_get("code")?,
            description: row.try_get("description")?,
            timestamps: timestamps(row)?,
        })
    }

    fn bind<'q>(&'q self, query: PgQuery<'q>) -> PgQuery<'q> {
        let query = query
            .bind(Uuid::from(self.id))
            .bind(self.name.as_str())
            .bind(self.code.as_str())
            .bind(self.description.as_deref());
        bind_timestamps(query, &self.timestamps)
    }
}

impl PgRecord for ClassLevel {
    const TABLE: &'static str = "class_levels";
    const COLUMNS: &'static [&'static str] = &["id", "name", "grade", "created_at", "updated_at"];
    const SEARCH_COLUMN: Option<&'static str> = Some("name");

    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: id(row, "id")?,
            name: row.try_get("name")?,
            grade: small(row, "grade")?,
            timestamps: timestamps(row)?,
        })
    }

    fn bind<'q>(&'q self, query: PgQuery<'q>) -> PgQuery<'q> {
        let query = query
            .bind(Uuid::from(self.id))
            .bind(self.name.as_str())
            .bind(i16::from(self.grade));
        bind_timestamps(query, &self.timestamps)
    }
}

impl PgRecord for Subject {
    const TABLE: &'static str = "subjects";
    const COLUMNS: &'static [&'static str] = &["id", "name", "code", "created_at", "updated_at"];
    const SEARCH_COLUMN: Option<&'static str> = Some("name");

    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: id(row, "id")?,
            name: row.try_get("name")?,
            code: row.try_get("code")?,
            timestamps: timestamps(row)?,
        })
    }

    fn bind<'q>(&'q self, query: PgQuery<'q>) -> PgQuery<'q> {
        let query = query
            .bind(Uuid::from(self.id))
            .bind(self.name.as_str())
            .bind(self.code.as_str());
        bind_timestamps(query, &self.timestamps)
    }
}

impl PgRecord for Room {
    const TABLE: &'static str = "rooms";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "designation",
        "capacity",
        "location",
        "created_at",
        "updated_at",
    ];
    const SEARCH_COLUMN: Option<&'static str> = Some("designation");

    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: id(row, "id")?,
            designation: row.try_get("designation")?,
            capacity: count(row, "capacity")?,
            location: row.try_get("location")?,
            timestamps: timestamps(row)?,
        })
    }

    fn bind<'q>(&'q self, query: PgQuery<'q>) -> PgQuery<'q> {
        let query = query
            .bind(Uuid::from(self.id))
            .bind(self.designation.as_str())
            .bind(self.capacity as i32)
            .bind(self.location.as_deref());
        bind_timestamps(query, &self.timestamps)
    }
}

impl PgRecord for Period {
    const TABLE: &'static str = "periods";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "designation",
        "start_time",
        "end_time",
        "created_at",
        "updated_at",
    ];
    const SEARCH_COLUMN: Option<&'static str> = Some("designation");

    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: id(row, "id")?,
            designation: row.try_get("designation")?,
            start_time: row.try_get("start_time")?,
            end_time: row.try_get("end_time")?,
            timestamps: timestamps(row)?,
        })
    }

    fn bind<'q>(&'q self, query: PgQuery<'q>) -> PgQuery<'q> {
        let query = query
            .bind(Uuid::from(self.id))
            .bind(self.designation.as_str())
            .bind(self.start_time)
            .bind(self.end_time);
        bind_timestamps(query, &self.timestamps)
    }
}

impl PgRecord for ClassGroup {
    const TABLE: &'static str = "class_groups";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "designation",
        "school_year_id",
        "course_id",
        "class_level_id",
        "room_id",
        "period_id",
        "capacity",
        "created_at",
        "updated_at",
    ];
    const SEARCH_COLUMN: Option<&'static str> = Some("designation");

    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: id(row, "id")?,
            designation: row.try_get("designation")?,
            school_year_id: id(row, "school_year_id")?,
            course_id: id(row, "course_id")?,
            class_level_id: id(row, "class_level_id")?,
            room_id: id(row, "room_id")?,
            period_id: id(row, "period_id")?,
            capacity: count(row, "capacity")?,
            timestamps: timestamps(row)?,
        })
    }

    fn bind<'q>(&'q self, query: PgQuery<'q>) -> PgQuery<'q> {
        let query = query
            .bind(Uuid::from(self.id))
            .bind(self.designation.as_str())
            .bind(Uuid::from(self.school_year_id))
            .bind(Uuid::from(self.course_id))
            .bind(Uuid::from(self.class_level_id))
            .bind(Uuid::from(self.room_id))
            .bind(Uuid::from(self.period_id))
            .bind(self.capacity as i32);
        bind_timestamps(query, &self.timestamps)
    }
}

impl PgRecord for CurriculumEntry {
    const TABLE: &'static str = "curriculum_entries";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "course_id",
        "class_level_id",
        "subject_id",
        "weekly_hours",
        "created_at",
        "updated_at",
    ];

    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: id(row, "id")?,
            course_id: id(row, "course_id")?,
            class_level_id: id(row, "class_level_id")?,
            subject_id: id(row, "subject_id")?,
            weekly_hours: small(row, "weekly_hours")?,
            timestamps: timestamps(row)?,
        })
    }

    fn bind<'q>(&'q self, query: PgQuery<'q>) -> PgQuery<'q> {
        let query = query
            .bind(Uuid::from(self.id))
            .bind(Uuid::from(self.course_id))
            .bind(Uuid::from(self.class_level_id))
            .bind(Uuid::from(self.subject_id))
            .bind(i16::from(self.weekly_hours));
        bind_timestamps(query, &self.timestamps)
    }
}

impl PgRecord for Teacher {
    const TABLE: &'static str = "teachers";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "full_name",
        "document_number",
        "email",
        "phone",
        "academic_degree",
        "active",
        "created_at",
        "updated_at",
    ];
    const SEARCH_COLUMN: Option<&'static str> = Some("full_name");

    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: id(row, "id")?,
            full_name: row.try_get("full_name")?,
            document_number: row.try_get("document_number")?,
            email: row.try_get("email")?,
            phone: row.try_get("phone")?,
            academic_degree: row.try_get("academic_degree")?,
            active: row.try_get("active")?,
            timestamps: timestamps(row)?,
        })
    }

    fn bind<'q>(&'q self, query: PgQuery<'q>) -> PgQuery<'q> {
        let query = query
            .bind(Uuid::from(self.id))
            .bind(self.full_name.as_str())
            .bind(self.document_number.as_str())
            .bind(self.email.as_deref())
            .bind(self.phone.as_deref())
            .bind(self.academic_degree.as_deref())
            .bind(self.active);
        bind_timestamps(query, &self.timestamps)
    }
}

impl PgRecord for TeachingAssignment {
    const TABLE: &'static str = "teaching_assignments";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "teacher_id",
        "class_group_id",
        "subject_id",
        "school_year_id",
        "created_at",
        "updated_at",
    ];

    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: id(row, "id")?,
            teacher_id: id(row, "teacher_id")?,
            class_group_id: id(row, "class_group_id")?,
            subject_id: id(row, "subject_id")?,
            school_year_id: id(row, "school_year_id")?,
            timestamps: timestamps(row)?,
        })
    }

    fn bind<'q>(&'q self, query: PgQuery<'q>) -> PgQuery<'q> {
        let query = query
            .bind(Uuid::from(self.id))
            .bind(Uuid::from(self.teacher_id))
            .bind(Uuid::from(self.class_group_id))
            .bind(Uuid::from(self.subject_id))
            .bind(Uuid::from(self.school_year_id));
        bind_timestamps(query, &self.timestamps)
    }
}

impl PgRecord for Student {
    const TABLE: &'static str = "students";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "full_name",
        "document_number",
        "birth_date",
        "guardian_name",
        "tax_id",
        "address",
        "city",
        "created_at",
        "updated_at",
    ];
    const SEARCH_COLUMN: Option<&'static str> = Some("full_name");

    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: id(row, "id")?,
            full_name: row.try_get("full_name")?,
            document_number: row.try_get("document_number")?,
            birth_date: row.try_get("birth_date")?,
            guardian_name: row.try_get("guardian_name")?,
            tax_id: row.try_get("tax_id")?,
            address: row.try_get("address")?,
            city: row.try_get("city")?,
            timestamps: timestamps(row)?,
        })
    }

    fn bind<'q>(&'q self, query: PgQuery<'q>) -> PgQuery<'q> {
        let query = query
            .bind(Uuid::from(self.id))
            .bind(self.full_name.as_str())
            .bind(self.document_number.as_str())
            .bind(self.birth_date)
            .bind(self.guardian_name.as_deref())
            .bind(self.tax_id.as_deref())
            .bind(self.address.as_deref())
            .bind(self.city.as_deref());
        bind_timestamps(query, &self.timestamps)
    }
}

impl PgRecord for Enrollment {
    const TABLE: &'static str = "enrollments";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "student_id",
        "class_group_id",
        "school_year_id",
        "status",
        "enrolled_on",
        "status_changed_at",
        "previous_class_group_id",
        "created_at",
        "updated_at",
    ];

    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        let status: String = row.try_get("status")?;
        let previous: Option<Uuid> = row.try_get("previous_class_group_id")?;
        Ok(Self {
            id: id(row, "id")?,
            student_id: id(row, "student_id")?,
            class_group_id: id(row, "class_group_id")?,
            school_year_id: id(row, "school_year_id")?,
            status: EnrollmentStatus::parse(&status)
                .ok_or_else(|| decode_error(format!("unknown enrollment status '{status}'")))?,
            enrolled_on: row.try_get("enrolled_on")?,
            status_changed_at: row.try_get("status_changed_at")?,
            previous_class_group_id: previous.map(Into::into),
            timestamps: timestamps(row)?,
        })
    }

    fn bind<'q>(&'q self, query: PgQuery<'q>) -> PgQuery<'q> {
        let query = query
            .bind(Uuid::from(self.id))
            .bind(Uuid::from(self.student_id))
            .bind(Uuid::from(self.class_group_id))
            .bind(Uuid::from(self.school_year_id))
            .bind(self.status.as_str())
            .bind(self.enrolled_on)
            .bind(self.status_changed_at)
            .bind(self.previous_class_group_id.map(Uuid::from));
        bind_timestamps(query, &self.timestamps)
    }
}

impl PgRecord for FeeItem {
    const TABLE: &'static str = "fee_items";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "code",
        "description",
        "unit_price",
        "tax_rate_bp",
        "tax_exemption_code",
        "tax_exemption_reason",
        "created_at",
        "updated_at",
    ];
    const SEARCH_COLUMN: Option<&'static str> = Some("description");
    const DELETE_GUARD: Option<(&'static str, &'static str)> = Some((
        "SELECT EXISTS (SELECT 1 FROM invoices \
         WHERE lines @> jsonb_build_array(jsonb_build_object('fee_item_id', $1::text)))",
        "invoice lines",
    ));

    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        let bp = count(row, "tax_rate_bp")?;
        let code: Option<String> = row.try_get("tax_exemption_code")?;
        let reason: Option<String> = row.try_get("tax_exemption_reason")?;
        Ok(Self {
            id: id(row, "id")?,
            code: row.try_get("code")?,
            description: row.try_get("description")?,
            unit_price: Money::from_minor(row.try_get("unit_price")?),
            tax_rate: TaxRate::from_basis_points(bp)
                .map_err(|e| decode_error(e.to_string()))?,
            exemption: code.map(|code| TaxExemption {
                code,
                reason: reason.unwrap_or_default(),
            }),
            timestamps: timestamps(row)?,
        })
    }

    fn bind<'q>(&'q self, query: PgQuery<'q>) -> PgQuery<'q> {
        let query = query
            .bind(Uuid::from(self.id))
            .bind(self.code.as_str())
            .bind(self.description.as_str())
            .bind(self.unit_price.minor())
            .bind(self.tax_rate.basis_points() as i32)
            .bind(self.exemption.as_ref().map(|e| e.code.as_str()))
            .bind(self.exemption.as_ref().map(|e| e.reason.as_str()));
        bind_timestamps(query, &self.timestamps)
    }
}

impl PgRecord for Invoice {
    const TABLE: &'static str = "invoices";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "series",
        "sequence",
        "number",
        "student_id",
        "issue_date",
        "system_entry_at",
        "lines",
        "net_total",
        "tax_total",
        "gross_total",
        "status",
        "status_changed_at",
        "cancel_reason",
        "created_at",
        "updated_at",
    ];
    const SEARCH_COLUMN: Option<&'static str> = Some("number");

    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        let status: String = row.try_get("status")?;
        let Json(lines): Json<Vec<InvoiceLine>> = row.try_get("lines")?;
        Ok(Self {
            id: id(row, "id")?,
            series: row.try_get("series")?,
            sequence: count(row, "sequence")?,
            number: row.try_get("number")?,
            student_id: id(row, "student_id")?,
            issue_date: row.try_get("issue_date")?,
            system_entry_at: row.try_get("system_entry_at")?,
            lines,
            net_total: Money::from_minor(row.try_get("net_total")?),
            tax_total: Money::from_minor(row.try_get("tax_total")?),
            gross_total: Money::from_minor(row.try_get("gross_total")?),
            status: InvoiceStatus::parse(&status)
                .ok_or_else(|| decode_error(format!("unknown invoice status '{status}'")))?,
            status_changed_at: row.try_get("status_changed_at")?,
            cancel_reason: row.try_get("cancel_reason")?,
            timestamps: timestamps(row)?,
        })
    }

    fn bind<'q>(&'q self, query: PgQuery<'q>) -> PgQuery<'q> {
        let query = query
            .bind(Uuid::from(self.id))
            .bind(self.series.as_str())
            .bind(self.sequence as i32)
            .bind(self.number.as_str())
            .bind(Uuid::from(self.student_id))
            .bind(self.issue_date)
            .bind(self.system_entry_at)
            .bind(Json(&self.lines))
            .bind(self.net_total.minor())
            .bind(self.tax_total.minor())
            .bind(self.gross_total.minor())
            .bind(self.status.as_str())
            .bind(self.status_changed_at)
            .bind(self.cancel_reason.as_deref());
        bind_timestamps(query, &self.timestamps)
    }
}

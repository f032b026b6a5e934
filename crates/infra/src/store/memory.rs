use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use edugest_academics::{
    ClassGroup, ClassLevel, Course, CurriculumEntry, Period, Room, SchoolYear, Subject,
};
use edugest_billing::{FeeItem, Invoice, InvoiceDraft, InvoiceSeries};
use edugest_core::{
    ClassGroupId, ClassLevelId, CourseId, Entity, FeeItemId, PeriodId, RoomId, SchoolYearId,
    StudentId, SubjectId, TeacherId,
};
use edugest_enrollment::{Enrollment, Student};
use edugest_staff::{Teacher, TeachingAssignment};

use super::{CascadeSummary, ListQuery, Record, Repository, SchoolStore, ensure_filters};
use crate::error::{StoreError, StoreResult};

#[derive(Debug, Default)]
pub struct Tables {
    school_years: BTreeMap<Uuid, SchoolYear>,
    courses: BTreeMap<Uuid, Course>,
    class_levels: BTreeMap<Uuid, ClassLevel>,
    subjects: BTreeMap<Uuid, Subject>,
    rooms: BTreeMap<Uuid, Room>,
    periods: BTreeMap<Uuid, Period>,
    class_groups: BTreeMap<Uuid, ClassGroup>,
    curriculum_entries: BTreeMap<Uuid, CurriculumEntry>,
    teachers: BTreeMap<Uuid, Teacher>,
    teaching_assignments: BTreeMap<Uuid, TeachingAssignment>,
    students: BTreeMap<Uuid, Student>,
    enrollments: BTreeMap<Uuid, Enrollment>,
    fee_items: BTreeMap<Uuid, FeeItem>,
    invoices: BTreeMap<Uuid, Invoice>,
}

/// Row storage plus the constraints the SQL schema declares for the table.
pub trait Table: Record {
    fn rows(t: &Tables) -> &BTreeMap<Uuid, Self>;

    fn rows_mut(t: &mut Tables) -> &mut BTreeMap<Uuid, Self>;

    /// Unique constraints, checked against every other row.
    fn unique_violation(&self, _t: &Tables) -> Option<String> {
        None
    }

    /// Foreign keys: name of the first referenced row that does not exist.
    fn missing_reference(&self, _t: &Tables) -> Option<&'static str> {
        None
    }

    /// Restricting foreign keys pointing at this row.
    fn referenced_by(_id: Self::Id, _t: &Tables) -> Option<&'static str> {
        None
    }

    /// `ON DELETE SET NULL` references.
    fn detach(_id: Self::Id, _t: &mut Tables) {}
}

fn key<T: Entity>(record: &T) -> Uuid {
    (*record.id()).into()
}

fn others<'a, T: Table>(t: &'a Tables, me: &'a T) -> impl Iterator<Item = &'a T> + 'a {
    T::rows(t).values().filter(move |other| other.id() != me.id())
}

fn exists<T: Table>(t: &Tables, id: impl Into<Uuid>) -> bool {
    let key: Uuid = id.into();
    T::rows(t).contains_key(&key)
}

fn check_constraints<T: Table>(t: &Tables, record: &T) -> StoreResult<()> {
    if let Some(missing) = record.missing_reference(t) {
        return Err(StoreError::Conflict(format!("referenced {missing} does not exist")));
    }
    if let Some(msg) = record.unique_violation(t) {
        return Err(StoreError::Conflict(msg));
    }
    Ok(())
}

fn insert_row<T: Table>(t: &mut Tables, record: &T) -> StoreResult<()> {
    if exists::<T>(t, *record.id()) {
        return Err(StoreError::Conflict(format!(
            "{} {} already exists",
            T::KIND,
            record.id()
        )));
    }
    check_constraints(t, record)?;
    T::rows_mut(t).insert(key(record), record.clone());
    Ok(())
}

fn update_row<T: Table>(t: &mut Tables, record: &T) -> StoreResult<()> {
    if !exists::<T>(t, *record.id()) {
        return Err(StoreError::not_found(T::KIND));
    }
    check_constraints(t, record)?;
    T::rows_mut(t).insert(key(record), record.clone());
    Ok(())
}

fn remove_where<T: Table>(t: &mut Tables, pred: impl Fn(&T) -> bool) -> u64 {
    let rows = T::rows_mut(t);
    let before = rows.len();
    rows.retain(|_, row| !pred(row));
    (before - rows.len()) as u64
}

/// Deletes the selected class groups with their enrollments and assignments.
fn cascade_class_groups(
    t: &mut Tables,
    summary: &mut CascadeSummary,
    select: impl Fn(&ClassGroup) -> bool,
) {
    let groups: HashSet<ClassGroupId> = t
        .class_groups
        .values()
        .filter(|g| select(g))
        .map(|g| g.id)
        .collect();

    summary.record(
        "enrollments",
        remove_where::<Enrollment>(t, |e| groups.contains(&e.class_group_id)),
    );
    summary.record(
        "teaching_assignments",
        remove_where::<TeachingAssignment>(t, |a| groups.contains(&a.class_group_id)),
    );
    for id in &groups {
        ClassGroup::detach(*id, t);
    }
    summary.record(
        "class_groups",
        remove_where::<ClassGroup>(t, |g| groups.contains(&g.id)),
    );
}

/// In-memory school store.
///
/// Intended for tests/dev. A single lock covers every table so multi-table
/// operations are atomic.
#[derive(Debug, Default)]
pub struct InMemorySchoolStore {
    tables: RwLock<Tables>,
}

impl InMemorySchoolStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Tables>> {
        self.tables.read().map_err(|_| StoreError::poisoned())
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Tables>> {
        self.tables.write().map_err(|_| StoreError::poisoned())
    }
}

#[async_trait]
impl<T: Table> Repository<T> for InMemorySchoolStore {
    async fn insert(&self, record: &T) -> StoreResult<()> {
        let mut tables = self.write()?;
        insert_row(&mut tables, record)
    }

    async fn get(&self, id: T::Id) -> StoreResult<Option<T>> {
        let key: Uuid = id.into();
        let tables = self.read()?;
        Ok(T::rows(&tables).get(&key).cloned())
    }

    async fn list(&self, query: &ListQuery) -> StoreResult<(Vec<T>, u64)> {
        ensure_filters::<T>(query)?;
        let tables = self.read()?;
        let needle = query.search.as_ref().map(|s| s.to_lowercase());

        let matched: Vec<&T> = T::rows(&tables)
            .values()
            .filter(|row| query.filters.iter().all(|f| row.matches(f)))
            .filter(|row| match (&needle, row.search_text()) {
                (Some(needle), Some(text)) => text.to_lowercase().contains(needle.as_str()),
                _ => true,
            })
            .collect();

        let total = matched.len() as u64;
        let items = match query.page {
            Some(page) => matched
                .into_iter()
                .skip(page.offset() as usize)
                .take(page.limit as usize)
                .cloned()
                .collect(),
            None => matched.into_iter().cloned().collect(),
        };
        Ok((items, total))
    }

    async fn update(&self, record: &T) -> StoreResult<()> {
        let mut tables = self.write()?;
        update_row(&mut tables, record)
    }

    async fn delete(&self, id: T::Id) -> StoreResult<()> {
        let mut tables = self.write()?;
        if !exists::<T>(&tables, id) {
            return Err(StoreError::not_found(T::KIND));
        }
        if let Some(dependents) = T::referenced_by(id, &tables) {
            return Err(StoreError::Conflict(format!(
                "{} is still referenced by {dependents}",
                T::KIND
            )));
        }
        T::detach(id, &mut tables);
        let key: Uuid = id.into();
        T::rows_mut(&mut tables).remove(&key);
        Ok(())
    }
}

#[async_trait]
impl SchoolStore for InMemorySchoolStore {
    async fn activate_school_year(
        &self,
        id: SchoolYearId,
        now: DateTime<Utc>,
    ) -> StoreResult<SchoolYear> {
        let mut tables = self.write()?;
        if !exists::<SchoolYear>(&tables, id) {
            return Err(StoreError::not_found(SchoolYear::KIND));
        }
        for year in tables.school_years.values_mut() {
            let current = year.id == id;
            if year.is_current != current {
                year.is_current = current;
                year.timestamps.touch(now);
            }
        }
        tables
            .school_years
            .get(&Uuid::from(id))
            .cloned()
            .ok_or_else(|| StoreError::not_found(SchoolYear::KIND))
    }

    async fn current_school_year(&self) -> StoreResult<Option<SchoolYear>> {
        let tables = self.read()?;
        Ok(tables.school_years.values().find(|y| y.is_current).cloned())
    }

    async fn count_active_enrollments(&self, group: ClassGroupId) -> StoreResult<u64> {
        let tables = self.read()?;
        Ok(tables
            .enrollments
            .values()
            .filter(|e| e.class_group_id == group && e.is_active())
            .count() as u64)
    }

    async fn place_enrollment(&self, enrollment: &Enrollment, is_new: bool) -> StoreResult<()> {
        let mut tables = self.write()?;
        if enrollment.is_active() {
            let group = tables
                .class_groups
                .get(&Uuid::from(enrollment.class_group_id))
                .ok_or_else(|| StoreError::Conflict("referenced class group does not exist".into()))?;
            let seated = tables
                .enrollments
                .values()
                .filter(|e| {
                    e.id != enrollment.id
                        && e.class_group_id == enrollment.class_group_id
                        && e.is_active()
                })
                .count() as u64;
            if !group.has_room_for(seated) {
                return Err(StoreError::Conflict(format!(
                    "class group '{}' is full",
                    group.designation
                )));
            }
        }
        if is_new {
            insert_row(&mut tables, enrollment)
        } else {
            update_row(&mut tables, enrollment)
        }
    }

    async fn place_class_group(&self, group: &ClassGroup, is_new: bool) -> StoreResult<()> {
        let mut tables = self.write()?;
        let room = tables
            .rooms
            .get(&Uuid::from(group.room_id))
            .ok_or_else(|| StoreError::Conflict("referenced room does not exist".into()))?;
        let seated = tables
            .enrollments
            .values()
            .filter(|e| e.class_group_id == group.id && e.is_active())
            .count() as u64;
        group.check_seats(room, seated)?;
        if is_new {
            insert_row(&mut tables, group)
        } else {
            update_row(&mut tables, group)
        }
    }

    async fn resize_room(&self, room: &Room) -> StoreResult<()> {
        let mut tables = self.write()?;
        for group in tables.class_groups.values().filter(|g| g.room_id == room.id) {
            group.check_seats(room, 0)?;
        }
        update_row(&mut tables, room)
    }

    async fn issue_invoice(
        &self,
        draft: InvoiceDraft,
        series: &InvoiceSeries,
        now: DateTime<Utc>,
    ) -> StoreResult<Invoice> {
        let mut tables = self.write()?;
        let name = series.name();
        let previous = tables
            .invoices
            .values()
            .filter(|i| i.series == name)
            .max_by_key(|i| i.sequence)
            .map(|i| (i.sequence, i.issue_date));

        let invoice = Invoice::issue(draft, series, previous, now)?;
        insert_row(&mut tables, &invoice)?;
        Ok(invoice)
    }

    async fn invoices_in_series_until(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> StoreResult<Vec<Invoice>> {
        let tables = self.read()?;
        let series: BTreeSet<&str> = tables
            .invoices
            .values()
            .filter(|i| i.issue_date >= start && i.issue_date <= end)
            .map(|i| i.series.as_str())
            .collect();

        let mut invoices: Vec<Invoice> = tables
            .invoices
            .values()
            .filter(|i| series.contains(i.series.as_str()) && i.issue_date <= end)
            .cloned()
            .collect();
        invoices.sort_by(|a, b| (&a.series, a.sequence).cmp(&(&b.series, b.sequence)));
        Ok(invoices)
    }

    async fn delete_school_year_cascade(&self, id: SchoolYearId) -> StoreResult<CascadeSummary> {
        let mut tables = self.write()?;
        if !exists::<SchoolYear>(&tables, id) {
            return Err(StoreError::not_found(SchoolYear::KIND));
        }
        let mut summary = CascadeSummary::new(SchoolYear::KIND, id);
        cascade_class_groups(&mut tables, &mut summary, |g| g.school_year_id == id);
        tables.school_years.remove(&Uuid::from(id));
        Ok(summary)
    }

    async fn delete_course_cascade(&self, id: CourseId) -> StoreResult<CascadeSummary> {
        let mut tables = self.write()?;
        if !exists::<Course>(&tables, id) {
            return Err(StoreError::not_found(Course::KIND));
        }
        let mut summary = CascadeSummary::new(Course::KIND, id);
        cascade_class_groups(&mut tables, &mut summary, |g| g.course_id == id);
        summary.record(
            "curriculum_entries",
            remove_where::<CurriculumEntry>(&mut tables, |c| c.course_id == id),
        );
        tables.courses.remove(&Uuid::from(id));
        Ok(summary)
    }

    async fn delete_class_level_cascade(&self, id: ClassLevelId) -> StoreResult<CascadeSummary> {
        let mut tables = self.write()?;
        if !exists::<ClassLevel>(&tables, id) {
            return Err(StoreError::not_found(ClassLevel::KIND));
        }
        let mut summary = CascadeSummary::new(ClassLevel::KIND, id);
        cascade_class_groups(&mut tables, &mut summary, |g| g.class_level_id == id);
        summary.record(
            "curriculum_entries",
            remove_where::<CurriculumEntry>(&mut tables, |c| c.class_level_id == id),
        );
        tables.class_levels.remove(&Uuid::from(id));
        Ok(summary)
    }

    async fn delete_class_group_cascade(&self, id: ClassGroupId) -> StoreResult<CascadeSummary> {
        let mut tables = self.write()?;
        if !exists::<ClassGroup>(&tables, id) {
            return Err(StoreError::not_found(ClassGroup::KIND));
        }
        let mut summary = CascadeSummary::new(ClassGroup::KIND, id);
        cascade_class_groups(&mut tables, &mut summary, |g| g.id == id);
        // The group itself is the subject of the summary, not a dependent.
        summary.deleted.remove("class_groups");
        Ok(summary)
    }

    async fn delete_teacher_cascade(&self, id: TeacherId) -> StoreResult<CascadeSummary> {
        let mut tables = self.write()?;
        if !exists::<Teacher>(&tables, id) {
            return Err(StoreError::not_found(Teacher::KIND));
        }
        let mut summary = CascadeSummary::new(Teacher::KIND, id);
        summary.record(
            "teaching_assignments",
            remove_where::<TeachingAssignment>(&mut tables, |a| a.teacher_id == id),
        );
        tables.teachers.remove(&Uuid::from(id));
        Ok(summary)
    }

    async fn delete_student_cascade(&self, id: StudentId) -> StoreResult<CascadeSummary> {
        let mut tables = self.write()?;
        if !exists::<Student>(&tables, id) {
            return Err(StoreError::not_found(Student::KIND));
        }
        if tables.invoices.values().any(|i| i.student_id == id) {
            return Err(StoreError::Conflict(
                "student has invoices and cannot be deleted".to_string(),
            ));
        }
        let mut summary = CascadeSummary::new(Student::KIND, id);
        summary.record(
            "enrollments",
            remove_where::<Enrollment>(&mut tables, |e| e.student_id == id),
        );
        tables.students.remove(&Uuid::from(id));
        Ok(summary)
    }
}

impl Table for SchoolYear {
    fn rows(t: &Tables) -> &BTreeMap<Uuid, Self> {
        &t.school_years
    }

    fn rows_mut(t: &mut Tables) -> &mut BTreeMap<Uuid, Self> {
        &mut t.school_years
    }

    fn unique_violation(&self, t: &Tables) -> Option<String> {
        others(t, self).find_map(|other| {
            if other.designation == self.designation {
                Some(format!("school year '{}' already exists", self.designation))
            } else if self.is_current && other.is_current {
                Some(format!("school year '{}' is already current", other.designation))
            } else {
                None
            }
        })
    }

    fn referenced_by(id: SchoolYearId, t: &Tables) -> Option<&'static str> {
        t.class_groups
            .values()
            .any(|g| g.school_year_id == id)
            .then_some("class groups")
    }
}

impl Table for Course {
    fn rows(t: &Tables) -> &BTreeMap<Uuid, Self> {
        &t.courses
    }

    fn rows_mut(t: &mut Tables) -> &mut BTreeMap<Uuid, Self> {
        &mut t.courses
    }

    fn unique_violation(&self, t: &Tables) -> Option<String> {
        others(t, self)
            .any(|other| other.code == self.code)
            .then(|| format!("course code '{}' already exists", self.code))
    }

    fn referenced_by(id: CourseId, t: &Tables) -> Option<&'static str> {
        if t.class_groups.values().any(|g| g.course_id == id) {
            Some("class groups")
        } else if t.curriculum_entries.values().any(|c| c.course_id == id) {
            Some("curriculum entries")
        } else {
            None
        }
    }
}

impl Table for ClassLevel {
    fn rows(t: &Tables) -> &BTreeMap<Uuid, Self> {
        &t.class_levels
    }

    fn rows_mut(t: &mut Tables) -> &mut BTreeMap<Uuid, Self> {
        &mut t.class_levels
    }

    fn unique_violation(&self, t: &Tables) -> Option<String> {
        others(t, self).find_map(|other| {
            if other.name == self.name {
                Some(format!("class '{}' already exists", self.name))
            } else if other.grade == self.grade {
                Some(format!("a class for grade {} already exists", self.grade))
            } else {
                None
            }
        })
    }

    fn referenced_by(id: ClassLevelId, t: &Tables) -> Option<&'static str> {
        if t.class_groups.values().any(|g| g.class_level_id == id) {
            Some("class groups")
        } else if t.curriculum_entries.values().any(|c| c.class_level_id == id) {
            Some("curriculum entries")
        } else {
            None
        }
    }
}

impl Table for Subject {
    fn rows(t: &Tables) -> &BTreeMap<Uuid, Self> {
        &t.subjects
    }

    fn rows_mut(t: &mut Tables) -> &mut BTreeMap<Uuid, Self> {
        &mut t.subjects
    }

    fn unique_violation(&self, t: &Tables) -> Option<String> {
        others(t, self)
            .any(|other| other.code == self.code)
            .then(|| format!("subject code '{}' already exists", self.code))
    }

    fn referenced_by(id: SubjectId, t: &Tables) -> Option<&'static str> {
        if t.curriculum_entries.values().any(|c| c.subject_id == id) {
            Some("curriculum entries")
        } else if t.teaching_assignments.values().any(|a| a.subject_id == id) {
            Some("teaching assignments")
        } else {
            None
        }
    }
}

impl Table for Room {
    fn rows(t: &Tables) -> &BTreeMap<Uuid, Self> {
        &t.rooms
    }

    fn rows_mut(t: &mut Tables) -> &mut BTreeMap<Uuid, Self> {
        &mut t.rooms
    }

    fn unique_violation(&self, t: &Tables) -> Option<String> {
        others(t, self)
            .any(|other| other.designation == self.designation)
            .then(|| format!("room '{}' already exists", self.designation))
    }

    fn referenced_by(id: RoomId, t: &Tables) -> Option<&'static str> {
        t.class_groups
            .values()
            .any(|g| g.room_id == id)
            .then_some("class groups")
    }
}

impl Table for Period {
    fn rows(t: &Tables) -> &BTreeMap<Uuid, Self> {
        &t.periods
    }

    fn rows_mut(t: &mut Tables) -> &mut BTreeMap<Uuid, Self> {
        &mut t.periods
    }

    fn unique_violation(&self, t: &Tables) -> Option<String> {
        others(t, self)
            .any(|other| other.designation == self.designation)
            .then(|| format!("period '{}' already exists", self.designation))
    }

    fn referenced_by(id: PeriodId, t: &Tables) -> Option<&'static str> {
        t.class_groups
            .values()
            .any(|g| g.period_id == id)
            .then_some("class groups")
    }
}

impl Table for ClassGroup {
    fn rows(t: &Tables) -> &BTreeMap<Uuid, Self> {
        &t.class_groups
    }

    fn rows_mut(t: &mut Tables) -> &mut BTreeMap<Uuid, Self> {
        &mut t.class_groups
    }

    fn unique_violation(&self, t: &Tables) -> Option<String> {
        others(t, self)
            .filter(|other| other.school_year_id == self.school_year_id)
            .find_map(|other| {
                if other.designation == self.designation {
                    Some(format!(
                        "class group '{}' already exists in this school year",
                        self.designation
                    ))
                } else if other.room_id == self.room_id && other.period_id == self.period_id {
                    Some(format!(
                        "room is already used by class group '{}' in this period",
                        other.designation
                    ))
                } else {
                    None
                }
            })
    }

    fn missing_reference(&self, t: &Tables) -> Option<&'static str> {
        if !exists::<SchoolYear>(t, self.school_year_id) {
            Some("school year")
        } else if !exists::<Course>(t, self.course_id) {
            Some("course")
        } else if !exists::<ClassLevel>(t, self.class_level_id) {
            Some("class")
        } else if !exists::<Room>(t, self.room_id) {
            Some("room")
        } else if !exists::<Period>(t, self.period_id) {
            Some("period")
        } else {
            None
        }
    }

    fn referenced_by(id: ClassGroupId, t: &Tables) -> Option<&'static str> {
        if t.enrollments.values().any(|e| e.class_group_id == id) {
            Some("enrollments")
        } else if t.teaching_assignments.values().any(|a| a.class_group_id == id) {
            Some("teaching assignments")
        } else {
            None
        }
    }

    fn detach(id: ClassGroupId, t: &mut Tables) {
        for enrollment in t.enrollments.values_mut() {
            if enrollment.previous_class_group_id == Some(id) {
                enrollment.previous_class_group_id = None;
            }
        }
    }
}

impl Table for CurriculumEntry {
    fn rows(t: &Tables) -> &BTreeMap<Uuid, Self> {
        &t.curriculum_entries
    }

    fn rows_mut(t: &mut Tables) -> &mut BTreeMap<Uuid, Self> {
        &mut t.curriculum_entries
    }

    fn unique_violation(&self, t: &Tables) -> Option<String> {
        others(t, self)
            .any(|other| other.covers(self.course_id, self.class_level_id, self.subject_id))
            .then(|| "subject is already part of this curriculum grid".to_string())
    }

    fn missing_reference(&self, t: &Tables) -> Option<&'static str> {
        if !exists::<Course>(t, self.course_id) {
            Some("course")
        } else if !exists::<ClassLevel>(t, self.class_level_id) {
            Some("class")
        } else if !exists::<Subject>(t, self.subject_id) {
            Some("subject")
        } else {
            None
        }
    }
}

impl Table for Teacher {
    fn rows(t: &Tables) -> &BTreeMap<Uuid, Self> {
        &t.teachers
    }

    fn rows_mut(t: &mut Tables) -> &mut BTreeMap<Uuid, Self> {
        &mut t.teachers
    }

    fn unique_violation(&self, t: &Tables) -> Option<String> {
        others(t, self)
            .any(|other| other.document_number == self.document_number)
            .then(|| {
                format!(
                    "a teacher with document number '{}' already exists",
                    self.document_number
                )
            })
    }

    fn referenced_by(id: TeacherId, t: &Tables) -> Option<&'static str> {
        t.teaching_assignments
            .values()
            .any(|a| a.teacher_id == id)
            .then_some("teaching assignments")
    }
}

impl Table for TeachingAssignment {
    fn rows(t: &Tables) -> &BTreeMap<Uuid, Self> {
        &t.teaching_assignments
    }

    fn rows_mut(t: &mut Tables) -> &mut BTreeMap<Uuid, Self> {
        &mut t.teaching_assignments
    }

    fn unique_violation(&self, t: &Tables) -> Option<String> {
        others(t, self)
            .any(|other| {
                other.class_group_id == self.class_group_id && other.subject_id == self.subject_id
            })
            .then(|| "this subject already has a teacher in the class group".to_string())
    }

    fn missing_reference(&self, t: &Tables) -> Option<&'static str> {
        if !exists::<Teacher>(t, self.teacher_id) {
            Some("teacher")
        } else if !exists::<ClassGroup>(t, self.class_group_id) {
            Some("class group")
        } else if !exists::<Subject>(t, self.subject_id) {
            Some("subject")
        } else if !exists::<SchoolYear>(t, self.school_year_id) {
            Some("school year")
        } else {
            None
        }
    }
}

impl Table for Student {
    fn rows(t: &Tables) -> &BTreeMap<Uuid, Self> {
        &t.students
    }

    fn rows_mut(t: &mut Tables) -> &mut BTreeMap<Uuid, Self> {
        &mut t.students
    }

    fn unique_violation(&self, t: &Tables) -> Option<String> {
        others(t, self)
            .any(|other| other.document_number == self.document_number)
            .then(|| {
                format!(
                    "a student with document number '{}' already exists",
                    self.document_number
                )
            })
    }

    fn referenced_by(id: StudentId, t: &Tables) -> Option<&'static str> {
        if t.enrollments.values().any(|e| e.student_id == id) {
            Some("enrollments")
        } else if t.invoices.values().any(|i| i.student_id == id) {
            Some("invoices")
        } else {
            None
        }
    }
}

impl Table for Enrollment {
    fn rows(t: &Tables) -> &BTreeMap<Uuid, Self> {
        &t.enrollments
    }

    fn rows_mut(t: &mut Tables) -> &mut BTreeMap<Uuid, Self> {
        &mut t.enrollments
    }

    // Cancelled enrollments are outside the partial unique index.
    fn unique_violation(&self, t: &Tables) -> Option<String> {
        if !self.counts_towards_year() {
            return None;
        }
        others(t, self)
            .any(|other| {
                other.counts_towards_year()
                    && other.student_id == self.student_id
                    && other.school_year_id == self.school_year_id
            })
            .then(|| "student is already enrolled in this school year".to_string())
    }

    fn missing_reference(&self, t: &Tables) -> Option<&'static str> {
        if !exists::<Student>(t, self.student_id) {
            Some("student")
        } else if !exists::<ClassGroup>(t, self.class_group_id) {
            Some("class group")
        } else if !exists::<SchoolYear>(t, self.school_year_id) {
            Some("school year")
        } else {
            None
        }
    }
}

impl Table for FeeItem {
    fn rows(t: &Tables) -> &BTreeMap<Uuid, Self> {
        &t.fee_items
    }

    fn rows_mut(t: &mut Tables) -> &mut BTreeMap<Uuid, Self> {
        &mut t.fee_items
    }

    fn unique_violation(&self, t: &Tables) -> Option<String> {
        others(t, self)
            .any(|other| other.code == self.code)
            .then(|| format!("fee item code '{}' already exists", self.code))
    }

    fn referenced_by(id: FeeItemId, t: &Tables) -> Option<&'static str> {
        t.invoices
            .values()
            .any(|i| i.lines.iter().any(|l| l.fee_item_id == id))
            .then_some("invoice lines")
    }
}

impl Table for Invoice {
    fn rows(t: &Tables) -> &BTreeMap<Uuid, Self> {
        &t.invoices
    }

    fn rows_mut(t: &mut Tables) -> &mut BTreeMap<Uuid, Self> {
        &mut t.invoices
    }

    fn unique_violation(&self, t: &Tables) -> Option<String> {
        others(t, self)
            .any(|other| other.number == self.number)
            .then(|| format!("invoice {} already exists", self.number))
    }

    fn missing_reference(&self, t: &Tables) -> Option<&'static str> {
        (!exists::<Student>(t, self.student_id)).then_some("student")
    }
}

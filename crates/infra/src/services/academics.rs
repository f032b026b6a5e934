use tracing::{info, instrument};

use edugest_academics::{
    ClassGroup, ClassGroupPatch, ClassLevel, ClassLevelPatch, Course, CoursePatch,
    CurriculumEntry, CurriculumEntryPatch, NewClassGroup, NewClassLevel, NewCourse,
    NewCurriculumEntry, NewPeriod, NewRoom, NewSchoolYear, NewSubject, Period, PeriodPatch, Room,
    RoomPatch, SchoolYear, SchoolYearPatch, Subject, SubjectPatch,
};
use edugest_core::{
    ClassGroupId, ClassLevelId, CourseId, CurriculumEntryId, DomainError, Page, PageRequest,
    PeriodId, RoomId, SchoolYearId, SubjectId,
};
use edugest_enrollment::{Enrollment, EnrollmentStatus, Student};
use edugest_staff::TeachingAssignment;

use super::{SchoolService, ServiceResult};
use crate::store::{CascadeSummary, Filter, ListQuery};

impl SchoolService {
    // --- school years -----------------------------------------------------

    /// A year created as current takes the flag from whichever year held it.
    #[instrument(skip(self, input), fields(designation = %input.designation), err)]
    pub async fn create_school_year(&self, input: NewSchoolYear) -> ServiceResult<SchoolYear> {
        let now = self.now();
        let make_current = input.is_current;
        let mut year = SchoolYear::create(input, now)?;
        year.is_current = false;
        self.insert(&year).await?;
        if make_current {
            year = self.store.activate_school_year(year.id, now).await?;
        }
        Ok(year)
    }

    #[instrument(skip(self, patch), err)]
    pub async fn update_school_year(
        &self,
        id: SchoolYearId,
        patch: SchoolYearPatch,
    ) -> ServiceResult<SchoolYear> {
        let now = self.now();
        let mut year = self.get::<SchoolYear>(id).await?;
        let make_current = patch.is_current == Some(true) && !year.is_current;
        year.apply(patch, now)?;
        if make_current {
            year.is_current = false;
        }
        self.save(&year).await?;
        if make_current {
            year = self.store.activate_school_year(id, now).await?;
        }
        Ok(year)
    }

    #[instrument(skip(self), err)]
    pub async fn activate_school_year(&self, id: SchoolYearId) -> ServiceResult<SchoolYear> {
        Ok(self.store.activate_school_year(id, self.now()).await?)
    }

    pub async fn current_school_year(&self) -> ServiceResult<SchoolYear> {
        self.store
            .current_school_year()
            .await?
            .ok_or_else(|| DomainError::not_found("current school year").into())
    }

    #[instrument(skip(self), err)]
    pub async fn delete_school_year(&self, id: SchoolYearId) -> ServiceResult<CascadeSummary> {
        let summary = self.store.delete_school_year_cascade(id).await?;
        info!(removed = summary.total(), "{}", summary.message());
        Ok(summary)
    }

    // --- courses / classes / subjects ------------------------------------

    pub async fn create_course(&self, input: NewCourse) -> ServiceResult<Course> {
        let course = Course::create(input, self.now())?;
        self.insert(&course).await?;
        Ok(course)
    }

    pub async fn update_course(&self, id: CourseId, patch: CoursePatch) -> ServiceResult<Course> {
        let mut course = self.get::<Course>(id).await?;
        course.apply(patch, self.now())?;
        self.save(&course).await?;
        Ok(course)
    }

    #[instrument(skip(self), err)]
    pub async fn delete_course(&self, id: CourseId) -> ServiceResult<CascadeSummary> {
        let summary = self.store.delete_course_cascade(id).await?;
        info!(removed = summary.total(), "{}", summary.message());
        Ok(summary)
    }

    pub async fn create_class_level(&self, input: NewClassLevel) -> ServiceResult<ClassLevel> {
        let level = ClassLevel::create(input, self.now())?;
        self.insert(&level).await?;
        Ok(level)
    }

    pub async fn update_class_level(
        &self,
        id: ClassLevelId,
        patch: ClassLevelPatch,
    ) -> ServiceResult<ClassLevel> {
        let mut level = self.get::<ClassLevel>(id).await?;
        level.apply(patch, self.now())?;
        self.save(&level).await?;
        Ok(level)
    }

    #[instrument(skip(self), err)]
    pub async fn delete_class_level(&self, id: ClassLevelId) -> ServiceResult<CascadeSummary> {
        let summary = self.store.delete_class_level_cascade(id).await?;
        info!(removed = summary.total(), "{}", summary.message());
        Ok(summary)
    }

    pub async fn create_subject(&self, input: NewSubject) -> ServiceResult<Subject> {
        let subject = Subject::create(input, self.now())?;
        self.insert(&subject).await?;
        Ok(subject)
    }

    pub async fn update_subject(
        &self,
        id: SubjectId,
        patch: SubjectPatch,
    ) -> ServiceResult<Subject> {
        let mut subject = self.get::<Subject>(id).await?;
        subject.apply(patch, self.now())?;
        self.save(&subject).await?;
        Ok(subject)
    }

    /// Restricted: fails while a curriculum entry or assignment uses the subject.
    pub async fn delete_subject(&self, id: SubjectId) -> ServiceResult<()> {
        self.remove::<Subject>(id).await
    }

    // --- rooms / periods --------------------------------------------------

    pub async fn create_room(&self, input: NewRoom) -> ServiceResult<Room> {
        let room = Room::create(input, self.now())?;
        self.insert(&room).await?;
        Ok(room)
    }

    /// A room may not shrink below the capacity of a class group it hosts.
    pub async fn update_room(&self, id: RoomId, patch: RoomPatch) -> ServiceResult<Room> {
        let mut room = self.get::<Room>(id).await?;
        room.apply(patch, self.now())?;

        self.store.resize_room(&room).await?;
        Ok(room)
    }

    pub async fn delete_room(&self, id: RoomId) -> ServiceResult<()> {
        self.remove::<Room>(id).await
    }

    pub async fn create_period(&self, input: NewPeriod) -> ServiceResult<Period> {
        let period = Period::create(input, self.now())?;
        self.insert(&period).await?;
        Ok(period)
    }

    pub async fn update_period(&self, id: PeriodId, patch: PeriodPatch) -> ServiceResult<Period> {
        let mut period = self.get::<Period>(id).await?;
        period.apply(patch, self.now())?;
        self.save(&period).await?;
        Ok(period)
    }

    pub async fn delete_period(&self, id: PeriodId) -> ServiceResult<()> {
        self.remove::<Period>(id).await
    }

    // --- class groups -----------------------------------------------------

    #[instrument(skip(self, input), fields(designation = %input.designation), err)]
    pub async fn create_class_group(&self, input: NewClassGroup) -> ServiceResult<ClassGroup> {
        self.exists::<SchoolYear>(input.school_year_id).await?;
        self.exists::<Course>(input.course_id).await?;
        self.exists::<ClassLevel>(input.class_level_id).await?;
        self.exists::<Period>(input.period_id).await?;
        let room = self.get::<Room>(input.room_id).await?;

        let group = ClassGroup::create(input, &room, self.now())?;
        self.store.place_class_group(&group, true).await?;
        Ok(group)
    }

    #[instrument(skip(self, patch), err)]
    pub async fn update_class_group(
        &self,
        id: ClassGroupId,
        patch: ClassGroupPatch,
    ) -> ServiceResult<ClassGroup> {
        let mut group = self.get::<ClassGroup>(id).await?;
        let room = self
            .get::<Room>(patch.room_id.unwrap_or(group.room_id))
            .await?;
        if let Some(period_id) = patch.period_id {
            self.exists::<Period>(period_id).await?;
        }
        let active = self.store.count_active_enrollments(id).await?;

        group.apply(patch, &room, active, self.now())?;
        // Recounted under the store lock.
        self.store.place_class_group(&group, false).await?;
        Ok(group)
    }

    #[instrument(skip(self), err)]
    pub async fn delete_class_group(&self, id: ClassGroupId) -> ServiceResult<CascadeSummary> {
        let summary = self.store.delete_class_group_cascade(id).await?;
        info!(removed = summary.total(), "{}", summary.message());
        Ok(summary)
    }

    /// Students actively enrolled in the group, paged over the enrollments.
    pub async fn class_group_students(
        &self,
        id: ClassGroupId,
        page: PageRequest,
    ) -> ServiceResult<Page<Student>> {
        self.exists::<ClassGroup>(id).await?;
        let enrollments = self
            .list::<Enrollment>(
                ListQuery::paged(page)
                    .filter(Filter::ClassGroup(id))
                    .filter(Filter::EnrollmentStatus(EnrollmentStatus::Active)),
            )
            .await?;

        let mut students = Vec::with_capacity(enrollments.items.len());
        for enrollment in &enrollments.items {
            students.push(self.get::<Student>(enrollment.student_id).await?);
        }
        Ok(Page::new(students, enrollments.total, page))
    }

    // --- curriculum grid --------------------------------------------------

    pub async fn create_curriculum_entry(
        &self,
        input: NewCurriculumEntry,
    ) -> ServiceResult<CurriculumEntry> {
        self.exists::<Course>(input.course_id).await?;
        self.exists::<ClassLevel>(input.class_level_id).await?;
        self.exists::<Subject>(input.subject_id).await?;

        let entry = CurriculumEntry::create(input, self.now())?;
        self.insert(&entry).await?;
        Ok(entry)
    }

    pub async fn update_curriculum_entry(
        &self,
        id: CurriculumEntryId,
        patch: CurriculumEntryPatch,
    ) -> ServiceResult<CurriculumEntry> {
        let mut entry = self.get::<CurriculumEntry>(id).await?;
        entry.apply(patch, self.now())?;
        self.save(&entry).await?;
        Ok(entry)
    }

    /// Rejected while a class group of the same course + class has a teacher
    /// assigned to the subject.
    pub async fn delete_curriculum_entry(&self, id: CurriculumEntryId) -> ServiceResult<()> {
        let entry = self.get::<CurriculumEntry>(id).await?;
        let groups = self
            .all::<ClassGroup>(
                ListQuery::all()
                    .filter(Filter::Course(entry.course_id))
                    .filter(Filter::ClassLevel(entry.class_level_id)),
            )
            .await?;

        for group in &groups {
            let in_use = self
                .list::<TeachingAssignment>(
                    ListQuery::paged(PageRequest::new(Some(1), Some(1)))
                        .filter(Filter::ClassGroup(group.id))
                        .filter(Filter::Subject(entry.subject_id)),
                )
                .await?;
            if in_use.total > 0 {
                return Err(DomainError::conflict(format!(
                    "subject is still assigned to a teacher in class group '{}'",
                    group.designation
                ))
                .into());
            }
        }

        self.remove::<CurriculumEntry>(id).await
    }

    /// The grid of one course + class.
    pub(crate) async fn curriculum_grid(
        &self,
        course_id: CourseId,
        class_level_id: ClassLevelId,
    ) -> ServiceResult<Vec<CurriculumEntry>> {
        self.all::<CurriculumEntry>(
            ListQuery::all()
                .filter(Filter::Course(course_id))
                .filter(Filter::ClassLevel(class_level_id)),
        )
        .await
    }
}
